//! Transistor extraction.
//!
//! Gate regions are the overlap of a gate layer and a diffusion layer. A
//! rectangular gate becomes an oriented transistor node. Any other gate shape
//! is traced along its centerline and becomes a serpentine transistor.

use geometry::prelude::*;
use layir::Node;
use tracing::{span, Level};

use crate::cell::CellState;
use crate::centerline::{self, CenterlineOpts};
use crate::diag::{IssueKind, RejectReason, Rejection};
use crate::error::Result;
use crate::merge::{GeoMerge, MergedRegion, PolygonMerge};
use crate::scale::{body_placement, to_external, to_internal};
use crate::tech::{LayerFunction, LayerId};
use crate::template::TransistorTemplate;

type Fit<T> = std::result::Result<T, RejectReason>;

pub fn extract(state: &mut CellState) -> Result<()> {
    let span = span!(Level::INFO, "transistors");
    let _guard = span.enter();

    let mut pairs: Vec<(LayerId, LayerId)> = Vec::new();
    for t in &state.ctx.templates.transistors {
        let pair = (t.gate_layer, t.diff_layer);
        if !pairs.contains(&pair) {
            pairs.push(pair);
        }
    }

    for (gate, diff) in pairs {
        let templates: Vec<&TransistorTemplate> = state
            .ctx
            .templates
            .transistors
            .iter()
            .filter(|t| t.gate_layer == gate && t.diff_layer == diff)
            .collect();
        let mut scratch = GeoMerge::new();
        state.working.intersect_into(gate, diff, &mut scratch, gate);
        for region in scratch.regions(gate) {
            let found = match region.as_rect() {
                Some(rect) => find_oriented(state, &templates, rect)?,
                None => find_traced(state, &templates, &region, &scratch, gate)?,
            };
            let location = region.bbox();
            match found {
                Ok(node) => {
                    tracing::trace!(proto = %node.proto(), "placing transistor");
                    let id = state.place_node(node)?;
                    state.consume_node(id)?;
                }
                Err(reasons) => {
                    if let Some(r) = location {
                        state.reported.push((gate, r));
                        state.reported.push((diff, r));
                    }
                    state.issue(location, IssueKind::UnresolvedTransistor { reasons });
                }
            }
        }
    }
    tracing::debug!(transistors = state.stats.transistors, "placed transistors");
    Ok(())
}

fn push_rejection(reasons: &mut Vec<Rejection>, template: &TransistorTemplate, reason: RejectReason) {
    let rejection = Rejection {
        template: template.proto.clone(),
        reason,
    };
    if reasons.last() != Some(&rejection) {
        reasons.push(rejection);
    }
}

/// Wells the template does not carry must stay clear of the gate.
fn check_wells(state: &CellState, t: &TransistorTemplate, gate: &Polygon) -> Fit<()> {
    let tech = state.tech();
    for layer in tech.layer_ids() {
        if !tech.layer_function(layer).is_well() || tech.is_implied_well(layer) {
            continue;
        }
        let layer = state.canonical(layer);
        if t.frame.layers.iter().any(|l| l.layer == layer) {
            continue;
        }
        if state.original.intersects(layer, gate) {
            return Err(RejectReason::OppositeWell {
                layer: tech.layer_name(layer),
            });
        }
    }
    Ok(())
}

fn find_oriented(
    state: &CellState,
    templates: &[&TransistorTemplate],
    gate: Rect,
) -> Result<std::result::Result<Node, Vec<Rejection>>> {
    let mut reasons = Vec::new();
    for t in templates {
        match try_oriented(state, t, gate)? {
            Ok(node) => return Ok(Ok(node)),
            Err(reason) => push_rejection(&mut reasons, t, reason),
        }
    }
    Ok(Err(reasons))
}

fn try_oriented(state: &CellState, t: &TransistorTemplate, gate: Rect) -> Result<Fit<Node>> {
    let tech = state.tech();
    // The gate layer must continue past the gate on the sides the template expects.
    for layer in &t.frame.layers {
        let Some(rect) = layer.rect(gate) else {
            return Ok(Err(RejectReason::Orientation));
        };
        if !state.original.contains(layer.layer, &rect.to_polygon()) {
            let reason = if layer.layer == t.gate_layer || layer.layer == t.diff_layer {
                RejectReason::Orientation
            } else {
                RejectReason::MissingLayer {
                    layer: tech.layer_name(layer.layer),
                }
            };
            return Ok(Err(reason));
        }
    }
    if let Err(reason) = check_wells(state, t, &gate.to_polygon()) {
        return Ok(Err(reason));
    }
    let (gw, gh) = if t.rotation.is_transposing() {
        (gate.height(), gate.width())
    } else {
        (gate.width(), gate.height())
    };
    if gw < t.min_gate.0 || gh < t.min_gate.1 {
        return Ok(Err(RejectReason::TooSmall {
            width: to_external(t.min_gate.1),
            length: to_external(t.min_gate.0),
        }));
    }
    let Some(body) = gate.expand_sides(t.frame.body) else {
        return Ok(Err(RejectReason::Orientation));
    };
    let Some((center, w, h)) = body_placement(body) else {
        return Ok(Err(RejectReason::OffGrid));
    };
    let (w, h) = if t.rotation.is_transposing() { (h, w) } else { (w, h) };
    let node = Node::new(t.proto.clone(), center, w, h).with_orientation(t.rotation);
    Ok(state.node_fits(&node)?.map(|_| node))
}

fn find_traced(
    state: &CellState,
    templates: &[&TransistorTemplate],
    region: &MergedRegion,
    scratch: &GeoMerge<LayerId>,
    gate: LayerId,
) -> Result<std::result::Result<Node, Vec<Rejection>>> {
    let mut reasons = Vec::new();
    // Traces carry no orientation; one template per prototype suffices.
    let mut tried: Vec<&str> = Vec::new();
    for t in templates {
        if tried.contains(&t.proto.as_str()) {
            continue;
        }
        tried.push(t.proto.as_str());
        match try_traced(state, t, region, scratch, gate)? {
            Ok(node) => return Ok(Ok(node)),
            Err(reason) => push_rejection(&mut reasons, t, reason),
        }
    }
    Ok(Err(reasons))
}

fn try_traced(
    state: &CellState,
    t: &TransistorTemplate,
    region: &MergedRegion,
    scratch: &GeoMerge<LayerId>,
    gate: LayerId,
) -> Result<Fit<Node>> {
    let tech = state.tech();
    let proto = tech.try_node(&t.proto)?;
    if let Err(reason) = check_wells(state, t, &region.outline) {
        return Ok(Err(reason));
    }
    for layer in &t.frame.layers {
        let required = !matches!(
            tech.layer_function(layer.layer),
            LayerFunction::Poly { .. } | LayerFunction::Diffusion(_)
        );
        if required && !state.original.intersects(layer.layer, &region.outline) {
            return Ok(Err(RejectReason::MissingLayer {
                layer: tech.layer_name(layer.layer),
            }));
        }
    }
    let opts = CenterlineOpts {
        min_width: t.min_gate.0,
        width_tolerance: state.opts().width_tolerance,
        max_passes: state.opts().max_centerline_passes,
    };
    let lines = centerline::centerlines(region, &opts, &|p| scratch.contains(gate, p));
    let Some(width) = lines.first().map(|l| l.width) else {
        return Ok(Err(RejectReason::TooSmall {
            width: to_external(t.min_gate.1),
            length: to_external(t.min_gate.0),
        }));
    };
    if lines.iter().any(|l| l.width != width) {
        return Ok(Err(RejectReason::Orientation));
    }
    let Some(mut trace) = centerline::chain(&lines) else {
        return Ok(Err(RejectReason::Orientation));
    };
    // Run the trace out to the ends of the gate region.
    let n = trace.len();
    trace[0] = extend_end(trace[1], trace[0], width / 2);
    trace[n - 1] = extend_end(trace[n - 2], trace[n - 1], width / 2);
    let length: f64 = trace.windows(2).map(|w| w[0].dist(w[1])).sum();
    if length + 0.5 < t.min_gate.1 as f64 {
        return Ok(Err(RejectReason::TooSmall {
            width: to_external(t.min_gate.1),
            length: to_external(t.min_gate.0),
        }));
    }
    let center = trace
        .iter()
        .copied()
        .map(Rect::from_point)
        .reduce(Rect::union)
        .map(|r| r.center())
        .unwrap_or_default();
    let node =
        Node::new(t.proto.clone(), center, width, to_internal(proto.height)).with_trace(trace);
    Ok(state.node_fits(&node)?.map(|_| node))
}

/// Moves `end` away from `from` by `amount` along the segment's direction.
fn extend_end(from: Point, end: Point, amount: i64) -> Point {
    let v = end - from;
    let len = from.dist(end);
    if len == 0. {
        return end;
    }
    Point::from_f64(
        end.x as f64 + v.x as f64 * amount as f64 / len,
        end.y as f64 + v.y as f64 * amount as f64 / len,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ends_extend_along_their_segment() {
        assert_eq!(
            extend_end(Point::new(0, 0), Point::new(0, 40), 10),
            Point::new(0, 50)
        );
        assert_eq!(
            extend_end(Point::new(30, 5), Point::new(10, 5), 10),
            Point::new(0, 5)
        );
    }
}
