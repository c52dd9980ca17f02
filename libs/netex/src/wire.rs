//! Wire extraction.
//!
//! Routable geometry left after device extraction is skeletonized region by
//! region. Every centerline becomes a wire whose ends attach to the ports
//! they reach, or to new pins.

use arcstr::ArcStr;
use geometry::prelude::*;
use layir::{Terminal, Wire, WireEnd};
use tracing::{span, Level};

use crate::cell::CellState;
use crate::centerline::{self, Centerline, CenterlineOpts};
use crate::error::Result;
use crate::merge::PolygonMerge;
use crate::scale::{to_internal, SCALE};
use crate::tech::{ArcProto, LayerId};

pub fn extract(state: &mut CellState) -> Result<()> {
    let span = span!(Level::INFO, "wires");
    let _guard = span.enter();

    for (layer, arc) in state.routable_layers() {
        let opts = CenterlineOpts {
            min_width: to_internal(arc.min_width),
            width_tolerance: state.opts().width_tolerance,
            max_passes: state.opts().max_centerline_passes,
        };
        for region in state.working.regions(layer) {
            let lines = {
                let original = &state.original;
                centerline::centerlines(&region, &opts, &|p| original.contains(layer, p))
            };
            tracing::trace!(
                layer = %state.tech().layer_name(layer),
                count = lines.len(),
                "decomposed region"
            );
            for line in &lines {
                if !realize(state, layer, arc, line)? {
                    tracing::trace!(?line, "no wire fits centerline");
                }
            }
        }
    }
    tracing::debug!(wires = state.stats.wires, "placed wires");
    Ok(())
}

/// An existing port a wire end attaches to.
#[derive(Debug, Clone)]
pub(crate) struct Attachment {
    pub terminal: Terminal,
    pub port: ArcStr,
    /// The port's shape, in internal units.
    pub shape: Polygon,
}

/// Where one end of a wire goes.
#[derive(Debug, Clone)]
pub(crate) struct EndPlan {
    pub attachment: Option<Attachment>,
    /// Location in internal units.
    pub at: Point,
}

/// Searches from `p` along `dir` for the first point inside `shape`, looking
/// at most `reach` units ahead.
fn first_point_inside(shape: &Polygon, p: Point, dir: (f64, f64), reach: i64) -> Option<Point> {
    (0..=reach).find_map(|s| {
        let q = Point::from_f64(p.x as f64 + dir.0 * s as f64, p.y as f64 + dir.1 * s as f64);
        shape.encloses(&q).then_some(q)
    })
}

/// Plans the end of a wire at `p`, heading along `dir`.
///
/// A port containing `p` wins. Otherwise the first port found ahead of `p`
/// within `reach` is used, and the end moves into it.
pub(crate) fn plan_end(
    state: &CellState,
    layer: LayerId,
    p: Point,
    dir: Option<(f64, f64)>,
    reach: i64,
) -> EndPlan {
    let attach = |id: usize, at: Point| {
        let entry = state.ports.get(id);
        entry.port().map(|(terminal, port)| EndPlan {
            attachment: Some(Attachment {
                terminal,
                port: port.clone(),
                shape: entry.shape.clone(),
            }),
            at,
        })
    };
    if let Some(id) = state.ports.port_at(layer, p) {
        if let Some(plan) = attach(id, p) {
            return plan;
        }
    }
    if let Some(dir) = dir {
        let q = Point::from_f64(
            p.x as f64 + dir.0 * reach as f64,
            p.y as f64 + dir.1 * reach as f64,
        );
        if let Some(segment) = crate::tech::segment_outline(p, q, 2, false, false) {
            for id in state.ports.touching(layer, &segment) {
                let entry = state.ports.get(id);
                if !entry.is_port() {
                    continue;
                }
                if let Some(at) = first_point_inside(&entry.shape, p, dir, reach) {
                    if let Some(plan) = attach(id, at) {
                        return plan;
                    }
                }
            }
        }
    }
    EndPlan {
        attachment: None,
        at: p,
    }
}

/// Returns `true` if every attached end lies inside its port.
fn ends_in_ports(plans: &[EndPlan; 2], ends: [Point; 2]) -> bool {
    plans.iter().zip(ends).all(|(plan, at)| {
        plan.attachment
            .as_ref()
            .map_or(true, |a| a.shape.encloses(&at))
    })
}

/// The terminal for a planned end, placing a pin when nothing is there yet.
pub(crate) fn terminal_for(
    state: &mut CellState,
    layer: LayerId,
    arc: &ArcProto,
    plan: &EndPlan,
    at: Point,
) -> Result<(Terminal, ArcStr)> {
    if let Some(a) = &plan.attachment {
        return Ok((a.terminal, a.port.clone()));
    }
    if let Some(id) = state.ports.port_at(layer, at) {
        if let Some((terminal, port)) = state.ports.get(id).port() {
            return Ok((terminal, port.clone()));
        }
    }
    let (node, port) = state.place_pin(arc, at)?;
    Ok((node.into(), port))
}

/// Adds a wire between two planned ends.
pub(crate) fn connect(
    state: &mut CellState,
    layer: LayerId,
    arc: &ArcProto,
    width: i64,
    plans: &[EndPlan; 2],
    ends: [Point; 2],
    extended: [bool; 2],
) -> Result<()> {
    let (t0, p0) = terminal_for(state, layer, arc, &plans[0], ends[0])?;
    let (t1, p1) = terminal_for(state, layer, arc, &plans[1], ends[1])?;
    let wire = Wire::new(
        arc.name.clone(),
        width,
        WireEnd::new(t0, p0, ends[0]).with_extended(extended[0]),
        WireEnd::new(t1, p1, ends[1]).with_extended(extended[1]),
    );
    state.place_wire(wire)?;
    Ok(())
}

/// Realizes one centerline as a wire, narrowing it until it fits.
fn realize(state: &mut CellState, layer: LayerId, arc: &ArcProto, line: &Centerline) -> Result<bool> {
    let reach = line.width / 2 + 2 * SCALE;
    let edge = line.edge();
    let (fwd, back) = if edge.is_degenerate() {
        (None, None)
    } else {
        let (ux, uy) = edge.unit();
        (Some((ux, uy)), Some((-ux, -uy)))
    };
    let plans = [
        plan_end(state, layer, line.start, back, reach),
        plan_end(state, layer, line.end, fwd, reach),
    ];
    let base = [plans[0].at, plans[1].at];

    let mut candidates = Vec::with_capacity(2);
    if let Some(grid) = state.opts().alignment.filter(|&g| g > 0) {
        let mut snapped = base;
        for (end, plan) in snapped.iter_mut().zip(&plans) {
            if plan.attachment.is_none() {
                *end = end.snap_to_grid(to_internal(grid));
            }
        }
        if snapped != base {
            candidates.push(snapped);
        }
    }
    candidates.push(base);
    let mut extensions = vec![line.extend];
    if line.extend != [false, false] {
        extensions.push([false, false]);
    }

    for width in whole_widths(arc, line.width) {
        for &ends in &candidates {
            if !ends_in_ports(&plans, ends) {
                continue;
            }
            for &extended in &extensions {
                if state.arc_fits(arc, width, ends, extended) {
                    connect(state, layer, arc, width, &plans, ends, extended)?;
                    return Ok(true);
                }
            }
        }
    }
    Ok(false)
}

/// Whole-unit wire widths of `arc` up to `widest`, widest first, in internal units.
pub(crate) fn whole_widths(arc: &ArcProto, widest: i64) -> Vec<i64> {
    let min = to_internal(arc.min_width.max(1));
    let max = widest - widest.rem_euclid(SCALE);
    (min..=max).rev().step_by(SCALE as usize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tech::sample;

    #[test]
    fn looks_ahead_into_a_port() {
        let port = Rect::from_sides(-10, -10, 10, 10).to_polygon();
        assert_eq!(
            first_point_inside(&port, Point::new(40, 0), (-1., 0.), 40),
            Some(Point::new(10, 0))
        );
        assert_eq!(first_point_inside(&port, Point::new(40, 0), (-1., 0.), 20), None);
    }

    #[test]
    fn widths_are_whole_units() {
        let tech = sample::cmos();
        let arc = tech.arc("metal-1").unwrap();
        assert_eq!(whole_widths(arc, 30), vec![30]);
        assert_eq!(whole_widths(arc, 57), vec![50, 40, 30]);
        assert!(whole_widths(arc, 25).is_empty());
    }
}
