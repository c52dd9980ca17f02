//! Connection bridging.
//!
//! Small regions left on routable layers after wire extraction are joined
//! to the networks they touch: a region touching one network is covered by a
//! stub wire, a region touching two is spanned by a straight or bent wire.
//! Regions touching more networks are reported and left alone.

use geometry::prelude::*;
use tracing::{span, Level};

use crate::cell::CellState;
use crate::diag::IssueKind;
use crate::error::Result;
use crate::merge::{GeoMerge, MergedRegion, PolygonMerge};
use crate::networks::NetKey;
use crate::ports::Owner;
use crate::scale::to_internal;
use crate::tech::{ArcProto, LayerId};
use crate::wire::{connect, whole_widths, Attachment, EndPlan};

pub fn extract(state: &mut CellState) -> Result<()> {
    let span = span!(Level::INFO, "bridges");
    let _guard = span.enter();

    for (layer, arc) in state.routable_layers() {
        for region in state.working.regions(layer) {
            let nets = touching_nets(state, layer, &region);
            let bridged = match nets.len() {
                0 => false,
                1 => stub(state, layer, arc, &region, nets[0].1)?,
                2 => span_two(state, layer, arc, &region, nets[0].1, nets[1].1)?,
                n => {
                    if let Some(bbox) = region.bbox() {
                        state.reported.push((layer, bbox));
                    }
                    state.issue(region.bbox(), IssueKind::AmbiguousBridge { networks: n });
                    false
                }
            };
            if bridged {
                state.stats.bridges += 1;
            }
        }
    }
    tracing::debug!(bridges = state.stats.bridges, "bridged leftover regions");
    Ok(())
}

/// The distinct networks touching `region`, each with the first entry found on it.
fn touching_nets(
    state: &mut CellState,
    layer: LayerId,
    region: &MergedRegion,
) -> Vec<(NetKey, usize)> {
    let mut out: Vec<(NetKey, usize)> = Vec::new();
    for id in state.ports.touching(layer, &region.outline) {
        let net = state.nets.find(state.ports.get(id).net);
        if !out.iter().any(|(n, _)| *n == net) {
            out.push((net, id));
        }
    }
    out
}

/// Where a bridging wire attaches to index entry `id`, nearest `target`.
fn anchor(state: &CellState, id: usize, target: Point) -> Option<EndPlan> {
    let entry = state.ports.get(id);
    match &entry.owner {
        Owner::Port { terminal, port } => {
            let at = entry.shape.bbox()?.center();
            entry.shape.encloses(&at).then(|| EndPlan {
                attachment: Some(Attachment {
                    terminal: *terminal,
                    port: port.clone(),
                    shape: entry.shape.clone(),
                }),
                at,
            })
        }
        Owner::Wire(wire) => {
            let wire = state.cell.try_wire(*wire)?;
            let end = wire
                .ends()
                .iter()
                .min_by_key(|e| e.location().dist2(target))?;
            let port = state.ports.find_port(end.terminal(), end.port())?;
            Some(EndPlan {
                attachment: Some(Attachment {
                    terminal: end.terminal(),
                    port: end.port().clone(),
                    shape: state.ports.get(port).shape.clone(),
                }),
                at: end.location(),
            })
        }
    }
}

/// Candidate widths for a bridge across `region`, widest first.
///
/// The long side of the region bounds the width from above, but the arc's
/// minimum width is always tried.
fn widths(arc: &ArcProto, region: &MergedRegion) -> Vec<i64> {
    let Some(bbox) = region.bbox() else {
        return Vec::new();
    };
    let long = bbox.width().max(bbox.height());
    whole_widths(arc, long.max(to_internal(arc.min_width)))
}

fn free(at: Point) -> EndPlan {
    EndPlan {
        attachment: None,
        at,
    }
}

/// Covers a region touching a single network with a wire from that network
/// into the region.
///
/// The wire must overlap the region; one that only runs over geometry the
/// network already covers is not a stub.
fn stub(
    state: &mut CellState,
    layer: LayerId,
    arc: &ArcProto,
    region: &MergedRegion,
    id: usize,
) -> Result<bool> {
    let Some(bbox) = region.bbox() else {
        return Ok(false);
    };
    let Some(from) = anchor(state, id, bbox.center()) else {
        return Ok(false);
    };
    let a = from.at;
    let c = bbox.center();
    let lo = bbox.lower_left();
    let hi = bbox.upper_right();
    // Axis-aligned targets across the region, farthest reach first.
    let mut targets: Vec<Point> = Vec::new();
    for t in [
        Point::new(c.x, a.y),
        Point::new(a.x, c.y),
        Point::new(lo.x, a.y),
        Point::new(hi.x, a.y),
        Point::new(a.x, lo.y),
        Point::new(a.x, hi.y),
    ] {
        if t != a && !targets.contains(&t) {
            targets.push(t);
        }
    }
    targets.sort_by_key(|t| std::cmp::Reverse(t.dist2(a)));
    let mut inside = GeoMerge::new();
    inside.add_region(0u8, region);
    let tech = state.tech();
    let reaches = |width: i64, ends: [Point; 2], extended: [bool; 2]| {
        tech.arc_shapes(arc, width, ends, extended)
            .iter()
            .any(|(_, p)| inside.intersects(0, p))
    };
    for width in widths(arc, region) {
        for &t in &targets {
            for extended in [[true, true], [true, false]] {
                if state.arc_fits(arc, width, [a, t], extended) && reaches(width, [a, t], extended)
                {
                    let plans = [from.clone(), free(t)];
                    connect(state, layer, arc, width, &plans, [a, t], extended)?;
                    return Ok(true);
                }
            }
        }
    }
    Ok(false)
}

/// Joins the two networks touching a region with a straight wire, or with
/// two wires meeting at a corner pin.
fn span_two(
    state: &mut CellState,
    layer: LayerId,
    arc: &ArcProto,
    region: &MergedRegion,
    first: usize,
    second: usize,
) -> Result<bool> {
    let Some(center) = region.bbox().map(|b| b.center()) else {
        return Ok(false);
    };
    let (Some(from), Some(to)) = (anchor(state, first, center), anchor(state, second, center))
    else {
        return Ok(false);
    };
    let (a, b) = (from.at, to.at);
    for width in widths(arc, region) {
        if a.x == b.x || a.y == b.y {
            if state.arc_fits(arc, width, [a, b], [true, true]) {
                let plans = [from.clone(), to.clone()];
                connect(state, layer, arc, width, &plans, [a, b], [true, true])?;
                return Ok(true);
            }
            continue;
        }
        for corner in [Point::new(a.x, b.y), Point::new(b.x, a.y)] {
            if state.arc_fits(arc, width, [a, corner], [true, true])
                && state.arc_fits(arc, width, [corner, b], [true, true])
            {
                let ext = [true, true];
                let plans = [from.clone(), free(corner)];
                connect(state, layer, arc, width, &plans, [a, corner], ext)?;
                let plans = [free(corner), to.clone()];
                connect(state, layer, arc, width, &plans, [corner, b], ext)?;
                return Ok(true);
            }
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tech::sample;

    #[test]
    fn widths_run_from_the_long_side_down() {
        let tech = sample::cmos();
        let arc = tech.arc("metal-1").unwrap();
        let region = MergedRegion {
            outline: Rect::from_sides(0, 0, 20, 57).to_polygon(),
            holes: Vec::new(),
        };
        assert_eq!(widths(arc, &region), vec![50, 40, 30]);
        let scrap = MergedRegion {
            outline: Rect::from_sides(0, 0, 10, 10).to_polygon(),
            holes: Vec::new(),
        };
        assert_eq!(widths(arc, &scrap), vec![30]);
    }
}
