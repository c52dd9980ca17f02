//! Contact and via extraction.
//!
//! Each pending cut is matched against the contact templates of its cut layer,
//! largest first. A matching multi-cut template is grown over the surrounding
//! grid of cuts before falling back to a single-cut placement.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use geometry::prelude::*;
use layir::Node;
use tracing::{span, Level};

use crate::cell::CellState;
use crate::cuts::{Cut, CutId};
use crate::diag::{IssueKind, RejectReason, Rejection};
use crate::error::{ExtractError, Result};
use crate::merge::PolygonMerge;
use crate::scale::{body_placement, to_external, SCALE};
use crate::tech::{LayerFunction, MultiCut, NodeFunction};
use crate::template::ContactTemplate;

/// Upper bound on the number of cuts explored around one cut.
const MAX_CLUSTER: usize = 4096;

/// A contact ready to be placed, with the cuts it consumes.
#[derive(Debug, Clone)]
struct ContactMatch {
    node: Node,
    cuts: Vec<CutId>,
}

type Fit<T> = std::result::Result<T, RejectReason>;

pub fn extract(state: &mut CellState) -> Result<()> {
    let span = span!(Level::INFO, "contacts");
    let _guard = span.enter();

    let mut layers: Vec<_> = state.cuts.keys().copied().collect();
    layers.sort();
    for layer in layers {
        let ids: Vec<CutId> = state.cuts[&layer].pending().map(|c| c.id).collect();
        for id in ids {
            let Some(cut) = state.cuts[&layer].get(id).cloned() else {
                continue;
            };
            match find_contact(state, &cut)? {
                Ok(m) => realize(state, &cut, m)?,
                Err(reasons) => {
                    state.issue(Some(cut.rect), IssueKind::UnresolvedCut { reasons });
                }
            }
        }
    }
    tracing::debug!(contacts = state.stats.contacts, "placed contacts");
    Ok(())
}

fn realize(state: &mut CellState, cut: &Cut, m: ContactMatch) -> Result<()> {
    tracing::trace!(proto = %m.node.proto(), cuts = m.cuts.len(), "placing contact");
    let id = state.place_node(m.node)?;
    state.consume_node(id)?;
    let index = state
        .cuts
        .get_mut(&cut.layer)
        .ok_or_else(|| ExtractError::invariant(state.cell.name(), "cut layer vanished"))?;
    for cut in m.cuts {
        index.remove(cut);
    }
    Ok(())
}

fn find_contact(
    state: &CellState,
    cut: &Cut,
) -> Result<std::result::Result<ContactMatch, Vec<Rejection>>> {
    let mut reasons: Vec<Rejection> = Vec::new();
    for template in state.ctx.templates.contacts_for(cut.layer) {
        match try_template(state, template, cut)? {
            Ok(m) => return Ok(Ok(m)),
            Err(reason) => {
                let rejection = Rejection {
                    template: template.proto.clone(),
                    reason,
                };
                if reasons.last() != Some(&rejection) {
                    reasons.push(rejection);
                }
            }
        }
    }
    Ok(Err(reasons))
}

fn try_template(
    state: &CellState,
    t: &ContactTemplate,
    cut: &Cut,
) -> Result<Fit<ContactMatch>> {
    let size = (cut.rect.width(), cut.rect.height());
    if size != t.cut_size {
        return Ok(Err(RejectReason::CutSizeMismatch {
            expected: (to_external(t.cut_size.0), to_external(t.cut_size.1)),
            actual: (to_external(size.0), to_external(size.1)),
        }));
    }
    if let Err(reason) = check_frame(state, t, cut.rect, (0, 0)) {
        return Ok(Err(reason));
    }
    if let Some(rule) = t.multicut {
        if let Some(m) = grow(state, t, rule, cut)? {
            return Ok(Ok(m));
        }
    }
    single(state, t, cut)
}

fn grown(sides: Sides<i64>, gx: i64, gy: i64) -> Sides<i64> {
    sides.map(|side, v| match side {
        Side::Left | Side::Right => v + gx,
        Side::Bot | Side::Top => v + gy,
    })
}

/// Checks the template's layers around a cut array grown by `(gx, gy)` per side.
fn check_frame(
    state: &CellState,
    t: &ContactTemplate,
    array: Rect,
    (gx, gy): (i64, i64),
) -> Fit<()> {
    let tech = state.tech();
    for layer in &t.frame.layers {
        let rect = array.expand_sides(grown(layer.surround, gx, gy));
        if !rect.is_some_and(|r| state.original.contains(layer.layer, &r.to_polygon())) {
            return Err(RejectReason::MissingLayer {
                layer: tech.layer_name(layer.layer),
            });
        }
    }
    let under = array.to_polygon();
    for &layer in &t.forbidden {
        if state.original.intersects(layer, &under) {
            return Err(RejectReason::UnexpectedLayer {
                layer: tech.layer_name(layer),
            });
        }
    }
    if let NodeFunction::WellContact(ty) = t.function {
        let spot = Rect::from_center(array.center(), 2 * SCALE, 2 * SCALE).to_polygon();
        let opposite = LayerFunction::Well(ty.opposite());
        for layer in tech.layer_ids().filter(|&l| tech.layer_function(l) == opposite) {
            if state.original.intersects(state.canonical(layer), &spot) {
                return Err(RejectReason::OppositeWell {
                    layer: tech.layer_name(layer),
                });
            }
        }
    }
    Ok(())
}

/// The contact node whose cut array spans `array`, with its body grown by
/// `(gx, gy)` per side.
fn contact_node(t: &ContactTemplate, array: Rect, (gx, gy): (i64, i64)) -> Fit<Node> {
    let body = array
        .expand_sides(grown(t.frame.body, gx, gy))
        .ok_or(RejectReason::Orientation)?;
    let (center, w, h) = body_placement(body).ok_or(RejectReason::OffGrid)?;
    let (w, h) = if t.rotation.is_transposing() { (h, w) } else { (w, h) };
    Ok(Node::new(t.proto.clone(), center, w, h).with_orientation(t.rotation))
}

/// Matches the cuts `node` would draw against the pending cuts.
///
/// Returns the consumed cuts, or `None` if the layouts differ and approximate
/// cuts are disabled. Approximate cuts consume every pending cut inside the
/// node's body.
fn match_cuts(
    state: &CellState,
    cut: &Cut,
    node: &Node,
    expected: &BTreeSet<CutId>,
) -> Result<Option<Vec<CutId>>> {
    let index = &state.cuts[&cut.layer];
    let mut found = BTreeSet::new();
    let mut exact = true;
    for (layer, poly) in state.tech().node_shapes(node)? {
        if state.canonical(layer) != cut.layer {
            continue;
        }
        let Some(rect) = poly.as_rect() else {
            exact = false;
            continue;
        };
        match index.exact(rect) {
            Some(c) => {
                found.insert(c.id);
            }
            None => exact = false,
        }
    }
    if exact && &found == expected {
        return Ok(Some(found.into_iter().collect()));
    }
    if !state.opts().approximate_cuts {
        return Ok(None);
    }
    let bounds = node.bounds();
    let consumed: Vec<CutId> = index
        .query(bounds)
        .into_iter()
        .filter(|c| bounds.encloses(&c.rect))
        .map(|c| c.id)
        .collect();
    tracing::debug!(cuts = consumed.len(), "accepting approximate cut layout");
    Ok(consumed.contains(&cut.id).then_some(consumed))
}

fn single(state: &CellState, t: &ContactTemplate, cut: &Cut) -> Result<Fit<ContactMatch>> {
    let node = match contact_node(t, cut.rect, (0, 0)) {
        Ok(node) => node,
        Err(reason) => return Ok(Err(reason)),
    };
    if let Err(reason) = state.node_fits(&node)? {
        return Ok(Err(reason));
    }
    let expected = BTreeSet::from([cut.id]);
    Ok(match match_cuts(state, cut, &node, &expected)? {
        Some(cuts) => Ok(ContactMatch { node, cuts }),
        None => Err(RejectReason::CutLayout),
    })
}

/// The distance to the nearest same-size cut along `dir`, if any.
fn observed_pitch(state: &CellState, cut: &Cut, dir: Dir, reach: i64) -> Option<i64> {
    let window = cut.rect.expand_dir(dir, reach);
    state.cuts[&cut.layer]
        .query(window)
        .into_iter()
        .filter(|c| {
            c.id != cut.id
                && c.rect.width() == cut.rect.width()
                && c.rect.height() == cut.rect.height()
        })
        .filter_map(|c| {
            let (a, b) = (c.rect.lower_left(), cut.rect.lower_left());
            let d = a.coord(dir) - b.coord(dir);
            (d != 0 && a.coord(dir.perp()) == b.coord(dir.perp())).then_some(d.abs())
        })
        .min()
}

/// The largest all-populated rectangle of lattice cells containing the origin.
///
/// Returns `(imin, imax, jmin, jmax)`. Ties prefer the rectangle found first
/// when scanning columns outward from the origin.
pub(crate) fn largest_rectangle(cells: &BTreeSet<(i32, i32)>) -> (i32, i32, i32, i32) {
    let run = |i: i32, step: i32| -> i32 {
        let mut n = 0;
        while cells.contains(&(i, (n + 1) * step)) {
            n += 1;
        }
        n
    };
    let mut best = (0, 0, 0, 0);
    let mut best_area = 1;
    let mut imin = 0;
    while cells.contains(&(imin, 0)) {
        let mut imax = 0;
        let (mut down, mut up) = (i32::MAX, i32::MAX);
        for i in imin..=0 {
            down = down.min(run(i, -1));
            up = up.min(run(i, 1));
        }
        while cells.contains(&(imax, 0)) {
            if imax > 0 {
                down = down.min(run(imax, -1));
                up = up.min(run(imax, 1));
            }
            let area = (imax - imin + 1) * (down + up + 1);
            if area > best_area {
                best_area = area;
                best = (imin, imax, -down, up);
            }
            imax += 1;
        }
        imin -= 1;
    }
    best
}

fn grow(
    state: &CellState,
    t: &ContactTemplate,
    rule: MultiCut,
    cut: &Cut,
) -> Result<Option<ContactMatch>> {
    let reach = 2 * (rule.size + rule.spacing).max(cut.rect.width().max(cut.rect.height()));
    let px = observed_pitch(state, cut, Dir::Horiz, reach);
    let py = observed_pitch(state, cut, Dir::Vert, reach);
    if px.is_none() && py.is_none() {
        return Ok(None);
    }
    let index = &state.cuts[&cut.layer];

    // Breadth-first walk over the lattice of cuts spaced by the observed pitch.
    let mut lattice: BTreeMap<(i32, i32), CutId> = BTreeMap::from([((0, 0), cut.id)]);
    let mut queue = VecDeque::from([(0i32, 0i32)]);
    while let Some((i, j)) = queue.pop_front() {
        if lattice.len() >= MAX_CLUSTER {
            break;
        }
        let mut next = Vec::with_capacity(4);
        if px.is_some() {
            next.extend([(i - 1, j), (i + 1, j)]);
        }
        if py.is_some() {
            next.extend([(i, j - 1), (i, j + 1)]);
        }
        for (ni, nj) in next {
            if lattice.contains_key(&(ni, nj)) {
                continue;
            }
            let dx = ni as i64 * px.unwrap_or(0);
            let dy = nj as i64 * py.unwrap_or(0);
            let rect = cut.rect.translate(Point::new(dx, dy));
            if let Some(c) = index.exact(rect) {
                lattice.insert((ni, nj), c.id);
                queue.push_back((ni, nj));
            }
        }
    }

    let cells: BTreeSet<(i32, i32)> = lattice.keys().copied().collect();
    let (imin, imax, jmin, jmax) = largest_rectangle(&cells);
    if imin == imax && jmin == jmax {
        return Ok(None);
    }
    let mut array = cut.rect;
    let mut expected = BTreeSet::new();
    for i in imin..=imax {
        for j in jmin..=jmax {
            let id = lattice
                .get(&(i, j))
                .ok_or_else(|| state.invariant("cut array is not rectangular"))?;
            if let Some(c) = index.get(*id) {
                array = array.union(c.rect);
            }
            expected.insert(*id);
        }
    }
    if check_frame(state, t, array, (0, 0)).is_err() {
        return Ok(None);
    }

    // Grow the body in half-unit steps per side while the cut count stays the same.
    let steps = (rule.size + rule.spacing - 1) / SCALE;
    let half = SCALE / 2;
    let largest = |fits: &dyn Fn(i64) -> bool| -> i64 {
        let (mut lo, mut hi) = (0, steps);
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            if fits(mid) {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        lo
    };
    let kx = largest(&|k| check_frame(state, t, array, (k * half, 0)).is_ok());
    let ky = largest(&|k| check_frame(state, t, array, (kx * half, k * half)).is_ok());

    let Ok(node) = contact_node(t, array, (kx * half, ky * half)) else {
        return Ok(None);
    };
    if state.node_fits(&node)?.is_err() {
        return Ok(None);
    }
    Ok(match_cuts(state, cut, &node, &expected)?.map(|cuts| ContactMatch { node, cuts }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(cells: &[(i32, i32)]) -> BTreeSet<(i32, i32)> {
        cells.iter().copied().collect()
    }

    #[test]
    fn full_grid_is_kept() {
        let cells = grid(&[(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
        assert_eq!(largest_rectangle(&cells), (0, 2, 0, 1));
    }

    #[test]
    fn ragged_cluster_reduces_to_rectangle() {
        // x x x
        // x o
        let cells = grid(&[(-1, 0), (0, 0), (-1, 1), (0, 1), (1, 1)]);
        assert_eq!(largest_rectangle(&cells), (-1, 0, 0, 1));
    }

    #[test]
    fn lone_cut_stays_single() {
        let cells = grid(&[(0, 0), (1, 1)]);
        assert_eq!(largest_rectangle(&cells), (0, 0, 0, 0));
    }
}
