//! Skeletonization of merged regions into centerlines.
//!
//! A region is decomposed by pairing facing antiparallel edges. Every pair
//! whose overlap spans at least its separation yields a candidate centerline
//! running midway between the edges. Accepted centerlines are subtracted from
//! a scratch copy of the region and the remainder is decomposed again until
//! nothing new is found. A final pass joins centerlines at their intersections.

use geometry::prelude::*;

use crate::merge::{GeoMerge, MergedRegion, PolygonMerge};
use crate::tech::segment_outline;

const EPS: f64 = 1e-6;

/// A candidate wire segment in internal units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Centerline {
    pub start: Point,
    pub end: Point,
    pub width: i64,
    /// Whether each end meets another centerline.
    pub hub: [bool; 2],
    /// Whether each end is extended by half the width.
    pub extend: [bool; 2],
}

impl Centerline {
    pub fn new(start: Point, end: Point, width: i64) -> Self {
        Self {
            start,
            end,
            width,
            hub: [false; 2],
            extend: [true; 2],
        }
    }

    pub fn edge(&self) -> Edge {
        Edge::new(self.start, self.end)
    }

    pub fn length(&self) -> f64 {
        self.start.dist(self.end)
    }

    pub fn end(&self, i: usize) -> Point {
        if i == 0 {
            self.start
        } else {
            self.end
        }
    }

    fn set_end(&mut self, i: usize, p: Point) {
        if i == 0 {
            self.start = p;
        } else {
            self.end = p;
        }
    }

    /// The covered area, honoring the extension flags.
    pub fn outline(&self) -> Option<Polygon> {
        segment_outline(self.start, self.end, self.width, self.extend[0], self.extend[1])
    }

    fn same_as(&self, other: &Self) -> bool {
        self.width == other.width
            && ((self.start == other.start && self.end == other.end)
                || (self.start == other.end && self.end == other.start))
    }

    fn is_perpendicular(&self, other: &Self) -> bool {
        let (a, b) = (self.edge(), other.edge());
        !a.is_degenerate() && !b.is_degenerate() && a.vector().dot(b.vector()) == 0
    }
}

/// Parameters of a decomposition.
#[derive(Debug, Clone, Copy)]
pub struct CenterlineOpts {
    /// Narrowest centerline produced, in internal units.
    pub min_width: i64,
    /// Maximum relative width difference within one pass.
    pub width_tolerance: f64,
    pub max_passes: usize,
}

/// Decomposes `region` into centerlines.
///
/// `fits` decides whether a polygon is covered by the source geometry;
/// every returned centerline's outline satisfies it.
pub fn centerlines(
    region: &MergedRegion,
    opts: &CenterlineOpts,
    fits: &dyn Fn(&Polygon) -> bool,
) -> Vec<Centerline> {
    let mut remaining = GeoMerge::new();
    remaining.add_region(0u8, region);
    let mut out: Vec<Centerline> = Vec::new();
    let mut passes = 0;
    while passes < opts.max_passes && !remaining.is_empty(0) {
        passes += 1;
        let found = one_pass(&remaining, opts, fits, &out);
        if found.is_empty() {
            break;
        }
        for c in &found {
            if let Some(outline) = c.outline() {
                remaining.subtract(0, &outline);
            }
        }
        out.extend(found);
    }

    join(&mut out, fits);

    // Cover whatever the joined centerlines no longer reach.
    if passes < opts.max_passes {
        let mut left = GeoMerge::new();
        left.add_region(0u8, region);
        for c in &out {
            if let Some(outline) = c.outline() {
                left.subtract(0, &outline);
            }
        }
        if !left.is_empty(0) {
            let extra = one_pass(&left, opts, fits, &out);
            tracing::trace!(count = extra.len(), "auxiliary centerlines");
            out.extend(extra);
        }
    }
    out
}

fn one_pass(
    remaining: &GeoMerge<u8>,
    opts: &CenterlineOpts,
    fits: &dyn Fn(&Polygon) -> bool,
    existing: &[Centerline],
) -> Vec<Centerline> {
    let mut candidates = Vec::new();
    for region in remaining.regions(0) {
        let edges = region.edges();
        for (i, a) in edges.iter().enumerate() {
            for b in &edges[i + 1..] {
                if let Some(c) = pair_centerline(a, b, opts.min_width, fits) {
                    candidates.push(c);
                }
            }
        }
    }
    candidates.sort_by(|a, b| {
        a.width
            .cmp(&b.width)
            .then_with(|| b.length().total_cmp(&a.length()))
            .then_with(|| (a.start.x, a.start.y, a.end.x, a.end.y).cmp(&(b.start.x, b.start.y, b.end.x, b.end.y)))
    });

    let mut scratch = remaining.clone();
    let mut accepted: Vec<Centerline> = Vec::new();
    for c in candidates {
        if existing.iter().chain(accepted.iter()).any(|e| e.same_as(&c)) {
            continue;
        }
        if let Some(first) = accepted.first() {
            let spread = (c.width - first.width).abs() as f64;
            if spread > opts.width_tolerance * first.width as f64 && !c.is_perpendicular(first) {
                continue;
            }
        }
        let Some(outline) = c.outline() else {
            continue;
        };
        let before = scratch.area(0);
        let mut trial = scratch.clone();
        trial.subtract(0, &outline);
        if before - trial.area(0) < 0.5 * outline.area() {
            continue;
        }
        scratch = trial;
        accepted.push(c);
    }
    accepted
}

/// The centerline between two facing antiparallel edges, if any.
///
/// The span covered by either edge is preferred when its outline fits;
/// otherwise only the span the edges share is used.
fn pair_centerline(
    e1: &Edge,
    e2: &Edge,
    min_width: i64,
    fits: &dyn Fn(&Polygon) -> bool,
) -> Option<Centerline> {
    if !e1.is_antiparallel(e2) {
        return None;
    }
    let w = e1.signed_dist(e2.p0());
    if w <= EPS || e2.signed_dist(e1.p0()) <= EPS {
        return None;
    }
    let width = w.round() as i64;
    if width < min_width.max(1) {
        return None;
    }
    let len = e1.length();
    let (t0, t1) = (e1.project(e2.p0()), e1.project(e2.p1()));
    let (lo, hi) = (t0.min(t1), t0.max(t1));
    let (olo, ohi) = (lo.max(0.), hi.min(len));
    if ohi - olo <= EPS {
        return None;
    }
    let (ux, uy) = e1.unit();
    let (nx, ny) = (-uy * w / 2., ux * w / 2.);
    let make = |lo: f64, hi: f64| -> Option<Centerline> {
        if hi - lo < w - EPS {
            return None;
        }
        let (ax, ay) = e1.point_at(lo + w / 2.);
        let (bx, by) = e1.point_at(hi - w / 2.);
        let c = Centerline::new(
            Point::from_f64(ax + nx, ay + ny),
            Point::from_f64(bx + nx, by + ny),
            width,
        );
        c.outline().filter(|o| fits(o)).map(|_| c)
    };
    make(lo.min(0.), hi.max(len)).or_else(|| make(olo, ohi))
}

/// Where two centerlines meet, if their lines cross within reach of both.
fn meeting_point(a: &Centerline, b: &Centerline) -> Option<Point> {
    let (ea, eb) = (a.edge(), b.edge());
    if ea.is_degenerate() || eb.is_degenerate() {
        return None;
    }
    let (oa, ob) = (a.outline()?.bbox()?, b.outline()?.bbox()?);
    oa.intersection(ob)?;
    let (t, u) = ea.line_intersection(&eb)?;
    let tol = (a.width / 2 + b.width / 2 + 1) as f64;
    let within = |s: f64, len: f64| s >= -tol && s <= len + tol;
    if !within(t, ea.length()) || !within(u, eb.length()) {
        return None;
    }
    let (x, y) = ea.point_at(t);
    Some(Point::from_f64(x, y))
}

/// Moves the end of `lines[k]` near `p` onto `p`, or splits the line at `p`
/// when `p` is interior. `reach` is how close to an end `p` must be to count
/// as meeting that end.
fn attach(lines: &mut Vec<Centerline>, k: usize, p: Point, reach: f64, fits: &dyn Fn(&Polygon) -> bool) {
    let line = &lines[k];
    let len = line.length();
    let t = line.edge().project(p);
    let near_start = t <= reach;
    let near_end = t >= len - reach;
    let end = match (near_start, near_end) {
        (true, true) => Some(if t <= len / 2. { 0 } else { 1 }),
        (true, false) => Some(0),
        (false, true) => Some(1),
        (false, false) => None,
    };
    match end {
        Some(i) => {
            if line.end(i) == p {
                lines[k].hub[i] = true;
                return;
            }
            let mut moved = line.clone();
            moved.set_end(i, p);
            moved.hub[i] = true;
            moved.extend[i] = false;
            if moved.outline().is_some_and(|o| fits(&o)) {
                lines[k] = moved;
            }
        }
        None => {
            let mut head = line.clone();
            let mut tail = line.clone();
            head.end = p;
            head.hub[1] = true;
            tail.start = p;
            tail.hub[0] = true;
            lines[k] = head;
            lines.push(tail);
        }
    }
}

/// Joins centerlines at their intersections, then extends hub ends that can
/// be extended without leaving the source geometry.
fn join(lines: &mut Vec<Centerline>, fits: &dyn Fn(&Polygon) -> bool) {
    let mut a = 0;
    while a < lines.len() {
        let mut b = a + 1;
        while b < lines.len() {
            if let Some(p) = meeting_point(&lines[a], &lines[b]) {
                let (wa, wb) = (lines[a].width, lines[b].width);
                attach(lines, a, p, (wb / 2 + 1) as f64, fits);
                attach(lines, b, p, (wa / 2 + 1) as f64, fits);
            }
            b += 1;
        }
        a += 1;
    }
    for line in lines.iter_mut() {
        for i in 0..2 {
            if line.extend[i] {
                continue;
            }
            let mut extended = line.clone();
            extended.extend[i] = true;
            if extended.outline().is_some_and(|o| fits(&o)) {
                *line = extended;
            }
        }
    }
}

/// Orders centerlines into one path when they chain end to end.
pub fn chain(lines: &[Centerline]) -> Option<Vec<Point>> {
    let first = lines.first()?;
    if lines.len() == 1 {
        return Some(vec![first.start, first.end]);
    }
    let degree = |p: Point| {
        lines
            .iter()
            .filter(|l| l.start == p || l.end == p)
            .count()
    };
    // Start from a free end.
    let (start_line, start) = lines.iter().enumerate().find_map(|(i, l)| {
        if degree(l.start) == 1 {
            Some((i, l.start))
        } else if degree(l.end) == 1 {
            Some((i, l.end))
        } else {
            None
        }
    })?;
    let mut used = vec![false; lines.len()];
    let mut points = vec![start];
    let mut current = start_line;
    let mut at = start;
    loop {
        used[current] = true;
        let l = &lines[current];
        at = if l.start == at { l.end } else { l.start };
        points.push(at);
        match lines
            .iter()
            .enumerate()
            .find(|(i, l)| !used[*i] && (l.start == at || l.end == at))
        {
            Some((i, _)) => current = i,
            None => break,
        }
    }
    used.iter().all(|u| *u).then_some(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::GeoMerge;

    fn region(rects: &[Rect]) -> (GeoMerge<u8>, MergedRegion) {
        let mut merge = GeoMerge::new();
        for r in rects {
            merge.add(0, &r.to_polygon());
        }
        let region = merge.regions(0).remove(0);
        (merge, region)
    }

    fn opts() -> CenterlineOpts {
        CenterlineOpts {
            min_width: 1,
            width_tolerance: 0.2,
            max_passes: 32,
        }
    }

    #[test]
    fn bar_becomes_one_centerline() {
        let (merge, region) = region(&[Rect::from_sides(0, 0, 100, 10)]);
        let lines = centerlines(&region, &opts(), &|p| merge.contains(0, p));
        assert_eq!(lines.len(), 1);
        let l = &lines[0];
        assert_eq!(l.width, 10);
        let mut ends = [l.start, l.end];
        ends.sort_by_key(|p| p.x);
        assert_eq!(ends, [Point::new(5, 5), Point::new(95, 5)]);
        assert_eq!(l.extend, [true, true]);
    }

    #[test]
    fn l_shape_meets_at_a_hub() {
        let (merge, region) = region(&[
            Rect::from_sides(0, 0, 100, 10),
            Rect::from_sides(90, 0, 100, 100),
        ]);
        let lines = centerlines(&region, &opts(), &|p| merge.contains(0, p));
        assert_eq!(lines.len(), 2);
        let hub = Point::new(95, 5);
        for l in &lines {
            assert!(l.start == hub || l.end == hub, "{l:?}");
            assert!(l.hub.iter().any(|h| *h));
        }
        let mut covered = GeoMerge::new();
        for l in &lines {
            covered.add(0u8, &l.outline().unwrap());
        }
        assert!(covered.difference_area(&merge, 0) < 1e-3);
    }

    #[test]
    fn t_junction_splits_the_bar() {
        let (merge, region) = region(&[
            Rect::from_sides(0, 0, 100, 10),
            Rect::from_sides(45, 10, 55, 60),
        ]);
        let lines = centerlines(&region, &opts(), &|p| merge.contains(0, p));
        assert_eq!(lines.len(), 3);
        let hub = Point::new(50, 5);
        assert!(lines.iter().all(|l| l.start == hub || l.end == hub));
    }

    #[test]
    fn chain_orders_segments() {
        let a = Centerline::new(Point::new(0, 0), Point::new(10, 0), 2);
        let b = Centerline::new(Point::new(10, 10), Point::new(10, 0), 2);
        let c = Centerline::new(Point::new(10, 10), Point::new(20, 10), 2);
        let path = chain(&[b.clone(), a.clone(), c.clone()]).unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(path[1], Point::new(10, 0));
        assert_eq!(path[2], Point::new(10, 10));
        assert!(chain(&[a, c]).is_none());
    }
}
