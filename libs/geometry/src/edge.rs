//! Straight polygon edges and line segments.

use serde::{Deserialize, Serialize};

use crate::dir::Dir;
use crate::point::Point;
use crate::transform::{TransformMut, Transformation, TranslateMut};

/// A directed line segment from `p0` to `p1`.
///
/// Edges of a polygon stored in counterclockwise order have the
/// polygon's interior on their left.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, PartialEq, Eq)]
pub struct Edge {
    p0: Point,
    p1: Point,
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl Edge {
    /// Creates a new edge running from `p0` to `p1`.
    pub const fn new(p0: Point, p1: Point) -> Self {
        Self { p0, p1 }
    }

    /// The starting point.
    #[inline]
    pub const fn p0(&self) -> Point {
        self.p0
    }

    /// The ending point.
    #[inline]
    pub const fn p1(&self) -> Point {
        self.p1
    }

    /// The vector from `p0` to `p1`.
    #[inline]
    pub fn vector(&self) -> Point {
        self.p1 - self.p0
    }

    /// The same segment, traversed the other way.
    pub const fn reversed(&self) -> Self {
        Self::new(self.p1, self.p0)
    }

    /// The Euclidean length of the edge.
    pub fn length(&self) -> f64 {
        self.p0.dist(self.p1)
    }

    /// Whether the edge has zero length.
    pub fn is_degenerate(&self) -> bool {
        self.p0 == self.p1
    }

    /// The midpoint of the edge, rounded to the integer grid.
    pub fn midpoint(&self) -> Point {
        Point::from_f64(
            (self.p0.x + self.p1.x) as f64 / 2.,
            (self.p0.y + self.p1.y) as f64 / 2.,
        )
    }

    /// The direction of the edge, if it is axis-aligned and not degenerate.
    pub fn dir(&self) -> Option<Dir> {
        let v = self.vector();
        match (v.x == 0, v.y == 0) {
            (true, false) => Some(Dir::Vert),
            (false, true) => Some(Dir::Horiz),
            _ => None,
        }
    }

    /// A canonical key shared by all edges parallel to this one,
    /// regardless of traversal direction.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let a = Edge::new(Point::new(0, 0), Point::new(20, 10));
    /// let b = Edge::new(Point::new(50, 30), Point::new(10, 10));
    /// assert_eq!(a.direction_key(), b.direction_key());
    /// ```
    pub fn direction_key(&self) -> (i64, i64) {
        let v = self.vector();
        let g = gcd(v.x, v.y).max(1);
        let (x, y) = (v.x / g, v.y / g);
        if x < 0 || (x == 0 && y < 0) {
            (-x, -y)
        } else {
            (x, y)
        }
    }

    /// Whether `self` and `other` are parallel (including anti-parallel).
    pub fn is_parallel(&self, other: &Edge) -> bool {
        self.vector().cross(other.vector()) == 0
    }

    /// Whether `self` and `other` run in opposite directions along parallel lines.
    pub fn is_antiparallel(&self, other: &Edge) -> bool {
        self.is_parallel(other) && self.vector().dot(other.vector()) < 0
    }

    /// The unit vector along the edge.
    pub fn unit(&self) -> (f64, f64) {
        let (dx, dy) = self.vector().to_f64();
        let len = dx.hypot(dy);
        (dx / len, dy / len)
    }

    /// The signed distance from the line through this edge to `p`.
    ///
    /// Positive values lie to the left of the edge.
    pub fn signed_dist(&self, p: Point) -> f64 {
        self.vector().cross(p - self.p0) as f64 / self.length()
    }

    /// The parameter of the orthogonal projection of `p` onto this edge's line,
    /// measured as a distance from `p0` along the edge.
    pub fn project(&self, p: Point) -> f64 {
        self.vector().dot(p - self.p0) as f64 / self.length()
    }

    /// The point at distance `t` from `p0` along the edge's line.
    pub fn point_at(&self, t: f64) -> (f64, f64) {
        let (ux, uy) = self.unit();
        (self.p0.x as f64 + ux * t, self.p0.y as f64 + uy * t)
    }

    /// Whether `p` lies on the closed segment.
    pub fn contains_point(&self, p: Point) -> bool {
        let v = self.vector();
        let w = p - self.p0;
        if v == Point::zero() {
            return w == Point::zero();
        }
        v.cross(w) == 0 && w.dot(v) >= 0 && w.dot(v) <= v.dot(v)
    }

    /// The intersection of the infinite lines through `self` and `other`,
    /// given as distances along each edge from its `p0`.
    ///
    /// Returns [`None`] for parallel lines.
    pub fn line_intersection(&self, other: &Edge) -> Option<(f64, f64)> {
        let d = self.vector().cross(other.vector());
        if d == 0 {
            return None;
        }
        let w = other.p0 - self.p0;
        let t = w.cross(other.vector()) as f64 / d as f64;
        let u = w.cross(self.vector()) as f64 / d as f64;
        Some((t * self.length(), u * other.length()))
    }
}

impl TranslateMut for Edge {
    fn translate_mut(&mut self, p: Point) {
        self.p0.translate_mut(p);
        self.p1.translate_mut(p);
    }
}

impl TransformMut for Edge {
    fn transform_mut(&mut self, trans: Transformation) {
        self.p0.transform_mut(trans);
        self.p1.transform_mut(trans);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parallel_edges_share_a_key() {
        let a = Edge::new(Point::new(0, 0), Point::new(0, 30));
        let b = Edge::new(Point::new(10, 40), Point::new(10, 5));
        assert!(a.is_antiparallel(&b));
        assert_eq!(a.direction_key(), (0, 1));
        assert_eq!(b.direction_key(), (0, 1));
        assert_relative_eq!(a.signed_dist(Point::new(10, 0)), -10.);
    }

    #[test]
    fn degenerate_edge_contains_only_its_point() {
        let e = Edge::new(Point::new(3, 4), Point::new(3, 4));
        assert!(e.contains_point(Point::new(3, 4)));
        assert!(!e.contains_point(Point::new(5, 4)));
    }

    #[test]
    fn line_intersection_distances() {
        let a = Edge::new(Point::new(0, 0), Point::new(100, 0));
        let b = Edge::new(Point::new(30, -10), Point::new(30, 50));
        let (t, u) = a.line_intersection(&b).unwrap();
        assert_relative_eq!(t, 30.);
        assert_relative_eq!(u, 10.);
    }

    #[test]
    fn projection_along_diagonal() {
        let e = Edge::new(Point::new(0, 0), Point::new(30, 40));
        assert_relative_eq!(e.project(Point::new(30, 40)), 50.);
        assert!(e.contains_point(Point::new(15, 20)));
        assert!(!e.contains_point(Point::new(60, 80)));
    }
}
