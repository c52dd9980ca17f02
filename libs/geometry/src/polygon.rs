//! Integer coordinate polygons.

use serde::{Deserialize, Serialize};

use crate::bbox::Bbox;
use crate::encloses::Encloses;
use crate::edge::Edge;
use crate::point::Point;
use crate::rect::Rect;
use crate::transform::{TransformMut, Transformation, TranslateMut};

/// A simple polygon, with vertices given in order.
///
/// The closing edge from the last vertex back to the first is implicit.
#[derive(Debug, Default, Clone, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Polygon {
    /// Vector of points that make up the polygon.
    points: Vec<Point>,
}

impl Polygon {
    /// Creates a polygon with given vertices.
    pub fn from_verts(vec: Vec<Point>) -> Self {
        Self { points: vec }
    }

    /// The vertices of the polygon.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Consumes the polygon, returning its vertices.
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    /// Iterates over the edges of the polygon, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| Edge::new(self.points[i], self.points[(i + 1) % n]))
    }

    /// Twice the signed area of the polygon.
    ///
    /// Positive for counterclockwise vertex order.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let tri = Polygon::from_verts(vec![
    ///     Point::new(0, 0),
    ///     Point::new(10, 0),
    ///     Point::new(0, 10),
    /// ]);
    /// assert_eq!(tri.signed_area2(), 100);
    /// ```
    pub fn signed_area2(&self) -> i128 {
        self.edges().map(|e| e.p0().cross(e.p1())).sum()
    }

    /// The unsigned area of the polygon.
    pub fn area(&self) -> f64 {
        self.signed_area2().abs() as f64 / 2.
    }

    /// Returns an equivalent polygon with counterclockwise vertex order,
    /// without repeated vertices or collinear interior vertices.
    pub fn normalized(&self) -> Self {
        let mut pts: Vec<Point> = Vec::with_capacity(self.points.len());
        for &p in &self.points {
            if pts.last() != Some(&p) {
                pts.push(p);
            }
        }
        while pts.len() > 1 && pts.first() == pts.last() {
            pts.pop();
        }
        // Repeatedly drop vertices lying on the segment joining their neighbors.
        let mut changed = true;
        while changed && pts.len() >= 3 {
            changed = false;
            let n = pts.len();
            for i in 0..n {
                let prev = pts[(i + n - 1) % n];
                let next = pts[(i + 1) % n];
                if (pts[i] - prev).cross(next - pts[i]) == 0 {
                    pts.remove(i);
                    changed = true;
                    break;
                }
            }
        }
        let mut out = Self::from_verts(pts);
        if out.signed_area2() < 0 {
            out.points.reverse();
        }
        out
    }

    /// Whether every edge is horizontal or vertical.
    pub fn is_manhattan(&self) -> bool {
        self.edges()
            .all(|e| e.is_degenerate() || e.dir().is_some())
    }

    /// Returns the equivalent rectangle if this polygon is an axis-aligned rectangle.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let poly = Polygon::from_verts(vec![
    ///     Point::new(0, 0),
    ///     Point::new(10, 0),
    ///     Point::new(20, 0),
    ///     Point::new(20, 5),
    ///     Point::new(0, 5),
    /// ]);
    /// assert_eq!(poly.as_rect(), Some(Rect::from_sides(0, 0, 20, 5)));
    /// ```
    pub fn as_rect(&self) -> Option<Rect> {
        let norm = self.normalized();
        if norm.points.len() != 4 || !norm.is_manhattan() {
            return None;
        }
        norm.bbox()
    }

    /// The bottom y-coordinate in the polygon.
    pub fn bot(&self) -> Option<i64> {
        self.points.iter().map(|point| point.y).min()
    }

    /// The top y-coordinate in the polygon.
    pub fn top(&self) -> Option<i64> {
        self.points.iter().map(|point| point.y).max()
    }

    /// The leftmost x-coordinate in the polygon.
    pub fn left(&self) -> Option<i64> {
        self.points.iter().map(|point| point.x).min()
    }

    /// The rightmost x-coordinate in the polygon.
    pub fn right(&self) -> Option<i64> {
        self.points.iter().map(|point| point.x).max()
    }
}

impl Bbox for Polygon {
    fn bbox(&self) -> Option<Rect> {
        Some(Rect::from_sides(
            self.left()?,
            self.bot()?,
            self.right()?,
            self.top()?,
        ))
    }
}

impl TranslateMut for Polygon {
    fn translate_mut(&mut self, p: Point) {
        self.points.translate_mut(p);
    }
}

impl TransformMut for Polygon {
    fn transform_mut(&mut self, trans: Transformation) {
        self.points.transform_mut(trans);
    }
}

impl Encloses<Point> for Polygon {
    /// Even-odd crossing test; points on an edge are enclosed.
    fn encloses(&self, p: &Point) -> bool {
        if self.edges().any(|e| e.contains_point(*p)) {
            return true;
        }
        let mut inside = false;
        for e in self.edges() {
            let (a, b) = (e.p0(), e.p1());
            if (a.y > p.y) != (b.y > p.y) {
                // x-coordinate of the crossing, compared without division.
                let lhs = (p.x - a.x) as i128 * (b.y - a.y) as i128;
                let rhs = (p.y - a.y) as i128 * (b.x - a.x) as i128;
                let crosses = if b.y > a.y { lhs < rhs } else { lhs > rhs };
                if crosses {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_shape() -> Polygon {
        Polygon::from_verts(vec![
            Point::new(0, 0),
            Point::new(0, 10),
            Point::new(10, 10),
            Point::new(10, 40),
            Point::new(20, 40),
            Point::new(20, 0),
        ])
    }

    #[test]
    fn normalized_is_counterclockwise() {
        let poly = l_shape().normalized();
        assert!(poly.signed_area2() > 0);
        assert_eq!(poly.points().len(), 6);
        assert_eq!(poly.area(), 500.);
        assert!(poly.as_rect().is_none());
    }

    #[test]
    fn point_in_l_shape() {
        let poly = l_shape();
        assert!(poly.encloses(&Point::new(15, 30)));
        assert!(poly.encloses(&Point::new(5, 5)));
        assert!(poly.encloses(&Point::new(10, 25)));
        assert!(!poly.encloses(&Point::new(5, 25)));
        assert!(!poly.encloses(&Point::new(25, 5)));
    }
}
