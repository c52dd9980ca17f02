//! Outlines of fixed-width paths.

use crate::point::Point;
use crate::polygon::Polygon;

/// Computes the outline of a path of width `2 * half_width` through `points`.
///
/// The first and last points are extended along their segments by
/// `start_ext` and `end_ext`. Corners use miter joins. Returns [`None`]
/// if the path has fewer than two distinct points.
///
/// ```
/// # use geometry::prelude::*;
/// # use geometry::path::path_outline;
/// let outline = path_outline(&[Point::new(0, 0), Point::new(100, 0)], 10, 0, 5).unwrap();
/// assert_eq!(outline.as_rect(), Some(Rect::from_sides(0, -10, 105, 10)));
/// ```
pub fn path_outline(
    points: &[Point],
    half_width: i64,
    start_ext: i64,
    end_ext: i64,
) -> Option<Polygon> {
    let mut pts = dedup(points);
    if pts.len() < 2 {
        return None;
    }

    let n = pts.len();
    let (ux, uy) = unit(pts[0], pts[1]);
    pts[0] = (pts[0].0 - ux * start_ext as f64, pts[0].1 - uy * start_ext as f64);
    let (ux, uy) = unit(pts[n - 2], pts[n - 1]);
    pts[n - 1] = (
        pts[n - 1].0 + ux * end_ext as f64,
        pts[n - 1].1 + uy * end_ext as f64,
    );

    let mut right = offset(&pts, -half_width as f64);
    let left = offset(&pts, half_width as f64);
    right.reverse();
    right.extend(left);
    Some(Polygon::from_verts(right).normalized())
}

/// Offsets the open polyline `points` sideways by `distance`, with miter joins.
///
/// Positive distances move to the left of the direction of travel. Returns an
/// empty vector if the polyline has fewer than two distinct points.
///
/// ```
/// # use geometry::prelude::*;
/// # use geometry::path::offset_chain;
/// let chain = offset_chain(&[Point::new(0, 0), Point::new(100, 0), Point::new(100, 100)], 10);
/// assert_eq!(chain, vec![Point::new(0, 10), Point::new(90, 10), Point::new(90, 100)]);
/// ```
pub fn offset_chain(points: &[Point], distance: i64) -> Vec<Point> {
    let pts = dedup(points);
    if pts.len() < 2 {
        return Vec::new();
    }
    offset(&pts, distance as f64)
}

fn dedup(points: &[Point]) -> Vec<(f64, f64)> {
    let mut pts: Vec<(f64, f64)> = Vec::with_capacity(points.len());
    for p in points {
        let p = p.to_f64();
        if pts.last() != Some(&p) {
            pts.push(p);
        }
    }
    pts
}

fn unit(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = dx.hypot(dy);
    (dx / len, dy / len)
}

fn offset(pts: &[(f64, f64)], w: f64) -> Vec<Point> {
    let n = pts.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let d_in = (i > 0).then(|| unit(pts[i - 1], pts[i]));
        let d_out = (i + 1 < n).then(|| unit(pts[i], pts[i + 1]));
        // Offset direction is the (scaled) bisector of the two segment normals.
        let (nx, ny) = match (d_in, d_out) {
            (Some((ax, ay)), Some((bx, by))) => {
                let (mx, my) = (-ay - by, ax + bx);
                let len = mx.hypot(my);
                if len < 1e-9 {
                    // The path doubles back on itself.
                    (-ay, ax)
                } else {
                    let cos_half = (mx * -ay + my * ax) / len;
                    (mx / len / cos_half, my / len / cos_half)
                }
            }
            (Some((dx, dy)), None) | (None, Some((dx, dy))) => (-dy, dx),
            (None, None) => (0., 0.),
        };
        let (x, y) = pts[i];
        out.push(Point::from_f64(x + nx * w, y + ny * w));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encloses::Encloses;

    #[test]
    fn l_shaped_path_has_mitered_corner() {
        let outline = path_outline(
            &[Point::new(0, 0), Point::new(100, 0), Point::new(100, 100)],
            10,
            10,
            10,
        )
        .unwrap();
        assert_eq!(outline.points().len(), 6);
        assert!(outline.points().contains(&Point::new(110, -10)));
        assert!(outline.points().contains(&Point::new(90, 10)));
        assert!(outline.encloses(&Point::new(-10, 0)));
        assert!(outline.encloses(&Point::new(100, 110)));
        assert_eq!(outline.area(), 20. * 120. + 20. * 100.);
    }

    #[test]
    fn single_point_has_no_outline() {
        assert!(path_outline(&[Point::new(3, 3), Point::new(3, 3)], 5, 0, 0).is_none());
    }
}
