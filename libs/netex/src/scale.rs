//! Conversion between external (design) units and internal working units.
//!
//! All geometric predicates inside the extractor run on coordinates multiplied by
//! [`SCALE`], so that half-widths and centers of odd-sized shapes stay integral.
//!
//! Internal units are also the placement units of nodes and wires: node
//! centers, sizes and traces, wire widths and wire end locations are all stored
//! in internal units. Shapes, exports and instance transformations stay in
//! external units.

use geometry::prelude::*;

/// The number of internal units per external unit.
pub const SCALE: i64 = 10;

/// Converts a length or coordinate to internal units.
#[inline]
pub const fn to_internal(value: i64) -> i64 {
    value * SCALE
}

/// Converts a length or coordinate to external units, rounding to the nearest unit.
///
/// Ties round away from zero.
///
/// ```
/// # use netex::scale::to_external;
/// assert_eq!(to_external(25), 3);
/// assert_eq!(to_external(-25), -3);
/// assert_eq!(to_external(24), 2);
/// ```
pub fn to_external(value: i64) -> i64 {
    let q = value.div_euclid(SCALE);
    let r = value.rem_euclid(SCALE);
    if 2 * r > SCALE || (2 * r == SCALE && value > 0) {
        q + 1
    } else {
        q
    }
}

/// Converts a length to external units, rounding down.
#[inline]
pub fn to_external_floor(value: i64) -> i64 {
    value.div_euclid(SCALE)
}

pub fn point_to_internal(p: Point) -> Point {
    p.scale(SCALE)
}

pub fn point_to_external(p: Point) -> Point {
    Point::new(to_external(p.x), to_external(p.y))
}

pub fn rect_to_internal(r: Rect) -> Rect {
    Rect::new(point_to_internal(r.lower_left()), point_to_internal(r.upper_right()))
}

pub fn rect_to_external(r: Rect) -> Rect {
    Rect::new(point_to_external(r.lower_left()), point_to_external(r.upper_right()))
}

pub fn polygon_to_internal(p: &Polygon) -> Polygon {
    Polygon::from_verts(p.points().iter().copied().map(point_to_internal).collect())
}

pub fn polygon_to_external(p: &Polygon) -> Polygon {
    Polygon::from_verts(p.points().iter().copied().map(point_to_external).collect())
}

/// Converts a transformation in external units to placement units.
pub fn transformation_to_internal(trans: Transformation) -> Transformation {
    Transformation::from_offset_and_orientation(
        point_to_internal(trans.offset_point()),
        trans.orientation(),
    )
}

/// The center and size of a node body given in internal units.
///
/// Returns [`None`] if the center falls between internal grid points.
pub fn body_placement(body: Rect) -> Option<(Point, i64, i64)> {
    let cx2 = body.left() + body.right();
    let cy2 = body.bot() + body.top();
    if cx2 % 2 != 0 || cy2 % 2 != 0 {
        return None;
    }
    Some((Point::new(cx2 / 2, cy2 / 2), body.width(), body.height()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_conversion_round_trips() {
        let r = Rect::from_sides(-3, 1, 7, 12);
        assert_eq!(rect_to_internal(r), Rect::from_sides(-30, 10, 70, 120));
        assert_eq!(rect_to_external(rect_to_internal(r)), r);
    }

    #[test]
    fn half_units_round_outward() {
        assert_eq!(to_external(15), 2);
        assert_eq!(to_external(-15), -2);
        assert_eq!(to_external_floor(-15), -2);
        assert_eq!(to_external_floor(19), 1);
    }

    #[test]
    fn odd_bodies_are_centered_on_half_units() {
        // A 3-unit wide body has its center half a unit off the external grid.
        assert_eq!(
            body_placement(Rect::from_sides(0, 0, 30, 20)),
            Some((Point::new(15, 10), 30, 20))
        );
        assert_eq!(body_placement(Rect::from_sides(0, 0, 25, 20)), None);
    }

    #[test]
    fn transformations_scale_their_offset() {
        let trans = Transformation::from_offset_and_orientation(Point::new(2, -3), Rotation::R90);
        let scaled = transformation_to_internal(trans);
        assert_eq!(scaled.offset_point(), Point::new(20, -30));
        assert_eq!(scaled.orientation(), trans.orientation());
    }
}
