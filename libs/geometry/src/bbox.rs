//! Bounding boxes.

use crate::rect::Rect;

/// A shape with an axis-aligned bounding box.
///
/// ```
/// # use geometry::prelude::*;
/// let tri = Polygon::from_verts(vec![Point::new(0, 0), Point::new(40, 10), Point::new(-5, 30)]);
/// assert_eq!(tri.bbox(), Some(Rect::from_sides(-5, 0, 40, 30)));
/// ```
pub trait Bbox {
    /// The smallest rectangle covering the shape, or [`None`] for an empty one.
    ///
    /// Points and zero-area rectangles are not empty.
    fn bbox(&self) -> Option<Rect>;
}
