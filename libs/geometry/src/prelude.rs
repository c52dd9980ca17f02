//! An import prelude that re-exports commonly used items.

pub use crate::bbox::Bbox;
pub use crate::dir::Dir;
pub use crate::edge::Edge;
pub use crate::encloses::Encloses;
pub use crate::orientation::{NamedOrientation, Orientation};
pub use crate::point::Point;
pub use crate::polygon::Polygon;
pub use crate::rect::Rect;
pub use crate::shape::Shape;
pub use crate::side::{Side, Sides};
pub use crate::span::Span;
pub use crate::transform::{
    Rotation, Transform, TransformMut, Transformation, Translate, TranslateMut,
};
