//! 2-D geometric operations relevant to integrated circuit layout extraction.
//!
//! All coordinates are integers. Operations that are inherently fractional
//! (projections, miter joins of angled paths) compute in `f64` and round
//! back onto the integer grid.
//!
//! # Examples
//!
//! Create a [rectangle](crate::rect::Rect):
//!
//! ```
//! # use geometry::prelude::*;
//! let rect = Rect::from_sides(10, 20, 30, 40);
//! assert_eq!(rect.width(), 20);
//! ```
#![warn(missing_docs)]

extern crate self as geometry;

pub mod bbox;
pub mod dir;
pub mod edge;
pub mod encloses;
pub mod orientation;
pub mod path;
pub mod point;
pub mod polygon;
pub mod prelude;
pub mod rect;
pub mod shape;
pub mod side;
pub mod snap;
pub mod span;
pub mod transform;
