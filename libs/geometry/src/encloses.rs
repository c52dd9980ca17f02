//! Closed containment tests.

/// A shape that can tell whether another object lies inside it.
///
/// Boundaries count as inside, so a port on the edge of a shape is enclosed by it.
pub trait Encloses<T: ?Sized> {
    /// Returns true if no part of `other` lies outside this shape.
    fn encloses(&self, other: &T) -> bool;
}
