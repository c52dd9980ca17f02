//! Utilities and types for orienting layout objects.

use serde::{Deserialize, Serialize};

use crate::point::Point;
use crate::transform::{Rotation, Transformation};

/// A named orientation.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum NamedOrientation {
    /// No rotations or reflections.
    #[default]
    R0,
    /// Reflect vertically (ie. about the x-axis).
    ReflectVert,
    /// Reflect horizontally (ie. about the y-axis).
    ReflectHoriz,
    /// Rotate 90 degrees counter-clockwise.
    R90,
    /// Rotate 180 degrees counter-clockwise.
    R180,
    /// Rotate 270 degrees counter-clockwise.
    R270,
    /// Flip across the line y = x.
    FlipYx,
    /// Flip across the line y = -x.
    FlipMinusYx,
}

/// An orientation of a geometric object.
///
/// Captures reflection and rotation, but not position or scaling.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Orientation {
    /// Reflect vertically.
    ///
    /// Applied before rotation.
    pub(crate) reflect_vert: bool,
    /// Counter-clockwise rotation.
    ///
    /// Applied after reflecting vertically.
    pub(crate) angle: Rotation,
}

impl NamedOrientation {
    /// Returns all 8 named rectangular orientations.
    pub fn all_rectangular() -> [Self; 8] {
        [
            Self::R0,
            Self::ReflectVert,
            Self::ReflectHoriz,
            Self::R90,
            Self::R180,
            Self::R270,
            Self::FlipYx,
            Self::FlipMinusYx,
        ]
    }

    /// Converts this named orientation into a regular [`Orientation`].
    #[inline]
    pub fn into_orientation(self) -> Orientation {
        Orientation::from(self)
    }
}

impl From<NamedOrientation> for Orientation {
    fn from(value: NamedOrientation) -> Self {
        use NamedOrientation::*;
        let (reflect_vert, angle) = match value {
            R0 => (false, Rotation::R0),
            R90 => (false, Rotation::R90),
            R180 => (false, Rotation::R180),
            R270 => (false, Rotation::R270),
            ReflectVert => (true, Rotation::R0),
            FlipYx => (true, Rotation::R90),
            ReflectHoriz => (true, Rotation::R180),
            FlipMinusYx => (true, Rotation::R270),
        };
        Self {
            reflect_vert,
            angle,
        }
    }
}

impl From<Rotation> for Orientation {
    fn from(angle: Rotation) -> Self {
        Self {
            reflect_vert: false,
            angle,
        }
    }
}

impl Orientation {
    /// Creates a new orientation with the given reflection and angle settings.
    #[inline]
    pub fn from_reflect_and_angle(reflect_vert: bool, angle: Rotation) -> Self {
        Self {
            reflect_vert,
            angle,
        }
    }

    /// Returns the identity orientation.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Whether this orientation reflects about the x-axis before rotating.
    #[inline]
    pub fn reflect_vert(&self) -> bool {
        self.reflect_vert
    }

    /// The counterclockwise rotation applied after any reflection.
    #[inline]
    pub fn angle(&self) -> Rotation {
        self.angle
    }

    /// Whether this orientation swaps the x and y axes.
    #[inline]
    pub fn is_transposing(&self) -> bool {
        self.angle.is_transposing()
    }

    /// The orientation obtained by applying `o` after `self`.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let o = Orientation::from(Rotation::R90).apply(NamedOrientation::ReflectVert);
    /// assert_eq!(o, NamedOrientation::FlipMinusYx.into_orientation());
    /// ```
    pub fn apply(self, o: impl Into<Orientation>) -> Self {
        Transformation::cascade(
            Transformation::from_offset_and_orientation(Point::zero(), o.into()),
            Transformation::from_offset_and_orientation(Point::zero(), self),
        )
        .orientation()
    }

    /// The orientation that undoes `self`.
    pub fn inverse(self) -> Self {
        Transformation::from_offset_and_orientation(Point::zero(), self)
            .inv()
            .orientation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_then_inverse_is_identity() {
        for a in NamedOrientation::all_rectangular() {
            let o = a.into_orientation();
            assert_eq!(o.apply(o.inverse()), Orientation::identity(), "{a:?}");
        }
    }

    #[test]
    fn reflections_compose_to_rotation() {
        let o = NamedOrientation::ReflectVert
            .into_orientation()
            .apply(NamedOrientation::ReflectHoriz);
        assert_eq!(o, Orientation::from(Rotation::R180));
    }
}
