//! The sides of an axis-aligned rectangle.

use array_map::{ArrayMap, Indexable};
use serde::{Deserialize, Serialize};

use crate::transform::Rotation;

/// An enumeration of the sides of an axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, PartialEq, Eq)]
#[repr(u8)]
#[derive(Indexable)]
pub enum Side {
    /// The left side.
    Left,
    /// The bottom side.
    Bot,
    /// The right side.
    Right,
    /// The top side.
    Top,
}

impl Side {
    /// All four sides, in counter-clockwise order starting from the left.
    pub const ALL: [Side; 4] = [Side::Left, Side::Bot, Side::Right, Side::Top];

    /// The side that this side maps to under a counter-clockwise rotation.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// assert_eq!(Side::Left.rotate(Rotation::R90), Side::Bot);
    /// assert_eq!(Side::Top.rotate(Rotation::R180), Side::Bot);
    /// ```
    pub fn rotate(&self, rotation: Rotation) -> Self {
        Self::ALL[(*self as usize + rotation.quarter_turns() as usize) % 4]
    }
}

/// An association of a value with type `T` to each of the four [`Side`]s.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub struct Sides<T> {
    inner: ArrayMap<Side, T, 4>,
}

impl<T> Sides<T>
where
    T: Copy,
{
    /// Creates a new [`Sides`] with `value` associated with all sides.
    pub const fn uniform(value: T) -> Self {
        Self {
            inner: ArrayMap::new([value; 4]),
        }
    }

    /// Returns the values rotated counter-clockwise by `rotation`.
    ///
    /// The value that was on the left side of an object ends up on
    /// whichever side the left side maps to after rotating the object.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let sides = Sides::new(1, 2, 3, 4);
    /// let rotated = sides.rotate(Rotation::R90);
    /// assert_eq!(rotated[Side::Bot], 1);
    /// assert_eq!(rotated[Side::Right], 2);
    /// assert_eq!(rotated[Side::Top], 3);
    /// assert_eq!(rotated[Side::Left], 4);
    /// ```
    pub fn rotate(&self, rotation: Rotation) -> Self {
        let mut out = *self;
        for side in Side::ALL {
            out[side.rotate(rotation)] = self[side];
        }
        out
    }
}

impl<T> Sides<T> {
    /// Creates a new [`Sides`] with with the provided values for each side.
    pub const fn new(left: T, bot: T, right: T, top: T) -> Self {
        // The ordering of array elements here must match
        // the ordering of variants in the [`Side`] enum.
        Self {
            inner: ArrayMap::new([left, bot, right, top]),
        }
    }

    /// Maps a function over the provided [`Sides`], returning a new [`Sides`].
    pub fn map<B>(self, f: impl FnMut(&Side, T) -> B) -> Sides<B> {
        Sides {
            inner: self.inner.map(f),
        }
    }
}

impl<T> std::ops::Index<Side> for Sides<T> {
    type Output = T;
    fn index(&self, index: Side) -> &Self::Output {
        &self.inner[index]
    }
}

impl<T> std::ops::IndexMut<Side> for Sides<T> {
    fn index_mut(&mut self, index: Side) -> &mut Self::Output {
        &mut self.inner[index]
    }
}
