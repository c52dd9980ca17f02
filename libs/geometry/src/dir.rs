//! Manhattan axes.

use serde::{Deserialize, Serialize};

/// The axis a row of cuts, an edge, or a rectangle dimension runs along.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Dir {
    /// Along x.
    Horiz,
    /// Along y.
    Vert,
}

impl Dir {
    /// The perpendicular axis.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let p = Point::new(3, 7);
    /// assert_eq!(p.coord(Dir::Horiz.perp()), 7);
    /// ```
    pub const fn perp(self) -> Self {
        match self {
            Self::Horiz => Self::Vert,
            Self::Vert => Self::Horiz,
        }
    }
}
