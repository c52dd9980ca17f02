//! Closed intervals along one axis.
use serde::{Deserialize, Serialize};

use crate::encloses::Encloses;

/// The closed interval `[start, stop]`, with `start <= stop`.
#[derive(
    Debug, Default, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize, PartialEq, Eq,
)]
pub struct Span {
    start: i64,
    stop: i64,
}

impl Span {
    /// The interval between two coordinates, in either order.
    pub fn new(a: i64, b: i64) -> Self {
        Self {
            start: a.min(b),
            stop: a.max(b),
        }
    }

    /// Builds a span from endpoints already known to be ordered.
    pub(crate) const fn ordered(start: i64, stop: i64) -> Self {
        Self { start, stop }
    }

    /// A span of length `length` around `center`.
    ///
    /// Odd lengths put the extra unit above the center.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// assert_eq!(Span::from_center_span(10, 6), Span::new(7, 13));
    /// assert_eq!(Span::from_center_span(10, 5), Span::new(8, 13));
    /// ```
    pub fn from_center_span(center: i64, length: i64) -> Self {
        let start = center - length / 2;
        Self::new(start, start + length)
    }

    /// The lower end.
    #[inline]
    pub const fn start(&self) -> i64 {
        self.start
    }

    /// The upper end.
    #[inline]
    pub const fn stop(&self) -> i64 {
        self.stop
    }
}

impl Encloses<i64> for Span {
    fn encloses(&self, x: &i64) -> bool {
        (self.start..=self.stop).contains(x)
    }
}

impl Encloses<Span> for Span {
    fn encloses(&self, other: &Span) -> bool {
        self.start <= other.start && other.stop <= self.stop
    }
}
