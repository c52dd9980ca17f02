//! Axis-aligned rectangles.

use serde::{Deserialize, Serialize};

use crate::bbox::Bbox;
use crate::dir::Dir;
use crate::encloses::Encloses;
use crate::point::Point;
use crate::polygon::Polygon;
use crate::side::{Side, Sides};
use crate::span::Span;
use crate::transform::{TransformMut, Transformation, TranslateMut};

/// An axis-aligned rectangle, specified by lower-left and upper-right corners.
#[derive(
    Debug, Default, Copy, Clone, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct Rect {
    /// The lower-left corner.
    p0: Point,
    /// The upper-right corner.
    p1: Point,
}

impl Rect {
    /// Creates a new rectangle from the given opposite corner points.
    ///
    /// The corners may be given in any order.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let rect = Rect::new(Point::new(30, 20), Point::new(15, 40));
    /// assert_eq!(rect, Rect::from_sides(15, 20, 30, 40));
    /// ```
    #[inline]
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            p0: Point::new(a.x.min(b.x), a.y.min(b.y)),
            p1: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Creates a zero-area rectangle containing the given point.
    #[inline]
    pub const fn from_point(p: Point) -> Self {
        Self { p0: p, p1: p }
    }

    /// Creates a rectangle from all 4 sides (left, bottom, right, top).
    ///
    /// # Panics
    ///
    /// This method panics if `left > right` or if `bot > top`.
    /// If you want sides to be sorted for you, consider using [`Rect::new`] instead.
    #[inline]
    pub fn from_sides(left: i64, bot: i64, right: i64, top: i64) -> Self {
        assert!(
            left <= right && bot <= top,
            "Rect::from_sides requires left ({left}) <= right ({right}) and bot ({bot}) <= top ({top})"
        );
        Self {
            p0: Point::new(left, bot),
            p1: Point::new(right, top),
        }
    }

    /// Creates a rectangle from all 4 sides (left, bottom, right, top),
    /// but returns `None` if the given sides would make the rectangle empty.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// assert_eq!(Rect::from_sides_option(15, 20, 30, 40), Some(Rect::from_sides(15, 20, 30, 40)));
    /// assert_eq!(Rect::from_sides_option(10, 20, 0, 40), None);
    /// ```
    #[inline]
    pub fn from_sides_option(left: i64, bot: i64, right: i64, top: i64) -> Option<Self> {
        (left <= right && bot <= top).then(|| Self::from_sides(left, bot, right, top))
    }

    /// Creates a rectangle from horizontal and vertical [`Span`]s.
    pub const fn from_spans(h: Span, v: Span) -> Self {
        Self {
            p0: Point::new(h.start(), v.start()),
            p1: Point::new(h.stop(), v.stop()),
        }
    }

    /// Creates a rectangle of the given width and height centered on `center`.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let rect = Rect::from_center(Point::new(0, 0), 40, 20);
    /// assert_eq!(rect, Rect::from_sides(-20, -10, 20, 10));
    /// ```
    pub fn from_center(center: Point, width: i64, height: i64) -> Self {
        Self::from_spans(
            Span::from_center_span(center.x, width),
            Span::from_center_span(center.y, height),
        )
    }

    /// The bottom y-coordinate of the rectangle.
    #[inline]
    pub const fn bot(&self) -> i64 {
        self.p0.y
    }

    /// The top y-coordinate of the rectangle.
    #[inline]
    pub const fn top(&self) -> i64 {
        self.p1.y
    }

    /// The left x-coordinate of the rectangle.
    #[inline]
    pub const fn left(&self) -> i64 {
        self.p0.x
    }

    /// The right x-coordinate of the rectangle.
    #[inline]
    pub const fn right(&self) -> i64 {
        self.p1.x
    }

    /// The lower-left corner.
    #[inline]
    pub const fn lower_left(&self) -> Point {
        self.p0
    }

    /// The upper-right corner.
    #[inline]
    pub const fn upper_right(&self) -> Point {
        self.p1
    }

    /// The four corners in counterclockwise order, starting from the lower left.
    pub const fn corners(&self) -> [Point; 4] {
        [
            self.p0,
            Point::new(self.p1.x, self.p0.y),
            self.p1,
            Point::new(self.p0.x, self.p1.y),
        ]
    }

    /// The horizontal span of the rectangle.
    #[inline]
    pub const fn hspan(&self) -> Span {
        Span::ordered(self.p0.x, self.p1.x)
    }

    /// The vertical span of the rectangle.
    #[inline]
    pub const fn vspan(&self) -> Span {
        Span::ordered(self.p0.y, self.p1.y)
    }

    /// The width of the rectangle.
    #[inline]
    pub const fn width(&self) -> i64 {
        self.p1.x - self.p0.x
    }

    /// The height of the rectangle.
    #[inline]
    pub const fn height(&self) -> i64 {
        self.p1.y - self.p0.y
    }

    /// The area of the rectangle.
    #[inline]
    pub const fn area(&self) -> i128 {
        self.width() as i128 * self.height() as i128
    }

    /// Returns the center point of the rectangle, rounded down.
    pub const fn center(&self) -> Point {
        Point::new(
            (self.p0.x + self.p1.x).div_euclid(2),
            (self.p0.y + self.p1.y).div_euclid(2),
        )
    }

    /// Whether the rectangle has zero area.
    #[inline]
    pub const fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// The smallest rectangle containing both `self` and `other`.
    pub fn union(self, other: Self) -> Self {
        Self::new(
            Point::new(self.left().min(other.left()), self.bot().min(other.bot())),
            Point::new(
                self.right().max(other.right()),
                self.top().max(other.top()),
            ),
        )
    }

    /// The intersection with rectangle `other`, including zero-area intersections
    /// of rectangles that only touch.
    pub fn intersection(self, other: Self) -> Option<Self> {
        Self::from_sides_option(
            self.left().max(other.left()),
            self.bot().max(other.bot()),
            self.right().min(other.right()),
            self.top().min(other.top()),
        )
    }

    /// Whether `self` and `other` share a region of positive area.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.intersection(*other)
            .map(|r| !r.is_degenerate())
            .unwrap_or(false)
    }

    /// Expands the rectangle by `amount` on all sides.
    pub fn expand_all(&self, amount: i64) -> Self {
        Self::from_sides(
            self.left() - amount,
            self.bot() - amount,
            self.right() + amount,
            self.top() + amount,
        )
    }

    /// Expands the rectangle by `amount` on both sides perpendicular to `dir`.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let rect = Rect::from_sides(0, 0, 100, 200);
    /// assert_eq!(rect.expand_dir(Dir::Horiz, 20), Rect::from_sides(-20, 0, 120, 200));
    /// ```
    pub fn expand_dir(&self, dir: Dir, amount: i64) -> Self {
        match dir {
            Dir::Horiz => Self::from_sides(
                self.left() - amount,
                self.bot(),
                self.right() + amount,
                self.top(),
            ),
            Dir::Vert => Self::from_sides(
                self.left(),
                self.bot() - amount,
                self.right(),
                self.top() + amount,
            ),
        }
    }

    /// Moves each side outward by the amount given for it.
    ///
    /// Negative amounts move a side inward. Returns [`None`] if the
    /// result would be empty.
    pub fn expand_sides(&self, sides: Sides<i64>) -> Option<Self> {
        Self::from_sides_option(
            self.left() - sides[Side::Left],
            self.bot() - sides[Side::Bot],
            self.right() + sides[Side::Right],
            self.top() + sides[Side::Top],
        )
    }

    /// Shrinks the rectangle by `amount` on all sides.
    ///
    /// Returns [`None`] if the result would be empty.
    pub fn shrink_all(&self, amount: i64) -> Option<Self> {
        self.expand_sides(Sides::uniform(-amount))
    }

    /// Moves each side inward by the amount given for it.
    pub fn shrink_sides(&self, sides: Sides<i64>) -> Option<Self> {
        self.expand_sides(sides.map(|_, v| -v))
    }

    /// Snaps the corners of this rectangle to the given grid.
    pub fn snap_to_grid(&self, grid: i64) -> Self {
        Self::new(self.p0.snap_to_grid(grid), self.p1.snap_to_grid(grid))
    }

    /// Converts the rectangle to a counterclockwise [`Polygon`].
    pub fn to_polygon(&self) -> Polygon {
        Polygon::from_verts(self.corners().to_vec())
    }
}

impl Bbox for Rect {
    fn bbox(&self) -> Option<Rect> {
        Some(*self)
    }
}

impl TranslateMut for Rect {
    fn translate_mut(&mut self, p: Point) {
        self.p0.translate_mut(p);
        self.p1.translate_mut(p);
    }
}

impl TransformMut for Rect {
    fn transform_mut(&mut self, trans: Transformation) {
        let mut p0 = self.p0;
        let mut p1 = self.p1;
        p0.transform_mut(trans);
        p1.transform_mut(trans);
        *self = Rect::new(p0, p1);
    }
}

impl Encloses<Point> for Rect {
    fn encloses(&self, p: &Point) -> bool {
        self.hspan().encloses(&p.x) && self.vspan().encloses(&p.y)
    }
}

impl Encloses<Rect> for Rect {
    fn encloses(&self, other: &Rect) -> bool {
        self.hspan().encloses(&other.hspan()) && self.vspan().encloses(&other.vspan())
    }
}
