//! Transformation types and traits.

use impl_trait_for_tuples::impl_for_tuples;
use serde::{Deserialize, Serialize};

use crate::orientation::Orientation;
use crate::point::Point;

/// A Manhattan rotation: 0, 90, 180, or 270 degrees counterclockwise.
#[derive(
    Debug, Clone, Copy, Default, Hash, Eq, Ord, PartialOrd, PartialEq, Serialize, Deserialize,
)]
pub enum Rotation {
    /// 0 degrees; no rotation.
    #[default]
    R0,
    /// 90 degrees counterclockwise.
    R90,
    /// 180 degrees counterclockwise.
    R180,
    /// 270 degrees counterclockwise.
    R270,
}

impl Rotation {
    /// All four rotations, in counterclockwise order starting from [`Rotation::R0`].
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    /// The number of quarter turns making up this rotation.
    #[inline]
    pub const fn quarter_turns(&self) -> u8 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 1,
            Rotation::R180 => 2,
            Rotation::R270 => 3,
        }
    }

    /// The rotation made of `n` counterclockwise quarter turns.
    #[inline]
    pub const fn from_quarter_turns(n: u8) -> Self {
        Self::ALL[(n % 4) as usize]
    }

    /// The transformation matrix representing this rotation.
    #[inline]
    pub fn transformation_matrix(&self) -> TransformationMatrix {
        TransformationMatrix::from(*self)
    }

    /// The angle of this rotation, in degrees.
    pub fn degrees(&self) -> f64 {
        90. * self.quarter_turns() as f64
    }

    /// Whether this rotation swaps the x and y axes.
    #[inline]
    pub const fn is_transposing(&self) -> bool {
        matches!(self, Rotation::R90 | Rotation::R270)
    }
}

impl std::ops::Add<Rotation> for Rotation {
    type Output = Rotation;
    fn add(self, rhs: Rotation) -> Self::Output {
        Self::from_quarter_turns(self.quarter_turns() + rhs.quarter_turns())
    }
}

impl std::ops::AddAssign for Rotation {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub<Rotation> for Rotation {
    type Output = Rotation;
    fn sub(self, rhs: Rotation) -> Self::Output {
        Self::from_quarter_turns(self.quarter_turns() + 4 - rhs.quarter_turns())
    }
}

impl std::ops::Neg for Rotation {
    type Output = Rotation;
    fn neg(self) -> Self::Output {
        Rotation::R0 - self
    }
}

/// A matrix representing a unitary Manhattan transformation.
///
/// Can represent rotations, reflections, or combinations of rotations/reflections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransformationMatrix([[i8; 2]; 2]);

impl TransformationMatrix {
    /// The identity transformation.
    #[inline]
    pub const fn identity() -> Self {
        Self([[1, 0], [0, 1]])
    }

    /// This matrix followed by a rotation by `angle`.
    pub fn rotate(&self, angle: Rotation) -> Self {
        angle.transformation_matrix() * *self
    }

    /// This matrix followed by a reflection across the x-axis.
    pub fn reflect_vert(&self) -> Self {
        Self([[1, 0], [0, -1]]) * *self
    }

    /// The determinant of the matrix; `-1` for reflecting transformations.
    #[inline]
    pub fn det(&self) -> i8 {
        self.0[0][0] * self.0[1][1] - self.0[0][1] * self.0[1][0]
    }

    /// The inverse of the matrix.
    ///
    /// Unitary matrices are inverted by their transpose.
    pub fn inverse(&self) -> Self {
        let m = self.0;
        Self([[m[0][0], m[1][0]], [m[0][1], m[1][1]]])
    }
}

impl From<Rotation> for TransformationMatrix {
    fn from(value: Rotation) -> Self {
        Self(match value {
            Rotation::R0 => [[1, 0], [0, 1]],
            Rotation::R90 => [[0, -1], [1, 0]],
            Rotation::R180 => [[-1, 0], [0, -1]],
            Rotation::R270 => [[0, 1], [-1, 0]],
        })
    }
}

impl std::ops::Mul<TransformationMatrix> for TransformationMatrix {
    type Output = Self;
    fn mul(self, rhs: TransformationMatrix) -> Self::Output {
        let (a, b) = (self.0, rhs.0);
        let mut out = [[0i8; 2]; 2];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = a[i][0] * b[0][j] + a[i][1] * b[1][j];
            }
        }
        Self(out)
    }
}

impl std::ops::Mul<Point> for TransformationMatrix {
    type Output = Point;
    fn mul(self, p: Point) -> Self::Output {
        let m = self.0;
        Point::new(
            m[0][0] as i64 * p.x + m[0][1] as i64 * p.y,
            m[1][0] as i64 * p.x + m[1][1] as i64 * p.y,
        )
    }
}

/// A transformation representing a Manhattan translation, rotation, and/or reflection of geometry.
///
/// This object does not support scaling of geometry, and as such all transformation matrices
/// are unitary. Points are mapped as `mat * p + b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transformation {
    /// The transformation matrix.
    pub(crate) mat: TransformationMatrix,
    /// The x-y translation applied after the transformation.
    pub(crate) b: Point,
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transformation {
    /// Returns the identity transform, leaving any transformed object unmodified.
    pub const fn identity() -> Self {
        Self {
            mat: TransformationMatrix::identity(),
            b: Point::zero(),
        }
    }

    /// Returns a translation by `(x, y)`.
    pub fn translate(x: i64, y: i64) -> Self {
        Self {
            mat: TransformationMatrix::identity(),
            b: Point::new(x, y),
        }
    }

    /// Returns a rotation by `angle` about the origin.
    pub fn rotate(angle: Rotation) -> Self {
        Self {
            mat: angle.transformation_matrix(),
            b: Point::zero(),
        }
    }

    /// Returns a reflection about the x-axis.
    pub fn reflect_vert() -> Self {
        Self {
            mat: TransformationMatrix::identity().reflect_vert(),
            b: Point::zero(),
        }
    }

    /// Creates a transform that applies `orientation` about the origin,
    /// then moves the origin to `offset`.
    pub fn from_offset_and_orientation(offset: Point, orientation: impl Into<Orientation>) -> Self {
        let o = orientation.into();
        let mut mat = TransformationMatrix::identity();
        if o.reflect_vert() {
            mat = mat.reflect_vert();
        }
        Self {
            mat: mat.rotate(o.angle()),
            b: offset,
        }
    }

    /// Create a new [`Transformation`] that is the cascade of `parent` and `child`.
    ///
    /// "Parents" and "children" refer to typical layout-instance hierarchies,
    /// in which each layer of instance has a nested set of transformations relative to its top-level parent.
    ///
    /// Note this operation *is not* commutative.
    /// Example: a child rotated by 90 degrees and translated to `(10, 0)` inside a parent translated
    /// to `(100, 0)` lands at `(110, 0)`, still rotated by 90 degrees.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let parent = Transformation::translate(100, 0);
    /// let child = Transformation::from_offset_and_orientation(
    ///     Point::new(10, 0),
    ///     Orientation::from_reflect_and_angle(false, Rotation::R90),
    /// );
    /// let t = Transformation::cascade(parent, child);
    /// assert_eq!(Point::zero().transform(t), Point::new(110, 0));
    /// assert_eq!(Point::new(1, 0).transform(t), Point::new(110, 1));
    /// ```
    pub fn cascade(parent: Transformation, child: Transformation) -> Transformation {
        Self {
            mat: parent.mat * child.mat,
            b: parent.mat * child.b + parent.b,
        }
    }

    /// The point the origin is moved to.
    #[inline]
    pub fn offset_point(&self) -> Point {
        self.b
    }

    /// The orientation (reflection then rotation) applied by this transformation.
    pub fn orientation(&self) -> Orientation {
        let reflect_vert = self.mat.det() < 0;
        // The image of the x-axis determines the rotation once any reflection is undone.
        let x = self.mat * Point::new(1, 0);
        let angle = match (x.x, x.y) {
            (1, 0) => Rotation::R0,
            (0, 1) => Rotation::R90,
            (-1, 0) => Rotation::R180,
            _ => Rotation::R270,
        };
        Orientation::from_reflect_and_angle(reflect_vert, angle)
    }

    /// Returns the inverse [`Transformation`] of `self`.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let t = Transformation::from_offset_and_orientation(
    ///     Point::new(5, -3),
    ///     NamedOrientation::FlipYx,
    /// );
    /// let p = Point::new(7, 2);
    /// assert_eq!(p.transform(t).transform(t.inv()), p);
    /// ```
    pub fn inv(&self) -> Transformation {
        let inv = self.mat.inverse();
        Self {
            mat: inv,
            b: -(inv * self.b),
        }
    }
}

/// A trait for specifying how an object is changed by a transformation.
///
/// Takes in a mutable reference to the object.
#[impl_for_tuples(32)]
pub trait TransformMut {
    /// Applies matrix-vector [`Transformation`] `trans`.
    fn transform_mut(&mut self, trans: Transformation);
}

impl<T: TransformMut> TransformMut for Vec<T> {
    fn transform_mut(&mut self, trans: Transformation) {
        for i in self.iter_mut() {
            i.transform_mut(trans);
        }
    }
}

impl<T: TransformMut> TransformMut for Option<T> {
    fn transform_mut(&mut self, trans: Transformation) {
        if let Some(inner) = self.as_mut() {
            inner.transform_mut(trans);
        }
    }
}

/// A trait for specifying how an object is changed by a transformation.
///
/// Takes in an owned copy of the shape and returns the transformed version.
pub trait Transform: TransformMut + Sized {
    /// Applies matrix-vector [`Transformation`] `trans`.
    ///
    /// Creates a new shape at a location equal to the transformation of the original.
    fn transform(mut self, trans: Transformation) -> Self {
        self.transform_mut(trans);
        self
    }
}

impl<T: TransformMut + Sized> Transform for T {}

/// A trait for specifying how a shape is translated by a [`Point`].
///
/// Takes in a mutable reference to the shape and applies the translation.
#[impl_for_tuples(32)]
pub trait TranslateMut {
    /// Translates the shape by [`Point`], modifying it in place.
    fn translate_mut(&mut self, p: Point);
}

impl<T: TranslateMut> TranslateMut for Vec<T> {
    fn translate_mut(&mut self, p: Point) {
        for i in self.iter_mut() {
            i.translate_mut(p);
        }
    }
}

impl<T: TranslateMut> TranslateMut for Option<T> {
    fn translate_mut(&mut self, p: Point) {
        if let Some(inner) = self.as_mut() {
            inner.translate_mut(p);
        }
    }
}

/// A trait for specifying how a shape is translated by a [`Point`].
///
/// Takes in an owned copy of the shape and returns the translated version.
pub trait Translate: TranslateMut + Sized {
    /// Translates the shape by a [`Point`] through polymorphism.
    ///
    /// Creates a new shape at a location equal to the translation of the original.
    fn translate(mut self, p: Point) -> Self {
        self.translate_mut(p);
        self
    }
}

impl<T: TranslateMut + Sized> Translate for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::NamedOrientation;

    #[test]
    fn rotation_arithmetic_wraps() {
        assert_eq!(Rotation::R270 + Rotation::R180, Rotation::R90);
        assert_eq!(Rotation::R90 - Rotation::R180, Rotation::R270);
        assert_eq!(-Rotation::R90, Rotation::R270);
    }

    #[test]
    fn orientation_survives_round_trip() {
        for named in NamedOrientation::all_rectangular() {
            let o = Orientation::from(named);
            let t = Transformation::from_offset_and_orientation(Point::new(3, 4), o);
            assert_eq!(t.orientation(), o, "{named:?}");
            assert_eq!(t.offset_point(), Point::new(3, 4));
        }
    }

    #[test]
    fn cascade_with_inverse_is_identity() {
        let t = Transformation::from_offset_and_orientation(
            Point::new(-20, 15),
            NamedOrientation::ReflectHoriz,
        );
        let id = Transformation::cascade(t, t.inv());
        assert_eq!(id, Transformation::identity());
    }

    #[test]
    fn rotate_90_maps_x_to_y() {
        let t = Transformation::rotate(Rotation::R90);
        assert_eq!(Point::new(2, 1).transform(t), Point::new(-1, 2));
    }
}
