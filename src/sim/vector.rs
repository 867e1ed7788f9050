//! 2D vector value type
//!
//! `Vector2D` is the checked facade the physics code talks in. The arithmetic
//! itself is delegated to `glam::Vec2`; what this type adds is the error
//! contract: normalizing a zero vector or dividing by zero is an error rather
//! than a silent NaN/infinity.
//!
//! Rotation convention: `rotate(a)` applies
//! `x' = cos(a)·x − sin(a)·y`, `y' = sin(a)·x + cos(a)·y` with `a` in degrees.
//! In screen space (y down) a positive angle turns clockwise on screen.

use std::fmt;
use std::ops::{Add, AddAssign, Index, Mul, Neg, Sub, SubAssign};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, Result};

/// A 2-component real vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2D {
    pub x: f32,
    pub y: f32,
}

impl Vector2D {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn scale(self, scalar: f32) -> Self {
        (Vec2::from(self) * scalar).into()
    }

    /// Componentwise division by a scalar
    ///
    /// Fails on an exact zero, on a non-finite divisor, and when the
    /// quotient overflows to infinity.
    pub fn divide(self, scalar: f32) -> Result<Self> {
        if scalar == 0.0 {
            return Err(PhysicsError::DivisionByZero);
        }
        if !scalar.is_finite() {
            return Err(PhysicsError::NonFiniteScalar(scalar));
        }
        let out = Vec2::from(self) / scalar;
        if !out.is_finite() {
            return Err(PhysicsError::NonFiniteResult);
        }
        Ok(out.into())
    }

    /// Euclidean norm
    #[inline]
    pub fn length(self) -> f32 {
        Vec2::from(self).length()
    }

    /// Unit vector in the same direction
    pub fn normalize(self) -> Result<Self> {
        let len = self.length();
        if len == 0.0 {
            return Err(PhysicsError::ZeroLengthVector);
        }
        Ok((Vec2::from(self) / len).into())
    }

    /// Rotate by `degrees` (see module docs for the sign convention)
    #[inline]
    pub fn rotate(self, degrees: f32) -> Self {
        Vec2::from_angle(degrees.to_radians())
            .rotate(self.into())
            .into()
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        Vec2::from(self).dot(other.into())
    }

    /// Scalar cross product `x1*y2 - y1*x2`
    #[inline]
    pub fn cross(self, other: Self) -> f32 {
        Vec2::from(self).perp_dot(other.into())
    }

    /// `(y, -x)`: a quarter turn
    #[inline]
    pub fn orthogonal(self) -> Self {
        Self::new(self.y, -self.x)
    }

    /// Component by position (0 = x, 1 = y)
    pub fn get(&self, index: usize) -> Option<f32> {
        match index {
            0 => Some(self.x),
            1 => Some(self.y),
            _ => None,
        }
    }
}

impl fmt::Display for Vector2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<Vec2> for Vector2D {
    #[inline]
    fn from(v: Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Vector2D> for Vec2 {
    #[inline]
    fn from(v: Vector2D) -> Self {
        Vec2::new(v.x, v.y)
    }
}

impl From<(f32, f32)> for Vector2D {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

impl From<[f32; 2]> for Vector2D {
    fn from([x, y]: [f32; 2]) -> Self {
        Self::new(x, y)
    }
}

/// Generic two-element access: anything that is not exactly 2 long is rejected
impl TryFrom<&[f32]> for Vector2D {
    type Error = PhysicsError;

    fn try_from(values: &[f32]) -> Result<Self> {
        match values {
            [x, y] => Ok(Self::new(*x, *y)),
            _ => Err(PhysicsError::DimensionMismatch {
                expected: 2,
                found: values.len(),
            }),
        }
    }
}

impl Index<usize> for Vector2D {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        match index {
            0 => &self.x,
            1 => &self.y,
            _ => panic!("Vector2D index out of range: {index}"),
        }
    }
}

impl Add for Vector2D {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        (Vec2::from(self) + Vec2::from(rhs)).into()
    }
}

impl AddAssign for Vector2D {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vector2D {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        (Vec2::from(self) - Vec2::from(rhs)).into()
    }
}

impl SubAssign for Vector2D {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Vector2D {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f32) -> Self {
        self.scale(rhs)
    }
}

impl Mul<Vector2D> for f32 {
    type Output = Vector2D;
    #[inline]
    fn mul(self, rhs: Vector2D) -> Vector2D {
        rhs.scale(self)
    }
}

impl Neg for Vector2D {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}
