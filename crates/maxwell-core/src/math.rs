//! Minimal vector and matrix support for the mechanics engine.
//!
//! Positions and velocities are three-dimensional with the z component
//! permanently zero; keeping the third axis makes the cross products in the
//! collision response read naturally.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub fn magnitude_squared(self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    #[must_use]
    pub fn magnitude(self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    /// Unit vector in the same direction, or zero for the zero vector.
    #[must_use]
    pub fn normalized(self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            self * (1.0 / mag)
        } else {
            Self::ZERO
        }
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Scale down to `limit` when the magnitude exceeds it.
    #[must_use]
    pub fn clamped(self, limit: f64) -> Self {
        let mag = self.magnitude();
        if mag > limit && mag > 0.0 {
            self * (limit / mag)
        } else {
            self
        }
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl AddAssign for Vector3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Vector3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign<f64> for Vector3 {
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}

/// Row-major 3x3 matrix. Only diagonal inertia tensors are built in
/// practice, but the inverse is computed generally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix3 {
    pub rows: [[f64; 3]; 3],
}

impl Matrix3 {
    pub const ZERO: Self = Self {
        rows: [[0.0; 3]; 3],
    };

    #[must_use]
    pub const fn diagonal(d: f64) -> Self {
        Self {
            rows: [[d, 0.0, 0.0], [0.0, d, 0.0], [0.0, 0.0, d]],
        }
    }

    #[must_use]
    pub fn mul_vec(&self, v: Vector3) -> Vector3 {
        let r = &self.rows;
        Vector3::new(
            r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
            r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
            r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
        )
    }

    #[must_use]
    pub fn determinant(&self) -> f64 {
        let r = &self.rows;
        r[0][0] * (r[1][1] * r[2][2] - r[1][2] * r[2][1])
            - r[0][1] * (r[1][0] * r[2][2] - r[1][2] * r[2][0])
            + r[0][2] * (r[1][0] * r[2][1] - r[1][1] * r[2][0])
    }

    /// Inverse via the adjugate; `None` for singular matrices.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 {
            return None;
        }
        let r = &self.rows;
        let inv_det = 1.0 / det;
        let cofactor = |a: f64, b: f64, c: f64, d: f64| (a * d - b * c) * inv_det;
        Some(Self {
            rows: [
                [
                    cofactor(r[1][1], r[1][2], r[2][1], r[2][2]),
                    cofactor(r[0][2], r[0][1], r[2][2], r[2][1]),
                    cofactor(r[0][1], r[0][2], r[1][1], r[1][2]),
                ],
                [
                    cofactor(r[1][2], r[1][0], r[2][2], r[2][0]),
                    cofactor(r[0][0], r[0][2], r[2][0], r[2][2]),
                    cofactor(r[0][2], r[0][0], r[1][2], r[1][0]),
                ],
                [
                    cofactor(r[1][0], r[1][1], r[2][0], r[2][1]),
                    cofactor(r[0][1], r[0][0], r[2][1], r[2][0]),
                    cofactor(r[0][0], r[0][1], r[1][0], r[1][1]),
                ],
            ],
        })
    }
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::ZERO
    }
}
