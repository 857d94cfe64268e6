//! Bodies and bonds.
//!
//! A body is a rigid aggregate of bonded particles sharing one velocity and
//! one force accumulator. The inertia tensor is kept diagonal with the
//! crude slab approximation the collision response expects.

use crate::math::{Matrix3, Vector3};
use crate::ParticleId;

#[derive(Debug, Clone)]
pub struct Body {
    /// Member particles, first one is the seed.
    pub particles: Vec<ParticleId>,
    pub mass: f64,
    pub velocity: Vector3,
    /// Accumulated forces, zeroed by each integration pass.
    pub forces: Vector3,
    pub inertia: Matrix3,
    pub inverse_inertia: Matrix3,
    /// Number of anchored member particles; any anchor pins the body.
    pub fixed_count: usize,
    /// Metabolic reserve; negative means inexhaustible.
    pub energy: i64,
}

impl Body {
    #[must_use]
    pub fn new(energy: i64) -> Self {
        Self {
            particles: Vec::new(),
            mass: 0.0,
            velocity: Vector3::ZERO,
            forces: Vector3::ZERO,
            inertia: Matrix3::ZERO,
            inverse_inertia: Matrix3::ZERO,
            fixed_count: 0,
            energy,
        }
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.fixed_count > 0
    }

    /// Rebuild the inertia tensor from the current mass.
    pub fn recompute_inertia(&mut self) {
        if self.mass > 0.0 {
            self.inertia = Matrix3::diagonal(self.mass / 12.0 * 4.0);
            self.inverse_inertia = self.inertia.inverse().unwrap_or(Matrix3::ZERO);
        } else {
            self.inertia = Matrix3::ZERO;
            self.inverse_inertia = Matrix3::ZERO;
        }
    }
}

/// Spring-less link between two particles of the same body.
///
/// Bonds carry no force of their own; the mechanics step breaks any bond
/// stretched past the configured maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    pub a: ParticleId,
    pub b: ParticleId,
}

impl Bond {
    #[must_use]
    pub fn new(a: ParticleId, b: ParticleId) -> Self {
        Self { a, b }
    }

    /// Whether this bond touches the given particle.
    #[must_use]
    pub fn touches(&self, particle: ParticleId) -> bool {
        self.a == particle || self.b == particle
    }

    /// The endpoint opposite `particle`, if `particle` is an endpoint.
    #[must_use]
    pub fn other(&self, particle: ParticleId) -> Option<ParticleId> {
        if self.a == particle {
            Some(self.b)
        } else if self.b == particle {
            Some(self.a)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recompute_inertia_inverts_the_tensor() {
        let mut body = Body::new(10);
        body.mass = 6.0;
        body.recompute_inertia();
        let d = 6.0 / 12.0 * 4.0;
        assert_eq!(body.inertia, Matrix3::diagonal(d));
        assert_eq!(body.inverse_inertia, Matrix3::diagonal(1.0 / d));

        body.mass = 0.0;
        body.recompute_inertia();
        assert_eq!(body.inverse_inertia, Matrix3::ZERO);
    }
}
