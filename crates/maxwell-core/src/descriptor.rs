//! Declarative body descriptions and the canonical prototypes.
//!
//! Descriptors are the external interface for seeding a world: a list of
//! particle records with offsets from a placement origin, plus bond index
//! pairs. They serialize cleanly, so initial configurations can live in
//! files.

use crate::math::Vector3;
use crate::mechanics::Mechanics;
use crate::orientation::{Direction, Orientation};
use crate::particle::ParticleKind;
use crate::{BodyId, MaxwellConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while materializing a descriptor into the world.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("descriptor holds no particles")]
    EmptyBody,
    #[error("bond index {index} out of range for {count} particles")]
    BondIndexOutOfRange { index: usize, count: usize },
    #[error("particle population ceiling reached")]
    ParticleLimit,
}

/// One particle in a descriptor, positioned relative to the placement
/// origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleSpec {
    pub kind: ParticleKind,
    pub offset: Vector3,
    pub radius: f64,
    pub mass: f64,
    pub charge: f64,
    pub restitution: f64,
    pub fixed: bool,
    pub orientation: Orientation,
}

impl ParticleSpec {
    /// A default-shaped particle of the given kind at a cell offset.
    #[must_use]
    pub fn new(kind: ParticleKind, dx: f64, dy: f64) -> Self {
        Self {
            kind,
            offset: Vector3::new(dx, dy, 0.0),
            radius: 0.5,
            mass: 1.0,
            charge: 0.0,
            restitution: 1.0,
            fixed: false,
            orientation: Orientation::default(),
        }
    }

    #[must_use]
    pub fn facing(mut self, direction: Direction) -> Self {
        self.orientation = Orientation::facing(direction);
        self
    }

    #[must_use]
    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution;
        self
    }

    #[must_use]
    pub fn anchored(mut self) -> Self {
        self.fixed = true;
        self
    }
}

/// A whole body: particles, bonds by particle index, initial velocity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyDescriptor {
    pub velocity: Vector3,
    pub particles: Vec<ParticleSpec>,
    pub bonds: Vec<(usize, usize)>,
}

impl BodyDescriptor {
    /// Instantiate the descriptor with its first particle's cell at
    /// `origin`. Offsets translate the remaining particles.
    pub fn materialize(
        &self,
        mechanics: &mut Mechanics,
        origin: Vector3,
    ) -> Result<BodyId, DescriptorError> {
        let first = self.particles.first().ok_or(DescriptorError::EmptyBody)?;
        let count = self.particles.len();
        for &(a, b) in &self.bonds {
            let index = a.max(b);
            if index >= count {
                return Err(DescriptorError::BondIndexOutOfRange { index, count });
            }
        }

        let (body, seed) = mechanics
            .create_body(first.kind, first.radius, first.mass, first.charge, first.fixed)
            .ok_or(DescriptorError::ParticleLimit)?;
        let mut ids = Vec::with_capacity(count);
        ids.push(seed);
        if let Some(particle) = mechanics.particle_mut(seed) {
            particle.position = origin + first.offset;
            particle.orientation = first.orientation;
            particle.restitution = first.restitution;
        }
        for spec in &self.particles[1..] {
            let id = mechanics
                .attach_particle(
                    body,
                    spec.kind,
                    origin + spec.offset,
                    spec.radius,
                    spec.mass,
                    spec.charge,
                    spec.fixed,
                )
                .ok_or(DescriptorError::ParticleLimit)?;
            if let Some(particle) = mechanics.particle_mut(id) {
                particle.orientation = spec.orientation;
                particle.restitution = spec.restitution;
            }
            ids.push(id);
        }
        for &(a, b) in &self.bonds {
            mechanics.create_bond(ids[a], ids[b]);
        }
        if let Some(state) = mechanics.body_mut(body) {
            if state.fixed_count == 0 {
                state.velocity = self.velocity;
            }
        }
        Ok(body)
    }

    /// Extent of the descriptor's offsets, for bounds checking before
    /// placement: `(min_x, min_y, max_x, max_y)` inflated by radii.
    #[must_use]
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for spec in &self.particles {
            min_x = min_x.min(spec.offset.x - spec.radius);
            min_y = min_y.min(spec.offset.y - spec.radius);
            max_x = max_x.max(spec.offset.x + spec.radius);
            max_y = max_y.max(spec.offset.y + spec.radius);
        }
        (min_x, min_y, max_x, max_y)
    }

    /// A lone food particle. Food bounces softly.
    #[must_use]
    pub fn food() -> Self {
        Self {
            velocity: Vector3::ZERO,
            particles: vec![ParticleSpec::new(ParticleKind::FOOD, 0.0, 0.0).with_restitution(0.1)],
            bonds: Vec::new(),
        }
    }

    /// A lone poison particle.
    #[must_use]
    pub fn poison() -> Self {
        Self {
            velocity: Vector3::ZERO,
            particles: vec![ParticleSpec::new(ParticleKind::POISON, 0.0, 0.0)],
            bonds: Vec::new(),
        }
    }

    /// A lone anchored obstacle.
    #[must_use]
    pub fn obstacle() -> Self {
        Self {
            velocity: Vector3::ZERO,
            particles: vec![ParticleSpec::new(ParticleKind::OBSTACLE, 0.0, 0.0).anchored()],
            bonds: Vec::new(),
        }
    }

    /// The standard organism: four corners facing the diagonals and four
    /// sides facing the edges, ring-bonded, with an empty gut cell at the
    /// center.
    #[must_use]
    pub fn organism() -> Self {
        let corner = |dx: f64, dy: f64, facing: Direction| {
            ParticleSpec::new(ParticleKind::BODY_CORNER, dx, dy).facing(facing)
        };
        let side = |dx: f64, dy: f64, facing: Direction| {
            ParticleSpec::new(ParticleKind::BODY_SIDE, dx, dy).facing(facing)
        };
        Self {
            velocity: Vector3::ZERO,
            particles: vec![
                corner(1.0, 1.0, Direction::Northeast),
                side(1.0, 0.0, Direction::East),
                corner(1.0, -1.0, Direction::Southeast),
                side(0.0, -1.0, Direction::South),
                corner(-1.0, -1.0, Direction::Southwest),
                side(-1.0, 0.0, Direction::West),
                corner(-1.0, 1.0, Direction::Northwest),
                side(0.0, 1.0, Direction::North),
            ],
            bonds: vec![
                (0, 1),
                (1, 2),
                (2, 3),
                (3, 4),
                (4, 5),
                (5, 6),
                (6, 7),
                (7, 0),
            ],
        }
    }
}

/// Place a descriptor with its origin snapped to a cell center.
pub fn materialize_at_cell(
    descriptor: &BodyDescriptor,
    mechanics: &mut Mechanics,
    x: i32,
    y: i32,
) -> Result<BodyId, DescriptorError> {
    let origin = Vector3::new(crate::quantize(f64::from(x)), crate::quantize(f64::from(y)), 0.0);
    descriptor.materialize(mechanics, origin)
}

/// Whether the descriptor fits inside the world when placed at a cell.
#[must_use]
pub fn fits_at_cell(descriptor: &BodyDescriptor, config: &MaxwellConfig, x: i32, y: i32) -> bool {
    let (min_x, min_y, max_x, max_y) = descriptor.extent();
    let ox = crate::quantize(f64::from(x));
    let oy = crate::quantize(f64::from(y));
    ox + min_x >= 0.0
        && oy + min_y >= 0.0
        && ox + max_x <= config.width as f64
        && oy + max_y <= config.height as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organism_materializes_as_one_connected_body() {
        let config = MaxwellConfig::default();
        let mut mechanics = Mechanics::new(&config);
        let body = materialize_at_cell(&BodyDescriptor::organism(), &mut mechanics, 25, 25)
            .expect("materialize");
        assert_eq!(mechanics.bodies().len(), 1);
        assert_eq!(mechanics.body(body).unwrap().particles.len(), 8);
        assert_eq!(mechanics.bonds().len(), 8);
        assert_eq!(mechanics.body(body).unwrap().mass, 8.0);
    }

    #[test]
    fn bond_indices_are_validated() {
        let mut descriptor = BodyDescriptor::food();
        descriptor.bonds.push((0, 3));
        let config = MaxwellConfig::default();
        let mut mechanics = Mechanics::new(&config);
        let result = materialize_at_cell(&descriptor, &mut mechanics, 10, 10);
        assert!(matches!(
            result,
            Err(DescriptorError::BondIndexOutOfRange { index: 3, count: 1 })
        ));
    }

    #[test]
    fn fits_at_cell_respects_world_bounds() {
        let config = MaxwellConfig::default();
        let organism = BodyDescriptor::organism();
        assert!(fits_at_cell(&organism, &config, 25, 25));
        assert!(!fits_at_cell(&organism, &config, 0, 25));
        assert!(!fits_at_cell(&organism, &config, 25, 49));
    }

    #[test]
    fn descriptor_serde_round_trips() {
        let organism = BodyDescriptor::organism();
        let json = serde_json::to_string(&organism).unwrap();
        let decoded: BodyDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(organism, decoded);
    }
}
