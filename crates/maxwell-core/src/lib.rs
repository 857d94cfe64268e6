//! Core engine for the Maxwell artificial-life simulation.
//!
//! A world is a bounded two-dimensional region overlaid with a cell grid.
//! Rigid bodies made of bonded particles move through the region under a
//! simple impulse-based mechanics step, while a morphogen layer matches
//! gene patterns against each particle's 3x3 cell neighborhood and turns
//! the matches into signals that create, destroy, bond, reorient, grapple,
//! retype, and propel particles.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use thiserror::Error;

pub mod automaton;
pub mod body;
pub mod descriptor;
pub mod environment;
pub mod gene;
pub mod grid;
pub mod math;
pub mod mechanics;
pub mod morphogen;
pub mod orientation;
pub mod particle;
pub mod signal;

pub use automaton::{Automaton, Tick};
pub use body::{Body, Bond};
pub use descriptor::{BodyDescriptor, DescriptorError, ParticleSpec};
pub use environment::{EnvironmentSpec, PlacementError, PopulationSummary};
pub use gene::{ActionKind, Gene, Genome, GenomeError, PatternCell, GENOME_LEN};
pub use grid::{Cell, Grid, Neighborhood};
pub use math::{Matrix3, Vector3};
pub use mechanics::Mechanics;
pub use morphogen::Maxwell;
pub use orientation::{Direction, Orientation};
pub use particle::{Particle, ParticleKind, Propulsion};
pub use signal::{Emission, Signal};

new_key_type! {
    /// Stable handle for particles backed by a generational slot map.
    pub struct ParticleId;
}

new_key_type! {
    /// Stable handle for bodies.
    pub struct BodyId;
}

new_key_type! {
    /// Stable handle for bonds.
    pub struct BondId;
}

/// Body energy value meaning "never runs out".
pub const INFINITE_ENERGY: i64 = -1;

/// Snap a world coordinate to the center of its grid cell.
#[must_use]
pub fn quantize(coord: f64) -> f64 {
    coord.floor() + 0.5
}

/// Errors raised when a configuration fails validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunable parameters for the world.
///
/// Defaults reproduce the canonical 50x50 world. `validate` must pass
/// before the configuration is used to build an [`Automaton`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaxwellConfig {
    /// Grid width in cells; world x coordinates span `0.0..width`.
    pub width: usize,
    /// Grid height in cells; world y coordinates span `0.0..height`.
    pub height: usize,
    /// Seconds advanced per mechanics step.
    pub time_step: f64,
    /// Hard cap on body speed.
    pub max_velocity: f64,
    /// Fraction of velocity lost per step.
    pub viscosity_friction: f64,
    /// Bonds longer than this break during the mechanics step.
    pub max_bond_length: f64,
    /// Coulomb-style constant for inter-body charge forces.
    pub charge_constant: f64,
    /// Restitution assigned to newly created particles.
    pub default_restitution: f64,
    pub default_radius: f64,
    pub default_mass: f64,
    pub default_charge: f64,
    /// Effective mass of anchored bodies and wall stand-ins.
    pub fixed_mass: f64,
    /// Radius of wall stand-in particles.
    pub fixed_radius: f64,
    /// Particle creation refuses beyond this population.
    pub max_particles: usize,
    /// Deterministic seed; `None` seeds from the OS.
    pub rng_seed: Option<u64>,
    /// Charge particle creation against body energy.
    pub use_energy: bool,
    /// Credit energy for digested food.
    pub store_energy: bool,
    pub initial_energy: i64,
    pub particle_create_cost: i64,
    pub food_energy: i64,
    /// Bodies further than this from the ideal form score zero fitness.
    pub min_fitness_variance: i64,
}

impl Default for MaxwellConfig {
    fn default() -> Self {
        Self {
            width: 50,
            height: 50,
            time_step: 1.0,
            max_velocity: 0.5,
            viscosity_friction: 0.1,
            max_bond_length: 5.0,
            charge_constant: 1.0,
            default_restitution: 1.0,
            default_radius: 0.5,
            default_mass: 1.0,
            default_charge: 0.0,
            fixed_mass: 1000.0,
            fixed_radius: 5.0,
            max_particles: 5000,
            rng_seed: None,
            use_energy: true,
            store_energy: true,
            initial_energy: 10,
            particle_create_cost: 1,
            food_energy: 10,
            min_fitness_variance: 4,
        }
    }
}

impl MaxwellConfig {
    /// Ensure the configuration is internally consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive and finite, got {value}"),
                })
            }
        }

        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid {
                field: "width/height",
                reason: "grid must have at least one cell".to_string(),
            });
        }
        positive("time_step", self.time_step)?;
        positive("max_velocity", self.max_velocity)?;
        positive("max_bond_length", self.max_bond_length)?;
        positive("default_radius", self.default_radius)?;
        positive("default_mass", self.default_mass)?;
        positive("fixed_mass", self.fixed_mass)?;
        positive("fixed_radius", self.fixed_radius)?;
        if !(0.0..1.0).contains(&self.viscosity_friction) {
            return Err(ConfigError::Invalid {
                field: "viscosity_friction",
                reason: format!("must lie in [0, 1), got {}", self.viscosity_friction),
            });
        }
        if self.max_particles == 0 {
            return Err(ConfigError::Invalid {
                field: "max_particles",
                reason: "must allow at least one particle".to_string(),
            });
        }
        if self.particle_create_cost < 0 || self.food_energy < 0 {
            return Err(ConfigError::Invalid {
                field: "energy",
                reason: "costs and rewards must be non-negative".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        MaxwellConfig::default().validate().expect("default config");
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        let config = MaxwellConfig {
            width: 0,
            ..MaxwellConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn excessive_friction_is_rejected() {
        let config = MaxwellConfig {
            viscosity_friction: 1.0,
            ..MaxwellConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn quantize_snaps_to_cell_centers() {
        assert_eq!(quantize(3.0), 3.5);
        assert_eq!(quantize(3.99), 3.5);
        assert_eq!(quantize(0.2), 0.5);
    }
}
