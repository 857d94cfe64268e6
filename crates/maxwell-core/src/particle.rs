//! Particles: the atoms of every body.

use crate::math::Vector3;
use crate::orientation::Orientation;
use crate::{BodyId, BondId, ParticleId};
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Open-ended integer tag classifying a particle.
///
/// The morphogen layer matches and rewrites tags freely, so this stays a
/// newtype over the raw id rather than a closed enum. Negative tags are
/// reserved; walls use [`ParticleKind::WALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticleKind(pub i32);

impl ParticleKind {
    pub const FOOD: Self = Self(0);
    pub const POISON: Self = Self(1);
    pub const BODY_CORNER: Self = Self(2);
    pub const BODY_SIDE: Self = Self(3);
    pub const OBSTACLE: Self = Self(4);
    pub const DIGESTING_FOOD: Self = Self(5);
    pub const DIGESTED_FOOD: Self = Self(6);
    /// Transient boundary stand-in, never part of the living world.
    pub const WALL: Self = Self(-1);

    /// Number of ordinary tags the genome can draw from.
    pub const COUNT: i32 = 8;

    /// Corner and side particles make up an organism's shell.
    #[must_use]
    pub fn is_structural(self) -> bool {
        self == Self::BODY_CORNER || self == Self::BODY_SIDE
    }
}

/// A queued propulsion request waiting on a particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Propulsion {
    pub force: Vector3,
    pub weight: f64,
    pub delay: u32,
    pub duration: u32,
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub kind: ParticleKind,
    pub position: Vector3,
    pub radius: f64,
    pub mass: f64,
    pub charge: f64,
    pub restitution: f64,
    pub fixed: bool,
    pub orientation: Orientation,
    /// Owning body; kept in lockstep by the mechanics lifecycle.
    pub body: BodyId,
    /// Bonds attached to this particle.
    pub bonds: Vec<BondId>,
    /// Particle this one struck during the last mechanics step.
    pub collided_with: Option<ParticleId>,
    propulsions: Vec<Propulsion>,
}

impl Particle {
    #[must_use]
    pub fn new(
        kind: ParticleKind,
        position: Vector3,
        body: BodyId,
        radius: f64,
        mass: f64,
        charge: f64,
        restitution: f64,
        fixed: bool,
    ) -> Self {
        Self {
            kind,
            position,
            radius,
            mass,
            charge,
            restitution,
            fixed,
            orientation: Orientation::default(),
            body,
            bonds: Vec::new(),
            collided_with: None,
            propulsions: Vec::new(),
        }
    }

    pub fn queue_propulsion(&mut self, propulsion: Propulsion) {
        self.propulsions.push(propulsion);
    }

    #[must_use]
    pub fn pending_propulsions(&self) -> &[Propulsion] {
        &self.propulsions
    }

    /// Pick at most one active propulsion by weighted draw, then age the
    /// queue: delayed entries count down, active ones burn a tick of
    /// duration and expire at zero.
    ///
    /// The selection normalizer never drops below 1, so lightly weighted
    /// requests can fail to fire at all.
    pub fn resolve_propulsion(&mut self, rng: &mut SmallRng) -> Option<(Vector3, f64)> {
        let total: f64 = self
            .propulsions
            .iter()
            .filter(|p| p.delay == 0)
            .map(|p| p.weight)
            .sum();
        let mut selected = None;
        if total > 0.0 {
            let normalizer = total.max(1.0);
            let draw: f64 = rng.random();
            let mut accumulated = 0.0;
            for propulsion in self.propulsions.iter().filter(|p| p.delay == 0) {
                accumulated += propulsion.weight / normalizer;
                if draw < accumulated {
                    selected = Some((propulsion.force, propulsion.weight));
                    break;
                }
            }
        }
        self.propulsions.retain_mut(|p| {
            if p.delay > 0 {
                p.delay -= 1;
                true
            } else {
                p.duration = p.duration.saturating_sub(1);
                p.duration > 0
            }
        });
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use slotmap::SlotMap;

    fn sample_particle() -> Particle {
        let mut bodies: SlotMap<BodyId, ()> = SlotMap::with_key();
        let body = bodies.insert(());
        Particle::new(
            ParticleKind::BODY_CORNER,
            Vector3::ZERO,
            body,
            0.5,
            1.0,
            0.0,
            1.0,
            false,
        )
    }

    #[test]
    fn heavy_propulsion_always_fires() {
        let mut particle = sample_particle();
        particle.queue_propulsion(Propulsion {
            force: Vector3::new(0.0, 0.2, 0.0),
            weight: 5.0,
            delay: 0,
            duration: 1,
        });
        let mut rng = SmallRng::seed_from_u64(7);
        let (force, weight) = particle.resolve_propulsion(&mut rng).expect("selected");
        assert_eq!(force, Vector3::new(0.0, 0.2, 0.0));
        assert_eq!(weight, 5.0);
        // Duration of one expires after firing once.
        assert!(particle.pending_propulsions().is_empty());
    }

    #[test]
    fn delayed_propulsion_waits_then_fires() {
        let mut particle = sample_particle();
        particle.queue_propulsion(Propulsion {
            force: Vector3::new(0.1, 0.0, 0.0),
            weight: 2.0,
            delay: 2,
            duration: 3,
        });
        let mut rng = SmallRng::seed_from_u64(11);
        assert!(particle.resolve_propulsion(&mut rng).is_none());
        assert!(particle.resolve_propulsion(&mut rng).is_none());
        assert!(particle.resolve_propulsion(&mut rng).is_some());
    }

    #[test]
    fn equal_weights_split_selection_evenly() {
        // Two propulsions of equal weight should be picked about half the
        // time each over a long run.
        let east = Vector3::new(0.1, 0.0, 0.0);
        let west = Vector3::new(-0.1, 0.0, 0.0);
        let mut rng = SmallRng::seed_from_u64(19);
        let mut east_picks = 0;
        let trials = 1000;
        for _ in 0..trials {
            let mut particle = sample_particle();
            for force in [east, west] {
                particle.queue_propulsion(Propulsion {
                    force,
                    weight: 2.0,
                    delay: 0,
                    duration: 1,
                });
            }
            let (force, _) = particle.resolve_propulsion(&mut rng).expect("selected");
            if force == east {
                east_picks += 1;
            }
        }
        assert!(
            (400..=600).contains(&east_picks),
            "east picked {east_picks} of {trials}"
        );
    }

    #[test]
    fn light_weights_can_select_nothing() {
        // Weight 0.1 against a unit normalizer fires roughly one tick in ten.
        let mut fired = 0;
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..200 {
            let mut particle = sample_particle();
            particle.queue_propulsion(Propulsion {
                force: Vector3::new(0.1, 0.0, 0.0),
                weight: 0.1,
                delay: 0,
                duration: 1,
            });
            if particle.resolve_propulsion(&mut rng).is_some() {
                fired += 1;
            }
        }
        assert!(fired > 0 && fired < 100, "fired {fired} of 200");
    }
}
