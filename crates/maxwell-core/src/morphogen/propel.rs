//! Propel effects and the end-of-tick propulsion resolution.

use crate::gene::STRENGTH_QUANTUM;
use crate::math::Vector3;
use crate::mechanics::Mechanics;
use crate::particle::Propulsion;
use crate::signal::{Emission, Signal};
use crate::{BodyId, ParticleId};
use rand::rngs::SmallRng;

/// Queue propulsion requests on every resident of the target kind.
///
/// The first consumer zeroes the emission's delay and duration, so later
/// takers in the same cell receive an immediate single-tick push. Delay
/// is not a gate here; it travels into the queued propulsion.
pub(super) fn apply(
    residents: &[ParticleId],
    emissions: &mut [Emission],
    mechanics: &mut Mechanics,
) {
    for &pid in residents {
        let kind = match mechanics.particle(pid) {
            Some(particle) => particle.kind,
            None => continue,
        };
        for emission in emissions.iter_mut() {
            let Signal::Propel {
                kind: target,
                direction,
                force_steps,
            } = emission.signal
            else {
                continue;
            };
            if target != kind {
                continue;
            }
            let force = direction.unit_vector() * (f64::from(force_steps) * STRENGTH_QUANTUM);
            if let Some(particle) = mechanics.particle_mut(pid) {
                particle.queue_propulsion(Propulsion {
                    force,
                    weight: emission.strength,
                    delay: emission.delay,
                    duration: emission.duration,
                });
            }
            emission.delay = 0;
            emission.duration = 0;
        }
    }
}

/// Resolve queued propulsions into body forces: each particle draws at
/// most one active propulsion, and the body takes the weight-averaged
/// force of its particles' picks.
pub(super) fn post(mechanics: &mut Mechanics, rng: &mut SmallRng) {
    let body_ids: Vec<BodyId> = mechanics.bodies().keys().collect();
    for body_id in body_ids {
        let members = match mechanics.body(body_id) {
            Some(body) => body.particles.clone(),
            None => continue,
        };
        let mut total_force = Vector3::ZERO;
        let mut total_weight = 0.0;
        for pid in members {
            if let Some(particle) = mechanics.particle_mut(pid) {
                if let Some((force, weight)) = particle.resolve_propulsion(rng) {
                    total_force += force * weight;
                    total_weight += weight;
                }
            }
        }
        if total_weight > 0.0 {
            if let Some(body) = mechanics.body_mut(body_id) {
                body.forces += total_force * (1.0 / total_weight);
            }
        }
    }
}
