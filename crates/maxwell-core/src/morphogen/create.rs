//! Create and destroy effects.

use crate::math::Vector3;
use crate::mechanics::Mechanics;
use crate::particle::ParticleKind;
use crate::signal::{Emission, Signal};
use crate::{quantize, MaxwellConfig, ParticleId, INFINITE_ENERGY};

/// Grow new particles into an empty cell and remove doomed ones.
///
/// At most one creation per cell per tick: the first deliverable create
/// emission wins and ends the pass. Creation is paid for out of the
/// creator body's energy unless the body is inexhaustible; destroying
/// digested food refunds the configured food energy.
pub(super) fn apply(
    x: i32,
    y: i32,
    residents: &mut Vec<ParticleId>,
    emissions: &[Emission],
    mechanics: &mut Mechanics,
    config: &MaxwellConfig,
) {
    for emission in emissions {
        if emission.delay > 0 {
            continue;
        }
        match emission.signal {
            Signal::Create {
                creator,
                kind,
                orientation,
            } => {
                if !residents.is_empty() {
                    continue;
                }
                let (creator_body, creator_position) = match mechanics.particle(creator) {
                    Some(particle) => (particle.body, particle.position),
                    None => continue,
                };
                if config.use_energy {
                    let affordable = mechanics.body(creator_body).is_some_and(|body| {
                        body.energy == INFINITE_ENERGY
                            || body.energy >= config.particle_create_cost
                    });
                    if !affordable {
                        continue;
                    }
                }
                let Some((new_body, new_particle)) = mechanics.create_body(
                    kind,
                    config.default_radius,
                    config.default_mass,
                    config.default_charge,
                    false,
                ) else {
                    continue;
                };
                if config.use_energy {
                    if let Some(body) = mechanics.body_mut(creator_body) {
                        if body.energy != INFINITE_ENERGY {
                            body.energy -= config.particle_create_cost;
                        }
                    }
                }
                let position = Vector3::new(
                    creator_position.x + quantize(f64::from(x)) - quantize(creator_position.x),
                    creator_position.y + quantize(f64::from(y)) - quantize(creator_position.y),
                    0.0,
                );
                if let Some(particle) = mechanics.particle_mut(new_particle) {
                    particle.position = position;
                    particle.orientation = orientation;
                }
                let velocity = mechanics
                    .body(creator_body)
                    .map_or(Vector3::ZERO, |body| body.velocity);
                if let Some(body) = mechanics.body_mut(new_body) {
                    body.velocity = velocity;
                }
                // Bonding folds the newcomer into the creator's body.
                mechanics.create_bond(creator, new_particle);
                break;
            }
            Signal::Destroy { kind } => {
                let victims: Vec<ParticleId> = residents
                    .iter()
                    .copied()
                    .filter(|&id| {
                        mechanics
                            .particle(id)
                            .is_some_and(|particle| particle.kind == kind)
                    })
                    .collect();
                for victim in victims {
                    residents.retain(|&id| id != victim);
                    if config.use_energy
                        && config.store_energy
                        && kind == ParticleKind::DIGESTED_FOOD
                    {
                        if let Some(owner) = mechanics.particle(victim).map(|p| p.body) {
                            if let Some(body) = mechanics.body_mut(owner) {
                                if body.energy != INFINITE_ENERGY {
                                    body.energy += config.food_energy;
                                }
                            }
                        }
                    }
                    mechanics.remove_particle(victim);
                }
            }
            _ => {}
        }
    }
}
