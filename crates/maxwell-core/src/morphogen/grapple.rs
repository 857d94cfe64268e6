//! Grapple effects: bond to a target and drag it into place.

use crate::math::Vector3;
use crate::mechanics::Mechanics;
use crate::signal::{Emission, Signal};
use crate::{quantize, ParticleId};

/// For each resident of the target kind: ensure a bond to the origin,
/// then teleport the target to the origin's position shifted by the
/// grapple displacement and the cell delta.
pub(super) fn apply(
    x: i32,
    y: i32,
    residents: &[ParticleId],
    emissions: &[Emission],
    mechanics: &mut Mechanics,
) {
    for emission in emissions {
        if emission.delay > 0 {
            continue;
        }
        let Signal::Grapple {
            origin,
            kind,
            dx,
            dy,
        } = emission.signal
        else {
            continue;
        };
        if !mechanics.contains_particle(origin) {
            continue;
        }
        for &pid in residents {
            if pid == origin {
                continue;
            }
            if !mechanics
                .particle(pid)
                .is_some_and(|particle| particle.kind == kind)
            {
                continue;
            }
            mechanics.create_bond(origin, pid);
            let origin_position = match mechanics.particle(origin) {
                Some(particle) => particle.position,
                None => break,
            };
            let position = Vector3::new(
                origin_position.x + f64::from(dx) + quantize(f64::from(x))
                    - quantize(origin_position.x),
                origin_position.y + f64::from(dy) + quantize(f64::from(y))
                    - quantize(origin_position.y),
                0.0,
            );
            if let Some(particle) = mechanics.particle_mut(pid) {
                particle.position = position;
            }
        }
    }
}
