//! Retype effects.

use crate::mechanics::Mechanics;
use crate::signal::{Emission, Signal};
use crate::ParticleId;

/// Rewrite the kind of every resident matching the target kind.
pub(super) fn apply(residents: &[ParticleId], emissions: &[Emission], mechanics: &mut Mechanics) {
    for emission in emissions {
        if emission.delay > 0 {
            continue;
        }
        let Signal::Retype { kind, target } = emission.signal else {
            continue;
        };
        for &pid in residents {
            if let Some(particle) = mechanics.particle_mut(pid) {
                if particle.kind == target {
                    particle.kind = kind;
                }
            }
        }
    }
}
