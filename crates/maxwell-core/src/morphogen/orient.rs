//! Orient effects.

use crate::mechanics::Mechanics;
use crate::signal::{Emission, Signal};
use crate::ParticleId;

/// Point every resident of the target kind the carried way.
pub(super) fn apply(residents: &[ParticleId], emissions: &[Emission], mechanics: &mut Mechanics) {
    for emission in emissions {
        if emission.delay > 0 {
            continue;
        }
        let Signal::Orient { kind, orientation } = emission.signal else {
            continue;
        };
        for &pid in residents {
            if let Some(particle) = mechanics.particle_mut(pid) {
                if particle.kind == kind {
                    particle.orientation = orientation;
                }
            }
        }
    }
}
