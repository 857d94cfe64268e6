//! Bond and unbond effects.

use crate::mechanics::Mechanics;
use crate::signal::{Emission, Signal};
use crate::ParticleId;

/// Bond (or sever) the signalling particle against every resident of the
/// target kind. Bonding across bodies merges them, which is how loose
/// food gets taken aboard.
pub(super) fn apply(residents: &[ParticleId], emissions: &[Emission], mechanics: &mut Mechanics) {
    for emission in emissions {
        if emission.delay > 0 {
            continue;
        }
        match emission.signal {
            Signal::Bond { origin, kind } => {
                if !mechanics.contains_particle(origin) {
                    continue;
                }
                for &pid in residents {
                    if pid == origin {
                        continue;
                    }
                    if mechanics
                        .particle(pid)
                        .is_some_and(|particle| particle.kind == kind)
                    {
                        mechanics.create_bond(origin, pid);
                    }
                }
            }
            Signal::Unbond { origin, kind } => {
                if !mechanics.contains_particle(origin) {
                    continue;
                }
                for &pid in residents {
                    if pid == origin {
                        continue;
                    }
                    if mechanics
                        .particle(pid)
                        .is_some_and(|particle| particle.kind == kind)
                    {
                        mechanics.remove_bond_between(origin, pid);
                    }
                }
            }
            _ => {}
        }
    }
}
