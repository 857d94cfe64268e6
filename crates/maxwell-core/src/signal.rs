//! Signals emitted by gene matches and the emissions that carry them.

use crate::orientation::{Direction, Orientation};
use crate::particle::ParticleKind;
use crate::ParticleId;

/// One instruction produced by a matched gene, dispatched to the
/// specialized morphogen that understands it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    /// Grow a new particle bonded to the creator.
    Create {
        creator: ParticleId,
        kind: ParticleKind,
        orientation: Orientation,
    },
    /// Remove every resident particle of the given kind.
    Destroy { kind: ParticleKind },
    /// Bond the origin to every resident of the given kind.
    Bond {
        origin: ParticleId,
        kind: ParticleKind,
    },
    /// Sever the origin's bonds to residents of the given kind.
    Unbond {
        origin: ParticleId,
        kind: ParticleKind,
    },
    /// Point every resident of the given kind the same way.
    Orient {
        kind: ParticleKind,
        orientation: Orientation,
    },
    /// Bond a resident of the given kind to the origin and drag it by the
    /// displacement.
    Grapple {
        origin: ParticleId,
        kind: ParticleKind,
        dx: i32,
        dy: i32,
    },
    /// Rewrite residents of `target` kind to `kind`.
    Retype {
        kind: ParticleKind,
        target: ParticleKind,
    },
    /// Queue a directional push on residents of the given kind. The force
    /// magnitude travels as quantum steps of 0.1.
    Propel {
        kind: ParticleKind,
        direction: Direction,
        force_steps: i32,
    },
}

/// A signal in flight: target cell offset, scheduling, and the weight a
/// propulsion carries into the selection lottery.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub signal: Signal,
    pub dx: i32,
    pub dy: i32,
    pub delay: u32,
    pub duration: u32,
    pub strength: f64,
}

impl Emission {
    #[must_use]
    pub fn new(signal: Signal, dx: i32, dy: i32, delay: u32, duration: u32) -> Self {
        Self {
            signal,
            dx,
            dy,
            delay,
            duration,
            strength: 0.0,
        }
    }

    /// A harmless placeholder emission, handy in tests.
    #[must_use]
    pub fn inert() -> Self {
        Self::new(
            Signal::Destroy {
                kind: ParticleKind::WALL,
            },
            0,
            0,
            0,
            0,
        )
    }
}
