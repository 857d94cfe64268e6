//! Compass directions and particle orientation frames.
//!
//! The eight directions form a clockwise ring starting at north. Gene
//! patterns and target offsets are written in a particle's own frame; the
//! orientation rotates (and optionally mirrors about the forward axis) that
//! frame into world coordinates.

use crate::math::Vector3;
use serde::{Deserialize, Serialize};

/// Component magnitude of a unit vector along a diagonal.
const DIAGONAL: f64 = 0.707_107;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    North,
    Northeast,
    East,
    Southeast,
    South,
    Southwest,
    West,
    Northwest,
}

impl Direction {
    pub const ALL: [Self; 8] = [
        Self::North,
        Self::Northeast,
        Self::East,
        Self::Southeast,
        Self::South,
        Self::Southwest,
        Self::West,
        Self::Northwest,
    ];

    /// Position on the clockwise compass ring, north = 0.
    #[must_use]
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&d| d == self).unwrap_or(0)
    }

    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 8]
    }

    /// Cell offset one step in this direction, north being +y.
    #[must_use]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::Northeast => (1, 1),
            Self::East => (1, 0),
            Self::Southeast => (1, -1),
            Self::South => (0, -1),
            Self::Southwest => (-1, -1),
            Self::West => (-1, 0),
            Self::Northwest => (-1, 1),
        }
    }

    /// Ring position of a non-center neighbor offset.
    #[must_use]
    pub fn from_offset(dx: i32, dy: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.offset() == (dx, dy))
    }

    /// Unit vector pointing this way, diagonals included.
    #[must_use]
    pub fn unit_vector(self) -> Vector3 {
        let (dx, dy) = self.offset();
        let scale = if dx != 0 && dy != 0 { DIAGONAL } else { 1.0 };
        Vector3::new(f64::from(dx) * scale, f64::from(dy) * scale, 0.0)
    }

    /// Step clockwise around the ring.
    #[must_use]
    pub fn rotated(self, steps: usize) -> Self {
        Self::from_index(self.index() + steps)
    }

    /// Reflect about the north-south axis.
    #[must_use]
    pub fn mirrored(self) -> Self {
        Self::from_index((8 - self.index()) % 8)
    }
}

/// A particle's facing: a compass direction plus a mirror flag.
///
/// Mirroring flips handedness about the particle's forward axis, so a
/// mirrored particle reads "clockwise" as counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub direction: Direction,
    pub mirrored: bool,
}

impl Orientation {
    #[must_use]
    pub const fn new(direction: Direction, mirrored: bool) -> Self {
        Self {
            direction,
            mirrored,
        }
    }

    #[must_use]
    pub const fn facing(direction: Direction) -> Self {
        Self::new(direction, false)
    }

    /// Carry a frame-relative direction into world coordinates.
    #[must_use]
    pub fn aim(self, relative: Direction) -> Direction {
        let relative = if self.mirrored {
            relative.mirrored()
        } else {
            relative
        };
        self.direction.rotated(relative.index())
    }

    /// Compose a mirror flag with this frame's handedness.
    #[must_use]
    pub fn compose_mirror(self, mirrored: bool) -> bool {
        self.mirrored ^ mirrored
    }

    /// Map a frame-relative neighbor offset into a world offset.
    ///
    /// The center maps to itself; ring cells are mirrored about the forward
    /// axis when the frame is mirrored, then rotated by the facing.
    #[must_use]
    pub fn transform_offset(self, dx: i32, dy: i32) -> (i32, i32) {
        if dx == 0 && dy == 0 {
            return (0, 0);
        }
        let Some(direction) = Direction::from_offset(dx, dy) else {
            return (dx, dy);
        };
        self.aim(direction).offset()
    }
}

/// Displacement produced by stepping a neighbor offset around the ring.
///
/// Returns the offset of the cell `steps` clockwise (counter-clockwise when
/// `mirrored`) minus the original offset. The center does not move.
#[must_use]
pub fn ring_displacement(dx: i32, dy: i32, steps: usize, mirrored: bool) -> (i32, i32) {
    let Some(start) = Direction::from_offset(dx, dy) else {
        return (0, 0);
    };
    let end = if mirrored {
        Direction::from_index(start.index() + 8 - steps % 8)
    } else {
        start.rotated(steps)
    };
    let (ex, ey) = end.offset();
    (ex - dx, ey - dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_is_clockwise_from_north() {
        assert_eq!(Direction::North.rotated(2), Direction::East);
        assert_eq!(Direction::West.rotated(4), Direction::East);
        assert_eq!(Direction::Northwest.rotated(1), Direction::North);
    }

    #[test]
    fn mirror_reflects_about_north_south() {
        assert_eq!(Direction::North.mirrored(), Direction::North);
        assert_eq!(Direction::East.mirrored(), Direction::West);
        assert_eq!(Direction::Northeast.mirrored(), Direction::Northwest);
        assert_eq!(Direction::South.mirrored(), Direction::South);
    }

    #[test]
    fn aim_rotates_through_the_frame() {
        let east = Orientation::facing(Direction::East);
        assert_eq!(east.aim(Direction::North), Direction::East);
        assert_eq!(east.aim(Direction::East), Direction::South);

        let mirrored = Orientation::new(Direction::North, true);
        assert_eq!(mirrored.aim(Direction::East), Direction::West);
    }

    #[test]
    fn transform_offset_rotates_ring_cells() {
        let east = Orientation::facing(Direction::East);
        assert_eq!(east.transform_offset(0, 1), (1, 0));
        assert_eq!(east.transform_offset(1, 1), (1, -1));
        assert_eq!(east.transform_offset(0, 0), (0, 0));
    }

    #[test]
    fn ring_displacement_steps_clockwise() {
        // North stepped seven places clockwise lands on northwest.
        assert_eq!(ring_displacement(0, 1, 7, false), (-1, 0));
        // Southwest stepped seven places lands on south.
        assert_eq!(ring_displacement(-1, -1, 7, false), (1, 0));
        // Mirrored frames step the other way.
        assert_eq!(ring_displacement(0, 1, 1, true), (-1, 0));
        assert_eq!(ring_displacement(0, 0, 3, false), (0, 0));
    }
}
