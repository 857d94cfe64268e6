//! Genes, genomes, and neighborhood pattern matching.

use crate::grid::Neighborhood;
use crate::mechanics::Mechanics;
use crate::orientation::{Direction, Orientation};
use crate::particle::ParticleKind;
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Genomes always hold exactly this many genes.
pub const GENOME_LEN: usize = 27;

/// Farthest cell a gene may target, in cells per axis.
pub const MAX_TARGET_DISTANCE: i32 = 1;
/// Propulsion strength ceiling and step.
pub const MAX_STRENGTH: f64 = 5.0;
pub const STRENGTH_QUANTUM: f64 = 0.1;
/// Tendency (selection weight) magnitude ceiling and step.
pub const MAX_TENDENCY: f64 = 5.0;
pub const TENDENCY_QUANTUM: f64 = 0.1;
pub const MAX_DELAY: u32 = 20;
pub const MAX_DURATION: u32 = 50;

/// One constraint in a gene's 3x3 pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PatternCell {
    /// No constraint.
    #[default]
    Ignore,
    /// The cell must hold no particles.
    Empty,
    /// The cell must hold at least one particle.
    Occupied,
    /// The cell must hold a particle of exactly this kind.
    Kind(ParticleKind),
}

/// The eight things a matched gene can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Create,
    Bond,
    Retype,
    Orient,
    Unbond,
    Destroy,
    Grapple,
    Propel,
}

impl ActionKind {
    pub const ALL: [Self; 8] = [
        Self::Create,
        Self::Bond,
        Self::Retype,
        Self::Orient,
        Self::Unbond,
        Self::Destroy,
        Self::Grapple,
        Self::Propel,
    ];
}

/// A single pattern-action rule.
///
/// The pattern is indexed `[dx + 1][dy + 1]` in the observing particle's
/// own frame, north being +y. Every field beyond the pattern parameterizes
/// the action: which kind it applies to, which way it points, how hard it
/// pushes, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    pub pattern: [[PatternCell; 3]; 3],
    pub action: Option<ActionKind>,
    pub dx: i32,
    pub dy: i32,
    pub kind: ParticleKind,
    pub orientation: Orientation,
    pub strength: f64,
    pub tendency: f64,
    pub delay: u32,
    pub duration: u32,
}

impl Default for Gene {
    fn default() -> Self {
        Self {
            pattern: [[PatternCell::Ignore; 3]; 3],
            action: None,
            dx: 0,
            dy: 0,
            kind: ParticleKind::FOOD,
            orientation: Orientation::default(),
            strength: 0.0,
            tendency: 0.0,
            delay: 0,
            duration: 1,
        }
    }
}

impl Gene {
    /// Overwrite every field with a random draw.
    pub fn randomize(&mut self, rng: &mut SmallRng) {
        for column in &mut self.pattern {
            for cell in column.iter_mut() {
                let draw = rng.random_range(0..ParticleKind::COUNT + 3);
                *cell = match draw {
                    d if d == ParticleKind::COUNT => PatternCell::Ignore,
                    d if d == ParticleKind::COUNT + 1 => PatternCell::Empty,
                    d if d == ParticleKind::COUNT + 2 => PatternCell::Occupied,
                    d => PatternCell::Kind(ParticleKind(d)),
                };
            }
        }
        self.action = Some(ActionKind::ALL[rng.random_range(0..ActionKind::ALL.len())]);
        self.dx = Self::random_offset(rng);
        self.dy = Self::random_offset(rng);
        self.kind = ParticleKind(rng.random_range(0..ParticleKind::COUNT));
        self.orientation.direction = Direction::from_index(rng.random_range(0..8));
        self.orientation.mirrored = rng.random_bool(0.5);
        let strength_steps = (MAX_STRENGTH / STRENGTH_QUANTUM) as i64;
        self.strength = rng.random_range(0..=strength_steps) as f64 * STRENGTH_QUANTUM;
        let tendency_steps = (MAX_TENDENCY / TENDENCY_QUANTUM) as i64;
        self.tendency = rng.random_range(0..=tendency_steps) as f64 * TENDENCY_QUANTUM;
        if rng.random_bool(0.5) {
            self.tendency = -self.tendency;
        }
        self.delay = rng.random_range(0..=MAX_DELAY);
        self.duration = rng.random_range(0..=MAX_DURATION);
    }

    fn random_offset(rng: &mut SmallRng) -> i32 {
        let magnitude = rng.random_range(0..=MAX_TARGET_DISTANCE);
        if rng.random_bool(0.5) {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Pattern cell at a frame-relative offset.
    #[must_use]
    pub fn pattern_at(&self, dx: i32, dy: i32) -> PatternCell {
        self.pattern[(dx + 1) as usize][(dy + 1) as usize]
    }

    pub fn set_pattern(&mut self, dx: i32, dy: i32, cell: PatternCell) {
        self.pattern[(dx + 1) as usize][(dy + 1) as usize] = cell;
    }

    /// Test the pattern against a neighborhood oriented by the observer's
    /// frame. Constraints landing outside the grid can never hold.
    #[must_use]
    pub fn matches(&self, hood: &Neighborhood<'_>, mechanics: &Mechanics) -> bool {
        for dx in -1..=1 {
            for dy in -1..=1 {
                let constraint = self.pattern_at(dx, dy);
                if constraint == PatternCell::Ignore {
                    continue;
                }
                let Some(cell) = hood.cell_at(dx, dy) else {
                    return false;
                };
                let holds = match constraint {
                    PatternCell::Ignore => true,
                    PatternCell::Empty => cell.particles.is_empty(),
                    PatternCell::Occupied => !cell.particles.is_empty(),
                    PatternCell::Kind(kind) => cell.particles.iter().any(|&id| {
                        mechanics
                            .particle(id)
                            .is_some_and(|particle| particle.kind == kind)
                    }),
                };
                if !holds {
                    return false;
                }
            }
        }
        true
    }
}

/// Errors raised while building or decoding a genome.
#[derive(Debug, Error)]
pub enum GenomeError {
    #[error("genome requires exactly {GENOME_LEN} genes, got {0}")]
    WrongGeneCount(usize),
}

/// A fixed-length rule set. Every gene is evaluated every tick; there is
/// no first-match cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Gene>", into = "Vec<Gene>")]
pub struct Genome {
    genes: Vec<Gene>,
}

impl Default for Genome {
    fn default() -> Self {
        Self {
            genes: vec![Gene::default(); GENOME_LEN],
        }
    }
}

impl TryFrom<Vec<Gene>> for Genome {
    type Error = GenomeError;

    fn try_from(genes: Vec<Gene>) -> Result<Self, Self::Error> {
        if genes.len() == GENOME_LEN {
            Ok(Self { genes })
        } else {
            Err(GenomeError::WrongGeneCount(genes.len()))
        }
    }
}

impl From<Genome> for Vec<Gene> {
    fn from(genome: Genome) -> Self {
        genome.genes
    }
}

impl Genome {
    /// A genome of fully random genes.
    #[must_use]
    pub fn randomized(rng: &mut SmallRng) -> Self {
        let mut genome = Self::default();
        for gene in &mut genome.genes {
            gene.randomize(rng);
        }
        genome
    }

    #[must_use]
    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn genes_mut(&mut self) -> &mut [Gene] {
        &mut self.genes
    }

    /// The hand-written foraging rule set for the standard organism:
    /// corners grapple food around the perimeter toward the gut, a side
    /// self-destructs to admit it, food re-creates the missing shell,
    /// then digests away for energy, and propulsion genes search, orbit
    /// food patches, and skirt obstacles.
    #[must_use]
    pub fn foraging() -> Self {
        let corner = PatternCell::Kind(ParticleKind::BODY_CORNER);
        let side = PatternCell::Kind(ParticleKind::BODY_SIDE);
        let food = PatternCell::Kind(ParticleKind::FOOD);

        fn push(genes: &mut Vec<Gene>, setup: impl FnOnce(&mut Gene)) {
            let mut g = Gene::default();
            setup(&mut g);
            genes.push(g);
        }

        let mut genes: Vec<Gene> = Vec::with_capacity(GENOME_LEN);

        // Food ingestion: corners walk food around the shell to the gut.

        // Food north, northwest clear: move it to northwest.
        push(&mut genes, |g| {
            g.set_pattern(0, 1, food);
            g.set_pattern(0, 0, corner);
            g.set_pattern(-1, 1, PatternCell::Empty);
            g.action = Some(ActionKind::Grapple);
            g.dx = 0;
            g.dy = 1;
            g.kind = ParticleKind::FOOD;
            g.orientation.direction = Direction::from_index(7);
        });
        // Food northwest, west clear: move it to west.
        push(&mut genes, |g| {
            g.set_pattern(-1, 1, food);
            g.set_pattern(0, 0, corner);
            g.set_pattern(-1, 0, PatternCell::Empty);
            g.action = Some(ActionKind::Grapple);
            g.dx = -1;
            g.dy = 1;
            g.kind = ParticleKind::FOOD;
            g.orientation.direction = Direction::from_index(7);
        });
        // Food west with the southwest blocked: hold on to it.
        push(&mut genes, |g| {
            g.set_pattern(-1, 0, food);
            g.set_pattern(0, 0, corner);
            g.set_pattern(-1, -1, PatternCell::Occupied);
            g.action = Some(ActionKind::Grapple);
            g.dx = -1;
            g.dy = 0;
            g.kind = ParticleKind::FOOD;
            g.orientation.direction = Direction::from_index(0);
        });
        // Food west with the gut blocked: hold on to it.
        push(&mut genes, |g| {
            g.set_pattern(-1, 0, food);
            g.set_pattern(0, 0, corner);
            g.set_pattern(0, -1, PatternCell::Occupied);
            g.action = Some(ActionKind::Grapple);
            g.dx = -1;
            g.dy = 0;
            g.kind = ParticleKind::FOOD;
            g.orientation.direction = Direction::from_index(0);
        });
        // Food west with a clear path to the gut: move it to southwest.
        push(&mut genes, |g| {
            g.set_pattern(-1, 0, food);
            g.set_pattern(0, 0, corner);
            g.set_pattern(-1, -1, PatternCell::Empty);
            g.set_pattern(0, -1, PatternCell::Empty);
            g.action = Some(ActionKind::Grapple);
            g.dx = -1;
            g.dy = 0;
            g.kind = ParticleKind::FOOD;
            g.orientation.direction = Direction::from_index(7);
        });
        // Food southwest: move it into the gut.
        push(&mut genes, |g| {
            g.set_pattern(-1, -1, food);
            g.set_pattern(0, 0, corner);
            g.set_pattern(0, -1, PatternCell::Empty);
            g.action = Some(ActionKind::Grapple);
            g.dx = -1;
            g.dy = -1;
            g.kind = ParticleKind::FOOD;
            g.orientation.direction = Direction::from_index(7);
        });
        // Food northeast, east clear: move it to east.
        push(&mut genes, |g| {
            g.set_pattern(1, 1, food);
            g.set_pattern(0, 0, corner);
            g.set_pattern(1, 0, PatternCell::Empty);
            g.action = Some(ActionKind::Grapple);
            g.dx = 1;
            g.dy = 1;
            g.kind = ParticleKind::FOOD;
            g.orientation.direction = Direction::from_index(1);
        });
        // Food east with the southeast blocked: bond to it.
        push(&mut genes, |g| {
            g.set_pattern(1, 0, food);
            g.set_pattern(0, 0, corner);
            g.set_pattern(1, -1, PatternCell::Occupied);
            g.action = Some(ActionKind::Bond);
            g.dx = 1;
            g.dy = 0;
            g.kind = ParticleKind::FOOD;
        });
        // Food east with the gut blocked: bond to it.
        push(&mut genes, |g| {
            g.set_pattern(1, 0, food);
            g.set_pattern(0, 0, corner);
            g.set_pattern(0, -1, PatternCell::Occupied);
            g.action = Some(ActionKind::Bond);
            g.dx = 1;
            g.dy = 0;
            g.kind = ParticleKind::FOOD;
        });
        // Food east with a clear path to the gut: bond to it.
        push(&mut genes, |g| {
            g.set_pattern(1, 0, food);
            g.set_pattern(0, 0, corner);
            g.set_pattern(1, -1, PatternCell::Empty);
            g.set_pattern(0, -1, PatternCell::Empty);
            g.action = Some(ActionKind::Bond);
            g.dx = 1;
            g.dy = 0;
            g.kind = ParticleKind::FOOD;
        });
        // Food in the gut: grapple it in place.
        push(&mut genes, |g| {
            g.set_pattern(0, 0, corner);
            g.set_pattern(0, -1, food);
            g.action = Some(ActionKind::Grapple);
            g.dx = 0;
            g.dy = -1;
            g.kind = ParticleKind::FOOD;
            g.orientation.direction = Direction::from_index(0);
        });
        // Side self-destructs so food can enter the gut.
        push(&mut genes, |g| {
            g.set_pattern(0, 1, food);
            g.set_pattern(0, 0, side);
            g.set_pattern(0, -1, PatternCell::Empty);
            g.action = Some(ActionKind::Destroy);
            g.kind = ParticleKind::BODY_SIDE;
        });

        // Shell repair driven by food sitting in the gut.
        let restore_side = |dx: i32, dy: i32, facing: Direction| {
            let mut g = Gene::default();
            for &(cx, cy) in &[(-1, -1), (1, -1), (-1, 1), (1, 1)] {
                g.set_pattern(cx, cy, corner);
            }
            g.set_pattern(0, 0, food);
            g.set_pattern(dx, dy, PatternCell::Empty);
            g.action = Some(ActionKind::Create);
            g.dx = dx;
            g.dy = dy;
            g.kind = ParticleKind::BODY_SIDE;
            g.orientation.direction = facing;
            g
        };
        genes.push(restore_side(0, 1, Direction::North));
        genes.push(restore_side(-1, 0, Direction::West));
        genes.push(restore_side(1, 0, Direction::East));
        genes.push(restore_side(0, -1, Direction::South));

        // Digestion chain: food -> digesting -> digested -> destroyed.
        push(&mut genes, |g| {
            for &(cx, cy) in &[(-1, -1), (1, -1), (-1, 1), (1, 1)] {
                g.set_pattern(cx, cy, corner);
            }
            g.set_pattern(0, 0, food);
            g.action = Some(ActionKind::Retype);
            g.kind = ParticleKind::DIGESTING_FOOD;
        });
        push(&mut genes, |g| {
            g.set_pattern(0, 0, PatternCell::Kind(ParticleKind::DIGESTING_FOOD));
            g.action = Some(ActionKind::Retype);
            g.kind = ParticleKind::DIGESTED_FOOD;
        });
        push(&mut genes, |g| {
            g.set_pattern(0, 0, PatternCell::Kind(ParticleKind::DIGESTED_FOOD));
            g.action = Some(ActionKind::Destroy);
            g.kind = ParticleKind::DIGESTED_FOOD;
        });

        // Sides keep themselves bonded to flanking corners.
        push(&mut genes, |g| {
            g.set_pattern(-1, 0, corner);
            g.set_pattern(0, 0, side);
            g.action = Some(ActionKind::Bond);
            g.dx = -1;
            g.dy = 0;
            g.kind = ParticleKind::BODY_CORNER;
        });
        push(&mut genes, |g| {
            g.set_pattern(1, 0, corner);
            g.set_pattern(0, 0, side);
            g.action = Some(ActionKind::Bond);
            g.dx = 1;
            g.dy = 0;
            g.kind = ParticleKind::BODY_CORNER;
        });

        // Foraging movement.

        // Wander when no food is in sight.
        push(&mut genes, |g| {
            g.set_pattern(0, 1, PatternCell::Empty);
            g.set_pattern(0, 0, corner);
            g.action = Some(ActionKind::Propel);
            g.kind = ParticleKind::BODY_CORNER;
            g.orientation.direction = Direction::North;
            g.strength = 2.0;
            g.tendency = 0.1;
        });
        // Orbit a food patch counter-clockwise.
        push(&mut genes, |g| {
            g.set_pattern(0, 1, food);
            g.set_pattern(0, 0, corner);
            g.action = Some(ActionKind::Propel);
            g.kind = ParticleKind::BODY_CORNER;
            g.orientation.direction = Direction::East;
            g.strength = 0.1;
            g.tendency = 5.0;
            g.duration = 20;
        });
        push(&mut genes, |g| {
            g.set_pattern(0, 1, food);
            g.set_pattern(0, 0, corner);
            g.action = Some(ActionKind::Propel);
            g.kind = ParticleKind::BODY_CORNER;
            g.orientation.direction = Direction::North;
            g.strength = 0.1;
            g.tendency = 3.0;
            g.delay = 20;
            g.duration = 50;
        });

        // Structural repair.

        // A corner grows a missing side to its southwest.
        push(&mut genes, |g| {
            g.set_pattern(-1, 0, PatternCell::Empty);
            g.set_pattern(0, 0, corner);
            g.set_pattern(-1, -1, PatternCell::Empty);
            g.set_pattern(0, -1, PatternCell::Empty);
            g.action = Some(ActionKind::Create);
            g.dx = -1;
            g.dy = -1;
            g.kind = ParticleKind::BODY_SIDE;
            g.orientation.direction = Direction::Northwest;
        });
        // A side grows a missing corner to its west.
        push(&mut genes, |g| {
            g.set_pattern(-1, 0, PatternCell::Empty);
            g.set_pattern(0, 0, side);
            g.action = Some(ActionKind::Create);
            g.dx = -1;
            g.dy = 0;
            g.kind = ParticleKind::BODY_CORNER;
            g.orientation.direction = Direction::Northwest;
        });

        // Skirt obstacles counter-clockwise.
        push(&mut genes, |g| {
            g.set_pattern(0, 1, PatternCell::Kind(ParticleKind::OBSTACLE));
            g.set_pattern(0, 0, corner);
            g.action = Some(ActionKind::Propel);
            g.kind = ParticleKind::BODY_CORNER;
            g.orientation.direction = Direction::East;
            g.strength = 0.1;
            g.duration = 20;
        });

        debug_assert_eq!(genes.len(), GENOME_LEN);
        Self { genes }
    }
}
