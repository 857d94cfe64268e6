//! The tick driver tying mechanics, grid, and morphogens together.

use crate::gene::Genome;
use crate::grid::{Grid, Neighborhood};
use crate::mechanics::Mechanics;
use crate::morphogen::{self, Maxwell};
use crate::signal::Emission;
use crate::{ConfigError, MaxwellConfig};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Monotonic tick counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Tick(pub u64);

/// The whole simulation: physics arenas, the cell grid, the morphogen,
/// and the single RNG every stochastic decision draws from.
#[derive(Debug)]
pub struct Automaton {
    config: MaxwellConfig,
    mechanics: Mechanics,
    grid: Grid,
    maxwell: Maxwell,
    rng: SmallRng,
    tick: Tick,
}

impl Automaton {
    /// Build a world from a validated configuration and a genome.
    pub fn new(config: MaxwellConfig, genome: Genome) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let mechanics = Mechanics::new(&config);
        let grid = Grid::new(config.width, config.height);
        Ok(Self {
            config,
            mechanics,
            grid,
            maxwell: Maxwell::new(genome),
            rng,
            tick: Tick(0),
        })
    }

    #[must_use]
    pub fn config(&self) -> &MaxwellConfig {
        &self.config
    }

    #[must_use]
    pub fn mechanics(&self) -> &Mechanics {
        &self.mechanics
    }

    pub fn mechanics_mut(&mut self) -> &mut Mechanics {
        &mut self.mechanics
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn maxwell(&self) -> &Maxwell {
        &self.maxwell
    }

    pub fn maxwell_mut(&mut self) -> &mut Maxwell {
        &mut self.maxwell
    }

    #[must_use]
    pub fn tick_count(&self) -> Tick {
        self.tick
    }

    /// Split borrows for code that draws randomness while mutating the
    /// physics arenas.
    pub(crate) fn parts(&mut self) -> (&MaxwellConfig, &mut Mechanics, &mut SmallRng) {
        (&self.config, &mut self.mechanics, &mut self.rng)
    }

    /// Fitness of the current world per the standard-organism measure.
    #[must_use]
    pub fn fitness(&self) -> f64 {
        morphogen::fitness(&self.mechanics, &self.config)
    }

    /// Advance the world one tick.
    ///
    /// Phase order is fixed: physics step, particle re-bucketing,
    /// emission gathering, delivery, per-cell effects, post pass, cell
    /// reset.
    pub fn tick(&mut self) {
        self.mechanics.step(self.config.time_step);
        self.rebucket();
        let deliveries = self.emission_pass();
        for (x, y, emission) in deliveries {
            self.grid.absorb(x, y, emission);
        }
        self.effect_pass();
        self.maxwell.post_morph(&mut self.mechanics, &mut self.rng);
        self.grid.reset();
        self.tick.0 += 1;
    }

    /// Run several ticks back to back.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    fn rebucket(&mut self) {
        self.grid.reset();
        let mut placements = Vec::with_capacity(self.mechanics.particle_count());
        for (particle_id, particle) in self.mechanics.particles() {
            if let Some((x, y)) = self.grid.bucket(particle.position.x, particle.position.y) {
                placements.push((x, y, particle_id));
            }
        }
        for (x, y, particle_id) in placements {
            if let Some(cell) = self.grid.cell_mut(x, y) {
                cell.particles.push(particle_id);
            }
        }
    }

    /// Match genes cell by cell and collect emissions with their world
    /// target coordinates. Delivery happens afterwards so that matching
    /// always sees the pre-delivery grid.
    fn emission_pass(&mut self) -> Vec<(i32, i32, Emission)> {
        let mut deliveries = Vec::new();
        let Self {
            grid,
            mechanics,
            maxwell,
            ..
        } = self;
        for index in 0..grid.cell_count() {
            let (x, y) = grid.coords_of(index);
            let occupied = grid
                .cell(x, y)
                .map_or(false, |cell| !cell.particles.is_empty());
            if !occupied {
                continue;
            }
            let mut hood = Neighborhood::gather(grid, x, y);
            for emission in maxwell.signal(&mut hood, mechanics) {
                deliveries.push((x + emission.dx, y + emission.dy, emission));
            }
        }
        deliveries
    }

    fn effect_pass(&mut self) {
        let Self {
            grid,
            mechanics,
            maxwell,
            config,
            ..
        } = self;
        for index in 0..grid.cell_count() {
            let (x, y) = grid.coords_of(index);
            let cell = grid.cell_mut_by_index(index);
            maxwell.morph(x, y, cell, mechanics, config);
        }
    }
}
