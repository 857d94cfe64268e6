use anyhow::{Context, Result};
use maxwell_core::{Automaton, EnvironmentSpec, Genome, MaxwellConfig};
use std::fs;
use tracing::info;

fn main() -> Result<()> {
    init_tracing();
    let genome = load_genome()?;
    let config = MaxwellConfig {
        rng_seed: seed_from_env()?,
        ..MaxwellConfig::default()
    };
    let ticks = ticks_from_env()?;

    let mut world = Automaton::new(config, genome).context("building world")?;
    let summary = world
        .populate(&EnvironmentSpec::default())
        .context("populating world")?;
    info!(
        organisms = summary.organisms,
        food = summary.food,
        poison = summary.poison,
        obstacles = summary.obstacles,
        "Seeded world"
    );

    let report_every = (ticks / 10).max(1);
    while world.tick_count().0 < ticks {
        world.run(report_every.min(ticks - world.tick_count().0));
        info!(
            tick = world.tick_count().0,
            particles = world.mechanics().particle_count(),
            bodies = world.mechanics().bodies().len(),
            fitness = world.fitness(),
            "Progress"
        );
    }

    info!(
        tick = world.tick_count().0,
        fitness = world.fitness(),
        "Simulation finished"
    );
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// First CLI argument names a JSON genome file; without one the built-in
/// foraging genome runs.
fn load_genome() -> Result<Genome> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading genome file {path}"))?;
            let genome: Genome =
                serde_json::from_str(&text).with_context(|| format!("decoding genome {path}"))?;
            info!(path = %path, "Loaded genome");
            Ok(genome)
        }
        None => Ok(Genome::foraging()),
    }
}

fn seed_from_env() -> Result<Option<u64>> {
    match std::env::var("MAXWELL_SEED") {
        Ok(raw) => {
            let seed = raw
                .parse::<u64>()
                .with_context(|| format!("parsing MAXWELL_SEED={raw}"))?;
            Ok(Some(seed))
        }
        Err(_) => Ok(Some(0xFACA_DE)),
    }
}

fn ticks_from_env() -> Result<u64> {
    match std::env::var("MAXWELL_TICKS") {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("parsing MAXWELL_TICKS={raw}")),
        Err(_) => Ok(1000),
    }
}
