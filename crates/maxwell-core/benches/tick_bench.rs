use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use maxwell_core::{Automaton, EnvironmentSpec, Genome, MaxwellConfig};
use std::time::Duration;

fn bench_automaton_ticks(c: &mut Criterion) {
    let mut group = c.benchmark_group("automaton_tick");
    // Allow env overrides for longer, more stable runs.
    let samples: usize = std::env::var("MX_BENCH_SAMPLES")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(30);
    let warm: u64 = std::env::var("MX_BENCH_WARMUP_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(2);
    let measure: u64 = std::env::var("MX_BENCH_MEASURE_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(10);
    group.sample_size(samples);
    group.warm_up_time(Duration::from_secs(warm));
    group.measurement_time(Duration::from_secs(measure));
    let ticks: u64 = std::env::var("MX_BENCH_TICKS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(32);

    for &patches in &[5_u32, 15, 30] {
        group.bench_function(format!("ticks{ticks}_patches{patches}"), |b| {
            b.iter_batched(
                || {
                    let config = MaxwellConfig {
                        rng_seed: Some(0xBEEF),
                        ..MaxwellConfig::default()
                    };
                    let mut world =
                        Automaton::new(config, Genome::foraging()).expect("valid config");
                    world
                        .populate(&EnvironmentSpec {
                            food_patches_min: patches,
                            food_patches_max: patches,
                            ..EnvironmentSpec::default()
                        })
                        .expect("populate");
                    world
                },
                |mut world| {
                    world.run(ticks);
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_automaton_ticks);
criterion_main!(benches);
