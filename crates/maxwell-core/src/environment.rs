//! Random environment seeding: food patches, drifting poison, anchored
//! obstacles, and the organisms under study.

use crate::descriptor::{fits_at_cell, materialize_at_cell, BodyDescriptor};
use crate::math::Vector3;
use crate::Automaton;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Attempts per placement before giving up on a crowded world.
const MAX_PLACEMENT_TRIES: u32 = 1000;

/// Errors raised while populating a world.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("no free cell found after {tries} attempts")]
    NoFreeCell { tries: u32 },
    #[error("particle population ceiling reached during placement")]
    ParticleLimit,
}

/// How much of everything to scatter into a fresh world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    pub organisms: u32,
    /// Food patch count is drawn from `food_patches_min..=food_patches_max`.
    pub food_patches_min: u32,
    pub food_patches_max: u32,
    /// Patch radius in cells, drawn from `patch_radius_min..=patch_radius_max`.
    pub patch_radius_min: u32,
    pub patch_radius_max: u32,
    pub poison_count: u32,
    pub obstacle_count: u32,
}

impl Default for EnvironmentSpec {
    fn default() -> Self {
        Self {
            organisms: 1,
            food_patches_min: 10,
            food_patches_max: 15,
            patch_radius_min: 2,
            patch_radius_max: 5,
            poison_count: 5,
            obstacle_count: 3,
        }
    }
}

/// What a populate call actually placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PopulationSummary {
    pub organisms: u32,
    pub food: u32,
    pub poison: u32,
    pub obstacles: u32,
}

impl Automaton {
    /// Scatter an environment into the world. Organisms are placed first
    /// so a crowded spec starves food before it starves the subject.
    pub fn populate(&mut self, spec: &EnvironmentSpec) -> Result<PopulationSummary, PlacementError> {
        let (config, mechanics, rng) = self.parts();
        let width = config.width as i32;
        let height = config.height as i32;
        let mut occupied: HashSet<(i32, i32)> = HashSet::new();
        let mut summary = PopulationSummary::default();

        let organism = BodyDescriptor::organism();
        for _ in 0..spec.organisms {
            let (x, y) = find_free_cell(rng, width, height, |x, y| {
                fits_at_cell(&organism, config, x, y)
                    && footprint(&organism, x, y).iter().all(|c| !occupied.contains(c))
            })?;
            materialize_at_cell(&organism, mechanics, x, y)
                .map_err(|_| PlacementError::ParticleLimit)?;
            occupied.extend(footprint(&organism, x, y));
            summary.organisms += 1;
        }

        let food = BodyDescriptor::food();
        let patches = rng.random_range(spec.food_patches_min..=spec.food_patches_max);
        for _ in 0..patches {
            let radius = rng.random_range(spec.patch_radius_min..=spec.patch_radius_max) as i32;
            let (cx, cy) = find_free_cell(rng, width, height, |x, y| !occupied.contains(&(x, y)))?;
            // Disc-shaped fill around the patch center, explicit stack.
            let mut stack = vec![(cx, cy)];
            let mut visited: HashSet<(i32, i32)> = HashSet::new();
            while let Some((x, y)) = stack.pop() {
                if !visited.insert((x, y)) {
                    continue;
                }
                let dx = x - cx;
                let dy = y - cy;
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                if x < 0 || y < 0 || x >= width || y >= height {
                    continue;
                }
                if occupied.insert((x, y)) {
                    materialize_at_cell(&food, mechanics, x, y)
                        .map_err(|_| PlacementError::ParticleLimit)?;
                    summary.food += 1;
                }
                stack.push((x + 1, y));
                stack.push((x - 1, y));
                stack.push((x, y + 1));
                stack.push((x, y - 1));
            }
        }

        for _ in 0..spec.poison_count {
            let (x, y) = find_free_cell(rng, width, height, |x, y| !occupied.contains(&(x, y)))?;
            let mut poison = BodyDescriptor::poison();
            let angle = rng.random_range(0.0..std::f64::consts::TAU);
            let speed = rng.random_range(0.0..=config.max_velocity);
            poison.velocity = Vector3::new(angle.cos() * speed, angle.sin() * speed, 0.0);
            materialize_at_cell(&poison, mechanics, x, y)
                .map_err(|_| PlacementError::ParticleLimit)?;
            occupied.insert((x, y));
            summary.poison += 1;
        }

        let obstacle = BodyDescriptor::obstacle();
        for _ in 0..spec.obstacle_count {
            let (x, y) = find_free_cell(rng, width, height, |x, y| !occupied.contains(&(x, y)))?;
            materialize_at_cell(&obstacle, mechanics, x, y)
                .map_err(|_| PlacementError::ParticleLimit)?;
            occupied.insert((x, y));
            summary.obstacles += 1;
        }

        Ok(summary)
    }
}

/// Cells a descriptor's particles land in when placed at `(x, y)`.
fn footprint(descriptor: &BodyDescriptor, x: i32, y: i32) -> Vec<(i32, i32)> {
    descriptor
        .particles
        .iter()
        .map(|spec| (x + spec.offset.x.round() as i32, y + spec.offset.y.round() as i32))
        .collect()
}

fn find_free_cell(
    rng: &mut rand::rngs::SmallRng,
    width: i32,
    height: i32,
    accept: impl Fn(i32, i32) -> bool,
) -> Result<(i32, i32), PlacementError> {
    for _ in 0..MAX_PLACEMENT_TRIES {
        let x = rng.random_range(0..width);
        let y = rng.random_range(0..height);
        if accept(x, y) {
            return Ok((x, y));
        }
    }
    Err(PlacementError::NoFreeCell {
        tries: MAX_PLACEMENT_TRIES,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::Genome;
    use crate::particle::ParticleKind;
    use crate::MaxwellConfig;

    fn seeded_world() -> Automaton {
        let config = MaxwellConfig {
            rng_seed: Some(7),
            ..MaxwellConfig::default()
        };
        Automaton::new(config, Genome::default()).expect("config is valid")
    }

    #[test]
    fn populate_places_every_category() {
        let mut world = seeded_world();
        let summary = world.populate(&EnvironmentSpec::default()).expect("populate");
        assert_eq!(summary.organisms, 1);
        assert!(summary.food > 0);
        assert_eq!(summary.poison, 5);
        assert_eq!(summary.obstacles, 3);
        let particles = summary.organisms * 8 + summary.food + summary.poison + summary.obstacles;
        assert_eq!(world.mechanics().particle_count(), particles as usize);
    }

    #[test]
    fn populate_is_deterministic_under_a_seed() {
        let mut a = seeded_world();
        let mut b = seeded_world();
        let sa = a.populate(&EnvironmentSpec::default()).expect("populate");
        let sb = b.populate(&EnvironmentSpec::default()).expect("populate");
        assert_eq!(sa, sb);
        assert_eq!(a.mechanics().particle_count(), b.mechanics().particle_count());
    }

    #[test]
    fn obstacles_are_fixed_and_poison_drifts() {
        let mut world = seeded_world();
        world
            .populate(&EnvironmentSpec {
                organisms: 0,
                food_patches_min: 0,
                food_patches_max: 0,
                poison_count: 1,
                obstacle_count: 1,
                ..EnvironmentSpec::default()
            })
            .expect("populate");
        for (_, particle) in world.mechanics().particles() {
            match particle.kind {
                ParticleKind::OBSTACLE => assert!(particle.fixed),
                ParticleKind::POISON => assert!(!particle.fixed),
                other => panic!("unexpected kind {other:?}"),
            }
        }
    }

    #[test]
    fn crowded_world_reports_placement_failure() {
        let mut world = seeded_world();
        let spec = EnvironmentSpec {
            organisms: 0,
            food_patches_min: 0,
            food_patches_max: 0,
            poison_count: 0,
            obstacle_count: 50 * 50 + 1,
            ..EnvironmentSpec::default()
        };
        assert!(matches!(
            world.populate(&spec),
            Err(PlacementError::NoFreeCell { .. })
        ));
    }
}
