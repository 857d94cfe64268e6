//! The morphogen layer: gene evaluation, signal dispatch, and the
//! specialized effectors that consume each signal kind.

mod bond;
mod create;
mod grapple;
mod orient;
mod propel;
mod retype;

use crate::gene::{ActionKind, Genome, PatternCell, STRENGTH_QUANTUM};
use crate::grid::{Cell, Neighborhood};
use crate::mechanics::Mechanics;
use crate::orientation::{ring_displacement, Orientation};
use crate::particle::ParticleKind;
use crate::signal::{Emission, Signal};
use crate::{BodyId, MaxwellConfig};
use rand::rngs::SmallRng;

/// The genome-driven morphogen. Stateless between ticks apart from the
/// genome itself; all world state lives in the mechanics arenas and the
/// grid.
#[derive(Debug, Clone)]
pub struct Maxwell {
    genome: Genome,
}

impl Maxwell {
    #[must_use]
    pub fn new(genome: Genome) -> Self {
        Self { genome }
    }

    #[must_use]
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn genome_mut(&mut self) -> &mut Genome {
        &mut self.genome
    }

    /// Evaluate every gene for every particle in the window's center cell
    /// and collect the emissions the matches produce.
    ///
    /// Target offsets, directions, and mirror flags are all carried
    /// through the observing particle's frame. Illegal requests, creating
    /// food, destroying obstacles, retyping to food or from a
    /// non-concrete pattern cell, are refused here rather than at effect
    /// time.
    #[must_use]
    pub fn signal(&self, hood: &mut Neighborhood<'_>, mechanics: &Mechanics) -> Vec<Emission> {
        let mut emissions = Vec::new();
        let residents: Vec<crate::ParticleId> = match hood.center() {
            Some(cell) => cell.particles.clone(),
            None => return emissions,
        };
        for particle_id in residents {
            let Some(particle) = mechanics.particle(particle_id) else {
                continue;
            };
            let frame = particle.orientation;
            hood.set_frame(frame);
            for gene in self.genome.genes() {
                let Some(action) = gene.action else {
                    continue;
                };
                if gene.pattern_at(0, 0) != PatternCell::Kind(particle.kind) {
                    continue;
                }
                if !gene.matches(hood, mechanics) {
                    continue;
                }
                let (tx, ty) = frame.transform_offset(gene.dx, gene.dy);
                let signal = match action {
                    ActionKind::Create => {
                        if gene.kind == ParticleKind::FOOD {
                            continue;
                        }
                        Signal::Create {
                            creator: particle_id,
                            kind: gene.kind,
                            orientation: Orientation::new(
                                frame.aim(gene.orientation.direction),
                                frame.compose_mirror(gene.orientation.mirrored),
                            ),
                        }
                    }
                    ActionKind::Bond => Signal::Bond {
                        origin: particle_id,
                        kind: gene.kind,
                    },
                    ActionKind::Unbond => Signal::Unbond {
                        origin: particle_id,
                        kind: gene.kind,
                    },
                    ActionKind::Retype => {
                        if gene.kind == ParticleKind::FOOD {
                            continue;
                        }
                        if !(-1..=1).contains(&tx) || !(-1..=1).contains(&ty) {
                            continue;
                        }
                        // The target kind is read from the gene's own
                        // pattern at the transformed offset.
                        match gene.pattern_at(tx, ty) {
                            PatternCell::Kind(target) => Signal::Retype {
                                kind: gene.kind,
                                target,
                            },
                            _ => continue,
                        }
                    }
                    ActionKind::Orient => Signal::Orient {
                        kind: gene.kind,
                        orientation: Orientation::new(
                            frame.aim(gene.orientation.direction),
                            frame.compose_mirror(gene.orientation.mirrored),
                        ),
                    },
                    ActionKind::Destroy => {
                        if gene.kind == ParticleKind::OBSTACLE {
                            continue;
                        }
                        Signal::Destroy { kind: gene.kind }
                    }
                    ActionKind::Grapple => {
                        if !(-1..=1).contains(&tx) || !(-1..=1).contains(&ty) {
                            continue;
                        }
                        let (dx, dy) = ring_displacement(
                            tx,
                            ty,
                            gene.orientation.direction.index(),
                            frame.mirrored,
                        );
                        Signal::Grapple {
                            origin: particle_id,
                            kind: gene.kind,
                            dx,
                            dy,
                        }
                    }
                    ActionKind::Propel => Signal::Propel {
                        kind: gene.kind,
                        direction: frame.aim(gene.orientation.direction),
                        force_steps: (gene.strength / STRENGTH_QUANTUM) as i32,
                    },
                };
                let mut emission = Emission::new(signal, tx, ty, gene.delay, gene.duration);
                if action == ActionKind::Propel {
                    emission.strength = gene.tendency;
                }
                emissions.push(emission);
            }
        }
        emissions
    }

    /// Apply one cell's absorbed emissions, effector by effector in fixed
    /// order: bond, create, grapple, propel, orient, retype.
    pub fn morph(
        &self,
        x: i32,
        y: i32,
        cell: &mut Cell,
        mechanics: &mut Mechanics,
        config: &MaxwellConfig,
    ) {
        let mut emissions = std::mem::take(&mut cell.absorbed);
        if emissions.is_empty() {
            return;
        }
        bond::apply(&cell.particles, &emissions, mechanics);
        create::apply(x, y, &mut cell.particles, &emissions, mechanics, config);
        grapple::apply(x, y, &cell.particles, &emissions, mechanics);
        propel::apply(&cell.particles, &mut emissions, mechanics);
        orient::apply(&cell.particles, &emissions, mechanics);
        retype::apply(&cell.particles, &emissions, mechanics);
    }

    /// End-of-tick pass: resolve queued propulsions into body forces,
    /// then let poison contact eat away shell particles.
    pub fn post_morph(&self, mechanics: &mut Mechanics, rng: &mut SmallRng) {
        propel::post(mechanics, rng);
        loop {
            let victim = mechanics.particles().iter().find_map(|(id, particle)| {
                if !particle.kind.is_structural() {
                    return None;
                }
                let other = particle.collided_with?;
                match mechanics.particle(other) {
                    Some(contact) if contact.kind == ParticleKind::POISON => Some(id),
                    _ => None,
                }
            });
            match victim {
                Some(id) => mechanics.remove_particle(id),
                None => break,
            }
        }
    }
}

/// How far a body strays from the ideal organism: four corners and four
/// sides in a ring, nothing foreign aboard, shell fully bonded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrganismAssessment {
    pub body: BodyId,
    pub variance: i64,
}

/// Score every body and return the one closest to the ideal form.
/// Ties keep the earliest body scanned.
#[must_use]
pub fn find_best_organism(mechanics: &Mechanics) -> Option<OrganismAssessment> {
    let mut best: Option<OrganismAssessment> = None;
    for (body_id, body) in mechanics.bodies() {
        let variance = assess_body(mechanics, &body.particles);
        if best.is_none_or(|b| variance < b.variance) {
            best = Some(OrganismAssessment {
                body: body_id,
                variance,
            });
        }
    }
    best
}

/// Fitness of the best organism: its energy minus its variance, floored
/// at zero, and zero outright when no body is close enough to the ideal.
#[must_use]
pub fn fitness(mechanics: &Mechanics, config: &MaxwellConfig) -> f64 {
    match find_best_organism(mechanics) {
        Some(assessment) if assessment.variance <= config.min_fitness_variance => {
            let energy = mechanics
                .body(assessment.body)
                .map_or(0, |body| body.energy);
            ((energy - assessment.variance).max(0)) as f64
        }
        _ => 0.0,
    }
}

fn assess_body(mechanics: &Mechanics, members: &[crate::ParticleId]) -> i64 {
    use crate::ParticleId;

    let mut variance: i64 = 0;

    // Foreign particles aboard.
    for &pid in members {
        if let Some(particle) = mechanics.particle(pid) {
            if !particle.kind.is_structural() {
                variance += 1;
            }
        }
    }

    let collect_four = |kind: ParticleKind| -> (i64, [Option<ParticleId>; 4]) {
        let mut slots: [Option<ParticleId>; 4] = [None; 4];
        let mut count = 0;
        for &pid in members {
            if mechanics
                .particle(pid)
                .is_some_and(|particle| particle.kind == kind)
            {
                count += 1;
                if let Some(slot) = slots.iter_mut().find(|slot| slot.is_none()) {
                    *slot = Some(pid);
                }
            }
        }
        (count, slots)
    };

    let position = |pid: ParticleId| mechanics.particle(pid).map(|particle| particle.position);

    // Corners: count deviation, then fix the compass ordering of the
    // first four by looking for axis-aligned partners. Exact coordinate
    // equality is intentional; members of a rigid body translate
    // together, so aligned columns stay aligned.
    let (corners, corner_slots) = collect_four(ParticleKind::BODY_CORNER);
    variance += (corners - 4).abs();
    let mut ne = None;
    let mut se = None;
    let mut sw = None;
    let mut nw = None;
    'corners: for i in 0..4 {
        let Some(pi) = corner_slots[i] else { continue };
        let Some(pos_i) = position(pi) else { continue };
        let mut same_column = None;
        let mut same_row = None;
        for j in 0..4 {
            if i == j {
                continue;
            }
            let Some(pj) = corner_slots[j] else { continue };
            let Some(pos_j) = position(pj) else { continue };
            if pos_i.x == pos_j.x {
                same_column = Some(pos_j);
            }
            if pos_i.y == pos_j.y {
                same_row = Some(pos_j);
            }
        }
        let (Some(column), Some(row)) = (same_column, same_row) else {
            break 'corners;
        };
        if column.y > pos_i.y {
            if row.x > pos_i.x {
                sw = Some(pi);
            } else {
                se = Some(pi);
            }
        } else if row.x > pos_i.x {
            nw = Some(pi);
        } else {
            ne = Some(pi);
        }
    }

    // Sides: same idea along single axes.
    let (sides, side_slots) = collect_four(ParticleKind::BODY_SIDE);
    variance += (sides - 4).abs();
    let mut north = None;
    let mut south = None;
    let mut east = None;
    let mut west = None;
    for i in 0..4 {
        let Some(pi) = side_slots[i] else { continue };
        let Some(pos_i) = position(pi) else { continue };
        for j in 0..4 {
            if i == j {
                continue;
            }
            let Some(pj) = side_slots[j] else { continue };
            let Some(pos_j) = position(pj) else { continue };
            if pos_i.x == pos_j.x {
                if pos_i.y > pos_j.y {
                    north = Some(pi);
                } else {
                    south = Some(pi);
                }
            }
            if pos_i.y == pos_j.y {
                if pos_i.x > pos_j.x {
                    east = Some(pi);
                } else {
                    west = Some(pi);
                }
            }
        }
    }

    // Shell connectivity: each placed side should bond to both adjacent
    // corners.
    let mut missing_bond = |a: Option<ParticleId>, b: Option<ParticleId>| {
        if let (Some(a), Some(b)) = (a, b) {
            if mechanics.bond_between(a, b).is_none() {
                variance += 1;
            }
        }
    };
    missing_bond(north, ne);
    missing_bond(north, nw);
    missing_bond(south, se);
    missing_bond(south, sw);
    missing_bond(east, se);
    missing_bond(east, ne);
    missing_bond(west, sw);
    missing_bond(west, nw);

    variance
}
