//! Rigid-body mechanics over arenas of particles, bodies, and bonds.
//!
//! The step pipeline is strictly ordered: integrate, break stretched
//! bonds, detect collisions, accumulate charge forces, resolve collisions,
//! discard transient wall stand-ins. Detection records at most one
//! collision per body per step; the first contact found wins and the rest
//! of that body's scan is skipped.

use crate::body::{Body, Bond};
use crate::math::Vector3;
use crate::particle::{Particle, ParticleKind};
use crate::{BodyId, BondId, MaxwellConfig, ParticleId, INFINITE_ENERGY};
use rayon::prelude::*;
use slotmap::SlotMap;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy)]
struct Collision {
    body_a: BodyId,
    particle_a: ParticleId,
    body_b: BodyId,
    particle_b: ParticleId,
    normal: Vector3,
    point: Vector3,
    relative_velocity: Vector3,
}

/// The physics state: every particle, body, and bond in the world.
#[derive(Debug)]
pub struct Mechanics {
    config: MaxwellConfig,
    bodies: SlotMap<BodyId, Body>,
    particles: SlotMap<ParticleId, Particle>,
    bonds: SlotMap<BondId, Bond>,
    collisions: Vec<Collision>,
    wall_bodies: Vec<BodyId>,
}

impl Mechanics {
    #[must_use]
    pub fn new(config: &MaxwellConfig) -> Self {
        Self {
            config: config.clone(),
            bodies: SlotMap::with_key(),
            particles: SlotMap::with_key(),
            bonds: SlotMap::with_key(),
            collisions: Vec::new(),
            wall_bodies: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &MaxwellConfig {
        &self.config
    }

    #[must_use]
    pub fn bodies(&self) -> &SlotMap<BodyId, Body> {
        &self.bodies
    }

    #[must_use]
    pub fn particles(&self) -> &SlotMap<ParticleId, Particle> {
        &self.particles
    }

    #[must_use]
    pub fn bonds(&self) -> &SlotMap<BondId, Bond> {
        &self.bonds
    }

    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    #[must_use]
    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id)
    }

    /// Whether a handle still refers to a live particle.
    #[must_use]
    pub fn contains_particle(&self, id: ParticleId) -> bool {
        self.particles.contains_key(id)
    }

    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Sum of all body masses, wall stand-ins excluded between steps.
    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.bodies.values().map(|body| body.mass).sum()
    }

    /// Spawn a fresh single-particle body at the origin.
    ///
    /// Refuses with `None` once the particle population ceiling is hit.
    pub fn create_body(
        &mut self,
        kind: ParticleKind,
        radius: f64,
        mass: f64,
        charge: f64,
        fixed: bool,
    ) -> Option<(BodyId, ParticleId)> {
        if self.particles.len() >= self.config.max_particles {
            return None;
        }
        let body_id = self.bodies.insert(Body::new(self.config.initial_energy));
        let particle = Particle::new(
            kind,
            Vector3::ZERO,
            body_id,
            radius,
            mass,
            charge,
            self.config.default_restitution,
            fixed,
        );
        let particle_id = self.particles.insert(particle);
        self.link_particle(body_id, particle_id, Vector3::ZERO);
        Some((body_id, particle_id))
    }

    /// Add a particle to an existing body.
    pub fn attach_particle(
        &mut self,
        body: BodyId,
        kind: ParticleKind,
        position: Vector3,
        radius: f64,
        mass: f64,
        charge: f64,
        fixed: bool,
    ) -> Option<ParticleId> {
        if self.particles.len() >= self.config.max_particles || !self.bodies.contains_key(body) {
            return None;
        }
        let particle = Particle::new(
            kind,
            position,
            body,
            radius,
            mass,
            charge,
            self.config.default_restitution,
            fixed,
        );
        let particle_id = self.particles.insert(particle);
        self.link_particle(body, particle_id, Vector3::ZERO);
        Some(particle_id)
    }

    /// Merge a particle into a body: momentum-weighted velocity, summed
    /// mass, rebuilt inertia. An anchored particle pins the body.
    fn link_particle(&mut self, body_id: BodyId, particle_id: ParticleId, velocity: Vector3) {
        let (mass, fixed) = match self.particles.get_mut(particle_id) {
            Some(particle) => {
                particle.body = body_id;
                (particle.mass, particle.fixed)
            }
            None => return,
        };
        let Some(body) = self.bodies.get_mut(body_id) else {
            return;
        };
        let total = body.mass + mass;
        if total > 0.0 {
            body.velocity = (body.velocity * body.mass + velocity * mass) * (1.0 / total);
        }
        body.mass = total;
        body.particles.push(particle_id);
        if fixed {
            body.fixed_count += 1;
            body.velocity = Vector3::ZERO;
        }
        body.recompute_inertia();
    }

    /// Remove a particle, releasing its bonds first. An emptied body
    /// disappears; otherwise the body is re-partitioned into connected
    /// components.
    pub fn remove_particle(&mut self, particle_id: ParticleId) {
        let bonds: Vec<BondId> = match self.particles.get(particle_id) {
            Some(particle) => particle.bonds.clone(),
            None => return,
        };
        for bond in bonds {
            self.unlink_bond(bond);
        }
        let Some(removed) = self.particles.remove(particle_id) else {
            return;
        };
        let body_id = removed.body;
        let emptied = match self.bodies.get_mut(body_id) {
            Some(body) => {
                body.particles.retain(|&p| p != particle_id);
                body.mass -= removed.mass;
                if removed.fixed {
                    body.fixed_count = body.fixed_count.saturating_sub(1);
                }
                body.recompute_inertia();
                body.particles.is_empty()
            }
            None => return,
        };
        if emptied {
            self.bodies.remove(body_id);
        } else {
            self.partition(body_id);
        }
    }

    /// Remove a body outright with all of its particles and bonds.
    pub fn remove_body(&mut self, body_id: BodyId) {
        let Some(body) = self.bodies.remove(body_id) else {
            return;
        };
        for particle_id in body.particles {
            let bonds: Vec<BondId> = self
                .particles
                .get(particle_id)
                .map(|p| p.bonds.clone())
                .unwrap_or_default();
            for bond in bonds {
                self.unlink_bond(bond);
            }
            self.particles.remove(particle_id);
        }
    }

    /// Existing bond between two particles, if any.
    #[must_use]
    pub fn bond_between(&self, a: ParticleId, b: ParticleId) -> Option<BondId> {
        let particle = self.particles.get(a)?;
        particle
            .bonds
            .iter()
            .copied()
            .find(|&id| self.bonds.get(id).is_some_and(|bond| bond.touches(b)))
    }

    /// Bond two particles, idempotently. Bonding across bodies merges the
    /// second body into the first, particle by particle, with momentum
    /// folded in at the donor's velocity.
    pub fn create_bond(&mut self, a: ParticleId, b: ParticleId) -> Option<BondId> {
        if a == b || !self.particles.contains_key(a) || !self.particles.contains_key(b) {
            return None;
        }
        if let Some(existing) = self.bond_between(a, b) {
            return Some(existing);
        }
        let bond_id = self.bonds.insert(Bond::new(a, b));
        if let Some(particle) = self.particles.get_mut(a) {
            particle.bonds.push(bond_id);
        }
        if let Some(particle) = self.particles.get_mut(b) {
            particle.bonds.push(bond_id);
        }
        let body_a = self.particles.get(a)?.body;
        let body_b = self.particles.get(b)?.body;
        if body_a != body_b {
            self.merge_bodies(body_a, body_b);
        }
        Some(bond_id)
    }

    fn merge_bodies(&mut self, into: BodyId, from: BodyId) {
        let Some(donor) = self.bodies.remove(from) else {
            return;
        };
        for particle_id in donor.particles {
            self.link_particle(into, particle_id, donor.velocity);
        }
    }

    /// Remove the bond between two particles, splitting the body if the
    /// removal disconnects it. Returns whether a bond existed.
    pub fn remove_bond_between(&mut self, a: ParticleId, b: ParticleId) -> bool {
        match self.bond_between(a, b) {
            Some(id) => {
                self.break_bond(id);
                true
            }
            None => false,
        }
    }

    fn break_bond(&mut self, bond_id: BondId) {
        let owner = self
            .bonds
            .get(bond_id)
            .and_then(|bond| self.particles.get(bond.a))
            .map(|particle| particle.body);
        self.unlink_bond(bond_id);
        if let Some(body) = owner {
            self.partition(body);
        }
    }

    /// Drop a bond from the registry and both endpoints, no split check.
    fn unlink_bond(&mut self, bond_id: BondId) {
        let Some(bond) = self.bonds.remove(bond_id) else {
            return;
        };
        for endpoint in [bond.a, bond.b] {
            if let Some(particle) = self.particles.get_mut(endpoint) {
                particle.bonds.retain(|&id| id != bond_id);
            }
        }
    }

    /// Split a body into its bond-connected components. The first
    /// component keeps the original body; every other component becomes a
    /// new body inheriting the velocity.
    fn partition(&mut self, body_id: BodyId) {
        let members = match self.bodies.get(body_id) {
            Some(body) => body.particles.clone(),
            None => return,
        };
        let mut assigned: HashMap<ParticleId, usize> = HashMap::new();
        let mut components: Vec<Vec<ParticleId>> = Vec::new();
        for &seed in &members {
            if assigned.contains_key(&seed) {
                continue;
            }
            let index = components.len();
            let mut component = Vec::new();
            let mut stack = vec![seed];
            assigned.insert(seed, index);
            while let Some(current) = stack.pop() {
                component.push(current);
                let neighbors: Vec<ParticleId> = self
                    .particles
                    .get(current)
                    .map(|particle| {
                        particle
                            .bonds
                            .iter()
                            .filter_map(|&id| self.bonds.get(id))
                            .filter_map(|bond| bond.other(current))
                            .collect()
                    })
                    .unwrap_or_default();
                for neighbor in neighbors {
                    if !assigned.contains_key(&neighbor) {
                        assigned.insert(neighbor, index);
                        stack.push(neighbor);
                    }
                }
            }
            components.push(component);
        }
        if components.len() <= 1 {
            return;
        }
        let velocity = self
            .bodies
            .get(body_id)
            .map_or(Vector3::ZERO, |body| body.velocity);
        for (index, component) in components.into_iter().enumerate() {
            if index == 0 {
                if let Some(body) = self.bodies.get_mut(body_id) {
                    body.particles = component;
                }
                self.recompute_body_totals(body_id);
            } else {
                let mut split = Body::new(self.config.initial_energy);
                split.velocity = velocity;
                let new_id = self.bodies.insert(split);
                for &particle_id in &component {
                    if let Some(particle) = self.particles.get_mut(particle_id) {
                        particle.body = new_id;
                    }
                }
                if let Some(body) = self.bodies.get_mut(new_id) {
                    body.particles = component;
                }
                self.recompute_body_totals(new_id);
            }
        }
    }

    fn recompute_body_totals(&mut self, body_id: BodyId) {
        let members = match self.bodies.get(body_id) {
            Some(body) => body.particles.clone(),
            None => return,
        };
        let mut mass = 0.0;
        let mut fixed_count = 0;
        for &particle_id in &members {
            if let Some(particle) = self.particles.get(particle_id) {
                mass += particle.mass;
                if particle.fixed {
                    fixed_count += 1;
                }
            }
        }
        if let Some(body) = self.bodies.get_mut(body_id) {
            body.mass = mass;
            body.fixed_count = fixed_count;
            if fixed_count > 0 {
                body.velocity = Vector3::ZERO;
            }
            body.recompute_inertia();
        }
    }

    /// Advance the physics by one step of `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.integrate(dt);
        self.break_stretched_bonds();
        self.detect_collisions();
        self.accumulate_charge_forces();
        self.resolve_collisions();
        self.discard_transients();
    }

    fn integrate(&mut self, dt: f64) {
        let max_velocity = self.config.max_velocity;
        let friction = self.config.viscosity_friction;
        for body in self.bodies.values_mut() {
            if body.is_fixed() {
                body.velocity = Vector3::ZERO;
                body.forces = Vector3::ZERO;
                continue;
            }
            if body.mass > 0.0 {
                body.velocity += body.forces * (dt / body.mass);
            }
            body.velocity = body.velocity.clamped(max_velocity);
            body.velocity *= 1.0 - friction;
            body.forces = Vector3::ZERO;
        }
        let bodies = &self.bodies;
        for particle in self.particles.values_mut() {
            if let Some(body) = bodies.get(particle.body) {
                particle.position += body.velocity * dt;
            }
        }
    }

    /// Break every bond stretched past the limit, re-partitioning after
    /// each break and rescanning until a clean pass.
    fn break_stretched_bonds(&mut self) {
        loop {
            let stretched = self.bonds.iter().find_map(|(id, bond)| {
                let a = self.particles.get(bond.a)?;
                let b = self.particles.get(bond.b)?;
                if (a.position - b.position).magnitude() > self.config.max_bond_length {
                    Some(id)
                } else {
                    None
                }
            });
            match stretched {
                Some(id) => self.break_bond(id),
                None => break,
            }
        }
    }

    fn detect_collisions(&mut self) {
        self.collisions.clear();
        for particle in self.particles.values_mut() {
            particle.collided_with = None;
        }
        let mut flagged: HashSet<BodyId> = HashSet::new();
        let body_ids: Vec<BodyId> = self.bodies.keys().collect();
        for (index, &body) in body_ids.iter().enumerate() {
            if flagged.contains(&body) {
                continue;
            }
            self.check_wall_contact(body, &mut flagged);
            if flagged.contains(&body) {
                continue;
            }
            self.check_particle_contact(body, &body_ids[index + 1..], &mut flagged);
        }
    }

    /// Test a body's particles against the four world boundaries, bottom,
    /// top, left, right, in that order. An approaching contact spawns a
    /// transient anchored wall body just beyond the boundary and ends the
    /// body's scan.
    fn check_wall_contact(&mut self, body_id: BodyId, flagged: &mut HashSet<BodyId>) {
        let width = self.config.width as f64;
        let height = self.config.height as f64;
        let standoff = self.config.fixed_radius * 3.0 / 4.0;
        let members = match self.bodies.get(body_id) {
            Some(body) => body.particles.clone(),
            None => return,
        };
        for particle_id in members {
            let (position, radius) = match self.particles.get(particle_id) {
                Some(particle) => (particle.position, particle.radius),
                None => continue,
            };
            let contact = if position.y - radius <= 0.0 {
                Some((
                    Vector3::new(position.x, -standoff, 0.0),
                    Vector3::new(position.x, position.y - radius, 0.0),
                ))
            } else if position.y + radius >= height {
                Some((
                    Vector3::new(position.x, height + standoff, 0.0),
                    Vector3::new(position.x, position.y + radius, 0.0),
                ))
            } else if position.x - radius <= 0.0 {
                Some((
                    Vector3::new(-standoff, position.y, 0.0),
                    Vector3::new(position.x - radius, position.y, 0.0),
                ))
            } else if position.x + radius >= width {
                Some((
                    Vector3::new(width + standoff, position.y, 0.0),
                    Vector3::new(position.x + radius, position.y, 0.0),
                ))
            } else {
                None
            };
            let Some((wall_position, point)) = contact else {
                continue;
            };
            let normal = (position - wall_position).normalized();
            let relative_velocity = self
                .bodies
                .get(body_id)
                .map_or(Vector3::ZERO, |body| body.velocity);
            if relative_velocity.dot(normal) < 0.0 {
                let (wall_body, wall_particle) = self.spawn_wall_body(wall_position);
                self.collisions.push(Collision {
                    body_a: body_id,
                    particle_a: particle_id,
                    body_b: wall_body,
                    particle_b: wall_particle,
                    normal,
                    point,
                    relative_velocity,
                });
                flagged.insert(body_id);
                return;
            }
        }
    }

    fn spawn_wall_body(&mut self, position: Vector3) -> (BodyId, ParticleId) {
        let body_id = self.bodies.insert(Body::new(INFINITE_ENERGY));
        let particle = Particle::new(
            ParticleKind::WALL,
            position,
            body_id,
            self.config.fixed_radius,
            self.config.fixed_mass,
            0.0,
            self.config.default_restitution,
            true,
        );
        let particle_id = self.particles.insert(particle);
        self.link_particle(body_id, particle_id, Vector3::ZERO);
        self.wall_bodies.push(body_id);
        (body_id, particle_id)
    }

    /// Test a body against every later unflagged body. The first
    /// overlapping, approaching particle pair is recorded and both bodies
    /// drop out of further detection this step.
    fn check_particle_contact(
        &mut self,
        body_a: BodyId,
        later: &[BodyId],
        flagged: &mut HashSet<BodyId>,
    ) {
        let (members_a, fixed_a, velocity_a) = match self.bodies.get(body_a) {
            Some(body) => (body.particles.clone(), body.is_fixed(), body.velocity),
            None => return,
        };
        for &body_b in later {
            if flagged.contains(&body_b) {
                continue;
            }
            let (members_b, fixed_b, velocity_b) = match self.bodies.get(body_b) {
                Some(body) => (body.particles.clone(), body.is_fixed(), body.velocity),
                None => continue,
            };
            if fixed_a && fixed_b {
                continue;
            }
            let relative_velocity = velocity_a - velocity_b;
            for &particle_a in &members_a {
                let (position_a, radius_a) = match self.particles.get(particle_a) {
                    Some(particle) => (particle.position, particle.radius),
                    None => continue,
                };
                for &particle_b in &members_b {
                    let (position_b, radius_b) = match self.particles.get(particle_b) {
                        Some(particle) => (particle.position, particle.radius),
                        None => continue,
                    };
                    let delta = position_a - position_b;
                    if delta.magnitude() >= radius_a + radius_b {
                        continue;
                    }
                    let normal = delta.normalized();
                    if relative_velocity.dot(normal) >= 0.0 {
                        continue;
                    }
                    let point = position_a + normal * radius_a;
                    self.collisions.push(Collision {
                        body_a,
                        particle_a,
                        body_b,
                        particle_b,
                        normal,
                        point,
                        relative_velocity,
                    });
                    if let Some(particle) = self.particles.get_mut(particle_a) {
                        particle.collided_with = Some(particle_b);
                    }
                    if let Some(particle) = self.particles.get_mut(particle_b) {
                        particle.collided_with = Some(particle_a);
                    }
                    flagged.insert(body_a);
                    flagged.insert(body_b);
                    return;
                }
            }
        }
    }

    /// Inverse-square charge forces between particles of distinct bodies.
    /// Contributions are gathered in parallel from an immutable snapshot
    /// and applied sequentially, so results do not depend on scheduling.
    fn accumulate_charge_forces(&mut self) {
        let constant = self.config.charge_constant;
        if constant == 0.0 {
            return;
        }
        let snapshot: Vec<(BodyId, Vec<(Vector3, f64)>)> = self
            .bodies
            .iter()
            .map(|(id, body)| {
                let charged: Vec<(Vector3, f64)> = body
                    .particles
                    .iter()
                    .filter_map(|&pid| self.particles.get(pid))
                    .filter(|particle| particle.charge != 0.0)
                    .map(|particle| (particle.position, particle.charge))
                    .collect();
                (id, charged)
            })
            .collect();
        if snapshot.iter().all(|(_, charged)| charged.is_empty()) {
            return;
        }
        let contributions: Vec<(BodyId, Vector3)> = snapshot
            .par_iter()
            .map(|(id, mine)| {
                let mut total = Vector3::ZERO;
                for (other, theirs) in &snapshot {
                    if other == id {
                        continue;
                    }
                    for &(position_a, charge_a) in mine {
                        for &(position_b, charge_b) in theirs {
                            let delta = position_a - position_b;
                            let distance_squared = delta.magnitude_squared();
                            if distance_squared > 0.0 {
                                total += delta.normalized()
                                    * (constant * charge_a * charge_b / distance_squared);
                            }
                        }
                    }
                }
                (*id, total)
            })
            .collect();
        for (id, force) in contributions {
            if let Some(body) = self.bodies.get_mut(id) {
                body.forces += force;
            }
        }
    }

    /// Turn recorded contacts into impulses along the contact normal,
    /// using restitution averaged over the pair and the anchored mass for
    /// pinned bodies.
    fn resolve_collisions(&mut self) {
        let fixed_mass = self.config.fixed_mass;
        let collisions = std::mem::take(&mut self.collisions);
        for collision in &collisions {
            let (pa, pb) = match (
                self.particles.get(collision.particle_a),
                self.particles.get(collision.particle_b),
            ) {
                (Some(pa), Some(pb)) => (pa, pb),
                _ => continue,
            };
            let (ba, bb) = match (
                self.bodies.get(collision.body_a),
                self.bodies.get(collision.body_b),
            ) {
                (Some(ba), Some(bb)) => (ba, bb),
                _ => continue,
            };
            let mass_a = if ba.is_fixed() { fixed_mass } else { ba.mass };
            let mass_b = if bb.is_fixed() { fixed_mass } else { bb.mass };
            if mass_a <= 0.0 || mass_b <= 0.0 {
                continue;
            }
            let restitution = (pa.restitution + pb.restitution) / 2.0;
            let arm_a = collision.point - pa.position;
            let arm_b = collision.point - pb.position;
            let angular_a = collision.normal.dot(
                ba.inverse_inertia
                    .mul_vec(arm_a.cross(collision.normal))
                    .cross(arm_a),
            );
            let angular_b = collision.normal.dot(
                bb.inverse_inertia
                    .mul_vec(arm_b.cross(collision.normal))
                    .cross(arm_b),
            );
            let denominator = 1.0 / mass_a + 1.0 / mass_b + angular_a + angular_b;
            if denominator == 0.0 {
                continue;
            }
            let impulse = -(1.0 + restitution) * collision.relative_velocity.dot(collision.normal)
                / denominator;
            if let Some(body) = self.bodies.get_mut(collision.body_a) {
                body.forces += collision.normal * impulse;
            }
            if let Some(body) = self.bodies.get_mut(collision.body_b) {
                body.forces -= collision.normal * impulse;
            }
        }
    }

    fn discard_transients(&mut self) {
        for body_id in std::mem::take(&mut self.wall_bodies) {
            if let Some(body) = self.bodies.remove(body_id) {
                for particle_id in body.particles {
                    self.particles.remove(particle_id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mechanics() -> Mechanics {
        Mechanics::new(&MaxwellConfig::default())
    }

    fn spawn_at(mech: &mut Mechanics, x: f64, y: f64) -> (BodyId, ParticleId) {
        let (body, particle) = mech
            .create_body(ParticleKind::BODY_CORNER, 0.5, 1.0, 0.0, false)
            .expect("under ceiling");
        mech.particle_mut(particle).unwrap().position = Vector3::new(x, y, 0.0);
        (body, particle)
    }

    #[test]
    fn bonding_across_bodies_merges_them() {
        let mut mech = mechanics();
        let (body_a, pa) = spawn_at(&mut mech, 5.5, 5.5);
        let (body_b, pb) = spawn_at(&mut mech, 6.5, 5.5);
        mech.create_bond(pa, pb).expect("bond");
        assert!(mech.body(body_b).is_none());
        assert_eq!(mech.body(body_a).unwrap().particles.len(), 2);
        assert_eq!(mech.particle(pb).unwrap().body, body_a);
        assert_eq!(mech.body(body_a).unwrap().mass, 2.0);
    }

    #[test]
    fn create_bond_is_idempotent() {
        let mut mech = mechanics();
        let (_, pa) = spawn_at(&mut mech, 5.5, 5.5);
        let (_, pb) = spawn_at(&mut mech, 6.5, 5.5);
        let first = mech.create_bond(pa, pb).expect("bond");
        let second = mech.create_bond(pa, pb).expect("bond again");
        assert_eq!(first, second);
        assert_eq!(mech.bonds().len(), 1);
    }

    #[test]
    fn removing_a_cut_vertex_splits_into_every_component()
    {
        // Chain a - b - c - d with b removed leaves {a} and {c, d}.
        let mut mech = mechanics();
        let (body, pa) = spawn_at(&mut mech, 5.5, 5.5);
        let pb = mech
            .attach_particle(
                body,
                ParticleKind::BODY_SIDE,
                Vector3::new(6.5, 5.5, 0.0),
                0.5,
                1.0,
                0.0,
                false,
            )
            .expect("attach");
        let pc = mech
            .attach_particle(
                body,
                ParticleKind::BODY_SIDE,
                Vector3::new(7.5, 5.5, 0.0),
                0.5,
                1.0,
                0.0,
                false,
            )
            .expect("attach");
        let pd = mech
            .attach_particle(
                body,
                ParticleKind::BODY_CORNER,
                Vector3::new(8.5, 5.5, 0.0),
                0.5,
                1.0,
                0.0,
                false,
            )
            .expect("attach");
        mech.create_bond(pa, pb).expect("bond");
        mech.create_bond(pb, pc).expect("bond");
        mech.create_bond(pc, pd).expect("bond");

        mech.remove_particle(pb);
        assert_eq!(mech.bodies().len(), 2);
        let sizes: Vec<usize> = mech
            .bodies()
            .values()
            .map(|body| body.particles.len())
            .collect();
        assert!(sizes.contains(&1) && sizes.contains(&2));
        // No bond spans bodies.
        for bond in mech.bonds().values() {
            let body_a = mech.particle(bond.a).unwrap().body;
            let body_b = mech.particle(bond.b).unwrap().body;
            assert_eq!(body_a, body_b);
        }
    }

    #[test]
    fn particle_ceiling_refuses_creation() {
        let config = MaxwellConfig {
            max_particles: 1,
            ..MaxwellConfig::default()
        };
        let mut mech = Mechanics::new(&config);
        assert!(mech
            .create_body(ParticleKind::FOOD, 0.5, 1.0, 0.0, false)
            .is_some());
        assert!(mech
            .create_body(ParticleKind::FOOD, 0.5, 1.0, 0.0, false)
            .is_none());
    }

    #[test]
    fn stretched_bond_breaks_and_splits() {
        let mut mech = mechanics();
        let (body, pa) = spawn_at(&mut mech, 5.5, 5.5);
        let pb = mech
            .attach_particle(
                body,
                ParticleKind::BODY_SIDE,
                Vector3::new(6.5, 5.5, 0.0),
                0.5,
                1.0,
                0.0,
                false,
            )
            .expect("attach");
        mech.create_bond(pa, pb).expect("bond");
        // Drag one endpoint far past the break length.
        mech.particle_mut(pb).unwrap().position = Vector3::new(20.5, 5.5, 0.0);
        mech.step(1.0);
        assert!(mech.bonds().is_empty());
        assert_eq!(mech.bodies().len(), 2);
    }

    #[test]
    fn wall_bounce_reverses_an_approaching_body() {
        let mut mech = mechanics();
        let (body, particle) = spawn_at(&mut mech, 0.6, 25.5);
        mech.body_mut(body).unwrap().velocity = Vector3::new(-0.4, 0.0, 0.0);
        // Step once to detect, once to integrate the reaction impulse.
        mech.step(1.0);
        mech.step(1.0);
        assert!(mech.body(body).unwrap().velocity.x > 0.0);
        assert!(mech.particle(particle).is_some());
        // Transient wall bodies are gone after the step.
        assert_eq!(mech.bodies().len(), 1);
    }

    #[test]
    fn approaching_bodies_receive_opposite_impulses() {
        let mut mech = mechanics();
        let (body_a, pa) = spawn_at(&mut mech, 10.5, 10.5);
        let (body_b, pb) = spawn_at(&mut mech, 11.4, 10.5);
        mech.body_mut(body_a).unwrap().velocity = Vector3::new(0.2, 0.0, 0.0);
        mech.body_mut(body_b).unwrap().velocity = Vector3::new(-0.2, 0.0, 0.0);

        mech.step(1.0);

        // The contact leaves equal and opposite reaction forces along the
        // collision normal.
        let fa = mech.body(body_a).unwrap().forces;
        let fb = mech.body(body_b).unwrap().forces;
        assert!(fa.x < 0.0 && fb.x > 0.0);
        assert!((fa.x + fb.x).abs() < 1e-12);

        let gap_after_contact = (mech.particle(pb).unwrap().position
            - mech.particle(pa).unwrap().position)
            .magnitude();
        mech.step(1.0);
        // Integrating the impulses reverses both bodies; the overlap does
        // not deepen.
        assert!(mech.body(body_a).unwrap().velocity.x < 0.0);
        assert!(mech.body(body_b).unwrap().velocity.x > 0.0);
        let gap_next_tick = (mech.particle(pb).unwrap().position
            - mech.particle(pa).unwrap().position)
            .magnitude();
        assert!(gap_next_tick >= gap_after_contact);
    }

    #[test]
    fn fixed_bodies_do_not_move() {
        let mut mech = mechanics();
        let (body, particle) = mech
            .create_body(ParticleKind::OBSTACLE, 0.5, 1.0, 0.0, true)
            .expect("create");
        mech.particle_mut(particle).unwrap().position = Vector3::new(10.5, 10.5, 0.0);
        mech.body_mut(body).unwrap().forces = Vector3::new(5.0, 0.0, 0.0);
        mech.step(1.0);
        assert_eq!(mech.body(body).unwrap().velocity, Vector3::ZERO);
        assert_eq!(
            mech.particle(particle).unwrap().position,
            Vector3::new(10.5, 10.5, 0.0)
        );
    }

    #[test]
    fn total_mass_is_conserved_by_stepping() {
        let mut mech = mechanics();
        let (body_a, _) = spawn_at(&mut mech, 10.5, 10.5);
        let (_, _) = spawn_at(&mut mech, 11.5, 10.5);
        mech.body_mut(body_a).unwrap().velocity = Vector3::new(0.3, 0.1, 0.0);
        let before = mech.total_mass();
        for _ in 0..25 {
            mech.step(1.0);
        }
        assert!((mech.total_mass() - before).abs() < 1e-9);
    }
}
