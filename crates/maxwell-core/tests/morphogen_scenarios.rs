//! End-to-end morphogen scenarios driven through full automaton ticks.

use maxwell_core::math::Vector3;
use maxwell_core::{
    ActionKind, Automaton, BodyId, Direction, Gene, Genome, MaxwellConfig, ParticleId,
    ParticleKind, PatternCell,
};

fn seeded_world(edit: impl FnOnce(&mut [Gene])) -> Automaton {
    let config = MaxwellConfig {
        rng_seed: Some(1),
        ..MaxwellConfig::default()
    };
    let mut genome = Genome::default();
    edit(genome.genes_mut());
    Automaton::new(config, genome).expect("valid config")
}

fn spawn(world: &mut Automaton, kind: ParticleKind, x: f64, y: f64) -> (BodyId, ParticleId) {
    let (body, particle) = world
        .mechanics_mut()
        .create_body(kind, 0.5, 1.0, 0.0, false)
        .expect("under ceiling");
    world.mechanics_mut().particle_mut(particle).unwrap().position = Vector3::new(x, y, 0.0);
    (body, particle)
}

#[test]
fn create_gene_grows_a_bonded_particle() {
    let mut world = seeded_world(|genes| {
        let g = &mut genes[0];
        g.set_pattern(0, 0, PatternCell::Kind(ParticleKind::BODY_CORNER));
        g.action = Some(ActionKind::Create);
        g.dx = 1;
        g.dy = 0;
        g.kind = ParticleKind::BODY_SIDE;
    });
    let (body, creator) = spawn(&mut world, ParticleKind::BODY_CORNER, 10.5, 10.5);

    world.tick();

    let mechanics = world.mechanics();
    assert_eq!(mechanics.particle_count(), 2);
    assert_eq!(mechanics.bodies().len(), 1);
    assert_eq!(mechanics.bonds().len(), 1);
    // Creation cost came out of the creator's energy store.
    assert_eq!(mechanics.body(body).unwrap().energy, 9);
    let grown = mechanics
        .particles()
        .iter()
        .find(|(id, _)| *id != creator)
        .map(|(_, p)| p)
        .expect("created particle");
    assert_eq!(grown.kind, ParticleKind::BODY_SIDE);
    assert_eq!(grown.position, Vector3::new(11.5, 10.5, 0.0));
    assert_eq!(grown.body, body);
}

#[test]
fn one_creation_per_cell_per_tick() {
    // Two create genes fire from the same corner into the same empty
    // cell; only the first lands and only one creation is paid for.
    let mut world = seeded_world(|genes| {
        genes[0].set_pattern(0, 0, PatternCell::Kind(ParticleKind::BODY_CORNER));
        genes[0].set_pattern(0, 1, PatternCell::Empty);
        genes[0].action = Some(ActionKind::Create);
        genes[0].dx = 0;
        genes[0].dy = 1;
        genes[0].kind = ParticleKind::BODY_SIDE;
        genes[0].orientation.direction = Direction::East;

        genes[1].set_pattern(0, 0, PatternCell::Kind(ParticleKind::BODY_CORNER));
        genes[1].set_pattern(0, 1, PatternCell::Empty);
        genes[1].action = Some(ActionKind::Create);
        genes[1].dx = 0;
        genes[1].dy = 1;
        genes[1].kind = ParticleKind::BODY_CORNER;
    });
    let (body, creator) = spawn(&mut world, ParticleKind::BODY_CORNER, 10.5, 10.5);

    world.tick();

    let mechanics = world.mechanics();
    assert_eq!(mechanics.particle_count(), 2);
    assert_eq!(mechanics.bonds().len(), 1);
    assert_eq!(mechanics.body(body).unwrap().energy, 9);
    let grown = mechanics
        .particles()
        .iter()
        .find(|(id, _)| *id != creator)
        .map(|(_, p)| p)
        .expect("created particle");
    // The first emission in gene order won, carrying its orientation.
    assert_eq!(grown.kind, ParticleKind::BODY_SIDE);
    assert_eq!(grown.orientation.direction, Direction::East);
    assert_eq!(grown.position, Vector3::new(10.5, 11.5, 0.0));
}

#[test]
fn create_refuses_an_occupied_cell() {
    let mut world = seeded_world(|genes| {
        let g = &mut genes[0];
        g.set_pattern(0, 0, PatternCell::Kind(ParticleKind::BODY_CORNER));
        g.action = Some(ActionKind::Create);
        g.dx = 1;
        g.dy = 0;
        g.kind = ParticleKind::BODY_SIDE;
    });
    let (body, _) = spawn(&mut world, ParticleKind::BODY_CORNER, 10.5, 10.5);
    spawn(&mut world, ParticleKind::OBSTACLE, 11.5, 10.5);

    world.tick();

    assert_eq!(world.mechanics().particle_count(), 2);
    assert_eq!(world.mechanics().body(body).unwrap().energy, 10);
}

#[test]
fn out_of_grid_emissions_are_dropped() {
    let mut world = seeded_world(|genes| {
        let g = &mut genes[0];
        g.set_pattern(0, 0, PatternCell::Kind(ParticleKind::BODY_CORNER));
        g.action = Some(ActionKind::Create);
        g.dx = -1;
        g.dy = 0;
        g.kind = ParticleKind::BODY_SIDE;
    });
    let (body, _) = spawn(&mut world, ParticleKind::BODY_CORNER, 0.5, 10.5);

    world.tick();

    assert_eq!(world.mechanics().particle_count(), 1);
    assert_eq!(world.mechanics().body(body).unwrap().energy, 10);
}

#[test]
fn grapple_bonds_and_drags_the_target() {
    // Food to the frame-east is stepped two ring places clockwise, which
    // lands it south of the grappling corner.
    let mut world = seeded_world(|genes| {
        let g = &mut genes[0];
        g.set_pattern(0, 0, PatternCell::Kind(ParticleKind::BODY_CORNER));
        g.set_pattern(1, 0, PatternCell::Kind(ParticleKind::FOOD));
        g.action = Some(ActionKind::Grapple);
        g.dx = 1;
        g.dy = 0;
        g.kind = ParticleKind::FOOD;
        g.orientation.direction = Direction::East;
    });
    let (body, _) = spawn(&mut world, ParticleKind::BODY_CORNER, 10.5, 10.5);
    let (_, food) = spawn(&mut world, ParticleKind::FOOD, 11.5, 10.5);

    world.tick();

    let mechanics = world.mechanics();
    assert_eq!(mechanics.bodies().len(), 1);
    assert_eq!(mechanics.bonds().len(), 1);
    assert_eq!(mechanics.particle(food).unwrap().body, body);
    assert_eq!(
        mechanics.particle(food).unwrap().position,
        Vector3::new(10.5, 9.5, 0.0)
    );
}

#[test]
fn unbond_splits_the_body() {
    let mut world = seeded_world(|genes| {
        let g = &mut genes[0];
        g.set_pattern(0, 0, PatternCell::Kind(ParticleKind::BODY_CORNER));
        g.action = Some(ActionKind::Unbond);
        g.dx = 1;
        g.dy = 0;
        g.kind = ParticleKind::FOOD;
    });
    let (_, corner) = spawn(&mut world, ParticleKind::BODY_CORNER, 10.5, 10.5);
    let (_, food) = spawn(&mut world, ParticleKind::FOOD, 11.5, 10.5);
    world.mechanics_mut().create_bond(corner, food).expect("bond");
    assert_eq!(world.mechanics().bodies().len(), 1);

    world.tick();

    assert_eq!(world.mechanics().bonds().len(), 0);
    assert_eq!(world.mechanics().bodies().len(), 2);
}

#[test]
fn digestion_chain_converts_food_into_energy() {
    // Retype food to digesting, digesting to digested, then destroy the
    // digested remnant for an energy credit. One stage per tick.
    let mut world = seeded_world(|genes| {
        genes[0].set_pattern(0, 0, PatternCell::Kind(ParticleKind::FOOD));
        genes[0].action = Some(ActionKind::Retype);
        genes[0].kind = ParticleKind::DIGESTING_FOOD;

        genes[1].set_pattern(0, 0, PatternCell::Kind(ParticleKind::DIGESTING_FOOD));
        genes[1].action = Some(ActionKind::Retype);
        genes[1].kind = ParticleKind::DIGESTED_FOOD;

        genes[2].set_pattern(0, 0, PatternCell::Kind(ParticleKind::DIGESTED_FOOD));
        genes[2].action = Some(ActionKind::Destroy);
        genes[2].kind = ParticleKind::DIGESTED_FOOD;
    });
    let (body, corner) = spawn(&mut world, ParticleKind::BODY_CORNER, 10.5, 10.5);
    let food = world
        .mechanics_mut()
        .attach_particle(
            body,
            ParticleKind::FOOD,
            Vector3::new(10.5, 9.5, 0.0),
            0.5,
            1.0,
            0.0,
            false,
        )
        .expect("attach");
    world.mechanics_mut().create_bond(corner, food).expect("bond");

    world.tick();
    assert_eq!(
        world.mechanics().particle(food).unwrap().kind,
        ParticleKind::DIGESTING_FOOD
    );
    world.tick();
    assert_eq!(
        world.mechanics().particle(food).unwrap().kind,
        ParticleKind::DIGESTED_FOOD
    );
    world.tick();
    assert!(world.mechanics().particle(food).is_none());
    assert_eq!(world.mechanics().particle_count(), 1);
    assert_eq!(world.mechanics().body(body).unwrap().energy, 20);
}

#[test]
fn orient_points_the_target() {
    let mut world = seeded_world(|genes| {
        let g = &mut genes[0];
        g.set_pattern(0, 0, PatternCell::Kind(ParticleKind::FOOD));
        g.action = Some(ActionKind::Orient);
        g.kind = ParticleKind::FOOD;
        g.orientation.direction = Direction::East;
    });
    let (_, food) = spawn(&mut world, ParticleKind::FOOD, 12.5, 12.5);

    world.tick();

    assert_eq!(
        world.mechanics().particle(food).unwrap().orientation.direction,
        Direction::East
    );
}

#[test]
fn propel_with_certain_weight_moves_the_body() {
    let mut world = seeded_world(|genes| {
        let g = &mut genes[0];
        g.set_pattern(0, 0, PatternCell::Kind(ParticleKind::BODY_CORNER));
        g.action = Some(ActionKind::Propel);
        g.kind = ParticleKind::BODY_CORNER;
        g.orientation.direction = Direction::North;
        g.strength = 2.0;
        // A weight past the unit normalizer makes selection certain.
        g.tendency = 5.0;
    });
    let (body, particle) = spawn(&mut world, ParticleKind::BODY_CORNER, 10.5, 10.5);

    // First tick queues and resolves the propulsion; the second tick
    // integrates the resulting body force.
    world.tick();
    world.tick();

    let mechanics = world.mechanics();
    assert!(mechanics.body(body).unwrap().velocity.y > 0.0);
    assert!(mechanics.particle(particle).unwrap().position.y > 10.5);
    assert_eq!(mechanics.body(body).unwrap().velocity.x, 0.0);
}

#[test]
fn poison_contact_eats_shell_particles() {
    let mut world = seeded_world(|_| {});
    let (_, corner) = spawn(&mut world, ParticleKind::BODY_CORNER, 10.5, 10.5);
    let (poison_body, poison) = spawn(&mut world, ParticleKind::POISON, 11.4, 10.5);
    world.mechanics_mut().body_mut(poison_body).unwrap().velocity = Vector3::new(-0.1, 0.0, 0.0);

    world.tick();

    assert!(world.mechanics().particle(corner).is_none());
    assert!(world.mechanics().particle(poison).is_some());
    assert_eq!(world.mechanics().particle_count(), 1);
}

#[test]
fn delayed_emissions_wait_before_applying() {
    let mut world = seeded_world(|genes| {
        let g = &mut genes[0];
        g.set_pattern(0, 0, PatternCell::Kind(ParticleKind::FOOD));
        g.action = Some(ActionKind::Retype);
        g.kind = ParticleKind::DIGESTING_FOOD;
        g.delay = 3;
    });
    let (_, food) = spawn(&mut world, ParticleKind::FOOD, 12.5, 12.5);

    world.tick();

    // The delay gate keeps the retype from landing; the grid is cleared
    // between ticks, so a delayed emission only ever fires if re-emitted
    // with a zero delay.
    assert_eq!(
        world.mechanics().particle(food).unwrap().kind,
        ParticleKind::FOOD
    );
}
