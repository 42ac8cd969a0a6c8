mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{count, fixed, tracer, RecordingEngine};
use dynamics_world::{ConstraintType, DynamicsWorld, Error, WorldType};

#[test]
fn adding_an_action_twice_registers_it_once() {
    let (engine, log) = RecordingEngine::new(WorldType::Discrete);
    let mut world = DynamicsWorld::from_engine(engine);
    let trace = Rc::new(RefCell::new(Vec::new()));
    let action = tracer("a", &trace);

    world.add_action(&action).unwrap();
    world.add_action(&action).unwrap();

    assert_eq!(1, world.num_actions());
    assert_eq!(1, count(&log, "create_action"));
    assert_eq!(1, count(&log, "add_action"));

    world.step_simulation(1.0 / 60.0, 1, 1.0 / 60.0).unwrap();
    assert_eq!(vec!["a"], *trace.borrow());
}

#[test]
fn removing_an_unknown_action_is_a_no_op() {
    let (engine, log) = RecordingEngine::new(WorldType::Discrete);
    let mut world = DynamicsWorld::from_engine(engine);
    let trace = Rc::new(RefCell::new(Vec::new()));
    let registered = tracer("registered", &trace);
    let stranger = tracer("stranger", &trace);

    assert_eq!(Ok(()), world.remove_action(&stranger));

    world.add_action(&registered).unwrap();
    assert_eq!(Ok(()), world.remove_action(&stranger));
    assert_eq!(0, count(&log, "remove_action"));
    assert!(world.contains_action(&registered));
}

#[test]
fn removed_actions_stop_running() {
    let mut world = DynamicsWorld::new(WorldType::Discrete);
    let trace = Rc::new(RefCell::new(Vec::new()));
    let first = tracer("first", &trace);
    let second = tracer("second", &trace);

    world.add_action(&first).unwrap();
    world.add_action(&second).unwrap();
    world.step_simulation(1.0 / 60.0, 1, 1.0 / 60.0).unwrap();

    world.remove_action(&first).unwrap();
    world.step_simulation(1.0 / 60.0, 1, 1.0 / 60.0).unwrap();

    assert_eq!(vec!["first", "second", "second"], *trace.borrow());
    assert!(!world.contains_action(&first));
    assert_eq!(1, world.engine().num_actions());
}

#[test]
fn back_references_with_disabled_collisions() {
    let mut world = DynamicsWorld::new(WorldType::Discrete);
    let a = world.create_rigid_body(1.0).unwrap();
    let b = world.create_rigid_body(0.0).unwrap();
    let c = world
        .create_constraint(
            ConstraintType::Hinge {
                pivot_in_a: [0.0, 0.5, 0.0],
                pivot_in_b: [0.0, -0.5, 0.0],
                axis_in_a: [0.0, 0.0, 1.0],
                axis_in_b: [0.0, 0.0, 1.0],
            },
            &a,
            &b,
        )
        .unwrap();

    world.add_constraint(&c, true).unwrap();
    assert!(Rc::ptr_eq(&c, &a.constraint_refs()[0]));
    assert!(Rc::ptr_eq(&c, &b.constraint_refs()[0]));
    assert!(world.engine().constraint_disables_collisions(c.as_raw()));

    world.remove_constraint(&c).unwrap();
    assert!(a.constraint_refs().is_empty());
    assert!(b.constraint_refs().is_empty());
}

#[test]
fn swap_removal_keeps_index_lookup_consistent() {
    let (engine, log) = RecordingEngine::new(WorldType::Discrete);
    let mut world = DynamicsWorld::from_engine(engine);
    let a = world.create_rigid_body(1.0).unwrap();
    let b = world.create_rigid_body(1.0).unwrap();

    let c: Vec<_> = (0..3)
        .map(|_| world.create_constraint(fixed(), &a, &b).unwrap())
        .collect();
    for constraint in &c {
        world.add_constraint(constraint, false).unwrap();
    }

    world.remove_constraint(&c[0]).unwrap();

    assert_eq!(2, world.num_constraints().unwrap());
    assert!(Rc::ptr_eq(&c[2], &world.constraint(0).unwrap()));
    assert!(Rc::ptr_eq(&c[1], &world.constraint(1).unwrap()));
    assert_eq!(
        Err(Error::IndexOutOfRange { index: 2, count: 2 }),
        world.constraint(2).map(|_| ())
    );
    assert_eq!(1, count(&log, "remove_constraint"));
}

#[test]
fn constraint_registration_is_idempotent() {
    let (engine, log) = RecordingEngine::new(WorldType::Discrete);
    let mut world = DynamicsWorld::from_engine(engine);
    let a = world.create_rigid_body(1.0).unwrap();
    let b = world.create_rigid_body(1.0).unwrap();
    let c = world.create_constraint(fixed(), &a, &b).unwrap();

    // never added
    world.remove_constraint(&c).unwrap();

    world.add_constraint(&c, true).unwrap();
    world.add_constraint(&c, true).unwrap();

    assert_eq!(1, world.num_constraints().unwrap());
    assert_eq!(1, a.num_constraint_refs());
    assert_eq!(1, count(&log, "add_constraint"));
    assert_eq!(0, count(&log, "remove_constraint"));
}

#[test]
fn constraint_wrappers_keep_their_identity() {
    let mut world = DynamicsWorld::new(WorldType::Discrete);
    let a = world.create_rigid_body(1.0).unwrap();
    let b = world.create_rigid_body(1.0).unwrap();
    let c = world
        .create_constraint(
            ConstraintType::Point2Point {
                pivot_in_a: [1.0, 0.0, 0.0],
                pivot_in_b: [-1.0, 0.0, 0.0],
            },
            &a,
            &b,
        )
        .unwrap();

    world.add_constraint(&c, false).unwrap();

    let looked_up = world.constraint(0).unwrap();
    assert!(Rc::ptr_eq(&c, &looked_up));
    assert!(Rc::ptr_eq(&a, looked_up.body_a()));
    assert!(Rc::ptr_eq(&b, looked_up.body_b()));
}

#[test]
fn constraints_keep_their_bodies_alive() {
    let (engine, log) = RecordingEngine::new(WorldType::Discrete);
    let mut world = DynamicsWorld::from_engine(engine);
    let a = world.create_rigid_body(1.0).unwrap();
    let b = world.create_rigid_body(1.0).unwrap();
    let c = world.create_constraint(fixed(), &a, &b).unwrap();
    world.add_constraint(&c, true).unwrap();

    drop((a, b));
    world.step_simulation(0.0, 1, 1.0 / 60.0).unwrap();
    assert_eq!(0, count(&log, "destroy_body"));

    world.remove_constraint(&c).unwrap();
    drop(c);
    world.step_simulation(0.0, 1, 1.0 / 60.0).unwrap();

    assert_eq!(1, count(&log, "destroy_constraint"));
    assert_eq!(2, count(&log, "destroy_body"));
    assert_eq!(0, world.engine().inner().num_bodies());
}
