use dynamics_world::prelude::*;
use dynamics_world::SolverType;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Counts its own updates.
struct Counter(Rc<Cell<usize>>);

impl Action for Counter {
    fn update_action(&mut self, _: &Commands, _: f32) {
        self.0.set(self.0.get() + 1);
    }
}

fn main() {
    let mut world = DynamicsWorld::builder()
        .gravity([0.0, -9.8, 0.0])
        .solver(SolverType::SequentialImpulse)
        .max_threads()
        .debug("tick_callbacks")
        .build();

    let ground = world.create_rigid_body(0.0).unwrap();
    let ball = world.create_rigid_body(1.0).unwrap();
    world.add_rigid_body(&ground).unwrap();
    world.add_rigid_body(&ball).unwrap();
    world.set_body_position(&ball, [0.0, 5.0, 0.0]).unwrap();

    let pin = world
        .create_constraint(
            ConstraintType::Point2Point {
                pivot_in_a: [0.0, 0.0, 0.0],
                pivot_in_b: [0.0, 5.0, 0.0],
            },
            &ground,
            &ball,
        )
        .unwrap();
    world.add_constraint(&pin, true).unwrap();

    let updates = Rc::new(Cell::new(0));
    let action: ActionRef = Rc::new(RefCell::new(Counter(Rc::clone(&updates))));
    world.add_action(&action).unwrap();

    let sub_steps = Rc::new(Cell::new(0));
    let counter = Rc::clone(&sub_steps);
    world
        .set_internal_tick_callback(
            Some(TickCallback::new(move |tick, dt| {
                counter.set(counter.get() + 1);
                if counter.get() == 30 {
                    println!("{:?}: flipping gravity after {}s sub-steps", tick.user_info_as::<&str>(), dt);
                    // world mutations from a callback are applied once the step returns
                    tick.commands().set_gravity([0.0, 9.8, 0.0]);
                }
            })),
            Some(Rc::new("demo")),
            Phase::Post,
        )
        .unwrap();

    for _ in 0..60 {
        world.update(Duration::from_millis(16)).unwrap();
    }

    println!("sub-steps: {}", sub_steps.get());
    println!("action updates: {}", updates.get());
    println!("ball position: {:?}", world.body_position(&ball).unwrap());
    println!("gravity: {:?}", world.gravity().unwrap());
    println!("constraints on the ball: {}", ball.num_constraint_refs());
}
