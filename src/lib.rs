//! World layer of a rigid body dynamics engine.
//!
//! A [`DynamicsWorld`] keeps bodies, constraints, actions and tick callbacks registered with an
//! engine world, and keeps that bookkeeping consistent with the engine's own state across
//! simulation steps. The engine sits behind the [`Engine`](ffi::Engine) function table; the
//! crate ships a pure Rust [`SoftwareEngine`].
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use dynamics_world::prelude::*;
//!
//! struct Weightless;
//!
//! impl Action for Weightless {
//!     fn update_action(&mut self, commands: &Commands, _: f32) {
//!         commands.set_gravity([0.0, 0.0, 0.0]);
//!     }
//! }
//!
//! let mut world = DynamicsWorld::new(WorldType::Discrete);
//! let body = world.create_rigid_body(1.0).unwrap();
//! world.add_rigid_body(&body).unwrap();
//!
//! let action: ActionRef = Rc::new(RefCell::new(Weightless));
//! world.add_action(&action).unwrap();
//! world.add_action(&action).unwrap();
//! assert_eq!(1, world.num_actions());
//!
//! world.step_simulation(1.0 / 60.0, 1, 1.0 / 60.0).unwrap();
//! assert_eq!([0.0, 0.0, 0.0], world.gravity().unwrap());
//! ```
pub use action::{Action, ActionAdapter, ActionId, ActionRef, ActionRegistry};
pub use body::{CollisionFilterGroups, RigidBody};
pub use callback::{Phase, Tick, TickCallback, TickCallbackBridge, UserInfo};
pub use constraint::{Constraint, ConstraintRegistry, ConstraintType};
pub use engine::SoftwareEngine;
pub use error::Error;
pub use handle::HandleRegistry;
pub use solver::{ConstraintSolver, ContactSolverInfo, SolverInfo, SolverType};
pub use world::{
    Commands, DynamicsWorld, WorldBuilder, WorldConfig, WorldId, WorldType, DEFAULT_FIXED_TIME_STEP,
};

pub mod action;
pub mod body;
pub mod callback;
pub mod constraint;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod handle;
pub mod math;
pub mod solver;
pub mod world;

pub mod prelude {
    pub use super::action::{Action, ActionRef};
    pub use super::body::{CollisionFilterGroups, RigidBody};
    pub use super::callback::{Phase, Tick, TickCallback};
    pub use super::constraint::{Constraint, ConstraintType};
    pub use super::world::{Commands, DynamicsWorld, WorldType};
}

pub type Result<T> = std::result::Result<T, Error>;
