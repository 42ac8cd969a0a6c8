//! Engine boundary.
//!
//! Everything the world layer asks of the simulation engine goes through the [`Engine`] function
//! table. Engine objects are only ever seen through opaque handles, and callbacks cross the
//! boundary as plain function pointers plus an untyped user pointer, the same way they would
//! cross a C ABI.
//!
//! Handles are trusted. Passing a destroyed handle, or a handle from another engine instance, is
//! undefined at this layer. [`DynamicsWorld`](crate::DynamicsWorld) catches the misuse it can see
//! before anything reaches the engine.
use std::os::raw::c_void;

use crate::constraint::ConstraintType;
use crate::math::Vec3;
use crate::solver::{RawSolverInfo, SolverType};
use crate::world::WorldType;

macro_rules! raw_handles {
    ($( $(#[$meta:meta])* struct $name:ident; )*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
            pub struct $name(usize);

            impl $name {
                pub const fn from_raw(key: usize) -> Self {
                    $name(key)
                }

                pub const fn as_raw(self) -> usize {
                    self.0
                }
            }
        )*
    }
}

raw_handles! {
    /// Engine-side rigid body.
    struct RawBody;

    /// Engine-side constraint.
    struct RawConstraint;

    /// Engine-side action adapter.
    struct RawAction;

    /// Engine-side constraint solver.
    struct RawSolver;
}

/// Internal tick hook, invoked once per sub-step.
///
/// `user_info` is the pointer given when the hook was installed.
pub type InternalTickCallback = unsafe extern "C" fn(user_info: *mut c_void, time_step: f32);

/// Action update hook, invoked once per sub-step after integration.
pub type ActionCallback = unsafe extern "C" fn(user_data: *mut c_void, time_step: f32);

/// Function table of a dynamics world engine.
///
/// One value implementing this trait is one engine world. The owning
/// [`DynamicsWorld`](crate::DynamicsWorld) calls [`destroy`](Engine::destroy) exactly once, after
/// which no other method is called.
pub trait Engine {
    fn world_type(&self) -> WorldType;

    fn threads(&self) -> usize;
    fn set_threads(&mut self, threads: usize);

    fn gravity(&self) -> Vec3;
    fn set_gravity(&mut self, gravity: Vec3);

    // bodies
    fn create_body(&mut self, mass: f32) -> RawBody;
    fn destroy_body(&mut self, body: RawBody);
    fn add_rigid_body(&mut self, body: RawBody, group: i32, mask: i32);
    fn remove_rigid_body(&mut self, body: RawBody);
    fn body_position(&self, body: RawBody) -> Vec3;
    fn set_body_position(&mut self, body: RawBody, position: Vec3);
    fn body_linear_velocity(&self, body: RawBody) -> Vec3;
    fn set_body_linear_velocity(&mut self, body: RawBody, velocity: Vec3);
    fn apply_central_force(&mut self, body: RawBody, force: Vec3);

    // constraints
    fn create_constraint(
        &mut self,
        constraint_type: &ConstraintType,
        body_a: RawBody,
        body_b: RawBody,
    ) -> RawConstraint;
    fn destroy_constraint(&mut self, constraint: RawConstraint);
    fn add_constraint(&mut self, constraint: RawConstraint, disable_collisions_between_linked_bodies: bool);
    fn remove_constraint(&mut self, constraint: RawConstraint);
    fn num_constraints(&self) -> usize;
    fn constraint(&self, index: usize) -> Option<RawConstraint>;

    // actions

    /// Creates an action adapter that calls `callback(user_data, dt)` on every sub-step while the
    /// action is added to the world.
    ///
    /// # Safety
    ///
    /// `user_data` must stay valid until the action is destroyed.
    unsafe fn create_action(&mut self, callback: ActionCallback, user_data: *mut c_void) -> RawAction;
    fn destroy_action(&mut self, action: RawAction);
    fn add_action(&mut self, action: RawAction);
    fn remove_action(&mut self, action: RawAction);

    /// Installs (or uninstalls, with `None`) the pre or post tick hook.
    ///
    /// # Safety
    ///
    /// `user_info` must stay valid until the hook is replaced or uninstalled.
    unsafe fn set_internal_tick_callback(
        &mut self,
        callback: Option<InternalTickCallback>,
        user_info: *mut c_void,
        is_pre_tick: bool,
    );

    // solver
    fn constraint_solver(&self) -> RawSolver;
    fn create_constraint_solver(&mut self, solver_type: SolverType) -> RawSolver;
    fn destroy_constraint_solver(&mut self, solver: RawSolver);
    fn set_constraint_solver(&mut self, solver: RawSolver);
    fn solver_type(&self, solver: RawSolver) -> SolverType;
    fn solver_info(&self) -> RawSolverInfo;

    // simulation

    /// Advances the simulation and returns the number of sub-steps performed.
    fn step_simulation(&mut self, time_step: f32, max_sub_steps: u32, fixed_time_step: f32) -> u32;
    fn clear_forces(&mut self);
    fn synchronize_motion_states(&mut self);

    /// Releases the engine world and every object it still holds.
    fn destroy(&mut self);
}
