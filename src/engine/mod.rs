//! Pure Rust implementation of the engine boundary.
//!
//! [`SoftwareEngine`] does the bookkeeping side of a dynamics world: object storage, the
//! constraint and action arrays, tick hooks and fixed step time accumulation. Bodies are
//! integrated under gravity and applied forces. There is no collision detection and no
//! constraint solving; constraints are stored and reported but don't affect motion.
use std::cell::Cell;
use std::os::raw::c_void;
use std::rc::Rc;

use slab::Slab;

use crate::constraint::ConstraintType;
use crate::ffi::{
    ActionCallback, Engine, InternalTickCallback, RawAction, RawBody, RawConstraint, RawSolver,
};
use crate::math::{self, Vec3};
use crate::solver::{ContactSolverInfo, RawSolverInfo, SolverType};
use crate::world::WorldType;

mod step;

#[derive(Debug)]
struct BodyData {
    inv_mass: f32,
    position: Vec3,
    linear_velocity: Vec3,
    total_force: Vec3,
    /// `(group, mask)` while the body is part of the simulation.
    filter: Option<(i32, i32)>,
}

#[derive(Debug)]
struct ConstraintData {
    constraint_type: ConstraintType,
    body_a: RawBody,
    body_b: RawBody,
    disable_collisions: bool,
}

#[derive(Debug, Copy, Clone)]
struct ActionData {
    callback: ActionCallback,
    user_data: *mut c_void,
}

#[derive(Debug, Copy, Clone)]
struct Hook {
    callback: InternalTickCallback,
    user_info: *mut c_void,
}

/// Reference engine. See the module docs for what it does and doesn't simulate.
#[derive(Debug)]
pub struct SoftwareEngine {
    world_type: WorldType,
    gravity: Vec3,
    threads: usize,

    bodies: Slab<BodyData>,
    constraints: Slab<ConstraintData>,
    /// Constraints added to the world, in solver order.
    constraint_array: Vec<RawConstraint>,
    actions: Slab<ActionData>,
    /// Actions added to the world, in update order.
    action_array: Vec<RawAction>,

    solvers: Slab<SolverType>,
    solver: RawSolver,
    solver_info: RawSolverInfo,

    pre_tick: Option<Hook>,
    post_tick: Option<Hook>,

    /// Simulated time not yet consumed by a fixed sub-step.
    local_time: f32,
    motion_state_syncs: usize,
    destroyed: bool,
}

impl SoftwareEngine {
    pub fn new(world_type: WorldType) -> Self {
        let mut solvers = Slab::new();
        let solver = RawSolver::from_raw(solvers.insert(SolverType::SequentialImpulse));

        SoftwareEngine {
            world_type,
            gravity: [0.0, -10.0, 0.0],
            threads: 1,
            bodies: Slab::new(),
            constraints: Slab::new(),
            constraint_array: Vec::new(),
            actions: Slab::new(),
            action_array: Vec::new(),
            solvers,
            solver,
            solver_info: Rc::new(Cell::new(ContactSolverInfo::default())),
            pre_tick: None,
            post_tick: None,
            local_time: 0.0,
            motion_state_syncs: 0,
            destroyed: false,
        }
    }

    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    /// Number of bodies taking part in the simulation.
    pub fn num_bodies_in_world(&self) -> usize {
        self.bodies.iter().filter(|(_, b)| b.filter.is_some()).count()
    }

    pub fn num_actions(&self) -> usize {
        self.action_array.len()
    }

    pub fn num_action_adapters(&self) -> usize {
        self.actions.len()
    }

    pub fn num_solvers(&self) -> usize {
        self.solvers.len()
    }

    pub fn body_filter(&self, body: RawBody) -> Option<(i32, i32)> {
        self.bodies.get(body.as_raw()).and_then(|b| b.filter)
    }

    /// Whether the constraint was added with collisions disabled between its bodies.
    pub fn constraint_disables_collisions(&self, constraint: RawConstraint) -> bool {
        self.constraints
            .get(constraint.as_raw())
            .map_or(false, |c| c.disable_collisions)
    }

    pub fn constraint_bodies(&self, constraint: RawConstraint) -> Option<(RawBody, RawBody)> {
        self.constraints
            .get(constraint.as_raw())
            .map(|c| (c.body_a, c.body_b))
    }

    pub fn constraint_type(&self, constraint: RawConstraint) -> Option<&ConstraintType> {
        self.constraints
            .get(constraint.as_raw())
            .map(|c| &c.constraint_type)
    }

    pub fn has_tick_callback(&self, is_pre_tick: bool) -> bool {
        if is_pre_tick {
            self.pre_tick.is_some()
        } else {
            self.post_tick.is_some()
        }
    }

    pub fn motion_state_syncs(&self) -> usize {
        self.motion_state_syncs
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn body(&self, body: RawBody) -> &BodyData {
        &self.bodies[body.as_raw()]
    }

    fn body_mut(&mut self, body: RawBody) -> &mut BodyData {
        &mut self.bodies[body.as_raw()]
    }
}

impl Engine for SoftwareEngine {
    fn world_type(&self) -> WorldType {
        self.world_type
    }

    fn threads(&self) -> usize {
        self.threads
    }

    fn set_threads(&mut self, threads: usize) {
        self.threads = threads.max(1);
    }

    fn gravity(&self) -> Vec3 {
        self.gravity
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    fn create_body(&mut self, mass: f32) -> RawBody {
        let inv_mass = if mass == 0.0 { 0.0 } else { 1.0 / mass };
        let key = self.bodies.insert(BodyData {
            inv_mass,
            position: math::ZERO,
            linear_velocity: math::ZERO,
            total_force: math::ZERO,
            filter: None,
        });
        RawBody::from_raw(key)
    }

    fn destroy_body(&mut self, body: RawBody) {
        debug_assert!(self.bodies.contains(body.as_raw()));
        self.bodies.remove(body.as_raw());
    }

    fn add_rigid_body(&mut self, body: RawBody, group: i32, mask: i32) {
        self.body_mut(body).filter = Some((group, mask));
    }

    fn remove_rigid_body(&mut self, body: RawBody) {
        self.body_mut(body).filter = None;
    }

    fn body_position(&self, body: RawBody) -> Vec3 {
        self.body(body).position
    }

    fn set_body_position(&mut self, body: RawBody, position: Vec3) {
        self.body_mut(body).position = position;
    }

    fn body_linear_velocity(&self, body: RawBody) -> Vec3 {
        self.body(body).linear_velocity
    }

    fn set_body_linear_velocity(&mut self, body: RawBody, velocity: Vec3) {
        self.body_mut(body).linear_velocity = velocity;
    }

    fn apply_central_force(&mut self, body: RawBody, force: Vec3) {
        let body = self.body_mut(body);
        body.total_force = math::add(body.total_force, force);
    }

    fn create_constraint(
        &mut self,
        constraint_type: &ConstraintType,
        body_a: RawBody,
        body_b: RawBody,
    ) -> RawConstraint {
        debug_assert!(self.bodies.contains(body_a.as_raw()));
        debug_assert!(self.bodies.contains(body_b.as_raw()));
        let key = self.constraints.insert(ConstraintData {
            constraint_type: constraint_type.clone(),
            body_a,
            body_b,
            disable_collisions: false,
        });
        RawConstraint::from_raw(key)
    }

    fn destroy_constraint(&mut self, constraint: RawConstraint) {
        debug_assert!(!self.constraint_array.contains(&constraint));
        self.constraints.remove(constraint.as_raw());
    }

    fn add_constraint(&mut self, constraint: RawConstraint, disable_collisions_between_linked_bodies: bool) {
        self.constraints[constraint.as_raw()].disable_collisions =
            disable_collisions_between_linked_bodies;
        self.constraint_array.push(constraint);
    }

    fn remove_constraint(&mut self, constraint: RawConstraint) {
        // swap with last and pop, like the ordered mirror on the world side
        if let Some(index) = self.constraint_array.iter().position(|c| *c == constraint) {
            self.constraint_array.swap_remove(index);
        }
        if let Some(data) = self.constraints.get_mut(constraint.as_raw()) {
            data.disable_collisions = false;
        }
    }

    fn num_constraints(&self) -> usize {
        self.constraint_array.len()
    }

    fn constraint(&self, index: usize) -> Option<RawConstraint> {
        self.constraint_array.get(index).cloned()
    }

    unsafe fn create_action(&mut self, callback: ActionCallback, user_data: *mut c_void) -> RawAction {
        RawAction::from_raw(self.actions.insert(ActionData {
            callback,
            user_data,
        }))
    }

    fn destroy_action(&mut self, action: RawAction) {
        self.action_array.retain(|a| *a != action);
        self.actions.remove(action.as_raw());
    }

    fn add_action(&mut self, action: RawAction) {
        if !self.action_array.contains(&action) {
            self.action_array.push(action);
        }
    }

    fn remove_action(&mut self, action: RawAction) {
        self.action_array.retain(|a| *a != action);
    }

    unsafe fn set_internal_tick_callback(
        &mut self,
        callback: Option<InternalTickCallback>,
        user_info: *mut c_void,
        is_pre_tick: bool,
    ) {
        let hook = callback.map(|callback| Hook {
            callback,
            user_info,
        });
        if is_pre_tick {
            self.pre_tick = hook;
        } else {
            self.post_tick = hook;
        }
    }

    fn constraint_solver(&self) -> RawSolver {
        self.solver
    }

    fn create_constraint_solver(&mut self, solver_type: SolverType) -> RawSolver {
        RawSolver::from_raw(self.solvers.insert(solver_type))
    }

    fn destroy_constraint_solver(&mut self, solver: RawSolver) {
        debug_assert_ne!(self.solver, solver, "destroying the active solver");
        self.solvers.remove(solver.as_raw());
    }

    fn set_constraint_solver(&mut self, solver: RawSolver) {
        self.solver = solver;
    }

    fn solver_type(&self, solver: RawSolver) -> SolverType {
        self.solvers[solver.as_raw()]
    }

    fn solver_info(&self) -> RawSolverInfo {
        Rc::clone(&self.solver_info)
    }

    fn step_simulation(&mut self, time_step: f32, max_sub_steps: u32, fixed_time_step: f32) -> u32 {
        debug_assert!(!self.destroyed);
        self.step(time_step, max_sub_steps, fixed_time_step)
    }

    fn clear_forces(&mut self) {
        for (_, body) in self.bodies.iter_mut() {
            body.total_force = math::ZERO;
        }
    }

    fn synchronize_motion_states(&mut self) {
        self.motion_state_syncs += 1;
    }

    fn destroy(&mut self) {
        debug_assert!(!self.destroyed, "engine world destroyed twice");
        self.pre_tick = None;
        self.post_tick = None;
        self.action_array.clear();
        self.actions.clear();
        self.constraint_array.clear();
        self.constraints.clear();
        self.bodies.clear();
        self.solvers.clear();
        self.destroyed = true;
    }
}
