#![allow(dead_code)]

use std::cell::RefCell;
use std::os::raw::c_void;
use std::rc::Rc;

use dynamics_world::ffi::{
    ActionCallback, Engine, InternalTickCallback, RawAction, RawBody, RawConstraint, RawSolver,
};
use dynamics_world::math::{Vec3, IDENTITY};
use dynamics_world::solver::RawSolverInfo;
use dynamics_world::{Action, ActionRef, Commands, ConstraintType, SoftwareEngine, SolverType, WorldType};

pub type CallLog = Rc<RefCell<Vec<String>>>;

/// Engine double that forwards to a [`SoftwareEngine`] and logs every call that changes
/// engine state.
pub struct RecordingEngine {
    inner: SoftwareEngine,
    log: CallLog,
}

impl RecordingEngine {
    pub fn new(world_type: WorldType) -> (Self, CallLog) {
        let log = CallLog::default();
        let engine = RecordingEngine {
            inner: SoftwareEngine::new(world_type),
            log: Rc::clone(&log),
        };
        (engine, log)
    }

    pub fn inner(&self) -> &SoftwareEngine {
        &self.inner
    }

    fn record<S: Into<String>>(&self, call: S) {
        self.log.borrow_mut().push(call.into());
    }
}

/// Number of logged calls starting with `prefix`.
pub fn count(log: &CallLog, prefix: &str) -> usize {
    log.borrow().iter().filter(|c| c.starts_with(prefix)).count()
}

/// Number of logged calls equal to `call`.
pub fn count_exact(log: &CallLog, call: &str) -> usize {
    log.borrow().iter().filter(|c| *c == call).count()
}

fn phase_name(is_pre_tick: bool) -> &'static str {
    if is_pre_tick {
        "pre"
    } else {
        "post"
    }
}

impl Engine for RecordingEngine {
    fn world_type(&self) -> WorldType {
        self.inner.world_type()
    }

    fn threads(&self) -> usize {
        self.inner.threads()
    }

    fn set_threads(&mut self, threads: usize) {
        self.record(format!("set_threads({})", threads));
        self.inner.set_threads(threads)
    }

    fn gravity(&self) -> Vec3 {
        self.inner.gravity()
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.record("set_gravity");
        self.inner.set_gravity(gravity)
    }

    fn create_body(&mut self, mass: f32) -> RawBody {
        self.record("create_body");
        self.inner.create_body(mass)
    }

    fn destroy_body(&mut self, body: RawBody) {
        self.record("destroy_body");
        self.inner.destroy_body(body)
    }

    fn add_rigid_body(&mut self, body: RawBody, group: i32, mask: i32) {
        self.record(format!("add_rigid_body({}, {})", group, mask));
        self.inner.add_rigid_body(body, group, mask)
    }

    fn remove_rigid_body(&mut self, body: RawBody) {
        self.record("remove_rigid_body");
        self.inner.remove_rigid_body(body)
    }

    fn body_position(&self, body: RawBody) -> Vec3 {
        self.inner.body_position(body)
    }

    fn set_body_position(&mut self, body: RawBody, position: Vec3) {
        self.inner.set_body_position(body, position)
    }

    fn body_linear_velocity(&self, body: RawBody) -> Vec3 {
        self.inner.body_linear_velocity(body)
    }

    fn set_body_linear_velocity(&mut self, body: RawBody, velocity: Vec3) {
        self.inner.set_body_linear_velocity(body, velocity)
    }

    fn apply_central_force(&mut self, body: RawBody, force: Vec3) {
        self.inner.apply_central_force(body, force)
    }

    fn create_constraint(
        &mut self,
        constraint_type: &ConstraintType,
        body_a: RawBody,
        body_b: RawBody,
    ) -> RawConstraint {
        self.record(format!("create_constraint({})", constraint_type.name()));
        self.inner.create_constraint(constraint_type, body_a, body_b)
    }

    fn destroy_constraint(&mut self, constraint: RawConstraint) {
        self.record("destroy_constraint");
        self.inner.destroy_constraint(constraint)
    }

    fn add_constraint(&mut self, constraint: RawConstraint, disable_collisions_between_linked_bodies: bool) {
        self.record(format!("add_constraint({})", disable_collisions_between_linked_bodies));
        self.inner
            .add_constraint(constraint, disable_collisions_between_linked_bodies)
    }

    fn remove_constraint(&mut self, constraint: RawConstraint) {
        self.record("remove_constraint");
        self.inner.remove_constraint(constraint)
    }

    fn num_constraints(&self) -> usize {
        self.inner.num_constraints()
    }

    fn constraint(&self, index: usize) -> Option<RawConstraint> {
        self.inner.constraint(index)
    }

    unsafe fn create_action(&mut self, callback: ActionCallback, user_data: *mut c_void) -> RawAction {
        self.record("create_action");
        self.inner.create_action(callback, user_data)
    }

    fn destroy_action(&mut self, action: RawAction) {
        self.record("destroy_action");
        self.inner.destroy_action(action)
    }

    fn add_action(&mut self, action: RawAction) {
        self.record("add_action");
        self.inner.add_action(action)
    }

    fn remove_action(&mut self, action: RawAction) {
        self.record("remove_action");
        self.inner.remove_action(action)
    }

    unsafe fn set_internal_tick_callback(
        &mut self,
        callback: Option<InternalTickCallback>,
        user_info: *mut c_void,
        is_pre_tick: bool,
    ) {
        let change = if callback.is_some() { "install" } else { "uninstall" };
        self.record(format!(
            "set_internal_tick_callback({}, {})",
            phase_name(is_pre_tick),
            change
        ));
        self.inner
            .set_internal_tick_callback(callback, user_info, is_pre_tick)
    }

    fn constraint_solver(&self) -> RawSolver {
        self.inner.constraint_solver()
    }

    fn create_constraint_solver(&mut self, solver_type: SolverType) -> RawSolver {
        self.record("create_constraint_solver");
        self.inner.create_constraint_solver(solver_type)
    }

    fn destroy_constraint_solver(&mut self, solver: RawSolver) {
        self.record("destroy_constraint_solver");
        self.inner.destroy_constraint_solver(solver)
    }

    fn set_constraint_solver(&mut self, solver: RawSolver) {
        self.record("set_constraint_solver");
        self.inner.set_constraint_solver(solver)
    }

    fn solver_type(&self, solver: RawSolver) -> SolverType {
        self.inner.solver_type(solver)
    }

    fn solver_info(&self) -> RawSolverInfo {
        self.inner.solver_info()
    }

    fn step_simulation(&mut self, time_step: f32, max_sub_steps: u32, fixed_time_step: f32) -> u32 {
        self.record("step_simulation");
        self.inner
            .step_simulation(time_step, max_sub_steps, fixed_time_step)
    }

    fn clear_forces(&mut self) {
        self.record("clear_forces");
        self.inner.clear_forces()
    }

    fn synchronize_motion_states(&mut self) {
        self.record("synchronize_motion_states");
        self.inner.synchronize_motion_states()
    }

    fn destroy(&mut self) {
        self.record("destroy");
        self.inner.destroy()
    }
}

/// Action that appends `name` to a shared trace on every update.
pub struct Tracer {
    pub name: &'static str,
    pub trace: Rc<RefCell<Vec<&'static str>>>,
}

impl Action for Tracer {
    fn update_action(&mut self, _: &Commands, _: f32) {
        self.trace.borrow_mut().push(self.name);
    }
}

pub fn tracer(name: &'static str, trace: &Rc<RefCell<Vec<&'static str>>>) -> ActionRef {
    Rc::new(RefCell::new(Tracer {
        name,
        trace: Rc::clone(trace),
    }))
}

pub fn fixed() -> ConstraintType {
    ConstraintType::Fixed {
        frame_in_a: IDENTITY,
        frame_in_b: IDENTITY,
    }
}
