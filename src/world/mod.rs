//! The dynamics world aggregate.
//!
//! A [`DynamicsWorld`] owns one engine world and keeps the bookkeeping on this side of the
//! boundary (bodies, constraints, actions, tick callbacks and solver wrappers) consistent with
//! the engine's own state for as long as it lives.
use std::fmt;
use std::os::raw::c_void;
use std::ptr::{self, NonNull};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::action::{ActionRef, ActionRegistry};
use crate::body::{BodyCollection, CollisionFilterGroups, RigidBody};
use crate::callback::{Install, Phase, TickCallback, TickCallbackBridge, UserInfo};
use crate::constraint::{Constraint, ConstraintRegistry, ConstraintType};
use crate::engine::SoftwareEngine;
use crate::error::Error;
use crate::ffi::{Engine, RawConstraint, RawSolver};
use crate::handle::HandleRegistry;
use crate::math::Vec3;
use crate::solver::{ConstraintSolver, SolverInfo, SolverType};
use crate::Result;

pub use builder::{WorldBuilder, WorldConfig};
pub(crate) use command::Command;
pub use command::Commands;

mod builder;
mod command;

pub(crate) type Tx<T> = mpsc::Sender<T>;
pub(crate) type Rx<T> = mpsc::Receiver<T>;

pub(crate) fn channel<T>() -> (Tx<T>, Rx<T>) {
    mpsc::channel()
}

/// Fixed sub-step size used by [`DynamicsWorld::update`].
pub const DEFAULT_FIXED_TIME_STEP: f32 = 1.0 / 60.0;

/// Simulation variants an engine world can be created as.
#[repr(i32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WorldType {
    /// No sub-stepping: every step is a single step of the given time.
    Simple = 1,
    Discrete = 2,
    Continuous = 3,
    SoftRigid = 4,
    Gpu = 5,
}

impl Default for WorldType {
    fn default() -> Self {
        WorldType::Discrete
    }
}

/// Identifies the world a wrapper was created by.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct WorldId(u64);

impl WorldId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        WorldId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A world is the heart of the simulation.
///
/// ```
/// use dynamics_world::{DynamicsWorld, Phase, TickCallback, WorldType};
///
/// let mut world = DynamicsWorld::new(WorldType::Discrete);
///
/// let ground = world.create_rigid_body(0.0).unwrap();
/// let ball = world.create_rigid_body(1.0).unwrap();
/// world.add_rigid_body(&ground).unwrap();
/// world.add_rigid_body(&ball).unwrap();
///
/// world
///     .set_internal_tick_callback(Some(TickCallback::new(|_, _| {})), None, Phase::Post)
///     .unwrap();
///
/// assert_eq!(1, world.step_simulation(1.0 / 60.0, 1, 1.0 / 60.0).unwrap());
/// assert!(world.body_position(&ball).unwrap()[1] < 0.0);
/// ```
pub struct DynamicsWorld<E: Engine = SoftwareEngine> {
    engine: E,
    id: WorldId,
    /// Debug name
    debug: Option<&'static str>,

    bodies: BodyCollection,
    constraints: ConstraintRegistry,
    constraint_handles: HandleRegistry<RawConstraint, Constraint>,
    actions: ActionRegistry,

    /// Heap pinned tick callback channels, handed to the engine as hook user info.
    /// `None` once the world is disposed.
    bridge: Option<NonNull<TickCallbackBridge>>,

    /// Wrapper of the active solver. Holding it keeps an owned solver alive while in use.
    solver: Option<Rc<ConstraintSolver>>,
    solver_handles: HandleRegistry<RawSolver, ConstraintSolver>,
    solver_info: Option<Rc<SolverInfo>>,

    /// Tx end of the command channel, cloned into every wrapper.
    tx: Tx<Command>,
    /// Rx end of the command channel, flushed outside of simulation steps.
    rx: Rx<Command>,

    disposed: bool,
}

impl DynamicsWorld<SoftwareEngine> {
    /// Creates a world on top of the built-in [`SoftwareEngine`].
    pub fn new(world_type: WorldType) -> Self {
        Self::from_engine(SoftwareEngine::new(world_type))
    }

    pub fn builder() -> WorldBuilder {
        WorldBuilder::new()
    }
}

impl<E: Engine> DynamicsWorld<E> {
    /// Takes ownership of an engine world. The engine is destroyed when the world is disposed.
    pub fn from_engine(engine: E) -> Self {
        Self::with_debug(engine, None)
    }

    pub(crate) fn with_debug(engine: E, debug: Option<&'static str>) -> Self {
        let (tx, rx) = channel();
        let bridge = Box::new(TickCallbackBridge::new(Commands::new(tx.clone())));
        let id = WorldId::next();

        log::debug!("created world {:?} ({:?})", id, debug);

        DynamicsWorld {
            engine,
            id,
            debug,
            bodies: BodyCollection::default(),
            constraints: ConstraintRegistry::new(),
            constraint_handles: HandleRegistry::new(),
            actions: ActionRegistry::new(),
            bridge: Some(NonNull::from(Box::leak(bridge))),
            solver: None,
            solver_handles: HandleRegistry::new(),
            solver_info: None,
            tx,
            rx,
            disposed: false,
        }
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    pub fn debug_name(&self) -> Option<&'static str> {
        self.debug
    }

    /// Read access to the engine world.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn world_type(&self) -> Result<WorldType> {
        self.check()?;
        Ok(self.engine.world_type())
    }

    pub fn threads(&self) -> Result<usize> {
        self.check()?;
        Ok(self.engine.threads())
    }

    // bodies

    /// Creates a rigid body. A mass of zero makes it static.
    ///
    /// The body is not simulated until it is added with [`add_rigid_body`](Self::add_rigid_body).
    pub fn create_rigid_body(&mut self, mass: f32) -> Result<Rc<RigidBody>> {
        self.check()?;
        if !(mass >= 0.0) {
            return Err(Error::InvalidArgument {
                name: "mass",
                reason: "must be zero or positive",
            });
        }
        self.flush_commands();

        let raw = self.engine.create_body(mass);
        let body = Rc::new(RigidBody::new(raw, self.id, mass, self.tx.clone()));
        Ok(body)
    }

    /// Adds `body` with the default collision filter: dynamic bodies collide with everything,
    /// static bodies with everything but other static bodies.
    pub fn add_rigid_body(&mut self, body: &Rc<RigidBody>) -> Result<()> {
        let (group, mask) = if body.is_static() {
            (
                CollisionFilterGroups::STATIC,
                CollisionFilterGroups::ALL & !CollisionFilterGroups::STATIC,
            )
        } else {
            (CollisionFilterGroups::DEFAULT, CollisionFilterGroups::ALL)
        };
        self.add_rigid_body_with_filter(body, group, mask)
    }

    pub fn add_rigid_body_with_filter(
        &mut self,
        body: &Rc<RigidBody>,
        group: CollisionFilterGroups,
        mask: CollisionFilterGroups,
    ) -> Result<()> {
        self.check()?;
        self.check_world(body.world_id())?;

        if self.bodies.add(body, group, mask) {
            self.engine.add_rigid_body(body.as_raw(), group.bits(), mask.bits());
            log::debug!("added body {:?} (group {}, mask {})", body.as_raw(), group.bits(), mask.bits());
        } else {
            log::debug!("body {:?} already in the world", body.as_raw());
        }
        Ok(())
    }

    /// Takes `body` out of the simulation. The body itself is released once it is dropped.
    pub fn remove_rigid_body(&mut self, body: &Rc<RigidBody>) -> Result<()> {
        self.check()?;
        self.check_world(body.world_id())?;

        if self.bodies.remove(body) {
            self.engine.remove_rigid_body(body.as_raw());
            log::debug!("removed body {:?}", body.as_raw());
        } else {
            log::debug!("body {:?} is not in the world", body.as_raw());
        }
        Ok(())
    }

    /// Bodies currently added to the world.
    pub fn bodies(&self) -> impl Iterator<Item = &Rc<RigidBody>> {
        self.bodies.iter()
    }

    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    pub fn contains_body(&self, body: &Rc<RigidBody>) -> bool {
        self.bodies.contains(body)
    }

    /// Collision group and mask `body` was added with.
    pub fn body_filter(&self, body: &Rc<RigidBody>) -> Option<(CollisionFilterGroups, CollisionFilterGroups)> {
        self.bodies.filter(body)
    }

    pub fn body_position(&self, body: &RigidBody) -> Result<Vec3> {
        self.check_body(body)?;
        Ok(self.engine.body_position(body.as_raw()))
    }

    pub fn set_body_position(&mut self, body: &RigidBody, position: Vec3) -> Result<()> {
        self.check_body(body)?;
        self.engine.set_body_position(body.as_raw(), position);
        Ok(())
    }

    pub fn body_linear_velocity(&self, body: &RigidBody) -> Result<Vec3> {
        self.check_body(body)?;
        Ok(self.engine.body_linear_velocity(body.as_raw()))
    }

    pub fn set_body_linear_velocity(&mut self, body: &RigidBody, velocity: Vec3) -> Result<()> {
        self.check_body(body)?;
        self.engine.set_body_linear_velocity(body.as_raw(), velocity);
        Ok(())
    }

    /// Accumulates a force for the next call to `step_simulation`.
    pub fn apply_central_force(&mut self, body: &RigidBody, force: Vec3) -> Result<()> {
        self.check_body(body)?;
        self.engine.apply_central_force(body.as_raw(), force);
        Ok(())
    }

    // constraints

    /// Creates a constraint linking `body_a` and `body_b`.
    pub fn create_constraint(
        &mut self,
        constraint_type: ConstraintType,
        body_a: &Rc<RigidBody>,
        body_b: &Rc<RigidBody>,
    ) -> Result<Rc<Constraint>> {
        self.check()?;
        self.check_world(body_a.world_id())?;
        self.check_world(body_b.world_id())?;
        if Rc::ptr_eq(body_a, body_b) {
            return Err(Error::InvalidArgument {
                name: "body_b",
                reason: "a constraint links two different bodies",
            });
        }
        self.flush_commands();

        let raw = self
            .engine
            .create_constraint(&constraint_type, body_a.as_raw(), body_b.as_raw());
        let constraint = Rc::new(Constraint::new(
            raw,
            self.id,
            constraint_type,
            Rc::clone(body_a),
            Rc::clone(body_b),
            self.tx.clone(),
        ));
        self.constraint_handles.insert(raw, &constraint);
        Ok(constraint)
    }

    /// Adds `constraint` to the world. Adding a constraint twice is a no-op.
    ///
    /// With `disable_collisions_between_linked_bodies`, the linked bodies stop colliding with
    /// each other and both list the constraint in their
    /// [`constraint_refs`](RigidBody::constraint_refs).
    pub fn add_constraint(
        &mut self,
        constraint: &Rc<Constraint>,
        disable_collisions_between_linked_bodies: bool,
    ) -> Result<()> {
        self.check()?;
        self.check_world(constraint.world_id())?;

        if self
            .constraints
            .add(constraint, disable_collisions_between_linked_bodies)
        {
            self.engine
                .add_constraint(constraint.as_raw(), disable_collisions_between_linked_bodies);
            log::debug!(
                "added {} constraint {:?}",
                constraint.constraint_type().name(),
                constraint.as_raw()
            );
        } else {
            log::debug!("constraint {:?} already in the world", constraint.as_raw());
        }
        self.debug_assert_constraint_order();
        Ok(())
    }

    /// Removes `constraint` from the world. Removing a constraint that was never added is a
    /// no-op.
    ///
    /// The last constraint takes the freed index, so indices given by
    /// [`constraint`](Self::constraint) are only valid until the next removal.
    pub fn remove_constraint(&mut self, constraint: &Rc<Constraint>) -> Result<()> {
        self.check()?;
        self.check_world(constraint.world_id())?;

        match self.constraints.remove(constraint) {
            Some(index) => {
                self.engine.remove_constraint(constraint.as_raw());
                log::debug!("removed constraint {:?} from index {}", constraint.as_raw(), index);
            }
            None => log::debug!("constraint {:?} is not in the world", constraint.as_raw()),
        }
        self.debug_assert_constraint_order();
        Ok(())
    }

    /// Returns the constraint at `index` in the engine's constraint array.
    pub fn constraint(&self, index: usize) -> Result<Rc<Constraint>> {
        self.check()?;
        let count = self.engine.num_constraints();

        self.engine
            .constraint(index)
            .and_then(|raw| self.constraint_handles.get(raw))
            .or_else(|| self.constraints.get(index).cloned())
            .ok_or(Error::IndexOutOfRange { index, count })
    }

    /// Number of constraints in the engine world.
    pub fn num_constraints(&self) -> Result<usize> {
        self.check()?;
        Ok(self.engine.num_constraints())
    }

    /// Constraints added to the world, in the same order as the engine keeps them.
    pub fn constraints(&self) -> &ConstraintRegistry {
        &self.constraints
    }

    fn debug_assert_constraint_order(&self) {
        debug_assert!(
            self.constraints
                .iter()
                .enumerate()
                .all(|(i, c)| self.engine.constraint(i) == Some(c.as_raw())),
            "constraint ordering diverged from the engine"
        );
    }

    // actions

    /// Registers `action` to be updated once per sub-step. Registering it twice is a no-op.
    pub fn add_action(&mut self, action: &ActionRef) -> Result<()> {
        self.check()?;
        let commands = Commands::new(self.tx.clone());

        if self.actions.add(&mut self.engine, action, &commands) {
            log::debug!("added action ({} registered)", self.actions.len());
        } else {
            log::debug!("action already registered");
        }
        Ok(())
    }

    /// Unregisters `action` and releases its adapter. Unknown actions are ignored.
    pub fn remove_action(&mut self, action: &ActionRef) -> Result<()> {
        self.check()?;

        if self.actions.remove(&mut self.engine, action) {
            log::debug!("removed action ({} registered)", self.actions.len());
        } else {
            log::debug!("action is not registered");
        }
        Ok(())
    }

    pub fn num_actions(&self) -> usize {
        self.actions.len()
    }

    pub fn contains_action(&self, action: &ActionRef) -> bool {
        self.actions.contains(action)
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    // tick callbacks

    /// Sets the callback invoked on every sub-step for `phase`, or uninstalls it with `None`.
    ///
    /// Setting the callback that is already installed (or a clone of it) leaves the engine hook
    /// untouched. `user_info` always replaces the user info of `phase`, and is cleared along
    /// with the callback when `callback` is `None`.
    ///
    /// ```
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    /// use dynamics_world::{DynamicsWorld, Phase, TickCallback, WorldType};
    ///
    /// let mut world = DynamicsWorld::new(WorldType::Discrete);
    /// let ticks = Rc::new(Cell::new(0));
    /// let counter = Rc::clone(&ticks);
    ///
    /// let callback = TickCallback::new(move |tick, _| {
    ///     counter.set(counter.get() + tick.user_info_as::<u32>().unwrap());
    /// });
    /// world
    ///     .set_internal_tick_callback(Some(callback), Some(Rc::new(2u32)), Phase::Pre)
    ///     .unwrap();
    ///
    /// let sub_steps = world.step_simulation(0.1, 10, 0.025).unwrap();
    /// assert_eq!(2 * sub_steps, ticks.get());
    /// ```
    pub fn set_internal_tick_callback(
        &mut self,
        callback: Option<TickCallback>,
        user_info: Option<UserInfo>,
        phase: Phase,
    ) -> Result<()> {
        self.check()?;
        let install = {
            let bridge = self.bridge_mut()?;
            bridge.set_user_info(phase, callback.as_ref().and(user_info));
            bridge.set(phase, callback)
        };
        let bridge_ptr = self.bridge.map_or(ptr::null_mut(), |b| b.as_ptr() as *mut c_void);

        match install {
            Install::Keep => log::debug!("{:?} tick callback unchanged", phase),
            Install::Install(hook) => {
                // the bridge stays at this address until the world is disposed
                unsafe {
                    self.engine
                        .set_internal_tick_callback(Some(hook), bridge_ptr, phase.is_pre_tick())
                };
                log::debug!("installed {:?} tick callback", phase);
            }
            Install::Uninstall => {
                unsafe {
                    self.engine
                        .set_internal_tick_callback(None, ptr::null_mut(), phase.is_pre_tick())
                };
                log::debug!("uninstalled {:?} tick callback", phase);
            }
        }
        Ok(())
    }

    pub fn tick_callback(&self, phase: Phase) -> Option<TickCallback> {
        self.bridge().and_then(|b| b.callback(phase).cloned())
    }

    /// User info given along with the tick callback of `phase`.
    pub fn world_user_info(&self, phase: Phase) -> Option<UserInfo> {
        self.bridge().and_then(|b| b.user_info(phase).cloned())
    }

    fn bridge(&self) -> Option<&TickCallbackBridge> {
        self.bridge.map(|b| unsafe { &*b.as_ptr() })
    }

    fn bridge_mut(&mut self) -> Result<&mut TickCallbackBridge> {
        match self.bridge {
            Some(b) => Ok(unsafe { &mut *b.as_ptr() }),
            None => Err(Error::Disposed),
        }
    }

    // simulation

    /// Advances the simulation by `time_step` seconds, in sub-steps of `fixed_time_step` (at
    /// most `max_sub_steps` of them). With `max_sub_steps == 0` a single variable step of
    /// `time_step` is taken.
    ///
    /// Tick callbacks and actions run once per sub-step. Releases and deferred commands are
    /// flushed before and after the engine step. Returns the number of sub-steps taken.
    pub fn step_simulation(&mut self, time_step: f32, max_sub_steps: u32, fixed_time_step: f32) -> Result<u32> {
        self.check()?;
        if !time_step.is_finite() || time_step < 0.0 {
            return Err(Error::InvalidArgument {
                name: "time_step",
                reason: "must be finite and zero or positive",
            });
        }
        // simple worlds take a single step of `time_step`
        let fixed = max_sub_steps > 0 && self.engine.world_type() != WorldType::Simple;
        if fixed && (!fixed_time_step.is_finite() || fixed_time_step <= 0.0) {
            return Err(Error::InvalidArgument {
                name: "fixed_time_step",
                reason: "must be finite and positive",
            });
        }
        self.flush_commands();

        let sub_steps = self
            .engine
            .step_simulation(time_step, max_sub_steps, fixed_time_step);
        log::trace!("stepped {}s in {} sub-steps", time_step, sub_steps);

        self.flush_commands();
        Ok(sub_steps)
    }

    /// Steps the simulation by `step`, in fixed sub-steps of [`DEFAULT_FIXED_TIME_STEP`].
    pub fn update(&mut self, step: Duration) -> Result<u32> {
        self.step_simulation(as_seconds(step), 1, DEFAULT_FIXED_TIME_STEP)
    }

    pub fn gravity(&self) -> Result<Vec3> {
        self.check()?;
        Ok(self.engine.gravity())
    }

    pub fn set_gravity(&mut self, gravity: Vec3) -> Result<()> {
        self.check()?;
        self.engine.set_gravity(gravity);
        Ok(())
    }

    pub fn clear_forces(&mut self) -> Result<()> {
        self.check()?;
        self.engine.clear_forces();
        Ok(())
    }

    pub fn synchronize_motion_states(&mut self) -> Result<()> {
        self.check()?;
        self.engine.synchronize_motion_states();
        Ok(())
    }

    // solver

    /// Returns the active constraint solver. The engine's solver is wrapped once and the same
    /// wrapper is returned from then on.
    pub fn constraint_solver(&mut self) -> Result<Rc<ConstraintSolver>> {
        self.check()?;
        if let Some(solver) = &self.solver {
            return Ok(Rc::clone(solver));
        }

        let raw = self.engine.constraint_solver();
        let solver_type = self.engine.solver_type(raw);
        let (id, tx) = (self.id, self.tx.clone());
        let solver = self
            .solver_handles
            .get_or_wrap(raw, || ConstraintSolver::new(raw, id, solver_type, false, tx));
        self.solver = Some(Rc::clone(&solver));
        Ok(solver)
    }

    pub fn set_constraint_solver(&mut self, solver: &Rc<ConstraintSolver>) -> Result<()> {
        self.check()?;
        self.check_world(solver.world_id())?;

        self.engine.set_constraint_solver(solver.as_raw());
        self.solver = Some(Rc::clone(solver));
        log::debug!("constraint solver set to {:?}", solver.solver_type());
        Ok(())
    }

    /// Creates a solver owned by the returned wrapper. It is not used until passed to
    /// [`set_constraint_solver`](Self::set_constraint_solver).
    pub fn create_constraint_solver(&mut self, solver_type: SolverType) -> Result<Rc<ConstraintSolver>> {
        self.check()?;
        self.flush_commands();

        let raw = self.engine.create_constraint_solver(solver_type);
        let solver = Rc::new(ConstraintSolver::new(
            raw,
            self.id,
            solver_type,
            true,
            self.tx.clone(),
        ));
        self.solver_handles.insert(raw, &solver);
        Ok(solver)
    }

    /// Solver parameters of the engine world, wrapped once.
    pub fn solver_info(&mut self) -> Result<Rc<SolverInfo>> {
        self.check()?;
        let raw = self.engine.solver_info();

        if let Some(info) = self.solver_info.as_ref().filter(|i| i.shares(&raw)) {
            return Ok(Rc::clone(info));
        }
        let info = Rc::new(SolverInfo::new(raw));
        self.solver_info = Some(Rc::clone(&info));
        Ok(info)
    }

    // lifecycle

    /// Releases every action adapter, then the engine world.
    ///
    /// Disposing twice is a no-op. Any other call on a disposed world fails with
    /// [`Error::Disposed`]. Wrappers still held by the application stay valid as values but
    /// can no longer be used with this world.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        log::debug!("disposing world {:?} ({:?})", self.id, self.debug);

        self.flush_releases();

        // adapters go first so no action can be called into once the engine starts tearing down
        self.actions.release_all(&mut self.engine);

        if let Some(bridge) = self.bridge.take() {
            for &phase in &[Phase::Pre, Phase::Post] {
                if unsafe { bridge.as_ref() }.is_installed(phase) {
                    unsafe {
                        self.engine
                            .set_internal_tick_callback(None, ptr::null_mut(), phase.is_pre_tick())
                    };
                }
            }
            unsafe { drop(Box::from_raw(bridge.as_ptr())) };
        }

        for constraint in self.constraints.iter() {
            self.engine.remove_constraint(constraint.as_raw());
        }
        self.constraints.clear();
        for body in self.bodies.iter() {
            self.engine.remove_rigid_body(body.as_raw());
        }
        self.bodies.clear();
        self.solver_info = None;

        // whatever only the world was holding on to. The active solver stays alive until the
        // engine world is gone.
        self.flush_releases();
        let active_solver = self.solver.take();

        self.engine.destroy();
        drop(active_solver);

        // releases queued past this point refer to objects the engine already freed
        let discarded = self.rx.try_iter().count();
        if discarded > 0 {
            log::debug!("discarded {} commands queued during disposal", discarded);
        }
        self.constraint_handles.clear();
        self.solver_handles.clear();
        self.disposed = true;
    }

    fn check(&self) -> Result<()> {
        if self.disposed {
            Err(Error::Disposed)
        } else {
            Ok(())
        }
    }

    fn check_world(&self, id: WorldId) -> Result<()> {
        if id == self.id {
            Ok(())
        } else {
            Err(Error::ForeignHandle)
        }
    }

    fn check_body(&self, body: &RigidBody) -> Result<()> {
        self.check()?;
        self.check_world(body.world_id())
    }

    // commands

    fn flush_commands(&mut self) {
        while let Ok(command) = self.rx.try_recv() {
            self.dispatch_command(command);
        }
    }

    /// Applies pending releases and drops any deferred mutation.
    fn flush_releases(&mut self) {
        while let Ok(command) = self.rx.try_recv() {
            if command.is_release() {
                self.dispatch_command(command);
            } else {
                log::debug!("dropping deferred {} at disposal", command.name());
            }
        }
    }

    fn dispatch_command(&mut self, command: Command) {
        let name = command.name();
        log::trace!("flushing {}", name);

        let result = match command {
            Command::DestroyBody(raw) => {
                self.engine.destroy_body(raw);
                Ok(())
            }
            Command::DestroyConstraint(raw) => {
                self.constraint_handles.remove(raw);
                self.engine.destroy_constraint(raw);
                Ok(())
            }
            Command::DestroySolver(raw) => {
                self.solver_handles.remove(raw);
                self.engine.destroy_constraint_solver(raw);
                Ok(())
            }
            Command::AddConstraint(constraint, disable) => self.add_constraint(&constraint, disable),
            Command::RemoveConstraint(constraint) => self.remove_constraint(&constraint),
            Command::AddAction(action) => self.add_action(&action),
            Command::RemoveAction(action) => self.remove_action(&action),
            Command::SetGravity(gravity) => self.set_gravity(gravity),
            Command::ClearTickCallback(phase) => self.set_internal_tick_callback(None, None, phase),
        };

        if let Err(err) = result {
            log::warn!("deferred {} failed: {}", name, err);
        }
    }
}

impl<E: Engine> Drop for DynamicsWorld<E> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<E: Engine> fmt::Debug for DynamicsWorld<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DynamicsWorld")
            .field("id", &self.id)
            .field("debug", &self.debug)
            .field("bodies", &self.bodies.len())
            .field("constraints", &self.constraints.len())
            .field("actions", &self.actions.len())
            .field("disposed", &self.disposed)
            .finish()
    }
}

fn as_seconds(step: Duration) -> f32 {
    let nanos = step.as_secs() as f32 * 1_000_000_000.0 + step.subsec_nanos() as f32;
    nanos / 1_000_000_000.0
}
