use std::cell::Cell;
use std::rc::Rc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ffi::RawSolver;
use crate::world::{Command, Tx, WorldId};

/// Engine owned solver parameters, shared with the world layer.
///
/// The engine reads it on every sub-step, so writes through [`SolverInfo`] take effect on the
/// next call to `step_simulation`.
pub type RawSolverInfo = Rc<Cell<ContactSolverInfo>>;

/// Constraint solver implementations an engine can provide.
#[repr(i32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolverType {
    SequentialImpulse = 1,
    Mlcp = 2,
    Nncg = 4,
}

impl Default for SolverType {
    fn default() -> Self {
        SolverType::SequentialImpulse
    }
}

/// Contact & constraint solver parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ContactSolverInfo {
    pub tau: f32,
    pub damping: f32,
    pub friction: f32,
    /// Size of the current sub-step. Overwritten by the engine while stepping.
    pub time_step: f32,
    pub restitution: f32,
    pub num_iterations: u32,
    pub max_error_reduction: f32,
    pub sor: f32,
    /// Error reduction for non-contact constraints
    pub erp: f32,
    /// Error reduction for contact constraints
    pub erp2: f32,
    pub global_cfm: f32,
    pub split_impulse: bool,
    pub split_impulse_penetration_threshold: f32,
    pub linear_slop: f32,
    pub warmstarting_factor: f32,
}

impl Default for ContactSolverInfo {
    fn default() -> Self {
        ContactSolverInfo {
            tau: 0.6,
            damping: 1.0,
            friction: 0.3,
            time_step: 1.0 / 60.0,
            restitution: 0.0,
            num_iterations: 10,
            max_error_reduction: 20.0,
            sor: 1.0,
            erp: 0.2,
            erp2: 0.8,
            global_cfm: 0.0,
            split_impulse: true,
            split_impulse_penetration_threshold: -0.04,
            linear_slop: 0.0,
            warmstarting_factor: 0.85,
        }
    }
}

/// Wrapper around an engine constraint solver.
#[derive(Debug)]
pub struct ConstraintSolver {
    raw: RawSolver,
    world: WorldId,
    solver_type: SolverType,
    // The engine's built-in solver is borrowed. Solvers created through the world are owned and
    // released when the wrapper is dropped.
    owned: bool,
    tx: Tx<Command>,
}

impl ConstraintSolver {
    pub(crate) fn new(
        raw: RawSolver,
        world: WorldId,
        solver_type: SolverType,
        owned: bool,
        tx: Tx<Command>,
    ) -> Self {
        ConstraintSolver {
            raw,
            world,
            solver_type,
            owned,
            tx,
        }
    }

    pub fn as_raw(&self) -> RawSolver {
        self.raw
    }

    pub fn world_id(&self) -> WorldId {
        self.world
    }

    pub fn solver_type(&self) -> SolverType {
        self.solver_type
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }
}

impl Drop for ConstraintSolver {
    fn drop(&mut self) {
        if self.owned {
            let _ = self.tx.send(Command::DestroySolver(self.raw));
        }
    }
}

/// View over the engine's [`ContactSolverInfo`].
#[derive(Debug)]
pub struct SolverInfo {
    raw: RawSolverInfo,
}

impl SolverInfo {
    pub(crate) fn new(raw: RawSolverInfo) -> Self {
        SolverInfo { raw }
    }

    /// Returns a copy of the current parameters.
    pub fn get(&self) -> ContactSolverInfo {
        self.raw.get()
    }

    pub fn set(&self, info: ContactSolverInfo) {
        self.raw.set(info)
    }

    /// Modifies the parameters in place.
    ///
    /// ```
    /// use dynamics_world::{DynamicsWorld, WorldType};
    ///
    /// let mut world = DynamicsWorld::new(WorldType::Discrete);
    /// let info = world.solver_info().unwrap();
    ///
    /// info.update(|i| i.num_iterations = 20);
    ///
    /// assert_eq!(20, info.num_iterations());
    /// ```
    pub fn update<F: FnOnce(&mut ContactSolverInfo)>(&self, f: F) {
        let mut info = self.raw.get();
        f(&mut info);
        self.raw.set(info);
    }

    pub fn num_iterations(&self) -> u32 {
        self.raw.get().num_iterations
    }

    pub fn set_num_iterations(&self, iterations: u32) {
        self.update(|i| i.num_iterations = iterations)
    }

    /// Size of the last sub-step performed by the engine.
    pub fn time_step(&self) -> f32 {
        self.raw.get().time_step
    }

    pub fn erp(&self) -> f32 {
        self.raw.get().erp
    }

    pub fn set_erp(&self, erp: f32) {
        self.update(|i| i.erp = erp)
    }

    pub fn damping(&self) -> f32 {
        self.raw.get().damping
    }

    pub fn set_damping(&self, damping: f32) {
        self.update(|i| i.damping = damping)
    }

    pub(crate) fn shares(&self, raw: &RawSolverInfo) -> bool {
        Rc::ptr_eq(&self.raw, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_info_writes_are_visible_to_the_engine_side() {
        let raw: RawSolverInfo = Rc::new(Cell::new(ContactSolverInfo::default()));
        let info = SolverInfo::new(Rc::clone(&raw));

        info.set_erp(0.5);
        info.set_num_iterations(4);

        assert_eq!(0.5, raw.get().erp);
        assert_eq!(4, raw.get().num_iterations);
        assert!(info.shares(&raw));
    }

    #[test]
    fn owned_solver_queues_release_on_drop() {
        let (tx, rx) = crate::world::channel();
        let world = WorldId::next();

        drop(ConstraintSolver::new(
            RawSolver::from_raw(3),
            world,
            SolverType::Nncg,
            true,
            tx.clone(),
        ));
        drop(ConstraintSolver::new(
            RawSolver::from_raw(0),
            world,
            SolverType::SequentialImpulse,
            false,
            tx,
        ));

        let released: Vec<_> = rx.try_iter().collect();
        assert_eq!(1, released.len());
        match &released[0] {
            Command::DestroySolver(raw) => assert_eq!(3, raw.as_raw()),
            other => panic!("unexpected command {}", other.name()),
        }
    }
}
