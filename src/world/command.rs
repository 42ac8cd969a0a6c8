use std::rc::Rc;

use crate::action::ActionRef;
use crate::callback::Phase;
use crate::constraint::Constraint;
use crate::ffi::{RawBody, RawConstraint, RawSolver};
use crate::math::Vec3;

/// Messages flushed by the world outside of a simulation step.
///
/// Wrappers send their release on drop; callbacks and actions send the mutations they request
/// mid-step.
pub(crate) enum Command {
    DestroyBody(RawBody),
    DestroyConstraint(RawConstraint),
    DestroySolver(RawSolver),

    AddConstraint(Rc<Constraint>, bool),
    RemoveConstraint(Rc<Constraint>),
    AddAction(ActionRef),
    RemoveAction(ActionRef),
    SetGravity(Vec3),
    ClearTickCallback(Phase),
}

impl Command {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Command::DestroyBody(_) => "DestroyBody",
            Command::DestroyConstraint(_) => "DestroyConstraint",
            Command::DestroySolver(_) => "DestroySolver",
            Command::AddConstraint(..) => "AddConstraint",
            Command::RemoveConstraint(_) => "RemoveConstraint",
            Command::AddAction(_) => "AddAction",
            Command::RemoveAction(_) => "RemoveAction",
            Command::SetGravity(_) => "SetGravity",
            Command::ClearTickCallback(_) => "ClearTickCallback",
        }
    }

    pub(crate) fn is_release(&self) -> bool {
        match self {
            Command::DestroyBody(_) | Command::DestroyConstraint(_) | Command::DestroySolver(_) => {
                true
            }
            _ => false,
        }
    }
}

/// World mutations requested from inside a tick callback or an action.
///
/// The world cannot be borrowed while it is stepping, so requests are queued and applied in
/// order as soon as `step_simulation` returns.
#[derive(Clone)]
pub struct Commands {
    tx: super::Tx<Command>,
}

impl Commands {
    pub(crate) fn new(tx: super::Tx<Command>) -> Self {
        Commands { tx }
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            log::debug!("world is gone, dropping deferred command");
        }
    }

    pub fn add_constraint(&self, constraint: &Rc<Constraint>, disable_collisions_between_linked_bodies: bool) {
        self.send(Command::AddConstraint(
            Rc::clone(constraint),
            disable_collisions_between_linked_bodies,
        ))
    }

    pub fn remove_constraint(&self, constraint: &Rc<Constraint>) {
        self.send(Command::RemoveConstraint(Rc::clone(constraint)))
    }

    pub fn add_action(&self, action: &ActionRef) {
        self.send(Command::AddAction(Rc::clone(action)))
    }

    pub fn remove_action(&self, action: &ActionRef) {
        self.send(Command::RemoveAction(Rc::clone(action)))
    }

    pub fn set_gravity(&self, gravity: Vec3) {
        self.send(Command::SetGravity(gravity))
    }

    /// Uninstalls the tick callback of the given phase.
    pub fn clear_tick_callback(&self, phase: Phase) {
        self.send(Command::ClearTickCallback(phase))
    }
}

impl std::fmt::Debug for Commands {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Commands").finish()
    }
}
