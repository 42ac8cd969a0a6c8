use std::cell::RefCell;
use std::ops::{BitAnd, BitOr, Not};
use std::rc::{Rc, Weak};

use crate::constraint::Constraint;
use crate::ffi::RawBody;
use crate::world::{Command, Tx, WorldId};

/// Collision filter bits, used both as a body's group and as the mask of groups it collides with.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct CollisionFilterGroups(pub i32);

impl CollisionFilterGroups {
    pub const NONE: Self = CollisionFilterGroups(0);
    pub const DEFAULT: Self = CollisionFilterGroups(1);
    pub const STATIC: Self = CollisionFilterGroups(2);
    pub const KINEMATIC: Self = CollisionFilterGroups(4);
    pub const DEBRIS: Self = CollisionFilterGroups(8);
    pub const SENSOR_TRIGGER: Self = CollisionFilterGroups(16);
    pub const CHARACTER: Self = CollisionFilterGroups(32);
    pub const ALL: Self = CollisionFilterGroups(-1);

    pub fn bits(self) -> i32 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for CollisionFilterGroups {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        CollisionFilterGroups(self.0 | rhs.0)
    }
}

impl BitAnd for CollisionFilterGroups {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        CollisionFilterGroups(self.0 & rhs.0)
    }
}

impl Not for CollisionFilterGroups {
    type Output = Self;

    fn not(self) -> Self {
        CollisionFilterGroups(!self.0)
    }
}

/// Wrapper around an engine rigid body.
///
/// Bodies are shared (`Rc`) between the application and the world. Removing a body from the
/// world only unregisters it; the engine body is released once the last `Rc` is dropped.
#[derive(Debug)]
pub struct RigidBody {
    raw: RawBody,
    world: WorldId,
    mass: f32,
    /// Constraints attached to this body with collisions disabled between the linked pair.
    /// Created on first use. Weak because bodies don't own their constraints.
    constraint_refs: RefCell<Option<Vec<Weak<Constraint>>>>,
    tx: Tx<Command>,
}

impl RigidBody {
    pub(crate) fn new(raw: RawBody, world: WorldId, mass: f32, tx: Tx<Command>) -> Self {
        RigidBody {
            raw,
            world,
            mass,
            constraint_refs: RefCell::new(None),
            tx,
        }
    }

    pub fn as_raw(&self) -> RawBody {
        self.raw
    }

    pub fn world_id(&self) -> WorldId {
        self.world
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Bodies with zero mass are static.
    pub fn is_static(&self) -> bool {
        self.mass == 0.0
    }

    /// Constraints referencing this body that disable collisions between their linked bodies.
    pub fn constraint_refs(&self) -> Vec<Rc<Constraint>> {
        self.constraint_refs
            .borrow()
            .iter()
            .flatten()
            .filter_map(Weak::upgrade)
            .collect()
    }

    pub fn num_constraint_refs(&self) -> usize {
        self.constraint_refs.borrow().as_ref().map_or(0, Vec::len)
    }

    pub(crate) fn has_constraint_ref_list(&self) -> bool {
        self.constraint_refs.borrow().is_some()
    }

    pub(crate) fn add_constraint_ref(&self, constraint: &Rc<Constraint>) {
        self.constraint_refs
            .borrow_mut()
            .get_or_insert_with(Vec::new)
            .push(Rc::downgrade(constraint));
    }

    /// Removes one reference to `constraint`. Missing list or missing entry is a no-op.
    pub(crate) fn remove_constraint_ref(&self, constraint: &Constraint) {
        if let Some(refs) = self.constraint_refs.borrow_mut().as_mut() {
            let ptr = constraint as *const Constraint;
            if let Some(index) = refs.iter().position(|c| c.as_ptr() == ptr) {
                refs.remove(index);
            }
        }
    }
}

impl Drop for RigidBody {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::DestroyBody(self.raw));
    }
}

/// Bodies registered in a world, along with their collision filter.
#[derive(Debug, Default)]
pub(crate) struct BodyCollection {
    bodies: Vec<(Rc<RigidBody>, CollisionFilterGroups, CollisionFilterGroups)>,
}

impl BodyCollection {
    pub fn contains(&self, body: &Rc<RigidBody>) -> bool {
        self.bodies.iter().any(|(b, _, _)| Rc::ptr_eq(b, body))
    }

    /// Returns false if the body was already registered.
    pub fn add(
        &mut self,
        body: &Rc<RigidBody>,
        group: CollisionFilterGroups,
        mask: CollisionFilterGroups,
    ) -> bool {
        if self.contains(body) {
            return false;
        }
        self.bodies.push((Rc::clone(body), group, mask));
        true
    }

    /// Returns false if the body wasn't registered.
    pub fn remove(&mut self, body: &Rc<RigidBody>) -> bool {
        match self.bodies.iter().position(|(b, _, _)| Rc::ptr_eq(b, body)) {
            Some(index) => {
                self.bodies.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn filter(&self, body: &Rc<RigidBody>) -> Option<(CollisionFilterGroups, CollisionFilterGroups)> {
        self.bodies
            .iter()
            .find(|(b, _, _)| Rc::ptr_eq(b, body))
            .map(|(_, group, mask)| (*group, *mask))
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<RigidBody>> {
        self.bodies.iter().map(|(b, _, _)| b)
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
    }
}
