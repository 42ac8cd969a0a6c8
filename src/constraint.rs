//! Constraints and the world's constraint registry.
//!
//! The registry keeps the world's ordered list of constraints in the same order as the engine's
//! constraint array. Removal swaps the last constraint into the freed slot, which is what the
//! engine does too, so both orderings keep matching index for index. Index based lookup on the
//! world still goes through the engine's ordering (see
//! [`DynamicsWorld::constraint`](crate::DynamicsWorld::constraint)).
use std::rc::Rc;

use crate::body::RigidBody;
use crate::ffi::RawConstraint;
use crate::math::{Mat4, Vec3};
use crate::world::{Command, Tx, WorldId};

/// Kind of joint, along with the parameters the engine needs to build it.
///
/// Pivots and frames are given in the local space of each body.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintType {
    /// Ball-socket joint.
    Point2Point { pivot_in_a: Vec3, pivot_in_b: Vec3 },
    /// Rotation about a single axis (doors, wheels).
    Hinge {
        pivot_in_a: Vec3,
        pivot_in_b: Vec3,
        axis_in_a: Vec3,
        axis_in_b: Vec3,
    },
    /// Translation along, and rotation about, the x axis of the frames.
    Slider { frame_in_a: Mat4, frame_in_b: Mat4 },
    /// Limited swing and twist (ragdoll shoulders).
    ConeTwist { frame_in_a: Mat4, frame_in_b: Mat4 },
    /// Locks all six degrees of freedom.
    Fixed { frame_in_a: Mat4, frame_in_b: Mat4 },
}

impl ConstraintType {
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintType::Point2Point { .. } => "point2point",
            ConstraintType::Hinge { .. } => "hinge",
            ConstraintType::Slider { .. } => "slider",
            ConstraintType::ConeTwist { .. } => "cone_twist",
            ConstraintType::Fixed { .. } => "fixed",
        }
    }
}

/// Wrapper around an engine constraint linking exactly two bodies.
#[derive(Debug)]
pub struct Constraint {
    raw: RawConstraint,
    world: WorldId,
    constraint_type: ConstraintType,
    body_a: Rc<RigidBody>,
    body_b: Rc<RigidBody>,
    tx: Tx<Command>,
}

impl Constraint {
    pub(crate) fn new(
        raw: RawConstraint,
        world: WorldId,
        constraint_type: ConstraintType,
        body_a: Rc<RigidBody>,
        body_b: Rc<RigidBody>,
        tx: Tx<Command>,
    ) -> Self {
        Constraint {
            raw,
            world,
            constraint_type,
            body_a,
            body_b,
            tx,
        }
    }

    pub fn as_raw(&self) -> RawConstraint {
        self.raw
    }

    pub fn world_id(&self) -> WorldId {
        self.world
    }

    pub fn constraint_type(&self) -> &ConstraintType {
        &self.constraint_type
    }

    pub fn body_a(&self) -> &Rc<RigidBody> {
        &self.body_a
    }

    pub fn body_b(&self) -> &Rc<RigidBody> {
        &self.body_b
    }
}

impl Drop for Constraint {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::DestroyConstraint(self.raw));
    }
}

/// Ordered list of the constraints added to a world.
#[derive(Debug, Default)]
pub struct ConstraintRegistry {
    constraints: Vec<Rc<Constraint>>,
}

impl ConstraintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn position(&self, constraint: &Rc<Constraint>) -> Option<usize> {
        self.constraints.iter().position(|c| Rc::ptr_eq(c, constraint))
    }

    pub fn contains(&self, constraint: &Rc<Constraint>) -> bool {
        self.position(constraint).is_some()
    }

    pub fn get(&self, index: usize) -> Option<&Rc<Constraint>> {
        self.constraints.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<Rc<Constraint>> {
        self.constraints.iter()
    }

    /// Appends `constraint`. When `disable_collisions_between_linked_bodies` is set, both
    /// endpoint bodies also get a back-reference to it.
    ///
    /// Returns false (and changes nothing) if the constraint is already registered.
    pub fn add(&mut self, constraint: &Rc<Constraint>, disable_collisions_between_linked_bodies: bool) -> bool {
        if self.contains(constraint) {
            return false;
        }
        self.constraints.push(Rc::clone(constraint));

        if disable_collisions_between_linked_bodies {
            constraint.body_a().add_constraint_ref(constraint);
            constraint.body_b().add_constraint_ref(constraint);
        }
        true
    }

    /// Unregisters `constraint` and drops the endpoint back-references. The last constraint is
    /// moved into the freed slot.
    ///
    /// Returns the index the constraint occupied, or `None` if it wasn't registered.
    pub fn remove(&mut self, constraint: &Rc<Constraint>) -> Option<usize> {
        let index = self.position(constraint)?;

        constraint.body_a().remove_constraint_ref(constraint);
        constraint.body_b().remove_constraint_ref(constraint);

        self.constraints.swap_remove(index);
        Some(index)
    }

    /// Drops every constraint along with its back-references.
    pub fn clear(&mut self) {
        for constraint in self.constraints.drain(..) {
            constraint.body_a().remove_constraint_ref(&constraint);
            constraint.body_b().remove_constraint_ref(&constraint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::RawBody;
    use crate::math::IDENTITY;
    use crate::world::channel;

    struct Fixture {
        world: WorldId,
        tx: Tx<Command>,
        next: usize,
    }

    impl Fixture {
        fn new() -> Self {
            let (tx, _) = channel();
            Fixture {
                world: WorldId::next(),
                tx,
                next: 0,
            }
        }

        fn body(&mut self) -> Rc<RigidBody> {
            self.next += 1;
            Rc::new(RigidBody::new(
                RawBody::from_raw(self.next),
                self.world,
                1.0,
                self.tx.clone(),
            ))
        }

        fn fixed(&mut self, a: &Rc<RigidBody>, b: &Rc<RigidBody>) -> Rc<Constraint> {
            self.next += 1;
            Rc::new(Constraint::new(
                RawConstraint::from_raw(self.next),
                self.world,
                ConstraintType::Fixed {
                    frame_in_a: IDENTITY,
                    frame_in_b: IDENTITY,
                },
                Rc::clone(a),
                Rc::clone(b),
                self.tx.clone(),
            ))
        }
    }

    #[test]
    fn back_references_follow_registration() {
        let mut fx = Fixture::new();
        let (a, b) = (fx.body(), fx.body());
        let c = fx.fixed(&a, &b);
        let mut registry = ConstraintRegistry::new();

        assert!(registry.add(&c, true));
        assert!(Rc::ptr_eq(&c, &a.constraint_refs()[0]));
        assert!(Rc::ptr_eq(&c, &b.constraint_refs()[0]));

        assert_eq!(Some(0), registry.remove(&c));
        assert_eq!(0, a.num_constraint_refs());
        assert_eq!(0, b.num_constraint_refs());
    }

    #[test]
    fn no_back_references_without_disabled_collisions() {
        let mut fx = Fixture::new();
        let (a, b) = (fx.body(), fx.body());
        let c = fx.fixed(&a, &b);
        let mut registry = ConstraintRegistry::new();

        registry.add(&c, false);

        assert!(!a.has_constraint_ref_list());
        assert!(!b.has_constraint_ref_list());

        // removing from a list that was never created is fine
        assert_eq!(Some(0), registry.remove(&c));
        assert!(!a.has_constraint_ref_list());
    }

    #[test]
    fn same_pair_linked_twice() {
        let mut fx = Fixture::new();
        let (a, b) = (fx.body(), fx.body());
        let c0 = fx.fixed(&a, &b);
        let c1 = fx.fixed(&a, &b);
        let mut registry = ConstraintRegistry::new();

        registry.add(&c0, true);
        registry.add(&c1, true);
        assert_eq!(2, a.num_constraint_refs());
        assert_eq!(2, b.num_constraint_refs());

        registry.remove(&c0);
        assert_eq!(1, a.num_constraint_refs());
        assert!(Rc::ptr_eq(&c1, &b.constraint_refs()[0]));
    }

    #[test]
    fn add_is_idempotent() {
        let mut fx = Fixture::new();
        let (a, b) = (fx.body(), fx.body());
        let c = fx.fixed(&a, &b);
        let mut registry = ConstraintRegistry::new();

        assert!(registry.add(&c, true));
        assert!(!registry.add(&c, true));
        assert_eq!(1, registry.len());
        assert_eq!(1, a.num_constraint_refs());
    }

    #[test]
    fn removal_swaps_last_into_place() {
        let mut fx = Fixture::new();
        let (a, b) = (fx.body(), fx.body());
        let c0 = fx.fixed(&a, &b);
        let c1 = fx.fixed(&a, &b);
        let c2 = fx.fixed(&a, &b);
        let mut registry = ConstraintRegistry::new();

        registry.add(&c0, false);
        registry.add(&c1, false);
        registry.add(&c2, false);

        assert_eq!(Some(0), registry.remove(&c0));
        assert_eq!(2, registry.len());
        assert!(Rc::ptr_eq(&c2, registry.get(0).unwrap()));
        assert!(Rc::ptr_eq(&c1, registry.get(1).unwrap()));
    }

    #[test]
    fn removing_unregistered_is_a_no_op() {
        let mut fx = Fixture::new();
        let (a, b) = (fx.body(), fx.body());
        let c = fx.fixed(&a, &b);
        let mut registry = ConstraintRegistry::new();

        assert_eq!(None, registry.remove(&c));
        assert!(registry.is_empty());
    }
}
