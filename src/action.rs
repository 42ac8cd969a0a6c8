use std::cell::RefCell;
use std::collections::HashMap;
use std::os::raw::c_void;
use std::ptr::NonNull;
use std::rc::Rc;

use crate::ffi::{Engine, RawAction};
use crate::world::Commands;

/// User behaviour invoked by the engine once per sub-step, after integration.
pub trait Action {
    fn update_action(&mut self, commands: &Commands, delta_time_step: f32);
}

/// Shared action. Registration is keyed by the identity of the `Rc`, not by value.
pub type ActionRef = Rc<RefCell<dyn Action>>;

/// Identity of an [`ActionRef`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ActionId(usize);

impl ActionId {
    pub fn of(action: &ActionRef) -> Self {
        ActionId(Rc::as_ptr(action) as *const () as usize)
    }
}

struct AdapterData {
    action: ActionRef,
    commands: Commands,
}

/// Bridges an [`Action`] to the engine's action callback convention.
///
/// The adapter owns one engine action handle plus the heap data the engine calls back into.
/// Both are released by [`release`](ActionAdapter::release); if the adapter is dropped without
/// being released (the engine is gone) only the heap data is freed.
pub struct ActionAdapter {
    raw: RawAction,
    data: Option<NonNull<AdapterData>>,
}

impl ActionAdapter {
    fn new<E: Engine>(engine: &mut E, action: &ActionRef, commands: Commands) -> Self {
        let data = Box::new(AdapterData {
            action: Rc::clone(action),
            commands,
        });
        let data = NonNull::from(Box::leak(data));
        // the data pointer is freed in `release`, after the engine has destroyed the action
        let raw = unsafe { engine.create_action(update_action, data.as_ptr() as *mut c_void) };

        ActionAdapter {
            raw,
            data: Some(data),
        }
    }

    pub fn as_raw(&self) -> RawAction {
        self.raw
    }

    pub fn is_released(&self) -> bool {
        self.data.is_none()
    }

    /// Destroys the engine action and frees the adapter data.
    pub fn release<E: Engine>(&mut self, engine: &mut E) {
        if let Some(data) = self.data.take() {
            engine.destroy_action(self.raw);
            unsafe { drop(Box::from_raw(data.as_ptr())) };
        }
    }
}

impl Drop for ActionAdapter {
    fn drop(&mut self) {
        if let Some(data) = self.data.take() {
            unsafe { drop(Box::from_raw(data.as_ptr())) };
        }
    }
}

impl std::fmt::Debug for ActionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ActionAdapter")
            .field("raw", &self.raw)
            .field("released", &self.is_released())
            .finish()
    }
}

unsafe extern "C" fn update_action(user_data: *mut c_void, time_step: f32) {
    let data = &*(user_data as *const AdapterData);
    data.action
        .borrow_mut()
        .update_action(&data.commands, time_step);
}

/// Actions registered in a world, with the adapter bridging each one to the engine.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    adapters: HashMap<ActionId, ActionAdapter>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn contains(&self, action: &ActionRef) -> bool {
        self.adapters.contains_key(&ActionId::of(action))
    }

    pub fn adapter(&self, action: &ActionRef) -> Option<&ActionAdapter> {
        self.adapters.get(&ActionId::of(action))
    }

    /// Wraps `action` and adds it to the engine. Returns false if it was already registered.
    pub(crate) fn add<E: Engine>(&mut self, engine: &mut E, action: &ActionRef, commands: &Commands) -> bool {
        let id = ActionId::of(action);
        if self.adapters.contains_key(&id) {
            return false;
        }
        let adapter = ActionAdapter::new(engine, action, commands.clone());
        engine.add_action(adapter.as_raw());
        self.adapters.insert(id, adapter);
        true
    }

    /// Removes `action` from the engine and releases its adapter. Returns false if it wasn't
    /// registered.
    pub(crate) fn remove<E: Engine>(&mut self, engine: &mut E, action: &ActionRef) -> bool {
        match self.adapters.remove(&ActionId::of(action)) {
            Some(mut adapter) => {
                engine.remove_action(adapter.as_raw());
                adapter.release(engine);
                true
            }
            None => false,
        }
    }

    /// Releases every adapter. Must run before the engine world itself is destroyed.
    pub(crate) fn release_all<E: Engine>(&mut self, engine: &mut E) {
        for (_, mut adapter) in self.adapters.drain() {
            engine.remove_action(adapter.as_raw());
            adapter.release(engine);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SoftwareEngine;
    use crate::world::{channel, WorldType};

    struct Counter(Rc<RefCell<Vec<f32>>>);

    impl Action for Counter {
        fn update_action(&mut self, _: &Commands, dt: f32) {
            self.0.borrow_mut().push(dt);
        }
    }

    fn counter() -> (ActionRef, Rc<RefCell<Vec<f32>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let action: ActionRef = Rc::new(RefCell::new(Counter(Rc::clone(&calls))));
        (action, calls)
    }

    #[test]
    fn identity_not_value() {
        let (a, _) = counter();
        let (b, _) = counter();
        let a2 = Rc::clone(&a);

        assert_eq!(ActionId::of(&a), ActionId::of(&a2));
        assert_ne!(ActionId::of(&a), ActionId::of(&b));
    }

    #[test]
    fn add_twice_registers_once() {
        let mut engine = SoftwareEngine::new(WorldType::Discrete);
        let (tx, _rx) = channel();
        let commands = Commands::new(tx);
        let mut registry = ActionRegistry::new();
        let (action, calls) = counter();

        assert!(registry.add(&mut engine, &action, &commands));
        assert!(!registry.add(&mut engine, &action, &commands));
        assert_eq!(1, registry.len());
        assert_eq!(1, engine.num_actions());

        engine.step_simulation(1.0 / 60.0, 1, 1.0 / 60.0);
        assert_eq!(1, calls.borrow().len());
    }

    #[test]
    fn remove_unknown_is_a_no_op() {
        let mut engine = SoftwareEngine::new(WorldType::Discrete);
        let mut registry = ActionRegistry::new();
        let (action, _) = counter();

        assert!(!registry.remove(&mut engine, &action));
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_releases_adapter() {
        let mut engine = SoftwareEngine::new(WorldType::Discrete);
        let (tx, _rx) = channel();
        let commands = Commands::new(tx);
        let mut registry = ActionRegistry::new();
        let (action, calls) = counter();

        registry.add(&mut engine, &action, &commands);
        assert!(registry.remove(&mut engine, &action));
        assert_eq!(0, engine.num_actions());

        engine.step_simulation(1.0 / 60.0, 1, 1.0 / 60.0);
        assert!(calls.borrow().is_empty());
        // the registry no longer holds a clone of the action
        assert_eq!(1, Rc::strong_count(&action));
    }
}
