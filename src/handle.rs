//! Engine handle -> wrapper identity map.
//!
//! A logical engine object is wrapped at most once. Looking up the same raw handle twice gives
//! back the same `Rc`, so pointer equality on wrappers is the same as identity of the
//! underlying engine object.
//!
//! The registry holds weak references. Wrappers are kept alive by whoever owns them (the host
//! application or one of the world's registries), never by the map itself.
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::{Rc, Weak};

#[derive(Debug)]
pub struct HandleRegistry<H, W> {
    wrappers: HashMap<H, Weak<W>>,
}

impl<H, W> Default for HandleRegistry<H, W>
where
    H: Copy + Eq + Hash,
{
    fn default() -> Self {
        HandleRegistry {
            wrappers: HashMap::new(),
        }
    }
}

impl<H, W> HandleRegistry<H, W>
where
    H: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `wrapper` as the wrapper of `handle`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if a different live wrapper is already registered for the handle.
    pub fn insert(&mut self, handle: H, wrapper: &Rc<W>) {
        let previous = self.wrappers.insert(handle, Rc::downgrade(wrapper));
        debug_assert!(
            previous
                .and_then(|w| w.upgrade())
                .map_or(true, |w| Rc::ptr_eq(&w, wrapper)),
            "engine handle wrapped twice"
        );
    }

    /// Returns the live wrapper of `handle`, if any.
    pub fn get(&self, handle: H) -> Option<Rc<W>> {
        self.wrappers.get(&handle).and_then(Weak::upgrade)
    }

    /// Returns the live wrapper of `handle`, wrapping it with `wrap` if there is none.
    pub fn get_or_wrap<F>(&mut self, handle: H, wrap: F) -> Rc<W>
    where
        F: FnOnce() -> W,
    {
        if let Some(wrapper) = self.get(handle) {
            return wrapper;
        }
        let wrapper = Rc::new(wrap());
        self.wrappers.insert(handle, Rc::downgrade(&wrapper));
        wrapper
    }

    pub fn remove(&mut self, handle: H) -> bool {
        self.wrappers.remove(&handle).is_some()
    }

    /// Number of entries whose wrapper is still alive.
    pub fn len(&self) -> usize {
        self.wrappers.values().filter(|w| w.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.wrappers.clear();
    }
}
