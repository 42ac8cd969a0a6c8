//! Internal tick callbacks.
//!
//! The engine has a single function pointer slot per phase. The world installs one of two
//! trampolines in it, with a pointer to its [`TickCallbackBridge`] as user info, and the
//! trampoline forwards to whatever [`TickCallback`] is currently set for that phase.
use std::any::Any;
use std::fmt;
use std::os::raw::c_void;
use std::rc::Rc;

use crate::ffi::InternalTickCallback;
use crate::world::Commands;

/// Sub-step phase a tick callback runs in.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Phase {
    /// Before the engine integrates the sub-step.
    Pre,
    /// After integration and actions.
    Post,
}

impl Phase {
    pub fn is_pre_tick(self) -> bool {
        self == Phase::Pre
    }
}

/// Opaque, application defined value handed back to tick callbacks.
pub type UserInfo = Rc<dyn Any>;

/// Closure invoked once per internal sub-step.
///
/// Cloning keeps the identity, so installing a clone of the current callback does nothing.
#[derive(Clone)]
pub struct TickCallback(Rc<dyn Fn(&Tick, f32)>);

impl TickCallback {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Tick, f32) + 'static,
    {
        TickCallback(Rc::new(callback))
    }

    /// Whether both values refer to the same closure.
    pub fn ptr_eq(&self, other: &TickCallback) -> bool {
        Rc::as_ptr(&self.0) as *const () == Rc::as_ptr(&other.0) as *const ()
    }

    fn call(&self, tick: &Tick, time_step: f32) {
        (self.0)(tick, time_step)
    }
}

impl fmt::Debug for TickCallback {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TickCallback({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// What a tick callback gets to see of the world while it is stepping.
pub struct Tick<'a> {
    phase: Phase,
    time_step: f32,
    user_info: Option<&'a UserInfo>,
    commands: &'a Commands,
}

impl<'a> Tick<'a> {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Size of the current sub-step, in seconds.
    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    /// User info given when the callback of this phase was installed.
    pub fn user_info(&self) -> Option<&UserInfo> {
        self.user_info
    }

    pub fn user_info_as<T: Any>(&self) -> Option<&T> {
        self.user_info.and_then(|info| info.downcast_ref())
    }

    /// Deferred world mutations, applied when the step returns.
    pub fn commands(&self) -> &Commands {
        self.commands
    }
}

#[derive(Default)]
struct Channel {
    callback: Option<TickCallback>,
    // lazily created engine side adapter. `None` while uninstalled.
    adapter: Option<InternalTickCallback>,
    user_info: Option<UserInfo>,
}

/// What the engine needs to do after a [`TickCallbackBridge::set`] call.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) enum Install {
    /// Nothing changed.
    Keep,
    Install(InternalTickCallback),
    Uninstall,
}

/// Pre and post tick channels of one world.
///
/// The world keeps it at a fixed heap address for as long as any hook is installed.
pub struct TickCallbackBridge {
    pre: Channel,
    post: Channel,
    commands: Commands,
}

impl TickCallbackBridge {
    pub(crate) fn new(commands: Commands) -> Self {
        TickCallbackBridge {
            pre: Channel::default(),
            post: Channel::default(),
            commands,
        }
    }

    fn channel(&self, phase: Phase) -> &Channel {
        match phase {
            Phase::Pre => &self.pre,
            Phase::Post => &self.post,
        }
    }

    fn channel_mut(&mut self, phase: Phase) -> &mut Channel {
        match phase {
            Phase::Pre => &mut self.pre,
            Phase::Post => &mut self.post,
        }
    }

    pub fn callback(&self, phase: Phase) -> Option<&TickCallback> {
        self.channel(phase).callback.as_ref()
    }

    pub fn user_info(&self, phase: Phase) -> Option<&UserInfo> {
        self.channel(phase).user_info.as_ref()
    }

    pub fn is_installed(&self, phase: Phase) -> bool {
        self.channel(phase).adapter.is_some()
    }

    pub(crate) fn set_user_info(&mut self, phase: Phase, user_info: Option<UserInfo>) {
        self.channel_mut(phase).user_info = user_info;
    }

    /// Moves the channel of `phase` to `callback` and reports the engine call needed to match.
    pub(crate) fn set(&mut self, phase: Phase, callback: Option<TickCallback>) -> Install {
        let channel = self.channel_mut(phase);

        let unchanged = match (&channel.callback, &callback) {
            (Some(current), Some(new)) => current.ptr_eq(new),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return Install::Keep;
        }

        channel.callback = callback;
        if channel.callback.is_some() {
            let adapter = *channel.adapter.get_or_insert(trampoline(phase));
            Install::Install(adapter)
        } else {
            channel.adapter = None;
            Install::Uninstall
        }
    }

    /// Invokes the callback of `phase`, if one is set.
    pub(crate) fn dispatch(&self, phase: Phase, time_step: f32) {
        let channel = self.channel(phase);

        // cloned so the closure stays alive even if the slot is replaced while it runs
        if let Some(callback) = channel.callback.clone() {
            let tick = Tick {
                phase,
                time_step,
                user_info: channel.user_info.as_ref(),
                commands: &self.commands,
            };
            callback.call(&tick, time_step);
        }
    }
}

impl fmt::Debug for TickCallbackBridge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TickCallbackBridge")
            .field("pre", &self.pre.callback)
            .field("post", &self.post.callback)
            .finish()
    }
}

fn trampoline(phase: Phase) -> InternalTickCallback {
    match phase {
        Phase::Pre => pre_tick,
        Phase::Post => post_tick,
    }
}

unsafe extern "C" fn pre_tick(user_info: *mut c_void, time_step: f32) {
    let bridge = &*(user_info as *const TickCallbackBridge);
    bridge.dispatch(Phase::Pre, time_step);
}

unsafe extern "C" fn post_tick(user_info: *mut c_void, time_step: f32) {
    let bridge = &*(user_info as *const TickCallbackBridge);
    bridge.dispatch(Phase::Post, time_step);
}
