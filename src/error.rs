use failure::Fail;

/// Errors reported by the world layer.
///
/// Conditions where the world is already in the requested state (adding a registered action,
/// removing something that was never added, installing the same callback twice) are not
/// errors and never show up here.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum Error {
    /// The world was disposed and its engine handle released.
    #[fail(display = "The dynamics world has already been disposed")]
    Disposed,

    /// Index based constraint lookup outside of `0..count`.
    #[fail(display = "Constraint index {} is out of range (count = {})", index, count)]
    IndexOutOfRange { index: usize, count: usize },

    /// An argument the engine cannot accept.
    #[fail(display = "Invalid argument `{}`: {}", name, reason)]
    InvalidArgument {
        name: &'static str,
        reason: &'static str,
    },

    /// A body, constraint or solver created by a different world.
    #[fail(display = "The handle belongs to a different world")]
    ForeignHandle,
}
