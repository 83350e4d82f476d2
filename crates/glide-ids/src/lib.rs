//! Shared identifiers for windows and animations.
#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a window as observed by the compositing host.
///
/// The host allocates window ids; downstream crates only ever reference
/// windows through this identifier and never hold the window object itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(u64);

impl WindowId {
    /// Construct an identifier from the host's raw window number.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw window number.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for WindowId {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Opaque reference to one in-flight animation issued by an engine.
///
/// A handle stays the same across retargets. Engines never reuse a handle
/// value, so a handle that has completed can be compared safely against the
/// handle currently stored for a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnimationHandle(u64);

impl AnimationHandle {
    /// Wrap an engine-issued handle value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AnimationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
