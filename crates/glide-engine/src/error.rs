use std::result::Result as StdResult;

use glide_ids::WindowId;
use thiserror::Error;

use crate::Slot;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Structural problems that make a descriptor impossible to animate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// A descriptor must carry at least one transition.
    #[error("descriptor has no transitions")]
    EmptyTransitions,

    /// Every transition needs a non-zero duration.
    #[error("transition {index} has zero duration")]
    ZeroDuration {
        /// Position of the offending transition.
        index: usize,
    },

    /// Start and end values must be finite.
    #[error("transition {index} has a non-finite value")]
    NonFinite {
        /// Position of the offending transition.
        index: usize,
    },
}

/// Errors reported by an [`AnimationEngine`](crate::AnimationEngine) submission.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine refused the request.
    #[error("engine rejected animation: {0}")]
    Rejected(String),

    /// The descriptor failed the engine's own validation.
    #[error("invalid descriptor: {0}")]
    Invalid(#[from] DescriptorError),
}

/// Unified error type for the glide engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A template produced a descriptor that cannot be animated.
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(#[from] DescriptorError),

    /// The engine refused a submission; the slot was left idle.
    #[error("submission for {window} in slot {slot} failed: {source}")]
    EngineSubmissionFailed {
        /// Target window.
        window: WindowId,
        /// Slot the animation was meant for.
        slot: Slot,
        /// Engine-reported cause.
        source: EngineError,
    },

    /// The controller task has stopped.
    #[error("controller service closed")]
    ServiceClosed,
}
