//! The seam between the controller and whatever renders animations.

use std::time::Duration;

use glide_ids::AnimationHandle;

use crate::{AnimationDescriptor, EngineError};

/// The animation engine that renders transitions on behalf of the controller.
///
/// Engines issue monotonically increasing handles and never reuse one.
/// Completions are reported out of band and routed back to
/// [`Controller::on_completed`](crate::Controller::on_completed) by the caller.
pub trait AnimationEngine: Send + Sync {
    /// Start every transition of `descriptor` as one unit.
    fn submit(&self, descriptor: &AnimationDescriptor) -> Result<AnimationHandle, EngineError>;

    /// Halt the animation. Returns `false` when the handle is unknown or already finished.
    fn cancel(&self, handle: AnimationHandle) -> bool;

    /// Redirect the primary transition from its current value to `to` over
    /// `duration`; other transitions freeze. Returns `false` when the handle is stale.
    fn retarget(&self, handle: AnimationHandle, to: f64, duration: Duration) -> bool;
}
