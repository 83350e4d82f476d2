//! glide engine
//!
//! The engine crate decides, per window, which animations run and how a new
//! request interacts with one already in flight:
//! - [`Controller`]: reacts to world events by starting, retargeting and
//!   canceling animations according to the effect configuration
//! - [`HandleRegistry`]: the live handle of every (window, slot)
//! - [`AnimationEngine`]: the seam to whatever renders transitions, with
//!   [`TimelineEngine`] as a deterministic reference and [`MockEngine`] for tests
//! - [`ControllerService`]: runs a controller on a tokio task behind one queue
//!
//! The controller never mutates windows and keeps no global state; every
//! collaborator is injected.

mod controller;
mod descriptor;
mod easing;
mod engine;
mod error;
mod mock;
mod registry;
mod service;
mod slot;
pub mod test_support;
mod timeline;

pub use controller::{Controller, Outcome, SkipReason};
pub use descriptor::AnimationDescriptor;
pub use easing::{lerp, sample};
pub use engine::AnimationEngine;
pub use error::{DescriptorError, EngineError, Error, Result};
pub use glide_ids::AnimationHandle;
pub use mock::{EngineCall, MockEngine};
pub use registry::HandleRegistry;
pub use service::{ControllerHandle, ControllerService};
pub use slot::Slot;
pub use timeline::TimelineEngine;
