//! Recording engine for tests.

use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use glide_ids::AnimationHandle;
use parking_lot::Mutex;

use crate::{AnimationDescriptor, AnimationEngine, EngineError};

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    /// `submit` with the descriptor as received.
    Submit(AnimationDescriptor),
    /// `cancel` of a handle.
    Cancel(AnimationHandle),
    /// `retarget` of a handle.
    Retarget {
        /// Handle retargeted.
        handle: AnimationHandle,
        /// New end value.
        to: f64,
        /// New remaining time.
        duration: Duration,
    },
}

impl EngineCall {
    /// Short name of the call, handy for asserting call order.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit(_) => "submit",
            Self::Cancel(_) => "cancel",
            Self::Retarget { .. } => "retarget",
        }
    }
}

/// [`AnimationEngine`] that records calls and issues sequential handles.
///
/// Animations never finish on their own; call [`MockEngine::finish`] to
/// simulate a natural completion.
#[derive(Clone, Default)]
pub struct MockEngine {
    /// Every call, in order.
    calls: Arc<Mutex<Vec<EngineCall>>>,
    /// Live animations by handle.
    live: Arc<Mutex<BTreeMap<AnimationHandle, AnimationDescriptor>>>,
    /// Last issued handle value.
    last_handle: Arc<AtomicU64>,
    /// Refuse every submission while set.
    fail_submit: Arc<AtomicBool>,
}

impl MockEngine {
    /// Fresh engine with no calls recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded calls.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    /// Recorded call names, in order.
    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls.lock().iter().map(EngineCall::name).collect()
    }

    /// Forget recorded calls; live animations are kept.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Number of `submit` calls recorded.
    pub fn submit_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, EngineCall::Submit(_)))
            .count()
    }

    /// Make subsequent submissions fail with [`EngineError::Rejected`].
    pub fn set_fail_submit(&self, v: bool) {
        self.fail_submit.store(v, Ordering::SeqCst);
    }

    /// True while `handle` is live.
    pub fn is_live(&self, handle: AnimationHandle) -> bool {
        self.live.lock().contains_key(&handle)
    }

    /// Live handles, oldest first.
    pub fn live(&self) -> Vec<AnimationHandle> {
        self.live.lock().keys().copied().collect()
    }

    /// Descriptor a live handle was submitted with.
    pub fn descriptor(&self, handle: AnimationHandle) -> Option<AnimationDescriptor> {
        self.live.lock().get(&handle).cloned()
    }

    /// End `handle` as if it ran to completion. Returns `false` when it was not live.
    pub fn finish(&self, handle: AnimationHandle) -> bool {
        self.live.lock().remove(&handle).is_some()
    }

    /// Record `call`.
    fn note(&self, call: EngineCall) {
        self.calls.lock().push(call);
    }
}

impl AnimationEngine for MockEngine {
    fn submit(&self, descriptor: &AnimationDescriptor) -> Result<AnimationHandle, EngineError> {
        self.note(EngineCall::Submit(descriptor.clone()));
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(EngineError::Rejected("mock submission failure".into()));
        }
        descriptor.validate()?;
        let handle = AnimationHandle::new(self.last_handle.fetch_add(1, Ordering::SeqCst) + 1);
        self.live.lock().insert(handle, descriptor.clone());
        Ok(handle)
    }

    fn cancel(&self, handle: AnimationHandle) -> bool {
        self.note(EngineCall::Cancel(handle));
        self.live.lock().remove(&handle).is_some()
    }

    fn retarget(&self, handle: AnimationHandle, to: f64, duration: Duration) -> bool {
        self.note(EngineCall::Retarget {
            handle,
            to,
            duration,
        });
        self.live.lock().contains_key(&handle)
    }
}

#[cfg(test)]
mod tests {
    use config::{TargetProperty, Transition};
    use glide_ids::WindowId;

    use super::*;

    fn descriptor() -> AnimationDescriptor {
        AnimationDescriptor::new(
            WindowId::new(1),
            vec![Transition::new(
                TargetProperty::Opacity,
                1.0,
                Duration::from_millis(5),
            )],
        )
    }

    #[test]
    fn records_calls_and_tracks_liveness() {
        let engine = MockEngine::new();
        let a = engine.submit(&descriptor()).unwrap();
        let b = engine.submit(&descriptor()).unwrap();
        assert_eq!(b.get(), a.get() + 1);
        assert!(engine.cancel(a));
        assert!(!engine.cancel(a));
        assert!(engine.retarget(b, 0.5, Duration::from_millis(3)));
        assert!(engine.finish(b));
        assert!(!engine.retarget(b, 0.5, Duration::from_millis(3)));
        assert_eq!(
            engine.call_names(),
            vec!["submit", "submit", "cancel", "cancel", "retarget", "retarget"]
        );
    }

    #[test]
    fn failing_submission_issues_no_handle() {
        let engine = MockEngine::new();
        engine.set_fail_submit(true);
        assert!(matches!(
            engine.submit(&descriptor()),
            Err(EngineError::Rejected(_))
        ));
        assert!(engine.live().is_empty());
        assert_eq!(engine.submit_count(), 1);
    }
}
