//! Deterministic software animation engine driven by an explicit clock.

use std::{
    collections::{BTreeMap, HashSet},
    time::Duration,
};

use config::{Curve, TargetProperty};
use glide_ids::{AnimationHandle, WindowId};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::{
    AnimationDescriptor, AnimationEngine, EngineError,
    easing::{lerp, sample},
};

/// Shortest running time a retarget is stretched to.
const MIN_RETARGET: Duration = Duration::from_millis(1);

/// One transition as the engine runs it.
#[derive(Debug, Clone)]
struct Track {
    /// Animated property.
    property: TargetProperty,
    /// Resolved start value.
    from: f64,
    /// End value.
    to: f64,
    /// Easing curve.
    curve: Curve,
    /// Uses the fullscreen presentation path.
    fullscreen: bool,
    /// Clock time the track starts moving.
    starts_at: Duration,
    /// Running time.
    duration: Duration,
    /// Held value once frozen by a retarget of a sibling track.
    frozen: Option<f64>,
}

impl Track {
    /// Rendered value at clock time `now`.
    fn value_at(&self, now: Duration) -> f64 {
        if let Some(v) = self.frozen {
            return v;
        }
        if now <= self.starts_at {
            return self.from;
        }
        let t = (now - self.starts_at).as_secs_f64() / self.duration.as_secs_f64();
        lerp(self.from, self.to, sample(self.curve, t))
    }

    /// True once the track has nothing left to do.
    fn is_done(&self, now: Duration) -> bool {
        self.frozen.is_some() || now >= self.starts_at + self.duration
    }

    /// Clock time the track ends, if it is still moving.
    fn ends_at(&self) -> Option<Duration> {
        self.frozen.is_none().then(|| self.starts_at + self.duration)
    }
}

/// A submitted descriptor.
#[derive(Debug)]
struct Running {
    /// Target window.
    window: WindowId,
    /// Holds the window alive while running.
    keep_alive: bool,
    /// Tracks; index 0 is primary.
    tracks: Vec<Track>,
}

impl Running {
    /// True when every track is done.
    fn is_done(&self, now: Duration) -> bool {
        self.tracks.iter().all(|t| t.is_done(now))
    }

    /// Value of the last track driving `property`, if any.
    fn value_of(&self, property: TargetProperty, now: Duration) -> Option<f64> {
        self.tracks
            .iter()
            .rev()
            .find(|t| t.property == property)
            .map(|t| t.value_at(now))
    }
}

/// Mutable engine state.
#[derive(Debug, Default)]
struct TimelineState {
    /// Engine clock.
    now: Duration,
    /// Last issued handle value.
    last_handle: u64,
    /// Live animations, oldest first.
    running: BTreeMap<AnimationHandle, Running>,
    /// Handles that finished during the last `advance`.
    just_ended: HashSet<AnimationHandle>,
}

impl TimelineState {
    /// Current rendered value; the newest live animation wins, otherwise the resting value.
    fn value(&self, window: WindowId, property: TargetProperty) -> f64 {
        self.running
            .values()
            .rev()
            .filter(|a| a.window == window)
            .find_map(|a| a.value_of(property, self.now))
            .unwrap_or_else(|| property.resting_value())
    }
}

/// Reference [`AnimationEngine`] that samples curves against a manual clock.
///
/// Nothing moves until [`TimelineEngine::advance`] is called, which makes the
/// engine suitable for tests and offline replays.
#[derive(Debug, Default)]
pub struct TimelineEngine {
    /// Shared state.
    state: Mutex<TimelineState>,
}

impl TimelineEngine {
    /// Engine at clock zero with nothing running.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock time.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Move the clock forward, returning finished handles in issue order.
    pub fn advance(&self, by: Duration) -> Vec<AnimationHandle> {
        let mut st = self.state.lock();
        st.now += by;
        let now = st.now;
        let finished: Vec<_> = st
            .running
            .iter()
            .filter(|(_, a)| a.is_done(now))
            .map(|(h, _)| *h)
            .collect();
        st.just_ended.clear();
        for handle in &finished {
            st.running.remove(handle);
            st.just_ended.insert(*handle);
            trace!(handle = %handle, now_ms = now.as_millis(), "animation finished");
        }
        finished
    }

    /// Time until the next running animation finishes.
    pub fn next_completion(&self) -> Option<Duration> {
        let st = self.state.lock();
        st.running
            .values()
            .filter_map(|a| a.tracks.iter().filter_map(Track::ends_at).max())
            .min()
            .map(|end| end.saturating_sub(st.now))
    }

    /// Rendered value of `property` on `window` at the current clock.
    pub fn value(&self, window: WindowId, property: TargetProperty) -> f64 {
        self.state.lock().value(window, property)
    }

    /// True while a live keep-alive animation targets `window`.
    pub fn is_kept_alive(&self, window: WindowId) -> bool {
        self.state
            .lock()
            .running
            .values()
            .any(|a| a.window == window && a.keep_alive)
    }

    /// True while any live animation uses the fullscreen presentation path.
    pub fn is_fullscreen_active(&self) -> bool {
        self.state
            .lock()
            .running
            .values()
            .any(|a| a.tracks.iter().any(|t| t.fullscreen))
    }

    /// True while `handle` is running.
    pub fn is_running(&self, handle: AnimationHandle) -> bool {
        self.state.lock().running.contains_key(&handle)
    }

    /// Number of live animations.
    pub fn running_count(&self) -> usize {
        self.state.lock().running.len()
    }

    /// Drop every animation of a destroyed window, returning how many were dropped.
    pub fn forget_window(&self, window: WindowId) -> usize {
        let mut st = self.state.lock();
        let before = st.running.len();
        st.running.retain(|_, a| a.window != window);
        before - st.running.len()
    }
}

impl AnimationEngine for TimelineEngine {
    fn submit(&self, descriptor: &AnimationDescriptor) -> Result<AnimationHandle, EngineError> {
        descriptor.validate()?;
        let mut st = self.state.lock();
        let now = st.now;
        let tracks = descriptor
            .transitions
            .iter()
            .map(|t| Track {
                property: t.property,
                from: t
                    .from
                    .unwrap_or_else(|| st.value(descriptor.window, t.property)),
                to: t.to,
                curve: t.curve,
                fullscreen: t.fullscreen,
                starts_at: now + t.delay,
                duration: t.duration,
                frozen: None,
            })
            .collect();
        st.last_handle += 1;
        let handle = AnimationHandle::new(st.last_handle);
        st.running.insert(
            handle,
            Running {
                window: descriptor.window,
                keep_alive: descriptor.keep_alive,
                tracks,
            },
        );
        debug!(
            handle = %handle,
            window = %descriptor.window,
            transitions = descriptor.transitions.len(),
            keep_alive = descriptor.keep_alive,
            "animation submitted"
        );
        Ok(handle)
    }

    fn cancel(&self, handle: AnimationHandle) -> bool {
        let mut st = self.state.lock();
        if st.running.remove(&handle).is_some() {
            debug!(handle = %handle, "animation canceled");
            return true;
        }
        // Finished during the last tick but not yet routed to its owner.
        st.just_ended.contains(&handle)
    }

    fn retarget(&self, handle: AnimationHandle, to: f64, duration: Duration) -> bool {
        if !to.is_finite() {
            warn!(handle = %handle, to, "ignoring retarget to non-finite value");
            return false;
        }
        let mut st = self.state.lock();
        let now = st.now;
        let Some(anim) = st.running.get_mut(&handle) else {
            return false;
        };
        for (index, track) in anim.tracks.iter_mut().enumerate() {
            let current = track.value_at(now);
            if index == 0 {
                track.from = current;
                track.to = to;
                track.starts_at = now;
                track.duration = duration.max(MIN_RETARGET);
                track.frozen = None;
            } else {
                track.frozen = Some(current);
            }
        }
        debug!(handle = %handle, to, duration_ms = duration.as_millis(), "animation retargeted");
        true
    }
}

#[cfg(test)]
mod tests {
    use config::Transition;

    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn linear_fade_interpolates_and_completes() {
        let engine = TimelineEngine::new();
        let w = WindowId::new(1);
        let d = AnimationDescriptor::new(
            w,
            vec![Transition::new(TargetProperty::Opacity, 1.0, ms(800)).with_from(0.0)],
        );
        let h = engine.submit(&d).unwrap();
        assert!(close(engine.value(w, TargetProperty::Opacity), 0.0));
        assert!(engine.advance(ms(400)).is_empty());
        assert!(close(engine.value(w, TargetProperty::Opacity), 0.5));
        assert_eq!(engine.advance(ms(400)), vec![h]);
        assert!(!engine.is_running(h));
        assert!(close(engine.value(w, TargetProperty::Opacity), 1.0));
    }

    #[test]
    fn handles_are_monotonic() {
        let engine = TimelineEngine::new();
        let d = AnimationDescriptor::new(
            WindowId::new(1),
            vec![Transition::new(TargetProperty::Scale, 0.0, ms(10))],
        );
        let a = engine.submit(&d).unwrap();
        assert!(engine.cancel(a));
        let b = engine.submit(&d).unwrap();
        assert!(b > a);
    }

    #[test]
    fn missing_from_uses_current_value() {
        let engine = TimelineEngine::new();
        let w = WindowId::new(1);
        let first = AnimationDescriptor::new(
            w,
            vec![Transition::new(TargetProperty::Scale, 2.0, ms(100)).with_from(1.0)],
        );
        engine.submit(&first).unwrap();
        engine.advance(ms(50));
        let second =
            AnimationDescriptor::new(w, vec![Transition::new(TargetProperty::Scale, 0.0, ms(100))]);
        engine.submit(&second).unwrap();
        assert!(close(engine.value(w, TargetProperty::Scale), 1.5));
    }

    #[test]
    fn retarget_moves_primary_and_freezes_the_rest() {
        let engine = TimelineEngine::new();
        let w = WindowId::new(1);
        let d = AnimationDescriptor::new(
            w,
            vec![
                Transition::new(TargetProperty::Scale, 2.0, ms(100)).with_from(1.0),
                Transition::new(TargetProperty::Opacity, 0.0, ms(100)).with_from(1.0),
            ],
        );
        let h = engine.submit(&d).unwrap();
        engine.advance(ms(50));
        assert!(engine.retarget(h, 3.5, ms(200)));
        assert!(close(engine.value(w, TargetProperty::Scale), 1.5));
        engine.advance(ms(100));
        assert!(close(engine.value(w, TargetProperty::Scale), 2.5));
        assert!(close(engine.value(w, TargetProperty::Opacity), 0.5));
        assert_eq!(engine.advance(ms(100)), vec![h]);
    }

    #[test]
    fn stale_handles_are_reported() {
        let engine = TimelineEngine::new();
        let d = AnimationDescriptor::new(
            WindowId::new(1),
            vec![Transition::new(TargetProperty::Opacity, 0.0, ms(10))],
        );
        let h = engine.submit(&d).unwrap();
        engine.advance(ms(10));
        assert!(!engine.retarget(h, 1.0, ms(10)));
        assert!(engine.cancel(h), "cancel right after finishing still succeeds");
        engine.advance(ms(1));
        assert!(!engine.cancel(h));
        assert!(!engine.cancel(AnimationHandle::new(99)));
    }

    #[test]
    fn delay_holds_start_value() {
        let engine = TimelineEngine::new();
        let w = WindowId::new(1);
        let d = AnimationDescriptor::new(
            w,
            vec![
                Transition::new(TargetProperty::Opacity, 0.0, ms(100))
                    .with_from(1.0)
                    .with_delay(ms(50)),
            ],
        );
        let h = engine.submit(&d).unwrap();
        engine.advance(ms(50));
        assert!(close(engine.value(w, TargetProperty::Opacity), 1.0));
        assert_eq!(engine.next_completion(), Some(ms(100)));
        assert_eq!(engine.advance(ms(100)), vec![h]);
    }

    #[test]
    fn invalid_descriptor_is_rejected() {
        let engine = TimelineEngine::new();
        let d = AnimationDescriptor::new(WindowId::new(1), vec![]);
        assert!(matches!(engine.submit(&d), Err(EngineError::Invalid(_))));
        assert_eq!(engine.running_count(), 0);
    }

    #[test]
    fn keep_alive_and_fullscreen_tracking() {
        let engine = TimelineEngine::new();
        let w = WindowId::new(4);
        let mut t = Transition::new(TargetProperty::Scale, 0.0, ms(10));
        t.fullscreen = true;
        let d = AnimationDescriptor::new(w, vec![t]).with_keep_alive(true);
        engine.submit(&d).unwrap();
        assert!(engine.is_kept_alive(w));
        assert!(engine.is_fullscreen_active());
        assert_eq!(engine.forget_window(w), 1);
        assert!(!engine.is_kept_alive(w));
        assert!(!engine.is_fullscreen_active());
    }
}
