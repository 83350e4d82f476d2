//! Animation descriptors: the unit submitted to an engine.

use config::{AnimationSpec, Transition};
use glide_ids::WindowId;
use glide_world::WorldWindow;

use crate::DescriptorError;

/// A fully resolved animation for one window: one or more transitions started
/// together under a single handle.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationDescriptor {
    /// Target window.
    pub window: WindowId,
    /// Ordered transitions; index 0 is the primary transition.
    pub transitions: Vec<Transition>,
    /// Keep the window alive until this animation finishes.
    pub keep_alive: bool,
}

impl AnimationDescriptor {
    /// Descriptor without keep-alive.
    pub fn new(window: WindowId, transitions: Vec<Transition>) -> Self {
        Self {
            window,
            transitions,
            keep_alive: false,
        }
    }

    /// Set the keep-alive flag.
    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Resolve a configured template against a window.
    ///
    /// Durations and delays are multiplied by `duration_scale`, the fullscreen
    /// flag is only kept for fullscreen-eligible windows, and `keep_alive`
    /// falls back to `keep_alive_default` when the template leaves it open.
    pub fn from_template(
        window: &WorldWindow,
        template: &AnimationSpec,
        keep_alive_default: bool,
        duration_scale: f64,
    ) -> Self {
        let transitions = template
            .transitions
            .iter()
            .map(|t| {
                let mut t = t.scaled(duration_scale);
                t.fullscreen = t.fullscreen && window.fullscreen;
                t
            })
            .collect();
        Self {
            window: window.id,
            transitions,
            keep_alive: template.keep_alive.unwrap_or(keep_alive_default),
        }
    }

    /// The transition a retarget applies to.
    pub fn primary(&self) -> Option<&Transition> {
        self.transitions.first()
    }

    /// True when any transition uses the fullscreen presentation path.
    pub fn is_fullscreen(&self) -> bool {
        self.transitions.iter().any(|t| t.fullscreen)
    }

    /// Check the descriptor can be animated.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.transitions.is_empty() {
            return Err(DescriptorError::EmptyTransitions);
        }
        for (index, t) in self.transitions.iter().enumerate() {
            if t.duration.is_zero() {
                return Err(DescriptorError::ZeroDuration { index });
            }
            if !t.to.is_finite() || t.from.is_some_and(|f| !f.is_finite()) {
                return Err(DescriptorError::NonFinite { index });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use config::TargetProperty;

    use super::*;

    fn fade(ms: u64) -> Transition {
        Transition::new(TargetProperty::Opacity, 0.0, Duration::from_millis(ms))
    }

    #[test]
    fn template_scales_durations_and_delays() {
        let w = WorldWindow::new(1, "a");
        let spec = AnimationSpec::new(vec![fade(400).with_delay(Duration::from_millis(100))]);
        let d = AnimationDescriptor::from_template(&w, &spec, false, 2.0);
        assert_eq!(d.transitions[0].duration, Duration::from_millis(800));
        assert_eq!(d.transitions[0].delay, Duration::from_millis(200));
        assert!(!d.keep_alive);
    }

    #[test]
    fn fullscreen_flag_requires_eligible_window() {
        let spec = AnimationSpec::new(vec![fade(10).with_fullscreen(true), fade(10)]);
        let plain = WorldWindow::new(1, "a");
        let full = WorldWindow::new(2, "a").with_fullscreen(true);
        assert!(!AnimationDescriptor::from_template(&plain, &spec, false, 1.0).is_fullscreen());
        let d = AnimationDescriptor::from_template(&full, &spec, false, 1.0);
        assert!(d.transitions[0].fullscreen);
        assert!(!d.transitions[1].fullscreen);
    }

    #[test]
    fn keep_alive_default_and_override() {
        let w = WorldWindow::new(1, "a");
        let spec = AnimationSpec::new(vec![fade(10)]);
        assert!(AnimationDescriptor::from_template(&w, &spec, true, 1.0).keep_alive);
        let spec = spec.with_keep_alive(false);
        assert!(!AnimationDescriptor::from_template(&w, &spec, true, 1.0).keep_alive);
    }

    #[test]
    fn validation_reports_first_problem() {
        let w = WindowId::new(1);
        assert_eq!(
            AnimationDescriptor::new(w, vec![]).validate(),
            Err(DescriptorError::EmptyTransitions)
        );
        assert_eq!(
            AnimationDescriptor::new(w, vec![fade(5), fade(0)]).validate(),
            Err(DescriptorError::ZeroDuration { index: 1 })
        );
        assert_eq!(
            AnimationDescriptor::new(w, vec![fade(5).with_from(f64::NAN)]).validate(),
            Err(DescriptorError::NonFinite { index: 0 })
        );
        assert!(AnimationDescriptor::new(w, vec![fade(5)]).validate().is_ok());
    }
}
