// Defaults and constants for effect configuration

use std::time::Duration;

use glide_world::WindowProperty;

use crate::{
    AnimationSpec, Curve, EffectSpec, EffectsConfig, PropertyRule, RetargetSpec, TargetProperty,
    Transition, UnsetAction, WindowMatch,
};

/// Slot of entrance animations.
pub const SLOT_ENTRANCE: &str = "entrance";
/// Slot of exit animations.
pub const SLOT_EXIT: &str = "exit";
/// Slot of minimize-driven animations.
pub const SLOT_MINIMIZE: &str = "minimize";
/// Slot of fullscreen-driven animations.
pub const SLOT_FULLSCREEN: &str = "fullscreen";
/// Slot of desktop-switch animations.
pub const SLOT_DESKTOP: &str = "desktop";

// Timing
pub(crate) const DURATION_SCALE: f64 = 1.0;

// Window class of the session logout greeter
pub(crate) const LOGOUT_CLASS: &str = "ksmserver-logout-greeter ksmserver-logout-greeter";

// Serde default functions
pub(crate) const fn default_duration_scale() -> f64 {
    DURATION_SCALE
}
pub(crate) const fn default_true() -> bool {
    true
}
pub(crate) const fn default_windows() -> WindowMatch {
    WindowMatch::Any
}

/// Default slot for a property rule.
pub(crate) const fn property_slot(property: WindowProperty) -> &'static str {
    match property {
        WindowProperty::Minimized => SLOT_MINIMIZE,
        WindowProperty::Fullscreen => SLOT_FULLSCREEN,
    }
}

/// Milliseconds helper for the stock effects below.
const fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Fade the logout greeter in and out.
fn logout() -> EffectSpec {
    EffectSpec {
        windows: WindowMatch::Classes(vec![LOGOUT_CLASS.to_string()]),
        added: Some(AnimationSpec::new(vec![
            Transition::new(TargetProperty::Opacity, 1.0, ms(800)).with_from(0.0),
        ])),
        closed: Some(AnimationSpec::new(vec![
            Transition::new(TargetProperty::Opacity, 0.0, ms(400)).with_from(1.0),
        ])),
        ..EffectSpec::named("logout")
    }
}

/// Shrink closing windows while the host keeps them alive.
fn close_scale() -> EffectSpec {
    EffectSpec {
        enabled: false,
        closed: Some(AnimationSpec::new(vec![
            Transition::new(TargetProperty::Scale, 0.0, ms(1000)).with_from(1.0),
        ])),
        ..EffectSpec::named("close-scale")
    }
}

/// Scale and fade shared by the minimize effect's entrance and property rule.
fn minimize_animation() -> AnimationSpec {
    AnimationSpec::new(vec![
        Transition::new(TargetProperty::Scale, 1.4, ms(100)).with_curve(Curve::OutCubic),
        Transition::new(TargetProperty::Opacity, 0.0, ms(100)).with_curve(Curve::OutCubic),
    ])
    .in_slot(property_slot(WindowProperty::Minimized))
}

/// Scale and fade new windows; minimizing redirects the running animation,
/// unminimizing cancels it.
fn minimize() -> EffectSpec {
    EffectSpec {
        enabled: false,
        added: Some(minimize_animation()),
        properties: vec![PropertyRule {
            property: WindowProperty::Minimized,
            animation: minimize_animation(),
            retarget: Some(RetargetSpec {
                to: 1.5,
                duration: ms(200),
            }),
            on_unset: UnsetAction::Cancel,
        }],
        ..EffectSpec::named("minimize")
    }
}

/// Scale and fade every window through the fullscreen path on desktop switches.
fn desktop_switch() -> EffectSpec {
    EffectSpec {
        enabled: false,
        desktop_changed: Some(AnimationSpec::new(vec![
            Transition::new(TargetProperty::Scale, 1.4, ms(1000))
                .with_curve(Curve::Gaussian)
                .with_fullscreen(true),
            Transition::new(TargetProperty::Opacity, 0.0, ms(1000))
                .with_curve(Curve::Gaussian)
                .with_fullscreen(true),
        ])),
        ..EffectSpec::named("desktop-switch")
    }
}

/// Built-in effect set. Only the logout fade is enabled out of the box.
pub(crate) fn builtin() -> EffectsConfig {
    EffectsConfig {
        duration_scale: DURATION_SCALE,
        effects: vec![logout(), close_scale(), minimize(), desktop_switch()],
    }
}
