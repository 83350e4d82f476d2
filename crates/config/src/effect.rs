use std::time::Duration;

use glide_world::WindowProperty;
use serde::{Deserialize, Serialize};

use crate::{
    Transition,
    defaults::{
        SLOT_DESKTOP, SLOT_ENTRANCE, SLOT_EXIT, default_duration_scale, default_true,
        default_windows, property_slot,
    },
    types::millis,
};

/// Which windows an effect applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMatch {
    /// Every window.
    #[default]
    Any,
    /// Windows whose class is exactly one of the listed strings.
    Classes(Vec<String>),
}

impl WindowMatch {
    /// Exact set-membership test against a window class.
    #[must_use]
    pub fn matches(&self, class: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Classes(classes) => classes.iter().any(|c| c == class),
        }
    }
}

/// Template for an animation started by a trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnimationSpec {
    /// Slot to store the handle under; each trigger has its own default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    /// Transitions started together; the first one is primary.
    pub transitions: Vec<Transition>,
    /// Defer window destruction until the animation finishes. Exit animations
    /// default to `true`, everything else to `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<bool>,
}

impl AnimationSpec {
    /// Template with default slot and keep-alive policy.
    #[must_use]
    pub const fn new(transitions: Vec<Transition>) -> Self {
        Self {
            slot: None,
            transitions,
            keep_alive: None,
        }
    }

    /// Store handles under a specific slot.
    #[must_use]
    pub fn in_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = Some(slot.into());
        self
    }

    /// Override the keep-alive default.
    #[must_use]
    pub const fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }

    /// Slot name, falling back to `default`.
    #[must_use]
    pub fn slot_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.slot.as_deref().unwrap_or(default)
    }
}

/// New end value and remaining time for an in-flight animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetargetSpec {
    /// New end value for the primary transition.
    pub to: f64,
    /// New remaining time, milliseconds in configuration files.
    #[serde(with = "millis")]
    pub duration: Duration,
}

/// What to do with a running property animation when the property turns false.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsetAction {
    /// Cancel the animation and free the slot.
    #[default]
    Cancel,
    /// Redirect the animation to a new end value.
    Retarget(RetargetSpec),
    /// Leave the animation running.
    Ignore,
}

/// Reaction to a boolean window property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyRule {
    /// Watched property.
    pub property: WindowProperty,
    /// Animation started when the property becomes true.
    pub animation: AnimationSpec,
    /// When set and the slot already holds a live handle, becoming true
    /// retargets that handle instead of starting a competing animation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retarget: Option<RetargetSpec>,
    /// Reaction when the property becomes false.
    #[serde(default)]
    pub on_unset: UnsetAction,
}

impl PropertyRule {
    /// Slot used by this rule.
    #[must_use]
    pub fn slot(&self) -> &str {
        self.animation.slot_or(property_slot(self.property))
    }
}

/// One effect: which windows it targets and how it reacts to each event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EffectSpec {
    /// Unique effect name, used in logs.
    pub name: String,
    /// Disabled effects are loaded and validated but never react.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Window classification filter.
    #[serde(default = "default_windows")]
    pub windows: WindowMatch,
    /// Starting an entrance cancels a live exit on the same window, and the
    /// other way round.
    #[serde(default = "default_true")]
    pub supersede: bool,
    /// Entrance animation for added windows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<AnimationSpec>,
    /// Exit animation for closed windows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed: Option<AnimationSpec>,
    /// Property reactions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyRule>,
    /// Animation started on every window of the stacking order when the
    /// desktop changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop_changed: Option<AnimationSpec>,
}

impl EffectSpec {
    /// Enabled effect with no triggers, matching every window.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            windows: WindowMatch::Any,
            supersede: true,
            added: None,
            closed: None,
            properties: Vec::new(),
            desktop_changed: None,
        }
    }

    /// Entrance slot name.
    #[must_use]
    pub fn entrance_slot(&self) -> &str {
        self.added
            .as_ref()
            .map_or(SLOT_ENTRANCE, |a| a.slot_or(SLOT_ENTRANCE))
    }

    /// Exit slot name.
    #[must_use]
    pub fn exit_slot(&self) -> &str {
        self.closed.as_ref().map_or(SLOT_EXIT, |a| a.slot_or(SLOT_EXIT))
    }

    /// Desktop-switch slot name.
    #[must_use]
    pub fn desktop_slot(&self) -> &str {
        self.desktop_changed
            .as_ref()
            .map_or(SLOT_DESKTOP, |a| a.slot_or(SLOT_DESKTOP))
    }

    /// Rule for `property`, if any.
    #[must_use]
    pub fn property_rule(&self, property: WindowProperty) -> Option<&PropertyRule> {
        self.properties.iter().find(|r| r.property == property)
    }
}

/// Full effect configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EffectsConfig {
    /// Global animation-speed factor applied to every duration and delay.
    #[serde(default = "default_duration_scale")]
    pub duration_scale: f64,
    /// Effects, evaluated in order for every event.
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            duration_scale: default_duration_scale(),
            effects: Vec::new(),
        }
    }
}

impl EffectsConfig {
    /// The stock effect set.
    #[must_use]
    pub fn builtin() -> Self {
        crate::defaults::builtin()
    }

    /// Effects that currently react to events.
    pub fn enabled(&self) -> impl Iterator<Item = &EffectSpec> {
        self.effects.iter().filter(|e| e.enabled)
    }

    /// Find an effect by name.
    #[must_use]
    pub fn effect(&self, name: &str) -> Option<&EffectSpec> {
        self.effects.iter().find(|e| e.name == name)
    }

    /// Enable or disable an effect by name, returning whether it exists.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.effects.iter_mut().find(|e| e.name == name) {
            Some(effect) => {
                effect.enabled = enabled;
                true
            }
            None => false,
        }
    }
}
