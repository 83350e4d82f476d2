//! Effect configuration for glide: which windows animate, on which events,
//! and how.
//!
//! Configurations are written in RON. [`EffectsConfig::builtin`] provides the
//! stock effect set used when no file exists.

use std::{
    env,
    path::{Path, PathBuf},
};

mod defaults;
mod effect;
mod error;
mod loader;
mod types;

#[cfg(test)]
mod test_parse;

pub use effect::{
    AnimationSpec, EffectSpec, EffectsConfig, PropertyRule, RetargetSpec, UnsetAction, WindowMatch,
};
pub use error::{Error, excerpt_at};
pub use loader::{load_from_path, load_from_str, to_ron_string, validate};
pub use types::{Curve, TargetProperty, Transition, scale_duration};

/// Slot names used when an animation template does not name its own.
pub mod slots {
    pub use crate::defaults::{
        SLOT_DESKTOP as DESKTOP, SLOT_ENTRANCE as ENTRANCE, SLOT_EXIT as EXIT,
        SLOT_FULLSCREEN as FULLSCREEN, SLOT_MINIMIZE as MINIMIZE,
    };
}

/// Window class of the session logout greeter targeted by the stock fade.
pub const LOGOUT_CLASS: &str = defaults::LOGOUT_CLASS;

/// Determine the preferred user config path (`~/.glide/effects.ron`).
pub fn default_config_path() -> PathBuf {
    let mut p = PathBuf::from(env::var_os("HOME").unwrap_or_default());
    p.push(".glide");
    p.push("effects.ron");
    p
}

/// Resolve the effective config path using the default policy.
///
/// Policy:
/// 1) Use `explicit` when provided.
/// 2) Else use `~/.glide/effects.ron` when it exists.
/// 3) Else return `None`; callers fall back to [`EffectsConfig::builtin`].
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let preferred = default_config_path();
    preferred.exists().then_some(preferred)
}

/// Load the configuration at the resolved path, or the built-in set when none exists.
pub fn load_or_builtin(explicit: Option<&Path>) -> Result<EffectsConfig, Error> {
    match resolve_config_path(explicit) {
        Some(path) => load_from_path(&path),
        None => Ok(EffectsConfig::builtin()),
    }
}
