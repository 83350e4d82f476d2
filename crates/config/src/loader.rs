//! Parse, validate and serialize effect configurations.

use std::{collections::HashSet, fs, path::Path};

use ron::{Options, extensions::Extensions, ser::PrettyConfig};
use tracing::{debug, warn};

use crate::{
    AnimationSpec, EffectSpec, EffectsConfig, Error, RetargetSpec, UnsetAction, error::excerpt_at,
};

/// RON options shared by the loader and the serializer.
fn ron_options() -> Options {
    Options::default().with_default_extension(Extensions::IMPLICIT_SOME)
}

/// Parse and validate a configuration from RON source text.
///
/// `path` is only used to annotate errors.
pub fn load_from_str(source: &str, path: Option<&Path>) -> Result<EffectsConfig, Error> {
    let config: EffectsConfig = ron_options().from_str(source).map_err(|err| {
        let (line, col) = (err.span.start.line.max(1), err.span.start.col.max(1));
        Error::Parse {
            path: path.map(Path::to_path_buf),
            line,
            col,
            message: err.code.to_string(),
            excerpt: excerpt_at(source, line, col),
        }
    })?;
    validate(&config).map_err(|err| match path {
        Some(p) => err.with_path(p),
        None => err,
    })?;
    debug!(
        effects = config.effects.len(),
        enabled = config.enabled().count(),
        duration_scale = config.duration_scale,
        "loaded effects config"
    );
    Ok(config)
}

/// Load a configuration from a RON file at `path`.
pub fn load_from_path(path: &Path) -> Result<EffectsConfig, Error> {
    let source = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    load_from_str(&source, Some(path))
}

/// Render a configuration as pretty RON that [`load_from_str`] accepts.
pub fn to_ron_string(config: &EffectsConfig) -> Result<String, Error> {
    ron_options()
        .to_string_pretty(config, PrettyConfig::new())
        .map_err(|e| Error::Read {
            path: None,
            message: format!("failed to serialize config: {e}"),
        })
}

/// Check a parsed configuration for values no animation could honor.
pub fn validate(config: &EffectsConfig) -> Result<(), Error> {
    if !config.duration_scale.is_finite() || config.duration_scale <= 0.0 {
        return Err(Error::Validation {
            path: None,
            effect: None,
            message: format!(
                "duration_scale must be a positive number, got {}",
                config.duration_scale
            ),
        });
    }
    let mut seen = HashSet::new();
    for effect in &config.effects {
        if effect.name.trim().is_empty() {
            return Err(invalid(effect, "effect name must not be empty".into()));
        }
        if !seen.insert(effect.name.as_str()) {
            return Err(invalid(effect, "duplicate effect name".into()));
        }
        validate_effect(effect)?;
    }
    Ok(())
}

/// Validation error scoped to `effect`.
fn invalid(effect: &EffectSpec, message: String) -> Error {
    Error::Validation {
        path: None,
        effect: Some(effect.name.clone()),
        message,
    }
}

/// Validate every trigger of one effect.
fn validate_effect(effect: &EffectSpec) -> Result<(), Error> {
    let mut triggers = 0usize;
    for (label, anim) in [
        ("added", effect.added.as_ref()),
        ("closed", effect.closed.as_ref()),
        ("desktop_changed", effect.desktop_changed.as_ref()),
    ] {
        if let Some(anim) = anim {
            triggers += 1;
            check_animation(anim).map_err(|m| invalid(effect, format!("{label}: {m}")))?;
        }
    }
    let mut properties = HashSet::new();
    for rule in &effect.properties {
        triggers += 1;
        let label = rule.property.to_string();
        if !properties.insert(rule.property) {
            return Err(invalid(effect, format!("{label}: property listed twice")));
        }
        check_animation(&rule.animation).map_err(|m| invalid(effect, format!("{label}: {m}")))?;
        if let Some(retarget) = &rule.retarget {
            check_retarget(retarget)
                .map_err(|m| invalid(effect, format!("{label}: retarget {m}")))?;
        }
        if let UnsetAction::Retarget(retarget) = &rule.on_unset {
            check_retarget(retarget)
                .map_err(|m| invalid(effect, format!("{label}: on_unset {m}")))?;
        }
    }
    if triggers == 0 {
        warn!(effect = %effect.name, "effect has no triggers and will never animate");
    }
    Ok(())
}

/// Structural checks on an animation template.
fn check_animation(anim: &AnimationSpec) -> Result<(), String> {
    if anim.transitions.is_empty() {
        return Err("animation has no transitions".into());
    }
    if anim.slot.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Err("slot name must not be empty".into());
    }
    for (index, t) in anim.transitions.iter().enumerate() {
        if t.duration.is_zero() {
            return Err(format!("transition {index} has zero duration"));
        }
        if !t.to.is_finite() || t.from.is_some_and(|f| !f.is_finite()) {
            return Err(format!("transition {index} has a non-finite value"));
        }
    }
    Ok(())
}

/// Checks on a retarget path.
fn check_retarget(retarget: &RetargetSpec) -> Result<(), String> {
    if retarget.duration.is_zero() {
        return Err("duration must be non-zero".into());
    }
    if !retarget.to.is_finite() {
        return Err("target must be finite".into());
    }
    Ok(())
}
