//! Slot names keying the handle registry.

use std::{borrow::Cow, fmt};

/// Logical name under which a window keeps at most one live animation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(Cow<'static, str>);

impl Slot {
    /// Entrance animation of an added window.
    pub const ENTRANCE: Self = Self(Cow::Borrowed(config::slots::ENTRANCE));
    /// Exit animation of a closed window.
    pub const EXIT: Self = Self(Cow::Borrowed(config::slots::EXIT));
    /// Minimize-driven animation.
    pub const MINIMIZE: Self = Self(Cow::Borrowed(config::slots::MINIMIZE));
    /// Fullscreen-driven animation.
    pub const FULLSCREEN: Self = Self(Cow::Borrowed(config::slots::FULLSCREEN));
    /// Desktop-switch animation.
    pub const DESKTOP: Self = Self(Cow::Borrowed(config::slots::DESKTOP));

    /// Slot with an arbitrary name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Slot name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Slot {
    fn from(name: &str) -> Self {
        match name {
            config::slots::ENTRANCE => Self::ENTRANCE,
            config::slots::EXIT => Self::EXIT,
            config::slots::DESKTOP => Self::DESKTOP,
            config::slots::MINIMIZE => Self::MINIMIZE,
            config::slots::FULLSCREEN => Self::FULLSCREEN,
            other => Self(Cow::Owned(other.to_string())),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_names_are_borrowed() {
        assert!(matches!(Slot::from("exit").0, Cow::Borrowed(_)));
        assert_eq!(Slot::from("exit"), Slot::EXIT);
        assert_eq!(Slot::from("wobble").as_str(), "wobble");
        assert_eq!(Slot::new(String::from("entrance")), Slot::ENTRANCE);
    }

    #[test]
    fn property_slots_match_config_defaults() {
        let builtin = config::EffectsConfig::builtin();
        let minimize = builtin
            .effect("minimize")
            .and_then(|e| e.property_rule(glide_world::WindowProperty::Minimized))
            .unwrap();
        assert_eq!(Slot::from(minimize.slot()), Slot::MINIMIZE);
        assert!(matches!(Slot::from("minimize").0, Cow::Borrowed(_)));
        assert!(matches!(Slot::from("fullscreen").0, Cow::Borrowed(_)));
    }
}
