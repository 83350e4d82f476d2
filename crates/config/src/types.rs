use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Visual property a transition drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetProperty {
    /// Window opacity, 0.0 (transparent) to 1.0 (opaque).
    Opacity,
    /// Uniform scale factor, 1.0 is natural size.
    Scale,
    /// Offset from the window's resting position.
    Position,
    /// Engine-defined scalar.
    Generic,
}

impl TargetProperty {
    /// Value a property has when no animation is affecting it.
    #[must_use]
    pub const fn resting_value(self) -> f64 {
        match self {
            Self::Opacity | Self::Scale => 1.0,
            Self::Position | Self::Generic => 0.0,
        }
    }
}

impl fmt::Display for TargetProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Opacity => "opacity",
            Self::Scale => "scale",
            Self::Position => "position",
            Self::Generic => "generic",
        })
    }
}

/// Easing curve identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    /// Constant speed.
    #[default]
    Linear,
    /// Quadratic acceleration.
    InQuad,
    /// Quadratic deceleration.
    OutQuad,
    /// Quadratic acceleration then deceleration.
    InOutQuad,
    /// Cubic acceleration.
    InCubic,
    /// Cubic deceleration.
    OutCubic,
    /// Cubic acceleration then deceleration.
    InOutCubic,
    /// Sinusoidal acceleration then deceleration.
    InOutSine,
    /// Bell-shaped progress that peaks half way and returns to the start.
    Gaussian,
}

/// Serialize a [`Duration`] as whole milliseconds.
pub(crate) mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as `u64` milliseconds.
    pub(crate) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    /// Deserialize from `u64` milliseconds.
    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// One visual transition of an animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Transition {
    /// Property to animate.
    pub property: TargetProperty,
    /// Start value; absent means "whatever the property currently shows".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    /// End value.
    pub to: f64,
    /// Running time, in milliseconds in configuration files. Must be non-zero.
    #[serde(with = "millis")]
    pub duration: Duration,
    /// Easing curve.
    #[serde(default)]
    pub curve: Curve,
    /// Apply through the fullscreen presentation path on eligible windows.
    #[serde(default)]
    pub fullscreen: bool,
    /// Time to wait before the transition starts moving.
    #[serde(default, with = "millis")]
    pub delay: Duration,
}

impl Transition {
    /// Transition of `property` towards `to` over `duration`, starting from the current value.
    #[must_use]
    pub const fn new(property: TargetProperty, to: f64, duration: Duration) -> Self {
        Self {
            property,
            from: None,
            to,
            duration,
            curve: Curve::Linear,
            fullscreen: false,
            delay: Duration::ZERO,
        }
    }

    /// Start from an explicit value.
    #[must_use]
    pub const fn with_from(mut self, from: f64) -> Self {
        self.from = Some(from);
        self
    }

    /// Use a specific easing curve.
    #[must_use]
    pub const fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }

    /// Request the fullscreen presentation path.
    #[must_use]
    pub const fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    /// Delay the start.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Copy with duration and delay multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        let mut out = self.clone();
        out.duration = scale_duration(self.duration, factor);
        out.delay = scale_duration(self.delay, factor);
        out
    }
}

/// Multiply `d` by `factor`, rounded to the nearest nanosecond.
#[must_use]
pub fn scale_duration(d: Duration, factor: f64) -> Duration {
    let nanos = (d.as_nanos() as f64 * factor).round();
    Duration::from_nanos(nanos as u64)
}
