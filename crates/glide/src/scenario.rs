//! Scenario files: a window world script replayed step by step.
//!
//! ```ron
//! (
//!     steps: [
//!         add((id: 1, class: "ksmserver-logout-greeter ksmserver-logout-greeter")),
//!         advance(400),
//!         close(1),
//!         settle,
//!     ],
//! )
//! ```

use std::{fmt, fs, path::Path};

use glide_ids::WindowId;
use glide_world::WorldWindow;
use ron::{Options, extensions::Extensions};
use serde::Deserialize;

use crate::error::{Error, Result};

/// A parsed scenario.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Steps in execution order.
    pub steps: Vec<Step>,
}

/// One host action or clock movement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Add (or re-show) a window on top of the stacking order.
    Add(WorldWindow),
    /// Close a window; it stays until no keep-alive animation holds it.
    Close(WindowId),
    /// Destroy a window immediately.
    Delete(WindowId),
    /// Set the minimized flag.
    Minimize(WindowId),
    /// Clear the minimized flag.
    Unminimize(WindowId),
    /// Set the fullscreen flag.
    Fullscreen(WindowId, bool),
    /// Raise a window to the top of the stacking order.
    Raise(WindowId),
    /// Switch to another desktop.
    Desktop(u32),
    /// Enable an effect by name.
    Enable(String),
    /// Disable an effect by name.
    Disable(String),
    /// Move the engine clock forward by this many milliseconds.
    Advance(u64),
    /// Run the clock until every animation has finished.
    Settle,
    /// Record the rendered values of a window.
    Sample(WindowId),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add(w) => write!(f, "add {} ({})", w.id, w.class),
            Self::Close(id) => write!(f, "close {id}"),
            Self::Delete(id) => write!(f, "delete {id}"),
            Self::Minimize(id) => write!(f, "minimize {id}"),
            Self::Unminimize(id) => write!(f, "unminimize {id}"),
            Self::Fullscreen(id, on) => write!(f, "fullscreen {id} {on}"),
            Self::Raise(id) => write!(f, "raise {id}"),
            Self::Desktop(n) => write!(f, "desktop {n}"),
            Self::Enable(name) => write!(f, "enable {name}"),
            Self::Disable(name) => write!(f, "disable {name}"),
            Self::Advance(ms) => write!(f, "advance {ms}ms"),
            Self::Settle => f.write_str("settle"),
            Self::Sample(id) => write!(f, "sample {id}"),
        }
    }
}

impl Scenario {
    /// Parse scenario text; `path` is only used in errors.
    pub fn parse(source: &str, path: &Path) -> Result<Self> {
        Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(source)
            .map_err(|source| Error::ScenarioParse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Read and parse a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|source| Error::ScenarioRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_parse() {
        let src = r#"(
            steps: [
                add((id: 3, class: "app", fullscreen: true)),
                minimize(3),
                fullscreen(3, false),
                desktop(2),
                advance(150),
                enable("minimize"),
                settle,
                sample(3),
            ],
        )"#;
        let scenario = Scenario::parse(src, Path::new("inline.ron")).unwrap();
        assert_eq!(scenario.steps.len(), 8);
        let Step::Add(window) = &scenario.steps[0] else {
            panic!("expected add");
        };
        assert_eq!(window.id, WindowId::new(3));
        assert!(window.fullscreen);
        assert_eq!(window.desktop, 1);
        assert_eq!(scenario.steps[4], Step::Advance(150));
        assert_eq!(scenario.steps[2].to_string(), "fullscreen w3 false");
    }

    #[test]
    fn unknown_step_is_a_parse_error() {
        let err = Scenario::parse("(steps: [explode(1)])", Path::new("bad.ron")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bad.ron"), "{msg}");
        assert!(matches!(err, Error::ScenarioParse { .. }));
    }

    #[test]
    fn demo_scenarios_parse() {
        for (name, src) in [
            ("logout.ron", include_str!("../../../demos/logout.ron")),
            ("minimize.ron", include_str!("../../../demos/minimize.ron")),
            ("desktop.ron", include_str!("../../../demos/desktop.ron")),
        ] {
            Scenario::parse(src, Path::new(name)).unwrap();
        }
    }
}
