//! Test support utilities for glide-engine integration and unit tests.
//! These helpers are public so integration tests and the replay binary can
//! share them.

use std::{sync::Arc, time::Duration};

use config::{AnimationSpec, EffectSpec, EffectsConfig, TargetProperty, Transition};
use glide_world::{EventCursor, World, WorldView};

use crate::{Controller, MockEngine, Outcome};

/// Milliseconds as a [`Duration`].
pub fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

/// Configuration holding exactly `effects` at normal speed.
pub fn config_with(effects: Vec<EffectSpec>) -> EffectsConfig {
    EffectsConfig {
        duration_scale: 1.0,
        effects,
    }
}

/// Built-in configuration with `names` enabled and everything else disabled.
pub fn builtin_only(names: &[&str]) -> EffectsConfig {
    let mut cfg = EffectsConfig::builtin();
    for effect in &mut cfg.effects {
        effect.enabled = names.contains(&effect.name.as_str());
    }
    cfg
}

/// Single-transition opacity template.
pub fn fade(from: f64, to: f64, duration_ms: u64) -> AnimationSpec {
    AnimationSpec::new(vec![
        Transition::new(TargetProperty::Opacity, to, ms(duration_ms)).with_from(from),
    ])
}

/// A world, a recording engine and a controller subscribed to the world.
pub struct Harness {
    /// Host world.
    pub world: Arc<World>,
    /// Recording engine.
    pub engine: Arc<MockEngine>,
    /// Controller under test.
    pub controller: Controller,
    /// Subscription feeding the controller.
    pub cursor: EventCursor,
}

impl Harness {
    /// Wire a fresh world and mock engine to a controller running `config`.
    pub fn new(config: EffectsConfig) -> Self {
        let world = Arc::new(World::default());
        let engine = Arc::new(MockEngine::new());
        let cursor = world.subscribe();
        let controller = Controller::new(world.clone(), engine.clone(), config);
        Self {
            world,
            engine,
            controller,
            cursor,
        }
    }

    /// Dispatch every pending world event to the controller.
    pub fn pump(&mut self) -> Vec<Outcome> {
        self.controller.drain(&mut self.cursor)
    }
}
