//! Drive a [`Controller`] over a scripted world with the timeline engine.

use std::{fmt, sync::Arc, time::Duration};

use config::{EffectsConfig, TargetProperty};
use glide_engine::{Controller, Outcome, TimelineEngine};
use glide_ids::WindowId;
use glide_world::{EventCursor, World, WorldView};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    scenario::{Scenario, Step},
};

/// Upper bound on clock jumps performed by one `settle` step.
const MAX_SETTLE_ROUNDS: usize = 1024;

/// Rendered values of one window at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    /// Sampled window.
    pub window: WindowId,
    /// Current opacity.
    pub opacity: f64,
    /// Current scale.
    pub scale: f64,
    /// Current position offset.
    pub position: f64,
    /// Whether a keep-alive animation still holds the window.
    pub kept_alive: bool,
}

/// What one step did.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// Zero-based step index.
    pub index: usize,
    /// Rendered step.
    pub step: String,
    /// Engine clock after the step, in milliseconds.
    pub at_ms: u64,
    /// Controller outcomes produced by the step, rendered.
    pub outcomes: Vec<String>,
    /// How many of those outcomes were failures.
    pub failures: usize,
    /// Values recorded by a `sample` step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<Sample>,
}

/// Result of a whole replay.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Per-step results.
    pub steps: Vec<StepReport>,
    /// Outcomes that were failures.
    pub failures: usize,
    /// Animations still running at the end.
    pub running: usize,
    /// Windows left in the stacking order at the end, bottom first.
    pub windows: Vec<WindowId>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "[{:>6}ms] {}", step.at_ms, step.step)?;
            for outcome in &step.outcomes {
                writeln!(f, "    {outcome}")?;
            }
            if let Some(s) = step.sample {
                writeln!(
                    f,
                    "    {}: opacity={:.3} scale={:.3} position={:.3}{}",
                    s.window,
                    s.opacity,
                    s.scale,
                    s.position,
                    if s.kept_alive { " (kept alive)" } else { "" }
                )?;
            }
        }
        let windows = self
            .windows
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        write!(
            f,
            "failures={} running={} windows=[{}]",
            self.failures, self.running, windows
        )
    }
}

/// A world, a timeline engine and a controller subscribed to the world.
pub struct Replay {
    /// Scripted host world.
    world: Arc<World>,
    /// Deterministic engine.
    engine: Arc<TimelineEngine>,
    /// Controller under replay.
    controller: Controller,
    /// Controller's subscription.
    cursor: EventCursor,
}

impl Replay {
    /// Wire a fresh world and engine to a controller running `config`.
    pub fn new(config: EffectsConfig) -> Self {
        let world = Arc::new(World::default());
        let engine = Arc::new(TimelineEngine::new());
        let controller = Controller::new(world.clone(), engine.clone(), config);
        let cursor = controller.subscribe();
        Self {
            world,
            engine,
            controller,
            cursor,
        }
    }

    /// Enable a configured effect before running.
    pub fn enable(&mut self, effect: &str) -> Result<()> {
        self.controller
            .set_enabled(effect, true)
            .map(drop)
            .ok_or_else(|| Error::Step {
                index: 0,
                step: format!("--enable {effect}"),
                message: "no such effect".to_string(),
            })
    }

    /// Run every step of `scenario`.
    pub fn run(&mut self, scenario: &Scenario) -> Result<Report> {
        info!(steps = scenario.steps.len(), "replay starting");
        let steps = scenario
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.apply(index, step))
            .collect::<Result<Vec<_>>>()?;
        let failures = steps.iter().map(|s| s.failures).sum();
        let report = Report {
            steps,
            failures,
            running: self.engine.running_count(),
            windows: self.world.stacking_order().iter().map(|w| w.id).collect(),
        };
        info!(
            failures = report.failures,
            running = report.running,
            "replay finished"
        );
        Ok(report)
    }

    /// Apply one step and collect what the controller did.
    fn apply(&mut self, index: usize, step: &Step) -> Result<StepReport> {
        debug!(index, %step, "step");
        let fail = |message: &str| Error::Step {
            index,
            step: step.to_string(),
            message: message.to_string(),
        };
        let mut outcomes = Vec::new();
        let mut sample = None;
        match step {
            Step::Add(window) => {
                if !self.world.add_window(window.clone()) {
                    return Err(fail("window is already open"));
                }
            }
            Step::Close(id) => {
                if self.world.close_window(*id).is_none() {
                    return Err(fail("unknown or already closed window"));
                }
            }
            Step::Delete(id) => {
                if !self.world.delete_window(*id) {
                    return Err(fail("unknown window"));
                }
                self.engine.forget_window(*id);
            }
            Step::Minimize(id) | Step::Unminimize(id) => {
                self.known(*id).ok_or_else(|| fail("unknown window"))?;
                self.world
                    .set_minimized(*id, matches!(step, Step::Minimize(_)));
            }
            Step::Fullscreen(id, on) => {
                self.known(*id).ok_or_else(|| fail("unknown window"))?;
                self.world.set_fullscreen(*id, *on);
            }
            Step::Raise(id) => {
                if !self.world.raise(*id) {
                    return Err(fail("unknown window"));
                }
            }
            Step::Desktop(n) => {
                self.world.switch_desktop(*n);
            }
            Step::Enable(name) | Step::Disable(name) => {
                let enabled = matches!(step, Step::Enable(_));
                let canceled = self
                    .controller
                    .set_enabled(name, enabled)
                    .ok_or_else(|| fail("no such effect"))?;
                outcomes.extend(canceled);
            }
            Step::Advance(ms) => self.advance(Duration::from_millis(*ms), &mut outcomes),
            Step::Settle => self.settle(&mut outcomes),
            Step::Sample(id) => {
                self.known(*id).ok_or_else(|| fail("unknown window"))?;
                sample = Some(self.sample(*id));
            }
        }
        self.pump(&mut outcomes);
        Ok(StepReport {
            index,
            step: step.to_string(),
            at_ms: u64::try_from(self.engine.now().as_millis()).unwrap_or(u64::MAX),
            failures: outcomes.iter().filter(|o| o.is_failure()).count(),
            outcomes: outcomes.iter().map(ToString::to_string).collect(),
            sample,
        })
    }

    /// The window, if the world still has it.
    fn known(&self, id: WindowId) -> Option<WindowId> {
        self.world.get(id).map(|w| w.id)
    }

    /// Current rendered values of `window`.
    fn sample(&self, window: WindowId) -> Sample {
        Sample {
            window,
            opacity: self.engine.value(window, TargetProperty::Opacity),
            scale: self.engine.value(window, TargetProperty::Scale),
            position: self.engine.value(window, TargetProperty::Position),
            kept_alive: self.engine.is_kept_alive(window),
        }
    }

    /// Feed pending events to the controller and destroy closed windows that
    /// nothing keeps alive, until the world is quiet.
    fn pump(&mut self, out: &mut Vec<Outcome>) {
        loop {
            out.extend(self.controller.drain(&mut self.cursor));
            let reaped: Vec<_> = self
                .world
                .closed_windows()
                .into_iter()
                .filter(|id| !self.engine.is_kept_alive(*id))
                .collect();
            if reaped.is_empty() {
                return;
            }
            for id in reaped {
                debug!(window = %id, "destroying closed window");
                self.world.delete_window(id);
                self.engine.forget_window(id);
            }
        }
    }

    /// Move the clock and route completions.
    fn advance(&mut self, by: Duration, out: &mut Vec<Outcome>) {
        for handle in self.engine.advance(by) {
            out.push(self.controller.on_completed(handle));
        }
        self.pump(out);
    }

    /// Jump from completion to completion until nothing runs.
    fn settle(&mut self, out: &mut Vec<Outcome>) {
        for _ in 0..MAX_SETTLE_ROUNDS {
            let Some(next) = self.engine.next_completion() else {
                return;
            };
            self.advance(next, out);
        }
    }
}
