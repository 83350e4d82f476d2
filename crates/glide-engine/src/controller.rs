//! The lifecycle controller: turns world events into engine calls.

use std::{collections::BTreeSet, fmt, sync::Arc, time::Duration};

use config::{
    AnimationSpec, EffectSpec, EffectsConfig, PropertyRule, UnsetAction, scale_duration,
};
use glide_ids::{AnimationHandle, WindowId};
use glide_world::{EventCursor, WindowProperty, WorldEvent, WorldView, WorldWindow};
use tracing::{debug, info, trace, warn};

use crate::{AnimationDescriptor, AnimationEngine, Error, HandleRegistry, Slot};

/// Why an event left a window untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The window's class is not targeted by the effect.
    ClassificationMismatch,
    /// Nothing is configured, or nothing is running, for this event.
    NoRule,
    /// The engine no longer knew the handle, or a completion arrived for a
    /// handle that no slot holds.
    Stale,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ClassificationMismatch => "classification mismatch",
            Self::NoRule => "no rule",
            Self::Stale => "stale handle",
        })
    }
}

/// What the controller did in response to one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A new animation was submitted and stored.
    Started {
        /// Effect that reacted.
        effect: String,
        /// Target window.
        window: WindowId,
        /// Slot the handle is stored in.
        slot: Slot,
        /// Engine handle.
        handle: AnimationHandle,
    },
    /// A live animation was redirected in place.
    Retargeted {
        /// Effect that reacted.
        effect: String,
        /// Target window.
        window: WindowId,
        /// Slot holding the handle.
        slot: Slot,
        /// Engine handle, unchanged.
        handle: AnimationHandle,
    },
    /// A live animation was canceled and its slot cleared.
    Canceled {
        /// Effect that reacted.
        effect: String,
        /// Target window.
        window: WindowId,
        /// Slot that was cleared.
        slot: Slot,
        /// Engine handle.
        handle: AnimationHandle,
    },
    /// An animation finished naturally and its slot was cleared.
    Completed {
        /// Effect owning the animation.
        effect: String,
        /// Target window.
        window: WindowId,
        /// Slot that was cleared.
        slot: Slot,
        /// Engine handle.
        handle: AnimationHandle,
    },
    /// A deleted window's slots were dropped without engine calls.
    Cleared {
        /// The deleted window.
        window: WindowId,
        /// Slot entries removed across all effects.
        count: usize,
    },
    /// Nothing was done.
    Skipped {
        /// Effect concerned, if any.
        effect: Option<String>,
        /// Window concerned, if any.
        window: Option<WindowId>,
        /// Why nothing happened.
        reason: SkipReason,
    },
    /// The animation could not be started; the slot is idle.
    Failed {
        /// Effect that reacted.
        effect: String,
        /// Target window.
        window: WindowId,
        /// Slot the animation was meant for.
        slot: Slot,
        /// Cause.
        error: Error,
    },
}

impl Outcome {
    /// Handle of a started animation.
    pub fn started_handle(&self) -> Option<AnimationHandle> {
        match self {
            Self::Started { handle, .. } => Some(*handle),
            _ => None,
        }
    }

    /// True for [`Outcome::Failed`].
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started {
                effect,
                window,
                slot,
                handle,
            } => write!(f, "started {handle} {effect}/{slot} on {window}"),
            Self::Retargeted {
                effect,
                window,
                slot,
                handle,
            } => write!(f, "retargeted {handle} {effect}/{slot} on {window}"),
            Self::Canceled {
                effect,
                window,
                slot,
                handle,
            } => write!(f, "canceled {handle} {effect}/{slot} on {window}"),
            Self::Completed {
                effect,
                window,
                slot,
                handle,
            } => write!(f, "completed {handle} {effect}/{slot} on {window}"),
            Self::Cleared { window, count } => write!(f, "cleared {count} slot(s) of {window}"),
            Self::Skipped {
                effect,
                window,
                reason,
            } => {
                write!(f, "skipped ({reason})")?;
                if let Some(effect) = effect {
                    write!(f, " {effect}")?;
                }
                if let Some(window) = window {
                    write!(f, " on {window}")?;
                }
                Ok(())
            }
            Self::Failed {
                effect,
                window,
                slot,
                error,
            } => write!(f, "failed {effect}/{slot} on {window}: {error}"),
        }
    }
}

/// One configured effect and the handles it owns.
#[derive(Debug)]
struct EffectState {
    /// Configuration.
    spec: EffectSpec,
    /// Live handles of this effect.
    registry: HandleRegistry,
}

/// Engine access shared by every effect while one event is processed.
struct Ops<'a> {
    /// Animation engine.
    engine: &'a dyn AnimationEngine,
    /// Global duration factor.
    duration_scale: f64,
}

impl Ops<'_> {
    /// Resolve and validate `template` for `window`.
    ///
    /// Runs before any engine call so a bad template leaves every slot untouched.
    fn prepare(
        &self,
        effect: &str,
        window: &WorldWindow,
        slot: &Slot,
        template: &AnimationSpec,
        keep_alive_default: bool,
    ) -> Result<AnimationDescriptor, Outcome> {
        let descriptor = AnimationDescriptor::from_template(
            window,
            template,
            keep_alive_default,
            self.duration_scale,
        );
        descriptor.validate().map_err(|e| {
            warn!(effect, window = %window.id, slot = %slot, error = %e, "rejecting animation");
            Outcome::Failed {
                effect: effect.to_string(),
                window: window.id,
                slot: slot.clone(),
                error: Error::InvalidDescriptor(e),
            }
        })?;
        Ok(descriptor)
    }

    /// Submit `descriptor` into `slot`, canceling the slot's live handle first.
    fn submit(
        &self,
        state: &mut EffectState,
        slot: Slot,
        descriptor: &AnimationDescriptor,
        out: &mut Vec<Outcome>,
    ) {
        let effect = &state.spec.name;
        let window = descriptor.window;
        if let Some(old) = state.registry.clear(window, &slot) {
            out.push(self.cancel_handle(effect, window, slot.clone(), old));
        }
        match self.engine.submit(descriptor) {
            Ok(handle) => {
                if let Some(displaced) = state.registry.set(window, slot.clone(), handle) {
                    self.engine.cancel(displaced);
                }
                out.push(Outcome::Started {
                    effect: effect.clone(),
                    window,
                    slot,
                    handle,
                });
            }
            Err(source) => {
                warn!(effect = %effect, window = %window, slot = %slot, error = %source, "engine refused animation");
                out.push(Outcome::Failed {
                    effect: effect.clone(),
                    window,
                    slot: slot.clone(),
                    error: Error::EngineSubmissionFailed {
                        window,
                        slot,
                        source,
                    },
                });
            }
        }
    }

    /// Validate then submit `template` on `window`, superseding the slot.
    fn start(
        &self,
        state: &mut EffectState,
        window: &WorldWindow,
        slot: Slot,
        template: &AnimationSpec,
        keep_alive_default: bool,
        out: &mut Vec<Outcome>,
    ) {
        match self.prepare(&state.spec.name, window, &slot, template, keep_alive_default) {
            Ok(descriptor) => self.submit(state, slot, &descriptor, out),
            Err(failed) => out.push(failed),
        }
    }

    /// Cancel an already-cleared handle.
    fn cancel_handle(
        &self,
        effect: &str,
        window: WindowId,
        slot: Slot,
        handle: AnimationHandle,
    ) -> Outcome {
        if self.engine.cancel(handle) {
            Outcome::Canceled {
                effect: effect.to_string(),
                window,
                slot,
                handle,
            }
        } else {
            trace!(effect, window = %window, slot = %slot, handle = %handle, "cancel of finished handle");
            Outcome::Skipped {
                effect: Some(effect.to_string()),
                window: Some(window),
                reason: SkipReason::Stale,
            }
        }
    }

    /// Cancel and clear the slot if it holds a live handle.
    fn cancel_slot(&self, state: &mut EffectState, window: WindowId, slot: &Slot) -> Option<Outcome> {
        let handle = state.registry.clear(window, slot)?;
        Some(self.cancel_handle(&state.spec.name, window, slot.clone(), handle))
    }

    /// Retarget the handle stored in `slot`. A stale handle is cleared and
    /// reported as skipped.
    fn retarget_slot(
        &self,
        state: &mut EffectState,
        window: WindowId,
        slot: &Slot,
        to: f64,
        duration: Duration,
    ) -> Option<Outcome> {
        let handle = state.registry.get(window, slot)?;
        let effect = state.spec.name.clone();
        if self
            .engine
            .retarget(handle, to, scale_duration(duration, self.duration_scale))
        {
            return Some(Outcome::Retargeted {
                effect,
                window,
                slot: slot.clone(),
                handle,
            });
        }
        state.registry.clear(window, slot);
        Some(Outcome::Skipped {
            effect: Some(effect),
            window: Some(window),
            reason: SkipReason::Stale,
        })
    }
}

/// Per-window animation lifecycle controller.
///
/// The controller owns one [`HandleRegistry`] per configured effect, so two
/// effects reacting to the same window never supersede each other. All
/// state is mutated through `&mut self`; wrap it in a
/// [`ControllerService`](crate::ControllerService) to feed it from async code.
pub struct Controller {
    /// Host world, used for stacking-order snapshots.
    world: Arc<dyn WorldView>,
    /// Animation engine.
    engine: Arc<dyn AnimationEngine>,
    /// Global duration factor.
    duration_scale: f64,
    /// Effects in configuration order.
    effects: Vec<EffectState>,
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("duration_scale", &self.duration_scale)
            .field("effects", &self.effects)
            .finish_non_exhaustive()
    }
}

impl Controller {
    /// Build a controller over injected collaborators.
    pub fn new(
        world: Arc<dyn WorldView>,
        engine: Arc<dyn AnimationEngine>,
        config: EffectsConfig,
    ) -> Self {
        let effects = config
            .effects
            .into_iter()
            .map(|spec| EffectState {
                spec,
                registry: HandleRegistry::new(),
            })
            .collect::<Vec<_>>();
        info!(
            effects = effects.len(),
            enabled = effects.iter().filter(|e| e.spec.enabled).count(),
            duration_scale = config.duration_scale,
            "controller ready"
        );
        Self {
            world,
            engine,
            duration_scale: config.duration_scale,
            effects,
        }
    }

    /// Subscribe to the world this controller serves.
    pub fn subscribe(&self) -> EventCursor {
        self.world.subscribe()
    }

    /// Process every event currently buffered in `cursor`.
    ///
    /// When the subscription dropped events since the last drain, the
    /// registries are reconciled against the world afterwards.
    pub fn drain(&mut self, cursor: &mut EventCursor) -> Vec<Outcome> {
        let lost_before = cursor.lost_count;
        let mut out = Vec::new();
        while let Some(event) = cursor.try_next() {
            out.extend(self.handle_event(&event));
        }
        if cursor.lost_count > lost_before {
            warn!(
                lost = cursor.lost_count - lost_before,
                "world events dropped, reconciling registries"
            );
            out.extend(self.reconcile());
        }
        out
    }

    /// Drop slot entries of windows the world no longer knows.
    ///
    /// Needed after a subscription lost events, since a lost `Deleted` would
    /// otherwise leave entries behind. No engine calls are made.
    pub fn reconcile(&mut self) -> Vec<Outcome> {
        let tracked: BTreeSet<WindowId> = self
            .effects
            .iter()
            .flat_map(|s| s.registry.windows())
            .collect();
        let mut out = Vec::new();
        for window in tracked {
            if self.world.get(window).is_some() {
                continue;
            }
            let count: usize = self
                .effects
                .iter_mut()
                .map(|s| s.registry.clear_all(window))
                .sum();
            out.push(Outcome::Cleared { window, count });
        }
        for outcome in &out {
            log_outcome(outcome);
        }
        debug!(cleared = out.len(), "registries reconciled");
        out
    }

    /// React to one world event, evaluating effects in configuration order.
    pub fn handle_event(&mut self, event: &WorldEvent) -> Vec<Outcome> {
        trace!(kind = ?event.kind(), window = ?event.window_id(), "handle_event");
        let mut out = Vec::new();
        let ops = Ops {
            engine: self.engine.as_ref(),
            duration_scale: self.duration_scale,
        };
        match event {
            WorldEvent::Added(window) => {
                for state in self.effects.iter_mut().filter(|s| s.spec.enabled) {
                    on_added(&ops, state, window, &mut out);
                }
            }
            WorldEvent::Closed(window) => {
                for state in self.effects.iter_mut().filter(|s| s.spec.enabled) {
                    on_closed(&ops, state, window, &mut out);
                }
            }
            WorldEvent::PropertyChanged { window, property } => {
                for state in self.effects.iter_mut().filter(|s| s.spec.enabled) {
                    on_property(&ops, state, window, *property, &mut out);
                }
            }
            WorldEvent::DesktopChanged { old, new } => {
                let snapshot = self.world.stacking_order();
                debug!(old, new, windows = snapshot.len(), "desktop changed");
                for state in self.effects.iter_mut().filter(|s| s.spec.enabled) {
                    on_desktop(&ops, state, &snapshot, &mut out);
                }
            }
            WorldEvent::Deleted(window) => {
                let count: usize = self
                    .effects
                    .iter_mut()
                    .map(|s| s.registry.clear_all(*window))
                    .sum();
                out.push(Outcome::Cleared {
                    window: *window,
                    count,
                });
            }
        }
        if out.is_empty() {
            out.push(Outcome::Skipped {
                effect: None,
                window: event.window_id(),
                reason: SkipReason::NoRule,
            });
        }
        for outcome in &out {
            log_outcome(outcome);
        }
        out
    }

    /// Route an engine completion to the slot that owns `handle`.
    pub fn on_completed(&mut self, handle: AnimationHandle) -> Outcome {
        let outcome = self
            .effects
            .iter_mut()
            .find_map(|state| {
                let (window, slot) = state.registry.complete(handle)?;
                Some(Outcome::Completed {
                    effect: state.spec.name.clone(),
                    window,
                    slot,
                    handle,
                })
            })
            .unwrap_or(Outcome::Skipped {
                effect: None,
                window: None,
                reason: SkipReason::Stale,
            });
        log_outcome(&outcome);
        outcome
    }

    /// Enable or disable an effect at runtime. Disabling cancels every live
    /// animation the effect owns.
    pub fn set_enabled(&mut self, effect: &str, enabled: bool) -> Option<Vec<Outcome>> {
        let state = self.effects.iter_mut().find(|s| s.spec.name == effect)?;
        state.spec.enabled = enabled;
        let mut out = Vec::new();
        if !enabled {
            let ops = Ops {
                engine: self.engine.as_ref(),
                duration_scale: self.duration_scale,
            };
            for handle in state.registry.handles() {
                if let Some((window, slot)) = state.registry.complete(handle) {
                    out.push(ops.cancel_handle(effect, window, slot, handle));
                }
            }
        }
        info!(effect, enabled, canceled = out.len(), "effect toggled");
        Some(out)
    }

    /// Live handle of `effect` for `(window, slot)`.
    pub fn handle(&self, effect: &str, window: WindowId, slot: &Slot) -> Option<AnimationHandle> {
        self.registry(effect)?.get(window, slot)
    }

    /// Handle registry of `effect`.
    pub fn registry(&self, effect: &str) -> Option<&HandleRegistry> {
        self.effects
            .iter()
            .find(|s| s.spec.name == effect)
            .map(|s| &s.registry)
    }

    /// Live handles across all effects.
    pub fn live_count(&self) -> usize {
        self.effects.iter().map(|s| s.registry.len()).sum()
    }

    /// Configured effect names, in order.
    pub fn effect_names(&self) -> Vec<&str> {
        self.effects.iter().map(|s| s.spec.name.as_str()).collect()
    }
}

/// Emit one outcome at a level matching its weight.
fn log_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Failed { .. } => warn!(%outcome, "animation outcome"),
        Outcome::Skipped { .. } => trace!(%outcome, "animation outcome"),
        _ => debug!(%outcome, "animation outcome"),
    }
}

/// Classification gate shared by the per-window triggers.
fn window_matches(state: &EffectState, window: &WorldWindow, out: &mut Vec<Outcome>) -> bool {
    if state.spec.windows.matches(&window.class) {
        return true;
    }
    out.push(Outcome::Skipped {
        effect: Some(state.spec.name.clone()),
        window: Some(window.id),
        reason: SkipReason::ClassificationMismatch,
    });
    false
}

/// Entrance: supersede the exit slot, then start the entrance animation.
fn on_added(ops: &Ops<'_>, state: &mut EffectState, window: &WorldWindow, out: &mut Vec<Outcome>) {
    let Some(template) = state.spec.added.clone() else {
        return;
    };
    let slots = (
        Slot::from(state.spec.entrance_slot()),
        Slot::from(state.spec.exit_slot()),
    );
    transition_in(ops, state, window, slots, &template, false, out);
}

/// Exit: supersede the entrance slot, then start the exit animation.
fn on_closed(ops: &Ops<'_>, state: &mut EffectState, window: &WorldWindow, out: &mut Vec<Outcome>) {
    let Some(template) = state.spec.closed.clone() else {
        return;
    };
    let slots = (
        Slot::from(state.spec.exit_slot()),
        Slot::from(state.spec.entrance_slot()),
    );
    transition_in(ops, state, window, slots, &template, true, out);
}

/// Shared body of the entrance and exit triggers; `slots` is (own, opposite).
fn transition_in(
    ops: &Ops<'_>,
    state: &mut EffectState,
    window: &WorldWindow,
    (own, opposite): (Slot, Slot),
    template: &AnimationSpec,
    keep_alive_default: bool,
    out: &mut Vec<Outcome>,
) {
    if !window_matches(state, window, out) {
        return;
    }
    let descriptor =
        match ops.prepare(&state.spec.name, window, &own, template, keep_alive_default) {
            Ok(descriptor) => descriptor,
            Err(failed) => {
                out.push(failed);
                return;
            }
        };
    if state.spec.supersede && opposite != own {
        out.extend(ops.cancel_slot(state, window.id, &opposite));
    }
    ops.submit(state, own, &descriptor, out);
}

/// Property rule: retarget or start when set, apply the unset action when cleared.
fn on_property(
    ops: &Ops<'_>,
    state: &mut EffectState,
    window: &WorldWindow,
    property: WindowProperty,
    out: &mut Vec<Outcome>,
) {
    let Some(rule) = state.spec.property_rule(property).cloned() else {
        return;
    };
    if !window_matches(state, window, out) {
        return;
    }
    let slot = Slot::from(rule.slot());
    if window.property(property) {
        on_property_set(ops, state, window, &rule, slot, out);
        return;
    }
    let outcome = match rule.on_unset {
        UnsetAction::Cancel => ops.cancel_slot(state, window.id, &slot),
        UnsetAction::Retarget(r) => ops.retarget_slot(state, window.id, &slot, r.to, r.duration),
        UnsetAction::Ignore => None,
    };
    out.push(outcome.unwrap_or(Outcome::Skipped {
        effect: Some(state.spec.name.clone()),
        window: Some(window.id),
        reason: SkipReason::NoRule,
    }));
}

/// The property became true.
fn on_property_set(
    ops: &Ops<'_>,
    state: &mut EffectState,
    window: &WorldWindow,
    rule: &PropertyRule,
    slot: Slot,
    out: &mut Vec<Outcome>,
) {
    if let Some(r) = rule.retarget {
        match ops.retarget_slot(state, window.id, &slot, r.to, r.duration) {
            Some(outcome @ Outcome::Retargeted { .. }) => {
                out.push(outcome);
                return;
            }
            // The handle had already finished; fall through to a fresh start.
            Some(stale) => out.push(stale),
            None => {}
        }
    }
    ops.start(state, window, slot, &rule.animation, false, out);
}

/// Desktop switch: one animation per matching window of the snapshot.
fn on_desktop(
    ops: &Ops<'_>,
    state: &mut EffectState,
    snapshot: &[WorldWindow],
    out: &mut Vec<Outcome>,
) {
    let Some(template) = state.spec.desktop_changed.clone() else {
        return;
    };
    let slot = Slot::from(state.spec.desktop_slot());
    for window in snapshot {
        if window_matches(state, window, out) {
            ops.start(state, window, slot.clone(), &template, false, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use config::{TargetProperty, Transition, WindowMatch};
    use glide_world::World;

    use super::*;
    use crate::MockEngine;

    fn fade_effect(name: &str) -> EffectSpec {
        let t = Transition::new(TargetProperty::Opacity, 1.0, Duration::from_millis(100));
        EffectSpec {
            added: Some(AnimationSpec::new(vec![t.clone()])),
            closed: Some(AnimationSpec::new(vec![t])),
            ..EffectSpec::named(name)
        }
    }

    fn controller(effects: Vec<EffectSpec>) -> (Controller, Arc<MockEngine>) {
        let engine = Arc::new(MockEngine::new());
        let cfg = EffectsConfig {
            duration_scale: 1.0,
            effects,
        };
        (
            Controller::new(Arc::new(World::default()), engine.clone(), cfg),
            engine,
        )
    }

    #[test]
    fn effects_keep_separate_registries() {
        let (mut ctl, engine) = controller(vec![fade_effect("a"), fade_effect("b")]);
        let w = WorldWindow::new(1, "x");
        let out = ctl.handle_event(&WorldEvent::Added(w));
        assert_eq!(out.iter().filter_map(Outcome::started_handle).count(), 2);
        assert_eq!(engine.call_names(), vec!["submit", "submit"]);
        assert_eq!(ctl.live_count(), 2);
    }

    #[test]
    fn unhandled_event_reports_no_rule() {
        let (mut ctl, engine) = controller(vec![fade_effect("a")]);
        let out = ctl.handle_event(&WorldEvent::DesktopChanged { old: 1, new: 2 });
        assert!(matches!(
            out.as_slice(),
            [Outcome::Skipped {
                reason: SkipReason::NoRule,
                ..
            }]
        ));
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn disabling_an_effect_cancels_its_handles() {
        let (mut ctl, engine) = controller(vec![fade_effect("a")]);
        ctl.handle_event(&WorldEvent::Added(WorldWindow::new(1, "x")));
        ctl.handle_event(&WorldEvent::Added(WorldWindow::new(2, "x")));
        let out = ctl.set_enabled("a", false).unwrap();
        assert_eq!(out.len(), 2);
        assert!(engine.live().is_empty());
        assert_eq!(ctl.live_count(), 0);
        let out = ctl.handle_event(&WorldEvent::Added(WorldWindow::new(3, "x")));
        assert!(matches!(out[0], Outcome::Skipped { .. }));
        assert!(ctl.set_enabled("missing", true).is_none());
    }

    #[test]
    fn classification_is_exact() {
        let mut effect = fade_effect("a");
        effect.windows = WindowMatch::Classes(vec!["konsole".into()]);
        let (mut ctl, engine) = controller(vec![effect]);
        let out = ctl.handle_event(&WorldEvent::Added(WorldWindow::new(1, "konsole2")));
        assert!(matches!(
            out[0],
            Outcome::Skipped {
                reason: SkipReason::ClassificationMismatch,
                ..
            }
        ));
        assert_eq!(engine.submit_count(), 0);
    }
}
