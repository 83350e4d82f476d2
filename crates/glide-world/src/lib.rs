//! glide-world: the compositing host's window world as seen by effects.
//!
//! Provides window snapshots, the [`WorldEvent`] stream with filtered
//! subscriptions, and [`World`], an in-memory host model that owns the
//! stacking order and publishes lifecycle notifications in arrival order.
#![warn(missing_docs)]

use std::{fmt, mem};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

mod events;
pub mod test_support;
mod view;

pub use events::{EventCursor, EventFilter, filter_kinds};
pub use glide_ids::WindowId;
pub use view::WorldView;

use events::{DEFAULT_EVENT_CAPACITY, EventHub};

/// Snapshot of a single window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldWindow {
    /// Host-assigned identity.
    pub id: WindowId,
    /// Classification string (window class) used for effect matching.
    pub class: String,
    /// Human-readable caption.
    #[serde(default)]
    pub caption: String,
    /// Whether the window is currently minimized.
    #[serde(default)]
    pub minimized: bool,
    /// Whether the window is eligible for the fullscreen presentation path.
    #[serde(default)]
    pub fullscreen: bool,
    /// Virtual desktop the window lives on.
    #[serde(default = "default_desktop")]
    pub desktop: u32,
}

/// Desktops are numbered from one.
const fn default_desktop() -> u32 {
    1
}

impl WorldWindow {
    /// Create a window with the given id and classification.
    pub fn new(id: impl Into<WindowId>, class: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            class: class.into(),
            caption: String::new(),
            minimized: false,
            fullscreen: false,
            desktop: default_desktop(),
        }
    }

    /// Set the caption.
    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    /// Mark the window fullscreen-eligible.
    #[must_use]
    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    /// Place the window on a desktop.
    #[must_use]
    pub fn on_desktop(mut self, desktop: u32) -> Self {
        self.desktop = desktop;
        self
    }

    /// Current value of a boolean window property.
    #[must_use]
    pub const fn property(&self, property: WindowProperty) -> bool {
        match property {
            WindowProperty::Minimized => self.minimized,
            WindowProperty::Fullscreen => self.fullscreen,
        }
    }
}

/// Boolean window properties whose changes are published.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowProperty {
    /// The minimized flag.
    Minimized,
    /// The fullscreen flag.
    Fullscreen,
}

impl fmt::Display for WindowProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Minimized => "minimized",
            Self::Fullscreen => "fullscreen",
        })
    }
}

/// World events stream payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorldEvent {
    /// A window was added (or re-shown) by the host.
    Added(WorldWindow),
    /// A window was closed; it may still be on screen while animating out.
    Closed(WorldWindow),
    /// The host destroyed the window; nothing may reference it any more.
    Deleted(WindowId),
    /// A boolean property changed; `window` carries the new value.
    PropertyChanged {
        /// Window snapshot after the change.
        window: WorldWindow,
        /// Which property changed.
        property: WindowProperty,
    },
    /// The current desktop changed.
    DesktopChanged {
        /// Previous desktop.
        old: u32,
        /// New desktop.
        new: u32,
    },
}

/// Discriminant of a [`WorldEvent`], used for subscription filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`WorldEvent::Added`].
    Added,
    /// [`WorldEvent::Closed`].
    Closed,
    /// [`WorldEvent::Deleted`].
    Deleted,
    /// [`WorldEvent::PropertyChanged`].
    PropertyChanged,
    /// [`WorldEvent::DesktopChanged`].
    DesktopChanged,
}

impl WorldEvent {
    /// The kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Added(_) => EventKind::Added,
            Self::Closed(_) => EventKind::Closed,
            Self::Deleted(_) => EventKind::Deleted,
            Self::PropertyChanged { .. } => EventKind::PropertyChanged,
            Self::DesktopChanged { .. } => EventKind::DesktopChanged,
        }
    }

    /// The window this event is about, if it concerns a single window.
    #[must_use]
    pub const fn window_id(&self) -> Option<WindowId> {
        match self {
            Self::Added(w) | Self::Closed(w) | Self::PropertyChanged { window: w, .. } => {
                Some(w.id)
            }
            Self::Deleted(id) => Some(*id),
            Self::DesktopChanged { .. } => None,
        }
    }
}

/// Configuration for the world model.
#[derive(Clone, Debug)]
pub struct WorldCfg {
    /// Per-subscriber event buffer capacity.
    pub event_capacity: usize,
    /// Desktop that is current at startup.
    pub initial_desktop: u32,
}

impl Default for WorldCfg {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            initial_desktop: default_desktop(),
        }
    }
}

/// One window tracked by the world, plus host-side bookkeeping.
#[derive(Clone, Debug)]
struct Entry {
    /// Latest snapshot.
    window: WorldWindow,
    /// Closed but not yet deleted.
    closed: bool,
}

/// Mutable world state guarded by one lock.
#[derive(Debug, Default)]
struct WorldState {
    /// Windows in stacking order, bottom first.
    stack: Vec<Entry>,
    /// Current desktop.
    desktop: u32,
}

impl WorldState {
    /// Index of `id` in the stacking order.
    fn position(&self, id: WindowId) -> Option<usize> {
        self.stack.iter().position(|e| e.window.id == id)
    }

    /// Mutable entry for `id`.
    fn entry_mut(&mut self, id: WindowId) -> Option<&mut Entry> {
        self.stack.iter_mut().find(|e| e.window.id == id)
    }
}

/// In-memory compositing host model.
///
/// Every mutator publishes the corresponding [`WorldEvent`] after the state
/// lock is released, so subscribers always observe a consistent world when
/// they react.
pub struct World {
    /// Window state.
    state: Mutex<WorldState>,
    /// Event fan-out.
    events: EventHub,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldCfg::default())
    }
}

impl World {
    /// Create an empty world.
    pub fn new(cfg: WorldCfg) -> Self {
        Self {
            state: Mutex::new(WorldState {
                stack: Vec::new(),
                desktop: cfg.initial_desktop,
            }),
            events: EventHub::new(cfg.event_capacity),
        }
    }

    /// Add a window on top of the stacking order and publish `Added`.
    ///
    /// Re-adding a window that is closed but not yet deleted re-shows it: the
    /// entry is refreshed, raised, and `Added` is published again. Adding a
    /// window that is already open is ignored.
    pub fn add_window(&self, window: WorldWindow) -> bool {
        let snapshot = {
            let mut st = self.state.lock();
            match st.position(window.id) {
                Some(idx) if !st.stack[idx].closed => {
                    debug!(window = %window.id, "add_window: already open");
                    return false;
                }
                Some(idx) => {
                    st.stack.remove(idx);
                }
                None => {}
            }
            st.stack.push(Entry {
                window: window.clone(),
                closed: false,
            });
            window
        };
        trace!(window = %snapshot.id, class = %snapshot.class, "window_added");
        self.events.publish(&WorldEvent::Added(snapshot));
        true
    }

    /// Mark a window closed and publish `Closed`.
    ///
    /// The window stays in the stacking order until [`World::delete_window`].
    pub fn close_window(&self, id: WindowId) -> Option<WorldWindow> {
        let snapshot = {
            let mut st = self.state.lock();
            let entry = st.entry_mut(id)?;
            if entry.closed {
                return None;
            }
            entry.closed = true;
            entry.window.clone()
        };
        trace!(window = %id, "window_closed");
        self.events.publish(&WorldEvent::Closed(snapshot.clone()));
        Some(snapshot)
    }

    /// Destroy a window and publish `Deleted`.
    pub fn delete_window(&self, id: WindowId) -> bool {
        {
            let mut st = self.state.lock();
            let Some(idx) = st.position(id) else {
                return false;
            };
            st.stack.remove(idx);
        }
        trace!(window = %id, "window_deleted");
        self.events.publish(&WorldEvent::Deleted(id));
        true
    }

    /// Set the minimized flag, publishing `PropertyChanged` when it changes.
    pub fn set_minimized(&self, id: WindowId, minimized: bool) -> bool {
        self.set_property(id, WindowProperty::Minimized, minimized)
    }

    /// Set the fullscreen flag, publishing `PropertyChanged` when it changes.
    pub fn set_fullscreen(&self, id: WindowId, fullscreen: bool) -> bool {
        self.set_property(id, WindowProperty::Fullscreen, fullscreen)
    }

    /// Shared implementation of the boolean property setters.
    fn set_property(&self, id: WindowId, property: WindowProperty, value: bool) -> bool {
        let snapshot = {
            let mut st = self.state.lock();
            let Some(entry) = st.entry_mut(id) else {
                return false;
            };
            let slot = match property {
                WindowProperty::Minimized => &mut entry.window.minimized,
                WindowProperty::Fullscreen => &mut entry.window.fullscreen,
            };
            if *slot == value {
                return false;
            }
            *slot = value;
            entry.window.clone()
        };
        trace!(window = %id, %property, value, "property_changed");
        self.events.publish(&WorldEvent::PropertyChanged {
            window: snapshot,
            property,
        });
        true
    }

    /// Switch the current desktop, publishing `DesktopChanged` when it changes.
    pub fn switch_desktop(&self, new: u32) -> bool {
        let old = {
            let mut st = self.state.lock();
            if st.desktop == new {
                return false;
            }
            mem::replace(&mut st.desktop, new)
        };
        debug!(old, new, "desktop_changed");
        self.events
            .publish(&WorldEvent::DesktopChanged { old, new });
        true
    }

    /// Move a window to the top of the stacking order.
    pub fn raise(&self, id: WindowId) -> bool {
        let mut st = self.state.lock();
        let Some(idx) = st.position(id) else {
            return false;
        };
        let entry = st.stack.remove(idx);
        st.stack.push(entry);
        true
    }

    /// True when the window was closed but not yet deleted.
    #[must_use]
    pub fn is_closed(&self, id: WindowId) -> bool {
        self.state
            .lock()
            .stack
            .iter()
            .any(|e| e.window.id == id && e.closed)
    }

    /// Ids of windows that are closed but still waiting for deletion.
    #[must_use]
    pub fn closed_windows(&self) -> Vec<WindowId> {
        self.state
            .lock()
            .stack
            .iter()
            .filter(|e| e.closed)
            .map(|e| e.window.id)
            .collect()
    }

    /// Number of open subscriptions.
    #[must_use]
    pub fn subscriptions(&self) -> usize {
        self.events.subscriber_count()
    }
}

impl WorldView for World {
    fn subscribe_filtered(&self, filter: Option<EventFilter>) -> EventCursor {
        self.events.subscribe(filter)
    }

    fn stacking_order(&self) -> Vec<WorldWindow> {
        self.state
            .lock()
            .stack
            .iter()
            .map(|e| e.window.clone())
            .collect()
    }

    fn get(&self, id: WindowId) -> Option<WorldWindow> {
        self.state
            .lock()
            .stack
            .iter()
            .find(|e| e.window.id == id)
            .map(|e| e.window.clone())
    }

    fn current_desktop(&self) -> u32 {
        self.state.lock().desktop
    }
}
