use crate::{EventCursor, EventFilter, WindowId, WorldWindow};

/// Read-only view over the host's window world plus its event stream.
///
/// Effects hold the world behind this trait so tests and alternative hosts
/// can be injected without touching controller code.
pub trait WorldView: Send + Sync {
    /// Subscribe with an optional filter applied before events enter the ring buffer.
    fn subscribe_filtered(&self, filter: Option<EventFilter>) -> EventCursor;

    /// Owned snapshot of the stacking order, bottom first.
    ///
    /// The snapshot is taken once; later world changes do not affect it.
    fn stacking_order(&self) -> Vec<WorldWindow>;

    /// Resolve a window by id.
    fn get(&self, id: WindowId) -> Option<WorldWindow>;

    /// Current desktop number.
    fn current_desktop(&self) -> u32;

    /// Subscribe to every [`crate::WorldEvent`].
    fn subscribe(&self) -> EventCursor {
        self.subscribe_filtered(None)
    }

    /// Windows of the stacking order that live on `desktop`.
    fn windows_on_desktop(&self, desktop: u32) -> Vec<WorldWindow> {
        self.stacking_order()
            .into_iter()
            .filter(|w| w.desktop == desktop)
            .collect()
    }

    /// Topmost window, if any.
    fn topmost(&self) -> Option<WorldWindow> {
        self.stacking_order().pop()
    }
}
