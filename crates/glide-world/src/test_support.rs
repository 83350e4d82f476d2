//! Minimal test support utilities for `glide-world` consumers.

use crate::{EventCursor, WorldEvent, WorldWindow};

/// Build a plain window with a caption derived from its id.
#[must_use]
pub fn window(id: u64, class: &str) -> WorldWindow {
    WorldWindow::new(id, class).with_caption(format!("window {id}"))
}

/// Drain `cursor`, returning only the event kinds, in order.
pub fn drain_kinds(cursor: &mut EventCursor) -> Vec<crate::EventKind> {
    cursor.drain().iter().map(WorldEvent::kind).collect()
}
