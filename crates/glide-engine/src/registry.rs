//! Per-window animation handle bookkeeping.

use std::collections::{BTreeMap, HashMap};

use glide_ids::{AnimationHandle, WindowId};

use crate::Slot;

/// Tracks the single live animation handle of every (window, slot) pair.
///
/// The registry never talks to an engine: displaced or cleared handles are
/// returned to the caller, which decides whether to cancel them.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    /// Slots per window, ordered by slot name.
    windows: HashMap<WindowId, BTreeMap<Slot, AnimationHandle>>,
    /// Reverse index used to route completions.
    owners: HashMap<AnimationHandle, (WindowId, Slot)>,
}

impl HandleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handle` for `(window, slot)`, returning the handle it displaced.
    pub fn set(
        &mut self,
        window: WindowId,
        slot: Slot,
        handle: AnimationHandle,
    ) -> Option<AnimationHandle> {
        let displaced = self
            .windows
            .entry(window)
            .or_default()
            .insert(slot.clone(), handle);
        if let Some(old) = displaced {
            self.owners.remove(&old);
        }
        self.owners.insert(handle, (window, slot));
        displaced
    }

    /// Live handle for `(window, slot)`.
    pub fn get(&self, window: WindowId, slot: &Slot) -> Option<AnimationHandle> {
        self.windows.get(&window)?.get(slot).copied()
    }

    /// Remove the entry for `(window, slot)` without canceling it.
    pub fn clear(&mut self, window: WindowId, slot: &Slot) -> Option<AnimationHandle> {
        let slots = self.windows.get_mut(&window)?;
        let handle = slots.remove(slot)?;
        if slots.is_empty() {
            self.windows.remove(&window);
        }
        self.owners.remove(&handle);
        Some(handle)
    }

    /// Remove every entry of `window`, returning how many were removed.
    pub fn clear_all(&mut self, window: WindowId) -> usize {
        let Some(slots) = self.windows.remove(&window) else {
            return 0;
        };
        for handle in slots.values() {
            self.owners.remove(handle);
        }
        slots.len()
    }

    /// Which (window, slot) currently holds `handle`.
    pub fn locate(&self, handle: AnimationHandle) -> Option<(WindowId, Slot)> {
        self.owners.get(&handle).cloned()
    }

    /// Clear the slot owning `handle`, if it still holds exactly that handle.
    pub fn complete(&mut self, handle: AnimationHandle) -> Option<(WindowId, Slot)> {
        let (window, slot) = self.locate(handle)?;
        self.clear(window, &slot)?;
        Some((window, slot))
    }

    /// Occupied slots of `window`, ordered by slot name.
    pub fn slots(&self, window: WindowId) -> Vec<(Slot, AnimationHandle)> {
        self.windows
            .get(&window)
            .map(|slots| slots.iter().map(|(s, h)| (s.clone(), *h)).collect())
            .unwrap_or_default()
    }

    /// Windows with at least one occupied slot, in id order.
    pub fn windows(&self) -> Vec<WindowId> {
        let mut out: Vec<_> = self.windows.keys().copied().collect();
        out.sort_unstable();
        out
    }

    /// Every live handle.
    pub fn handles(&self) -> Vec<AnimationHandle> {
        let mut out: Vec<_> = self.owners.keys().copied().collect();
        out.sort_unstable();
        out
    }

    /// Number of occupied slots across all windows.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// True when no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(raw: u64) -> AnimationHandle {
        AnimationHandle::new(raw)
    }

    #[test]
    fn set_returns_displaced_handle() {
        let mut reg = HandleRegistry::new();
        let w = WindowId::new(1);
        assert_eq!(reg.set(w, Slot::ENTRANCE, h(1)), None);
        assert_eq!(reg.set(w, Slot::ENTRANCE, h(2)), Some(h(1)));
        assert_eq!(reg.get(w, &Slot::ENTRANCE), Some(h(2)));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.locate(h(1)), None);
    }

    #[test]
    fn complete_ignores_stale_handles() {
        let mut reg = HandleRegistry::new();
        let w = WindowId::new(1);
        reg.set(w, Slot::EXIT, h(1));
        reg.set(w, Slot::EXIT, h(2));
        assert_eq!(reg.complete(h(1)), None);
        assert_eq!(reg.get(w, &Slot::EXIT), Some(h(2)));
        assert_eq!(reg.complete(h(2)), Some((w, Slot::EXIT)));
        assert!(reg.is_empty());
    }

    #[test]
    fn clear_all_drops_every_slot_of_one_window() {
        let mut reg = HandleRegistry::new();
        let (a, b) = (WindowId::new(1), WindowId::new(2));
        reg.set(a, Slot::ENTRANCE, h(1));
        reg.set(a, Slot::MINIMIZE, h(2));
        reg.set(b, Slot::ENTRANCE, h(3));
        assert_eq!(reg.windows(), vec![a, b]);
        assert_eq!(reg.clear_all(a), 2);
        assert_eq!(reg.clear_all(a), 0);
        assert_eq!(reg.windows(), vec![b]);
        assert!(reg.slots(a).is_empty());
        assert_eq!(reg.slots(b), vec![(Slot::ENTRANCE, h(3))]);
        assert_eq!(reg.handles(), vec![h(3)]);
    }

    #[test]
    fn clear_returns_handle_once() {
        let mut reg = HandleRegistry::new();
        let w = WindowId::new(7);
        reg.set(w, Slot::DESKTOP, h(9));
        assert_eq!(reg.clear(w, &Slot::DESKTOP), Some(h(9)));
        assert_eq!(reg.clear(w, &Slot::DESKTOP), None);
        assert!(reg.is_empty());
    }
}
