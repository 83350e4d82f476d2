use std::{
    collections::VecDeque,
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use parking_lot::Mutex;
use tokio::{
    sync::Notify,
    time::{Instant as TokioInstant, timeout_at},
};

use crate::{EventKind, WorldEvent};

/// Default per-subscriber event ring capacity.
pub(crate) const DEFAULT_EVENT_CAPACITY: usize = 4_096;

/// Predicate applied to events before they enter a subscriber's ring buffer.
pub type EventFilter = Arc<dyn Fn(&WorldEvent) -> bool + Send + Sync>;

/// Build a filter accepting only the listed event kinds.
pub fn filter_kinds(kinds: &[EventKind]) -> EventFilter {
    let kinds = kinds.to_vec();
    Arc::new(move |event: &WorldEvent| kinds.contains(&event.kind()))
}

/// One buffered event tagged with its global sequence number.
struct EventEntry {
    /// Global publish sequence.
    seq: u64,
    /// The buffered event.
    event: WorldEvent,
}

/// Bounded FIFO that drops the oldest entry on overflow.
struct EventBuffer {
    /// Pending events, oldest first.
    events: VecDeque<EventEntry>,
    /// Number of events dropped because the buffer was full.
    lost_count: u64,
    /// Sequence of the oldest retained event.
    head_seq: u64,
    /// Sequence the next pushed event is expected to carry.
    next_seq: u64,
    /// Maximum retained events.
    capacity: usize,
}

impl EventBuffer {
    /// Create an empty buffer positioned at `start_seq`.
    fn new(start_seq: u64, capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            lost_count: 0,
            head_seq: start_seq,
            next_seq: start_seq,
            capacity,
        }
    }

    /// Append an event, evicting the oldest when full.
    fn push(&mut self, seq: u64, event: WorldEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.lost_count = self.lost_count.saturating_add(1);
        }
        self.events.push_back(EventEntry { seq, event });
        self.next_seq = seq.saturating_add(1);
        self.head_seq = self
            .events
            .front()
            .map(|entry| entry.seq)
            .unwrap_or(self.next_seq);
    }

    /// Remove the oldest event.
    fn pop(&mut self) -> Option<EventEntry> {
        let entry = self.events.pop_front();
        self.head_seq = self
            .events
            .front()
            .map(|entry| entry.seq)
            .unwrap_or(self.next_seq);
        entry
    }
}

/// Shared state behind one subscription.
struct StreamInner {
    /// Buffered events for this subscriber.
    buffer: Mutex<EventBuffer>,
    /// Wakes async readers when an event arrives or the stream closes.
    notify: Notify,
    /// Set once the subscription has ended.
    closed: AtomicBool,
    /// Optional admission predicate.
    filter: Option<EventFilter>,
}

impl StreamInner {
    /// Create a stream starting at `start_seq`.
    fn new(start_seq: u64, capacity: usize, filter: Option<EventFilter>) -> Arc<Self> {
        Arc::new(Self {
            buffer: Mutex::new(EventBuffer::new(start_seq, capacity)),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            filter,
        })
    }

    /// Buffer `event` if the stream is open and the filter admits it.
    fn push(&self, seq: u64, event: &WorldEvent) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        if let Some(filter) = &self.filter
            && !filter(event)
        {
            return;
        }
        let mut buffer = self.buffer.lock();
        buffer.push(seq, event.clone());
        drop(buffer);
        self.notify.notify_waiters();
    }

    /// Pop the next event and advance the cursor counters.
    fn try_next(&self, cursor_next: &mut u64, cursor_lost: &mut u64) -> Option<WorldEvent> {
        let mut buffer = self.buffer.lock();
        *cursor_lost = buffer.lost_count;
        if *cursor_next < buffer.head_seq {
            *cursor_next = buffer.head_seq;
        }
        let entry = buffer.pop()?;
        *cursor_next = entry.seq.saturating_add(1);
        Some(entry.event)
    }

    /// Close the stream and discard anything still buffered.
    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut buffer = self.buffer.lock();
        buffer.events.clear();
        buffer.head_seq = buffer.next_seq;
        drop(buffer);
        self.notify.notify_waiters();
    }

    /// True once the stream was closed.
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Cursor tracking progress through a subscription stream.
///
/// The cursor is the unsubscribe capability: dropping it, or calling
/// [`EventCursor::unsubscribe`], ends the subscription.
pub struct EventCursor {
    /// Global sequence number of the next event to consume.
    pub next_index: u64,
    /// Total number of events dropped for this cursor due to overflow.
    pub lost_count: u64,
    /// Stream shared with the hub.
    stream: Arc<StreamInner>,
}

impl EventCursor {
    /// Wrap a stream at `start_index`.
    fn new(stream: Arc<StreamInner>, start_index: u64) -> Self {
        Self {
            stream,
            next_index: start_index,
            lost_count: 0,
        }
    }

    /// True when the underlying stream has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.stream.is_closed()
    }

    /// Take the next buffered event without waiting.
    pub fn try_next(&mut self) -> Option<WorldEvent> {
        self.stream
            .try_next(&mut self.next_index, &mut self.lost_count)
    }

    /// Take every buffered event, in arrival order.
    pub fn drain(&mut self) -> Vec<WorldEvent> {
        let mut out = Vec::new();
        while let Some(event) = self.try_next() {
            out.push(event);
        }
        out
    }

    /// Await the next event until `deadline`, returning `None` on timeout or close.
    pub async fn next_until(&mut self, deadline: TokioInstant) -> Option<WorldEvent> {
        let stream = self.stream.clone();
        loop {
            let notified = stream.notify.notified();
            if let Some(event) = self.try_next() {
                return Some(event);
            }
            if stream.is_closed() || TokioInstant::now() >= deadline {
                return None;
            }
            if timeout_at(deadline, notified).await.is_err() {
                return self.try_next();
            }
        }
    }

    /// Await the next event with no deadline, returning `None` once closed.
    pub async fn next(&mut self) -> Option<WorldEvent> {
        let stream = self.stream.clone();
        loop {
            let notified = stream.notify.notified();
            if let Some(event) = self.try_next() {
                return Some(event);
            }
            if stream.is_closed() {
                return None;
            }
            notified.await;
        }
    }

    /// End the subscription explicitly.
    pub fn unsubscribe(self) {
        self.stream.close();
    }
}

impl fmt::Debug for EventCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCursor")
            .field("next_index", &self.next_index)
            .field("lost_count", &self.lost_count)
            .finish_non_exhaustive()
    }
}

impl Drop for EventCursor {
    fn drop(&mut self) {
        // Unsubscribe on drop so the hub stops buffering for a dead reader.
        self.stream.close();
    }
}

/// Lightweight event fan-out with per-subscriber ring buffers.
pub(crate) struct EventHub {
    /// Next publish sequence number.
    seq: AtomicU64,
    /// Per-subscriber ring capacity.
    capacity: usize,
    /// Live subscriber streams.
    subscribers: Mutex<Vec<Weak<StreamInner>>>,
}

impl EventHub {
    /// Create a new hub with the given per-subscriber capacity.
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(8);
        Self {
            seq: AtomicU64::new(0),
            capacity,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe to events, optionally filtered.
    pub(crate) fn subscribe(&self, filter: Option<EventFilter>) -> EventCursor {
        let start = self.seq.load(Ordering::SeqCst);
        let stream = StreamInner::new(start, self.capacity, filter);
        self.subscribers.lock().push(Arc::downgrade(&stream));
        EventCursor::new(stream, start)
    }

    /// Publish an event to all subscribers.
    pub(crate) fn publish(&self, event: &WorldEvent) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let mut stale = false;
        {
            let subscribers = self.subscribers.lock();
            for weak in subscribers.iter() {
                match weak.upgrade() {
                    Some(stream) if !stream.is_closed() => stream.push(seq, event),
                    _ => stale = true,
                }
            }
        }
        if stale {
            self.prune();
        }
    }

    /// Number of open subscriptions.
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .iter()
            .filter(|weak| weak.upgrade().is_some_and(|stream| !stream.is_closed()))
            .count()
    }

    /// Drop subscriptions whose cursor is gone or closed.
    fn prune(&self) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|weak| weak.upgrade().is_some_and(|stream| !stream.is_closed()))
    }
}

impl Drop for EventHub {
    fn drop(&mut self) {
        let subscribers = self.subscribers.lock();
        for weak in subscribers.iter() {
            if let Some(stream) = weak.upgrade() {
                stream.close();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glide_ids::WindowId;

    use super::*;

    #[test]
    fn overflow_drops_oldest_and_counts_loss() {
        let hub = EventHub::new(8);
        let mut cursor = hub.subscribe(None);
        for raw in 0..10 {
            hub.publish(&WorldEvent::Deleted(WindowId::new(raw)));
        }
        let events = cursor.drain();
        assert_eq!(events.len(), 8);
        assert_eq!(cursor.lost_count, 2);
        assert!(matches!(events[0], WorldEvent::Deleted(id) if id.get() == 2));
    }

    #[test]
    fn filter_is_applied_before_buffering() {
        let hub = EventHub::new(16);
        let mut cursor = hub.subscribe(Some(filter_kinds(&[EventKind::DesktopChanged])));
        hub.publish(&WorldEvent::Deleted(WindowId::new(1)));
        hub.publish(&WorldEvent::DesktopChanged { old: 1, new: 2 });
        let events = cursor.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EventKind::DesktopChanged);
    }

    #[test]
    fn dropped_cursor_unsubscribes() {
        let hub = EventHub::new(16);
        let cursor = hub.subscribe(None);
        assert_eq!(hub.subscriber_count(), 1);
        drop(cursor);
        assert_eq!(hub.subscriber_count(), 0);
        hub.publish(&WorldEvent::Deleted(WindowId::new(1)));
        assert!(hub.subscribers.lock().is_empty());
    }

    #[test]
    fn explicit_unsubscribe_closes_stream() {
        let hub = EventHub::new(16);
        let keep = hub.subscribe(None);
        let gone = hub.subscribe(None);
        gone.unsubscribe();
        assert_eq!(hub.subscriber_count(), 1);
        assert!(!keep.is_closed());
    }
}
