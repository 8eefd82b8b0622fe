use std::collections::BTreeMap;

/// Handle to a scheduled callback, valid until it fires or is cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle {
    due_ms: u64,
    seq: u64,
}

impl TimerHandle {
    pub fn due_ms(&self) -> u64 {
        self.due_ms
    }
}

/// Deferred callbacks ordered by deadline, then by scheduling order.
///
/// The queue never reads a clock itself; the owner passes `now` in, which keeps
/// it usable under both wall-clock and virtual time.
#[derive(Debug, Clone)]
pub struct TimerQueue<E> {
    entries: BTreeMap<TimerHandle, E>,
    next_seq: u64,
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    pub fn schedule_at(&mut self, due_ms: u64, event: E) -> TimerHandle {
        let handle = TimerHandle {
            due_ms,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.insert(handle, event);
        handle
    }

    pub fn schedule_after(&mut self, now_ms: u64, delay_ms: u64, event: E) -> TimerHandle {
        self.schedule_at(now_ms.saturating_add(delay_ms), event)
    }

    /// Returns the event if it had not fired yet.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<E> {
        self.entries.remove(&handle)
    }

    /// Drops every pending callback, returning how many were outstanding.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.keys().next().map(|h| h.due_ms)
    }

    /// Removes and returns the earliest callback due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TimerHandle, E)> {
        match self.entries.first_key_value() {
            Some((handle, _)) if handle.due_ms <= now_ms => self.entries.pop_first(),
            _ => None,
        }
    }

    pub fn contains(&self, handle: TimerHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}
