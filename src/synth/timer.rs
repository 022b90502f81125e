//! Cancellable timers on the engine's logical clock.
//!
//! Deadlines are plain `u64` ticks in whatever unit the owner counts (the
//! synth engine counts sample frames). Timers with equal deadlines fire in
//! scheduling order.

use std::collections::{BTreeMap, HashMap};

/// Identifies one scheduled timer. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug)]
pub struct TimerQueue<T> {
    queue: BTreeMap<(u64, u64), T>,
    deadlines: HashMap<u64, u64>,
    next_seq: u64,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, deadline: u64, payload: T) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert((deadline, seq), payload);
        self.deadlines.insert(seq, deadline);
        TimerHandle(seq)
    }

    /// Cancel a pending timer. Returns its payload, or `None` if it already
    /// fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        let deadline = self.deadlines.remove(&handle.0)?;
        self.queue.remove(&(deadline, handle.0))
    }

    /// Remove and return the earliest timer due at or before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<(u64, T)> {
        let (&(deadline, seq), _) = self.queue.first_key_value()?;
        if deadline > now {
            return None;
        }
        self.deadlines.remove(&seq);
        self.queue.remove(&(deadline, seq)).map(|payload| (deadline, payload))
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.first_key_value().map(|(&(deadline, _), _)| deadline)
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.deadlines.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
