//! Time-ordered event queue driving a single trial.
//!
//! Events are ordered by `(fires_at, priority, sequence)`. The sequence number
//! is assigned at insertion and only ever grows, so an event scheduled from
//! inside a running handler for the current instant fires after every event
//! already queued for that instant at the same priority.
//!
//! Cancellation is logical: a cancelled handle is dropped from the pending
//! set and its heap entry is discarded when it reaches the top.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::Duration;

use crate::time::SimTime;

/// Tie-breaker for events firing at the same instant. Lower fires first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventPriority(pub i32);

impl EventPriority {
    /// Aura expirations resolve before anything else at the same instant, so
    /// an aura ending at `t` never modifies an effect landing at `t`.
    pub const EXPIRE: Self = Self(-20);
    /// Cast completions and periodic ticks.
    pub const DEFAULT: Self = Self(0);
    /// Actor decisions run after the effects of the same instant have landed.
    pub const DECISION: Self = Self(10);
    /// Passive regeneration.
    pub const REGEN: Self = Self(20);
}

impl Default for EventPriority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Handle to a scheduled event, used for cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventHandle(u64);

impl EventHandle {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

/// Event popped from the queue, ready to execute.
#[derive(Clone, Debug, PartialEq)]
pub struct FiredEvent<E> {
    pub handle: EventHandle,
    pub fires_at: SimTime,
    pub priority: EventPriority,
    pub payload: E,
}

struct Entry<E> {
    fires_at: SimTime,
    priority: EventPriority,
    sequence: u64,
    payload: E,
}

impl<E> Entry<E> {
    fn key(&self) -> (SimTime, EventPriority, u64) {
        (self.fires_at, self.priority, self.sequence)
    }
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other.key().cmp(&self.key())
    }
}

/// Outcome of asking the scheduler for the next event.
#[derive(Clone, Debug, PartialEq)]
pub enum Advance<E> {
    /// The next valid event; the clock now reads its `fires_at`.
    Fired(FiredEvent<E>),
    /// The next valid event lies beyond the cutoff. The clock is parked at
    /// the cutoff and the queue is left untouched.
    CutoffReached,
    /// No pending events remain.
    Exhausted,
}

/// Priority queue of future events plus the simulation clock.
pub struct Scheduler<E> {
    now: SimTime,
    cutoff: Option<SimTime>,
    heap: BinaryHeap<Entry<E>>,
    pending: HashSet<u64>,
    next_sequence: u64,
    fired: u64,
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now: SimTime::ZERO,
            cutoff: None,
            heap: BinaryHeap::new(),
            pending: HashSet::new(),
            next_sequence: 0,
            fired: 0,
        }
    }

    /// Creates a scheduler that refuses to advance past `cutoff`.
    pub fn with_cutoff(cutoff: SimTime) -> Self {
        Self {
            cutoff: Some(cutoff),
            ..Self::new()
        }
    }

    /// Current simulation clock.
    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn cutoff(&self) -> Option<SimTime> {
        self.cutoff
    }

    /// Number of events executed so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Number of scheduled, non-cancelled events.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Schedules `payload` to fire `delay` after the current clock.
    pub fn schedule(&mut self, delay: Duration, priority: EventPriority, payload: E) -> EventHandle {
        self.schedule_at(self.now + delay, priority, payload)
    }

    /// Schedules `payload` at an absolute instant. Instants in the past are
    /// clamped to the current clock.
    pub fn schedule_at(&mut self, at: SimTime, priority: EventPriority, payload: E) -> EventHandle {
        let fires_at = at.max(self.now);
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        self.heap.push(Entry {
            fires_at,
            priority,
            sequence,
            payload,
        });
        self.pending.insert(sequence);

        tracing::trace!(
            target: "sim::scheduler",
            sequence,
            fires_at = %fires_at,
            priority = priority.0,
            "event scheduled"
        );

        EventHandle(sequence)
    }

    /// Cancels a pending event. Returns `false` if it already fired or was
    /// cancelled before.
    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        let removed = self.pending.remove(&handle.0);
        if removed {
            tracing::trace!(target: "sim::scheduler", sequence = handle.0, "event cancelled");
        }
        removed
    }

    pub fn is_pending(&self, handle: EventHandle) -> bool {
        self.pending.contains(&handle.0)
    }

    /// Instant of the next valid event, skipping cancelled entries.
    pub fn peek_time(&mut self) -> Option<SimTime> {
        self.discard_cancelled();
        self.heap.peek().map(|entry| entry.fires_at)
    }

    /// Pops the earliest valid event and advances the clock to it.
    pub fn advance(&mut self) -> Advance<E> {
        self.discard_cancelled();

        let Some(top) = self.heap.peek() else {
            return Advance::Exhausted;
        };

        if let Some(cutoff) = self.cutoff
            && top.fires_at > cutoff
        {
            self.now = self.now.max(cutoff);
            return Advance::CutoffReached;
        }

        let Some(entry) = self.heap.pop() else {
            return Advance::Exhausted;
        };
        self.pending.remove(&entry.sequence);

        debug_assert!(entry.fires_at >= self.now, "clock must never run backwards");
        self.now = entry.fires_at;
        self.fired += 1;

        Advance::Fired(FiredEvent {
            handle: EventHandle(entry.sequence),
            fires_at: entry.fires_at,
            priority: entry.priority,
            payload: entry.payload,
        })
    }

    /// Moves the clock forward to `at` without firing anything, stopping at
    /// the next pending event and at the cutoff.
    pub fn advance_to(&mut self, at: SimTime) -> SimTime {
        let mut target = at;
        if let Some(next) = self.peek_time() {
            target = target.min(next);
        }
        if let Some(cutoff) = self.cutoff {
            target = target.min(cutoff);
        }
        self.now = self.now.max(target);
        self.now
    }

    fn discard_cancelled(&mut self) {
        while let Some(top) = self.heap.peek() {
            if self.pending.contains(&top.sequence) {
                break;
            }
            self.heap.pop();
        }
    }
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut Scheduler<&'static str>) -> Vec<(SimTime, &'static str)> {
        let mut fired = Vec::new();
        while let Advance::Fired(event) = scheduler.advance() {
            fired.push((event.fires_at, event.payload));
        }
        fired
    }

    #[test]
    fn fires_in_time_then_priority_then_insertion_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Duration::from_secs(2), EventPriority::DEFAULT, "late");
        scheduler.schedule(Duration::from_secs(1), EventPriority::REGEN, "regen");
        scheduler.schedule(Duration::from_secs(1), EventPriority::DEFAULT, "first");
        scheduler.schedule(Duration::from_secs(1), EventPriority::DEFAULT, "second");
        scheduler.schedule(Duration::from_secs(1), EventPriority::EXPIRE, "expire");

        let order: Vec<_> = drain(&mut scheduler).into_iter().map(|(_, p)| p).collect();
        assert_eq!(order, vec!["expire", "first", "second", "regen", "late"]);
    }

    #[test]
    fn reentrant_events_at_same_instant_fire_after_queued_ones() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Duration::from_secs(1), EventPriority::DEFAULT, "a");
        scheduler.schedule(Duration::from_secs(1), EventPriority::DEFAULT, "b");

        let Advance::Fired(first) = scheduler.advance() else {
            panic!("expected an event");
        };
        assert_eq!(first.payload, "a");

        // Scheduled while "a" is executing, for the same instant.
        scheduler.schedule(Duration::ZERO, EventPriority::DEFAULT, "spawned");

        let rest: Vec<_> = drain(&mut scheduler).into_iter().map(|(_, p)| p).collect();
        assert_eq!(rest, vec!["b", "spawned"]);
    }

    #[test]
    fn cancelled_events_are_skipped() {
        let mut scheduler = Scheduler::new();
        let doomed = scheduler.schedule(Duration::from_secs(1), EventPriority::DEFAULT, "doomed");
        scheduler.schedule(Duration::from_secs(2), EventPriority::DEFAULT, "kept");

        assert!(scheduler.cancel(doomed));
        assert!(!scheduler.cancel(doomed), "second cancel is a no-op");
        assert_eq!(scheduler.len(), 1);

        let fired = drain(&mut scheduler);
        assert_eq!(fired, vec![(SimTime::from_secs(2), "kept")]);
    }

    #[test]
    fn refuses_to_advance_past_cutoff() {
        let mut scheduler = Scheduler::with_cutoff(SimTime::from_secs(5));
        scheduler.schedule(Duration::from_secs(5), EventPriority::DEFAULT, "edge");
        scheduler.schedule(Duration::from_secs(6), EventPriority::DEFAULT, "beyond");

        assert!(matches!(scheduler.advance(), Advance::Fired(e) if e.payload == "edge"));
        assert_eq!(scheduler.advance(), Advance::CutoffReached);
        assert_eq!(scheduler.now(), SimTime::from_secs(5));
        assert_eq!(scheduler.len(), 1, "queue left untouched");
    }

    #[test]
    fn past_instants_clamp_to_now() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Duration::from_secs(3), EventPriority::DEFAULT, "tick");
        let _ = scheduler.advance();

        scheduler.schedule_at(SimTime::from_secs(1), EventPriority::DEFAULT, "stale");
        assert_eq!(scheduler.peek_time(), Some(SimTime::from_secs(3)));
    }

    #[test]
    fn advance_to_stops_at_pending_events() {
        let mut scheduler = Scheduler::with_cutoff(SimTime::from_secs(10));
        assert_eq!(scheduler.advance_to(SimTime::from_millis(2500)), SimTime::from_millis(2500));

        scheduler.schedule(Duration::from_secs(1), EventPriority::DEFAULT, "next");
        assert_eq!(scheduler.advance_to(SimTime::from_secs(8)), SimTime::from_millis(3500));
        assert_eq!(scheduler.fired(), 0);

        let _ = scheduler.advance();
        assert_eq!(scheduler.advance_to(SimTime::from_secs(60)), SimTime::from_secs(10));
    }

    #[test]
    fn exhausted_when_empty() {
        let mut scheduler: Scheduler<()> = Scheduler::new();
        assert_eq!(scheduler.advance(), Advance::Exhausted);
        assert_eq!(scheduler.fired(), 0);
    }
}
