//! Time-ordered expiry schedule shared by every key of a cache.
//!
//! Each scheduled deadline carries the generation of the entry it was pushed
//! for. Resetting or removing an entry never touches the heap; the old item is
//! simply left to surface and is discarded when its generation no longer
//! matches the live entry.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tokio::time::Instant;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Deadline {
    at: Instant,
    generation: u64,
    key: String,
}

/// Min-heap of pending deadlines plus the generation counter
#[derive(Debug, Default)]
pub(crate) struct Schedule {
    heap: BinaryHeap<Reverse<Deadline>>,
    last_generation: u64,
}

impl Schedule {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Hands out the next generation stamp. Stamps are never reused.
    pub(crate) fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    /// Schedules `key` to expire at `at` if it still holds `generation`.
    ///
    /// Returns `true` when this deadline is now the earliest one, meaning a
    /// sleeping reaper has to be woken to pick it up.
    pub(crate) fn push(&mut self, key: String, at: Instant, generation: u64) -> bool {
        let earliest = self.heap.peek().map_or(true, |Reverse(top)| at < top.at);
        self.heap.push(Reverse(Deadline { at, generation, key }));
        earliest
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse(top)| top.at)
    }

    /// Pops the earliest item if it is due at `now`
    pub(crate) fn pop_due(&mut self, now: Instant) -> Option<(String, u64)> {
        match self.heap.peek() {
            Some(Reverse(top)) if top.at <= now => {
                let Reverse(due) = self.heap.pop()?;
                Some((due.key, due.generation))
            }
            _ => None,
        }
    }

    /// Drops every item for which `is_live` returns false
    pub(crate) fn compact(&mut self, mut is_live: impl FnMut(&str, u64) -> bool) {
        self.heap.retain(|Reverse(item)| is_live(&item.key, item.generation));
    }

    pub(crate) fn clear(&mut self) {
        self.heap.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }
}
