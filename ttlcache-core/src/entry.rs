use std::time::Duration;
use tokio::time::Instant;

/// Upper bound on any entry's lifetime (~100 years).
///
/// Longer durations are clamped so deadline arithmetic never overflows.
pub(crate) const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// A stored value plus the bookkeeping needed to expire it
#[derive(Debug, Clone)]
pub(crate) struct Entry<V> {
    value: V,
    inserted_at: Instant,
    duration: Duration,
    generation: u64,
}

impl<V> Entry<V> {
    /// Creates an entry whose countdown starts at `inserted_at`
    pub(crate) fn new(value: V, inserted_at: Instant, duration: Duration, generation: u64) -> Self {
        Self {
            value,
            inserted_at,
            duration: duration.min(MAX_TTL),
            generation,
        }
    }

    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    pub(crate) fn into_value(self) -> V {
        self.value
    }

    /// Replaces the value without touching the deadline
    pub(crate) fn set_value(&mut self, value: V) {
        self.value = value;
    }

    /// Restarts the countdown from `now` under a new generation.
    ///
    /// The duration captured at creation is reused.
    pub(crate) fn restart(&mut self, now: Instant, generation: u64) {
        self.inserted_at = now;
        self.generation = generation;
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn deadline(&self) -> Instant {
        self.inserted_at + self.duration
    }

    /// Time left before the deadline, saturating at zero
    pub(crate) fn remaining(&self, now: Instant) -> Duration {
        self.deadline().saturating_duration_since(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_remaining() {
        let now = Instant::now();
        let entry = Entry::new("v", now, Duration::from_secs(60), 1);

        assert_eq!(entry.remaining(now), Duration::from_secs(60));
        assert_eq!(entry.remaining(now + Duration::from_secs(20)), Duration::from_secs(40));
    }

    #[test]
    fn test_entry_remaining_saturates_past_deadline() {
        let now = Instant::now();
        let entry = Entry::new("v", now, Duration::from_secs(1), 1);

        assert_eq!(entry.remaining(now + Duration::from_secs(5)), Duration::ZERO);
    }

    #[test]
    fn test_restart_keeps_captured_duration() {
        let now = Instant::now();
        let mut entry = Entry::new("v", now, Duration::from_secs(2), 1);

        let later = now + Duration::from_secs(1);
        entry.restart(later, 7);

        assert_eq!(entry.generation(), 7);
        assert_eq!(entry.deadline(), later + Duration::from_secs(2));
    }

    #[test]
    fn test_extreme_duration_is_clamped() {
        let now = Instant::now();
        let entry = Entry::new("v", now, Duration::MAX, 1);

        assert_eq!(entry.deadline(), now + MAX_TTL);
    }

    #[test]
    fn test_set_value_keeps_deadline() {
        let now = Instant::now();
        let mut entry = Entry::new("old", now, Duration::from_secs(3), 1);
        let deadline = entry.deadline();

        entry.set_value("new");

        assert_eq!(*entry.value(), "new");
        assert_eq!(entry.deadline(), deadline);
        assert_eq!(entry.into_value(), "new");
    }
}
