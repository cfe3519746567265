use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::time::{self, Instant};
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::entry::Entry;
use crate::error::CacheError;
use crate::schedule::Schedule;

/// Stale heap items tolerated beyond twice the live entry count before the
/// schedule is compacted.
const COMPACT_SLACK: usize = 1024;

/// Everything guarded by the cache-wide lock
struct State<V> {
    entries: HashMap<String, Entry<V>>,
    schedule: Schedule,
    default_ttl: Duration,
    reset_on_add: bool,
}

impl<V> State<V> {
    fn new(config: CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            schedule: Schedule::new(),
            default_ttl: config.ttl,
            reset_on_add: config.reset_on_add,
        }
    }

    /// Inserts or updates `key`. Returns `true` if the reaper must be woken.
    fn add(&mut self, key: String, value: V, now: Instant) -> bool {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.set_value(value);
            if !self.reset_on_add {
                trace!(key = %key, "value replaced, deadline kept");
                return false;
            }

            let generation = self.schedule.next_generation();
            entry.restart(now, generation);
            let deadline = entry.deadline();
            trace!(key = %key, generation, "countdown restarted");

            let wake = self.schedule.push(key, deadline, generation);
            self.compact_if_bloated();
            return wake;
        }

        let generation = self.schedule.next_generation();
        let entry = Entry::new(value, now, self.default_ttl, generation);
        let deadline = entry.deadline();
        trace!(key = %key, generation, "entry inserted");

        self.entries.insert(key.clone(), entry);
        let wake = self.schedule.push(key, deadline, generation);
        self.compact_if_bloated();
        wake
    }

    /// Removes every entry whose current deadline has passed
    fn reap(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        while let Some((key, generation)) = self.schedule.pop_due(now) {
            let current = self.entries.get(&key).map(Entry::generation);
            if current == Some(generation) {
                self.entries.remove(&key);
                removed += 1;
            }
        }
        removed
    }

    fn remove(&mut self, key: &str) -> Option<V> {
        let removed = self.entries.remove(key).map(Entry::into_value);
        self.compact_if_bloated();
        removed
    }

    fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.schedule.clear();
        count
    }

    fn compact_if_bloated(&mut self) {
        if self.schedule.len() <= self.entries.len() * 2 + COMPACT_SLACK {
            return;
        }
        let entries = &self.entries;
        self.schedule
            .compact(|key, generation| entries.get(key).is_some_and(|e| e.generation() == generation));
        debug!(scheduled = self.schedule.len(), "expiry schedule compacted");
    }
}

/// Shared state behind every [`Cache`] handle
struct Inner<V> {
    state: Mutex<State<V>>,
    /// Wakes the reaper when an earlier deadline is scheduled
    wake: Arc<Notify>,
    /// Signals the reaper to stop once the last handle is gone
    shutdown_tx: watch::Sender<bool>,
}

impl<V> Drop for Inner<V> {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Thread-safe in-memory cache whose entries expire after a time-to-live
///
/// All state sits behind one lock; `add`, `get`, `ttl` and `len` each take it
/// once for a constant amount of work. Expiry is driven by a single background
/// task per cache that sleeps until the earliest deadline and removes due
/// entries under the same lock.
///
/// Cloning a `Cache` is cheap and yields a handle to the same entries. The
/// background task stops when the last handle is dropped.
///
/// # Example
///
/// ```rust,no_run
/// use ttlcache_core::{Cache, CacheConfig};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let config = CacheConfig::default()
///         .with_ttl(Duration::from_secs(2))
///         .with_reset_on_add(true);
///     let cache = Cache::with_config(config);
///
///     cache.add("session:42", "token".to_string());
///     assert_eq!(cache.get("session:42").as_deref(), Some("token"));
/// }
/// ```
pub struct Cache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone + Send + 'static> Cache<V> {
    /// Creates a cache with the given TTL and reset-on-add disabled
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context. The cache requires
    /// a runtime to spawn its background reaper.
    pub fn new(ttl: Duration) -> Self {
        Self::with_config(CacheConfig::default().with_ttl(ttl))
    }

    /// Creates a cache with custom configuration
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context. Use
    /// [`try_with_config`](Cache::try_with_config) to get an error instead.
    pub fn with_config(config: CacheConfig) -> Self {
        match Self::try_with_config(config) {
            Ok(cache) => cache,
            Err(err) => panic!(
                "{err}. Construct the cache from within a #[tokio::main] or \
                 #[tokio::test] context, or from code running on a Tokio runtime."
            ),
        }
    }

    /// Creates a cache with custom configuration, failing if no Tokio runtime
    /// is available
    pub fn try_with_config(config: CacheConfig) -> Result<Self, CacheError> {
        let runtime = tokio::runtime::Handle::try_current()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let wake = Arc::new(Notify::new());

        let inner = Arc::new(Inner {
            state: Mutex::new(State::new(config)),
            wake: Arc::clone(&wake),
            shutdown_tx,
        });

        runtime.spawn(reap_loop(Arc::downgrade(&inner), wake, shutdown_rx));

        Ok(Self { inner })
    }

    /// Retrieves a clone of the value stored under `key`
    ///
    /// Returns `None` if the key is absent or has already been expired by the
    /// reaper. Never removes anything itself.
    pub fn get(&self, key: &str) -> Option<V> {
        let state = self.inner.state.lock();
        state.entries.get(key).map(|entry| entry.value().clone())
    }
}

impl<V> Cache<V> {
    /// Returns the number of entries currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.lock().entries.len()
    }

    /// Returns `true` if the cache holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().entries.is_empty()
    }

    /// Stores `value` under `key`
    ///
    /// A new key gets the cache's current default TTL, captured on the entry.
    /// For an existing key the value is always overwritten; the countdown is
    /// restarted with the entry's captured TTL only when reset-on-add is
    /// enabled, otherwise the original deadline stands.
    pub fn add(&self, key: impl Into<String>, value: V) {
        let wake = self.inner.state.lock().add(key.into(), value, Instant::now());
        if wake {
            self.inner.wake.notify_one();
        }
    }

    /// Returns the time left before `key` expires
    ///
    /// An entry whose deadline has passed but which the reaper has not yet
    /// removed reports `Some(Duration::ZERO)`; treat that as expired.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let state = self.inner.state.lock();
        let now = Instant::now();
        state.entries.get(key).map(|entry| entry.remaining(now))
    }

    /// Checks if a key is present
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.state.lock().entries.contains_key(key)
    }

    /// Removes `key` ahead of its deadline, returning its value
    ///
    /// The pending expiry for the key becomes stale and is ignored.
    pub fn remove(&self, key: &str) -> Option<V> {
        let removed = self.inner.state.lock().remove(key);
        if removed.is_some() {
            trace!(key, "entry removed");
        }
        removed
    }

    /// Removes every entry, returning how many were held
    pub fn clear(&self) -> usize {
        let count = self.inner.state.lock().clear();
        debug!(count, "cache cleared");
        count
    }

    /// Returns all keys currently held, in no particular order
    pub fn keys(&self) -> Vec<String> {
        self.inner.state.lock().entries.keys().cloned().collect()
    }

    /// Returns the TTL applied to newly inserted keys
    pub fn default_ttl(&self) -> Duration {
        self.inner.state.lock().default_ttl
    }

    /// Changes the TTL applied to keys inserted from now on
    ///
    /// Entries already present keep the duration they were created with, also
    /// when reset-on-add restarts them.
    pub fn set_default_ttl(&self, ttl: Duration) {
        self.inner.state.lock().default_ttl = ttl;
    }

    /// Returns whether re-adding a key restarts its countdown
    pub fn reset_on_add(&self) -> bool {
        self.inner.state.lock().reset_on_add
    }

    /// Changes the reset-on-add policy for subsequent adds
    pub fn set_reset_on_add(&self, reset_on_add: bool) {
        self.inner.state.lock().reset_on_add = reset_on_add;
    }
}

/// Background task that removes entries as their deadlines pass
///
/// Holds only a weak reference so it never keeps a dropped cache alive.
async fn reap_loop<V>(
    inner: Weak<Inner<V>>,
    wake: Arc<Notify>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        let next = {
            let Some(inner) = inner.upgrade() else {
                break;
            };
            let mut state = inner.state.lock();
            let removed = state.reap(Instant::now());
            if removed > 0 {
                debug!(removed, remaining = state.entries.len(), "expired entries removed");
            }
            state.schedule.next_deadline()
        };

        tokio::select! {
            () = sleep_until(next) => {}
            () = wake.notified() => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
    debug!("expiry reaper stopped");
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
