//! Soak run configuration.

use std::time::Duration;

/// Options controlling a soak run.
#[derive(Clone, Debug)]
pub struct SoakOptions {
    /// TTL used by the expiry checks
    pub ttl: Duration,

    /// Number of concurrent worker tasks
    pub workers: usize,

    /// Keys written by each worker
    pub ops_per_worker: usize,
}

impl SoakOptions {
    /// Create options from environment variables.
    ///
    /// Reads:
    /// - `TTLCACHE_TTL_MS` - TTL in milliseconds (defaults to 500)
    /// - `TTLCACHE_WORKERS` - Worker count (defaults to 50)
    /// - `TTLCACHE_OPS_PER_WORKER` - Keys per worker (defaults to 200)
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ttl = env_parse("TTLCACHE_TTL_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.ttl);
        let workers = env_parse("TTLCACHE_WORKERS")
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(defaults.workers);
        let ops_per_worker = env_parse("TTLCACHE_OPS_PER_WORKER")
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(defaults.ops_per_worker);

        Self {
            ttl,
            workers,
            ops_per_worker,
        }
    }
}

impl Default for SoakOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::from_millis(500),
            workers: 50,
            ops_per_worker: 200,
        }
    }
}

fn env_parse(name: &str) -> Option<u64> {
    std::env::var(name).ok()?.parse().ok()
}
