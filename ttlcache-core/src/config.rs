use std::time::Duration;

/// Construction options for a [`Cache`](crate::Cache)
///
/// # Example
///
/// ```rust
/// use ttlcache_core::CacheConfig;
/// use std::time::Duration;
///
/// let config = CacheConfig::default()
///     .with_ttl(Duration::from_secs(30))
///     .with_reset_on_add(true);
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL given to newly inserted keys (default: 60 seconds)
    pub ttl: Duration,
    /// Whether re-adding an existing key restarts its countdown (default: false)
    pub reset_on_add: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            reset_on_add: false,
        }
    }
}

impl CacheConfig {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TTL applied to new keys
    ///
    /// A zero TTL is accepted; such entries are removed as soon as the
    /// background reaper gets to run.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the reset-on-add policy
    ///
    /// When enabled, adding a key that is already present restarts its
    /// countdown using the duration captured when the key was first inserted.
    pub fn with_reset_on_add(mut self, reset_on_add: bool) -> Self {
        self.reset_on_add = reset_on_add;
        self
    }
}
