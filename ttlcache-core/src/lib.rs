//! # TTL Cache Core
//!
//! An in-memory key/value cache whose entries disappear after a time-to-live.
//!
//! ## Features
//!
//! - Generic over the value type; keys are strings
//! - One lock guards all state, so every operation is linearizable
//! - Optional reset-on-add: re-adding a key restarts its countdown
//! - A single background reaper per cache, driven by a deadline heap
//! - Stale deadlines left behind by resets or removals are recognised by
//!   generation stamps and never delete a fresh entry
//!
//! ## Runtime
//!
//! The reaper is a Tokio task, so a cache must be built on a Tokio runtime.
//! [`Cache::new`] and [`Cache::with_config`] panic when no runtime is
//! available; [`Cache::try_with_config`] returns [`CacheError::NoRuntime`]
//! instead. The reaper stops when the last handle to the cache is dropped.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ttlcache_core::{Cache, CacheConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Entries live for 1 second
//!     let cache = Cache::new(Duration::from_secs(1));
//!     cache.add("a", "1".to_string());
//!     assert_eq!(cache.get("a").as_deref(), Some("1"));
//!
//!     tokio::time::sleep(Duration::from_millis(1500)).await;
//!     assert_eq!(cache.get("a"), None);
//!
//!     // Re-adding restarts the countdown
//!     let config = CacheConfig::default()
//!         .with_ttl(Duration::from_secs(2))
//!         .with_reset_on_add(true);
//!     let sessions = Cache::with_config(config);
//!     sessions.add("user:1", 42_u64);
//!
//!     if let Some(left) = sessions.ttl("user:1") {
//!         println!("expires in {:?}", left);
//!     }
//! }
//! ```

mod cache;
mod config;
mod entry;
mod error;
mod schedule;

pub use cache::Cache;
pub use config::CacheConfig;
pub use error::CacheError;
