//! Error types for the TTL cache.

use thiserror::Error;

/// Errors that can occur when constructing a cache.
///
/// Once built, every cache operation is infallible.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No Tokio runtime is available to host the background reaper
    #[error("TTL cache requires a Tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

impl CacheError {
    /// Returns `true` if construction failed for lack of a runtime.
    pub fn is_no_runtime(&self) -> bool {
        matches!(self, CacheError::NoRuntime(_))
    }
}
