//! Result cache
//!
//! Content-addresses `(position, depth, breadth)` to a previously computed
//! [`AnalysisResult`] with a fixed TTL. The cache fails open: any backend or
//! decode failure is logged at warning level and treated as a miss (lookup)
//! or a skipped write (store). Callers never see a cache error.
//!
//! # Key format
//!
//! `xfchess:analysis:<sha256 hex of "<fen>:<depth>:<breadth>">`

mod memory;
mod redis_backend;

pub use memory::MemoryBackend;
pub use redis_backend::RedisBackend;

use crate::error::CacheError;
use crate::position::{AnalysisParameters, PositionDescriptor};
use crate::types::AnalysisResult;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Namespace shared by every analysis entry in the backend
pub const KEY_PREFIX: &str = "xfchess:analysis:";

/// Key-value store with per-entry expiry
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Release the backend connection. Idempotent.
    async fn close(&self);
}

/// Derive the cache key for one request
///
/// Deterministic for identical triples; any changed field yields a different
/// digest.
pub fn cache_key(position: &PositionDescriptor, params: AnalysisParameters) -> String {
    let raw = format!("{}:{}:{}", position, params.depth(), params.breadth());
    format!("{}{:x}", KEY_PREFIX, Sha256::digest(raw.as_bytes()))
}

/// Fail-open result cache over a [`CacheBackend`]
pub struct ResultCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetch a cached result, flagged as served from cache
    pub async fn lookup(
        &self,
        position: &PositionDescriptor,
        params: AnalysisParameters,
    ) -> Option<AnalysisResult> {
        let key = cache_key(position, params);
        let raw = match self.backend.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %short(&key), "Cache MISS");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Cache GET failed");
                return None;
            }
        };

        match serde_json::from_str::<AnalysisResult>(&raw) {
            Ok(result) => {
                debug!(key = %short(&key), "Cache HIT");
                Some(result.mark_served_from_cache())
            }
            Err(e) => {
                warn!(error = %e, key = %short(&key), "Cache entry undecodable, ignoring");
                None
            }
        }
    }

    /// Write a freshly computed result. Failures are logged and swallowed.
    pub async fn store(
        &self,
        position: &PositionDescriptor,
        params: AnalysisParameters,
        result: &AnalysisResult,
    ) {
        let key = cache_key(position, params);
        let raw = match serde_json::to_string(result) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %CacheError::from(e), "Cache SET skipped");
                return;
            }
        };
        match self.backend.set(&key, raw, self.ttl).await {
            Ok(()) => debug!(key = %short(&key), ttl = ?self.ttl, "Cache SET"),
            Err(e) => warn!(error = %e, "Cache SET failed"),
        }
    }

    pub async fn close(&self) {
        self.backend.close().await;
    }
}

fn short(key: &str) -> &str {
    &key[..key.len().min(KEY_PREFIX.len() + 12)]
}
