//! Redis cache backend
//!
//! The connection is opened on first use and shared afterwards through a
//! `ConnectionManager`, which reconnects on its own. Every call is bounded by
//! a short timeout so an unreachable server degrades to a cache miss instead
//! of stalling the request.
//!
//! The connect attempt runs without holding the slot lock. While one attempt
//! is in flight, or for [`RETRY_BACKOFF`] after one failed, other callers get
//! [`CacheError::Unavailable`] immediately.

use super::CacheBackend;
use crate::error::CacheError;
use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const COMMAND_TIMEOUT: Duration = Duration::from_secs(1);

/// Quiet period after a failed connect before the next attempt
pub const RETRY_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Slot {
    manager: Option<ConnectionManager>,
    connecting: bool,
    failed_at: Option<Instant>,
}

pub struct RedisBackend {
    url: String,
    slot: Mutex<Slot>,
}

impl RedisBackend {
    /// Create a backend for `url`. Does not connect.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            slot: Mutex::new(Slot::default()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        {
            let mut slot = self.slot.lock();
            if let Some(manager) = slot.manager.as_ref() {
                return Ok(manager.clone());
            }
            if slot.connecting {
                return Err(CacheError::Unavailable {
                    message: "connection attempt in progress".to_string(),
                });
            }
            if let Some(failed_at) = slot.failed_at {
                if failed_at.elapsed() < RETRY_BACKOFF {
                    return Err(CacheError::Unavailable {
                        message: "backing off after failed connect".to_string(),
                    });
                }
            }
            slot.connecting = true;
        }

        let attempt = ConnectAttempt { slot: &self.slot };
        let result = self.connect().await;
        drop(attempt);

        let mut slot = self.slot.lock();
        match result {
            Ok(manager) => {
                info!(url = %self.url, "Connected to cache");
                slot.failed_at = None;
                slot.manager = Some(manager.clone());
                Ok(manager)
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "Cache connect failed");
                slot.failed_at = Some(Instant::now());
                Err(e)
            }
        }
    }

    async fn connect(&self) -> Result<ConnectionManager, CacheError> {
        let client = redis::Client::open(self.url.as_str())?;
        bounded(CONNECT_TIMEOUT, ConnectionManager::new(client)).await
    }
}

/// Clears the in-flight flag even if the connecting request is dropped
struct ConnectAttempt<'a> {
    slot: &'a Mutex<Slot>,
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        self.slot.lock().connecting = false;
    }
}

async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = redis::RedisResult<T>>,
) -> Result<T, CacheError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(CacheError::Unavailable {
            message: format!("no response within {:?}", limit),
        }),
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut connection = self.connection().await?;
        bounded(COMMAND_TIMEOUT, connection.get::<_, Option<String>>(key)).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut connection = self.connection().await?;
        let seconds = ttl.as_secs().max(1);
        bounded(
            COMMAND_TIMEOUT,
            connection.set_ex::<_, _, ()>(key, value, seconds),
        )
        .await
    }

    async fn close(&self) {
        let mut slot = self.slot.lock();
        slot.failed_at = None;
        if slot.manager.take().is_some() {
            info!(url = %self.url, "Cache connection closed");
        }
    }
}
