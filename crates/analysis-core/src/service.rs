//! Analysis orchestrator
//!
//! One request runs through these steps, stopping at the first that answers:
//!
//! 1. Validate the position (`MalformedPosition` on failure)
//! 2. Resolve depth/breadth against the configured defaults
//! 3. Cache lookup; a hit returns with `served_from_cache = true`
//! 4. Terminal check; checkmate/stalemate returns without touching the engine
//! 5. Engine query, then parse into ranked evaluations
//! 6. Best-effort cache write
//! 7. Return with `served_from_cache = false`
//!
//! Terminal results skip the cache entirely; the rules check is cheap.

use crate::cache::{CacheBackend, MemoryBackend, RedisBackend, ResultCache};
use crate::engine::{AnalysisEngine, EngineHealth, EngineSession};
use crate::error::{AnalysisOutcome, SettingsError};
use crate::evaluation::parse_search_lines;
use crate::position::{AnalysisParameters, PositionDescriptor};
use crate::rules::{terminal_result, BoardState};
use crate::settings::Settings;
use crate::types::AnalysisResult;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Inbound analysis request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalysisRequest {
    pub position: String,
    #[serde(default)]
    pub depth: Option<u32>,
    #[serde(default)]
    pub breadth: Option<u32>,
}

impl AnalysisRequest {
    pub fn new(position: impl Into<String>) -> Self {
        Self {
            position: position.into(),
            depth: None,
            breadth: None,
        }
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_breadth(mut self, breadth: u32) -> Self {
        self.breadth = Some(breadth);
        self
    }
}

/// Owns the engine and cache handles for the lifetime of the service
pub struct AnalysisService {
    engine: Arc<dyn AnalysisEngine>,
    cache: ResultCache,
    defaults: AnalysisParameters,
    closed: AtomicBool,
}

impl AnalysisService {
    pub fn new(
        engine: Arc<dyn AnalysisEngine>,
        cache: ResultCache,
        defaults: AnalysisParameters,
    ) -> Self {
        Self {
            engine,
            cache,
            defaults,
            closed: AtomicBool::new(false),
        }
    }

    /// Wire up the Stockfish session and the configured cache backend
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        let defaults = settings.default_parameters()?;
        let engine = Arc::new(EngineSession::new(settings.engine_config()));
        let backend: Arc<dyn CacheBackend> = match &settings.cache_url {
            Some(url) => Arc::new(RedisBackend::new(url.clone())),
            None => Arc::new(MemoryBackend::new()),
        };
        Ok(Self::new(
            engine,
            ResultCache::new(backend, settings.cache_ttl()),
            defaults,
        ))
    }

    pub fn defaults(&self) -> AnalysisParameters {
        self.defaults
    }

    pub async fn analyse(&self, request: &AnalysisRequest) -> AnalysisOutcome<AnalysisResult> {
        let position = PositionDescriptor::validate(&request.position)?;
        let params = AnalysisParameters::resolve(request.depth, request.breadth, self.defaults)?;

        if let Some(cached) = self.cache.lookup(&position, params).await {
            return Ok(cached);
        }

        let board = BoardState::parse(&position)?;
        if let Some(result) = terminal_result(&position, &board) {
            debug!(
                fen = %position,
                checkmate = result.is_checkmate,
                stalemate = result.is_stalemate,
                "Terminal position, engine skipped"
            );
            return Ok(result);
        }

        let lines = self.engine.query(&position, params).await?;
        let ranked_moves = parse_search_lines(&position, &board, &lines, params.breadth())?;

        let result = AnalysisResult {
            position: position.as_str().to_string(),
            best_move: ranked_moves[0].clone(),
            ranked_moves,
            side_to_move: board.side_to_move(),
            is_check: board.is_check(),
            is_checkmate: false,
            is_stalemate: false,
            served_from_cache: false,
        };

        self.cache.store(&position, params, &result).await;
        Ok(result)
    }

    pub async fn engine_health(&self) -> EngineHealth {
        self.engine.health().await
    }

    /// Release the engine process and the cache connection
    ///
    /// Only the first call does anything.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Shutting down analysis service");
        self.engine.shutdown().await;
        self.cache.close().await;
    }
}
