//! Service settings
//!
//! Plain data with defaults matching a stock Stockfish install. The backend
//! binary fills these from CLI flags and environment variables.

use crate::engine::EngineConfig;
use crate::error::SettingsError;
use crate::position::{AnalysisParameters, MAX_BREADTH, MAX_DEPTH, MIN_BREADTH, MIN_DEPTH};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine_path: PathBuf,
    pub engine_args: Vec<String>,
    pub engine_threads: u32,
    pub engine_hash_mb: u32,
    /// Optional wall-clock cap per engine query
    pub engine_timeout_secs: Option<u64>,
    pub default_depth: u32,
    pub default_breadth: u32,
    /// Redis URL. `None` selects the in-process cache.
    pub cache_url: Option<String>,
    pub cache_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine_path: PathBuf::from("/usr/games/stockfish"),
            engine_args: Vec::new(),
            engine_threads: 2,
            engine_hash_mb: 128,
            engine_timeout_secs: None,
            default_depth: 20,
            default_breadth: 3,
            cache_url: None,
            cache_ttl_secs: 60,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        check("default_depth", self.default_depth, MIN_DEPTH, MAX_DEPTH)?;
        check("default_breadth", self.default_breadth, MIN_BREADTH, MAX_BREADTH)?;
        check("engine_threads", self.engine_threads, 1, 1024)?;
        check("engine_hash_mb", self.engine_hash_mb, 1, 1 << 20)?;
        if self.engine_path.as_os_str().is_empty() {
            return Err(SettingsError::Empty {
                field: "engine_path",
            });
        }
        Ok(())
    }

    /// Depth/breadth used when a request omits them
    pub fn default_parameters(&self) -> Result<AnalysisParameters, SettingsError> {
        self.validate()?;
        AnalysisParameters::new(self.default_depth, self.default_breadth).map_err(|_| {
            SettingsError::OutOfRange {
                field: "default_depth",
                min: MIN_DEPTH,
                max: MAX_DEPTH,
                value: self.default_depth,
            }
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            path: self.engine_path.clone(),
            args: self.engine_args.clone(),
            threads: self.engine_threads,
            hash_mb: self.engine_hash_mb,
            query_timeout: self.engine_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn check(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), SettingsError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}
