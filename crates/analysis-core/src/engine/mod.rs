//! External engine access
//!
//! The orchestrator talks to the engine only through [`AnalysisEngine`]. The
//! production implementation is [`EngineSession`], a single serialized UCI
//! process. Tests substitute their own implementations.
//!
//! # Architecture
//!
//! - [`uci`]: command strings and `info` line parsing
//! - [`session`]: process lifecycle, handshake, configuration, queries

pub mod session;
pub mod uci;

pub use session::{EngineConfig, EngineSession};

use crate::error::AnalysisOutcome;
use crate::position::{AnalysisParameters, PositionDescriptor};
use crate::types::Score;
use async_trait::async_trait;

/// One ranked line of a multi-PV search, as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLine {
    /// 1-based rank reported by the engine
    pub multipv: u32,
    /// Depth actually reached
    pub depth: u32,
    /// Relative to the side to move
    pub score: Score,
    /// Moves in UCI notation, first move is the candidate
    pub pv: Vec<String>,
}

/// Reachability of the engine process, for health reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineHealth {
    /// Process running and idle
    Ready,
    /// Process running a query
    Busy,
    /// Process could not be launched or has been shut down
    Unavailable,
}

impl EngineHealth {
    pub fn is_available(self) -> bool {
        matches!(self, EngineHealth::Ready | EngineHealth::Busy)
    }
}

/// Depth-bounded multi-PV search on an external engine
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Search `position` and return up to `params.breadth()` lines ordered by rank
    async fn query(
        &self,
        position: &PositionDescriptor,
        params: AnalysisParameters,
    ) -> AnalysisOutcome<Vec<SearchLine>>;

    async fn health(&self) -> EngineHealth;

    /// Release the engine process. Idempotent.
    async fn shutdown(&self);
}
