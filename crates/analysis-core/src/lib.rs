//! Position analysis on top of an external UCI engine
//!
//! Given a FEN, [`AnalysisService::analyse`] returns the best move and the
//! top-N candidates with engine evaluations. The search itself is delegated
//! to Stockfish (or any UCI engine); this crate adapts its output into a
//! stable shape and deduplicates work through a TTL cache.
//!
//! # Modules
//!
//! - [`position`]: structural FEN validation and search parameters
//! - [`rules`]: board state via `shakmaty`, checkmate/stalemate short-circuit
//! - [`engine`]: the UCI session manager
//! - [`evaluation`]: engine lines to ranked [`MoveEvaluation`]s
//! - [`cache`]: content-addressed result cache (Redis or in-process)
//! - [`service`]: the orchestrator tying these together

pub mod cache;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod position;
pub mod rules;
pub mod service;
pub mod settings;
pub mod types;

pub use engine::{AnalysisEngine, EngineHealth};
pub use error::{AnalysisError, AnalysisOutcome};
pub use position::{AnalysisParameters, PositionDescriptor};
pub use service::{AnalysisRequest, AnalysisService};
pub use settings::Settings;
pub use types::{AnalysisResult, MoveEvaluation, Score, Side};
