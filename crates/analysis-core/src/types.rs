//! Analysis result types
//!
//! These are the shapes handed back to callers and stored in the result cache.
//! The engine score is a tagged [`Score`] internally; on the wire it is split
//! into the optional `centipawn_score` / `mate_in` pair.

use serde::{Deserialize, Serialize};

/// Move string used for the "no legal moves" sentinel
pub const NO_MOVE: &str = "none";

/// Engine score relative to the side to move
///
/// `Mate(n)` with positive `n` means the side to move mates in `n`;
/// negative means it gets mated. `Mate(0)` marks a position already mated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32),
}

/// Side to move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

/// One ranked candidate move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MoveEvaluationWire", into = "MoveEvaluationWire")]
pub struct MoveEvaluation {
    /// Move in UCI notation, e.g. `e2e4`
    pub uci_move: String,
    /// Move in SAN, e.g. `e4`
    pub move_readable: String,
    pub score: Option<Score>,
    /// Depth the engine reached for this line
    pub depth: u32,
    pub principal_variation: Vec<String>,
}

impl MoveEvaluation {
    /// Sentinel for checkmate/stalemate positions
    pub fn none(is_checkmate: bool) -> Self {
        Self {
            uci_move: NO_MOVE.to_string(),
            move_readable: NO_MOVE.to_string(),
            score: is_checkmate.then_some(Score::Mate(0)),
            depth: 0,
            principal_variation: Vec::new(),
        }
    }

    pub fn centipawn_score(&self) -> Option<i32> {
        match self.score {
            Some(Score::Centipawns(cp)) => Some(cp),
            _ => None,
        }
    }

    pub fn mate_in(&self) -> Option<i32> {
        match self.score {
            Some(Score::Mate(n)) => Some(n),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct MoveEvaluationWire {
    #[serde(rename = "move")]
    uci_move: String,
    move_readable: String,
    centipawn_score: Option<i32>,
    mate_in: Option<i32>,
    depth: u32,
    #[serde(default)]
    principal_variation: Vec<String>,
}

impl TryFrom<MoveEvaluationWire> for MoveEvaluation {
    type Error = String;

    fn try_from(wire: MoveEvaluationWire) -> Result<Self, Self::Error> {
        let score = match (wire.centipawn_score, wire.mate_in) {
            (Some(cp), None) => Some(Score::Centipawns(cp)),
            (None, Some(n)) => Some(Score::Mate(n)),
            (None, None) => None,
            (Some(_), Some(_)) => {
                return Err("centipawn_score and mate_in are mutually exclusive".to_string())
            }
        };
        Ok(Self {
            uci_move: wire.uci_move,
            move_readable: wire.move_readable,
            score,
            depth: wire.depth,
            principal_variation: wire.principal_variation,
        })
    }
}

impl From<MoveEvaluation> for MoveEvaluationWire {
    fn from(eval: MoveEvaluation) -> Self {
        let centipawn_score = eval.centipawn_score();
        let mate_in = eval.mate_in();
        Self {
            uci_move: eval.uci_move,
            move_readable: eval.move_readable,
            centipawn_score,
            mate_in,
            depth: eval.depth,
            principal_variation: eval.principal_variation,
        }
    }
}

/// Full response for one analysed position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub position: String,
    pub best_move: MoveEvaluation,
    /// Best first
    pub ranked_moves: Vec<MoveEvaluation>,
    pub side_to_move: Side,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
    #[serde(default)]
    pub served_from_cache: bool,
}

impl AnalysisResult {
    /// Flag the result as rehydrated from the cache
    pub fn mark_served_from_cache(mut self) -> Self {
        self.served_from_cache = true;
        self
    }
}
