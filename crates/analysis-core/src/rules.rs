//! Rules-engine adapter and terminal-state short-circuit
//!
//! Board legality, check detection and SAN rendering are delegated to
//! `shakmaty`. Nothing here re-derives legality.

use crate::error::{AnalysisError, AnalysisOutcome};
use crate::position::PositionDescriptor;
use crate::types::{AnalysisResult, MoveEvaluation, Side};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, Position};

/// Parsed board for one position descriptor
#[derive(Debug, Clone)]
pub struct BoardState {
    position: Chess,
}

impl BoardState {
    /// Parse a descriptor into a legal board
    ///
    /// Descriptors that pass the structural check but describe an impossible
    /// board are still client errors.
    pub fn parse(descriptor: &PositionDescriptor) -> AnalysisOutcome<Self> {
        let fen: Fen = descriptor
            .as_str()
            .parse()
            .map_err(|e: shakmaty::fen::ParseFenError| AnalysisError::malformed(e.to_string()))?;
        let position: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| AnalysisError::malformed(e.to_string()))?;
        Ok(Self { position })
    }

    pub fn is_check(&self) -> bool {
        self.position.is_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    pub fn is_stalemate(&self) -> bool {
        self.position.is_stalemate()
    }

    pub fn is_terminal(&self) -> bool {
        self.is_checkmate() || self.is_stalemate()
    }

    pub fn side_to_move(&self) -> Side {
        match self.position.turn() {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }

    /// Render a UCI move as SAN against this (pre-move) board
    ///
    /// Returns `None` when the move is malformed or illegal here.
    pub fn to_readable_notation(&self, uci_move: &str) -> Option<String> {
        let uci: UciMove = uci_move.parse().ok()?;
        let m = uci.to_move(&self.position).ok()?;
        Some(SanPlus::from_move(self.position.clone(), &m).to_string())
    }
}

/// Build the no-moves result for checkmate or stalemate
///
/// Returns `None` when the side to move still has legal moves, in which case
/// the engine must be consulted.
pub fn terminal_result(
    descriptor: &PositionDescriptor,
    board: &BoardState,
) -> Option<AnalysisResult> {
    if !board.is_terminal() {
        return None;
    }
    let is_checkmate = board.is_checkmate();
    Some(AnalysisResult {
        position: descriptor.as_str().to_string(),
        best_move: MoveEvaluation::none(is_checkmate),
        ranked_moves: Vec::new(),
        side_to_move: board.side_to_move(),
        is_check: board.is_check(),
        is_checkmate,
        is_stalemate: board.is_stalemate(),
        served_from_cache: false,
    })
}
