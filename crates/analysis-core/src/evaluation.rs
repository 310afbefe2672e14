//! Move-evaluation parser
//!
//! Turns ranked engine lines into [`MoveEvaluation`]s, keeping the engine's
//! order. Lines with an empty principal variation are dropped. SAN is rendered
//! against the board *before* the candidate move.

use crate::engine::SearchLine;
use crate::error::{AnalysisError, AnalysisOutcome};
use crate::position::PositionDescriptor;
use crate::rules::BoardState;
use crate::types::MoveEvaluation;
use tracing::error;

/// Convert up to `breadth` engine lines into ranked evaluations
///
/// Fails with [`AnalysisError::NoMovesReturned`] if nothing usable remains,
/// and with [`AnalysisError::InvalidEngineOutput`] if a candidate move is not
/// legal on `board`.
pub fn parse_search_lines(
    position: &PositionDescriptor,
    board: &BoardState,
    lines: &[SearchLine],
    breadth: u32,
) -> AnalysisOutcome<Vec<MoveEvaluation>> {
    let mut evaluations = Vec::with_capacity(lines.len());

    for line in lines.iter().take(breadth as usize) {
        let Some(first) = line.pv.first() else {
            continue;
        };
        let move_readable = board.to_readable_notation(first).ok_or_else(|| {
            error!(fen = %position, uci_move = %first, "Engine move rejected by rules engine");
            AnalysisError::InvalidEngineOutput {
                position: position.as_str().to_string(),
                uci_move: first.clone(),
            }
        })?;

        evaluations.push(MoveEvaluation {
            uci_move: first.clone(),
            move_readable,
            score: Some(line.score),
            depth: line.depth,
            principal_variation: line.pv.clone(),
        });
    }

    if evaluations.is_empty() {
        error!(
            fen = %position,
            lines = lines.len(),
            "Engine returned no moves for a non-terminal position"
        );
        return Err(AnalysisError::NoMovesReturned {
            position: position.as_str().to_string(),
        });
    }
    Ok(evaluations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Score;

    const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn line(multipv: u32, score: Score, pv: &[&str]) -> SearchLine {
        SearchLine {
            multipv,
            depth: 12,
            score,
            pv: pv.iter().map(|m| m.to_string()).collect(),
        }
    }

    fn start() -> (PositionDescriptor, BoardState) {
        let descriptor = PositionDescriptor::validate(STARTING_FEN).unwrap();
        let board = BoardState::parse(&descriptor).unwrap();
        (descriptor, board)
    }

    #[test]
    fn test_preserves_engine_order() {
        let (descriptor, board) = start();
        let lines = vec![
            line(1, Score::Centipawns(35), &["e2e4", "e7e5"]),
            line(2, Score::Centipawns(30), &["d2d4"]),
            line(3, Score::Centipawns(20), &["g1f3"]),
        ];

        let evals = parse_search_lines(&descriptor, &board, &lines, 3).unwrap();
        let moves: Vec<_> = evals.iter().map(|e| e.move_readable.as_str()).collect();
        assert_eq!(moves, vec!["e4", "d4", "Nf3"]);
        assert_eq!(evals[0].principal_variation, vec!["e2e4", "e7e5"]);
        assert_eq!(evals[0].depth, 12);
    }

    #[test]
    fn test_score_union_maps_to_single_field() {
        let (descriptor, board) = start();
        let lines = vec![
            line(1, Score::Mate(3), &["e2e4"]),
            line(2, Score::Centipawns(-40), &["g2g4"]),
        ];

        let evals = parse_search_lines(&descriptor, &board, &lines, 2).unwrap();
        assert_eq!(evals[0].mate_in(), Some(3));
        assert_eq!(evals[0].centipawn_score(), None);
        assert_eq!(evals[1].centipawn_score(), Some(-40));
        assert_eq!(evals[1].mate_in(), None);
    }

    #[test]
    fn test_skips_empty_variations() {
        let (descriptor, board) = start();
        let lines = vec![
            line(1, Score::Centipawns(35), &[]),
            line(2, Score::Centipawns(30), &["d2d4"]),
        ];

        let evals = parse_search_lines(&descriptor, &board, &lines, 2).unwrap();
        assert_eq!(evals.len(), 1);
        assert_eq!(evals[0].uci_move, "d2d4");
    }

    #[test]
    fn test_truncates_to_breadth() {
        let (descriptor, board) = start();
        let lines = vec![
            line(1, Score::Centipawns(35), &["e2e4"]),
            line(2, Score::Centipawns(30), &["d2d4"]),
            line(3, Score::Centipawns(20), &["g1f3"]),
        ];

        let evals = parse_search_lines(&descriptor, &board, &lines, 2).unwrap();
        assert_eq!(evals.len(), 2);
    }

    #[test]
    fn test_no_usable_lines_is_an_error() {
        let (descriptor, board) = start();
        let lines = vec![line(1, Score::Mate(0), &[])];

        let err = parse_search_lines(&descriptor, &board, &lines, 3).unwrap_err();
        assert!(matches!(err, AnalysisError::NoMovesReturned { .. }));

        let err = parse_search_lines(&descriptor, &board, &[], 3).unwrap_err();
        assert!(matches!(err, AnalysisError::NoMovesReturned { .. }));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_illegal_engine_move_is_rejected() {
        let (descriptor, board) = start();
        let lines = vec![line(1, Score::Centipawns(35), &["e2e5"])];

        let err = parse_search_lines(&descriptor, &board, &lines, 1).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InvalidEngineOutput {
                position: STARTING_FEN.to_string(),
                uci_move: "e2e5".to_string(),
            }
        );
    }
}
