//! UCI line protocol
//!
//! Command builders and `info` line parsing. This is the only module that
//! knows the textual protocol; everything above it works with [`SearchLine`].

use super::SearchLine;
use crate::types::Score;

pub const UCI: &str = "uci";
pub const UCI_OK: &str = "uciok";
pub const IS_READY: &str = "isready";
pub const READY_OK: &str = "readyok";
pub const QUIT: &str = "quit";

/// `info` keys followed by exactly one value we do not use
const SINGLE_VALUE_KEYS: &[&str] = &[
    "seldepth",
    "time",
    "nodes",
    "nps",
    "hashfull",
    "tbhits",
    "sbhits",
    "cpuload",
    "currmove",
    "currmovenumber",
];

pub fn set_option(name: &str, value: impl std::fmt::Display) -> String {
    format!("setoption name {} value {}", name, value)
}

pub fn position_fen(fen: &str) -> String {
    format!("position fen {}", fen)
}

pub fn go_depth(depth: u32) -> String {
    format!("go depth {}", depth)
}

pub fn is_bestmove(line: &str) -> bool {
    line.split_whitespace().next() == Some("bestmove")
}

/// Parse one `info` line carrying a score
///
/// Returns `None` for non-`info` lines, `info string` chatter, lines without a
/// score, and bound-only scores (`lowerbound`/`upperbound`), which are
/// provisional. The `multipv` index defaults to 1 for single-line searches.
///
/// # Example
///
/// ```
/// use analysis_core::engine::uci::parse_info_line;
///
/// let line = parse_info_line("info depth 12 multipv 2 score cp -15 nodes 1000 pv d2d4 d7d5").unwrap();
/// assert_eq!(line.multipv, 2);
/// assert_eq!(line.pv, vec!["d2d4", "d7d5"]);
/// ```
pub fn parse_info_line(line: &str) -> Option<SearchLine> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("info") {
        return None;
    }

    let mut depth = None;
    let mut multipv = 1;
    let mut score = None;
    let mut bounded = false;
    let mut pv = Vec::new();

    while let Some(token) = tokens.next() {
        match token {
            "depth" => depth = tokens.next().and_then(|v| v.parse().ok()),
            "multipv" => multipv = tokens.next().and_then(|v| v.parse().ok())?,
            "score" => {
                let kind = tokens.next()?;
                let value: i32 = tokens.next()?.parse().ok()?;
                score = match kind {
                    "cp" => Some(Score::Centipawns(value)),
                    "mate" => Some(Score::Mate(value)),
                    _ => return None,
                };
            }
            "lowerbound" | "upperbound" => bounded = true,
            "wdl" => {
                tokens.nth(2);
            }
            "string" => return None,
            "pv" => {
                pv = tokens.by_ref().map(str::to_string).collect();
            }
            key if SINGLE_VALUE_KEYS.contains(&key) => {
                tokens.next();
            }
            _ => {}
        }
    }

    if bounded {
        return None;
    }
    Some(SearchLine {
        multipv,
        depth: depth?,
        score: score?,
        pv,
    })
}
