//! Request inputs: position descriptors and search parameters
//!
//! Validation here is purely structural. Whether a FEN describes a legal
//! board is decided later by the rules engine in [`crate::rules`].

use crate::error::{AnalysisError, AnalysisOutcome};
use std::fmt;

/// Minimum whitespace-separated FEN fields: placement, side, castling, en passant
const MIN_FEN_FIELDS: usize = 4;

pub const MIN_DEPTH: u32 = 1;
pub const MAX_DEPTH: u32 = 30;
pub const MIN_BREADTH: u32 = 1;
pub const MAX_BREADTH: u32 = 5;

/// A trimmed FEN string that passed structural validation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionDescriptor(String);

impl PositionDescriptor {
    /// Validate a raw descriptor
    ///
    /// Fails with [`AnalysisError::MalformedPosition`] when the trimmed input has
    /// fewer than four whitespace-separated fields. No legality checks.
    pub fn validate(raw: &str) -> AnalysisOutcome<Self> {
        let trimmed = raw.trim();
        let fields = trimmed.split_whitespace().count();
        if fields < MIN_FEN_FIELDS {
            return Err(AnalysisError::malformed(format!(
                "must have at least {} parts, got {}",
                MIN_FEN_FIELDS, fields
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PositionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Effective search bounds for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisParameters {
    depth: u32,
    breadth: u32,
}

impl AnalysisParameters {
    pub fn new(depth: u32, breadth: u32) -> AnalysisOutcome<Self> {
        check_range("depth", depth, MIN_DEPTH, MAX_DEPTH)?;
        check_range("breadth", breadth, MIN_BREADTH, MAX_BREADTH)?;
        Ok(Self { depth, breadth })
    }

    /// Fill in whatever the request left out from the configured defaults
    pub fn resolve(
        depth: Option<u32>,
        breadth: Option<u32>,
        defaults: AnalysisParameters,
    ) -> AnalysisOutcome<Self> {
        Self::new(
            depth.unwrap_or(defaults.depth),
            breadth.unwrap_or(defaults.breadth),
        )
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn breadth(&self) -> u32 {
        self.breadth
    }
}

fn check_range(field: &str, value: u32, min: u32, max: u32) -> AnalysisOutcome<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(AnalysisError::InvalidParameters {
            message: format!("{field} must be between {min} and {max}, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_validate_accepts_full_fen() {
        let position = PositionDescriptor::validate(STARTING_FEN).unwrap();
        assert_eq!(position.as_str(), STARTING_FEN);
    }

    #[test]
    fn test_validate_trims_whitespace() {
        let padded = format!("  {}\n", STARTING_FEN);
        let position = PositionDescriptor::validate(&padded).unwrap();
        assert_eq!(position.as_str(), STARTING_FEN);
    }

    #[test]
    fn test_validate_accepts_four_fields() {
        assert!(PositionDescriptor::validate("8/8/8/8/8/8/8/K6k w - -").is_ok());
    }

    #[test]
    fn test_validate_rejects_three_fields() {
        let err = PositionDescriptor::validate("8/8/8/8/8/8/8/K6k w -").unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedPosition { .. }));
    }

    #[test]
    fn test_validate_rejects_garbage() {
        assert!(PositionDescriptor::validate("not_a_valid_fen").is_err());
        assert!(PositionDescriptor::validate("").is_err());
        assert!(PositionDescriptor::validate("   ").is_err());
    }

    #[test]
    fn test_parameters_bounds() {
        assert!(AnalysisParameters::new(1, 1).is_ok());
        assert!(AnalysisParameters::new(30, 5).is_ok());
        assert!(AnalysisParameters::new(0, 3).is_err());
        assert!(AnalysisParameters::new(31, 3).is_err());
        assert!(AnalysisParameters::new(10, 0).is_err());
        assert!(AnalysisParameters::new(10, 6).is_err());
    }

    #[test]
    fn test_parameters_resolve_uses_defaults() {
        let defaults = AnalysisParameters::new(20, 3).unwrap();

        let params = AnalysisParameters::resolve(None, None, defaults).unwrap();
        assert_eq!(params, defaults);

        let params = AnalysisParameters::resolve(Some(5), None, defaults).unwrap();
        assert_eq!(params.depth(), 5);
        assert_eq!(params.breadth(), 3);

        let err = AnalysisParameters::resolve(None, Some(9), defaults).unwrap_err();
        assert!(err.is_client_error());
    }
}
