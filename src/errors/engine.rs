//! Engine error taxonomy.
//!
//! Two disjoint classes of failure exist in this crate. Rule *rejections*
//! (wrong turn, illegal meld, malformed intent) are data: they travel as
//! `ValidationResult { valid: false, reason }` and never as an error.
//! `EngineError` covers everything else: structural defects during event
//! application, unknown games, capacity limits, and halted instances.

use thiserror::Error;

use crate::domain::pile::PileId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("unknown game: {game_id}")]
    UnknownGame { game_id: i64 },

    #[error("game already exists: {game_id}")]
    GameExists { game_id: i64 },

    #[error("unknown rules id: {rules_id}")]
    UnknownRules { rules_id: String },

    #[error("capacity exceeded: {detail}")]
    CapacityExceeded { detail: String },

    #[error("game {game_id} halted after structural failure: {detail}")]
    Halted { game_id: i64, detail: String },

    #[error("game {game_id} is closed")]
    Closed { game_id: i64 },

    #[error("invalid game setup: {detail}")]
    InvalidSetup { detail: String },

    /// A defect, not a rule rejection: an event referenced state that does
    /// not exist (missing pile, card absent from its source pile, unknown
    /// seat). Replay must stop rather than silently continue.
    #[error("structural failure: {detail}")]
    Structural { detail: String },
}

impl EngineError {
    pub fn structural(detail: impl Into<String>) -> Self {
        Self::Structural {
            detail: detail.into(),
        }
    }

    pub fn invalid_setup(detail: impl Into<String>) -> Self {
        Self::InvalidSetup {
            detail: detail.into(),
        }
    }

    pub fn missing_pile(pile: &PileId) -> Self {
        Self::structural(format!("pile not found: {pile}"))
    }

    /// Stable machine-readable code for each variant.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::UnknownGame { .. } => "UNKNOWN_GAME",
            EngineError::GameExists { .. } => "GAME_EXISTS",
            EngineError::UnknownRules { .. } => "UNKNOWN_RULES",
            EngineError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            EngineError::Halted { .. } => "HALTED",
            EngineError::Closed { .. } => "CLOSED",
            EngineError::InvalidSetup { .. } => "INVALID_SETUP",
            EngineError::Structural { .. } => "STRUCTURAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(EngineError::UnknownGame { game_id: 7 }.code(), "UNKNOWN_GAME");
        assert_eq!(EngineError::structural("x").code(), "STRUCTURAL");
    }

    #[test]
    fn display_includes_detail() {
        let err = EngineError::structural("card 9 absent from pile stock");
        assert!(err.to_string().contains("card 9 absent"));
    }
}
