//! Intents: client-proposed actions, and the result of validating one.

use serde::{Deserialize, Serialize};

use crate::domain::cards::CardId;
use crate::domain::events::EngineEvent;
use crate::domain::pile::PileId;
use crate::domain::seats::PlayerId;

/// A proposed move or named action in engine card-id space. Ephemeral:
/// intents are never persisted, only the events they produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Intent {
    Move {
        game_id: i64,
        player: PlayerId,
        from: PileId,
        to: PileId,
        cards: Vec<CardId>,
    },
    Action {
        game_id: i64,
        player: PlayerId,
        action_id: String,
    },
}

impl Intent {
    pub fn game_id(&self) -> i64 {
        match self {
            Intent::Move { game_id, .. } | Intent::Action { game_id, .. } => *game_id,
        }
    }

    pub fn player(&self) -> PlayerId {
        match self {
            Intent::Move { player, .. } | Intent::Action { player, .. } => *player,
        }
    }

    pub fn action(game_id: i64, player: PlayerId, action_id: impl Into<String>) -> Self {
        Self::Action {
            game_id,
            player,
            action_id: action_id.into(),
        }
    }
}

/// An intent as a client submits it: card references are viewer-specific
/// opaque ids and must be resolved through the game's obfuscation mapping
/// before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ViewIntent {
    Move {
        game_id: i64,
        player: PlayerId,
        from: PileId,
        to: PileId,
        cards: Vec<u64>,
    },
    Action {
        game_id: i64,
        player: PlayerId,
        action_id: String,
    },
}

/// Outcome of `RuleModule::validate`. Rejections are data, never errors,
/// and carry no events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EngineEvent>,
}

impl ValidationResult {
    pub fn accept(events: Vec<EngineEvent>) -> Self {
        Self {
            valid: true,
            reason: None,
            events,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
            events: Vec::new(),
        }
    }
}
