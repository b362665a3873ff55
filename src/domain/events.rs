//! Engine events: the closed set of primitive state mutations.
//!
//! Events are produced only by rule-module validation, never by clients
//! directly. The reducer in `engine::projection` matches exhaustively over
//! this enum, so adding a variant is a compile-visible change everywhere it
//! matters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::cards::CardId;
use crate::domain::pile::{PileId, PileProperties, PileVisibility};
use crate::domain::seats::PlayerId;
use crate::domain::state::{ActionDescriptor, Scoreboard};

/// Display attributes attached to a card (rotation, markers); interpreted by
/// renderers, carried opaquely by the engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CardVisual {
    #[serde(default)]
    pub rotated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
}

/// A primitive, typed state mutation emitted by a rule module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EngineEvent {
    /// Remove `cards` from `from` (in their pile order) and append them, in
    /// the order given, to `to`. Structurally invalid if any id is absent
    /// from the source pile.
    MoveCards {
        from: PileId,
        to: PileId,
        cards: Vec<CardId>,
        /// Seats the moved cards are explicitly revealed to, beyond what the
        /// destination pile's visibility already grants.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        reveal_to: Vec<PlayerId>,
    },
    SetCurrentPlayer {
        player: Option<PlayerId>,
    },
    SetWinner {
        player: Option<PlayerId>,
    },
    SetRulesState {
        payload: serde_json::Value,
    },
    SetActions {
        actions: Vec<ActionDescriptor>,
    },
    SetScoreboards {
        scoreboards: Vec<Scoreboard>,
    },
    SetPileVisibility {
        pile: PileId,
        visibility: PileVisibility,
    },
    SetCardVisuals {
        visuals: BTreeMap<CardId, CardVisual>,
    },
    SetPileProperties {
        pile: PileId,
        properties: PileProperties,
    },
    Announce {
        message: String,
    },
    /// Structural-failure signal surfaced to viewers; terminal for the
    /// instance until reset.
    FatalError {
        message: String,
    },
}

impl EngineEvent {
    pub fn move_cards(from: impl Into<PileId>, to: impl Into<PileId>, cards: Vec<CardId>) -> Self {
        Self::MoveCards {
            from: from.into(),
            to: to.into(),
            cards,
            reveal_to: Vec::new(),
        }
    }
}

/// A persisted `EngineEvent` with log metadata: the unit appended to the
/// per-game event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// 1-based position in the game's log.
    pub seq: u64,
    pub game_id: i64,
    /// Seat whose accepted intent produced this event, if any.
    pub player: Option<PlayerId>,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
    pub event: EngineEvent,
}
