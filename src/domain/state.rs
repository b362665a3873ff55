//! The canonical, replayable game snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::cards::{Card, CardId};
use crate::domain::events::CardVisual;
use crate::domain::pile::{Pile, PileId};
use crate::domain::seats::{PlayerId, Seat};

/// A named action currently offered to a seat (or to everyone), for UI
/// affordances and AI candidate generation. Derived display metadata only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub id: String,
    pub label: String,
    /// Seat the action is offered to; `None` means any seat may take it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub title: String,
    pub rows: Vec<ScoreRow>,
}

/// Maximum announcements retained on the state; older ones roll off.
pub const ANNOUNCEMENT_RING: usize = 20;

/// The canonical snapshot of one game instance.
///
/// Created by a rule module's initializer, mutated only by replaying
/// `GameEvent`s through the reducer, retired when the session is closed.
/// The event log is the source of truth; this is always a derived,
/// replayable projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub game_id: i64,
    pub rules_id: String,
    /// Seed of the current deal; shuffles derive from it deterministically.
    pub seed: u64,
    /// Increments on each administrative re-deal (reset).
    pub deal_number: u32,
    pub seats: Vec<Seat>,
    pub piles: BTreeMap<PileId, Pile>,
    /// Per-game lookup of every card registered at creation.
    pub all_cards: BTreeMap<CardId, Card>,
    pub current_player: Option<PlayerId>,
    /// Terminal once set: no further move/action intents may mutate
    /// game-affecting state until an administrative reset clears it.
    pub winner: Option<PlayerId>,
    /// Opaque per-game payload; interpreted only by the owning rule module.
    pub rules_state: serde_json::Value,
    pub actions: Vec<ActionDescriptor>,
    pub scoreboards: Vec<Scoreboard>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub card_visuals: BTreeMap<CardId, CardVisual>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub announcements: Vec<String>,
}

impl GameState {
    /// Empty shell for a rule-module initializer to populate.
    pub fn new(game_id: i64, rules_id: impl Into<String>, seed: u64, seats: Vec<Seat>) -> Self {
        Self {
            game_id,
            rules_id: rules_id.into(),
            seed,
            deal_number: 1,
            seats,
            piles: BTreeMap::new(),
            all_cards: BTreeMap::new(),
            current_player: None,
            winner: None,
            rules_state: serde_json::Value::Null,
            actions: Vec::new(),
            scoreboards: Vec::new(),
            card_visuals: BTreeMap::new(),
            announcements: Vec::new(),
        }
    }

    pub fn seat(&self, player: PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id == player)
    }

    pub fn has_seat(&self, player: PlayerId) -> bool {
        self.seat(player).is_some()
    }

    pub fn push_announcement(&mut self, message: impl Into<String>) {
        self.announcements.push(message.into());
        if self.announcements.len() > ANNOUNCEMENT_RING {
            let drop = self.announcements.len() - ANNOUNCEMENT_RING;
            self.announcements.drain(..drop);
        }
    }
}
