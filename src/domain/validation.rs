//! The masked, read-only snapshot handed to a rule module.
//!
//! Pile summaries carry full card contents only where the rule module is
//! entitled to look: the acting player's own piles, globally public piles,
//! declared shared piles, and piles the module marks always-visible to the
//! rules (e.g. the stock it deals from).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::cards::{Card, CardId};
use crate::domain::pile::{Pile, PileId, PileProperties, PileVisibility};
use crate::domain::seats::{PlayerId, Seat};
use crate::domain::state::GameState;
use crate::engine::visibility::VisibilityHints;

/// One pile as seen by validation: always the shape, sometimes the contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PileSummary {
    pub id: PileId,
    pub owner: Option<PlayerId>,
    pub visibility: PileVisibility,
    pub size: usize,
    /// Full cards, present only when the rule module may see this pile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<Card>>,
    #[serde(default, skip_serializing_if = "PileProperties::is_empty")]
    pub properties: PileProperties,
}

impl PileSummary {
    pub fn contents(&self) -> Option<&[Card]> {
        self.cards.as_deref()
    }

    pub fn contains(&self, card: CardId) -> bool {
        self.cards
            .as_ref()
            .is_some_and(|cards| cards.iter().any(|c| c.id == card))
    }

    pub fn property_flag(&self, key: &str) -> bool {
        self.properties
            .get(key)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}

/// Read-only snapshot a rule module validates against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationState {
    pub game_id: i64,
    pub rules_id: String,
    pub seed: u64,
    pub deal_number: u32,
    pub seats: Vec<Seat>,
    pub current_player: Option<PlayerId>,
    pub winner: Option<PlayerId>,
    pub rules_state: serde_json::Value,
    pub piles: BTreeMap<PileId, PileSummary>,
    /// Seat the snapshot was masked for.
    pub acting_player: PlayerId,
}

impl ValidationState {
    /// Build the snapshot `acting_player`'s intent will be validated against.
    pub fn for_player(state: &GameState, acting_player: PlayerId, hints: &VisibilityHints) -> Self {
        let piles = state
            .piles
            .values()
            .map(|pile| {
                let id = pile.id.clone();
                (id, summarize(state, pile, acting_player, hints))
            })
            .collect();

        Self {
            game_id: state.game_id,
            rules_id: state.rules_id.clone(),
            seed: state.seed,
            deal_number: state.deal_number,
            seats: state.seats.clone(),
            current_player: state.current_player,
            winner: state.winner,
            rules_state: state.rules_state.clone(),
            piles,
            acting_player,
        }
    }

    pub fn pile(&self, id: &PileId) -> Option<&PileSummary> {
        self.piles.get(id)
    }

    pub fn has_seat(&self, player: PlayerId) -> bool {
        self.seats.iter().any(|s| s.id == player)
    }
}

fn summarize(
    state: &GameState,
    pile: &Pile,
    acting_player: PlayerId,
    hints: &VisibilityHints,
) -> PileSummary {
    let rules_may_see = pile.visibility == PileVisibility::Public
        || pile.owner == Some(acting_player)
        || hints.shared.contains(&pile.id)
        || hints.rules_visible.contains(&pile.id);

    let cards = rules_may_see.then(|| {
        pile.cards
            .iter()
            .filter_map(|id| state.all_cards.get(id).cloned())
            .collect()
    });

    PileSummary {
        id: pile.id.clone(),
        owner: pile.owner,
        visibility: pile.visibility,
        size: pile.len(),
        cards,
        properties: pile.properties.clone(),
    }
}
