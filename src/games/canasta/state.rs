//! Canasta's per-game rules payload and the scoring arithmetic tables.

use serde::{Deserialize, Serialize};

use crate::domain::cards::{Card, Rank};
use crate::domain::seats::PlayerId;

pub const SEATS: usize = 4;
pub const TEAMS: usize = 2;
pub const HAND_SIZE: usize = 11;
pub const CANASTA_SIZE: usize = 7;
pub const MAX_WILDS_PER_MELD: usize = 3;
pub const TARGET_SCORE: i32 = 5000;

/// Where the seat to act stands within its turn.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnPhase {
    /// Must draw from the stock or pick up the discard pile.
    MustDraw,
    /// May meld any number of times, then must discard (or go out).
    MeldOrDiscard,
    /// Hand is scored; waiting for `start-next-hand`.
    HandComplete,
}

/// Derived affordances serialized inside the rules payload for AI drivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiHints {
    pub to_act: Option<PlayerId>,
    pub actions: Vec<String>,
    pub meld_minimum: [i32; TEAMS],
}

/// The module-owned payload carried in `GameState::rules_state`.
///
/// Replaced wholesale by a `SetRulesState` event in every accepted batch,
/// so replaying the log always reproduces it exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanastaState {
    pub phase: TurnPhase,
    pub dealer: PlayerId,
    pub hand_number: u32,
    pub team_scores: [i32; TEAMS],
    /// Whether each team has made its initial meld this hand.
    pub team_melded: [bool; TEAMS],
    /// The discard pile is frozen (a wild was discarded onto it or flipped
    /// as the upcard); picking it up then requires a natural pair.
    pub frozen: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_hints: Option<AiHints>,
}

impl CanastaState {
    pub fn from_value(value: &serde_json::Value) -> Result<Self, String> {
        serde_json::from_value(value.clone()).map_err(|err| err.to_string())
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Seats 0/2 are team 0, seats 1/3 are team 1.
pub fn team_of(player: PlayerId) -> usize {
    (player % 2) as usize
}

pub fn is_wild(rank: Rank) -> bool {
    matches!(rank, Rank::Joker | Rank::Two)
}

pub fn is_red_three(card: &Card) -> bool {
    card.rank == Rank::Three && card.suit.is_red()
}

/// Point value of one card, melded or counted against a hand.
///
/// Red threes are never valued through this table; they carry their own
/// bonus accounting in `scoring`.
pub fn card_value(rank: Rank) -> i32 {
    match rank {
        Rank::Joker => 50,
        Rank::Two | Rank::Ace => 20,
        Rank::Eight
        | Rank::Nine
        | Rank::Ten
        | Rank::Jack
        | Rank::Queen
        | Rank::King => 10,
        Rank::Three | Rank::Four | Rank::Five | Rank::Six | Rank::Seven => 5,
    }
}

/// Minimum count value a team's first meld of a hand must reach, by the
/// team's total score entering the hand.
pub fn initial_meld_minimum(team_score: i32) -> i32 {
    if team_score < 0 {
        15
    } else if team_score < 1500 {
        50
    } else if team_score < 3000 {
        90
    } else {
        120
    }
}
