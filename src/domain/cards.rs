//! Core card types: CardId, Rank, Suit, Card, and deck builders.

use serde::{Deserialize, Serialize};

/// Stable integer identity of a card for the lifetime of a game instance.
///
/// Registered once at game creation in `GameState::all_cards`; piles hold
/// ordered lists of these ids, never card copies.
pub type CardId = u32;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub fn is_red(self) -> bool {
        matches!(self, Suit::Diamonds | Suit::Hearts)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
    Joker,
}

impl Rank {
    /// The thirteen ranks of a standard deck, low to high. Excludes Joker.
    pub const STANDARD: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];
}

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub rank: Rank,
    pub suit: Suit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Card {
    pub fn new(id: CardId, rank: Rank, suit: Suit) -> Self {
        Self {
            id,
            rank,
            suit,
            label: None,
        }
    }

    pub fn with_label(id: CardId, rank: Rank, suit: Suit, label: impl Into<String>) -> Self {
        Self {
            id,
            rank,
            suit,
            label: Some(label.into()),
        }
    }
}

/// Build a standard 52-card deck with ids `first_id..first_id + 52`.
///
/// Order is suits C, D, H, S, each Two..Ace, matching the id sequence; any
/// shuffle is the caller's job.
pub fn standard_deck(first_id: CardId) -> Vec<Card> {
    let mut deck = Vec::with_capacity(52);
    let mut id = first_id;
    for suit in Suit::ALL {
        for rank in Rank::STANDARD {
            deck.push(Card::new(id, rank, suit));
            id += 1;
        }
    }
    deck
}

/// Build `jokers` joker cards with ids starting at `first_id`.
///
/// Jokers alternate red/black suits so renderers can pick art; the suit has
/// no rule meaning for a joker.
pub fn joker_cards(first_id: CardId, jokers: u32) -> Vec<Card> {
    (0..jokers)
        .map(|n| {
            let suit = if n % 2 == 0 { Suit::Hearts } else { Suit::Spades };
            Card::with_label(first_id + n, Rank::Joker, suit, "Joker")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_deck_has_52_unique_ids() {
        let deck = standard_deck(1);
        assert_eq!(deck.len(), 52);
        let mut ids: Vec<CardId> = deck.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 52);
        assert_eq!(ids[0], 1);
        assert_eq!(ids[51], 52);
    }

    #[test]
    fn standard_deck_has_no_jokers() {
        assert!(standard_deck(1).iter().all(|c| c.rank != Rank::Joker));
    }

    #[test]
    fn jokers_are_labeled() {
        let jokers = joker_cards(105, 4);
        assert_eq!(jokers.len(), 4);
        assert!(jokers.iter().all(|c| c.rank == Rank::Joker));
        assert!(jokers.iter().all(|c| c.label.as_deref() == Some("Joker")));
        assert_eq!(jokers[0].id, 105);
        assert_eq!(jokers[3].id, 108);
    }
}
