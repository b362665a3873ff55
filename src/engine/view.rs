//! Per-viewer views: masked snapshots and translated event feeds.
//!
//! Every card id leaving the engine is the viewer's opaque id; real rank and
//! suit ride along only where the viewer is entitled to see them. The same
//! machinery rewrites event batches for display, attaching reveal data for
//! cards that land on a surface the viewer can see.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::cards::{Card, Rank, Suit};
use crate::domain::events::{CardVisual, EngineEvent, GameEvent};
use crate::domain::pile::{PileId, PileProperties, PileVisibility};
use crate::domain::seats::PlayerId;
use crate::domain::state::{ActionDescriptor, GameState, Scoreboard};
use crate::engine::obfuscation::{view_card_id, ViewCardId, ViewSalt};
use crate::engine::projection::apply_event;
use crate::engine::visibility::{is_pile_visible_to_player, VisibilityHints};
use crate::errors::engine::EngineError;

/// Real card data attached to an opaque id once the viewer may see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardFace {
    pub rank: Rank,
    pub suit: Suit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl CardFace {
    fn of(card: &Card) -> Self {
        Self {
            rank: card.rank,
            suit: card.suit,
            label: card.label.clone(),
        }
    }
}

/// One card as a viewer sees it: always an opaque id, a face only when
/// entitled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardView {
    pub id: ViewCardId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<CardFace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual: Option<CardVisual>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PileView {
    pub id: PileId,
    pub owner: Option<PlayerId>,
    pub visibility: PileVisibility,
    pub size: usize,
    pub cards: Vec<CardView>,
    #[serde(default, skip_serializing_if = "PileProperties::is_empty")]
    pub properties: PileProperties,
}

/// Public seat info; AI sponsorship stays server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatView {
    pub id: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub is_ai: bool,
}

/// A masked, id-remapped snapshot for one viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    pub game_id: i64,
    pub rules_id: String,
    pub viewer: PlayerId,
    pub deal_number: u32,
    /// Log sequence this view reflects; feed requests resume from here.
    pub seq: u64,
    pub seats: Vec<SeatView>,
    pub piles: BTreeMap<PileId, PileView>,
    pub current_player: Option<PlayerId>,
    pub winner: Option<PlayerId>,
    pub actions: Vec<ActionDescriptor>,
    pub scoreboards: Vec<Scoreboard>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub announcements: Vec<String>,
}

/// Build `viewer`'s view of `state`.
pub fn build_view(
    state: &GameState,
    viewer: PlayerId,
    salt: &ViewSalt,
    hints: &VisibilityHints,
    seq: u64,
) -> GameView {
    let piles = state
        .piles
        .values()
        .map(|pile| {
            let visible = is_pile_visible_to_player(pile, viewer, hints);
            let cards = pile
                .cards
                .iter()
                .map(|&card_id| {
                    let face = visible
                        .then(|| state.all_cards.get(&card_id).map(CardFace::of))
                        .flatten();
                    CardView {
                        id: view_card_id(card_id, salt, viewer),
                        face,
                        visual: state.card_visuals.get(&card_id).cloned(),
                    }
                })
                .collect();
            let view = PileView {
                id: pile.id.clone(),
                owner: pile.owner,
                visibility: pile.visibility,
                size: pile.len(),
                cards,
                properties: pile.properties.clone(),
            };
            (pile.id.clone(), view)
        })
        .collect();

    GameView {
        game_id: state.game_id,
        rules_id: state.rules_id.clone(),
        viewer,
        deal_number: state.deal_number,
        seq,
        seats: state
            .seats
            .iter()
            .map(|s| SeatView {
                id: s.id,
                name: s.name.clone(),
                is_ai: s.is_ai,
            })
            .collect(),
        piles,
        current_player: state.current_player,
        winner: state.winner,
        actions: state.actions.clone(),
        scoreboards: state.scoreboards.clone(),
        announcements: state.announcements.clone(),
    }
}

/// An engine event rewritten for one viewer. `set-rules-state` never
/// appears here: its payload may derive from piles the viewer cannot see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ViewEvent {
    MoveCards {
        from: PileId,
        to: PileId,
        cards: Vec<CardView>,
    },
    SetCurrentPlayer {
        player: Option<PlayerId>,
    },
    SetWinner {
        player: Option<PlayerId>,
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
        visuals: BTreeMap<ViewCardId, CardVisual>,
    },
    SetPileProperties {
        pile: PileId,
        properties: PileProperties,
    },
    Announce {
        message: String,
    },
    FatalError {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewGameEvent {
    pub seq: u64,
    pub player: Option<PlayerId>,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
    pub event: ViewEvent,
}

/// Rewrite `events` for `viewer`, starting from the state just before the
/// first of them.
///
/// Each `move-cards` is translated against the state *after* it applies, so
/// a card moved onto a surface the viewer can see arrives with its face
/// attached, and a card moved out of sight arrives bare.
pub fn translate_events_for_viewer(
    state_before: &GameState,
    events: &[GameEvent],
    viewer: PlayerId,
    salt: &ViewSalt,
    hints: &VisibilityHints,
) -> Result<Vec<ViewGameEvent>, EngineError> {
    let mut scratch = state_before.clone();
    let mut translated = Vec::with_capacity(events.len());

    for entry in events {
        apply_event(&mut scratch, &entry.event).map_err(|err| {
            EngineError::structural(format!("translation replay failed at seq {}: {err}", entry.seq))
        })?;

        let event = match &entry.event {
            EngineEvent::MoveCards {
                from,
                to,
                cards,
                reveal_to,
            } => {
                let dest_visible = scratch
                    .piles
                    .get(to)
                    .is_some_and(|pile| is_pile_visible_to_player(pile, viewer, hints));
                let revealed = dest_visible || reveal_to.contains(&viewer);
                let cards = cards
                    .iter()
                    .map(|&card_id| CardView {
                        id: view_card_id(card_id, salt, viewer),
                        face: revealed
                            .then(|| scratch.all_cards.get(&card_id).map(CardFace::of))
                            .flatten(),
                        visual: scratch.card_visuals.get(&card_id).cloned(),
                    })
                    .collect();
                Some(ViewEvent::MoveCards {
                    from: from.clone(),
                    to: to.clone(),
                    cards,
                })
            }
            EngineEvent::SetCurrentPlayer { player } => {
                Some(ViewEvent::SetCurrentPlayer { player: *player })
            }
            EngineEvent::SetWinner { player } => Some(ViewEvent::SetWinner { player: *player }),
            EngineEvent::SetRulesState { .. } => None,
            EngineEvent::SetActions { actions } => Some(ViewEvent::SetActions {
                actions: actions.clone(),
            }),
            EngineEvent::SetScoreboards { scoreboards } => Some(ViewEvent::SetScoreboards {
                scoreboards: scoreboards.clone(),
            }),
            EngineEvent::SetPileVisibility { pile, visibility } => {
                Some(ViewEvent::SetPileVisibility {
                    pile: pile.clone(),
                    visibility: *visibility,
                })
            }
            EngineEvent::SetCardVisuals { visuals } => Some(ViewEvent::SetCardVisuals {
                visuals: visuals
                    .iter()
                    .map(|(&card_id, visual)| (view_card_id(card_id, salt, viewer), visual.clone()))
                    .collect(),
            }),
            EngineEvent::SetPileProperties { pile, properties } => {
                Some(ViewEvent::SetPileProperties {
                    pile: pile.clone(),
                    properties: properties.clone(),
                })
            }
            EngineEvent::Announce { message } => Some(ViewEvent::Announce {
                message: message.clone(),
            }),
            EngineEvent::FatalError { message } => Some(ViewEvent::FatalError {
                message: message.clone(),
            }),
        };

        if let Some(event) = event {
            translated.push(ViewGameEvent {
                seq: entry.seq,
                player: entry.player,
                at: entry.at,
                event,
            });
        }
    }

    Ok(translated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pile::Pile;
    use crate::domain::seats::Seat;

    fn fixture() -> GameState {
        let mut state = GameState::new(4, "test", 0, vec![Seat::human(0, "a"), Seat::human(1, "b")]);
        for id in 1..=3u32 {
            state
                .all_cards
                .insert(id, Card::new(id, Rank::STANDARD[id as usize], Suit::Spades));
        }
        let mut stock = Pile::new(PileId::from("stock"), None, PileVisibility::Hidden);
        stock.cards = vec![1, 2];
        let mut hand = Pile::new(PileId::from("hand-0"), Some(0), PileVisibility::Owner);
        hand.cards = vec![3];
        state.piles.insert(stock.id.clone(), stock);
        state.piles.insert(hand.id.clone(), hand);
        state
    }

    #[test]
    fn concealed_cards_have_no_face() {
        let state = fixture();
        let salt = ViewSalt::from_bytes([3u8; 32]);
        let view = build_view(&state, 1, &salt, &VisibilityHints::default(), 0);
        let stock = &view.piles[&PileId::from("stock")];
        assert_eq!(stock.cards.len(), 2);
        assert!(stock.cards.iter().all(|c| c.face.is_none()));
        // Viewer 1 cannot see seat 0's hand either.
        let hand = &view.piles[&PileId::from("hand-0")];
        assert!(hand.cards[0].face.is_none());
    }

    #[test]
    fn own_hand_shows_faces_with_opaque_ids() {
        let state = fixture();
        let salt = ViewSalt::from_bytes([3u8; 32]);
        let view = build_view(&state, 0, &salt, &VisibilityHints::default(), 0);
        let hand = &view.piles[&PileId::from("hand-0")];
        let card = &hand.cards[0];
        assert!(card.face.is_some());
        assert_eq!(card.id, view_card_id(3, &salt, 0));
    }

    #[test]
    fn move_into_visible_pile_attaches_face() {
        let state = fixture();
        let salt = ViewSalt::from_bytes([3u8; 32]);
        let hints = VisibilityHints::default();
        let entry = GameEvent {
            seq: 1,
            game_id: 4,
            player: Some(0),
            at: OffsetDateTime::UNIX_EPOCH,
            event: EngineEvent::move_cards("stock", "hand-0", vec![2]),
        };
        let for_owner =
            translate_events_for_viewer(&state, std::slice::from_ref(&entry), 0, &salt, &hints)
                .unwrap();
        let ViewEvent::MoveCards { cards, .. } = &for_owner[0].event else {
            panic!("expected move-cards");
        };
        assert!(cards[0].face.is_some());

        let for_opponent =
            translate_events_for_viewer(&state, std::slice::from_ref(&entry), 1, &salt, &hints)
                .unwrap();
        let ViewEvent::MoveCards { cards, .. } = &for_opponent[0].event else {
            panic!("expected move-cards");
        };
        assert!(cards[0].face.is_none());
        // Different viewers see different opaque ids for the same card.
        let ViewEvent::MoveCards { cards: owner_cards, .. } = &for_owner[0].event else {
            unreachable!()
        };
        assert_ne!(owner_cards[0].id, cards[0].id);
    }

    #[test]
    fn rules_state_events_are_dropped_from_feeds() {
        let state = fixture();
        let salt = ViewSalt::from_bytes([3u8; 32]);
        let entry = GameEvent {
            seq: 1,
            game_id: 4,
            player: None,
            at: OffsetDateTime::UNIX_EPOCH,
            event: EngineEvent::SetRulesState {
                payload: serde_json::json!({"secret": true}),
            },
        };
        let feed = translate_events_for_viewer(
            &state,
            std::slice::from_ref(&entry),
            0,
            &salt,
            &VisibilityHints::default(),
        )
        .unwrap();
        assert!(feed.is_empty());
    }
}
