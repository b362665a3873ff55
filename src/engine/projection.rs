//! Pure replay: the total reducer over `EngineEvent` and the projections
//! built on it.
//!
//! Failures here are structural, never rule rejections: a missing pile or a
//! card absent from its claimed source means a rule-module bug or log
//! corruption, and replay must stop for that instance.

use std::collections::BTreeMap;

use crate::domain::events::{EngineEvent, GameEvent};
use crate::domain::pile::PileId;
use crate::domain::state::GameState;
use crate::domain::validation::{PileSummary, ValidationState};
use crate::engine::log::EventLog;
use crate::errors::engine::EngineError;

/// Apply one event to the state. Total over the closed event set.
pub fn apply_event(state: &mut GameState, event: &EngineEvent) -> Result<(), EngineError> {
    match event {
        EngineEvent::MoveCards {
            from, to, cards, ..
        } => move_cards(state, from, to, cards),
        EngineEvent::SetCurrentPlayer { player } => {
            if let Some(p) = player {
                if !state.has_seat(*p) {
                    return Err(EngineError::structural(format!(
                        "set-current-player references unknown seat {p}"
                    )));
                }
            }
            state.current_player = *player;
            Ok(())
        }
        EngineEvent::SetWinner { player } => {
            if let Some(p) = player {
                if !state.has_seat(*p) {
                    return Err(EngineError::structural(format!(
                        "set-winner references unknown seat {p}"
                    )));
                }
            }
            state.winner = *player;
            Ok(())
        }
        EngineEvent::SetRulesState { payload } => {
            state.rules_state = payload.clone();
            Ok(())
        }
        EngineEvent::SetActions { actions } => {
            state.actions = actions.clone();
            Ok(())
        }
        EngineEvent::SetScoreboards { scoreboards } => {
            state.scoreboards = scoreboards.clone();
            Ok(())
        }
        EngineEvent::SetPileVisibility { pile, visibility } => {
            let pile = state
                .piles
                .get_mut(pile)
                .ok_or_else(|| EngineError::missing_pile(pile))?;
            pile.visibility = *visibility;
            Ok(())
        }
        EngineEvent::SetCardVisuals { visuals } => {
            for (card, visual) in visuals {
                if !state.all_cards.contains_key(card) {
                    return Err(EngineError::structural(format!(
                        "set-card-visuals references unknown card {card}"
                    )));
                }
                state.card_visuals.insert(*card, visual.clone());
            }
            Ok(())
        }
        EngineEvent::SetPileProperties { pile, properties } => {
            let pile = state
                .piles
                .get_mut(pile)
                .ok_or_else(|| EngineError::missing_pile(pile))?;
            pile.properties = properties.clone();
            Ok(())
        }
        EngineEvent::Announce { message } => {
            state.push_announcement(message.clone());
            Ok(())
        }
        EngineEvent::FatalError { message } => {
            state.push_announcement(format!("fatal error: {message}"));
            Ok(())
        }
    }
}

fn move_cards(
    state: &mut GameState,
    from: &PileId,
    to: &PileId,
    cards: &[u32],
) -> Result<(), EngineError> {
    if !state.piles.contains_key(to) {
        return Err(EngineError::missing_pile(to));
    }
    let source = state
        .piles
        .get_mut(from)
        .ok_or_else(|| EngineError::missing_pile(from))?;

    for (n, &card) in cards.iter().enumerate() {
        if !source.contains(card) {
            return Err(EngineError::structural(format!(
                "card {card} absent from source pile {from}"
            )));
        }
        // A repeated id would be removed once and appended twice, leaving
        // the card in two places.
        if cards[..n].contains(&card) {
            return Err(EngineError::structural(format!(
                "card {card} listed more than once in move from {from}"
            )));
        }
    }

    // Remove in source-pile order, preserving the order of what remains.
    source.cards.retain(|id| !cards.contains(id));

    let dest = state
        .piles
        .get_mut(to)
        .ok_or_else(|| EngineError::missing_pile(to))?;
    // Append in the order the event gives.
    dest.cards.extend_from_slice(cards);
    Ok(())
}

/// Replay the full log from its initial state.
pub fn project_state(log: &EventLog) -> Result<GameState, EngineError> {
    project_state_with_events(log.initial(), log.events())
}

/// Replay an explicit event list against an initial state. Used to
/// reconstruct intermediate snapshots (e.g. the board just before the most
/// recent batch) without touching the live log twice.
pub fn project_state_with_events(
    initial: &GameState,
    events: &[GameEvent],
) -> Result<GameState, EngineError> {
    let mut state = initial.clone();
    for entry in events {
        apply_event(&mut state, &entry.event).map_err(|err| {
            EngineError::structural(format!("replay failed at seq {}: {err}", entry.seq))
        })?;
    }
    Ok(state)
}

/// Project pile summaries as they would look after `pending` events landed.
///
/// Used inside a rule module while composing a still-uncommitted batch, so
/// later checks can reason about the board as if earlier events in the
/// batch had already applied, without mutating real state. Only pile-shaped
/// events matter here; everything else is ignored.
pub fn project_piles_after_events(
    state: &ValidationState,
    pending: &[EngineEvent],
) -> Result<BTreeMap<PileId, PileSummary>, EngineError> {
    let mut piles = state.piles.clone();
    for event in pending {
        match event {
            EngineEvent::MoveCards {
                from, to, cards, ..
            } => {
                let source = piles
                    .get_mut(from)
                    .ok_or_else(|| EngineError::missing_pile(from))?;
                let Some(source_cards) = source.cards.as_mut() else {
                    return Err(EngineError::structural(format!(
                        "pending move reads concealed pile {from}"
                    )));
                };
                let mut moved = Vec::with_capacity(cards.len());
                for &card in cards {
                    let Some(pos) = source_cards.iter().position(|c| c.id == card) else {
                        return Err(EngineError::structural(format!(
                            "card {card} absent from source pile {from} in pending batch"
                        )));
                    };
                    moved.push(source_cards.remove(pos));
                }
                source.size = source_cards.len();

                let dest = piles
                    .get_mut(to)
                    .ok_or_else(|| EngineError::missing_pile(to))?;
                dest.size += moved.len();
                if let Some(dest_cards) = dest.cards.as_mut() {
                    dest_cards.extend(moved);
                }
            }
            EngineEvent::SetPileVisibility { pile, visibility } => {
                let summary = piles
                    .get_mut(pile)
                    .ok_or_else(|| EngineError::missing_pile(pile))?;
                summary.visibility = *visibility;
            }
            EngineEvent::SetPileProperties { pile, properties } => {
                let summary = piles
                    .get_mut(pile)
                    .ok_or_else(|| EngineError::missing_pile(pile))?;
                summary.properties = properties.clone();
            }
            _ => {}
        }
    }
    Ok(piles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cards::{Card, Rank, Suit};
    use crate::domain::pile::{Pile, PileVisibility};
    use crate::domain::seats::Seat;
    use crate::engine::visibility::VisibilityHints;

    fn fixture() -> GameState {
        let mut state = GameState::new(9, "test", 0, vec![Seat::human(0, "a"), Seat::human(1, "b")]);
        for id in 1..=6u32 {
            state
                .all_cards
                .insert(id, Card::new(id, Rank::STANDARD[id as usize], Suit::Hearts));
        }
        let mut stock = Pile::new(PileId::from("stock"), None, PileVisibility::Hidden);
        stock.cards = vec![1, 2, 3, 4];
        let mut hand = Pile::new(PileId::from("hand-0"), Some(0), PileVisibility::Owner);
        hand.cards = vec![5, 6];
        state.piles.insert(stock.id.clone(), stock);
        state.piles.insert(hand.id.clone(), hand);
        state
    }

    #[test]
    fn move_cards_preserves_order() {
        let mut state = fixture();
        let event = EngineEvent::move_cards("stock", "hand-0", vec![4, 2]);
        apply_event(&mut state, &event).unwrap();
        assert_eq!(state.piles[&PileId::from("stock")].cards, vec![1, 3]);
        assert_eq!(state.piles[&PileId::from("hand-0")].cards, vec![5, 6, 4, 2]);
    }

    #[test]
    fn move_of_absent_card_is_structural() {
        let mut state = fixture();
        let event = EngineEvent::move_cards("hand-0", "stock", vec![1]);
        let err = apply_event(&mut state, &event).unwrap_err();
        assert_eq!(err.code(), "STRUCTURAL");
        // Nothing moved.
        assert_eq!(state.piles[&PileId::from("stock")].cards, vec![1, 2, 3, 4]);
    }

    #[test]
    fn duplicated_card_in_move_is_structural() {
        let mut state = fixture();
        let event = EngineEvent::move_cards("stock", "hand-0", vec![2, 2]);
        let err = apply_event(&mut state, &event).unwrap_err();
        assert_eq!(err.code(), "STRUCTURAL");
        // Nothing moved, nothing duplicated.
        assert_eq!(state.piles[&PileId::from("stock")].cards, vec![1, 2, 3, 4]);
        assert_eq!(state.piles[&PileId::from("hand-0")].cards, vec![5, 6]);
    }

    #[test]
    fn set_current_player_requires_known_seat() {
        let mut state = fixture();
        let err =
            apply_event(&mut state, &EngineEvent::SetCurrentPlayer { player: Some(7) }).unwrap_err();
        assert_eq!(err.code(), "STRUCTURAL");
        apply_event(&mut state, &EngineEvent::SetCurrentPlayer { player: Some(1) }).unwrap();
        assert_eq!(state.current_player, Some(1));
    }

    #[test]
    fn replay_is_deterministic() {
        let state = fixture();
        let mut log = EventLog::new(state);
        let at = time::OffsetDateTime::UNIX_EPOCH;
        log.append(Some(0), at, EngineEvent::move_cards("stock", "hand-0", vec![4]));
        log.append(Some(0), at, EngineEvent::SetCurrentPlayer { player: Some(1) });
        let once = project_state(&log).unwrap();
        let twice = project_state(&log).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.piles[&PileId::from("hand-0")].cards, vec![5, 6, 4]);
    }

    #[test]
    fn pending_projection_tracks_batch() {
        let state = fixture();
        let mut hints = VisibilityHints::default();
        hints.rules_visible.insert(PileId::from("stock"));
        let vs = ValidationState::for_player(&state, 0, &hints);

        let pending = vec![
            EngineEvent::move_cards("stock", "hand-0", vec![4]),
            EngineEvent::move_cards("stock", "hand-0", vec![3]),
        ];
        let piles = project_piles_after_events(&vs, &pending).unwrap();
        assert_eq!(piles[&PileId::from("stock")].size, 2);
        let hand = piles[&PileId::from("hand-0")].contents().unwrap();
        assert_eq!(hand.len(), 4);
        assert_eq!(hand[3].id, 3);
    }
}
