//! Candidate generation for AI drivers and UI affordances.
//!
//! Candidates are built cheaply from the hand, then every one is filtered
//! through `validate`, so the returned set is sound by construction. It is
//! not exhaustive over meld combinations; it covers the useful shapes.

use std::collections::BTreeMap;

use crate::domain::cards::{CardId, Rank};
use crate::domain::intent::Intent;
use crate::domain::seats::PlayerId;
use crate::domain::validation::{PileSummary, ValidationState};
use crate::games::canasta::state::{is_wild, team_of, CanastaState, TurnPhase};
use crate::games::canasta::{discard_pile, hand_pile, meld_pile, validate, MELD_RANKS};

pub(crate) fn list_legal_intents(vs: &ValidationState, player: PlayerId) -> Vec<Intent> {
    let Ok(cs) = CanastaState::from_value(&vs.rules_state) else {
        return Vec::new();
    };
    if vs.winner.is_some() || !vs.has_seat(player) {
        return Vec::new();
    }

    let game_id = vs.game_id;
    let mut candidates = Vec::new();
    match cs.phase {
        TurnPhase::HandComplete => {
            candidates.push(Intent::action(game_id, player, "start-next-hand"));
        }
        TurnPhase::MustDraw if vs.current_player == Some(player) => {
            candidates.push(Intent::action(game_id, player, "draw"));
            candidates.push(Intent::action(game_id, player, "pickup"));
        }
        TurnPhase::MeldOrDiscard if vs.current_player == Some(player) => {
            meld_phase_candidates(vs, player, &mut candidates);
        }
        _ => {}
    }

    candidates.retain(|intent| validate::validate(vs, intent).valid);
    candidates
}

fn meld_phase_candidates(vs: &ValidationState, player: PlayerId, candidates: &mut Vec<Intent>) {
    let Some(hand) = vs.pile(&hand_pile(player)).and_then(PileSummary::contents) else {
        return;
    };
    let game_id = vs.game_id;
    let team = team_of(player);
    let from = hand_pile(player);
    let mv = |to, cards| Intent::Move {
        game_id,
        player,
        from: from.clone(),
        to,
        cards,
    };

    for card in hand {
        candidates.push(mv(discard_pile(), vec![card.id]));
    }

    let wilds: Vec<CardId> = hand.iter().filter(|c| is_wild(c.rank)).map(|c| c.id).collect();
    let mut by_rank: BTreeMap<Rank, Vec<CardId>> = BTreeMap::new();
    for card in hand {
        if MELD_RANKS.contains(&card.rank) {
            by_rank.entry(card.rank).or_default().push(card.id);
        }
    }

    for (rank, ids) in &by_rank {
        let to = meld_pile(team, *rank);
        // the whole natural group, alone and padded to three with wilds
        candidates.push(mv(to.clone(), ids.clone()));
        if ids.len() < 3 && !wilds.is_empty() {
            let mut padded = ids.clone();
            padded.extend(wilds.iter().take(3 - ids.len()));
            candidates.push(mv(to.clone(), padded));
        }
        // single-card extension of an existing meld
        if ids.len() > 1 {
            candidates.push(mv(to, vec![ids[0]]));
        }
    }

    // a wild onto each meld the team already has down
    if let Some(&wild) = wilds.first() {
        for rank in MELD_RANKS {
            let to = meld_pile(team, rank);
            if vs.pile(&to).is_some_and(|p| p.size > 0) {
                candidates.push(mv(to, vec![wild]));
            }
        }
    }
}
