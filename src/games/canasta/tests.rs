//! Scenario tests driving the canasta module through validate/apply cycles
//! on surgically arranged tables.

use proptest::prelude::*;

use crate::domain::cards::{CardId, Rank};
use crate::domain::intent::Intent;
use crate::domain::pile::PileId;
use crate::domain::seats::{PlayerId, Seat};
use crate::domain::state::GameState;
use crate::domain::validation::ValidationState;
use crate::engine::projection::apply_event;
use crate::engine::rules::RuleModule;
use crate::games::canasta::state::{CanastaState, TurnPhase, HAND_SIZE};
use crate::games::canasta::{
    discard_pile, hand_pile, meld_pile, red_three_pile, stock_pile, CanastaRules,
};

fn seats() -> Vec<Seat> {
    (0..4).map(|n| Seat::human(n, format!("p{n}"))).collect()
}

fn game() -> GameState {
    CanastaRules.create_game(1, seats(), 42).unwrap()
}

fn vs(state: &GameState, player: PlayerId) -> ValidationState {
    ValidationState::for_player(state, player, &CanastaRules.visibility_hints())
}

fn cs(state: &GameState) -> CanastaState {
    CanastaState::from_value(&state.rules_state).unwrap()
}

fn set_cs(state: &mut GameState, cs: &CanastaState) {
    state.rules_state = cs.to_value();
}

fn apply_all(state: &mut GameState, intent: &Intent) {
    let result = CanastaRules.validate(&vs(state, intent.player()), intent);
    assert!(result.valid, "rejected: {:?}", result.reason);
    for event in &result.events {
        apply_event(state, event).unwrap();
    }
}

fn reject_reason(state: &GameState, intent: &Intent) -> String {
    let result = CanastaRules.validate(&vs(state, intent.player()), intent);
    assert!(!result.valid, "unexpectedly accepted");
    result.reason.unwrap()
}

/// Pull a card out of whatever pile holds it and push it on top of `to`.
fn relocate(state: &mut GameState, card: CardId, to: &PileId) {
    for pile in state.piles.values_mut() {
        pile.cards.retain(|c| *c != card);
    }
    state.piles.get_mut(to).unwrap().cards.push(card);
}

fn ids_of_rank(state: &GameState, rank: Rank) -> Vec<CardId> {
    state
        .all_cards
        .values()
        .filter(|c| c.rank == rank)
        .map(|c| c.id)
        .collect()
}

fn total_card_count(state: &GameState) -> usize {
    state.piles.values().map(|p| p.len()).sum()
}

fn mv(player: PlayerId, to: PileId, cards: Vec<CardId>) -> Intent {
    Intent::Move {
        game_id: 1,
        player,
        from: hand_pile(player),
        to,
        cards,
    }
}

#[test]
fn draw_moves_a_card_and_opens_the_meld_phase() {
    let mut state = game();
    // make the top of the stock a known safe card
    let four = ids_of_rank(&state, Rank::Four)[0];
    relocate(&mut state, four, &stock_pile());
    let before = state.piles[&hand_pile(1)].len();

    apply_all(&mut state, &Intent::action(1, 1, "draw"));
    assert!(state.piles[&hand_pile(1)].contains(four));
    assert_eq!(state.piles[&hand_pile(1)].len(), before + 1);
    assert_eq!(cs(&state).phase, TurnPhase::MeldOrDiscard);
    assert_eq!(state.current_player, Some(1));
    assert_eq!(total_card_count(&state), 108);
}

#[test]
fn out_of_turn_and_out_of_phase_are_rejected() {
    let mut state = game();
    let reason = reject_reason(&state, &Intent::action(1, 2, "draw"));
    assert!(reason.starts_with("wrong-turn"), "{reason}");

    let four = ids_of_rank(&state, Rank::Four)[0];
    relocate(&mut state, four, &stock_pile());
    apply_all(&mut state, &Intent::action(1, 1, "draw"));
    let reason = reject_reason(&state, &Intent::action(1, 1, "draw"));
    assert!(reason.starts_with("wrong-phase"), "{reason}");
}

#[test]
fn unknown_action_and_undeclared_target_are_rejected() {
    let mut state = game();
    let reason = reject_reason(&state, &Intent::action(1, 1, "shuffle-up"));
    assert!(reason.starts_with("unknown-action"), "{reason}");

    let mut meld_phase = cs(&state);
    meld_phase.phase = TurnPhase::MeldOrDiscard;
    set_cs(&mut state, &meld_phase);
    let card = state.piles[&hand_pile(1)].cards[0];
    let reason = reject_reason(&state, &mv(1, PileId::from("limbo"), vec![card]));
    assert!(reason.starts_with("illegal-target"), "{reason}");
    let reason = reject_reason(&state, &mv(1, stock_pile(), vec![card]));
    assert!(reason.starts_with("illegal-target"), "{reason}");
}

#[test]
fn initial_meld_must_reach_the_minimum() {
    let mut state = game();
    let mut meld_phase = cs(&state);
    meld_phase.phase = TurnPhase::MeldOrDiscard;
    set_cs(&mut state, &meld_phase);

    // three fours: 15 points, below the 50 opening requirement at score 0
    let fours: Vec<CardId> = ids_of_rank(&state, Rank::Four)[..3].to_vec();
    for &id in &fours {
        relocate(&mut state, id, &hand_pile(1));
    }
    let reason = reject_reason(&state, &mv(1, meld_pile(1, Rank::Four), fours));
    assert!(reason.starts_with("initial-meld-minimum"), "{reason}");

    // three aces: 60 points, opens
    let aces: Vec<CardId> = ids_of_rank(&state, Rank::Ace)[..3].to_vec();
    for &id in &aces {
        relocate(&mut state, id, &hand_pile(1));
    }
    apply_all(&mut state, &mv(1, meld_pile(1, Rank::Ace), aces));
    assert_eq!(state.piles[&meld_pile(1, Rank::Ace)].len(), 3);
    let after = cs(&state);
    assert!(after.team_melded[1]);
    assert!(!after.team_melded[0]);
    // still this player's turn; melding does not pass it
    assert_eq!(state.current_player, Some(1));
}

#[test]
fn meld_composition_rules() {
    let mut state = game();
    let mut meld_phase = cs(&state);
    meld_phase.phase = TurnPhase::MeldOrDiscard;
    meld_phase.team_melded[1] = true;
    set_cs(&mut state, &meld_phase);

    let aces = ids_of_rank(&state, Rank::Ace);
    let twos = ids_of_rank(&state, Rank::Two);
    let kings = ids_of_rank(&state, Rank::King);
    for &id in aces[..2].iter().chain(&twos[..4]).chain(&kings[..1]) {
        relocate(&mut state, id, &hand_pile(1));
    }

    // wrong team's pile
    let reason = reject_reason(&state, &mv(1, meld_pile(0, Rank::Ace), aces[..2].to_vec()));
    assert!(reason.starts_with("wrong-team-meld"), "{reason}");

    // one natural plus wilds is not a meld
    let reason = reject_reason(
        &state,
        &mv(1, meld_pile(1, Rank::King), vec![kings[0], twos[0], twos[1]]),
    );
    assert!(reason.starts_with("meld-too-small"), "{reason}");

    // four wilds in one meld is one too many
    let mut overloaded = aces[..2].to_vec();
    overloaded.extend(&twos[..4]);
    let reason = reject_reason(&state, &mv(1, meld_pile(1, Rank::Ace), overloaded));
    assert!(reason.starts_with("too-many-wilds"), "{reason}");

    // a mixed meld within limits is fine
    let mixed = vec![aces[0], aces[1], twos[0]];
    apply_all(&mut state, &mv(1, meld_pile(1, Rank::Ace), mixed));
    assert_eq!(state.piles[&meld_pile(1, Rank::Ace)].len(), 3);
}

#[test]
fn discard_passes_the_turn_and_a_wild_freezes() {
    let mut state = game();
    let mut meld_phase = cs(&state);
    meld_phase.phase = TurnPhase::MeldOrDiscard;
    set_cs(&mut state, &meld_phase);

    let card = state.piles[&hand_pile(1)].cards[0];
    apply_all(&mut state, &mv(1, discard_pile(), vec![card]));
    assert_eq!(state.piles[&discard_pile()].top(), Some(card));
    assert_eq!(state.current_player, Some(2));
    assert_eq!(cs(&state).phase, TurnPhase::MustDraw);

    // seat 2 draws, then discards a wild
    let two = ids_of_rank(&state, Rank::Two)[0];
    relocate(&mut state, two, &stock_pile());
    apply_all(&mut state, &Intent::action(1, 2, "draw"));
    apply_all(&mut state, &mv(2, discard_pile(), vec![two]));
    assert!(state.piles[&discard_pile()].property_flag("frozen"));
    assert!(cs(&state).frozen);
    assert_eq!(state.current_player, Some(3));
}

#[test]
fn pickup_with_a_natural_pair_melds_the_top_card() {
    let mut state = game();
    let aces = ids_of_rank(&state, Rank::Ace);
    relocate(&mut state, aces[0], &discard_pile());
    relocate(&mut state, aces[1], &hand_pile(1));
    relocate(&mut state, aces[2], &hand_pile(1));
    let rest_of_discard = state.piles[&discard_pile()].len() - 1;
    let hand_before = state.piles[&hand_pile(1)].len();

    apply_all(&mut state, &Intent::action(1, 1, "pickup"));
    let meld = &state.piles[&meld_pile(1, Rank::Ace)];
    assert_eq!(meld.len(), 3);
    assert!(state.piles[&discard_pile()].is_empty());
    assert!(cs(&state).team_melded[1]);
    assert_eq!(cs(&state).phase, TurnPhase::MeldOrDiscard);
    // everything under the top card went to the hand
    assert_eq!(
        state.piles[&hand_pile(1)].len(),
        hand_before - 2 + rest_of_discard
    );
}

#[test]
fn frozen_pile_requires_the_pair_even_with_a_meld_down() {
    let mut state = game();
    let aces = ids_of_rank(&state, Rank::Ace);
    // team 1 already has an ace meld; their hand holds no aces
    for &id in &aces[..3] {
        relocate(&mut state, id, &meld_pile(1, Rank::Ace));
    }
    for &id in &aces[3..] {
        relocate(&mut state, id, &stock_pile());
    }
    relocate(&mut state, aces[3], &discard_pile());
    let mut opened = cs(&state);
    opened.team_melded[1] = true;
    set_cs(&mut state, &opened);

    // unfrozen: the existing meld takes the top card without a pair
    let result = CanastaRules.validate(&vs(&state, 1), &Intent::action(1, 1, "pickup"));
    assert!(result.valid, "{:?}", result.reason);

    let mut frozen = cs(&state);
    frozen.frozen = true;
    set_cs(&mut state, &frozen);
    let reason = reject_reason(&state, &Intent::action(1, 1, "pickup"));
    assert!(reason.starts_with("pickup-needs-pair"), "{reason}");
}

#[test]
fn wild_or_three_on_top_blocks_pickup() {
    let mut state = game();
    let two = ids_of_rank(&state, Rank::Two)[0];
    relocate(&mut state, two, &discard_pile());
    let reason = reject_reason(&state, &Intent::action(1, 1, "pickup"));
    assert!(reason.starts_with("pickup-top-wild"), "{reason}");

    let three = ids_of_rank(&state, Rank::Three)[0];
    relocate(&mut state, three, &discard_pile());
    let reason = reject_reason(&state, &Intent::action(1, 1, "pickup"));
    assert!(reason.starts_with("pickup-top-three"), "{reason}");
}

#[test]
fn going_out_needs_a_canasta() {
    let mut state = game();
    let mut meld_phase = cs(&state);
    meld_phase.phase = TurnPhase::MeldOrDiscard;
    meld_phase.team_melded[1] = true;
    set_cs(&mut state, &meld_phase);

    // strip seat 1 down to a single known card
    let hand = state.piles[&hand_pile(1)].cards.clone();
    for &id in &hand {
        relocate(&mut state, id, &stock_pile());
    }
    let last = ids_of_rank(&state, Rank::Four)[0];
    relocate(&mut state, last, &hand_pile(1));
    let reason = reject_reason(&state, &mv(1, discard_pile(), vec![last]));
    assert!(reason.starts_with("cannot-go-out"), "{reason}");

    // with a seven-card king meld down, the same discard goes out
    let kings = ids_of_rank(&state, Rank::King);
    for &id in &kings[..7] {
        relocate(&mut state, id, &meld_pile(1, Rank::King));
    }
    apply_all(&mut state, &mv(1, discard_pile(), vec![last]));
    let after = cs(&state);
    assert_eq!(after.phase, TurnPhase::HandComplete);
    assert_eq!(state.current_player, None);
    // the canasta team nets positive despite the partner's held cards;
    // the unmelded team only loses
    assert!(after.team_scores[1] > 0);
    assert!(after.team_scores[0] < 0);
    assert!(state
        .actions
        .iter()
        .any(|a| a.id == "start-next-hand" && a.player.is_none()));
}

#[test]
fn stock_exhaustion_ends_the_hand() {
    let mut state = game();
    let stock = state.piles[&stock_pile()].cards.clone();
    for &id in &stock {
        relocate(&mut state, id, &hand_pile(3));
    }
    apply_all(&mut state, &Intent::action(1, 1, "draw"));
    assert_eq!(cs(&state).phase, TurnPhase::HandComplete);
    // cards left in hands count against: team 1 holds nearly the whole deck
    assert!(cs(&state).team_scores[1] < 0);
}

#[test]
fn next_hand_rotates_the_dealer_and_keeps_the_scores() {
    let mut state = game();
    let mut done = cs(&state);
    done.phase = TurnPhase::HandComplete;
    done.team_scores = [120, -35];
    done.team_melded = [true, false];
    set_cs(&mut state, &done);
    state.current_player = None;

    // any seat may deal the next hand
    apply_all(&mut state, &Intent::action(1, 3, "start-next-hand"));
    let after = cs(&state);
    assert_eq!(after.hand_number, 2);
    assert_eq!(after.dealer, 1);
    assert_eq!(after.phase, TurnPhase::MustDraw);
    assert_eq!(after.team_scores, [120, -35]);
    assert_eq!(after.team_melded, [false, false]);
    assert_eq!(state.current_player, Some(2));
    assert_eq!(total_card_count(&state), 108);
    for seat in 0..4u8 {
        assert_eq!(state.piles[&hand_pile(seat)].len(), HAND_SIZE);
    }
    for team in 0..2 {
        assert!(state.piles[&meld_pile(team, Rank::Ace)].is_empty());
    }
}

#[test]
fn game_over_blocks_all_intents() {
    let mut state = game();
    state.winner = Some(0);
    let reason = reject_reason(&state, &Intent::action(1, 1, "draw"));
    assert!(reason.starts_with("game-over"), "{reason}");
    assert!(CanastaRules.list_legal_intents(&vs(&state, 1), 1).is_empty());
}

#[test]
fn legal_intents_are_sound_and_turn_scoped() {
    let state = game();
    let current = CanastaRules.list_legal_intents(&vs(&state, 1), 1);
    assert!(current.iter().any(|i| matches!(
        i,
        Intent::Action { action_id, .. } if action_id == "draw"
    )));
    for intent in &current {
        assert!(CanastaRules.validate(&vs(&state, 1), intent).valid);
    }
    assert!(CanastaRules.list_legal_intents(&vs(&state, 2), 2).is_empty());
}

#[test]
fn playout_of_first_legal_intents_conserves_every_card() {
    let mut state = game();
    for _ in 0..300 {
        if state.winner.is_some() {
            break;
        }
        let player = state.current_player.unwrap_or(0);
        let intents = CanastaRules.list_legal_intents(&vs(&state, player), player);
        let Some(intent) = intents.first() else { break };
        apply_all(&mut state, intent);

        let mut ids: Vec<CardId> = state.piles.values().flat_map(|p| p.cards.clone()).collect();
        assert_eq!(ids.len(), 108);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 108);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_seed_deals_a_legal_table(seed in any::<u64>(), game_id in any::<i64>()) {
        let state = CanastaRules.create_game(game_id, seats(), seed).unwrap();
        prop_assert_eq!(total_card_count(&state), 108);
        for seat in 0..4u8 {
            prop_assert_eq!(state.piles[&hand_pile(seat)].len(), HAND_SIZE);
        }
        let top = state.piles[&discard_pile()].top().unwrap();
        let card = &state.all_cards[&top];
        prop_assert!(!matches!(card.rank, Rank::Joker | Rank::Two));
        prop_assert!(!(card.rank == Rank::Three && card.suit.is_red()));
        // red threes only ever sit in the team piles
        for team in 0..2 {
            for id in &state.piles[&red_three_pile(team)].cards {
                let c = &state.all_cards[id];
                prop_assert!(c.rank == Rank::Three && c.suit.is_red());
            }
        }
    }
}
