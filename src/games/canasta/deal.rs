//! Dealing: the double deck, the seeded shuffle, and hand setup.
//!
//! `plan_deal` is pure over (cards, seed, dealer) so the same plan backs
//! both the initializer (which writes piles directly) and `start-next-hand`
//! (which realizes the plan as move events over the live piles).

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::domain::cards::{joker_cards, standard_deck, Card, CardId};
use crate::domain::pile::{Pile, PileVisibility};
use crate::domain::seats::{next_seat, Seat};
use crate::domain::state::GameState;
use crate::engine::projection::apply_event;
use crate::errors::engine::EngineError;
use crate::games::canasta::state::{
    is_red_three, is_wild, CanastaState, TurnPhase, HAND_SIZE, SEATS, TEAMS,
};
use crate::games::canasta::{
    commit, discard_pile, hand_pile, meld_pile, red_three_pile, scoring::TableStats, stock_pile,
    MELD_RANKS, RULES_ID,
};

/// Two standard decks plus four jokers: 108 cards, ids 1..=108.
pub(crate) fn full_deck() -> Vec<Card> {
    let mut deck = standard_deck(1);
    deck.extend(standard_deck(53));
    deck.extend(joker_cards(105, 4));
    deck
}

/// Deterministic shuffle seed for one hand within a game's deal.
pub(crate) fn hand_shuffle_seed(seed: u64, hand_number: u32) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"cardroom.canasta.hand.v1");
    hasher.update(&seed.to_le_bytes());
    hasher.update(&hand_number.to_le_bytes());
    let hash = hasher.finalize();
    let bytes = hash.as_bytes();
    u64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

/// Where every card lands at the start of a hand. Vectors are bottom..top.
pub(crate) struct DealPlan {
    pub hands: [Vec<CardId>; SEATS],
    pub red_threes: [Vec<CardId>; TEAMS],
    pub discard: Vec<CardId>,
    pub stock: Vec<CardId>,
    pub frozen: bool,
}

/// Shuffle and deal: eleven cards each starting left of the dealer, red
/// threes laid aside and replaced, then the upcard flip. Red threes flipped
/// as the upcard slide back under the stock; a wild upcard stays buried and
/// freezes the pile.
pub(crate) fn plan_deal(
    cards: &BTreeMap<CardId, Card>,
    shuffle_seed: u64,
    dealer: u8,
) -> Result<DealPlan, EngineError> {
    let mut stock: Vec<CardId> = cards.keys().copied().collect();
    let mut rng = ChaCha20Rng::seed_from_u64(shuffle_seed);
    stock.shuffle(&mut rng);

    fn draw(stock: &mut Vec<CardId>) -> Result<CardId, EngineError> {
        stock
            .pop()
            .ok_or_else(|| EngineError::invalid_setup("stock exhausted while dealing"))
    }

    let mut hands: [Vec<CardId>; SEATS] = Default::default();
    let mut red_threes: [Vec<CardId>; TEAMS] = Default::default();

    for offset in 1..=SEATS {
        let seat = (dealer as usize + offset) % SEATS;
        for _ in 0..HAND_SIZE {
            hands[seat].push(draw(&mut stock)?);
        }
    }

    for seat in 0..SEATS {
        let mut n = 0;
        while n < hands[seat].len() {
            let id = hands[seat][n];
            if is_red_three(&cards[&id]) {
                hands[seat].remove(n);
                red_threes[seat % TEAMS].push(id);
                hands[seat].push(draw(&mut stock)?);
            } else {
                n += 1;
            }
        }
    }

    let mut discard = Vec::new();
    let mut frozen = false;
    loop {
        let id = draw(&mut stock)?;
        let card = &cards[&id];
        if is_red_three(card) {
            stock.insert(0, id);
        } else if is_wild(card.rank) {
            discard.push(id);
            frozen = true;
        } else {
            discard.push(id);
            break;
        }
    }

    Ok(DealPlan {
        hands,
        red_threes,
        discard,
        stock,
        frozen,
    })
}

/// Build the initial state for a fresh game: seat 0 deals hand 1.
pub(crate) fn create_game(
    game_id: i64,
    seats: Vec<Seat>,
    seed: u64,
) -> Result<GameState, EngineError> {
    if seats.len() != SEATS {
        return Err(EngineError::invalid_setup(format!(
            "canasta takes exactly {SEATS} seats, got {}",
            seats.len()
        )));
    }
    for seat in 0..SEATS as u8 {
        if !seats.iter().any(|s| s.id == seat) {
            return Err(EngineError::invalid_setup(format!(
                "canasta requires seats 0..={}, seat {seat} missing",
                SEATS - 1
            )));
        }
    }

    let mut state = GameState::new(game_id, RULES_ID, seed, seats);
    for card in full_deck() {
        state.all_cards.insert(card.id, card);
    }

    let dealer: u8 = 0;
    let plan = plan_deal(&state.all_cards, hand_shuffle_seed(seed, 1), dealer)?;

    let mut stock = Pile::new(stock_pile(), None, PileVisibility::Hidden);
    stock.cards = plan.stock;
    state.piles.insert(stock.id.clone(), stock);

    let mut discard = Pile::new(discard_pile(), None, PileVisibility::Public);
    discard.cards = plan.discard;
    if plan.frozen {
        discard
            .properties
            .insert("frozen".to_string(), serde_json::Value::Bool(true));
    }
    state.piles.insert(discard.id.clone(), discard);

    for (seat, cards) in plan.hands.into_iter().enumerate() {
        let seat = seat as u8;
        let mut hand = Pile::new(hand_pile(seat), Some(seat), PileVisibility::Owner);
        hand.cards = cards;
        state.piles.insert(hand.id.clone(), hand);
    }

    for team in 0..TEAMS {
        for rank in MELD_RANKS {
            let pile = Pile::new(meld_pile(team, rank), None, PileVisibility::Public);
            state.piles.insert(pile.id.clone(), pile);
        }
        let mut pile = Pile::new(red_three_pile(team), None, PileVisibility::Public);
        pile.cards = plan.red_threes[team].clone();
        state.piles.insert(pile.id.clone(), pile);
    }

    state.current_player = Some(next_seat(dealer, SEATS));

    let mut cs = CanastaState {
        phase: TurnPhase::MustDraw,
        dealer,
        hand_number: 1,
        team_scores: [0; TEAMS],
        team_melded: [false; TEAMS],
        frozen: plan.frozen,
        ai_hints: None,
    };
    let stats = TableStats::from_state(&state);
    for event in commit::refresh_events(&mut cs, &stats, state.current_player, false) {
        apply_event(&mut state, &event)?;
    }
    Ok(state)
}
