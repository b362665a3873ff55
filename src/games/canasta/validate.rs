//! Intent validation: turn/phase guards and the per-action legality rules.
//!
//! Every rejection is data with a `code: detail` reason; accepted intents
//! return the full event batch including the metadata tail. Validation
//! never mutates anything.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::cards::{Card, CardId, Rank};
use crate::domain::events::EngineEvent;
use crate::domain::intent::{Intent, ValidationResult};
use crate::domain::pile::{PileId, PileProperties};
use crate::domain::seats::{next_seat, PlayerId};
use crate::domain::validation::{PileSummary, ValidationState};
use crate::engine::projection::project_piles_after_events;
use crate::games::canasta::deal::{hand_shuffle_seed, plan_deal};
use crate::games::canasta::scoring::TableStats;
use crate::games::canasta::state::{
    card_value, initial_meld_minimum, is_red_three, is_wild, team_of, CanastaState, TurnPhase,
    MAX_WILDS_PER_MELD, SEATS, TEAMS,
};
use crate::games::canasta::{
    commit, discard_pile, hand_pile, meld_pile, meld_target, red_three_pile, scoring, stock_pile,
};

pub(crate) fn validate(vs: &ValidationState, intent: &Intent) -> ValidationResult {
    let cs = match CanastaState::from_value(&vs.rules_state) {
        Ok(cs) => cs,
        Err(err) => return ValidationResult::reject(format!("rules-state: {err}")),
    };
    if vs.winner.is_some() {
        return ValidationResult::reject("game-over: the match has a winner");
    }
    let player = intent.player();
    if !vs.has_seat(player) {
        return ValidationResult::reject(format!("unknown-seat: {player}"));
    }

    match intent {
        Intent::Action { action_id, .. } => match action_id.as_str() {
            "draw" => {
                if let Some(reject) = require_turn(vs, &cs, player, TurnPhase::MustDraw) {
                    return reject;
                }
                draw(vs, cs, player)
            }
            "pickup" => {
                if let Some(reject) = require_turn(vs, &cs, player, TurnPhase::MustDraw) {
                    return reject;
                }
                pickup(vs, cs, player)
            }
            // turn-agnostic: any seat may deal the next hand
            "start-next-hand" => {
                if cs.phase != TurnPhase::HandComplete {
                    return ValidationResult::reject(
                        "wrong-phase: the current hand is still being played",
                    );
                }
                next_hand(vs, cs)
            }
            other => ValidationResult::reject(format!("unknown-action: {other}")),
        },
        Intent::Move {
            from, to, cards, ..
        } => {
            if let Some(reject) = require_turn(vs, &cs, player, TurnPhase::MeldOrDiscard) {
                return reject;
            }
            if *from != hand_pile(player) {
                return ValidationResult::reject(format!(
                    "illegal-source: cards may only leave your own hand, not {from}"
                ));
            }
            if *to == discard_pile() {
                discard(vs, cs, player, cards)
            } else if meld_target(to.as_str()).is_some() {
                meld(vs, cs, player, to, cards)
            } else {
                ValidationResult::reject(format!(
                    "illegal-target: {to} accepts no cards from a hand"
                ))
            }
        }
    }
}

fn require_turn(
    vs: &ValidationState,
    cs: &CanastaState,
    player: PlayerId,
    phase: TurnPhase,
) -> Option<ValidationResult> {
    if vs.current_player != Some(player) {
        return Some(ValidationResult::reject(format!(
            "wrong-turn: it is not seat {player}'s turn"
        )));
    }
    if cs.phase != phase {
        let detail = match phase {
            TurnPhase::MustDraw => "you have already drawn this turn",
            TurnPhase::MeldOrDiscard => "you must draw or pick up first",
            TurnPhase::HandComplete => "the hand is not over",
        };
        return Some(ValidationResult::reject(format!("wrong-phase: {detail}")));
    }
    None
}

/// Project the batch so far; a failure here means the module composed a
/// structurally bad event and must not commit it.
fn project(
    vs: &ValidationState,
    events: &[EngineEvent],
) -> Result<BTreeMap<PileId, PileSummary>, ValidationResult> {
    project_piles_after_events(vs, events)
        .map_err(|err| ValidationResult::reject(format!("internal: {err}")))
}

fn hand_contents<'a>(
    vs: &'a ValidationState,
    player: PlayerId,
) -> Result<&'a [Card], ValidationResult> {
    vs.pile(&hand_pile(player))
        .and_then(PileSummary::contents)
        .ok_or_else(|| ValidationResult::reject(format!("internal: hand of seat {player} unreadable")))
}

/// Accept a non-terminal batch: project, recompute display metadata,
/// append the tail.
fn accept(
    vs: &ValidationState,
    mut cs: CanastaState,
    mut events: Vec<EngineEvent>,
    to_act: Option<PlayerId>,
) -> ValidationResult {
    let piles = match project(vs, &events) {
        Ok(piles) => piles,
        Err(reject) => return reject,
    };
    let stats = TableStats::from_summaries(&piles);
    events.extend(commit::refresh_events(&mut cs, &stats, to_act, false));
    ValidationResult::accept(events)
}

fn draw(vs: &ValidationState, mut cs: CanastaState, player: PlayerId) -> ValidationResult {
    let Some(stock) = vs.pile(&stock_pile()).and_then(PileSummary::contents) else {
        return ValidationResult::reject("internal: stock unreadable");
    };

    let mut events = Vec::new();
    let mut idx = stock.len();
    loop {
        if idx == 0 {
            // stock ran dry: the hand ends with nobody going out
            let piles = match project(vs, &events) {
                Ok(piles) => piles,
                Err(reject) => return reject,
            };
            let stats = TableStats::from_summaries(&piles);
            return scoring::end_hand(cs, &stats, events, None);
        }
        idx -= 1;
        let card = &stock[idx];
        if is_red_three(card) {
            // red threes go straight to the team pile and are redrawn
            events.push(EngineEvent::move_cards(
                stock_pile(),
                red_three_pile(team_of(player)),
                vec![card.id],
            ));
        } else {
            events.push(EngineEvent::MoveCards {
                from: stock_pile(),
                to: hand_pile(player),
                cards: vec![card.id],
                reveal_to: vec![player],
            });
            break;
        }
    }

    cs.phase = TurnPhase::MeldOrDiscard;
    accept(vs, cs, events, Some(player))
}

fn pickup(vs: &ValidationState, mut cs: CanastaState, player: PlayerId) -> ValidationResult {
    let Some(discard) = vs.pile(&discard_pile()).and_then(PileSummary::contents) else {
        return ValidationResult::reject("internal: discard unreadable");
    };
    let Some(top) = discard.last() else {
        return ValidationResult::reject("pickup-empty: the discard pile is empty");
    };
    if is_wild(top.rank) {
        return ValidationResult::reject("pickup-top-wild: a wild card cannot be picked up");
    }
    if top.rank == Rank::Three {
        return ValidationResult::reject("pickup-top-three: threes cannot be picked up");
    }

    let hand = match hand_contents(vs, player) {
        Ok(hand) => hand,
        Err(reject) => return reject,
    };
    let team = team_of(player);
    let naturals: Vec<CardId> = hand
        .iter()
        .filter(|c| c.rank == top.rank)
        .map(|c| c.id)
        .collect();
    let target = meld_pile(team, top.rank);
    let existing_meld = vs.pile(&target).is_some_and(|p| p.size > 0);

    // frozen (or pre-initial-meld) pickups need a natural pair from the
    // hand; otherwise an existing meld of the rank also qualifies
    let use_pair = if cs.frozen || !cs.team_melded[team] || !existing_meld {
        if naturals.len() < 2 {
            return ValidationResult::reject(format!(
                "pickup-needs-pair: two natural {:?}s required in hand",
                top.rank
            ));
        }
        true
    } else {
        false
    };

    let mut events = vec![EngineEvent::move_cards(
        discard_pile(),
        target.clone(),
        vec![top.id],
    )];
    let mut batch_value = card_value(top.rank);
    if use_pair {
        events.push(EngineEvent::move_cards(
            hand_pile(player),
            target,
            naturals[..2].to_vec(),
        ));
        batch_value += 2 * card_value(top.rank);
    }

    if !cs.team_melded[team] {
        let minimum = initial_meld_minimum(cs.team_scores[team]);
        if batch_value < minimum {
            return ValidationResult::reject(format!(
                "initial-meld-minimum: {batch_value} is below the required {minimum}"
            ));
        }
        cs.team_melded[team] = true;
    }

    let rest: Vec<CardId> = discard[..discard.len() - 1].iter().map(|c| c.id).collect();
    if !rest.is_empty() {
        events.push(EngineEvent::move_cards(
            discard_pile(),
            hand_pile(player),
            rest,
        ));
    }
    if cs.frozen {
        cs.frozen = false;
        events.push(EngineEvent::SetPileProperties {
            pile: discard_pile(),
            properties: PileProperties::new(),
        });
    }

    cs.phase = TurnPhase::MeldOrDiscard;
    finish_move(vs, cs, events, player)
}

fn meld(
    vs: &ValidationState,
    mut cs: CanastaState,
    player: PlayerId,
    to: &PileId,
    card_ids: &[CardId],
) -> ValidationResult {
    let Some((team, rank)) = meld_target(to.as_str()) else {
        return ValidationResult::reject(format!("illegal-target: {to}"));
    };
    if team != team_of(player) {
        return ValidationResult::reject("wrong-team-meld: that meld belongs to the other team");
    }
    if card_ids.is_empty() {
        return ValidationResult::reject("empty-move: no cards given");
    }
    let hand = match hand_contents(vs, player) {
        Ok(hand) => hand,
        Err(reject) => return reject,
    };

    let mut added_value = 0;
    let mut added_naturals = 0;
    let mut added_wilds = 0;
    let mut seen = BTreeSet::new();
    for &id in card_ids {
        if !seen.insert(id) {
            return ValidationResult::reject(format!("duplicate-card: {id} given twice"));
        }
        let Some(card) = hand.iter().find(|c| c.id == id) else {
            return ValidationResult::reject(format!("card-not-in-hand: {id}"));
        };
        if is_wild(card.rank) {
            added_wilds += 1;
        } else if card.rank == rank {
            added_naturals += 1;
        } else {
            return ValidationResult::reject(format!(
                "illegal-meld-card: a {:?} cannot join a {rank:?} meld",
                card.rank
            ));
        }
        added_value += card_value(card.rank);
    }

    let (existing_naturals, existing_wilds) = vs
        .pile(to)
        .and_then(PileSummary::contents)
        .map(|cards| {
            let wilds = cards.iter().filter(|c| is_wild(c.rank)).count();
            (cards.len() - wilds, wilds)
        })
        .unwrap_or((0, 0));
    let naturals = existing_naturals + added_naturals;
    let wilds = existing_wilds + added_wilds;
    if naturals < 2 {
        return ValidationResult::reject("meld-too-small: at least two natural cards required");
    }
    if naturals + wilds < 3 {
        return ValidationResult::reject("meld-too-small: a meld holds at least three cards");
    }
    if wilds > MAX_WILDS_PER_MELD {
        return ValidationResult::reject(format!(
            "too-many-wilds: a meld holds at most {MAX_WILDS_PER_MELD} wild cards"
        ));
    }

    if !cs.team_melded[team] {
        let minimum = initial_meld_minimum(cs.team_scores[team]);
        if added_value < minimum {
            return ValidationResult::reject(format!(
                "initial-meld-minimum: {added_value} is below the required {minimum}"
            ));
        }
        cs.team_melded[team] = true;
    }

    let events = vec![EngineEvent::move_cards(
        hand_pile(player),
        to.clone(),
        card_ids.to_vec(),
    )];
    finish_move(vs, cs, events, player)
}

fn discard(
    vs: &ValidationState,
    mut cs: CanastaState,
    player: PlayerId,
    card_ids: &[CardId],
) -> ValidationResult {
    let [card_id] = card_ids else {
        return ValidationResult::reject("discard-one-card: exactly one card per discard");
    };
    let hand = match hand_contents(vs, player) {
        Ok(hand) => hand,
        Err(reject) => return reject,
    };
    let Some(card) = hand.iter().find(|c| c.id == *card_id) else {
        return ValidationResult::reject(format!("card-not-in-hand: {card_id}"));
    };

    let mut events = vec![EngineEvent::move_cards(
        hand_pile(player),
        discard_pile(),
        vec![*card_id],
    )];
    if is_wild(card.rank) {
        cs.frozen = true;
        let mut properties = vs
            .pile(&discard_pile())
            .map(|p| p.properties.clone())
            .unwrap_or_default();
        properties.insert("frozen".to_string(), serde_json::Value::Bool(true));
        events.push(EngineEvent::SetPileProperties {
            pile: discard_pile(),
            properties,
        });
    }

    if hand.len() == 1 {
        // discarding the last card goes out
        return try_go_out(vs, cs, events, player);
    }

    let next = next_seat(player, SEATS);
    cs.phase = TurnPhase::MustDraw;
    events.push(EngineEvent::SetCurrentPlayer { player: Some(next) });
    accept(vs, cs, events, Some(next))
}

/// Post-batch bookkeeping shared by melds and pickups: the batch may have
/// emptied the acting hand, which is going out.
fn finish_move(
    vs: &ValidationState,
    mut cs: CanastaState,
    mut events: Vec<EngineEvent>,
    player: PlayerId,
) -> ValidationResult {
    let piles = match project(vs, &events) {
        Ok(piles) => piles,
        Err(reject) => return reject,
    };
    let stats = TableStats::from_summaries(&piles);
    let emptied = piles
        .get(&hand_pile(player))
        .is_some_and(|p| p.size == 0);
    if emptied {
        return go_out_with(cs, stats, events, player);
    }
    events.extend(commit::refresh_events(&mut cs, &stats, Some(player), false));
    ValidationResult::accept(events)
}

fn try_go_out(
    vs: &ValidationState,
    cs: CanastaState,
    events: Vec<EngineEvent>,
    player: PlayerId,
) -> ValidationResult {
    let piles = match project(vs, &events) {
        Ok(piles) => piles,
        Err(reject) => return reject,
    };
    go_out_with(cs, TableStats::from_summaries(&piles), events, player)
}

fn go_out_with(
    cs: CanastaState,
    stats: TableStats,
    events: Vec<EngineEvent>,
    player: PlayerId,
) -> ValidationResult {
    let team = team_of(player);
    if stats.canastas[team] == 0 {
        return ValidationResult::reject(
            "cannot-go-out: your team needs a canasta on the table",
        );
    }
    scoring::end_hand(cs, &stats, events, Some(team))
}

fn next_hand(vs: &ValidationState, cs: CanastaState) -> ValidationResult {
    let dealer = next_seat(cs.dealer, SEATS);
    let hand_number = cs.hand_number + 1;

    // gather the whole deck back into the stock
    let mut cards = BTreeMap::new();
    let mut events = Vec::new();
    for (id, pile) in &vs.piles {
        let Some(contents) = pile.contents() else {
            return ValidationResult::reject(format!("internal: pile {id} unreadable for re-deal"));
        };
        for card in contents {
            cards.insert(card.id, card.clone());
        }
        if *id != stock_pile() && !contents.is_empty() {
            events.push(EngineEvent::move_cards(
                id.clone(),
                stock_pile(),
                contents.iter().map(|c| c.id).collect(),
            ));
        }
    }

    let plan = match plan_deal(&cards, hand_shuffle_seed(vs.seed, hand_number), dealer) {
        Ok(plan) => plan,
        Err(err) => return ValidationResult::reject(format!("internal: {err}")),
    };

    // one in-place move re-sequences the stock: the remainder on the
    // bottom, everything to be dealt stacked above it
    let mut order = plan.stock.clone();
    for hand in &plan.hands {
        order.extend(hand);
    }
    for pile in &plan.red_threes {
        order.extend(pile);
    }
    order.extend(&plan.discard);
    events.push(EngineEvent::move_cards(stock_pile(), stock_pile(), order));

    for (seat, hand) in plan.hands.iter().enumerate() {
        let seat = seat as PlayerId;
        events.push(EngineEvent::MoveCards {
            from: stock_pile(),
            to: hand_pile(seat),
            cards: hand.clone(),
            reveal_to: vec![seat],
        });
    }
    for (team, threes) in plan.red_threes.iter().enumerate() {
        if !threes.is_empty() {
            events.push(EngineEvent::move_cards(
                stock_pile(),
                red_three_pile(team),
                threes.clone(),
            ));
        }
    }
    events.push(EngineEvent::move_cards(
        stock_pile(),
        discard_pile(),
        plan.discard.clone(),
    ));

    let mut properties = PileProperties::new();
    if plan.frozen {
        properties.insert("frozen".to_string(), serde_json::Value::Bool(true));
    }
    events.push(EngineEvent::SetPileProperties {
        pile: discard_pile(),
        properties,
    });

    let to_act = next_seat(dealer, SEATS);
    events.push(EngineEvent::SetCurrentPlayer {
        player: Some(to_act),
    });
    events.push(EngineEvent::Announce {
        message: format!("hand {hand_number} begins; seat {dealer} deals"),
    });

    let cs = CanastaState {
        phase: TurnPhase::MustDraw,
        dealer,
        hand_number,
        team_scores: cs.team_scores,
        team_melded: [false; TEAMS],
        frozen: plan.frozen,
        ai_hints: None,
    };
    accept(vs, cs, events, Some(to_act))
}
