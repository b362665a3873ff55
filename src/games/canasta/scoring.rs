//! Hand scoring: table statistics, bonuses, and the terminal event batch.

use std::collections::BTreeMap;

use crate::domain::cards::Rank;
use crate::domain::events::EngineEvent;
use crate::domain::pile::PileId;
use crate::domain::state::GameState;
use crate::domain::validation::PileSummary;
use crate::games::canasta::state::{
    card_value, is_wild, team_of, CanastaState, TurnPhase, CANASTA_SIZE, SEATS, TARGET_SCORE,
    TEAMS,
};
use crate::domain::intent::ValidationResult;
use crate::domain::seats::PlayerId;
use crate::games::canasta::{commit, hand_seat, meld_target};

pub(crate) const NATURAL_CANASTA_BONUS: i32 = 500;
pub(crate) const MIXED_CANASTA_BONUS: i32 = 300;
pub(crate) const GOING_OUT_BONUS: i32 = 100;
pub(crate) const RED_THREE_BONUS: i32 = 100;
pub(crate) const ALL_RED_THREES_BONUS: i32 = 800;

/// Everything scoring and display need to know about the table, derived
/// from pile ids and contents alone.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct TableStats {
    pub meld_points: [i32; TEAMS],
    pub canastas: [usize; TEAMS],
    pub natural_canastas: [usize; TEAMS],
    pub red_threes: [usize; TEAMS],
    pub hand_points: [i32; TEAMS],
    pub hand_counts: [usize; SEATS],
}

impl TableStats {
    pub(crate) fn from_summaries(piles: &BTreeMap<PileId, PileSummary>) -> Self {
        Self::collect(piles.values().map(|p| {
            let ranks = p
                .contents()
                .map(|cards| cards.iter().map(|c| c.rank).collect());
            (p.id.as_str(), p.size, ranks)
        }))
    }

    pub(crate) fn from_state(state: &GameState) -> Self {
        Self::collect(state.piles.values().map(|p| {
            let ranks = p
                .cards
                .iter()
                .filter_map(|id| state.all_cards.get(id))
                .map(|c| c.rank)
                .collect();
            (p.id.as_str(), p.len(), Some(ranks))
        }))
    }

    fn collect<'a>(piles: impl Iterator<Item = (&'a str, usize, Option<Vec<Rank>>)>) -> Self {
        let mut stats = TableStats::default();
        for (id, size, ranks) in piles {
            if let Some(seat) = hand_seat(id) {
                stats.hand_counts[seat as usize] = size;
                if let Some(ranks) = &ranks {
                    stats.hand_points[team_of(seat)] +=
                        ranks.iter().map(|r| card_value(*r)).sum::<i32>();
                }
            } else if let Some((team, _)) = meld_target(id) {
                let Some(ranks) = &ranks else { continue };
                stats.meld_points[team] += ranks.iter().map(|r| card_value(*r)).sum::<i32>();
                if size >= CANASTA_SIZE {
                    stats.canastas[team] += 1;
                    if ranks.iter().all(|r| !is_wild(*r)) {
                        stats.natural_canastas[team] += 1;
                    }
                }
            } else if let Some(team) = id
                .strip_prefix("red-threes-")
                .and_then(|t| t.parse::<usize>().ok())
                .filter(|t| *t < TEAMS)
            {
                stats.red_threes[team] = size;
            }
        }
        stats
    }
}

/// Per-team deltas for the hand that just ended.
///
/// Melds and canasta bonuses count for; cards left in hand count against.
/// Red threes count for a team that melded, against one that did not.
pub(crate) fn hand_scores(
    stats: &TableStats,
    cs: &CanastaState,
    going_out: Option<usize>,
) -> [i32; TEAMS] {
    let mut deltas = [0i32; TEAMS];
    for team in 0..TEAMS {
        let mut points = stats.meld_points[team];
        points += stats.natural_canastas[team] as i32 * NATURAL_CANASTA_BONUS;
        points += (stats.canastas[team] - stats.natural_canastas[team]) as i32
            * MIXED_CANASTA_BONUS;
        let red = if stats.red_threes[team] == 4 {
            ALL_RED_THREES_BONUS
        } else {
            stats.red_threes[team] as i32 * RED_THREE_BONUS
        };
        if cs.team_melded[team] {
            points += red;
        } else {
            points -= red;
        }
        if going_out == Some(team) {
            points += GOING_OUT_BONUS;
        }
        points -= stats.hand_points[team];
        deltas[team] = points;
    }
    deltas
}

/// Close out the hand: score it, and either offer `start-next-hand` or
/// declare the match winner. Appended after the batch's game events.
pub(crate) fn end_hand(
    mut cs: CanastaState,
    stats: &TableStats,
    mut events: Vec<EngineEvent>,
    going_out: Option<usize>,
) -> ValidationResult {
    let deltas = hand_scores(stats, &cs, going_out);
    for team in 0..TEAMS {
        cs.team_scores[team] += deltas[team];
    }
    cs.phase = TurnPhase::HandComplete;

    events.push(EngineEvent::SetCurrentPlayer { player: None });
    events.push(EngineEvent::Announce {
        message: format!(
            "hand {} complete: team 0 {:+}, team 1 {:+}",
            cs.hand_number, deltas[0], deltas[1]
        ),
    });

    let mut game_over = false;
    if cs.team_scores.iter().any(|&s| s >= TARGET_SCORE) {
        // A tie past the target is broken by going out; a tie off stock
        // exhaustion stays open and another hand decides.
        let winner_team = if cs.team_scores[0] > cs.team_scores[1] {
            Some(0)
        } else if cs.team_scores[1] > cs.team_scores[0] {
            Some(1)
        } else {
            going_out
        };
        if let Some(winner_team) = winner_team {
            // the team's lower-numbered seat stands for the team
            events.push(EngineEvent::SetWinner {
                player: Some(winner_team as PlayerId),
            });
            events.push(EngineEvent::Announce {
                message: format!(
                    "team {winner_team} wins with {} points",
                    cs.team_scores[winner_team]
                ),
            });
            game_over = true;
        } else {
            events.push(EngineEvent::Announce {
                message: format!("scores tied at {}; another hand decides", cs.team_scores[0]),
            });
        }
    }

    events.extend(commit::refresh_events(&mut cs, stats, None, game_over));
    ValidationResult::accept(events)
}
