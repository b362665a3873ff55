//! Trailing events of every accepted batch: the rules payload, the offered
//! actions, and the scoreboards, all recomputed from the post-batch table.

use crate::domain::events::EngineEvent;
use crate::domain::seats::PlayerId;
use crate::domain::state::{ActionDescriptor, ScoreRow, Scoreboard};
use crate::games::canasta::scoring::TableStats;
use crate::games::canasta::state::{
    initial_meld_minimum, AiHints, CanastaState, TurnPhase, TEAMS,
};

/// Build the `SetRulesState` / `SetActions` / `SetScoreboards` tail for a
/// batch. Updates `cs.ai_hints` in place so the serialized payload carries
/// them.
pub(crate) fn refresh_events(
    cs: &mut CanastaState,
    stats: &TableStats,
    to_act: Option<PlayerId>,
    game_over: bool,
) -> Vec<EngineEvent> {
    let actions = offered_actions(cs, to_act, game_over);
    cs.ai_hints = Some(AiHints {
        to_act,
        actions: actions.iter().map(|a| a.id.clone()).collect(),
        meld_minimum: [
            initial_meld_minimum(cs.team_scores[0]),
            initial_meld_minimum(cs.team_scores[1]),
        ],
    });
    vec![
        EngineEvent::SetRulesState {
            payload: cs.to_value(),
        },
        EngineEvent::SetActions { actions },
        EngineEvent::SetScoreboards {
            scoreboards: scoreboards(cs, stats),
        },
    ]
}

fn offered_actions(
    cs: &CanastaState,
    to_act: Option<PlayerId>,
    game_over: bool,
) -> Vec<ActionDescriptor> {
    match cs.phase {
        TurnPhase::MustDraw => {
            let mut actions = vec![ActionDescriptor {
                id: "draw".to_string(),
                label: "Draw from the stock".to_string(),
                player: to_act,
            }];
            actions.push(ActionDescriptor {
                id: "pickup".to_string(),
                label: "Pick up the discard pile".to_string(),
                player: to_act,
            });
            actions
        }
        // melding and discarding are card moves, not named actions
        TurnPhase::MeldOrDiscard => Vec::new(),
        TurnPhase::HandComplete if !game_over => vec![ActionDescriptor {
            id: "start-next-hand".to_string(),
            label: "Deal the next hand".to_string(),
            player: None,
        }],
        TurnPhase::HandComplete => Vec::new(),
    }
}

fn scoreboards(cs: &CanastaState, stats: &TableStats) -> Vec<Scoreboard> {
    (0..TEAMS)
        .map(|team| Scoreboard {
            title: format!("Team {team} (seats {team} & {})", team + 2),
            rows: vec![
                ScoreRow {
                    label: "Total".to_string(),
                    value: cs.team_scores[team].to_string(),
                },
                ScoreRow {
                    label: "On the table".to_string(),
                    value: stats.meld_points[team].to_string(),
                },
                ScoreRow {
                    label: "Canastas".to_string(),
                    value: stats.canastas[team].to_string(),
                },
                ScoreRow {
                    label: "Red threes".to_string(),
                    value: stats.red_threes[team].to_string(),
                },
                ScoreRow {
                    label: "Initial meld".to_string(),
                    value: initial_meld_minimum(cs.team_scores[team]).to_string(),
                },
            ],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(phase: TurnPhase) -> CanastaState {
        CanastaState {
            phase,
            dealer: 0,
            hand_number: 1,
            team_scores: [0, 1600],
            team_melded: [false, false],
            frozen: false,
            ai_hints: None,
        }
    }

    #[test]
    fn refresh_embeds_ai_hints_in_the_payload() {
        let mut cs = state(TurnPhase::MustDraw);
        let events = refresh_events(&mut cs, &TableStats::default(), Some(2), false);
        assert_eq!(events.len(), 3);
        let EngineEvent::SetRulesState { payload } = &events[0] else {
            panic!("rules payload first");
        };
        let hints = &payload["aiHints"];
        assert_eq!(hints["toAct"], 2);
        assert_eq!(hints["actions"][0], "draw");
        assert_eq!(hints["meldMinimum"][1], 90);
    }

    #[test]
    fn no_named_actions_while_melding() {
        let mut cs = state(TurnPhase::MeldOrDiscard);
        let events = refresh_events(&mut cs, &TableStats::default(), Some(1), false);
        let EngineEvent::SetActions { actions } = &events[1] else {
            panic!("actions second");
        };
        assert!(actions.is_empty());
    }

    #[test]
    fn hand_complete_offers_next_hand_until_game_over() {
        let mut cs = state(TurnPhase::HandComplete);
        let events = refresh_events(&mut cs, &TableStats::default(), None, false);
        let EngineEvent::SetActions { actions } = &events[1] else {
            panic!("actions second");
        };
        assert_eq!(actions[0].id, "start-next-hand");
        assert_eq!(actions[0].player, None);

        let events = refresh_events(&mut cs, &TableStats::default(), None, true);
        let EngineEvent::SetActions { actions } = &events[1] else {
            panic!("actions second");
        };
        assert!(actions.is_empty());
    }
}
