//! The per-game actor: a single-consumer mailbox whose worker owns the
//! `GameRecord`.
//!
//! Submitting work appends to the game's chain; a unit of work fully
//! settles (reply sent) before the next begins, so validation always sees a
//! state consistent with every previously accepted intent. A failure in one
//! unit never wedges the mailbox. Dropping the sender (close) lets the
//! worker drain and exit; an idle game holds no queued work.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::domain::events::EngineEvent;
use crate::domain::intent::{Intent, ValidationResult, ViewIntent};
use crate::domain::seats::PlayerId;
use crate::domain::state::GameState;
use crate::engine::clock::Clock;
use crate::engine::obfuscation::resolve_view_card_id;
use crate::engine::projection::{apply_event, project_state_with_events};
use crate::engine::seed::derive_deal_seed;
use crate::engine::view::{build_view, translate_events_for_viewer, GameView, ViewGameEvent};
use crate::errors::engine::EngineError;
use crate::session::manager::IntentOutcome;
use crate::session::record::GameRecord;

pub enum GameCommand {
    SubmitIntent {
        intent: Intent,
        reply: oneshot::Sender<Result<IntentOutcome, EngineError>>,
    },
    SubmitViewIntent {
        intent: ViewIntent,
        reply: oneshot::Sender<Result<IntentOutcome, EngineError>>,
    },
    GetView {
        viewer: PlayerId,
        reply: oneshot::Sender<GameView>,
    },
    ViewEventsSince {
        viewer: PlayerId,
        since: u64,
        reply: oneshot::Sender<Result<Vec<ViewGameEvent>, EngineError>>,
    },
    ListLegalIntents {
        player: PlayerId,
        reply: oneshot::Sender<Result<Vec<Intent>, EngineError>>,
    },
    Reset {
        seed: Option<u64>,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    Snapshot {
        reply: oneshot::Sender<GameState>,
    },
}

/// Handle for submitting commands to one game's worker.
#[derive(Clone)]
pub struct GameMailbox {
    tx: mpsc::UnboundedSender<GameCommand>,
}

impl GameMailbox {
    pub fn send(&self, command: GameCommand) -> Result<(), GameCommand> {
        self.tx.send(command).map_err(|e| e.0)
    }
}

/// Spawn the worker task owning `record` and return its mailbox.
pub fn spawn_game_worker(record: GameRecord, clock: Arc<dyn Clock>) -> GameMailbox {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let game_id = record.game_id();
    tokio::spawn(async move {
        let mut record = record;
        while let Some(command) = rx.recv().await {
            handle_command(&mut record, clock.as_ref(), command);
        }
        debug!(game_id, "game worker stopped");
    });
    GameMailbox { tx }
}

fn handle_command(record: &mut GameRecord, clock: &dyn Clock, command: GameCommand) {
    match command {
        GameCommand::SubmitIntent { intent, reply } => {
            let _ = reply.send(process_intent(record, clock, intent));
        }
        GameCommand::SubmitViewIntent { intent, reply } => {
            let result = match resolve_intent(record, intent) {
                Ok(intent) => process_intent(record, clock, intent),
                Err(outcome) => Ok(*outcome),
            };
            let _ = reply.send(result);
        }
        GameCommand::GetView { viewer, reply } => {
            let view = build_view(
                &record.state,
                viewer,
                &record.salt,
                &record.hints,
                record.log.len(),
            );
            let _ = reply.send(view);
        }
        GameCommand::ViewEventsSince {
            viewer,
            since,
            reply,
        } => {
            let _ = reply.send(view_events_since(record, viewer, since));
        }
        GameCommand::ListLegalIntents { player, reply } => {
            let _ = reply.send(list_legal_intents(record, player));
        }
        GameCommand::Reset { seed, reply } => {
            let _ = reply.send(reset(record, seed));
        }
        GameCommand::Snapshot { reply } => {
            let _ = reply.send(record.state.clone());
        }
    }
}

/// Map a view-space intent into engine card-id space.
///
/// An opaque id that does not resolve to a card on the submitting player's
/// visible surface rejects the intent outright; the engine never guesses.
fn resolve_intent(record: &GameRecord, intent: ViewIntent) -> Result<Intent, Box<IntentOutcome>> {
    match intent {
        ViewIntent::Action {
            game_id,
            player,
            action_id,
        } => Ok(Intent::Action {
            game_id,
            player,
            action_id,
        }),
        ViewIntent::Move {
            game_id,
            player,
            from,
            to,
            cards,
        } => {
            let mut resolved = Vec::with_capacity(cards.len());
            for view_id in cards {
                match resolve_view_card_id(view_id, &record.salt, player, &record.state, &record.hints)
                {
                    Some(card) => resolved.push(card),
                    None => {
                        return Err(Box::new(IntentOutcome::rejected(
                            format!("unknown-card: id {view_id} does not resolve for this viewer"),
                            record.state.clone(),
                        )));
                    }
                }
            }
            Ok(Intent::Move {
                game_id,
                player,
                from,
                to,
                cards: resolved,
            })
        }
    }
}

fn process_intent(
    record: &mut GameRecord,
    clock: &dyn Clock,
    intent: Intent,
) -> Result<IntentOutcome, EngineError> {
    let game_id = record.game_id();
    if let Some(fault) = &record.fault {
        return Err(EngineError::Halted {
            game_id,
            detail: fault.clone(),
        });
    }
    if intent.game_id() != game_id {
        return Ok(IntentOutcome::rejected(
            format!("wrong-game: intent addressed to game {}", intent.game_id()),
            record.state.clone(),
        ));
    }
    if !record.state.has_seat(intent.player()) {
        return Ok(IntentOutcome::rejected(
            format!("unknown-seat: no seat {}", intent.player()),
            record.state.clone(),
        ));
    }
    // Winner is terminal: only administrative reset may clear it.
    if record.state.winner.is_some() {
        return Ok(IntentOutcome::rejected(
            "game-over: winner already declared",
            record.state.clone(),
        ));
    }

    let snapshot =
        crate::domain::validation::ValidationState::for_player(&record.state, intent.player(), &record.hints);
    let verdict: ValidationResult = record.module.validate(&snapshot, &intent);

    if !verdict.valid {
        let reason = verdict
            .reason
            .unwrap_or_else(|| "rejected without reason".to_string());
        debug!(game_id, player = intent.player(), %reason, "intent rejected");
        return Ok(IntentOutcome::rejected(reason, record.state.clone()));
    }

    // Atomic batch apply: events land on a scratch projection first; the log
    // and cached state only advance if the whole batch is structurally sound.
    let mut scratch = record.state.clone();
    for event in &verdict.events {
        if let Err(err) = apply_event(&mut scratch, event) {
            error!(game_id, player = intent.player(), error = %err, "structural failure applying batch; game halted");
            fault(record, clock, &err);
            return Err(err);
        }
    }

    let at = clock.now();
    let player = Some(intent.player());
    let mut appended = Vec::with_capacity(verdict.events.len());
    for event in verdict.events {
        appended.push(record.log.append(player, at, event).clone());
    }
    record.state = scratch;
    debug!(
        game_id,
        player = intent.player(),
        events = appended.len(),
        seq = record.log.len(),
        "intent accepted"
    );

    Ok(IntentOutcome {
        accepted: true,
        reason: None,
        events: appended,
        state: record.state.clone(),
    })
}

/// Halt the instance: flag the record and put a `fatal-error` marker on the
/// log so views and event feeds carry it to every viewer.
fn fault(record: &mut GameRecord, clock: &dyn Clock, err: &EngineError) {
    let detail = err.to_string();
    record.fault = Some(detail.clone());
    let marker = EngineEvent::FatalError { message: detail };
    // the fatal arm of the reducer only appends an announcement
    if apply_event(&mut record.state, &marker).is_ok() {
        record.log.append(None, clock.now(), marker);
    }
}

fn view_events_since(
    record: &GameRecord,
    viewer: PlayerId,
    since: u64,
) -> Result<Vec<ViewGameEvent>, EngineError> {
    let prefix_len = since.min(record.log.len()) as usize;
    let state_before =
        project_state_with_events(record.log.initial(), &record.log.events()[..prefix_len])?;
    translate_events_for_viewer(
        &state_before,
        record.log.events_since(since),
        viewer,
        &record.salt,
        &record.hints,
    )
}

fn list_legal_intents(record: &GameRecord, player: PlayerId) -> Result<Vec<Intent>, EngineError> {
    if let Some(fault) = &record.fault {
        return Err(EngineError::Halted {
            game_id: record.game_id(),
            detail: fault.clone(),
        });
    }
    if record.state.winner.is_some() || !record.state.has_seat(player) {
        return Ok(Vec::new());
    }
    let snapshot =
        crate::domain::validation::ValidationState::for_player(&record.state, player, &record.hints);
    Ok(record.module.list_legal_intents(&snapshot, player))
}

fn reset(record: &mut GameRecord, seed: Option<u64>) -> Result<(), EngineError> {
    let game_id = record.game_id();
    let next_deal = record.state.deal_number + 1;
    let seed =
        seed.unwrap_or_else(|| derive_deal_seed(game_id, next_deal, record.module.rules_id()));
    let seats = record.state.seats.clone();
    let mut initial = record.module.create_game(game_id, seats, seed)?;
    initial.deal_number = next_deal;
    if record.fault.is_some() {
        warn!(game_id, "resetting faulted game");
    }
    record.replace_deal(initial);
    debug!(game_id, deal_number = next_deal, "game reset");
    Ok(())
}
