//! `SessionManager`: the public surface the transport/lobby layer consumes.
//!
//! Owns the registry of open games and routes every operation through the
//! target game's mailbox, so all state access is serialized per game while
//! unrelated games proceed fully concurrently.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::domain::events::GameEvent;
use crate::domain::intent::{Intent, ViewIntent};
use crate::domain::seats::{PlayerId, Seat};
use crate::domain::state::GameState;
use crate::engine::clock::{Clock, SystemClock};
use crate::engine::rules::RulesRegistry;
use crate::engine::view::{GameView, ViewGameEvent};
use crate::errors::engine::EngineError;
use crate::session::config::SessionConfig;
use crate::session::mailbox::{spawn_game_worker, GameCommand, GameMailbox};
use crate::session::record::GameRecord;

/// Result of submitting one intent: the verdict, the events it appended
/// (empty on rejection), and the resulting canonical state. The caller is
/// responsible for turning events into per-viewer views and broadcasting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentOutcome {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<GameEvent>,
    pub state: GameState,
}

impl IntentOutcome {
    pub(crate) fn rejected(reason: impl Into<String>, state: GameState) -> Self {
        Self {
            accepted: false,
            reason: Some(reason.into()),
            events: Vec::new(),
            state,
        }
    }
}

pub struct SessionManager {
    rules: Arc<RulesRegistry>,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    games: DashMap<i64, GameMailbox>,
}

impl SessionManager {
    pub fn new(rules: Arc<RulesRegistry>, config: SessionConfig) -> Self {
        Self::with_clock(rules, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        rules: Arc<RulesRegistry>,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rules,
            config,
            clock,
            games: DashMap::new(),
        }
    }

    pub fn active_games(&self) -> usize {
        self.games.len()
    }

    /// Open a game from an initializer-built state. Must run inside a tokio
    /// runtime; the game's worker task is spawned here.
    pub fn create_game(&self, initial: GameState) -> Result<(), EngineError> {
        let game_id = initial.game_id;
        let module = self.rules.get(&initial.rules_id)?;
        if self.games.len() >= self.config.max_games {
            return Err(EngineError::CapacityExceeded {
                detail: format!("{} games already open", self.games.len()),
            });
        }

        match self.games.entry(game_id) {
            Entry::Occupied(_) => Err(EngineError::GameExists { game_id }),
            Entry::Vacant(entry) => {
                let record = GameRecord::new(initial, module);
                let mailbox = spawn_game_worker(record, self.clock.clone());
                entry.insert(mailbox);
                info!(game_id, "game created");
                Ok(())
            }
        }
    }

    /// Convenience: build the initial deal through the registered rule
    /// module, then open it.
    pub fn new_game(
        &self,
        rules_id: &str,
        game_id: i64,
        seats: Vec<Seat>,
        seed: u64,
    ) -> Result<(), EngineError> {
        let module = self.rules.get(rules_id)?;
        let initial = module.create_game(game_id, seats, seed)?;
        self.create_game(initial)
    }

    /// Submit an engine-space intent (trusted collaborators: AI scheduler,
    /// tests). Serialized with all other work for the same game.
    pub async fn submit_intent(
        &self,
        game_id: i64,
        intent: Intent,
    ) -> Result<IntentOutcome, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(game_id, GameCommand::SubmitIntent { intent, reply })?;
        rx.await.map_err(|_| EngineError::Closed { game_id })?
    }

    /// Submit a client intent whose card references are viewer-specific
    /// opaque ids; they are resolved before validation and the intent is
    /// rejected (as data) if any id does not resolve.
    pub async fn submit_view_intent(
        &self,
        game_id: i64,
        intent: ViewIntent,
    ) -> Result<IntentOutcome, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(game_id, GameCommand::SubmitViewIntent { intent, reply })?;
        rx.await.map_err(|_| EngineError::Closed { game_id })?
    }

    /// Masked, id-remapped snapshot for one viewer.
    pub async fn get_view(&self, game_id: i64, viewer: PlayerId) -> Result<GameView, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(game_id, GameCommand::GetView { viewer, reply })?;
        rx.await.map_err(|_| EngineError::Closed { game_id })
    }

    /// Per-viewer translated event feed for log positions after `since`.
    pub async fn view_events_since(
        &self,
        game_id: i64,
        viewer: PlayerId,
        since: u64,
    ) -> Result<Vec<ViewGameEvent>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(
            game_id,
            GameCommand::ViewEventsSince {
                viewer,
                since,
                reply,
            },
        )?;
        rx.await.map_err(|_| EngineError::Closed { game_id })?
    }

    pub async fn list_legal_intents(
        &self,
        game_id: i64,
        player: PlayerId,
    ) -> Result<Vec<Intent>, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(game_id, GameCommand::ListLegalIntents { player, reply })?;
        rx.await.map_err(|_| EngineError::Closed { game_id })?
    }

    /// Administrative re-deal: new initial state from the rule module, a
    /// fresh log, and a rotated obfuscation salt (all previously issued
    /// opaque card ids become void).
    pub async fn reset_game(&self, game_id: i64, seed: Option<u64>) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(game_id, GameCommand::Reset { seed, reply })?;
        rx.await.map_err(|_| EngineError::Closed { game_id })?
    }

    /// Canonical (unmasked) state, for trusted callers and tests.
    pub async fn snapshot(&self, game_id: i64) -> Result<GameState, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(game_id, GameCommand::Snapshot { reply })?;
        rx.await.map_err(|_| EngineError::Closed { game_id })
    }

    /// Retire a game. In-flight work drains; the worker then exits.
    pub fn close_game(&self, game_id: i64) -> Result<(), EngineError> {
        match self.games.remove(&game_id) {
            Some(_) => {
                debug!(game_id, "game closed");
                Ok(())
            }
            None => Err(EngineError::UnknownGame { game_id }),
        }
    }

    fn send(&self, game_id: i64, command: GameCommand) -> Result<(), EngineError> {
        let mailbox = self
            .games
            .get(&game_id)
            .map(|entry| entry.value().clone())
            .ok_or(EngineError::UnknownGame { game_id })?;
        mailbox
            .send(command)
            .map_err(|_| EngineError::Closed { game_id })
    }
}
