//! The append-only per-game event log.
//!
//! The log is the source of truth for a game instance; the cached
//! `GameState` is always a derived projection of it. Entries are never
//! rewritten or removed; administrative reset replaces the whole log.

use time::OffsetDateTime;

use crate::domain::events::{EngineEvent, GameEvent};
use crate::domain::seats::PlayerId;
use crate::domain::state::GameState;

#[derive(Debug, Clone)]
pub struct EventLog {
    initial: GameState,
    events: Vec<GameEvent>,
}

impl EventLog {
    pub fn new(initial: GameState) -> Self {
        Self {
            initial,
            events: Vec::new(),
        }
    }

    pub fn initial(&self) -> &GameState {
        &self.initial
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn len(&self) -> u64 {
        self.events.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sequence number the next appended event will receive.
    pub fn next_seq(&self) -> u64 {
        self.len() + 1
    }

    /// Events with `seq > since`, for backfilled/partial replay by callers
    /// that already hold a prefix.
    pub fn events_since(&self, since: u64) -> &[GameEvent] {
        let skip = (since.min(self.len())) as usize;
        &self.events[skip..]
    }

    pub fn append(
        &mut self,
        player: Option<PlayerId>,
        at: OffsetDateTime,
        event: EngineEvent,
    ) -> &GameEvent {
        let entry = GameEvent {
            seq: self.next_seq(),
            game_id: self.initial.game_id,
            player,
            at,
            event,
        };
        self.events.push(entry);
        self.events
            .last()
            .unwrap_or_else(|| unreachable!("just pushed"))
    }
}
