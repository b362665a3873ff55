//! The in-memory record of one open game instance.

use std::sync::Arc;

use crate::domain::state::GameState;
use crate::engine::log::EventLog;
use crate::engine::obfuscation::ViewSalt;
use crate::engine::rules::RuleModule;
use crate::engine::visibility::VisibilityHints;

/// Everything a game's worker owns exclusively: the log, the cached
/// projection, the obfuscation salt, and the fault flag.
///
/// No other component may touch these; all access is serialized through the
/// game's mailbox.
pub struct GameRecord {
    pub module: Arc<dyn RuleModule>,
    pub hints: VisibilityHints,
    pub log: EventLog,
    /// Cached projection of `log`; always equals replaying it.
    pub state: GameState,
    pub salt: ViewSalt,
    /// Set on structural failure; blocks further mutation until reset.
    pub fault: Option<String>,
}

impl GameRecord {
    pub fn new(initial: GameState, module: Arc<dyn RuleModule>) -> Self {
        let hints = module.visibility_hints();
        Self {
            module,
            hints,
            state: initial.clone(),
            log: EventLog::new(initial),
            salt: ViewSalt::generate(),
            fault: None,
        }
    }

    pub fn game_id(&self) -> i64 {
        self.state.game_id
    }

    /// Replace log, state, and salt for a fresh deal. Previously issued
    /// opaque card ids become void by design.
    pub fn replace_deal(&mut self, initial: GameState) {
        self.state = initial.clone();
        self.log = EventLog::new(initial);
        self.salt = ViewSalt::generate();
        self.fault = None;
    }
}
