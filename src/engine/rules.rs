//! The rule-module contract and registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::intent::{Intent, ValidationResult};
use crate::domain::seats::{PlayerId, Seat};
use crate::domain::state::GameState;
use crate::domain::validation::ValidationState;
use crate::engine::visibility::VisibilityHints;
use crate::errors::engine::EngineError;

/// One game's rules: a pure function of (snapshot, intent) to a verdict
/// plus the events that encode the consequence.
///
/// Implementations must be deterministic (identical inputs yield identical
/// outputs, including event order), must never mutate state, and express
/// every effect as returned events; nothing is applied directly.
pub trait RuleModule: Send + Sync {
    fn rules_id(&self) -> &'static str;

    /// Build the initial `GameState` for a fresh deal.
    fn create_game(
        &self,
        game_id: i64,
        seats: Vec<Seat>,
        seed: u64,
    ) -> Result<GameState, EngineError>;

    fn validate(&self, state: &ValidationState, intent: &Intent) -> ValidationResult;

    /// A safe superset of currently legal intents for a seat, for AI
    /// candidate generation and UI affordances. Everything returned must
    /// pass `validate`, and callers must still re-validate before applying.
    fn list_legal_intents(&self, _state: &ValidationState, _player: PlayerId) -> Vec<Intent> {
        Vec::new()
    }

    /// Visibility customization for this game type (shared piles, piles the
    /// rules may always read). Constant per module.
    fn visibility_hints(&self) -> VisibilityHints {
        VisibilityHints::default()
    }
}

/// Constructor-injected registry of rule modules, keyed by rules id.
#[derive(Default)]
pub struct RulesRegistry {
    modules: BTreeMap<&'static str, Arc<dyn RuleModule>>,
}

impl RulesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: Arc<dyn RuleModule>) {
        self.modules.insert(module.rules_id(), module);
    }

    pub fn with(mut self, module: Arc<dyn RuleModule>) -> Self {
        self.register(module);
        self
    }

    pub fn get(&self, rules_id: &str) -> Result<Arc<dyn RuleModule>, EngineError> {
        self.modules
            .get(rules_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownRules {
                rules_id: rules_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub;

    impl RuleModule for Stub {
        fn rules_id(&self) -> &'static str {
            "stub"
        }

        fn create_game(
            &self,
            game_id: i64,
            seats: Vec<Seat>,
            seed: u64,
        ) -> Result<GameState, EngineError> {
            Ok(GameState::new(game_id, "stub", seed, seats))
        }

        fn validate(&self, _state: &ValidationState, _intent: &Intent) -> ValidationResult {
            ValidationResult::reject("stub rejects everything")
        }
    }

    #[test]
    fn registry_lookup() {
        let registry = RulesRegistry::new().with(Arc::new(Stub));
        assert!(registry.get("stub").is_ok());
        let err = registry.get("nope").err().unwrap();
        assert_eq!(err.code(), "UNKNOWN_RULES");
    }
}
