//! Built-in rule modules.

pub mod canasta;

use std::sync::Arc;

use crate::engine::rules::RulesRegistry;

/// Registry preloaded with every built-in game.
pub fn builtin_registry() -> RulesRegistry {
    RulesRegistry::new().with(Arc::new(canasta::CanastaRules))
}
