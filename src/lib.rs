#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod domain;
pub mod engine;
pub mod errors;
pub mod games;
pub mod session;
pub mod telemetry;

#[cfg(test)]
pub mod test_bootstrap;

// Re-exports for public API
pub use domain::cards::{Card, CardId, Rank, Suit};
pub use domain::events::{EngineEvent, GameEvent};
pub use domain::intent::{Intent, ValidationResult, ViewIntent};
pub use domain::pile::{Pile, PileId, PileVisibility};
pub use domain::seats::{AiRuntime, PlayerId, Seat};
pub use domain::state::GameState;
pub use domain::validation::{PileSummary, ValidationState};
pub use engine::rules::{RuleModule, RulesRegistry};
pub use engine::view::GameView;
pub use errors::engine::EngineError;
pub use session::config::SessionConfig;
pub use session::manager::{IntentOutcome, SessionManager};

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
