//! Pure domain types for the engine: cards, piles, seats, state, intents,
//! events, and the masked snapshot rule modules validate against.
//!
//! Nothing in this module performs IO or holds locks; everything is plain
//! data plus small pure helpers.

pub mod cards;
pub mod events;
pub mod intent;
pub mod pile;
pub mod seats;
pub mod state;
pub mod validation;

pub use cards::{Card, CardId, Rank, Suit};
pub use events::{CardVisual, EngineEvent, GameEvent};
pub use intent::{Intent, ValidationResult, ViewIntent};
pub use pile::{Pile, PileId, PileProperties, PileVisibility};
pub use seats::{AiRuntime, PlayerId, Seat};
pub use state::{ActionDescriptor, GameState, ScoreRow, Scoreboard};
pub use validation::{PileSummary, ValidationState};
