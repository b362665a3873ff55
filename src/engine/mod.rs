//! Engine machinery: the pure reducer and projections over the event log,
//! visibility and card-identity obfuscation, the rule-module contract, and
//! the deterministic randomness seams.

pub mod clock;
pub mod log;
pub mod obfuscation;
pub mod projection;
pub mod rules;
pub mod seed;
pub mod view;
pub mod visibility;

pub use clock::{Clock, SystemClock};
pub use log::EventLog;
pub use obfuscation::ViewSalt;
pub use rules::{RuleModule, RulesRegistry};
pub use view::{GameView, ViewGameEvent};
pub use visibility::VisibilityHints;
