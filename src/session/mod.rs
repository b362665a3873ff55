//! Per-session orchestration: one actor mailbox per game instance
//! serializes all intent processing for that game while unrelated games run
//! concurrently.

pub mod config;
pub mod mailbox;
pub mod manager;
pub mod record;

pub use config::SessionConfig;
pub use manager::{IntentOutcome, SessionManager};
