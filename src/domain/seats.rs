//! Seats: the durable slots humans or AIs occupy in a game.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seat index within a game. Seat ids double as the obfuscation viewer key.
pub type PlayerId = u8;

/// Where a seat's AI (if any) runs.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AiRuntime {
    #[default]
    None,
    /// Driven by the server-side AI scheduler.
    Backend,
    /// Driven by a sponsoring client connection.
    Frontend,
}

/// A seat's AI-control status is part of game state, not session state: it
/// survives reconnects and is replayed like everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub id: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub is_ai: bool,
    #[serde(default)]
    pub ai_runtime: AiRuntime,
    /// Connection sponsoring a frontend-run AI, when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_sponsor_connection: Option<Uuid>,
}

impl Seat {
    pub fn human(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            is_ai: false,
            ai_runtime: AiRuntime::None,
            ai_sponsor_connection: None,
        }
    }

}

/// Returns the next seat clockwise among `seat_count` seats.
#[inline]
pub fn next_seat(seat: PlayerId, seat_count: usize) -> PlayerId {
    debug_assert!(seat_count > 0);
    ((seat as usize + 1) % seat_count) as PlayerId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_seat_wraps() {
        assert_eq!(next_seat(0, 4), 1);
        assert_eq!(next_seat(3, 4), 0);
        assert_eq!(next_seat(1, 2), 0);
    }

    #[test]
    fn sponsored_seat_round_trips() {
        let mut seat = Seat::human(2, "p2");
        seat.is_ai = true;
        seat.ai_runtime = AiRuntime::Frontend;
        seat.ai_sponsor_connection = Some(Uuid::new_v4());
        let json = serde_json::to_string(&seat).unwrap();
        let back: Seat = serde_json::from_str(&json).unwrap();
        assert_eq!(seat, back);
    }
}
