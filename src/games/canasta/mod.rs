//! Partnership canasta for four seats in two fixed teams.
//!
//! Pile layout per game instance:
//!   - `stock`            face-down draw pile (hidden; readable by rules)
//!   - `discard`          face-up pile; `frozen` property when frozen
//!   - `hand-{seat}`      one owner-visible hand per seat
//!   - `meld-{team}-{rank}` one public pile per team and meldable rank
//!   - `red-threes-{team}` public bonus piles
//!
//! A turn is draw-or-pickup, any number of melds, then one discard. Hands
//! end when a player goes out (with a canasta on the table) or the stock
//! runs dry; the match ends when a team reaches 5000.

mod commit;
mod deal;
mod intents;
mod scoring;
mod state;
mod validate;

#[cfg(test)]
mod tests;

pub use state::{AiHints, CanastaState, TurnPhase};

use crate::domain::cards::Rank;
use crate::domain::intent::{Intent, ValidationResult};
use crate::domain::pile::PileId;
use crate::domain::seats::{PlayerId, Seat};
use crate::domain::state::GameState;
use crate::domain::validation::ValidationState;
use crate::engine::rules::RuleModule;
use crate::engine::visibility::VisibilityHints;
use crate::errors::engine::EngineError;
use crate::games::canasta::state::{SEATS, TEAMS};

pub const RULES_ID: &str = "canasta";

/// Ranks that may form melds. Threes never meld; wilds only join these.
pub(crate) const MELD_RANKS: [Rank; 11] = [
    Rank::Four,
    Rank::Five,
    Rank::Six,
    Rank::Seven,
    Rank::Eight,
    Rank::Nine,
    Rank::Ten,
    Rank::Jack,
    Rank::Queen,
    Rank::King,
    Rank::Ace,
];

pub struct CanastaRules;

impl RuleModule for CanastaRules {
    fn rules_id(&self) -> &'static str {
        RULES_ID
    }

    fn create_game(
        &self,
        game_id: i64,
        seats: Vec<Seat>,
        seed: u64,
    ) -> Result<GameState, EngineError> {
        deal::create_game(game_id, seats, seed)
    }

    fn validate(&self, state: &ValidationState, intent: &Intent) -> ValidationResult {
        validate::validate(state, intent)
    }

    fn list_legal_intents(&self, state: &ValidationState, player: PlayerId) -> Vec<Intent> {
        intents::list_legal_intents(state, player)
    }

    /// The stock and every hand are readable by validation (dealing and
    /// re-dealing are composed as events over them); none of it leaks to
    /// viewers.
    fn visibility_hints(&self) -> VisibilityHints {
        let rules_visible = std::iter::once(stock_pile())
            .chain((0..SEATS).map(|seat| hand_pile(seat as PlayerId)));
        VisibilityHints::new([], rules_visible)
    }
}

pub(crate) fn stock_pile() -> PileId {
    PileId::from("stock")
}

pub(crate) fn discard_pile() -> PileId {
    PileId::from("discard")
}

pub(crate) fn hand_pile(player: PlayerId) -> PileId {
    PileId::new(format!("hand-{player}"))
}

pub(crate) fn meld_pile(team: usize, rank: Rank) -> PileId {
    PileId::new(format!("meld-{team}-{}", rank_token(rank)))
}

pub(crate) fn red_three_pile(team: usize) -> PileId {
    PileId::new(format!("red-threes-{team}"))
}

fn rank_token(rank: Rank) -> &'static str {
    match rank {
        Rank::Two => "two",
        Rank::Three => "three",
        Rank::Four => "four",
        Rank::Five => "five",
        Rank::Six => "six",
        Rank::Seven => "seven",
        Rank::Eight => "eight",
        Rank::Nine => "nine",
        Rank::Ten => "ten",
        Rank::Jack => "jack",
        Rank::Queen => "queen",
        Rank::King => "king",
        Rank::Ace => "ace",
        Rank::Joker => "joker",
    }
}

fn rank_from_token(token: &str) -> Option<Rank> {
    MELD_RANKS.iter().copied().find(|r| rank_token(*r) == token)
}

/// Parse `meld-{team}-{rank}`; `None` for anything else.
pub(crate) fn meld_target(id: &str) -> Option<(usize, Rank)> {
    let rest = id.strip_prefix("meld-")?;
    let (team, token) = rest.split_once('-')?;
    let team = team.parse::<usize>().ok().filter(|t| *t < TEAMS)?;
    Some((team, rank_from_token(token)?))
}

/// Parse `hand-{seat}`; `None` for anything else.
pub(crate) fn hand_seat(id: &str) -> Option<PlayerId> {
    id.strip_prefix("hand-")?
        .parse::<PlayerId>()
        .ok()
        .filter(|s| (*s as usize) < SEATS)
}
