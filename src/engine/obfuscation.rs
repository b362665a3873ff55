//! Card-identity obfuscation.
//!
//! Every game instance owns a secret salt. A concealed card's id is never
//! sent to a viewer; instead each viewer gets an opaque id derived from
//! (real id, salt, viewer key) with a keyed one-way hash. The mapping is
//! stable for a fixed viewer while the salt holds, so UIs can track "the
//! same card" moving between piles, but different viewers (and any salt
//! rotation) see unrelated ids, so concealed cards cannot be correlated
//! across feeds.

use rand::RngCore;

use crate::domain::cards::CardId;
use crate::domain::seats::PlayerId;
use crate::domain::state::GameState;
use crate::engine::visibility::{is_pile_visible_to_player, VisibilityHints};

/// Viewer-facing opaque card id.
pub type ViewCardId = u64;

/// Per-game-instance secret; rotates only on session reset.
#[derive(Clone, PartialEq, Eq)]
pub struct ViewSalt([u8; 32]);

impl ViewSalt {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for ViewSalt {
    // Never log the salt itself.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ViewSalt(..)")
    }
}

/// Opaque id of `card` as shown to `viewer` under `salt`.
pub fn view_card_id(card: CardId, salt: &ViewSalt, viewer: PlayerId) -> ViewCardId {
    let mut hasher = blake3::Hasher::new_keyed(&salt.0);
    hasher.update(b"card");
    hasher.update(&card.to_le_bytes());
    hasher.update(&[viewer]);
    let hash = hasher.finalize();
    let bytes = hash.as_bytes();
    u64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

/// Invert an opaque id back to the engine card id, for intents that
/// reference cards by their view-local ids.
///
/// Resolution succeeds only for cards currently on the viewer's visible
/// surface (a pile the viewer may see into). Anything else returns `None`;
/// the caller must reject, never guess.
pub fn resolve_view_card_id(
    view_id: ViewCardId,
    salt: &ViewSalt,
    viewer: PlayerId,
    state: &GameState,
    hints: &VisibilityHints,
) -> Option<CardId> {
    for pile in state.piles.values() {
        if !is_pile_visible_to_player(pile, viewer, hints) {
            continue;
        }
        for &card in &pile.cards {
            if view_card_id(card, salt, viewer) == view_id {
                return Some(card);
            }
        }
    }
    None
}
