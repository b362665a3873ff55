//! RNG seed derivation for deterministic game behavior.
//!
//! Shuffles must be reproducible per (game, deal, label) so a game can be
//! replayed or re-dealt bit-for-bit, while different deals and different
//! uses of randomness within a deal stay statistically independent.

/// Derive the shuffle seed for a specific deal of a game.
///
/// Same (game, deal, label) always yields the same seed; any component
/// changing yields an unrelated one. `label` separates uses, e.g. a rule
/// module's deal shuffle vs. an in-hand reshuffle.
pub fn derive_deal_seed(game_id: i64, deal_number: u32, label: &str) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"cardroom.deal.v1");
    hasher.update(&game_id.to_le_bytes());
    hasher.update(&deal_number.to_le_bytes());
    hasher.update(label.as_bytes());
    let hash = hasher.finalize();
    let bytes = hash.as_bytes();
    u64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}
