//! Pile visibility: which piles' contents a given viewer may see.

use std::collections::BTreeSet;

use crate::domain::pile::{Pile, PileId, PileVisibility};
use crate::domain::seats::PlayerId;

/// Per-game-type visibility customization supplied by the rule module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilityHints {
    /// Piles visible to every viewer regardless of their own visibility mode
    /// (e.g. a shared meld area a module keeps formally owner-scoped).
    pub shared: BTreeSet<PileId>,
    /// Piles whose contents validation may always read (e.g. the stock a
    /// module deals from). Not viewer-visible; this only widens what the
    /// rule module itself sees.
    pub rules_visible: BTreeSet<PileId>,
}

impl VisibilityHints {
    pub fn new(
        shared: impl IntoIterator<Item = PileId>,
        rules_visible: impl IntoIterator<Item = PileId>,
    ) -> Self {
        Self {
            shared: shared.into_iter().collect(),
            rules_visible: rules_visible.into_iter().collect(),
        }
    }
}

/// True if `viewer` may see the contents of `pile`.
pub fn is_pile_visible_to_player(pile: &Pile, viewer: PlayerId, hints: &VisibilityHints) -> bool {
    if hints.shared.contains(&pile.id) {
        return true;
    }
    match pile.visibility {
        PileVisibility::Public => true,
        PileVisibility::Owner => pile.owner == Some(viewer),
        PileVisibility::Hidden => false,
    }
}
