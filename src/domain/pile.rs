//! Piles: ordered, owned-or-shared collections of card ids.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::cards::CardId;
use crate::domain::seats::PlayerId;

/// Identifier of a pile within one game instance (e.g. `stock`, `hand-2`,
/// `meld-0-Seven`). Piles are created at game start and persist for the
/// instance's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PileId(String);

impl PileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Who may see a pile's contents under normal rules.
///
/// Rule-module hint tables (shared piles, rules-visible piles) can widen
/// this; see `engine::visibility`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PileVisibility {
    /// Contents visible to every viewer.
    Public,
    /// Contents visible to the owning seat only.
    Owner,
    /// Contents concealed from everyone (e.g. a face-down stock).
    Hidden,
}

/// Free-form display/rule markers on a pile (e.g. canasta's `frozen` flag).
/// Interpreted by rule modules and renderers, never by the core reducer.
pub type PileProperties = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pile {
    pub id: PileId,
    pub owner: Option<PlayerId>,
    pub visibility: PileVisibility,
    /// Ordered card ids; index 0 is the bottom, the last element is the top.
    pub cards: Vec<CardId>,
    #[serde(default, skip_serializing_if = "PileProperties::is_empty")]
    pub properties: PileProperties,
}

impl Pile {
    pub fn new(id: PileId, owner: Option<PlayerId>, visibility: PileVisibility) -> Self {
        Self {
            id,
            owner,
            visibility,
            cards: Vec::new(),
            properties: PileProperties::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn top(&self) -> Option<CardId> {
        self.cards.last().copied()
    }

    pub fn contains(&self, card: CardId) -> bool {
        self.cards.contains(&card)
    }

    pub fn property_flag(&self, key: &str) -> bool {
        self.properties
            .get(key)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}
