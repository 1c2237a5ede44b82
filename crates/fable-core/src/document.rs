//! The persisted game document.

use serde::{Deserialize, Serialize};

use crate::clock::GameTime;
use crate::entity::{AssetRecord, CharacterRecord, EntityKind, EventRecord, ForeshadowingRecord};
use crate::narrative::NarrativeState;

/// Player inventory: four collections sharing the asset shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Assets {
    /// Carried items.
    pub items: Vec<AssetRecord>,
    /// Owned property.
    pub property: Vec<AssetRecord>,
    /// Known facts.
    pub knowledge: Vec<AssetRecord>,
    /// Known places.
    pub locations: Vec<AssetRecord>,
}

impl Assets {
    /// The collection for an asset kind. `None` for non-asset kinds.
    pub fn collection(&self, kind: EntityKind) -> Option<&Vec<AssetRecord>> {
        match kind {
            EntityKind::Item => Some(&self.items),
            EntityKind::Property => Some(&self.property),
            EntityKind::Knowledge => Some(&self.knowledge),
            EntityKind::Location => Some(&self.locations),
            _ => None,
        }
    }

    /// Mutable collection for an asset kind.
    pub fn collection_mut(&mut self, kind: EntityKind) -> Option<&mut Vec<AssetRecord>> {
        match kind {
            EntityKind::Item => Some(&mut self.items),
            EntityKind::Property => Some(&mut self.property),
            EntityKind::Knowledge => Some(&mut self.knowledge),
            EntityKind::Location => Some(&mut self.locations),
            _ => None,
        }
    }
}

/// Everything a running game persists apart from achievements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameDocument {
    /// Pacing state.
    pub narrative: NarrativeState,
    /// In-fiction clock.
    pub current_time: GameTime,
    /// Ongoing events.
    pub events: Vec<EventRecord>,
    /// Planted hints.
    pub foreshadowings: Vec<ForeshadowingRecord>,
    /// Known characters.
    pub characters: Vec<CharacterRecord>,
    /// Player inventory.
    pub assets: Assets,
}

impl GameDocument {
    /// A fresh document whose clock starts at `start`.
    pub fn starting_at(start: GameTime) -> Self {
        Self {
            current_time: start,
            ..Self::default()
        }
    }

    /// Number of records in a collection.
    pub fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Event => self.events.len(),
            EntityKind::Foreshadowing => self.foreshadowings.len(),
            EntityKind::Character => self.characters.len(),
            _ => self.assets.collection(kind).map_or(0, Vec::len),
        }
    }

    /// Names in a collection, in stored order.
    pub fn names(&self, kind: EntityKind) -> Vec<&str> {
        match kind {
            EntityKind::Event => self.events.iter().map(|r| r.name.as_str()).collect(),
            EntityKind::Foreshadowing => {
                self.foreshadowings.iter().map(|r| r.name.as_str()).collect()
            }
            EntityKind::Character => self.characters.iter().map(|r| r.name.as_str()).collect(),
            _ => self
                .assets
                .collection(kind)
                .map(|c| c.iter().map(|r| r.name.as_str()).collect())
                .unwrap_or_default(),
        }
    }
}
