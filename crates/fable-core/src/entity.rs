//! Named entity records and the patches that create or update them.
//!
//! Every record is identified by its `name` within its collection. Patches
//! carry the same fields with optional values so that an update can leave
//! omitted fields untouched. Fields the model does not know are kept in
//! `extra` and round-trip through the document.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Importance assumed for records that do not state one.
pub const DEFAULT_IMPORTANCE: u8 = 3;

/// The seven named-entity collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A timed story event.
    Event,
    /// A planted hint to be paid off later.
    Foreshadowing,
    /// A non-player character.
    Character,
    /// An item carried by the player.
    Item,
    /// Property or assets owned by the player.
    Property,
    /// A piece of knowledge.
    Knowledge,
    /// A known place.
    Location,
}

impl EntityKind {
    /// All kinds in document order.
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Event,
        EntityKind::Foreshadowing,
        EntityKind::Character,
        EntityKind::Item,
        EntityKind::Property,
        EntityKind::Knowledge,
        EntityKind::Location,
    ];

    /// The four kinds that share the asset shape.
    pub const ASSETS: [EntityKind; 4] = [
        EntityKind::Item,
        EntityKind::Property,
        EntityKind::Knowledge,
        EntityKind::Location,
    ];

    /// Whether records of this kind use [`AssetRecord`].
    pub fn is_asset(&self) -> bool {
        Self::ASSETS.contains(self)
    }

    /// Lowercase name used in logs and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Foreshadowing => "foreshadowing",
            Self::Character => "character",
            Self::Item => "item",
            Self::Property => "property",
            Self::Knowledge => "knowledge",
            Self::Location => "location",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an event is on stage or progressing off screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Happening in front of the player.
    Foreground,
    /// Progressing in the background.
    Background,
}

impl EventStatus {
    /// Parse `foreground` or `background`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "foreground" => Some(Self::Foreground),
            "background" => Some(Self::Background),
            _ => None,
        }
    }
}

/// A timed story event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Unique name.
    pub name: String,
    /// What is happening.
    #[serde(default)]
    pub description: String,
    /// When the event began.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// When the event is expected to end. Reaching it expires the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_end_time: Option<String>,
    /// Foreground or background.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    /// Importance in `[1, 5]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<u8>,
    /// Names of the characters involved.
    #[serde(default)]
    pub participants: Vec<String>,
    /// Game time at which the record was last written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_time: Option<String>,
    /// Fields not covered above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A planted hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeshadowingRecord {
    /// Unique name.
    pub name: String,
    /// What was planted.
    #[serde(default)]
    pub description: String,
    /// When it was planted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence_time: Option<String>,
    /// Importance in `[1, 5]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<u8>,
    /// Fields not covered above, such as `meta`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ForeshadowingRecord {
    /// Importance with the default applied.
    pub fn effective_importance(&self) -> u8 {
        self.importance.unwrap_or(DEFAULT_IMPORTANCE)
    }
}

/// A non-player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    /// Unique name.
    pub name: String,
    /// Who they are.
    #[serde(default)]
    pub description: String,
    /// Distinguishing details the narrator should keep consistent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_points: Option<String>,
    /// Insect archetype symbol.
    pub template: CharacterTemplate,
    /// Relationship to the player.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    /// Things the character has done, oldest first.
    #[serde(default)]
    pub things_done: Vec<String>,
    /// Fields not covered above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Shape shared by items, property, knowledge and locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    /// Unique name.
    pub name: String,
    /// What it is.
    #[serde(default)]
    pub description: String,
    /// Who holds it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Fields not covered above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial event data from a register or update command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    /// Target record.
    pub name: String,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New start time.
    #[serde(default)]
    pub start_time: Option<String>,
    /// New expected end time.
    #[serde(default)]
    pub expected_end_time: Option<String>,
    /// New status.
    #[serde(default)]
    pub status: Option<EventStatus>,
    /// New importance.
    #[serde(default)]
    pub importance: Option<u8>,
    /// Replacement participant list.
    #[serde(default)]
    pub participants: Option<Vec<String>>,
    /// Write stamp; set by the store, not the narrator.
    #[serde(default)]
    pub current_time: Option<String>,
    /// Extra fields, merged key by key.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial foreshadowing data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeshadowingPatch {
    /// Target record.
    pub name: String,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New occurrence time.
    #[serde(default)]
    pub occurrence_time: Option<String>,
    /// New importance.
    #[serde(default)]
    pub importance: Option<u8>,
    /// Extra fields, merged key by key.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial character data.
///
/// `template` is kept as free text here; the store resolves it to a
/// [`CharacterTemplate`] and replaces invalid values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterPatch {
    /// Target record.
    pub name: String,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New memory points.
    #[serde(default)]
    pub memory_points: Option<String>,
    /// Requested template symbol, possibly invalid.
    #[serde(default)]
    pub template: Option<String>,
    /// New relationship.
    #[serde(default)]
    pub relationship: Option<String>,
    /// Replacement history list.
    #[serde(default)]
    pub things_done: Option<Vec<String>>,
    /// Extra fields, merged key by key.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial asset data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPatch {
    /// Target record.
    pub name: String,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New owner.
    #[serde(default)]
    pub owner: Option<String>,
    /// Extra fields, merged key by key.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Insect archetype assigned to every character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterTemplate {
    /// 蜂
    #[serde(rename = "蜂")]
    Bee,
    /// 蚁
    #[serde(rename = "蚁")]
    Ant,
    /// 蛾
    #[serde(rename = "蛾")]
    Moth,
    /// 蝶
    #[serde(rename = "蝶")]
    Butterfly,
    /// 蝗
    #[serde(rename = "蝗")]
    Locust,
    /// 蜣
    #[serde(rename = "蜣")]
    DungBeetle,
    /// 螳
    #[serde(rename = "螳")]
    Mantis,
    /// 蝎
    #[serde(rename = "蝎")]
    Scorpion,
    /// 蛛
    #[serde(rename = "蛛")]
    Spider,
    /// 蛉
    #[serde(rename = "蛉")]
    Lacewing,
    /// 蝉
    #[serde(rename = "蝉")]
    Cicada,
    /// 萤
    #[serde(rename = "萤")]
    Firefly,
}

impl CharacterTemplate {
    /// Every template, in canonical order.
    pub const ALL: [CharacterTemplate; 12] = [
        CharacterTemplate::Bee,
        CharacterTemplate::Ant,
        CharacterTemplate::Moth,
        CharacterTemplate::Butterfly,
        CharacterTemplate::Locust,
        CharacterTemplate::DungBeetle,
        CharacterTemplate::Mantis,
        CharacterTemplate::Scorpion,
        CharacterTemplate::Spider,
        CharacterTemplate::Lacewing,
        CharacterTemplate::Cicada,
        CharacterTemplate::Firefly,
    ];

    /// The single-character symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Bee => "蜂",
            Self::Ant => "蚁",
            Self::Moth => "蛾",
            Self::Butterfly => "蝶",
            Self::Locust => "蝗",
            Self::DungBeetle => "蜣",
            Self::Mantis => "螳",
            Self::Scorpion => "蝎",
            Self::Spider => "蛛",
            Self::Lacewing => "蛉",
            Self::Cicada => "蝉",
            Self::Firefly => "萤",
        }
    }

    /// Look up a template by symbol.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|t| t.symbol() == s)
    }

    /// Pick a template from a uniform roll in `[0, 1)`.
    pub fn pick(roll: f64) -> Self {
        let idx = (roll * Self::ALL.len() as f64).floor() as usize;
        Self::ALL[idx.min(Self::ALL.len() - 1)]
    }
}

impl fmt::Display for CharacterTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
