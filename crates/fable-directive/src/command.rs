//! Raw commands as extracted from narrator text, and their validated form.

use std::fmt;

use chrono::NaiveDateTime;
use fable_core::{
    AssetPatch, BeatOperation, CharacterPatch, EntityKind, EventPatch, ForeshadowingPatch,
};
use serde::Serialize;
use serde_json::Value;

/// What a raw command asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Move the beat state machine.
    BeatOperation,
    /// Request a depth-of-detail level.
    DepthLevel,
    /// Set the in-fiction clock.
    SetTime,
    /// Create or merge an entity record.
    Register(EntityKind),
    /// Merge into an entity record, creating it if absent.
    Update(EntityKind),
    /// Remove an entity record by name.
    Delete(EntityKind),
    /// Complete an achievement by name.
    CompleteAchievement,
    /// Reveal a hidden achievement by name.
    ShowAchievement,
    /// Append to a character's history of deeds.
    AppendHistory,
    /// A block record whose action is not recognised.
    Unknown(String),
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeatOperation => f.write_str("beat operation"),
            Self::DepthLevel => f.write_str("depth level"),
            Self::SetTime => f.write_str("set time"),
            Self::Register(kind) => write!(f, "register {kind}"),
            Self::Update(kind) => write!(f, "update {kind}"),
            Self::Delete(kind) => write!(f, "delete {kind}"),
            Self::CompleteAchievement => f.write_str("complete achievement"),
            Self::ShowAchievement => f.write_str("show achievement"),
            Self::AppendHistory => f.write_str("append character history"),
            Self::Unknown(action) => write!(f, "unknown action '{action}'"),
        }
    }
}

/// A command extracted from narrator text, not yet checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    /// What the command does.
    pub kind: CommandKind,
    /// Scalar string or JSON object, as written.
    pub payload: Value,
}

impl Command {
    /// Create a command.
    pub fn new(kind: CommandKind, payload: Value) -> Self {
        Self { kind, payload }
    }

    /// Create a command with a string payload.
    pub fn scalar(kind: CommandKind, text: impl Into<String>) -> Self {
        Self::new(kind, Value::String(text.into()))
    }
}

/// A typed entity patch.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityPatch {
    /// Event data.
    Event(EventPatch),
    /// Foreshadowing data.
    Foreshadowing(ForeshadowingPatch),
    /// Character data; the template is still unresolved.
    Character(CharacterPatch),
    /// Item, property, knowledge or location data.
    Asset(EntityKind, AssetPatch),
}

impl EntityPatch {
    /// Collection the patch targets.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Event(_) => EntityKind::Event,
            Self::Foreshadowing(_) => EntityKind::Foreshadowing,
            Self::Character(_) => EntityKind::Character,
            Self::Asset(kind, _) => *kind,
        }
    }

    /// Name of the target record.
    pub fn name(&self) -> &str {
        match self {
            Self::Event(p) => &p.name,
            Self::Foreshadowing(p) => &p.name,
            Self::Character(p) => &p.name,
            Self::Asset(_, p) => &p.name,
        }
    }
}

/// A command that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidCommand {
    /// Beat state machine operation.
    Beat(BeatOperation),
    /// Requested depth; may be out of range, smoothing maps it.
    Depth(i64),
    /// Explicit clock value.
    SetTime(NaiveDateTime),
    /// Register an entity.
    Register(EntityPatch),
    /// Update an entity.
    Update(EntityPatch),
    /// Delete an entity.
    Delete {
        /// Collection.
        kind: EntityKind,
        /// Record name.
        name: String,
    },
    /// Complete an achievement.
    CompleteAchievement(String),
    /// Reveal an achievement.
    ShowAchievement(String),
    /// Append a deed to a character.
    AppendHistory {
        /// Character name.
        name: String,
        /// The deed.
        thing_done: String,
    },
}

impl ValidCommand {
    /// Short label for logs and reports.
    pub fn label(&self) -> String {
        match self {
            Self::Beat(op) => format!("beat {op}"),
            Self::Depth(d) => format!("depth {d}"),
            Self::SetTime(t) => format!("time {}", t.format(fable_core::TIME_FORMAT)),
            Self::Register(p) => format!("register {} '{}'", p.kind(), p.name()),
            Self::Update(p) => format!("update {} '{}'", p.kind(), p.name()),
            Self::Delete { kind, name } => format!("delete {kind} '{name}'"),
            Self::CompleteAchievement(name) => format!("complete achievement '{name}'"),
            Self::ShowAchievement(name) => format!("show achievement '{name}'"),
            Self::AppendHistory { name, .. } => format!("append history to '{name}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display() {
        assert_eq!(CommandKind::Register(EntityKind::Item).to_string(), "register item");
        assert_eq!(
            CommandKind::Unknown("fly".into()).to_string(),
            "unknown action 'fly'"
        );
    }

    #[test]
    fn command_serializes_for_dry_runs() {
        let cmd = Command::scalar(CommandKind::Delete(EntityKind::Event), "侦探查案");
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["kind"]["delete"], "event");
        assert_eq!(json["payload"], "侦探查案");
    }

    #[test]
    fn valid_command_labels() {
        let cmd = ValidCommand::Delete {
            kind: EntityKind::Location,
            name: "森林".into(),
        };
        assert_eq!(cmd.label(), "delete location '森林'");
        assert_eq!(ValidCommand::Beat(BeatOperation::Advance).label(), "beat 推进");
    }
}
