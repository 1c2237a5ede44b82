//! Schema checks for raw commands, and the per-turn mandatory-command rule.
//!
//! Each command is checked on its own; a failure drops only that command.
//! Every turn must also carry a beat operation and a depth level. A missing
//! one is reported without an index and does not block the rest.

use std::fmt;

use fable_core::clock::parse_timestamp;
use fable_core::{
    AssetPatch, BeatOperation, CharacterPatch, EntityKind, EventPatch, EventStatus,
    ForeshadowingPatch,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::command::{Command, CommandKind, EntityPatch, ValidCommand};

/// A command that failed validation, or a missing mandatory command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Position of the offending command; `None` for turn-level errors.
    pub index: Option<usize>,
    /// A human-readable description of the problem.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "command {i}: {}", self.message),
            None => write!(f, "turn: {}", self.message),
        }
    }
}

/// Outcome of validating one turn's commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    /// Accepted commands, in input order.
    pub valid: Vec<ValidCommand>,
    /// Rejected commands and turn-level problems.
    pub errors: Vec<ValidationError>,
    /// No valid beat operation was present.
    pub missing_beat: bool,
    /// No valid depth level was present.
    pub missing_depth: bool,
}

/// Message reported when a turn has no valid beat operation.
pub const MISSING_BEAT: &str = "missing beat operation (节拍操作)";
/// Message reported when a turn has no valid depth level.
pub const MISSING_DEPTH: &str = "missing depth level (当前景深等级)";

/// Validate one turn's commands.
pub fn validate(commands: &[Command]) -> Validation {
    let mut out = Validation::default();

    for (index, command) in commands.iter().enumerate() {
        match validate_command(command) {
            Ok(valid) => out.valid.push(valid),
            Err(message) => out.errors.push(ValidationError {
                index: Some(index),
                message,
            }),
        }
    }

    out.missing_beat = !out.valid.iter().any(|c| matches!(c, ValidCommand::Beat(_)));
    out.missing_depth = !out.valid.iter().any(|c| matches!(c, ValidCommand::Depth(_)));
    if out.missing_beat {
        out.errors.push(ValidationError {
            index: None,
            message: MISSING_BEAT.to_string(),
        });
    }
    if out.missing_depth {
        out.errors.push(ValidationError {
            index: None,
            message: MISSING_DEPTH.to_string(),
        });
    }
    out
}

/// Check a single command against the schema for its kind.
pub fn validate_command(command: &Command) -> Result<ValidCommand, String> {
    let payload = &command.payload;
    match &command.kind {
        CommandKind::BeatOperation => {
            let text = as_text(payload).ok_or("beat operation must be a string")?;
            BeatOperation::parse_narrated(text)
                .map(ValidCommand::Beat)
                .ok_or_else(|| format!("unknown beat operation '{text}' (expected 推进, 维持 or 完结)"))
        }
        CommandKind::DepthLevel => parse_depth(payload)
            .map(ValidCommand::Depth)
            .ok_or_else(|| format!("depth level {payload} is not an integer")),
        CommandKind::SetTime => {
            let text = as_text(payload).ok_or("time must be a string")?;
            parse_timestamp(text)
                .map(ValidCommand::SetTime)
                .map_err(|_| format!("time '{text}' is not YYYY-MM-DD HH:mm:ss"))
        }
        CommandKind::Register(kind) => entity_patch(*kind, payload).map(ValidCommand::Register),
        CommandKind::Update(kind) => entity_patch(*kind, payload).map(ValidCommand::Update),
        CommandKind::Delete(kind) => target_name(payload)
            .map(|name| ValidCommand::Delete { kind: *kind, name })
            .ok_or_else(|| format!("delete {kind} needs a non-empty name")),
        CommandKind::CompleteAchievement => non_empty(payload)
            .map(ValidCommand::CompleteAchievement)
            .ok_or_else(|| "achievement name must be a non-empty string".to_string()),
        CommandKind::ShowAchievement => non_empty(payload)
            .map(ValidCommand::ShowAchievement)
            .ok_or_else(|| "achievement name must be a non-empty string".to_string()),
        CommandKind::AppendHistory => append_history(payload),
        CommandKind::Unknown(action) => Err(format!("unknown action '{action}'")),
    }
}

fn as_text(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim)
}

fn non_empty(value: &Value) -> Option<String> {
    as_text(value)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A delete target: a name string, or an object carrying `name`.
fn target_name(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => map.get("name").and_then(non_empty),
        other => non_empty(other),
    }
}

/// Leading integer of a string (`"3级"` is 3), or an integral JSON number.
fn parse_depth(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => leading_int(s.trim()),
        _ => None,
    }
}

fn leading_int(s: &str) -> Option<i64> {
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse::<i64>().ok().map(|n| sign * n)
}

fn append_history(payload: &Value) -> Result<ValidCommand, String> {
    let (name, thing_done) = match payload {
        Value::Object(map) => (
            map.get("name").and_then(non_empty),
            map.get("thingDone").and_then(non_empty),
        ),
        Value::String(s) => match s.split_once(['，', ',']) {
            Some((name, thing)) => (
                Some(name.trim().to_string()).filter(|n| !n.is_empty()),
                Some(thing.trim().to_string()).filter(|t| !t.is_empty()),
            ),
            None => return Err(format!("'{s}' is not in the form 名字，事情")),
        },
        _ => return Err("character history needs a name and a thing done".to_string()),
    };
    match (name, thing_done) {
        (Some(name), Some(thing_done)) => Ok(ValidCommand::AppendHistory { name, thing_done }),
        (None, _) => Err("character history needs a non-empty name".to_string()),
        (_, None) => Err("character history needs a non-empty thing done".to_string()),
    }
}

fn entity_patch(kind: EntityKind, payload: &Value) -> Result<EntityPatch, String> {
    let Value::Object(map) = payload else {
        return Err(format!("{kind} data must be a JSON object"));
    };
    let mut map = map.clone();

    require_text(&map, "name")?;
    require_text(&map, "description")?;

    match kind {
        EntityKind::Event => {
            require_time(&map, "startTime")?;
            require_time(&map, "expectedEndTime")?;
            check_importance(&mut map)?;
            if let Some(status) = map.get("status").filter(|v| !v.is_null()) {
                let ok = status.as_str().and_then(EventStatus::parse).is_some();
                if !ok {
                    return Err(format!("event status {status} must be foreground or background"));
                }
            }
            if map
                .get("participants")
                .is_some_and(|p| !p.is_null() && !p.is_array())
            {
                return Err("event participants must be an array".to_string());
            }
            decode::<EventPatch>(kind, map).map(EntityPatch::Event)
        }
        EntityKind::Foreshadowing => {
            require_time(&map, "occurrenceTime")?;
            check_importance(&mut map)?;
            decode::<ForeshadowingPatch>(kind, map).map(EntityPatch::Foreshadowing)
        }
        EntityKind::Character => {
            // Any template is accepted here; the store replaces unknown symbols.
            if let Some(t) = map
                .get_mut("template")
                .filter(|t| !t.is_string() && !t.is_null())
            {
                *t = Value::String(t.to_string());
            }
            decode::<CharacterPatch>(kind, map).map(EntityPatch::Character)
        }
        EntityKind::Item | EntityKind::Property | EntityKind::Knowledge | EntityKind::Location => {
            decode::<AssetPatch>(kind, map).map(|p| EntityPatch::Asset(kind, p))
        }
    }
}

fn require_text<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a str, String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| format!("'{key}' must be a non-empty string"))
}

fn require_time(map: &Map<String, Value>, key: &str) -> Result<(), String> {
    let text = map
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("'{key}' is required"))?;
    parse_timestamp(text)
        .map(|_| ())
        .map_err(|_| format!("'{key}' value '{text}' is not YYYY-MM-DD HH:mm:ss"))
}

/// Check `importance` is an integer in `[1, 5]`, turning numeric strings into numbers.
fn check_importance(map: &mut Map<String, Value>) -> Result<(), String> {
    let Some(value) = map.get_mut("importance") else {
        return Ok(());
    };
    let number = match &*value {
        Value::Null => return Ok(()),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.fract() == 0.0 && (1.0..=5.0).contains(&n) => {
            *value = Value::from(n as u8);
            Ok(())
        }
        _ => Err(format!("importance {value} must be an integer from 1 to 5")),
    }
}

fn decode<T: DeserializeOwned>(kind: EntityKind, map: Map<String, Value>) -> Result<T, String> {
    serde_json::from_value(Value::Object(map)).map_err(|e| format!("invalid {kind} data: {e}"))
}
