//! Split narrator output into prose and an ordered list of commands.
//!
//! Two dialects are accepted. A data block fenced by `===GAME_DATA_START===`
//! and `===GAME_DATA_END===` holds either a JSON array of `{action, path,
//! value}` records or directive lines. Without a block, directive lines are
//! picked out of the text and everything else is prose.
//!
//! Parsing never fails. Anything that cannot be read is logged and skipped.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::command::{Command, CommandKind};
use crate::rules::{self, PayloadShape};

/// Opening fence of a data block, matched case-insensitively.
pub const BLOCK_START: &str = "===GAME_DATA_START===";
/// Closing fence of a data block, matched case-insensitively.
pub const BLOCK_END: &str = "===GAME_DATA_END===";

/// Prose and commands extracted from one narrator turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedTurn {
    /// Narrative text for the player.
    pub prose: String,
    /// Commands in the order they appeared.
    pub commands: Vec<Command>,
}

/// Parse one narrator turn.
pub fn parse(raw: &str) -> ParsedTurn {
    match find_block(raw) {
        Some(block) => parse_block(raw, block),
        None => scan_lines(raw, true),
    }
}

/// Byte offsets of a data block within the raw text.
#[derive(Debug, Clone, Copy)]
struct BlockSpan {
    start: usize,
    body_start: usize,
    body_end: usize,
    after: usize,
}

fn find_block(raw: &str) -> Option<BlockSpan> {
    // ASCII lowercasing keeps every byte offset valid for `raw`.
    let lowered = raw.to_ascii_lowercase();
    let start = lowered.find(&BLOCK_START.to_ascii_lowercase())?;
    let body_start = start + BLOCK_START.len();
    let span = match lowered[body_start..].find(&BLOCK_END.to_ascii_lowercase()) {
        Some(rel) => BlockSpan {
            start,
            body_start,
            body_end: body_start + rel,
            after: body_start + rel + BLOCK_END.len(),
        },
        // Unterminated blocks still yield their commands; the body runs to end of text.
        None => {
            debug!("data block has no end marker; reading to end of text");
            BlockSpan {
                start,
                body_start,
                body_end: raw.len(),
                after: raw.len(),
            }
        }
    };
    Some(span)
}

fn parse_block(raw: &str, span: BlockSpan) -> ParsedTurn {
    let before = raw[..span.start].trim();
    let after = raw[span.after..].trim();
    let prose = match (before.is_empty(), after.is_empty()) {
        (false, false) => format!("{before}\n\n{after}"),
        (false, true) => before.to_string(),
        (true, false) => after.to_string(),
        (true, true) => String::new(),
    };

    let body = raw[span.body_start..span.body_end].trim();
    let commands = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(records)) => records.into_iter().filter_map(block_record).collect(),
        Ok(record @ Value::Object(_)) => block_record(record).into_iter().collect(),
        _ => scan_lines(body, false).commands,
    };

    ParsedTurn { prose, commands }
}

fn block_record(record: Value) -> Option<Command> {
    let mut map = match record {
        Value::Object(map) => map,
        other => {
            warn!(record = %other, "skipping data block record that is not an object");
            return None;
        }
    };
    let action = map
        .get("action")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let path = map.get("path").and_then(Value::as_str).map(str::to_string);
    let kind = rules::block_kind(&action, path.as_deref());
    let payload = map.remove("value").unwrap_or(Value::Null);
    Some(Command::new(kind, payload))
}

/// Tracks `{`/`}` nesting outside JSON string literals.
#[derive(Debug, Default)]
struct BraceDepth {
    depth: i64,
    in_string: bool,
    escaped: bool,
}

impl BraceDepth {
    fn feed(&mut self, text: &str) {
        for c in text.chars() {
            if self.in_string {
                match c {
                    _ if self.escaped => self.escaped = false,
                    '\\' => self.escaped = true,
                    '"' => self.in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => self.in_string = true,
                '{' => self.depth += 1,
                '}' => self.depth -= 1,
                _ => {}
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.depth <= 0
    }
}

/// A JSON directive still collecting lines.
struct Pending {
    kind: CommandKind,
    buffer: String,
    braces: BraceDepth,
}

impl Pending {
    fn open(kind: CommandKind, first: &str) -> Self {
        let mut braces = BraceDepth::default();
        braces.feed(first);
        Self {
            kind,
            buffer: first.to_string(),
            braces,
        }
    }

    fn push_line(&mut self, line: &str) {
        self.buffer.push('\n');
        self.buffer.push_str(line);
        self.braces.feed(line);
    }

    fn finish(self) -> Option<Command> {
        let mut values = serde_json::Deserializer::from_str(&self.buffer).into_iter::<Value>();
        match values.next() {
            Some(Ok(value @ Value::Object(_))) => Some(Command::new(self.kind, value)),
            Some(Ok(_)) => {
                warn!(kind = %self.kind, "directive payload is not a JSON object; dropped");
                None
            }
            Some(Err(e)) => {
                warn!(kind = %self.kind, error = %e, "malformed JSON in directive; dropped");
                None
            }
            None => None,
        }
    }
}

/// Scan text line by line. With `keep_prose`, non-directive lines are kept
/// verbatim; otherwise they are dropped.
fn scan_lines(text: &str, keep_prose: bool) -> ParsedTurn {
    let mut out = ParsedTurn::default();
    let mut pending: Option<Pending> = None;

    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);

        if let Some(p) = pending.as_mut() {
            p.push_line(content);
            if p.braces.is_closed() {
                out.commands.extend(pending.take().and_then(Pending::finish));
            }
            continue;
        }

        let Some((rule, text)) = rules::match_line(content) else {
            if keep_prose {
                out.prose.push_str(line);
            } else if !content.trim().is_empty() {
                debug!(line = content, "dropping non-directive line inside data block");
            }
            continue;
        };

        let wants_json = match rule.shape {
            PayloadShape::Scalar => false,
            PayloadShape::ScalarOrJson => text.starts_with('{'),
            PayloadShape::Json => {
                if !text.starts_with('{') {
                    warn!(kind = %rule.kind, text, "directive expects a JSON object; dropped");
                    continue;
                }
                true
            }
        };

        if wants_json {
            let p = Pending::open(rule.kind.clone(), text);
            if p.braces.is_closed() {
                out.commands.extend(p.finish());
            } else {
                pending = Some(p);
            }
        } else {
            out.commands.push(Command::scalar(rule.kind.clone(), text));
        }
    }

    if let Some(p) = pending {
        warn!(kind = %p.kind, "unterminated JSON directive at end of text; dropped");
    }
    out
}
