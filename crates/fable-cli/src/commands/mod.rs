pub mod achievement;
pub mod new;
pub mod parse;
pub mod status;
pub mod turn;

use std::io::{self, Read};
use std::path::Path;

use fable_engine::{JsonDirStore, Session, SessionConfig};
use tracing::debug;

/// Load the session saved in `dir`, or a fresh one if nothing is saved yet.
fn open_session(dir: &Path, config: SessionConfig) -> Result<Session<JsonDirStore>, String> {
    debug!(dir = %dir.display(), seed = ?config.seed, "opening session");
    Session::load(JsonDirStore::new(dir), config)
        .map_err(|e| format!("failed to load session from {}: {e}", dir.display()))
}

/// Read narrator text from a file, or stdin for `-` or no file.
fn read_input(file: Option<&Path>) -> Result<String, String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| format!("cannot read stdin: {e}"))?;
            Ok(text)
        }
    }
}
