//! Document storage: a key/value store of JSON documents.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::PersistError;

/// Key of the game document.
pub const GAME_KEY: &str = "game";
/// Key of the achievements document.
pub const ACHIEVEMENTS_KEY: &str = "achievements";
/// Key of the rhythm document (depth history).
pub const RHYTHM_KEY: &str = "rhythm";

/// Where documents are kept between turns.
pub trait DocumentStore {
    /// Read a document. `Ok(None)` if it was never written.
    fn read(&self, key: &str) -> Result<Option<Value>, PersistError>;

    /// Write a document, replacing any previous version.
    fn write(&mut self, key: &str, doc: &Value) -> Result<(), PersistError>;
}

/// An in-process store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: HashMap<String, Value>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether no documents are stored.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Value>, PersistError> {
        Ok(self.docs.get(key).cloned())
    }

    fn write(&mut self, key: &str, doc: &Value) -> Result<(), PersistError> {
        self.docs.insert(key.to_string(), doc.clone());
        Ok(())
    }
}

/// One pretty-printed `<key>.json` file per document in a directory.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Use `dir`, creating it on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The backing directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a document's file.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl DocumentStore for JsonDirStore {
    fn read(&self, key: &str) -> Result<Option<Value>, PersistError> {
        let path = self.path_for(key);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistError::Io {
                    key: key.to_string(),
                    source,
                });
            }
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| PersistError::Json {
                key: key.to_string(),
                source,
            })
    }

    fn write(&mut self, key: &str, doc: &Value) -> Result<(), PersistError> {
        let io_err = |source| PersistError::Io {
            key: key.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let text = serde_json::to_string_pretty(doc).map_err(|source| PersistError::Json {
            key: key.to_string(),
            source,
        })?;
        fs::write(self.path_for(key), text).map_err(io_err)
    }
}
