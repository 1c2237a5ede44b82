//! Error types for the engine.

use fable_core::{ClockError, EntityKind, StoryBeat};
use thiserror::Error;

/// Result type for applying a single command.
pub type StateResult<T> = Result<T, StateError>;

/// Result type for session-level operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// A command that could not be applied.
///
/// The state is left untouched and the turn continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Characters are frozen once the story reaches its closing beats.
    #[error("characters cannot change during {beat} ('{name}' rejected)")]
    CharactersLocked {
        /// Beat in effect.
        beat: StoryBeat,
        /// Character that was rejected.
        name: String,
    },

    /// No new events may start during the epilogue.
    #[error("no new events during the epilogue ('{name}' rejected)")]
    EventsClosed {
        /// Event that was rejected.
        name: String,
    },

    /// A named record does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Collection searched.
        kind: EntityKind,
        /// Missing name.
        name: String,
    },

    /// An achievement is not defined.
    #[error("achievement '{0}' not found")]
    AchievementNotFound(String),

    /// A time-set command tried to move the clock backwards.
    #[error("time {requested} is earlier than the current time {current}")]
    TimeWentBackwards {
        /// Clock before the command.
        current: String,
        /// Rejected value.
        requested: String,
    },
}

/// A document could not be read or written.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem failure.
    #[error("I/O error on document '{key}': {source}")]
    Io {
        /// Document key.
        key: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The document did not have the expected shape.
    #[error("malformed document '{key}': {source}")]
    Json {
        /// Document key.
        key: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// A turn-level failure.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Saving or loading failed.
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// The clock could not be advanced.
    #[error(transparent)]
    Clock(#[from] ClockError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let e = StateError::NotFound {
            kind: EntityKind::Location,
            name: "森林".into(),
        };
        assert_eq!(e.to_string(), "location '森林' not found");
        let e = StateError::CharactersLocked {
            beat: StoryBeat::FinalAct,
            name: "艾米".into(),
        };
        assert_eq!(e.to_string(), "characters cannot change during 终幕 ('艾米' rejected)");
    }

    #[test]
    fn clock_errors_end_the_turn() {
        let e = SessionError::from(ClockError::InvalidTimestamp("x".into()));
        assert!(matches!(e, SessionError::Clock(_)));
    }
}
