//! The Fable turn engine.
//!
//! A [`Session`] takes one turn of narrator output at a time, applies the
//! commands it carries to the [`WorldState`], keeps the story's pacing in
//! step, and saves through a [`DocumentStore`].
//!
//! ```
//! use fable_engine::{MemoryStore, Session, SessionConfig};
//!
//! let mut session = Session::new(MemoryStore::new(), SessionConfig::default().with_seed(1));
//! let report = session.process_turn("门开了。\n节拍操作：推进\n当前景深等级：3\n");
//! assert!(report.success);
//! assert_eq!(report.prose, "门开了。\n");
//! assert_eq!(session.state().narrative().story_beat.label(), "承");
//! ```

/// Session configuration.
pub mod config;
/// Error types.
pub mod error;
/// Document stores.
pub mod persistence;
/// Injectable randomness.
pub mod random;
/// Beat transitions and depth smoothing.
pub mod rhythm;
/// Turn processing.
pub mod session;
/// Game state and command application.
pub mod state;

/// Re-export configuration.
pub use config::SessionConfig;
/// Re-export error types.
pub use error::{PersistError, SessionError, SessionResult, StateError, StateResult};
/// Re-export stores.
pub use persistence::{DocumentStore, JsonDirStore, MemoryStore};
/// Re-export randomness helpers.
pub use random::{RandomSource, ScriptedRolls};
/// Re-export pacing types.
pub use rhythm::{BeatTransition, NarrativeRhythm};
/// Re-export the session.
pub use session::{Session, TurnReport, count_words};
/// Re-export the world state.
pub use state::{Applied, WorldState};
