//! Core types for Fable: the narrative state, the in-fiction clock, named
//! entity records, and the persisted documents.
//!
//! Nothing here performs I/O or draws random numbers. The engine crate owns
//! those concerns and mutates these types through validated commands.

/// Achievement definitions and the completion log.
pub mod achievement;
/// Story beats and beat operations.
pub mod beat;
/// In-fiction clock.
pub mod clock;
/// The persisted game document.
pub mod document;
/// Named entity records and patches.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Pacing state: beat, depth, and word counts.
pub mod narrative;
/// Upsert-by-name over entity collections.
pub mod upsert;

/// Re-export achievement types.
pub use achievement::{Achievement, AchievementBook, Completion, CompletionRecord};
/// Re-export beat types.
pub use beat::{BeatOperation, StoryBeat};
/// Re-export clock types.
pub use clock::{EPILOGUE_SENTINEL, GameTime, TIME_FORMAT};
/// Re-export the game document.
pub use document::{Assets, GameDocument};
/// Re-export entity types.
pub use entity::{
    AssetPatch, AssetRecord, CharacterPatch, CharacterRecord, CharacterTemplate, EntityKind,
    EventPatch, EventRecord, EventStatus, ForeshadowingPatch, ForeshadowingRecord,
};
/// Re-export error types.
pub use error::{ClockError, CoreResult};
/// Re-export narrative state types.
pub use narrative::{BeatStats, BeatWordCounts, NarrativeState};
/// Re-export upsert helpers.
pub use upsert::{Named, ResolvedCharacter, Upsert, Upserted, upsert};
