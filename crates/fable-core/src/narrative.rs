//! Narrative pacing state: current beat, depth of detail, and word cadence.

use serde::{Deserialize, Serialize};

use crate::beat::StoryBeat;

/// Lowest depth-of-detail level.
pub const MIN_DEPTH: u8 = 1;
/// Highest depth-of-detail level.
pub const MAX_DEPTH: u8 = 5;
/// Depth used when a requested level is out of range.
pub const FALLBACK_DEPTH: u8 = 3;

/// Word counts per cycle beat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatWordCounts {
    /// Words written during 起.
    #[serde(rename = "起")]
    pub opening: u64,
    /// Words written during 承.
    #[serde(rename = "承")]
    pub development: u64,
    /// Words written during 转.
    #[serde(rename = "转")]
    pub turn: u64,
    /// Words written during 合.
    #[serde(rename = "合")]
    pub resolution: u64,
}

impl BeatWordCounts {
    /// Count for a cycle beat. Closing beats have no counter.
    pub fn get(&self, beat: StoryBeat) -> Option<u64> {
        match beat {
            StoryBeat::Opening => Some(self.opening),
            StoryBeat::Development => Some(self.development),
            StoryBeat::Turn => Some(self.turn),
            StoryBeat::Resolution => Some(self.resolution),
            StoryBeat::FinalAct | StoryBeat::Epilogue => None,
        }
    }

    /// Mutable counter for a cycle beat.
    pub fn get_mut(&mut self, beat: StoryBeat) -> Option<&mut u64> {
        match beat {
            StoryBeat::Opening => Some(&mut self.opening),
            StoryBeat::Development => Some(&mut self.development),
            StoryBeat::Turn => Some(&mut self.turn),
            StoryBeat::Resolution => Some(&mut self.resolution),
            StoryBeat::FinalAct | StoryBeat::Epilogue => None,
        }
    }
}

/// Word counts for the running cycle and the one before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatStats {
    /// Counts for the cycle in progress.
    pub current: BeatWordCounts,
    /// Counts for the previous cycle.
    pub previous: BeatWordCounts,
}

/// Pacing state carried in the game document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NarrativeState {
    /// Current beat.
    pub story_beat: StoryBeat,
    /// Depth of detail, always within `[1, 5]`.
    pub depth_level: u8,
    /// Per-beat word counts.
    pub beat_word_counts: BeatStats,
    /// One-based cycle number.
    pub current_cycle: u32,
    /// Words written over the whole story.
    pub total_words: u64,
    /// Words written in the current cycle.
    pub current_cycle_words: u64,
    /// Set when a great-work achievement was completed since the last load.
    pub greatness_achieved_this_session: bool,
}

impl Default for NarrativeState {
    fn default() -> Self {
        Self {
            story_beat: StoryBeat::Opening,
            depth_level: MIN_DEPTH,
            beat_word_counts: BeatStats::default(),
            current_cycle: 1,
            total_words: 0,
            current_cycle_words: 0,
            greatness_achieved_this_session: false,
        }
    }
}

impl NarrativeState {
    /// Roll over to a fresh cycle: archive current counts and bump the cycle number.
    pub fn start_new_cycle(&mut self) {
        self.beat_word_counts.previous = self.beat_word_counts.current;
        self.beat_word_counts.current = BeatWordCounts::default();
        self.current_cycle_words = 0;
        self.current_cycle += 1;
    }

    /// Words recorded for the current beat, if it has a counter.
    pub fn current_beat_words(&self) -> Option<u64> {
        self.beat_word_counts.current.get(self.story_beat)
    }
}

/// Clamp an arbitrary integer into the depth range.
pub fn clamp_depth(value: i64) -> u8 {
    value.clamp(i64::from(MIN_DEPTH), i64::from(MAX_DEPTH)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_cycle_archives_counts() {
        let mut state = NarrativeState::default();
        state.beat_word_counts.current.opening = 10;
        state.beat_word_counts.current.resolution = 40;
        state.current_cycle_words = 50;
        state.total_words = 70;

        state.start_new_cycle();

        assert_eq!(state.current_cycle, 2);
        assert_eq!(state.beat_word_counts.previous.opening, 10);
        assert_eq!(state.beat_word_counts.previous.resolution, 40);
        assert_eq!(state.beat_word_counts.current, BeatWordCounts::default());
        assert_eq!(state.current_cycle_words, 0);
        assert_eq!(state.total_words, 70);
    }

    #[test]
    fn closing_beats_have_no_counter() {
        let mut counts = BeatWordCounts::default();
        assert!(counts.get_mut(StoryBeat::FinalAct).is_none());
        *counts.get_mut(StoryBeat::Turn).unwrap() += 5;
        assert_eq!(counts.get(StoryBeat::Turn), Some(5));
    }

    #[test]
    fn serializes_with_document_field_names() {
        let json = serde_json::to_value(NarrativeState::default()).unwrap();
        assert_eq!(json["storyBeat"], "起");
        assert_eq!(json["depthLevel"], 1);
        assert_eq!(json["currentCycle"], 1);
        assert_eq!(json["beatWordCounts"]["current"]["承"], 0);
        assert_eq!(json["greatnessAchievedThisSession"], false);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let state: NarrativeState = serde_json::from_str(r#"{"storyBeat":"转"}"#).unwrap();
        assert_eq!(state.story_beat, StoryBeat::Turn);
        assert_eq!(state.depth_level, 1);
        assert_eq!(state.current_cycle, 1);
    }

    #[test]
    fn clamp_depth_bounds() {
        assert_eq!(clamp_depth(-7), 1);
        assert_eq!(clamp_depth(0), 1);
        assert_eq!(clamp_depth(4), 4);
        assert_eq!(clamp_depth(99), 5);
    }
}
