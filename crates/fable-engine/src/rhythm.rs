//! Narrative rhythm: the story-beat state machine, word-count cadence, and
//! depth-of-detail smoothing.
//!
//! Beats run 起 → 承 → 转 → 合 and wrap to a new cycle, unless a great work
//! was achieved, in which case 合 leads to the epilogue. The final act is
//! forced once the clock reaches 1929 or the story passes 300,000 words.

use std::collections::VecDeque;

use fable_core::narrative::{FALLBACK_DEPTH, MAX_DEPTH, MIN_DEPTH, clamp_depth};
use fable_core::{BeatOperation, GameTime, NarrativeState, StoryBeat};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::random::RandomSource;

/// Number of past depths kept for smoothing.
pub const DEPTH_HISTORY_LEN: usize = 5;

/// Clock year from which the story is forced into its final act.
pub const FINAL_ACT_YEAR: i32 = 1929;

/// Total word count from which the story is forced into its final act.
pub const FINAL_ACT_WORDS: u64 = 300_000;

/// Auto-advance thresholds for the first cycle, indexed like [`StoryBeat::CYCLE`].
const FIRST_CYCLE_THRESHOLDS: [u64; 4] = [2000, 4000, 3000, 1000];

/// Auto-advance thresholds for every later cycle.
const LATER_CYCLE_THRESHOLDS: [u64; 4] = [6000, 12000, 9000, 3000];

/// Words needed in `beat` before it auto-advances. `None` for closing beats.
pub fn threshold(cycle: u32, beat: StoryBeat) -> Option<u64> {
    let idx = StoryBeat::CYCLE.iter().position(|b| *b == beat)?;
    let table = if cycle <= 1 {
        FIRST_CYCLE_THRESHOLDS
    } else {
        LATER_CYCLE_THRESHOLDS
    };
    Some(table[idx])
}

/// What a beat operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatTransition {
    /// Beat before the operation.
    pub from: StoryBeat,
    /// Beat after the operation.
    pub to: StoryBeat,
    /// A new cycle was started (合 → 起).
    pub new_cycle: bool,
    /// The final-act rule overrode the candidate beat.
    pub forced_final_act: bool,
}

impl BeatTransition {
    /// Whether the beat changed.
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Apply a beat operation.
///
/// The epilogue is terminal, the final act only yields to a conclude, and
/// entering the epilogue replaces the clock with its sentinel.
pub fn transition(
    state: &mut NarrativeState,
    clock: &mut GameTime,
    op: BeatOperation,
) -> BeatTransition {
    let from = state.story_beat;
    let mut result = BeatTransition {
        from,
        to: from,
        new_cycle: false,
        forced_final_act: false,
    };

    if from == StoryBeat::Epilogue {
        debug!(%op, "epilogue is terminal; beat operation ignored");
        return result;
    }
    if op == BeatOperation::Conclude {
        enter_epilogue(state, clock);
        result.to = StoryBeat::Epilogue;
        info!(%from, "story concluded");
        return result;
    }
    if from == StoryBeat::FinalAct {
        debug!(%op, "final act only accepts a conclude; beat operation ignored");
        return result;
    }

    let mut candidate = match op {
        BeatOperation::Maintain | BeatOperation::Conclude => from,
        BeatOperation::JumpTo(beat) if beat.in_cycle() => beat,
        BeatOperation::JumpTo(_) => from,
        BeatOperation::Advance => match from {
            StoryBeat::Opening => StoryBeat::Development,
            StoryBeat::Development => StoryBeat::Turn,
            StoryBeat::Turn => StoryBeat::Resolution,
            _ if state.greatness_achieved_this_session => StoryBeat::Epilogue,
            _ => {
                state.start_new_cycle();
                result.new_cycle = true;
                info!(cycle = state.current_cycle, "new beat cycle");
                StoryBeat::Opening
            }
        },
    };

    if candidate == StoryBeat::Epilogue {
        enter_epilogue(state, clock);
        info!("great work achieved; cycle closes into the epilogue");
    } else if final_act_due(state, clock) {
        info!(
            year = clock.year(),
            total_words = state.total_words,
            "final act reached"
        );
        candidate = StoryBeat::FinalAct;
        result.forced_final_act = true;
    }

    state.story_beat = candidate;
    result.to = candidate;
    if result.changed() {
        info!(%from, to = %candidate, %op, "story beat changed");
    }
    result
}

fn enter_epilogue(state: &mut NarrativeState, clock: &mut GameTime) {
    state.story_beat = StoryBeat::Epilogue;
    *clock = GameTime::Epilogue;
}

fn final_act_due(state: &NarrativeState, clock: &GameTime) -> bool {
    clock.year().is_some_and(|y| y >= FINAL_ACT_YEAR) || state.total_words >= FINAL_ACT_WORDS
}

/// Record words written in the current beat, then auto-advance at most once.
///
/// Returns the forced transition, if one happened.
pub fn record_words(
    state: &mut NarrativeState,
    clock: &mut GameTime,
    words: u64,
) -> Option<BeatTransition> {
    let beat = state.story_beat;
    if let Some(count) = state.beat_word_counts.current.get_mut(beat) {
        *count += words;
    }
    state.current_cycle_words += words;
    state.total_words += words;

    let limit = threshold(state.current_cycle, beat)?;
    let written = state.current_beat_words()?;
    if written < limit {
        return None;
    }
    info!(%beat, written, limit, "beat word threshold reached; advancing");
    Some(transition(state, clock, BeatOperation::Advance))
}

/// Depth-of-detail smoothing with a short memory of past outputs.
///
/// Serializes as the rhythm document `{depthHistory: [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NarrativeRhythm {
    depth_history: VecDeque<u8>,
}

impl NarrativeRhythm {
    /// Start with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recent depths, oldest first.
    pub fn depth_history(&self) -> impl Iterator<Item = u8> + '_ {
        self.depth_history.iter().copied()
    }

    /// Forget all past depths.
    pub fn clear(&mut self) {
        self.depth_history.clear();
    }

    /// Turn a requested depth into the depth actually used, and remember it.
    ///
    /// Requests outside `[1, 5]` become 3. Repeats are broken up, a request
    /// for 1 occasionally jumps to 4 or 5, a 1 → 4/5 swing is pulled back to
    /// 3, and one call in ten drifts next to the previous depth instead.
    pub fn set_depth(&mut self, requested: i64, rng: &mut dyn RandomSource) -> u8 {
        let input = if (i64::from(MIN_DEPTH)..=i64::from(MAX_DEPTH)).contains(&requested) {
            requested as u8
        } else {
            debug!(requested, "depth out of range; using {FALLBACK_DEPTH}");
            FALLBACK_DEPTH
        };
        let len = self.depth_history.len();
        let last = self.depth_history.back().copied();
        let second_last = len
            .checked_sub(2)
            .and_then(|i| self.depth_history.get(i).copied());

        let mut depth = input;

        if last == Some(input) && second_last == Some(input) {
            depth = adjacent(input, rng);
            debug!(input, depth, "depth repeated three times; nudged to a neighbour");
        }

        if input == MIN_DEPTH {
            let roll = rng.roll();
            if roll < 0.05 {
                depth = 4;
                debug!(depth, "shallow depth jumped");
            } else if roll < 0.10 {
                depth = 5;
                debug!(depth, "shallow depth jumped");
            }
        }

        if second_last == Some(MIN_DEPTH) && matches!(last, Some(4 | 5)) {
            depth = FALLBACK_DEPTH;
            debug!("depth swing from 1 pulled back to {FALLBACK_DEPTH}");
        }

        if let Some(prev) = last.filter(|_| rng.roll() < 0.1) {
            depth = adjacent(prev, rng);
            debug!(prev, depth, "depth drifted next to the previous turn");
        }

        let depth = clamp_depth(i64::from(depth));
        self.remember(depth);
        depth
    }

    /// Keep `depth` as-is without smoothing, and remember it.
    pub fn hold_depth(&mut self, depth: u8) -> u8 {
        let depth = clamp_depth(i64::from(depth));
        self.remember(depth);
        depth
    }

    fn remember(&mut self, depth: u8) {
        self.depth_history.push_back(depth);
        while self.depth_history.len() > DEPTH_HISTORY_LEN {
            self.depth_history.pop_front();
        }
    }
}

/// A depth next to `depth`: 1 → 2, 5 → 4, otherwise one step either way.
fn adjacent(depth: u8, rng: &mut dyn RandomSource) -> u8 {
    match depth {
        d if d <= MIN_DEPTH => MIN_DEPTH + 1,
        d if d >= MAX_DEPTH => MAX_DEPTH - 1,
        d if rng.roll() > 0.5 => d + 1,
        d => d - 1,
    }
}
