//! Story beats and the operations that move between them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Phase of the four-beat story cycle, plus the two closing phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StoryBeat {
    /// 起: setup.
    #[default]
    #[serde(rename = "起")]
    Opening,
    /// 承: development.
    #[serde(rename = "承")]
    Development,
    /// 转: twist.
    #[serde(rename = "转")]
    Turn,
    /// 合: resolution of the cycle.
    #[serde(rename = "合")]
    Resolution,
    /// 终幕: final act. Absorbs everything except a conclude.
    #[serde(rename = "终幕")]
    FinalAct,
    /// 后日谈: epilogue. Terminal.
    #[serde(rename = "后日谈")]
    Epilogue,
}

impl StoryBeat {
    /// The four beats that make up one cycle, in order.
    pub const CYCLE: [StoryBeat; 4] = [
        StoryBeat::Opening,
        StoryBeat::Development,
        StoryBeat::Turn,
        StoryBeat::Resolution,
    ];

    /// Display label used in documents and narrator text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Opening => "起",
            Self::Development => "承",
            Self::Turn => "转",
            Self::Resolution => "合",
            Self::FinalAct => "终幕",
            Self::Epilogue => "后日谈",
        }
    }

    /// Parse a beat label.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "起" => Some(Self::Opening),
            "承" => Some(Self::Development),
            "转" => Some(Self::Turn),
            "合" => Some(Self::Resolution),
            "终幕" => Some(Self::FinalAct),
            "后日谈" => Some(Self::Epilogue),
            _ => None,
        }
    }

    /// Whether this is one of the four cycle beats.
    pub fn in_cycle(&self) -> bool {
        Self::CYCLE.contains(self)
    }

    /// Whether this beat only leaves via a conclude (or never).
    pub fn is_closing(&self) -> bool {
        matches!(self, Self::FinalAct | Self::Epilogue)
    }
}

impl fmt::Display for StoryBeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Synonyms accepted for [`BeatOperation::Advance`].
const ADVANCE_WORDS: &[&str] = &["推进", "推进到下一节拍"];

/// Synonyms accepted for [`BeatOperation::Maintain`].
const MAINTAIN_WORDS: &[&str] = &["维持", "维持在当前节拍"];

/// Synonyms accepted for [`BeatOperation::Conclude`].
const CONCLUDE_WORDS: &[&str] = &["完结"];

/// An instruction to the beat state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeatOperation {
    /// 推进: move to the next beat.
    Advance,
    /// 维持: stay on the current beat.
    Maintain,
    /// 完结: end the story.
    Conclude,
    /// Jump straight to a cycle beat. Manual override only.
    JumpTo(StoryBeat),
}

impl BeatOperation {
    /// Parse an operation as a narrator may write it: advance, maintain or conclude.
    pub fn parse_narrated(s: &str) -> Option<Self> {
        let s = s.trim();
        if ADVANCE_WORDS.contains(&s) {
            Some(Self::Advance)
        } else if MAINTAIN_WORDS.contains(&s) {
            Some(Self::Maintain)
        } else if CONCLUDE_WORDS.contains(&s) {
            Some(Self::Conclude)
        } else {
            None
        }
    }

    /// Parse any operation, including a literal cycle beat as a jump target.
    pub fn parse(s: &str) -> Option<Self> {
        Self::parse_narrated(s).or_else(|| {
            StoryBeat::parse(s)
                .filter(StoryBeat::in_cycle)
                .map(Self::JumpTo)
        })
    }

    /// Canonical label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Advance => "推进",
            Self::Maintain => "维持",
            Self::Conclude => "完结",
            Self::JumpTo(beat) => beat.label(),
        }
    }
}

impl fmt::Display for BeatOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrated_operations_and_synonyms() {
        assert_eq!(BeatOperation::parse_narrated("推进"), Some(BeatOperation::Advance));
        assert_eq!(
            BeatOperation::parse_narrated(" 推进到下一节拍 "),
            Some(BeatOperation::Advance)
        );
        assert_eq!(
            BeatOperation::parse_narrated("维持在当前节拍"),
            Some(BeatOperation::Maintain)
        );
        assert_eq!(BeatOperation::parse_narrated("完结"), Some(BeatOperation::Conclude));
        assert_eq!(BeatOperation::parse_narrated("承"), None);
        assert_eq!(BeatOperation::parse_narrated("后退"), None);
    }

    #[test]
    fn jump_only_targets_cycle_beats() {
        assert_eq!(
            BeatOperation::parse("转"),
            Some(BeatOperation::JumpTo(StoryBeat::Turn))
        );
        assert_eq!(BeatOperation::parse("终幕"), None);
        assert_eq!(BeatOperation::parse("后日谈"), None);
    }

    #[test]
    fn beat_serializes_as_label() {
        let json = serde_json::to_string(&StoryBeat::FinalAct).unwrap();
        assert_eq!(json, "\"终幕\"");
        let beat: StoryBeat = serde_json::from_str("\"承\"").unwrap();
        assert_eq!(beat, StoryBeat::Development);
    }

    #[test]
    fn closing_beats() {
        assert!(StoryBeat::FinalAct.is_closing());
        assert!(StoryBeat::Epilogue.is_closing());
        assert!(!StoryBeat::Resolution.is_closing());
        assert!(StoryBeat::Resolution.in_cycle());
        assert!(!StoryBeat::Epilogue.in_cycle());
    }
}
