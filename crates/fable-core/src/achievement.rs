//! Achievement definitions and the completion log.
//!
//! Achievements live in their own document so that starting a new game does
//! not wipe them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Substring marking an achievement as a great work.
pub const GREAT_WORK_MARKER: &str = "伟业";

/// One achievement definition and its progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    /// Unique name.
    pub name: String,
    /// Whether it has been completed.
    #[serde(default)]
    pub is_completed: bool,
    /// Hidden achievements are not shown until revealed or completed.
    #[serde(default)]
    pub is_hidden: bool,
}

impl Achievement {
    /// Whether completing this achievement ends the story after the current cycle.
    pub fn is_great_work(&self) -> bool {
        is_great_work(&self.name)
    }
}

/// Whether `name` denotes a great work.
pub fn is_great_work(name: &str) -> bool {
    name.contains(GREAT_WORK_MARKER)
}

/// A logged completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    /// Achievement name.
    pub name: String,
    /// Real-world completion time.
    pub completed_at: DateTime<Utc>,
}

/// Result of completing a known achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// First completion; a log entry was written.
    FirstTime,
    /// Already completed; nothing was logged.
    Repeated,
}

/// The achievements document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AchievementBook {
    /// Definitions in declaration order.
    pub achievements: Vec<Achievement>,
    /// Completions, at most one per name.
    pub completed_log: Vec<CompletionRecord>,
}

impl AchievementBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition. Returns false if the name already exists.
    pub fn define(&mut self, name: impl Into<String>, hidden: bool) -> bool {
        let name = name.into();
        if self.get(&name).is_some() {
            return false;
        }
        self.achievements.push(Achievement {
            name,
            is_completed: false,
            is_hidden: hidden,
        });
        true
    }

    /// Look up a definition.
    pub fn get(&self, name: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.name == name)
    }

    /// Complete an achievement and reveal it. `None` if it is not defined.
    pub fn complete(&mut self, name: &str, at: DateTime<Utc>) -> Option<Completion> {
        let achievement = self.achievements.iter_mut().find(|a| a.name == name)?;
        achievement.is_completed = true;
        achievement.is_hidden = false;
        if self.completed_log.iter().any(|c| c.name == name) {
            return Some(Completion::Repeated);
        }
        self.completed_log.push(CompletionRecord {
            name: name.to_string(),
            completed_at: at,
        });
        Some(Completion::FirstTime)
    }

    /// Reveal a hidden achievement. Returns false if it is not defined.
    pub fn show(&mut self, name: &str) -> bool {
        match self.achievements.iter_mut().find(|a| a.name == name) {
            Some(a) => {
                a.is_hidden = false;
                true
            }
            None => false,
        }
    }

    /// Reset progress: nothing completed, log emptied. Definitions stay.
    pub fn clear_progress(&mut self) {
        for a in &mut self.achievements {
            a.is_completed = false;
        }
        self.completed_log.clear();
    }

    /// Achievements that are not hidden.
    pub fn visible(&self) -> impl Iterator<Item = &Achievement> {
        self.achievements.iter().filter(|a| !a.is_hidden)
    }
}
