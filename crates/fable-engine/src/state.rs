//! The world state: game document, achievements, and depth history, mutated
//! only through validated commands.
//!
//! Entity collections upsert by name. Characters are frozen in the closing
//! beats, new events stop in the epilogue, and foreshadowings are capped.

use std::cmp::{Ordering, Reverse};

use chrono::{NaiveDateTime, Utc};
use fable_core::achievement::is_great_work;
use fable_core::upsert::{find_named, find_named_mut, remove_named};
use fable_core::{
    AchievementBook, BeatOperation, CharacterPatch, CharacterTemplate, ClockError, Completion,
    EntityKind, EventPatch, GameDocument, GameTime, NarrativeState, ResolvedCharacter, StoryBeat,
    Upserted, upsert,
};
use fable_directive::{EntityPatch, ValidCommand};
use tracing::{debug, info, warn};

use crate::error::{StateError, StateResult};
use crate::random::RandomSource;
use crate::rhythm::{self, BeatTransition, NarrativeRhythm};

/// Foreshadowings above this count are flagged but kept.
pub const FORESHADOWING_SOFT_LIMIT: usize = 12;

/// Foreshadowings above this count are evicted, least important first.
pub const FORESHADOWING_HARD_LIMIT: usize = 20;

/// What applying a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// The beat state machine ran.
    Beat(BeatTransition),
    /// The depth level now in effect.
    Depth(u8),
    /// The clock was set.
    Time,
    /// The clock was left alone because the story is over.
    TimeIgnored,
    /// A record was created or merged.
    Upserted(EntityKind, Upserted),
    /// A record was removed.
    Deleted(EntityKind),
    /// An achievement was completed.
    Achievement(Completion),
    /// A hidden achievement was revealed.
    AchievementShown,
    /// A deed was appended to a character.
    HistoryAppended,
}

/// Everything a session mutates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldState {
    doc: GameDocument,
    achievements: AchievementBook,
    rhythm: NarrativeRhythm,
}

impl WorldState {
    /// A new game starting at `start`, with no achievements.
    pub fn new(start: GameTime) -> Self {
        Self {
            doc: GameDocument::starting_at(start),
            ..Self::default()
        }
    }

    /// Assemble a state from loaded documents.
    pub fn from_parts(
        doc: GameDocument,
        achievements: AchievementBook,
        rhythm: NarrativeRhythm,
    ) -> Self {
        Self {
            doc,
            achievements,
            rhythm,
        }
    }

    /// The game document.
    pub fn document(&self) -> &GameDocument {
        &self.doc
    }

    /// Pacing state.
    pub fn narrative(&self) -> &NarrativeState {
        &self.doc.narrative
    }

    /// The in-fiction clock.
    pub fn clock(&self) -> GameTime {
        self.doc.current_time
    }

    /// The achievements document.
    pub fn achievements(&self) -> &AchievementBook {
        &self.achievements
    }

    /// Depth smoothing memory.
    pub fn rhythm(&self) -> &NarrativeRhythm {
        &self.rhythm
    }

    /// Reset the game to defaults, clearing the great-work flag. Achievements
    /// survive; depth history does not.
    pub fn new_game(&mut self, start: GameTime) {
        self.doc = GameDocument::starting_at(start);
        self.rhythm.clear();
        info!(start = %start, "new game");
    }

    /// Apply one validated command.
    pub fn apply(
        &mut self,
        command: ValidCommand,
        rng: &mut dyn RandomSource,
    ) -> StateResult<Applied> {
        match command {
            ValidCommand::Beat(op) => Ok(Applied::Beat(self.apply_beat(op))),
            ValidCommand::Depth(raw) => Ok(Applied::Depth(self.set_depth(raw, rng))),
            ValidCommand::SetTime(t) => self.set_time(t),
            ValidCommand::Register(patch) => self.register(patch, rng),
            ValidCommand::Update(patch) => self.update(patch, rng),
            ValidCommand::Delete { kind, name } => {
                self.delete(kind, &name).map(|()| Applied::Deleted(kind))
            }
            ValidCommand::CompleteAchievement(name) => {
                self.complete_achievement(&name).map(Applied::Achievement)
            }
            ValidCommand::ShowAchievement(name) => {
                self.show_achievement(&name).map(|()| Applied::AchievementShown)
            }
            ValidCommand::AppendHistory { name, thing_done } => self
                .append_character_history(&name, thing_done)
                .map(|()| Applied::HistoryAppended),
        }
    }

    /// Run the beat state machine.
    pub fn apply_beat(&mut self, op: BeatOperation) -> BeatTransition {
        rhythm::transition(&mut self.doc.narrative, &mut self.doc.current_time, op)
    }

    /// Smooth and store a requested depth level.
    pub fn set_depth(&mut self, requested: i64, rng: &mut dyn RandomSource) -> u8 {
        let depth = self.rhythm.set_depth(requested, rng);
        self.doc.narrative.depth_level = depth;
        depth
    }

    /// Keep the current depth level for another turn.
    pub fn hold_depth(&mut self) -> u8 {
        let depth = self.rhythm.hold_depth(self.doc.narrative.depth_level);
        self.doc.narrative.depth_level = depth;
        depth
    }

    /// Count words written this turn; may auto-advance the beat.
    pub fn record_words(&mut self, words: u64) -> Option<BeatTransition> {
        rhythm::record_words(&mut self.doc.narrative, &mut self.doc.current_time, words)
    }

    /// Set the clock. Earlier times are rejected; the epilogue ignores it.
    pub fn set_time(&mut self, time: NaiveDateTime) -> StateResult<Applied> {
        let requested = GameTime::At(time);
        match self.doc.current_time.compare(&requested) {
            None => {
                debug!(requested = %requested, "clock is frozen in the epilogue");
                Ok(Applied::TimeIgnored)
            }
            Some(Ordering::Greater) => Err(StateError::TimeWentBackwards {
                current: self.doc.current_time.to_string(),
                requested: requested.to_string(),
            }),
            Some(_) => {
                self.doc.current_time = requested;
                Ok(Applied::Time)
            }
        }
    }

    /// Advance the clock by the step for the current depth level.
    pub fn advance_default_time(&mut self) -> Result<(), ClockError> {
        let depth = i64::from(self.doc.narrative.depth_level);
        self.doc.current_time.advance_default(depth)
    }

    /// Remove events whose expected end time has been reached. Returns their names.
    pub fn expire_events(&mut self) -> Vec<String> {
        let now = self.doc.current_time;
        if now.is_epilogue() {
            return Vec::new();
        }
        let mut expired = Vec::new();
        self.doc.events.retain(|event| {
            let ended = event
                .expected_end_time
                .as_deref()
                .and_then(|end| GameTime::parse(end).ok())
                .and_then(|end| end.compare(&now))
                .is_some_and(|ord| ord != Ordering::Greater);
            if ended {
                expired.push(event.name.clone());
            }
            !ended
        });
        for name in &expired {
            info!(event = %name, now = %now, "event reached its expected end");
        }
        expired
    }

    /// Register a record: merge by name or append.
    pub fn register(
        &mut self,
        patch: EntityPatch,
        rng: &mut dyn RandomSource,
    ) -> StateResult<Applied> {
        self.upsert_entity(patch, false, rng)
    }

    /// Update a record, creating it if absent.
    pub fn update(
        &mut self,
        patch: EntityPatch,
        rng: &mut dyn RandomSource,
    ) -> StateResult<Applied> {
        self.upsert_entity(patch, true, rng)
    }

    fn upsert_entity(
        &mut self,
        patch: EntityPatch,
        is_update: bool,
        rng: &mut dyn RandomSource,
    ) -> StateResult<Applied> {
        let kind = patch.kind();
        let outcome = match patch {
            EntityPatch::Event(p) => self.upsert_event(p, is_update)?,
            EntityPatch::Foreshadowing(p) => {
                let (outcome, _) = upsert(&mut self.doc.foreshadowings, p);
                if outcome == Upserted::Inserted {
                    self.enforce_foreshadowing_bound();
                }
                outcome
            }
            EntityPatch::Character(p) => self.upsert_character(p, rng)?,
            EntityPatch::Asset(kind, p) => match self.doc.assets.collection_mut(kind) {
                Some(items) => upsert(items, p).0,
                None => {
                    return Err(StateError::NotFound {
                        kind,
                        name: p.name,
                    });
                }
            },
        };
        debug!(%kind, ?outcome, "record written");
        Ok(Applied::Upserted(kind, outcome))
    }

    fn upsert_event(&mut self, mut patch: EventPatch, is_update: bool) -> StateResult<Upserted> {
        let exists = find_named(&self.doc.events, &patch.name).is_some();
        if self.doc.narrative.story_beat == StoryBeat::Epilogue && !(is_update && exists) {
            warn!(event = %patch.name, "new event rejected in the epilogue");
            return Err(StateError::EventsClosed { name: patch.name });
        }
        patch.current_time = Some(self.doc.current_time.to_string());
        Ok(upsert(&mut self.doc.events, patch).0)
    }

    fn upsert_character(
        &mut self,
        mut patch: CharacterPatch,
        rng: &mut dyn RandomSource,
    ) -> StateResult<Upserted> {
        let beat = self.doc.narrative.story_beat;
        if beat.is_closing() {
            warn!(character = %patch.name, %beat, "character change rejected");
            return Err(StateError::CharactersLocked {
                beat,
                name: patch.name,
            });
        }

        let template = patch.template.take().map(|requested| {
            CharacterTemplate::parse(&requested).unwrap_or_else(|| {
                let picked = CharacterTemplate::pick(rng.roll());
                warn!(character = %patch.name, requested = %requested, %picked, "unknown template replaced");
                picked
            })
        });
        let existing = find_named(&self.doc.characters, &patch.name).map(|c| c.template);
        let default_template = match (template, existing) {
            (_, Some(t)) => t,
            (Some(t), None) => t,
            (None, None) => CharacterTemplate::pick(rng.roll()),
        };

        let resolved = ResolvedCharacter {
            patch,
            template,
            default_template,
        };
        Ok(upsert(&mut self.doc.characters, resolved).0)
    }

    /// Evict the least important foreshadowings above the hard limit.
    fn enforce_foreshadowing_bound(&mut self) {
        let list = &mut self.doc.foreshadowings;
        if list.len() == FORESHADOWING_SOFT_LIMIT + 1 {
            warn!(
                count = list.len(),
                limit = FORESHADOWING_SOFT_LIMIT,
                "foreshadowings above the recommended count"
            );
        }
        if list.len() <= FORESHADOWING_HARD_LIMIT {
            return;
        }
        list.sort_by_key(|f| Reverse(f.effective_importance()));
        for evicted in list.drain(FORESHADOWING_HARD_LIMIT..) {
            warn!(
                foreshadowing = %evicted.name,
                importance = evicted.effective_importance(),
                "foreshadowing evicted over the hard limit"
            );
        }
    }

    /// Whether foreshadowings exceed the recommended count.
    pub fn foreshadowings_over_recommended(&self) -> bool {
        self.doc.foreshadowings.len() > FORESHADOWING_SOFT_LIMIT
    }

    /// Remove a record by name.
    pub fn delete(&mut self, kind: EntityKind, name: &str) -> StateResult<()> {
        let removed = match kind {
            EntityKind::Event => remove_named(&mut self.doc.events, name),
            EntityKind::Foreshadowing => remove_named(&mut self.doc.foreshadowings, name),
            EntityKind::Character => remove_named(&mut self.doc.characters, name),
            _ => self
                .doc
                .assets
                .collection_mut(kind)
                .is_some_and(|items| remove_named(items, name)),
        };
        if removed {
            debug!(%kind, name, "record deleted");
            Ok(())
        } else {
            Err(StateError::NotFound {
                kind,
                name: name.to_string(),
            })
        }
    }

    /// Append a deed to a character's history.
    pub fn append_character_history(&mut self, name: &str, thing_done: String) -> StateResult<()> {
        let character = find_named_mut(&mut self.doc.characters, name).ok_or_else(|| {
            StateError::NotFound {
                kind: EntityKind::Character,
                name: name.to_string(),
            }
        })?;
        character.things_done.push(thing_done);
        Ok(())
    }

    /// Add an achievement definition. Returns false if it already exists.
    pub fn define_achievement(&mut self, name: &str, hidden: bool) -> bool {
        self.achievements.define(name, hidden)
    }

    /// Complete an achievement; a great work also sets the greatness flag.
    pub fn complete_achievement(&mut self, name: &str) -> StateResult<Completion> {
        let completion = self
            .achievements
            .complete(name, Utc::now())
            .ok_or_else(|| StateError::AchievementNotFound(name.to_string()))?;
        if is_great_work(name) {
            self.doc.narrative.greatness_achieved_this_session = true;
            info!(achievement = name, "great work achieved");
        }
        Ok(completion)
    }

    /// Reveal a hidden achievement.
    pub fn show_achievement(&mut self, name: &str) -> StateResult<()> {
        if self.achievements.show(name) {
            Ok(())
        } else {
            Err(StateError::AchievementNotFound(name.to_string()))
        }
    }

    /// Reset achievement progress; definitions stay.
    pub fn clear_completed_achievements(&mut self) {
        self.achievements.clear_progress();
    }
}
