//! Turn processing for one narrative session.
//!
//! `Session` owns the world state, a document store, and a seeded RNG. Each
//! turn parses narrator text, validates and applies the commands it carries,
//! fills in a default turn where commands are missing, advances the clock,
//! and saves.

use fable_core::{AchievementBook, BeatOperation, GameDocument};
use fable_directive::{ValidCommand, ValidationError, parse, validate};
use rand::rngs::StdRng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::error::{PersistError, SessionResult};
use crate::persistence::{ACHIEVEMENTS_KEY, DocumentStore, GAME_KEY, RHYTHM_KEY};
use crate::random::session_rng;
use crate::rhythm::NarrativeRhythm;
use crate::state::WorldState;

/// Result of one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReport {
    /// Narrative text for the player.
    pub prose: String,
    /// Commands that changed (or deliberately left) the state.
    pub commands_applied: usize,
    /// Number of validation errors, turn-level ones included.
    pub validation_error_count: usize,
    /// False if a fatal error occurred or the save failed.
    pub success: bool,
    /// The fatal or save error, if any.
    pub error: Option<String>,
    /// Validation errors in detail.
    pub validation_errors: Vec<ValidationError>,
    /// Valid commands the state refused, with reasons.
    pub rejected: Vec<String>,
}

/// Non-whitespace characters in `prose`, the word count used for pacing.
pub fn count_words(prose: &str) -> u64 {
    prose.chars().filter(|c| !c.is_whitespace()).count() as u64
}

/// An interactive narrative session.
pub struct Session<S: DocumentStore> {
    state: WorldState,
    store: S,
    config: SessionConfig,
    rng: StdRng,
}

impl<S: DocumentStore> Session<S> {
    /// Start a fresh game on `store` without reading it. Nothing is written
    /// until the first turn or [`Session::save`].
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self {
            state: WorldState::new(config.start_time),
            rng: session_rng(config.seed),
            store,
            config,
        }
    }

    /// Resume from `store`. Missing documents start from defaults. The
    /// great-work flag is part of the game document and lasts until a new game.
    pub fn load(store: S, config: SessionConfig) -> SessionResult<Self> {
        let doc = read_doc(&store, GAME_KEY)?
            .unwrap_or_else(|| GameDocument::starting_at(config.start_time));
        let achievements: AchievementBook = read_doc(&store, ACHIEVEMENTS_KEY)?.unwrap_or_default();
        let rhythm: NarrativeRhythm = read_doc(&store, RHYTHM_KEY)?.unwrap_or_default();

        let state = WorldState::from_parts(doc, achievements, rhythm);
        debug!(beat = %state.narrative().story_beat, time = %state.clock(), "session loaded");

        Ok(Self {
            state,
            rng: session_rng(config.seed),
            store,
            config,
        })
    }

    /// Current world state.
    pub fn state(&self) -> &WorldState {
        &self.state
    }

    /// Mutable world state, for out-of-turn actions such as defining achievements.
    pub fn state_mut(&mut self) -> &mut WorldState {
        &mut self.state
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Reset to a new game (achievements kept) and save.
    pub fn new_game(&mut self) -> SessionResult<()> {
        self.state.new_game(self.config.start_time);
        self.save()
    }

    /// Write the game, achievements, and rhythm documents.
    pub fn save(&mut self) -> SessionResult<()> {
        let game = to_doc(GAME_KEY, self.state.document())?;
        let achievements = to_doc(ACHIEVEMENTS_KEY, self.state.achievements())?;
        let rhythm = to_doc(RHYTHM_KEY, self.state.rhythm())?;
        self.store.write(GAME_KEY, &game)?;
        self.store.write(ACHIEVEMENTS_KEY, &achievements)?;
        self.store.write(RHYTHM_KEY, &rhythm)?;
        Ok(())
    }

    /// Process one turn of narrator output.
    ///
    /// Never fails outright: problems are reported in the [`TurnReport`].
    /// State changes made before a failure are kept.
    pub fn process_turn(&mut self, raw: &str) -> TurnReport {
        let parsed = parse(raw);
        let mut report = TurnReport {
            prose: parsed.prose.clone(),
            success: true,
            ..TurnReport::default()
        };

        let outcome = if parsed.commands.is_empty() {
            debug!("turn carried no commands; applying the default turn");
            self.finish_turn(&parsed.prose, true, true, false)
        } else {
            self.run_commands(&parsed.commands, &parsed.prose, &mut report)
        };

        if let Err(e) = outcome {
            warn!(error = %e, "turn failed after the default turn was applied");
            report.success = false;
            report.error = Some(e.to_string());
        }

        if let Err(e) = self.save() {
            error!(error = %e, "saving after the turn failed");
            report.success = false;
            report.error = Some(e.to_string());
        }

        info!(
            applied = report.commands_applied,
            errors = report.validation_error_count,
            beat = %self.state.narrative().story_beat,
            depth = self.state.narrative().depth_level,
            time = %self.state.clock(),
            "turn processed"
        );
        report
    }

    fn run_commands(
        &mut self,
        commands: &[fable_directive::Command],
        prose: &str,
        report: &mut TurnReport,
    ) -> SessionResult<()> {
        let checked = validate(commands);
        report.validation_error_count = checked.errors.len();
        for e in &checked.errors {
            warn!(error = %e, "command failed validation");
        }
        report.validation_errors = checked.errors;

        let mut explicit_time = false;
        for command in checked.valid {
            explicit_time |= matches!(command, ValidCommand::SetTime(_));
            let label = command.label();
            match self.state.apply(command, &mut self.rng) {
                Ok(applied) => {
                    debug!(command = %label, ?applied, "command applied");
                    report.commands_applied += 1;
                }
                Err(e) => {
                    warn!(command = %label, error = %e, "command rejected");
                    report.rejected.push(format!("{label}: {e}"));
                }
            }
        }

        self.finish_turn(prose, checked.missing_beat, checked.missing_depth, explicit_time)
    }

    /// Fill missing mandatory commands, count words, move the clock, expire events.
    fn finish_turn(
        &mut self,
        prose: &str,
        missing_beat: bool,
        missing_depth: bool,
        explicit_time: bool,
    ) -> SessionResult<()> {
        self.apply_fallback(missing_beat, missing_depth);

        if self.config.count_prose_words {
            let words = count_words(prose);
            if words > 0 {
                self.state.record_words(words);
            }
        }
        if !explicit_time {
            self.state.advance_default_time()?;
        }
        self.state.expire_events();
        Ok(())
    }

    /// Maintain the beat and/or keep the previous depth.
    fn apply_fallback(&mut self, beat: bool, depth: bool) {
        if beat {
            self.state.apply_beat(BeatOperation::Maintain);
        }
        if depth {
            self.state.hold_depth();
        }
    }
}

fn read_doc<S: DocumentStore, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> SessionResult<Option<T>> {
    let Some(value) = store.read(key)? else {
        return Ok(None);
    };
    serde_json::from_value(value)
        .map(Some)
        .map_err(|source| {
            PersistError::Json {
                key: key.to_string(),
                source,
            }
            .into()
        })
}

fn to_doc<T: Serialize>(key: &str, doc: &T) -> Result<Value, PersistError> {
    serde_json::to_value(doc).map_err(|source| PersistError::Json {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use fable_core::{EntityKind, GameTime, NarrativeState, StoryBeat};
    use serde_json::json;

    fn config() -> SessionConfig {
        SessionConfig::default().with_seed(42)
    }

    fn session_with(narrative: NarrativeState, time: &str) -> Session<MemoryStore> {
        let mut doc = GameDocument::starting_at(GameTime::parse(time).unwrap());
        doc.narrative = narrative;
        let mut store = MemoryStore::new();
        store
            .write(GAME_KEY, &serde_json::to_value(&doc).unwrap())
            .unwrap();
        Session::load(store, config()).unwrap()
    }

    fn at_beat(beat: StoryBeat) -> NarrativeState {
        NarrativeState {
            story_beat: beat,
            depth_level: 3,
            ..NarrativeState::default()
        }
    }

    #[test]
    fn explicit_commands_drive_the_turn() {
        let mut session = Session::new(MemoryStore::new(), config());
        let report = session
            .process_turn("节拍操作：推进\n当前景深等级：3\n当前时间：1925-12-26 02:00:00");

        assert!(report.success);
        assert_eq!(report.commands_applied, 3);
        assert_eq!(report.validation_error_count, 0);
        let narrative = session.state().narrative();
        assert_eq!(narrative.story_beat, StoryBeat::Development);
        assert_eq!(narrative.depth_level, 3);
        assert_eq!(session.state().clock().to_string(), "1925-12-26 02:00:00");
    }

    #[test]
    fn advancing_past_resolution_starts_a_new_cycle() {
        let mut narrative = at_beat(StoryBeat::Resolution);
        narrative.beat_word_counts.current.opening = 1800;
        narrative.beat_word_counts.current.resolution = 400;
        let mut session = session_with(narrative, "1926-03-01 10:00:00");

        let report = session.process_turn("节拍操作：推进\n景深等级：3");
        assert!(report.success);

        let narrative = session.state().narrative();
        assert_eq!(narrative.story_beat, StoryBeat::Opening);
        assert_eq!(narrative.current_cycle, 2);
        assert_eq!(narrative.beat_word_counts.previous.opening, 1800);
        assert_eq!(narrative.beat_word_counts.previous.resolution, 400);
        assert_eq!(narrative.beat_word_counts.current.opening, 0);
        assert_eq!(narrative.current_cycle_words, 0);
    }

    #[test]
    fn great_work_turns_resolution_into_epilogue() {
        let mut session = session_with(at_beat(StoryBeat::Resolution), "1926-03-01 10:00:00");
        session.state_mut().define_achievement("救世伟业", false);

        let report = session.process_turn("完成成就：救世伟业\n节拍操作：推进\n景深等级：2");
        assert!(report.success, "{report:?}");
        assert_eq!(session.state().narrative().story_beat, StoryBeat::Epilogue);
        assert!(session.state().clock().is_epilogue());
        assert_eq!(session.state().clock().to_string(), "后日谈");
    }

    #[test]
    fn word_total_forces_the_final_act() {
        let mut narrative = at_beat(StoryBeat::Development);
        narrative.total_words = 300_000;
        let mut session = session_with(narrative, "1926-03-01 10:00:00");

        session.process_turn("节拍操作：维持\n景深等级：3");
        assert_eq!(session.state().narrative().story_beat, StoryBeat::FinalAct);
    }

    #[test]
    fn turn_without_commands_holds_beat_and_depth() {
        let mut session = session_with(at_beat(StoryBeat::Turn), "1926-03-01 10:00:00");

        let report = session.process_turn("雨一直在下。");
        assert!(report.success);
        assert_eq!(report.commands_applied, 0);
        assert_eq!(report.prose, "雨一直在下。");

        let narrative = session.state().narrative();
        assert_eq!(narrative.story_beat, StoryBeat::Turn);
        assert_eq!(narrative.depth_level, 3);
        assert_eq!(narrative.beat_word_counts.current.turn, 6);
        assert_eq!(session.state().clock().to_string(), "1926-03-01 12:00:00");
        assert_eq!(session.state().rhythm().depth_history().collect::<Vec<_>>(), [3]);
    }

    #[test]
    fn missing_depth_alone_is_filled_in() {
        let mut session = session_with(at_beat(StoryBeat::Opening), "1926-03-01 10:00:00");
        let report = session.process_turn("节拍操作：推进");
        assert_eq!(report.commands_applied, 1);
        assert_eq!(report.validation_error_count, 1);
        assert_eq!(session.state().narrative().story_beat, StoryBeat::Development);
        assert_eq!(session.state().narrative().depth_level, 3);
    }

    #[test]
    fn rejected_commands_do_not_stop_the_turn() {
        let mut session = Session::new(MemoryStore::new(), config());
        let report = session.process_turn(
            "节拍操作：维持\n景深等级：2\n删除地点：森林\n添加地点：{\"name\":\"车站\",\"description\":\"旧站台\"}",
        );
        assert!(report.success);
        assert_eq!(report.commands_applied, 3);
        assert_eq!(report.rejected.len(), 1);
        assert!(report.rejected[0].contains("森林"));
        assert_eq!(session.state().document().names(EntityKind::Location), ["车站"]);
    }

    #[test]
    fn invalid_commands_are_counted() {
        let mut session = Session::new(MemoryStore::new(), config());
        let report = session.process_turn("节拍操作：跳舞\n景深等级：3\n注册角色：{\"name\":\"艾米\"}");
        assert!(report.success);
        assert_eq!(report.commands_applied, 1);
        // bad beat, missing beat, missing character description
        assert_eq!(report.validation_error_count, 3);
        assert_eq!(report.validation_errors.len(), 3);
        assert_eq!(session.state().narrative().story_beat, StoryBeat::Opening);
    }

    #[test]
    fn events_expire_when_the_clock_passes_them() {
        let mut session = Session::new(MemoryStore::new(), config());
        session.process_turn(
            r#"===GAME_DATA_START===
[
  {"action":"update","path":"narrative.storyBeatOperation","value":"维持"},
  {"action":"update","path":"narrative.depthLevel","value":3},
  {"action":"registerEvent","value":{"name":"晚宴","description":"庄园晚宴","startTime":"1925-12-26 00:00:00","expectedEndTime":"1925-12-26 01:00:00"}}
]
===GAME_DATA_END==="#,
        );
        assert_eq!(session.state().document().events.len(), 0);
        assert_eq!(session.state().clock().to_string(), "1925-12-26 02:00:00");
    }

    #[test]
    fn turn_is_saved_to_the_store() {
        let mut session = Session::new(MemoryStore::new(), config());
        session.process_turn("节拍操作：推进\n景深等级：4");

        let store = session.store();
        assert_eq!(store.len(), 3);
        let game = store.read(GAME_KEY).unwrap().unwrap();
        assert_eq!(game["narrative"]["storyBeat"], "承");
        assert_eq!(game["narrative"]["depthLevel"], 4);
        let rhythm = store.read(RHYTHM_KEY).unwrap().unwrap();
        assert_eq!(rhythm["depthHistory"], json!([4]));
    }

    #[test]
    fn load_keeps_greatness() {
        let mut narrative = at_beat(StoryBeat::Resolution);
        narrative.greatness_achieved_this_session = true;
        let session = session_with(narrative, "1926-03-01 10:00:00");
        assert!(session.state().narrative().greatness_achieved_this_session);
    }

    #[test]
    fn great_work_survives_reloads_until_the_epilogue() {
        let mut session = Session::new(MemoryStore::new(), config());
        session.state_mut().define_achievement("救世伟业", false);
        session.save().unwrap();
        let mut store = session.store().clone();

        let turns = [
            ("完成成就：救世伟业\n节拍操作：推进\n景深等级：3", StoryBeat::Development),
            ("节拍操作：推进\n景深等级：3", StoryBeat::Turn),
            ("节拍操作：推进\n景深等级：3", StoryBeat::Resolution),
            ("节拍操作：推进\n景深等级：3", StoryBeat::Epilogue),
        ];
        for (raw, expected) in turns {
            let mut session = Session::load(store, config()).unwrap();
            let report = session.process_turn(raw);
            assert!(report.success, "{report:?}");
            assert_eq!(session.state().narrative().story_beat, expected);
            assert!(session.state().narrative().greatness_achieved_this_session);
            store = session.store().clone();
        }
        let game = store.read(GAME_KEY).unwrap().unwrap();
        assert_eq!(game["currentTime"], "后日谈");
    }

    #[test]
    fn new_game_clears_greatness() {
        let mut narrative = at_beat(StoryBeat::Resolution);
        narrative.greatness_achieved_this_session = true;
        let mut session = session_with(narrative, "1926-03-01 10:00:00");
        session.new_game().unwrap();
        assert!(!session.state().narrative().greatness_achieved_this_session);

        let reloaded = Session::load(session.store().clone(), config()).unwrap();
        assert!(!reloaded.state().narrative().greatness_achieved_this_session);
    }

    #[test]
    fn clock_overflow_fails_the_turn_once() {
        let start = GameTime::At(chrono::NaiveDateTime::MAX);
        let mut session = Session::new(MemoryStore::new(), config().with_start_time(start));

        let report = session.process_turn("雨。");
        assert!(!report.success);
        assert!(report.error.as_deref().unwrap().contains("overflow"));
        assert_eq!(session.state().rhythm().depth_history().count(), 1);
        assert_eq!(session.state().clock(), start);
    }

    #[test]
    fn load_from_empty_store_uses_defaults() {
        let session = Session::load(MemoryStore::new(), config()).unwrap();
        assert_eq!(session.state().clock().to_string(), "1925-12-26 00:00:00");
        assert_eq!(session.state().narrative().story_beat, StoryBeat::Opening);
    }

    #[test]
    fn new_game_keeps_achievements() {
        let mut session = Session::new(MemoryStore::new(), config());
        session.state_mut().define_achievement("初见", false);
        session.process_turn("完成成就：初见\n节拍操作：推进\n景深等级：3");
        session.new_game().unwrap();

        assert_eq!(session.state().narrative().story_beat, StoryBeat::Opening);
        assert!(session.state().achievements().get("初见").unwrap().is_completed);
    }

    struct FailingStore;

    impl DocumentStore for FailingStore {
        fn read(&self, _key: &str) -> Result<Option<Value>, PersistError> {
            Ok(None)
        }

        fn write(&mut self, key: &str, _doc: &Value) -> Result<(), PersistError> {
            Err(PersistError::Io {
                key: key.to_string(),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    #[test]
    fn save_failure_marks_turn_failed_but_keeps_state() {
        let mut session = Session::new(FailingStore, config());
        let report = session.process_turn("节拍操作：推进\n景深等级：3");

        assert!(!report.success);
        assert!(report.error.as_deref().unwrap().contains("disk full"));
        assert_eq!(session.state().narrative().story_beat, StoryBeat::Development);
    }

    #[test]
    fn same_seed_same_outcome() {
        let script = ["节拍操作：维持\n景深等级：1", "节拍操作：维持\n景深等级：5", "节拍操作：维持\n景深等级：5"];
        let run = || {
            let mut session = Session::new(MemoryStore::new(), config());
            for turn in script {
                session.process_turn(turn);
            }
            session.state().rhythm().depth_history().collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = TurnReport {
            prose: "p".into(),
            commands_applied: 2,
            success: true,
            ..TurnReport::default()
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["commandsApplied"], 2);
        assert_eq!(value["validationErrorCount"], 0);
        assert_eq!(value["error"], Value::Null);
    }
}
