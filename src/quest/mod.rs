//! Stage progression
//!
//! `QuestController` owns the current stage, the one live engine, and the
//! durable progress record. Stages only move forward: a stage ends when its
//! engine (or answer gate) reports success, the next stage is persisted, and
//! only then is the next engine constructed.

mod active;
mod stage;

pub use active::{ActiveGame, GameView};
pub use stage::{ProgressRecord, Stage};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::answers::{AnswerSink, log_answer, login_accepted, matches_any, normalize};
use crate::highscores::{PersonalBests, Record};
use crate::persistence::{KeyValueStore, keys, load_json, save_json};
use crate::settings::{EngineConfig, QuestSettings, TriviaQuestion};
use crate::sim::{CatcherGame, Direction, MemoryGame, PuzzleGame, RoundOutcome, SnakeGame};

/// Question ids at or above this are reward keywords (offset by stage ordinal)
pub const KEYWORD_QUESTION_BASE: u32 = 100;

/// Where the current stage is within its own flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StagePhase {
    /// Engine running or gate waiting for input
    #[default]
    Playing,
    /// Round lost; `retry` deals a new one
    Lost,
    /// Stage won; the reward keyword unlocks the next stage
    Reward,
    /// Final stage reached
    Complete,
}

/// Outcome of a checked answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Accepted,
    Rejected,
    /// Not applicable in the current stage or phase
    Ignored,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        *self == Verdict::Accepted
    }
}

/// Serializable view handed to the UI each frame
#[derive(Debug, Clone, Serialize)]
pub struct QuestSnapshot<'a> {
    pub stage: Stage,
    pub phase: StagePhase,
    pub user: Option<&'a str>,
    pub developer_mode: bool,
    pub game: Option<GameView<'a>>,
    /// Trivia questions still waiting for an accepted answer
    pub open_questions: Vec<&'a TriviaQuestion>,
    pub bests: &'a PersonalBests,
}

pub struct QuestController<S: KeyValueStore> {
    settings: QuestSettings,
    store: S,
    sink: Box<dyn AnswerSink>,
    stage: Stage,
    phase: StagePhase,
    user: Option<String>,
    developer_mode: bool,
    game: Option<ActiveGame>,
    /// Stage whose success has already been handled
    succeeded: Option<Stage>,
    /// Lost rounds in the current stage this session
    losses: u32,
    /// Trivia ids answered acceptably
    answered: Vec<u32>,
    bests: PersonalBests,
    /// Seeds each engine
    rng: Pcg32,
}

impl<S: KeyValueStore> QuestController<S> {
    /// Resume from the stored progress record, or start at login
    pub fn load(settings: QuestSettings, store: S, sink: Box<dyn AnswerSink>, seed: u64) -> Self {
        let record = match load_json::<ProgressRecord>(&store, keys::PROGRESS) {
            Ok(Some(record)) => {
                log::info!("Resuming at stage {}", record.stage);
                record
            }
            Ok(None) => ProgressRecord::default(),
            Err(e) => {
                log::warn!("Stored progress unreadable ({}), starting over", e);
                ProgressRecord::default()
            }
        };
        let developer_mode = record
            .user
            .as_deref()
            .is_some_and(|user| settings.is_developer(user));
        let bests = PersonalBests::load(&store);

        let mut controller = Self {
            settings,
            store,
            sink,
            stage: record.stage,
            phase: StagePhase::Playing,
            user: record.user,
            developer_mode,
            game: None,
            succeeded: None,
            losses: 0,
            answered: Vec::new(),
            bests,
            rng: Pcg32::seed_from_u64(seed),
        };
        controller.mount();
        controller
    }

    pub fn current_stage(&self) -> Stage {
        self.stage
    }

    pub fn phase(&self) -> StagePhase {
        self.phase
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn developer_mode(&self) -> bool {
        self.developer_mode
    }

    pub fn settings(&self) -> &QuestSettings {
        &self.settings
    }

    pub fn bests(&self) -> &PersonalBests {
        &self.bests
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn game(&self) -> Option<&ActiveGame> {
        self.game.as_ref()
    }

    pub fn losses(&self) -> u32 {
        self.losses
    }

    pub fn snapshot(&self) -> QuestSnapshot<'_> {
        QuestSnapshot {
            stage: self.stage,
            phase: self.phase,
            user: self.user(),
            developer_mode: self.developer_mode,
            game: self.game.as_ref().map(ActiveGame::view),
            open_questions: self.open_questions(),
            bests: &self.bests,
        }
    }

    /// Move to a strictly later stage. Persists first, then mounts its engine.
    pub fn advance_to(&mut self, next: Stage) -> bool {
        if next <= self.stage {
            log::warn!("Refusing transition {} -> {}", self.stage, next);
            return false;
        }
        log::info!("Stage {} -> {}", self.stage, next);
        self.stage = next;
        self.persist();
        self.mount();
        true
    }

    /// Store the player's identity; decides developer mode for engines built from now on
    pub fn record_user(&mut self, nickname: &str) {
        let nickname = nickname.trim();
        self.developer_mode = self.settings.is_developer(nickname);
        self.user = Some(nickname.to_string());
        if self.developer_mode {
            log::info!("Developer mode on for {}", nickname);
        }
        self.persist();
    }

    /// Explicit full reset back to login; the only way out of the final stage
    pub fn reset_progress(&mut self) {
        if let Err(e) = self.store.remove(keys::PROGRESS) {
            log::warn!("Could not clear stored progress: {}", e);
        }
        log::info!("Progress reset");
        self.stage = Stage::Login;
        self.user = None;
        self.developer_mode = false;
        self.mount();
    }

    // === Answer gates ===

    pub fn login(&mut self, nickname: &str, secret: &str) -> Verdict {
        if self.stage != Stage::Login {
            return Verdict::Ignored;
        }
        if !login_accepted(nickname, secret, &self.settings.login_answers) {
            log::info!("Login rejected");
            return Verdict::Rejected;
        }
        self.record_user(nickname);
        self.advance_to(Stage::Welcome);
        Verdict::Accepted
    }

    /// Leave the welcome screen
    pub fn begin(&mut self) -> bool {
        self.stage == Stage::Welcome && self.advance_to(Stage::Game)
    }

    pub fn open_questions(&self) -> Vec<&TriviaQuestion> {
        if self.stage != Stage::Trivia {
            return Vec::new();
        }
        self.settings
            .trivia
            .iter()
            .filter(|q| !self.answered.contains(&q.id))
            .collect()
    }

    /// Answer one trivia question. Every attempt is logged; the stage is won
    /// once every question has an accepted answer.
    pub fn submit_trivia(&mut self, question_id: u32, answer: &str) -> Verdict {
        if self.stage != Stage::Trivia || self.phase != StagePhase::Playing {
            return Verdict::Ignored;
        }
        let Some(question) = self.settings.trivia.iter().find(|q| q.id == question_id) else {
            return Verdict::Ignored;
        };
        log_answer(self.sink.as_mut(), question.id, &question.question, answer);

        let accepted = if question.accepted.is_empty() {
            !normalize(answer).is_empty()
        } else {
            matches_any(answer, &question.accepted)
        };
        if !accepted {
            return Verdict::Rejected;
        }
        if !self.answered.contains(&question_id) {
            self.answered.push(question_id);
        }
        if self.open_questions().is_empty() {
            self.on_success();
        }
        Verdict::Accepted
    }

    /// Unlock the next stage from the reward screen
    pub fn submit_keyword(&mut self, answer: &str) -> Verdict {
        if self.phase != StagePhase::Reward {
            return Verdict::Ignored;
        }
        let Some(keyword) = self.settings.keyword_for(self.stage) else {
            return Verdict::Ignored;
        };
        let accepted = matches_any(answer, &[keyword.to_string()]);
        log_answer(
            self.sink.as_mut(),
            KEYWORD_QUESTION_BASE + self.stage.ordinal() as u32,
            &format!("keyword:{}", self.stage),
            answer,
        );
        if !accepted {
            return Verdict::Rejected;
        }
        self.advance_past_current();
        Verdict::Accepted
    }

    // === Engine input ===

    pub fn steer_snake(&mut self, direction: Direction) {
        if let Some(ActiveGame::Snake(game)) = &mut self.game {
            game.set_direction(direction);
        }
    }

    pub fn move_catcher(&mut self, x: f32) {
        if let Some(ActiveGame::Catcher(game)) = &mut self.game {
            game.set_catcher_position(x);
        }
    }

    pub fn flip_card(&mut self, index: usize) {
        if let Some(ActiveGame::Memory(game)) = &mut self.game {
            game.flip(index);
        }
    }

    pub fn slide_tile(&mut self, index: usize) {
        let outcome = match &mut self.game {
            Some(ActiveGame::Puzzle(game)) => game.move_tile(index),
            _ => None,
        };
        if let Some(outcome) = outcome {
            self.on_round_end(outcome);
        }
    }

    /// Advance the live engine by one host frame
    pub fn update(&mut self, dt: f32) {
        if self.phase != StagePhase::Playing {
            return;
        }
        let outcome = self.game.as_mut().and_then(|game| game.update(dt));
        if let Some(outcome) = outcome {
            self.on_round_end(outcome);
        }
    }

    /// Deal a new round after a loss
    pub fn retry(&mut self) -> bool {
        if self.phase != StagePhase::Lost {
            return false;
        }
        let settings = &self.settings;
        match &mut self.game {
            Some(ActiveGame::Snake(game)) => {
                let target = settings.snake.target_after(self.losses);
                log::info!("Snake retry #{} with target {}", self.losses, target);
                game.reset(target, settings.snake.grid_size);
            }
            Some(ActiveGame::Catcher(game)) => {
                game.reset(settings.catcher.target_score, settings.catcher.duration_secs);
            }
            Some(ActiveGame::Memory(game)) => {
                game.reset(
                    settings.memory.pair_count as usize,
                    settings.memory.duration_secs,
                );
            }
            Some(ActiveGame::Puzzle(_)) | None => return false,
        }
        self.phase = StagePhase::Playing;
        true
    }

    fn on_round_end(&mut self, outcome: RoundOutcome) {
        self.record_bests(outcome);
        match outcome {
            RoundOutcome::Won => self.on_success(),
            RoundOutcome::Lost => {
                self.losses += 1;
                self.phase = StagePhase::Lost;
                log::info!("Stage {} lost ({} so far)", self.stage, self.losses);
            }
        }
    }

    fn record_bests(&mut self, outcome: RoundOutcome) {
        let Some(game) = &self.game else {
            return;
        };
        let mut entries = Vec::with_capacity(1);
        match game {
            ActiveGame::Snake(game) => entries.push((Record::SnakeScore, game.state().score)),
            ActiveGame::Catcher(game) => entries.push((Record::CatcherScore, game.state().score)),
            ActiveGame::Memory(game) if outcome == RoundOutcome::Won => {
                entries.push((Record::MemoryTime, game.state().elapsed().ceil() as u32));
            }
            ActiveGame::Puzzle(game) if outcome == RoundOutcome::Won => {
                entries.push((Record::PuzzleMoves, game.state().moves));
            }
            _ => {}
        }
        for (record, value) in entries {
            self.bests.submit(record, value, &mut self.store);
        }
    }

    /// Handle a stage win once
    fn on_success(&mut self) {
        if self.succeeded == Some(self.stage) {
            log::debug!("Duplicate success for {} ignored", self.stage);
            return;
        }
        self.succeeded = Some(self.stage);
        log::info!("Stage {} won", self.stage);

        if self.settings.keyword_for(self.stage).is_some() {
            self.phase = StagePhase::Reward;
        } else {
            self.advance_past_current();
        }
    }

    fn advance_past_current(&mut self) {
        if let Some(next) = self.stage.next() {
            self.advance_to(next);
        }
    }

    fn persist(&mut self) {
        let record = ProgressRecord {
            stage: self.stage,
            user: self.user.clone(),
        };
        if let Err(e) = save_json(&mut self.store, keys::PROGRESS, &record) {
            log::warn!("Progress not saved, continuing in memory: {}", e);
        }
    }

    fn engine_config(&mut self, goal: u32, duration_secs: u32) -> EngineConfig {
        EngineConfig::new(goal, duration_secs, self.rng.random()).developer(self.developer_mode)
    }

    /// Build the engine (if any) for the current stage, dropping the old one
    fn mount(&mut self) {
        self.succeeded = None;
        self.losses = 0;
        self.answered.clear();
        self.phase = if self.stage.is_terminal() {
            StagePhase::Complete
        } else {
            StagePhase::Playing
        };

        self.game = match self.stage {
            Stage::Game => {
                let config = self.engine_config(self.settings.snake.target_score, 0);
                Some(ActiveGame::Snake(SnakeGame::new(
                    config,
                    self.settings.snake.grid_size,
                )))
            }
            Stage::CatchHearts => {
                let config = self.engine_config(
                    self.settings.catcher.target_score,
                    self.settings.catcher.duration_secs,
                );
                Some(ActiveGame::Catcher(CatcherGame::new(config)))
            }
            Stage::MemoryGame => {
                let config = self.engine_config(
                    self.settings.memory.pair_count,
                    self.settings.memory.duration_secs,
                );
                Some(ActiveGame::Memory(MemoryGame::new(config)))
            }
            Stage::Puzzle => {
                let config = self.engine_config(0, 0);
                Some(ActiveGame::Puzzle(PuzzleGame::new(
                    config,
                    self.settings.puzzle.size,
                )))
            }
            Stage::Login | Stage::Welcome | Stage::Trivia | Stage::Revelation => None,
        };
        if self.game.is_some() {
            log::debug!("Mounted engine for {}", self.stage);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::{NullSink, RecordingSink};
    use crate::persistence::MemoryStore;
    use crate::sim::{CatcherStatus, MemoryStatus, SnakeStatus};

    fn controller(store: MemoryStore) -> QuestController<MemoryStore> {
        QuestController::load(QuestSettings::default(), store, Box::new(NullSink), 7)
    }

    fn stored_stage(store: &MemoryStore) -> Option<Stage> {
        load_json::<ProgressRecord>(store, keys::PROGRESS)
            .unwrap()
            .map(|r| r.stage)
    }

    #[test]
    fn test_fresh_start_at_login() {
        let quest = controller(MemoryStore::new());
        assert_eq!(quest.current_stage(), Stage::Login);
        assert_eq!(quest.phase(), StagePhase::Playing);
        assert!(quest.game().is_none());
    }

    #[test]
    fn test_advance_only_forward() {
        let mut quest = controller(MemoryStore::new());
        assert!(quest.advance_to(Stage::Trivia));
        assert!(!quest.advance_to(Stage::Trivia));
        assert!(!quest.advance_to(Stage::Game));
        assert_eq!(quest.current_stage(), Stage::Trivia);
        assert_eq!(stored_stage(quest.store()), Some(Stage::Trivia));
    }

    #[test]
    fn test_reload_resumes_stage_and_user() {
        let mut quest = controller(MemoryStore::new());
        assert_eq!(quest.login("Sam", "forever"), Verdict::Accepted);
        assert!(quest.begin());
        assert_eq!(quest.current_stage(), Stage::Game);

        let store = quest.store().clone();
        let reloaded = controller(store);
        assert_eq!(reloaded.current_stage(), Stage::Game);
        assert_eq!(reloaded.user(), Some("Sam"));
        assert!(matches!(reloaded.game(), Some(ActiveGame::Snake(_))));
    }

    #[test]
    fn test_unknown_stored_stage_starts_over() {
        let mut store = MemoryStore::new();
        store
            .set(keys::PROGRESS, r#"{"stage":"bonus","user":"Sam"}"#)
            .unwrap();
        let quest = controller(store);
        assert_eq!(quest.current_stage(), Stage::Login);
        assert_eq!(quest.user(), None);
    }

    #[test]
    fn test_write_failure_is_not_fatal() {
        let mut store = MemoryStore::new();
        let mut quest = controller(store.clone());
        assert!(quest.advance_to(Stage::Welcome));
        store = quest.store().clone();

        store.set_reject_writes(true);
        let mut quest = controller(store);
        assert!(quest.advance_to(Stage::Game));
        assert_eq!(quest.current_stage(), Stage::Game);
        // A reload would restart from the last stage that made it to storage
        assert_eq!(stored_stage(quest.store()), Some(Stage::Welcome));
    }

    #[test]
    fn test_login_gate() {
        let mut quest = controller(MemoryStore::new());
        assert_eq!(quest.login("Sam", "never"), Verdict::Rejected);
        assert_eq!(quest.login("", "forever"), Verdict::Rejected);
        assert_eq!(quest.current_stage(), Stage::Login);
        assert_eq!(quest.login("Sam", " Forever "), Verdict::Accepted);
        assert_eq!(quest.current_stage(), Stage::Welcome);
        assert!(!quest.developer_mode());
        assert_eq!(quest.login("Sam", "forever"), Verdict::Ignored);
    }

    #[test]
    fn test_developer_nickname_flows_into_engines() {
        let mut quest = controller(MemoryStore::new());
        quest.login("dev", "forever");
        assert!(quest.developer_mode());
        quest.begin();
        match quest.game() {
            Some(ActiveGame::Snake(game)) => assert_eq!(game.state().target_score, 2),
            other => panic!("expected snake, got {:?}", other),
        }
    }

    #[test]
    fn test_snake_loss_lowers_target_on_retry() {
        let mut quest = controller(MemoryStore::new());
        quest.advance_to(Stage::Game);
        assert!(!quest.retry());

        // A length-1 snake cannot bite itself
        quest.on_round_end(RoundOutcome::Lost);
        assert_eq!(quest.phase(), StagePhase::Lost);
        assert!(quest.retry());
        assert_eq!(quest.phase(), StagePhase::Playing);
        match quest.game() {
            Some(ActiveGame::Snake(game)) => {
                assert_eq!(game.state().target_score, 8);
                assert_eq!(game.status(), SnakeStatus::Idle);
            }
            other => panic!("expected snake, got {:?}", other),
        }
    }

    #[test]
    fn test_catcher_timeout_is_a_loss() {
        let mut settings = QuestSettings::default();
        settings.catcher.duration_secs = 1;
        let mut quest = QuestController::load(settings, MemoryStore::new(), Box::new(NullSink), 5);
        quest.advance_to(Stage::CatchHearts);
        for _ in 0..8 {
            quest.update(0.25);
        }
        assert_eq!(quest.phase(), StagePhase::Lost);
        assert_eq!(quest.losses(), 1);
        assert!(quest.retry());
        match quest.game() {
            Some(ActiveGame::Catcher(game)) => assert_eq!(game.status(), CatcherStatus::Playing),
            other => panic!("expected catcher, got {:?}", other),
        }
    }

    #[test]
    fn test_success_is_handled_once() {
        let mut quest = controller(MemoryStore::new());
        quest.advance_to(Stage::Game);
        quest.on_round_end(RoundOutcome::Won);
        assert_eq!(quest.phase(), StagePhase::Reward);
        quest.on_round_end(RoundOutcome::Won);
        assert_eq!(quest.phase(), StagePhase::Reward);
        assert_eq!(quest.current_stage(), Stage::Game);
    }

    #[test]
    fn test_keyword_unlocks_next_stage() {
        let mut quest = controller(MemoryStore::new());
        quest.advance_to(Stage::Game);
        assert_eq!(quest.submit_keyword("lighthouse"), Verdict::Ignored);

        quest.on_round_end(RoundOutcome::Won);
        assert_eq!(quest.submit_keyword("lamp"), Verdict::Rejected);
        assert_eq!(quest.current_stage(), Stage::Game);
        assert_eq!(quest.submit_keyword("  LightHouse "), Verdict::Accepted);
        assert_eq!(quest.current_stage(), Stage::CatchHearts);
        assert_eq!(quest.phase(), StagePhase::Playing);
    }

    #[test]
    fn test_stage_without_keyword_advances_directly() {
        let mut quest = controller(MemoryStore::new());
        quest.advance_to(Stage::Puzzle);
        quest.on_round_end(RoundOutcome::Won);
        assert_eq!(quest.current_stage(), Stage::Revelation);
        assert_eq!(quest.phase(), StagePhase::Complete);
        assert!(quest.game().is_none());
    }

    #[test]
    fn test_trivia_needs_every_answer() {
        let sink = RecordingSink::default();
        let mut quest =
            QuestController::load(QuestSettings::default(), MemoryStore::new(), Box::new(sink), 1);
        quest.advance_to(Stage::Trivia);
        assert_eq!(quest.open_questions().len(), 3);

        assert_eq!(quest.submit_trivia(1, "   "), Verdict::Rejected);
        assert_eq!(quest.submit_trivia(1, "The harbour cafe"), Verdict::Accepted);
        assert_eq!(quest.submit_trivia(2, "tulip"), Verdict::Rejected);
        assert_eq!(quest.submit_trivia(2, "Roses"), Verdict::Accepted);
        assert_eq!(quest.submit_trivia(99, "?"), Verdict::Ignored);
        assert_eq!(quest.current_stage(), Stage::Trivia);

        assert_eq!(quest.submit_trivia(3, "Sail north"), Verdict::Accepted);
        assert_eq!(quest.current_stage(), Stage::MemoryGame);
        assert!(matches!(quest.game(), Some(ActiveGame::Memory(_))));
    }

    #[test]
    fn test_memory_retry_keeps_engine_counters() {
        let mut settings = QuestSettings::default();
        settings.memory.duration_secs = 1;
        let mut quest = QuestController::load(settings, MemoryStore::new(), Box::new(NullSink), 3);
        quest.advance_to(Stage::MemoryGame);

        for _ in 0..2 {
            quest.update(1.5);
            assert_eq!(quest.phase(), StagePhase::Lost);
            assert!(quest.retry());
        }
        match quest.game() {
            Some(ActiveGame::Memory(game)) => {
                assert_eq!(game.consecutive_losses(), 2);
                assert_eq!(game.state().pair_count, 6);
                assert_eq!(game.status(), MemoryStatus::Playing);
            }
            other => panic!("expected memory, got {:?}", other),
        }
    }

    #[test]
    fn test_input_for_other_engines_is_ignored() {
        let mut quest = controller(MemoryStore::new());
        quest.advance_to(Stage::Puzzle);
        let before = quest.snapshot().game.map(|g| serde_json::to_string(&g).unwrap());
        quest.steer_snake(Direction::Up);
        quest.flip_card(0);
        quest.move_catcher(10.0);
        let after = quest.snapshot().game.map(|g| serde_json::to_string(&g).unwrap());
        assert_eq!(before, after);
    }

    #[test]
    fn test_puzzle_win_records_moves() {
        let mut quest = controller(MemoryStore::new());
        quest.login("dev", "forever");
        quest.advance_to(Stage::Puzzle);
        let path = match quest.game() {
            Some(ActiveGame::Puzzle(game)) => {
                assert_eq!(game.state().size, 3);
                crate::sim::puzzle::solve(&game.state().tiles, 3, 40).unwrap()
            }
            other => panic!("expected puzzle, got {:?}", other),
        };
        for index in &path {
            quest.slide_tile(*index);
        }
        assert_eq!(quest.current_stage(), Stage::Revelation);
        assert_eq!(quest.bests().puzzle_best_moves, Some(path.len() as u32));
    }

    #[test]
    fn test_reset_progress_returns_to_login() {
        let mut quest = controller(MemoryStore::new());
        quest.login("Sam", "forever");
        quest.advance_to(Stage::Revelation);
        assert!(!quest.advance_to(Stage::Login));

        quest.reset_progress();
        assert_eq!(quest.current_stage(), Stage::Login);
        assert_eq!(quest.user(), None);
        assert_eq!(stored_stage(quest.store()), None);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut quest = controller(MemoryStore::new());
        quest.advance_to(Stage::CatchHearts);
        let json = serde_json::to_string(&quest.snapshot()).unwrap();
        assert!(json.contains(r#""stage":"catch-hearts""#));
        assert!(json.contains(r#""kind":"catcher""#));
    }
}
