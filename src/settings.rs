//! Quest configuration and difficulty tuning
//!
//! Persisted separately from progress in LocalStorage. Every field has a
//! default, so a partial JSON document only overrides what it names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persistence::{KeyValueStore, keys, load_json};
use crate::quest::Stage;

/// Developer mode divides goals by this (never below 1)
pub const DEVELOPER_DIVISOR: u32 = 5;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Construction parameters handed to every engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Target score, or pair count for the memory game
    pub goal: u32,
    pub duration_secs: u32,
    /// Shrinks difficulty constants; game rules are unchanged
    pub developer_mode: bool,
    pub seed: u64,
}

impl EngineConfig {
    pub fn new(goal: u32, duration_secs: u32, seed: u64) -> Self {
        Self {
            goal,
            duration_secs,
            developer_mode: false,
            seed,
        }
    }

    pub fn developer(mut self, on: bool) -> Self {
        self.developer_mode = on;
        self
    }

    /// Goal after developer scaling
    pub fn scale_goal(&self, goal: u32) -> u32 {
        if self.developer_mode {
            (goal / DEVELOPER_DIVISOR).max(1)
        } else {
            goal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeTuning {
    pub target_score: u32,
    pub grid_size: i32,
    /// Target drop per lost round
    pub loss_step: u32,
    /// Target never drops below this
    pub min_target: u32,
}

impl Default for SnakeTuning {
    fn default() -> Self {
        Self {
            target_score: 10,
            grid_size: 20,
            loss_step: 2,
            min_target: 4,
        }
    }
}

impl SnakeTuning {
    /// Target for the next attempt after `losses` failed rounds
    pub fn target_after(&self, losses: u32) -> u32 {
        let floor = self.min_target.min(self.target_score);
        self.target_score
            .saturating_sub(losses.saturating_mul(self.loss_step))
            .max(floor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatcherTuning {
    pub target_score: u32,
    pub duration_secs: u32,
}

impl Default for CatcherTuning {
    fn default() -> Self {
        Self {
            target_score: 100,
            duration_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryTuning {
    pub pair_count: u32,
    pub duration_secs: u32,
}

impl Default for MemoryTuning {
    fn default() -> Self {
        Self {
            pair_count: 8,
            duration_secs: 90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleTuning {
    pub size: usize,
}

impl Default for PuzzleTuning {
    fn default() -> Self {
        Self { size: 4 }
    }
}

/// A trivia question; an empty `accepted` list means any non-empty answer is fine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriviaQuestion {
    pub id: u32,
    pub question: String,
    #[serde(default)]
    pub accepted: Vec<String>,
}

/// Complete quest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestSettings {
    pub snake: SnakeTuning,
    pub catcher: CatcherTuning,
    pub memory: MemoryTuning,
    pub puzzle: PuzzleTuning,

    // === Identity ===
    /// Nicknames that turn on developer mode
    pub developer_nicknames: Vec<String>,
    /// Accepted answers for the login's secret field
    pub login_answers: Vec<String>,

    // === Rewards ===
    /// Keyword unlocking the next stage after a stage is won
    pub keywords: BTreeMap<Stage, String>,
    pub trivia: Vec<TriviaQuestion>,
}

impl Default for QuestSettings {
    fn default() -> Self {
        Self {
            snake: SnakeTuning::default(),
            catcher: CatcherTuning::default(),
            memory: MemoryTuning::default(),
            puzzle: PuzzleTuning::default(),

            developer_nicknames: vec!["dev".to_string()],
            login_answers: vec!["forever".to_string()],

            keywords: BTreeMap::from([
                (Stage::Game, "lighthouse".to_string()),
                (Stage::CatchHearts, "compass".to_string()),
                (Stage::MemoryGame, "harbor".to_string()),
            ]),
            trivia: vec![
                TriviaQuestion {
                    id: 1,
                    question: "Where did we first meet?".to_string(),
                    accepted: Vec::new(),
                },
                TriviaQuestion {
                    id: 2,
                    question: "What is my favourite flower?".to_string(),
                    accepted: vec!["rose".to_string(), "roses".to_string()],
                },
                TriviaQuestion {
                    id: 3,
                    question: "What should we do next summer?".to_string(),
                    accepted: Vec::new(),
                },
            ],
        }
    }
}

impl QuestSettings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from storage, falling back to defaults
    pub fn load(store: &impl KeyValueStore) -> Self {
        match load_json::<Self>(store, keys::SETTINGS) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings from storage");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Stored settings unreadable ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Whether `nickname` unlocks developer mode
    pub fn is_developer(&self, nickname: &str) -> bool {
        let nickname = nickname.trim();
        self.developer_nicknames
            .iter()
            .any(|n| n.eq_ignore_ascii_case(nickname))
    }

    pub fn keyword_for(&self, stage: Stage) -> Option<&str> {
        self.keywords.get(&stage).map(String::as_str)
    }
}
