//! Gift Escape - a staged escape-room gift experience
//!
//! Core modules:
//! - `sim`: Deterministic mini-game engines (snake, catcher, memory, sliding puzzle)
//! - `quest`: Stage progression controller with one-way gating
//! - `persistence`: Key/value storage abstraction (LocalStorage on web)
//! - `highscores`: Per-game personal bests
//! - `settings`: Difficulty tuning and quest configuration
//! - `answers`: Answer-logging sink and free-text answer checks
//! - `autoplay`: Scripted players used by the native demo

pub mod answers;
pub mod autoplay;
pub mod highscores;
pub mod persistence;
pub mod quest;
pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use highscores::PersonalBests;
pub use quest::{QuestController, Stage, StagePhase, Verdict};
pub use settings::{EngineConfig, QuestSettings};

/// Game configuration constants
pub mod consts {
    /// Snake tick period (seconds)
    pub const SNAKE_TICK: f32 = 0.150;
    /// Catcher physics frame (60 Hz, items move `speed` units per frame)
    pub const CATCHER_FRAME: f32 = 1.0 / 60.0;
    /// Maximum substeps per host frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest host frame delta accepted (seconds); longer gaps are clamped
    pub const MAX_FRAME_DT: f32 = 0.25;

    /// Catcher field dimensions
    pub const FIELD_WIDTH: f32 = 400.0;
    pub const FIELD_HEIGHT: f32 = 600.0;
    /// Items spawn this far above the visible area
    pub const SPAWN_ABOVE: f32 = 30.0;
    pub const ITEM_SIZE: f32 = 30.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 90.0;
    pub const PADDLE_TOP: f32 = 540.0;
    pub const PADDLE_BOTTOM: f32 = 564.0;

    /// Spawn interval: `max(SPAWN_FLOOR_MS, SPAWN_BASE_MS - score / 10)`
    pub const SPAWN_BASE_MS: f32 = 500.0;
    pub const SPAWN_FLOOR_MS: f32 = 200.0;

    /// Negative item chance: `min(NEGATIVE_CAP, NEGATIVE_BASE + score / NEGATIVE_SCALE)`
    pub const NEGATIVE_BASE: f64 = 0.1;
    pub const NEGATIVE_SCALE: f64 = 400.0;
    pub const NEGATIVE_CAP: f64 = 0.4;

    /// Item speed (units per frame): `BASE + score / SCALE + jitter`
    pub const ITEM_SPEED_BASE: f32 = 2.0;
    pub const ITEM_SPEED_SCALE: f32 = 40.0;
    pub const ITEM_SPEED_JITTER: f32 = 1.5;

    /// Memory settle delays (seconds)
    pub const MATCH_SETTLE: f32 = 0.4;
    pub const MISMATCH_SETTLE: f32 = 1.0;

    /// Random blank moves used to scramble the sliding puzzle
    pub const SCRAMBLE_MOVES: u32 = 300;
}

/// A cell on a square game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset by `(dx, dy)`, wrapping both axes onto a `size`x`size` grid
    #[inline]
    pub fn wrapped(self, dx: i32, dy: i32, size: i32) -> Self {
        Self {
            x: (self.x + dx).rem_euclid(size),
            y: (self.y + dy).rem_euclid(size),
        }
    }
}
