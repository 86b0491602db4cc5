//! Falling-item catcher engine
//!
//! Items rain down a fixed field and the player slides a paddle along the
//! bottom to catch them. Success feeds back into difficulty: the higher the
//! score, the faster items spawn, the faster they fall and the more of them
//! are bad.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::RoundOutcome;
use super::clock::FixedStep;
use crate::consts::*;
use crate::settings::EngineConfig;

/// Item types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Heart,
    Star,
    Gift,
    BrokenHeart,
    Storm,
}

/// Score-increasing kinds, drawn uniformly
const POSITIVE_POOL: [ItemKind; 4] = [
    ItemKind::Heart,
    ItemKind::Heart,
    ItemKind::Star,
    ItemKind::Gift,
];

/// Score-decreasing kinds, drawn uniformly
const NEGATIVE_POOL: [ItemKind; 2] = [ItemKind::BrokenHeart, ItemKind::Storm];

impl ItemKind {
    /// Score delta when caught
    pub const fn value(self) -> i32 {
        match self {
            ItemKind::Heart => 10,
            ItemKind::Star => 15,
            ItemKind::Gift => 20,
            ItemKind::BrokenHeart => -10,
            ItemKind::Storm => -20,
        }
    }

    pub const fn is_negative(self) -> bool {
        self.value() < 0
    }
}

/// A falling item entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallingItem {
    pub id: u32,
    /// Center of the item in field units (y grows downward)
    pub pos: Vec2,
    /// Units per physics frame
    pub speed: f32,
    pub kind: ItemKind,
    pub value: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CatcherStatus {
    #[default]
    Playing,
    Won,
    Lost,
}

/// Snapshot of a catcher round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatcherState {
    pub items: Vec<FallingItem>,
    pub score: u32,
    pub target_score: u32,
    /// Seconds left on the countdown
    pub time_left: f32,
    pub status: CatcherStatus,
    /// Horizontal center of the paddle
    pub catcher_x: f32,
    pub caught: u32,
    pub missed: u32,
}

/// Milliseconds between spawns at `score`; shrinks as the player scores, never below the floor
pub fn spawn_interval_ms(score: u32) -> f32 {
    (SPAWN_BASE_MS - score as f32 / 10.0).max(SPAWN_FLOOR_MS)
}

/// Probability that a spawned item comes from the negative pool
pub fn negative_chance(score: u32) -> f64 {
    (NEGATIVE_BASE + score as f64 / NEGATIVE_SCALE).min(NEGATIVE_CAP)
}

/// Catcher engine; owns its items, RNG and frame clock
#[derive(Debug, Clone)]
pub struct CatcherGame {
    state: CatcherState,
    clock: FixedStep,
    since_spawn_ms: f32,
    next_id: u32,
    rng: Pcg32,
    config: EngineConfig,
}

impl CatcherGame {
    /// New round using `config.goal` and `config.duration_secs`
    pub fn new(config: EngineConfig) -> Self {
        let mut game = Self {
            state: CatcherState {
                items: Vec::new(),
                score: 0,
                target_score: 1,
                time_left: 0.0,
                status: CatcherStatus::Playing,
                catcher_x: FIELD_WIDTH / 2.0,
                caught: 0,
                missed: 0,
            },
            clock: FixedStep::new(CATCHER_FRAME),
            since_spawn_ms: 0.0,
            next_id: 1,
            rng: Pcg32::seed_from_u64(config.seed),
            config,
        };
        game.reset(config.goal, config.duration_secs);
        game
    }

    /// Start a fresh round; the countdown begins immediately
    pub fn reset(&mut self, target_score: u32, duration_secs: u32) {
        self.state = CatcherState {
            items: Vec::new(),
            score: 0,
            target_score: self.config.scale_goal(target_score),
            time_left: duration_secs as f32,
            status: CatcherStatus::Playing,
            catcher_x: FIELD_WIDTH / 2.0,
            caught: 0,
            missed: 0,
        };
        self.clock.reset();
        self.since_spawn_ms = 0.0;
        log::debug!(
            "Catcher reset: target {} in {}s",
            self.state.target_score,
            duration_secs
        );
    }

    pub fn state(&self) -> &CatcherState {
        &self.state
    }

    pub fn status(&self) -> CatcherStatus {
        self.state.status
    }

    /// Place the paddle center at `x` (absolute, clamped to the field)
    pub fn set_catcher_position(&mut self, x: f32) {
        if !x.is_finite() {
            return;
        }
        let half = PADDLE_WIDTH / 2.0;
        self.state.catcher_x = x.clamp(half, FIELD_WIDTH - half);
    }

    /// Feed host frame time: runs physics frames, then the countdown
    pub fn update(&mut self, dt: f32) -> Option<RoundOutcome> {
        if self.state.status != CatcherStatus::Playing {
            return None;
        }

        let frames = self.clock.advance(dt);
        for _ in 0..frames {
            if let Some(outcome) = self.frame() {
                return Some(outcome);
            }
        }

        self.state.time_left -= dt.max(0.0);
        if self.state.time_left <= 0.0 {
            self.state.time_left = 0.0;
            self.state.status = CatcherStatus::Lost;
            log::info!(
                "Catcher timed out at {}/{}",
                self.state.score,
                self.state.target_score
            );
            return Some(RoundOutcome::Lost);
        }
        None
    }

    /// One physics frame: spawn, fall, catch, discard
    fn frame(&mut self) -> Option<RoundOutcome> {
        self.since_spawn_ms += CATCHER_FRAME * 1000.0;
        if self.since_spawn_ms > spawn_interval_ms(self.state.score) {
            self.spawn();
            self.since_spawn_ms = 0.0;
        }

        let half = PADDLE_WIDTH / 2.0;
        let catcher_x = self.state.catcher_x;
        let mut gained: Vec<i32> = Vec::new();
        let mut missed = 0;

        self.state.items.retain_mut(|item| {
            let prev_y = item.pos.y;
            item.pos.y += item.speed;

            // Swept test: a fast item may cross the whole band in one frame
            let crossed_band = prev_y <= PADDLE_BOTTOM && item.pos.y >= PADDLE_TOP;
            if crossed_band && (item.pos.x - catcher_x).abs() <= half {
                gained.push(item.value);
                return false;
            }
            if item.pos.y - ITEM_SIZE / 2.0 > FIELD_HEIGHT {
                missed += 1;
                return false;
            }
            true
        });

        self.state.missed += missed;
        for value in gained {
            self.state.caught += 1;
            self.state.score = (self.state.score as i64 + value as i64).max(0) as u32;
            if self.state.score >= self.state.target_score {
                self.state.status = CatcherStatus::Won;
                log::info!("Catcher reached target {}", self.state.target_score);
                return Some(RoundOutcome::Won);
            }
        }
        None
    }

    fn spawn(&mut self) {
        let score = self.state.score;
        let kind = if self.rng.random_bool(negative_chance(score)) {
            NEGATIVE_POOL[self.rng.random_range(0..NEGATIVE_POOL.len())]
        } else {
            POSITIVE_POOL[self.rng.random_range(0..POSITIVE_POOL.len())]
        };

        let half = ITEM_SIZE / 2.0;
        let x = self.rng.random_range(half..FIELD_WIDTH - half);
        let jitter = self.rng.random_range(0.0..ITEM_SPEED_JITTER);
        let speed = ITEM_SPEED_BASE + score as f32 / ITEM_SPEED_SCALE + jitter;

        let id = self.next_id;
        self.next_id += 1;
        self.state.items.push(FallingItem {
            id,
            pos: Vec2::new(x, -SPAWN_ABOVE),
            speed,
            kind,
            value: kind.value(),
        });
    }

    #[cfg(test)]
    pub(crate) fn inject(&mut self, kind: ItemKind, pos: Vec2, speed: f32) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.state.items.push(FallingItem {
            id,
            pos,
            speed,
            kind,
            value: kind.value(),
        });
        id
    }

    #[cfg(test)]
    pub(crate) fn clear_items(&mut self) {
        self.state.items.clear();
    }

    #[cfg(test)]
    pub(crate) fn set_score(&mut self, score: u32) {
        self.state.score = score;
    }
}
