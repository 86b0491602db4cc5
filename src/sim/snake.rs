//! Grid snake engine
//!
//! The board wraps on both axes: leaving one edge re-enters on the opposite
//! edge. The only way to lose is running into your own body.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::RoundOutcome;
use super::clock::FixedStep;
use crate::GridPosition;
use crate::consts::SNAKE_TICK;
use crate::settings::EngineConfig;

/// Smallest and largest supported board edge
pub const MIN_GRID: i32 = 2;
pub const MAX_GRID: i32 = 64;

/// Rejection-sampling attempts before food placement falls back to a free-cell scan
const FOOD_ATTEMPTS: u32 = 64;

/// Heading of the snake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit vector `(dx, dy)`; y grows downward
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "up" | "arrowup" | "w" => Some(Direction::Up),
            "down" | "arrowdown" | "s" => Some(Direction::Down),
            "left" | "arrowleft" | "a" => Some(Direction::Left),
            "right" | "arrowright" | "d" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Round status shared by the timed engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SnakeStatus {
    /// Board laid out, waiting for the first input
    #[default]
    Idle,
    Playing,
    Won,
    Lost,
}

/// Snapshot of a snake round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnakeState {
    /// Segments, head first
    pub body: VecDeque<GridPosition>,
    pub direction: Direction,
    pub food: GridPosition,
    pub score: u32,
    pub target_score: u32,
    pub grid_size: i32,
    pub status: SnakeStatus,
}

impl SnakeState {
    pub fn head(&self) -> GridPosition {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }
}

/// Snake engine; owns its board, RNG and tick clock
#[derive(Debug, Clone)]
pub struct SnakeGame {
    state: SnakeState,
    /// Direction to apply on the next tick
    pending: Option<Direction>,
    clock: FixedStep,
    rng: Pcg32,
    config: EngineConfig,
}

impl SnakeGame {
    /// New round using `config.goal` as the target score
    pub fn new(config: EngineConfig, grid_size: i32) -> Self {
        let mut game = Self {
            state: SnakeState {
                body: VecDeque::new(),
                direction: Direction::Right,
                food: GridPosition::new(0, 0),
                score: 0,
                target_score: 1,
                grid_size,
                status: SnakeStatus::Idle,
            },
            pending: None,
            clock: FixedStep::new(SNAKE_TICK),
            rng: Pcg32::seed_from_u64(config.seed),
            config,
        };
        game.reset(config.goal, grid_size);
        game
    }

    /// Lay out a fresh board. Developer mode scales the target down.
    pub fn reset(&mut self, target_score: u32, grid_size: i32) {
        let grid_size = grid_size.clamp(MIN_GRID, MAX_GRID);
        let center = GridPosition::new(grid_size / 2, grid_size / 2);

        self.state = SnakeState {
            body: VecDeque::from([center]),
            direction: Direction::Right,
            food: center,
            score: 0,
            target_score: self.config.scale_goal(target_score),
            grid_size,
            status: SnakeStatus::Idle,
        };
        self.pending = None;
        self.clock.reset();
        self.place_food();

        log::debug!(
            "Snake reset: target {} on {}x{}",
            self.state.target_score,
            grid_size,
            grid_size
        );
    }

    pub fn state(&self) -> &SnakeState {
        &self.state
    }

    pub fn status(&self) -> SnakeStatus {
        self.state.status
    }

    /// Begin ticking (idle -> playing)
    pub fn start(&mut self) {
        if self.state.status == SnakeStatus::Idle {
            self.state.status = SnakeStatus::Playing;
            self.clock.reset();
        }
    }

    /// Buffer a heading for the next tick. Reversing onto the neck is ignored.
    /// The first accepted input also starts an idle round.
    pub fn set_direction(&mut self, direction: Direction) {
        match self.state.status {
            SnakeStatus::Won | SnakeStatus::Lost => return,
            SnakeStatus::Idle | SnakeStatus::Playing => {}
        }
        if direction == self.state.direction.opposite() {
            return;
        }
        self.pending = Some(direction);
        self.start();
    }

    /// Feed host frame time; ticks on the fixed period while playing
    pub fn advance(&mut self, dt: f32) -> Option<RoundOutcome> {
        if self.state.status != SnakeStatus::Playing {
            return None;
        }
        let steps = self.clock.advance(dt);
        for _ in 0..steps {
            if let Some(outcome) = self.tick() {
                return Some(outcome);
            }
        }
        None
    }

    /// One discrete step. Returns the outcome on the tick the round ends.
    pub fn tick(&mut self) -> Option<RoundOutcome> {
        if self.state.status != SnakeStatus::Playing {
            return None;
        }

        if let Some(direction) = self.pending.take() {
            if direction != self.state.direction.opposite() {
                self.state.direction = direction;
            }
        }

        let (dx, dy) = self.state.direction.delta();
        let head = self.state.head().wrapped(dx, dy, self.state.grid_size);

        if self.state.body.contains(&head) {
            self.state.status = SnakeStatus::Lost;
            log::info!("Snake crashed with score {}", self.state.score);
            return Some(RoundOutcome::Lost);
        }

        self.state.body.push_front(head);

        if head == self.state.food {
            self.state.score += 1;
            if self.state.score >= self.state.target_score {
                self.state.status = SnakeStatus::Won;
                log::info!("Snake reached target {}", self.state.target_score);
                return Some(RoundOutcome::Won);
            }
            if !self.place_food() {
                // Nowhere left to put food: the board is full
                self.state.status = SnakeStatus::Won;
                return Some(RoundOutcome::Won);
            }
        } else {
            self.state.body.pop_back();
        }

        None
    }

    /// Put food on a random cell not covered by the body. False if the body fills the grid.
    fn place_food(&mut self) -> bool {
        let size = self.state.grid_size;
        if self.state.body.len() >= (size * size) as usize {
            return false;
        }

        for _ in 0..FOOD_ATTEMPTS {
            let cell = GridPosition::new(
                self.rng.random_range(0..size),
                self.rng.random_range(0..size),
            );
            if !self.state.body.contains(&cell) {
                self.state.food = cell;
                return true;
            }
        }

        // Crowded board: pick uniformly among the free cells
        let free: Vec<GridPosition> = (0..size)
            .flat_map(|y| (0..size).map(move |x| GridPosition::new(x, y)))
            .filter(|cell| !self.state.body.contains(cell))
            .collect();
        let pick = self.rng.random_range(0..free.len());
        self.state.food = free[pick];
        true
    }

    #[cfg(test)]
    pub(crate) fn force_body(&mut self, body: &[GridPosition], direction: Direction) {
        self.state.body = body.iter().copied().collect();
        self.state.direction = direction;
    }

    #[cfg(test)]
    pub(crate) fn force_food(&mut self, food: GridPosition) {
        self.state.food = food;
    }
}
