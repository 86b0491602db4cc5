//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Host-fed time only (no wall clock, no host timers)
//! - Seeded RNG only
//! - Each engine owns its state; nothing is shared between engines

pub mod catcher;
pub mod clock;
pub mod memory;
pub mod puzzle;
pub mod shuffle;
pub mod snake;

pub use catcher::{CatcherGame, CatcherState, CatcherStatus, FallingItem, ItemKind};
pub use clock::{FixedStep, Timeline};
pub use memory::{CardSymbol, MemoryCard, MemoryGame, MemoryState, MemoryStatus};
pub use puzzle::{PuzzleGame, PuzzleState, PuzzleStatus};
pub use shuffle::shuffle;
pub use snake::{Direction, SnakeGame, SnakeState, SnakeStatus};

use serde::{Deserialize, Serialize};

/// How a round ended; reported once, on the step that ends it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Won,
    Lost,
}
