//! The single live engine slot
//!
//! The controller holds at most one `ActiveGame`. Mounting the next stage
//! replaces (drops) the previous engine together with its clock and pending
//! effects, so nothing from an old stage can fire into a new one.

use serde::Serialize;

use crate::sim::{
    CatcherGame, CatcherState, MemoryGame, MemoryState, PuzzleGame, PuzzleState, RoundOutcome,
    SnakeGame, SnakeState,
};

#[derive(Debug, Clone)]
pub enum ActiveGame {
    Snake(SnakeGame),
    Catcher(CatcherGame),
    Memory(MemoryGame),
    Puzzle(PuzzleGame),
}

impl ActiveGame {
    /// Drive the engine's clock; the puzzle is purely input-driven
    pub fn update(&mut self, dt: f32) -> Option<RoundOutcome> {
        match self {
            ActiveGame::Snake(game) => game.advance(dt),
            ActiveGame::Catcher(game) => game.update(dt),
            ActiveGame::Memory(game) => game.update(dt),
            ActiveGame::Puzzle(_) => None,
        }
    }

    pub fn view(&self) -> GameView<'_> {
        match self {
            ActiveGame::Snake(game) => GameView::Snake(game.state()),
            ActiveGame::Catcher(game) => GameView::Catcher(game.state()),
            ActiveGame::Memory(game) => GameView::Memory(game.state()),
            ActiveGame::Puzzle(game) => GameView::Puzzle(game.state()),
        }
    }
}

/// Borrowed engine snapshot for the UI
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "kind", content = "state", rename_all = "kebab-case")]
pub enum GameView<'a> {
    Snake(&'a SnakeState),
    Catcher(&'a CatcherState),
    Memory(&'a MemoryState),
    Puzzle(&'a PuzzleState),
}
