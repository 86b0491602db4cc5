//! Scripted players for every stage
//!
//! Used by the native demo binary to play the quest headlessly, and by tests
//! that need a full run. Bots only read what a player could see (memory
//! symbols are remembered once a card has been face up).

use std::collections::HashMap;

use crate::consts::PADDLE_TOP;
use crate::persistence::KeyValueStore;
use crate::quest::{ActiveGame, QuestController, Stage, StagePhase};
use crate::sim::puzzle::solve;
use crate::sim::{CardSymbol, CatcherState, Direction, MemoryState, PuzzleState, SnakeState};

/// Puzzle plans longer than this are not searched for
pub const PUZZLE_SEARCH_DEPTH: usize = 40;

const DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

/// Greedy snake: the safe direction that gets closest to the food
pub fn snake_move(state: &SnakeState) -> Option<Direction> {
    let head = state.head();
    let size = state.grid_size;
    let wrapped_gap = |a: i32, b: i32| {
        let d = (a - b).abs();
        d.min(size - d)
    };

    DIRECTIONS
        .into_iter()
        .filter(|&d| d != state.direction.opposite())
        .filter_map(|d| {
            let (dx, dy) = d.delta();
            let next = head.wrapped(dx, dy, size);
            if state.body.contains(&next) {
                return None;
            }
            let distance = wrapped_gap(next.x, state.food.x) + wrapped_gap(next.y, state.food.y);
            // Prefer keeping the current heading on ties
            let turn = (d != state.direction) as i32;
            Some((distance * 2 + turn, d))
        })
        .min_by_key(|&(score, _)| score)
        .map(|(_, d)| d)
}

/// Paddle x for the catcher: under the lowest good item still above the paddle
pub fn catcher_target(state: &CatcherState) -> Option<f32> {
    state
        .items
        .iter()
        .filter(|item| !item.kind.is_negative() && item.pos.y < PADDLE_TOP)
        .max_by(|a, b| {
            a.pos
                .y
                .partial_cmp(&b.pos.y)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|item| item.pos.x)
}

/// Memory player with perfect recall of every card it has seen
#[derive(Debug, Clone, Default)]
pub struct MemoryBot {
    seen: HashMap<usize, CardSymbol>,
}

impl MemoryBot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything remembered (new deck)
    pub fn forget(&mut self) {
        self.seen.clear();
    }

    /// Card to flip next, if the board accepts a flip now
    pub fn next_flip(&mut self, state: &MemoryState) -> Option<usize> {
        for (i, card) in state.cards.iter().enumerate() {
            if card.is_flipped {
                self.seen.insert(i, card.symbol);
            }
        }
        if state.checking {
            return None;
        }

        let hidden = |i: &usize| !state.cards[*i].is_flipped && !state.cards[*i].is_matched;
        let face_up: Vec<usize> = (0..state.cards.len())
            .filter(|&i| state.cards[i].is_flipped && !state.cards[i].is_matched)
            .collect();

        let known_partner = |symbol: CardSymbol, except: Option<usize>| {
            self.seen
                .iter()
                .filter(|&(i, s)| *s == symbol && Some(*i) != except && hidden(i))
                .map(|(i, _)| *i)
                .min()
        };

        if let Some(&open) = face_up.first() {
            let symbol = state.cards[open].symbol;
            if let Some(partner) = known_partner(symbol, Some(open)) {
                return Some(partner);
            }
        } else {
            // A known pair waiting to be collected
            let mut known: Vec<(usize, CardSymbol)> = self
                .seen
                .iter()
                .filter(|&(i, _)| hidden(i))
                .map(|(i, s)| (*i, *s))
                .collect();
            known.sort_by_key(|&(i, _)| i);
            for &(i, symbol) in &known {
                if known_partner(symbol, Some(i)).is_some() {
                    return Some(i);
                }
            }
        }

        (0..state.cards.len())
            .find(|i| hidden(i) && !self.seen.contains_key(i))
            .or_else(|| (0..state.cards.len()).find(|i| hidden(i)))
    }
}

/// Tile indices that solve the board, if a short enough plan exists
pub fn puzzle_plan(state: &PuzzleState) -> Option<Vec<usize>> {
    solve(&state.tiles, state.size, PUZZLE_SEARCH_DEPTH)
}

/// Drives a whole quest, one host frame at a time
#[derive(Debug, Clone)]
pub struct Autopilot {
    nickname: String,
    memory: MemoryBot,
    /// Remaining puzzle moves, front first
    puzzle: Vec<usize>,
}

impl Autopilot {
    pub fn new(nickname: &str) -> Self {
        Self {
            nickname: nickname.to_string(),
            memory: MemoryBot::new(),
            puzzle: Vec::new(),
        }
    }

    /// Play one frame; returns false once nothing more can be done
    pub fn step<S: KeyValueStore>(&mut self, quest: &mut QuestController<S>, dt: f32) -> bool {
        match quest.phase() {
            StagePhase::Complete => return false,
            StagePhase::Lost => {
                self.memory.forget();
                self.puzzle.clear();
                return quest.retry();
            }
            StagePhase::Reward => {
                let keyword = quest
                    .settings()
                    .keyword_for(quest.current_stage())
                    .map(str::to_string);
                return keyword.is_some_and(|k| quest.submit_keyword(&k).is_accepted());
            }
            StagePhase::Playing => {}
        }

        match quest.current_stage() {
            Stage::Login => {
                let Some(secret) = quest.settings().login_answers.first().cloned() else {
                    return false;
                };
                quest.login(&self.nickname, &secret).is_accepted()
            }
            Stage::Welcome => quest.begin(),
            Stage::Trivia => {
                let answers: Vec<(u32, String)> = quest
                    .open_questions()
                    .iter()
                    .map(|q| {
                        let answer = q.accepted.first().cloned();
                        (q.id, answer.unwrap_or_else(|| "yes".to_string()))
                    })
                    .collect();
                for (id, answer) in answers {
                    quest.submit_trivia(id, &answer);
                }
                true
            }
            Stage::Revelation => false,
            Stage::Game | Stage::CatchHearts | Stage::MemoryGame | Stage::Puzzle => {
                self.play_engine(quest, dt)
            }
        }
    }

    fn play_engine<S: KeyValueStore>(&mut self, quest: &mut QuestController<S>, dt: f32) -> bool {
        enum Input {
            Steer(Direction),
            Paddle(f32),
            Flip(usize),
            Slide(usize),
            Wait,
        }

        let input = match quest.game() {
            Some(ActiveGame::Snake(game)) => {
                snake_move(game.state()).map_or(Input::Wait, Input::Steer)
            }
            Some(ActiveGame::Catcher(game)) => {
                catcher_target(game.state()).map_or(Input::Wait, Input::Paddle)
            }
            Some(ActiveGame::Memory(game)) => self
                .memory
                .next_flip(game.state())
                .map_or(Input::Wait, Input::Flip),
            Some(ActiveGame::Puzzle(game)) => {
                if self.puzzle.is_empty() {
                    match puzzle_plan(game.state()) {
                        Some(plan) => {
                            log::info!("Autopilot found a {}-move puzzle plan", plan.len());
                            self.puzzle = plan;
                        }
                        None => {
                            log::warn!("Autopilot cannot plan this puzzle");
                            return false;
                        }
                    }
                }
                if self.puzzle.is_empty() {
                    Input::Wait
                } else {
                    Input::Slide(self.puzzle.remove(0))
                }
            }
            None => return false,
        };

        match input {
            Input::Steer(direction) => quest.steer_snake(direction),
            Input::Paddle(x) => quest.move_catcher(x),
            Input::Flip(index) => quest.flip_card(index),
            Input::Slide(index) => quest.slide_tile(index),
            Input::Wait => {}
        }
        quest.update(dt);
        true
    }
}

/// Play from wherever the quest stands until it ends or `max_secs` of game
/// time have passed. Returns the stage reached.
pub fn play_through<S: KeyValueStore>(
    quest: &mut QuestController<S>,
    nickname: &str,
    max_secs: f32,
) -> Stage {
    const DT: f32 = 1.0 / 60.0;
    let mut pilot = Autopilot::new(nickname);
    let mut elapsed = 0.0;
    let mut stage = quest.current_stage();

    while elapsed < max_secs {
        if !pilot.step(quest, DT) {
            break;
        }
        if quest.current_stage() != stage {
            stage = quest.current_stage();
            pilot.memory.forget();
            pilot.puzzle.clear();
            log::info!("Autopilot reached {} after {:.1}s", stage, elapsed);
        }
        elapsed += DT;
    }
    quest.current_stage()
}
