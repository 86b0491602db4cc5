//! Sliding tile puzzle (15-puzzle and friends)
//!
//! Boards are flat row-major permutations of `0..n*n`. Index `i` holding value
//! `i` everywhere is the solved board; the largest value is the blank.
//!
//! Scrambling walks the blank randomly from the solved board, so every board
//! handed out is reachable (and so solvable). A walk that happens to end on the
//! solved board is simply walked again.

use std::collections::{HashMap, VecDeque};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::RoundOutcome;
use crate::consts::SCRAMBLE_MOVES;
use crate::settings::EngineConfig;

pub const MIN_SIZE: usize = 2;
pub const MAX_SIZE: usize = 8;
/// Grid edge used in developer mode
pub const DEVELOPER_SIZE: usize = 3;
/// BFS gives up after visiting this many boards
const SOLVE_NODE_LIMIT: usize = 400_000;

/// The value that marks the empty slot on an `n`x`n` board
#[inline]
pub fn blank_value(size: usize) -> u8 {
    (size * size - 1) as u8
}

pub fn solved(size: usize) -> Vec<u8> {
    (0..(size * size) as u8).collect()
}

/// True when every index holds its own value
pub fn is_solved(tiles: &[u8]) -> bool {
    tiles.iter().enumerate().all(|(i, &v)| i == v as usize)
}

/// Orthogonal neighbours of `index` inside the grid
pub fn neighbors(index: usize, size: usize) -> impl Iterator<Item = usize> {
    let (row, col) = (index / size, index % size);
    [
        (row > 0).then(|| index - size),
        (row + 1 < size).then(|| index + size),
        (col > 0).then(|| index - 1),
        (col + 1 < size).then(|| index + 1),
    ]
    .into_iter()
    .flatten()
}

/// Same row one column apart, or same column one row apart
pub fn is_adjacent(a: usize, b: usize, size: usize) -> bool {
    let (ra, ca) = (a / size, a % size);
    let (rb, cb) = (b / size, b % size);
    (ra == rb && ca.abs_diff(cb) == 1) || (ca == cb && ra.abs_diff(rb) == 1)
}

/// Scramble a solved board with `moves` random blank moves, never returning a solved board
pub fn generate<R: Rng + ?Sized>(size: usize, moves: u32, rng: &mut R) -> Vec<u8> {
    let size = size.clamp(MIN_SIZE, MAX_SIZE);
    let mut attempts = 0;
    loop {
        attempts += 1;
        let mut tiles = solved(size);
        let mut blank = tiles.len() - 1;
        for _ in 0..moves.max(1) {
            let options: Vec<usize> = neighbors(blank, size).collect();
            let next = options[rng.random_range(0..options.len())];
            tiles.swap(blank, next);
            blank = next;
        }
        if !is_solved(&tiles) {
            if attempts > 1 {
                log::debug!("Puzzle walk landed on solved board, took {attempts} walks");
            }
            return tiles;
        }
    }
}

/// Parity test: can `tiles` be brought back to the solved board by legal moves?
pub fn is_solvable(tiles: &[u8], size: usize) -> bool {
    if size == 0 || tiles.len() != size * size {
        return false;
    }
    let mut seen = vec![false; tiles.len()];
    for &v in tiles {
        match seen.get_mut(v as usize) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }

    let blank = blank_value(size);
    let values: Vec<u8> = tiles.iter().copied().filter(|&v| v != blank).collect();
    let inversions = values
        .iter()
        .enumerate()
        .map(|(i, &a)| values[i + 1..].iter().filter(|&&b| b < a).count())
        .sum::<usize>();

    if size % 2 == 1 {
        inversions % 2 == 0
    } else {
        let Some(blank_row) = tiles.iter().position(|&v| v == blank).map(|i| i / size) else {
            return false;
        };
        (inversions + blank_row) % 2 == (size - 1) % 2
    }
}

/// Shortest sequence of tile indices to move to solve the board, via BFS.
/// `None` if nothing is found within `max_depth` moves or the search budget.
pub fn solve(tiles: &[u8], size: usize, max_depth: usize) -> Option<Vec<usize>> {
    if is_solved(tiles) {
        return Some(Vec::new());
    }
    if !is_solvable(tiles, size) {
        return None;
    }

    let blank = blank_value(size);
    // board -> (parent board, tile index moved to reach it)
    let mut parents: HashMap<Vec<u8>, Option<(Vec<u8>, usize)>> = HashMap::new();
    let mut queue = VecDeque::new();
    parents.insert(tiles.to_vec(), None);
    queue.push_back((tiles.to_vec(), 0usize));

    while let Some((board, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        let blank_at = board.iter().position(|&v| v == blank)?;
        for tile in neighbors(blank_at, size) {
            let mut next = board.clone();
            next.swap(blank_at, tile);
            if parents.contains_key(&next) {
                continue;
            }
            parents.insert(next.clone(), Some((board.clone(), tile)));

            if is_solved(&next) {
                let mut path = Vec::new();
                let mut cursor = next;
                while let Some(Some((parent, tile))) = parents.get(&cursor) {
                    path.push(*tile);
                    cursor = parent.clone();
                }
                path.reverse();
                return Some(path);
            }
            if parents.len() >= SOLVE_NODE_LIMIT {
                log::debug!("Puzzle solve gave up after {} boards", parents.len());
                return None;
            }
            queue.push_back((next, depth + 1));
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PuzzleStatus {
    #[default]
    Playing,
    Won,
}

/// Snapshot of a puzzle round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleState {
    pub tiles: Vec<u8>,
    pub size: usize,
    pub moves: u32,
    pub status: PuzzleStatus,
}

impl PuzzleState {
    pub fn blank_index(&self) -> usize {
        let blank = blank_value(self.size);
        self.tiles
            .iter()
            .position(|&v| v == blank)
            .unwrap_or(self.tiles.len() - 1)
    }
}

/// Puzzle engine
#[derive(Debug, Clone)]
pub struct PuzzleGame {
    state: PuzzleState,
    rng: Pcg32,
    config: EngineConfig,
}

impl PuzzleGame {
    pub fn new(config: EngineConfig, size: usize) -> Self {
        let mut game = Self {
            state: PuzzleState {
                tiles: Vec::new(),
                size,
                moves: 0,
                status: PuzzleStatus::Playing,
            },
            rng: Pcg32::seed_from_u64(config.seed),
            config,
        };
        game.reset(size);
        game
    }

    /// Deal a fresh scrambled board
    pub fn reset(&mut self, size: usize) {
        let size = if self.config.developer_mode {
            size.min(DEVELOPER_SIZE)
        } else {
            size
        }
        .clamp(MIN_SIZE, MAX_SIZE);

        self.state = PuzzleState {
            tiles: generate(size, SCRAMBLE_MOVES, &mut self.rng),
            size,
            moves: 0,
            status: PuzzleStatus::Playing,
        };
        log::debug!("Puzzle reset: {}x{}", size, size);
    }

    pub fn state(&self) -> &PuzzleState {
        &self.state
    }

    pub fn status(&self) -> PuzzleStatus {
        self.state.status
    }

    /// Slide the tile at `index` into the blank if they touch; anything else is ignored
    pub fn move_tile(&mut self, index: usize) -> Option<RoundOutcome> {
        if self.state.status != PuzzleStatus::Playing || index >= self.state.tiles.len() {
            return None;
        }
        let blank = self.state.blank_index();
        if !is_adjacent(index, blank, self.state.size) {
            return None;
        }

        self.state.tiles.swap(index, blank);
        self.state.moves += 1;

        if is_solved(&self.state.tiles) {
            self.state.status = PuzzleStatus::Won;
            log::info!("Puzzle solved in {} moves", self.state.moves);
            return Some(RoundOutcome::Won);
        }
        None
    }

    /// Next tile to move on a shortest path, if one is found within `max_depth`
    pub fn hint(&self, max_depth: usize) -> Option<usize> {
        solve(&self.state.tiles, self.state.size, max_depth)?
            .first()
            .copied()
    }
}
