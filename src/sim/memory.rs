//! Memory-match engine
//!
//! Classic pairs game on a countdown. Turning the second card locks the board
//! ("checking") until the pair settles: matches stay up, mismatches flip back
//! after a longer pause. Losing rounds back to back shrinks the deck until the
//! player wins again.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::RoundOutcome;
use super::clock::Timeline;
use super::shuffle::shuffle;
use crate::consts::{MATCH_SETTLE, MISMATCH_SETTLE};
use crate::settings::EngineConfig;

/// Consecutive losses before the deck shrinks
pub const LOSS_THRESHOLD: u32 = 2;
/// Pairs removed from the deck once the threshold is crossed
pub const PAIR_REDUCTION: usize = 2;
/// The deck never shrinks below this many pairs
pub const MIN_PAIRS: usize = 2;

/// Card faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardSymbol {
    Heart,
    Rose,
    Star,
    Moon,
    Sun,
    Key,
    Ring,
    Letter,
    Cake,
    Gift,
    Music,
    Clover,
}

impl CardSymbol {
    pub const ALL: [CardSymbol; 12] = [
        CardSymbol::Heart,
        CardSymbol::Rose,
        CardSymbol::Star,
        CardSymbol::Moon,
        CardSymbol::Sun,
        CardSymbol::Key,
        CardSymbol::Ring,
        CardSymbol::Letter,
        CardSymbol::Cake,
        CardSymbol::Gift,
        CardSymbol::Music,
        CardSymbol::Clover,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCard {
    pub id: u32,
    pub symbol: CardSymbol,
    pub is_flipped: bool,
    pub is_matched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MemoryStatus {
    #[default]
    Playing,
    Won,
    Lost,
}

/// Snapshot of a memory round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryState {
    pub cards: Vec<MemoryCard>,
    pub pair_count: usize,
    pub matched_pairs: usize,
    /// Completed two-card comparisons
    pub moves_count: u32,
    pub time_left: f32,
    pub duration: f32,
    /// Two cards are up and waiting to settle
    pub checking: bool,
    pub status: MemoryStatus,
}

impl MemoryState {
    /// Seconds spent so far this round
    pub fn elapsed(&self) -> f32 {
        self.duration - self.time_left
    }
}

/// Deferred resolution of a flipped pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Settle {
    Match(usize, usize),
    Mismatch(usize, usize),
}

/// Memory engine; the loss streak survives `reset`
#[derive(Debug, Clone)]
pub struct MemoryGame {
    state: MemoryState,
    /// Indices of face-up unmatched cards (at most two)
    face_up: Vec<usize>,
    timeline: Timeline<Settle>,
    base_pairs: usize,
    consecutive_losses: u32,
    rng: Pcg32,
    config: EngineConfig,
}

impl MemoryGame {
    /// New round using `config.goal` as the pair count
    pub fn new(config: EngineConfig) -> Self {
        let mut game = Self {
            state: MemoryState {
                cards: Vec::new(),
                pair_count: 0,
                matched_pairs: 0,
                moves_count: 0,
                time_left: 0.0,
                duration: 0.0,
                checking: false,
                status: MemoryStatus::Playing,
            },
            face_up: Vec::with_capacity(2),
            timeline: Timeline::new(),
            base_pairs: 0,
            consecutive_losses: 0,
            rng: Pcg32::seed_from_u64(config.seed),
            config,
        };
        game.reset(config.goal as usize, config.duration_secs);
        game
    }

    /// Deal a fresh deck. Pending settles from the previous round are invalidated.
    pub fn reset(&mut self, pair_count: usize, duration_secs: u32) {
        let requested = self.config.scale_goal(pair_count as u32) as usize;
        self.base_pairs = requested.clamp(1, CardSymbol::ALL.len());
        let pairs = self.effective_pairs();

        let mut symbols = CardSymbol::ALL;
        shuffle(&mut symbols, &mut self.rng);
        let mut deck: Vec<CardSymbol> = symbols[..pairs]
            .iter()
            .flat_map(|&symbol| [symbol, symbol])
            .collect();
        shuffle(&mut deck, &mut self.rng);

        self.timeline.invalidate();
        self.face_up.clear();
        self.state = MemoryState {
            cards: deck
                .into_iter()
                .enumerate()
                .map(|(id, symbol)| MemoryCard {
                    id: id as u32,
                    symbol,
                    is_flipped: false,
                    is_matched: false,
                })
                .collect(),
            pair_count: pairs,
            matched_pairs: 0,
            moves_count: 0,
            time_left: duration_secs as f32,
            duration: duration_secs as f32,
            checking: false,
            status: MemoryStatus::Playing,
        };

        log::debug!(
            "Memory reset: {} pairs in {}s (loss streak {})",
            pairs,
            duration_secs,
            self.consecutive_losses
        );
    }

    /// Pair count the next deal uses, after any loss-streak reduction
    fn effective_pairs(&self) -> usize {
        if self.consecutive_losses >= LOSS_THRESHOLD {
            self.base_pairs
                .saturating_sub(PAIR_REDUCTION)
                .max(MIN_PAIRS)
                .min(self.base_pairs)
        } else {
            self.base_pairs
        }
    }

    pub fn state(&self) -> &MemoryState {
        &self.state
    }

    pub fn status(&self) -> MemoryStatus {
        self.state.status
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses
    }

    /// Turn a card face up. Ignored while checking, on face-up or matched cards,
    /// out of range, or once the round is over.
    pub fn flip(&mut self, index: usize) {
        if self.state.status != MemoryStatus::Playing
            || self.state.checking
            || self.face_up.len() >= 2
        {
            return;
        }
        let Some(card) = self.state.cards.get_mut(index) else {
            return;
        };
        if card.is_flipped || card.is_matched {
            return;
        }

        card.is_flipped = true;
        self.face_up.push(index);

        if let [a, b] = self.face_up[..] {
            self.state.checking = true;
            self.state.moves_count += 1;
            if self.state.cards[a].symbol == self.state.cards[b].symbol {
                self.timeline.schedule(MATCH_SETTLE, Settle::Match(a, b));
            } else {
                self.timeline.schedule(MISMATCH_SETTLE, Settle::Mismatch(a, b));
            }
        }
    }

    /// Feed host frame time: settle due pairs, then run the countdown
    pub fn update(&mut self, dt: f32) -> Option<RoundOutcome> {
        if self.state.status != MemoryStatus::Playing {
            return None;
        }

        // Only settles due before the countdown expires can count
        let dt = dt.max(0.0);
        for settle in self.timeline.advance(dt.min(self.state.time_left)) {
            match settle {
                Settle::Match(a, b) => {
                    for i in [a, b] {
                        self.state.cards[i].is_matched = true;
                        self.state.cards[i].is_flipped = true;
                    }
                    self.state.matched_pairs += 1;
                }
                Settle::Mismatch(a, b) => {
                    for i in [a, b] {
                        self.state.cards[i].is_flipped = false;
                    }
                }
            }
            self.face_up.clear();
            self.state.checking = false;

            if self.state.matched_pairs == self.state.pair_count {
                self.state.status = MemoryStatus::Won;
                self.consecutive_losses = 0;
                log::info!(
                    "Memory cleared {} pairs in {} moves",
                    self.state.pair_count,
                    self.state.moves_count
                );
                return Some(RoundOutcome::Won);
            }
        }

        self.state.time_left -= dt;
        if self.state.time_left <= 0.0 {
            self.state.time_left = 0.0;
            self.state.status = MemoryStatus::Lost;
            self.timeline.invalidate();
            self.consecutive_losses += 1;
            log::info!(
                "Memory timed out with {}/{} pairs (loss streak {})",
                self.state.matched_pairs,
                self.state.pair_count,
                self.consecutive_losses
            );
            return Some(RoundOutcome::Lost);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn game(pairs: u32, secs: u32) -> MemoryGame {
        MemoryGame::new(EngineConfig::new(pairs, secs, 2024))
    }

    /// Index pairs holding the same symbol
    fn pairs_of(state: &MemoryState) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, card) in state.cards.iter().enumerate() {
            if let Some(j) = state.cards[i + 1..]
                .iter()
                .position(|c| c.symbol == card.symbol)
            {
                pairs.push((i, i + 1 + j));
            }
        }
        pairs
    }

    fn mismatched(state: &MemoryState) -> (usize, usize) {
        let j = state
            .cards
            .iter()
            .position(|c| c.symbol != state.cards[0].symbol)
            .unwrap();
        (0, j)
    }

    #[test]
    fn test_deck_has_each_symbol_twice() {
        let g = game(8, 60);
        assert_eq!(g.state().cards.len(), 16);
        assert_eq!(pairs_of(g.state()).len(), 8);
        assert!(g.state().cards.iter().all(|c| !c.is_flipped && !c.is_matched));
    }

    #[test]
    fn test_all_matches_wins() {
        let mut g = game(8, 60);
        let mut outcome = None;
        for (a, b) in pairs_of(g.state()) {
            g.flip(a);
            g.flip(b);
            outcome = g.update(MATCH_SETTLE);
        }
        assert_eq!(outcome, Some(RoundOutcome::Won));
        assert_eq!(g.status(), MemoryStatus::Won);
        assert_eq!(g.state().matched_pairs, 8);
        assert_eq!(g.state().moves_count, 8);
    }

    #[test]
    fn test_checking_lock_blocks_third_flip() {
        let mut g = game(4, 60);
        let (a, b) = mismatched(g.state());
        g.flip(a);
        g.flip(b);
        assert!(g.state().checking);

        let third = (0..8).find(|&i| i != a && i != b).unwrap();
        g.flip(third);
        assert!(!g.state().cards[third].is_flipped);
        assert_eq!(g.state().cards.iter().filter(|c| c.is_flipped).count(), 2);
    }

    #[test]
    fn test_mismatch_flips_back_after_longer_delay() {
        let mut g = game(4, 60);
        let (a, b) = mismatched(g.state());
        g.flip(a);
        g.flip(b);

        g.update(MATCH_SETTLE);
        assert!(g.state().checking);
        assert!(g.state().cards[a].is_flipped);

        g.update(MISMATCH_SETTLE);
        assert!(!g.state().checking);
        assert!(!g.state().cards[a].is_flipped);
        assert!(!g.state().cards[b].is_flipped);
        assert_eq!(g.state().moves_count, 1);
    }

    #[test]
    fn test_single_flip_is_not_a_move() {
        let mut g = game(4, 60);
        g.flip(0);
        g.flip(0);
        assert_eq!(g.state().moves_count, 0);
        assert!(!g.state().checking);
    }

    #[test]
    fn test_out_of_range_flip_ignored() {
        let mut g = game(4, 60);
        g.flip(999);
        assert!(g.state().cards.iter().all(|c| !c.is_flipped));
    }

    #[test]
    fn test_timeout_loses() {
        let mut g = game(4, 5);
        let mut outcome = None;
        for _ in 0..6 {
            outcome = outcome.or(g.update(1.0));
        }
        assert_eq!(outcome, Some(RoundOutcome::Lost));
        assert_eq!(g.state().time_left, 0.0);
        g.flip(0);
        assert!(!g.state().cards[0].is_flipped);
    }

    #[test]
    fn test_match_settling_after_expiry_loses() {
        let mut g = game(1, 1);
        assert_eq!(g.update(0.8), None);
        g.flip(0);
        g.flip(1);
        // Timer runs out 0.2s in; the match would only settle at 0.4s
        assert_eq!(g.update(0.5), Some(RoundOutcome::Lost));
        assert_eq!(g.status(), MemoryStatus::Lost);
        assert_eq!(g.state().matched_pairs, 0);
        assert_eq!(g.consecutive_losses(), 1);
    }

    #[test]
    fn test_match_settling_before_expiry_wins_in_long_frame() {
        let mut g = game(1, 1);
        assert_eq!(g.update(0.5), None);
        g.flip(0);
        g.flip(1);
        assert_eq!(g.update(2.0), Some(RoundOutcome::Won));
        assert_eq!(g.state().matched_pairs, 1);
    }

    #[test]
    fn test_reset_invalidates_pending_settle() {
        let mut g = game(4, 60);
        let (a, b) = mismatched(g.state());
        g.flip(a);
        g.flip(b);
        g.reset(4, 60);

        // Turn up one card of the new deal; the old mismatch must not flip it back
        g.flip(a);
        g.update(MISMATCH_SETTLE * 2.0);
        assert!(g.state().cards[a].is_flipped);
        assert!(!g.state().checking);
    }

    #[test]
    fn test_loss_streak_shrinks_deck_until_win() {
        let mut g = game(6, 1);
        for _ in 0..LOSS_THRESHOLD {
            g.update(2.0);
            assert_eq!(g.status(), MemoryStatus::Lost);
            g.reset(6, 1);
        }
        assert_eq!(g.state().pair_count, 4);

        // Another loss keeps it reduced
        g.update(2.0);
        g.reset(6, 60);
        assert_eq!(g.state().pair_count, 4);

        for (a, b) in pairs_of(g.state()) {
            g.flip(a);
            g.flip(b);
            g.update(MATCH_SETTLE);
        }
        assert_eq!(g.status(), MemoryStatus::Won);
        assert_eq!(g.consecutive_losses(), 0);

        g.reset(6, 60);
        assert_eq!(g.state().pair_count, 6);
    }

    #[test]
    fn test_reduction_never_below_min_pairs() {
        let mut g = game(3, 1);
        for _ in 0..3 {
            g.update(2.0);
            g.reset(3, 1);
        }
        assert_eq!(g.state().pair_count, MIN_PAIRS);
    }

    proptest! {
        #[test]
        fn prop_flip_invariants(
            seed in any::<u64>(),
            script in proptest::collection::vec((0usize..16, 0.0f32..0.8), 1..300),
        ) {
            let mut g = MemoryGame::new(EngineConfig::new(8, 120, seed));
            let mut comparisons = 0u32;
            for (index, dt) in script {
                let was_checking = g.state().checking;
                g.flip(index);
                if !was_checking && g.state().checking {
                    comparisons += 1;
                }

                let up = g.state().cards.iter().filter(|c| c.is_flipped && !c.is_matched).count();
                prop_assert!(up <= 2);
                if g.state().checking {
                    prop_assert_eq!(up, 2);
                }

                g.update(dt);
                prop_assert!(g.state().matched_pairs <= g.state().pair_count);
                prop_assert_eq!(g.state().moves_count, comparisons);
                if g.status() != MemoryStatus::Playing {
                    break;
                }
            }
        }
    }
}
