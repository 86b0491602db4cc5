//! Personal bests per mini-game
//!
//! Persisted to LocalStorage, one integer per key. Scores are better when
//! higher, times and move counts when lower.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, keys, load_json, save_json};

/// Which record a value competes for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    SnakeScore,
    CatcherScore,
    /// Seconds used to clear the memory board
    MemoryTime,
    PuzzleMoves,
}

impl Record {
    pub const ALL: [Record; 4] = [
        Record::SnakeScore,
        Record::CatcherScore,
        Record::MemoryTime,
        Record::PuzzleMoves,
    ];

    pub fn storage_key(&self) -> &'static str {
        match self {
            Record::SnakeScore => keys::SNAKE_HIGH_SCORE,
            Record::CatcherScore => keys::CATCHER_HIGH_SCORE,
            Record::MemoryTime => keys::MEMORY_BEST_TIME,
            Record::PuzzleMoves => keys::PUZZLE_BEST_MOVES,
        }
    }

    pub fn higher_is_better(&self) -> bool {
        matches!(self, Record::SnakeScore | Record::CatcherScore)
    }
}

/// Best value seen for each record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalBests {
    pub snake_high_score: Option<u32>,
    pub catcher_high_score: Option<u32>,
    pub memory_best_time: Option<u32>,
    pub puzzle_best_moves: Option<u32>,
}

impl PersonalBests {
    /// Create empty records
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best(&self, record: Record) -> Option<u32> {
        match record {
            Record::SnakeScore => self.snake_high_score,
            Record::CatcherScore => self.catcher_high_score,
            Record::MemoryTime => self.memory_best_time,
            Record::PuzzleMoves => self.puzzle_best_moves,
        }
    }

    fn slot(&mut self, record: Record) -> &mut Option<u32> {
        match record {
            Record::SnakeScore => &mut self.snake_high_score,
            Record::CatcherScore => &mut self.catcher_high_score,
            Record::MemoryTime => &mut self.memory_best_time,
            Record::PuzzleMoves => &mut self.puzzle_best_moves,
        }
    }

    /// Check if a value beats the current best
    pub fn qualifies(&self, record: Record, value: u32) -> bool {
        match self.best(record) {
            None => !record.higher_is_better() || value > 0,
            Some(best) if record.higher_is_better() => value > best,
            Some(best) => value < best,
        }
    }

    /// Record a value; returns true (and persists it) if it is a new best.
    /// A failed write keeps the best in memory for this session.
    pub fn submit(&mut self, record: Record, value: u32, store: &mut impl KeyValueStore) -> bool {
        if !self.qualifies(record, value) {
            return false;
        }
        *self.slot(record) = Some(value);

        match save_json(store, record.storage_key(), &value) {
            Ok(()) => log::info!("New personal best for {:?}: {}", record, value),
            Err(e) => log::warn!("Personal best for {:?} not saved: {}", record, e),
        }
        true
    }

    /// Load every record; missing or unreadable keys stay empty
    pub fn load(store: &impl KeyValueStore) -> Self {
        let mut bests = Self::new();
        for record in Record::ALL {
            match load_json::<u32>(store, record.storage_key()) {
                Ok(value) => *bests.slot(record) = value,
                Err(e) => log::warn!("Ignoring stored {:?}: {}", record, e),
            }
        }
        bests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_scores_prefer_higher() {
        let mut store = MemoryStore::new();
        let mut bests = PersonalBests::new();
        assert!(!bests.qualifies(Record::SnakeScore, 0));
        assert!(bests.submit(Record::SnakeScore, 5, &mut store));
        assert!(!bests.submit(Record::SnakeScore, 5, &mut store));
        assert!(!bests.submit(Record::SnakeScore, 3, &mut store));
        assert!(bests.submit(Record::SnakeScore, 8, &mut store));
        assert_eq!(bests.best(Record::SnakeScore), Some(8));
    }

    #[test]
    fn test_times_prefer_lower() {
        let mut store = MemoryStore::new();
        let mut bests = PersonalBests::new();
        assert!(bests.submit(Record::MemoryTime, 40, &mut store));
        assert!(!bests.submit(Record::MemoryTime, 45, &mut store));
        assert!(bests.submit(Record::MemoryTime, 31, &mut store));
        assert_eq!(bests.best(Record::MemoryTime), Some(31));
    }

    #[test]
    fn test_bests_survive_reload() {
        let mut store = MemoryStore::new();
        let mut bests = PersonalBests::new();
        bests.submit(Record::PuzzleMoves, 120, &mut store);
        bests.submit(Record::CatcherScore, 140, &mut store);

        let reloaded = PersonalBests::load(&store);
        assert_eq!(reloaded, bests);
    }

    #[test]
    fn test_corrupt_entry_is_ignored() {
        let mut store = MemoryStore::new();
        store.set(keys::SNAKE_HIGH_SCORE, "\"lots\"").unwrap();
        store.set(keys::MEMORY_BEST_TIME, "22").unwrap();
        let bests = PersonalBests::load(&store);
        assert_eq!(bests.snake_high_score, None);
        assert_eq!(bests.memory_best_time, Some(22));
    }

    #[test]
    fn test_failed_write_still_counts_in_session() {
        let mut store = MemoryStore::new();
        store.set_reject_writes(true);
        let mut bests = PersonalBests::new();
        assert!(bests.submit(Record::CatcherScore, 90, &mut store));
        assert_eq!(bests.best(Record::CatcherScore), Some(90));
        assert!(store.is_empty());
    }
}
