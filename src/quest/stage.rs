//! Quest stages and the durable progress record

use serde::{Deserialize, Serialize};

/// One step of the quest, in play order. Ordering is progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    #[default]
    Login,
    Welcome,
    /// Snake
    Game,
    CatchHearts,
    Trivia,
    MemoryGame,
    Puzzle,
    Revelation,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::Login,
        Stage::Welcome,
        Stage::Game,
        Stage::CatchHearts,
        Stage::Trivia,
        Stage::MemoryGame,
        Stage::Puzzle,
        Stage::Revelation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Login => "login",
            Stage::Welcome => "welcome",
            Stage::Game => "game",
            Stage::CatchHearts => "catch-hearts",
            Stage::Trivia => "trivia",
            Stage::MemoryGame => "memory-game",
            Stage::Puzzle => "puzzle",
            Stage::Revelation => "revelation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.as_str() == s)
    }

    /// Position in play order
    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    /// The stage after this one, `None` at the end
    pub fn next(&self) -> Option<Self> {
        Self::ALL.get(self.ordinal() + 1).copied()
    }

    pub fn is_terminal(&self) -> bool {
        *self == Stage::Revelation
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What survives a reload
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub stage: Stage,
    pub user: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_matches_play_order() {
        for pair in Stage::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
        assert_eq!(Stage::Revelation.next(), None);
    }

    #[test]
    fn test_str_round_trip() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_str(stage.as_str()), Some(stage));
        }
        assert_eq!(Stage::from_str("bonus"), None);
    }

    #[test]
    fn test_serde_uses_kebab_case() {
        let json = serde_json::to_string(&Stage::CatchHearts).unwrap();
        assert_eq!(json, "\"catch-hearts\"");
        let record: ProgressRecord =
            serde_json::from_str(r#"{"stage":"memory-game","user":"Sam"}"#).unwrap();
        assert_eq!(record.stage, Stage::MemoryGame);
        assert_eq!(record.user.as_deref(), Some("Sam"));
    }

    #[test]
    fn test_unknown_stage_fails_to_parse() {
        assert!(serde_json::from_str::<ProgressRecord>(r#"{"stage":"bonus","user":null}"#).is_err());
    }
}
