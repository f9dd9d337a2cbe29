use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_DEPTH: u32 = 3;
const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// How the automated opponent picks its move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveSelection {
    /// Minimax with alpha-beta pruning to the configured depth.
    #[default]
    #[serde(rename = "minimax")]
    Minimax,
    /// The first legal move in generation order.
    #[serde(rename = "first")]
    FirstLegal,
    /// A uniformly random legal move.
    #[serde(rename = "random")]
    Random,
}

impl MoveSelection {
    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "minimax" => Some(MoveSelection::Minimax),
            "first" | "first_legal" => Some(MoveSelection::FirstLegal),
            "random" => Some(MoveSelection::Random),
            _ => None,
        }
    }
}

impl fmt::Display for MoveSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveSelection::Minimax => write!(f, "minimax"),
            MoveSelection::FirstLegal => write!(f, "first"),
            MoveSelection::Random => write!(f, "random"),
        }
    }
}

/// Named strength presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Harmless,
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "harmless" => Some(Difficulty::Harmless),
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            "expert" => Some(Difficulty::Expert),
            _ => None,
        }
    }

    /// Search depth for minimax.
    pub fn depth(self) -> u32 {
        match self {
            Difficulty::Harmless => 1, // random
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
            Difficulty::Expert => 4,
        }
    }

    pub fn selection(self) -> MoveSelection {
        match self {
            Difficulty::Harmless => MoveSelection::Random,
            _ => MoveSelection::Minimax,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Harmless => write!(f, "harmless"),
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
            Difficulty::Expert => write!(f, "expert"),
        }
    }
}

/// Engine configuration parsed from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimax depth in plies.
    pub search_depth: u32,
    /// Wall-clock budget for one search in milliseconds.
    pub search_timeout_ms: u64,
    /// Move selection strategy.
    pub selection: MoveSelection,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// `CHESS_AI_DIFFICULTY` applies a preset first; `CHESS_AI_DEPTH` and
    /// `CHESS_AI_MODE` then override its parts. Unparseable values fall back
    /// to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`EngineConfig::from_env`] but reading variables from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = lookup("CHESS_AI_DIFFICULTY")
            .and_then(|v| Difficulty::from_str_loose(&v))
            .map(EngineConfig::for_difficulty)
            .unwrap_or_default();

        if let Some(depth) = lookup("CHESS_AI_DEPTH").and_then(|v| v.trim().parse().ok()) {
            config.search_depth = depth;
        }
        if let Some(timeout) = lookup("CHESS_AI_TIMEOUT").and_then(|v| v.trim().parse().ok()) {
            config.search_timeout_ms = timeout;
        }
        if let Some(selection) =
            lookup("CHESS_AI_MODE").and_then(|v| MoveSelection::from_str_loose(&v))
        {
            config.selection = selection;
        }
        config
    }

    /// Preset for a named difficulty with the default timeout.
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        EngineConfig {
            search_depth: difficulty.depth(),
            selection: difficulty.selection(),
            ..EngineConfig::default()
        }
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            search_depth: DEFAULT_DEPTH,
            search_timeout_ms: DEFAULT_TIMEOUT_MS,
            selection: MoveSelection::Minimax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.search_depth, 3);
        assert_eq!(config.search_timeout_ms, 5000);
        assert_eq!(config.selection, MoveSelection::Minimax);
        assert_eq!(config.search_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn from_lookup_defaults() {
        assert_eq!(EngineConfig::from_lookup(lookup(&[])), EngineConfig::default());
    }

    #[test]
    fn from_lookup_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("CHESS_AI_DEPTH", "5"),
            ("CHESS_AI_TIMEOUT", " 250 "),
            ("CHESS_AI_MODE", "Random"),
        ]));
        assert_eq!(config.search_depth, 5);
        assert_eq!(config.search_timeout_ms, 250);
        assert_eq!(config.selection, MoveSelection::Random);
    }

    #[test]
    fn from_lookup_ignores_garbage() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("CHESS_AI_DEPTH", "deep"),
            ("CHESS_AI_TIMEOUT", "-1"),
            ("CHESS_AI_MODE", "telepathy"),
        ]));
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn difficulty_preset_then_override() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("CHESS_AI_DIFFICULTY", "expert"),
            ("CHESS_AI_MODE", "first"),
        ]));
        assert_eq!(config.search_depth, 4);
        assert_eq!(config.selection, MoveSelection::FirstLegal);
    }

    #[test]
    fn difficulty_presets() {
        assert_eq!(Difficulty::from_str_loose("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str_loose("godlike"), None);
        assert_eq!(Difficulty::Harmless.selection(), MoveSelection::Random);
        assert_eq!(Difficulty::Medium.depth(), 2);
        assert_eq!(EngineConfig::for_difficulty(Difficulty::Easy).search_depth, 1);
        assert_eq!(Difficulty::Expert.to_string(), "expert");
    }

    #[test]
    fn serde_round_trip() {
        let json = r#"{"search_depth":2,"selection":"first"}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.search_depth, 2);
        assert_eq!(config.search_timeout_ms, 5000, "missing fields take defaults");
        assert_eq!(config.selection, MoveSelection::FirstLegal);

        let out = serde_json::to_string(&config).unwrap();
        assert!(out.contains(r#""selection":"first""#));
    }
}
