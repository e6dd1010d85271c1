//! Engine configuration.
//!
//! Loaded from an optional JSON file. Every field has a default, so a file
//! only needs to name what it overrides.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::eval::EvalWeights;
use crate::movegen::RulesConfig;

/// Errors that can occur while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// 1 scores moves by their outcomes only; 2 also looks at the mover's
    /// follow-up action.
    pub max_depth: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig { max_depth: 2 }
    }
}

/// Round thresholds of the overtime stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OvertimeConfig {
    /// First round of Stage1.
    pub start_round: u32,
    /// Rounds spent in Stage1 before Stage2.
    pub stage2_dwell: u32,
    /// Rounds spent in Stage2 before Stage3.
    pub stage3_dwell: u32,
}

impl Default for OvertimeConfig {
    fn default() -> Self {
        OvertimeConfig {
            start_round: 30,
            stage2_dwell: 3,
            stage3_dwell: 3,
        }
    }
}

/// Trigger distances of the fan abilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanConfig {
    pub niffler_trigger_distance: i32,
    pub elf_trigger_distance: i32,
    /// How close the opposing seeker must be before a cube goes on its line.
    pub wombat_trigger_distance: i32,
}

impl Default for FanConfig {
    fn default() -> Self {
        FanConfig {
            niffler_trigger_distance: 2,
            elf_trigger_distance: 2,
            wombat_trigger_distance: 4,
        }
    }
}

/// All runtime settings of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// User name the server announces for our team.
    pub team_name: String,
    /// Subtracted from every turn timeout to leave room for sending.
    pub safety_margin_ms: u64,
    /// Used when a turn request carries no usable timeout.
    pub default_timeout_ms: u64,
    pub min_shot_success: f64,
    pub min_wrest_success: f64,
    pub search: SearchConfig,
    pub overtime: OvertimeConfig,
    pub fans: FanConfig,
    pub weights: EvalWeights,
    pub rules: RulesConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            team_name: "broomstick".to_string(),
            safety_margin_ms: 150,
            default_timeout_ms: 1000,
            min_shot_success: 0.3,
            min_wrest_success: 0.3,
            search: SearchConfig::default(),
            overtime: OvertimeConfig::default(),
            fans: FanConfig::default(),
            weights: EvalWeights::default(),
            rules: RulesConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Loads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig =
            serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let probabilities = [
            ("min_shot_success", self.min_shot_success),
            ("min_wrest_success", self.min_wrest_success),
            ("rules.throw_success", self.rules.throw_success),
            ("rules.intercept_chance", self.rules.intercept_chance),
            ("rules.catch_snitch_chance", self.rules.catch_snitch_chance),
            ("rules.knockout_chance", self.rules.knockout_chance),
            ("rules.foul_ban_chance", self.rules.foul_ban_chance),
            ("rules.wrest_chance", self.rules.wrest_chance),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must lie in [0, 1], got {p}"
                )));
            }
        }
        if self.search.max_depth == 0 {
            return Err(ConfigError::Invalid(
                "search.max_depth must be at least 1".to_string(),
            ));
        }
        if self.weights.win_threshold < 0 {
            return Err(ConfigError::Invalid(
                "weights.win_threshold must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let json = r#"{
            "team_name": "falcons",
            "search": { "max_depth": 1 },
            "weights": { "seeker_base": 120.0 }
        }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.team_name, "falcons");
        assert_eq!(config.search.max_depth, 1);
        assert_eq!(config.weights.seeker_base, 120.0);
        assert_eq!(config.weights.ban_unit, EvalWeights::default().ban_unit);
        assert_eq!(config.rules, RulesConfig::default());
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let mut config = EngineConfig::default();
        config.rules.wrest_chance = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_depth_is_rejected() {
        let mut config = EngineConfig::default();
        config.search.max_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = EngineConfig::load(Path::new("/nonexistent/broomstick.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
