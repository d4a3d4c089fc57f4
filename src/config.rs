// Ledger configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Leading zero hex digits required by default
pub const DEFAULT_DIFFICULTY: usize = 3;
/// Amount credited to the owner per sealed block
pub const DEFAULT_REWARD: f32 = 1.0;
/// A block hash has 64 hex digits; more leading zeros can never be met
pub const MAX_DIFFICULTY: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("difficulty {0} exceeds the maximum of {MAX_DIFFICULTY}")]
    InvalidDifficulty(usize),

    #[error("reward must be a non-negative amount, got {0}")]
    InvalidReward(f32),
}

/// Whether admission checks the sender's sealed balance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalancePolicy {
    /// Admit regardless of balance; balances may go negative
    #[default]
    Unchecked,
    /// Reject when derived balance < value
    Enforced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub difficulty: usize,
    pub reward: f32,
    pub balance_policy: BalancePolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            reward: DEFAULT_REWARD,
            balance_policy: BalancePolicy::default(),
        }
    }
}

impl LedgerConfig {
    /// Load from a TOML file; missing keys fall back to defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values a ledger cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_difficulty(self.difficulty)?;
        if !self.reward.is_finite() || self.reward < 0.0 {
            return Err(ConfigError::InvalidReward(self.reward));
        }
        Ok(())
    }
}

/// Reject difficulties no hash can satisfy
pub fn check_difficulty(difficulty: usize) -> Result<(), ConfigError> {
    if difficulty > MAX_DIFFICULTY {
        return Err(ConfigError::InvalidDifficulty(difficulty));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.difficulty, 3);
        assert_eq!(config.reward, 1.0);
        assert_eq!(config.balance_policy, BalancePolicy::Unchecked);
    }

    #[test]
    fn test_partial_toml() {
        let config = LedgerConfig::from_toml("difficulty = 1\nbalance_policy = \"enforced\"").unwrap();
        assert_eq!(config.difficulty, 1);
        assert_eq!(config.reward, DEFAULT_REWARD);
        assert_eq!(config.balance_policy, BalancePolicy::Enforced);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(LedgerConfig::from_toml("").unwrap(), LedgerConfig::default());
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            LedgerConfig::from_toml("difficulty = \"hard\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_difficulty_bound() {
        assert!(LedgerConfig::from_toml("difficulty = 64").is_ok());
        assert!(matches!(
            LedgerConfig::from_toml("difficulty = 65"),
            Err(ConfigError::InvalidDifficulty(65))
        ));

        let config = LedgerConfig {
            difficulty: 100,
            ..LedgerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDifficulty(100))));
    }

    #[test]
    fn test_negative_reward_rejected() {
        assert!(matches!(
            LedgerConfig::from_toml("reward = -1.0"),
            Err(ConfigError::InvalidReward(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            LedgerConfig::load("/definitely/not/here.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
