//! Engine tunables loaded from JSON with per-field defaults.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::DEFAULT_THEME_KEY;

/// Errors raised when engine configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },
    #[error("default theme key must not be empty")]
    EmptyThemeKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Theme used when the player has none set.
    #[serde(default = "EngineConfig::default_theme")]
    pub default_theme: String,
    /// Grit paid on a successful escape.
    #[serde(default = "EngineConfig::default_flee_grit_cost")]
    pub flee_grit_cost: u32,
    /// Coins added when the day's workout overflowed the grit cap.
    #[serde(default = "EngineConfig::default_overflow_bonus_coins")]
    pub overflow_bonus_coins: u32,
    /// Most coins a consequence can take from the player.
    #[serde(default = "EngineConfig::default_consequence_coin_penalty")]
    pub consequence_coin_penalty: u32,
    /// Safety cap on rounds fought by one `auto` call.
    #[serde(default = "EngineConfig::default_max_auto_rounds")]
    pub max_auto_rounds: u32,
    /// Most grit a single round may spend pushing dice.
    #[serde(default = "EngineConfig::default_max_push_per_round")]
    pub max_push_per_round: u32,
}

impl EngineConfig {
    fn default_theme() -> String {
        DEFAULT_THEME_KEY.to_string()
    }

    const fn default_flee_grit_cost() -> u32 {
        1
    }

    const fn default_overflow_bonus_coins() -> u32 {
        1
    }

    const fn default_consequence_coin_penalty() -> u32 {
        2
    }

    const fn default_max_auto_rounds() -> u32 {
        50
    }

    const fn default_max_push_per_round() -> u32 {
        10
    }

    /// Parse and validate a JSON config.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_theme.trim().is_empty() {
            return Err(ConfigError::EmptyThemeKey);
        }
        check_range("flee_grit_cost", self.flee_grit_cost, 0, 5)?;
        check_range("overflow_bonus_coins", self.overflow_bonus_coins, 0, 10)?;
        check_range("consequence_coin_penalty", self.consequence_coin_penalty, 0, 10)?;
        check_range("max_auto_rounds", self.max_auto_rounds, 1, 500)?;
        check_range("max_push_per_round", self.max_push_per_round, 0, 36)?;
        Ok(())
    }
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), ConfigError> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_theme: Self::default_theme(),
            flee_grit_cost: Self::default_flee_grit_cost(),
            overflow_bonus_coins: Self::default_overflow_bonus_coins(),
            consequence_coin_penalty: Self::default_consequence_coin_penalty(),
            max_auto_rounds: Self::default_max_auto_rounds(),
            max_push_per_round: Self::default_max_push_per_round(),
        }
    }
}
