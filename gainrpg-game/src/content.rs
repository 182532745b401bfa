//! Theme content bundles and the read-only provider seam.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use thiserror::Error;

use crate::encounter::BossTrait;
use crate::player::{ItemEffect, ItemKind};
use crate::weighted::Weighted;

const DEFAULT_THEME_DATA: &str = include_str!("../assets/themes/frontier_kingdom.json");

/// Key of the bundle embedded in the crate.
pub const DEFAULT_THEME_KEY: &str = "frontier_kingdom";

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("theme bundle could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("theme bundle `{key}` has no threat tables")]
    NoThreats { key: String },
}

const fn default_weight() -> i32 {
    1
}

/// Named entry in a tiered threat or boss table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatEntry {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: i32,
    #[serde(default)]
    pub tag: Option<String>,
}

impl Weighted for ThreatEntry {
    fn raw_weight(&self) -> i32 {
        self.weight
    }
}

/// Loot table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootEntry {
    pub name: String,
    pub kind: ItemKind,
    #[serde(default = "default_weight")]
    pub weight: i32,
    #[serde(default)]
    pub effect: ItemEffect,
}

impl Weighted for LootEntry {
    fn raw_weight(&self) -> i32 {
        self.weight
    }
}

/// Side quest table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidequestEntry {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_weight")]
    pub weight: i32,
}

impl Weighted for SidequestEntry {
    fn raw_weight(&self) -> i32 {
        self.weight
    }
}

/// Everything a theme contributes to generation and narration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ThemeBundle {
    #[serde(default)]
    pub key: String,
    /// Weekday threats keyed by intensity tier.
    #[serde(default)]
    pub threats: BTreeMap<u8, Vec<ThreatEntry>>,
    /// Boss threats keyed by intensity tier.
    #[serde(default)]
    pub bosses: BTreeMap<u8, Vec<ThreatEntry>>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub situations: Vec<String>,
    #[serde(default)]
    pub twists: Vec<String>,
    #[serde(default)]
    pub stakes: Vec<String>,
    #[serde(default)]
    pub loot: Vec<LootEntry>,
    #[serde(default)]
    pub sidequests: Vec<SidequestEntry>,
    /// Narrative lines keyed by event kind (`overflow`, `romance`, ...).
    #[serde(default)]
    pub narrative: BTreeMap<String, Vec<String>>,
    /// Boss traits this theme can roll; empty means the full pool.
    #[serde(default)]
    pub boss_traits: Vec<BossTrait>,
}

impl ThemeBundle {
    /// Parse a bundle from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or carries no threats at all.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let bundle: Self = serde_json::from_str(json)?;
        if bundle.threats.values().all(Vec::is_empty) && bundle.bosses.values().all(Vec::is_empty)
        {
            return Err(ContentError::NoThreats { key: bundle.key });
        }
        Ok(bundle)
    }

    /// The bundle embedded in the crate, used whenever a theme is missing or
    /// malformed.
    #[must_use]
    pub fn default_bundle() -> Self {
        Self::from_json(DEFAULT_THEME_DATA).unwrap_or_else(|_| Self::minimal())
    }

    fn minimal() -> Self {
        let mut threats = BTreeMap::new();
        threats.insert(
            1,
            vec![ThreatEntry {
                name: String::from("Bramblefang"),
                weight: 1,
                tag: Some(String::from("beast")),
            }],
        );
        Self {
            key: String::from(DEFAULT_THEME_KEY),
            threats,
            ..Self::default()
        }
    }

    /// Threat table for a tier, weekday or boss.
    #[must_use]
    pub fn threat_table(&self, tier: u8, boss: bool) -> &[ThreatEntry] {
        let tables = if boss { &self.bosses } else { &self.threats };
        tables.get(&tier).map_or(&[], Vec::as_slice)
    }

    /// Narrative bank for an event kind; missing banks are empty.
    #[must_use]
    pub fn narrative_bank(&self, kind: &str) -> &[String] {
        self.narrative.get(kind).map_or(&[], Vec::as_slice)
    }

    /// Boss trait pool, defaulting to every trait.
    #[must_use]
    pub fn boss_trait_pool(&self) -> Vec<BossTrait> {
        if self.boss_traits.is_empty() {
            BossTrait::ALL.to_vec()
        } else {
            self.boss_traits.clone()
        }
    }
}

/// Read-only source of theme bundles.
/// Platform-specific implementations decide where bundles live.
pub trait ContentProvider {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the bundle for a theme key, `Ok(None)` when no such theme exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle exists but cannot be read or parsed.
    fn load_theme(&self, key: &str) -> Result<Option<ThemeBundle>, Self::Error>;
}

/// Load a theme, silently falling back to the embedded default bundle.
pub fn resolve_theme<C: ContentProvider + ?Sized>(provider: &C, key: &str) -> ThemeBundle {
    match provider.load_theme(key) {
        Ok(Some(bundle)) => bundle,
        Ok(None) => {
            log::warn!("theme `{key}` not found, using default bundle");
            ThemeBundle::default_bundle()
        }
        Err(err) => {
            log::warn!("theme `{key}` failed to load ({err}), using default bundle");
            ThemeBundle::default_bundle()
        }
    }
}

/// In-memory provider backed by pre-parsed bundles.
#[derive(Debug, Clone, Default)]
pub struct StaticContent {
    themes: HashMap<String, ThemeBundle>,
}

impl StaticContent {
    /// Provider holding only the embedded default bundle.
    #[must_use]
    pub fn with_default() -> Self {
        Self::default().with_theme(DEFAULT_THEME_KEY, ThemeBundle::default_bundle())
    }

    /// Register a bundle under a key.
    #[must_use]
    pub fn with_theme(mut self, key: &str, bundle: ThemeBundle) -> Self {
        self.themes.insert(key.to_string(), bundle);
        self
    }
}

impl ContentProvider for StaticContent {
    type Error = Infallible;

    fn load_theme(&self, key: &str) -> Result<Option<ThemeBundle>, Self::Error> {
        Ok(self.themes.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_bundle_parses_with_every_tier() {
        let bundle = ThemeBundle::from_json(DEFAULT_THEME_DATA).unwrap();
        assert_eq!(bundle.key, DEFAULT_THEME_KEY);
        for tier in 1..=4 {
            assert!(!bundle.threat_table(tier, false).is_empty(), "tier {tier}");
            assert!(!bundle.threat_table(tier, true).is_empty(), "boss tier {tier}");
        }
        assert!(!bundle.loot.is_empty());
        assert!(!bundle.narrative_bank("rival").is_empty());
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            ThemeBundle::from_json("{not json"),
            Err(ContentError::Parse(_))
        ));
        assert!(matches!(
            ThemeBundle::from_json(r#"{"key": "empty"}"#),
            Err(ContentError::NoThreats { .. })
        ));
    }

    #[test]
    fn unknown_theme_falls_back_to_default() {
        let provider = StaticContent::default();
        let bundle = resolve_theme(&provider, "does_not_exist");
        assert_eq!(bundle, ThemeBundle::default_bundle());
    }

    #[test]
    fn missing_bank_is_empty() {
        let bundle = ThemeBundle::default_bundle();
        assert!(bundle.narrative_bank("no-such-bank").is_empty());
    }

    #[test]
    fn tier_keys_parse_from_json_strings() {
        let json = r#"{
            "key": "tiny",
            "threats": { "2": [ { "name": "Mire Toad", "weight": 0 } ] },
            "boss_traits": ["relentless"]
        }"#;
        let bundle = ThemeBundle::from_json(json).unwrap();
        assert_eq!(bundle.threat_table(2, false)[0].name, "Mire Toad");
        assert!(bundle.threat_table(1, false).is_empty());
        assert_eq!(bundle.boss_trait_pool(), vec![BossTrait::Relentless]);
    }
}
