//! Gain RPG Game Engine
//!
//! Deterministic daily encounters and turn-based combat for a habit RPG.
//! Every roll is derived from the date and a few counters, so any day can be
//! regenerated, resumed or replayed from its stored documents.
//! This crate holds no web, database or scheduling code.

pub mod combat;
pub mod config;
pub mod constants;
pub mod content;
pub mod encounter;
pub mod engine;
pub mod error;
pub mod narrative;
pub mod player;
pub mod rewards;
pub mod seed;
pub mod sidequest;
pub mod snapshot;
pub mod store;
pub mod weighted;
pub mod workout;

// Re-export commonly used types
pub use combat::{
    CombatAction, CombatContext, CombatPhase, CombatState, InvalidAction, Outcome, RewardStatus,
    RoundAction, RoundDetail,
};
pub use config::{ConfigError, EngineConfig};
pub use constants::SCHEMA_VERSION;
pub use content::{
    ContentError, ContentProvider, DEFAULT_THEME_KEY, LootEntry, SidequestEntry, StaticContent,
    ThemeBundle, ThreatEntry, resolve_theme,
};
pub use encounter::{
    BossTrait, Encounter, EncounterRequest, IntensityPreview, TwistEffect, generate_encounter,
    is_boss_day, preview_intensity,
};
pub use engine::{DailyEngine, DailyTick};
pub use error::EngineError;
pub use narrative::{Narrative, compose_narrative};
pub use player::{CombatBonuses, InventoryItem, ItemEffect, ItemKind, Player, RomanceSetting};
pub use rewards::{LevelUpReport, RewardSummary, apply_rewards};
pub use seed::{SeededRng, derive_seed};
pub use sidequest::{Sidequest, generate_sidequest};
pub use snapshot::{DayDocuments, DaySnapshot};
pub use store::{DailyStore, MemoryStore, MemoryStoreError};
pub use workout::{LockIn, WorkoutLog};
