//! Centralized balance and tuning constants for Gain RPG game logic.
//!
//! These values define the deterministic math for encounters, combat and
//! rewards. Tunables that operators may reasonably change live in
//! [`crate::config::EngineConfig`] instead.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_COMBAT_STRIKE: &str = "log.combat.strike";
pub(crate) const LOG_COMBAT_GUARD: &str = "log.combat.guard";
pub(crate) const LOG_COMBAT_FLEE_FAILED: &str = "log.combat.flee-failed";
pub(crate) const LOG_COMBAT_FLED: &str = "log.combat.fled";
pub(crate) const LOG_COMBAT_PUSH: &str = "log.combat.push";
pub(crate) const LOG_COMBAT_OVERWHELM: &str = "log.combat.overwhelm";
pub(crate) const LOG_COMBAT_DEFEAT: &str = "log.combat.defeat";
pub(crate) const LOG_COMBAT_CONSEQUENCE: &str = "log.combat.consequence";
pub(crate) const LOG_COMBAT_OPENINGS: &str = "log.combat.openings";
pub(crate) const LOG_TRAIT_RELENTLESS: &str = "log.trait.relentless";
pub(crate) const LOG_TRAIT_STONEWALL: &str = "log.trait.stonewall";
pub(crate) const LOG_TRAIT_SECOND_WIND: &str = "log.trait.second-wind";
pub(crate) const LOG_TOKEN_NEGATE: &str = "log.token.negate";
pub(crate) const LOG_REWARD_APPLIED: &str = "log.reward.applied";
pub(crate) const LOG_REWARD_LEVEL_UP: &str = "log.reward.level-up";
pub(crate) const LOG_REWARD_OVERFLOW: &str = "log.reward.overflow";

// Seed domain tags ---------------------------------------------------------
pub(crate) const DOMAIN_ENCOUNTER: &str = "encounter";
pub(crate) const DOMAIN_COMBAT: &str = "combat";
pub(crate) const DOMAIN_LOOT: &str = "loot";
pub(crate) const DOMAIN_REWARD: &str = "reward";
pub(crate) const DOMAIN_NARRATIVE: &str = "narrative";
pub(crate) const DOMAIN_SIDEQUEST: &str = "sidequest";

// Encounter generation -----------------------------------------------------
pub(crate) const DIE_SIDES: u8 = 6;
pub(crate) const THREAT_DAMAGE_SIDES: u32 = 4;
pub(crate) const HEAT_PER_TIER: u8 = 3;
pub(crate) const TIER_MIN: u8 = 1;
pub(crate) const TIER_MAX: u8 = 4;
pub(crate) const WOBBLE_DOWN_MAX_FACE: u8 = 2;
pub(crate) const WOBBLE_UP_MIN_FACE: u8 = 5;
pub(crate) const THRESHOLD_MIN: u8 = 2;
pub(crate) const THRESHOLD_MAX: u8 = 5;
pub(crate) const BASE_DEFEAT_TARGET: u32 = 4;
pub(crate) const OVERWHELM_MARGIN: u32 = 2;
pub(crate) const BOSS_OVERWHELM_MARGIN: u32 = 3;
pub(crate) const SINGLE_STAKE_CHANCE: f64 = 0.6;
pub(crate) const UNKNOWN_THREAT: &str = "Unknown Threat";

// Combat -------------------------------------------------------------------
pub(crate) const BASE_COMBAT_DICE: i32 = 2;
pub(crate) const FLEE_THRESHOLD_PENALTY: u8 = 1;
pub(crate) const FLEE_SUCCESSES_REQUIRED: u32 = 2;
pub(crate) const GUARD_SUCCESS_CREDIT_CAP: u32 = 1;
pub(crate) const EFFECTIVE_THRESHOLD_CAP: u8 = 6;
pub(crate) const RELENTLESS_PERIOD: u32 = 3;
pub(crate) const RELENTLESS_BONUS: u32 = 1;
pub(crate) const SECOND_WIND_TARGET_BONUS: u32 = 2;

// Rewards & progression ----------------------------------------------------
pub(crate) const OVERWHELM_COINS: (u32, u32) = (3, 6);
pub(crate) const DEFEAT_COINS: (u32, u32) = (1, 3);
pub(crate) const OVERWHELM_HEAT: i32 = 2;
pub(crate) const DEFEAT_HEAT: i32 = 1;
pub(crate) const CONSEQUENCE_HEAT: i32 = -1;
pub(crate) const OVERWHELM_RENOWN: i32 = 1;
pub(crate) const CONSEQUENCE_RENOWN: i32 = -1;
pub(crate) const HEAT_MIN: i32 = 0;
pub(crate) const HEAT_MAX: i32 = 12;
pub(crate) const OVERWHELM_LOOT_ITEMS: usize = 1;
pub(crate) const BOSS_BONUS_LOOT_ITEMS: usize = 2;
pub(crate) const CONSEQUENCE_GRIT_FLOOR: u32 = 1;
pub(crate) const LEVEL_UP_GRIT_MAX_GAIN: u32 = 2;
pub(crate) const LEVEL_UP_GRIT_TOP_UP: u32 = 2;
pub(crate) const SIDEQUESTS_PER_WEEK_CREDIT: u32 = 2;

// Narrative ----------------------------------------------------------------
pub(crate) const BANK_OVERFLOW: &str = "overflow";
pub(crate) const BANK_ROMANCE: &str = "romance";
pub(crate) const BANK_RIVAL: &str = "rival";
pub(crate) const BANK_LEGACY: &str = "legacy";
pub(crate) const RIVAL_BASE_CHANCE: f64 = 0.1;
pub(crate) const RIVAL_CHANCE_PER_HEAT: f64 = 0.05;
pub(crate) const RIVAL_CHANCE_CAP: f64 = 0.5;
pub(crate) const LEGACY_CHANCE: f64 = 0.2;
pub(crate) const LEGACY_MIN_LEVEL: u32 = 3;
pub(crate) const LEGACY_MIN_RENOWN: u32 = 10;

// Workouts -----------------------------------------------------------------
pub(crate) const MIN_PUSHUPS: u32 = 5;
pub(crate) const MIN_SITUPS: u32 = 10;
pub(crate) const MIN_SQUATS: u32 = 10;
pub(crate) const MIN_PULLUPS: u32 = 1;
pub(crate) const PUSHUPS_PER_GRIT: u32 = 10;
pub(crate) const SITUPS_PER_GRIT: u32 = 15;
pub(crate) const SQUATS_PER_GRIT: u32 = 20;
pub(crate) const PULLUPS_PER_GRIT: u32 = 3;
pub(crate) const FULL_CIRCUIT_BONUS: u32 = 1;

// Schema -------------------------------------------------------------------
pub const SCHEMA_VERSION: u32 = 1;
