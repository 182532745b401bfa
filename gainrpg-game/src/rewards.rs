//! Reward and progression application for completed fights.
//!
//! Rewards are granted through [`CombatState`]'s `Pending -> Applied`
//! transition, so a retried or replayed call can never pay out twice.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::{CombatState, Outcome};
use crate::config::EngineConfig;
use crate::constants::{
    BOSS_BONUS_LOOT_ITEMS, CONSEQUENCE_GRIT_FLOOR, CONSEQUENCE_HEAT, CONSEQUENCE_RENOWN,
    DEFEAT_COINS, DEFEAT_HEAT, DOMAIN_LOOT, DOMAIN_REWARD, LEVEL_UP_GRIT_MAX_GAIN,
    LEVEL_UP_GRIT_TOP_UP, LOG_REWARD_APPLIED, LOG_REWARD_LEVEL_UP, OVERWHELM_COINS,
    OVERWHELM_HEAT, OVERWHELM_LOOT_ITEMS, OVERWHELM_RENOWN, SIDEQUESTS_PER_WEEK_CREDIT,
};
use crate::content::{LootEntry, ThemeBundle};
use crate::encounter::Encounter;
use crate::player::{InventoryItem, Player};
use crate::seed::{self, SeededRng};
use crate::weighted::choose_weighted;

/// What a completed fight paid out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RewardSummary {
    pub coins_earned: u32,
    #[serde(default)]
    pub overflow_coins: u32,
    #[serde(default)]
    pub openings_coins: u32,
    #[serde(default)]
    pub coins_lost: u32,
    pub heat_delta: i32,
    pub renown_delta: i32,
    pub grit_after: u32,
    #[serde(default)]
    pub loot: Vec<String>,
    #[serde(default)]
    pub weeks_credited: u32,
    #[serde(default)]
    pub level_ups: u32,
    #[serde(default)]
    pub bonus_items: Vec<String>,
}

/// Result of crediting weeks toward the next level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LevelUpReport {
    pub levels: u32,
    pub bonus_items: Vec<String>,
}

fn loot_stream(encounter: &Encounter) -> SeededRng {
    seed::stream(&[
        encounter.date.to_string(),
        DOMAIN_LOOT.to_string(),
        encounter.nonce.to_string(),
    ])
}

fn grant_loot<R: Rng + ?Sized>(player: &mut Player, table: &[LootEntry], rng: &mut R) -> Option<String> {
    let entry = choose_weighted(table, rng)?;
    player.inventory.push(InventoryItem::from(entry));
    Some(entry.name.clone())
}

/// Credit weeks toward the next level and run every level-up they earn.
///
/// Each level-up raises the requirement to the new level, adds max grit,
/// tops up current grit and grants one bonus item.
pub fn credit_weeks<R: Rng + ?Sized>(
    player: &mut Player,
    weeks: u32,
    loot: &[LootEntry],
    rng: &mut R,
) -> LevelUpReport {
    let mut report = LevelUpReport::default();
    player.weeks_completed = player.weeks_completed.saturating_add(weeks);
    while player.weeks_completed >= player.weeks_required.max(1) {
        player.weeks_completed -= player.weeks_required.max(1);
        player.level += 1;
        player.weeks_required = player.level;
        player.grit_max += LEVEL_UP_GRIT_MAX_GAIN;
        player.grit_current = (player.grit_current + LEVEL_UP_GRIT_TOP_UP).min(player.grit_max);
        report.levels += 1;
        if let Some(name) = grant_loot(player, loot, rng) {
            report.bonus_items.push(name);
        }
        log::info!("level up: now level {}", player.level);
    }
    report
}

/// Record a completed side quest; every second one credits a week.
pub fn credit_sidequest<R: Rng + ?Sized>(
    player: &mut Player,
    loot: &[LootEntry],
    rng: &mut R,
) -> LevelUpReport {
    player.sidequests_completed += 1;
    if player.sidequests_completed % SIDEQUESTS_PER_WEEK_CREDIT == 0 {
        credit_weeks(player, 1, loot, rng)
    } else {
        LevelUpReport::default()
    }
}

fn base_coins<R: Rng + ?Sized>(outcome: Outcome, rng: &mut R) -> u32 {
    match outcome {
        Outcome::Overwhelm => rng.gen_range(OVERWHELM_COINS.0..=OVERWHELM_COINS.1),
        Outcome::Defeat => rng.gen_range(DEFEAT_COINS.0..=DEFEAT_COINS.1),
        Outcome::SurvivedWithConsequence | Outcome::Fled => 0,
    }
}

const fn heat_delta(outcome: Outcome) -> i32 {
    match outcome {
        Outcome::Overwhelm => OVERWHELM_HEAT,
        Outcome::Defeat => DEFEAT_HEAT,
        Outcome::SurvivedWithConsequence => CONSEQUENCE_HEAT,
        Outcome::Fled => 0,
    }
}

const fn renown_delta(outcome: Outcome) -> i32 {
    match outcome {
        Outcome::Overwhelm => OVERWHELM_RENOWN,
        Outcome::SurvivedWithConsequence => CONSEQUENCE_RENOWN,
        Outcome::Defeat | Outcome::Fled => 0,
    }
}

/// Apply rewards for a completed fight exactly once.
///
/// Returns `None` (and changes nothing) while the fight is in progress or
/// after rewards were already applied.
pub fn apply_rewards(
    state: &mut CombatState,
    player: &mut Player,
    encounter: &Encounter,
    bundle: &ThemeBundle,
    cfg: &EngineConfig,
) -> Option<RewardSummary> {
    let outcome = state.outcome()?;
    if state.is_applied() {
        return None;
    }

    let mut rng = seed::stream(&[
        encounter.date.to_string(),
        DOMAIN_REWARD.to_string(),
        encounter.nonce.to_string(),
        outcome.as_str().to_string(),
    ]);
    let mut summary = RewardSummary {
        overflow_coins: if state.overflow_grit > 0 {
            cfg.overflow_bonus_coins
        } else {
            0
        },
        openings_coins: state.openings,
        ..RewardSummary::default()
    };
    summary.coins_earned = base_coins(outcome, &mut rng) + summary.overflow_coins + summary.openings_coins;
    player.coins = player.coins.saturating_add(summary.coins_earned);

    let starting = state.starting_grit.unwrap_or(player.grit_current);
    let remaining = starting.saturating_sub(state.grit_loss);
    player.grit_current = remaining.min(player.grit_max);
    if outcome == Outcome::SurvivedWithConsequence {
        summary.coins_lost = cfg.consequence_coin_penalty.min(player.coins);
        player.coins -= summary.coins_lost;
        player.grit_current = player.grit_current.max(CONSEQUENCE_GRIT_FLOOR);
    }
    summary.grit_after = player.grit_current;

    let heat_before = i32::from(player.frontier_heat);
    player.adjust_heat(heat_delta(outcome));
    summary.heat_delta = i32::from(player.frontier_heat) - heat_before;

    let renown_before = i64::from(player.renown);
    player.adjust_renown(renown_delta(outcome));
    summary.renown_delta = i32::try_from(i64::from(player.renown) - renown_before).unwrap_or(0);

    let mut loot_rng = loot_stream(encounter);
    let mut loot_count = 0;
    if outcome == Outcome::Overwhelm {
        loot_count += OVERWHELM_LOOT_ITEMS;
    }
    if encounter.is_boss && outcome.is_victory() {
        loot_count += BOSS_BONUS_LOOT_ITEMS;
    }
    for _ in 0..loot_count {
        if let Some(name) = grant_loot(player, &bundle.loot, &mut loot_rng) {
            summary.loot.push(name);
        }
    }

    if encounter.is_boss && outcome.is_victory() && remaining > 0 {
        summary.weeks_credited = 1;
        let report = credit_weeks(player, 1, &bundle.loot, &mut loot_rng);
        summary.level_ups = report.levels;
        summary.bonus_items = report.bonus_items;
        if summary.level_ups > 0 {
            state.log.push(LOG_REWARD_LEVEL_UP.to_string());
        }
    }

    if !state.mark_applied(summary.clone()) {
        return None;
    }
    state.log.push(LOG_REWARD_APPLIED.to_string());
    log::info!(
        "{} rewards applied for {}: +{} coins, heat {:+}, renown {:+}",
        outcome.as_str(),
        encounter.date,
        summary.coins_earned,
        summary.heat_delta,
        summary.renown_delta
    );
    Some(summary)
}
