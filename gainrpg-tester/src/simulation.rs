use anyhow::{Context, Result};
use chrono::{Datelike, Days, NaiveDate};
use clap::ValueEnum;
use gainrpg_game::{
    CombatAction, CombatContext, CombatState, ContentProvider, DailyEngine, DailyStore, Encounter,
    Outcome,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use std::collections::BTreeMap;

/// Safety cap on manual rounds fought in one simulated day.
const MAX_MANUAL_ROUNDS: u32 = 60;
/// Last-round damage worth spending a negate token on.
const NEGATE_DAMAGE_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Hand every fight to the engine's auto mode
    Auto,
    /// Always strike, pushing with the configured budget
    Aggressive,
    /// Guard when the next hit could hurt, flee when nearly spent
    Cautious,
}

#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub start: NaiveDate,
    pub days: u32,
    pub strategy: Strategy,
    pub push_budget: u32,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub weekday: String,
    pub threat: String,
    pub boss: bool,
    pub boss_trait: Option<String>,
    pub tier: u8,
    pub rounds: u32,
    pub outcome: Option<Outcome>,
    pub coins_earned: u32,
    pub coins_lost: u32,
    pub grit_after: u32,
    pub heat_after: u8,
    pub level_after: u32,
    pub loot: Vec<String>,
    pub workout_grit: Option<u32>,
    pub overflow: u32,
    pub sidequest_completed: bool,
    pub tokens_spent: u32,
    pub narrative: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalStanding {
    pub level: u32,
    pub coins: u32,
    pub renown: u32,
    pub frontier_heat: u8,
    pub grit: String,
    pub items: usize,
    pub sidequests_completed: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub theme: String,
    pub strategy: Strategy,
    pub start: NaiveDate,
    pub days: Vec<DayRecord>,
    pub outcomes: BTreeMap<String, usize>,
    pub standing: FinalStanding,
}

impl SimulationReport {
    pub fn total_coins(&self) -> u32 {
        self.days.iter().map(|d| d.coins_earned).sum()
    }

    pub fn victory_rate(&self) -> f64 {
        if self.days.is_empty() {
            return 0.0;
        }
        let wins = self
            .days
            .iter()
            .filter(|d| d.outcome.is_some_and(Outcome::is_victory))
            .count();
        #[allow(clippy::cast_precision_loss)]
        let rate = wins as f64 / self.days.len() as f64;
        rate * 100.0
    }
}

/// Log a seeded workout for the day and lock it in. Some days are skipped.
fn simulate_workout<C, S>(
    engine: &DailyEngine<C, S>,
    date: NaiveDate,
    rng: &mut ChaCha20Rng,
) -> Result<Option<(u32, u32)>>
where
    C: ContentProvider,
    S: DailyStore,
{
    if rng.gen_bool(0.15) {
        return Ok(None);
    }
    if rng.gen_bool(0.3) {
        engine.apply_minimum_set(date)?;
    } else {
        engine.log_workout(
            date,
            rng.gen_range(0..=60),
            rng.gen_range(0..=60),
            rng.gen_range(0..=80),
            rng.gen_range(0..=12),
        )?;
    }
    Ok(engine
        .lock_in_workout(date)?
        .map(|lock_in| (lock_in.restored, lock_in.overflow)))
}

fn choose_action(
    strategy: Strategy,
    state: &CombatState,
    encounter: &Encounter,
    ctx: &CombatContext,
) -> CombatAction {
    let remaining = state.remaining_grit().unwrap_or(ctx.starting_grit);
    match strategy {
        Strategy::Auto => CombatAction::Auto,
        Strategy::Aggressive => CombatAction::Strike,
        Strategy::Cautious if remaining <= 1 => CombatAction::Flee,
        Strategy::Cautious if remaining <= encounter.damage + 1 => CombatAction::Guard,
        Strategy::Cautious => CombatAction::Strike,
    }
}

/// Fight the day's encounter to completion; returns the final state and
/// tokens spent.
fn simulate_fight<C, S>(
    engine: &DailyEngine<C, S>,
    date: NaiveDate,
    plan: &SimulationPlan,
) -> Result<(CombatState, u32)>
where
    C: ContentProvider,
    S: DailyStore,
{
    let encounter = engine.get_or_create_encounter(date)?;
    let mut tokens_spent = 0;
    let mut state = engine
        .export_day(date)?
        .combat
        .context("encounter stored without a combat state")?;
    let mut rounds = 0;
    while !state.is_complete() && rounds < MAX_MANUAL_ROUNDS {
        let ctx = CombatContext::from_player(&engine.player()?);
        let action = choose_action(plan.strategy, &state, &encounter, &ctx);
        state = engine.resolve(date, action, plan.push_budget)?;
        rounds += 1;
        let hurt = state
            .last_round
            .as_ref()
            .is_some_and(|r| r.damage_taken >= NEGATE_DAMAGE_THRESHOLD);
        if hurt && engine.spend_token_negate(date)? {
            tokens_spent += 1;
            log::debug!("{date}: negated round {}", state.round);
            state = engine
                .export_day(date)?
                .combat
                .context("combat state vanished after negate")?;
        }
    }
    if !state.is_complete() {
        log::warn!("{date}: fight still open after {rounds} calls, finishing on auto");
        state = engine.resolve(date, CombatAction::Auto, 0)?;
    }
    Ok((state, tokens_spent))
}

/// Play `plan.days` consecutive days against `engine`.
pub fn run_simulation<C, S>(
    engine: &DailyEngine<C, S>,
    theme: &str,
    plan: &SimulationPlan,
) -> Result<SimulationReport>
where
    C: ContentProvider,
    S: DailyStore,
{
    let mut rng = ChaCha20Rng::seed_from_u64(plan.seed);
    let mut days = Vec::with_capacity(plan.days as usize);
    let mut outcomes: BTreeMap<String, usize> = BTreeMap::new();

    for offset in 0..plan.days {
        let date = plan
            .start
            .checked_add_days(Days::new(u64::from(offset)))
            .context("simulation ran past the calendar")?;
        let tick = engine.daily_tick(date)?;
        log::debug!("{date}: today's threat is {}", tick.today_threat);

        let workout = simulate_workout(engine, date, &mut rng)?;
        let sidequest_completed = rng.gen_bool(0.5) && engine.complete_sidequest(date)?;
        let (state, tokens_spent) = simulate_fight(engine, date, plan)?;
        let encounter = engine.get_or_create_encounter(date)?;
        let player = engine.player()?;

        let outcome = state.outcome();
        if let Some(outcome) = outcome {
            *outcomes.entry(outcome.as_str().to_string()).or_default() += 1;
        }
        let summary = state.reward_summary().cloned().unwrap_or_default();
        let mut loot = summary.loot;
        loot.extend(summary.bonus_items);
        days.push(DayRecord {
            date,
            weekday: date.weekday().to_string(),
            threat: encounter.threat_name,
            boss: encounter.is_boss,
            boss_trait: encounter.boss_trait.map(|t| t.as_str().to_string()),
            tier: encounter.tier,
            rounds: state.round,
            outcome,
            coins_earned: summary.coins_earned,
            coins_lost: summary.coins_lost,
            grit_after: player.grit_current,
            heat_after: player.frontier_heat,
            level_after: player.level,
            loot,
            workout_grit: workout.map(|(restored, _)| restored),
            overflow: workout.map_or(0, |(_, overflow)| overflow),
            sidequest_completed,
            tokens_spent,
            narrative: state.narrative,
        });
    }

    let player = engine.player()?;
    Ok(SimulationReport {
        theme: theme.to_string(),
        strategy: plan.strategy,
        start: plan.start,
        days,
        outcomes,
        standing: FinalStanding {
            level: player.level,
            coins: player.coins,
            renown: player.renown,
            frontier_heat: player.frontier_heat,
            grit: format!("{}/{}", player.grit_current, player.grit_max),
            items: player.inventory.len(),
            sidequests_completed: player.sidequests_completed,
        },
    })
}
