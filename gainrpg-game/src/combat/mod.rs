//! Round-by-round combat resolution.
//!
//! Each round draws its dice from a stream seeded by the date, the encounter
//! nonce, the round number, the chosen action and the successes banked so
//! far, so replaying a stored state reproduces the same round.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod dice;
pub mod state;

pub use dice::{DiceFaces, count_successes, push_pool, roll_pool};
pub use state::{CombatPhase, CombatState, Outcome, RewardStatus, RoundDetail};

use crate::config::EngineConfig;
use crate::constants::{
    BASE_COMBAT_DICE, DIE_SIDES, DOMAIN_COMBAT, EFFECTIVE_THRESHOLD_CAP, FLEE_SUCCESSES_REQUIRED,
    FLEE_THRESHOLD_PENALTY, GUARD_SUCCESS_CREDIT_CAP, LOG_COMBAT_CONSEQUENCE, LOG_COMBAT_DEFEAT,
    LOG_COMBAT_FLED, LOG_COMBAT_FLEE_FAILED, LOG_COMBAT_GUARD, LOG_COMBAT_OPENINGS,
    LOG_COMBAT_OVERWHELM, LOG_COMBAT_PUSH, LOG_COMBAT_STRIKE, LOG_TRAIT_RELENTLESS,
    LOG_TRAIT_SECOND_WIND, LOG_TRAIT_STONEWALL, RELENTLESS_BONUS, RELENTLESS_PERIOD,
    SECOND_WIND_TARGET_BONUS,
};
use crate::encounter::{BossTrait, Encounter};
use crate::player::Player;
use crate::seed;

/// Action requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatAction {
    Strike,
    Guard,
    Flee,
    /// Let the engine pick Strike or Guard each round until the fight ends.
    Auto,
}

/// Action actually fought in a single round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundAction {
    Strike,
    Guard,
    Flee,
}

impl RoundAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strike => "strike",
            Self::Guard => "guard",
            Self::Flee => "flee",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised combat action `{0}`")]
pub struct InvalidAction(pub String);

impl FromStr for CombatAction {
    type Err = InvalidAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strike" => Ok(Self::Strike),
            "guard" => Ok(Self::Guard),
            "flee" => Ok(Self::Flee),
            "auto" => Ok(Self::Auto),
            _ => Err(InvalidAction(s.to_string())),
        }
    }
}

impl fmt::Display for CombatAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Strike => "strike",
            Self::Guard => "guard",
            Self::Flee => "flee",
            Self::Auto => "auto",
        };
        f.write_str(label)
    }
}

/// Player-side numbers a fight needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatContext {
    pub starting_grit: u32,
    pub attack_bonus: i32,
    pub guard_bonus: i32,
}

impl CombatContext {
    /// Build from the player's current grit and equipped items.
    #[must_use]
    pub fn from_player(player: &Player) -> Self {
        let bonuses = player.combat_bonuses();
        Self {
            starting_grit: player
                .grit_current
                .saturating_add_signed(bonuses.grit_bonus),
            attack_bonus: bonuses.attack,
            guard_bonus: bonuses.guard,
        }
    }

    fn dice_count(&self) -> u32 {
        u32::try_from((BASE_COMBAT_DICE + self.attack_bonus).max(1)).unwrap_or(1)
    }
}

/// Advance `state` according to `action`.
///
/// Manual actions fight exactly one round; `Auto` keeps fighting until the
/// state completes, grit runs out, or the configured round cap is hit.
/// A complete state is returned untouched. Returns the number of rounds fought.
pub fn resolve(
    state: &mut CombatState,
    encounter: &Encounter,
    ctx: &CombatContext,
    action: CombatAction,
    push_budget: u32,
    cfg: &EngineConfig,
) -> u32 {
    if state.is_complete() {
        return 0;
    }
    let round_action = match action {
        CombatAction::Strike => Some(RoundAction::Strike),
        CombatAction::Guard => Some(RoundAction::Guard),
        CombatAction::Flee => Some(RoundAction::Flee),
        CombatAction::Auto => None,
    };
    if let Some(round_action) = round_action {
        resolve_round(state, encounter, ctx, round_action, push_budget, cfg);
        return 1;
    }

    let mut budget = push_budget;
    let mut fought = 0;
    while !state.is_complete() && fought < cfg.max_auto_rounds {
        let starting = *state.starting_grit.get_or_insert(ctx.starting_grit);
        let remaining = starting.saturating_sub(state.grit_loss);
        if remaining == 0 && state.has_started() {
            break;
        }
        let chosen = if remaining <= encounter.damage + 1 {
            RoundAction::Guard
        } else {
            RoundAction::Strike
        };
        let spent = resolve_round(state, encounter, ctx, chosen, budget, cfg);
        budget = budget.saturating_sub(spent);
        fought += 1;
    }
    fought
}

fn effective_threshold(state: &CombatState, encounter: &Encounter, action: RoundAction) -> u8 {
    let mut threshold = encounter.success_threshold;
    if encounter.boss_trait == Some(BossTrait::Stonewall) && action == RoundAction::Guard {
        let creep = u8::try_from(state.guard_streak).unwrap_or(u8::MAX);
        threshold = threshold.saturating_add(creep);
    }
    threshold.min(EFFECTIVE_THRESHOLD_CAP)
}

/// Fight one round and return the grit spent pushing.
fn resolve_round(
    state: &mut CombatState,
    encounter: &Encounter,
    ctx: &CombatContext,
    action: RoundAction,
    push_budget: u32,
    cfg: &EngineConfig,
) -> u32 {
    if state.is_complete() {
        return 0;
    }
    let starting = *state.starting_grit.get_or_insert(ctx.starting_grit);
    let round = state.round + 1;
    let mut rng = seed::stream(&[
        state.date.to_string(),
        DOMAIN_COMBAT.to_string(),
        state.encounter_nonce.to_string(),
        round.to_string(),
        action.as_str().to_string(),
        state.accumulated_successes.to_string(),
    ]);

    let rolled = roll_pool(&mut rng, ctx.dice_count());
    let mut faces = rolled.clone();
    let remaining = starting.saturating_sub(state.grit_loss);
    let budget = push_budget.min(remaining).min(cfg.max_push_per_round);
    let push_spent = push_pool(&mut faces, budget);
    if push_spent > 0 {
        state.log.push(LOG_COMBAT_PUSH.to_string());
    }

    let threshold = effective_threshold(state, encounter, action);
    if threshold > encounter.success_threshold {
        state.log.push(LOG_TRAIT_STONEWALL.to_string());
    }
    let successes = count_successes(&faces, threshold);

    let damage_sixes = roll_pool(&mut rng, encounter.damage_dice)
        .iter()
        .filter(|face| **face == DIE_SIDES)
        .count();
    let trait_bonus = if encounter.boss_trait == Some(BossTrait::Relentless)
        && round % RELENTLESS_PERIOD == 0
    {
        state.log.push(LOG_TRAIT_RELENTLESS.to_string());
        RELENTLESS_BONUS
    } else {
        0
    };
    let incoming = encounter.damage + u32::try_from(damage_sixes).unwrap_or(0) + trait_bonus;

    let mut credited = 0;
    let mut barrier = 0;
    let mut fled = false;
    let mut damage = incoming;
    match action {
        RoundAction::Strike => {
            credited = successes;
            state.log.push(LOG_COMBAT_STRIKE.to_string());
        }
        RoundAction::Guard => {
            credited = successes.min(GUARD_SUCCESS_CREDIT_CAP);
            let guard_bonus = u32::try_from(ctx.guard_bonus.max(0)).unwrap_or(0);
            barrier = seed::roll_sum(&mut rng, successes, u32::from(DIE_SIDES)) + guard_bonus;
            damage = incoming.saturating_sub(barrier);
            state.log.push(LOG_COMBAT_GUARD.to_string());
        }
        RoundAction::Flee => {
            let flee_threshold = (threshold + FLEE_THRESHOLD_PENALTY).min(EFFECTIVE_THRESHOLD_CAP);
            if count_successes(&faces, flee_threshold) >= FLEE_SUCCESSES_REQUIRED {
                fled = true;
                damage = cfg.flee_grit_cost;
                state.log.push(LOG_COMBAT_FLED.to_string());
            } else {
                state.log.push(LOG_COMBAT_FLEE_FAILED.to_string());
            }
        }
    }

    state.round = round;
    state.accumulated_successes += credited;
    let overwhelm_target = encounter.overwhelm_target + state.target_bonus;
    let defeat_target = encounter.defeat_target + state.target_bonus;

    let mut negated_by_openings = 0;
    let victory = if state.accumulated_successes >= overwhelm_target {
        damage = 0;
        Some((Outcome::Overwhelm, overwhelm_target))
    } else if state.accumulated_successes >= defeat_target {
        if action == RoundAction::Strike {
            damage = 0;
        }
        Some((Outcome::Defeat, defeat_target))
    } else {
        None
    };
    if let Some((_, target)) = victory {
        let openings = state.accumulated_successes - target;
        negated_by_openings = openings.min(damage);
        damage -= negated_by_openings;
        state.openings += openings - negated_by_openings;
        if openings > 0 {
            state.log.push(LOG_COMBAT_OPENINGS.to_string());
        }
    }

    state.grit_loss = state.grit_loss.saturating_add(damage + push_spent);

    if let Some((outcome, _)) = victory {
        state.log.push(
            match outcome {
                Outcome::Overwhelm => LOG_COMBAT_OVERWHELM,
                _ => LOG_COMBAT_DEFEAT,
            }
            .to_string(),
        );
        state.complete(outcome);
    } else if fled {
        state.complete(Outcome::Fled);
    } else if state.grit_loss >= starting {
        state.log.push(LOG_COMBAT_CONSEQUENCE.to_string());
        state.complete(Outcome::SurvivedWithConsequence);
    }

    if encounter.boss_trait == Some(BossTrait::SecondWind)
        && !state.second_wind_triggered
        && !state.is_complete()
        && state.grit_loss.saturating_mul(2) >= starting
    {
        state.second_wind_triggered = true;
        state.target_bonus += SECOND_WIND_TARGET_BONUS;
        state.log.push(LOG_TRAIT_SECOND_WIND.to_string());
    }

    state.guard_streak = if action == RoundAction::Guard {
        state.guard_streak + 1
    } else {
        0
    };

    log::debug!(
        "round {round} {} | dice {:?} -> {:?} | successes {successes} (+{credited}) | damage {damage}/{incoming}",
        action.as_str(),
        rolled.as_slice(),
        faces.as_slice(),
    );

    state.last_round = Some(RoundDetail {
        round,
        action,
        rolled,
        faces,
        push_spent,
        threshold,
        successes,
        credited,
        incoming,
        trait_bonus,
        barrier,
        negated_by_openings,
        damage_taken: damage,
    });
    push_spent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::TwistEffect;
    use chrono::NaiveDate;

    fn encounter() -> Encounter {
        Encounter {
            schema_version: 1,
            date: NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
            nonce: 0,
            theme_key: String::from("frontier_kingdom"),
            level: 1,
            threat_name: String::from("Bramblefang"),
            threat_tag: None,
            is_boss: false,
            tier: 1,
            success_threshold: 3,
            damage: 1,
            damage_dice: 1,
            defeat_target: 5,
            overwhelm_target: 7,
            twist_effect: TwistEffect::ExtraDamage,
            boss_trait: None,
            location: String::new(),
            situation: String::new(),
            twist: String::new(),
            stakes: Vec::new(),
        }
    }

    fn ctx(grit: u32) -> CombatContext {
        CombatContext {
            starting_grit: grit,
            attack_bonus: 0,
            guard_bonus: 0,
        }
    }

    #[test]
    fn actions_parse_and_reject_garbage() {
        assert_eq!("Strike".parse::<CombatAction>(), Ok(CombatAction::Strike));
        assert_eq!(" auto ".parse::<CombatAction>(), Ok(CombatAction::Auto));
        assert_eq!(
            "dance".parse::<CombatAction>(),
            Err(InvalidAction(String::from("dance")))
        );
    }

    #[test]
    fn manual_action_fights_one_round() {
        let e = encounter();
        let mut state = CombatState::new(&e);
        let fought = resolve(&mut state, &e, &ctx(20), CombatAction::Strike, 0, &EngineConfig::default());
        assert_eq!(fought, 1);
        assert_eq!(state.round, 1);
        assert_eq!(state.starting_grit, Some(20));
        let detail = state.last_round.as_ref().unwrap();
        assert_eq!(detail.rolled.len(), 2);
        assert_eq!(detail.credited, detail.successes);
    }

    #[test]
    fn rounds_replay_from_a_saved_state() {
        let e = encounter();
        let cfg = EngineConfig::default();
        let mut first = CombatState::new(&e);
        resolve(&mut first, &e, &ctx(20), CombatAction::Guard, 0, &cfg);
        let saved = first.clone();
        resolve(&mut first, &e, &ctx(20), CombatAction::Strike, 0, &cfg);

        let mut resumed: CombatState =
            serde_json::from_str(&serde_json::to_string(&saved).unwrap()).unwrap();
        resolve(&mut resumed, &e, &ctx(20), CombatAction::Strike, 0, &cfg);
        assert_eq!(first, resumed);
    }

    #[test]
    fn guard_credits_at_most_one_success() {
        let e = encounter();
        let cfg = EngineConfig::default();
        for nonce in 0..10 {
            let mut state = CombatState::new(&e);
            state.encounter_nonce = nonce;
            resolve(&mut state, &e, &ctx(20), CombatAction::Guard, 0, &cfg);
            let detail = state.last_round.unwrap();
            assert!(detail.credited <= 1);
            assert_eq!(detail.damage_taken, detail.incoming.saturating_sub(detail.barrier));
        }
    }

    #[test]
    fn successes_never_decrease() {
        let e = encounter();
        let cfg = EngineConfig::default();
        let mut state = CombatState::new(&e);
        let mut last = 0;
        let actions = [CombatAction::Guard, CombatAction::Strike, CombatAction::Flee];
        for action in actions.iter().cycle().take(12) {
            resolve(&mut state, &e, &ctx(40), *action, 0, &cfg);
            assert!(state.accumulated_successes >= last);
            last = state.accumulated_successes;
        }
    }

    #[test]
    fn overwhelm_wins_when_both_targets_met() {
        let mut e = encounter();
        e.defeat_target = 1;
        e.overwhelm_target = 1;
        e.success_threshold = 2;
        let cfg = EngineConfig::default();
        // any pushed pip guarantees at least one success at threshold 2
        let mut state = CombatState::new(&e);
        resolve(&mut state, &e, &ctx(20), CombatAction::Strike, 10, &cfg);
        assert_eq!(state.outcome(), Some(Outcome::Overwhelm));
        assert_eq!(state.last_round.as_ref().unwrap().damage_taken, 0);
        assert_eq!(state.openings, state.accumulated_successes - 1);
    }

    #[test]
    fn completed_state_is_untouched() {
        let mut e = encounter();
        e.defeat_target = 1;
        e.overwhelm_target = 50;
        let cfg = EngineConfig::default();
        let mut state = CombatState::new(&e);
        resolve(&mut state, &e, &ctx(20), CombatAction::Strike, 10, &cfg);
        assert!(state.is_complete());
        let snapshot = state.clone();
        assert_eq!(resolve(&mut state, &e, &ctx(20), CombatAction::Auto, 5, &cfg), 0);
        assert_eq!(state, snapshot);
    }

    #[test]
    fn auto_ends_in_consequence_under_heavy_damage() {
        let mut e = encounter();
        e.damage = 30;
        e.defeat_target = 40;
        e.overwhelm_target = 45;
        let mut state = CombatState::new(&e);
        resolve(&mut state, &e, &ctx(2), CombatAction::Auto, 0, &EngineConfig::default());
        assert_eq!(state.outcome(), Some(Outcome::SurvivedWithConsequence));
        assert!(state.grit_loss >= 2);
    }

    #[test]
    fn push_spending_counts_as_grit_loss() {
        let mut e = encounter();
        e.damage = 0;
        e.damage_dice = 0;
        let mut state = CombatState::new(&e);
        resolve(&mut state, &e, &ctx(20), CombatAction::Guard, 3, &EngineConfig::default());
        let detail = state.last_round.clone().unwrap();
        assert_eq!(state.grit_loss, detail.push_spent);
    }

    #[test]
    fn relentless_adds_damage_on_third_round() {
        let mut e = encounter();
        e.boss_trait = Some(BossTrait::Relentless);
        e.defeat_target = 100;
        e.overwhelm_target = 110;
        let cfg = EngineConfig::default();
        let mut state = CombatState::new(&e);
        for _ in 0..3 {
            resolve(&mut state, &e, &ctx(100), CombatAction::Strike, 0, &cfg);
        }
        assert_eq!(state.last_round.as_ref().unwrap().trait_bonus, 1);
    }

    #[test]
    fn second_wind_raises_targets_once() {
        let mut e = encounter();
        e.boss_trait = Some(BossTrait::SecondWind);
        e.damage = 3;
        e.defeat_target = 100;
        e.overwhelm_target = 110;
        let cfg = EngineConfig::default();
        let mut state = CombatState::new(&e);
        while !state.is_complete() {
            resolve(&mut state, &e, &ctx(10), CombatAction::Strike, 0, &cfg);
        }
        assert!(state.second_wind_triggered);
        assert_eq!(state.target_bonus, 2);
    }

    #[test]
    fn stonewall_creeps_threshold_on_repeat_guard() {
        let mut e = encounter();
        e.boss_trait = Some(BossTrait::Stonewall);
        e.damage = 0;
        e.defeat_target = 100;
        e.overwhelm_target = 110;
        let cfg = EngineConfig::default();
        let mut state = CombatState::new(&e);
        resolve(&mut state, &e, &ctx(50), CombatAction::Guard, 0, &cfg);
        assert_eq!(state.last_round.as_ref().unwrap().threshold, 3);
        resolve(&mut state, &e, &ctx(50), CombatAction::Guard, 0, &cfg);
        assert_eq!(state.last_round.as_ref().unwrap().threshold, 4);
        resolve(&mut state, &e, &ctx(50), CombatAction::Strike, 0, &cfg);
        assert_eq!(state.last_round.as_ref().unwrap().threshold, 3);
    }

    #[test]
    fn successful_flee_pays_the_configured_cost() {
        let e = encounter();
        let cfg = EngineConfig {
            flee_grit_cost: 3,
            ..EngineConfig::default()
        };
        let mut state = CombatState::new(&e);
        // ten pips turn both dice into sixes, four successes at any threshold
        resolve(&mut state, &e, &ctx(20), CombatAction::Flee, 10, &cfg);
        let detail = state.last_round.as_ref().unwrap();
        assert_eq!(state.outcome(), Some(Outcome::Fled));
        assert_eq!(detail.faces.as_slice(), &[6, 6]);
        assert_eq!(detail.credited, 0);
        assert_eq!(detail.damage_taken, 3);
        assert_eq!(state.grit_loss, 3 + detail.push_spent);
        assert_eq!(state.log.last().map(String::as_str), Some(LOG_COMBAT_FLED));
    }

    #[test]
    fn failed_flee_takes_the_full_hit() {
        let mut e = encounter();
        e.success_threshold = 6;
        let cfg = EngineConfig::default();
        let one_die = CombatContext {
            starting_grit: 40,
            attack_bonus: -1,
            guard_bonus: 0,
        };
        let mut failures = 0;
        for nonce in 0..24 {
            let mut state = CombatState::new(&e);
            state.encounter_nonce = nonce;
            resolve(&mut state, &e, &one_die, CombatAction::Flee, 0, &cfg);
            let detail = state.last_round.as_ref().unwrap();
            assert_eq!(detail.rolled.len(), 1);
            if state.outcome() == Some(Outcome::Fled) {
                assert_eq!(detail.faces.as_slice(), &[6]);
                assert_eq!(detail.damage_taken, cfg.flee_grit_cost);
                continue;
            }
            failures += 1;
            assert!(!state.is_complete());
            assert_eq!(detail.damage_taken, detail.incoming);
            assert_eq!(state.grit_loss, detail.incoming);
            assert!(state.log.iter().any(|k| k == LOG_COMBAT_FLEE_FAILED));
        }
        assert!(failures > 0);
    }

    #[test]
    fn openings_soak_the_final_guard_round() {
        let mut e = encounter();
        e.damage = 30;
        e.damage_dice = 0;
        e.defeat_target = 3;
        e.overwhelm_target = 20;
        let cfg = EngineConfig::default();
        let mut state = CombatState::new(&e);
        state.accumulated_successes = 5;
        resolve(&mut state, &e, &ctx(100), CombatAction::Guard, 0, &cfg);

        let detail = state.last_round.as_ref().unwrap();
        let openings = state.accumulated_successes - e.defeat_target;
        let before_openings = detail.incoming.saturating_sub(detail.barrier);
        assert_eq!(state.outcome(), Some(Outcome::Defeat));
        assert!(openings >= 2);
        assert!(before_openings > openings);
        assert_eq!(detail.negated_by_openings, openings);
        assert_eq!(detail.damage_taken, before_openings - openings);
        assert_eq!(state.grit_loss, detail.damage_taken);
        assert_eq!(state.openings, 0);
    }

    #[test]
    fn openings_bank_when_a_strike_finishes() {
        let mut e = encounter();
        e.defeat_target = 3;
        e.overwhelm_target = 20;
        let cfg = EngineConfig::default();
        let mut state = CombatState::new(&e);
        state.accumulated_successes = 5;
        resolve(&mut state, &e, &ctx(100), CombatAction::Strike, 0, &cfg);

        let detail = state.last_round.as_ref().unwrap();
        assert_eq!(state.outcome(), Some(Outcome::Defeat));
        assert_eq!(detail.damage_taken, 0);
        assert_eq!(detail.negated_by_openings, 0);
        assert_eq!(state.openings, state.accumulated_successes - 3);
        assert!(state.log.iter().any(|k| k == LOG_COMBAT_OPENINGS));
    }

    #[test]
    fn auto_guards_exactly_at_damage_plus_one() {
        let mut e = encounter();
        e.damage = 3;
        e.damage_dice = 0;
        e.defeat_target = 100;
        e.overwhelm_target = 110;
        let cfg = EngineConfig {
            max_auto_rounds: 1,
            ..EngineConfig::default()
        };
        let cases = [
            (5, RoundAction::Strike),
            (6, RoundAction::Guard),
            (7, RoundAction::Guard),
        ];
        for (grit_loss, expected) in cases {
            let mut state = CombatState::new(&e);
            state.starting_grit = Some(10);
            state.grit_loss = grit_loss;
            let fought = resolve(&mut state, &e, &ctx(10), CombatAction::Auto, 0, &cfg);
            assert_eq!(fought, 1);
            let detail = state.last_round.as_ref().unwrap();
            assert_eq!(detail.action, expected, "grit loss {grit_loss}");
        }
    }
}
