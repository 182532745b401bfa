//! Resumable combat progress for one day's encounter.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dice::DiceFaces;
use super::RoundAction;
use crate::constants::{LOG_REWARD_OVERFLOW, LOG_TOKEN_NEGATE, SCHEMA_VERSION};
use crate::encounter::Encounter;
use crate::rewards::RewardSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Overwhelm,
    Defeat,
    SurvivedWithConsequence,
    Fled,
}

impl Outcome {
    /// Stable key used in seeds and log lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overwhelm => "overwhelm",
            Self::Defeat => "defeat",
            Self::SurvivedWithConsequence => "survived_with_consequence",
            Self::Fled => "fled",
        }
    }

    /// Whether the threat itself was beaten.
    #[must_use]
    pub const fn is_victory(self) -> bool {
        matches!(self, Self::Overwhelm | Self::Defeat)
    }
}

/// Whether rewards for a completed fight have been granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RewardStatus {
    Pending,
    Applied { summary: RewardSummary },
}

/// Lifecycle of a fight. `Complete` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CombatPhase {
    #[default]
    InProgress,
    Complete {
        outcome: Outcome,
        rewards: RewardStatus,
    },
}

/// Everything that happened in the most recent round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundDetail {
    pub round: u32,
    pub action: RoundAction,
    pub rolled: DiceFaces,
    pub faces: DiceFaces,
    pub push_spent: u32,
    pub threshold: u8,
    pub successes: u32,
    pub credited: u32,
    pub incoming: u32,
    #[serde(default)]
    pub trait_bonus: u32,
    #[serde(default)]
    pub barrier: u32,
    #[serde(default)]
    pub negated_by_openings: u32,
    pub damage_taken: u32,
}

const fn current_schema() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    #[serde(default = "current_schema")]
    pub schema_version: u32,
    pub date: NaiveDate,
    /// Nonce of the encounter this state belongs to.
    pub encounter_nonce: u32,
    pub round: u32,
    pub accumulated_successes: u32,
    pub grit_loss: u32,
    /// Grit pool captured when the first round is fought.
    #[serde(default)]
    pub starting_grit: Option<u32>,
    /// Excess successes banked toward the reward.
    #[serde(default)]
    pub openings: u32,
    #[serde(default)]
    pub guard_streak: u32,
    #[serde(default)]
    pub target_bonus: u32,
    #[serde(default)]
    pub second_wind_triggered: bool,
    /// Grit that overflowed the cap when the day's workout was locked in.
    #[serde(default)]
    pub overflow_grit: u32,
    #[serde(default)]
    pub last_round: Option<RoundDetail>,
    #[serde(default)]
    pub phase: CombatPhase,
    #[serde(default)]
    pub narrative: String,
    #[serde(default)]
    pub log: Vec<String>,
}

impl CombatState {
    /// Fresh state for an encounter.
    #[must_use]
    pub fn new(encounter: &Encounter) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            date: encounter.date,
            encounter_nonce: encounter.nonce,
            round: 0,
            accumulated_successes: 0,
            grit_loss: 0,
            starting_grit: None,
            openings: 0,
            guard_streak: 0,
            target_bonus: 0,
            second_wind_triggered: false,
            overflow_grit: 0,
            last_round: None,
            phase: CombatPhase::InProgress,
            narrative: String::new(),
            log: Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.phase, CombatPhase::Complete { .. })
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        match &self.phase {
            CombatPhase::Complete { outcome, .. } => Some(*outcome),
            CombatPhase::InProgress => None,
        }
    }

    /// True once rewards have been granted.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(
            self.phase,
            CombatPhase::Complete {
                rewards: RewardStatus::Applied { .. },
                ..
            }
        )
    }

    /// Reward summary, present only after application.
    #[must_use]
    pub const fn reward_summary(&self) -> Option<&RewardSummary> {
        match &self.phase {
            CombatPhase::Complete {
                rewards: RewardStatus::Applied { summary },
                ..
            } => Some(summary),
            _ => None,
        }
    }

    /// Grit left in the pool, if a round has been fought.
    #[must_use]
    pub fn remaining_grit(&self) -> Option<u32> {
        self.starting_grit
            .map(|start| start.saturating_sub(self.grit_loss))
    }

    #[must_use]
    pub const fn has_started(&self) -> bool {
        self.round > 0
    }

    /// Enter the terminal phase. Ignored when already complete.
    pub(crate) fn complete(&mut self, outcome: Outcome) {
        if self.is_complete() {
            return;
        }
        self.phase = CombatPhase::Complete {
            outcome,
            rewards: RewardStatus::Pending,
        };
    }

    /// Move `Complete{Pending}` to `Complete{Applied}`.
    /// Returns `false` from any other phase, leaving the state untouched.
    pub(crate) fn mark_applied(&mut self, summary: RewardSummary) -> bool {
        match &mut self.phase {
            CombatPhase::Complete { rewards, .. } if *rewards == RewardStatus::Pending => {
                *rewards = RewardStatus::Applied { summary };
                true
            }
            _ => false,
        }
    }

    /// Add an overflow bonus to an already paid fight's summary.
    /// Returns `false` unless rewards were applied without one.
    pub(crate) fn credit_late_overflow(&mut self, coins: u32) -> bool {
        let CombatPhase::Complete {
            rewards: RewardStatus::Applied { summary },
            ..
        } = &mut self.phase
        else {
            return false;
        };
        if summary.overflow_coins > 0 {
            return false;
        }
        summary.overflow_coins = coins;
        summary.coins_earned = summary.coins_earned.saturating_add(coins);
        self.log.push(LOG_REWARD_OVERFLOW.to_string());
        true
    }

    /// Refund the damage dealt by the last round.
    /// Returns `false` when the fight is over or the round dealt nothing.
    pub fn negate_last_damage(&mut self) -> bool {
        if self.is_complete() {
            return false;
        }
        let Some(detail) = self.last_round.as_mut() else {
            return false;
        };
        if detail.damage_taken == 0 {
            return false;
        }
        self.grit_loss = self.grit_loss.saturating_sub(detail.damage_taken);
        detail.damage_taken = 0;
        self.log.push(LOG_TOKEN_NEGATE.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn sample_state() -> CombatState {
        let encounter = crate::encounter::generate_encounter(
            &crate::encounter::EncounterRequest::daily(
                NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
                1,
                "frontier_kingdom",
                0,
            ),
            &crate::content::ThemeBundle::default_bundle(),
        );
        CombatState::new(&encounter)
    }

    #[test]
    fn applied_only_after_complete_and_only_once() {
        let mut state = sample_state();
        assert!(!state.mark_applied(RewardSummary::default()));
        state.complete(Outcome::Defeat);
        assert!(!state.is_applied());
        assert!(state.mark_applied(RewardSummary::default()));
        assert!(state.is_applied());
        assert!(!state.mark_applied(RewardSummary::default()));
    }

    #[test]
    fn complete_is_terminal() {
        let mut state = sample_state();
        state.complete(Outcome::Fled);
        state.complete(Outcome::Overwhelm);
        assert_eq!(state.outcome(), Some(Outcome::Fled));
    }

    #[test]
    fn negate_refunds_last_round() {
        let mut state = sample_state();
        assert!(!state.negate_last_damage(), "nothing fought yet");
        state.round = 1;
        state.grit_loss = 3;
        state.last_round = Some(RoundDetail {
            round: 1,
            action: RoundAction::Strike,
            rolled: smallvec![1, 2],
            faces: smallvec![1, 2],
            push_spent: 0,
            threshold: 3,
            successes: 0,
            credited: 0,
            incoming: 3,
            trait_bonus: 0,
            barrier: 0,
            negated_by_openings: 0,
            damage_taken: 3,
        });
        assert!(state.negate_last_damage());
        assert_eq!(state.grit_loss, 0);
        assert!(!state.negate_last_damage(), "already negated");
    }

    #[test]
    fn phase_serializes_as_tagged_document() {
        let mut state = sample_state();
        state.complete(Outcome::SurvivedWithConsequence);
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["phase"]["phase"], "complete");
        assert_eq!(value["phase"]["outcome"], "survived_with_consequence");
        assert_eq!(value["phase"]["rewards"]["status"], "pending");
    }
}
