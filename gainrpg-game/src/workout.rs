//! Daily workout log and its conversion into grit.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{
    FULL_CIRCUIT_BONUS, MIN_PULLUPS, MIN_PUSHUPS, MIN_SITUPS, MIN_SQUATS, PULLUPS_PER_GRIT,
    PUSHUPS_PER_GRIT, SITUPS_PER_GRIT, SQUATS_PER_GRIT,
};
use crate::player::Player;

/// Reps logged for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutLog {
    pub date: NaiveDate,
    pub pushups: u32,
    pub situps: u32,
    pub squats: u32,
    pub pullups: u32,
    #[serde(default)]
    pub locked_in: bool,
}

/// What locking in a workout did to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockIn {
    pub restored: u32,
    pub overflow: u32,
}

fn clamp_reps(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

impl WorkoutLog {
    /// Empty log for a day.
    #[must_use]
    pub const fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            pushups: 0,
            situps: 0,
            squats: 0,
            pullups: 0,
            locked_in: false,
        }
    }

    /// Replace the rep counts; negative counts become zero.
    /// Ignored once the log is locked in.
    pub fn set_reps(&mut self, pushups: i64, situps: i64, squats: i64, pullups: i64) -> bool {
        if self.locked_in {
            return false;
        }
        self.pushups = clamp_reps(pushups);
        self.situps = clamp_reps(situps);
        self.squats = clamp_reps(squats);
        self.pullups = clamp_reps(pullups);
        true
    }

    /// Raise every count to at least the minimum set.
    pub fn apply_minimum_set(&mut self) -> bool {
        if self.locked_in {
            return false;
        }
        self.pushups = self.pushups.max(MIN_PUSHUPS);
        self.situps = self.situps.max(MIN_SITUPS);
        self.squats = self.squats.max(MIN_SQUATS);
        self.pullups = self.pullups.max(MIN_PULLUPS);
        true
    }

    #[must_use]
    pub const fn meets_minimum(&self) -> bool {
        self.pushups >= MIN_PUSHUPS
            && self.situps >= MIN_SITUPS
            && self.squats >= MIN_SQUATS
            && self.pullups >= MIN_PULLUPS
    }

    /// Grit these reps are worth.
    #[must_use]
    pub const fn grit_restore(&self) -> u32 {
        let mut grit = self.pushups / PUSHUPS_PER_GRIT
            + self.situps / SITUPS_PER_GRIT
            + self.squats / SQUATS_PER_GRIT
            + self.pullups / PULLUPS_PER_GRIT;
        if self.pushups > 0 && self.situps > 0 && self.squats > 0 && self.pullups > 0 {
            grit += FULL_CIRCUIT_BONUS;
        }
        grit
    }

    /// Convert the reps into grit, once.
    ///
    /// Returns `None` if the log was already locked in.
    pub fn lock_in(&mut self, player: &mut Player) -> Option<LockIn> {
        if self.locked_in {
            return None;
        }
        let restored = self.grit_restore();
        let overflow = player.restore_grit(restored);
        self.locked_in = true;
        log::info!(
            "workout for {} locked in: +{restored} grit ({overflow} overflow)",
            self.date
        );
        Some(LockIn { restored, overflow })
    }
}
