//! The daily engine: the entry points a web layer or scheduler calls.
//!
//! Every mutating call holds the lock for its date and then the player
//! lock, loads the day's documents and the player, works on typed copies and
//! hands the result back to the store in a single [`DailyStore::commit_day`].
//! Nothing reaches the store until the whole step has succeeded. The player
//! record is shared by every date, so the player lock stays held from
//! `load_player` through the commit.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::combat::{self, CombatAction, CombatContext, CombatState, Outcome};
use crate::config::EngineConfig;
use crate::constants::DOMAIN_SIDEQUEST;
use crate::content::{ContentProvider, ThemeBundle, resolve_theme};
use crate::encounter::{
    Encounter, EncounterRequest, IntensityPreview, generate_encounter, preview_intensity,
};
use crate::error::EngineError;
use crate::narrative::compose_narrative;
use crate::player::Player;
use crate::rewards::{apply_rewards, credit_sidequest};
use crate::seed;
use crate::sidequest::{Sidequest, generate_sidequest};
use crate::snapshot::{DayDocuments, DaySnapshot, decode_combat, decode_encounter, decode_plain};
use crate::store::DailyStore;
use crate::workout::{LockIn, WorkoutLog};

/// What [`DailyEngine::daily_tick`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTick {
    /// Outcome of yesterday's fight if the tick had to finish it.
    pub resolved_yesterday: Option<Outcome>,
    pub today_threat: String,
}

/// Loaded working copy of one date.
struct Day {
    date: NaiveDate,
    theme_key: String,
    bundle: ThemeBundle,
    player: Player,
    snapshot: DaySnapshot,
    dirty: bool,
}

impl Day {
    fn request(&self, nonce: u32, force_boss: bool) -> EncounterRequest<'_> {
        EncounterRequest {
            date: self.date,
            level: self.player.level,
            theme_key: &self.theme_key,
            frontier_heat: i32::from(self.player.frontier_heat),
            nonce,
            force_boss,
        }
    }

    fn regenerate(&mut self, nonce: u32, force_boss: bool) -> &Encounter {
        let encounter = generate_encounter(&self.request(nonce, force_boss), &self.bundle);
        let overflow = self.snapshot.combat.as_ref().map_or(0, |c| c.overflow_grit);
        let mut state = CombatState::new(&encounter);
        state.overflow_grit = overflow;
        log::debug!(
            "generated {} for {} (nonce {nonce}, tier {})",
            encounter.threat_name,
            self.date,
            encounter.tier
        );
        self.snapshot.combat = Some(state);
        self.dirty = true;
        self.snapshot.encounter.insert(encounter)
    }

    fn encounter_or_fresh(&self) -> Encounter {
        self.snapshot
            .encounter
            .clone()
            .unwrap_or_else(|| generate_encounter(&self.request(0, false), &self.bundle))
    }

    /// Make sure the encounter, its combat state and the side quest exist.
    fn ensure(&mut self) {
        if self.snapshot.encounter.is_none() {
            self.regenerate(0, false);
        }
        if self.snapshot.combat.is_none()
            && let Some(encounter) = &self.snapshot.encounter
        {
            self.snapshot.combat = Some(CombatState::new(encounter));
            self.dirty = true;
        }
        if self.snapshot.sidequest.is_none() {
            let nonce = self.snapshot.encounter.as_ref().map_or(0, |e| e.nonce);
            self.snapshot.sidequest =
                generate_sidequest(self.date, &self.theme_key, nonce, &self.bundle);
            self.dirty |= self.snapshot.sidequest.is_some();
        }
    }
}

/// Main engine driving daily encounters against a content provider and a store.
pub struct DailyEngine<C, S>
where
    C: ContentProvider,
    S: DailyStore,
{
    content: C,
    store: S,
    config: EngineConfig,
    date_locks: Mutex<HashMap<NaiveDate, Arc<Mutex<()>>>>,
    /// Always taken after a date lock, never before one.
    player_lock: Mutex<()>,
}

impl<C, S> DailyEngine<C, S>
where
    C: ContentProvider,
    S: DailyStore,
{
    /// Create an engine with the default configuration.
    pub fn new(content: C, store: S) -> Self {
        Self {
            content,
            store,
            config: EngineConfig::default(),
            date_locks: Mutex::new(HashMap::new()),
            player_lock: Mutex::new(()),
        }
    }

    /// Create an engine with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn with_config(content: C, store: S, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(content, store)
        })
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    fn date_lock(&self, date: NaiveDate) -> Arc<Mutex<()>> {
        let mut locks = self
            .date_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(date).or_default())
    }

    /// Run `f` while holding the lock for `date` and the player lock.
    fn with_date<T>(
        &self,
        date: NaiveDate,
        f: impl FnOnce() -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let lock = self.date_lock(date);
        let _day = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _player = self
            .player_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f()
    }

    fn load_day(&self, date: NaiveDate) -> Result<Day, EngineError> {
        let mut player = self.store.load_player().map_err(EngineError::store)?;
        player.sanitize();
        let theme_key = if player.theme_pack.trim().is_empty() {
            self.config.default_theme.clone()
        } else {
            player.theme_pack.clone()
        };
        let bundle = resolve_theme(&self.content, &theme_key);
        let docs = self.store.load_day(date).map_err(EngineError::store)?;

        let mut day = Day {
            date,
            theme_key,
            bundle,
            player,
            snapshot: DaySnapshot::empty(date),
            dirty: false,
        };
        day.snapshot.encounter = docs.encounter.as_deref().and_then(|text| {
            decode_encounter(text, || {
                generate_encounter(&day.request(0, false), &day.bundle)
            })
        });
        day.snapshot.combat = match (&day.snapshot.encounter, docs.combat.as_deref()) {
            (Some(encounter), Some(text)) => decode_combat(text, encounter),
            _ => None,
        };
        day.snapshot.workout = docs
            .workout
            .as_deref()
            .and_then(|text| decode_plain(text, "workout"));
        day.snapshot.sidequest = docs
            .sidequest
            .as_deref()
            .and_then(|text| decode_plain(text, "sidequest"));
        Ok(day)
    }

    fn commit(&self, day: &Day) -> Result<(), EngineError> {
        let docs = DayDocuments::encode(&day.snapshot)?;
        self.store
            .commit_day(day.date, &docs, &day.player)
            .map_err(EngineError::store)
    }

    fn commit_if_dirty(&self, day: &Day) -> Result<(), EngineError> {
        if day.dirty {
            self.commit(day)?;
        }
        Ok(())
    }

    /// Apply rewards and compose the narrative for a finished, unpaid fight.
    fn finalize(day: &mut Day, config: &EngineConfig) {
        let (Some(encounter), Some(state)) = (&day.snapshot.encounter, &mut day.snapshot.combat)
        else {
            return;
        };
        let Some(outcome) = state.outcome() else {
            return;
        };
        if let Some(summary) = apply_rewards(state, &mut day.player, encounter, &day.bundle, config)
        {
            let narrative = compose_narrative(encounter, outcome, &summary, &day.player, &day.bundle);
            state.narrative = narrative.text;
            day.dirty = true;
        }
    }

    /// Today's encounter, generated and stored on first request.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn get_or_create_encounter(&self, date: NaiveDate) -> Result<Encounter, EngineError> {
        self.with_date(date, || {
            let mut day = self.load_day(date)?;
            day.ensure();
            self.commit_if_dirty(&day)?;
            Ok(day.encounter_or_fresh())
        })
    }

    /// Replace the day's encounter with a fresh roll and reset its fight.
    ///
    /// A paid fight is only replaced by a higher nonce; otherwise the stored
    /// encounter is returned unchanged, since the same roll would pay again.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn force_regenerate(
        &self,
        date: NaiveDate,
        nonce: u32,
        force_boss: bool,
    ) -> Result<Encounter, EngineError> {
        self.with_date(date, || {
            let mut day = self.load_day(date)?;
            if let (Some(stored), Some(state)) = (&day.snapshot.encounter, &day.snapshot.combat)
                && state.is_applied()
                && nonce <= stored.nonce
            {
                log::warn!(
                    "force regenerate on {date} refused: nonce {nonce} would replay paid nonce {}",
                    stored.nonce
                );
                return Ok(stored.clone());
            }
            if day.snapshot.combat.as_ref().is_some_and(CombatState::is_complete) {
                log::warn!("force regenerate on {date} discards a finished fight");
            }
            let encounter = day.regenerate(nonce, force_boss).clone();
            day.ensure();
            self.commit(&day)?;
            Ok(encounter)
        })
    }

    /// Resolve one round (or an `auto` run) from a user-supplied action string.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidAction`] for an unknown action, or an
    /// error if the store fails.
    pub fn resolve_round(
        &self,
        date: NaiveDate,
        action: &str,
        push_budget: u32,
    ) -> Result<CombatState, EngineError> {
        let action: CombatAction = action.parse()?;
        self.resolve(date, action, push_budget)
    }

    /// Resolve with an already parsed action.
    ///
    /// A finished fight is returned unchanged; rewards are granted in the
    /// same commit that finishes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn resolve(
        &self,
        date: NaiveDate,
        action: CombatAction,
        push_budget: u32,
    ) -> Result<CombatState, EngineError> {
        self.with_date(date, || {
            let mut day = self.load_day(date)?;
            day.ensure();
            self.fight(&mut day, action, push_budget);
            self.commit_if_dirty(&day)?;
            Ok(day
                .snapshot
                .combat
                .clone()
                .unwrap_or_else(|| CombatState::new(&day.encounter_or_fresh())))
        })
    }

    fn fight(&self, day: &mut Day, action: CombatAction, push_budget: u32) {
        if let (Some(encounter), Some(state)) = (&day.snapshot.encounter, &mut day.snapshot.combat)
            && !state.is_complete()
        {
            let ctx = CombatContext::from_player(&day.player);
            let fought = combat::resolve(state, encounter, &ctx, action, push_budget, &self.config);
            day.dirty |= fought > 0;
        }
        Self::finalize(day, &self.config);
    }

    /// Intensity breakdown for the day's roll, without generating anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn preview_intensity(&self, date: NaiveDate) -> Result<IntensityPreview, EngineError> {
        let day = self.load_day(date)?;
        let nonce = day.snapshot.encounter.as_ref().map_or(0, |e| e.nonce);
        Ok(preview_intensity(&day.request(nonce, false)))
    }

    /// Spend a campfire token to reroll an unstarted encounter.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails; refused spends return `Ok(false)`.
    pub fn spend_token_reroll(&self, date: NaiveDate) -> Result<bool, EngineError> {
        self.with_date(date, || {
            let mut day = self.load_day(date)?;
            if day.player.campfire_tokens == 0 {
                return Ok(false);
            }
            day.ensure();
            let started = day
                .snapshot
                .combat
                .as_ref()
                .is_some_and(|c| c.has_started() || c.is_complete());
            if started {
                self.commit_if_dirty(&day)?;
                return Ok(false);
            }
            let Some((nonce, is_boss)) = day.snapshot.encounter.as_ref().map(|e| (e.nonce, e.is_boss))
            else {
                return Ok(false);
            };
            if !day.player.spend_token() {
                return Ok(false);
            }
            day.regenerate(nonce + 1, is_boss);
            self.commit(&day)?;
            Ok(true)
        })
    }

    /// Spend a campfire token to undo the last round's damage.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails; refused spends return `Ok(false)`.
    pub fn spend_token_negate(&self, date: NaiveDate) -> Result<bool, EngineError> {
        self.with_date(date, || {
            let mut day = self.load_day(date)?;
            if day.player.campfire_tokens == 0 {
                return Ok(false);
            }
            let Some(state) = day.snapshot.combat.as_mut() else {
                return Ok(false);
            };
            if !state.negate_last_damage() {
                return Ok(false);
            }
            day.player.spend_token();
            self.commit(&day)?;
            Ok(true)
        })
    }

    /// Record the day's reps. Refused once the workout is locked in.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn log_workout(
        &self,
        date: NaiveDate,
        pushups: i64,
        situps: i64,
        squats: i64,
        pullups: i64,
    ) -> Result<WorkoutLog, EngineError> {
        self.edit_workout(date, |log| log.set_reps(pushups, situps, squats, pullups))
    }

    /// Raise the day's reps to the minimum set.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn apply_minimum_set(&self, date: NaiveDate) -> Result<WorkoutLog, EngineError> {
        self.edit_workout(date, WorkoutLog::apply_minimum_set)
    }

    fn edit_workout(
        &self,
        date: NaiveDate,
        edit: impl FnOnce(&mut WorkoutLog) -> bool,
    ) -> Result<WorkoutLog, EngineError> {
        self.with_date(date, || {
            let mut day = self.load_day(date)?;
            let log = day.snapshot.workout.get_or_insert_with(|| WorkoutLog::empty(date));
            if edit(log) {
                day.dirty = true;
            }
            let log = log.clone();
            self.commit_if_dirty(&day)?;
            Ok(log)
        })
    }

    /// Convert the day's reps into grit, once. Overflow past the grit cap is
    /// recorded on the day's fight for the reward and narrative. If that
    /// fight was already paid, the overflow bonus is paid here instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn lock_in_workout(&self, date: NaiveDate) -> Result<Option<LockIn>, EngineError> {
        self.with_date(date, || {
            let mut day = self.load_day(date)?;
            let log = day.snapshot.workout.get_or_insert_with(|| WorkoutLog::empty(date));
            let Some(lock_in) = log.lock_in(&mut day.player) else {
                return Ok(None);
            };
            day.ensure();
            if let Some(state) = day.snapshot.combat.as_mut() {
                state.overflow_grit = lock_in.overflow;
                if lock_in.overflow > 0
                    && state.credit_late_overflow(self.config.overflow_bonus_coins)
                {
                    day.player.coins = day
                        .player
                        .coins
                        .saturating_add(self.config.overflow_bonus_coins);
                    log::info!(
                        "overflow bonus for {date} paid at lock-in: +{} coins",
                        self.config.overflow_bonus_coins
                    );
                }
            }
            self.commit(&day)?;
            Ok(Some(lock_in))
        })
    }

    /// Complete the day's side quest.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails; a missing or finished quest
    /// returns `Ok(false)`.
    pub fn complete_sidequest(&self, date: NaiveDate) -> Result<bool, EngineError> {
        self.with_date(date, || {
            let mut day = self.load_day(date)?;
            let Some(quest) = day.snapshot.sidequest.as_mut() else {
                return Ok(false);
            };
            if !quest.complete() {
                return Ok(false);
            }
            let mut rng = seed::stream(&[
                date.to_string(),
                DOMAIN_SIDEQUEST.to_string(),
                quest.title.clone(),
                "complete".to_string(),
            ]);
            let report = credit_sidequest(&mut day.player, &day.bundle.loot, &mut rng);
            if report.levels > 0 {
                log::info!("side quest on {date} earned {} level(s)", report.levels);
            }
            self.commit(&day)?;
            Ok(true)
        })
    }

    /// The day's side quest, if one was generated.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn sidequest(&self, date: NaiveDate) -> Result<Option<Sidequest>, EngineError> {
        Ok(self.load_day(date)?.snapshot.sidequest)
    }

    /// Finish yesterday's open fight automatically, then set up today.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn daily_tick(&self, today: NaiveDate) -> Result<DailyTick, EngineError> {
        let mut resolved_yesterday = None;
        if let Some(yesterday) = today.pred_opt() {
            resolved_yesterday = self.with_date(yesterday, || {
                let mut day = self.load_day(yesterday)?;
                if day.snapshot.encounter.is_none() {
                    return Ok(None);
                }
                day.ensure();
                if day.snapshot.combat.as_ref().is_none_or(CombatState::is_applied) {
                    self.commit_if_dirty(&day)?;
                    return Ok(None);
                }
                self.fight(&mut day, CombatAction::Auto, 0);
                self.commit_if_dirty(&day)?;
                let outcome = day.snapshot.combat.as_ref().and_then(CombatState::outcome);
                log::info!("daily tick resolved {yesterday}: {outcome:?}");
                Ok(outcome)
            })?;
        }
        let encounter = self.get_or_create_encounter(today)?;
        Ok(DailyTick {
            resolved_yesterday,
            today_threat: encounter.threat_name,
        })
    }

    /// Typed view of everything stored for a date. Generates nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn export_day(&self, date: NaiveDate) -> Result<DaySnapshot, EngineError> {
        Ok(self.load_day(date)?.snapshot)
    }

    /// Current player record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn player(&self) -> Result<Player, EngineError> {
        let mut player = self.store.load_player().map_err(EngineError::store)?;
        player.sanitize();
        Ok(player)
    }

    /// Equip an inventory item, replacing any other item of its kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails; an unknown index returns `Ok(false)`.
    pub fn equip(&self, index: usize) -> Result<bool, EngineError> {
        let _player = self
            .player_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut player = self.player()?;
        if !player.equip(index) {
            return Ok(false);
        }
        self.store.save_player(&player).map_err(EngineError::store)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::StaticContent;
    use crate::store::MemoryStore;

    fn engine() -> DailyEngine<StaticContent, MemoryStore> {
        DailyEngine::new(StaticContent::with_default(), MemoryStore::new())
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    #[test]
    fn invalid_action_surfaces_and_changes_nothing() {
        let engine = engine();
        let err = engine.resolve_round(date(), "dance", 0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAction(_)));
        assert!(engine.store().dates().unwrap().is_empty());
    }

    #[test]
    fn unknown_theme_falls_back_to_default_content() {
        let engine = DailyEngine::new(
            StaticContent::with_default(),
            MemoryStore::with_player(Player {
                theme_pack: String::from("moon_base"),
                ..Player::default()
            }),
        );
        let encounter = engine.get_or_create_encounter(date()).unwrap();
        assert_ne!(encounter.threat_name, "Unknown Threat");
        assert_eq!(encounter.theme_key, "moon_base");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = EngineConfig {
            max_auto_rounds: 0,
            ..EngineConfig::default()
        };
        let result = DailyEngine::with_config(StaticContent::with_default(), MemoryStore::new(), cfg);
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn export_does_not_generate() {
        let engine = engine();
        let snapshot = engine.export_day(date()).unwrap();
        assert_eq!(snapshot, DaySnapshot::empty(date()));
        assert!(engine.store().dates().unwrap().is_empty());
    }

    #[test]
    fn lock_in_marks_overflow_on_the_fight() {
        let engine = engine();
        engine.log_workout(date(), 100, 60, 40, 9).unwrap();
        let lock_in = engine.lock_in_workout(date()).unwrap().unwrap();
        assert!(lock_in.overflow > 0);
        let snapshot = engine.export_day(date()).unwrap();
        assert_eq!(snapshot.combat.unwrap().overflow_grit, lock_in.overflow);
        assert!(snapshot.workout.unwrap().locked_in);
        assert!(engine.lock_in_workout(date()).unwrap().is_none());
    }

    #[test]
    fn equip_persists_on_the_player() {
        let mut player = Player::default();
        player.inventory.push(crate::player::InventoryItem {
            name: String::from("Patched Buckler"),
            kind: crate::player::ItemKind::Armour,
            effect: crate::player::ItemEffect {
                guard: 1,
                ..Default::default()
            },
            equipped: false,
        });
        let engine = DailyEngine::new(StaticContent::with_default(), MemoryStore::with_player(player));
        assert!(engine.equip(0).unwrap());
        assert!(!engine.equip(3).unwrap());
        assert_eq!(engine.player().unwrap().combat_bonuses().guard, 1);
    }
}
