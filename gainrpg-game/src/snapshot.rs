//! Versioned day documents and their decoding.
//!
//! Every stored document carries a `schema_version`. Documents without one
//! are the legacy shape and are migrated on read; unparsable text and
//! unknown versions decode to `None` so the caller regenerates.
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::combat::{CombatState, Outcome};
use crate::constants::{BOSS_OVERWHELM_MARGIN, OVERWHELM_MARGIN, SCHEMA_VERSION};
use crate::encounter::Encounter;
use crate::rewards::RewardSummary;
use crate::sidequest::Sidequest;
use crate::workout::WorkoutLog;

/// Typed view of everything stored for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySnapshot {
    pub date: NaiveDate,
    pub encounter: Option<Encounter>,
    pub combat: Option<CombatState>,
    #[serde(default)]
    pub workout: Option<WorkoutLog>,
    #[serde(default)]
    pub sidequest: Option<Sidequest>,
}

impl DaySnapshot {
    #[must_use]
    pub const fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            encounter: None,
            combat: None,
            workout: None,
            sidequest: None,
        }
    }
}

/// Raw stored documents for one date.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DayDocuments {
    pub encounter: Option<String>,
    pub combat: Option<String>,
    pub workout: Option<String>,
    pub sidequest: Option<String>,
}

impl DayDocuments {
    /// Serialize a snapshot into storable documents.
    ///
    /// # Errors
    ///
    /// Returns an error if any part fails to serialize.
    pub fn encode(snapshot: &DaySnapshot) -> Result<Self, serde_json::Error> {
        Ok(Self {
            encounter: snapshot.encounter.as_ref().map(serde_json::to_string).transpose()?,
            combat: snapshot.combat.as_ref().map(serde_json::to_string).transpose()?,
            workout: snapshot.workout.as_ref().map(serde_json::to_string).transpose()?,
            sidequest: snapshot.sidequest.as_ref().map(serde_json::to_string).transpose()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LegacyEncounter {
    threat_name: String,
    hp: u32,
    damage: u32,
    #[serde(default)]
    tag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyCombat {
    threat_hp: i64,
    #[serde(default)]
    grit_loss: u32,
    #[serde(default)]
    round: u32,
    #[serde(default)]
    complete: bool,
    #[serde(default)]
    outcome: Option<String>,
    #[serde(default)]
    applied: bool,
    #[serde(default)]
    log: Vec<String>,
}

fn parse_versioned(text: &str, kind: &str) -> Option<(u32, Value)> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("corrupt {kind} document discarded: {err}");
            return None;
        }
    };
    if !value.is_object() {
        log::warn!("{kind} document is not an object, discarded");
        return None;
    }
    let version = match value.get("schema_version") {
        None => 0,
        Some(v) => match v.as_u64().and_then(|v| u32::try_from(v).ok()) {
            Some(v) => v,
            None => {
                log::warn!("{kind} document has an invalid schema version, discarded");
                return None;
            }
        },
    };
    Some((version, value))
}

fn from_value<T: DeserializeOwned>(value: Value, kind: &str) -> Option<T> {
    serde_json::from_value(value)
        .map_err(|err| log::warn!("{kind} document does not match its schema: {err}"))
        .ok()
}

/// Decode a stored encounter.
///
/// Legacy documents only carried a threat name, hit points, damage and tag;
/// `regenerate` supplies the modern baseline they are folded into.
pub fn decode_encounter<F>(text: &str, regenerate: F) -> Option<Encounter>
where
    F: FnOnce() -> Encounter,
{
    let (version, value) = parse_versioned(text, "encounter")?;
    match version {
        0 => {
            let legacy: LegacyEncounter = from_value(value, "legacy encounter")?;
            let mut encounter = regenerate();
            let margin = if encounter.is_boss {
                BOSS_OVERWHELM_MARGIN
            } else {
                OVERWHELM_MARGIN
            };
            encounter.threat_name = legacy.threat_name;
            encounter.threat_tag = legacy.tag;
            encounter.damage = legacy.damage;
            encounter.defeat_target = legacy.hp.max(1);
            encounter.overwhelm_target = encounter.defeat_target + margin;
            encounter.schema_version = SCHEMA_VERSION;
            log::info!("migrated legacy encounter for {}", encounter.date);
            Some(encounter)
        }
        SCHEMA_VERSION => from_value(value, "encounter"),
        other => {
            log::warn!("encounter document has unknown schema version {other}, discarded");
            None
        }
    }
}

fn legacy_outcome(raw: Option<&str>) -> Outcome {
    match raw {
        Some("overwhelm") => Outcome::Overwhelm,
        Some("defeat") => Outcome::Defeat,
        Some("fled") => Outcome::Fled,
        _ => Outcome::SurvivedWithConsequence,
    }
}

/// Decode a stored combat state for `encounter`.
///
/// Legacy states tracked threat hit points; damage dealt becomes banked
/// successes against the migrated defeat target.
pub fn decode_combat(text: &str, encounter: &Encounter) -> Option<CombatState> {
    let (version, value) = parse_versioned(text, "combat")?;
    let state = match version {
        0 => {
            let legacy: LegacyCombat = from_value(value, "legacy combat")?;
            let mut state = CombatState::new(encounter);
            let remaining_hp = u32::try_from(legacy.threat_hp.max(0)).unwrap_or(u32::MAX);
            state.accumulated_successes = encounter.defeat_target.saturating_sub(remaining_hp);
            state.grit_loss = legacy.grit_loss;
            state.round = legacy.round;
            state.log = legacy.log;
            if legacy.complete {
                state.complete(legacy_outcome(legacy.outcome.as_deref()));
                if legacy.applied {
                    state.mark_applied(RewardSummary::default());
                }
            }
            state
        }
        SCHEMA_VERSION => from_value::<CombatState>(value, "combat")?,
        other => {
            log::warn!("combat document has unknown schema version {other}, discarded");
            return None;
        }
    };
    if state.date != encounter.date || state.encounter_nonce != encounter.nonce {
        log::warn!("combat document does not belong to the stored encounter, discarded");
        return None;
    }
    Some(state)
}

/// Decode a current-version document with no legacy shape.
pub fn decode_plain<T: DeserializeOwned>(text: &str, kind: &str) -> Option<T> {
    let (version, mut value) = parse_versioned(text, kind)?;
    if version > SCHEMA_VERSION {
        log::warn!("{kind} document has unknown schema version {version}, discarded");
        return None;
    }
    if let Some(object) = value.as_object_mut() {
        object.remove("schema_version");
    }
    from_value(value, kind)
}
