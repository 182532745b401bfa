//! Daily encounter generation.
//!
//! An [`Encounter`] is a pure function of date, level, theme, heat, nonce and
//! the boss override; the theme bundle only supplies tables to pick from.
use chrono::{Datelike, NaiveDate, Weekday};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_DEFEAT_TARGET, BOSS_OVERWHELM_MARGIN, DIE_SIDES, DOMAIN_ENCOUNTER, HEAT_MAX, HEAT_MIN,
    HEAT_PER_TIER, OVERWHELM_MARGIN, SCHEMA_VERSION, SINGLE_STAKE_CHANCE, THREAT_DAMAGE_SIDES,
    THRESHOLD_MAX, THRESHOLD_MIN, TIER_MAX, TIER_MIN, UNKNOWN_THREAT, WOBBLE_DOWN_MAX_FACE,
    WOBBLE_UP_MIN_FACE,
};
use crate::content::ThemeBundle;
use crate::seed::{self, SeededRng};
use crate::weighted::{Weighted, choose_weighted, pick_uniform};

/// Special rule a boss brings to round resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossTrait {
    /// Bonus damage on every third round.
    Relentless,
    /// Repeated guarding raises the success threshold.
    Stonewall,
    /// Targets rise once the player has lost half their starting grit.
    SecondWind,
}

impl BossTrait {
    pub const ALL: [Self; 3] = [Self::Relentless, Self::Stonewall, Self::SecondWind];

    /// Serialized name, as stored in encounter documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relentless => "relentless",
            Self::Stonewall => "stonewall",
            Self::SecondWind => "second_wind",
        }
    }
}

/// Numeric twist applied on top of the baseline encounter numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwistEffect {
    LowerThreshold,
    RaiseThreshold,
    ExtraDamage,
    ExtraOverwhelm,
}

impl TwistEffect {
    pub const ALL: [Self; 4] = [
        Self::LowerThreshold,
        Self::RaiseThreshold,
        Self::ExtraDamage,
        Self::ExtraOverwhelm,
    ];
}

impl Weighted for TwistEffect {
    fn raw_weight(&self) -> i32 {
        match self {
            Self::LowerThreshold | Self::RaiseThreshold | Self::ExtraDamage => 2,
            Self::ExtraOverwhelm => 1,
        }
    }
}

const fn current_schema() -> u32 {
    SCHEMA_VERSION
}

/// The generated daily threat and its numeric parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    #[serde(default = "current_schema")]
    pub schema_version: u32,
    pub date: NaiveDate,
    pub nonce: u32,
    pub theme_key: String,
    pub level: u32,
    pub threat_name: String,
    #[serde(default)]
    pub threat_tag: Option<String>,
    pub is_boss: bool,
    pub tier: u8,
    pub success_threshold: u8,
    pub damage: u32,
    pub damage_dice: u32,
    pub defeat_target: u32,
    pub overwhelm_target: u32,
    pub twist_effect: TwistEffect,
    #[serde(default)]
    pub boss_trait: Option<BossTrait>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub situation: String,
    #[serde(default)]
    pub twist: String,
    #[serde(default)]
    pub stakes: Vec<String>,
}

/// Breakdown of how the intensity tier was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntensityPreview {
    pub base: u8,
    pub wobble: i8,
    pub tier: u8,
}

/// Inputs to [`generate_encounter`].
#[derive(Debug, Clone, Copy)]
pub struct EncounterRequest<'a> {
    pub date: NaiveDate,
    pub level: u32,
    pub theme_key: &'a str,
    pub frontier_heat: i32,
    pub nonce: u32,
    pub force_boss: bool,
}

impl<'a> EncounterRequest<'a> {
    /// Request for the unrerolled encounter of a day.
    #[must_use]
    pub const fn daily(date: NaiveDate, level: u32, theme_key: &'a str, frontier_heat: i32) -> Self {
        Self {
            date,
            level,
            theme_key,
            frontier_heat,
            nonce: 0,
            force_boss: false,
        }
    }

    fn stream(&self) -> SeededRng {
        seed::stream(&[
            self.date.to_string(),
            self.theme_key.to_string(),
            DOMAIN_ENCOUNTER.to_string(),
            self.nonce.to_string(),
        ])
    }
}

/// Sundays always bring a boss.
#[must_use]
pub fn is_boss_day(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun
}

fn roll_intensity<R: Rng + ?Sized>(frontier_heat: i32, rng: &mut R) -> IntensityPreview {
    let heat = frontier_heat.clamp(HEAT_MIN, HEAT_MAX);
    let base = 1 + u8::try_from(heat).unwrap_or(0) / HEAT_PER_TIER;
    let face = seed::roll_die(rng, DIE_SIDES);
    let wobble: i8 = if face <= WOBBLE_DOWN_MAX_FACE {
        -1
    } else if face >= WOBBLE_UP_MIN_FACE {
        1
    } else {
        0
    };
    let tier = (i16::from(base) + i16::from(wobble)).clamp(i16::from(TIER_MIN), i16::from(TIER_MAX));
    IntensityPreview {
        base,
        wobble,
        tier: u8::try_from(tier).unwrap_or(TIER_MIN),
    }
}

/// Preview the intensity roll that generation would make for this request.
#[must_use]
pub fn preview_intensity(request: &EncounterRequest<'_>) -> IntensityPreview {
    roll_intensity(request.frontier_heat, &mut request.stream())
}

/// Generate the encounter for a request.
#[must_use]
pub fn generate_encounter(request: &EncounterRequest<'_>, bundle: &ThemeBundle) -> Encounter {
    let mut rng = request.stream();
    let is_boss = request.force_boss || is_boss_day(request.date);
    let intensity = roll_intensity(request.frontier_heat, &mut rng);
    let tier = intensity.tier;

    let threat = choose_weighted(bundle.threat_table(tier, is_boss), &mut rng);
    let threat_name = threat.map_or_else(|| UNKNOWN_THREAT.to_string(), |t| t.name.clone());
    let threat_tag = threat.and_then(|t| t.tag.clone());

    let location = pick_uniform(&bundle.locations, &mut rng).cloned().unwrap_or_default();
    let situation = pick_uniform(&bundle.situations, &mut rng).cloned().unwrap_or_default();
    let twist = pick_uniform(&bundle.twists, &mut rng).cloned().unwrap_or_default();
    let stake_count = if rng.gen_bool(SINGLE_STAKE_CHANCE) { 1 } else { 2 };
    let stakes = if bundle.stakes.len() < stake_count {
        Vec::new()
    } else {
        bundle
            .stakes
            .choose_multiple(&mut rng, stake_count)
            .cloned()
            .collect()
    };

    let boss_step = u8::from(is_boss);
    let mut success_threshold = THRESHOLD_MIN + u8::from(tier >= 2) + boss_step;
    let mut damage = if is_boss {
        seed::roll_sum(&mut rng, 2, THREAT_DAMAGE_SIDES)
    } else {
        seed::roll_sum(&mut rng, 1, THREAT_DAMAGE_SIDES)
    };
    let defeat_target = BASE_DEFEAT_TARGET + u32::from(tier) + u32::from(boss_step);
    let mut overwhelm_target = defeat_target
        + if is_boss {
            BOSS_OVERWHELM_MARGIN
        } else {
            OVERWHELM_MARGIN
        };
    let damage_dice = if is_boss { 2 } else { 1 };

    let twist_effect =
        choose_weighted(&TwistEffect::ALL, &mut rng).map_or(TwistEffect::ExtraDamage, |t| *t);
    match twist_effect {
        TwistEffect::LowerThreshold => success_threshold = success_threshold.saturating_sub(1),
        TwistEffect::RaiseThreshold => success_threshold += 1,
        TwistEffect::ExtraDamage => damage += 1,
        TwistEffect::ExtraOverwhelm => overwhelm_target += 1,
    }
    success_threshold = success_threshold.clamp(THRESHOLD_MIN, THRESHOLD_MAX);

    let boss_trait = if is_boss {
        pick_uniform(&bundle.boss_trait_pool(), &mut rng).copied()
    } else {
        None
    };

    Encounter {
        schema_version: SCHEMA_VERSION,
        date: request.date,
        nonce: request.nonce,
        theme_key: request.theme_key.to_string(),
        level: request.level,
        threat_name,
        threat_tag,
        is_boss,
        tier,
        success_threshold,
        damage,
        damage_dice,
        defeat_target,
        overwhelm_target,
        twist_effect,
        boss_trait,
        location,
        situation,
        twist,
        stakes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2026-10-14 is a Wednesday, 2026-10-18 a Sunday.
    const WEEKDAY: (i32, u32, u32) = (2026, 10, 14);
    const SUNDAY: (i32, u32, u32) = (2026, 10, 18);

    #[test]
    fn boss_trait_names_match_documents() {
        for boss_trait in BossTrait::ALL {
            assert_eq!(
                serde_json::to_value(boss_trait).unwrap(),
                serde_json::Value::from(boss_trait.as_str())
            );
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let bundle = ThemeBundle::default_bundle();
        let d = date(WEEKDAY.0, WEEKDAY.1, WEEKDAY.2);
        let request = EncounterRequest::daily(d, 2, "frontier_kingdom", 4);
        let a = generate_encounter(&request, &bundle);
        let b = generate_encounter(&request, &bundle);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn sunday_brings_a_boss_with_a_trait() {
        let bundle = ThemeBundle::default_bundle();
        let d = date(SUNDAY.0, SUNDAY.1, SUNDAY.2);
        let encounter = generate_encounter(&EncounterRequest::daily(d, 1, "frontier_kingdom", 0), &bundle);
        assert!(encounter.is_boss);
        assert!(encounter.boss_trait.is_some());
        assert_eq!(encounter.damage_dice, 2);
        assert_eq!(encounter.defeat_target, 4 + u32::from(encounter.tier) + 1);
        let margin = encounter.overwhelm_target - encounter.defeat_target;
        let expected = if encounter.twist_effect == TwistEffect::ExtraOverwhelm { 4 } else { 3 };
        assert_eq!(margin, expected);
    }

    #[test]
    fn weekday_numbers_follow_baseline() {
        let bundle = ThemeBundle::default_bundle();
        let d = date(WEEKDAY.0, WEEKDAY.1, WEEKDAY.2);
        for nonce in 0..20 {
            let mut request = EncounterRequest::daily(d, 1, "frontier_kingdom", 6);
            request.nonce = nonce;
            let e = generate_encounter(&request, &bundle);
            assert!(!e.is_boss);
            assert!(e.boss_trait.is_none());
            assert!((1..=4).contains(&e.tier));
            assert!((2..=5).contains(&e.success_threshold));
            assert_eq!(e.damage_dice, 1);
            let damage_cap = if e.twist_effect == TwistEffect::ExtraDamage { 5 } else { 4 };
            assert!((1..=damage_cap).contains(&e.damage));
            assert_eq!(e.defeat_target, 4 + u32::from(e.tier));
            assert!(e.stakes.len() == 1 || e.stakes.len() == 2);
        }
    }

    #[test]
    fn force_boss_overrides_weekday() {
        let bundle = ThemeBundle::default_bundle();
        let d = date(WEEKDAY.0, WEEKDAY.1, WEEKDAY.2);
        let mut request = EncounterRequest::daily(d, 1, "frontier_kingdom", 0);
        request.force_boss = true;
        assert!(generate_encounter(&request, &bundle).is_boss);
    }

    #[test]
    fn preview_matches_generated_tier() {
        let bundle = ThemeBundle::default_bundle();
        let d = date(WEEKDAY.0, WEEKDAY.1, WEEKDAY.2);
        for heat in [0, 3, 7, 12] {
            let request = EncounterRequest::daily(d, 1, "frontier_kingdom", heat);
            let preview = preview_intensity(&request);
            assert_eq!(preview.tier, generate_encounter(&request, &bundle).tier);
        }
    }

    #[test]
    fn heat_raises_base_tier_and_clamps() {
        let d = date(WEEKDAY.0, WEEKDAY.1, WEEKDAY.2);
        let cold = preview_intensity(&EncounterRequest::daily(d, 1, "frontier_kingdom", 0));
        let hot = preview_intensity(&EncounterRequest::daily(d, 1, "frontier_kingdom", 9));
        assert_eq!(cold.base, 1);
        assert_eq!(hot.base, 4);
        let wild = preview_intensity(&EncounterRequest::daily(d, 1, "frontier_kingdom", 99));
        assert_eq!(wild.base, 5);
        assert!(wild.tier <= 4);
        let negative = preview_intensity(&EncounterRequest::daily(d, 1, "frontier_kingdom", -5));
        assert_eq!(negative.base, 1);
    }

    #[test]
    fn empty_tables_yield_unknown_threat_and_no_stakes() {
        let bundle = ThemeBundle::default();
        let d = date(WEEKDAY.0, WEEKDAY.1, WEEKDAY.2);
        let e = generate_encounter(&EncounterRequest::daily(d, 1, "bare", 0), &bundle);
        assert_eq!(e.threat_name, "Unknown Threat");
        assert!(e.stakes.is_empty());
        assert!(e.location.is_empty());
    }

    #[test]
    fn nonce_changes_the_roll() {
        let bundle = ThemeBundle::default_bundle();
        let d = date(WEEKDAY.0, WEEKDAY.1, WEEKDAY.2);
        let base = generate_encounter(&EncounterRequest::daily(d, 1, "frontier_kingdom", 3), &bundle);
        let differs = (1..8).any(|nonce| {
            let mut request = EncounterRequest::daily(d, 1, "frontier_kingdom", 3);
            request.nonce = nonce;
            let other = generate_encounter(&request, &bundle);
            other.threat_name != base.threat_name
                || other.damage != base.damage
                || other.success_threshold != base.success_threshold
                || other.location != base.location
        });
        assert!(differs);
    }
}
