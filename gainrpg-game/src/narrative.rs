//! Deterministic flavor text for a resolved fight.
use rand::Rng;
use std::fmt::Write as _;

use crate::combat::Outcome;
use crate::constants::{
    BANK_LEGACY, BANK_OVERFLOW, BANK_RIVAL, BANK_ROMANCE, DOMAIN_NARRATIVE, LEGACY_CHANCE,
    LEGACY_MIN_LEVEL, LEGACY_MIN_RENOWN, RIVAL_BASE_CHANCE, RIVAL_CHANCE_CAP,
    RIVAL_CHANCE_PER_HEAT,
};
use crate::content::ThemeBundle;
use crate::encounter::Encounter;
use crate::player::{Player, RomanceSetting};
use crate::rewards::RewardSummary;
use crate::seed;
use crate::weighted::pick_uniform;

/// Composed text plus the bank its flavor beat came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    pub bank: Option<&'static str>,
    pub beat: String,
    pub text: String,
}

fn rival_chance(heat: u8) -> f64 {
    RIVAL_CHANCE_CAP.min(RIVAL_BASE_CHANCE + f64::from(heat) * RIVAL_CHANCE_PER_HEAT)
}

fn legacy_eligible(player: &Player) -> bool {
    player.level >= LEGACY_MIN_LEVEL || player.renown >= LEGACY_MIN_RENOWN
}

/// Pick which bank the flavor beat comes from, if any.
fn select_bank<R: Rng + ?Sized>(
    outcome: Outcome,
    overflow: bool,
    player: &Player,
    rng: &mut R,
) -> Option<&'static str> {
    let mut bank = if overflow {
        Some(BANK_OVERFLOW)
    } else if player.romance != RomanceSetting::Off && outcome == Outcome::Overwhelm {
        Some(BANK_ROMANCE)
    } else if rng.gen_bool(rival_chance(player.frontier_heat)) {
        Some(BANK_RIVAL)
    } else {
        None
    };
    if legacy_eligible(player) && rng.gen_bool(LEGACY_CHANCE) {
        bank = Some(BANK_LEGACY);
    }
    bank
}

fn headline(outcome: Outcome, threat: &str) -> String {
    match outcome {
        Outcome::Overwhelm => format!("You overwhelmed {threat}."),
        Outcome::Defeat => format!("You defeated {threat}."),
        Outcome::SurvivedWithConsequence => {
            format!("{threat} got the better of you, but you survived.")
        }
        Outcome::Fled => format!("You slipped away from {threat}."),
    }
}

/// The mechanical sentence describing what the fight paid out.
#[must_use]
pub fn reward_sentence(outcome: Outcome, threat: &str, summary: &RewardSummary) -> String {
    let mut text = headline(outcome, threat);
    let _ = write!(text, " Coins +{}", summary.coins_earned);
    if summary.coins_lost > 0 {
        let _ = write!(text, " (-{} lost)", summary.coins_lost);
    }
    let _ = write!(
        text,
        ", heat {:+}, renown {:+}.",
        summary.heat_delta, summary.renown_delta
    );
    if !summary.loot.is_empty() {
        let _ = write!(text, " Loot: {}.", summary.loot.join(", "));
    }
    if summary.level_ups > 0 {
        let _ = write!(text, " Level up x{}!", summary.level_ups);
    }
    text
}

/// Compose the narrative for a resolved fight.
///
/// Seeded by date and outcome only, so the same day and result always read
/// the same. A missing bank yields an empty beat.
#[must_use]
pub fn compose_narrative(
    encounter: &Encounter,
    outcome: Outcome,
    summary: &RewardSummary,
    player: &Player,
    bundle: &ThemeBundle,
) -> Narrative {
    let mut rng = seed::stream(&[
        encounter.date.to_string(),
        DOMAIN_NARRATIVE.to_string(),
        outcome.as_str().to_string(),
    ]);
    let bank = select_bank(outcome, summary.overflow_coins > 0, player, &mut rng);
    let beat = bank
        .and_then(|kind| pick_uniform(bundle.narrative_bank(kind), &mut rng))
        .cloned()
        .unwrap_or_default();

    let mut text = reward_sentence(outcome, &encounter.threat_name, summary);
    if !beat.is_empty() {
        text.push(' ');
        text.push_str(&beat);
    }
    Narrative { bank, beat, text }
}
