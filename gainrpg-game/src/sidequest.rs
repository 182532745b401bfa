//! Optional daily side quests.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::DOMAIN_SIDEQUEST;
use crate::content::ThemeBundle;
use crate::seed;
use crate::weighted::choose_weighted;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sidequest {
    pub date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

impl Sidequest {
    /// Mark complete; `false` if it already was.
    pub fn complete(&mut self) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        true
    }
}

/// Weighted pick from the theme's side quest table. Empty table yields `None`.
#[must_use]
pub fn generate_sidequest(
    date: NaiveDate,
    theme_key: &str,
    nonce: u32,
    bundle: &ThemeBundle,
) -> Option<Sidequest> {
    let mut rng = seed::stream(&[
        date.to_string(),
        theme_key.to_string(),
        DOMAIN_SIDEQUEST.to_string(),
        nonce.to_string(),
    ]);
    choose_weighted(&bundle.sidequests, &mut rng).map(|entry| Sidequest {
        date,
        title: entry.title.clone(),
        description: entry.description.clone(),
        completed: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    #[test]
    fn generation_is_deterministic() {
        let bundle = ThemeBundle::default_bundle();
        let a = generate_sidequest(date(), "frontier_kingdom", 0, &bundle);
        let b = generate_sidequest(date(), "frontier_kingdom", 0, &bundle);
        assert!(a.is_some());
        assert_eq!(a, b);
        let title = a.unwrap().title;
        assert!(bundle.sidequests.iter().any(|q| q.title == title));
    }

    #[test]
    fn empty_table_has_no_quest() {
        let mut bundle = ThemeBundle::default_bundle();
        bundle.sidequests.clear();
        assert!(generate_sidequest(date(), "frontier_kingdom", 0, &bundle).is_none());
    }

    #[test]
    fn completes_once() {
        let mut quest = generate_sidequest(date(), "frontier_kingdom", 0, &ThemeBundle::default_bundle()).unwrap();
        assert!(quest.complete());
        assert!(!quest.complete());
    }
}
