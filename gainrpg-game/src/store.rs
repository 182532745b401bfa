//! Persistence seam for player and per-day documents.
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

use crate::player::Player;
use crate::snapshot::DayDocuments;

/// Trait for abstracting persistence of the player and daily documents.
/// Platform-specific implementations should provide this.
pub trait DailyStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the player record, or a fresh one if none exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read.
    fn load_player(&self) -> Result<Player, Self::Error>;

    /// Load the raw documents stored for a date.
    ///
    /// # Errors
    ///
    /// Returns an error if the documents cannot be read.
    fn load_day(&self, date: NaiveDate) -> Result<DayDocuments, Self::Error>;

    /// Write a day's documents and the player as one atomic unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; nothing is persisted in that case.
    fn commit_day(
        &self,
        date: NaiveDate,
        documents: &DayDocuments,
        player: &Player,
    ) -> Result<(), Self::Error>;

    /// Write the player record alone, for changes not tied to a day.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn save_player(&self, player: &Player) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("memory store lock was poisoned")]
    Poisoned,
}

#[derive(Debug, Default)]
struct MemoryInner {
    player: Option<Player>,
    days: BTreeMap<NaiveDate, DayDocuments>,
}

/// Store that keeps everything in memory. Commits swap the whole day at once.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an existing player.
    #[must_use]
    pub fn with_player(player: Player) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                player: Some(player),
                days: BTreeMap::new(),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryInner>, MemoryStoreError> {
        self.inner.lock().map_err(|_| MemoryStoreError::Poisoned)
    }

    /// Overwrite a raw document, bypassing the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn put_raw(
        &self,
        date: NaiveDate,
        edit: impl FnOnce(&mut DayDocuments),
    ) -> Result<(), MemoryStoreError> {
        let mut inner = self.lock()?;
        edit(inner.days.entry(date).or_default());
        Ok(())
    }

    /// Dates that have any stored documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn dates(&self) -> Result<Vec<NaiveDate>, MemoryStoreError> {
        Ok(self.lock()?.days.keys().copied().collect())
    }
}

impl DailyStore for MemoryStore {
    type Error = MemoryStoreError;

    fn load_player(&self) -> Result<Player, Self::Error> {
        Ok(self.lock()?.player.clone().unwrap_or_default())
    }

    fn load_day(&self, date: NaiveDate) -> Result<DayDocuments, Self::Error> {
        Ok(self.lock()?.days.get(&date).cloned().unwrap_or_default())
    }

    fn commit_day(
        &self,
        date: NaiveDate,
        documents: &DayDocuments,
        player: &Player,
    ) -> Result<(), Self::Error> {
        let mut inner = self.lock()?;
        inner.days.insert(date, documents.clone());
        inner.player = Some(player.clone());
        Ok(())
    }

    fn save_player(&self, player: &Player) -> Result<(), Self::Error> {
        self.lock()?.player = Some(player.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_replaces_day_and_player_together() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        assert_eq!(store.load_day(date).unwrap(), DayDocuments::default());
        assert_eq!(store.load_player().unwrap(), Player::default());

        let mut player = Player::default();
        player.coins = 9;
        let docs = DayDocuments {
            encounter: Some(String::from("{}")),
            ..DayDocuments::default()
        };
        store.commit_day(date, &docs, &player).unwrap();
        assert_eq!(store.load_day(date).unwrap(), docs);
        assert_eq!(store.load_player().unwrap().coins, 9);
        assert_eq!(store.dates().unwrap(), vec![date]);
    }

    #[test]
    fn raw_edits_touch_only_the_day() {
        let store = MemoryStore::with_player(Player {
            coins: 3,
            ..Player::default()
        });
        let date = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        store
            .put_raw(date, |docs| docs.combat = Some(String::from("garbage")))
            .unwrap();
        assert_eq!(store.load_day(date).unwrap().combat.as_deref(), Some("garbage"));
        assert_eq!(store.load_player().unwrap().coins, 3);
    }
}
