//! Player record, inventory and equipment bonuses.
use serde::{Deserialize, Serialize};

use crate::constants::{HEAT_MAX, HEAT_MIN};
use crate::content::{DEFAULT_THEME_KEY, LootEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Weapon,
    Armour,
    Trinket,
}

/// Combat modifiers granted by an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ItemEffect {
    #[serde(default)]
    pub attack: i32,
    #[serde(default)]
    pub guard: i32,
    #[serde(default)]
    pub grit_bonus: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub effect: ItemEffect,
    #[serde(default)]
    pub equipped: bool,
}

impl From<&LootEntry> for InventoryItem {
    fn from(entry: &LootEntry) -> Self {
        Self {
            name: entry.name.clone(),
            kind: entry.kind,
            effect: entry.effect,
            equipped: false,
        }
    }
}

/// Summed bonuses of every equipped item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CombatBonuses {
    pub attack: i32,
    pub guard: i32,
    pub grit_bonus: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RomanceSetting {
    #[default]
    Off,
    Light,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub level: u32,
    pub weeks_completed: u32,
    pub weeks_required: u32,
    pub grit_current: u32,
    pub grit_max: u32,
    pub coins: u32,
    pub campfire_tokens: u32,
    pub frontier_heat: u8,
    pub renown: u32,
    pub theme_pack: String,
    #[serde(default)]
    pub romance: RomanceSetting,
    #[serde(default)]
    pub sidequests_completed: u32,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            name: String::from("Adventurer"),
            level: 1,
            weeks_completed: 0,
            weeks_required: 1,
            grit_current: 5,
            grit_max: 5,
            coins: 0,
            campfire_tokens: 0,
            frontier_heat: 0,
            renown: 0,
            theme_pack: String::from(DEFAULT_THEME_KEY),
            romance: RomanceSetting::Off,
            sidequests_completed: 0,
            inventory: Vec::new(),
        }
    }
}

impl Player {
    /// Sum the effects of equipped items.
    #[must_use]
    pub fn combat_bonuses(&self) -> CombatBonuses {
        self.inventory
            .iter()
            .filter(|item| item.equipped)
            .fold(CombatBonuses::default(), |acc, item| CombatBonuses {
                attack: acc.attack + item.effect.attack,
                guard: acc.guard + item.effect.guard,
                grit_bonus: acc.grit_bonus + item.effect.grit_bonus,
            })
    }

    /// Equip the item at `index`, unequipping anything else of its kind.
    /// Returns `false` for an unknown index.
    pub fn equip(&mut self, index: usize) -> bool {
        let Some(kind) = self.inventory.get(index).map(|item| item.kind) else {
            return false;
        };
        for (idx, item) in self.inventory.iter_mut().enumerate() {
            if item.kind == kind {
                item.equipped = idx == index;
            }
        }
        true
    }

    /// Shift frontier heat, clamped to its valid band.
    pub fn adjust_heat(&mut self, delta: i32) {
        let next = (i32::from(self.frontier_heat) + delta).clamp(HEAT_MIN, HEAT_MAX);
        self.frontier_heat = u8::try_from(next).unwrap_or(0);
    }

    /// Shift renown, floored at zero.
    pub fn adjust_renown(&mut self, delta: i32) {
        self.renown = self.renown.saturating_add_signed(delta);
    }

    /// Spend one campfire token; `false` when none are left.
    pub fn spend_token(&mut self) -> bool {
        if self.campfire_tokens == 0 {
            return false;
        }
        self.campfire_tokens -= 1;
        true
    }

    /// Restore grit up to the current maximum and return any overflow.
    pub fn restore_grit(&mut self, amount: u32) -> u32 {
        let raised = self.grit_current.saturating_add(amount);
        self.grit_current = raised.min(self.grit_max);
        raised.saturating_sub(self.grit_max)
    }

    /// Clamp externally-edited fields back into range.
    pub fn sanitize(&mut self) {
        self.frontier_heat = self.frontier_heat.min(HEAT_MAX as u8);
        self.level = self.level.max(1);
        self.weeks_required = self.weeks_required.max(1);
        self.grit_current = self.grit_current.min(self.grit_max);
    }
}
