//! Weighted and uniform table picks shared by encounters, loot, side quests
//! and narrative selection.
use rand::Rng;

/// Anything that can sit in a weighted table.
pub trait Weighted {
    /// Raw weight as authored; non-positive values count as 1.
    fn raw_weight(&self) -> i32;

    /// Weight used for selection.
    fn effective_weight(&self) -> u32 {
        u32::try_from(self.raw_weight()).ok().filter(|w| *w > 0).unwrap_or(1)
    }
}

/// Pick an entry index by weight.
///
/// Draws a uniform integer in `[1, total]` and scans the running total until
/// the draw falls inside an entry's range. Returns the chosen index and the
/// draw, or `None` for an empty table.
pub fn choose_weighted_index<T: Weighted, R: Rng + ?Sized>(
    entries: &[T],
    rng: &mut R,
) -> Option<(usize, u32)> {
    if entries.is_empty() {
        return None;
    }
    let total: u32 = entries
        .iter()
        .map(Weighted::effective_weight)
        .fold(0_u32, u32::saturating_add);
    let roll = rng.gen_range(1..=total);
    let mut running = 0_u32;
    for (idx, entry) in entries.iter().enumerate() {
        running = running.saturating_add(entry.effective_weight());
        if roll <= running {
            return Some((idx, roll));
        }
    }
    Some((entries.len() - 1, roll))
}

/// Pick an entry by weight, `None` for an empty table.
pub fn choose_weighted<'a, T: Weighted, R: Rng + ?Sized>(
    entries: &'a [T],
    rng: &mut R,
) -> Option<&'a T> {
    choose_weighted_index(entries, rng).and_then(|(idx, _)| entries.get(idx))
}

/// Pick one entry uniformly, `None` for an empty pool.
pub fn pick_uniform<'a, T, R: Rng + ?Sized>(pool: &'a [T], rng: &mut R) -> Option<&'a T> {
    if pool.is_empty() {
        return None;
    }
    pool.get(rng.gen_range(0..pool.len()))
}
