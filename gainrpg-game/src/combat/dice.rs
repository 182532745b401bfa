//! Combat dice: rolling, pushing and counting successes.
use rand::Rng;
use smallvec::SmallVec;

use crate::constants::DIE_SIDES;
use crate::seed;

/// Faces of one round's combat dice, stored inline for typical pool sizes.
pub type DiceFaces = SmallVec<[u8; 4]>;

/// Roll `count` six-sided combat dice.
pub fn roll_pool<R: Rng + ?Sized>(rng: &mut R, count: u32) -> DiceFaces {
    (0..count).map(|_| seed::roll_die(rng, DIE_SIDES)).collect()
}

/// Spend up to `budget` grit raising dice toward 6, one pip per point.
///
/// Dice needing the fewest pips to reach 6 are raised first; ties go to the
/// earlier die. Returns the grit actually spent.
pub fn push_pool(faces: &mut DiceFaces, budget: u32) -> u32 {
    let mut order: SmallVec<[usize; 4]> = (0..faces.len())
        .filter(|idx| faces[*idx] < DIE_SIDES)
        .collect();
    order.sort_by_key(|idx| (DIE_SIDES - faces[*idx], *idx));

    let mut spent = 0;
    for idx in order {
        while faces[idx] < DIE_SIDES && spent < budget {
            faces[idx] += 1;
            spent += 1;
        }
        if spent >= budget {
            break;
        }
    }
    spent
}

/// Count successes: each die at or above the threshold scores 1, a six scores 2.
#[must_use]
pub fn count_successes(faces: &[u8], threshold: u8) -> u32 {
    faces
        .iter()
        .map(|face| match *face {
            DIE_SIDES => 2,
            f if f >= threshold => 1,
            _ => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn sixes_score_double() {
        assert_eq!(count_successes(&[6, 4, 2], 4), 3);
        assert_eq!(count_successes(&[1, 1], 2), 0);
        assert_eq!(count_successes(&[6], 6), 2);
    }

    #[test]
    fn push_prefers_dice_closest_to_six() {
        let mut faces: DiceFaces = smallvec![2, 5, 4];
        let spent = push_pool(&mut faces, 3);
        assert_eq!(spent, 3);
        assert_eq!(faces.as_slice(), &[2, 6, 6]);
    }

    #[test]
    fn push_stops_at_budget_and_skips_sixes() {
        let mut faces: DiceFaces = smallvec![6, 3];
        assert_eq!(push_pool(&mut faces, 2), 2);
        assert_eq!(faces.as_slice(), &[6, 5]);

        let mut maxed: DiceFaces = smallvec![6, 6];
        assert_eq!(push_pool(&mut maxed, 5), 0);
    }

    #[test]
    fn zero_budget_is_a_no_op() {
        let mut faces: DiceFaces = smallvec![1, 2];
        assert_eq!(push_pool(&mut faces, 0), 0);
        assert_eq!(faces.as_slice(), &[1, 2]);
    }

    #[test]
    fn pool_has_requested_size() {
        let mut rng = crate::seed::stream(&["pool"]);
        let faces = roll_pool(&mut rng, 3);
        assert_eq!(faces.len(), 3);
        assert!(faces.iter().all(|f| (1..=6).contains(f)));
    }
}
