//! Seed derivation and deterministic random streams.
//!
//! Every stochastic choice in the engine draws from a stream built here from
//! an ordered list of parts: the date, a domain tag, and whatever counters
//! (nonce, round) distinguish one logical step from another.
//!
//! The hash is pinned to SHA-256 over the parts joined with `"::"`, reading
//! the first eight digest bytes big-endian. Streams are `ChaCha20Rng`, which
//! is value-stable across platforms.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

/// Random stream type used throughout the engine.
pub type SeededRng = ChaCha20Rng;

const PART_SEPARATOR: &str = "::";

/// Derive a stable 64-bit seed from ordered string parts.
#[must_use]
pub fn derive_seed<S: AsRef<str>>(parts: &[S]) -> u64 {
    let mut hasher = Sha256::new();
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            hasher.update(PART_SEPARATOR.as_bytes());
        }
        hasher.update(part.as_ref().as_bytes());
    }
    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

/// Build a deterministic random stream from ordered parts.
#[must_use]
pub fn stream<S: AsRef<str>>(parts: &[S]) -> SeededRng {
    SeededRng::seed_from_u64(derive_seed(parts))
}

/// Roll one die with the given number of sides (1-based faces).
pub fn roll_die<R: Rng + ?Sized>(rng: &mut R, sides: u8) -> u8 {
    rng.gen_range(1..=sides.max(1))
}

/// Roll `count` dice and return their sum.
pub fn roll_sum<R: Rng + ?Sized>(rng: &mut R, count: u32, sides: u32) -> u32 {
    (0..count).map(|_| rng.gen_range(1..=sides.max(1))).sum()
}
