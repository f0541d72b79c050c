//! Deterministic random number generation
//!
//! Every random draw in a game comes from a ChaCha8 stream seeded from
//! (master seed, stream, month), so a saved game replays identically.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Streams used while setting up a new game. Turn systems get a stream
/// keyed by their own name through [`RngManager::named`], so adding a draw
/// in one phase never shifts the values seen by another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RngStream {
    Setup,
    Catalog,
}

impl RngStream {
    fn id(self) -> u64 {
        match self {
            RngStream::Setup => 1,
            RngStream::Catalog => 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RngManager {
    master_seed: u64,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self { master_seed: seed }
    }

    /// A manager seeded from OS entropy, for games without a pinned seed.
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    pub fn seed(&self) -> u64 {
        self.master_seed
    }

    /// Fresh RNG for `stream` at `month`. Calling twice with the same
    /// arguments yields the same sequence.
    pub fn stream(&self, stream: RngStream, month: u32) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.derive_seed(stream.id(), month as u64))
    }

    /// Stream keyed by an arbitrary name, used for per-system draws.
    pub fn named(&self, name: &str, month: u32) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.derive_seed(name_id(name), month as u64))
    }

    fn derive_seed(&self, stream_id: u64, month: u64) -> u64 {
        let mut seed = self.master_seed;
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        seed ^= stream_id.wrapping_mul(1103515245);
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        seed ^= month.wrapping_mul(69069);
        seed
    }
}

// FNV-1a, offset so it never collides with the fixed stream ids.
fn name_id(name: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in name.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash | (1 << 63)
}

/// Helpers for the draws the game actually makes.
pub trait RngExt {
    /// Uniform integer in `[min, max)`; returns `min` when the range is empty.
    fn uniform_i64(&mut self, min: i64, max: i64) -> i64;
    fn uniform_f64(&mut self, min: f64, max: f64) -> f64;
    fn chance(&mut self, probability: f64) -> bool;
}

impl<R: Rng> RngExt for R {
    fn uniform_i64(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        self.gen_range(min..max)
    }

    fn uniform_f64(&mut self, min: f64, max: f64) -> f64 {
        self.gen::<f64>() * (max - min) + min
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.gen::<f64>() < probability
    }
}
