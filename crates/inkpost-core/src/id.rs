//! Identifier allocation
//!
//! Article ids are drawn uniformly from `[1, MAX_ARTICLE_ID)`. Uniqueness is
//! not guaranteed here; the storage engine's absent-precondition is the
//! single serialization point and the writer reseeds after a collision.
//!
//! Each allocator owns its randomness. Concurrent writers should each hold
//! their own allocator (see [`IdAllocator::fork`]) instead of sharing one.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::models::{ArticleId, MAX_ARTICLE_ID};

/// Produces candidate article identifiers
pub struct IdAllocator {
    /// Stream ids are drawn from
    rng: StdRng,
    /// Source of fresh seeds for `reseed` and `fork`
    seeder: StdRng,
    reseeds: u64,
}

impl IdAllocator {
    /// Allocator seeded from OS entropy
    pub fn new() -> Self {
        Self::from_seeder(StdRng::from_entropy())
    }

    /// Deterministic allocator; reseeds and forks are deterministic too
    pub fn with_seed(seed: u64) -> Self {
        Self::from_seeder(StdRng::seed_from_u64(seed))
    }

    fn from_seeder(mut seeder: StdRng) -> Self {
        let rng = StdRng::seed_from_u64(seeder.next_u64());
        Self {
            rng,
            seeder,
            reseeds: 0,
        }
    }

    /// Draw the next candidate id
    pub fn next_id(&mut self) -> ArticleId {
        ArticleId::from_drawn(self.rng.gen_range(1..MAX_ARTICLE_ID))
    }

    /// Discard the current stream and start a new one
    pub fn reseed(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seeder.next_u64());
        self.reseeds += 1;
    }

    /// Independent allocator for another writer
    pub fn fork(&mut self) -> Self {
        Self::from_seeder(StdRng::seed_from_u64(self.seeder.next_u64()))
    }

    /// Number of reseeds since construction
    pub fn reseed_count(&self) -> u64 {
        self.reseeds
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
