//! Access plans: the order in which blocks of the region are visited.
//!
//! A plan always covers the whole region (`region_size / block_size`
//! slots). The driver consumes only the first `access_size / block_size`
//! entries, so a random plan samples a uniformly chosen subset of the region
//! in a uniformly chosen order.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::{BenchmarkConfig, Pattern};

/// Ordered block indices for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPlan {
    pattern: Pattern,
    indices: Vec<u64>,
}

impl AccessPlan {
    /// The identity ordering `0, 1, ..., block_count - 1`.
    pub fn sequential(block_count: u64) -> Self {
        Self {
            pattern: Pattern::Sequential,
            indices: (0..block_count).collect(),
        }
    }

    /// A uniform random permutation of `0..block_count`.
    ///
    /// Built as the identity ordering followed by an in-place Fisher-Yates
    /// shuffle, so every index appears exactly once and every permutation is
    /// equally likely given a uniform `rng`.
    pub fn random<R: Rng + ?Sized>(block_count: u64, rng: &mut R) -> Self {
        let mut indices: Vec<u64> = (0..block_count).collect();
        indices.shuffle(rng);
        Self {
            pattern: Pattern::Random,
            indices,
        }
    }

    /// Builds a plan for `pattern`.
    ///
    /// A `seed` makes random plans reproducible; without one the generator
    /// is seeded from the operating system.
    pub fn build(pattern: Pattern, block_count: u64, seed: Option<u64>) -> Self {
        match pattern {
            Pattern::Sequential => Self::sequential(block_count),
            Pattern::Random => {
                let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
                Self::random(block_count, &mut rng)
            }
        }
    }

    /// Builds the plan covering the region described by `config`.
    pub fn for_config(config: &BenchmarkConfig, seed: Option<u64>) -> Self {
        Self::build(config.pattern(), config.region_block_count(), seed)
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    /// Number of block slots in the plan.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[u64] {
        &self.indices
    }

    /// Byte offsets of the first `limit` entries for transfers of
    /// `block_size` bytes.
    pub fn offsets(&self, block_size: u64, limit: usize) -> impl Iterator<Item = u64> + '_ {
        self.indices
            .iter()
            .take(limit)
            .map(move |&index| index * block_size)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn sequential_is_identity() {
        let plan = AccessPlan::sequential(5);
        assert_eq!(plan.indices(), &[0, 1, 2, 3, 4]);
        assert_eq!(plan.pattern(), Pattern::Sequential);
    }

    #[test]
    fn empty_and_single_block_plans() {
        assert!(AccessPlan::sequential(0).is_empty());
        assert!(AccessPlan::build(Pattern::Random, 0, Some(1)).is_empty());
        assert_eq!(AccessPlan::build(Pattern::Random, 1, None).indices(), &[0]);
    }

    #[test]
    fn offsets_are_truncated_and_scaled() {
        let plan = AccessPlan::sequential(16);
        let offsets: Vec<u64> = plan.offsets(65536, 4).collect();
        assert_eq!(offsets, vec![0, 65536, 131_072, 196_608]);
    }

    #[test]
    fn seeded_plans_are_reproducible() {
        let a = AccessPlan::build(Pattern::Random, 1000, Some(42));
        let b = AccessPlan::build(Pattern::Random, 1000, Some(42));
        assert_eq!(a, b);
    }

    #[test]
    fn random_plan_differs_from_identity() {
        let plan = AccessPlan::build(Pattern::Random, 4096, None);
        let identity = AccessPlan::sequential(4096);
        assert_ne!(plan.indices(), identity.indices());
        assert_eq!(plan.pattern(), Pattern::Random);
    }

    proptest! {
        /// A random plan contains every index of the region exactly once.
        #[test]
        fn prop_random_plan_is_permutation(block_count in 0u64..2048, seed in any::<u64>()) {
            let plan = AccessPlan::build(Pattern::Random, block_count, Some(seed));
            prop_assert_eq!(plan.len() as u64, block_count);

            let mut sorted = plan.indices().to_vec();
            sorted.sort_unstable();
            prop_assert_eq!(sorted, AccessPlan::sequential(block_count).indices().to_vec());
        }

        /// The first `limit` offsets are distinct block-aligned positions inside the region.
        #[test]
        fn prop_offsets_stay_in_region(
            block_count in 1u64..1024,
            block_shift in 9u32..17,
            seed in any::<u64>(),
        ) {
            let block_size = 1u64 << block_shift;
            let limit = (block_count / 2).max(1) as usize;
            let plan = AccessPlan::build(Pattern::Random, block_count, Some(seed));

            let offsets: Vec<u64> = plan.offsets(block_size, limit).collect();
            prop_assert_eq!(offsets.len(), limit);
            for &offset in &offsets {
                prop_assert_eq!(offset % block_size, 0);
                prop_assert!(offset < block_count * block_size);
            }
            let mut unique = offsets.clone();
            unique.sort_unstable();
            unique.dedup();
            prop_assert_eq!(unique.len(), offsets.len());
        }
    }
}
