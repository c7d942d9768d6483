//! Seeded generator of plausible pools and performance records, for trying
//! the optimizer without a live data source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reward_core::config::DemoConfig;

use crate::performance::PerformanceBook;
use crate::types::{PoolPerformance, PoolRecord, RewardStream, DEFAULT_ELASTICITY};

const PAIRS: &[&str] = &[
    "ETH/USDC", "WBTC/ETH", "ARB/ETH", "USDC/USDT", "GMX/ETH", "LINK/ETH", "OP/USDC", "MAGIC/ETH",
    "DAI/USDC", "RDNT/ETH", "PENDLE/ETH", "UNI/ETH",
];
const FEE_TIERS: &[f64] = &[0.01, 0.05, 0.3, 1.0];
const REWARD_TOKENS: &[&str] = &["ARB", "OP", "GMX", "PENDLE"];

/// A generated pool set and its performance book.
#[derive(Debug, Clone)]
pub struct DemoDataset {
    pub pools: Vec<PoolRecord>,
    pub performance: PerformanceBook,
}

pub struct DemoDataProvider {
    rng: StdRng,
    pool_count: usize,
}

impl DemoDataProvider {
    /// Same seed, same dataset.
    pub fn new(seed: u64, pool_count: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            pool_count: pool_count.min(PAIRS.len()),
        }
    }

    pub fn from_config(config: &DemoConfig) -> Self {
        Self::new(config.seed, config.pool_count)
    }

    pub fn generate(&mut self) -> DemoDataset {
        let mut performance = PerformanceBook::new(DEFAULT_ELASTICITY);
        let mut pools = Vec::with_capacity(self.pool_count);

        for name in PAIRS.iter().take(self.pool_count) {
            let pool = self.pool(name);
            performance.insert(*name, self.performance());
            pools.push(pool);
        }

        DemoDataset { pools, performance }
    }

    fn pool(&mut self, name: &str) -> PoolRecord {
        let fee_tier = FEE_TIERS[self.rng.gen_range(0..FEE_TIERS.len())];
        let stream_count = self.rng.gen_range(1..=3);
        let streams: Vec<RewardStream> = (0..stream_count)
            .map(|_| RewardStream {
                token: REWARD_TOKENS[self.rng.gen_range(0..REWARD_TOKENS.len())].to_string(),
                weekly_amount: self.rng.gen_range(500.0..15_000.0_f64).round(),
            })
            .collect();
        PoolRecord::from_streams(name, fee_tier, &streams)
    }

    fn performance(&mut self) -> PoolPerformance {
        PoolPerformance {
            tvl: self.rng.gen_range(100_000.0..20_000_000.0),
            volume: self.rng.gen_range(10_000.0..2_500_000.0),
            users: self.rng.gen_range(20.0..5_000.0_f64).round(),
            retention: self.rng.gen_range(0.2..0.95),
            engagement: self.rng.gen_range(0.05..0.8),
            elasticity: self.rng.gen_range(0.2..=1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::performance::PerformanceLookup;

    #[test]
    fn test_same_seed_same_data() {
        let a = DemoDataProvider::new(7, 5).generate();
        let b = DemoDataProvider::new(7, 5).generate();
        assert_eq!(a.pools, b.pools);
        assert_eq!(
            a.performance.performance("ETH/USDC"),
            b.performance.performance("ETH/USDC")
        );
    }

    #[test]
    fn test_generated_values_in_range() {
        let data = DemoDataProvider::new(42, 8).generate();
        assert_eq!(data.pools.len(), 8);
        assert_eq!(data.performance.len(), 8);
        for pool in &data.pools {
            assert!(pool.current_emissions >= 500.0);
            assert!(!pool.reward_tokens.is_empty());
            let perf = data.performance.performance(&pool.name);
            assert!((0.0..=1.0).contains(&perf.retention));
            assert!(perf.elasticity > 0.0 && perf.elasticity <= 1.0);
        }
    }

    #[test]
    fn test_pool_count_capped_by_pair_list() {
        let data = DemoDataProvider::new(1, 500).generate();
        assert_eq!(data.pools.len(), PAIRS.len());
    }
}
