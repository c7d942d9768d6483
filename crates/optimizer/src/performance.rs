//! Pool performance lookup. Misses resolve to a neutral record, never an error.

use std::collections::HashMap;

use reward_core::config::OptimizerConfig;
use tracing::debug;

use crate::types::PoolPerformance;

/// Maps a pool name to its performance tuple.
pub trait PerformanceLookup {
    fn performance(&self, pool_name: &str) -> PoolPerformance;
}

impl PerformanceLookup for HashMap<String, PoolPerformance> {
    fn performance(&self, pool_name: &str) -> PoolPerformance {
        self.get(pool_name).copied().unwrap_or_default()
    }
}

/// Performance records keyed by pool name, with a configurable elasticity
/// for pools that have no record.
#[derive(Debug, Clone)]
pub struct PerformanceBook {
    records: HashMap<String, PoolPerformance>,
    default_elasticity: f64,
}

impl PerformanceBook {
    pub fn new(default_elasticity: f64) -> Self {
        Self {
            records: HashMap::new(),
            default_elasticity,
        }
    }

    pub fn from_config(config: &OptimizerConfig) -> Self {
        Self::new(config.default_elasticity)
    }

    pub fn with_records(mut self, records: HashMap<String, PoolPerformance>) -> Self {
        self.records.extend(records);
        self
    }

    pub fn insert(&mut self, pool_name: impl Into<String>, performance: PoolPerformance) {
        self.records.insert(pool_name.into(), performance);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PerformanceLookup for PerformanceBook {
    fn performance(&self, pool_name: &str) -> PoolPerformance {
        match self.records.get(pool_name) {
            Some(perf) => *perf,
            None => {
                debug!(pool = %pool_name, "No performance data, using neutral record");
                PoolPerformance::neutral(self.default_elasticity)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_lookup_defaults_on_miss() {
        let map: HashMap<String, PoolPerformance> = HashMap::new();
        assert_eq!(map.performance("unknown"), PoolPerformance::default());
    }

    #[test]
    fn test_book_uses_configured_elasticity() {
        let mut book = PerformanceBook::new(0.8);
        book.insert(
            "WBTC/ETH",
            PoolPerformance {
                tvl: 5_000_000.0,
                volume: 750_000.0,
                users: 900.0,
                retention: 0.6,
                engagement: 0.4,
                elasticity: 0.3,
            },
        );
        assert!((book.performance("WBTC/ETH").elasticity - 0.3).abs() < f64::EPSILON);
        assert!((book.performance("missing").elasticity - 0.8).abs() < f64::EPSILON);
        assert_eq!(book.len(), 1);
    }
}
