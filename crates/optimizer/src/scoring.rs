//! Multi-objective pool scoring.

use crate::types::{OptimizationTarget, PoolPerformance, PoolRecord, TargetType};

// Divisors/multipliers that bring each metric to a comparable magnitude.
const TVL_SCALE: f64 = 1_000_000.0;
const VOLUME_SCALE: f64 = 100_000.0;
const USERS_SCALE: f64 = 100.0;
const RATE_SCALE: f64 = 10.0;

/// Normalized value of one metric. `Balanced` is the mean of the other five.
pub fn normalized_metric(target: TargetType, perf: &PoolPerformance) -> f64 {
    match target {
        TargetType::Tvl => perf.tvl / TVL_SCALE,
        TargetType::Volume => perf.volume / VOLUME_SCALE,
        TargetType::Users => perf.users / USERS_SCALE,
        TargetType::Retention => perf.retention * RATE_SCALE,
        TargetType::Engagement => perf.engagement * RATE_SCALE,
        TargetType::Balanced => {
            let parts = [
                TargetType::Tvl,
                TargetType::Volume,
                TargetType::Users,
                TargetType::Retention,
                TargetType::Engagement,
            ];
            parts.iter().map(|t| normalized_metric(*t, perf)).sum::<f64>() / parts.len() as f64
        }
    }
}

/// Weighted mean of the normalized target metrics. A target list whose
/// weights sum to zero expresses no preference and scores every pool 0.
pub fn score_pool(
    _pool: &PoolRecord,
    perf: &PoolPerformance,
    targets: &[OptimizationTarget],
) -> f64 {
    let total_weight: f64 = targets.iter().map(|t| t.weight).sum();
    if total_weight == 0.0 {
        return 0.0;
    }
    let weighted: f64 = targets
        .iter()
        .map(|t| t.weight * normalized_metric(t.target_type, perf))
        .sum();
    weighted / total_weight
}
