//! Pool, objective, constraint and result types for emission allocation.

use chrono::{DateTime, Utc};
use reward_core::config::OptimizerConfig;
use reward_core::{RewardError, RewardResult};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Reward streams beyond this count are ignored when summing emissions.
pub const MAX_REWARD_STREAMS: usize = 3;

// ─── Pools ──────────────────────────────────────────────────────────────────

/// One weekly reward stream paid to a pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardStream {
    pub token: String,
    pub weekly_amount: f64,
}

/// A pool as supplied by the data provider. `name` is the identity key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolRecord {
    pub name: String,
    /// Swap fee in percent, e.g. `0.3`.
    pub fee_tier: f64,
    /// Current weekly emissions across all reward streams.
    pub current_emissions: f64,
    #[serde(default)]
    pub reward_tokens: Vec<String>,
}

impl PoolRecord {
    pub fn new(name: impl Into<String>, fee_tier: f64, current_emissions: f64) -> Self {
        Self {
            name: name.into(),
            fee_tier,
            current_emissions,
            reward_tokens: Vec::new(),
        }
    }

    /// Build a record from its reward streams. Only the first
    /// [`MAX_REWARD_STREAMS`] streams count.
    pub fn from_streams(name: impl Into<String>, fee_tier: f64, streams: &[RewardStream]) -> Self {
        let name = name.into();
        if streams.len() > MAX_REWARD_STREAMS {
            warn!(
                pool = %name,
                streams = streams.len(),
                max = MAX_REWARD_STREAMS,
                "Extra reward streams ignored"
            );
        }
        let counted = &streams[..streams.len().min(MAX_REWARD_STREAMS)];

        let mut reward_tokens: Vec<String> = Vec::with_capacity(counted.len());
        for stream in counted {
            if !reward_tokens.contains(&stream.token) {
                reward_tokens.push(stream.token.clone());
            }
        }

        Self {
            name,
            fee_tier,
            current_emissions: counted.iter().map(|s| s.weekly_amount.max(0.0)).sum(),
            reward_tokens,
        }
    }
}

/// Observed performance of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolPerformance {
    pub tvl: f64,
    pub volume: f64,
    pub users: f64,
    /// Probability in `[0, 1]`.
    pub retention: f64,
    /// Probability in `[0, 1]`.
    pub engagement: f64,
    /// Responsiveness to emission changes, in `(0, 1]`.
    pub elasticity: f64,
}

pub const DEFAULT_ELASTICITY: f64 = 0.5;

impl PoolPerformance {
    /// Zero metrics with the given elasticity, used for pools without data.
    pub fn neutral(elasticity: f64) -> Self {
        Self {
            tvl: 0.0,
            volume: 0.0,
            users: 0.0,
            retention: 0.0,
            engagement: 0.0,
            elasticity,
        }
    }
}

impl Default for PoolPerformance {
    fn default() -> Self {
        Self::neutral(DEFAULT_ELASTICITY)
    }
}

// ─── Objectives and constraints ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Tvl,
    Volume,
    Users,
    Retention,
    Engagement,
    /// Unweighted mean of the other five.
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizationTarget {
    #[serde(rename = "type")]
    pub target_type: TargetType,
    pub weight: f64,
}

impl OptimizationTarget {
    pub fn new(target_type: TargetType, weight: f64) -> Self {
        Self { target_type, weight }
    }
}

/// Boundary check for caller-built target lists. Not used by the optimizer.
pub fn validate_targets(targets: &[OptimizationTarget]) -> RewardResult<()> {
    for target in targets {
        if !target.weight.is_finite() || target.weight < 0.0 {
            return Err(RewardError::Validation(format!(
                "target {:?} has invalid weight {}",
                target.target_type, target.weight
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationConstraints {
    /// Share of the total one pool may receive, in `(0, 1]`.
    pub max_pool_allocation: f64,
    /// Share of the total every pool receives at minimum, in `[0, 1)`.
    pub min_pool_allocation: f64,
    /// Largest change against current emissions, in percent `[0, 100]`.
    pub max_change_percent: f64,
    pub preserve_top_performers: bool,
    pub focus_underperforming: bool,
}

impl AllocationConstraints {
    /// No bounds at all: allocation follows scores alone.
    pub fn unconstrained() -> Self {
        Self {
            max_pool_allocation: 1.0,
            min_pool_allocation: 0.0,
            max_change_percent: 100.0,
            preserve_top_performers: false,
            focus_underperforming: false,
        }
    }

    pub fn from_config(config: &OptimizerConfig) -> Self {
        Self {
            max_pool_allocation: config.max_pool_allocation,
            min_pool_allocation: config.min_pool_allocation,
            max_change_percent: config.max_change_percent,
            preserve_top_performers: config.preserve_top_performers,
            focus_underperforming: config.focus_underperforming,
        }
    }

    pub fn validate(&self) -> RewardResult<()> {
        if !(self.max_pool_allocation > 0.0 && self.max_pool_allocation <= 1.0) {
            return Err(RewardError::Validation(format!(
                "maxPoolAllocation must be in (0, 1], got {}",
                self.max_pool_allocation
            )));
        }
        if !(self.min_pool_allocation >= 0.0 && self.min_pool_allocation < 1.0) {
            return Err(RewardError::Validation(format!(
                "minPoolAllocation must be in [0, 1), got {}",
                self.min_pool_allocation
            )));
        }
        if !(0.0..=100.0).contains(&self.max_change_percent) {
            return Err(RewardError::Validation(format!(
                "maxChangePercent must be in [0, 100], got {}",
                self.max_change_percent
            )));
        }
        Ok(())
    }
}

impl Default for AllocationConstraints {
    fn default() -> Self {
        Self::from_config(&OptimizerConfig::default())
    }
}

// ─── Inputs ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationParams {
    pub total_emissions: f64,
    pub pools: Vec<PoolRecord>,
    pub targets: Vec<OptimizationTarget>,
    pub constraints: AllocationConstraints,
}

/// Overrides applied on top of base parameters for one simulation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationVariation {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub total_emissions: Option<f64>,
    #[serde(default)]
    pub pools: Option<Vec<PoolRecord>>,
    #[serde(default)]
    pub targets: Option<Vec<OptimizationTarget>>,
    #[serde(default)]
    pub constraints: Option<AllocationConstraints>,
}

impl SimulationVariation {
    /// Shallow merge: every field that is set replaces the base field whole.
    pub fn apply_to(&self, base: &OptimizationParams) -> OptimizationParams {
        OptimizationParams {
            total_emissions: self.total_emissions.unwrap_or(base.total_emissions),
            pools: self.pools.clone().unwrap_or_else(|| base.pools.clone()),
            targets: self.targets.clone().unwrap_or_else(|| base.targets.clone()),
            constraints: self.constraints.unwrap_or(base.constraints),
        }
    }
}

// ─── Results ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedImpact {
    pub tvl: f64,
    pub volume: f64,
    pub users: f64,
    pub retention: f64,
    pub engagement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolOptimizationResult {
    pub name: String,
    pub current_emissions: f64,
    pub suggested_emissions: f64,
    pub change: f64,
    pub change_percent: f64,
    pub projected_impact: ProjectedImpact,
    pub score: f64,
    pub fee_tier: f64,
    pub reward_tokens: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSummary {
    pub pools_increased: usize,
    pub pools_decreased: usize,
    pub pools_unchanged: usize,
    pub max_change_percent: f64,
    pub min_change_percent: f64,
    /// Sum of all positive changes.
    pub total_redistributed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub run_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub total_emissions: f64,
    /// Pools ordered by descending score.
    pub pools: Vec<PoolOptimizationResult>,
    pub projected_impact: ProjectedImpact,
    pub summary: AllocationSummary,
    /// Factor applied in the final rescale. 1.0 means the per-pool bounds
    /// held exactly; any other value may move pools past their bounds.
    pub renormalization_factor: f64,
    /// Every pool was clamped to zero and the budget was split evenly.
    #[serde(default)]
    pub equal_split: bool,
    pub targets: Vec<OptimizationTarget>,
    pub constraints: AllocationConstraints,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(token: &str, amount: f64) -> RewardStream {
        RewardStream {
            token: token.to_string(),
            weekly_amount: amount,
        }
    }

    #[test]
    fn test_from_streams_sums_first_three() {
        let pool = PoolRecord::from_streams(
            "ETH/USDC",
            0.05,
            &[
                stream("ARB", 1_000.0),
                stream("OP", 500.0),
                stream("ARB", 250.0),
                stream("GMX", 9_999.0),
            ],
        );
        assert!((pool.current_emissions - 1_750.0).abs() < f64::EPSILON);
        assert_eq!(pool.reward_tokens, vec!["ARB".to_string(), "OP".to_string()]);
    }

    #[test]
    fn test_missing_performance_defaults_to_moderate_elasticity() {
        let perf = PoolPerformance::default();
        assert_eq!(perf.tvl, 0.0);
        assert!((perf.elasticity - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_constraint_validation() {
        assert!(AllocationConstraints::default().validate().is_ok());
        assert!(AllocationConstraints::unconstrained().validate().is_ok());

        let mut bad = AllocationConstraints::unconstrained();
        bad.max_pool_allocation = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = AllocationConstraints::unconstrained();
        bad.min_pool_allocation = 1.0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_negative_target_weight_rejected() {
        let targets = [
            OptimizationTarget::new(TargetType::Tvl, 50.0),
            OptimizationTarget::new(TargetType::Users, -1.0),
        ];
        assert!(validate_targets(&targets).is_err());
        assert!(validate_targets(&targets[..1]).is_ok());
    }

    #[test]
    fn test_variation_merges_shallowly() {
        let base = OptimizationParams {
            total_emissions: 100.0,
            pools: vec![PoolRecord::new("A", 0.3, 10.0)],
            targets: vec![OptimizationTarget::new(TargetType::Tvl, 1.0)],
            constraints: AllocationConstraints::unconstrained(),
        };
        let variation = SimulationVariation {
            total_emissions: Some(250.0),
            ..Default::default()
        };
        let merged = variation.apply_to(&base);
        assert!((merged.total_emissions - 250.0).abs() < f64::EPSILON);
        assert_eq!(merged.pools, base.pools);
        assert_eq!(merged.targets, base.targets);
    }

    #[test]
    fn test_target_serde_shape() {
        let t: OptimizationTarget =
            serde_json::from_str(r#"{"type": "balanced", "weight": 40}"#).unwrap();
        assert_eq!(t.target_type, TargetType::Balanced);
    }
}
