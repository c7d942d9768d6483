//! Emission allocation optimizer: score, allocate proportionally, clamp to
//! constraints, then rescale so the allocation sums to the requested budget.

use std::cmp::Ordering;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::impact::{aggregate_impact, ImpactModel, LinearElasticityModel};
use crate::performance::PerformanceLookup;
use crate::scoring::score_pool;
use crate::types::*;

/// Changes smaller than this count as unchanged.
pub const CHANGE_EPSILON: f64 = 1e-6;

/// Scores above `TOP_PERFORMER_RATIO × mean` are never cut when
/// `preserve_top_performers` is set.
pub const TOP_PERFORMER_RATIO: f64 = 1.5;
/// Scores below `UNDERPERFORMER_RATIO × mean` are capped at
/// `UNDERPERFORMER_CAP × current` when `focus_underperforming` is set.
pub const UNDERPERFORMER_RATIO: f64 = 0.5;
pub const UNDERPERFORMER_CAP: f64 = 0.8;

/// Stateless across calls; every run is independent.
pub struct EmissionOptimizer<M = LinearElasticityModel> {
    impact_model: M,
}

impl EmissionOptimizer<LinearElasticityModel> {
    pub fn new() -> Self {
        Self {
            impact_model: LinearElasticityModel,
        }
    }
}

impl Default for EmissionOptimizer<LinearElasticityModel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ImpactModel> EmissionOptimizer<M> {
    pub fn with_impact_model(impact_model: M) -> Self {
        Self { impact_model }
    }

    /// Compute a new allocation of `params.total_emissions` across the pools.
    /// Degenerate inputs (no pools, zero budget) yield degenerate results.
    pub fn optimize_rewards<L>(
        &self,
        params: &OptimizationParams,
        lookup: &L,
    ) -> OptimizationResult
    where
        L: PerformanceLookup + ?Sized,
    {
        let total = params.total_emissions;
        let performances: Vec<PoolPerformance> = params
            .pools
            .iter()
            .map(|p| lookup.performance(&p.name))
            .collect();

        // Phase 1: score.
        let scores: Vec<f64> = params
            .pools
            .iter()
            .zip(&performances)
            .map(|(pool, perf)| score_pool(pool, perf, &params.targets))
            .collect();

        // Phase 2 + 3: proportional share, then per-pool clamps.
        let base = base_allocations(total, &scores);
        let mut suggested =
            apply_constraints(total, &params.pools, &scores, base, &params.constraints);

        // Phase 4: restore the budget.
        let renormalization = renormalize(total, &mut suggested);

        let mut pools: Vec<PoolOptimizationResult> = params
            .pools
            .iter()
            .zip(&performances)
            .zip(scores.iter().zip(&suggested))
            .map(|((pool, perf), (score, suggested))| {
                let change = suggested - pool.current_emissions;
                PoolOptimizationResult {
                    name: pool.name.clone(),
                    current_emissions: pool.current_emissions,
                    suggested_emissions: *suggested,
                    change,
                    change_percent: change_percent(pool.current_emissions, *suggested),
                    projected_impact: self.impact_model.project(
                        perf,
                        pool.current_emissions,
                        *suggested,
                    ),
                    score: *score,
                    fee_tier: pool.fee_tier,
                    reward_tokens: pool.reward_tokens.clone(),
                }
            })
            .collect();

        pools.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        let projected_impact = aggregate_impact(pools.iter().map(|p| &p.projected_impact));
        let summary = summarize(&pools);

        metrics::counter!("optimizer.runs").increment(1);
        debug!(
            pools = pools.len(),
            total_emissions = total,
            factor = renormalization.factor,
            equal_split = renormalization.equal_split,
            increased = summary.pools_increased,
            decreased = summary.pools_decreased,
            "Emission allocation optimized"
        );

        OptimizationResult {
            run_id: Uuid::new_v4(),
            label: None,
            total_emissions: total,
            pools,
            projected_impact,
            summary,
            renormalization_factor: renormalization.factor,
            equal_split: renormalization.equal_split,
            targets: params.targets.clone(),
            constraints: params.constraints,
            generated_at: Utc::now(),
        }
    }

    /// Run the optimizer once per variation, each merged over `base`.
    pub fn run_simulations<L>(
        &self,
        base: &OptimizationParams,
        variations: &[SimulationVariation],
        lookup: &L,
    ) -> Vec<OptimizationResult>
    where
        L: PerformanceLookup + ?Sized,
    {
        metrics::counter!("optimizer.simulations").increment(variations.len() as u64);
        info!(variations = variations.len(), "Running allocation simulations");

        variations
            .iter()
            .map(|variation| {
                let params = variation.apply_to(base);
                let mut result = self.optimize_rewards(&params, lookup);
                result.label = variation.label.clone();
                result
            })
            .collect()
    }
}

/// `total × score / Σ scores`. When every score is 0 each pool starts at 0
/// and the constraints alone shape the allocation.
pub fn base_allocations(total: f64, scores: &[f64]) -> Vec<f64> {
    let score_sum: f64 = scores.iter().sum();
    if score_sum > 0.0 {
        scores.iter().map(|s| total * (s / score_sum)).collect()
    } else {
        vec![0.0; scores.len()]
    }
}

/// Per-pool clamps, in order: share bounds, max change, top-performer floor,
/// underperformer cap. Pools are clamped independently of each other.
pub fn apply_constraints(
    total: f64,
    pools: &[PoolRecord],
    scores: &[f64],
    base: Vec<f64>,
    constraints: &AllocationConstraints,
) -> Vec<f64> {
    let mean_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };
    let floor = total * constraints.min_pool_allocation;
    let ceiling = total * constraints.max_pool_allocation;

    base.into_iter()
        .zip(pools.iter().zip(scores))
        .map(|(mut suggested, (pool, score))| {
            let current = pool.current_emissions;

            suggested = suggested.max(floor).min(ceiling);

            if constraints.max_change_percent < 100.0 {
                let band = constraints.max_change_percent / 100.0;
                suggested = suggested
                    .max(current * (1.0 - band))
                    .min(current * (1.0 + band));
            }

            if constraints.preserve_top_performers && *score > TOP_PERFORMER_RATIO * mean_score {
                suggested = suggested.max(current);
            }

            if constraints.focus_underperforming && *score < UNDERPERFORMER_RATIO * mean_score {
                suggested = suggested.min(current * UNDERPERFORMER_CAP);
            }

            suggested
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renormalization {
    pub factor: f64,
    /// Every pool was clamped to zero and the budget was split evenly.
    pub equal_split: bool,
}

/// Rescale so the allocations sum to `total`. Rounding residue is assigned
/// to the largest allocation.
pub fn renormalize(total: f64, allocations: &mut [f64]) -> Renormalization {
    if allocations.is_empty() {
        return Renormalization {
            factor: 1.0,
            equal_split: false,
        };
    }

    let sum: f64 = allocations.iter().sum();
    if sum <= 0.0 {
        let share = total / allocations.len() as f64;
        if total > 0.0 {
            warn!(
                pools = allocations.len(),
                "All pools clamped to zero, splitting budget evenly"
            );
        }
        allocations.iter_mut().for_each(|a| *a = share);
        return Renormalization {
            factor: 1.0,
            equal_split: total > 0.0,
        };
    }

    let factor = total / sum;
    allocations.iter_mut().for_each(|a| *a *= factor);

    let residual = total - allocations.iter().sum::<f64>();
    if residual != 0.0 {
        if let Some(largest) = allocations
            .iter_mut()
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        {
            *largest += residual;
        }
    }

    Renormalization {
        factor,
        equal_split: false,
    }
}

fn change_percent(current: f64, suggested: f64) -> f64 {
    if current > 0.0 {
        (suggested - current) / current * 100.0
    } else if suggested > 0.0 {
        100.0
    } else {
        0.0
    }
}

fn summarize(pools: &[PoolOptimizationResult]) -> AllocationSummary {
    if pools.is_empty() {
        return AllocationSummary::default();
    }

    let mut summary = AllocationSummary {
        max_change_percent: f64::MIN,
        min_change_percent: f64::MAX,
        ..Default::default()
    };
    for pool in pools {
        if pool.change > CHANGE_EPSILON {
            summary.pools_increased += 1;
            summary.total_redistributed += pool.change;
        } else if pool.change < -CHANGE_EPSILON {
            summary.pools_decreased += 1;
        } else {
            summary.pools_unchanged += 1;
        }
        summary.max_change_percent = summary.max_change_percent.max(pool.change_percent);
        summary.min_change_percent = summary.min_change_percent.min(pool.change_percent);
    }
    summary
}
