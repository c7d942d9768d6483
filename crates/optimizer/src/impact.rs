//! Projected impact of an emission change on pool performance.

use crate::types::{PoolPerformance, ProjectedImpact};

/// Projects a pool's performance under a new emission level. Swappable so
/// the allocation algorithm does not depend on one response model.
pub trait ImpactModel {
    fn project(&self, baseline: &PoolPerformance, current: f64, suggested: f64) -> ProjectedImpact;
}

/// Linear response scaled by the pool's elasticity.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearElasticityModel;

impl LinearElasticityModel {
    /// `1 + (ratio - 1) * e` when growing, `1 - (1 - ratio) * e` when shrinking.
    pub fn multiplier(ratio: f64, elasticity: f64) -> f64 {
        if ratio >= 1.0 {
            1.0 + (ratio - 1.0) * elasticity
        } else {
            1.0 - (1.0 - ratio) * elasticity
        }
    }
}

impl ImpactModel for LinearElasticityModel {
    fn project(&self, baseline: &PoolPerformance, current: f64, suggested: f64) -> ProjectedImpact {
        // No baseline emissions to scale from.
        let ratio = if current > 0.0 { suggested / current } else { 1.0 };
        let m = Self::multiplier(ratio, baseline.elasticity);
        ProjectedImpact {
            tvl: baseline.tvl * m,
            volume: baseline.volume * m,
            users: baseline.users * m,
            retention: (baseline.retention * m).min(1.0),
            engagement: (baseline.engagement * m).min(1.0),
        }
    }
}

impl<F> ImpactModel for F
where
    F: Fn(&PoolPerformance, f64, f64) -> ProjectedImpact,
{
    fn project(&self, baseline: &PoolPerformance, current: f64, suggested: f64) -> ProjectedImpact {
        self(baseline, current, suggested)
    }
}

/// Sum for tvl/volume/users, mean for retention/engagement.
pub fn aggregate_impact<'a, I>(impacts: I) -> ProjectedImpact
where
    I: IntoIterator<Item = &'a ProjectedImpact>,
{
    let mut total = ProjectedImpact::default();
    let mut count = 0usize;
    for impact in impacts {
        total.tvl += impact.tvl;
        total.volume += impact.volume;
        total.users += impact.users;
        total.retention += impact.retention;
        total.engagement += impact.engagement;
        count += 1;
    }
    if count > 0 {
        total.retention /= count as f64;
        total.engagement /= count as f64;
    }
    total
}
