//! Named allocation strategies: canned target weights plus constraints.

use std::fmt;
use std::str::FromStr;

use reward_core::RewardError;
use serde::{Deserialize, Serialize};

use crate::types::{AllocationConstraints, OptimizationTarget, TargetType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyPreset {
    TvlGrowth,
    VolumeBoost,
    UserAcquisition,
    RetentionFocus,
    Balanced,
}

impl StrategyPreset {
    pub const ALL: [StrategyPreset; 5] = [
        StrategyPreset::TvlGrowth,
        StrategyPreset::VolumeBoost,
        StrategyPreset::UserAcquisition,
        StrategyPreset::RetentionFocus,
        StrategyPreset::Balanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyPreset::TvlGrowth => "tvl_growth",
            StrategyPreset::VolumeBoost => "volume_boost",
            StrategyPreset::UserAcquisition => "user_acquisition",
            StrategyPreset::RetentionFocus => "retention_focus",
            StrategyPreset::Balanced => "balanced",
        }
    }

    /// Target weights, expressed as percentages.
    pub fn targets(&self) -> Vec<OptimizationTarget> {
        use TargetType::*;
        let weights: &[(TargetType, f64)] = match self {
            StrategyPreset::TvlGrowth => &[(Tvl, 70.0), (Volume, 20.0), (Retention, 10.0)],
            StrategyPreset::VolumeBoost => &[(Volume, 70.0), (Tvl, 20.0), (Engagement, 10.0)],
            StrategyPreset::UserAcquisition => &[(Users, 60.0), (Engagement, 25.0), (Volume, 15.0)],
            StrategyPreset::RetentionFocus => {
                &[(Retention, 60.0), (Engagement, 30.0), (Users, 10.0)]
            }
            StrategyPreset::Balanced => &[(Balanced, 100.0)],
        };
        weights
            .iter()
            .map(|(t, w)| OptimizationTarget::new(*t, *w))
            .collect()
    }

    /// Constraints layered over `base`. Aggressive presets widen the change
    /// band; retention keeps emissions steady.
    pub fn constraints(&self, base: AllocationConstraints) -> AllocationConstraints {
        match self {
            StrategyPreset::TvlGrowth => AllocationConstraints {
                preserve_top_performers: true,
                ..base
            },
            StrategyPreset::VolumeBoost => AllocationConstraints {
                max_change_percent: base.max_change_percent.max(75.0),
                focus_underperforming: true,
                ..base
            },
            StrategyPreset::UserAcquisition => AllocationConstraints {
                min_pool_allocation: base.min_pool_allocation.max(0.02),
                ..base
            },
            StrategyPreset::RetentionFocus => AllocationConstraints {
                max_change_percent: base.max_change_percent.min(20.0),
                preserve_top_performers: true,
                ..base
            },
            StrategyPreset::Balanced => base,
        }
    }
}

impl fmt::Display for StrategyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyPreset {
    type Err = RewardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| RewardError::Validation(format!("unknown strategy preset: {}", s)))
    }
}
