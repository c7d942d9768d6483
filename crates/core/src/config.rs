use std::path::Path;

use serde::Deserialize;

use crate::error::{RewardError, RewardResult};

/// Root application configuration. Loaded from environment variables
/// with the prefix `REWARD_LAB__` and an optional TOML/JSON config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

fn default_node_id() -> String {
    "node-01".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            segmentation: SegmentationConfig::default(),
            optimizer: OptimizerConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

// ─── Segmentation Config ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SegmentationConfig {
    /// Seed the engine with the built-in patterns and segments.
    #[serde(default = "default_seed_catalog")]
    pub seed_default_catalog: bool,
    /// Upper bound on stored user snapshots. 0 disables the bound.
    #[serde(default = "default_max_tracked_users")]
    pub max_tracked_users: usize,
}

fn default_seed_catalog() -> bool {
    true
}

fn default_max_tracked_users() -> usize {
    100_000
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            seed_default_catalog: default_seed_catalog(),
            max_tracked_users: default_max_tracked_users(),
        }
    }
}

// ─── Optimizer Config ───────────────────────────────────────────────────────

/// Defaults applied when a caller does not provide its own constraints.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default = "default_total_emissions")]
    pub default_total_emissions: f64,
    #[serde(default = "default_max_pool_allocation")]
    pub max_pool_allocation: f64,
    #[serde(default = "default_min_pool_allocation")]
    pub min_pool_allocation: f64,
    #[serde(default = "default_max_change_percent")]
    pub max_change_percent: f64,
    #[serde(default = "default_preserve_top_performers")]
    pub preserve_top_performers: bool,
    #[serde(default)]
    pub focus_underperforming: bool,
    /// Elasticity assumed for pools without performance data.
    #[serde(default = "default_elasticity")]
    pub default_elasticity: f64,
}

fn default_total_emissions() -> f64 {
    100_000.0
}

fn default_max_pool_allocation() -> f64 {
    0.3
}

fn default_min_pool_allocation() -> f64 {
    0.01
}

fn default_max_change_percent() -> f64 {
    50.0
}

fn default_preserve_top_performers() -> bool {
    true
}

fn default_elasticity() -> f64 {
    0.5
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            default_total_emissions: default_total_emissions(),
            max_pool_allocation: default_max_pool_allocation(),
            min_pool_allocation: default_min_pool_allocation(),
            max_change_percent: default_max_change_percent(),
            preserve_top_performers: default_preserve_top_performers(),
            focus_underperforming: false,
            default_elasticity: default_elasticity(),
        }
    }
}

// ─── Demo Data Config ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    #[serde(default = "default_demo_seed")]
    pub seed: u64,
    #[serde(default = "default_demo_pool_count")]
    pub pool_count: usize,
}

fn default_demo_seed() -> u64 {
    42
}

fn default_demo_pool_count() -> usize {
    8
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: default_demo_seed(),
            pool_count: default_demo_pool_count(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables only.
    pub fn load() -> RewardResult<Self> {
        Self::load_from(None)
    }

    /// Load configuration from an optional file, with environment variables
    /// taking precedence over file values.
    pub fn load_from(path: Option<&Path>) -> RewardResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let builder = builder.add_source(
            config::Environment::with_prefix("REWARD_LAB")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject optimizer defaults that fall outside their documented ranges.
    pub fn validate(&self) -> RewardResult<()> {
        let opt = &self.optimizer;
        if !(opt.max_pool_allocation > 0.0 && opt.max_pool_allocation <= 1.0) {
            return Err(RewardError::Config(format!(
                "optimizer.max_pool_allocation must be in (0, 1], got {}",
                opt.max_pool_allocation
            )));
        }
        if !(opt.min_pool_allocation >= 0.0 && opt.min_pool_allocation < 1.0) {
            return Err(RewardError::Config(format!(
                "optimizer.min_pool_allocation must be in [0, 1), got {}",
                opt.min_pool_allocation
            )));
        }
        if opt.min_pool_allocation > opt.max_pool_allocation {
            return Err(RewardError::Config(
                "optimizer.min_pool_allocation exceeds max_pool_allocation".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&opt.max_change_percent) {
            return Err(RewardError::Config(format!(
                "optimizer.max_change_percent must be in [0, 100], got {}",
                opt.max_change_percent
            )));
        }
        if !(opt.default_elasticity > 0.0 && opt.default_elasticity <= 1.0) {
            return Err(RewardError::Config(format!(
                "optimizer.default_elasticity must be in (0, 1], got {}",
                opt.default_elasticity
            )));
        }
        if opt.default_total_emissions < 0.0 {
            return Err(RewardError::Config(
                "optimizer.default_total_emissions must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.node_id, "node-01");
        assert!(config.segmentation.seed_default_catalog);
        assert!((config.optimizer.default_elasticity - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let mut config = AppConfig::default();
        config.optimizer.min_pool_allocation = 0.5;
        config.optimizer.max_pool_allocation = 0.2;
        assert!(matches!(config.validate(), Err(RewardError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_change_percent_out_of_range() {
        let mut config = AppConfig::default();
        config.optimizer.max_change_percent = 150.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_section_uses_field_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"optimizer": {"max_change_percent": 20}}"#).unwrap();
        assert!((config.optimizer.max_change_percent - 20.0).abs() < f64::EPSILON);
        assert!((config.optimizer.max_pool_allocation - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.demo.pool_count, 8);
    }
}
