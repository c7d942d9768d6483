//! Emission allocation across liquidity pools: multi-objective scoring,
//! constrained proportional allocation and elasticity-based impact projection.

pub mod demo;
pub mod impact;
pub mod optimizer;
pub mod performance;
pub mod scoring;
pub mod strategy;
pub mod types;

pub use demo::{DemoDataProvider, DemoDataset};
pub use impact::{aggregate_impact, ImpactModel, LinearElasticityModel};
pub use optimizer::{
    apply_constraints, base_allocations, renormalize, EmissionOptimizer, Renormalization,
};
pub use performance::{PerformanceBook, PerformanceLookup};
pub use scoring::{normalized_metric, score_pool};
pub use strategy::StrategyPreset;
pub use types::*;
