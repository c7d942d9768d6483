//! Behavioral segmentation: derived behavior scores, condition and rule
//! evaluation, and automated segment membership.

pub mod behavior;
pub mod builder;
pub mod catalog;
pub mod engine;
pub mod metric_key;
pub mod predicates;
pub mod rules;

pub use behavior::{
    compute_behavior_scores, BehaviorMetricSnapshot, BehaviorMetricUpdate, BehaviorScores,
};
pub use builder::{RuleBuilder, SegmentBuilder};
pub use catalog::{AutomatedSegment, BehaviorPattern, SegmentUpdate};
pub use engine::BehaviorSegmentationEngine;
pub use metric_key::{MetricKey, MetricValue};
pub use predicates::{evaluate_condition, BehaviorCondition, ConditionOperator};
pub use rules::{evaluate_rule, evaluate_segment, evaluate_segment_scored, SegmentRule};
