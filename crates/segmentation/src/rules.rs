//! Segment rules: include/exclude gates over AND/OR condition groups.

use serde::{Deserialize, Serialize};

use crate::behavior::BehaviorMetricSnapshot;
use crate::catalog::AutomatedSegment;
use crate::predicates::{evaluate_condition, BehaviorCondition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Include,
    Exclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRule {
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    pub logic: LogicalOperator,
    pub conditions: Vec<BehaviorCondition>,
}

/// Evaluate every condition, then combine. An empty `and` rule passes and an
/// empty `or` rule fails.
pub fn evaluate_rule(snapshot: &BehaviorMetricSnapshot, rule: &SegmentRule) -> bool {
    let results: Vec<bool> = rule
        .conditions
        .iter()
        .map(|c| evaluate_condition(snapshot, c))
        .collect();

    match rule.logic {
        LogicalOperator::And => results.iter().all(|r| *r),
        LogicalOperator::Or => results.iter().any(|r| *r),
    }
}

/// Walk the segment's rules in order and stop at the first veto. A segment
/// without rules matches everyone.
///
/// Score conditions see `snapshot.behavior_scores` as stored, so a snapshot
/// built by hand scores zero everywhere until it is refreshed. Use
/// [`evaluate_segment_scored`] when the scores may be stale.
pub fn evaluate_segment(snapshot: &BehaviorMetricSnapshot, segment: &AutomatedSegment) -> bool {
    evaluate_segment_with(&segment.rules, |rule| evaluate_rule(snapshot, rule))
}

/// [`evaluate_segment`] against a copy of the snapshot with freshly computed
/// scores.
pub fn evaluate_segment_scored(
    snapshot: &BehaviorMetricSnapshot,
    segment: &AutomatedSegment,
) -> bool {
    let mut scored = snapshot.clone();
    scored.refresh_scores();
    evaluate_segment(&scored, segment)
}

/// Same walk as [`evaluate_segment`] with a caller-supplied rule evaluator.
pub fn evaluate_segment_with<F>(rules: &[SegmentRule], mut evaluate: F) -> bool
where
    F: FnMut(&SegmentRule) -> bool,
{
    for rule in rules {
        let passed = evaluate(rule);
        match rule.rule_type {
            RuleType::Include if !passed => return false,
            RuleType::Exclude if passed => return false,
            _ => {}
        }
    }
    true
}
