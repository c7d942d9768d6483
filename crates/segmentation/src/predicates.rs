//! Behavior conditions and operator evaluation.

use reward_core::{RewardError, RewardResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::behavior::BehaviorMetricSnapshot;
use crate::metric_key::{MetricKey, MetricValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Between,
    In,
    Contains,
}

/// Lookback window attached to a condition. Stored with the definition;
/// evaluation reads the snapshot as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1h")]
    LastHour,
    #[serde(rename = "24h")]
    LastDay,
    #[serde(rename = "7d")]
    LastWeek,
    #[serde(rename = "30d")]
    LastMonth,
    #[serde(rename = "90d")]
    LastQuarter,
    #[serde(rename = "all")]
    AllTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorCondition {
    pub metric: MetricKey,
    pub operator: ConditionOperator,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
    /// Ranking metadata. Not consulted when evaluating rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl BehaviorCondition {
    pub fn new(metric: impl Into<MetricKey>, operator: ConditionOperator, value: Value) -> Self {
        Self {
            metric: metric.into(),
            operator,
            value,
            timeframe: None,
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = Some(timeframe);
        self
    }

    /// Check that the value has the shape the operator expects. Evaluation
    /// never calls this; callers building definitions do.
    pub fn validate(&self) -> RewardResult<()> {
        let invalid = |reason: &str| {
            Err(RewardError::Validation(format!(
                "condition on '{}' ({:?}): {}",
                self.metric, self.operator, reason
            )))
        };

        match self.operator {
            ConditionOperator::Gt
            | ConditionOperator::Gte
            | ConditionOperator::Lt
            | ConditionOperator::Lte => {
                if self.value.as_f64().is_none() {
                    return invalid("value must be a number");
                }
            }
            ConditionOperator::Between => match self.value.as_array().map(|v| v.as_slice()) {
                Some([low, high]) => match (low.as_f64(), high.as_f64()) {
                    (Some(low), Some(high)) if low <= high => {}
                    (Some(_), Some(_)) => return invalid("range low bound exceeds high bound"),
                    _ => return invalid("range bounds must be numbers"),
                },
                _ => return invalid("value must be a [low, high] array"),
            },
            ConditionOperator::In => {
                if !self.value.is_array() {
                    return invalid("value must be an array");
                }
            }
            ConditionOperator::Eq | ConditionOperator::Contains => {}
        }

        if let Some(weight) = self.weight {
            if !weight.is_finite() || weight < 0.0 {
                return invalid("weight must be a non-negative number");
            }
        }
        Ok(())
    }
}

/// Resolve the condition's metric against the snapshot and apply its operator.
///
/// `behaviorScores.*` metrics read the scores stored on the snapshot. Call
/// [`BehaviorMetricSnapshot::refresh_scores`] first if the counters changed.
pub fn evaluate_condition(
    snapshot: &BehaviorMetricSnapshot,
    condition: &BehaviorCondition,
) -> bool {
    match condition.metric.resolve(snapshot) {
        MetricValue::Present(actual) => {
            compare_values(&actual, &condition.operator, &condition.value)
        }
        MetricValue::Missing => false,
    }
}

#[allow(clippy::unnecessary_map_or)]
pub fn compare_values(actual: &Value, operator: &ConditionOperator, expected: &Value) -> bool {
    match operator {
        ConditionOperator::Gt => {
            numeric_cmp(actual, expected).map_or(false, |o| o == std::cmp::Ordering::Greater)
        }
        ConditionOperator::Gte => {
            numeric_cmp(actual, expected).map_or(false, |o| o != std::cmp::Ordering::Less)
        }
        ConditionOperator::Lt => {
            numeric_cmp(actual, expected).map_or(false, |o| o == std::cmp::Ordering::Less)
        }
        ConditionOperator::Lte => {
            numeric_cmp(actual, expected).map_or(false, |o| o != std::cmp::Ordering::Greater)
        }
        ConditionOperator::Eq => values_equal(actual, expected),
        ConditionOperator::Between => {
            let bounds = expected.as_array().map(|v| v.as_slice());
            match (actual.as_f64(), bounds) {
                (Some(x), Some([low, high])) => match (low.as_f64(), high.as_f64()) {
                    (Some(low), Some(high)) => low <= x && x <= high,
                    _ => false,
                },
                _ => false,
            }
        }
        ConditionOperator::In => expected
            .as_array()
            .map_or(false, |set| set.iter().any(|item| values_equal(actual, item))),
        ConditionOperator::Contains => stringify(actual).contains(&stringify(expected)),
    }
}

fn numeric_cmp(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    let a_num = a.as_f64()?;
    let b_num = b.as_f64()?;
    a_num.partial_cmp(&b_num)
}

/// Numbers compare by value so `5` equals `5.0`; everything else by JSON equality.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}
