//! Typed metric paths and their resolution against a snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::behavior::{BehaviorMetricSnapshot, ScoreKind};

/// A metric addressed by a condition. Plain names select snapshot counters,
/// `behaviorScores.<kind>` selects a derived score, and anything else walks
/// the snapshot's free-form fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MetricKey {
    TransactionCount,
    TotalVolume,
    AverageTransactionValue,
    ConsecutiveActiveDays,
    CampaignParticipation,
    RewardsClaimed,
    DaysSinceFirstTransaction,
    EngagementScore,
    LastActivity,
    Score(ScoreKind),
    Custom(Vec<String>),
}

/// Result of resolving a [`MetricKey`]. `Missing` fails every operator.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Present(Value),
    Missing,
}

impl MetricKey {
    /// Parse a dotted path. Accepts camelCase and snake_case names.
    pub fn parse(path: &str) -> Self {
        let segments: Vec<&str> = path.split('.').collect();
        match segments.as_slice() {
            [name] => Self::counter(name)
                .unwrap_or_else(|| MetricKey::Custom(vec![name.to_string()])),
            [root, kind] if matches!(*root, "behaviorScores" | "behavior_scores") => {
                match ScoreKind::parse(kind) {
                    Some(kind) => MetricKey::Score(kind),
                    None => MetricKey::Custom(segments.iter().map(|s| s.to_string()).collect()),
                }
            }
            _ => MetricKey::Custom(segments.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn counter(name: &str) -> Option<Self> {
        let key = match name {
            "transactionCount" | "transaction_count" => MetricKey::TransactionCount,
            "totalVolume" | "total_volume" => MetricKey::TotalVolume,
            "averageTransactionValue" | "average_transaction_value" | "avgTransactionValue" => {
                MetricKey::AverageTransactionValue
            }
            "consecutiveActiveDays" | "consecutive_active_days" => {
                MetricKey::ConsecutiveActiveDays
            }
            "campaignParticipation" | "campaign_participation" => {
                MetricKey::CampaignParticipation
            }
            "rewardsClaimed" | "rewards_claimed" => MetricKey::RewardsClaimed,
            "daysSinceFirstTransaction" | "days_since_first_transaction" => {
                MetricKey::DaysSinceFirstTransaction
            }
            "engagementScore" | "engagement_score" => MetricKey::EngagementScore,
            "lastActivity" | "last_activity" => MetricKey::LastActivity,
            _ => return None,
        };
        Some(key)
    }

    /// Canonical dotted path.
    pub fn path(&self) -> String {
        match self {
            MetricKey::TransactionCount => "transactionCount".to_string(),
            MetricKey::TotalVolume => "totalVolume".to_string(),
            MetricKey::AverageTransactionValue => "averageTransactionValue".to_string(),
            MetricKey::ConsecutiveActiveDays => "consecutiveActiveDays".to_string(),
            MetricKey::CampaignParticipation => "campaignParticipation".to_string(),
            MetricKey::RewardsClaimed => "rewardsClaimed".to_string(),
            MetricKey::DaysSinceFirstTransaction => "daysSinceFirstTransaction".to_string(),
            MetricKey::EngagementScore => "engagementScore".to_string(),
            MetricKey::LastActivity => "lastActivity".to_string(),
            MetricKey::Score(kind) => format!("behaviorScores.{}", kind.as_str()),
            MetricKey::Custom(segments) => segments.join("."),
        }
    }

    /// Look the metric up in a snapshot. Timestamps resolve to epoch millis.
    pub fn resolve(&self, snapshot: &BehaviorMetricSnapshot) -> MetricValue {
        match self {
            MetricKey::TransactionCount => present(Value::from(snapshot.transaction_count)),
            MetricKey::TotalVolume => number(snapshot.total_volume),
            MetricKey::AverageTransactionValue => number(snapshot.average_transaction_value),
            MetricKey::ConsecutiveActiveDays => {
                present(Value::from(snapshot.consecutive_active_days))
            }
            MetricKey::CampaignParticipation => {
                present(Value::from(snapshot.campaign_participation))
            }
            MetricKey::RewardsClaimed => present(Value::from(snapshot.rewards_claimed)),
            MetricKey::DaysSinceFirstTransaction => {
                present(Value::from(snapshot.days_since_first_transaction))
            }
            MetricKey::EngagementScore => number(snapshot.engagement_score),
            MetricKey::LastActivity => match snapshot.last_activity {
                Some(ts) => present(Value::from(ts.timestamp_millis())),
                None => MetricValue::Missing,
            },
            MetricKey::Score(kind) => present(Value::from(snapshot.behavior_scores.get(*kind))),
            MetricKey::Custom(segments) => resolve_custom(&snapshot.custom, segments),
        }
    }
}

fn present(value: Value) -> MetricValue {
    MetricValue::Present(value)
}

fn number(value: f64) -> MetricValue {
    match serde_json::Number::from_f64(value) {
        Some(n) => MetricValue::Present(Value::Number(n)),
        None => MetricValue::Missing,
    }
}

fn resolve_custom(
    fields: &serde_json::Map<String, Value>,
    segments: &[String],
) -> MetricValue {
    let Some((first, rest)) = segments.split_first() else {
        return MetricValue::Missing;
    };
    let mut current = match fields.get(first) {
        Some(v) => v,
        None => return MetricValue::Missing,
    };
    for segment in rest {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(v) => current = v,
            None => return MetricValue::Missing,
        }
    }
    if current.is_null() {
        MetricValue::Missing
    } else {
        MetricValue::Present(current.clone())
    }
}

impl From<String> for MetricKey {
    fn from(path: String) -> Self {
        MetricKey::parse(&path)
    }
}

impl From<&str> for MetricKey {
    fn from(path: &str) -> Self {
        MetricKey::parse(path)
    }
}

impl From<MetricKey> for String {
    fn from(key: MetricKey) -> Self {
        key.path()
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
