//! Per-user behavior metrics and the five derived behavior scores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw activity counters for a single user, plus free-form nested fields
/// supplied by the activity tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorMetricSnapshot {
    #[serde(default, alias = "transaction_count")]
    pub transaction_count: u64,
    #[serde(default, alias = "total_volume")]
    pub total_volume: f64,
    #[serde(default, alias = "average_transaction_value")]
    pub average_transaction_value: f64,
    #[serde(default, alias = "consecutive_active_days")]
    pub consecutive_active_days: u32,
    #[serde(default, alias = "campaign_participation")]
    pub campaign_participation: u32,
    #[serde(default, alias = "rewards_claimed")]
    pub rewards_claimed: u32,
    #[serde(default, alias = "days_since_first_transaction")]
    pub days_since_first_transaction: u32,
    /// Engagement input on a 0–100 scale, fed into activity and engagement.
    #[serde(default, alias = "engagement_score")]
    pub engagement_score: f64,
    #[serde(default, alias = "last_activity")]
    pub last_activity: Option<DateTime<Utc>>,
    /// Scores derived from the counters above. Overwritten on every analysis.
    #[serde(default, alias = "behavior_scores")]
    pub behavior_scores: BehaviorScores,
    #[serde(default, flatten)]
    pub custom: serde_json::Map<String, serde_json::Value>,
}

/// Partial snapshot. Every field that is `Some` overwrites the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorMetricUpdate {
    #[serde(default, alias = "transaction_count")]
    pub transaction_count: Option<u64>,
    #[serde(default, alias = "total_volume")]
    pub total_volume: Option<f64>,
    #[serde(default, alias = "average_transaction_value")]
    pub average_transaction_value: Option<f64>,
    #[serde(default, alias = "consecutive_active_days")]
    pub consecutive_active_days: Option<u32>,
    #[serde(default, alias = "campaign_participation")]
    pub campaign_participation: Option<u32>,
    #[serde(default, alias = "rewards_claimed")]
    pub rewards_claimed: Option<u32>,
    #[serde(default, alias = "days_since_first_transaction")]
    pub days_since_first_transaction: Option<u32>,
    #[serde(default, alias = "engagement_score")]
    pub engagement_score: Option<f64>,
    #[serde(default, flatten)]
    pub custom: serde_json::Map<String, serde_json::Value>,
}

const RESERVED_FIELDS: [&str; 4] = [
    "behaviorScores",
    "behavior_scores",
    "lastActivity",
    "last_activity",
];

impl BehaviorMetricSnapshot {
    /// Merge a partial update field by field and stamp the activity time.
    pub fn merge(&mut self, update: BehaviorMetricUpdate, now: DateTime<Utc>) {
        if let Some(v) = update.transaction_count {
            self.transaction_count = v;
        }
        if let Some(v) = update.total_volume {
            self.total_volume = v;
        }
        if let Some(v) = update.average_transaction_value {
            self.average_transaction_value = v;
        }
        if let Some(v) = update.consecutive_active_days {
            self.consecutive_active_days = v;
        }
        if let Some(v) = update.campaign_participation {
            self.campaign_participation = v;
        }
        if let Some(v) = update.rewards_claimed {
            self.rewards_claimed = v;
        }
        if let Some(v) = update.days_since_first_transaction {
            self.days_since_first_transaction = v;
        }
        if let Some(v) = update.engagement_score {
            self.engagement_score = v;
        }
        for (key, value) in update.custom {
            // Derived fields are owned by the engine.
            if RESERVED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            self.custom.insert(key, value);
        }
        self.last_activity = Some(now);
    }

    /// Recompute `behavior_scores` from the current counters.
    pub fn refresh_scores(&mut self) {
        self.behavior_scores = compute_behavior_scores(self);
    }
}

/// The five derived scores, each an integer in `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorScores {
    pub activity: u8,
    pub engagement: u8,
    pub value: u8,
    pub loyalty: u8,
    pub growth: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    Activity,
    Engagement,
    Value,
    Loyalty,
    Growth,
}

impl ScoreKind {
    pub const ALL: [ScoreKind; 5] = [
        ScoreKind::Activity,
        ScoreKind::Engagement,
        ScoreKind::Value,
        ScoreKind::Loyalty,
        ScoreKind::Growth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreKind::Activity => "activity",
            ScoreKind::Engagement => "engagement",
            ScoreKind::Value => "value",
            ScoreKind::Loyalty => "loyalty",
            ScoreKind::Growth => "growth",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl BehaviorScores {
    pub fn get(&self, kind: ScoreKind) -> u8 {
        match kind {
            ScoreKind::Activity => self.activity,
            ScoreKind::Engagement => self.engagement,
            ScoreKind::Value => self.value,
            ScoreKind::Loyalty => self.loyalty,
            ScoreKind::Growth => self.growth,
        }
    }
}

/// Derive all five scores from scratch. Pure: no history or smoothing.
pub fn compute_behavior_scores(snapshot: &BehaviorMetricSnapshot) -> BehaviorScores {
    let tx_count = snapshot.transaction_count as f64;
    let active_days = snapshot.consecutive_active_days as f64;
    let engagement_input = snapshot.engagement_score;
    let campaigns = snapshot.campaign_participation as f64;
    let claimed = snapshot.rewards_claimed as f64;
    let tenure_days = snapshot.days_since_first_transaction as f64;

    let activity = bounded(2.0 * tx_count + 3.0 * active_days + 0.5 * engagement_input);
    let engagement = bounded(0.7 * engagement_input + 10.0 * campaigns + 2.0 * claimed);
    let value = bounded(
        10.0 * (snapshot.total_volume.max(0.0) + 1.0).log10()
            + 5.0 * (snapshot.average_transaction_value.max(0.0) + 1.0).log10(),
    );
    let loyalty = bounded(0.5 * tenure_days + 2.0 * active_days + 8.0 * campaigns);
    // Growth is derived from the activity and engagement computed above.
    let growth = bounded(0.4 * activity + 0.6 * engagement);

    BehaviorScores {
        activity: to_score(activity),
        engagement: to_score(engagement),
        value: to_score(value),
        loyalty: to_score(loyalty),
        growth: to_score(growth),
    }
}

fn bounded(raw: f64) -> f64 {
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 100.0)
    }
}

fn to_score(bounded: f64) -> u8 {
    bounded.round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> BehaviorMetricSnapshot {
        BehaviorMetricSnapshot {
            transaction_count: 20,
            consecutive_active_days: 10,
            engagement_score: 80.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_activity_saturates_at_100() {
        // 2*20 + 3*10 + 0.5*80 = 110
        let scores = compute_behavior_scores(&snapshot());
        assert_eq!(scores.activity, 100);
    }

    #[test]
    fn test_engagement_and_growth_formulas() {
        let s = BehaviorMetricSnapshot {
            engagement_score: 50.0,
            campaign_participation: 2,
            rewards_claimed: 3,
            ..Default::default()
        };
        let scores = compute_behavior_scores(&s);
        // activity = 0.5*50 = 25; engagement = 35 + 20 + 6 = 61
        assert_eq!(scores.activity, 25);
        assert_eq!(scores.engagement, 61);
        // growth = 0.4*25 + 0.6*61 = 46.6
        assert_eq!(scores.growth, 47);
    }

    #[test]
    fn test_value_uses_log_scale() {
        let s = BehaviorMetricSnapshot {
            total_volume: 999_999.0,
            average_transaction_value: 99.0,
            ..Default::default()
        };
        // 10*6 + 5*2 = 70
        assert_eq!(compute_behavior_scores(&s).value, 70);
    }

    #[test]
    fn test_loyalty_formula() {
        let s = BehaviorMetricSnapshot {
            days_since_first_transaction: 40,
            consecutive_active_days: 5,
            campaign_participation: 1,
            ..Default::default()
        };
        // 20 + 10 + 8
        assert_eq!(compute_behavior_scores(&s).loyalty, 38);
    }

    #[test]
    fn test_scores_stay_in_bounds_for_extreme_inputs() {
        let inputs = [
            BehaviorMetricSnapshot::default(),
            BehaviorMetricSnapshot {
                transaction_count: u64::MAX,
                total_volume: f64::MAX,
                average_transaction_value: f64::INFINITY,
                consecutive_active_days: u32::MAX,
                campaign_participation: u32::MAX,
                rewards_claimed: u32::MAX,
                days_since_first_transaction: u32::MAX,
                engagement_score: 1e12,
                ..Default::default()
            },
            BehaviorMetricSnapshot {
                total_volume: -50.0,
                average_transaction_value: f64::NAN,
                engagement_score: -400.0,
                ..Default::default()
            },
        ];
        for s in &inputs {
            let scores = compute_behavior_scores(s);
            for kind in ScoreKind::ALL {
                assert!(scores.get(kind) <= 100, "{:?} out of range", kind);
            }
        }
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let s = snapshot();
        assert_eq!(compute_behavior_scores(&s), compute_behavior_scores(&s));
    }

    #[test]
    fn test_merge_is_last_write_wins_per_field() {
        let mut s = snapshot();
        let now = Utc::now();
        let mut update = BehaviorMetricUpdate {
            transaction_count: Some(3),
            ..Default::default()
        };
        update
            .custom
            .insert("tier".to_string(), serde_json::json!("gold"));
        s.merge(update, now);

        assert_eq!(s.transaction_count, 3);
        assert_eq!(s.consecutive_active_days, 10);
        assert_eq!(s.custom["tier"], "gold");
        assert_eq!(s.last_activity, Some(now));
    }

    #[test]
    fn test_snapshot_deserializes_camel_case_with_extra_fields() {
        let s: BehaviorMetricSnapshot = serde_json::from_str(
            r#"{"transactionCount": 4, "totalVolume": 12.5, "wallet": {"chain": "eth"}}"#,
        )
        .unwrap();
        assert_eq!(s.transaction_count, 4);
        assert_eq!(s.custom["wallet"]["chain"], "eth");
    }

    #[test]
    fn test_update_accepts_snake_case_counters() {
        let update: BehaviorMetricUpdate = serde_json::from_str(
            r#"{"transaction_count": 8, "engagement_score": 40, "days_since_first_transaction": 12}"#,
        )
        .unwrap();
        assert_eq!(update.transaction_count, Some(8));
        assert_eq!(update.engagement_score, Some(40.0));
        assert_eq!(update.days_since_first_transaction, Some(12));
        assert!(update.custom.is_empty());

        let mut s = BehaviorMetricSnapshot::default();
        s.merge(update, Utc::now());
        assert_eq!(s.transaction_count, 8);
        assert!(!s.custom.contains_key("transaction_count"));
    }

    #[test]
    fn test_merge_ignores_derived_fields_in_either_case() {
        let update: BehaviorMetricUpdate = serde_json::from_str(
            r#"{"behavior_scores": {"activity": 99}, "lastActivity": "2020-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let mut s = BehaviorMetricSnapshot::default();
        s.merge(update, Utc::now());
        assert!(s.custom.is_empty());
        assert_eq!(s.behavior_scores, BehaviorScores::default());
    }

    #[test]
    fn test_refresh_scores_overwrites_stale_scores() {
        let mut s = snapshot();
        assert_eq!(s.behavior_scores.activity, 0);
        s.refresh_scores();
        assert_eq!(s.behavior_scores, compute_behavior_scores(&snapshot()));
        assert_eq!(s.behavior_scores.activity, 100);
    }
}
