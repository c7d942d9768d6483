//! Behavior pattern and automated segment definitions, plus the built-in
//! catalog the dashboard ships with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::builder::{RuleBuilder, SegmentBuilder};
use crate::predicates::{BehaviorCondition, ConditionOperator, Timeframe};
use crate::rules::SegmentRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    Trading,
    Value,
    Engagement,
    Loyalty,
    Risk,
}

/// Named bundle of conditions. Describes a behavior; does not gate membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorPattern {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: PatternCategory,
    pub conditions: Vec<BehaviorCondition>,
    pub priority: u32,
    pub is_active: bool,
}

impl BehaviorPattern {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: PatternCategory,
        conditions: Vec<BehaviorCondition>,
        priority: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            category,
            conditions,
            priority,
            is_active: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateFrequency {
    Realtime,
    Hourly,
    Daily,
    Weekly,
}

/// Missing fields get defaults on deserialization, so a definition needs
/// only a name and rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomatedSegment {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Patterns this segment was built from. Informational only.
    #[serde(default)]
    pub patterns: Vec<Uuid>,
    pub rules: Vec<SegmentRule>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default = "default_frequency")]
    pub update_frequency: UpdateFrequency,
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default)]
    pub recipient_count: u64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

fn default_frequency() -> UpdateFrequency {
    UpdateFrequency::Daily
}

fn default_priority() -> u32 {
    1
}

/// Field-wise patch for an [`AutomatedSegment`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub patterns: Option<Vec<Uuid>>,
    #[serde(default)]
    pub rules: Option<Vec<SegmentRule>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub update_frequency: Option<UpdateFrequency>,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub recipient_count: Option<u64>,
}

impl SegmentUpdate {
    pub fn active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }

    pub fn apply(self, segment: &mut AutomatedSegment, now: DateTime<Utc>) {
        if let Some(v) = self.name {
            segment.name = v;
        }
        if let Some(v) = self.description {
            segment.description = v;
        }
        if let Some(v) = self.patterns {
            segment.patterns = v;
        }
        if let Some(v) = self.rules {
            segment.rules = v;
        }
        if let Some(v) = self.is_active {
            segment.is_active = v;
        }
        if let Some(v) = self.update_frequency {
            segment.update_frequency = v;
        }
        if let Some(v) = self.priority {
            segment.priority = v;
        }
        if let Some(v) = self.recipient_count {
            segment.recipient_count = v;
        }
        segment.last_updated = now;
    }
}

/// Patterns and segments loaded into a fresh engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub patterns: Vec<BehaviorPattern>,
    pub segments: Vec<AutomatedSegment>,
}

// ─── Built-in catalog ───────────────────────────────────────────────────────

pub fn default_catalog() -> Catalog {
    use ConditionOperator as Op;

    let high_frequency = BehaviorPattern::new(
        "High-Frequency Trader",
        "Trades often and keeps a daily streak",
        PatternCategory::Trading,
        vec![
            BehaviorCondition::new("transactionCount", Op::Gte, json!(50))
                .with_timeframe(Timeframe::LastMonth)
                .with_weight(0.6),
            BehaviorCondition::new("consecutiveActiveDays", Op::Gte, json!(7)).with_weight(0.4),
        ],
        8,
    );
    let whale = BehaviorPattern::new(
        "Whale",
        "Large cumulative volume and ticket size",
        PatternCategory::Value,
        vec![
            BehaviorCondition::new("totalVolume", Op::Gte, json!(100_000)).with_weight(0.7),
            BehaviorCondition::new("averageTransactionValue", Op::Gte, json!(5_000))
                .with_weight(0.3),
        ],
        10,
    );
    let enthusiast = BehaviorPattern::new(
        "Campaign Enthusiast",
        "Joins campaigns and claims rewards",
        PatternCategory::Engagement,
        vec![
            BehaviorCondition::new("campaignParticipation", Op::Gte, json!(3)),
            BehaviorCondition::new("rewardsClaimed", Op::Gte, json!(5)),
        ],
        6,
    );
    let loyal = BehaviorPattern::new(
        "Loyal Holder",
        "Long tenure with a high loyalty score",
        PatternCategory::Loyalty,
        vec![
            BehaviorCondition::new("daysSinceFirstTransaction", Op::Gte, json!(180)),
            BehaviorCondition::new("behaviorScores.loyalty", Op::Gte, json!(70)),
        ],
        7,
    );
    let dormant = BehaviorPattern::new(
        "Dormant User",
        "No current streak and little recent activity",
        PatternCategory::Risk,
        vec![
            BehaviorCondition::new("consecutiveActiveDays", Op::Eq, json!(0)),
            BehaviorCondition::new("behaviorScores.activity", Op::Lt, json!(20))
                .with_timeframe(Timeframe::LastWeek),
        ],
        5,
    );

    let segments = vec![
        SegmentBuilder::new("Power Users")
            .description("Highly active and engaged users with meaningful value")
            .pattern(high_frequency.id)
            .pattern(enthusiast.id)
            .frequency(UpdateFrequency::Realtime)
            .priority(10)
            .rule(
                RuleBuilder::include()
                    .condition(BehaviorCondition::new(
                        "behaviorScores.activity",
                        Op::Gte,
                        json!(80),
                    ))
                    .condition(BehaviorCondition::new(
                        "behaviorScores.engagement",
                        Op::Gte,
                        json!(70),
                    ))
                    .build(),
            )
            .rule(
                RuleBuilder::exclude()
                    .condition(BehaviorCondition::new("behaviorScores.value", Op::Lt, json!(20)))
                    .build(),
            )
            .build(),
        SegmentBuilder::new("High-Value Traders")
            .description("Large volume or strong value score")
            .pattern(whale.id)
            .frequency(UpdateFrequency::Hourly)
            .priority(9)
            .rule(
                RuleBuilder::include()
                    .any()
                    .condition(BehaviorCondition::new("totalVolume", Op::Gte, json!(100_000)))
                    .condition(BehaviorCondition::new("behaviorScores.value", Op::Gte, json!(60)))
                    .build(),
            )
            .build(),
        SegmentBuilder::new("Rising Stars")
            .description("New users growing quickly")
            .frequency(UpdateFrequency::Daily)
            .priority(7)
            .rule(
                RuleBuilder::include()
                    .condition(BehaviorCondition::new(
                        "daysSinceFirstTransaction",
                        Op::Lte,
                        json!(30),
                    ))
                    .condition(BehaviorCondition::new("behaviorScores.growth", Op::Gte, json!(60)))
                    .build(),
            )
            .build(),
        SegmentBuilder::new("At-Risk Users")
            .description("Established users whose activity has dropped off")
            .pattern(dormant.id)
            .pattern(loyal.id)
            .frequency(UpdateFrequency::Daily)
            .priority(8)
            .rule(
                RuleBuilder::include()
                    .any()
                    .condition(BehaviorCondition::new("behaviorScores.activity", Op::Lt, json!(20)))
                    .condition(BehaviorCondition::new("consecutiveActiveDays", Op::Eq, json!(0)))
                    .build(),
            )
            .rule(
                RuleBuilder::exclude()
                    .condition(BehaviorCondition::new(
                        "daysSinceFirstTransaction",
                        Op::Lt,
                        json!(7),
                    ))
                    .build(),
            )
            .build(),
    ];

    Catalog {
        patterns: vec![high_frequency, whale, enthusiast, loyal, dormant],
        segments,
    }
}
