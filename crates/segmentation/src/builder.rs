//! Segment builder: fluent API for constructing automated segments and rules.

use chrono::Utc;
use uuid::Uuid;

use crate::catalog::{AutomatedSegment, UpdateFrequency};
use crate::predicates::BehaviorCondition;
use crate::rules::{LogicalOperator, RuleType, SegmentRule};

pub struct SegmentBuilder {
    name: String,
    description: String,
    patterns: Vec<Uuid>,
    rules: Vec<SegmentRule>,
    is_active: bool,
    update_frequency: UpdateFrequency,
    priority: u32,
}

impl SegmentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            patterns: Vec::new(),
            rules: Vec::new(),
            is_active: true,
            update_frequency: UpdateFrequency::Daily,
            priority: 1,
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn pattern(mut self, pattern_id: Uuid) -> Self {
        self.patterns.push(pattern_id);
        self
    }

    /// Rules are evaluated in the order they are added.
    pub fn rule(mut self, rule: SegmentRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn frequency(mut self, frequency: UpdateFrequency) -> Self {
        self.update_frequency = frequency;
        self
    }

    pub fn priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn build(self) -> AutomatedSegment {
        let now = Utc::now();
        AutomatedSegment {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            patterns: self.patterns,
            rules: self.rules,
            is_active: self.is_active,
            update_frequency: self.update_frequency,
            priority: self.priority,
            recipient_count: 0,
            created_at: now,
            last_updated: now,
        }
    }
}

pub struct RuleBuilder {
    rule_type: RuleType,
    logic: LogicalOperator,
    conditions: Vec<BehaviorCondition>,
}

impl RuleBuilder {
    pub fn include() -> Self {
        Self::new(RuleType::Include)
    }

    pub fn exclude() -> Self {
        Self::new(RuleType::Exclude)
    }

    fn new(rule_type: RuleType) -> Self {
        Self {
            rule_type,
            logic: LogicalOperator::And,
            conditions: Vec::new(),
        }
    }

    /// Switch from all-of to any-of.
    pub fn any(mut self) -> Self {
        self.logic = LogicalOperator::Or;
        self
    }

    pub fn condition(mut self, condition: BehaviorCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn build(self) -> SegmentRule {
        SegmentRule {
            rule_type: self.rule_type,
            logic: self.logic,
            conditions: self.conditions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::ConditionOperator;
    use serde_json::json;

    #[test]
    fn test_builder_defaults() {
        let segment = SegmentBuilder::new("Newcomers").build();
        assert!(segment.is_active);
        assert_eq!(segment.update_frequency, UpdateFrequency::Daily);
        assert_eq!(segment.recipient_count, 0);
        assert!(segment.rules.is_empty());
        assert_eq!(segment.created_at, segment.last_updated);
    }

    #[test]
    fn test_rules_keep_declaration_order() {
        let segment = SegmentBuilder::new("Ordered")
            .rule(RuleBuilder::exclude().build())
            .rule(
                RuleBuilder::include()
                    .any()
                    .condition(BehaviorCondition::new(
                        "rewardsClaimed",
                        ConditionOperator::Gt,
                        json!(0),
                    ))
                    .build(),
            )
            .inactive()
            .build();

        assert!(!segment.is_active);
        assert_eq!(segment.rules[0].rule_type, RuleType::Exclude);
        assert_eq!(segment.rules[1].rule_type, RuleType::Include);
        assert_eq!(segment.rules[1].logic, LogicalOperator::Or);
    }
}
