//! Segment membership over the built-in catalog and JSON-supplied activity.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use reward_core::config::SegmentationConfig;
    use reward_segmentation::*;
    use serde_json::json;
    use uuid::Uuid;

    fn engine() -> BehaviorSegmentationEngine {
        BehaviorSegmentationEngine::new(&SegmentationConfig::default())
    }

    fn names(engine: &BehaviorSegmentationEngine, ids: &[Uuid]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| engine.get_segment(id))
            .map(|s| s.name)
            .collect()
    }

    fn update(json: serde_json::Value) -> BehaviorMetricUpdate {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_power_user_matches_in_priority_order() {
        let engine = engine();
        let ids = engine.analyze_user_behavior(
            "power",
            update(json!({
                "transactionCount": 40,
                "consecutiveActiveDays": 10,
                "engagementScore": 80,
                "campaignParticipation": 3,
                "rewardsClaimed": 5,
                "totalVolume": 250000,
                "averageTransactionValue": 6000,
                "daysSinceFirstTransaction": 400
            })),
        );
        assert_eq!(names(&engine, &ids), vec!["Power Users", "High-Value Traders"]);

        let scores = engine.user_scores("power").unwrap();
        assert_eq!(scores.activity, 100);
        assert_eq!(scores.engagement, 96);
        assert_eq!(scores.loyalty, 100);
    }

    #[test]
    fn test_dormant_and_new_users() {
        let engine = engine();
        let dormant = engine.analyze_user_behavior(
            "dormant",
            update(json!({"transactionCount": 2, "daysSinceFirstTransaction": 365})),
        );
        assert_eq!(names(&engine, &dormant), vec!["At-Risk Users"]);

        let rising = engine.analyze_user_behavior(
            "rising",
            update(json!({
                "transactionCount": 10,
                "consecutiveActiveDays": 3,
                "engagementScore": 60,
                "campaignParticipation": 2,
                "rewardsClaimed": 1,
                "daysSinceFirstTransaction": 5
            })),
        );
        assert_eq!(names(&engine, &rising), vec!["Rising Stars"]);
        assert_eq!(engine.user_scores("rising").unwrap().growth, 62);
    }

    #[test]
    fn test_recipient_counts_follow_stored_snapshots() {
        let engine = engine();
        engine.analyze_user_behavior(
            "a",
            update(json!({"transactionCount": 1, "daysSinceFirstTransaction": 90})),
        );
        engine.analyze_user_behavior(
            "b",
            update(json!({"transactionCount": 3, "daysSinceFirstTransaction": 200})),
        );
        engine.analyze_user_behavior("c", update(json!({"totalVolume": 500000})));

        let counts = engine.refresh_recipient_counts();
        let by_name: HashMap<String, u64> = engine
            .list_segments()
            .into_iter()
            .map(|s| (s.name.clone(), counts[&s.id]))
            .collect();
        // "c" has no tenure, so the at-risk exclusion drops them
        assert_eq!(by_name["At-Risk Users"], 2);
        assert_eq!(by_name["High-Value Traders"], 1);
        assert_eq!(by_name["Power Users"], 0);

        let at_risk = engine
            .list_segments()
            .into_iter()
            .find(|s| s.name == "At-Risk Users")
            .unwrap();
        assert_eq!(at_risk.recipient_count, 2);
        assert_eq!(engine.patterns_for_segment(&at_risk.id).len(), 2);
    }

    #[test]
    fn test_custom_nested_metric_segment() {
        let engine = BehaviorSegmentationEngine::empty();
        let id = engine.create_segment(
            SegmentBuilder::new("Arbitrum natives")
                .rule(
                    RuleBuilder::include()
                        .condition(BehaviorCondition::new(
                            "wallet.chain",
                            ConditionOperator::Eq,
                            json!("arbitrum"),
                        ))
                        .build(),
                )
                .build(),
        );

        let matched = engine.analyze_user_behavior(
            "u1",
            update(json!({"wallet": {"chain": "arbitrum", "age": 3}})),
        );
        assert_eq!(matched, vec![id]);

        let other =
            engine.analyze_user_behavior("u2", update(json!({"wallet": {"chain": "base"}})));
        assert!(other.is_empty());
        // missing field fails the condition
        assert!(engine.analyze_user_behavior("u3", update(json!({}))).is_empty());
    }

    #[test]
    fn test_segment_definition_from_json() {
        let rule: SegmentRule = serde_json::from_value(json!({
            "type": "include",
            "logic": "or",
            "conditions": [
                {"metric": "rewards_claimed", "operator": "between", "value": [2, 4]},
                {"metric": "behaviorScores.value", "operator": "in", "value": [0, 100]}
            ]
        }))
        .unwrap();
        for condition in &rule.conditions {
            assert!(condition.validate().is_ok());
        }

        let engine = BehaviorSegmentationEngine::empty();
        let id = engine.create_segment(SegmentBuilder::new("Claimers").rule(rule).build());
        assert_eq!(
            engine.analyze_user_behavior("u1", update(json!({"rewardsClaimed": 3}))),
            vec![id]
        );
        assert!(engine
            .analyze_user_behavior("u2", update(json!({"rewardsClaimed": 9, "totalVolume": 5})))
            .is_empty());
    }
}
