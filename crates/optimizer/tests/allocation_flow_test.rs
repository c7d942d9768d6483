//! End-to-end allocation runs over generated and JSON-supplied inputs.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use reward_optimizer::*;

    fn demo_params(strategy: StrategyPreset) -> (OptimizationParams, PerformanceBook) {
        let dataset = DemoDataProvider::new(42, 8).generate();
        let params = OptimizationParams {
            total_emissions: 100_000.0,
            pools: dataset.pools,
            targets: strategy.targets(),
            constraints: strategy.constraints(AllocationConstraints::default()),
        };
        (params, dataset.performance)
    }

    #[test]
    fn test_every_strategy_conserves_budget() {
        let optimizer = EmissionOptimizer::new();
        for strategy in StrategyPreset::ALL {
            let (params, book) = demo_params(strategy);
            let result = optimizer.optimize_rewards(&params, &book);
            let total: f64 = result.pools.iter().map(|p| p.suggested_emissions).sum();
            assert!((total - 100_000.0).abs() < 1e-6, "{} allocated {}", strategy, total);
            assert_eq!(result.pools.len(), 8);
            assert_eq!(
                result.summary.pools_increased
                    + result.summary.pools_decreased
                    + result.summary.pools_unchanged,
                8
            );
        }
    }

    #[test]
    fn test_results_ordered_by_score() {
        let (params, book) = demo_params(StrategyPreset::Balanced);
        let result = EmissionOptimizer::new().optimize_rewards(&params, &book);
        for pair in result.pools.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_params_from_json() {
        let json = r#"{
            "totalEmissions": 50000,
            "pools": [
                {"name": "ETH/USDC", "feeTier": 0.05, "currentEmissions": 20000, "rewardTokens": ["ARB"]},
                {"name": "WBTC/ETH", "feeTier": 0.3, "currentEmissions": 30000}
            ],
            "targets": [{"type": "tvl", "weight": 60}, {"type": "users", "weight": 40}],
            "constraints": {
                "maxPoolAllocation": 0.8,
                "minPoolAllocation": 0.1,
                "maxChangePercent": 50,
                "preserveTopPerformers": false,
                "focusUnderperforming": false
            }
        }"#;
        let params: OptimizationParams = serde_json::from_str(json).unwrap();
        assert!(params.constraints.validate().is_ok());
        assert!(validate_targets(&params.targets).is_ok());

        let mut perf = HashMap::new();
        perf.insert(
            "ETH/USDC".to_string(),
            PoolPerformance {
                tvl: 8_000_000.0,
                volume: 1_000_000.0,
                users: 2_000.0,
                retention: 0.7,
                engagement: 0.4,
                elasticity: 0.6,
            },
        );
        let result = EmissionOptimizer::new().optimize_rewards(&params, &perf);

        let eth = result.pools.iter().find(|p| p.name == "ETH/USDC").unwrap();
        assert_eq!(eth.reward_tokens, vec!["ARB".to_string()]);
        assert!(eth.suggested_emissions > eth.current_emissions);
        let total: f64 = result.pools.iter().map(|p| p.suggested_emissions).sum();
        assert!((total - 50_000.0).abs() < 1e-6);

        let out = serde_json::to_value(&result).unwrap();
        assert!(out.get("projectedImpact").is_some());
        assert!(out["pools"][0].get("changePercent").is_some());
    }

    #[test]
    fn test_budget_sweep_simulation() {
        let (base, book) = demo_params(StrategyPreset::TvlGrowth);
        let variations: Vec<SimulationVariation> = [80_000.0, 100_000.0, 120_000.0]
            .iter()
            .map(|total| SimulationVariation {
                label: Some(format!("budget-{}", total)),
                total_emissions: Some(*total),
                ..Default::default()
            })
            .collect();

        let results = EmissionOptimizer::new().run_simulations(&base, &variations, &book);
        assert_eq!(results.len(), 3);
        for (result, variation) in results.iter().zip(&variations) {
            assert_eq!(result.label, variation.label);
            let total: f64 = result.pools.iter().map(|p| p.suggested_emissions).sum();
            assert!((total - variation.total_emissions.unwrap()).abs() < 1e-6);
        }
    }
}
