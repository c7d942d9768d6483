//! Benchmarks for emission allocation.
//! Run with: cargo bench -p reward-optimizer

use reward_optimizer::{
    AllocationConstraints, DemoDataProvider, EmissionOptimizer, OptimizationParams,
    OptimizationTarget, TargetType,
};

fn main() {
    let dataset = DemoDataProvider::new(42, 12).generate();
    let params = OptimizationParams {
        total_emissions: 250_000.0,
        pools: dataset.pools,
        targets: vec![
            OptimizationTarget::new(TargetType::Tvl, 40.0),
            OptimizationTarget::new(TargetType::Volume, 30.0),
            OptimizationTarget::new(TargetType::Retention, 30.0),
        ],
        constraints: AllocationConstraints::default(),
    };
    let optimizer = EmissionOptimizer::new();

    // Warmup
    for _ in 0..10 {
        let _ = optimizer.optimize_rewards(&params, &dataset.performance);
    }

    // Benchmark
    let iterations = 100_000;
    let start = std::time::Instant::now();

    for _ in 0..iterations {
        let _ = optimizer.optimize_rewards(&params, &dataset.performance);
    }

    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations;

    println!("=== Allocation Benchmark ===");
    println!("Iterations:  {}", iterations);
    println!("Total time:  {:?}", elapsed);
    println!("Per run:     {:?}", per_iter);
    println!("Throughput:  {:.0} runs/sec", iterations as f64 / elapsed.as_secs_f64());
    println!("Pools:       {}", params.pools.len());
}
