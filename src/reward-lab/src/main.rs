//! Reward Lab: behavioral segmentation and emission allocation from the
//! command line. Inputs are JSON files; results are printed as JSON.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use reward_core::config::AppConfig;
use reward_core::files;
use reward_optimizer::{
    validate_targets, AllocationConstraints, DemoDataProvider, EmissionOptimizer,
    OptimizationParams, OptimizationTarget, PerformanceBook, PerformanceLookup, PoolPerformance,
    PoolRecord, SimulationVariation, StrategyPreset, TargetType,
};
use reward_segmentation::catalog::default_catalog;
use reward_segmentation::{
    AutomatedSegment, BehaviorMetricUpdate, BehaviorScores, BehaviorSegmentationEngine,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "reward-lab")]
#[command(about = "Behavior segmentation and liquidity reward allocation toolkit")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "REWARD_LAB_CONFIG")]
    config: Option<PathBuf>,

    /// Node identifier (overrides config)
    #[arg(long, global = true, env = "REWARD_LAB__NODE_ID")]
    node_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute a new emission allocation
    Optimize {
        /// Pools, targets and constraints as JSON
        #[arg(short, long, required_unless_present = "demo")]
        input: Option<PathBuf>,

        /// Performance records keyed by pool name, as JSON
        #[arg(short, long)]
        performance: Option<PathBuf>,

        /// Use a named strategy's targets and constraints
        #[arg(short, long)]
        strategy: Option<StrategyPreset>,

        /// Total weekly emissions (overrides input and config)
        #[arg(long)]
        total: Option<f64>,

        /// Run on generated demo pools
        #[arg(long, default_value_t = false)]
        demo: bool,
    },

    /// Run the optimizer once per variation
    Simulate {
        /// Base pools, targets and constraints as JSON
        #[arg(short, long, required_unless_present = "demo")]
        input: Option<PathBuf>,

        /// Variations as a JSON array
        #[arg(long)]
        variations: PathBuf,

        /// Performance records keyed by pool name, as JSON
        #[arg(short, long)]
        performance: Option<PathBuf>,

        /// Run on generated demo pools
        #[arg(long, default_value_t = false)]
        demo: bool,
    },

    /// Score users and report their segment memberships
    Segment {
        /// User activity as a JSON array of `{ "userId": ..., "metrics": {...} }`
        #[arg(short, long)]
        activity: PathBuf,

        /// Extra segments as a JSON array, added to the catalog
        #[arg(short, long)]
        segments: Option<PathBuf>,
    },

    /// Print the built-in patterns and segments
    Catalog,

    /// Print generated demo pools and performance
    Demo {
        /// Generator seed (overrides config)
        #[arg(long)]
        seed: Option<u64>,

        /// Number of pools (overrides config)
        #[arg(long)]
        pools: Option<usize>,
    },
}

/// Optimizer input where everything but the pools may fall back to config.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptimizeInput {
    #[serde(default)]
    total_emissions: Option<f64>,
    pools: Vec<PoolRecord>,
    #[serde(default)]
    targets: Option<Vec<OptimizationTarget>>,
    #[serde(default)]
    constraints: Option<AllocationConstraints>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserActivity {
    user_id: String,
    #[serde(default)]
    metrics: BehaviorMetricUpdate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserMembership {
    user_id: String,
    scores: Option<BehaviorScores>,
    segments: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SegmentReport {
    users: Vec<UserMembership>,
    segments: Vec<AutomatedSegment>,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the JSON result.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "reward_lab=info,reward_segmentation=info,reward_optimizer=info".into()
            }),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }

    info!(node_id = %config.node_id, command = ?cli.command, "Reward Lab starting");

    match cli.command {
        Commands::Optimize {
            input,
            performance,
            strategy,
            total,
            demo,
        } => cmd_optimize(&config, input, performance, strategy, total, demo),
        Commands::Simulate {
            input,
            variations,
            performance,
            demo,
        } => cmd_simulate(&config, input, &variations, performance, demo),
        Commands::Segment { activity, segments } => cmd_segment(&config, &activity, segments),
        Commands::Catalog => print_json(&default_catalog()),
        Commands::Demo { seed, pools } => cmd_demo(&config, seed, pools),
    }
}

fn cmd_optimize(
    config: &AppConfig,
    input: Option<PathBuf>,
    performance: Option<PathBuf>,
    strategy: Option<StrategyPreset>,
    total: Option<f64>,
    demo: bool,
) -> anyhow::Result<()> {
    let (mut params, book) = load_params(config, input.as_deref(), performance.as_deref(), demo)?;

    if let Some(strategy) = strategy {
        info!(strategy = %strategy, "Applying strategy preset");
        params.targets = strategy.targets();
        params.constraints = strategy.constraints(params.constraints);
    }
    if let Some(total) = total {
        params.total_emissions = total;
    }
    check_params(&params)?;

    let result = EmissionOptimizer::new().optimize_rewards(&params, &book);
    info!(
        run_id = %result.run_id,
        pools = result.pools.len(),
        increased = result.summary.pools_increased,
        decreased = result.summary.pools_decreased,
        "Optimization complete"
    );
    if result.equal_split {
        warn!(run_id = %result.run_id, "Allocation fell back to an even split");
    }
    print_json(&result)
}

fn cmd_simulate(
    config: &AppConfig,
    input: Option<PathBuf>,
    variations: &Path,
    performance: Option<PathBuf>,
    demo: bool,
) -> anyhow::Result<()> {
    let (params, book) = load_params(config, input.as_deref(), performance.as_deref(), demo)?;
    check_params(&params)?;

    let variations: Vec<SimulationVariation> = read_json(variations)?;
    for (i, variation) in variations.iter().enumerate() {
        let merged = variation.apply_to(&params);
        check_params(&merged).with_context(|| format!("variation {} is invalid", i))?;
    }

    let results = EmissionOptimizer::new().run_simulations(&params, &variations, &book);
    print_json(&results)
}

fn cmd_segment(
    config: &AppConfig,
    activity: &Path,
    segments: Option<PathBuf>,
) -> anyhow::Result<()> {
    let engine = BehaviorSegmentationEngine::new(&config.segmentation);

    if let Some(path) = segments {
        let extra: Vec<AutomatedSegment> = read_json(&path)?;
        for segment in extra {
            for rule in &segment.rules {
                for condition in &rule.conditions {
                    condition.validate().with_context(|| {
                        format!("segment '{}' has an invalid condition", segment.name)
                    })?;
                }
            }
            engine.create_segment(segment);
        }
    }

    let activity: Vec<UserActivity> = read_json(activity)?;
    let mut users = Vec::with_capacity(activity.len());
    for entry in activity {
        let matched = engine.analyze_user_behavior(&entry.user_id, entry.metrics);
        let segments = matched
            .iter()
            .filter_map(|id| engine.get_segment(id))
            .map(|s| s.name)
            .collect();
        users.push(UserMembership {
            scores: engine.user_scores(&entry.user_id),
            user_id: entry.user_id,
            segments,
        });
    }
    engine.refresh_recipient_counts();

    print_json(&SegmentReport {
        users,
        segments: engine.list_segments(),
    })
}

fn cmd_demo(config: &AppConfig, seed: Option<u64>, pools: Option<usize>) -> anyhow::Result<()> {
    let seed = seed.unwrap_or(config.demo.seed);
    let count = pools.unwrap_or(config.demo.pool_count);
    let dataset = DemoDataProvider::new(seed, count).generate();

    let performance: HashMap<&str, PoolPerformance> = dataset
        .pools
        .iter()
        .map(|p| (p.name.as_str(), dataset.performance.performance(&p.name)))
        .collect();

    print_json(&serde_json::json!({
        "seed": seed,
        "pools": dataset.pools,
        "performance": performance,
    }))
}

/// Assemble optimizer parameters from a file or demo data, filling gaps from
/// config.
fn load_params(
    config: &AppConfig,
    input: Option<&Path>,
    performance: Option<&Path>,
    demo: bool,
) -> anyhow::Result<(OptimizationParams, PerformanceBook)> {
    let defaults = AllocationConstraints::from_config(&config.optimizer);
    let mut book = PerformanceBook::from_config(&config.optimizer);

    let input = match input {
        Some(path) => read_json::<OptimizeInput>(path)?,
        None if demo => {
            let dataset = DemoDataProvider::from_config(&config.demo).generate();
            book = dataset.performance;
            OptimizeInput {
                total_emissions: None,
                pools: dataset.pools,
                targets: None,
                constraints: None,
            }
        }
        None => bail!("either --input or --demo is required"),
    };

    if let Some(path) = performance {
        let records: HashMap<String, PoolPerformance> = read_json(path)?;
        book = book.with_records(records);
    }

    let params = OptimizationParams {
        total_emissions: input
            .total_emissions
            .unwrap_or(config.optimizer.default_total_emissions),
        pools: input.pools,
        targets: input
            .targets
            .unwrap_or_else(|| vec![OptimizationTarget::new(TargetType::Balanced, 100.0)]),
        constraints: input.constraints.unwrap_or(defaults),
    };
    Ok((params, book))
}

fn check_params(params: &OptimizationParams) -> anyhow::Result<()> {
    if !params.total_emissions.is_finite() || params.total_emissions < 0.0 {
        bail!("total emissions must be a non-negative number, got {}", params.total_emissions);
    }
    params.constraints.validate()?;
    validate_targets(&params.targets)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    files::read_json(path).with_context(|| format!("failed to load {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", files::to_pretty_json(value)?);
    Ok(())
}
