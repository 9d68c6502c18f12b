//! fairdrift simulator CLI
//!
//! Run seeded EF1-maintenance scenarios, or a custom configuration.

use clap::Parser;
use fairdrift_core::{DriftMode, FairDivisionConfig, PolicyKind, ValuationInit};
use fairdrift_sim::scenarios::ScenarioId;
use fairdrift_sim::{ScenarioResult, ScenarioRunner, SimError, SimExport};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// fairdrift EF1 maintenance simulator
#[derive(Parser, Debug)]
#[command(name = "fairdrift-sim")]
#[command(about = "Run seeded EF1 fair-division maintenance simulations", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (stable_drift, incremental_restore, long_walk, no_drift,
    /// single_agent, zero_items, strict_threshold, all, custom)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of consecutive seeds to run
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Override the number of timesteps
    #[arg(short, long)]
    timesteps: Option<usize>,

    /// JSON config file for `custom` runs
    #[arg(long)]
    config: Option<String>,

    /// Number of agents (custom)
    #[arg(long)]
    agents: Option<usize>,

    /// Number of items (custom)
    #[arg(long)]
    items: Option<usize>,

    /// Drift magnitude (custom)
    #[arg(long)]
    delta: Option<f64>,

    /// Near-EF1 tolerance (custom)
    #[arg(long)]
    epsilon: Option<f64>,

    /// Batch-greedy commit threshold (custom)
    #[arg(long)]
    min_transfer_diff: Option<f64>,

    /// Incremental transfer bound per timestep (custom)
    #[arg(long)]
    max_restoration_steps: Option<usize>,

    /// Batch-greedy round cap per timestep (custom)
    #[arg(long)]
    max_batch_rounds: Option<usize>,

    /// Drift mode: anchored or walk (custom)
    #[arg(long)]
    drift: Option<DriftMode>,

    /// Transfer policy: batch or incremental (custom)
    #[arg(long)]
    policy: Option<PolicyKind>,

    /// Initial valuations: continuous or integer (custom)
    #[arg(long)]
    valuation_init: Option<ValuationInit>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export per-timestep frames to a JSON file (single run only)
    #[arg(long)]
    export: Option<String>,
}

impl Args {
    /// Builds the custom config: file (or defaults), then flag overrides.
    fn custom_config(&self, seed: u64) -> Result<FairDivisionConfig, SimError> {
        let mut config = match &self.config {
            Some(path) => FairDivisionConfig::from_json(&std::fs::read_to_string(path)?)?,
            None => FairDivisionConfig::default(),
        };

        config.rng_seed = seed;
        if let Some(v) = self.timesteps {
            config.timesteps = v;
        }
        if let Some(v) = self.agents {
            config.num_agents = v;
        }
        if let Some(v) = self.items {
            config.num_items = v;
        }
        if let Some(v) = self.delta {
            config.delta = v;
        }
        if let Some(v) = self.epsilon {
            config.epsilon = v;
        }
        if let Some(v) = self.min_transfer_diff {
            config.min_transfer_diff = v;
        }
        if let Some(v) = self.max_restoration_steps {
            config.max_restoration_steps = v;
        }
        if let Some(v) = self.max_batch_rounds {
            config.max_batch_rounds = v;
        }
        if let Some(v) = self.drift {
            config.drift_mode = v;
        }
        if let Some(v) = self.policy {
            config.transfer_policy = v;
        }
        if let Some(v) = self.valuation_init {
            config.valuation_init = v;
        }

        config.validate()?;
        Ok(config)
    }
}

/// What to run for each seed.
enum Plan {
    Scenarios(Vec<ScenarioId>),
    Custom,
}

fn run_seed(args: &Args, plan: &Plan, seed: u64) -> Result<Vec<(ScenarioResult, SimExport)>, SimError> {
    let mut runner = ScenarioRunner::new(seed);
    if let Some(timesteps) = args.timesteps {
        runner = runner.with_timesteps(timesteps);
    }

    match plan {
        Plan::Custom => Ok(vec![runner.run_config(args.custom_config(seed)?)?]),
        Plan::Scenarios(scenarios) => scenarios
            .iter()
            .map(|scenario| runner.run_with_export(*scenario))
            .collect(),
    }
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.json { Level::ERROR } else { level })
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    if !args.json {
        info!("fairdrift simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let plan = match args.scenario.as_str() {
        "all" => Plan::Scenarios(ScenarioId::all()),
        "boundary" => Plan::Scenarios(ScenarioId::boundary()),
        "custom" => Plan::Custom,
        name => match name.parse::<ScenarioId>() {
            Ok(scenario) => Plan::Scenarios(vec![scenario]),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Available scenarios: {}, all, boundary, custom",
                    ScenarioId::all().iter().map(|s| s.name()).collect::<Vec<_>>().join(", "));
                std::process::exit(1);
            }
        },
    };

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    if let Some(path) = &args.export {
        let single = args.seeds == 1
            && match &plan {
                Plan::Custom => true,
                Plan::Scenarios(scenarios) => scenarios.len() == 1,
            };
        if !single {
            eprintln!("Error: --export only supports a single scenario and seed");
            std::process::exit(1);
        }
        info!("Running with export to: {}", path);
    }

    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);

        let runs = match run_seed(&args, &plan, seed) {
            Ok(runs) => runs,
            Err(e) => {
                error!("Run failed (seed={}): {}", seed, e);
                std::process::exit(2);
            }
        };

        for (result, export) in runs {
            if !args.json {
                if result.passed {
                    info!("✓ {} (seed={}) PASSED", result.scenario, seed);
                } else {
                    error!("✗ {} (seed={}) FAILED: {}",
                        result.scenario,
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            if let Some(path) = &args.export {
                if let Err(e) = export.write_to_file(path) {
                    error!("Failed to write export: {:?}", e);
                } else {
                    info!("Exported {} frames to {}", export.frames.len(), path);
                }
            }

            if !result.passed {
                failed_count += 1;
            }
            all_results.push(result);
        }
    }

    // Summary
    let total = all_results.len();
    let passed = total - failed_count;

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario,
                    "seed": r.seed,
                    "passed": r.passed,
                    "timesteps": r.total_timesteps,
                    "metrics": r.metrics,
                    "final_satisfaction": r.final_satisfaction,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to encode summary: {}", e),
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} runs passed!", total);
        } else {
            error!("❌ {}/{} runs failed!", failed_count, total);

            for result in &all_results {
                if !result.passed {
                    error!("  - {} seed={}: {}",
                        result.scenario,
                        result.seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}
