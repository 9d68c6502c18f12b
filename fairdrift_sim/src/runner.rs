//! Scenario runner - executes scenarios and checks their invariants.

use crate::error::SimError;
use crate::exporter::{SimExport, SimFrame};
use crate::observer::TracingSink;
use crate::scenarios::ScenarioId;

use fairdrift_core::{
    Allocation, EventLog, FairDivisionConfig, FairDivisionError, FairEvent, RunMetrics, SeedStreams,
    Simulation, Tee, ValuationMatrix,
};
use tracing::{debug, info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario name (`custom` for ad-hoc configs)
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Whether the run passed all checks
    pub passed: bool,

    /// Timesteps executed
    pub total_timesteps: usize,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during the run
    pub metrics: RunMetrics,

    /// Per-agent satisfaction at the end of the run
    pub final_satisfaction: Vec<f64>,
}

/// Runs scenarios.
pub struct ScenarioRunner {
    /// Master seed
    seed: u64,

    /// Overrides the scenario's own timestep count
    timesteps: Option<usize>,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            timesteps: None,
        }
    }

    /// Sets the number of timesteps for every scenario.
    pub fn with_timesteps(mut self, timesteps: usize) -> Self {
        self.timesteps = Some(timesteps);
        self
    }

    /// The configuration a scenario runs with under this runner.
    pub fn config_for(&self, scenario: ScenarioId) -> FairDivisionConfig {
        let mut config = scenario.config(self.seed);
        if let Some(timesteps) = self.timesteps {
            config.timesteps = timesteps;
        }
        config
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> Result<ScenarioResult, SimError> {
        let (result, _) = self.execute(Some(scenario), self.config_for(scenario))?;
        Ok(result)
    }

    /// Runs a scenario and also collects a frame per timestep.
    pub fn run_with_export(&self, scenario: ScenarioId) -> Result<(ScenarioResult, SimExport), SimError> {
        self.execute(Some(scenario), self.config_for(scenario))
    }

    /// Runs an arbitrary configuration with the generic checks only.
    pub fn run_config(&self, config: FairDivisionConfig) -> Result<(ScenarioResult, SimExport), SimError> {
        self.execute(None, config)
    }

    fn build(&self, scenario: Option<ScenarioId>, config: FairDivisionConfig) -> Result<Simulation, SimError> {
        if !scenario.is_some_and(|s| s.uses_uniform_valuations()) {
            return Ok(Simulation::from_config(config)?);
        }

        let allocation = Allocation::round_robin(config.num_agents, config.num_items)
            .map_err(FairDivisionError::from)?;
        let valuations = ValuationMatrix::uniform(config.num_agents, config.num_items, 1.0)
            .map_err(FairDivisionError::from)?;
        let rng = SeedStreams::new(config.rng_seed).drift_rng();
        Ok(Simulation::with_state(config, allocation, valuations, rng)?)
    }

    fn execute(
        &self,
        scenario: Option<ScenarioId>,
        config: FairDivisionConfig,
    ) -> Result<(ScenarioResult, SimExport), SimError> {
        let name = scenario.map_or("custom", |s| s.name());
        info!(
            "Starting scenario: {} (seed={}, policy={}, drift={})",
            name, config.rng_seed, config.transfer_policy, config.drift_mode
        );

        let mut sim = self.build(scenario, config.clone())?;
        let initial = sim.allocation().clone();
        let mut export = SimExport::new(name, &config, &initial);
        let mut log = EventLog::new();
        let mut failures: Vec<String> = Vec::new();

        loop {
            let mut sink = Tee(TracingSink, &mut log);
            let Some(report) = sim.step(&mut sink) else {
                break;
            };
            let report = report.clone();

            if let Err(e) = sim.allocation().check_partition() {
                failures.push(format!("t={}: partition broken: {}", report.timestep, e));
            }
            if sim.valuations().min_value().is_some_and(|v| v < 0.0) {
                failures.push(format!("t={}: negative valuation", report.timestep));
            }

            export.add_frame(SimFrame::new(&report, sim.allocation()));

            debug!(
                "  t={} | resolved={} | transfers={} | satisfaction={:?}",
                report.timestep, report.outcome.resolved, report.outcome.transfers, report.satisfaction
            );
        }

        let metrics = RunMetrics::from_reports(sim.reports());

        if sim.history().len() != config.timesteps {
            failures.push(format!(
                "history has {} entries, expected {}",
                sim.history().len(),
                config.timesteps
            ));
        }
        if log.transfer_count() != metrics.total_transfers {
            failures.push(format!(
                "event stream saw {} transfers, reports saw {}",
                log.transfer_count(),
                metrics.total_transfers
            ));
        }

        if let Some(scenario) = scenario {
            if let Err(reason) = check_expectations(scenario, &config, &sim, &initial, &log) {
                failures.push(reason);
            }
        }

        let passed = failures.is_empty();
        if !passed {
            warn!("{} failed: {}", name, failures.join("; "));
        }
        info!(
            "{}: {}/{} timesteps EF1, {} transfers",
            name, metrics.resolved_timesteps, metrics.timesteps, metrics.total_transfers
        );

        export.finalize(passed, metrics.clone());

        let result = ScenarioResult {
            scenario: name.to_string(),
            seed: config.rng_seed,
            passed,
            total_timesteps: sim.timestep(),
            failure_reason: if passed { None } else { Some(failures.join("; ")) },
            metrics,
            final_satisfaction: sim.history().latest().unwrap_or_default(),
        };
        Ok((result, export))
    }
}

/// Scenario-specific assertions on a finished run.
fn check_expectations(
    scenario: ScenarioId,
    config: &FairDivisionConfig,
    sim: &Simulation,
    initial: &Allocation,
    log: &EventLog,
) -> Result<(), String> {
    match scenario {
        ScenarioId::NoDrift => {
            if sim.allocation() != initial {
                return Err("allocation changed without drift".to_string());
            }
            if log.transfer_count() != 0 {
                return Err(format!("{} transfers without drift", log.transfer_count()));
            }
        }
        ScenarioId::SingleAgent => {
            let total = sim.valuations().bundle_value(0, &(0..config.num_items).collect::<Vec<_>>());
            if let Some(&recorded) = sim.history().agent(0).last() {
                if (recorded - total).abs() > 1e-9 {
                    return Err(format!("satisfaction {:.3} != total valuation {:.3}", recorded, total));
                }
            }
            if log.events().iter().any(|e| matches!(e, FairEvent::ViolationDetected { .. })) {
                return Err("violation reported with a single agent".to_string());
            }
        }
        ScenarioId::ZeroItems => {
            if sim.history().per_agent().iter().flatten().any(|&v| v != 0.0) {
                return Err("non-zero satisfaction with no items".to_string());
            }
        }
        ScenarioId::StrictThreshold => {
            let undersized = log.events().iter().any(|e| {
                matches!(e, FairEvent::TransferBelowThreshold { gain, .. } if *gain >= config.min_transfer_diff)
            });
            if undersized {
                return Err("transfer skipped despite meeting threshold".to_string());
            }
        }
        ScenarioId::IncrementalRestore => {
            if let Some(report) = sim
                .reports()
                .iter()
                .find(|r| r.outcome.transfers > config.max_restoration_steps)
            {
                return Err(format!("t={}: exceeded max_restoration_steps", report.timestep));
            }
        }
        ScenarioId::StableDrift | ScenarioId::LongWalk => {}
    }
    Ok(())
}
