//! Simulation orchestrator: drift → restore → record, once per timestep.

use crate::allocation::Allocation;
use crate::config::{FairDivisionConfig, ValuationInit};
use crate::drift::DriftModel;
use crate::envy::max_envy;
use crate::error::{ConfigError, FairDivisionError, ValuationError};
use crate::events::{EventSink, FairEvent};
use crate::metrics::{satisfaction, RunMetrics, SatisfactionHistory};
use crate::restoration::{RestorationEngine, RestorationOutcome};
use crate::seeding::SeedStreams;
use crate::valuation::ValuationMatrix;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Range of the initial valuation generators.
const INITIAL_VALUE_LOW: f64 = 1.0;
const INITIAL_VALUE_HIGH: f64 = 10.0;

/// Draws the initial valuation matrix named by `config.valuation_init`.
pub fn initial_valuations<R: Rng + ?Sized>(
    config: &FairDivisionConfig,
    rng: &mut R,
) -> Result<ValuationMatrix, ValuationError> {
    match config.valuation_init {
        ValuationInit::Continuous => ValuationMatrix::random_uniform(
            rng,
            config.num_agents,
            config.num_items,
            INITIAL_VALUE_LOW,
            INITIAL_VALUE_HIGH,
        ),
        ValuationInit::Integer => ValuationMatrix::random_integer(
            rng,
            config.num_agents,
            config.num_items,
            INITIAL_VALUE_LOW as u32,
            INITIAL_VALUE_HIGH as u32,
        ),
    }
}

/// What happened in one timestep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    /// 1-based timestep index
    pub timestep: usize,

    pub outcome: RestorationOutcome,

    /// Satisfaction recorded after restoration
    pub satisfaction: Vec<f64>,

    /// Largest remaining envy amount, `None` with one agent
    pub max_envy: Option<f64>,
}

/// Final state of a run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutput {
    pub allocation: Allocation,
    pub valuations: ValuationMatrix,
    pub history: SatisfactionHistory,
    pub reports: Vec<StepReport>,
}

impl SimulationOutput {
    pub fn metrics(&self) -> RunMetrics {
        RunMetrics::from_reports(&self.reports)
    }
}

/// A single simulation run owning its allocation and valuations.
pub struct Simulation<R: Rng = ChaCha8Rng> {
    config: FairDivisionConfig,
    allocation: Allocation,
    valuations: ValuationMatrix,
    drift: DriftModel,
    engine: RestorationEngine,
    history: SatisfactionHistory,
    reports: Vec<StepReport>,
    rng: R,
    timestep: usize,
}

impl Simulation<ChaCha8Rng> {
    /// Round-robin allocation and seeded random valuations from `config`.
    pub fn from_config(config: FairDivisionConfig) -> Result<Self, FairDivisionError> {
        config.validate()?;

        let seeds = SeedStreams::new(config.rng_seed);
        let valuations = initial_valuations(&config, &mut seeds.valuation_rng())?;
        let allocation = Allocation::round_robin(config.num_agents, config.num_items)?;

        Self::with_state(config, allocation, valuations, seeds.drift_rng())
    }
}

impl<R: Rng> Simulation<R> {
    /// Starts from caller-supplied state. The valuations become the drift base.
    pub fn with_state(
        config: FairDivisionConfig,
        allocation: Allocation,
        valuations: ValuationMatrix,
        rng: R,
    ) -> Result<Self, FairDivisionError> {
        config.validate()?;

        for (agents, items) in [
            (allocation.num_agents(), allocation.num_items()),
            (valuations.num_agents(), valuations.num_items()),
        ] {
            if agents != config.num_agents || items != config.num_items {
                return Err(ConfigError::ShapeMismatch {
                    expected_agents: config.num_agents,
                    expected_items: config.num_items,
                    agents,
                    items,
                }
                .into());
            }
        }
        allocation.check_partition()?;

        let drift = DriftModel::new(config.drift_mode, config.delta, valuations.clone())?;
        let engine = RestorationEngine::from_config(&config);
        let history = SatisfactionHistory::new(config.num_agents);

        Ok(Self {
            config,
            allocation,
            valuations,
            drift,
            engine,
            history,
            reports: Vec::new(),
            rng,
            timestep: 0,
        })
    }

    pub fn config(&self) -> &FairDivisionConfig {
        &self.config
    }

    pub fn allocation(&self) -> &Allocation {
        &self.allocation
    }

    pub fn valuations(&self) -> &ValuationMatrix {
        &self.valuations
    }

    /// Immutable snapshot of the initial valuations.
    pub fn base_valuations(&self) -> &ValuationMatrix {
        self.drift.base()
    }

    pub fn history(&self) -> &SatisfactionHistory {
        &self.history
    }

    pub fn reports(&self) -> &[StepReport] {
        &self.reports
    }

    /// Timesteps completed so far.
    pub fn timestep(&self) -> usize {
        self.timestep
    }

    pub fn is_finished(&self) -> bool {
        self.timestep >= self.config.timesteps
    }

    /// Runs the next timestep, or returns `None` once all are done.
    pub fn step(&mut self, sink: &mut dyn EventSink) -> Option<&StepReport> {
        if self.is_finished() {
            return None;
        }
        let timestep = self.timestep + 1;
        sink.emit(FairEvent::TimestepStarted { timestep });

        self.drift.apply(&mut self.valuations, &mut self.rng);
        sink.emit(FairEvent::DriftApplied { timestep });

        let outcome = self.engine.restore(&mut self.allocation, &self.valuations, sink);

        let values = satisfaction(&self.allocation, &self.valuations);
        self.history.record(&values);
        sink.emit(FairEvent::TimestepCompleted {
            timestep,
            resolved: outcome.resolved,
        });

        self.timestep = timestep;
        self.reports.push(StepReport {
            timestep,
            outcome,
            satisfaction: values,
            max_envy: max_envy(&self.allocation, &self.valuations),
        });
        self.reports.last()
    }

    /// Runs every remaining timestep.
    pub fn run(mut self, sink: &mut dyn EventSink) -> SimulationOutput {
        while self.step(sink).is_some() {}

        SimulationOutput {
            allocation: self.allocation,
            valuations: self.valuations,
            history: self.history,
            reports: self.reports,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DriftMode, PolicyKind};
    use crate::events::{EventLog, NullSink};
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    #[test]
    fn test_from_config_round_robin() {
        let sim = Simulation::from_config(FairDivisionConfig::default()).unwrap();

        assert_eq!(sim.allocation().bundle(0), &[0, 3, 6]);
        assert_eq!(sim.allocation().bundle(1), &[1, 4, 7]);
        assert_eq!(sim.allocation().bundle(2), &[2, 5, 8]);
        assert_eq!(sim.valuations(), sim.base_valuations());
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = FairDivisionConfig {
            epsilon: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            Simulation::from_config(config),
            Err(FairDivisionError::Config(ConfigError::InvalidReal { field: "epsilon", .. }))
        ));
    }

    #[test]
    fn test_huge_delta_rejected_before_running() {
        let config = FairDivisionConfig {
            delta: 1e308,
            timesteps: 1,
            ..Default::default()
        };
        assert!(matches!(
            Simulation::from_config(config),
            Err(FairDivisionError::Config(ConfigError::InvalidReal { field: "delta", .. }))
        ));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let config = FairDivisionConfig::default();
        let alloc = Allocation::round_robin(3, 9).unwrap();
        let vals = ValuationMatrix::uniform(2, 9, 1.0).unwrap();

        let result = Simulation::with_state(config, alloc, vals, ChaCha8Rng::seed_from_u64(0));

        assert!(matches!(
            result,
            Err(FairDivisionError::Config(ConfigError::ShapeMismatch { agents: 2, .. }))
        ));
    }

    #[test]
    fn test_history_has_one_entry_per_timestep() {
        let config = FairDivisionConfig {
            timesteps: 7,
            ..Default::default()
        };
        let output = Simulation::from_config(config).unwrap().run(&mut NullSink);

        assert_eq!(output.history.num_agents(), 3);
        for agent in 0..3 {
            assert_eq!(output.history.agent(agent).len(), 7);
        }
        assert_eq!(output.reports.len(), 7);
        assert!(output.allocation.check_partition().is_ok());
    }

    #[test]
    fn test_same_seed_same_run() {
        let config = FairDivisionConfig {
            delta: 4.0,
            timesteps: 20,
            drift_mode: DriftMode::Walk,
            ..Default::default()
        };

        let a = Simulation::from_config(config.clone()).unwrap().run(&mut NullSink);
        let b = Simulation::from_config(config).unwrap().run(&mut NullSink);

        assert_eq!(a.allocation, b.allocation);
        assert_eq!(a.valuations, b.valuations);
        assert_eq!(a.history, b.history);
    }

    #[test]
    fn test_no_drift_on_ef1_allocation_never_transfers() {
        let config = FairDivisionConfig {
            delta: 0.0,
            timesteps: 25,
            ..Default::default()
        };
        for policy in [PolicyKind::Batch, PolicyKind::Incremental] {
            let config = FairDivisionConfig {
                transfer_policy: policy,
                ..config.clone()
            };
            let alloc = Allocation::round_robin(3, 9).unwrap();
            let vals = ValuationMatrix::uniform(3, 9, 2.0).unwrap();
            let mut log = EventLog::new();

            let output = Simulation::with_state(config, alloc.clone(), vals, ChaCha8Rng::seed_from_u64(1))
                .unwrap()
                .run(&mut log);

            assert_eq!(output.allocation, alloc);
            assert_eq!(log.transfer_count(), 0);
            assert!(output.reports.iter().all(|r| r.outcome.resolved));
        }
    }

    #[test]
    fn test_single_agent_history_is_total_value() {
        let config = FairDivisionConfig {
            num_agents: 1,
            num_items: 5,
            timesteps: 6,
            delta: 2.0,
            drift_mode: DriftMode::Walk,
            ..Default::default()
        };
        let mut sim = Simulation::from_config(config).unwrap();

        while let Some(report) = sim.step(&mut NullSink) {
            assert_eq!(report.outcome.transfers, 0);
            assert!(report.outcome.resolved);
            assert_eq!(report.max_envy, None);
        }
        let total: f64 = (0..5).map(|item| sim.valuations().value(0, item)).sum();
        let last = sim.history().agent(0).last().copied().unwrap();
        assert_relative_eq!(last, total);
    }

    #[test]
    fn test_zero_items_history_is_all_zero() {
        let config = FairDivisionConfig {
            num_agents: 4,
            num_items: 0,
            timesteps: 5,
            ..Default::default()
        };
        let output = Simulation::from_config(config).unwrap().run(&mut NullSink);

        for agent in 0..4 {
            assert_eq!(output.history.agent(agent), &[0.0; 5]);
        }
        assert!(output.reports.iter().all(|r| r.outcome.resolved));
    }

    #[test]
    fn test_zero_timesteps() {
        let config = FairDivisionConfig {
            timesteps: 0,
            ..Default::default()
        };
        let mut sim = Simulation::from_config(config).unwrap();

        assert!(sim.is_finished());
        assert!(sim.step(&mut NullSink).is_none());
        assert!(sim.history().is_empty());
    }

    #[test]
    fn test_event_stream_brackets_each_timestep() {
        let config = FairDivisionConfig {
            timesteps: 3,
            delta: 4.0,
            ..Default::default()
        };
        let mut log = EventLog::new();
        Simulation::from_config(config).unwrap().run(&mut log);

        let started = log
            .events()
            .iter()
            .filter(|e| matches!(e, FairEvent::TimestepStarted { .. }))
            .count();
        let completed = log
            .events()
            .iter()
            .filter(|e| matches!(e, FairEvent::TimestepCompleted { .. }))
            .count();
        assert_eq!(started, 3);
        assert_eq!(completed, 3);
        assert_eq!(log.events()[0], FairEvent::TimestepStarted { timestep: 1 });
    }
}
