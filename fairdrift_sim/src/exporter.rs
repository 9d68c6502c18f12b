//! JSON exporter for external plotting.
//!
//! Exports one frame per timestep (allocation, satisfaction, restoration
//! outcome) so a plotting layer can draw satisfaction-over-time curves.

use fairdrift_core::{Allocation, FairDivisionConfig, RunMetrics, StepReport};
use serde::Serialize;
use std::fs::File;
use std::io::Write;

/// A single timestep of simulation data.
#[derive(Debug, Clone, Serialize)]
pub struct SimFrame {
    pub timestep: usize,

    /// Bundles after restoration, indexed by agent
    pub allocation: Vec<Vec<usize>>,

    /// Own-bundle value per agent
    pub satisfaction: Vec<f64>,

    pub resolved: bool,
    pub transfers: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_envy: Option<f64>,
}

impl SimFrame {
    pub fn new(report: &StepReport, allocation: &Allocation) -> Self {
        Self {
            timestep: report.timestep,
            allocation: allocation.bundles().to_vec(),
            satisfaction: report.satisfaction.clone(),
            resolved: report.outcome.resolved,
            transfers: report.outcome.transfers,
            max_envy: report.max_envy,
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    pub config: FairDivisionConfig,

    /// Allocation before the first timestep
    pub initial_allocation: Vec<Vec<usize>>,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<RunMetrics>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, config: &FairDivisionConfig, initial: &Allocation) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed: config.rng_seed,
            config: config.clone(),
            initial_allocation: initial.bundles().to_vec(),
            frames: Vec::new(),
            passed: false,
            metrics: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, metrics: RunMetrics) {
        self.passed = passed;
        self.metrics = Some(metrics);
    }

    /// Per-agent satisfaction series, as a plotter wants them.
    pub fn satisfaction_series(&self) -> Vec<Vec<f64>> {
        let num_agents = self.initial_allocation.len();
        (0..num_agents)
            .map(|agent| self.frames.iter().map(|f| f.satisfaction[agent]).collect())
            .collect()
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
