//! Named simulation scenarios.

use fairdrift_core::{DriftMode, FairDivisionConfig, PolicyKind, ValuationInit};

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// Anchored drift with batch-greedy restoration
    StableDrift,

    /// Random-walk drift with validated incremental restoration
    IncrementalRestore,

    /// 200 steps of random-walk drift
    LongWalk,

    /// Uniform valuations, no drift: nothing should move
    NoDrift,

    /// One agent owns everything
    SingleAgent,

    /// No items at all
    ZeroItems,

    /// Batch-greedy with a high transfer threshold
    StrictThreshold,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::StableDrift,
            ScenarioId::IncrementalRestore,
            ScenarioId::LongWalk,
            ScenarioId::NoDrift,
            ScenarioId::SingleAgent,
            ScenarioId::ZeroItems,
            ScenarioId::StrictThreshold,
        ]
    }

    /// Returns boundary scenarios only.
    pub fn boundary() -> Vec<ScenarioId> {
        vec![
            ScenarioId::NoDrift,
            ScenarioId::SingleAgent,
            ScenarioId::ZeroItems,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::StableDrift => "stable_drift",
            ScenarioId::IncrementalRestore => "incremental_restore",
            ScenarioId::LongWalk => "long_walk",
            ScenarioId::NoDrift => "no_drift",
            ScenarioId::SingleAgent => "single_agent",
            ScenarioId::ZeroItems => "zero_items",
            ScenarioId::StrictThreshold => "strict_threshold",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::StableDrift => "3 agents, 9 items, anchored drift ±4, batch-greedy restoration",
            ScenarioId::IncrementalRestore => "3 agents, 9 integer-valued items, walk ±0.2, near-EF1 ε=0.1",
            ScenarioId::LongWalk => "4 agents, 12 items, 200 steps of walk drift ±2",
            ScenarioId::NoDrift => "uniform valuations, delta 0: zero transfers expected",
            ScenarioId::SingleAgent => "1 agent, satisfaction equals total valuation",
            ScenarioId::ZeroItems => "no items: all bundles empty, satisfaction zero",
            ScenarioId::StrictThreshold => "batch-greedy only moves items worth at least 8",
        }
    }

    /// Returns true if the scenario starts from uniform valuations rather
    /// than the seeded generator.
    pub fn uses_uniform_valuations(&self) -> bool {
        matches!(self, ScenarioId::NoDrift)
    }

    /// Base configuration for this scenario.
    pub fn config(&self, seed: u64) -> FairDivisionConfig {
        let base = FairDivisionConfig {
            rng_seed: seed,
            ..Default::default()
        };

        match self {
            ScenarioId::StableDrift => FairDivisionConfig {
                num_agents: 3,
                num_items: 9,
                delta: 4.0,
                timesteps: 10,
                min_transfer_diff: 0.0,
                drift_mode: DriftMode::Anchored,
                transfer_policy: PolicyKind::Batch,
                ..base
            },
            ScenarioId::IncrementalRestore => FairDivisionConfig {
                num_agents: 3,
                num_items: 9,
                delta: 0.2,
                epsilon: 0.1,
                timesteps: 10,
                max_restoration_steps: 100,
                drift_mode: DriftMode::Walk,
                transfer_policy: PolicyKind::Incremental,
                valuation_init: ValuationInit::Integer,
                ..base
            },
            ScenarioId::LongWalk => FairDivisionConfig {
                num_agents: 4,
                num_items: 12,
                delta: 2.0,
                timesteps: 200,
                drift_mode: DriftMode::Walk,
                transfer_policy: PolicyKind::Batch,
                ..base
            },
            ScenarioId::NoDrift => FairDivisionConfig {
                num_agents: 3,
                num_items: 9,
                delta: 0.0,
                timesteps: 20,
                ..base
            },
            ScenarioId::SingleAgent => FairDivisionConfig {
                num_agents: 1,
                num_items: 6,
                delta: 3.0,
                timesteps: 15,
                drift_mode: DriftMode::Walk,
                ..base
            },
            ScenarioId::ZeroItems => FairDivisionConfig {
                num_agents: 3,
                num_items: 0,
                delta: 1.0,
                timesteps: 10,
                ..base
            },
            ScenarioId::StrictThreshold => FairDivisionConfig {
                num_agents: 3,
                num_items: 9,
                delta: 4.0,
                timesteps: 10,
                min_transfer_diff: 8.0,
                transfer_policy: PolicyKind::Batch,
                ..base
            },
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stable_drift" | "stabledrift" | "stable" => Ok(ScenarioId::StableDrift),
            "incremental_restore" | "incremental" => Ok(ScenarioId::IncrementalRestore),
            "long_walk" | "longwalk" | "walk" => Ok(ScenarioId::LongWalk),
            "no_drift" | "nodrift" => Ok(ScenarioId::NoDrift),
            "single_agent" | "singleagent" => Ok(ScenarioId::SingleAgent),
            "zero_items" | "zeroitems" => Ok(ScenarioId::ZeroItems),
            "strict_threshold" | "strict" => Ok(ScenarioId::StrictThreshold),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
