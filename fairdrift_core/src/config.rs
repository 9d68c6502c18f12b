//! Simulation configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How valuations move between timesteps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftMode {
    /// Re-drawn around the initial valuations every step.
    #[default]
    Anchored,

    /// Cumulative random walk, clipped at zero.
    Walk,
}

/// Which transfer policy restores EF1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// All-pairs greedy passes until a pass moves nothing.
    #[default]
    Batch,

    /// First violator only, validated against near-EF1.
    Incremental,
}

/// Initial valuation generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValuationInit {
    /// Uniform reals in `[1, 10]`.
    #[default]
    Continuous,

    /// Uniform integers in `1..=10`.
    Integer,
}

impl DriftMode {
    pub fn name(&self) -> &'static str {
        match self {
            DriftMode::Anchored => "anchored",
            DriftMode::Walk => "walk",
        }
    }
}

impl PolicyKind {
    pub fn name(&self) -> &'static str {
        match self {
            PolicyKind::Batch => "batch",
            PolicyKind::Incremental => "incremental",
        }
    }
}

impl ValuationInit {
    pub fn name(&self) -> &'static str {
        match self {
            ValuationInit::Continuous => "continuous",
            ValuationInit::Integer => "integer",
        }
    }
}

impl fmt::Display for DriftMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Display for ValuationInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DriftMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anchored" | "stable" => Ok(DriftMode::Anchored),
            "walk" | "random_walk" | "random-walk" => Ok(DriftMode::Walk),
            _ => Err(ConfigError::UnknownVariant {
                field: "drift_mode",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "batch" | "greedy" | "batch_greedy" => Ok(PolicyKind::Batch),
            "incremental" | "validated" => Ok(PolicyKind::Incremental),
            _ => Err(ConfigError::UnknownVariant {
                field: "transfer_policy",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for ValuationInit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "continuous" | "real" => Ok(ValuationInit::Continuous),
            "integer" | "int" => Ok(ValuationInit::Integer),
            _ => Err(ConfigError::UnknownVariant {
                field: "valuation_init",
                value: s.to_string(),
            }),
        }
    }
}

/// Construction parameters for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FairDivisionConfig {
    /// Number of agents (> 0)
    pub num_agents: usize,

    /// Number of items
    pub num_items: usize,

    /// Drift magnitude; each step draws from `[-delta, delta]`
    pub delta: f64,

    /// Near-EF1 tolerance for the incremental policy
    pub epsilon: f64,

    /// Number of drift→restore steps
    pub timesteps: usize,

    /// Minimum recipient gain for a batch-greedy transfer
    pub min_transfer_diff: f64,

    /// Transfer bound per timestep for the incremental policy
    pub max_restoration_steps: usize,

    /// Pass bound per timestep for the batch policy
    pub max_batch_rounds: usize,

    pub drift_mode: DriftMode,

    pub transfer_policy: PolicyKind,

    pub valuation_init: ValuationInit,

    /// Master seed for all randomness
    pub rng_seed: u64,
}

impl Default for FairDivisionConfig {
    fn default() -> Self {
        Self {
            num_agents: 3,
            num_items: 9,
            delta: 1.0,
            epsilon: 0.1,
            timesteps: 10,
            min_transfer_diff: 0.0,
            max_restoration_steps: 100,
            max_batch_rounds: 1000,
            drift_mode: DriftMode::Anchored,
            transfer_policy: PolicyKind::Batch,
            valuation_init: ValuationInit::Continuous,
            rng_seed: 42,
        }
    }
}

impl FairDivisionConfig {
    /// Checks every option; nothing downstream runs on an invalid config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_agents == 0 {
            return Err(ConfigError::NoAgents);
        }

        for (field, value) in [
            ("delta", self.delta),
            ("epsilon", self.epsilon),
            ("min_transfer_diff", self.min_transfer_diff),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::invalid_real(field, value));
            }
        }

        // Drift samples from [-delta, delta]; the width must stay finite
        if !(2.0 * self.delta).is_finite() {
            return Err(ConfigError::invalid_real("delta", self.delta));
        }

        Ok(())
    }

    /// Parses and validates a JSON config. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
