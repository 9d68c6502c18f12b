//! Error types for the fair-division engine.

use thiserror::Error;

/// Invalid construction parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// There must be at least one agent.
    #[error("num_agents must be greater than zero")]
    NoAgents,

    /// A real-valued option is negative or not finite.
    #[error("{field} must be a finite non-negative number, got {value}")]
    InvalidReal { field: &'static str, value: f64 },

    /// Option could not be parsed from text.
    #[error("Unknown {field}: {value}")]
    UnknownVariant { field: &'static str, value: String },

    /// Config document could not be parsed.
    #[error("Invalid config document: {0}")]
    Parse(String),

    /// Supplied allocation or valuations disagree with the configured shape.
    #[error("Shape mismatch: expected {expected_agents}x{expected_items}, got {agents}x{items}")]
    ShapeMismatch {
        expected_agents: usize,
        expected_items: usize,
        agents: usize,
        items: usize,
    },
}

impl ConfigError {
    /// Creates an invalid-real error.
    pub fn invalid_real(field: &'static str, value: f64) -> Self {
        Self::InvalidReal { field, value }
    }
}

/// Violations of the allocation partition or bad transfer requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("Agent {agent} out of range (num_agents = {num_agents})")]
    AgentOutOfRange { agent: usize, num_agents: usize },

    #[error("Item {item} out of range (num_items = {num_items})")]
    ItemOutOfRange { item: usize, num_items: usize },

    /// Transfer source does not own the item.
    #[error("Agent {agent} does not own item {item}")]
    NotOwned { agent: usize, item: usize },

    #[error("Item {item} is assigned to no agent")]
    MissingItem { item: usize },

    #[error("Item {item} is assigned more than once")]
    DuplicateItem { item: usize },

    #[error("Allocation needs at least one agent")]
    NoAgents,
}

/// Malformed valuation input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    #[error("Row {row} has {len} entries, expected {expected}")]
    RaggedRow { row: usize, len: usize, expected: usize },

    #[error("Valuation [{agent}][{item}] = {value} is negative or not finite")]
    InvalidEntry { agent: usize, item: usize, value: f64 },

    #[error("Valuation matrix needs at least one agent")]
    NoAgents,

    /// Sampling bounds are reversed, negative or not finite.
    #[error("Invalid sampling range [{low}, {high}]")]
    InvalidRange { low: f64, high: f64 },
}

/// Top-level error for building a simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FairDivisionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Allocation error: {0}")]
    Allocation(#[from] AllocationError),

    #[error("Valuation error: {0}")]
    Valuation(#[from] ValuationError),
}
