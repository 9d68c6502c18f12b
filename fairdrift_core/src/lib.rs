//! fairdrift core - dynamic EF1 fair-division maintenance
//!
//! Holds a partition of indivisible items among agents whose valuations
//! drift over time, and after every drift step moves items between agents
//! to restore EF1 (envy-freeness up to one item).
//!
//! # Pipeline
//!
//! ```text
//! Simulation ──► DriftModel ──► RestorationEngine ──► TransferPolicy
//!                                                       │
//!                                      ViolationScanner ◄┘
//!                                             │
//!                                      EnvyEvaluator
//! ```
//!
//! The [`Allocation`] is only ever mutated through
//! [`Allocation::transfer`], so its partition invariant holds after every
//! single move. All randomness flows from one seed (see [`SeedStreams`]).
//!
//! # Example
//!
//! ```
//! use fairdrift_core::{FairDivisionConfig, NullSink, Simulation};
//!
//! let config = FairDivisionConfig {
//!     num_agents: 3,
//!     num_items: 9,
//!     timesteps: 10,
//!     ..Default::default()
//! };
//!
//! let output = Simulation::from_config(config).unwrap().run(&mut NullSink);
//! assert_eq!(output.history.agent(0).len(), 10);
//! ```

pub mod allocation;
pub mod config;
pub mod drift;
pub mod envy;
pub mod error;
pub mod events;
pub mod metrics;
pub mod policy;
pub mod restoration;
pub mod scanner;
pub mod seeding;
pub mod simulation;
pub mod valuation;

// Re-export key types for convenience
pub use allocation::{AgentId, Allocation, ItemId};
pub use config::{DriftMode, FairDivisionConfig, PolicyKind, ValuationInit};
pub use drift::DriftModel;
pub use envy::{envy_amount, is_ef1, is_ef1_allocation, is_near_ef1, max_envy};
pub use error::{AllocationError, ConfigError, FairDivisionError, ValuationError};
pub use events::{EventLog, EventSink, FairEvent, NullSink, Tee};
pub use metrics::{satisfaction, RunMetrics, SatisfactionHistory};
pub use policy::{BatchGreedy, IncrementalValidated, RoundOutcome, TransferPolicy};
pub use restoration::{AbortReason, RestorationEngine, RestorationOutcome};
pub use scanner::{find_violations, first_violation, Violation};
pub use seeding::SeedStreams;
pub use simulation::{Simulation, SimulationOutput, StepReport};
pub use valuation::ValuationMatrix;
