//! fairdrift simulation harness
//!
//! Runs the EF1 maintenance engine from `fairdrift_core` through named,
//! seeded scenarios and checks invariants after every timestep:
//!
//! - **Partition**: every item is owned by exactly one agent
//! - **History**: one satisfaction entry per agent per timestep
//! - **Valuations**: never negative after drift
//! - **Events**: the event stream agrees with the step reports
//!
//! Every run is reproducible from its seed.
//!
//! # Usage
//!
//! ```ignore
//! use fairdrift_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let runner = ScenarioRunner::new(42).with_timesteps(20);
//! let result = runner.run(ScenarioId::StableDrift)?;
//! assert!(result.passed);
//! ```

mod error;
mod exporter;
mod observer;
mod runner;
pub mod scenarios;

pub use error::SimError;
pub use exporter::{SimExport, SimFrame};
pub use observer::TracingSink;
pub use runner::{ScenarioResult, ScenarioRunner};
