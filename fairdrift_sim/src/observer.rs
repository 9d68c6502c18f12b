//! Event sink that forwards engine events to `tracing`.

use fairdrift_core::{EventSink, FairEvent};
use tracing::{debug, info, warn};

/// Logs per-transfer detail at DEBUG and per-timestep outcomes at INFO/WARN.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: FairEvent) {
        match event {
            FairEvent::TimestepStarted { timestep } => debug!(timestep, "timestep started"),
            FairEvent::DriftApplied { timestep } => debug!(timestep, "drift applied"),
            FairEvent::ViolationDetected { envier, envied, envy } => {
                debug!(envier, envied, envy, "agent {} envies agent {}", envier, envied)
            }
            FairEvent::TransferCommitted { item, from, to } => {
                debug!(item, from, to, "transferred item {} → agent {}", item, to)
            }
            FairEvent::TransferBelowThreshold { item, from, to, gain } => {
                debug!(item, from, to, gain, "transfer below threshold")
            }
            FairEvent::TransferRejected { item, from, to } => {
                debug!(item, from, to, "transfer rejected: breaks near-EF1")
            }
            FairEvent::RestorationAborted { reason } => warn!(?reason, "restoration aborted"),
            FairEvent::RestorationFinished {
                resolved,
                transfers,
                rounds,
            } => debug!(resolved, transfers, rounds, "restoration finished"),
            FairEvent::TimestepCompleted { timestep, resolved } => {
                if resolved {
                    info!(timestep, "EF1 holds");
                } else {
                    warn!(timestep, "unresolved envy");
                }
            }
        }
    }
}
