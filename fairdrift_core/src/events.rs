//! Structured event stream emitted while the engine runs.
//!
//! Callers plug in an [`EventSink`] to observe drift, violations, and
//! transfers without parsing log text.

use crate::allocation::{AgentId, ItemId};
use crate::restoration::AbortReason;
use serde::Serialize;

/// Something observable that happened during a simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FairEvent {
    TimestepStarted { timestep: usize },

    /// Valuations were perturbed for `timestep`.
    DriftApplied { timestep: usize },

    /// `envier` is not EF1 towards `envied`.
    ViolationDetected { envier: AgentId, envied: AgentId, envy: f64 },

    /// `item` moved from `from` to `to`.
    TransferCommitted { item: ItemId, from: AgentId, to: AgentId },

    /// Batch-greedy skipped a transfer whose gain was under the threshold.
    TransferBelowThreshold { item: ItemId, from: AgentId, to: AgentId, gain: f64 },

    /// Incremental policy refused a transfer that would break near-EF1.
    TransferRejected { item: ItemId, from: AgentId, to: AgentId },

    RestorationAborted { reason: AbortReason },

    RestorationFinished { resolved: bool, transfers: usize, rounds: usize },

    /// Satisfaction was recorded for `timestep`.
    TimestepCompleted { timestep: usize, resolved: bool },
}

/// Receiver for engine events.
pub trait EventSink {
    fn emit(&mut self, event: FairEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: FairEvent) {}
}

/// Records every event in order.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<FairEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[FairEvent] {
        &self.events
    }

    /// Number of committed transfers seen so far.
    pub fn transfer_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, FairEvent::TransferCommitted { .. }))
            .count()
    }

    /// Drains the recorded events.
    pub fn take(&mut self) -> Vec<FairEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: FairEvent) {
        self.events.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: FairEvent) {
        (**self).emit(event);
    }
}

/// Forwards every event to two sinks.
pub struct Tee<A, B>(pub A, pub B);

impl<A: EventSink, B: EventSink> EventSink for Tee<A, B> {
    fn emit(&mut self, event: FairEvent) {
        self.0.emit(event.clone());
        self.1.emit(event);
    }
}
