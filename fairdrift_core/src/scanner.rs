//! Enumeration of EF1 violations.

use crate::allocation::{AgentId, Allocation};
use crate::envy::{is_ef1, ordered_pairs};
use crate::valuation::ValuationMatrix;

/// An ordered pair where `envier` is not EF1 towards `envied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub envier: AgentId,
    pub envied: AgentId,
}

/// All violating pairs, enviers ascending, then envied ascending.
pub fn find_violations(allocation: &Allocation, valuations: &ValuationMatrix) -> Vec<Violation> {
    ordered_pairs(allocation.num_agents())
        .filter(|&(i, j)| !is_ef1(i, j, allocation, valuations))
        .map(|(envier, envied)| Violation { envier, envied })
        .collect()
}

/// The first violating pair in scan order, without building the full list.
pub fn first_violation(allocation: &Allocation, valuations: &ValuationMatrix) -> Option<Violation> {
    ordered_pairs(allocation.num_agents())
        .find(|&(i, j)| !is_ef1(i, j, allocation, valuations))
        .map(|(envier, envied)| Violation { envier, envied })
}
