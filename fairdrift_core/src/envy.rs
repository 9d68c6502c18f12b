//! EF1 envy evaluation.
//!
//! Agent `i` is EF1 towards agent `j` when `i` values its own bundle at
//! least as much as `j`'s bundle with the single item `i` likes best in it
//! removed:
//!
//! ```text
//! envy(i, j) = v_i(B_j \ {top_i(B_j)}) - v_i(B_i)
//! EF1(i, j)  <=> envy(i, j) <= 0
//! ```

use crate::allocation::{AgentId, Allocation};
use crate::valuation::ValuationMatrix;

/// Envy of `i` towards `j` after removing `i`'s favourite item from `j`'s bundle.
///
/// For an empty `j` bundle this is `-v_i(B_i)`, which is never positive.
pub fn envy_amount(i: AgentId, j: AgentId, allocation: &Allocation, valuations: &ValuationMatrix) -> f64 {
    let val_i = valuations.bundle_value(i, allocation.bundle(i));
    let envied = allocation.bundle(j);

    let val_j_minus_top = match valuations.most_valued_item(i, envied) {
        Some(top) => envied
            .iter()
            .filter(|&&item| item != top)
            .map(|&item| valuations.value(i, item))
            .sum(),
        None => 0.0,
    };

    val_j_minus_top - val_i
}

/// True when `i` does not envy `j` up to one item.
pub fn is_ef1(i: AgentId, j: AgentId, allocation: &Allocation, valuations: &ValuationMatrix) -> bool {
    if allocation.bundle(j).is_empty() {
        return true;
    }
    envy_amount(i, j, allocation, valuations) <= 0.0
}

/// True when every ordered pair has envy at most `epsilon`.
pub fn is_near_ef1(allocation: &Allocation, valuations: &ValuationMatrix, epsilon: f64) -> bool {
    ordered_pairs(allocation.num_agents())
        .all(|(i, j)| envy_amount(i, j, allocation, valuations) <= epsilon)
}

/// True when every ordered pair is EF1.
pub fn is_ef1_allocation(allocation: &Allocation, valuations: &ValuationMatrix) -> bool {
    ordered_pairs(allocation.num_agents()).all(|(i, j)| is_ef1(i, j, allocation, valuations))
}

/// Largest envy amount over all ordered pairs, `None` with a single agent.
pub fn max_envy(allocation: &Allocation, valuations: &ValuationMatrix) -> Option<f64> {
    ordered_pairs(allocation.num_agents())
        .map(|(i, j)| envy_amount(i, j, allocation, valuations))
        .reduce(f64::max)
}

/// Ordered pairs `(i, j)`, `i != j`, with `i` outer and `j` inner, both ascending.
pub(crate) fn ordered_pairs(num_agents: usize) -> impl Iterator<Item = (AgentId, AgentId)> {
    (0..num_agents).flat_map(move |i| (0..num_agents).filter(move |&j| j != i).map(move |j| (i, j)))
}
