//! Agent × item valuation matrix.

use crate::allocation::{AgentId, ItemId};
use crate::error::ValuationError;
use nalgebra::DMatrix;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::Serialize;

/// Non-negative valuations, one row per agent and one column per item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationMatrix {
    values: DMatrix<f64>,
}

impl ValuationMatrix {
    /// Every agent values every item at `value`.
    pub fn uniform(num_agents: usize, num_items: usize, value: f64) -> Result<Self, ValuationError> {
        if num_agents == 0 {
            return Err(ValuationError::NoAgents);
        }
        if !(value.is_finite() && value >= 0.0) {
            return Err(ValuationError::InvalidEntry { agent: 0, item: 0, value });
        }
        Ok(Self {
            values: DMatrix::from_element(num_agents, num_items, value),
        })
    }

    /// Builds a matrix from per-agent rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ValuationError> {
        let num_agents = rows.len();
        if num_agents == 0 {
            return Err(ValuationError::NoAgents);
        }
        let num_items = rows[0].len();

        for (agent, row) in rows.iter().enumerate() {
            if row.len() != num_items {
                return Err(ValuationError::RaggedRow {
                    row: agent,
                    len: row.len(),
                    expected: num_items,
                });
            }
            for (item, &value) in row.iter().enumerate() {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(ValuationError::InvalidEntry { agent, item, value });
                }
            }
        }

        Ok(Self {
            values: DMatrix::from_fn(num_agents, num_items, |agent, item| rows[agent][item]),
        })
    }

    /// Entries drawn uniformly from the real interval `[low, high]`.
    ///
    /// Draw order is row-major (agent, then item).
    pub fn random_uniform<R: Rng + ?Sized>(
        rng: &mut R,
        num_agents: usize,
        num_items: usize,
        low: f64,
        high: f64,
    ) -> Result<Self, ValuationError> {
        if !(low >= 0.0 && low <= high && high.is_finite()) {
            return Err(ValuationError::InvalidRange { low, high });
        }
        let dist = Uniform::new_inclusive(low, high);
        let rows: Vec<Vec<f64>> = (0..num_agents)
            .map(|_| (0..num_items).map(|_| dist.sample(rng)).collect())
            .collect();
        Self::from_rows(&rows)
    }

    /// Entries drawn uniformly from the integers `low..=high`.
    pub fn random_integer<R: Rng + ?Sized>(
        rng: &mut R,
        num_agents: usize,
        num_items: usize,
        low: u32,
        high: u32,
    ) -> Result<Self, ValuationError> {
        if low > high {
            return Err(ValuationError::InvalidRange {
                low: f64::from(low),
                high: f64::from(high),
            });
        }
        let dist = Uniform::new_inclusive(low, high);
        let rows: Vec<Vec<f64>> = (0..num_agents)
            .map(|_| (0..num_items).map(|_| f64::from(dist.sample(rng))).collect())
            .collect();
        Self::from_rows(&rows)
    }

    pub fn num_agents(&self) -> usize {
        self.values.nrows()
    }

    pub fn num_items(&self) -> usize {
        self.values.ncols()
    }

    /// Valuation of `item` by `agent`.
    pub fn value(&self, agent: AgentId, item: ItemId) -> f64 {
        self.values[(agent, item)]
    }

    /// Crate-internal mutator used by the drift model.
    pub(crate) fn set(&mut self, agent: AgentId, item: ItemId, value: f64) {
        self.values[(agent, item)] = value;
    }

    /// Sum of `agent`'s valuations over `items`.
    pub fn bundle_value(&self, agent: AgentId, items: &[ItemId]) -> f64 {
        items.iter().map(|&item| self.value(agent, item)).sum()
    }

    /// The item in `items` that `agent` values most.
    ///
    /// Ties go to the lowest item id, independent of bundle order.
    /// Returns `None` for an empty bundle.
    pub fn most_valued_item(&self, agent: AgentId, items: &[ItemId]) -> Option<ItemId> {
        let mut best: Option<(ItemId, f64)> = None;
        for &item in items {
            let value = self.value(agent, item);
            best = match best {
                Some((best_item, best_value))
                    if best_value > value || (best_value == value && best_item < item) =>
                {
                    Some((best_item, best_value))
                }
                _ => Some((item, value)),
            };
        }
        best.map(|(item, _)| item)
    }

    /// Per-agent rows, for export.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.num_agents())
            .map(|agent| self.values.row(agent).iter().copied().collect())
            .collect()
    }

    /// Smallest entry, or `None` when there are no items.
    pub fn min_value(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    /// Mean entry, or `None` when there are no items.
    pub fn mean_value(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.mean())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_from_rows_and_bundle_value() {
        let v = ValuationMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 0.5, 0.0]]).unwrap();

        assert_eq!(v.num_agents(), 2);
        assert_eq!(v.num_items(), 3);
        assert_relative_eq!(v.bundle_value(0, &[0, 2]), 4.0);
        assert_relative_eq!(v.bundle_value(1, &[]), 0.0);
    }

    #[test]
    fn test_from_rows_rejects_ragged_and_negative() {
        assert!(matches!(
            ValuationMatrix::from_rows(&[vec![1.0, 2.0], vec![1.0]]),
            Err(ValuationError::RaggedRow { row: 1, .. })
        ));
        assert!(matches!(
            ValuationMatrix::from_rows(&[vec![1.0, -0.1]]),
            Err(ValuationError::InvalidEntry { agent: 0, item: 1, .. })
        ));
        assert!(matches!(
            ValuationMatrix::from_rows(&[vec![f64::NAN]]),
            Err(ValuationError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn test_most_valued_item_tie_breaks_lowest_id() {
        let v = ValuationMatrix::from_rows(&[vec![5.0, 9.0, 9.0, 1.0]]).unwrap();

        // bundle order deliberately puts the higher id first
        assert_eq!(v.most_valued_item(0, &[2, 1, 3]), Some(1));
        assert_eq!(v.most_valued_item(0, &[0, 3]), Some(0));
        assert_eq!(v.most_valued_item(0, &[]), None);
    }

    #[test]
    fn test_random_uniform_in_range_and_deterministic() {
        let mut rng1 = ChaCha8Rng::seed_from_u64(7);
        let mut rng2 = ChaCha8Rng::seed_from_u64(7);

        let v1 = ValuationMatrix::random_uniform(&mut rng1, 3, 9, 1.0, 10.0).unwrap();
        let v2 = ValuationMatrix::random_uniform(&mut rng2, 3, 9, 1.0, 10.0).unwrap();

        assert_eq!(v1, v2);
        for row in v1.to_rows() {
            assert!(row.iter().all(|&x| (1.0..=10.0).contains(&x)));
        }
    }

    #[test]
    fn test_random_integer_values_are_whole() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let v = ValuationMatrix::random_integer(&mut rng, 2, 20, 1, 10).unwrap();

        for row in v.to_rows() {
            assert!(row.iter().all(|&x| x.fract() == 0.0 && (1.0..=10.0).contains(&x)));
        }
    }

    #[test]
    fn test_random_generators_reject_bad_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert!(matches!(
            ValuationMatrix::random_uniform(&mut rng, 2, 3, 10.0, 1.0),
            Err(ValuationError::InvalidRange { .. })
        ));
        assert!(ValuationMatrix::random_uniform(&mut rng, 2, 3, -1.0, 1.0).is_err());
        assert!(ValuationMatrix::random_uniform(&mut rng, 2, 3, 0.0, f64::INFINITY).is_err());
        assert!(ValuationMatrix::random_integer(&mut rng, 2, 3, 5, 4).is_err());

        // degenerate range is fine
        let flat = ValuationMatrix::random_uniform(&mut rng, 2, 3, 2.0, 2.0).unwrap();
        assert_eq!(flat.min_value(), Some(2.0));
    }

    #[test]
    fn test_zero_items_matrix() {
        let v = ValuationMatrix::uniform(3, 0, 1.0).unwrap();

        assert_eq!(v.num_items(), 0);
        assert_eq!(v.min_value(), None);
        assert_eq!(v.mean_value(), None);
    }
}
