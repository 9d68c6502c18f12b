//! Satisfaction history and per-run summary metrics.

use crate::allocation::Allocation;
use crate::simulation::StepReport;
use crate::valuation::ValuationMatrix;
use serde::Serialize;

/// Each agent's valuation of its own bundle.
pub fn satisfaction(allocation: &Allocation, valuations: &ValuationMatrix) -> Vec<f64> {
    (0..allocation.num_agents())
        .map(|agent| valuations.bundle_value(agent, allocation.bundle(agent)))
        .collect()
}

/// Per-agent satisfaction, one entry per completed timestep.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SatisfactionHistory {
    per_agent: Vec<Vec<f64>>,
}

impl SatisfactionHistory {
    pub fn new(num_agents: usize) -> Self {
        Self {
            per_agent: vec![Vec::new(); num_agents],
        }
    }

    /// Appends one timestep. `values` has one entry per agent.
    pub(crate) fn record(&mut self, values: &[f64]) {
        debug_assert_eq!(values.len(), self.per_agent.len());
        for (series, &value) in self.per_agent.iter_mut().zip(values) {
            series.push(value);
        }
    }

    pub fn num_agents(&self) -> usize {
        self.per_agent.len()
    }

    /// Number of timesteps recorded.
    pub fn len(&self) -> usize {
        self.per_agent.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Series for one agent.
    ///
    /// # Panics
    /// Panics if `agent` is out of range.
    pub fn agent(&self, agent: usize) -> &[f64] {
        &self.per_agent[agent]
    }

    pub fn per_agent(&self) -> &[Vec<f64>] {
        &self.per_agent
    }

    /// Satisfaction after the last recorded timestep.
    pub fn latest(&self) -> Option<Vec<f64>> {
        self.per_agent.iter().map(|s| s.last().copied()).collect()
    }
}

/// Summary of a finished (or partial) run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunMetrics {
    pub timesteps: usize,
    pub resolved_timesteps: usize,
    pub unresolved_timesteps: usize,

    /// Timesteps where the policy stopped early
    pub aborted_timesteps: usize,

    pub total_transfers: usize,
    pub max_transfers_in_step: usize,

    /// Lowest satisfaction any agent had at any timestep
    pub min_satisfaction: Option<f64>,

    /// Highest satisfaction any agent had at any timestep
    pub max_satisfaction: Option<f64>,

    /// Per-agent satisfaction after the last timestep
    pub final_satisfaction: Vec<f64>,
}

impl RunMetrics {
    pub fn from_reports(reports: &[StepReport]) -> Self {
        let mut metrics = RunMetrics {
            timesteps: reports.len(),
            ..Default::default()
        };

        for report in reports {
            let outcome = &report.outcome;
            if outcome.resolved {
                metrics.resolved_timesteps += 1;
            } else {
                metrics.unresolved_timesteps += 1;
            }
            if outcome.aborted.is_some() {
                metrics.aborted_timesteps += 1;
            }
            metrics.total_transfers += outcome.transfers;
            metrics.max_transfers_in_step = metrics.max_transfers_in_step.max(outcome.transfers);

            for &value in &report.satisfaction {
                metrics.min_satisfaction = Some(metrics.min_satisfaction.map_or(value, |m| m.min(value)));
                metrics.max_satisfaction = Some(metrics.max_satisfaction.map_or(value, |m| m.max(value)));
            }
        }

        if let Some(last) = reports.last() {
            metrics.final_satisfaction = last.satisfaction.clone();
        }

        metrics
    }

    /// Fraction of timesteps that ended fully EF1.
    pub fn resolution_rate(&self) -> f64 {
        if self.timesteps > 0 {
            self.resolved_timesteps as f64 / self.timesteps as f64
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restoration::{AbortReason, RestorationOutcome};

    fn report(timestep: usize, resolved: bool, transfers: usize, satisfaction: Vec<f64>) -> StepReport {
        StepReport {
            timestep,
            outcome: RestorationOutcome {
                resolved,
                transfers,
                rounds: transfers,
                aborted: if resolved {
                    None
                } else {
                    Some(AbortReason::NoItemAvailable { envier: 0, envied: 1 })
                },
            },
            satisfaction,
            max_envy: None,
        }
    }

    #[test]
    fn test_history_records_per_agent() {
        let mut history = SatisfactionHistory::new(2);
        history.record(&[1.0, 2.0]);
        history.record(&[3.0, 4.0]);

        assert_eq!(history.len(), 2);
        assert_eq!(history.agent(0), &[1.0, 3.0]);
        assert_eq!(history.agent(1), &[2.0, 4.0]);
        assert_eq!(history.latest(), Some(vec![3.0, 4.0]));
    }

    #[test]
    fn test_empty_history() {
        let history = SatisfactionHistory::new(3);

        assert!(history.is_empty());
        assert_eq!(history.latest(), None);
    }

    #[test]
    fn test_satisfaction_is_own_bundle_value() {
        let alloc = Allocation::round_robin(2, 3).unwrap();
        let vals = ValuationMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();

        assert_eq!(satisfaction(&alloc, &vals), vec![4.0, 5.0]);
    }

    #[test]
    fn test_run_metrics_from_reports() {
        let reports = vec![
            report(1, true, 2, vec![5.0, 7.0]),
            report(2, false, 1, vec![1.5, 9.0]),
            report(3, true, 0, vec![4.0, 4.0]),
        ];

        let metrics = RunMetrics::from_reports(&reports);

        assert_eq!(metrics.timesteps, 3);
        assert_eq!(metrics.resolved_timesteps, 2);
        assert_eq!(metrics.unresolved_timesteps, 1);
        assert_eq!(metrics.aborted_timesteps, 1);
        assert_eq!(metrics.total_transfers, 3);
        assert_eq!(metrics.max_transfers_in_step, 2);
        assert_eq!(metrics.min_satisfaction, Some(1.5));
        assert_eq!(metrics.max_satisfaction, Some(9.0));
        assert_eq!(metrics.final_satisfaction, vec![4.0, 4.0]);
        assert!((metrics.resolution_rate() - 2.0 / 3.0).abs() < 1e-12);
    }
}
