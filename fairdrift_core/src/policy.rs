//! Transfer policies: which single item moves, and whether it is committed.
//!
//! Both policies move the *most impactful* item: the item in the envied
//! bundle that the envier values most (lowest id on ties).
//!
//! - [`BatchGreedy`]: one round is a full scan over ordered pairs. Each
//!   violating pair found commits its transfer immediately when the
//!   recipient gains at least `min_transfer_diff`, so later pairs in the
//!   same round see the updated allocation.
//! - [`IncrementalValidated`]: one round handles only the first violating
//!   pair of a fresh scan, and commits only if the resulting allocation is
//!   near-EF1. A refused transfer aborts restoration for the timestep.

use crate::allocation::{AgentId, Allocation, ItemId};
use crate::config::{FairDivisionConfig, PolicyKind};
use crate::envy::{envy_amount, is_ef1, is_near_ef1, ordered_pairs};
use crate::events::{EventSink, FairEvent};
use crate::restoration::AbortReason;
use crate::scanner::first_violation;
use crate::valuation::ValuationMatrix;

/// Result of a single policy round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundOutcome {
    /// The round committed this many transfers.
    Transferred(usize),

    /// Nothing to do, or nothing worth doing.
    Idle,

    /// Restoration must stop for this timestep.
    Aborted(AbortReason),
}

/// Strategy for moving items to restore EF1.
pub trait TransferPolicy: Send + Sync {
    /// Runs one round, mutating `allocation` only through transfers.
    fn run_round(
        &self,
        allocation: &mut Allocation,
        valuations: &ValuationMatrix,
        sink: &mut dyn EventSink,
    ) -> RoundOutcome;

    /// Maximum number of productive rounds per timestep.
    fn round_limit(&self) -> usize;

    fn name(&self) -> &str;
}

/// The item in `envied`'s bundle that `envier` values most.
pub fn most_impactful_item(
    envier: AgentId,
    envied: AgentId,
    allocation: &Allocation,
    valuations: &ValuationMatrix,
) -> Option<ItemId> {
    valuations.most_valued_item(envier, allocation.bundle(envied))
}

/// Builds the policy named by `config.transfer_policy`.
pub fn policy_for(config: &FairDivisionConfig) -> Box<dyn TransferPolicy> {
    match config.transfer_policy {
        PolicyKind::Batch => Box::new(BatchGreedy::new(config.min_transfer_diff, config.max_batch_rounds)),
        PolicyKind::Incremental => Box::new(IncrementalValidated::new(
            config.epsilon,
            config.max_restoration_steps,
        )),
    }
}

/// All-pairs greedy passes, order dependent.
#[derive(Debug, Clone)]
pub struct BatchGreedy {
    pub min_transfer_diff: f64,
    pub max_rounds: usize,
}

impl BatchGreedy {
    pub fn new(min_transfer_diff: f64, max_rounds: usize) -> Self {
        Self {
            min_transfer_diff,
            max_rounds,
        }
    }
}

impl TransferPolicy for BatchGreedy {
    fn run_round(
        &self,
        allocation: &mut Allocation,
        valuations: &ValuationMatrix,
        sink: &mut dyn EventSink,
    ) -> RoundOutcome {
        let mut transfers = 0;

        for (envier, envied) in ordered_pairs(allocation.num_agents()) {
            // Checked against the live allocation, including this round's transfers
            if is_ef1(envier, envied, allocation, valuations) {
                continue;
            }
            sink.emit(FairEvent::ViolationDetected {
                envier,
                envied,
                envy: envy_amount(envier, envied, allocation, valuations),
            });

            let Some(item) = most_impactful_item(envier, envied, allocation, valuations) else {
                continue;
            };

            let gain = valuations.value(envier, item);
            if gain < self.min_transfer_diff {
                sink.emit(FairEvent::TransferBelowThreshold {
                    item,
                    from: envied,
                    to: envier,
                    gain,
                });
                continue;
            }

            if allocation.transfer(item, envied, envier).is_err() {
                return RoundOutcome::Aborted(AbortReason::InvalidTransfer {
                    item,
                    from: envied,
                    to: envier,
                });
            }
            sink.emit(FairEvent::TransferCommitted {
                item,
                from: envied,
                to: envier,
            });
            transfers += 1;
        }

        if transfers == 0 {
            RoundOutcome::Idle
        } else {
            RoundOutcome::Transferred(transfers)
        }
    }

    fn round_limit(&self) -> usize {
        self.max_rounds
    }

    fn name(&self) -> &str {
        "batch"
    }
}

/// First-violator transfers validated against near-EF1.
#[derive(Debug, Clone)]
pub struct IncrementalValidated {
    pub epsilon: f64,
    pub max_steps: usize,
}

impl IncrementalValidated {
    pub fn new(epsilon: f64, max_steps: usize) -> Self {
        Self { epsilon, max_steps }
    }
}

impl TransferPolicy for IncrementalValidated {
    fn run_round(
        &self,
        allocation: &mut Allocation,
        valuations: &ValuationMatrix,
        sink: &mut dyn EventSink,
    ) -> RoundOutcome {
        let Some(violation) = first_violation(allocation, valuations) else {
            return RoundOutcome::Idle;
        };
        let (envier, envied) = (violation.envier, violation.envied);

        sink.emit(FairEvent::ViolationDetected {
            envier,
            envied,
            envy: envy_amount(envier, envied, allocation, valuations),
        });

        let Some(item) = most_impactful_item(envier, envied, allocation, valuations) else {
            return RoundOutcome::Aborted(AbortReason::NoItemAvailable { envier, envied });
        };

        let invalid = AbortReason::InvalidTransfer {
            item,
            from: envied,
            to: envier,
        };

        // Trial run on a private copy
        let mut candidate = allocation.clone();
        if candidate.transfer(item, envied, envier).is_err() {
            return RoundOutcome::Aborted(invalid);
        }

        if !is_near_ef1(&candidate, valuations, self.epsilon) {
            sink.emit(FairEvent::TransferRejected {
                item,
                from: envied,
                to: envier,
            });
            return RoundOutcome::Aborted(AbortReason::TransferRejected {
                envier,
                envied,
                item,
            });
        }

        if allocation.transfer(item, envied, envier).is_err() {
            return RoundOutcome::Aborted(invalid);
        }
        sink.emit(FairEvent::TransferCommitted {
            item,
            from: envied,
            to: envier,
        });
        RoundOutcome::Transferred(1)
    }

    fn round_limit(&self) -> usize {
        self.max_steps
    }

    fn name(&self) -> &str {
        "incremental"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;

    #[test]
    fn test_most_impactful_item_tie_break() {
        let alloc = Allocation::from_bundles(vec![vec![0], vec![3, 1, 2]], 4).unwrap();
        let vals = ValuationMatrix::from_rows(&[vec![0.0, 4.0, 2.0, 4.0], vec![1.0; 4]]).unwrap();

        // items 1 and 3 tie for agent 0; bundle order puts 3 first
        assert_eq!(most_impactful_item(0, 1, &alloc, &vals), Some(1));

        let emptied = Allocation::from_bundles(vec![vec![0, 1, 2, 3], vec![]], 4).unwrap();
        assert_eq!(most_impactful_item(0, 1, &emptied, &vals), None);
    }

    #[test]
    fn test_batch_round_moves_top_item() {
        // agent 0 holds nothing and envies agent 1's three items
        let mut alloc = Allocation::from_bundles(vec![vec![], vec![0, 1, 2]], 3).unwrap();
        let vals = ValuationMatrix::from_rows(&[vec![1.0, 3.0, 2.0], vec![1.0, 1.0, 1.0]]).unwrap();
        let mut log = EventLog::new();

        let outcome = BatchGreedy::new(0.0, 10).run_round(&mut alloc, &vals, &mut log);

        assert_eq!(outcome, RoundOutcome::Transferred(1));
        assert_eq!(alloc.bundle(0), &[1]);
        assert_eq!(alloc.bundle(1), &[0, 2]);
        assert!(log
            .events()
            .contains(&FairEvent::TransferCommitted { item: 1, from: 1, to: 0 }));
    }

    #[test]
    fn test_batch_threshold_blocks_small_gains() {
        let mut alloc = Allocation::from_bundles(vec![vec![], vec![0, 1, 2]], 3).unwrap();
        let vals = ValuationMatrix::from_rows(&[vec![1.0, 3.0, 2.0], vec![1.0, 1.0, 1.0]]).unwrap();
        let before = alloc.clone();
        let mut log = EventLog::new();

        let outcome = BatchGreedy::new(3.5, 10).run_round(&mut alloc, &vals, &mut log);

        assert_eq!(outcome, RoundOutcome::Idle);
        assert_eq!(alloc, before);
        assert!(matches!(
            log.events().last(),
            Some(FairEvent::TransferBelowThreshold { item: 1, .. })
        ));
    }

    #[test]
    fn test_batch_round_sees_its_own_transfers() {
        // agents 0 and 2 both envy agent 1 at the start of the round; once
        // agent 0 takes item 0, agent 1 is a singleton and agent 2 is EF1
        let mut alloc = Allocation::from_bundles(vec![vec![], vec![0, 1], vec![]], 2).unwrap();
        let vals = ValuationMatrix::uniform(3, 2, 1.0).unwrap();
        let mut log = EventLog::new();

        let outcome = BatchGreedy::new(0.0, 10).run_round(&mut alloc, &vals, &mut log);

        assert_eq!(outcome, RoundOutcome::Transferred(1));
        assert_eq!(alloc.bundle(0), &[0]);
        assert_eq!(alloc.bundle(1), &[1]);
        assert!(alloc.bundle(2).is_empty());
    }

    #[test]
    fn test_incremental_commits_valid_transfer() {
        let mut alloc = Allocation::from_bundles(vec![vec![], vec![0, 1, 2]], 3).unwrap();
        let vals = ValuationMatrix::uniform(2, 3, 1.0).unwrap();
        let mut log = EventLog::new();

        let outcome = IncrementalValidated::new(0.1, 10).run_round(&mut alloc, &vals, &mut log);

        assert_eq!(outcome, RoundOutcome::Transferred(1));
        assert_eq!(alloc.bundle(0), &[0]);
        assert_eq!(log.transfer_count(), 1);
    }

    #[test]
    fn test_incremental_rejects_transfer_breaking_near_ef1() {
        // moving agent 1's item leaves agent 0 still envious of agent 2
        let mut alloc =
            Allocation::from_bundles(vec![vec![], vec![0, 1, 2], vec![3, 4, 5, 6, 7]], 8).unwrap();
        let vals = ValuationMatrix::uniform(3, 8, 1.0).unwrap();
        let before = alloc.clone();
        let mut log = EventLog::new();

        let outcome = IncrementalValidated::new(0.0, 10).run_round(&mut alloc, &vals, &mut log);

        assert_eq!(
            outcome,
            RoundOutcome::Aborted(AbortReason::TransferRejected {
                envier: 0,
                envied: 1,
                item: 0
            })
        );
        assert_eq!(alloc, before);
        assert_eq!(log.transfer_count(), 0);
    }

    #[test]
    fn test_incremental_idle_without_violations() {
        let mut alloc = Allocation::round_robin(3, 9).unwrap();
        let vals = ValuationMatrix::uniform(3, 9, 1.0).unwrap();

        let outcome = IncrementalValidated::new(0.1, 10).run_round(&mut alloc, &vals, &mut crate::events::NullSink);

        assert_eq!(outcome, RoundOutcome::Idle);
    }

    #[test]
    fn test_policy_for_config() {
        let config = FairDivisionConfig {
            transfer_policy: PolicyKind::Incremental,
            max_restoration_steps: 7,
            ..Default::default()
        };
        let policy = policy_for(&config);

        assert_eq!(policy.name(), "incremental");
        assert_eq!(policy.round_limit(), 7);
    }
}
