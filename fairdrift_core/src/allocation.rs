//! Allocation of indivisible items to agents.
//!
//! An [`Allocation`] is always a partition of `0..num_items` into one bundle
//! per agent. The only mutator is [`Allocation::transfer`], which moves a
//! single item between two bundles, so the partition can be re-checked after
//! every step.

use crate::error::AllocationError;
use serde::Serialize;

/// Agent identifier in `0..num_agents`.
pub type AgentId = usize;

/// Item identifier in `0..num_items`.
pub type ItemId = usize;

/// A partition of items among agents.
///
/// Bundle order is construction order; it carries no meaning beyond
/// determinism of iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    /// One bundle per agent
    bundles: Vec<Vec<ItemId>>,

    /// Total number of items in the partition
    num_items: usize,
}

impl Allocation {
    /// Round-robin partition: item `k` goes to agent `k % num_agents`.
    pub fn round_robin(num_agents: usize, num_items: usize) -> Result<Self, AllocationError> {
        if num_agents == 0 {
            return Err(AllocationError::NoAgents);
        }

        let mut bundles = vec![Vec::new(); num_agents];
        for item in 0..num_items {
            bundles[item % num_agents].push(item);
        }

        Ok(Self { bundles, num_items })
    }

    /// Builds an allocation from explicit bundles, validating the partition.
    pub fn from_bundles(bundles: Vec<Vec<ItemId>>, num_items: usize) -> Result<Self, AllocationError> {
        if bundles.is_empty() {
            return Err(AllocationError::NoAgents);
        }

        let allocation = Self { bundles, num_items };
        allocation.check_partition()?;
        Ok(allocation)
    }

    /// Builds an allocation from an owner-per-item vector.
    ///
    /// `owners[k]` is the agent holding item `k`.
    pub fn from_assignment(num_agents: usize, owners: &[AgentId]) -> Result<Self, AllocationError> {
        if num_agents == 0 {
            return Err(AllocationError::NoAgents);
        }

        let mut bundles = vec![Vec::new(); num_agents];
        for (item, &owner) in owners.iter().enumerate() {
            let bundle = bundles
                .get_mut(owner)
                .ok_or(AllocationError::AgentOutOfRange { agent: owner, num_agents })?;
            bundle.push(item);
        }

        Ok(Self {
            bundles,
            num_items: owners.len(),
        })
    }

    /// Number of agents.
    pub fn num_agents(&self) -> usize {
        self.bundles.len()
    }

    /// Number of items.
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// Items held by `agent`.
    ///
    /// # Panics
    /// Panics if `agent` is out of range.
    pub fn bundle(&self, agent: AgentId) -> &[ItemId] {
        &self.bundles[agent]
    }

    /// All bundles, indexed by agent.
    pub fn bundles(&self) -> &[Vec<ItemId>] {
        &self.bundles
    }

    /// Returns the agent holding `item`, if any.
    pub fn owner_of(&self, item: ItemId) -> Option<AgentId> {
        self.bundles.iter().position(|bundle| bundle.contains(&item))
    }

    /// Moves `item` from agent `from` to the end of agent `to`'s bundle.
    ///
    /// The allocation is left untouched on error.
    pub fn transfer(&mut self, item: ItemId, from: AgentId, to: AgentId) -> Result<(), AllocationError> {
        let num_agents = self.num_agents();
        for agent in [from, to] {
            if agent >= num_agents {
                return Err(AllocationError::AgentOutOfRange { agent, num_agents });
            }
        }
        if item >= self.num_items {
            return Err(AllocationError::ItemOutOfRange {
                item,
                num_items: self.num_items,
            });
        }

        let position = self.bundles[from]
            .iter()
            .position(|&owned| owned == item)
            .ok_or(AllocationError::NotOwned { agent: from, item })?;

        self.bundles[from].remove(position);
        self.bundles[to].push(item);

        debug_assert!(self.check_partition().is_ok());
        Ok(())
    }

    /// Verifies that every item appears in exactly one bundle.
    pub fn check_partition(&self) -> Result<(), AllocationError> {
        let mut seen = vec![false; self.num_items];

        for bundle in &self.bundles {
            for &item in bundle {
                let slot = seen.get_mut(item).ok_or(AllocationError::ItemOutOfRange {
                    item,
                    num_items: self.num_items,
                })?;
                if *slot {
                    return Err(AllocationError::DuplicateItem { item });
                }
                *slot = true;
            }
        }

        match seen.iter().position(|&present| !present) {
            Some(item) => Err(AllocationError::MissingItem { item }),
            None => Ok(()),
        }
    }
}
