use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running count of couplers needed, keyed by coupler size (cores joined).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouplerEstimate {
    tiers: BTreeMap<u32, u64>,
}

impl CouplerEstimate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coupler size used to join fibers whose widest member has `max_core` cores.
    pub fn tier_for(max_core: u32, min_coupler: u32, max_coupler: u32) -> u32 {
        if max_core >= max_coupler {
            max_coupler
        } else if max_core >= min_coupler {
            min_coupler
        } else {
            1
        }
    }

    /// Account for the splices of one link chained from `fiber_count` fibers.
    pub fn add_chain(&mut self, fiber_count: usize, max_core: u32, min_coupler: u32, max_coupler: u32) {
        if fiber_count < 2 || max_core == 0 {
            return;
        }
        let tier = Self::tier_for(max_core, min_coupler, max_coupler);
        let per_splice = max_core.div_ceil(tier) as u64;
        *self.tiers.entry(tier).or_insert(0) += (fiber_count as u64 - 1) * per_splice;
    }

    /// Substitute couplers smaller than `min_coupler` with the smallest available size.
    pub fn fold_below(&mut self, min_coupler: u32) {
        let small: Vec<u32> = self
            .tiers
            .range(..min_coupler)
            .map(|(&tier, _)| tier)
            .collect();
        if small.is_empty() {
            return;
        }
        let moved: u64 = small.iter().filter_map(|tier| self.tiers.remove(tier)).sum();
        *self.tiers.entry(min_coupler).or_insert(0) += moved;
    }

    pub fn count(&self, tier: u32) -> u64 {
        self.tiers.get(&tier).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.tiers.values().sum()
    }

    /// `(tier, count)` ascending by tier
    pub fn iter(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.tiers.iter().map(|(&tier, &count)| (tier, count))
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}
