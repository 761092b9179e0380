//! Reference elements
//!
//! Small growth rules used by the CLI, the benchmarks and the tests. They
//! also serve as templates for writing an [`Element`].

use crate::framework::Element;
use crate::tree::ElementInfo;
use crate::HookError;

/// Stores its seed; child `i` of seed `s` gets `2s + i + 1`.
///
/// With arity 2 and root seed 0 every node's value equals its heap index.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedValue {
    /// Seed this node was grown from
    pub value: u64,
}

impl Element for SeedValue {
    type Seed = u64;

    fn grow(&mut self, seed: &u64, _info: &ElementInfo) -> Result<(), HookError> {
        self.value = *seed;
        Ok(())
    }

    fn spawn_child_seed(&self, seed: &u64, child_id: usize) -> u64 {
        seed.wrapping_mul(2).wrapping_add(child_id as u64 + 1)
    }
}

/// Splits an integer weight among its children until it can no longer be
/// split.
///
/// Growth stops once the weight is smaller than the arity, so the tree is
/// unbalanced for most weights. Leaf weights always sum to the root weight.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WeightSplit {
    /// Weight carried by this node
    pub weight: u64,
    arity: u64,
}

impl Element for WeightSplit {
    type Seed = u64;

    fn grow(&mut self, seed: &u64, info: &ElementInfo) -> Result<(), HookError> {
        self.weight = *seed;
        self.arity = info.arity as u64;
        Ok(())
    }

    fn growth_stop_condition(&self, _info: &ElementInfo) -> bool {
        self.weight < self.arity
    }

    fn spawn_child_seed(&self, seed: &u64, child_id: usize) -> u64 {
        // the first child absorbs the remainder
        let share = seed / self.arity;
        if child_id == 0 {
            share + seed % self.arity
        } else {
            share
        }
    }
}
