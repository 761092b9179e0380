mod common;

use common::{build, count_nodes, ALL_MODES};
use fractal::elements::SeedValue;
use fractal::{Element, ElementInfo, HookError, Layout, Strategy};

const CHAIN_DEPTH: usize = 200_000;

#[test]
fn single_child_chain_grows_and_folds_at_full_depth() {
    for (layout, strategy) in ALL_MODES {
        let mut fractal = build::<SeedValue>(1, layout, strategy);
        fractal.grow(CHAIN_DEPTH, 0).unwrap();

        assert_eq!(fractal.len(), CHAIN_DEPTH + 1, "{layout}/{strategy}");
        assert_eq!(fractal.leaf_count(), 1);
        assert_eq!(fractal.reached_depth(), Some(CHAIN_DEPTH));
        assert_eq!(
            fractal.compute(count_nodes).unwrap(),
            CHAIN_DEPTH as u64 + 1,
            "{layout}/{strategy}"
        );
    }
}

#[test]
fn chain_compute_sees_the_leaf_first() {
    let mut fractal = build::<SeedValue>(1, Layout::Unbalanced, Strategy::Sequential);
    fractal.grow(CHAIN_DEPTH, 0).unwrap();

    // depth of the deepest node below each node
    let deepest = fractal
        .compute(|node, children: &[usize]| {
            Ok(children
                .first()
                .copied()
                .unwrap_or(node.info().depth))
        })
        .unwrap();
    assert_eq!(deepest, CHAIN_DEPTH);
}

/// Binary node whose first child keeps growing and whose second child stops.
#[derive(Debug, Default)]
struct Spine {
    alive: bool,
}

impl Element for Spine {
    type Seed = bool;

    fn grow(&mut self, seed: &bool, _info: &ElementInfo) -> Result<(), HookError> {
        self.alive = *seed;
        Ok(())
    }

    fn growth_stop_condition(&self, _info: &ElementInfo) -> bool {
        !self.alive
    }

    fn spawn_child_seed(&self, _seed: &bool, child_id: usize) -> bool {
        child_id == 0
    }
}

#[test]
fn lopsided_binary_spine_grows_past_the_cutoff() {
    let depth = 50_000;
    for strategy in [Strategy::Sequential, Strategy::Parallel] {
        let mut fractal = build::<Spine>(2, Layout::Unbalanced, strategy);
        fractal.grow(depth, true).unwrap();

        assert_eq!(fractal.len(), 2 * depth + 1, "{strategy}");
        assert_eq!(fractal.leaf_count(), depth + 1);
        assert_eq!(fractal.reached_depth(), Some(depth));

        let alive = fractal
            .compute(|node, children: &[u64]| {
                Ok(u64::from(node.element().alive) + children.iter().sum::<u64>())
            })
            .unwrap();
        assert_eq!(alive, depth as u64 + 1, "{strategy}");
    }
}
