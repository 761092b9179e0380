mod common;

use common::{build, complete_tree_size, count_nodes, sum_values, ALL_MODES};
use fractal::elements::{SeedValue, WeightSplit};
use fractal::{ElementInfo, Fractal, Layout, Strategy};
use proptest::prelude::*;

fn tuned(arity: usize, layout: Layout, strategy: Strategy, cutoff: usize) -> Fractal<SeedValue> {
    Fractal::<SeedValue>::builder()
        .arity(arity)
        .layout(layout)
        .strategy(strategy)
        .threads(3)
        .cutoff_depth(cutoff)
        .tasks_per_thread(2)
        .build()
        .expect("valid configuration")
}

fn shape(fractal: &Fractal<SeedValue>) -> Vec<(u64, ElementInfo)> {
    fractal
        .nodes()
        .map(|node| (*node.seed(), *node.info()))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn every_mode_visits_every_node_once(arity in 1usize..5, depth in 0usize..6) {
        for (layout, strategy) in ALL_MODES {
            let mut fractal = build::<SeedValue>(arity, layout, strategy);
            fractal.grow(depth, 0).expect("growth succeeds");

            let expected = complete_tree_size(arity, depth);
            prop_assert_eq!(fractal.len(), expected);
            prop_assert_eq!(fractal.compute(count_nodes).expect("compute") as usize, expected);
        }
    }

    #[test]
    fn parallel_matches_sequential(
        arity in 1usize..5,
        depth in 0usize..6,
        seed in any::<u64>(),
        cutoff in 0usize..5,
    ) {
        for layout in [Layout::Balanced, Layout::Unbalanced] {
            let mut sequential = tuned(arity, layout, Strategy::Sequential, cutoff);
            let mut parallel = tuned(arity, layout, Strategy::Parallel, cutoff);
            sequential.grow(depth, seed).expect("sequential growth");
            parallel.grow(depth, seed).expect("parallel growth");

            prop_assert_eq!(shape(&sequential), shape(&parallel));
            prop_assert_eq!(
                sequential.compute(sum_values).expect("sequential compute"),
                parallel.compute(sum_values).expect("parallel compute")
            );
        }
    }

    #[test]
    fn weight_is_conserved_in_the_leaves(
        arity in 2usize..5,
        weight in 0u64..500,
        depth in 0usize..7,
    ) {
        for (layout, strategy) in ALL_MODES {
            let mut fractal = build::<WeightSplit>(arity, layout, strategy);
            fractal.grow(depth, weight).expect("growth succeeds");

            let leaves = fractal
                .compute(|node, children: &[u64]| {
                    if children.is_empty() {
                        Ok(node.element().weight)
                    } else {
                        Ok(children.iter().sum())
                    }
                })
                .expect("compute succeeds");
            prop_assert_eq!(leaves, weight);
            if layout == Layout::Unbalanced {
                prop_assert!(fractal.len() <= complete_tree_size(arity, depth));
            }
        }
    }
}
