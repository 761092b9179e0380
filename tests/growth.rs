mod common;

use common::{build, complete_tree_size, count_nodes, grown, StopAtRoot, ALL_MODES};
use fractal::elements::{SeedValue, WeightSplit};
use fractal::{Layout, NodeId, Strategy};
use test_case::test_case;

#[test]
fn binary_depth_two_holds_seven_nodes() {
    for (layout, strategy) in ALL_MODES {
        let fractal = grown(2, 2, layout, strategy);

        assert_eq!(fractal.len(), 7, "{layout}/{strategy}");
        assert_eq!(fractal.leaf_count(), 4);
        assert_eq!(fractal.depth(), Some(2));

        let mut leaves: Vec<u64> = fractal
            .nodes()
            .filter(|node| node.info().is_leaf())
            .map(|node| node.element().value)
            .collect();
        leaves.sort_unstable();
        assert_eq!(leaves, vec![3, 4, 5, 6]);
    }
}

#[test]
fn balanced_storage_is_heap_ordered() {
    let fractal = grown(2, 2, Layout::Balanced, Strategy::Parallel);
    let values: Vec<u64> = fractal.nodes().map(|node| node.element().value).collect();
    assert_eq!(values, vec![0, 1, 2, 3, 4, 5, 6]);

    for (slot, node) in fractal.nodes().enumerate() {
        assert_eq!(node.info().index, Some(slot));
    }
}

#[test]
fn unbalanced_storage_is_pre_ordered() {
    let fractal = grown(2, 2, Layout::Unbalanced, Strategy::Parallel);
    let values: Vec<u64> = fractal.nodes().map(|node| node.element().value).collect();
    assert_eq!(values, vec![0, 1, 3, 4, 2, 5, 6]);
    assert!(fractal.nodes().all(|node| node.info().index.is_none()));
}

#[test]
fn depth_zero_is_a_single_leaf() {
    for (layout, strategy) in ALL_MODES {
        let fractal = grown(3, 0, layout, strategy);
        assert_eq!(fractal.len(), 1);
        assert_eq!(fractal.leaf_count(), 1);

        let root = fractal.root().unwrap();
        assert!(root.info().is_leaf());
        assert!(fractal.children(NodeId::ROOT).is_empty());
        assert_eq!(fractal.compute(count_nodes).unwrap(), 1);
    }
}

#[test]
fn levels_count_down_to_the_leaves() {
    for (layout, strategy) in ALL_MODES {
        let fractal = grown(3, 3, layout, strategy);
        let root = fractal.root().unwrap();
        assert_eq!(root.info().level, 3);
        assert_eq!(root.info().depth, 0);

        for node in fractal.nodes() {
            let info = node.info();
            assert_eq!(info.depth + info.level, 3);
            assert_eq!(info.arity, 3);
        }
    }
}

#[test]
fn parent_and_child_links_agree() {
    for (layout, strategy) in ALL_MODES {
        let fractal = grown(3, 3, layout, strategy);
        assert_eq!(fractal.parent(NodeId::ROOT), None);

        for id in fractal.node_ids() {
            let children = fractal.children(id);
            let node = fractal.node(id).unwrap();
            if node.info().is_leaf() {
                assert!(children.is_empty());
                continue;
            }
            assert_eq!(children.len(), 3);
            for (child_id, child) in children.into_iter().enumerate() {
                assert_eq!(fractal.parent(child), Some(id));
                let info = fractal.node(child).unwrap().info();
                assert_eq!(info.child_id, child_id);
                assert_eq!(info.depth, node.info().depth + 1);
            }
        }
    }
}

#[test]
fn unknown_node_and_out_of_range_child_are_rejected() {
    let fractal = grown(2, 2, Layout::Balanced, Strategy::Sequential);
    assert!(fractal.node(NodeId::ROOT).is_some());
    assert!(fractal.child(NodeId::ROOT, 2).unwrap_err().is_invalid_state());

    let leaf = fractal.children(fractal.children(NodeId::ROOT)[0])[0];
    assert!(fractal.child(leaf, 0).unwrap_err().is_invalid_state());
    assert_eq!(fractal.parent(leaf).map(|id| id.index()), Some(1));
}

#[test]
fn regrowing_replaces_the_structure() {
    let mut fractal = grown(2, 4, Layout::Unbalanced, Strategy::Sequential);
    assert_eq!(fractal.len(), 31);

    fractal.grow(1, 5).unwrap();
    assert_eq!(fractal.len(), 3);
    assert_eq!(fractal.depth(), Some(1));
    assert_eq!(fractal.root().unwrap().element().value, 5);
}

#[test]
fn grow_default_uses_the_default_seed() {
    let mut fractal = build::<SeedValue>(2, Layout::Balanced, Strategy::Sequential);
    fractal.grow_default(1).unwrap();
    assert_eq!(*fractal.root().unwrap().seed(), 0);
}

#[test]
fn weight_split_stops_early_when_linked() {
    for strategy in [Strategy::Sequential, Strategy::Parallel] {
        let mut fractal = build::<WeightSplit>(2, Layout::Unbalanced, strategy);
        fractal.grow(10, 10).unwrap();

        // 10 -> 5,5 -> 3,2 -> 2,1 -> 1,1
        assert_eq!(fractal.leaf_count(), 10);
        assert_eq!(fractal.len(), 19);
        assert_eq!(fractal.depth(), Some(10));
        assert_eq!(fractal.reached_depth(), Some(4));

        assert!(fractal.nodes().all(|node| node.element().weight >= 1));

        let leaf_weight = fractal
            .compute(|node, children: &[u64]| {
                if children.is_empty() {
                    Ok(node.element().weight)
                } else {
                    Ok(children.iter().sum())
                }
            })
            .unwrap();
        assert_eq!(leaf_weight, 10);
    }
}

#[test]
fn stopped_node_reports_no_children() {
    let mut fractal = build::<WeightSplit>(2, Layout::Unbalanced, Strategy::Sequential);
    fractal.grow(3, 3).unwrap();

    // 3 -> 2,1; the weight-1 child stops above the leaf level
    let stopped = fractal.children(NodeId::ROOT)[1];
    let info = *fractal.node(stopped).unwrap().info();
    assert!(!info.is_leaf());
    assert!(fractal.children(stopped).is_empty());
    assert!(fractal.child(stopped, 0).unwrap_err().is_invalid_state());
}

#[test]
fn balanced_layout_grows_uniformly_below_the_root() {
    let mut fractal = build::<WeightSplit>(2, Layout::Balanced, Strategy::Parallel);
    fractal.grow(5, 3).unwrap();
    assert_eq!(fractal.len(), complete_tree_size(2, 5));
    assert_eq!(fractal.reached_depth(), Some(5));
}

#[test]
fn root_stop_collapses_either_layout() {
    for (layout, strategy) in ALL_MODES {
        let mut fractal = build::<StopAtRoot>(2, layout, strategy);
        fractal.grow(4, true).unwrap();
        assert_eq!(fractal.len(), 1, "{layout}/{strategy}");
        assert_eq!(fractal.compute(count_nodes).unwrap(), 1);

        fractal.grow(4, false).unwrap();
        assert_eq!(fractal.len(), 31);
    }
}

#[test]
fn balanced_root_stop_resets_the_root_level() {
    let mut fractal = build::<StopAtRoot>(3, Layout::Balanced, Strategy::Sequential);
    fractal.grow(4, true).unwrap();
    let root = fractal.root().unwrap();
    assert!(root.info().is_leaf());
    assert_eq!(fractal.depth(), Some(0));
    assert_eq!(fractal.index_table().map(|t| t.len()), Some(1));
}

#[test_case(1, 5 ; "chain")]
#[test_case(2, 6 ; "binary")]
#[test_case(3, 4 ; "ternary")]
#[test_case(5, 3 ; "quinary")]
fn complete_tree_has_geometric_size(arity: usize, depth: usize) {
    for (layout, strategy) in ALL_MODES {
        let fractal = grown(arity, depth, layout, strategy);
        assert_eq!(fractal.len(), complete_tree_size(arity, depth));
        assert_eq!(fractal.leaf_count(), arity.pow(depth as u32));
        assert_eq!(
            fractal.compute(count_nodes).unwrap() as usize,
            complete_tree_size(arity, depth)
        );
    }
}
