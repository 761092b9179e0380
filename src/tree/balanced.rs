//! Balanced layout: complete tree in a flat array
//!
//! Growth fills the array depth by depth from the root, compute settles it
//! level by level from the leaves. Within a level every node reads only the
//! settled level next to it and writes its own slot, so a level can be split
//! into disjoint ranges and handed to separate workers. Every worker reports
//! the slots it produced; the ledger rejects a level whose pieces overlap or
//! leave a gap.

use std::ops::Range;

use rayon::prelude::*;

use super::{ElementInfo, IndexTable, Node};
use crate::config::Executor;
use crate::framework::{ComputeFunction, Element};
use crate::ledger::SettleLedger;
use crate::{ConfigError, FractalError, StateError};

pub(crate) struct ArrayStorage<E: Element> {
    nodes: Vec<Node<E>>,
    table: IndexTable,
}

impl<E: Element> ArrayStorage<E> {
    pub(crate) fn grow(
        arity: usize,
        depth: usize,
        seed: E::Seed,
        executor: &Executor,
    ) -> Result<Self, FractalError> {
        let mut table = IndexTable::new(arity, depth)?;
        let mut nodes = Vec::new();
        nodes
            .try_reserve_exact(table.len())
            .map_err(|_| ConfigError::CapacityOverflow { arity, depth })?;

        let mut root = Node::<E>::sprout(seed, ElementInfo::root(depth, arity, Some(0)))
            .map_err(FractalError::Hook)?;

        // Uniform growth below the root; a stop at the root collapses the tree.
        if depth > 0 && root.element().growth_stop_condition(root.info()) {
            tracing::debug!(depth, "root stopped growth, collapsing balanced tree");
            table = IndexTable::new(arity, 0)?;
            root.set_info(ElementInfo::root(0, arity, Some(0)));
        }
        nodes.push(root);

        let mut ledger = SettleLedger::new(table.len());
        ledger.settle(0..1);

        for parent_depth in 0..table.top_level() {
            let parents = table.depth_range(parent_depth);
            let tasks = executor.level_tasks(parents.len());
            let pieces = IndexTable::partition(parents, tasks);

            let grown = if pieces.len() > 1 {
                pieces
                    .into_par_iter()
                    .map(|piece| spawn_children(&nodes, &table, piece))
                    .collect::<Result<Vec<_>, FractalError>>()?
            } else {
                pieces
                    .into_iter()
                    .map(|piece| spawn_children(&nodes, &table, piece))
                    .collect::<Result<Vec<_>, FractalError>>()?
            };

            let level = table.depth_range(parent_depth + 1);
            ledger.settle_level(level.clone(), grown.iter().map(|(slots, _)| slots.clone()))?;
            nodes.extend(grown.into_iter().flat_map(|(_, children)| children));

            tracing::trace!(
                depth = parent_depth + 1,
                width = level.len(),
                tasks,
                "level grown"
            );
        }

        Ok(Self { nodes, table })
    }

    pub(crate) fn compute<R, F>(&self, func: &F, executor: &Executor) -> Result<R, FractalError>
    where
        R: Send + Sync,
        F: ComputeFunction<E, R>,
    {
        let arity = self.table.arity();
        let top_level = self.table.top_level();
        let mut ledger = SettleLedger::new(self.nodes.len());

        // results of the level below the one being computed
        let mut below: Vec<R> = Vec::new();

        for depth in (0..=top_level).rev() {
            let range = self.table.depth_range(depth);
            let is_leaf_level = depth == top_level;

            let level = &self.nodes[range.clone()];
            let combine = |offset: usize| -> Result<R, FractalError> {
                let children: &[R] = if is_leaf_level {
                    &[]
                } else {
                    let first = offset * arity;
                    below
                        .get(first..first + arity)
                        .ok_or(StateError::Unsettled {
                            start: range.end + first,
                            end: range.end + first + arity,
                        })?
                };
                func.combine(&level[offset], children)
                    .map_err(FractalError::Hook)
            };
            let run_piece = |piece: Range<usize>| -> Result<(Range<usize>, Vec<R>), FractalError> {
                let start = range.start + piece.start;
                let results = piece.map(&combine).collect::<Result<Vec<R>, _>>()?;
                Ok((start..start + results.len(), results))
            };

            let tasks = executor.level_tasks(level.len());
            let pieces = IndexTable::partition(0..level.len(), tasks);
            let computed = if pieces.len() > 1 {
                pieces
                    .into_par_iter()
                    .map(&run_piece)
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                pieces
                    .into_iter()
                    .map(&run_piece)
                    .collect::<Result<Vec<_>, _>>()?
            };

            ledger.settle_level(range.clone(), computed.iter().map(|(slots, _)| slots.clone()))?;
            let results: Vec<R> = computed
                .into_iter()
                .flat_map(|(_, results)| results)
                .collect();
            tracing::trace!(depth, width = results.len(), tasks, "level computed");
            below = results;
        }

        below.into_iter().next().ok_or_else(|| StateError::NotGrown.into())
    }

    pub(crate) fn table(&self) -> &IndexTable {
        &self.table
    }

    pub(crate) fn nodes(&self) -> &[Node<E>] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node<E>] {
        &mut self.nodes
    }
}

/// Grow the children of every parent in `parents`, in slot order, and
/// report the slots they occupy.
fn spawn_children<E: Element>(
    nodes: &[Node<E>],
    table: &IndexTable,
    parents: Range<usize>,
) -> Result<(Range<usize>, Vec<Node<E>>), FractalError> {
    let arity = table.arity();
    let first = table.first_child(parents.start);
    let mut children: Vec<Node<E>> = Vec::with_capacity(parents.len() * arity);

    for parent_index in parents {
        let parent = &nodes[parent_index];
        for (child_id, seed) in parent.child_seeds().into_iter().enumerate() {
            let index = table.child_index(parent_index, child_id);
            let info = parent.info().child(child_id, Some(index))?;
            children.push(Node::<E>::sprout(seed, info).map_err(FractalError::Hook)?);
        }
    }

    Ok((first..first + children.len(), children))
}
