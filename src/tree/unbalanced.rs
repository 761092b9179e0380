//! Unbalanced layout: explicitly linked nodes
//!
//! Nodes live in a pre-order arena. Every node owns the ids of its children
//! and refers to its parent through a non-owning id. Subtrees below a node
//! that stopped growing are never created.
//!
//! Both passes walk the arena without recursion below the fan-out cutoff, so
//! a chain as deep as memory allows is fine. Above the cutoff, parallel growth
//! builds sibling subtrees into private arenas and splices them back in child
//! order, so the arena is identical to the one sequential growth produces.

use rayon::prelude::*;

use super::{ElementInfo, Node, NodeId};
use crate::config::Executor;
use crate::framework::{ComputeFunction, Element};
use crate::{FractalError, StateError};

pub(crate) struct LinkedNode<E: Element> {
    pub(crate) node: Node<E>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

pub(crate) struct LinkedStorage<E: Element> {
    nodes: Vec<LinkedNode<E>>,
}

impl<E: Element> LinkedStorage<E> {
    pub(crate) fn grow(
        arity: usize,
        depth: usize,
        seed: E::Seed,
        executor: &Executor,
    ) -> Result<Self, FractalError> {
        let nodes = grow_subtree(seed, ElementInfo::root(depth, arity, None), executor)?;
        Ok(Self { nodes })
    }

    pub(crate) fn compute<R, F>(&self, func: &F, executor: &Executor) -> Result<R, FractalError>
    where
        R: Send,
        F: ComputeFunction<E, R>,
    {
        self.fold(NodeId::ROOT, func, executor)
    }

    /// Fork over the children while above the cutoff, then hand each subtree
    /// to the sequential fold.
    fn fold<R, F>(&self, id: NodeId, func: &F, executor: &Executor) -> Result<R, FractalError>
    where
        R: Send,
        F: ComputeFunction<E, R>,
    {
        let linked = &self.nodes[id.0];
        if !executor.fans_out_at(linked.node.info().depth) {
            return self.fold_subtree(id, func);
        }

        let results: Vec<R> = if linked.children.len() > 1 {
            linked
                .children
                .par_iter()
                .map(|&child| self.fold(child, func, executor))
                .collect::<Result<Vec<R>, FractalError>>()?
        } else {
            linked
                .children
                .iter()
                .map(|&child| self.fold(child, func, executor))
                .collect::<Result<Vec<R>, FractalError>>()?
        };

        func.combine(&linked.node, &results)
            .map_err(FractalError::Hook)
    }

    /// Fold the subtree rooted at `root` without recursion.
    ///
    /// The arena is in pre-order, so the subtree is the contiguous slot range
    /// starting at `root` and every descendant sits after its ancestors:
    /// walking the range backwards reaches each node after all its children.
    fn fold_subtree<R, F>(&self, root: NodeId, func: &F) -> Result<R, FractalError>
    where
        F: ComputeFunction<E, R>,
    {
        let base = root.0;
        let end = self.subtree_end(root);
        let mut results: Vec<Option<R>> = (base..end).map(|_| None).collect();

        for slot in (base..end).rev() {
            let linked = &self.nodes[slot];
            let children = linked
                .children
                .iter()
                .map(|child| {
                    results[child.0 - base].take().ok_or(StateError::Unsettled {
                        start: child.0,
                        end: child.0 + 1,
                    })
                })
                .collect::<Result<Vec<R>, StateError>>()?;
            let result = func
                .combine(&linked.node, &children)
                .map_err(FractalError::Hook)?;
            results[slot - base] = Some(result);
        }

        results[0].take().ok_or_else(|| {
            StateError::Unsettled {
                start: base,
                end: base + 1,
            }
            .into()
        })
    }

    /// One past the last slot of the subtree rooted at `id`
    fn subtree_end(&self, id: NodeId) -> usize {
        let mut last = id;
        while let Some(&child) = self.nodes[last.0].children.last() {
            last = child;
        }
        last.0 + 1
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&LinkedNode<E>> {
        self.nodes.get(id.0)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &LinkedNode<E>> {
        self.nodes.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut LinkedNode<E>> {
        self.nodes.iter_mut()
    }

    pub(crate) fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.children.is_empty()).count()
    }

    /// Deepest depth actually reached (growth may stop early)
    pub(crate) fn max_depth(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| n.node.info().depth)
            .max()
            .unwrap_or(0)
    }
}

/// Pending node of a pre-order build
struct Sprout<S> {
    seed: S,
    info: ElementInfo,
    parent: Option<NodeId>,
}

/// Build the subtree rooted at `info` into a fresh pre-order arena.
///
/// Uses an explicit stack, so depth is bounded by memory, not by the call
/// stack. Only nodes above the cutoff fork their children out to workers.
fn grow_subtree<E: Element>(
    seed: E::Seed,
    info: ElementInfo,
    executor: &Executor,
) -> Result<Vec<LinkedNode<E>>, FractalError> {
    let mut arena: Vec<LinkedNode<E>> = Vec::new();
    let mut stack = vec![Sprout {
        seed,
        info,
        parent: None,
    }];

    while let Some(Sprout { seed, info, parent }) = stack.pop() {
        let id = NodeId(arena.len());
        let node = Node::<E>::sprout(seed, info).map_err(FractalError::Hook)?;

        let seeds = if node.stops_growth() {
            Vec::new()
        } else {
            node.child_seeds()
        };
        if let Some(parent) = parent {
            arena[parent.0].children.push(id);
        }
        arena.push(LinkedNode {
            node,
            parent,
            children: Vec::with_capacity(seeds.len()),
        });

        if seeds.len() > 1 && executor.fans_out_at(info.depth) {
            let subtrees = seeds
                .into_par_iter()
                .enumerate()
                .map(|(child_id, seed)| grow_subtree(seed, info.child(child_id, None)?, executor))
                .collect::<Result<Vec<_>, FractalError>>()?;

            for subtree in subtrees {
                let child = splice(&mut arena, subtree, id);
                arena[id.0].children.push(child);
            }
        } else {
            // reversed so child 0 is popped (and fully built) first
            for (child_id, seed) in seeds.into_iter().enumerate().rev() {
                stack.push(Sprout {
                    seed,
                    info: info.child(child_id, None)?,
                    parent: Some(id),
                });
            }
        }
    }

    Ok(arena)
}

/// Append a privately built subtree, rebasing its ids, and hang it below `parent`.
fn splice<E: Element>(
    arena: &mut Vec<LinkedNode<E>>,
    subtree: Vec<LinkedNode<E>>,
    parent: NodeId,
) -> NodeId {
    let offset = arena.len();
    arena.extend(subtree.into_iter().map(|mut linked| {
        linked.parent = Some(match linked.parent {
            Some(p) => p.offset(offset),
            None => parent,
        });
        for child in &mut linked.children {
            *child = child.offset(offset);
        }
        linked
    }));
    NodeId(offset)
}
