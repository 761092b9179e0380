//! Node representation
//!
//! ElementInfo = structural coordinates (depth, level, index, child_id)
//! Node = seed + coordinates + user element

use std::fmt;

use crate::framework::Element;
use crate::{HookError, StateError};

/// Structural coordinates of a node, fixed at growth time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementInfo {
    /// Distance from the root
    pub depth: usize,

    /// Remaining levels down to the leaves (0 = leaf)
    pub level: usize,

    /// Array slot; only the balanced layout assigns one
    pub index: Option<usize>,

    /// Position among siblings, `0..arity` (root uses 0)
    pub child_id: usize,

    /// Branching factor of the tree
    pub arity: usize,
}

impl ElementInfo {
    /// Coordinates of the root of a tree with `top_level` levels below it
    pub fn root(top_level: usize, arity: usize, index: Option<usize>) -> Self {
        Self {
            depth: 0,
            level: top_level,
            index,
            child_id: 0,
            arity,
        }
    }

    /// Check if leaf (level 0)
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.level == 0
    }

    /// Reject operations that assume children at level 0
    pub fn ensure_internal(&self) -> Result<(), StateError> {
        if self.is_leaf() {
            return Err(StateError::NoChildren { depth: self.depth });
        }
        Ok(())
    }

    /// Coordinates of child `child_id`
    pub fn child(&self, child_id: usize, index: Option<usize>) -> Result<Self, StateError> {
        self.ensure_internal()?;
        if child_id >= self.arity {
            return Err(StateError::ChildOutOfRange {
                child_id,
                arity: self.arity,
            });
        }
        Ok(Self {
            depth: self.depth + 1,
            level: self.level - 1,
            index,
            child_id,
            arity: self.arity,
        })
    }
}

/// Stable handle of a node inside a grown tree
///
/// Balanced layout: the array slot. Unbalanced layout: the pre-order slot of
/// the linked arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root of every grown tree
    pub const ROOT: NodeId = NodeId(0);

    /// Raw slot number
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    #[inline]
    pub(crate) fn offset(self, by: usize) -> NodeId {
        NodeId(self.0 + by)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One grown node: its seed, its coordinates and the user element
pub struct Node<E: Element> {
    seed: E::Seed,
    info: ElementInfo,
    element: E,
}

impl<E: Element> Node<E> {
    /// Plant the seed and run the growth hook once.
    pub(crate) fn sprout(seed: E::Seed, info: ElementInfo) -> Result<Self, HookError> {
        let mut element = E::default();
        element.grow(&seed, &info)?;
        Ok(Self {
            seed,
            info,
            element,
        })
    }

    /// Seed this node was grown from
    pub fn seed(&self) -> &E::Seed {
        &self.seed
    }

    /// Structural coordinates
    pub fn info(&self) -> &ElementInfo {
        &self.info
    }

    /// User element
    pub fn element(&self) -> &E {
        &self.element
    }

    pub(crate) fn element_mut(&mut self) -> &mut E {
        &mut self.element
    }

    pub(crate) fn set_info(&mut self, info: ElementInfo) {
        self.info = info;
    }

    /// Whether growth ends at this node (leaf level or user stop)
    pub(crate) fn stops_growth(&self) -> bool {
        self.info.is_leaf() || self.element.growth_stop_condition(&self.info)
    }

    /// One seed per child position, in child order
    pub(crate) fn child_seeds(&self) -> Vec<E::Seed> {
        (0..self.info.arity)
            .map(|child_id| self.element.spawn_child_seed(&self.seed, child_id))
            .collect()
    }
}

impl<E> fmt::Debug for Node<E>
where
    E: Element + fmt::Debug,
    E::Seed: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("seed", &self.seed)
            .field("info", &self.info)
            .field("element", &self.element)
            .finish()
    }
}
