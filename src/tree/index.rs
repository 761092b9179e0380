//! Index arithmetic for the balanced (array) layout
//!
//! Complete A-ary tree stored as a heap:
//!   Children of p: [A·p + 1, A·p + A]
//!   Parent of i > 0: ⌊(i − 1) / A⌋
//!
//! Nodes within the first i levels: S(i) = (A^i − 1)/(A − 1), S(i) = i for A = 1.
//! Depth d occupies the contiguous range [S(d), S(d+1)).

use std::ops::Range;

use crate::ConfigError;

/// Precomputed geometric-sum table of one complete tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTable {
    arity: usize,
    top_level: usize,

    /// geo[i] = S(i) for i in 0..=top_level+1
    geo: Vec<usize>,
}

impl IndexTable {
    /// Build the table for `arity` and `top_level` (the requested depth).
    ///
    /// Every entry is computed with checked arithmetic: a tree whose node
    /// count does not fit in `usize` is rejected here, before allocation.
    pub fn new(arity: usize, top_level: usize) -> Result<Self, ConfigError> {
        if arity == 0 {
            return Err(ConfigError::ZeroArity);
        }
        let overflow = ConfigError::CapacityOverflow {
            arity,
            depth: top_level,
        };

        let levels = top_level.checked_add(1).ok_or_else(|| overflow.clone())?;
        let mut geo = Vec::with_capacity(levels + 1);
        geo.push(0usize);

        let mut width = 1usize; // A^d
        for depth in 0..levels {
            let total = geo[depth]
                .checked_add(width)
                .ok_or_else(|| overflow.clone())?;
            geo.push(total);
            if depth + 1 < levels {
                width = width.checked_mul(arity).ok_or_else(|| overflow.clone())?;
            }
        }

        Ok(Self {
            arity,
            top_level,
            geo,
        })
    }

    /// Branching factor
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Level of the root
    pub fn top_level(&self) -> usize {
        self.top_level
    }

    /// S(i): nodes reachable within `i` levels of the root
    pub fn geo_sum(&self, i: usize) -> usize {
        self.geo[i]
    }

    /// Total number of nodes, S(top_level + 1)
    pub fn len(&self) -> usize {
        self.geo[self.top_level + 1]
    }

    /// Always false: a table describes at least the root
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of leaves, A^top_level
    pub fn leaf_count(&self) -> usize {
        self.depth_width(self.top_level)
    }

    /// Number of nodes at depth `d`, A^d
    pub fn depth_width(&self, depth: usize) -> usize {
        self.geo[depth + 1] - self.geo[depth]
    }

    /// Number of nodes at level `lvl`
    pub fn level_width(&self, lvl: usize) -> usize {
        self.depth_width(self.top_level - lvl)
    }

    /// Slots of depth `d`
    pub fn depth_range(&self, depth: usize) -> Range<usize> {
        self.geo[depth]..self.geo[depth + 1]
    }

    /// Slots of level `lvl`
    pub fn level_range(&self, lvl: usize) -> Range<usize> {
        self.depth_range(self.top_level - lvl)
    }

    /// Index of the first child
    #[inline]
    pub fn first_child(&self, parent: usize) -> usize {
        self.arity * parent + 1
    }

    /// Index of the last child
    #[inline]
    pub fn last_child(&self, parent: usize) -> usize {
        self.arity * parent + self.arity
    }

    /// Index of child `child_id` (0-based)
    #[inline]
    pub fn child_index(&self, parent: usize, child_id: usize) -> usize {
        self.arity * parent + 1 + child_id
    }

    /// All children of `parent`; empty for leaves
    pub fn children(&self, parent: usize) -> Range<usize> {
        match self.index_to_level(parent) {
            Some(lvl) if lvl > 0 => self.first_child(parent)..self.last_child(parent) + 1,
            _ => 0..0,
        }
    }

    /// Parent slot, `None` for the root
    #[inline]
    pub fn parent_index(&self, index: usize) -> Option<usize> {
        if index == 0 {
            None
        } else {
            Some((index - 1) / self.arity)
        }
    }

    /// Depth of slot `index`, `None` when outside the tree
    pub fn index_to_depth(&self, index: usize) -> Option<usize> {
        if index >= self.len() {
            return None;
        }
        // first S(i) strictly above index, minus one
        Some(self.geo.partition_point(|&s| s <= index) - 1)
    }

    /// Level of slot `index`, `None` when outside the tree
    pub fn index_to_level(&self, index: usize) -> Option<usize> {
        self.index_to_depth(index).map(|d| self.top_level - d)
    }

    /// Split `range` into at most `tasks` contiguous, disjoint pieces that
    /// cover it exactly. Empty ranges yield no pieces.
    pub fn partition(range: Range<usize>, tasks: usize) -> Vec<Range<usize>> {
        let len = range.end.saturating_sub(range.start);
        if len == 0 {
            return Vec::new();
        }
        let tasks = tasks.clamp(1, len);
        let chunk = (len + tasks - 1) / tasks;

        (range.start..range.end)
            .step_by(chunk)
            .map(|start| start..(start + chunk).min(range.end))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometric_sums() {
        let table = IndexTable::new(2, 3).unwrap();
        assert_eq!(table.len(), 15);
        assert_eq!(table.leaf_count(), 8);
        assert_eq!(table.geo_sum(2), 3);
        assert_eq!(table.depth_range(2), 3..7);
        assert_eq!(table.level_range(0), 7..15);

        let ternary = IndexTable::new(3, 2).unwrap();
        assert_eq!(ternary.len(), 13);
        assert_eq!(ternary.level_width(1), 3);
    }

    #[test]
    fn test_unary_chain() {
        let chain = IndexTable::new(1, 4).unwrap();
        assert_eq!(chain.len(), 5);
        assert_eq!(chain.leaf_count(), 1);
        assert_eq!(chain.children(2), 3..4);
        assert_eq!(chain.parent_index(3), Some(2));
        assert_eq!(chain.index_to_depth(4), Some(4));
    }

    #[test]
    fn test_child_parent_arithmetic() {
        let table = IndexTable::new(3, 3).unwrap();
        for parent in table.depth_range(0).chain(table.depth_range(1)) {
            let children = table.children(parent);
            assert_eq!(children.start, table.first_child(parent));
            assert_eq!(children.end - 1, table.last_child(parent));
            for (child_id, child) in children.enumerate() {
                assert_eq!(table.child_index(parent, child_id), child);
                assert_eq!(table.parent_index(child), Some(parent));
                assert_eq!(
                    table.index_to_depth(child),
                    table.index_to_depth(parent).map(|d| d + 1)
                );
            }
        }
        assert_eq!(table.parent_index(0), None);
        assert!(table.children(table.len() - 1).is_empty());
    }

    #[test]
    fn test_index_to_depth_and_level() {
        let table = IndexTable::new(2, 2).unwrap();
        let depths: Vec<_> = (0..7).map(|i| table.index_to_depth(i).unwrap()).collect();
        assert_eq!(depths, vec![0, 1, 1, 2, 2, 2, 2]);
        assert_eq!(table.index_to_level(0), Some(2));
        assert_eq!(table.index_to_level(6), Some(0));
        assert_eq!(table.index_to_depth(7), None);
    }

    #[test]
    fn test_root_only_table() {
        let table = IndexTable::new(5, 0).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.leaf_count(), 1);
        assert!(table.children(0).is_empty());
    }

    #[test]
    fn test_overflow_rejected() {
        assert_eq!(
            IndexTable::new(2, 64),
            Err(ConfigError::CapacityOverflow {
                arity: 2,
                depth: 64
            })
        );
        assert_eq!(IndexTable::new(0, 1), Err(ConfigError::ZeroArity));
    }

    #[test]
    fn test_partition_is_disjoint_cover() {
        for (range, tasks) in [(0..10, 3), (3..7, 8), (15..31, 4), (5..6, 1), (0..100, 7)] {
            let parts = IndexTable::partition(range.clone(), tasks);
            assert!(parts.len() <= tasks);

            let mut expected = range.start;
            for part in &parts {
                assert!(!part.is_empty());
                assert_eq!(part.start, expected, "pieces must not overlap or leave gaps");
                expected = part.end;
            }
            assert_eq!(expected, range.end);
        }
        assert!(IndexTable::partition(4..4, 3).is_empty());
    }
}
