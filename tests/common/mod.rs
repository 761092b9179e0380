#![allow(dead_code)]

use std::fmt;

use fractal::elements::SeedValue;
use fractal::{Element, ElementInfo, Fractal, HookError, Layout, Node, Strategy};

/// Every layout/strategy pairing
pub const ALL_MODES: [(Layout, Strategy); 4] = [
    (Layout::Balanced, Strategy::Sequential),
    (Layout::Balanced, Strategy::Parallel),
    (Layout::Unbalanced, Strategy::Sequential),
    (Layout::Unbalanced, Strategy::Parallel),
];

pub fn build<E: Element>(arity: usize, layout: Layout, strategy: Strategy) -> Fractal<E> {
    Fractal::<E>::builder()
        .arity(arity)
        .layout(layout)
        .strategy(strategy)
        .threads(4)
        .build()
        .expect("valid configuration")
}

pub fn grown(arity: usize, depth: usize, layout: Layout, strategy: Strategy) -> Fractal<SeedValue> {
    let mut fractal = build::<SeedValue>(arity, layout, strategy);
    fractal.grow(depth, 0).expect("growth succeeds");
    fractal
}

pub fn count_nodes<E: Element>(_node: &Node<E>, children: &[u64]) -> Result<u64, HookError> {
    Ok(1 + children.iter().sum::<u64>())
}

pub fn sum_values(node: &Node<SeedValue>, children: &[u64]) -> Result<u64, HookError> {
    Ok(children
        .iter()
        .fold(node.element().value, |acc, v| acc.wrapping_add(*v)))
}

/// (A^(d+1) - 1) / (A - 1), or d + 1 for a chain
pub fn complete_tree_size(arity: usize, depth: usize) -> usize {
    if arity == 1 {
        depth + 1
    } else {
        (arity.pow(depth as u32 + 1) - 1) / (arity - 1)
    }
}

/// Error raised by the failing elements below
#[derive(Debug)]
pub struct Wilted {
    pub depth: usize,
}

impl fmt::Display for Wilted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wilted at depth {}", self.depth)
    }
}

impl std::error::Error for Wilted {}

/// Fails to grow once it reaches the depth given by its seed.
#[derive(Debug, Default)]
pub struct WiltsAt {
    pub limit: usize,
}

impl Element for WiltsAt {
    type Seed = usize;

    fn grow(&mut self, seed: &usize, info: &ElementInfo) -> Result<(), HookError> {
        self.limit = *seed;
        if info.depth >= *seed {
            return Err(Box::new(Wilted { depth: info.depth }));
        }
        Ok(())
    }

    fn spawn_child_seed(&self, seed: &usize, _child_id: usize) -> usize {
        *seed
    }
}

/// Stops growing at the root when seeded with `true`.
#[derive(Debug, Default)]
pub struct StopAtRoot {
    pub stop: bool,
}

impl Element for StopAtRoot {
    type Seed = bool;

    fn grow(&mut self, seed: &bool, info: &ElementInfo) -> Result<(), HookError> {
        self.stop = *seed && info.depth == 0;
        Ok(())
    }

    fn growth_stop_condition(&self, _info: &ElementInfo) -> bool {
        self.stop
    }
}
