use crate::tree::{ElementInfo, Node};
use crate::HookError;

/// Trait implemented by user node types grown by a [`crate::Fractal`].
///
/// The framework default-constructs every element, then calls
/// [`Element::grow`] exactly once with the seed derived for it. Unless the
/// node is a leaf or reports a stop, one child seed is spawned per child
/// position, in child order.
pub trait Element: Default + Send + Sync {
    /// Value threaded from a parent to each of its children
    type Seed: Default + Send + Sync;

    /// Fill this element from its seed.
    fn grow(&mut self, seed: &Self::Seed, info: &ElementInfo) -> Result<(), HookError>;

    /// Stop growth below this node regardless of the remaining level budget.
    ///
    /// Only honored by the unbalanced layout (and at the root of a balanced
    /// tree). Defaults to never stopping.
    fn growth_stop_condition(&self, _info: &ElementInfo) -> bool {
        false
    }

    /// Derive the seed of child `child_id` from this node's seed.
    fn spawn_child_seed(&self, _seed: &Self::Seed, _child_id: usize) -> Self::Seed {
        Self::Seed::default()
    }
}

/// Combining function applied once per node during a compute pass.
///
/// `children` holds the results of the node's children in child order (empty
/// for leaves). Any closure `Fn(&Node<E>, &[R]) -> Result<R, HookError>`
/// already satisfies this trait.
pub trait ComputeFunction<E: Element, R>: Sync {
    /// Combine one node with its children's results.
    fn combine(&self, node: &Node<E>, children: &[R]) -> Result<R, HookError>;
}

impl<E, R, F> ComputeFunction<E, R> for F
where
    E: Element,
    F: Fn(&Node<E>, &[R]) -> Result<R, HookError> + Sync,
{
    fn combine(&self, node: &Node<E>, children: &[R]) -> Result<R, HookError> {
        self(node, children)
    }
}
