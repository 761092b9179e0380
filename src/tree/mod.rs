//! The Fractal: grow/compute skeleton over an n-ary tree
//!
//! One dispatch at the top of `grow`/`compute` picks the layout strategy:
//! - Balanced: flat array, level-by-level passes (see `balanced`)
//! - Unbalanced: linked pre-order arena, stack-driven passes (see `unbalanced`)
//!
//! The execution strategy only changes how siblings are scheduled, never the
//! resulting structure or result.

mod balanced;
mod index;
mod node;
mod unbalanced;

pub use index::IndexTable;
pub use node::{ElementInfo, Node, NodeId};

use std::fmt;

use balanced::ArrayStorage;
use unbalanced::LinkedStorage;

use crate::config::{Executor, FractalBuilder, FractalConfig, Layout, Strategy};
use crate::framework::{ComputeFunction, Element};
use crate::{FractalError, HookError, StateError};

enum Storage<E: Element> {
    Ungrown,
    Linked(LinkedStorage<E>),
    Array(ArrayStorage<E>),
    Poisoned(String),
}

/// Tree-structured computation skeleton
///
/// Owns its configuration, its worker pool and exactly one storage matching
/// the configured layout once grown.
pub struct Fractal<E: Element> {
    config: FractalConfig,
    executor: Executor,
    storage: Storage<E>,
    depth: Option<usize>,
}

impl<E: Element> Fractal<E> {
    /// Create fluent builder
    pub fn builder() -> FractalBuilder<E> {
        FractalBuilder::new()
    }

    /// Create an ungrown tree from a configuration
    pub fn new(config: FractalConfig) -> Result<Self, FractalError> {
        config.validate()?;
        let executor = Executor::new(&config)?;
        Ok(Self {
            config,
            executor,
            storage: Storage::Ungrown,
            depth: None,
        })
    }

    /// Configuration this tree was built with
    pub fn config(&self) -> &FractalConfig {
        &self.config
    }

    /// Branching factor
    pub fn arity(&self) -> usize {
        self.config.arity
    }

    /// Memory layout
    pub fn layout(&self) -> Layout {
        self.config.layout
    }

    /// Execution strategy
    pub fn strategy(&self) -> Strategy {
        self.config.strategy
    }

    /// Workers available to the parallel strategy (1 when sequential)
    pub fn threads(&self) -> usize {
        self.executor.threads()
    }

    /// Grow the whole tree from `seed`, replacing any previous structure.
    ///
    /// Configuration errors leave the tree ungrown. A failing growth hook
    /// aborts the pass and marks the tree invalid; `compute` then fails until
    /// the next successful `grow`.
    pub fn grow(&mut self, depth: usize, seed: E::Seed) -> Result<&mut Self, FractalError> {
        let span = tracing::debug_span!(
            "grow",
            layout = %self.config.layout,
            strategy = %self.config.strategy,
            arity = self.config.arity,
            depth
        );
        let _enter = span.enter();

        self.storage = Storage::Ungrown;
        self.depth = None;

        let arity = self.config.arity;
        let layout = self.config.layout;
        let executor = &self.executor;
        let grown = executor.install(move || match layout {
            Layout::Balanced => {
                ArrayStorage::grow(arity, depth, seed, executor).map(Storage::Array)
            }
            Layout::Unbalanced => {
                LinkedStorage::grow(arity, depth, seed, executor).map(Storage::Linked)
            }
        });

        match grown {
            Ok(storage) => {
                self.depth = Some(match &storage {
                    Storage::Array(array) => array.table().top_level(),
                    _ => depth,
                });
                self.storage = storage;
                tracing::debug!(nodes = self.len(), leaves = self.leaf_count(), "tree grown");
                Ok(self)
            }
            Err(err) => {
                if !err.is_configuration() {
                    tracing::warn!(error = %err, "grow failed, tree marked invalid");
                    self.storage = Storage::Poisoned(err.to_string());
                }
                Err(err)
            }
        }
    }

    /// Grow from the default seed
    pub fn grow_default(&mut self, depth: usize) -> Result<&mut Self, FractalError> {
        self.grow(depth, E::Seed::default())
    }

    /// Fold `func` bottom-up and return the root's result.
    ///
    /// Leaves receive an empty slice, internal nodes their children's results
    /// in child order. Every node is visited exactly once and always after
    /// all of its children.
    pub fn compute<R, F>(&self, func: F) -> Result<R, FractalError>
    where
        R: Send + Sync,
        F: Fn(&Node<E>, &[R]) -> Result<R, HookError> + Sync,
    {
        self.compute_with(&func)
    }

    /// Same as [`Fractal::compute`] for a struct implementing [`ComputeFunction`].
    pub fn compute_with<R, C>(&self, func: &C) -> Result<R, FractalError>
    where
        R: Send + Sync,
        C: ComputeFunction<E, R>,
    {
        let span = tracing::debug_span!(
            "compute",
            layout = %self.config.layout,
            strategy = %self.config.strategy
        );
        let _enter = span.enter();

        let executor = &self.executor;
        let result = match &self.storage {
            Storage::Ungrown => return Err(StateError::NotGrown.into()),
            Storage::Poisoned(reason) => {
                return Err(StateError::Poisoned {
                    reason: reason.clone(),
                }
                .into())
            }
            Storage::Array(array) => executor.install(|| array.compute(func, executor)),
            Storage::Linked(linked) => executor.install(|| linked.compute(func, executor)),
        };

        tracing::debug!(ok = result.is_ok(), nodes = self.len(), "compute finished");
        result
    }

    /// Set injected data on every node, in storage order. Shape is unchanged.
    pub fn inject<F>(&mut self, mut func: F) -> Result<(), FractalError>
    where
        F: FnMut(&ElementInfo, &mut E),
    {
        match &mut self.storage {
            Storage::Ungrown => Err(StateError::NotGrown.into()),
            Storage::Poisoned(reason) => Err(StateError::Poisoned {
                reason: reason.clone(),
            }
            .into()),
            Storage::Array(array) => {
                for node in array.nodes_mut() {
                    let info = *node.info();
                    func(&info, node.element_mut());
                }
                Ok(())
            }
            Storage::Linked(linked) => {
                for entry in linked.iter_mut() {
                    let info = *entry.node.info();
                    func(&info, entry.node.element_mut());
                }
                Ok(())
            }
        }
    }

    /// Whether a successful `grow` produced the current structure
    pub fn is_grown(&self) -> bool {
        matches!(self.storage, Storage::Linked(_) | Storage::Array(_))
    }

    /// Level of the root (requested depth; 0 after a root-level stop in the
    /// balanced layout). `None` until grown.
    pub fn depth(&self) -> Option<usize> {
        self.depth
    }

    /// Deepest depth actually populated; may be below [`Fractal::depth`] when
    /// growth stopped early.
    pub fn reached_depth(&self) -> Option<usize> {
        match &self.storage {
            Storage::Array(array) => Some(array.table().top_level()),
            Storage::Linked(linked) => Some(linked.max_depth()),
            _ => None,
        }
    }

    /// Number of nodes (0 until grown)
    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Array(array) => array.nodes().len(),
            Storage::Linked(linked) => linked.len(),
            _ => 0,
        }
    }

    /// Whether the tree holds no nodes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of nodes without children
    pub fn leaf_count(&self) -> usize {
        match &self.storage {
            Storage::Array(array) => array.table().leaf_count(),
            Storage::Linked(linked) => linked.leaf_count(),
            _ => 0,
        }
    }

    /// Index arithmetic of a grown balanced tree
    pub fn index_table(&self) -> Option<&IndexTable> {
        match &self.storage {
            Storage::Array(array) => Some(array.table()),
            _ => None,
        }
    }

    /// Root node
    pub fn root(&self) -> Result<&Node<E>, FractalError> {
        match &self.storage {
            Storage::Ungrown => Err(StateError::NotGrown.into()),
            Storage::Poisoned(reason) => Err(StateError::Poisoned {
                reason: reason.clone(),
            }
            .into()),
            _ => self
                .node(NodeId::ROOT)
                .ok_or_else(|| StateError::NotGrown.into()),
        }
    }

    /// Node by id
    pub fn node(&self, id: NodeId) -> Option<&Node<E>> {
        match &self.storage {
            Storage::Array(array) => array.nodes().get(id.0),
            Storage::Linked(linked) => linked.get(id).map(|entry| &entry.node),
            _ => None,
        }
    }

    /// Parent of `id` (`None` for the root or unknown ids)
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        match &self.storage {
            Storage::Array(array) if id.0 < array.nodes().len() => {
                array.table().parent_index(id.0).map(NodeId)
            }
            Storage::Linked(linked) => linked.get(id).and_then(|entry| entry.parent),
            _ => None,
        }
    }

    /// Children of `id` in child order (empty for leaves and stopped nodes)
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match &self.storage {
            Storage::Array(array) => array.table().children(id.0).map(NodeId).collect(),
            Storage::Linked(linked) => linked
                .get(id)
                .map(|entry| entry.children.clone())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Child `child_id` of `id`; rejects leaves and out-of-range positions
    pub fn child(&self, id: NodeId, child_id: usize) -> Result<NodeId, FractalError> {
        let node = self.node(id).ok_or(StateError::UnknownNode(id.0))?;
        node.info().ensure_internal()?;
        if child_id >= self.config.arity {
            return Err(StateError::ChildOutOfRange {
                child_id,
                arity: self.config.arity,
            }
            .into());
        }
        self.children(id).get(child_id).copied().ok_or_else(|| {
            StateError::NoChildren {
                depth: node.info().depth,
            }
            .into()
        })
    }

    /// All nodes in storage order: level order (balanced) or pre-order
    /// (unbalanced)
    pub fn nodes(&self) -> Box<dyn Iterator<Item = &Node<E>> + '_> {
        match &self.storage {
            Storage::Array(array) => Box::new(array.nodes().iter()),
            Storage::Linked(linked) => Box::new(linked.iter().map(|entry| &entry.node)),
            _ => Box::new(std::iter::empty()),
        }
    }

    /// Ids of all nodes in storage order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.len()).map(NodeId)
    }
}

impl<E: Element> fmt::Debug for Fractal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.storage {
            Storage::Ungrown => "ungrown",
            Storage::Linked(_) | Storage::Array(_) => "grown",
            Storage::Poisoned(_) => "poisoned",
        };
        f.debug_struct("Fractal")
            .field("config", &self.config)
            .field("state", &state)
            .field("depth", &self.depth)
            .field("nodes", &self.len())
            .finish()
    }
}
