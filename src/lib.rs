//! # Fractal: tree-structured parallel computation skeleton
//!
//! A reusable framework that grows an n-ary tree of bounded depth from a
//! seed and folds a user computation bottom-up over it.
//!
//! ## Core Algorithm
//!
//! 1. **Growth pass**: the root is grown from the initial seed, every node
//!    derives one seed per child, children grow from those seeds
//! 2. **Compute pass**: each node combines its own data with the ordered
//!    results of its children, leaves first, root last
//! 3. **Layouts**: balanced trees live in a flat array addressed by
//!    closed-form index arithmetic; unbalanced trees are explicitly linked
//! 4. **Strategies**: sequential recursion, or fork-join fan-out near the
//!    root bounded by a granularity cutoff
//!
//! ## Usage Example
//!
//! ```
//! use fractal::{Element, ElementInfo, Fractal, HookError, Layout, Strategy};
//!
//! #[derive(Debug, Default)]
//! struct Value(u64);
//!
//! impl Element for Value {
//!     type Seed = u64;
//!
//!     fn grow(&mut self, seed: &u64, _info: &ElementInfo) -> Result<(), HookError> {
//!         self.0 = *seed;
//!         Ok(())
//!     }
//!
//!     fn spawn_child_seed(&self, seed: &u64, child_id: usize) -> u64 {
//!         seed * 2 + child_id as u64 + 1
//!     }
//! }
//!
//! let mut tree = Fractal::<Value>::builder()
//!     .arity(2)
//!     .layout(Layout::Balanced)
//!     .strategy(Strategy::Sequential)
//!     .build()?;
//! tree.grow(2, 0)?;
//!
//! let sum = tree.compute(|node, children: &[u64]| {
//!     Ok(node.element().0 + children.iter().sum::<u64>())
//! })?;
//! assert_eq!(sum, 21);
//! # Ok::<(), fractal::FractalError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod config;     // Layout, strategy and parallel tuning
pub mod framework;  // User-facing hook traits
pub mod ledger;     // Settle tracking for the array layout
pub mod tree;       // The Fractal itself
pub mod skeleton;   // Linear fold and flat reduce skeletons
pub mod elements;   // Reference elements

// Re-exports for convenience
pub use config::{FractalBuilder, FractalConfig, Layout, ParallelConfig, Strategy};
pub use framework::{ComputeFunction, Element};
pub use ledger::SettleLedger;
pub use skeleton::{FlatReduce, LinearFold, Link, Member};
pub use tree::{ElementInfo, Fractal, IndexTable, Node, NodeId};

use thiserror::Error;

/// Error type surfaced by user-supplied hooks.
///
/// The framework never inspects or rewrites it; it reaches the caller of
/// `grow`/`compute` as the source of [`FractalError::Hook`].
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal configuration problems, reported before any node is allocated
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Branching factor must be at least one
    #[error("arity must be >= 1")]
    ZeroArity,

    /// Flat skeletons need at least one element
    #[error("width must be >= 1")]
    ZeroWidth,

    /// Builder was finished without an arity
    #[error("arity not specified")]
    MissingArity,

    /// Builder was finished without a layout
    #[error("layout not specified (balanced or unbalanced)")]
    MissingLayout,

    /// Builder was finished without an execution strategy
    #[error("execution strategy not specified (sequential or parallel)")]
    MissingStrategy,

    /// Complete tree for this arity and depth does not fit in memory indices
    #[error("a balanced tree of arity {arity} and depth {depth} overflows the index space")]
    CapacityOverflow {
        /// Requested arity
        arity: usize,
        /// Requested depth
        depth: usize,
    },

    /// Thread count could not be parsed or is zero
    #[error("invalid thread count: {0}")]
    InvalidThreads(String),

    /// Dedicated worker pool could not be started
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    /// Unrecognised layout or strategy name
    #[error("unknown {kind} '{value}'")]
    UnknownVariant {
        /// What was being parsed
        kind: &'static str,
        /// The offending input
        value: String,
    },
}

/// Operation invoked on a structure that cannot serve it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// `compute` or a query ran before `grow`
    #[error("structure has not been grown")]
    NotGrown,

    /// An earlier `grow` failed half way
    #[error("structure is invalid after a failed grow: {reason}")]
    Poisoned {
        /// Description of the failure that poisoned the structure
        reason: String,
    },

    /// Operation needs children but the node is a leaf (level 0) or
    /// stopped growing early
    #[error("node at depth {depth} has no children")]
    NoChildren {
        /// Depth of the offending node
        depth: usize,
    },

    /// Child position outside `0..arity`
    #[error("child id {child_id} out of range for arity {arity}")]
    ChildOutOfRange {
        /// Requested child position
        child_id: usize,
        /// Branching factor
        arity: usize,
    },

    /// Node handle does not belong to this structure
    #[error("node {0} does not exist")]
    UnknownNode(usize),

    /// Shrink target larger than the current width
    #[error("cannot shrink width {width} to {requested}")]
    ShrinkBeyondWidth {
        /// Current width
        width: usize,
        /// Requested width
        requested: usize,
    },

    /// Two tasks produced the same slots, or a task wrote past its level
    #[error("slots {start}..{end} settled twice or outside the ledger")]
    SlotConflict {
        /// First slot of the offending range
        start: usize,
        /// End of the offending range (exclusive)
        end: usize,
    },

    /// A parent level was about to read children that were not final yet
    #[error("slots {start}..{end} read before they were settled")]
    Unsettled {
        /// First unsettled slot of the range
        start: usize,
        /// End of the range (exclusive)
        end: usize,
    },
}

/// Errors that can occur while growing or computing
#[derive(Error, Debug)]
pub enum FractalError {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Invalid pre-condition
    #[error("invalid state: {0}")]
    InvalidState(#[from] StateError),

    /// A user hook (growth or combining function) failed
    #[error("user hook failed: {0}")]
    Hook(#[source] HookError),
}

impl FractalError {
    /// The user's original error, if this failure came from a hook.
    pub fn hook_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            FractalError::Hook(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// Unwrap the user's original error, if this failure came from a hook.
    pub fn into_hook_error(self) -> Option<HookError> {
        match self {
            FractalError::Hook(err) => Some(err),
            _ => None,
        }
    }

    /// Whether this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, FractalError::Configuration(_))
    }

    /// Whether this is an invalid-state error.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, FractalError::InvalidState(_))
    }
}
