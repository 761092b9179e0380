//! Tree configuration
//!
//! Selects the memory layout and the execution strategy once, at
//! construction time:
//! - `Layout::Balanced`: complete tree in a flat array (heap order)
//! - `Layout::Unbalanced`: explicitly linked nodes, growth may stop early
//! - `Strategy::Sequential` / `Strategy::Parallel`: fan-out strategy

mod pool;

pub(crate) use pool::Executor;
pub use pool::THREADS_ENV;

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::framework::Element;
use crate::tree::Fractal;
use crate::{ConfigError, FractalError};

/// Memory layout of the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Layout {
    /// Complete tree laid out linearly as a heap
    Balanced,

    /// Tree of linked nodes; subtrees below a stopped node are never built
    Unbalanced,
}

/// Fan-out strategy for growth and compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    /// Plain recursion on the calling thread
    Sequential,

    /// Fork-join on the worker pool near the root, sequential below the cutoff
    Parallel,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Balanced => write!(f, "balanced"),
            Layout::Unbalanced => write!(f, "unbalanced"),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Sequential => write!(f, "sequential"),
            Strategy::Parallel => write!(f, "parallel"),
        }
    }
}

impl FromStr for Layout {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balanced" => Ok(Layout::Balanced),
            "unbalanced" => Ok(Layout::Unbalanced),
            other => Err(ConfigError::UnknownVariant {
                kind: "layout",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Strategy::Sequential),
            "parallel" => Ok(Strategy::Parallel),
            other => Err(ConfigError::UnknownVariant {
                kind: "strategy",
                value: other.to_string(),
            }),
        }
    }
}

/// Granularity tuning for `Strategy::Parallel`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParallelConfig {
    /// Linked layout: subtrees rooted above this depth are handed to workers,
    /// deeper nodes recurse sequentially on the worker that reached them
    pub cutoff_depth: usize,

    /// Worker count; `None` reads `FRACTAL_THREADS`, then falls back to the
    /// global pool sized to the hardware parallelism
    pub threads: Option<usize>,

    /// Array layout: a level is split into at most `threads * tasks_per_thread`
    /// disjoint ranges
    pub tasks_per_thread: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            cutoff_depth: 2,
            threads: None,
            tasks_per_thread: 4,
        }
    }
}

/// Validated tree configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FractalConfig {
    /// Branching factor
    pub arity: usize,

    /// Memory layout
    pub layout: Layout,

    /// Execution strategy
    pub strategy: Strategy,

    /// Parallel granularity (ignored by the sequential strategy)
    pub parallel: ParallelConfig,
}

impl FractalConfig {
    /// Create configuration with default parallel tuning
    pub fn new(arity: usize, layout: Layout, strategy: Strategy) -> Self {
        Self {
            arity,
            layout,
            strategy,
            parallel: ParallelConfig::default(),
        }
    }

    /// Set the depth above which the linked layout fans out.
    pub fn with_cutoff_depth(mut self, cutoff_depth: usize) -> Self {
        self.parallel.cutoff_depth = cutoff_depth;
        self
    }

    /// Use a dedicated pool with this many workers.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.parallel.threads = Some(threads);
        self
    }

    /// Set the per-thread task multiplier for level-parallel passes.
    pub fn with_tasks_per_thread(mut self, tasks_per_thread: usize) -> Self {
        self.parallel.tasks_per_thread = tasks_per_thread.max(1);
        self
    }

    /// Check invariants that do not depend on the requested depth
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arity == 0 {
            return Err(ConfigError::ZeroArity);
        }
        if self.parallel.threads == Some(0) {
            return Err(ConfigError::InvalidThreads(
                "thread count must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the parallel strategy was selected
    pub fn is_parallel(&self) -> bool {
        self.strategy == Strategy::Parallel
    }
}

/// Builder for [`Fractal`] (fluent API)
///
/// Layout and strategy have no defaults: leaving either unset is a
/// configuration error, never a silently chosen fallback.
pub struct FractalBuilder<E> {
    arity: Option<usize>,
    layout: Option<Layout>,
    strategy: Option<Strategy>,
    parallel: ParallelConfig,
    _element: PhantomData<fn() -> E>,
}

impl<E> fmt::Debug for FractalBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FractalBuilder")
            .field("arity", &self.arity)
            .field("layout", &self.layout)
            .field("strategy", &self.strategy)
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl<E> FractalBuilder<E> {
    /// Create new builder
    pub fn new() -> Self {
        Self {
            arity: None,
            layout: None,
            strategy: None,
            parallel: ParallelConfig::default(),
            _element: PhantomData,
        }
    }

    /// Set branching factor
    pub fn arity(mut self, arity: usize) -> Self {
        self.arity = Some(arity);
        self
    }

    /// Set memory layout
    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Set execution strategy
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Set parallel granularity cutoff (linked layout)
    pub fn cutoff_depth(mut self, cutoff_depth: usize) -> Self {
        self.parallel.cutoff_depth = cutoff_depth;
        self
    }

    /// Use a dedicated pool with this many workers
    pub fn threads(mut self, threads: usize) -> Self {
        self.parallel.threads = Some(threads);
        self
    }

    /// Set per-thread task multiplier (array layout)
    pub fn tasks_per_thread(mut self, tasks_per_thread: usize) -> Self {
        self.parallel.tasks_per_thread = tasks_per_thread.max(1);
        self
    }

    /// Finish into a validated configuration
    pub fn build_config(self) -> Result<FractalConfig, ConfigError> {
        let arity = self.arity.ok_or(ConfigError::MissingArity)?;
        let layout = self.layout.ok_or(ConfigError::MissingLayout)?;
        let strategy = self.strategy.ok_or(ConfigError::MissingStrategy)?;

        let config = FractalConfig {
            arity,
            layout,
            strategy,
            parallel: self.parallel,
        };
        config.validate()?;
        Ok(config)
    }
}

impl<E: Element> FractalBuilder<E> {
    /// Build an ungrown tree
    pub fn build(self) -> Result<Fractal<E>, FractalError> {
        Fractal::new(self.build_config()?)
    }
}
