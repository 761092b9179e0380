//! Worker pool selection for the parallel strategy

use rayon::{ThreadPool, ThreadPoolBuilder};

use super::{FractalConfig, Strategy};
use crate::ConfigError;

/// Environment variable consulted when no thread count is configured
pub const THREADS_ENV: &str = "FRACTAL_THREADS";

fn parse_threads_env() -> Result<Option<usize>, ConfigError> {
    match std::env::var(THREADS_ENV) {
        Ok(raw) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(ConfigError::InvalidThreads(format!(
                    "{THREADS_ENV} is set but empty"
                )));
            }
            match raw.parse::<usize>() {
                Ok(0) | Err(_) => Err(ConfigError::InvalidThreads(format!(
                    "{THREADS_ENV}={raw:?} is not a valid positive integer"
                ))),
                Ok(threads) => Ok(Some(threads)),
            }
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(ConfigError::InvalidThreads(format!(
            "failed to read {THREADS_ENV}: {err}"
        ))),
    }
}

/// Resolved execution resources of one tree
///
/// Sequential trees carry no pool. Parallel trees either own a dedicated
/// pool (explicit or environment thread count) or borrow the global one.
#[derive(Debug)]
pub(crate) struct Executor {
    pool: Option<ThreadPool>,
    threads: usize,
    parallel: bool,
    cutoff_depth: usize,
    tasks_per_thread: usize,
}

impl Executor {
    pub(crate) fn new(config: &FractalConfig) -> Result<Self, ConfigError> {
        if config.strategy == Strategy::Sequential {
            return Ok(Self {
                pool: None,
                threads: 1,
                parallel: false,
                cutoff_depth: 0,
                tasks_per_thread: 1,
            });
        }

        let requested = match config.parallel.threads {
            Some(threads) => Some(threads),
            None => parse_threads_env()?,
        };

        let (pool, threads) = match requested {
            Some(threads) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|idx| format!("fractal-worker-{idx}"))
                    .build()
                    .map_err(|err| ConfigError::ThreadPool(err.to_string()))?;
                (Some(pool), threads)
            }
            None => (None, rayon::current_num_threads().max(1)),
        };

        tracing::debug!(
            threads,
            dedicated = pool.is_some(),
            cutoff_depth = config.parallel.cutoff_depth,
            "parallel executor ready"
        );

        Ok(Self {
            pool,
            threads,
            parallel: true,
            cutoff_depth: config.parallel.cutoff_depth,
            tasks_per_thread: config.parallel.tasks_per_thread.max(1),
        })
    }

    /// Run `op` inside the dedicated pool, if any.
    pub(crate) fn install<R, OP>(&self, op: OP) -> R
    where
        R: Send,
        OP: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    pub(crate) fn threads(&self) -> usize {
        self.threads
    }

    /// Whether a node at `depth` may hand its children to separate workers.
    #[inline]
    pub(crate) fn fans_out_at(&self, depth: usize) -> bool {
        self.parallel && depth < self.cutoff_depth
    }

    /// Upper bound on concurrent tasks for one level of the array layout.
    /// Returns 1 for the sequential strategy.
    #[inline]
    pub(crate) fn level_tasks(&self, width: usize) -> usize {
        if !self.parallel {
            return 1;
        }
        width.min(self.threads.saturating_mul(self.tasks_per_thread)).max(1)
    }
}
