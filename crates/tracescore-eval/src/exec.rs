//! Serial or rayon-backed execution of per-skeleton work.
//!
//! Classification and run analysis are independent per skeleton once the
//! global segment membership is known. [`Executor`] fans that work out over
//! a rayon pool when the `parallel` feature is enabled and collects the
//! results into an ordered map, so serial and parallel runs return the
//! same value.

use std::collections::BTreeMap;

use petgraph::graph::EdgeIndex;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracescore_core::{ExecutionConfig, Result, SkeletonId};
use tracing::warn;

/// Where per-skeleton work runs.
#[derive(Debug, Default)]
pub enum Executor {
    /// On the calling thread, skeletons in ascending id order.
    #[default]
    Serial,
    /// On a dedicated rayon pool.
    #[cfg(feature = "parallel")]
    Parallel(rayon::ThreadPool),
}

impl Executor {
    /// Build an executor from configuration.
    ///
    /// Requesting parallel execution without the `parallel` feature falls
    /// back to serial execution.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the thread count is out of range or
    /// the pool cannot be started.
    pub fn from_config(config: &ExecutionConfig) -> Result<Self> {
        config.validate()?;
        if !config.parallel {
            return Ok(Self::Serial);
        }

        Self::start_pool(config.threads)
    }

    #[cfg(feature = "parallel")]
    fn start_pool(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| {
                warn!(error = %e, threads, "rayon pool build failed");
                tracescore_core::ConfigurationError::ThreadPoolUnavailable { threads }
            })?;
        Ok(Self::Parallel(pool))
    }

    #[cfg(not(feature = "parallel"))]
    fn start_pool(_threads: usize) -> Result<Self> {
        warn!("parallel execution requested but the `parallel` feature is disabled");
        Ok(Self::Serial)
    }

    /// `true` when work is spread over a pool.
    #[must_use]
    pub const fn is_parallel(&self) -> bool {
        !matches!(self, Self::Serial)
    }

    /// Apply `f` to every skeleton's edge list and collect the results.
    ///
    /// Stops at the first error (serial) or reports one of the errors
    /// (parallel); no partial map is returned either way.
    pub(crate) fn map_skeletons<T, F>(
        &self,
        groups: &BTreeMap<SkeletonId, Vec<EdgeIndex>>,
        f: F,
    ) -> Result<BTreeMap<SkeletonId, T>>
    where
        T: Send,
        F: Fn(SkeletonId, &[EdgeIndex]) -> Result<T> + Sync + Send,
    {
        match self {
            Self::Serial => groups
                .iter()
                .map(|(&skeleton, edges)| f(skeleton, edges).map(|t| (skeleton, t)))
                .collect(),
            #[cfg(feature = "parallel")]
            Self::Parallel(pool) => pool.install(|| {
                groups
                    .par_iter()
                    .map(|(&skeleton, edges)| f(skeleton, edges).map(|t| (skeleton, t)))
                    .collect()
            }),
        }
    }
}
