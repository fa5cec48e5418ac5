#![forbid(unsafe_code)]
//! tracescore-eval: skeleton-based evaluation of a predicted segmentation.
//!
//! # Overview
//!
//! ```text
//! SkeletonGraph + node→segment lookup
//!        ↓  classify::SegmentMembership::build()   (global barrier)
//!        ├─ score::evaluate()          → skeleton → Score {correct, split, merged, omitted}
//!        └─ runs::correct_run_lengths() → skeleton → [run length]
//!                ↓  erl::erl_report()
//!           Expected Run Length
//! ```
//!
//! [`length`] supplies the geometric edge and skeleton lengths used by the
//! run analysis and the ERL denominator.
//!
//! # Conventions
//!
//! - **Errors**: [`tracescore_core::Result`] with a typed `EvalError`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

use std::collections::BTreeMap;

use tracescore_core::{
    EvaluationConfig, LengthSourceConfig, Result, SegmentLookup, SkeletonGraph, SkeletonId,
};
use tracing::{info, instrument};

pub mod classify;
pub mod erl;
pub mod exec;
pub mod length;
pub mod runs;
pub mod score;

pub use classify::{EdgeClass, EdgeClassification, SegmentMembership, classify_edges};
pub use erl::{ErlReport, SkeletonErl, erl_from_lengths, erl_report, expected_run_length};
pub use exec::Executor;
pub use length::{edge_lengths, skeleton_lengths, skeleton_lengths_cached};
pub use runs::{RunLengths, correct_run_lengths};
pub use score::{Score, evaluate, evaluate_with, summarize};

/// Configured entry point bundling the executor and the ERL length source.
#[derive(Debug)]
pub struct Evaluator {
    exec: Executor,
    lengths: LengthSourceConfig,
}

impl Evaluator {
    /// Build an evaluator from configuration.
    ///
    /// The length source is only checked when ERL is requested, so a config
    /// without one is still usable for edge scores.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid `[execution]` section.
    #[instrument(skip(config))]
    pub fn from_config(config: &EvaluationConfig) -> Result<Self> {
        let exec = Executor::from_config(&config.execution)?;
        info!(parallel = exec.is_parallel(), "evaluator ready");
        Ok(Self {
            exec,
            lengths: config.lengths.clone(),
        })
    }

    /// Per-skeleton edge scores.
    ///
    /// # Errors
    ///
    /// Only executor failures.
    pub fn scores<L: SegmentLookup + ?Sized>(
        &self,
        graph: &SkeletonGraph,
        lut: &L,
    ) -> Result<BTreeMap<SkeletonId, Score>> {
        evaluate_with(graph, lut, &self.exec)
    }

    /// Full ERL breakdown using the configured length source.
    ///
    /// # Errors
    ///
    /// A configuration error if the config does not name exactly one length
    /// source, otherwise the errors of [`erl_report`].
    pub fn erl_report<L: SegmentLookup + ?Sized>(
        &self,
        graph: &mut SkeletonGraph,
        lut: &L,
    ) -> Result<ErlReport> {
        let source = self.lengths.resolve()?;
        erl::erl_report(graph, lut, &source, &self.exec)
    }

    /// Expected run length using the configured length source.
    ///
    /// # Errors
    ///
    /// Same as [`Evaluator::erl_report`].
    pub fn expected_run_length<L: SegmentLookup + ?Sized>(
        &self,
        graph: &mut SkeletonGraph,
        lut: &L,
    ) -> Result<f64> {
        self.erl_report(graph, lut).map(|report| report.erl)
    }
}
