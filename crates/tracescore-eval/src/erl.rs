//! Expected Run Length (ERL).
//!
//! # Definition
//!
//! ```text
//! ERL = Σ_skeletons Σ_runs run² / Σ_skeletons L_skeleton
//! ```
//!
//! where runs come from [`crate::runs`] and `L_skeleton` counts every edge
//! regardless of its class. Equivalently, each skeleton contributes
//! `Σ run² / L_skeleton` weighted by `L_skeleton / L_total`. A skeleton
//! without errors contributes its full length; a fully merged or omitted
//! one contributes nothing.
//!
//! If the total length is zero (empty graph, or only zero-length skeletons)
//! the ERL is defined as `0.0`.
//!
//! # Length sources
//!
//! - [`LengthSource::Geometric`]: edge lengths are computed from node
//!   positions and cached on the graph, totals are summed from them.
//! - [`LengthSource::Precomputed`]: totals come from the caller and edge
//!   lengths are read from the graph's cache, which must be complete.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracescore_core::{
    EdgeLengths, LengthSource, Result, SegmentLookup, SkeletonGraph, SkeletonId, SkeletonLengths,
    ValidationError,
};
use tracing::{debug, instrument, warn};

use crate::exec::Executor;
use crate::length::skeleton_lengths_cached;
use crate::runs::correct_run_lengths_with;

/// ERL contribution of one skeleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonErl {
    /// Sum of all edge lengths of the skeleton.
    pub total_length: f64,
    /// Lengths of its correct runs.
    pub run_lengths: Vec<f64>,
    /// `Σ run²` over those runs.
    pub squared_run_sum: f64,
}

impl SkeletonErl {
    /// ERL of this skeleton alone: `Σ run² / L`, or `0.0` for `L == 0`.
    #[must_use]
    pub fn erl(&self) -> f64 {
        if self.total_length > 0.0 {
            self.squared_run_sum / self.total_length
        } else {
            0.0
        }
    }
}

/// Full ERL breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErlReport {
    pub skeletons: BTreeMap<SkeletonId, SkeletonErl>,
    /// Sum of all skeleton lengths (the denominator).
    pub total_length: f64,
    /// The expected run length.
    pub erl: f64,
}

impl ErlReport {
    /// Share of the total length held by `skeleton`, `None` if unknown or
    /// the total is zero.
    #[must_use]
    pub fn weight(&self, skeleton: SkeletonId) -> Option<f64> {
        if self.total_length <= 0.0 {
            return None;
        }
        self.skeletons
            .get(&skeleton)
            .map(|s| s.total_length / self.total_length)
    }
}

/// Compute the ERL of `graph` on the calling thread.
///
/// With a geometric source the graph's edge-length cache is (re)filled.
///
/// # Errors
///
/// - Unknown axis in a geometric source.
/// - Missing cached edge lengths, or a skeleton with edges but no total,
///   in a precomputed source.
pub fn expected_run_length<L: SegmentLookup + ?Sized>(
    graph: &mut SkeletonGraph,
    lut: &L,
    source: &LengthSource,
) -> Result<f64> {
    erl_report(graph, lut, source, &Executor::Serial).map(|report| report.erl)
}

/// Compute the full ERL breakdown, with per-skeleton work spread over
/// `exec`.
///
/// # Errors
///
/// Same as [`expected_run_length`], plus executor failures.
#[instrument(skip(graph, lut, source, exec), fields(edges = graph.edge_count()))]
pub fn erl_report<L: SegmentLookup + ?Sized>(
    graph: &mut SkeletonGraph,
    lut: &L,
    source: &LengthSource,
    exec: &Executor,
) -> Result<ErlReport> {
    let totals = match source {
        LengthSource::Geometric(axes) => skeleton_lengths_cached(graph, axes)?,
        LengthSource::Precomputed(totals) => totals.clone(),
    };
    // every edge length is in the cache from here on
    let lengths = graph.cached_edge_lengths()?;
    erl_from_lengths(graph, lut, &lengths, &totals, exec)
}

/// Pure ERL computation from explicit edge lengths and skeleton totals.
///
/// The denominator sums `totals` over the skeletons present in `graph`;
/// entries for other skeletons are ignored. An edgeless skeleton missing
/// from `totals` counts as length zero.
///
/// # Errors
///
/// - [`ValidationError::MissingSkeletonLength`] for a skeleton that has
///   edges but no entry in `totals`.
/// - [`ValidationError::InvalidSkeletonLength`] for a NaN, infinite or
///   negative entry of a skeleton in `graph`.
/// - [`ValidationError::MissingEdgeLength`] for a correct edge without a
///   length.
pub fn erl_from_lengths<L: SegmentLookup + ?Sized>(
    graph: &SkeletonGraph,
    lut: &L,
    lengths: &EdgeLengths,
    totals: &SkeletonLengths,
    exec: &Executor,
) -> Result<ErlReport> {
    let runs = correct_run_lengths_with(graph, lut, lengths, exec)?;

    let mut skeletons = BTreeMap::new();
    for (skeleton, edges) in graph.edges_by_skeleton() {
        let total_length = match totals.get(&skeleton) {
            Some(&length) if length.is_finite() && length >= 0.0 => length,
            Some(&length) => {
                return Err(ValidationError::InvalidSkeletonLength { skeleton, length }.into());
            }
            None if edges.is_empty() => 0.0,
            None => return Err(ValidationError::MissingSkeletonLength { skeleton }.into()),
        };
        let run_lengths = runs.get(&skeleton).cloned().unwrap_or_default();
        let squared_run_sum = run_lengths.iter().map(|r| r * r).sum();
        skeletons.insert(
            skeleton,
            SkeletonErl {
                total_length,
                run_lengths,
                squared_run_sum,
            },
        );
    }

    let ignored = totals.keys().filter(|s| !skeletons.contains_key(*s)).count();
    if ignored > 0 {
        debug!(ignored, "precomputed lengths for skeletons not in graph");
    }

    let total_length: f64 = skeletons.values().map(|s| s.total_length).sum();
    let numerator: f64 = skeletons.values().map(|s| s.squared_run_sum).sum();

    let erl = if total_length > 0.0 {
        numerator / total_length
    } else {
        warn!(skeletons = skeletons.len(), "total skeleton length is zero, ERL defined as 0");
        0.0
    };

    debug!(erl, total_length, "expected run length computed");
    Ok(ErlReport {
        skeletons,
        total_length,
        erl,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracescore_core::lookup::lookup_from_pairs;
    use tracescore_core::{ErrorCode, NodeId, PositionAxes};

    fn x_axis() -> PositionAxes {
        PositionAxes::new(["x"]).unwrap()
    }

    /// Straight skeleton 1 along x: nodes at 0, 1, 3, 6 (edge lengths 1, 2, 3).
    fn line() -> SkeletonGraph {
        let mut g = SkeletonGraph::new(x_axis());
        for (id, x) in [(1, 0.0), (2, 1.0), (3, 3.0), (4, 6.0)] {
            g.add_node(NodeId(id), SkeletonId(1), [x]).unwrap();
        }
        g.add_edge(NodeId(1), NodeId(2)).unwrap();
        g.add_edge(NodeId(2), NodeId(3)).unwrap();
        g.add_edge(NodeId(3), NodeId(4)).unwrap();
        g
    }

    #[test]
    fn perfect_line_erl_equals_length() {
        let mut g = line();
        let lut = lookup_from_pairs((1..=4).map(|n| (n, 1)));
        let erl =
            expected_run_length(&mut g, &lut, &LengthSource::Geometric(x_axis())).unwrap();
        assert!((erl - 6.0).abs() < 1e-12);
        assert!(g.has_cached_lengths());
    }

    #[test]
    fn split_decomposition() {
        let mut g = line();
        // split between node 2 and 3: runs 1 and 3 out of total 6
        let lut = lookup_from_pairs([(1, 1), (2, 1), (3, 2), (4, 2)]);
        let report = erl_report(
            &mut g,
            &lut,
            &LengthSource::Geometric(x_axis()),
            &Executor::Serial,
        )
        .unwrap();
        assert!((report.erl - (1.0 + 9.0) / 6.0).abs() < 1e-12);
        let s = &report.skeletons[&SkeletonId(1)];
        assert!((s.erl() - report.erl).abs() < 1e-12);
        assert_eq!(report.weight(SkeletonId(1)), Some(1.0));
    }

    #[test]
    fn empty_graph_is_zero() {
        let mut g = SkeletonGraph::new(x_axis());
        let lut = lookup_from_pairs([]);
        let erl = expected_run_length(&mut g, &lut, &LengthSource::Geometric(x_axis())).unwrap();
        assert_eq!(erl, 0.0);
    }

    #[test]
    fn zero_length_skeleton_is_zero() {
        let mut g = SkeletonGraph::new(x_axis());
        g.add_node(NodeId(1), SkeletonId(1), [2.0]).unwrap();
        g.add_node(NodeId(2), SkeletonId(1), [2.0]).unwrap();
        g.add_edge(NodeId(1), NodeId(2)).unwrap();
        let lut = lookup_from_pairs([(1, 1), (2, 1)]);
        let report = erl_report(
            &mut g,
            &lut,
            &LengthSource::Geometric(x_axis()),
            &Executor::Serial,
        )
        .unwrap();
        assert_eq!(report.erl, 0.0);
        assert_eq!(report.weight(SkeletonId(1)), None);
    }

    #[test]
    fn precomputed_requires_cache() {
        let mut g = line();
        let lut = lookup_from_pairs((1..=4).map(|n| (n, 1)));
        let totals = SkeletonLengths::from([(SkeletonId(1), 6.0)]);
        let err =
            expected_run_length(&mut g, &lut, &LengthSource::Precomputed(totals)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingEdgeLength);
    }

    #[test]
    fn precomputed_requires_every_skeleton_with_edges() {
        let mut g = line();
        crate::length::skeleton_lengths_cached(&mut g, &x_axis()).unwrap();
        let lut = lookup_from_pairs((1..=4).map(|n| (n, 1)));
        let totals = SkeletonLengths::from([(SkeletonId(9), 6.0)]);
        let err =
            expected_run_length(&mut g, &lut, &LengthSource::Precomputed(totals)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingSkeletonLength);
    }

    #[test]
    fn precomputed_totals_drive_denominator() {
        let mut g = line();
        crate::length::skeleton_lengths_cached(&mut g, &x_axis()).unwrap();
        let lut = lookup_from_pairs((1..=4).map(|n| (n, 1)));
        // a longer recorded total (e.g. from a finer trace) dilutes the ERL
        let totals = SkeletonLengths::from([(SkeletonId(1), 12.0)]);
        let erl = expected_run_length(&mut g, &lut, &LengthSource::Precomputed(totals)).unwrap();
        assert!((erl - 36.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn edgeless_skeleton_without_total_is_accepted() {
        let mut g = line();
        g.add_node(NodeId(10), SkeletonId(2), [100.0]).unwrap();
        crate::length::skeleton_lengths_cached(&mut g, &x_axis()).unwrap();
        let lut = lookup_from_pairs((1..=4).map(|n| (n, 1)));
        let totals = SkeletonLengths::from([(SkeletonId(1), 6.0)]);
        let report = erl_report(
            &mut g,
            &lut,
            &LengthSource::Precomputed(totals),
            &Executor::Serial,
        )
        .unwrap();
        assert!((report.erl - 6.0).abs() < 1e-12);
        assert_eq!(report.skeletons[&SkeletonId(2)].total_length, 0.0);
    }

    fn cached_line() -> SkeletonGraph {
        let mut g = line();
        crate::length::skeleton_lengths_cached(&mut g, &x_axis()).unwrap();
        g
    }

    fn precomputed_erl(total: f64) -> Result<f64> {
        let mut g = cached_line();
        let lut = lookup_from_pairs((1..=4).map(|n| (n, 1)));
        let totals = SkeletonLengths::from([(SkeletonId(1), total)]);
        expected_run_length(&mut g, &lut, &LengthSource::Precomputed(totals))
    }

    #[test]
    fn precomputed_nan_total_is_rejected() {
        let err = precomputed_erl(f64::NAN).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidSkeletonLength);
    }

    #[test]
    fn precomputed_negative_total_is_rejected() {
        let err = precomputed_erl(-6.0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidSkeletonLength);
        assert!(err.to_string().contains("skeleton:1"));
    }

    #[test]
    fn precomputed_infinite_total_is_rejected() {
        let err = precomputed_erl(f64::INFINITY).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidSkeletonLength);
    }

    #[test]
    fn precomputed_zero_total_is_accepted() {
        assert_eq!(precomputed_erl(0.0).unwrap(), 0.0);
    }

    #[test]
    fn precomputed_needs_lengths_of_non_correct_edges_too() {
        let mut g = line();
        // only edge 1-2 carries a length; 2-3 is a split below
        let first = g.find_edge(NodeId(1), NodeId(2)).unwrap();
        assert!(g.cache_edge_length(first, 1.0));
        let lut = lookup_from_pairs([(1, 1), (2, 1), (3, 2), (4, 2)]);
        let totals = SkeletonLengths::from([(SkeletonId(1), 6.0)]);
        let err =
            expected_run_length(&mut g, &lut, &LengthSource::Precomputed(totals)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingEdgeLength);
    }
}
