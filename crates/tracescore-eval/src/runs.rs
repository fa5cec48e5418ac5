//! Correct-edge runs.
//!
//! A *run* is a maximal connected piece of a skeleton that can be walked
//! using only correct edges. Its length is the sum of those edges' lengths.
//!
//! # Algorithm
//!
//! Per skeleton, one [`UnionFind`] over the nodes that touch a correct edge:
//!
//! 1. Classify each edge of the skeleton with the shared membership sets.
//! 2. Union the endpoints of every correct edge.
//! 3. Add each correct edge's length to the bucket of its root.
//!
//! Nodes without a correct edge never get a union-find slot, so they do not
//! produce zero-length runs. Runs are emitted in order of their root slot,
//! which follows the skeleton's edge insertion order; callers should treat
//! the result as a multiset.

use std::collections::{BTreeMap, HashMap};

use petgraph::{graph::EdgeIndex, unionfind::UnionFind};
use tracescore_core::{
    EdgeLengths, NodeId, Result, SegmentLookup, SkeletonGraph, SkeletonId, ValidationError,
};
use tracing::{debug, instrument};

use crate::classify::{SegmentMembership, classify_edge};
use crate::exec::Executor;

/// Run lengths of every skeleton.
pub type RunLengths = BTreeMap<SkeletonId, Vec<f64>>;

/// Run lengths per skeleton, computed on the calling thread.
///
/// # Errors
///
/// [`ValidationError::MissingEdgeLength`] if `lengths` has no entry for a
/// correct edge.
pub fn correct_run_lengths<L: SegmentLookup + ?Sized>(
    graph: &SkeletonGraph,
    lut: &L,
    lengths: &EdgeLengths,
) -> Result<RunLengths> {
    correct_run_lengths_with(graph, lut, lengths, &Executor::Serial)
}

/// Run lengths per skeleton, with per-skeleton union-find spread over `exec`.
///
/// # Errors
///
/// Same as [`correct_run_lengths`], plus executor failures.
#[instrument(skip(graph, lut, lengths, exec), fields(edges = graph.edge_count(), parallel = exec.is_parallel()))]
pub fn correct_run_lengths_with<L: SegmentLookup + ?Sized>(
    graph: &SkeletonGraph,
    lut: &L,
    lengths: &EdgeLengths,
    exec: &Executor,
) -> Result<RunLengths> {
    let membership = SegmentMembership::build(graph, lut);
    let groups = graph.edges_by_skeleton();
    let runs = exec.map_skeletons(&groups, |_, edges| {
        skeleton_runs(graph, edges, lut, &membership, lengths)
    })?;
    debug!(
        runs = runs.values().map(Vec::len).sum::<usize>(),
        "correct runs collected"
    );
    Ok(runs)
}

/// Runs of a single skeleton given its edges.
fn skeleton_runs<L: SegmentLookup + ?Sized>(
    graph: &SkeletonGraph,
    edges: &[EdgeIndex],
    lut: &L,
    membership: &SegmentMembership,
    lengths: &EdgeLengths,
) -> Result<Vec<f64>> {
    let mut slots: HashMap<NodeId, usize> = HashMap::new();
    let mut correct: Vec<(usize, usize, f64)> = Vec::new();

    for edge in edges.iter().filter_map(|&e| graph.edge(e)) {
        if !classify_edge(&edge, lut, membership).is_correct() {
            continue;
        }
        let length = lengths.get(edge.index).ok_or(ValidationError::MissingEdgeLength {
            u: edge.u.id,
            v: edge.v.id,
        })?;
        let next = slots.len();
        let a = *slots.entry(edge.u.id).or_insert(next);
        let next = slots.len();
        let b = *slots.entry(edge.v.id).or_insert(next);
        correct.push((a, b, length));
    }

    if correct.is_empty() {
        return Ok(Vec::new());
    }

    let mut sets = UnionFind::<usize>::new(slots.len());
    for &(a, b, _) in &correct {
        sets.union(a, b);
    }

    let mut buckets: Vec<Option<f64>> = vec![None; slots.len()];
    for &(a, _, length) in &correct {
        let root = sets.find_mut(a);
        *buckets[root].get_or_insert(0.0) += length;
    }

    Ok(buckets.into_iter().flatten().collect())
}
