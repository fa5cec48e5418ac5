//! Geometric skeleton lengths.
//!
//! An edge's length is the Euclidean distance between its endpoints over a
//! caller-chosen list of axes; a skeleton's length is the sum over its
//! edges. [`edge_lengths`] and [`skeleton_lengths`] are pure.
//! [`skeleton_lengths_cached`] additionally stores every edge length on the
//! graph, so later calls (e.g. ERL with precomputed totals) can read it back
//! through [`SkeletonGraph::cached_edge_lengths`].

use petgraph::graph::EdgeIndex;
use tracescore_core::{
    EdgeLengths, PositionAxes, Result, SkeletonGraph, SkeletonLengths, ValidationError,
};
use tracing::{debug, instrument};

/// Length of every edge, indexed by edge.
///
/// # Errors
///
/// [`tracescore_core::ValidationError::UnknownPositionAxis`] if `axes`
/// names an axis the graph does not carry.
#[instrument(skip(graph, axes), fields(edges = graph.edge_count(), axes = ?axes.names()))]
pub fn edge_lengths(graph: &SkeletonGraph, axes: &PositionAxes) -> Result<EdgeLengths> {
    let components = graph.axes().resolve(axes)?;
    let lengths = graph
        .edges()
        .map(|e| {
            e.u.position
                .distance(&e.v.position, &components)
                .ok_or_else(|| {
                    ValidationError::DimensionMismatch {
                        node: e.u.id,
                        expected: graph.axes().len(),
                        found: e.u.position.components().len(),
                    }
                    .into()
                })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(EdgeLengths::from_vec(lengths))
}

/// Sum edge lengths per skeleton.
///
/// Every skeleton that owns a node gets an entry; edgeless skeletons have
/// length `0.0`. Edges missing from `lengths` contribute nothing.
#[must_use]
pub fn totals_from_edge_lengths(graph: &SkeletonGraph, lengths: &EdgeLengths) -> SkeletonLengths {
    graph
        .edges_by_skeleton()
        .into_iter()
        .map(|(skeleton, edges)| (skeleton, sum_lengths(&edges, lengths)))
        .collect()
}

/// Total length of every skeleton.
///
/// # Errors
///
/// Same as [`edge_lengths`].
pub fn skeleton_lengths(graph: &SkeletonGraph, axes: &PositionAxes) -> Result<SkeletonLengths> {
    let lengths = edge_lengths(graph, axes)?;
    Ok(totals_from_edge_lengths(graph, &lengths))
}

/// Total length of every skeleton, caching each edge length on the graph.
///
/// The cache is written only after every length has been computed, so a
/// failing call leaves the graph untouched.
///
/// # Errors
///
/// Same as [`edge_lengths`].
pub fn skeleton_lengths_cached(
    graph: &mut SkeletonGraph,
    axes: &PositionAxes,
) -> Result<SkeletonLengths> {
    let lengths = edge_lengths(graph, axes)?;
    let indices: Vec<EdgeIndex> = graph.edges().map(|e| e.index).collect();
    for (index, &length) in indices.into_iter().zip(lengths.as_slice()) {
        graph.cache_edge_length(index, length);
    }
    debug!(edges = lengths.len(), "edge lengths cached");
    Ok(totals_from_edge_lengths(graph, &lengths))
}

fn sum_lengths(edges: &[EdgeIndex], lengths: &EdgeLengths) -> f64 {
    edges.iter().filter_map(|&e| lengths.get(e)).sum()
}
