//! Edge classification against a predicted segmentation.
//!
//! # Algorithm
//!
//! Two passes over the graph:
//!
//! 1. **Membership** ([`SegmentMembership::build`]): for every node with an
//!    assigned segment, record the node's skeleton under that segment. A
//!    segment whose set holds more than one skeleton has merged distinct
//!    ground-truth structures.
//! 2. **Classification** ([`classify`]): every edge `(u, v)` is
//!
//!    | condition                                   | class     |
//!    |---------------------------------------------|-----------|
//!    | `u` or `v` unassigned                       | `Omitted` |
//!    | `segment(u) != segment(v)`                  | `Split`   |
//!    | shared segment also holds another skeleton  | `Merged`  |
//!    | otherwise                                   | `Correct` |
//!
//! Pass 2 only reads the membership built in pass 1, so it can be run per
//! skeleton on any number of threads once pass 1 is complete.

use std::collections::{BTreeSet, HashMap};

use petgraph::graph::EdgeIndex;
use serde::{Deserialize, Serialize};
use tracescore_core::{EdgeView, SegmentId, SegmentLookup, SkeletonGraph, SkeletonId};
use tracing::{debug, instrument};

/// Outcome for a single skeleton edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeClass {
    /// Both endpoints in the same segment, which belongs to this skeleton only.
    Correct,
    /// Endpoints in two different segments.
    Split,
    /// Endpoints share a segment that also contains another skeleton.
    Merged,
    /// At least one endpoint has no segment.
    Omitted,
}

impl EdgeClass {
    /// `true` only for [`EdgeClass::Correct`].
    #[must_use]
    pub const fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }
}

// ---------------------------------------------------------------------------
// Membership pass
// ---------------------------------------------------------------------------

/// For each predicted segment, the skeletons that have a node inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentMembership {
    members: HashMap<SegmentId, BTreeSet<SkeletonId>>,
}

impl SegmentMembership {
    /// Run the membership pass over every node of `graph`.
    #[must_use]
    #[instrument(skip(graph, lut), fields(nodes = graph.node_count()))]
    pub fn build<L: SegmentLookup + ?Sized>(graph: &SkeletonGraph, lut: &L) -> Self {
        let mut members: HashMap<SegmentId, BTreeSet<SkeletonId>> = HashMap::new();
        let mut unassigned = 0usize;
        for node in graph.nodes() {
            match lut.segment(node.id) {
                Some(segment) => {
                    members.entry(segment).or_default().insert(node.skeleton);
                }
                None => unassigned += 1,
            }
        }
        let membership = Self { members };
        debug!(
            segments = membership.segment_count(),
            merging = membership.merging_segments().count(),
            unassigned,
            "segment membership built"
        );
        membership
    }

    /// Skeletons that touch `segment`, if any.
    #[must_use]
    pub fn skeletons_in(&self, segment: SegmentId) -> Option<&BTreeSet<SkeletonId>> {
        self.members.get(&segment)
    }

    /// `true` when `segment` holds nodes of more than one skeleton.
    #[must_use]
    pub fn is_merging(&self, segment: SegmentId) -> bool {
        self.members.get(&segment).is_some_and(|s| s.len() > 1)
    }

    /// Number of distinct segments seen on skeleton nodes.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.members.len()
    }

    /// Segments that join more than one skeleton.
    pub fn merging_segments(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.members
            .iter()
            .filter(|(_, skeletons)| skeletons.len() > 1)
            .map(|(&segment, _)| segment)
    }
}

// ---------------------------------------------------------------------------
// Classification pass
// ---------------------------------------------------------------------------

/// Classify an edge from its endpoints' segments.
#[must_use]
pub fn classify(
    u: Option<SegmentId>,
    v: Option<SegmentId>,
    membership: &SegmentMembership,
) -> EdgeClass {
    match (u, v) {
        (Some(a), Some(b)) if a != b => EdgeClass::Split,
        (Some(a), Some(_)) if membership.is_merging(a) => EdgeClass::Merged,
        (Some(_), Some(_)) => EdgeClass::Correct,
        _ => EdgeClass::Omitted,
    }
}

/// Classify one edge of the graph.
#[must_use]
pub fn classify_edge<L: SegmentLookup + ?Sized>(
    edge: &EdgeView<'_>,
    lut: &L,
    membership: &SegmentMembership,
) -> EdgeClass {
    classify(lut.segment(edge.u.id), lut.segment(edge.v.id), membership)
}

/// Per-edge classes for a whole graph, indexed by [`EdgeIndex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeClassification {
    classes: Vec<EdgeClass>,
}

impl EdgeClassification {
    /// Class of `edge`.
    #[must_use]
    pub fn get(&self, edge: EdgeIndex) -> Option<EdgeClass> {
        self.classes.get(edge.index()).copied()
    }

    /// Classes in edge-index order.
    #[must_use]
    pub fn as_slice(&self) -> &[EdgeClass] {
        &self.classes
    }

    /// Number of edges in class `class`.
    #[must_use]
    pub fn count(&self, class: EdgeClass) -> usize {
        self.classes.iter().filter(|&&c| c == class).count()
    }
}

/// Classify every edge of `graph`.
#[must_use]
#[instrument(skip(graph, lut), fields(edges = graph.edge_count()))]
pub fn classify_edges<L: SegmentLookup + ?Sized>(
    graph: &SkeletonGraph,
    lut: &L,
) -> EdgeClassification {
    let membership = SegmentMembership::build(graph, lut);
    let classes = graph
        .edges()
        .map(|edge| classify_edge(&edge, lut, &membership))
        .collect();
    EdgeClassification { classes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracescore_core::lookup::lookup_from_pairs;
    use tracescore_core::{NodeId, PositionAxes};

    fn graph() -> SkeletonGraph {
        let mut g = SkeletonGraph::new(PositionAxes::new(["x"]).unwrap());
        for (id, skel) in [(1, 1), (2, 1), (3, 1), (4, 2), (5, 2)] {
            g.add_node(NodeId(id), SkeletonId(skel), [id as f64]).unwrap();
        }
        g.add_edge(NodeId(1), NodeId(2)).unwrap();
        g.add_edge(NodeId(2), NodeId(3)).unwrap();
        g.add_edge(NodeId(4), NodeId(5)).unwrap();
        g
    }

    #[test]
    fn rule_table() {
        let mut membership = SegmentMembership::default();
        membership
            .members
            .insert(SegmentId(1), BTreeSet::from([SkeletonId(1)]));
        membership
            .members
            .insert(SegmentId(2), BTreeSet::from([SkeletonId(1), SkeletonId(2)]));

        let s = |n| Some(SegmentId(n));
        assert_eq!(classify(None, s(1), &membership), EdgeClass::Omitted);
        assert_eq!(classify(s(1), None, &membership), EdgeClass::Omitted);
        assert_eq!(classify(None, None, &membership), EdgeClass::Omitted);
        assert_eq!(classify(s(1), s(2), &membership), EdgeClass::Split);
        assert_eq!(classify(s(2), s(2), &membership), EdgeClass::Merged);
        assert_eq!(classify(s(1), s(1), &membership), EdgeClass::Correct);
    }

    #[test]
    fn membership_records_skeletons_per_segment() {
        let g = graph();
        let lut = lookup_from_pairs([(1, 10), (2, 10), (3, 20), (4, 20)]);
        let m = SegmentMembership::build(&g, &lut);
        assert_eq!(m.segment_count(), 2);
        assert!(!m.is_merging(SegmentId(10)));
        assert!(m.is_merging(SegmentId(20)));
        assert_eq!(m.merging_segments().collect::<Vec<_>>(), vec![SegmentId(20)]);
        assert!(m.skeletons_in(SegmentId(99)).is_none());
    }

    #[test]
    fn classify_edges_per_index() {
        let g = graph();
        // 1-2 correct, 2-3 split, 4-5 omitted (5 unassigned)
        let lut = lookup_from_pairs([(1, 10), (2, 10), (3, 30), (4, 20)]);
        let classes = classify_edges(&g, &lut);
        assert_eq!(
            classes.as_slice(),
            &[EdgeClass::Correct, EdgeClass::Split, EdgeClass::Omitted]
        );
        let e = g.find_edge(NodeId(3), NodeId(2)).unwrap();
        assert_eq!(classes.get(e), Some(EdgeClass::Split));
        assert_eq!(classes.count(EdgeClass::Correct), 1);
    }

    #[test]
    fn shared_segment_across_skeletons_is_merged_even_when_split_elsewhere() {
        let g = graph();
        // segment 10 spans both skeletons, so 1-2 is merged; 4-5 is split.
        let lut = lookup_from_pairs([(1, 10), (2, 10), (3, 10), (4, 10), (5, 40)]);
        let classes = classify_edges(&g, &lut);
        assert_eq!(
            classes.as_slice(),
            &[EdgeClass::Merged, EdgeClass::Merged, EdgeClass::Split]
        );
    }
}
