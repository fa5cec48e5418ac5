//! Node → predicted segment lookup.
//!
//! The host samples the predicted segmentation at every skeleton node and
//! hands the result over as a finite mapping. A node that is missing from
//! the mapping is *unassigned* (background, not detected); consumers treat
//! that as an ordinary outcome, never as an error.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::ids::{NodeId, SegmentId};

/// Read-only resolver from node identity to predicted segment.
///
/// `Sync` is required so one lookup can be shared across worker threads
/// during parallel classification.
pub trait SegmentLookup: Sync {
    /// Segment assigned to `node`, or `None` if unassigned.
    fn segment(&self, node: NodeId) -> Option<SegmentId>;
}

impl<S: BuildHasher + Sync> SegmentLookup for HashMap<NodeId, SegmentId, S> {
    fn segment(&self, node: NodeId) -> Option<SegmentId> {
        self.get(&node).copied()
    }
}

impl SegmentLookup for BTreeMap<NodeId, SegmentId> {
    fn segment(&self, node: NodeId) -> Option<SegmentId> {
        self.get(&node).copied()
    }
}

impl<L: SegmentLookup + ?Sized> SegmentLookup for &L {
    fn segment(&self, node: NodeId) -> Option<SegmentId> {
        (**self).segment(node)
    }
}

/// Build a `HashMap` lookup from raw `(node, segment)` pairs.
#[must_use]
pub fn lookup_from_pairs<I>(pairs: I) -> HashMap<NodeId, SegmentId>
where
    I: IntoIterator<Item = (u64, u64)>,
{
    pairs
        .into_iter()
        .map(|(node, segment)| (NodeId(node), SegmentId(segment)))
        .collect()
}
