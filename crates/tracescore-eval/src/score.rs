//! Per-skeleton edge scores.
//!
//! [`evaluate`] runs both classification passes and tallies every edge into
//! the [`Score`] of the skeleton it belongs to. For every skeleton,
//! `correct + split + merged + omitted` equals its edge count.

use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use petgraph::graph::EdgeIndex;
use serde::{Deserialize, Serialize};
use tracescore_core::{Result, SegmentLookup, SkeletonGraph, SkeletonId};
use tracing::{debug, instrument};

use crate::classify::{EdgeClass, SegmentMembership, classify_edge};
use crate::exec::Executor;

/// Edge tally for one skeleton (or a sum over several).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Score {
    pub correct: usize,
    pub split: usize,
    pub merged: usize,
    pub omitted: usize,
}

impl Score {
    /// Count one classified edge.
    pub fn record(&mut self, class: EdgeClass) {
        match class {
            EdgeClass::Correct => self.correct += 1,
            EdgeClass::Split => self.split += 1,
            EdgeClass::Merged => self.merged += 1,
            EdgeClass::Omitted => self.omitted += 1,
        }
    }

    /// Number of edges scored.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.correct + self.split + self.merged + self.omitted
    }

    /// Edges that are not correct.
    #[must_use]
    pub const fn errors(&self) -> usize {
        self.split + self.merged + self.omitted
    }

    /// Fraction of correct edges; `None` for a skeleton without edges.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.correct as f64 / total as f64)
    }
}

impl FromIterator<EdgeClass> for Score {
    fn from_iter<I: IntoIterator<Item = EdgeClass>>(iter: I) -> Self {
        let mut score = Self::default();
        for class in iter {
            score.record(class);
        }
        score
    }
}

impl AddAssign for Score {
    fn add_assign(&mut self, rhs: Self) {
        self.correct += rhs.correct;
        self.split += rhs.split;
        self.merged += rhs.merged;
        self.omitted += rhs.omitted;
    }
}

impl Add for Score {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl Sum for Score {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a Self> for Score {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Score every skeleton of `graph` against `lut` on the calling thread.
///
/// Every skeleton that owns a node appears in the result, edgeless ones with
/// an all-zero score.
#[must_use]
pub fn evaluate<L: SegmentLookup + ?Sized>(
    graph: &SkeletonGraph,
    lut: &L,
) -> BTreeMap<SkeletonId, Score> {
    let membership = SegmentMembership::build(graph, lut);
    graph
        .edges_by_skeleton()
        .into_iter()
        .map(|(skeleton, edges)| (skeleton, score_edges(graph, &edges, lut, &membership)))
        .collect()
}

/// Score every skeleton using `exec` for the classification pass.
///
/// The membership pass always completes before any skeleton is classified.
///
/// # Errors
///
/// Only executor failures are possible; classification itself cannot fail.
#[instrument(skip(graph, lut, exec), fields(edges = graph.edge_count(), parallel = exec.is_parallel()))]
pub fn evaluate_with<L: SegmentLookup + ?Sized>(
    graph: &SkeletonGraph,
    lut: &L,
    exec: &Executor,
) -> Result<BTreeMap<SkeletonId, Score>> {
    let membership = SegmentMembership::build(graph, lut);
    let groups = graph.edges_by_skeleton();
    let scores = exec.map_skeletons(&groups, |_, edges| {
        Ok(score_edges(graph, edges, lut, &membership))
    })?;
    debug!(skeletons = scores.len(), summary = ?summarize(&scores), "skeletons scored");
    Ok(scores)
}

fn score_edges<L: SegmentLookup + ?Sized>(
    graph: &SkeletonGraph,
    edges: &[EdgeIndex],
    lut: &L,
    membership: &SegmentMembership,
) -> Score {
    edges
        .iter()
        .filter_map(|&e| graph.edge(e))
        .map(|edge| classify_edge(&edge, lut, membership))
        .collect()
}

/// Sum of all per-skeleton scores.
#[must_use]
pub fn summarize(scores: &BTreeMap<SkeletonId, Score>) -> Score {
    scores.values().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_totals() {
        let score: Score = [
            EdgeClass::Correct,
            EdgeClass::Correct,
            EdgeClass::Split,
            EdgeClass::Omitted,
        ]
        .into_iter()
        .collect();
        assert_eq!(
            score,
            Score {
                correct: 2,
                split: 1,
                merged: 0,
                omitted: 1
            }
        );
        assert_eq!(score.total(), 4);
        assert_eq!(score.errors(), 2);
        assert!((score.accuracy().unwrap() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_score_has_no_accuracy() {
        assert_eq!(Score::default().accuracy(), None);
    }

    #[test]
    fn summing_scores() {
        let a = Score {
            correct: 1,
            split: 2,
            merged: 3,
            omitted: 4,
        };
        let b = Score {
            correct: 10,
            ..Score::default()
        };
        let mut map = BTreeMap::new();
        map.insert(SkeletonId(1), a);
        map.insert(SkeletonId(2), b);
        let total = summarize(&map);
        assert_eq!(total, a + b);
        assert_eq!(total.correct, 11);
        assert_eq!(total.total(), 20);
    }

    #[test]
    fn serializes_with_field_names() {
        let json = serde_json::to_value(Score {
            correct: 1,
            ..Score::default()
        })
        .unwrap();
        assert_eq!(json["correct"], 1);
        assert_eq!(json["omitted"], 0);
    }
}
