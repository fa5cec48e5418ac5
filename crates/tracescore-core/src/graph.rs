//! Skeleton graph model.
//!
//! # Overview
//!
//! A [`SkeletonGraph`] holds any number of ground-truth skeletons in one
//! undirected [`petgraph`] graph. Every node carries its [`NodeId`], the
//! [`SkeletonId`] it belongs to and a [`Position`] whose components follow
//! the graph's [`PositionAxes`]. Every edge carries an optional cached
//! length.
//!
//! ## Invariants enforced on insertion
//!
//! - Node ids are unique.
//! - A node has exactly one coordinate per graph axis, all finite.
//! - Both endpoints of an edge exist and share a skeleton id.
//! - Parallel edges are collapsed (the graph is simple, self-loops allowed).
//!
//! Nodes and edges are never removed, so an [`EdgeIndex`] stays valid for
//! the lifetime of the graph. [`EdgeLengths`] relies on that to store one
//! length per edge in a dense vector.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::{
    graph::{EdgeIndex, NodeIndex, UnGraph},
    visit::EdgeRef,
};

use crate::error::{ConfigurationError, Result, ValidationError};
use crate::ids::{NodeId, SkeletonId};

/// Total geometric length per skeleton.
pub type SkeletonLengths = BTreeMap<SkeletonId, f64>;

// ---------------------------------------------------------------------------
// Axes and positions
// ---------------------------------------------------------------------------

/// Ordered, non-empty list of distinct axis names, e.g. `["z", "y", "x"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionAxes(Vec<String>);

impl PositionAxes {
    /// Build an axis list.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::EmptyPositionAxes`] if `names` is empty and
    /// [`ValidationError::DuplicatePositionAxis`] if a name repeats.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ConfigurationError::EmptyPositionAxes.into());
        }
        let mut seen = BTreeSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(ValidationError::DuplicatePositionAxis { axis: name.clone() }.into());
            }
        }
        Ok(Self(names))
    }

    /// Number of axes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Axis names in order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Index of `axis` within this list.
    #[must_use]
    pub fn index_of(&self, axis: &str) -> Option<usize> {
        self.0.iter().position(|name| name == axis)
    }

    /// Map every axis of `selection` to its component index in `self`.
    ///
    /// The returned indices follow the order of `selection`, so a caller can
    /// both subset and reorder the stored components.
    ///
    /// # Errors
    ///
    /// [`ValidationError::UnknownPositionAxis`] for the first axis of
    /// `selection` that `self` does not define.
    pub fn resolve(&self, selection: &Self) -> Result<Vec<usize>> {
        selection
            .0
            .iter()
            .map(|axis| {
                self.index_of(axis).ok_or_else(|| {
                    ValidationError::UnknownPositionAxis { axis: axis.clone() }.into()
                })
            })
            .collect()
    }
}

/// Node coordinates, one component per graph axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Position(Vec<f64>);

impl Position {
    /// Coordinate components in graph-axis order.
    #[must_use]
    pub fn components(&self) -> &[f64] {
        &self.0
    }

    /// Euclidean distance to `other` over the selected component indices,
    /// `None` if an index is out of range for either position.
    #[must_use]
    pub fn distance(&self, other: &Self, components: &[usize]) -> Option<f64> {
        components
            .iter()
            .map(|&i| {
                let d = self.0.get(i)? - other.0.get(i)?;
                Some(d * d)
            })
            .sum::<Option<f64>>()
            .map(f64::sqrt)
    }
}

// ---------------------------------------------------------------------------
// Nodes, edges
// ---------------------------------------------------------------------------

/// A traced sample point.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonNode {
    pub id: NodeId,
    pub skeleton: SkeletonId,
    pub position: Position,
}

/// Edge payload. The length is an opt-in cache filled by the length
/// calculator, `None` until then.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SkeletonEdge {
    pub length: Option<f64>,
}

/// Borrowed view of one edge and its endpoints.
#[derive(Debug, Clone, Copy)]
pub struct EdgeView<'a> {
    pub index: EdgeIndex,
    pub u: &'a SkeletonNode,
    pub v: &'a SkeletonNode,
    pub cached_length: Option<f64>,
}

impl EdgeView<'_> {
    /// Skeleton the edge belongs to (both endpoints agree by construction).
    #[must_use]
    pub fn skeleton(&self) -> SkeletonId {
        self.u.skeleton
    }
}

/// Dense per-edge lengths indexed by [`EdgeIndex`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdgeLengths(Vec<f64>);

impl EdgeLengths {
    /// Wrap a vector whose `i`-th entry is the length of edge `i`.
    #[must_use]
    pub fn from_vec(lengths: Vec<f64>) -> Self {
        Self(lengths)
    }

    /// Length of `edge`, or `None` if the index is out of range.
    #[must_use]
    pub fn get(&self, edge: EdgeIndex) -> Option<f64> {
        self.0.get(edge.index()).copied()
    }

    /// Number of edges covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when no edge lengths are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lengths in edge-index order.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// SkeletonGraph
// ---------------------------------------------------------------------------

/// A forest of ground-truth skeletons.
#[derive(Debug, Clone)]
pub struct SkeletonGraph {
    axes: PositionAxes,
    graph: UnGraph<SkeletonNode, SkeletonEdge>,
    node_map: HashMap<NodeId, NodeIndex>,
}

impl SkeletonGraph {
    /// Create an empty graph whose node positions follow `axes`.
    #[must_use]
    pub fn new(axes: PositionAxes) -> Self {
        Self {
            axes,
            graph: UnGraph::default(),
            node_map: HashMap::new(),
        }
    }

    /// Axes every node position is expressed in.
    #[must_use]
    pub fn axes(&self) -> &PositionAxes {
        &self.axes
    }

    /// Insert a node.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::DuplicateNode`] if `id` already exists.
    /// - [`ValidationError::DimensionMismatch`] if `coordinates` does not
    ///   have one entry per axis.
    /// - [`ValidationError::NonFiniteCoordinate`] on NaN or infinity.
    pub fn add_node(
        &mut self,
        id: NodeId,
        skeleton: SkeletonId,
        coordinates: impl Into<Vec<f64>>,
    ) -> Result<NodeIndex> {
        let coordinates = coordinates.into();
        if self.node_map.contains_key(&id) {
            return Err(ValidationError::DuplicateNode { node: id }.into());
        }
        if coordinates.len() != self.axes.len() {
            return Err(ValidationError::DimensionMismatch {
                node: id,
                expected: self.axes.len(),
                found: coordinates.len(),
            }
            .into());
        }
        if coordinates.iter().any(|c| !c.is_finite()) {
            return Err(ValidationError::NonFiniteCoordinate { node: id }.into());
        }

        let idx = self.graph.add_node(SkeletonNode {
            id,
            skeleton,
            position: Position(coordinates),
        });
        self.node_map.insert(id, idx);
        Ok(idx)
    }

    /// Connect two existing nodes of the same skeleton.
    ///
    /// Returns `false` if the edge already existed (nothing is added).
    ///
    /// # Errors
    ///
    /// - [`ValidationError::UnknownNode`] if either endpoint is missing.
    /// - [`ValidationError::CrossSkeletonEdge`] if the endpoints belong to
    ///   different skeletons.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId) -> Result<bool> {
        let ui = self.require(u)?;
        let vi = self.require(v)?;

        let u_skeleton = self.graph[ui].skeleton;
        let v_skeleton = self.graph[vi].skeleton;
        if u_skeleton != v_skeleton {
            return Err(ValidationError::CrossSkeletonEdge {
                u,
                v,
                u_skeleton,
                v_skeleton,
            }
            .into());
        }

        if self.graph.find_edge(ui, vi).is_some() {
            return Ok(false);
        }
        self.graph.add_edge(ui, vi, SkeletonEdge::default());
        Ok(true)
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&SkeletonNode> {
        self.node_map.get(&id).map(|&idx| &self.graph[idx])
    }

    /// Iterate nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &SkeletonNode> {
        self.graph.node_weights()
    }

    /// Iterate edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> {
        self.graph.edge_references().map(|e| EdgeView {
            index: e.id(),
            u: &self.graph[e.source()],
            v: &self.graph[e.target()],
            cached_length: e.weight().length,
        })
    }

    /// View of a single edge.
    #[must_use]
    pub fn edge(&self, index: EdgeIndex) -> Option<EdgeView<'_>> {
        let (a, b) = self.graph.edge_endpoints(index)?;
        Some(EdgeView {
            index,
            u: &self.graph[a],
            v: &self.graph[b],
            cached_length: self.graph.edge_weight(index)?.length,
        })
    }

    /// Find the edge between two node ids, in either direction.
    #[must_use]
    pub fn find_edge(&self, u: NodeId, v: NodeId) -> Option<EdgeIndex> {
        let ui = *self.node_map.get(&u)?;
        let vi = *self.node_map.get(&v)?;
        self.graph.find_edge(ui, vi)
    }

    /// Every skeleton id that owns at least one node, ascending.
    #[must_use]
    pub fn skeleton_ids(&self) -> BTreeSet<SkeletonId> {
        self.nodes().map(|n| n.skeleton).collect()
    }

    /// Edge indices grouped by skeleton.
    ///
    /// Every skeleton that owns a node gets an entry, edgeless ones an empty
    /// vector. Within a skeleton, edges keep insertion order.
    #[must_use]
    pub fn edges_by_skeleton(&self) -> BTreeMap<SkeletonId, Vec<EdgeIndex>> {
        let mut grouped: BTreeMap<SkeletonId, Vec<EdgeIndex>> = self
            .skeleton_ids()
            .into_iter()
            .map(|s| (s, Vec::new()))
            .collect();
        for edge in self.edges() {
            grouped.entry(edge.skeleton()).or_default().push(edge.index);
        }
        grouped
    }

    /// Edges belonging to one skeleton, in insertion order.
    pub fn edges_of(&self, skeleton: SkeletonId) -> impl Iterator<Item = EdgeView<'_>> {
        self.edges().filter(move |e| e.skeleton() == skeleton)
    }

    /// Store a computed length on an edge. Returns `false` for an unknown
    /// edge index.
    pub fn cache_edge_length(&mut self, edge: EdgeIndex, length: f64) -> bool {
        match self.graph.edge_weight_mut(edge) {
            Some(weight) => {
                weight.length = Some(length);
                true
            }
            None => false,
        }
    }

    /// Drop every cached edge length.
    pub fn clear_length_cache(&mut self) {
        for weight in self.graph.edge_weights_mut() {
            weight.length = None;
        }
    }

    /// `true` when every edge carries a cached length.
    #[must_use]
    pub fn has_cached_lengths(&self) -> bool {
        self.graph.edge_weights().all(|w| w.length.is_some())
    }

    /// Read the per-edge length cache.
    ///
    /// # Errors
    ///
    /// [`ValidationError::MissingEdgeLength`] for the first edge that has
    /// no cached length.
    pub fn cached_edge_lengths(&self) -> Result<EdgeLengths> {
        self.edges()
            .map(|e| {
                e.cached_length.ok_or_else(|| {
                    ValidationError::MissingEdgeLength {
                        u: e.u.id,
                        v: e.v.id,
                    }
                    .into()
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(EdgeLengths)
    }

    fn require(&self, id: NodeId) -> Result<NodeIndex> {
        self.node_map
            .get(&id)
            .copied()
            .ok_or_else(|| ValidationError::UnknownNode { node: id }.into())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
