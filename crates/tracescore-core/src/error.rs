//! Error taxonomy for skeleton evaluation.
//!
//! Two families of failure exist:
//!
//! - [`ValidationError`]: the input graph or lookup is inconsistent (an axis
//!   that does not exist, an edge joining two skeletons, a length that was
//!   never cached). Fatal for the call that found it.
//! - [`ConfigurationError`]: the caller asked for an impossible combination
//!   of options, e.g. both or neither of the two ERL length sources.
//!
//! Both are wrapped by [`EvalError`], the error type of every fallible
//! operation in the workspace. A degenerate input (zero total skeleton
//! length) is *not* an error; the ERL calculator returns `0.0` for it.

use std::fmt;

use crate::ids::{NodeId, SkeletonId};

/// Machine-readable error codes for hosts that report evaluation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    UnknownPositionAxis,
    DuplicatePositionAxis,
    DimensionMismatch,
    NonFiniteCoordinate,
    UnknownNode,
    DuplicateNode,
    CrossSkeletonEdge,
    MissingEdgeLength,
    MissingSkeletonLength,
    InvalidSkeletonLength,
    DuplicateSkeletonLength,
    NoLengthSource,
    ConflictingLengthSources,
    EmptyPositionAxes,
    InvalidThreadCount,
    ThreadPoolUnavailable,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::UnknownPositionAxis => "E1001",
            Self::DuplicatePositionAxis => "E1002",
            Self::DimensionMismatch => "E1003",
            Self::NonFiniteCoordinate => "E1004",
            Self::UnknownNode => "E1101",
            Self::DuplicateNode => "E1102",
            Self::CrossSkeletonEdge => "E1103",
            Self::MissingEdgeLength => "E1201",
            Self::MissingSkeletonLength => "E1202",
            Self::InvalidSkeletonLength => "E1203",
            Self::DuplicateSkeletonLength => "E1204",
            Self::NoLengthSource => "E2001",
            Self::ConflictingLengthSources => "E2002",
            Self::EmptyPositionAxes => "E2003",
            Self::InvalidThreadCount => "E2004",
            Self::ThreadPoolUnavailable => "E2005",
        }
    }

    /// Short human-facing summary for logs.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::UnknownPositionAxis => "Position axis not present on graph nodes",
            Self::DuplicatePositionAxis => "Position axis listed twice",
            Self::DimensionMismatch => "Node coordinate count does not match graph axes",
            Self::NonFiniteCoordinate => "Node coordinate is NaN or infinite",
            Self::UnknownNode => "Edge references an unknown node",
            Self::DuplicateNode => "Node inserted twice",
            Self::CrossSkeletonEdge => "Edge joins nodes of different skeletons",
            Self::MissingEdgeLength => "Edge has no cached length",
            Self::MissingSkeletonLength => "Skeleton has no precomputed length",
            Self::InvalidSkeletonLength => "Precomputed skeleton length is negative or not finite",
            Self::DuplicateSkeletonLength => "Skeleton length listed twice",
            Self::NoLengthSource => "No length source configured",
            Self::ConflictingLengthSources => "Both length sources configured",
            Self::EmptyPositionAxes => "Position axis list is empty",
            Self::InvalidThreadCount => "Thread count is out of range",
            Self::ThreadPoolUnavailable => "Worker pool could not be started",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::UnknownPositionAxis => Some("Use axis names the graph was built with."),
            Self::MissingEdgeLength => {
                Some("Run skeleton_lengths_cached first or use a geometric length source.")
            }
            Self::MissingSkeletonLength => {
                Some("Supply a total length for every skeleton in the graph.")
            }
            Self::InvalidSkeletonLength => {
                Some("Precomputed totals must be finite and non-negative.")
            }
            Self::NoLengthSource | Self::ConflictingLengthSources => {
                Some("Set exactly one of `position_axes` or `skeletons` under [lengths].")
            }
            Self::CrossSkeletonEdge => Some("Edges must connect nodes of the same skeleton."),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The input graph, its axes or its cached data are inconsistent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("position axis `{axis}` is not defined on this graph")]
    UnknownPositionAxis { axis: String },

    #[error("position axis `{axis}` is listed more than once")]
    DuplicatePositionAxis { axis: String },

    #[error("{node} has {found} coordinates, graph expects {expected}")]
    DimensionMismatch {
        node: NodeId,
        expected: usize,
        found: usize,
    },

    #[error("{node} has a non-finite coordinate")]
    NonFiniteCoordinate { node: NodeId },

    #[error("{node} is not in the graph")]
    UnknownNode { node: NodeId },

    #[error("{node} was already added")]
    DuplicateNode { node: NodeId },

    #[error("edge ({u}, {v}) joins {u_skeleton} and {v_skeleton}")]
    CrossSkeletonEdge {
        u: NodeId,
        v: NodeId,
        u_skeleton: SkeletonId,
        v_skeleton: SkeletonId,
    },

    #[error("edge ({u}, {v}) has no cached length")]
    MissingEdgeLength { u: NodeId, v: NodeId },

    #[error("no precomputed length for {skeleton}")]
    MissingSkeletonLength { skeleton: SkeletonId },

    #[error("precomputed length {length} for {skeleton} is negative or not finite")]
    InvalidSkeletonLength { skeleton: SkeletonId, length: f64 },

    #[error("{skeleton} has more than one precomputed length")]
    DuplicateSkeletonLength { skeleton: SkeletonId },
}

impl ValidationError {
    /// Stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownPositionAxis { .. } => ErrorCode::UnknownPositionAxis,
            Self::DuplicatePositionAxis { .. } => ErrorCode::DuplicatePositionAxis,
            Self::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
            Self::NonFiniteCoordinate { .. } => ErrorCode::NonFiniteCoordinate,
            Self::UnknownNode { .. } => ErrorCode::UnknownNode,
            Self::DuplicateNode { .. } => ErrorCode::DuplicateNode,
            Self::CrossSkeletonEdge { .. } => ErrorCode::CrossSkeletonEdge,
            Self::MissingEdgeLength { .. } => ErrorCode::MissingEdgeLength,
            Self::MissingSkeletonLength { .. } => ErrorCode::MissingSkeletonLength,
            Self::InvalidSkeletonLength { .. } => ErrorCode::InvalidSkeletonLength,
            Self::DuplicateSkeletonLength { .. } => ErrorCode::DuplicateSkeletonLength,
        }
    }
}

/// The caller supplied an invalid combination of options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("neither position axes nor precomputed skeleton lengths were given")]
    NoLengthSource,

    #[error("position axes and precomputed skeleton lengths are mutually exclusive")]
    ConflictingLengthSources,

    #[error("position axis list is empty")]
    EmptyPositionAxes,

    #[error("thread count {0} exceeds the supported maximum")]
    InvalidThreadCount(usize),

    #[error("could not start a pool of {threads} worker threads")]
    ThreadPoolUnavailable { threads: usize },
}

impl ConfigurationError {
    /// Stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NoLengthSource => ErrorCode::NoLengthSource,
            Self::ConflictingLengthSources => ErrorCode::ConflictingLengthSources,
            Self::EmptyPositionAxes => ErrorCode::EmptyPositionAxes,
            Self::InvalidThreadCount(_) => ErrorCode::InvalidThreadCount,
            Self::ThreadPoolUnavailable { .. } => ErrorCode::ThreadPoolUnavailable,
        }
    }
}

/// Any failure surfaced by an evaluation call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl EvalError {
    /// Stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(e) => e.code(),
            Self::Configuration(e) => e.code(),
        }
    }
}

/// Result alias used by every fallible evaluation operation.
pub type Result<T, E = EvalError> = std::result::Result<T, E>;
