#![forbid(unsafe_code)]
//! tracescore-core: the data model shared by the skeleton evaluators.
//!
//! # Conventions
//!
//! - **Errors**: computation returns [`error::Result`] with a typed
//!   [`error::EvalError`]; file loading returns `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod graph;
pub mod ids;
pub mod lookup;

pub use config::{EvaluationConfig, ExecutionConfig, LengthSource, LengthSourceConfig};
pub use error::{ConfigurationError, ErrorCode, EvalError, Result, ValidationError};
pub use graph::{EdgeLengths, EdgeView, PositionAxes, SkeletonGraph, SkeletonLengths, SkeletonNode};
pub use ids::{NodeId, SegmentId, SkeletonId};
pub use lookup::SegmentLookup;
