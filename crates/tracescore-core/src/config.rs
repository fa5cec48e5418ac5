//! Evaluation configuration.
//!
//! Loaded from TOML. Every section is optional; a missing file yields the
//! defaults (no length source, serial execution).
//!
//! ```toml
//! [lengths]
//! position_axes = ["z", "y", "x"]
//!
//! [execution]
//! parallel = true
//! threads = 8
//! ```
//!
//! Instead of `position_axes`, precomputed totals can be listed:
//!
//! ```toml
//! [[lengths.skeletons]]
//! id = 1
//! length = 2.8284
//! ```
//!
//! Exactly one of the two must be present when the configuration is turned
//! into a [`LengthSource`].

use std::path::Path;

use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, Result, ValidationError};
use crate::graph::{PositionAxes, SkeletonLengths};
use crate::ids::SkeletonId;

/// Upper bound accepted for `execution.threads`.
pub const MAX_THREADS: usize = 1024;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default)]
    pub lengths: LengthSourceConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl EvaluationConfig {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this schema.
    pub fn from_toml_str(content: &str) -> AnyResult<Self> {
        toml::from_str::<Self>(content).context("Failed to parse evaluation config")
    }
}

/// Where the ERL calculator takes skeleton lengths from, as written in a
/// configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LengthSourceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_axes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeletons: Option<Vec<SkeletonLengthEntry>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkeletonLengthEntry {
    pub id: SkeletonId,
    pub length: f64,
}

impl LengthSourceConfig {
    /// Turn the two optional settings into a single [`LengthSource`].
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::NoLengthSource`] if neither is set.
    /// - [`ConfigurationError::ConflictingLengthSources`] if both are set.
    /// - Axis-list errors from [`PositionAxes::new`].
    /// - [`ValidationError::DuplicateSkeletonLength`] if a skeleton is listed
    ///   twice.
    /// - [`ValidationError::InvalidSkeletonLength`] for a negative or
    ///   non-finite length.
    pub fn resolve(&self) -> Result<LengthSource> {
        match (&self.position_axes, &self.skeletons) {
            (Some(_), Some(_)) => Err(ConfigurationError::ConflictingLengthSources.into()),
            (None, None) => Err(ConfigurationError::NoLengthSource.into()),
            (Some(axes), None) => Ok(LengthSource::Geometric(PositionAxes::new(
                axes.iter().cloned(),
            )?)),
            (None, Some(entries)) => {
                let mut totals = SkeletonLengths::new();
                for entry in entries {
                    if !entry.length.is_finite() || entry.length < 0.0 {
                        return Err(ValidationError::InvalidSkeletonLength {
                            skeleton: entry.id,
                            length: entry.length,
                        }
                        .into());
                    }
                    if totals.insert(entry.id, entry.length).is_some() {
                        return Err(ValidationError::DuplicateSkeletonLength { skeleton: entry.id }
                            .into());
                    }
                }
                Ok(LengthSource::Precomputed(totals))
            }
        }
    }
}

/// How the ERL calculator obtains per-skeleton total lengths.
#[derive(Debug, Clone, PartialEq)]
pub enum LengthSource {
    /// Compute edge lengths from node positions over these axes and cache
    /// them on the graph.
    Geometric(PositionAxes),
    /// Totals supplied by the caller. Each must be finite and non-negative.
    ///
    /// Every edge of the graph needs a cached length, not only the correct
    /// ones: the ERL calculator reads the whole cache before classifying,
    /// so a gap anywhere is a `MissingEdgeLength` error.
    Precomputed(SkeletonLengths),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Run classification and run analysis on a rayon pool. Ignored unless
    /// the evaluator is built with its `parallel` feature.
    #[serde(default)]
    pub parallel: bool,
    /// Worker threads; `0` lets rayon decide.
    #[serde(default)]
    pub threads: usize,
}

impl ExecutionConfig {
    /// Check the thread count is within range.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::InvalidThreadCount`] above [`MAX_THREADS`].
    pub const fn validate(&self) -> Result<(), ConfigurationError> {
        if self.threads > MAX_THREADS {
            return Err(ConfigurationError::InvalidThreadCount(self.threads));
        }
        Ok(())
    }
}

/// Load a configuration file. A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> AnyResult<EvaluationConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no evaluation config, using defaults");
        return Ok(EvaluationConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<EvaluationConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}
