//! Packaging error types.
//!
//! [`BagError`] covers problems building a request and failures inside the
//! tar engine. Engine failures never escape the engine as `BagError`: they
//! are flattened into the [`EngineErrors`](crate::EngineErrors) map the
//! orchestrator surfaces line by line.

use std::path::PathBuf;

use bagsmith_core::CoreError;
use bagsmith_profile::ProfileError;
use thiserror::Error;

/// Errors raised while preparing or packaging a bag.
#[derive(Debug, Error)]
pub enum BagError {
    /// The request names no manifest algorithms.
    #[error("at least one manifest algorithm is required")]
    NoManifestAlgorithms,

    /// The request names no files to package.
    #[error("no files to bag")]
    NoFiles,

    /// A path to package cannot be accessed.
    #[error("error accessing {path}: {source}")]
    Access {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Two payload files map to the same path inside the bag.
    #[error("duplicate payload path {0}")]
    DuplicatePayloadPath(String),

    /// Walking a payload directory failed.
    #[error("failed to walk payload directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Writing the bag failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    /// Checksum or algorithm error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Profile loading or tag parsing error.
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

impl BagError {
    /// Wrap an I/O error with a short description of the failed step.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type alias for packaging operations.
pub type BagResult<T> = Result<T, BagError>;
