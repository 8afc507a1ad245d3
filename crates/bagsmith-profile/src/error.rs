//! Profile-specific error types.
//!
//! These are configuration and input errors. A request that merely violates
//! its profile is not an error: it yields a
//! [`ValidationReport`](crate::ValidationReport).

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading profiles or parsing tag overrides.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The identifier is neither a built-in profile nor an existing file.
    #[error("unknown profile {name:?}: expected aptrust, btr, empty, or a path to a profile JSON file")]
    UnknownProfile { name: String },

    /// The profile file could not be read.
    #[error("failed to read profile at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The profile document is not valid profile JSON.
    #[error("failed to parse profile {name}: {source}")]
    Parse {
        name: String,
        source: serde_json::Error,
    },

    /// The profile parsed but is not internally consistent.
    #[error("invalid profile {name}: {detail}")]
    InvalidProfile { name: String, detail: String },

    /// A tag override could not be parsed.
    #[error("malformed tag {raw:?}: {reason}")]
    MalformedTag { raw: String, reason: String },
}

/// Result type alias for profile operations.
pub type ProfileResult<T> = Result<T, ProfileError>;
