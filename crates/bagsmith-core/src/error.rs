//! # Error Hierarchy
//!
//! Base error type shared by the bagsmith crates, built with `thiserror`.

use thiserror::Error;

/// Errors raised by the foundational types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The algorithm name is not one bagsmith can compute.
    #[error("unsupported checksum algorithm \"{0}\" (supported: md5, sha1, sha256, sha512)")]
    UnsupportedAlgorithm(String),
}
