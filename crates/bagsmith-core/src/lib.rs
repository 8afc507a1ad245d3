#![deny(missing_docs)]

//! # bagsmith-core — Foundational Types for bagsmith
//!
//! Every other crate in the workspace depends on this one. It has no internal
//! crate dependencies, only `serde`, `thiserror`, and the checksum crates
//! (`md-5`, `sha1`, `sha2`).
//!
//! - [`ChecksumAlgorithm`] names the manifest algorithms a bag may carry.
//! - [`MultiDigest`] hashes a byte stream once for every requested algorithm,
//!   so payload files are read a single time no matter how many manifests
//!   the bag gets.
//! - [`CoreError`] is the base of the error hierarchy.

pub mod digest;
pub mod error;

pub use digest::{ChecksumAlgorithm, MultiDigest};
pub use error::CoreError;

/// Name and version written into `Bagging-Software` of every bag.
pub const BAGGING_SOFTWARE: &str = concat!("bagsmith ", env!("CARGO_PKG_VERSION"));
