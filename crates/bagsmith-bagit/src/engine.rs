//! # Packaging Engine Contract
//!
//! The orchestrator hands a validated request to a [`PackagingEngine`] and
//! treats it as opaque: it either returns the path of the finished bag or a
//! map of named errors. Engines are not retried.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use bagsmith_core::ChecksumAlgorithm;
use bagsmith_profile::Profile;

use crate::error::{BagError, BagResult};

// ---------------------------------------------------------------------------
// File Descriptors
// ---------------------------------------------------------------------------

/// A file or directory to package, with an absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Whether the path is a directory.
    pub is_dir: bool,
    /// Size in bytes as reported by the filesystem (0 for directories).
    pub size: u64,
}

impl FileDescriptor {
    /// Stat `path` and build a descriptor for it.
    ///
    /// Relative paths are resolved against the current directory.
    pub fn from_path(path: impl AsRef<Path>) -> BagResult<Self> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|source| BagError::Access {
                    path: path.to_path_buf(),
                    source,
                })?
                .join(path)
        };
        let meta = std::fs::metadata(&absolute).map_err(|source| BagError::Access {
            path: absolute.clone(),
            source,
        })?;
        Ok(Self {
            is_dir: meta.is_dir(),
            size: if meta.is_dir() { 0 } else { meta.len() },
            path: absolute,
        })
    }

    /// The final path component, used to name the bag.
    pub fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

// ---------------------------------------------------------------------------
// Engine Errors
// ---------------------------------------------------------------------------

/// Named errors reported by a failed engine run, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineErrors(BTreeMap<String, String>);

impl EngineErrors {
    /// An empty error map.
    pub fn new() -> Self {
        Self::default()
    }

    /// A map holding a single error.
    pub fn single(key: impl Into<String>, value: impl fmt::Display) -> Self {
        let mut errors = Self::new();
        errors.insert(key, value);
        errors
    }

    /// Record an error under `key`, replacing any earlier one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.0.insert(key.into(), value.to_string());
    }

    /// Whether no errors were recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The message recorded under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Iterate `(key, message)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// One `key : message` line per error.
    pub fn lines(&self) -> Vec<String> {
        self.iter().map(|(k, v)| format!("{k} : {v}")).collect()
    }
}

// ---------------------------------------------------------------------------
// Engine Trait
// ---------------------------------------------------------------------------

/// Everything an engine needs to write one bag.
#[derive(Debug, Clone, Copy)]
pub struct PackagingRequest<'a> {
    /// Directory the bag is written into.
    pub output_dir: &'a Path,
    /// Profile with resolved tag values applied.
    pub profile: &'a Profile,
    /// Files and directories to package.
    pub files: &'a [FileDescriptor],
    /// Manifest algorithms, used for both payload and tag manifests.
    pub algorithms: &'a [ChecksumAlgorithm],
}

/// An engine that serializes a bag.
pub trait PackagingEngine {
    /// Write the bag, returning its path.
    fn package(&self, request: &PackagingRequest<'_>) -> Result<PathBuf, EngineErrors>;
}

impl<E: PackagingEngine + ?Sized> PackagingEngine for &E {
    fn package(&self, request: &PackagingRequest<'_>) -> Result<PathBuf, EngineErrors> {
        (**self).package(request)
    }
}
