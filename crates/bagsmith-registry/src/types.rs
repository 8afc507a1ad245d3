//! Request and response types for the registry member API.
//!
//! Records are returned as raw JSON. The CLI prints them unchanged, and
//! the registry adds fields between API versions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// The record collections the member API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Intellectual objects (bags).
    Object,
    /// Generic files inside intellectual objects.
    File,
    /// Ingest, restore and deletion work items.
    WorkItem,
}

impl RecordKind {
    /// Path segment under `member-api/{version}/`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Object => "objects",
            Self::File => "files",
            Self::WorkItem => "items",
        }
    }

    /// Singular name as used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::File => "file",
            Self::WorkItem => "workitem",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = RegistryError;

    /// Accepts singular and plural forms, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "object" | "objects" => Ok(Self::Object),
            "file" | "files" => Ok(Self::File),
            "workitem" | "workitems" | "item" | "items" => Ok(Self::WorkItem),
            other => Err(RegistryError::InvalidRequest(format!(
                "unknown record type {other:?}: expected object, file, or workitem"
            ))),
        }
    }
}

/// How to find a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Numeric registry id.
    Id(u64),
    /// Record identifier, e.g. `test.edu/bag-name/data/file.txt`.
    Identifier(String),
}

impl Lookup {
    /// The `show/` path segment value.
    pub fn segment(&self) -> String {
        match self {
            Self::Id(id) => id.to_string(),
            Self::Identifier(identifier) => identifier.clone(),
        }
    }
}

impl FromStr for Lookup {
    type Err = RegistryError;

    /// Parses `id=<n>` or `identifier=<identifier>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            RegistryError::InvalidRequest(format!(
                "invalid lookup {s:?}: expected id=<number> or identifier=<identifier>"
            ))
        };
        let (key, value) = s.split_once('=').ok_or_else(invalid)?;
        let value = value.trim();
        if value.is_empty() {
            return Err(invalid());
        }
        match key.trim() {
            "id" => value.parse().map(Self::Id).map_err(|_| invalid()),
            "identifier" => Ok(Self::Identifier(value.to_string())),
            _ => Err(invalid()),
        }
    }
}

/// One page of a list query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    /// Total matching records across all pages.
    #[serde(default)]
    pub count: u64,
    /// URL of the next page.
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page.
    #[serde(default)]
    pub previous: Option<String>,
    /// Records on this page.
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

/// Parse `key=value` query parameters, preserving order.
pub fn parse_params<S: AsRef<str>>(raw: &[S]) -> Result<Vec<(String, String)>, RegistryError> {
    raw.iter()
        .map(AsRef::as_ref)
        .map(|p| match p.split_once('=') {
            Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
            _ => Err(RegistryError::InvalidRequest(format!(
                "invalid parameter {p:?}: expected key=value"
            ))),
        })
        .collect()
}
