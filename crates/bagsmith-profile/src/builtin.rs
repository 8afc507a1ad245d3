//! # Profile Source
//!
//! Resolves a profile identifier to a [`Profile`]. The identifiers `aptrust`,
//! `btr`, and `empty` (any case) name profiles compiled into the binary;
//! anything else is read as a path to a profile JSON file.

use std::path::Path;

use crate::error::{ProfileError, ProfileResult};
use crate::profile::Profile;

const APTRUST_JSON: &str = include_str!("../profiles/aptrust.json");
const BTR_JSON: &str = include_str!("../profiles/btr.json");
const EMPTY_JSON: &str = include_str!("../profiles/empty.json");

/// Identifiers of the built-in profiles.
pub const BUILTIN_PROFILES: &[&str] = &["aptrust", "btr", "empty"];

fn builtin_json(identifier: &str) -> Option<&'static str> {
    match identifier.to_ascii_lowercase().as_str() {
        "aptrust" => Some(APTRUST_JSON),
        "btr" => Some(BTR_JSON),
        "empty" => Some(EMPTY_JSON),
        _ => None,
    }
}

/// Load a built-in profile by name, or a profile JSON file by path.
pub fn load_profile(identifier: &str) -> ProfileResult<Profile> {
    let identifier = identifier.trim();
    if let Some(json) = builtin_json(identifier) {
        tracing::debug!(profile = identifier, "loading built-in profile");
        return Profile::from_json(identifier, json);
    }

    let path = Path::new(identifier);
    if identifier.is_empty() || !path.is_file() {
        return Err(ProfileError::UnknownProfile {
            name: identifier.to_string(),
        });
    }

    tracing::debug!(path = %path.display(), "loading profile from file");
    let json = std::fs::read_to_string(path).map_err(|source| ProfileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Profile::from_json(identifier, &json)
}
