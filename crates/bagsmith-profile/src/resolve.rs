//! # Tag Resolution
//!
//! Turns raw overrides into the final tag set handed to validation and
//! packaging. Two `bagit.txt` tags are mandatory in every bag; when the user
//! leaves them out or blank they receive their standard values here.

use crate::profile::Profile;
use crate::tags::{find_tag_index, TagOverride, BAGIT_TXT, BAGIT_VERSION, TAG_FILE_CHARACTER_ENCODING};

/// Value injected for `bagit.txt/BagIt-Version`.
pub const DEFAULT_BAGIT_VERSION: &str = "1.0";
/// Value injected for `bagit.txt/Tag-File-Character-Encoding`.
pub const DEFAULT_TAG_FILE_ENCODING: &str = "UTF-8";

/// Resolve overrides into the final tag set.
///
/// The input is not modified. A missing mandatory tag is appended; a present
/// but empty one has its value filled in place, keeping its position.
/// Resolving an already resolved set returns it unchanged.
pub fn resolve(overrides: &[TagOverride]) -> Vec<TagOverride> {
    let mut resolved = overrides.to_vec();
    ensure_default(&mut resolved, BAGIT_TXT, BAGIT_VERSION, DEFAULT_BAGIT_VERSION);
    ensure_default(
        &mut resolved,
        BAGIT_TXT,
        TAG_FILE_CHARACTER_ENCODING,
        DEFAULT_TAG_FILE_ENCODING,
    );
    resolved
}

fn ensure_default(tags: &mut Vec<TagOverride>, file: &str, name: &str, default: &str) {
    match find_tag_index(tags, file, name) {
        None => {
            tracing::debug!(file, name, value = default, "injecting default tag");
            tags.push(TagOverride::new(file, name, default));
        }
        Some(i) if tags[i].value.is_empty() => {
            tracing::debug!(file, name, value = default, "filling empty default tag");
            tags[i].value = default.to_string();
        }
        Some(_) => {}
    }
}

/// Copy `profile` and write the resolved values into the copy.
///
/// Only the first override of each `(file, name)` is applied; later
/// duplicates are ignored, matching what validation saw.
pub fn apply_to_profile(profile: &Profile, resolved: &[TagOverride]) -> Profile {
    let mut applied = profile.clone();
    for (i, tag) in resolved.iter().enumerate() {
        if find_tag_index(resolved, &tag.file, &tag.name) != Some(i) {
            tracing::debug!(file = %tag.file, name = %tag.name, "skipping duplicate tag");
            continue;
        }
        applied.set_tag_value(&tag.file, &tag.name, &tag.value);
    }
    applied
}
