//! # Tag Files and Manifests
//!
//! Text rendering for everything in a bag that is not payload: `Name: Value`
//! tag files and `<digest>  <path>` manifests.

use std::collections::BTreeMap;

use bagsmith_profile::tags::{BAGIT_TXT, BAG_INFO_TXT};
use bagsmith_profile::Profile;

/// `bag-info.txt` tag recording payload size as `<bytes>.<file count>`.
pub const PAYLOAD_OXUM: &str = "Payload-Oxum";
/// `bag-info.txt` tag recording the packaging date.
pub const BAGGING_DATE: &str = "Bagging-Date";
/// `bag-info.txt` tag recording the packaging software.
pub const BAGGING_SOFTWARE: &str = "Bagging-Software";

/// Render a Payload-Oxum value.
pub fn payload_oxum(total_bytes: u64, file_count: usize) -> String {
    format!("{total_bytes}.{file_count}")
}

/// Tag files to write, `bagit.txt` and `bag-info.txt` first, then the rest
/// in declaration order.
pub fn tag_file_order(profile: &Profile) -> Vec<&str> {
    let mut files = vec![BAGIT_TXT, BAG_INFO_TXT];
    for file in profile.tag_files() {
        if !files.contains(&file) {
            files.push(file);
        }
    }
    files
}

/// Render one tag file from the profile's declarations.
///
/// Optional tags without a value are left out.
pub fn render_tag_file(profile: &Profile, file: &str) -> String {
    let mut out = String::new();
    for decl in profile.tags_in_file(file) {
        let value = decl.value();
        if value.is_empty() && !decl.required {
            continue;
        }
        out.push_str(&decl.name);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
    out
}

/// Render a manifest from `path -> hex digest` entries, sorted by path.
pub fn render_manifest(entries: &BTreeMap<String, String>) -> String {
    entries
        .iter()
        .map(|(path, digest)| format!("{digest}  {path}\n"))
        .collect()
}
