//! # Pre-Flight Validation
//!
//! Checks a resolved tag set and a requested algorithm set against a profile.
//! Every check runs to completion so the caller sees all problems at once.
//!
//! ## Tag Rules
//!
//! Applied per declaration, in profile order:
//!
//! 1. **Presence**: a required tag with no override is missing. Stop.
//! 2. **Legal value**: an override whose value is not among the declared
//!    legal values is illegal. Stop.
//! 3. **Non-empty**: a required tag that does not allow empty values must
//!    carry a non-empty one.
//!
//! A stop ends the checks for that declaration only.
//!
//! After the declarations, every value that will be written is checked for
//! line breaks: the effective override of each tag, declared or not, and
//! the profile's own value for each declaration left unset.
//!
//! ## Algorithm Rules
//!
//! Every requested algorithm must be allowed, and every required algorithm
//! must be requested. The two checks are independent.

use crate::profile::{Profile, TagDeclaration};
use crate::tags::{find_tag, find_tag_index, has_line_break, TagOverride};

// ---------------------------------------------------------------------------
// Validation Report
// ---------------------------------------------------------------------------

/// Ordered violation messages. Empty means the request is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<String>,
}

impl ValidationReport {
    /// An empty (passing) report.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Whether no violations were found.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Whether the report holds no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Record a violation.
    pub fn add(&mut self, violation: String) {
        self.violations.push(violation);
    }

    /// Append another report's violations after this one's.
    pub fn merge(&mut self, other: ValidationReport) {
        self.violations.extend(other.violations);
    }

    /// The violations in order.
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// Consume the report, returning the violations.
    pub fn into_violations(self) -> Vec<String> {
        self.violations
    }
}

// ---------------------------------------------------------------------------
// Tag Validation
// ---------------------------------------------------------------------------

/// Validate resolved overrides against the profile's tag declarations.
pub fn validate_tags(profile: &Profile, resolved: &[TagOverride]) -> ValidationReport {
    let mut report = ValidationReport::ok();
    for decl in &profile.tags {
        if let Some(violation) = check_declaration(decl, find_tag(resolved, &decl.file, &decl.name)) {
            report.add(violation);
        }
    }

    let effective = resolved
        .iter()
        .enumerate()
        .filter(|(i, t)| find_tag_index(resolved, &t.file, &t.name) == Some(*i))
        .map(|(_, t)| (t.file.as_str(), t.name.as_str(), t.value.as_str()));
    let defaults = profile
        .tags
        .iter()
        .filter(|d| find_tag(resolved, &d.file, &d.name).is_none())
        .map(|d| (d.file.as_str(), d.name.as_str(), d.value()));
    for (file, name, value) in effective.chain(defaults) {
        if has_line_break(value) {
            report.add(format!("Tag {file}/{name} value must not contain line breaks."));
        }
    }
    report
}

fn check_declaration(decl: &TagDeclaration, tag: Option<&TagOverride>) -> Option<String> {
    let tag = match tag {
        Some(tag) => tag,
        None if decl.required => {
            return Some(format!("Required tag {}/{} is missing.", decl.file, decl.name));
        }
        None => return None,
    };

    if !decl.is_legal_value(&tag.value) {
        return Some(format!(
            "Tag {}/{} assigned illegal value '{}'. Valid values are: {}.",
            decl.file,
            decl.name,
            tag.value,
            decl.legal_values.join(",")
        ));
    }

    if decl.required && !decl.empty_allowed && tag.value.is_empty() {
        return Some(format!(
            "Tag {}/{} is present but value cannot be empty. Please assign a value.",
            decl.file, decl.name
        ));
    }

    None
}

// ---------------------------------------------------------------------------
// Algorithm Validation
// ---------------------------------------------------------------------------

/// Validate requested manifest algorithms against the profile.
///
/// Disallowed requests are reported first, in request order; then missing
/// required algorithms, in profile order.
pub fn validate_algorithms<S: AsRef<str>>(profile: &Profile, requested: &[S]) -> ValidationReport {
    let mut report = ValidationReport::ok();

    for alg in requested.iter().map(AsRef::as_ref) {
        if !profile.manifests_allowed.iter().any(|a| a == alg) {
            report.add(format!(
                "Manifest algorithm '{alg}' is not allowed in profile {}.",
                profile.name
            ));
        }
    }

    for required in &profile.manifests_required {
        if !requested.iter().any(|a| a.as_ref() == required) {
            report.add(format!(
                "Profile {} requires manifest algorithm {required}.",
                profile.name
            ));
        }
    }

    report
}
