//! # Tag Overrides
//!
//! User-supplied tag values and the single lookup rule every stage shares.
//!
//! Overrides arrive from the command line as `file/Name=Value`, or as bare
//! `Name=Value`, which targets `bag-info.txt`. Duplicates are allowed; the
//! earliest entry for a `(file, name)` pair is the one that counts.

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, ProfileResult};

/// The bag declaration file.
pub const BAGIT_TXT: &str = "bagit.txt";
/// The primary metadata file, default target of bare `Name=Value` tags.
pub const BAG_INFO_TXT: &str = "bag-info.txt";

/// `bagit.txt` version tag.
pub const BAGIT_VERSION: &str = "BagIt-Version";
/// `bagit.txt` encoding tag.
pub const TAG_FILE_CHARACTER_ENCODING: &str = "Tag-File-Character-Encoding";

/// A user-supplied value for one tag in one tag file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagOverride {
    /// Tag file the value belongs to, e.g. `aptrust-info.txt`.
    pub file: String,
    /// Tag name, e.g. `Title`.
    pub name: String,
    /// Raw value. May be empty.
    pub value: String,
}

impl TagOverride {
    /// Build an override from its parts.
    pub fn new(file: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parse `file/Name=Value` or `Name=Value`.
    ///
    /// The value is everything after the first `=` and is kept verbatim,
    /// so it may itself contain `=` or `/`. Line breaks are rejected since
    /// each tag occupies exactly one line of its tag file.
    pub fn parse(raw: &str) -> ProfileResult<Self> {
        let (key, value) = raw.split_once('=').ok_or_else(|| ProfileError::MalformedTag {
            raw: raw.to_string(),
            reason: "expected file/Name=Value or Name=Value".to_string(),
        })?;

        let (file, name) = match key.split_once('/') {
            Some((file, name)) => (file.trim(), name.trim()),
            None => (BAG_INFO_TXT, key.trim()),
        };

        if file.is_empty() {
            return Err(ProfileError::MalformedTag {
                raw: raw.to_string(),
                reason: "tag file name is empty".to_string(),
            });
        }
        if name.is_empty() {
            return Err(ProfileError::MalformedTag {
                raw: raw.to_string(),
                reason: "tag name is empty".to_string(),
            });
        }

        if has_line_break(value) {
            return Err(ProfileError::MalformedTag {
                raw: raw.to_string(),
                reason: "value must not contain line breaks".to_string(),
            });
        }

        Ok(Self::new(file, name, value))
    }

    /// Whether this override targets `(file, name)`.
    pub fn matches(&self, file: &str, name: &str) -> bool {
        self.file == file && self.name == name
    }
}

/// Whether `value` would spill onto a second tag file line.
pub fn has_line_break(value: &str) -> bool {
    value.contains(['\n', '\r'])
}

/// Parse every non-blank raw tag, failing on the first malformed one.
pub fn parse_all<S: AsRef<str>>(raw_tags: &[S]) -> ProfileResult<Vec<TagOverride>> {
    raw_tags
        .iter()
        .map(AsRef::as_ref)
        .filter(|raw| !raw.trim().is_empty())
        .map(TagOverride::parse)
        .collect()
}

/// Index of the earliest override matching `(file, name)`.
pub fn find_tag_index(tags: &[TagOverride], file: &str, name: &str) -> Option<usize> {
    tags.iter().position(|t| t.matches(file, name))
}

/// The earliest override matching `(file, name)`.
pub fn find_tag<'a>(tags: &'a [TagOverride], file: &str, name: &str) -> Option<&'a TagOverride> {
    find_tag_index(tags, file, name).map(|i| &tags[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_file() {
        let t = TagOverride::parse("aptrust-info.txt/Title=My Bag of Photos").unwrap();
        assert_eq!(t, TagOverride::new("aptrust-info.txt", "Title", "My Bag of Photos"));
    }

    #[test]
    fn parse_bare_name_defaults_to_bag_info() {
        let t = TagOverride::parse("Source-Organization=Faber College").unwrap();
        assert_eq!(t.file, BAG_INFO_TXT);
        assert_eq!(t.name, "Source-Organization");
        assert_eq!(t.value, "Faber College");
    }

    #[test]
    fn parse_keeps_equals_and_symbols_in_value() {
        let t = TagOverride::parse("Custom-Tag=a=b {contains} $weird &characters/x").unwrap();
        assert_eq!(t.name, "Custom-Tag");
        assert_eq!(t.value, "a=b {contains} $weird &characters/x");
    }

    #[test]
    fn parse_allows_empty_value() {
        let t = TagOverride::parse("bag-info.txt/Source-Organization=").unwrap();
        assert_eq!(t.value, "");
    }

    #[test]
    fn parse_rejects_missing_equals() {
        let err = TagOverride::parse("aptrust-info.txt/Title").unwrap_err();
        assert!(matches!(err, ProfileError::MalformedTag { .. }));
    }

    #[test]
    fn parse_rejects_empty_name() {
        assert!(TagOverride::parse("=value").is_err());
        assert!(TagOverride::parse("aptrust-info.txt/=value").is_err());
    }

    #[test]
    fn parse_rejects_empty_file() {
        assert!(TagOverride::parse("/Title=x").is_err());
    }

    #[test]
    fn parse_rejects_line_breaks_in_value() {
        for raw in ["Title=x\nAccess: Public", "Title=x\r", "aptrust-info.txt/Title=\r\nAccess: Public"] {
            let err = TagOverride::parse(raw).unwrap_err();
            assert!(
                matches!(&err, ProfileError::MalformedTag { reason, .. } if reason.contains("line breaks")),
                "{raw:?}: {err}"
            );
        }
    }

    #[test]
    fn parse_all_skips_blank_entries() {
        let tags = parse_all(&["", "Title=x", "  "]).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "Title");
    }

    #[test]
    fn find_tag_returns_earliest_match() {
        let tags = vec![
            TagOverride::new("bag-info.txt", "Source-Organization", "first"),
            TagOverride::new("aptrust-info.txt", "Source-Organization", "other file"),
            TagOverride::new("bag-info.txt", "Source-Organization", "second"),
        ];
        let found = find_tag(&tags, "bag-info.txt", "Source-Organization").unwrap();
        assert_eq!(found.value, "first");
        assert_eq!(find_tag_index(&tags, "bag-info.txt", "Source-Organization"), Some(0));
    }

    #[test]
    fn find_tag_is_case_sensitive() {
        let tags = vec![TagOverride::new("bag-info.txt", "title", "x")];
        assert!(find_tag(&tags, "bag-info.txt", "Title").is_none());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Whatever follows the first `=` is kept byte for byte.
            #[test]
            fn value_is_kept_verbatim(
                file in "[a-z][a-z-]{0,12}\\.txt",
                name in "[A-Za-z][A-Za-z-]{0,16}",
                value in "[ -~]{0,40}",
            ) {
                let t = TagOverride::parse(&format!("{file}/{name}={value}")).unwrap();
                prop_assert_eq!(t.file, file);
                prop_assert_eq!(t.name, name);
                prop_assert_eq!(t.value, value);
            }
        }
    }
}
