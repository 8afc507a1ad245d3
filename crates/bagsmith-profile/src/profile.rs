//! # Profile Model
//!
//! A [`Profile`] declares which manifest algorithms a bag may and must carry,
//! and which tags (metadata fields) each tag file holds. Profiles are plain
//! values: the orchestrator clones one per packaging run before writing
//! resolved tag values into it.

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, ProfileResult};

/// One tag a profile declares, with its constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDeclaration {
    /// Tag file the tag lives in.
    #[serde(rename = "tagFile")]
    pub file: String,
    /// Tag name.
    #[serde(rename = "tagName")]
    pub name: String,
    /// Whether an override must be supplied.
    #[serde(default)]
    pub required: bool,
    /// Whether a required tag may carry an empty value.
    #[serde(default, rename = "emptyOk")]
    pub empty_allowed: bool,
    /// Legal values. Empty means unconstrained.
    #[serde(default, rename = "values")]
    pub legal_values: Vec<String>,
    /// Value written when nothing else is assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Value assigned from a resolved override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_value: Option<String>,
}

impl TagDeclaration {
    /// An optional, unconstrained declaration.
    pub fn optional(file: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            name: name.into(),
            required: false,
            empty_allowed: true,
            legal_values: Vec::new(),
            default_value: None,
            user_value: None,
        }
    }

    /// A required declaration that must carry a non-empty value.
    pub fn required(file: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            required: true,
            empty_allowed: false,
            ..Self::optional(file, name)
        }
    }

    /// Restrict the declaration to the given legal values.
    pub fn with_legal_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.legal_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `value` satisfies the legal-value constraint.
    pub fn is_legal_value(&self, value: &str) -> bool {
        self.legal_values.is_empty() || self.legal_values.iter().any(|v| v == value)
    }

    /// The value to write: the assigned value, else the default, else empty.
    pub fn value(&self) -> &str {
        self.user_value
            .as_deref()
            .or(self.default_value.as_deref())
            .unwrap_or("")
    }

    /// Whether this declaration is `(file, name)`.
    pub fn matches(&self, file: &str, name: &str) -> bool {
        self.file == file && self.name == name
    }
}

/// A packaging profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Display name, used in violation messages.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Payload manifest algorithms the profile permits.
    #[serde(default)]
    pub manifests_allowed: Vec<String>,
    /// Payload manifest algorithms every bag must carry.
    #[serde(default)]
    pub manifests_required: Vec<String>,
    /// Tag manifest algorithms the profile permits.
    #[serde(default)]
    pub tag_manifests_allowed: Vec<String>,
    /// Tag manifest algorithms every bag must carry.
    #[serde(default)]
    pub tag_manifests_required: Vec<String>,
    /// BagIt versions the profile accepts.
    #[serde(default, rename = "acceptBagItVersion")]
    pub accept_bagit_version: Vec<String>,
    /// Tag declarations in profile order.
    #[serde(default)]
    pub tags: Vec<TagDeclaration>,
}

impl Profile {
    /// Parse a profile from JSON and check its consistency.
    pub fn from_json(name: &str, json: &str) -> ProfileResult<Self> {
        let profile: Profile = serde_json::from_str(json).map_err(|source| ProfileError::Parse {
            name: name.to_string(),
            source,
        })?;
        profile.check_consistency()?;
        Ok(profile)
    }

    /// Check that required algorithms are a subset of allowed ones.
    pub fn check_consistency(&self) -> ProfileResult<()> {
        for alg in &self.manifests_required {
            if !self.manifests_allowed.contains(alg) {
                return Err(ProfileError::InvalidProfile {
                    name: self.name.clone(),
                    detail: format!("required manifest algorithm {alg} is not in manifestsAllowed"),
                });
            }
        }
        for alg in &self.tag_manifests_required {
            if !self.tag_manifests_allowed.contains(alg) {
                return Err(ProfileError::InvalidProfile {
                    name: self.name.clone(),
                    detail: format!(
                        "required tag manifest algorithm {alg} is not in tagManifestsAllowed"
                    ),
                });
            }
        }
        Ok(())
    }

    /// The first declaration for `(file, name)`.
    pub fn find_declaration(&self, file: &str, name: &str) -> Option<&TagDeclaration> {
        self.tags.iter().find(|t| t.matches(file, name))
    }

    /// Assign `value` to the first declaration for `(file, name)`.
    ///
    /// A tag the profile does not declare is appended as an optional,
    /// unconstrained declaration carrying the value.
    pub fn set_tag_value(&mut self, file: &str, name: &str, value: &str) {
        match self.tags.iter_mut().find(|t| t.matches(file, name)) {
            Some(decl) => decl.user_value = Some(value.to_string()),
            None => {
                let mut decl = TagDeclaration::optional(file, name);
                decl.user_value = Some(value.to_string());
                self.tags.push(decl);
            }
        }
    }

    /// The written value for `(file, name)`, if the profile declares it.
    pub fn tag_value(&self, file: &str, name: &str) -> Option<&str> {
        self.find_declaration(file, name).map(TagDeclaration::value)
    }

    /// Distinct tag file names, in order of first declaration.
    pub fn tag_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = Vec::new();
        for decl in &self.tags {
            if !files.contains(&decl.file.as_str()) {
                files.push(&decl.file);
            }
        }
        files
    }

    /// Declarations belonging to `file`, in profile order.
    pub fn tags_in_file<'a>(&'a self, file: &'a str) -> impl Iterator<Item = &'a TagDeclaration> {
        self.tags.iter().filter(move |t| t.file == file)
    }
}
