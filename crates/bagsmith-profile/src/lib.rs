//! # bagsmith-profile — Profile-Driven Pre-Flight Checks
//!
//! Packaging a large directory can take hours. This crate decides, before any
//! of that work starts, whether a packaging request satisfies its profile.
//!
//! - **Profile model** ([`profile`]): allowed and required manifest
//!   algorithms plus the tag declarations a bag must honor.
//! - **Built-in profiles** ([`builtin`]): `aptrust`, `btr`, and `empty`,
//!   or any profile JSON file on disk.
//! - **Tag overrides** ([`tags`]): user-supplied `file/Name=Value` entries
//!   and the shared first-match lookup.
//! - **Resolver** ([`resolve`]): injects the two mandatory `bagit.txt` tags
//!   and applies resolved values to a copy of the profile.
//! - **Validation engine** ([`validation`]): a complete, ordered list of
//!   violations for tags and manifest algorithms.
//!
//! ## Lookup Rule
//!
//! Overrides may repeat a `(file, name)` pair. Every stage (defaulting,
//! validation, value application) resolves a pair to its earliest entry via
//! [`tags::find_tag`].

pub mod builtin;
pub mod error;
pub mod profile;
pub mod resolve;
pub mod tags;
pub mod validation;

pub use builtin::load_profile;
pub use error::{ProfileError, ProfileResult};
pub use profile::{Profile, TagDeclaration};
pub use resolve::{apply_to_profile, resolve};
pub use tags::{find_tag, TagOverride};
pub use validation::{validate_algorithms, validate_tags, ValidationReport};
