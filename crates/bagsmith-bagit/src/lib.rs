//! # bagsmith-bagit — Packaging
//!
//! Turns a validated request into a bag on disk.
//!
//! - **Engine contract** ([`engine`]): [`PackagingEngine`] takes an output
//!   directory, the profile with applied tag values, the files to package
//!   and the manifest algorithms, and returns the bag path or a map of
//!   named errors.
//! - **Tar engine** ([`bagger`]): [`TarBagger`] writes a BagIt bag as a tar
//!   file with payload and tag manifests.
//! - **Orchestrator** ([`orchestrator`]): the typestate machine
//!   `Idle → TagsResolved → Validated → Packaging → Done | Rejected`.
//!   Only a `BagRequest<Validated>` can reach an engine.
//!
//! ## Crate Policy
//!
//! - Validation failures are values ([`Rejection::Invalid`]), not errors.
//! - Engines never leave a partial bag behind.

pub mod bagger;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod tagfile;

pub use bagger::TarBagger;
pub use engine::{EngineErrors, FileDescriptor, PackagingEngine, PackagingRequest};
pub use error::{BagError, BagResult};
pub use orchestrator::{
    create_bag, BagInputs, BagRequest, Done, Idle, Packaging, PackagingRecord, Rejected,
    Rejection, RequestState, TagsResolved, Validated,
};
