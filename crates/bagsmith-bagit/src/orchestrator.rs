//! # Packaging Orchestrator
//!
//! Drives one packaging request through pre-flight checks to a finished bag.
//! Each state is a distinct type and only valid transitions exist as
//! methods, so a request that has not passed validation cannot reach an
//! engine.
//!
//! ## Transitions
//!
//! ```text
//! IDLE ─resolve_tags()─▶ TAGS_RESOLVED ─validate()─┬─▶ VALIDATED ─apply_tags()─▶ PACKAGING ─run()─┬─▶ DONE
//!                                                   │                                              │
//!                                                   └─▶ REJECTED ◀─────────────────────────────────┘
//! ```
//!
//! A rejection from `validate()` happens before anything touches the output
//! directory. Each request owns its profile copy; applying tag values never
//! affects the caller's profile.

use std::fmt;
use std::path::{Path, PathBuf};

use bagsmith_core::ChecksumAlgorithm;
use bagsmith_profile::{
    apply_to_profile, resolve, validate_algorithms, validate_tags, Profile, TagOverride,
    ValidationReport,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::{EngineErrors, FileDescriptor, PackagingEngine, PackagingRequest};
use crate::error::{BagError, BagResult};

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Inputs captured, nothing resolved yet.
#[derive(Debug, Clone, Copy)]
pub struct Idle;

/// Default tags injected into the override set.
#[derive(Debug, Clone, Copy)]
pub struct TagsResolved;

/// Tags and algorithms satisfy the profile.
#[derive(Debug, Clone, Copy)]
pub struct Validated;

/// Resolved values applied to the request's profile copy.
#[derive(Debug, Clone, Copy)]
pub struct Packaging;

/// The engine wrote the bag. Terminal.
#[derive(Debug, Clone)]
pub struct Done {
    output_path: PathBuf,
}

/// The request was refused. Terminal.
#[derive(Debug, Clone)]
pub struct Rejected {
    rejection: Rejection,
}

/// Marker trait for orchestrator states. Sealed.
pub trait RequestState: private::Sealed + fmt::Debug {
    /// State name as it appears in logs and the transition history.
    fn name() -> &'static str;
    /// Whether no further transitions exist.
    fn is_terminal() -> bool {
        false
    }
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Idle {}
    impl Sealed for super::TagsResolved {}
    impl Sealed for super::Validated {}
    impl Sealed for super::Packaging {}
    impl Sealed for super::Done {}
    impl Sealed for super::Rejected {}
}

impl RequestState for Idle {
    fn name() -> &'static str {
        "IDLE"
    }
}
impl RequestState for TagsResolved {
    fn name() -> &'static str {
        "TAGS_RESOLVED"
    }
}
impl RequestState for Validated {
    fn name() -> &'static str {
        "VALIDATED"
    }
}
impl RequestState for Packaging {
    fn name() -> &'static str {
        "PACKAGING"
    }
}
impl RequestState for Done {
    fn name() -> &'static str {
        "DONE"
    }
    fn is_terminal() -> bool {
        true
    }
}
impl RequestState for Rejected {
    fn name() -> &'static str {
        "REJECTED"
    }
    fn is_terminal() -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Inputs and Outcomes
// ---------------------------------------------------------------------------

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BagInputs {
    /// Directory the bag is written into.
    pub output_dir: PathBuf,
    /// Files and directories to package.
    pub files: Vec<FileDescriptor>,
    /// User-supplied tag values, duplicates allowed.
    pub overrides: Vec<TagOverride>,
    /// Requested manifest algorithm names, as given.
    pub algorithms: Vec<String>,
}

/// Why a request ended in [`Rejected`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Pre-flight validation found violations. Nothing was written.
    Invalid(ValidationReport),
    /// The engine failed.
    EngineFailed(EngineErrors),
}

impl Rejection {
    /// One line per violation or engine error, in report order.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Invalid(report) => report.violations().to_vec(),
            Self::EngineFailed(errors) => errors.lines(),
        }
    }
}

/// Success record printed when a bag is finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagingRecord {
    /// Always `OK`.
    pub result: &'static str,
    /// Where the bag was written.
    pub output_path: String,
}

/// A single state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    /// State before the transition.
    pub from_state: &'static str,
    /// State after the transition.
    pub to_state: &'static str,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// The Request
// ---------------------------------------------------------------------------

/// A packaging request, parameterized by its current state.
#[derive(Debug)]
pub struct BagRequest<S: RequestState> {
    profile: Profile,
    inputs: BagInputs,
    resolved: Vec<TagOverride>,
    history: Vec<TransitionRecord>,
    state: S,
}

impl<S: RequestState> BagRequest<S> {
    /// Canonical name of the current state.
    pub fn state_name(&self) -> &'static str {
        S::name()
    }

    /// Whether the request is finished.
    pub fn is_terminal(&self) -> bool {
        S::is_terminal()
    }

    /// The request's own profile copy.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// The caller's inputs.
    pub fn inputs(&self) -> &BagInputs {
        &self.inputs
    }

    /// Resolved overrides. Empty before [`BagRequest::resolve_tags`].
    pub fn resolved_tags(&self) -> &[TagOverride] {
        &self.resolved
    }

    /// Every transition taken so far.
    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    fn transition<T: RequestState>(self, state: T) -> BagRequest<T> {
        tracing::info!(from = S::name(), to = T::name(), "bag request transition");
        let mut history = self.history;
        history.push(TransitionRecord {
            from_state: S::name(),
            to_state: T::name(),
            timestamp: Utc::now(),
        });
        BagRequest {
            profile: self.profile,
            inputs: self.inputs,
            resolved: self.resolved,
            history,
            state,
        }
    }

    fn reject(self, rejection: Rejection) -> BagRequest<Rejected> {
        self.transition(Rejected { rejection })
    }
}

impl BagRequest<Idle> {
    /// Capture a request against a copy of `profile`.
    ///
    /// Fails when no algorithms or no files are given; these are
    /// preconditions, not validation violations.
    pub fn new(profile: &Profile, inputs: BagInputs) -> BagResult<Self> {
        if inputs.algorithms.iter().all(|a| a.trim().is_empty()) {
            return Err(BagError::NoManifestAlgorithms);
        }
        if inputs.files.is_empty() {
            return Err(BagError::NoFiles);
        }
        Ok(Self {
            profile: profile.clone(),
            inputs,
            resolved: Vec::new(),
            history: Vec::new(),
            state: Idle,
        })
    }

    /// Inject default tags.
    ///
    /// Transitions: Idle → TagsResolved.
    pub fn resolve_tags(mut self) -> BagRequest<TagsResolved> {
        self.resolved = resolve(&self.inputs.overrides);
        tracing::debug!(
            output_dir = %self.inputs.output_dir.display(),
            profile = %self.profile.name,
            algorithms = %self.inputs.algorithms.join(", "),
            "bag request inputs"
        );
        for tag in &self.resolved {
            tracing::debug!(file = %tag.file, name = %tag.name, value = %tag.value, "tag value");
        }
        self.transition(TagsResolved)
    }
}

impl BagRequest<TagsResolved> {
    /// Check tags, then algorithms, against the profile.
    ///
    /// Transitions: TagsResolved → Validated, or → Rejected carrying every
    /// violation found.
    pub fn validate(self) -> Result<BagRequest<Validated>, BagRequest<Rejected>> {
        let mut report = validate_tags(&self.profile, &self.resolved);
        report.merge(validate_algorithms(&self.profile, &self.inputs.algorithms));
        if report.is_valid() {
            Ok(self.transition(Validated))
        } else {
            tracing::info!(violations = report.len(), "bag request failed validation");
            Err(self.reject(Rejection::Invalid(report)))
        }
    }
}

impl BagRequest<Validated> {
    /// Write resolved values into the request's profile copy.
    ///
    /// Transitions: Validated → Packaging.
    pub fn apply_tags(mut self) -> BagRequest<Packaging> {
        self.profile = apply_to_profile(&self.profile, &self.resolved);
        self.transition(Packaging)
    }

    /// Apply tags and run `engine`.
    pub fn package<E: PackagingEngine + ?Sized>(
        self,
        engine: &E,
    ) -> Result<BagRequest<Done>, BagRequest<Rejected>> {
        self.apply_tags().run(engine)
    }
}

impl BagRequest<Packaging> {
    /// Hand the request to `engine`.
    ///
    /// Transitions: Packaging → Done, or → Rejected with the engine's errors.
    pub fn run<E: PackagingEngine + ?Sized>(
        self,
        engine: &E,
    ) -> Result<BagRequest<Done>, BagRequest<Rejected>> {
        let parsed: Result<Vec<ChecksumAlgorithm>, _> = self
            .inputs
            .algorithms
            .iter()
            .map(|name| name.parse::<ChecksumAlgorithm>())
            .collect();
        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                let errors = EngineErrors::single("manifests", e);
                return Err(self.reject(Rejection::EngineFailed(errors)));
            }
        };
        let mut algorithms: Vec<ChecksumAlgorithm> = Vec::with_capacity(parsed.len());
        for alg in parsed {
            if !algorithms.contains(&alg) {
                algorithms.push(alg);
            }
        }

        let request = PackagingRequest {
            output_dir: &self.inputs.output_dir,
            profile: &self.profile,
            files: &self.inputs.files,
            algorithms: &algorithms,
        };
        match engine.package(&request) {
            Ok(output_path) => Ok(self.transition(Done { output_path })),
            Err(errors) => {
                tracing::info!(errors = errors.len(), "packaging engine failed");
                Err(self.reject(Rejection::EngineFailed(errors)))
            }
        }
    }
}

impl BagRequest<Done> {
    /// Where the bag was written.
    pub fn output_path(&self) -> &Path {
        &self.state.output_path
    }

    /// The success record.
    pub fn record(&self) -> PackagingRecord {
        PackagingRecord {
            result: "OK",
            output_path: self.state.output_path.to_string_lossy().into_owned(),
        }
    }
}

impl BagRequest<Rejected> {
    /// Why the request was refused.
    pub fn rejection(&self) -> &Rejection {
        &self.state.rejection
    }

    /// Whether the request was refused before packaging started.
    pub fn is_preflight(&self) -> bool {
        matches!(self.state.rejection, Rejection::Invalid(_))
    }

    /// One line per problem, in report order.
    pub fn lines(&self) -> Vec<String> {
        self.state.rejection.lines()
    }
}

/// Run a request from start to finish.
pub fn create_bag<E: PackagingEngine + ?Sized>(
    profile: &Profile,
    inputs: BagInputs,
    engine: &E,
) -> BagResult<Result<BagRequest<Done>, BagRequest<Rejected>>> {
    let validated = match BagRequest::new(profile, inputs)?.resolve_tags().validate() {
        Ok(validated) => validated,
        Err(rejected) => return Ok(Err(rejected)),
    };
    Ok(validated.package(engine))
}
