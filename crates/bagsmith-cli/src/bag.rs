//! # Bag Subcommand
//!
//! `bagsmith bag create` packages a directory under a profile. Every
//! violation is printed before the process exits, and nothing is written to
//! the output directory unless the request passes pre-flight validation.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use bagsmith_bagit::{create_bag, BagError, BagInputs, FileDescriptor, TarBagger};
use bagsmith_profile::{load_profile, resolve, tags::parse_all, validate_algorithms, validate_tags};

use crate::exit_codes;
use crate::print_errors;

/// Arguments for the `bagsmith bag` subcommand.
#[derive(Args, Debug)]
pub struct BagArgs {
    #[command(subcommand)]
    pub command: BagCommand,
}

/// Bag subcommands.
#[derive(Subcommand, Debug)]
pub enum BagCommand {
    /// Create a bag from a directory after validating tags and algorithms.
    Create(CreateArgs),
}

/// Flags for `bag create`.
///
/// All flags are optional at parse time so that a missing one is reported
/// with the user-error exit code rather than clap's usage error.
#[derive(Args, Debug, Default)]
pub struct CreateArgs {
    /// Profile: aptrust, btr, empty, or a path to a profile JSON file.
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Directory (or file) to bag.
    #[arg(short, long)]
    pub bag_dir: Option<PathBuf>,

    /// Directory the bag is written into.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Comma-separated manifest algorithms, e.g. md5,sha256.
    #[arg(short, long, value_delimiter = ',')]
    pub manifest_algs: Vec<String>,

    /// Tag value as file/Name=Value, or Name=Value for bag-info.txt. Repeatable.
    #[arg(short, long)]
    pub tags: Vec<String>,
}

/// Execute the bag subcommand.
pub fn run_bag(args: &BagArgs) -> Result<u8> {
    match &args.command {
        BagCommand::Create(create) => Ok(run_create(create)),
    }
}

fn require<'a, T>(value: Option<&'a T>, flag: &str) -> Option<&'a T>
where
    T: ?Sized,
{
    if value.is_none() {
        eprintln!("Flag --{flag} is required.");
    }
    value
}

/// Create a bag and return the process exit code.
pub fn run_create(args: &CreateArgs) -> u8 {
    let profile_name = require(args.profile.as_deref(), "profile");
    let bag_dir = require(args.bag_dir.as_deref(), "bag-dir");
    let output_dir = require(args.output_dir.as_deref(), "output-dir");
    let (Some(profile_name), Some(bag_dir), Some(output_dir)) = (profile_name, bag_dir, output_dir)
    else {
        return exit_codes::USER_ERROR;
    };

    let algorithms: Vec<String> = args
        .manifest_algs
        .iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    if algorithms.is_empty() {
        eprintln!(
            "You must specify at least one manifest algorithm. See `bagsmith bag create --help`."
        );
        return exit_codes::USER_ERROR;
    }

    tracing::debug!(bag_dir = %bag_dir.display(), "directory to bag");
    tracing::debug!(output_dir = %output_dir.display(), "output directory");
    tracing::debug!(profile = profile_name, "profile");
    tracing::debug!(algorithms = ?algorithms, "manifest algorithms");

    let profile = match load_profile(profile_name) {
        Ok(profile) => profile,
        Err(e) => {
            eprintln!("Error loading profile {profile_name}: {e}");
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let overrides = match parse_all(&args.tags) {
        Ok(overrides) => overrides,
        Err(e) => {
            eprintln!("{e}");
            return exit_codes::USER_ERROR;
        }
    };

    let mut report = validate_tags(&profile, &resolve(&overrides));
    report.merge(validate_algorithms(&profile, &algorithms));
    if !report.is_valid() {
        print_errors(report.violations());
        return exit_codes::USER_ERROR;
    }

    let descriptor = match FileDescriptor::from_path(bag_dir) {
        Ok(fd) => fd,
        Err(e) => {
            eprintln!("{e}");
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let inputs = BagInputs {
        output_dir: output_dir.to_path_buf(),
        files: vec![descriptor],
        overrides,
        algorithms,
    };

    match create_bag(&profile, inputs, &TarBagger::new()) {
        Ok(Ok(done)) => match serde_json::to_string(&done.record()) {
            Ok(line) => {
                println!("{line}");
                exit_codes::OK
            }
            Err(e) => {
                eprintln!("failed to serialize result: {e}");
                exit_codes::RUNTIME_ERROR
            }
        },
        Ok(Err(rejected)) => {
            print_errors(&rejected.lines());
            if rejected.is_preflight() {
                exit_codes::USER_ERROR
            } else {
                exit_codes::RUNTIME_ERROR
            }
        }
        Err(e @ (BagError::NoManifestAlgorithms | BagError::NoFiles)) => {
            eprintln!("{e}");
            exit_codes::USER_ERROR
        }
        Err(e) => {
            eprintln!("{e}");
            exit_codes::RUNTIME_ERROR
        }
    }
}
