//! # bagsmith-cli — The `bagsmith` Command-Line Tool
//!
//! ## Subcommands
//!
//! - `bagsmith bag create`: Validate tags and manifest algorithms against a
//!   profile, then package a directory as a tarred BagIt bag.
//! - `bagsmith registry get|list`: Read-only registry queries.
//! - `bagsmith s3download`: Fetch one object from S3-compatible storage.
//!
//! ```bash
//! bagsmith bag create --profile aptrust --bag-dir ./photos --output-dir ./out \
//!     --manifest-algs md5,sha256 \
//!     --tags "Source-Organization=Test University" \
//!     --tags aptrust-info.txt/Title=Photos \
//!     --tags aptrust-info.txt/Access=Institution
//! ```
//!
//! Machine-readable results go to stdout. Violations and logs go to stderr.
//! Exit codes are listed in [`exit_codes`].

pub mod bag;
pub mod config;
pub mod exit_codes;
pub mod registry;
pub mod s3;

/// Print each line to stderr.
pub fn print_errors<S: AsRef<str>>(lines: &[S]) {
    for line in lines {
        eprintln!("{}", line.as_ref());
    }
}
