//! # Manifest Checksums
//!
//! Defines [`ChecksumAlgorithm`] and [`MultiDigest`]. A bag carries one
//! payload manifest and one tag manifest per requested algorithm, so every
//! payload file must be hashed with each of them. `MultiDigest` feeds a single
//! pass over the bytes to all hashers at once.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::error::CoreError;

/// A checksum algorithm usable in payload and tag manifests.
///
/// Ordering follows declaration order, which is also the order manifests
/// are written into a bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    /// MD5 (legacy, still mandated by some profiles).
    Md5,
    /// SHA-1.
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-512.
    Sha512,
}

impl ChecksumAlgorithm {
    /// Every supported algorithm.
    pub fn all() -> &'static [ChecksumAlgorithm] {
        &[Self::Md5, Self::Sha1, Self::Sha256, Self::Sha512]
    }

    /// The lowercase name used in profiles and manifest file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Payload manifest file name, e.g. `manifest-sha256.txt`.
    pub fn manifest_name(&self) -> String {
        format!("manifest-{}.txt", self.as_str())
    }

    /// Tag manifest file name, e.g. `tagmanifest-sha256.txt`.
    pub fn tag_manifest_name(&self) -> String {
        format!("tagmanifest-{}.txt", self.as_str())
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(CoreError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

#[derive(Clone)]
enum Hasher {
    Md5(md5::Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
}

impl Hasher {
    fn new(algorithm: ChecksumAlgorithm) -> Self {
        match algorithm {
            ChecksumAlgorithm::Md5 => Self::Md5(md5::Md5::new()),
            ChecksumAlgorithm::Sha1 => Self::Sha1(Sha1::new()),
            ChecksumAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            ChecksumAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Md5(h) => to_hex(&h.finalize()),
            Self::Sha1(h) => to_hex(&h.finalize()),
            Self::Sha256(h) => to_hex(&h.finalize()),
            Self::Sha512(h) => to_hex(&h.finalize()),
        }
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Streaming hasher computing several checksums over the same bytes.
#[derive(Clone)]
pub struct MultiDigest {
    hashers: Vec<(ChecksumAlgorithm, Hasher)>,
}

impl MultiDigest {
    /// Create a hasher for the given algorithms. Duplicates are collapsed.
    pub fn new(algorithms: &[ChecksumAlgorithm]) -> Self {
        let mut hashers: Vec<(ChecksumAlgorithm, Hasher)> = Vec::with_capacity(algorithms.len());
        for alg in algorithms {
            if !hashers.iter().any(|(a, _)| a == alg) {
                hashers.push((*alg, Hasher::new(*alg)));
            }
        }
        Self { hashers }
    }

    /// Feed bytes to every hasher.
    pub fn update(&mut self, data: &[u8]) {
        for (_, hasher) in &mut self.hashers {
            hasher.update(data);
        }
    }

    /// Consume the hasher, returning lowercase hex digests keyed by algorithm.
    pub fn finalize(self) -> BTreeMap<ChecksumAlgorithm, String> {
        self.hashers
            .into_iter()
            .map(|(alg, hasher)| (alg, hasher.finalize_hex()))
            .collect()
    }
}
