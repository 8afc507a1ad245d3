//! # Tar Bagger
//!
//! A [`PackagingEngine`] that writes a BagIt bag as a single tar file.
//!
//! ## Layout
//!
//! ```text
//! <bag name>/bagit.txt
//! <bag name>/bag-info.txt
//! <bag name>/<other tag files>
//! <bag name>/manifest-<alg>.txt
//! <bag name>/tagmanifest-<alg>.txt
//! <bag name>/data/<payload>
//! ```
//!
//! Payload bytes are hashed while they stream into the archive, so each file
//! is read once. The archive is built in a temporary file inside the output
//! directory and renamed into place only when every entry was written.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use bagsmith_core::{ChecksumAlgorithm, MultiDigest, BAGGING_SOFTWARE};
use bagsmith_profile::tags::BAG_INFO_TXT;
use bagsmith_profile::Profile;
use tar::{Builder, EntryType, Header};
use walkdir::WalkDir;

use crate::engine::{EngineErrors, FileDescriptor, PackagingEngine, PackagingRequest};
use crate::error::{BagError, BagResult};
use crate::tagfile::{
    payload_oxum, render_manifest, render_tag_file, tag_file_order, BAGGING_DATE,
    BAGGING_SOFTWARE as BAGGING_SOFTWARE_TAG, PAYLOAD_OXUM,
};

/// Payload directory inside a bag.
const PAYLOAD_DIR: &str = "data";

/// One payload file: where it lives on disk and where it goes in the bag.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PayloadFile {
    source: PathBuf,
    bag_path: String,
    size: u64,
}

/// Digests per algorithm, each mapping bag path to hex digest.
type Manifests = BTreeMap<ChecksumAlgorithm, BTreeMap<String, String>>;

/// Writes bags as tar files.
#[derive(Debug, Clone, Default)]
pub struct TarBagger {
    bagging_date: Option<String>,
}

impl TarBagger {
    /// A bagger stamping bags with today's UTC date.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp bags with a fixed `Bagging-Date` instead of today's.
    pub fn with_bagging_date(mut self, date: impl Into<String>) -> Self {
        self.bagging_date = Some(date.into());
        self
    }

    fn bagging_date(&self) -> String {
        self.bagging_date
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string())
    }

    fn write_bag(&self, request: &PackagingRequest<'_>) -> Result<PathBuf, EngineErrors> {
        let first = request
            .files
            .first()
            .ok_or_else(|| EngineErrors::single("files", BagError::NoFiles))?;
        if request.algorithms.is_empty() {
            return Err(EngineErrors::single("manifests", BagError::NoManifestAlgorithms));
        }
        let bag_name = first
            .name()
            .ok_or_else(|| {
                EngineErrors::single(
                    "files",
                    format!("cannot derive a bag name from {}", first.path.display()),
                )
            })?
            .to_string();

        let tag_algorithms =
            tag_manifest_algorithms(request.algorithms, &request.profile.tag_manifests_required)?;
        let payload = collect_payload(request.files)?;
        tracing::info!(bag = %bag_name, files = payload.len(), "collected payload");

        std::fs::create_dir_all(request.output_dir).map_err(|e| {
            EngineErrors::single("output_dir", BagError::io("creating output directory", e))
        })?;
        let output_path = request.output_dir.join(format!("{bag_name}.tar"));

        let tmp = tempfile::Builder::new()
            .prefix(".bagsmith-")
            .suffix(".tar.part")
            .tempfile_in(request.output_dir)
            .map_err(|e| {
                EngineErrors::single("tarfile", BagError::io("creating temporary tar file", e))
            })?;

        let mut profile = request.profile.clone();
        let writer = BufWriter::new(tmp.as_file());
        write_archive(
            writer,
            &bag_name,
            &mut profile,
            &payload,
            request.algorithms,
            &tag_algorithms,
            &self.bagging_date(),
        )
        .map_err(|e| EngineErrors::single("tarfile", e))?;

        tmp.persist(&output_path).map_err(|e| {
            EngineErrors::single("tarfile", BagError::io("moving bag into place", e.error))
        })?;
        tracing::info!(path = %output_path.display(), "bag written");
        Ok(output_path)
    }
}

impl PackagingEngine for TarBagger {
    fn package(&self, request: &PackagingRequest<'_>) -> Result<PathBuf, EngineErrors> {
        self.write_bag(request)
    }
}

/// The payload algorithms followed by any tag manifest algorithm the
/// profile requires that was not already requested.
fn tag_manifest_algorithms(
    payload: &[ChecksumAlgorithm],
    required: &[String],
) -> Result<Vec<ChecksumAlgorithm>, EngineErrors> {
    let mut algorithms = payload.to_vec();
    let mut errors = EngineErrors::new();
    for name in required {
        match name.parse::<ChecksumAlgorithm>() {
            Ok(alg) if !algorithms.contains(&alg) => algorithms.push(alg),
            Ok(_) => {}
            Err(e) => errors.insert(format!("tagmanifest-{name}"), e),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(algorithms)
}

// ---------------------------------------------------------------------------
// Payload Collection
// ---------------------------------------------------------------------------

/// Expand descriptors into payload files sorted by bag path.
///
/// Symlinks are followed, so linked files are bagged under the link's name.
/// Every unreadable path is reported, keyed by its location on disk,
/// including dangling links and link loops.
fn collect_payload(files: &[FileDescriptor]) -> Result<Vec<PayloadFile>, EngineErrors> {
    let mut errors = EngineErrors::new();
    let mut payload: BTreeMap<String, PayloadFile> = BTreeMap::new();

    let mut add = |file: PayloadFile, errors: &mut EngineErrors| {
        if payload.contains_key(&file.bag_path) {
            let key = file.source.display().to_string();
            errors.insert(key, BagError::DuplicatePayloadPath(file.bag_path));
        } else {
            payload.insert(file.bag_path.clone(), file);
        }
    };

    for fd in files {
        if !fd.is_dir {
            match fd.name() {
                Some(name) => add(
                    PayloadFile {
                        source: fd.path.clone(),
                        bag_path: format!("{PAYLOAD_DIR}/{name}"),
                        size: fd.size,
                    },
                    &mut errors,
                ),
                None => errors.insert(fd.path.display().to_string(), "file name is not valid UTF-8"),
            }
            continue;
        }

        for entry in WalkDir::new(&fd.path).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let key = e.path().unwrap_or(fd.path.as_path()).display().to_string();
                    errors.insert(key, BagError::Walk(e));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let key = entry.path().display().to_string();
            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    errors.insert(key, BagError::Walk(e));
                    continue;
                }
            };
            match relative_bag_path(&fd.path, entry.path()) {
                Some(rel) => add(
                    PayloadFile {
                        source: entry.path().to_path_buf(),
                        bag_path: format!("{PAYLOAD_DIR}/{rel}"),
                        size,
                    },
                    &mut errors,
                ),
                None => errors.insert(key, "path is not valid UTF-8"),
            }
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(payload.into_values().collect())
}

/// `/`-joined path of `path` relative to `base`.
fn relative_bag_path(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}

// ---------------------------------------------------------------------------
// Archive Writing
// ---------------------------------------------------------------------------

/// Reader adapter that hashes and counts everything read through it.
struct HashingReader<R> {
    inner: R,
    digest: MultiDigest,
    bytes: u64,
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.digest.update(&buf[..n]);
        self.bytes += n as u64;
        Ok(n)
    }
}

fn write_archive<W: Write>(
    writer: W,
    bag_name: &str,
    profile: &mut Profile,
    payload: &[PayloadFile],
    algorithms: &[ChecksumAlgorithm],
    tag_algorithms: &[ChecksumAlgorithm],
    bagging_date: &str,
) -> BagResult<()> {
    let mut tar = Builder::new(writer);
    let mut manifests: Manifests = algorithms.iter().map(|a| (*a, BTreeMap::new())).collect();
    let mut total_bytes: u64 = 0;

    for file in payload {
        let source = File::open(&file.source).map_err(|source| BagError::Access {
            path: file.source.clone(),
            source,
        })?;
        let mut reader = HashingReader {
            inner: source.take(file.size),
            digest: MultiDigest::new(algorithms),
            bytes: 0,
        };
        let mut header = entry_header(file.size);
        tar.append_data(&mut header, format!("{bag_name}/{}", file.bag_path), &mut reader)
            .map_err(|e| BagError::io(format!("writing {}", file.bag_path), e))?;
        if reader.bytes != file.size {
            return Err(BagError::io(
                format!("writing {}", file.bag_path),
                io::Error::new(io::ErrorKind::UnexpectedEof, "file shrank while being bagged"),
            ));
        }
        total_bytes += reader.bytes;
        record(&mut manifests, &file.bag_path, reader.digest);
    }

    if profile.tag_value(BAG_INFO_TXT, BAGGING_DATE).map_or(true, str::is_empty) {
        profile.set_tag_value(BAG_INFO_TXT, BAGGING_DATE, bagging_date);
    }
    if profile.tag_value(BAG_INFO_TXT, BAGGING_SOFTWARE_TAG).map_or(true, str::is_empty) {
        profile.set_tag_value(BAG_INFO_TXT, BAGGING_SOFTWARE_TAG, BAGGING_SOFTWARE);
    }
    profile.set_tag_value(BAG_INFO_TXT, PAYLOAD_OXUM, &payload_oxum(total_bytes, payload.len()));

    let mut tag_manifests: Manifests =
        tag_algorithms.iter().map(|a| (*a, BTreeMap::new())).collect();

    for file in tag_file_order(profile) {
        let body = render_tag_file(profile, file);
        append_text(&mut tar, bag_name, file, &body, tag_algorithms, &mut tag_manifests)?;
    }
    for (alg, entries) in &manifests {
        let name = alg.manifest_name();
        let body = render_manifest(entries);
        append_text(&mut tar, bag_name, &name, &body, tag_algorithms, &mut tag_manifests)?;
    }
    for (alg, entries) in &tag_manifests {
        let name = alg.tag_manifest_name();
        let body = render_manifest(entries);
        let mut header = entry_header(body.len() as u64);
        tar.append_data(&mut header, format!("{bag_name}/{name}"), body.as_bytes())
            .map_err(|e| BagError::io(format!("writing {name}"), e))?;
    }

    let mut writer = tar
        .into_inner()
        .map_err(|e| BagError::io("finalizing tar archive", e))?;
    writer
        .flush()
        .map_err(|e| BagError::io("flushing tar archive", e))?;
    Ok(())
}

fn append_text<W: Write>(
    tar: &mut Builder<W>,
    bag_name: &str,
    name: &str,
    body: &str,
    algorithms: &[ChecksumAlgorithm],
    tag_manifests: &mut Manifests,
) -> BagResult<()> {
    let mut header = entry_header(body.len() as u64);
    tar.append_data(&mut header, format!("{bag_name}/{name}"), body.as_bytes())
        .map_err(|e| BagError::io(format!("writing {name}"), e))?;
    let mut digest = MultiDigest::new(algorithms);
    digest.update(body.as_bytes());
    record(tag_manifests, name, digest);
    Ok(())
}

fn record(manifests: &mut Manifests, path: &str, digest: MultiDigest) {
    for (alg, hex) in digest.finalize() {
        if let Some(entries) = manifests.get_mut(&alg) {
            entries.insert(path.to_string(), hex);
        }
    }
}

fn entry_header(size: u64) -> Header {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_size(size);
    header.set_mode(0o644);
    header.set_mtime(chrono::Utc::now().timestamp().max(0) as u64);
    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use bagsmith_profile::{load_profile, TagDeclaration};
    use std::collections::HashMap;

    fn read_tar(path: &Path) -> HashMap<String, String> {
        let mut archive = tar::Archive::new(File::open(path).unwrap());
        let mut out = HashMap::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().into_owned();
            let mut body = String::new();
            entry.read_to_string(&mut body).unwrap();
            out.insert(name, body);
        }
        out
    }

    fn photos() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        let photos = root.path().join("photos");
        std::fs::create_dir_all(photos.join("2024")).unwrap();
        std::fs::write(photos.join("a.txt"), b"abc").unwrap();
        std::fs::write(photos.join("2024/b.txt"), b"").unwrap();
        root
    }

    fn profile() -> Profile {
        let mut p = load_profile("empty").unwrap();
        p.tags.push(TagDeclaration::required("bag-info.txt", "Source-Organization"));
        p.set_tag_value("bagit.txt", "BagIt-Version", "1.0");
        p.set_tag_value("bagit.txt", "Tag-File-Character-Encoding", "UTF-8");
        p.set_tag_value("bag-info.txt", "Source-Organization", "Faber College");
        p
    }

    #[test]
    fn writes_complete_bag() {
        let root = photos();
        let out = tempfile::tempdir().unwrap();
        let files = vec![FileDescriptor::from_path(root.path().join("photos")).unwrap()];
        let profile = profile();
        let request = PackagingRequest {
            output_dir: out.path(),
            profile: &profile,
            files: &files,
            algorithms: &[ChecksumAlgorithm::Md5, ChecksumAlgorithm::Sha256],
        };
        let path = TarBagger::new()
            .with_bagging_date("2024-05-01")
            .package(&request)
            .unwrap();

        assert_eq!(path, out.path().join("photos.tar"));
        let entries = read_tar(&path);
        assert_eq!(entries["photos/data/a.txt"], "abc");
        assert_eq!(entries["photos/data/2024/b.txt"], "");
        assert_eq!(
            entries["photos/bagit.txt"],
            "BagIt-Version: 1.0\nTag-File-Character-Encoding: UTF-8\n"
        );
        let info = &entries["photos/bag-info.txt"];
        assert!(info.contains("Source-Organization: Faber College\n"));
        assert!(info.contains("Bagging-Date: 2024-05-01\n"));
        assert!(info.contains("Payload-Oxum: 3.2\n"));
        assert!(info.contains("Bagging-Software: bagsmith "));

        assert_eq!(
            entries["photos/manifest-md5.txt"],
            "d41d8cd98f00b204e9800998ecf8427e  data/2024/b.txt\n\
             900150983cd24fb0d6963f7d28e17f72  data/a.txt\n"
        );
        let tag_manifest = &entries["photos/tagmanifest-sha256.txt"];
        for name in ["bag-info.txt", "bagit.txt", "manifest-md5.txt", "manifest-sha256.txt"] {
            assert!(tag_manifest.contains(&format!("  {name}\n")), "{name}");
        }
        assert!(!tag_manifest.contains("tagmanifest"));

        let leftovers: Vec<_> = std::fs::read_dir(out.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn single_file_goes_into_data() {
        let root = photos();
        let files = vec![FileDescriptor::from_path(root.path().join("photos/a.txt")).unwrap()];
        let out = tempfile::tempdir().unwrap();
        let profile = profile();
        let request = PackagingRequest {
            output_dir: out.path(),
            profile: &profile,
            files: &files,
            algorithms: &[ChecksumAlgorithm::Sha1],
        };
        let path = TarBagger::new().package(&request).unwrap();
        assert_eq!(path, out.path().join("a.txt.tar"));
        assert_eq!(read_tar(&path)["a.txt/data/a.txt"], "abc");
    }

    #[test]
    fn missing_payload_fails_without_artifact() {
        let root = photos();
        let mut gone = FileDescriptor::from_path(root.path().join("photos")).unwrap();
        let files = vec![gone.clone(), {
            gone.path = root.path().join("gone");
            gone
        }];
        let out = tempfile::tempdir().unwrap();
        let profile = profile();
        let request = PackagingRequest {
            output_dir: out.path(),
            profile: &profile,
            files: &files,
            algorithms: &[ChecksumAlgorithm::Md5],
        };

        let errors = TarBagger::new().package(&request).unwrap_err();
        assert!(!errors.is_empty());
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn no_algorithms_is_an_engine_error() {
        let root = photos();
        let files = vec![FileDescriptor::from_path(root.path().join("photos")).unwrap()];
        let out = tempfile::tempdir().unwrap();
        let profile = profile();
        let request = PackagingRequest {
            output_dir: out.path(),
            profile: &profile,
            files: &files,
            algorithms: &[],
        };
        let errors = TarBagger::new().package(&request).unwrap_err();
        assert!(errors.get("manifests").is_some());
    }

    #[test]
    fn required_tag_manifest_is_written_alongside_requested() {
        let root = photos();
        let files = vec![FileDescriptor::from_path(root.path().join("photos")).unwrap()];
        let out = tempfile::tempdir().unwrap();
        let mut profile = profile();
        profile.tag_manifests_allowed = vec!["md5".into(), "sha512".into()];
        profile.tag_manifests_required = vec!["sha512".into(), "md5".into()];
        let request = PackagingRequest {
            output_dir: out.path(),
            profile: &profile,
            files: &files,
            algorithms: &[ChecksumAlgorithm::Md5],
        };
        let entries = read_tar(&TarBagger::new().package(&request).unwrap());

        assert!(entries.contains_key("photos/manifest-md5.txt"));
        assert!(!entries.contains_key("photos/manifest-sha512.txt"));
        assert!(entries.contains_key("photos/tagmanifest-md5.txt"));
        let tag_manifest = &entries["photos/tagmanifest-sha512.txt"];
        for name in ["bag-info.txt", "bagit.txt", "manifest-md5.txt"] {
            assert!(tag_manifest.contains(&format!("  {name}\n")), "{name}");
        }
    }

    #[test]
    fn unsupported_required_tag_manifest_fails_without_artifact() {
        let root = photos();
        let files = vec![FileDescriptor::from_path(root.path().join("photos")).unwrap()];
        let out = tempfile::tempdir().unwrap();
        let mut profile = profile();
        profile.tag_manifests_required = vec!["crc32".into()];
        let request = PackagingRequest {
            output_dir: out.path(),
            profile: &profile,
            files: &files,
            algorithms: &[ChecksumAlgorithm::Md5],
        };
        let errors = TarBagger::new().package(&request).unwrap_err();
        assert!(errors.get("tagmanifest-crc32").is_some());
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_payload_is_bagged() {
        let root = photos();
        let outside = root.path().join("outside.txt");
        std::fs::write(&outside, b"linked").unwrap();
        std::os::unix::fs::symlink(&outside, root.path().join("photos/link.txt")).unwrap();
        let files = vec![FileDescriptor::from_path(root.path().join("photos")).unwrap()];
        let out = tempfile::tempdir().unwrap();
        let profile = profile();
        let request = PackagingRequest {
            output_dir: out.path(),
            profile: &profile,
            files: &files,
            algorithms: &[ChecksumAlgorithm::Md5],
        };
        let entries = read_tar(&TarBagger::new().package(&request).unwrap());
        assert_eq!(entries["photos/data/link.txt"], "linked");
        assert!(entries["photos/bag-info.txt"].contains("Payload-Oxum: 9.3\n"));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_reported() {
        let root = photos();
        let link = root.path().join("photos/broken.txt");
        std::os::unix::fs::symlink(root.path().join("nowhere"), &link).unwrap();
        let files = vec![FileDescriptor::from_path(root.path().join("photos")).unwrap()];
        let out = tempfile::tempdir().unwrap();
        let profile = profile();
        let request = PackagingRequest {
            output_dir: out.path(),
            profile: &profile,
            files: &files,
            algorithms: &[ChecksumAlgorithm::Md5],
        };
        let errors = TarBagger::new().package(&request).unwrap_err();
        assert!(errors.get(&link.display().to_string()).is_some());
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn relative_bag_path_uses_forward_slashes() {
        let base = Path::new("/a/b");
        assert_eq!(
            relative_bag_path(base, Path::new("/a/b/c/d.txt")).as_deref(),
            Some("c/d.txt")
        );
        assert_eq!(relative_bag_path(base, Path::new("/x/y")), None);
    }
}
