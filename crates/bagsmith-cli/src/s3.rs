//! # S3 Download Subcommand
//!
//! `bagsmith s3download` fetches one object from an S3-compatible store and
//! streams it to disk. Requests are path-style so local endpoints such as
//! MinIO work without DNS tricks.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::{GetOptions, ObjectStore};
use tokio::io::AsyncWriteExt;

use crate::config::AppConfig;
use crate::exit_codes;

/// Region sent with signed requests. S3-compatible stores ignore it.
const DEFAULT_REGION: &str = "us-east-1";

/// Arguments for `bagsmith s3download`.
#[derive(Args, Debug, Default)]
pub struct S3DownloadArgs {
    /// Store host, e.g. s3.amazonaws.com or localhost:9899.
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Bucket name.
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Object key.
    #[arg(short, long)]
    pub key: Option<String>,

    /// Local path to save to. Defaults to the key; a directory receives the key inside it.
    #[arg(short, long)]
    pub saveas: Option<PathBuf>,
}

/// Why a download failed.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The store refused or failed the request.
    #[error("error retrieving object: {0}")]
    Request(#[from] object_store::Error),
    /// The local file could not be written.
    #[error("error writing {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl DownloadError {
    fn write(path: &Path, source: std::io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Request(_) => exit_codes::REQUEST_ERROR,
            Self::Write { .. } => exit_codes::RUNTIME_ERROR,
        }
    }
}

/// Execute `s3download`.
pub fn run_s3download(args: &S3DownloadArgs, config: &AppConfig) -> Result<u8> {
    let present = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_string);
    let (host, bucket, key) = (present(&args.host), present(&args.bucket), present(&args.key));
    let (Some(host), Some(bucket), Some(key)) = (&host, &bucket, &key) else {
        for (flag, value) in [("host", &host), ("bucket", &bucket), ("key", &key)] {
            if value.is_none() {
                eprintln!("Flag --{flag} is required.");
            }
        }
        return Ok(exit_codes::USER_ERROR);
    };

    let dest = resolve_destination(args.saveas.as_deref(), key);
    let store = match build_store(host, bucket, config) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{e}");
            return Ok(exit_codes::USER_ERROR);
        }
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    match runtime.block_on(download(store.as_ref(), key, &dest)) {
        Ok(bytes) => {
            tracing::info!(bytes, path = %dest.display(), "saved object");
            Ok(exit_codes::OK)
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(e.exit_code())
        }
    }
}

/// Endpoint URL for `host`. Local hosts use plain HTTP.
pub fn endpoint_for(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        return host.to_string();
    }
    let hostname = host.split(':').next().unwrap_or(host);
    if hostname == "localhost" || hostname == "127.0.0.1" {
        format!("http://{host}")
    } else {
        format!("https://{host}")
    }
}

/// Where the object is written.
pub fn resolve_destination(saveas: Option<&Path>, key: &str) -> PathBuf {
    match saveas {
        Some(path) if path.is_dir() => path.join(key),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(key),
    }
}

/// Build a path-style S3 client for `host` and `bucket`.
pub fn build_store(
    host: &str,
    bucket: &str,
    config: &AppConfig,
) -> Result<Arc<dyn ObjectStore>, object_store::Error> {
    let endpoint = endpoint_for(host);
    tracing::debug!(%endpoint, bucket, "building S3 client");
    let mut builder = AmazonS3Builder::new()
        .with_endpoint(&endpoint)
        .with_bucket_name(bucket)
        .with_region(DEFAULT_REGION)
        .with_virtual_hosted_style_request(false)
        .with_allow_http(endpoint.starts_with("http://"));
    if config.aws_key.is_empty() {
        builder = builder.with_skip_signature(true);
    } else {
        builder = builder
            .with_access_key_id(&config.aws_key)
            .with_secret_access_key(&config.aws_secret);
    }
    Ok(Arc::new(builder.build()?))
}

/// Stream `key` from `store` into `dest`. Returns the number of bytes written.
///
/// A failed download removes the partial file.
pub async fn download(
    store: &dyn ObjectStore,
    key: &str,
    dest: &Path,
) -> Result<u64, DownloadError> {
    let location = object_store::path::Path::from(key);
    let result = store.get_opts(&location, GetOptions::default()).await?;

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::write(parent, e))?;
    }
    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| DownloadError::write(dest, e))?;

    let mut stream = result.into_stream();
    let written = async {
        let mut total = 0u64;
        while let Some(chunk) = stream.try_next().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::write(dest, e))?;
            total += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| DownloadError::write(dest, e))?;
        Ok::<_, DownloadError>(total)
    }
    .await;

    match written {
        Ok(total) => {
            tracing::debug!(bytes = total, path = %dest.display(), "download complete");
            Ok(total)
        }
        Err(e) => {
            drop(file);
            if let Err(rm) = tokio::fs::remove_file(dest).await {
                tracing::warn!(path = %dest.display(), error = %rm, "failed to remove partial download");
            }
            Err(e)
        }
    }
}
