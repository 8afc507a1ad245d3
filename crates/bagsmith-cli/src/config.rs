//! # Configuration
//!
//! Settings for the registry and object-store commands. Sources, lowest to
//! highest precedence:
//!
//! 1. Built-in defaults (`APTRUST_REGISTRY_API_VERSION=v3`).
//! 2. The env-style file given with `--config`.
//! 3. Process environment variables.
//!
//! The file holds one `KEY=VALUE` per line. Blank lines and `#` comments are
//! skipped, an `export ` prefix is allowed, and values may be wrapped in
//! single or double quotes.

use std::path::{Path, PathBuf};

use bagsmith_registry::RegistryConfig;

/// Registry base URL.
pub const REGISTRY_URL: &str = "APTRUST_REGISTRY_URL";
/// Registry account email.
pub const REGISTRY_EMAIL: &str = "APTRUST_REGISTRY_EMAIL";
/// Registry member API version.
pub const REGISTRY_API_VERSION: &str = "APTRUST_REGISTRY_API_VERSION";
/// Registry API key.
pub const REGISTRY_API_KEY: &str = "APTRUST_REGISTRY_API_KEY";
/// Object-store access key id.
pub const AWS_KEY: &str = "APTRUST_AWS_KEY";
/// Object-store secret key.
pub const AWS_SECRET: &str = "APTRUST_AWS_SECRET";

/// Resolved settings.
///
/// Custom `Debug` implementation redacts the API key and AWS secret.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub registry_url: String,
    pub registry_email: String,
    pub registry_api_version: String,
    pub registry_api_key: String,
    pub aws_key: String,
    pub aws_secret: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("registry_url", &self.registry_url)
            .field("registry_email", &self.registry_email)
            .field("registry_api_version", &self.registry_api_version)
            .field("registry_api_key", &"[REDACTED]")
            .field("aws_key", &self.aws_key)
            .field("aws_secret", &"[REDACTED]")
            .finish()
    }
}

impl AppConfig {
    /// Load from the optional config file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => Some(std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?),
            None => None,
        };
        let config = Self::from_sources(file.as_deref(), |key| std::env::var(key).ok())?;
        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    }

    /// Layer defaults, file contents, and `env` lookups.
    pub fn from_sources<F>(file: Option<&str>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            registry_api_version: bagsmith_registry::config::DEFAULT_API_VERSION.to_string(),
            ..Self::default()
        };
        if let Some(contents) = file {
            for (key, value) in parse_env_file(contents)? {
                config.set(&key, value);
            }
        }
        for key in [
            REGISTRY_URL,
            REGISTRY_EMAIL,
            REGISTRY_API_VERSION,
            REGISTRY_API_KEY,
            AWS_KEY,
            AWS_SECRET,
        ] {
            if let Some(value) = env(key) {
                config.set(key, value);
            }
        }
        Ok(config)
    }

    fn set(&mut self, key: &str, value: String) {
        match key {
            REGISTRY_URL => self.registry_url = value,
            REGISTRY_EMAIL => self.registry_email = value,
            REGISTRY_API_VERSION => self.registry_api_version = value,
            REGISTRY_API_KEY => self.registry_api_key = value,
            AWS_KEY => self.aws_key = value,
            AWS_SECRET => self.aws_secret = value,
            other => tracing::debug!(key = other, "ignoring unknown configuration key"),
        }
    }

    /// Registry client settings.
    pub fn registry_config(&self) -> Result<RegistryConfig, bagsmith_registry::ConfigError> {
        RegistryConfig::new(
            &self.registry_url,
            &self.registry_api_version,
            &self.registry_email,
            &self.registry_api_key,
        )
    }
}

/// Parse env-style `KEY=VALUE` lines.
pub fn parse_env_file(contents: &str) -> Result<Vec<(String, String)>, ConfigError> {
    let mut pairs = Vec::new();
    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::Parse {
            line: idx + 1,
            detail: "expected KEY=VALUE".to_string(),
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::Parse {
                line: idx + 1,
                detail: "empty key".to_string(),
            });
        }
        pairs.push((key.to_string(), unquote(value.trim()).to_string()));
    }
    Ok(pairs)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config file line {line}: {detail}")]
    Parse { line: usize, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    const SAMPLE: &str = r#"
# local test settings
APTRUST_REGISTRY_URL=http://localhost:8080
export APTRUST_REGISTRY_EMAIL="user@inst1.edu"
APTRUST_REGISTRY_API_KEY='password'
APTRUST_AWS_KEY = minioadmin
APTRUST_AWS_SECRET=minio=admin
UNRELATED=1
"#;

    #[test]
    fn defaults_only() {
        let cfg = AppConfig::from_sources(None, no_env).unwrap();
        assert_eq!(cfg.registry_api_version, "v3");
        assert!(cfg.registry_url.is_empty());
    }

    #[test]
    fn file_values_are_unquoted() {
        let cfg = AppConfig::from_sources(Some(SAMPLE), no_env).unwrap();
        assert_eq!(cfg.registry_url, "http://localhost:8080");
        assert_eq!(cfg.registry_email, "user@inst1.edu");
        assert_eq!(cfg.registry_api_key, "password");
        assert_eq!(cfg.aws_key, "minioadmin");
        assert_eq!(cfg.aws_secret, "minio=admin");
        assert_eq!(cfg.registry_api_version, "v3");
    }

    #[test]
    fn environment_overrides_file() {
        let env: HashMap<&str, &str> = [(REGISTRY_URL, "https://repo.example.org"), (REGISTRY_API_VERSION, "v4")]
            .into_iter()
            .collect();
        let cfg = AppConfig::from_sources(Some(SAMPLE), |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.registry_url, "https://repo.example.org");
        assert_eq!(cfg.registry_api_version, "v4");
        assert_eq!(cfg.registry_email, "user@inst1.edu");
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let err = parse_env_file("A=1\n\nnot a pair\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 3, .. }));
        assert!(parse_env_file("=value").is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.env");
        std::fs::write(&path, "APTRUST_AWS_KEY=from-file\n").unwrap();
        let cfg = AppConfig::load(Some(&path)).unwrap();
        // may be overridden by a developer's environment
        if std::env::var(AWS_KEY).is_err() {
            assert_eq!(cfg.aws_key, "from-file");
        }
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/bagsmith.env"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn registry_config_requires_url() {
        let cfg = AppConfig::from_sources(None, no_env).unwrap();
        assert!(cfg.registry_config().is_err());
        let cfg = AppConfig::from_sources(Some(SAMPLE), no_env).unwrap();
        let rc = cfg.registry_config().unwrap();
        assert_eq!(rc.api_version, "v3");
        assert_eq!(rc.email, "user@inst1.edu");
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = AppConfig::from_sources(Some(SAMPLE), no_env).unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("password"));
        assert!(!dbg.contains("minio=admin"));
    }
}
