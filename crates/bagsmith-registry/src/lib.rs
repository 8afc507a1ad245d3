//! # bagsmith-registry — Registry Member API Client
//!
//! Read-only access to the preservation registry: fetch one intellectual
//! object, generic file or work item, or list them with filters.
//!
//! ## API Path Convention
//!
//! | Operation | Path |
//! |-----------|------|
//! | get  | `{base}/member-api/{version}/{objects,files,items}/show/{id or identifier}` |
//! | list | `{base}/member-api/{version}/{objects,files,items}/?key=value...` |
//!
//! Every request carries `X-Pharos-API-User` and `X-Pharos-API-Key`.

pub mod config;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use config::{ConfigError, RegistryConfig};
pub use error::RegistryError;
pub use types::{parse_params, ListResponse, Lookup, RecordKind};

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use url::Url;

const API_USER_HEADER: &str = "x-pharos-api-user";
const API_KEY_HEADER: &str = "x-pharos-api-key";

/// Registry member API client.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: Url,
    api_version: String,
}

impl RegistryClient {
    /// Build a client from configuration.
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static(API_USER_HEADER),
            HeaderValue::from_str(&config.email)
                .map_err(|_| ConfigError::Missing("valid registry email"))?,
        );
        let mut key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| ConfigError::Missing("valid registry API key"))?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static(API_KEY_HEADER), key);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| RegistryError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url,
            api_version: config.api_version,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, RegistryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ConfigError::InvalidUrl(
                    self.base_url.to_string(),
                    "URL cannot be used as a base".to_string(),
                )
            })?
            .pop_if_empty()
            .extend(["member-api", self.api_version.as_str()])
            .extend(segments);
        Ok(url)
    }

    /// Fetch a single record. A 404 is `Ok(None)`.
    ///
    /// Calls `GET {base}/member-api/{version}/{kind}/show/{lookup}`.
    pub async fn get(
        &self,
        kind: RecordKind,
        lookup: &Lookup,
    ) -> Result<Option<serde_json::Value>, RegistryError> {
        let segment = lookup.segment();
        let url = self.url(&[kind.path_segment(), "show", &segment])?;
        let endpoint = format!("GET {}", url.path());
        tracing::debug!(%url, "registry get");

        let resp = retry::retry_send(&endpoint, || self.http.get(url.clone()).send())
            .await
            .map_err(|e| RegistryError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(RegistryError::Api {
                endpoint,
                status,
                body,
            });
        }

        resp.json()
            .await
            .map(Some)
            .map_err(|e| RegistryError::Deserialization {
                endpoint,
                source: e,
            })
    }

    /// List records matching `params`.
    ///
    /// Calls `GET {base}/member-api/{version}/{kind}/?{params}`.
    pub async fn list(
        &self,
        kind: RecordKind,
        params: &[(String, String)],
    ) -> Result<ListResponse, RegistryError> {
        let mut url = self.url(&[kind.path_segment(), ""])?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        let endpoint = format!("GET {}", url.path());
        tracing::debug!(%url, "registry list");

        let resp = retry::retry_send(&endpoint, || self.http.get(url.clone()).send())
            .await
            .map_err(|e| RegistryError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(RegistryError::Api {
                endpoint,
                status,
                body,
            });
        }

        resp.json().await.map_err(|e| RegistryError::Deserialization {
            endpoint,
            source: e,
        })
    }
}
