//! # Registry Subcommand
//!
//! Read-only queries against the registry member API. Records are printed
//! to stdout as pretty JSON.
//!
//! ```bash
//! bagsmith registry get object identifier=test.edu/photos
//! bagsmith registry list file intellectual_object_id=3 state=A
//! ```

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use bagsmith_registry::{parse_params, Lookup, RecordKind, RegistryClient, RegistryError};

use crate::config::AppConfig;
use crate::exit_codes;

/// Arguments for the `bagsmith registry` subcommand.
#[derive(Args, Debug)]
pub struct RegistryArgs {
    #[command(subcommand)]
    pub command: RegistryCommand,
}

/// Registry subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum RegistryCommand {
    /// Fetch one record by id=<n> or identifier=<identifier>.
    Get {
        /// Record kind: object, file, or workitem.
        kind: String,
        /// id=<n> or identifier=<identifier>.
        lookup: String,
    },

    /// List records, filtered by key=value query parameters.
    List {
        /// Record kind: object, file, or workitem.
        kind: String,
        /// Query parameters as key=value.
        params: Vec<String>,
    },
}

/// Execute the registry subcommand.
pub fn run_registry(args: &RegistryArgs, config: &AppConfig) -> Result<u8> {
    let registry_config = match config.registry_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Registry configuration: {e}");
            return Ok(exit_codes::USER_ERROR);
        }
    };
    let client = match RegistryClient::new(registry_config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return Ok(exit_codes::USER_ERROR);
        }
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let outcome = runtime.block_on(execute(&args.command, &client));
    report(outcome)
}

/// Run one registry command against `client`.
///
/// `Ok(None)` means the registry has no such record.
pub async fn execute(
    command: &RegistryCommand,
    client: &RegistryClient,
) -> Result<Option<serde_json::Value>, RegistryError> {
    match command {
        RegistryCommand::Get { kind, lookup } => {
            let kind: RecordKind = kind.parse()?;
            let lookup: Lookup = lookup.parse()?;
            client.get(kind, &lookup).await
        }
        RegistryCommand::List { kind, params } => {
            let kind: RecordKind = kind.parse()?;
            let params = parse_params(params)?;
            let page = client.list(kind, &params).await?;
            let value = serde_json::to_value(page)
                .map_err(|e| RegistryError::InvalidRequest(e.to_string()))?;
            Ok(Some(value))
        }
    }
}

/// Print the outcome and map it to an exit code.
pub fn report(outcome: Result<Option<serde_json::Value>, RegistryError>) -> Result<u8> {
    match outcome {
        Ok(Some(value)) => {
            let text = serde_json::to_string_pretty(&value).context("failed to format record")?;
            println!("{text}");
            Ok(exit_codes::OK)
        }
        Ok(None) => {
            eprintln!("Item not found.");
            Ok(exit_codes::ITEM_NOT_FOUND)
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(exit_code_for(&e))
        }
    }
}

/// Exit code for a registry error.
pub fn exit_code_for(err: &RegistryError) -> u8 {
    match err {
        RegistryError::InvalidRequest(_) | RegistryError::Config(_) => exit_codes::USER_ERROR,
        RegistryError::Http { .. }
        | RegistryError::Api { .. }
        | RegistryError::Deserialization { .. } => exit_codes::REQUEST_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bagsmith_registry::RegistryConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> RegistryClient {
        RegistryClient::new(RegistryConfig::new(&server.uri(), "v3", "me@test.edu", "k").unwrap())
            .unwrap()
    }

    #[tokio::test]
    async fn get_object_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/member-api/v3/objects/show/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 7})))
            .expect(1)
            .mount(&server)
            .await;

        let cmd = RegistryCommand::Get {
            kind: "object".into(),
            lookup: "id=7".into(),
        };
        let value = execute(&cmd, &client(&server)).await.unwrap().unwrap();
        assert_eq!(value["id"], 7);
    }

    #[tokio::test]
    async fn list_wraps_page_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/member-api/v3/items/"))
            .and(query_param("stage", "Ingest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 1,
                "next": null,
                "previous": null,
                "results": [{"id": 12}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cmd = RegistryCommand::List {
            kind: "workitems".into(),
            params: vec!["stage=Ingest".into()],
        };
        let value = execute(&cmd, &client(&server)).await.unwrap().unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["results"][0]["id"], 12);
    }

    #[tokio::test]
    async fn bad_kind_is_user_error_without_request() {
        let server = MockServer::start().await;
        let cmd = RegistryCommand::Get {
            kind: "institution".into(),
            lookup: "id=1".into(),
        };
        let err = execute(&cmd, &client(&server)).await.unwrap_err();
        assert_eq!(exit_code_for(&err), exit_codes::USER_ERROR);
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[test]
    fn outcomes_map_to_exit_codes() {
        assert_eq!(report(Ok(None)).unwrap(), exit_codes::ITEM_NOT_FOUND);
        assert_eq!(
            report(Ok(Some(serde_json::json!({"id": 1})))).unwrap(),
            exit_codes::OK
        );
        let api = RegistryError::Api {
            endpoint: "GET /x".into(),
            status: 500,
            body: String::new(),
        };
        assert_eq!(report(Err(api)).unwrap(), exit_codes::REQUEST_ERROR);
    }

    #[test]
    fn missing_registry_url_is_user_error() {
        let args = RegistryArgs {
            command: RegistryCommand::Get {
                kind: "file".into(),
                lookup: "id=1".into(),
            },
        };
        let code = run_registry(&args, &AppConfig::default()).unwrap();
        assert_eq!(code, exit_codes::USER_ERROR);
    }
}
