//! Contract tests for RegistryClient against a simulated member API.
//!
//! ## Endpoints Tested
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET | `/member-api/v3/{kind}/show/{id}` | `get_*` |
//! | GET | `/member-api/v3/{kind}/` | `list_*` |

use bagsmith_registry::{Lookup, RecordKind, RegistryClient, RegistryConfig, RegistryError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(mock_server: &MockServer) -> RegistryClient {
    let config = RegistryConfig::new(&mock_server.uri(), "v3", "system@aptrust.org", "test-key")
        .unwrap()
        .with_timeout_secs(5);
    RegistryClient::new(config).unwrap()
}

// ── GET /member-api/v3/{kind}/show/{id} ──────────────────────────────

#[tokio::test]
async fn get_file_by_id_sends_auth_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/member-api/v3/files/show/1"))
        .and(header("X-Pharos-API-User", "system@aptrust.org"))
        .and(header("X-Pharos-API-Key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 1,
            "identifier": "institution1.edu/photos/picture1",
            "intellectual_object_id": 1,
            "size": 48771,
            "state": "A"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let record = client
        .get(RecordKind::File, &Lookup::Id(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record["id"], 1);
    assert_eq!(record["identifier"], "institution1.edu/photos/picture1");
}

#[tokio::test]
async fn get_object_by_identifier_escapes_slashes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/member-api/v3/objects/show/institution1.edu%2Fphotos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 3,
            "identifier": "institution1.edu/photos"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let record = client
        .get(
            RecordKind::Object,
            &Lookup::Identifier("institution1.edu/photos".into()),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record["id"], 3);
}

#[tokio::test]
async fn get_returns_none_on_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/member-api/v3/items/show/999"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let record = client.get(RecordKind::WorkItem, &Lookup::Id(999)).await.unwrap();
    assert!(record.is_none());
}

#[tokio::test]
async fn get_surfaces_server_error_with_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/member-api/v3/files/show/1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.get(RecordKind::File, &Lookup::Id(1)).await.unwrap_err();
    match err {
        RegistryError::Api { status, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(body, "database unavailable");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn get_reports_malformed_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/member-api/v3/files/show/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.get(RecordKind::File, &Lookup::Id(1)).await.unwrap_err();
    assert!(matches!(err, RegistryError::Deserialization { .. }));
}

// ── GET /member-api/v3/{kind}/ ───────────────────────────────────────

#[tokio::test]
async fn list_files_passes_query_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/member-api/v3/files/"))
        .and(query_param("intellectual_object_id", "3"))
        .and(query_param("sort", "identifier__desc"))
        .and(query_param("state", "A"))
        .and(query_param("per_page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "count": 4,
            "next": "http://localhost/member-api/v3/files/?page=2&per_page=2",
            "previous": null,
            "results": [
                {"id": 15, "identifier": "institution1.edu/glass/data/shards/shard4.txt"},
                {"id": 14, "identifier": "institution1.edu/glass/data/shards/shard3.txt"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let params = bagsmith_registry::parse_params(&[
        "intellectual_object_id=3",
        "sort=identifier__desc",
        "state=A",
        "per_page=2",
    ])
    .unwrap();
    let page = client.list(RecordKind::File, &params).await.unwrap();

    assert_eq!(page.count, 4);
    assert!(page.next.is_some());
    assert!(page.previous.is_none());
    assert_eq!(page.results.len(), 2);
    assert_eq!(page.results[0]["id"], 15);
}

#[tokio::test]
async fn list_objects_without_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/member-api/v3/objects/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "count": 0,
            "next": null,
            "previous": null,
            "results": []
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let page = client.list(RecordKind::Object, &[]).await.unwrap();
    assert_eq!(page.count, 0);
    assert!(page.results.is_empty());
}

#[tokio::test]
async fn list_surfaces_forbidden() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/member-api/v3/items/"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.list(RecordKind::WorkItem, &[]).await.unwrap_err();
    assert!(matches!(err, RegistryError::Api { status: 403, .. }));
}
