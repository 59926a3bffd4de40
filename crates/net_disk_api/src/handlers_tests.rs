//! Tests for handlers module

use super::*;
use github_client::ClientConfig;
use serde_json::json;
use tokio::net::TcpListener;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::server::{ApiConfig, ApiServer};

#[tokio::test]
async fn test_health_check_returns_json() {
    let response = health_check().await;

    assert_eq!(response.0.status, "healthy");
    assert_eq!(response.0.version, Some(env!("CARGO_PKG_VERSION").to_string()));
    assert!(chrono::DateTime::parse_from_rfc3339(&response.0.timestamp).is_ok());
}

/// Starts the intermediary in front of `upstream` and returns its base URL
/// together with the sender that stops it.
async fn start_intermediary(upstream: &MockServer) -> (String, tokio::sync::oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();

    let server = ApiServer::new(ApiConfig {
        upstream_url: upstream.uri(),
        ..ApiConfig::default()
    });
    tokio::spawn(server.serve_on(listener, async {
        let _ = stopped.await;
    }));

    (format!("http://{addr}"), stop)
}

#[tokio::test]
async fn test_client_round_trip_through_intermediary() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "notes", "private": false, "updated_at": "2024-05-01T10:00:00Z" }
        ])))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/notes/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "zeta.txt", "path": "zeta.txt", "type": "file", "size": 10 },
            { "name": "docs", "path": "docs", "type": "dir", "size": 0 }
        ])))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/notes/contents/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&upstream)
        .await;
    Mock::given(method("PUT"))
        .and(path("/repos/octocat/notes/contents/docs/a.md"))
        .and(body_partial_json(json!({ "content": "aGk=" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "content": {} })))
        .expect(1)
        .mount(&upstream)
        .await;

    let (endpoint, stop) = start_intermediary(&upstream).await;
    let config = ClientConfig::new("ghp_test_token")
        .with_upstream_url(upstream.uri())
        .with_intermediary(Some(endpoint));
    let client = GitHubClient::from_config(&config).unwrap();
    assert_eq!(client.transport_name(), "intermediary");

    let repos = client.list_repositories().await.unwrap();
    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].name, "notes");

    let listing = client.list_directory("octocat", "notes", "").await.unwrap();
    let names: Vec<&str> = listing.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["docs", "zeta.txt"]);

    let missing = client
        .list_directory("octocat", "notes", "gone")
        .await
        .unwrap();
    assert!(missing.is_empty());

    client
        .upload_file("octocat", "notes", "docs/a.md", b"hi", None)
        .await
        .unwrap();

    let _ = stop.send(());
}
