use super::*;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Host that never resolves; only a proxy can reach it.
const UNREACHABLE_UPSTREAM: &str = "http://api.github.invalid";

fn intermediary(endpoint: &str) -> IntermediaryTransport {
    IntermediaryTransport::new(endpoint, SecretString::from("ghp_test"), None)
        .expect("Failed to build intermediary transport")
}

#[test]
fn test_contents_route_encodes_segments() {
    let route = contents_route("octocat", "notes", "docs/my file.md").unwrap();

    assert_eq!(route, "/repos/octocat/notes/contents/docs/my%20file.md");
}

#[test]
fn test_contents_route_root_has_no_trailing_slash() {
    assert_eq!(
        contents_route("octocat", "notes", "").unwrap(),
        "/repos/octocat/notes/contents"
    );
    assert_eq!(
        contents_route("octocat", "notes", "/").unwrap(),
        "/repos/octocat/notes/contents"
    );
}

#[test]
fn test_contents_route_collapses_empty_segments() {
    let route = contents_route("octocat", "notes", "/a//b/").unwrap();

    assert_eq!(route, "/repos/octocat/notes/contents/a/b");
}

#[test]
fn test_intermediary_routes() {
    let transport = intermediary("http://localhost:3000");

    let (method, url, body) = transport.describe(&ApiRequest::ListRepositories).unwrap();
    assert_eq!(method, Method::GET);
    assert_eq!(url.as_str(), "http://localhost:3000/api/repos");
    assert!(body.is_none());

    let (_, url, _) = transport
        .describe(&ApiRequest::ListDirectory {
            owner: "octocat".to_string(),
            repo: "notes".to_string(),
            path: "docs/2024".to_string(),
        })
        .unwrap();
    assert_eq!(url.as_str(), "http://localhost:3000/api/files/octocat/notes/docs/2024");

    let (method, url, body) = transport
        .describe(&ApiRequest::WriteFile {
            owner: "octocat".to_string(),
            repo: "notes".to_string(),
            path: "a.txt".to_string(),
            payload: FileWritePayload {
                message: "m".to_string(),
                content: "aGk=".to_string(),
                branch: None,
            },
        })
        .unwrap();
    assert_eq!(method, Method::PUT);
    assert_eq!(url.as_str(), "http://localhost:3000/api/file/octocat/notes/a.txt");
    assert_eq!(body, Some(json!({ "message": "m", "content": "aGk=" })));
}

#[test]
fn test_intermediary_endpoint_with_base_path() {
    let transport = intermediary("http://proxy.internal/net-disk/");

    let (_, url, _) = transport.describe(&ApiRequest::ListRepositories).unwrap();

    assert_eq!(url.as_str(), "http://proxy.internal/net-disk/api/repos");
}

#[test]
fn test_intermediary_rejects_invalid_endpoint() {
    let result = IntermediaryTransport::new("not a url", SecretString::from("t"), None);

    assert!(matches!(result, Err(Error::Transport(_))));
}

#[test]
fn test_unwrap_envelope_returns_data() {
    let body = json!({ "code": 200, "message": "ok", "data": [1, 2, 3] }).to_string();

    assert_eq!(unwrap_envelope(&body).unwrap(), json!([1, 2, 3]));
}

#[test]
fn test_unwrap_envelope_accepts_alternate_field_names() {
    let body = json!({ "status": 200, "message": "ok", "payload": { "id": 1 } }).to_string();

    assert_eq!(unwrap_envelope(&body).unwrap(), json!({ "id": 1 }));
}

#[test]
fn test_unwrap_envelope_without_payload_is_null() {
    let body = json!({ "code": 200, "message": "ok" }).to_string();

    assert_eq!(unwrap_envelope(&body).unwrap(), Value::Null);
}

#[test]
fn test_unwrap_envelope_malformed_body_is_null() {
    assert_eq!(unwrap_envelope("<html>oops</html>").unwrap(), Value::Null);
    assert_eq!(unwrap_envelope("[1, 2]").unwrap(), Value::Null);
}

#[test]
fn test_unwrap_envelope_reported_failure_is_remote_error() {
    let body = json!({
        "code": 404,
        "success": false,
        "message": "Not Found",
        "data": null
    })
    .to_string();

    let err = unwrap_envelope(&body).unwrap_err();

    match err {
        Error::Remote { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found");
        }
        other => panic!("Expected Remote error, got {other:?}"),
    }
}

#[test]
fn test_error_message_reads_message_then_error() {
    assert_eq!(
        error_message(r#"{"message":"Bad credentials"}"#),
        Some("Bad credentials".to_string())
    );
    assert_eq!(
        error_message(r#"{"error":"missing token"}"#),
        Some("missing token".to_string())
    );
    assert_eq!(error_message("not json"), None);
}

#[test]
fn test_request_operation_names() {
    assert_eq!(ApiRequest::ListRepositories.operation(), "list_repositories");
    assert_eq!(
        ApiRequest::CreateRepository(RepositoryCreatePayload::default()).operation(),
        "create_repository"
    );
}

fn proxied(proxy: &MockServer) -> ProxiedUpstreamTransport {
    ProxiedUpstreamTransport::new(
        UNREACHABLE_UPSTREAM,
        SecretString::from("ghp_test"),
        &proxy.uri(),
    )
    .expect("Failed to build proxied transport")
}

#[tokio::test]
async fn test_proxied_upstream_sends_requests_through_proxy() {
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("sort", "updated"))
        .and(header("authorization", "Bearer ghp_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "notes", "private": false }
        ])))
        .expect(1)
        .mount(&proxy)
        .await;

    let data = proxied(&proxy)
        .send(&ApiRequest::ListRepositories)
        .await
        .unwrap();

    assert_eq!(data[0]["name"], "notes");
    let received = proxy.received_requests().await.unwrap();
    assert_eq!(received[0].url.host_str(), Some("api.github.invalid"));
}

#[tokio::test]
async fn test_proxied_upstream_maps_error_status() {
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/notes/contents/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&proxy)
        .await;

    let err = proxied(&proxy)
        .send(&ApiRequest::ListDirectory {
            owner: "octocat".to_string(),
            repo: "notes".to_string(),
            path: "gone".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("Not Found"));
}

#[tokio::test]
async fn test_proxied_upstream_current_user() {
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "login": "octocat"
        })))
        .mount(&proxy)
        .await;

    let identity = proxied(&proxy).current_user().await.unwrap();

    assert_eq!(identity.login, "octocat");
    assert_eq!(identity.id, 7);
}

#[test]
fn test_proxied_upstream_rejects_invalid_proxy_url() {
    let result = ProxiedUpstreamTransport::new(
        UNREACHABLE_UPSTREAM,
        SecretString::from("ghp_test"),
        "::not a proxy::",
    );

    assert!(matches!(result, Err(Error::Validation(_))));
}
