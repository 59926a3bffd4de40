//! Tests for the router, end to end against a mock GitHub

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "ghp_test_token";

async fn app_for(server: &MockServer) -> Router {
    create_router(AppState::new(server.uri()))
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", format!("token {TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {TOKEN}"))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_of(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_requires_no_token() {
    let server = MockServer::start().await;
    let app = app_for(&server).await;

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = body_of(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_token_returns_401_envelope() {
    let server = MockServer::start().await;
    let app = app_for(&server).await;

    let request = Request::builder()
        .uri("/api/repos")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let header_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap();

    let body = body_of(response).await;
    assert_eq!(body["code"], 401);
    assert_eq!(body["success"], false);
    assert_eq!(body["requestId"], header_id.as_str());
    assert!(body.get("data").is_none());

    // Nothing was forwarded
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = MockServer::start().await;
    let app = app_for(&server).await;

    let request = Request::builder()
        .uri("/api/repos")
        .header("X-Request-Id", "trace-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "trace-123");
    let body = body_of(response).await;
    assert_eq!(body["requestId"], "trace-123");
}

#[tokio::test]
async fn test_list_repositories_wraps_upstream_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("sort", "updated"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "notes", "private": false },
            { "id": 2, "name": "photos", "private": true }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server).await;

    let response = app.oneshot(get_request("/api/repos")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["name"], "notes");
    assert_eq!(body["data"][1]["name"], "photos");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_list_root_directory() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/notes/contents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "readme.md", "path": "readme.md", "type": "file", "size": 12 }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server).await;

    let response = app
        .oneshot(get_request("/api/files/octocat/notes"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert_eq!(body["data"][0]["path"], "readme.md");
}

#[tokio::test]
async fn test_list_nested_directory() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/notes/contents/docs/2024"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "plan.md", "path": "docs/2024/plan.md", "type": "file", "size": 3 }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server).await;

    let response = app
        .oneshot(get_request("/api/files/octocat/notes/docs/2024"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert_eq!(body["data"][0]["name"], "plan.md");
}

#[tokio::test]
async fn test_missing_directory_returns_404_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/notes/contents/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest"
        })))
        .mount(&server)
        .await;
    let app = app_for(&server).await;

    let response = app
        .oneshot(get_request("/api/files/octocat/notes/gone"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_of(response).await;
    assert_eq!(body["code"], 404);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Not Found");
}

#[tokio::test]
async fn test_create_repository_forwards_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .and(body_json(json!({
            "name": "archive",
            "description": "Old files",
            "private": true,
            "auto_init": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 9,
            "name": "archive",
            "private": true,
            "html_url": "https://github.com/octocat/archive"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server).await;

    let request = json_request(
        "POST",
        "/api/repos",
        json!({
            "name": "archive",
            "description": "Old files",
            "private": true,
            "auto_init": true
        }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert_eq!(body["data"]["id"], 9);
}

#[tokio::test]
async fn test_create_repository_rejected_name_returns_422() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Repository creation failed."
        })))
        .mount(&server)
        .await;
    let app = app_for(&server).await;

    let response = app
        .oneshot(json_request("POST", "/api/repos", json!({ "name": "notes" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_of(response).await;
    assert_eq!(body["code"], 422);
    assert_eq!(body["message"], "Repository creation failed.");
}

#[tokio::test]
async fn test_create_repository_blank_name_is_not_forwarded() {
    let server = MockServer::start().await;
    let app = app_for(&server).await;

    let response = app
        .oneshot(json_request("POST", "/api/repos", json!({ "name": "  " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_write_file_forwards_content() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/repos/octocat/notes/contents/docs/a.md"))
        .and(body_json(json!({
            "message": "Upload a.md via GitNetDisk",
            "content": "aGk="
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": { "path": "docs/a.md", "sha": "abc" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server).await;

    let request = json_request(
        "PUT",
        "/api/file/octocat/notes/docs/a.md",
        json!({ "message": "Upload a.md via GitNetDisk", "content": "aGk=" }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert_eq!(body["data"]["content"]["path"], "docs/a.md");
}

#[tokio::test]
async fn test_write_large_file_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/repos/octocat/notes/contents/big.bin"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": { "path": "big.bin", "sha": "def" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let app = app_for(&server).await;

    let content = "A".repeat(4 * 1024 * 1024);
    let request = json_request(
        "PUT",
        "/api/file/octocat/notes/big.bin",
        json!({ "message": "Upload big.bin via GitNetDisk", "content": content }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert_eq!(body["data"]["content"]["path"], "big.bin");
}

#[tokio::test]
async fn test_requests_leave_through_caller_proxy() {
    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "notes", "private": false }
        ])))
        .expect(1)
        .mount(&proxy)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "login": "octocat"
        })))
        .expect(1)
        .mount(&proxy)
        .await;
    let app = create_router(AppState::new("http://api.github.invalid"));

    let mut request = get_request("/api/repos");
    request
        .headers_mut()
        .insert("x-proxy-url", proxy.uri().parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert_eq!(body["data"][0]["name"], "notes");

    let mut request = get_request("/api/user");
    request
        .headers_mut()
        .insert("x-proxy-url", proxy.uri().parse().unwrap());
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert_eq!(body["data"]["login"], "octocat");

    let received = proxy.received_requests().await.unwrap();
    assert!(received
        .iter()
        .all(|r| r.url.host_str() == Some("api.github.invalid")));
}

#[tokio::test]
async fn test_get_user_returns_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "login": "octocat",
            "avatar_url": "https://avatars.example/1"
        })))
        .mount(&server)
        .await;
    let app = app_for(&server).await;

    let response = app.oneshot(get_request("/api/user")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert_eq!(body["data"]["login"], "octocat");
    assert_eq!(body["data"]["id"], 1);
}

#[tokio::test]
async fn test_rejected_token_returns_401() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Bad credentials"
        })))
        .mount(&server)
        .await;
    let app = app_for(&server).await;

    let response = app.oneshot(get_request("/api/repos")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_of(response).await;
    assert_eq!(body["message"], "Bad credentials");
}
