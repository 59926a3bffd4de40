//! A mock GitHub for exercising commands end to end.

use net_disk_core::{UploadPolicy, ViewState};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{config::AppConfig, session::open_session};

pub const TEST_TOKEN: &str = "ghp_test_token";

pub fn repo_json(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{name} repository"),
        "private": id % 2 == 0,
        "language": "Rust",
        "updated_at": "2024-05-01T10:00:00Z",
        "html_url": format!("https://github.com/octocat/{name}")
    })
}

pub fn file_json(path: &str, size: u64) -> Value {
    entry_json(path, "file", size)
}

pub fn dir_json(path: &str) -> Value {
    entry_json(path, "dir", 0)
}

fn entry_json(path: &str, entry_type: &str, size: u64) -> Value {
    let name = path.rsplit('/').next().unwrap_or(path);
    json!({
        "name": name,
        "path": path,
        "type": entry_type,
        "sha": format!("sha-{path}"),
        "size": size
    })
}

/// Starts a server that knows `octocat` with the repositories `notes` (id 1)
/// and `photos` (id 2). `notes` holds `docs/` and `readme.md`; `docs` holds
/// `a.md`.
pub async fn mock_github() -> MockServer {
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

    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([repo_json(1, "notes"), repo_json(2, "photos")])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octocat/notes/contents"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([file_json("readme.md", 2048), dir_json("docs")])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octocat/notes/contents/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([file_json("docs/a.md", 10)])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octocat/photos/contents"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "This repository is empty."
        })))
        .mount(&server)
        .await;

    server
}

pub fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        api_base_url: server.uri(),
        ..AppConfig::default()
    }
}

pub async fn session_for(server: &MockServer) -> ViewState {
    open_session(&config_for(server), TEST_TOKEN)
        .await
        .expect("session should open")
}

pub async fn session_with_policy(server: &MockServer, policy: UploadPolicy) -> ViewState {
    let mut config = config_for(server);
    config.upload = policy;
    open_session(&config, TEST_TOKEN)
        .await
        .expect("session should open")
}
