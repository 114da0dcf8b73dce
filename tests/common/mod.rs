//! Shared test helpers for integration tests

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use async_trait::async_trait;
use lims::api::{ApiClient, ApiRequest, ApiResponse, Method, Transport};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Helper to get a lims command whose state lives in `home`
pub fn lims(home: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("lims"));
    cmd.env("LIMS_HOME", home.path())
        .env_remove("LIMS_API_URL")
        .env_remove("LIMS_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// Empty state directory
pub fn home() -> TempDir {
    TempDir::new().unwrap()
}

/// State directory with a stored session for `role`
pub fn signed_in(role: &str) -> TempDir {
    let home = home();
    lims(&home)
        .args(["session", "login", "--token", "test-token-1234", "--role", role])
        .assert()
        .success();
    home
}

/// Create a draft and return its id
pub fn create_draft(home: &TempDir, sets: &[&str]) -> String {
    let mut cmd = lims(home);
    cmd.args(["draft", "new", "-o", "id"]);
    for set in sets {
        cmd.args(["--set", set]);
    }
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "draft new failed: {:?}", output);
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Transport answering from canned responses keyed by method and path
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), Vec<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a response; the last queued one repeats once the rest are used
    pub fn on(&self, method: Method, path: &str, status: u16, body: Value) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push(ApiResponse::new(status, body));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn client(self: &Arc<Self>) -> ApiClient {
        ApiClient::new(self.clone()).with_token(Some("tok"))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> lims::api::error::Result<ApiResponse> {
        let key = (request.method, request.path.clone());
        self.requests.lock().unwrap().push(request);
        let mut routes = self.routes.lock().unwrap();
        let response = match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => ApiResponse::new(404, json!({"message": "Not found"})),
        };
        Ok(response)
    }
}
