#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use serde_json::{json, Value};
use std::io::Read;
use std::path::Path;
use std::process::Command;
use std::sync::mpsc;
use std::thread;

/// The Product example graph with messy field types.
pub fn product_graph() -> Value {
    json!({
        "projectName": "shop-api",
        "schemas": [
            {"name": "User", "fields": {
                "username": {"type": "string", "unique": true},
                "email": {"type": "String email", "unique": true},
                "password": {"type": "STRING"}
            }},
            {"name": "Product", "fields": {
                "name": {"type": "String"},
                "price": {"type": "number"},
                "description": {"type": "String", "required": false},
                "inStock": {"type": "boolean"}
            }},
            "not a schema"
        ],
        "controllers": [{"name": "ignored", "schema": "Product", "logic": "n/a"}],
        "routes": [{"path": "/api/products", "method": "GET", "controller": "ignored"}]
    })
}

pub fn is_git_available() -> bool {
    skelgen::publish::git_available("git")
}

pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Create an empty bare repository at `path` whose default branch is `main`.
pub fn init_bare_repo(path: &Path) {
    std::fs::create_dir_all(path).unwrap();
    git(path, &["init", "--bare", "--quiet"]);
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
}

/// A request captured by [`mock_render`].
#[derive(Debug)]
pub struct CapturedRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Mock deployment API answering `responses` in order.
///
/// Returns the base URL (ending in `/v1`) and a receiver yielding each request.
pub fn mock_render(
    responses: Vec<(u16, &'static str)>,
) -> (String, mpsc::Receiver<CapturedRequest>) {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for (status, body) in responses {
            let Ok(mut request) = server.recv() else {
                return;
            };
            let mut raw = String::new();
            request.as_reader().read_to_string(&mut raw).unwrap();
            let captured = CapturedRequest {
                method: request.method().to_string(),
                url: request.url().to_string(),
                headers: request
                    .headers()
                    .iter()
                    .map(|h| (h.field.to_string(), h.value.to_string()))
                    .collect(),
                body: serde_json::from_str(&raw).unwrap_or(Value::Null),
            };
            let header =
                tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                    .unwrap();
            let response = tiny_http::Response::from_string(body)
                .with_status_code(status)
                .with_header(header);
            request.respond(response).unwrap();
            if tx.send(captured).is_err() {
                return;
            }
        }
    });
    (format!("http://{addr}/v1"), rx)
}
