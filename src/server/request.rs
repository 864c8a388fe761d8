use serde_json::Value;
use std::io::Read;
use tracing::{debug, warn};

/// Parsed HTTP request data used by `AppService`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    /// HTTP method, upper case
    pub method: String,
    /// Request path without the query string
    pub path: String,
    /// JSON body; `None` when absent or not valid JSON
    pub body: Option<Value>,
}

impl ParsedRequest {
    pub fn new(method: &str, url: &str, body: &[u8]) -> Self {
        let path = url.split('?').next().unwrap_or_default();
        let path = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };
        Self {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            body: parse_json_body(body),
        }
    }
}

/// Lenient JSON body parsing: empty or malformed bodies become `None`.
pub fn parse_json_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(error = %err, "ignoring non-JSON request body");
            None
        }
    }
}

/// Extract method, path and JSON body from a `tiny_http::Request`.
pub fn parse_request(req: &mut tiny_http::Request) -> ParsedRequest {
    let mut body = Vec::new();
    if let Err(err) = req.as_reader().read_to_end(&mut body) {
        warn!(error = %err, "failed to read request body");
        body.clear();
    }
    ParsedRequest::new(req.method().as_str(), req.url(), &body)
}
