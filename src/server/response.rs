use serde_json::Value;
use std::io::Cursor;
use tiny_http::{Header, Response};

/// Headers attached to every response.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type, Authorization"),
];

/// Status and JSON body produced by `AppService`, independent of the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// `None` for empty responses (preflight)
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }

    /// Convert into a `tiny_http` response carrying the CORS headers.
    pub fn into_http(self) -> Response<Cursor<Vec<u8>>> {
        let is_json = self.body.is_some();
        let bytes = self.body.map(|b| b.to_string().into_bytes()).unwrap_or_default();
        let mut response = Response::from_data(bytes).with_status_code(self.status);
        if is_json {
            response = with_header(response, "Content-Type", "application/json");
        }
        for (name, value) in CORS_HEADERS {
            response = with_header(response, name, value);
        }
        response
    }
}

fn with_header(
    response: Response<Cursor<Vec<u8>>>,
    name: &str,
    value: &str,
) -> Response<Cursor<Vec<u8>>> {
    match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}
