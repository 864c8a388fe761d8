//! # Server Module
//!
//! HTTP front door over the pipeline and the publisher.
//!
//! | Method    | Path                 | Handler                              |
//! |-----------|----------------------|--------------------------------------|
//! | `GET`     | `/`                  | service banner                       |
//! | `GET`     | `/api/health`        | `{ "status": "ok" }`                 |
//! | `POST`    | `/api/generate`      | normalize, scaffold, generate, document |
//! | `POST`    | `/api/deploy/render` | push and deploy a generated project  |
//! | `OPTIONS` | any                  | CORS preflight, `204`                |
//!
//! Every response carries `Access-Control-Allow-Origin: *`. Failures are
//! reported as `500` with `{ "message", "error" }`.

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_json_body, parse_request, ParsedRequest};
pub use response::{ApiResponse, CORS_HEADERS};
pub use service::{health_endpoint, root_endpoint, AppService, EnvLookup, DEFAULT_DEPLOY_PROJECT};
