use serde_json::{json, Value};
use std::env;
use std::sync::Arc;
use tracing::{error, info};

use super::request::ParsedRequest;
use super::response::ApiResponse;
use crate::completion::TextCompletion;
use crate::config::Settings;
use crate::pipeline::{generate_backend, graph_payload};
use crate::publish::{PublishConfig, Publisher};
use crate::scaffold::validate_project_name;

/// Project deployed when the request names none and `PROJECT_NAME` is unset.
pub const DEFAULT_DEPLOY_PROJECT: &str = "generated-api";

/// Environment access used for the deployment settings.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Request handling for the HTTP front door.
///
/// Requests are handled one at a time; a generation run blocks the accept loop
/// until it finishes.
pub struct AppService {
    settings: Settings,
    completion: Box<dyn TextCompletion + Send + Sync>,
    env: EnvLookup,
}

impl AppService {
    pub fn new(settings: Settings, completion: Box<dyn TextCompletion + Send + Sync>) -> Self {
        Self {
            settings,
            completion,
            env: Arc::new(|key: &str| env::var(key).ok()),
        }
    }

    /// Replace the environment lookup used for deployment settings.
    pub fn with_env(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn call(&self, req: &ParsedRequest) -> ApiResponse {
        info!(method = %req.method, path = %req.path, "request");
        match (req.method.as_str(), req.path.as_str()) {
            ("OPTIONS", _) => ApiResponse::no_content(),
            ("GET", "/") => root_endpoint(),
            ("GET", "/api/health") => health_endpoint(),
            ("POST", "/api/generate") => self.generate_endpoint(req.body.as_ref()),
            ("POST", "/api/deploy/render") => self.deploy_endpoint(req.body.as_ref()),
            _ => ApiResponse::json(404, json!({ "message": "Not found" })),
        }
    }

    /// `POST /api/generate`: body is `{ "graphState": graph }` or the graph itself.
    pub fn generate_endpoint(&self, body: Option<&Value>) -> ApiResponse {
        let empty = json!({});
        let graph = graph_payload(body.unwrap_or(&empty));
        match generate_backend(graph, &self.settings, self.completion.as_ref()) {
            Ok(generation) => match serde_json::to_value(&generation.summary) {
                Ok(summary) => ApiResponse::json(200, summary),
                Err(err) => failure("Generation failed", &anyhow::Error::from(err)),
            },
            Err(err) => failure("Generation failed", &err),
        }
    }

    /// `POST /api/deploy/render`: publishes `<projects dir>/<projectName>`.
    pub fn deploy_endpoint(&self, body: Option<&Value>) -> ApiResponse {
        let name = body
            .and_then(|b| b.get("projectName"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .or_else(|| (self.env)("PROJECT_NAME").filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_DEPLOY_PROJECT.to_string());

        match self.deploy(&name) {
            Ok(result) => ApiResponse::json(200, result),
            Err(err) => failure("Deployment failed", &err),
        }
    }

    fn deploy(&self, name: &str) -> anyhow::Result<Value> {
        validate_project_name(name)?;
        let env = Arc::clone(&self.env);
        let config = PublishConfig::from_lookup(name, move |key| env(key))?;
        let project_root = self.settings.projects_dir.join(name);
        let outcome = Publisher::new(config).publish(&project_root, name)?;
        Ok(serde_json::to_value(outcome)?)
    }
}

/// `GET /api/health`
pub fn health_endpoint() -> ApiResponse {
    ApiResponse::json(200, json!({ "status": "ok" }))
}

/// `GET /`
pub fn root_endpoint() -> ApiResponse {
    ApiResponse::json(200, json!({ "status": "ok", "service": "skelgen" }))
}

fn failure(message: &str, err: &anyhow::Error) -> ApiResponse {
    let rendered = format!("{err:#}");
    error!(error = %rendered, "{message}");
    ApiResponse::json(500, json!({ "message": message, "error": rendered }))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::completion::FixtureCompletion;

    fn service(projects: &std::path::Path) -> AppService {
        let settings = Settings {
            projects_dir: projects.to_path_buf(),
            ..Settings::default()
        };
        AppService::new(settings, Box::new(FixtureCompletion::default()))
            .with_env(Arc::new(|_: &str| -> Option<String> { None }))
    }

    fn request(method: &str, path: &str, body: &str) -> ParsedRequest {
        ParsedRequest::new(method, path, body.as_bytes())
    }

    #[test]
    fn test_health_and_root() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        assert_eq!(
            svc.call(&request("GET", "/api/health", "")),
            ApiResponse::json(200, json!({"status": "ok"}))
        );
        let root = svc.call(&request("GET", "/", ""));
        assert_eq!(root.body.unwrap()["service"], "skelgen");
    }

    #[test]
    fn test_unknown_route_and_preflight() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let missing = svc.call(&request("GET", "/api/nope", ""));
        assert_eq!(missing.status, 404);
        assert_eq!(missing.body.unwrap()["message"], "Not found");
        assert_eq!(
            svc.call(&request("OPTIONS", "/api/generate", "")),
            ApiResponse::no_content()
        );
    }

    #[test]
    fn test_generate_with_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let res = svc.call(&request(
            "POST",
            "/api/generate",
            r#"{"graphState": {"projectName": "shop", "schemas": [{"name": "User", "fields": {}}]}}"#,
        ));
        assert_eq!(res.status, 200);
        let body = res.body.unwrap();
        assert_eq!(body["message"], "Multi-agent backend generation complete");
        assert_eq!(body["projectName"], "shop");
        let path = std::path::PathBuf::from(body["projectPath"].as_str().unwrap());
        assert!(path.join("src/models/user.model.js").is_file());
        assert!(path.join("README.md").is_file());
    }

    #[test]
    fn test_generate_rejects_bad_json_string() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let res = svc.call(&request("POST", "/api/generate", r#"{"graphState": "{nope"}"#));
        assert_eq!(res.status, 500);
        let body = res.body.unwrap();
        assert_eq!(body["message"], "Generation failed");
        assert!(body["error"].as_str().unwrap().contains("graphState must be an object"));
    }

    #[test]
    fn test_deploy_without_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let res = svc.call(&request("POST", "/api/deploy/render", "{}"));
        assert_eq!(res.status, 500);
        let body = res.body.unwrap();
        assert_eq!(body["message"], "Deployment failed");
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Missing required credentials"));
    }

    #[test]
    fn test_deploy_rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let res = svc.call(&request(
            "POST",
            "/api/deploy/render",
            r#"{"projectName": "../etc"}"#,
        ));
        assert_eq!(res.status, 500);
        assert!(res.body.unwrap()["error"]
            .as_str()
            .unwrap()
            .contains("invalid project name"));
    }
}
