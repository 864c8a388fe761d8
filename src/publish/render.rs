use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{PublishConfig, PublishError};

/// Response of the service-creation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderResponse {
    pub status_code: u16,
    /// Parsed JSON when the response declares it, otherwise the raw text
    pub body: Value,
}

/// Service definition posted to `<api>/services`.
pub fn service_request(config: &PublishConfig) -> Value {
    json!({
        "serviceDetails": {
            "name": config.service_name,
            "type": "web_service",
            "repo": {
                "url": config.repo_url,
                "branch": config.branch,
            },
            "env": "node",
            "region": config.region,
            "buildCommand": config.build_command,
            "startCommand": config.start_command,
            "autoDeploy": true,
        }
    })
}

/// Ask the deployment API to create a web service for the pushed branch.
///
/// Only 200 and 201 count as success.
pub(crate) fn request_deploy(config: &PublishConfig) -> Result<RenderResponse, PublishError> {
    let endpoint = config.services_endpoint();
    info!(%endpoint, service = %config.service_name, "requesting deployment");

    let client = Client::builder().timeout(config.timeout).build()?;
    let resp = client
        .post(&endpoint)
        .bearer_auth(&config.render_api_key)
        .header(ACCEPT, "application/json")
        .header(CONTENT_TYPE, "application/json")
        .body(service_request(config).to_string())
        .send()?;

    let status = resp.status().as_u16();
    let is_json = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    let text = resp.text()?;

    if status != 200 && status != 201 {
        warn!(status, "deployment request rejected");
        return Err(PublishError::Deploy { status, body: text });
    }
    let body = if is_json {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    } else {
        Value::String(text)
    };
    Ok(RenderResponse {
        status_code: status,
        body,
    })
}
