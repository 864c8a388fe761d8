use std::env;
use std::time::Duration;
use url::Url;

use super::PublishError;

pub const DEFAULT_REPO: &str = "generated-projects";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_REGION: &str = "oregon";
pub const DEFAULT_BUILD_COMMAND: &str = "npm install";
pub const DEFAULT_START_COMMAND: &str = "node src/index.js";
pub const DEFAULT_GIT_USER_NAME: &str = "skelgen-bot";
pub const DEFAULT_GIT_USER_EMAIL: &str = "skelgen-bot@example.com";
pub const DEFAULT_RENDER_API_URL: &str = "https://api.render.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Variables that must be set before anything is touched.
pub const REQUIRED_VARS: [&str; 3] = ["GITHUB_OWNER", "GITHUB_TOKEN", "RENDER_API_KEY"];

/// Everything the publisher needs to push a project and request a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConfig {
    /// Public clone URL; credentials are added only when cloning
    pub repo_url: String,
    pub github_token: String,
    pub render_api_key: String,
    pub branch: String,
    pub region: String,
    pub build_command: String,
    pub start_command: String,
    pub service_name: String,
    pub git_user_name: String,
    pub git_user_email: String,
    /// Base URL of the deployment API, without the trailing `/services`
    pub render_api_url: String,
    pub timeout: Duration,
    /// git executable; `SKELGEN_GIT_BIN` lets tests point at a stub
    pub git_bin: String,
}

impl PublishConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::MissingCredentials`] naming every unset required variable.
    pub fn from_env(project_name: &str) -> Result<Self, PublishError> {
        Self::from_lookup(project_name, |key| env::var(key).ok())
    }

    /// Load using `lookup` for variable access. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::MissingCredentials`] naming every unset required variable.
    pub fn from_lookup<F>(project_name: &str, lookup: F) -> Result<Self, PublishError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let missing: Vec<String> = REQUIRED_VARS
            .iter()
            .filter(|key| get(**key).is_none())
            .map(|key| (*key).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PublishError::MissingCredentials(missing));
        }
        let owner = or("GITHUB_OWNER", "");
        let repo = or("GITHUB_REPO", DEFAULT_REPO);

        let timeout_secs = get("SKELGEN_PUBLISH_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            repo_url: format!("https://github.com/{owner}/{repo}.git"),
            github_token: or("GITHUB_TOKEN", ""),
            render_api_key: or("RENDER_API_KEY", ""),
            branch: or("GIT_BRANCH", DEFAULT_BRANCH),
            region: or("RENDER_REGION", DEFAULT_REGION),
            build_command: or("BUILD_COMMAND", DEFAULT_BUILD_COMMAND),
            start_command: or("START_COMMAND", DEFAULT_START_COMMAND),
            service_name: or("RENDER_SERVICE_NAME", project_name),
            git_user_name: or("GIT_USER_NAME", DEFAULT_GIT_USER_NAME),
            git_user_email: or("GIT_USER_EMAIL", DEFAULT_GIT_USER_EMAIL),
            render_api_url: or("RENDER_API_URL", DEFAULT_RENDER_API_URL),
            timeout: Duration::from_secs(timeout_secs),
            git_bin: or("SKELGEN_GIT_BIN", "git"),
        })
    }

    /// Clone URL carrying the token. Non-https URLs (local paths, ssh) are returned as-is.
    pub fn authenticated_repo_url(&self) -> String {
        match Url::parse(&self.repo_url) {
            Ok(mut url) if url.scheme() == "https" && !self.github_token.is_empty() => {
                if url.set_username(&self.github_token).is_err() {
                    return self.repo_url.clone();
                }
                url.to_string()
            }
            _ => self.repo_url.clone(),
        }
    }

    /// `POST` target for service creation.
    pub fn services_endpoint(&self) -> String {
        format!("{}/services", self.render_api_url.trim_end_matches('/'))
    }
}

/// Hide credentials embedded in a URL. Strings that are not URLs pass through.
pub fn redact_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) if !url.username().is_empty() || url.password().is_some() => {
            if url.set_password(None).is_err() || url.set_username("***").is_err() {
                return raw.to_string();
            }
            url.to_string()
        }
        _ => raw.to_string(),
    }
}
