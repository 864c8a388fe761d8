//! # Configuration Module
//!
//! Settings for the pipeline, the HTTP front door and the completion provider.
//!
//! Values are layered, later sources winning:
//!
//! 1. built-in defaults
//! 2. a YAML file (`--config <file>` or `SKELGEN_CONFIG`)
//! 3. environment variables, after `.env` has been loaded
//! 4. command-line flags (applied by the CLI)
//!
//! ## Environment Variables
//!
//! | Variable                   | Default                                      |
//! |----------------------------|----------------------------------------------|
//! | `SKELGEN_PROJECTS_DIR`     | `projects`                                   |
//! | `SKELGEN_ADDR`             | `0.0.0.0:5000`                               |
//! | `SKELGEN_HANDLER_SCOPE`    | `user-slice` (or `extended`)                 |
//! | `SKELGEN_COMPLETION`       | `fixture` (or `http`)                        |
//! | `SKELGEN_LLM_URL`          | `https://api.openai.com/v1/chat/completions` |
//! | `SKELGEN_LLM_API_KEY`      | unset                                        |
//! | `SKELGEN_LLM_MODEL`        | `gpt-4o-mini`                                |
//! | `SKELGEN_LLM_TIMEOUT_SECS` | `120`                                        |
//!
//! ## Example file
//!
//! ```yaml
//! projects_dir: /srv/generated
//! addr: 127.0.0.1:8080
//! handler_scope: extended
//! completion: http
//! llm:
//!   model: gpt-4o
//!   timeout_secs: 60
//! ```

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::completion::{CompletionProvider, HttpCompletionConfig};
use crate::graph::HandlerScope;

pub const DEFAULT_PROJECTS_DIR: &str = "projects";
pub const DEFAULT_ADDR: &str = "0.0.0.0:5000";

/// Variable naming the YAML settings file.
pub const CONFIG_ENV: &str = "SKELGEN_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory generated projects are created under
    pub projects_dir: PathBuf,
    /// Listen address of the HTTP front door
    pub addr: String,
    pub handler_scope: HandlerScope,
    pub completion: CompletionProvider,
    /// Used when `completion` is `http`
    pub llm: HttpCompletionConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            projects_dir: PathBuf::from(DEFAULT_PROJECTS_DIR),
            addr: DEFAULT_ADDR.to_string(),
            handler_scope: HandlerScope::default(),
            completion: CompletionProvider::default(),
            llm: HttpCompletionConfig::default(),
        }
    }
}

impl Settings {
    /// Load `.env`, then the YAML file at `path` (or `SKELGEN_CONFIG`), then the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be read or parsed, or an
    /// environment variable holds an invalid value.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                warn!(error = %err, "failed to load .env");
            }
        }
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));
        let mut settings = match file {
            Some(file) => Self::from_file(&file)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| env::var(key).ok())?;
        debug!(?settings, "settings loaded");
        Ok(settings)
    }

    /// Parse a YAML settings file; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    /// Apply `SKELGEN_*` overrides looked up through `lookup`. Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error naming the variable when a value cannot be parsed.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get("SKELGEN_PROJECTS_DIR") {
            self.projects_dir = PathBuf::from(dir);
        }
        if let Some(addr) = get("SKELGEN_ADDR") {
            self.addr = addr;
        }
        if let Some(scope) = get("SKELGEN_HANDLER_SCOPE") {
            self.handler_scope = scope
                .parse()
                .map_err(|e: String| anyhow!("SKELGEN_HANDLER_SCOPE: {e}"))?;
        }
        if let Some(provider) = get("SKELGEN_COMPLETION") {
            self.completion = provider
                .parse()
                .map_err(|e: String| anyhow!("SKELGEN_COMPLETION: {e}"))?;
        }
        if let Some(url) = get("SKELGEN_LLM_URL") {
            self.llm.url = url;
        }
        if let Some(key) = get("SKELGEN_LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = get("SKELGEN_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(secs) = get("SKELGEN_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("SKELGEN_LLM_TIMEOUT_SECS: invalid value '{secs}'"))?;
        }
        Ok(())
    }
}
