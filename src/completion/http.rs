use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::TextCompletion;

const SYSTEM_PROMPT: &str =
    "You write production-quality Node.js code. Answer with a single ```javascript fenced block.";

/// Settings for [`HttpCompletion`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpCompletionConfig {
    /// Chat-completions endpoint URL
    pub url: String,
    /// Bearer token; required
    pub api_key: Option<String>,
    /// Model identifier sent with every request
    pub model: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    pub temperature: f32,
    /// Accepted for compatibility with older configs; requests are never retried
    pub max_retries: u32,
}

impl Default for HttpCompletionConfig {
    fn default() -> Self {
        Self {
            url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 120,
            temperature: 0.2,
            max_retries: 3,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat-completions provider.
pub struct HttpCompletion {
    client: reqwest::blocking::Client,
    config: HttpCompletionConfig,
    api_key: String,
}

impl HttpCompletion {
    /// # Errors
    ///
    /// Fails when no API key is configured or the HTTP client cannot be built.
    pub fn new(config: HttpCompletionConfig) -> anyhow::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow!("completion provider 'http' requires SKELGEN_LLM_API_KEY"))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build completion HTTP client")?;
        info!(url = %config.url, model = %config.model, "using HTTP completion provider");
        Ok(Self {
            client,
            config,
            api_key,
        })
    }
}

impl TextCompletion for HttpCompletion {
    fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let body = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };
        debug!(chars = prompt.len(), "sending completion request");
        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .with_context(|| format!("completion request to {} failed", self.config.url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            bail!("completion provider returned {status}: {text}");
        }
        let parsed: ChatResponse = response
            .json()
            .context("completion provider returned malformed JSON")?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("completion provider returned no choices"))
    }
}
