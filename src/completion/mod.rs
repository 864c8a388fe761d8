//! # Completion Module
//!
//! Text-completion capability used by the logic generator.
//!
//! The generator only needs `prompt in, text out`. [`TextCompletion`] is that
//! seam; two providers ship with the crate:
//!
//! - [`FixtureCompletion`] answers from a table of canned responses keyed by
//!   prompt substrings. Runs offline, deterministic, used by tests and the
//!   default CLI configuration.
//! - [`HttpCompletion`] calls an OpenAI-compatible chat-completions endpoint
//!   with a blocking `reqwest` client.
//!
//! Calls are synchronous and issued one at a time; a failure aborts the
//! generation run.

mod fixture;
mod http;

pub use fixture::FixtureCompletion;
pub use http::{HttpCompletion, HttpCompletionConfig};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Generates source text from a natural-language instruction.
pub trait TextCompletion {
    fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

impl<T: TextCompletion + ?Sized> TextCompletion for &T {
    fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        (**self).complete(prompt)
    }
}

impl<T: TextCompletion + ?Sized> TextCompletion for Box<T> {
    fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        (**self).complete(prompt)
    }
}

/// Which [`TextCompletion`] provider to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionProvider {
    #[default]
    Fixture,
    Http,
}

impl FromStr for CompletionProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixture" | "offline" => Ok(CompletionProvider::Fixture),
            "http" | "openai" => Ok(CompletionProvider::Http),
            other => Err(format!(
                "unknown completion provider '{other}' (expected fixture or http)"
            )),
        }
    }
}

impl fmt::Display for CompletionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionProvider::Fixture => f.write_str("fixture"),
            CompletionProvider::Http => f.write_str("http"),
        }
    }
}

/// Build the configured provider.
///
/// # Errors
///
/// Returns an error if the HTTP provider is selected without an API key or
/// its client cannot be built.
pub fn build_provider(
    provider: CompletionProvider,
    http: &HttpCompletionConfig,
) -> anyhow::Result<Box<dyn TextCompletion + Send + Sync>> {
    Ok(match provider {
        CompletionProvider::Fixture => Box::new(FixtureCompletion::default()),
        CompletionProvider::Http => Box::new(HttpCompletion::new(http.clone())?),
    })
}
