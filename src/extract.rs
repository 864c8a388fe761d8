//! Strips completion scaffolding (fenced blocks, commentary) from generated text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Language tag the generated backend is written in.
pub const DEFAULT_LANGUAGE: &str = "javascript";

static JAVASCRIPT_FENCE: Lazy<Regex> = Lazy::new(|| fence_regex(DEFAULT_LANGUAGE));

fn fence_regex(lang: &str) -> Regex {
    // Escaped language tags always form a valid pattern.
    #[allow(clippy::expect_used)]
    Regex::new(&format!(r"(?s)```{}(.*?)```", regex::escape(lang)))
        .expect("fence pattern is valid")
}

/// Extract the first ```` ```javascript ```` block, or the trimmed input when there is none.
pub fn extract_code(raw: &str) -> String {
    extract_with(&JAVASCRIPT_FENCE, raw)
}

/// Extract the first fenced block tagged `lang`, or the trimmed input when there is none.
pub fn extract_code_for(raw: &str, lang: &str) -> String {
    if lang == DEFAULT_LANGUAGE {
        return extract_code(raw);
    }
    extract_with(&fence_regex(lang), raw)
}

fn extract_with(fence: &Regex, raw: &str) -> String {
    fence
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| raw.trim(), |body| body.as_str().trim())
        .to_string()
}
