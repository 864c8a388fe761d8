//! End-to-end generation: normalize → scaffold → generate logic → document.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::path::PathBuf;
use tracing::info;

use crate::completion::TextCompletion;
use crate::config::Settings;
use crate::docs::document;
use crate::generator::{GenerationReport, LogicGenerator};
use crate::graph::{normalize_with, Graph};
use crate::scaffold::Scaffolder;

pub const GENERATION_COMPLETE: &str = "Multi-agent backend generation complete";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("graphState must be an object or JSON string: {0}")]
    InvalidGraph(String),
}

/// Response body of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSummary {
    pub message: String,
    pub project_path: PathBuf,
    /// The caller's `projectName` as sent; `null` when absent or not a string
    pub project_name: Option<String>,
}

/// Everything a generation run produced.
#[derive(Debug, Clone)]
pub struct Generation {
    pub graph: Graph,
    pub summary: GenerateSummary,
    pub report: GenerationReport,
    pub readme: PathBuf,
}

/// Pick the graph out of a request body: `graphState` when present and non-null, else the body.
pub fn graph_payload(body: &Value) -> &Value {
    match body.get("graphState") {
        Some(state) if !state.is_null() => state,
        _ => body,
    }
}

/// Accept a graph given as JSON or as a string containing JSON.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidGraph`] when a string does not parse as JSON.
pub fn parse_graph_input(raw: &Value) -> Result<Cow<'_, Value>, PipelineError> {
    match raw {
        Value::String(text) => serde_json::from_str(text)
            .map(Cow::Owned)
            .map_err(|e| PipelineError::InvalidGraph(e.to_string())),
        other => Ok(Cow::Borrowed(other)),
    }
}

/// Run the whole pipeline for one graph description.
///
/// # Errors
///
/// Propagates input, scaffolding, completion, filesystem and rendering failures.
/// Files written before a failure are left in place.
pub fn generate_backend(
    raw: &Value,
    settings: &Settings,
    completion: &dyn TextCompletion,
) -> anyhow::Result<Generation> {
    let input = parse_graph_input(raw)?;
    let requested_name = input
        .get("projectName")
        .and_then(Value::as_str)
        .map(str::to_string);
    let graph = normalize_with(&input, settings.handler_scope);
    info!(
        project = graph.project_name_or_default(),
        scope = %settings.handler_scope,
        "starting backend generation"
    );

    let project_path = Scaffolder::new(&settings.projects_dir).scaffold(&graph)?;
    let report = LogicGenerator::new(completion).generate(&graph, &project_path)?;
    let readme = document(&graph, &project_path)?;

    let summary = GenerateSummary {
        message: GENERATION_COMPLETE.to_string(),
        project_name: requested_name,
        project_path,
    };
    info!(path = %summary.project_path.display(), "backend generation complete");
    Ok(Generation {
        graph,
        summary,
        report,
        readme,
    })
}
