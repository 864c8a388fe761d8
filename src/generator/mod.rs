//! # Generator Module
//!
//! Turns a normalized [`Graph`] into application logic inside a scaffolded
//! project, using a [`TextCompletion`] provider for the code itself.
//!
//! ## Stages
//!
//! ```text
//! schemas      → one prompt each      → src/models/<schema>.model.js
//! controllers  → one prompt each      → src/controllers/<schema>.controller.js (grouped by schema)
//! routes       → one prompt per group → src/routes/<group>.routes.js
//! routes dir   → wiring               → src/app.js (marker replaced)
//! ```
//!
//! Models reference nothing, controllers import their schema's model,
//! routers import controllers from the handler file of their first route's
//! schema, and `app.js` mounts every router under `/api/<group>`.
//!
//! Completion calls run one after another. The first failure aborts the run
//! and files already written stay on disk.

mod prompts;
mod wiring;
#[cfg(test)]
mod tests;

pub use prompts::{ControllerPrompt, ModelPrompt, PromptField, PromptRoute, RouterPrompt};
pub use wiring::{link_routes, route_registration, router_identifier};

use anyhow::Context;
use askama::Template;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::completion::TextCompletion;
use crate::extract::extract_code;
use crate::graph::Graph;

/// Errors specific to the generation stages.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("project directory {0} has not been scaffolded")]
    NotScaffolded(PathBuf),
    #[error("route marker not found in {0}")]
    MissingMarker(PathBuf),
    #[error("'{0}' cannot be used as a generated file name")]
    UnsafeFileName(String),
}

/// Files written by one [`LogicGenerator::generate`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub models: Vec<PathBuf>,
    pub controllers: Vec<PathBuf>,
    pub routes: Vec<PathBuf>,
    /// Mount names wired into `src/app.js`, in registration order
    pub mounted: Vec<String>,
}

/// Drives the completion provider over a graph and writes the results.
pub struct LogicGenerator<C> {
    completion: C,
}

impl<C: TextCompletion> LogicGenerator<C> {
    pub fn new(completion: C) -> Self {
        Self { completion }
    }

    /// Generate models, controllers and routers, then wire routers into `src/app.js`.
    ///
    /// # Errors
    ///
    /// Returns an error if the project has not been scaffolded, a completion
    /// call fails, a file cannot be written, or the route marker is missing.
    pub fn generate(&self, graph: &Graph, project_path: &Path) -> anyhow::Result<GenerationReport> {
        let src = project_path.join("src");
        if !src.join("app.js").is_file() {
            return Err(GenerateError::NotScaffolded(project_path.to_path_buf()).into());
        }
        info!(project = %project_path.display(), "generating application logic");

        let models = self.generate_models(graph, &src.join("models"))?;
        let controllers = self.generate_controllers(graph, &src.join("controllers"))?;
        let routes = self.generate_routes(graph, &src.join("routes"))?;
        let mounted = link_routes(&src)?;

        info!(
            models = models.len(),
            controllers = controllers.len(),
            routes = routes.len(),
            "application logic generation complete"
        );
        Ok(GenerationReport {
            models,
            controllers,
            routes,
            mounted,
        })
    }

    fn ask(&self, prompt: &str) -> anyhow::Result<String> {
        debug!(%prompt, "sending instruction");
        let raw = self.completion.complete(prompt)?;
        Ok(extract_code(&raw))
    }

    /// One model file per schema, named by the lower-cased schema name.
    pub fn generate_models(&self, graph: &Graph, models_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(graph.schemas.len());
        for schema in &graph.schemas {
            let prompt = ModelPrompt::for_schema(schema).render()?;
            let code = self
                .ask(&prompt)
                .with_context(|| format!("model generation failed for schema {}", schema.name))?;
            let path = models_dir.join(source_file(&schema.file_stem(), "model")?);
            write_source(&path, &code)?;
            written.push(path);
        }
        Ok(written)
    }

    /// One controller file per schema group: model import, then one function per handler.
    pub fn generate_controllers(
        &self,
        graph: &Graph,
        controllers_dir: &Path,
    ) -> anyhow::Result<Vec<PathBuf>> {
        let groups = graph.handlers_by_schema();
        let mut written = Vec::with_capacity(groups.len());
        for (schema, handlers) in groups {
            let stem = schema.to_lowercase();
            let mut code = format!("const {schema} = require('../models/{stem}.model');\n");
            for handler in handlers {
                let prompt = ControllerPrompt::for_handler(handler).render()?;
                let function = self.ask(&prompt).with_context(|| {
                    format!("controller generation failed for {}", handler.name)
                })?;
                code.push('\n');
                code.push_str(&function);
            }
            let path = controllers_dir.join(source_file(&stem, "controller")?);
            write_source(&path, &code)?;
            written.push(path);
        }
        Ok(written)
    }

    /// One router file per mount group.
    pub fn generate_routes(&self, graph: &Graph, routes_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let groups = graph.routes_by_group();
        let mut written = Vec::with_capacity(groups.len());
        for (group, routes) in groups {
            let prompt = RouterPrompt::for_group(group, &routes).render()?;
            let code = self
                .ask(&prompt)
                .with_context(|| format!("router generation failed for group {group}"))?;
            let path = routes_dir.join(source_file(group, "routes")?);
            write_source(&path, &code)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// `<stem>.<kind>.js`, refusing stems that are not a single plain path segment.
fn source_file(stem: &str, kind: &str) -> Result<String, GenerateError> {
    if stem.is_empty() || stem == "." || stem == ".." || stem.contains(['/', '\\', '\0']) {
        return Err(GenerateError::UnsafeFileName(stem.to_string()));
    }
    Ok(format!("{stem}.{kind}.js"))
}

fn write_source(path: &Path, code: &str) -> anyhow::Result<()> {
    fs::write(path, code).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "generated file");
    Ok(())
}
