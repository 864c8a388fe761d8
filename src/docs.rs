//! Renders the generated project's `README.md` from the graph.

use anyhow::Context;
use askama::Template;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::graph::Graph;

/// Row of the API endpoints table.
#[derive(Debug, Clone)]
pub struct ReadmeRoute {
    pub method: String,
    pub path: String,
    pub description: String,
}

/// Row of a schema table.
#[derive(Debug, Clone)]
pub struct ReadmeField {
    pub name: String,
    pub ty: String,
    /// Truthy attributes joined by `", "`
    pub constraints: String,
}

#[derive(Debug, Clone)]
pub struct ReadmeSchema {
    pub name: String,
    pub fields: Vec<ReadmeField>,
}

/// Template for the project `README.md`
#[derive(Template)]
#[template(path = "project/README.md.txt", escape = "none")]
pub struct ReadmeTemplate {
    pub name: String,
    pub routes: Vec<ReadmeRoute>,
    pub schemas: Vec<ReadmeSchema>,
}

impl ReadmeTemplate {
    pub fn from_graph(graph: &Graph) -> Self {
        Self {
            name: graph.project_name_or_default().to_string(),
            routes: graph
                .routes
                .iter()
                .map(|r| ReadmeRoute {
                    method: r.method.to_string(),
                    path: r.path.clone(),
                    description: r.description.clone(),
                })
                .collect(),
            schemas: graph
                .schemas
                .iter()
                .map(|s| ReadmeSchema {
                    name: s.name.clone(),
                    fields: s
                        .fields
                        .iter()
                        .map(|(name, field)| ReadmeField {
                            name: name.to_string(),
                            ty: field.ty.to_string(),
                            constraints: field.constraints().join(", "),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Write `README.md` at the project root, replacing any existing one.
///
/// # Errors
///
/// Returns an error if rendering or writing fails.
pub fn document(graph: &Graph, project_path: &Path) -> anyhow::Result<PathBuf> {
    let rendered = ReadmeTemplate::from_graph(graph).render()?;
    let path = project_path.join("README.md");
    fs::write(&path, rendered).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "generated README");
    Ok(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::graph::{normalize, Graph};
    use serde_json::json;

    #[test]
    fn test_readme_tables() {
        let graph = normalize(&json!({
            "projectName": "shop",
            "schemas": [{"name": "Product", "fields": {
                "name": {"type": "String", "unique": true},
                "description": {"type": "String", "required": false}
            }}]
        }));
        let dir = tempfile::tempdir().unwrap();
        let path = document(&graph, dir.path()).unwrap();
        let readme = fs::read_to_string(path).unwrap();

        assert!(readme.starts_with("# shop\n"));
        assert!(readme.contains("1.  `cd shop`"));
        assert!(readme.contains("| `POST` | `/api/users` | Create a new user. |"));
        assert!(readme.contains("| `GET` | `/api/users/:id` | Get a single user by their ID. |"));
        assert!(readme.contains("### Product Schema"));
        assert!(readme.contains("| `name` | `String` | required, unique |"));
        assert!(readme.contains("| `description` | `String` |  |"));
    }

    #[test]
    fn test_readme_without_routes_omits_table() {
        let readme = ReadmeTemplate::from_graph(&Graph::default()).render().unwrap();
        assert!(readme.starts_with("# my-express-app\n"));
        assert!(readme.contains("## API Endpoints"));
        assert!(!readme.contains("| Method |"));
    }

    #[test]
    fn test_document_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "old").unwrap();
        document(&Graph::default(), dir.path()).unwrap();
        let readme = fs::read_to_string(dir.path().join("README.md")).unwrap();
        assert!(!readme.contains("old"));
    }
}
