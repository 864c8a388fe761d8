//! # Scaffold Module
//!
//! Creates the directory layout and static boilerplate of a generated project.
//!
//! ## Generated Structure
//!
//! ```text
//! <projects root>/<project name>/
//! ├── package.json
//! ├── .env
//! ├── .gitignore
//! └── src/
//!     ├── index.js            # listener on $PORT
//!     ├── app.js              # express app; routes spliced in at the marker
//!     ├── config/
//!     │   └── database.js     # mongoose bootstrap, exits on failure
//!     ├── controllers/
//!     ├── middleware/
//!     ├── models/
//!     └── routes/
//! ```
//!
//! ## Replacing an existing project
//!
//! Every run starts from scratch. The new tree is written into a staging
//! directory next to the target and swapped in with renames once complete:
//! the previous tree is moved aside, the staging tree takes its place, and the
//! previous tree is then deleted. Errors while writing leave the existing
//! project untouched.

mod templates;

pub use templates::{
    write_app_js, write_database_js, write_env_files, write_index_js, write_package_json,
    AppJsTemplate, DatabaseJsTemplate, EnvTemplate, GitignoreTemplate, IndexJsTemplate, ENV_PORT,
    FALLBACK_PORT, ROUTES_MARKER,
};

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{info, warn};

use crate::graph::Graph;

/// Subdirectories created under `src/`.
pub const SRC_DIRS: [&str; 5] = ["routes", "controllers", "models", "middleware", "config"];

/// Rejected project names.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScaffoldError {
    #[error("invalid project name '{0}': must be a single path segment")]
    InvalidProjectName(String),
}

/// Ensure a project name is usable as a single directory name.
pub fn validate_project_name(name: &str) -> Result<(), ScaffoldError> {
    let trimmed = name.trim();
    let bad = trimmed.is_empty()
        || trimmed != name
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(ScaffoldError::InvalidProjectName(name.to_string()));
    }
    Ok(())
}

/// Builds project skeletons under a common root directory.
#[derive(Debug, Clone)]
pub struct Scaffolder {
    projects_root: PathBuf,
}

impl Scaffolder {
    pub fn new(projects_root: impl Into<PathBuf>) -> Self {
        Self {
            projects_root: projects_root.into(),
        }
    }

    pub fn projects_root(&self) -> &Path {
        &self.projects_root
    }

    /// Create (or recreate) the skeleton for `graph` and return its absolute path.
    ///
    /// # Errors
    ///
    /// Returns an error if the project name is not a single path segment or any
    /// filesystem operation fails. On error any previous project at the target
    /// path is left as it was.
    pub fn scaffold(&self, graph: &Graph) -> anyhow::Result<PathBuf> {
        let name = graph.project_name_or_default();
        validate_project_name(name)?;

        fs::create_dir_all(&self.projects_root).with_context(|| {
            format!(
                "Failed to create projects root {}",
                self.projects_root.display()
            )
        })?;
        let root = fs::canonicalize(&self.projects_root)?;
        let target = root.join(name);
        info!(project = name, path = %target.display(), "scaffolding project");

        let staging = tempfile::Builder::new()
            .prefix(&format!(".{name}.staging-"))
            .tempdir_in(&root)
            .context("Failed to create staging directory")?;
        write_skeleton(staging.path(), name)?;
        swap_into_place(&root, staging, &target)?;

        info!(path = %target.display(), "project scaffolding complete");
        Ok(target)
    }
}

fn write_skeleton(base: &Path, name: &str) -> anyhow::Result<()> {
    let src = base.join("src");
    for dir in SRC_DIRS {
        fs::create_dir_all(src.join(dir))?;
    }
    write_package_json(base, name)?;
    write_env_files(base, name)?;
    write_index_js(&src)?;
    write_app_js(&src)?;
    write_database_js(&src.join("config"))?;
    Ok(())
}

fn swap_into_place(root: &Path, staging: TempDir, target: &Path) -> anyhow::Result<()> {
    // The displaced tree lives inside `trash` and is deleted when it drops.
    let trash = tempfile::Builder::new()
        .prefix(".replaced-")
        .tempdir_in(root)
        .context("Failed to create directory for the replaced project")?;
    let displaced = trash.path().join("previous");

    let had_previous = target.exists();
    if had_previous {
        fs::rename(target, &displaced)
            .with_context(|| format!("Failed to move aside {}", target.display()))?;
    }

    if let Err(err) = fs::rename(staging.path(), target) {
        if had_previous {
            if let Err(restore) = fs::rename(&displaced, target) {
                warn!(error = %restore, path = %target.display(), "failed to restore previous project");
            }
        }
        return Err(err).with_context(|| format!("Failed to move project into {}", target.display()));
    }
    // Staging now lives at `target`; keep TempDir from deleting it.
    let _staged = staging.keep();
    Ok(())
}
