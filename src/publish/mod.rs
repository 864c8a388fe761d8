//! # Publish Module
//!
//! Pushes a generated project to a shared git repository and asks the
//! deployment API (Render) to build it.
//!
//! ## Stages
//!
//! Publishing is a fixed sequence; each step is recorded once complete:
//!
//! ```text
//! Cloned → Reset → Copied → Committed → Pushed → DeployRequested
//! ```
//!
//! | Stage             | Effect                                                          |
//! |-------------------|-----------------------------------------------------------------|
//! | `Cloned`          | repository cloned into a scratch directory, branch checked out  |
//! | `Reset`           | everything except `.git` removed from the clone                 |
//! | `Copied`          | project tree copied into the clone root                         |
//! | `Committed`       | identity configured, all changes staged and committed           |
//! | `Pushed`          | branch pushed (`push -u`, falling back to a plain push)         |
//! | `DeployRequested` | service-creation request accepted (200 or 201)                  |
//!
//! A failure after the clone exists is reported as [`PublishError::Interrupted`]
//! with a [`PublishCheckpoint`]; [`Publisher::resume`] continues from the stage
//! after the last completed one, so a rejected deployment can be retried
//! without cloning or pushing again.
//!
//! ## Configuration
//!
//! See [`PublishConfig::from_env`]. `GITHUB_OWNER`, `GITHUB_TOKEN` and
//! `RENDER_API_KEY` are required; everything else has a default. The token is
//! only ever placed in the clone URL and is masked in logs and errors.

mod config;
mod git;
mod render;

pub use config::{
    redact_url, PublishConfig, DEFAULT_BRANCH, DEFAULT_BUILD_COMMAND, DEFAULT_GIT_USER_EMAIL,
    DEFAULT_GIT_USER_NAME, DEFAULT_REGION, DEFAULT_RENDER_API_URL, DEFAULT_REPO,
    DEFAULT_START_COMMAND, DEFAULT_TIMEOUT_SECS, REQUIRED_VARS,
};
pub use git::git_available;
pub use render::{service_request, RenderResponse};

use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use git::Git;

/// Name of the clone inside the scratch directory.
const CLONE_DIR: &str = "repo";

/// Publish steps in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStage {
    Cloned,
    Reset,
    Copied,
    Committed,
    Pushed,
    DeployRequested,
}

impl PublishStage {
    pub const ALL: [PublishStage; 6] = [
        PublishStage::Cloned,
        PublishStage::Reset,
        PublishStage::Copied,
        PublishStage::Committed,
        PublishStage::Pushed,
        PublishStage::DeployRequested,
    ];

    /// The stage that runs after this one, if any.
    pub fn next(self) -> Option<PublishStage> {
        Self::ALL
            .iter()
            .position(|s| *s == self)
            .and_then(|i| Self::ALL.get(i + 1))
            .copied()
    }
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishStage::Cloned => "cloned",
            PublishStage::Reset => "reset",
            PublishStage::Copied => "copied",
            PublishStage::Committed => "committed",
            PublishStage::Pushed => "pushed",
            PublishStage::DeployRequested => "deploy_requested",
        };
        f.write_str(name)
    }
}

/// Where an interrupted publish stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishCheckpoint {
    /// Last stage that completed
    pub stage: PublishStage,
    /// Scratch directory holding the clone; kept on disk until resumed
    pub work_dir: PathBuf,
    /// Whether the commit step produced a commit
    pub committed: bool,
}

impl PublishCheckpoint {
    fn clone_dir(&self) -> PathBuf {
        self.work_dir.join(CLONE_DIR)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Missing required credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),

    #[error("Project path does not exist: {}", .0.display())]
    ProjectNotFound(PathBuf),

    #[error("git failed during {stage} stage: `{command}` exited with {}: {stderr}", exit_status(.status))]
    Git {
        stage: PublishStage,
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Render deployment failed: {status} {body}")]
    Deploy { status: u16, body: String },

    #[error("deployment request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{source} (publish stopped after {} stage)", .checkpoint.stage)]
    Interrupted {
        checkpoint: PublishCheckpoint,
        #[source]
        source: Box<PublishError>,
    },
}

fn exit_status(status: &Option<i32>) -> String {
    status.map_or_else(|| "signal".to_string(), |code| code.to_string())
}

impl PublishError {
    /// The underlying failure, looking through [`PublishError::Interrupted`].
    pub fn root(&self) -> &PublishError {
        match self {
            PublishError::Interrupted { source, .. } => source.root(),
            other => other,
        }
    }

    /// Checkpoint to resume from, when the failure happened after cloning.
    pub fn checkpoint(&self) -> Option<&PublishCheckpoint> {
        match self {
            PublishError::Interrupted { checkpoint, .. } => Some(checkpoint),
            _ => None,
        }
    }
}

/// Repository and branch that received the push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushSummary {
    pub repo: String,
    pub branch: String,
}

/// Result of a completed publish.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishOutcome {
    pub push: PushSummary,
    pub render: RenderResponse,
    /// `false` when the tree matched the branch and the commit was skipped
    pub committed: bool,
    #[serde(skip)]
    pub stage: PublishStage,
}

/// Mutable state threaded through the stages.
struct Run<'p> {
    project_root: &'p Path,
    project_name: &'p str,
    work_dir: PathBuf,
    committed: bool,
    render: Option<RenderResponse>,
}

impl Run<'_> {
    fn clone_dir(&self) -> PathBuf {
        self.work_dir.join(CLONE_DIR)
    }
}

pub struct Publisher {
    config: PublishConfig,
}

impl Publisher {
    pub fn new(config: PublishConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    /// Push `project_root` and request a deployment.
    ///
    /// # Errors
    ///
    /// [`PublishError::ProjectNotFound`] before anything runs when the project
    /// directory is missing. Failures after the clone are wrapped in
    /// [`PublishError::Interrupted`] and leave the scratch directory in place
    /// for [`Publisher::resume`].
    pub fn publish(
        &self,
        project_root: &Path,
        project_name: &str,
    ) -> Result<PublishOutcome, PublishError> {
        if !project_root.is_dir() {
            return Err(PublishError::ProjectNotFound(project_root.to_path_buf()));
        }
        info!(
            project = project_name,
            repo = %self.config.repo_url,
            branch = %self.config.branch,
            "publishing project"
        );

        let work = tempfile::Builder::new()
            .prefix("skelgen-publish-")
            .tempdir()?;
        let mut run = Run {
            project_root,
            project_name,
            work_dir: work.path().to_path_buf(),
            committed: false,
            render: None,
        };

        // nothing worth resuming yet; `work` is removed on drop
        self.clone_repo(&run)?;
        // From here on the clone outlives failures so the run can resume.
        let _kept = work.keep();
        self.run_from(PublishStage::Cloned, &mut run)
    }

    /// Continue an interrupted publish from the stage after `checkpoint.stage`.
    ///
    /// # Errors
    ///
    /// Same as [`Publisher::publish`]; a new failure carries a fresh checkpoint.
    pub fn resume(
        &self,
        checkpoint: &PublishCheckpoint,
        project_root: &Path,
        project_name: &str,
    ) -> Result<PublishOutcome, PublishError> {
        if !project_root.is_dir() {
            return Err(PublishError::ProjectNotFound(project_root.to_path_buf()));
        }
        if !checkpoint.clone_dir().join(".git").is_dir() {
            return Err(PublishError::ProjectNotFound(checkpoint.clone_dir()));
        }
        info!(
            project = project_name,
            after = %checkpoint.stage,
            "resuming publish"
        );
        let mut run = Run {
            project_root,
            project_name,
            work_dir: checkpoint.work_dir.clone(),
            committed: checkpoint.committed,
            render: None,
        };
        self.run_from(checkpoint.stage, &mut run)
    }

    /// Run every stage after `completed`, wrapping failures with a checkpoint.
    fn run_from(
        &self,
        completed: PublishStage,
        run: &mut Run<'_>,
    ) -> Result<PublishOutcome, PublishError> {
        let mut last = completed;
        while let Some(stage) = last.next() {
            if let Err(err) = self.run_stage(stage, run) {
                warn!(stage = %stage, error = %err, "publish stage failed");
                return Err(PublishError::Interrupted {
                    checkpoint: PublishCheckpoint {
                        stage: last,
                        work_dir: run.work_dir.clone(),
                        committed: run.committed,
                    },
                    source: Box::new(err),
                });
            }
            info!(stage = %stage, "publish stage complete");
            last = stage;
        }

        if let Err(err) = fs::remove_dir_all(&run.work_dir) {
            warn!(error = %err, path = %run.work_dir.display(), "failed to remove publish scratch directory");
        }
        let render = run.render.take().ok_or(PublishError::Deploy {
            status: 0,
            body: "deployment stage did not run".to_string(),
        })?;
        Ok(PublishOutcome {
            push: PushSummary {
                repo: self.config.repo_url.clone(),
                branch: self.config.branch.clone(),
            },
            render,
            committed: run.committed,
            stage: last,
        })
    }

    fn git(&self) -> Git<'_> {
        Git::new(&self.config.git_bin, &self.config.github_token)
    }

    fn run_stage(&self, stage: PublishStage, run: &mut Run<'_>) -> Result<(), PublishError> {
        match stage {
            PublishStage::Cloned => self.clone_repo(run),
            PublishStage::Reset => reset_clone(&run.clone_dir()),
            PublishStage::Copied => copy_tree(run.project_root, &run.clone_dir()),
            PublishStage::Committed => {
                run.committed = self.commit(run)?;
                Ok(())
            }
            PublishStage::Pushed => self.push(&run.clone_dir()),
            PublishStage::DeployRequested => {
                run.render = Some(render::request_deploy(&self.config)?);
                Ok(())
            }
        }
    }

    fn clone_repo(&self, run: &Run<'_>) -> Result<(), PublishError> {
        let git = self.git();
        let url = self.config.authenticated_repo_url();
        git.run(PublishStage::Cloned, &run.work_dir, &["clone", &url, CLONE_DIR])?;
        git.run(
            PublishStage::Cloned,
            &run.clone_dir(),
            &["checkout", "-B", &self.config.branch],
        )?;
        Ok(())
    }

    /// Stage everything and commit; `Ok(false)` when there was nothing to commit.
    fn commit(&self, run: &Run<'_>) -> Result<bool, PublishError> {
        let git = self.git();
        let dir = run.clone_dir();
        let stage = PublishStage::Committed;
        git.run(stage, &dir, &["config", "user.name", &self.config.git_user_name])?;
        git.run(stage, &dir, &["config", "user.email", &self.config.git_user_email])?;
        git.run(stage, &dir, &["add", "."])?;

        let status = git.run(stage, &dir, &["status", "--porcelain"])?;
        if status.trim().is_empty() {
            info!("no changes to commit");
            return Ok(false);
        }
        let message = format!("Deploy {} app", run.project_name);
        git.run(stage, &dir, &["commit", "-m", &message])?;
        Ok(true)
    }

    fn push(&self, dir: &Path) -> Result<(), PublishError> {
        let git = self.git();
        let branch = self.config.branch.as_str();
        if let Err(err) = git.run(PublishStage::Pushed, dir, &["push", "-u", "origin", branch]) {
            warn!(error = %err, "push with upstream failed, retrying plain push");
            git.run(PublishStage::Pushed, dir, &["push", "origin", branch])?;
        }
        Ok(())
    }
}

/// Remove everything in the clone except `.git`.
fn reset_clone(dir: &Path) -> Result<(), PublishError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name() == ".git" {
            continue;
        }
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Copy the project tree into the clone root, preserving relative paths.
fn copy_tree(src: &Path, dest: &Path) -> Result<(), PublishError> {
    let walker = WalkDir::new(src)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(std::io::Error::other)?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
