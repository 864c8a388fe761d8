use std::path::Path;
use std::process::Command;
use tracing::debug;

use super::{redact_url, PublishError, PublishStage};

/// Thin wrapper over the git executable; every call runs to completion.
#[derive(Debug, Clone)]
pub(crate) struct Git<'a> {
    bin: &'a str,
    /// Masked in captured stderr
    secret: &'a str,
}

impl<'a> Git<'a> {
    pub(crate) fn new(bin: &'a str, secret: &'a str) -> Self {
        Self { bin, secret }
    }

    /// Run `git <args>` in `cwd`, returning stdout. Non-zero exit becomes [`PublishError::Git`].
    pub(crate) fn run(
        &self,
        stage: PublishStage,
        cwd: &Path,
        args: &[&str],
    ) -> Result<String, PublishError> {
        let command = self.display(args);
        debug!(%command, cwd = %cwd.display(), "running git");

        let output = Command::new(self.bin)
            .args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()?;
        if !output.status.success() {
            return Err(PublishError::Git {
                stage,
                command,
                status: output.status.code(),
                stderr: self.mask(String::from_utf8_lossy(&output.stderr).trim()),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn mask(&self, text: &str) -> String {
        if self.secret.is_empty() {
            return text.to_string();
        }
        text.replace(self.secret, "***")
    }

    fn display(&self, args: &[&str]) -> String {
        let mut parts = vec![self.bin.to_string()];
        parts.extend(args.iter().map(|arg| self.mask(&redact_url(arg))));
        parts.join(" ")
    }
}

/// Whether `git` can be executed at all.
pub fn git_available(bin: &str) -> bool {
    Command::new(bin)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
