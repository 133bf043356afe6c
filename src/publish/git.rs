use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use super::{Vcs, VcsError};

/// `Vcs` backed by the `git` command line, run inside `repo_dir`.
///
/// The committer identity is passed with `-c` on every invocation so the
/// repository and global git configuration are never touched.
pub struct GitCli {
    repo_dir: PathBuf,
    user_name: String,
    user_email: String,
}

impl GitCli {
    pub fn new(repo_dir: impl Into<PathBuf>, user_name: &str, user_email: &str) -> Self {
        GitCli {
            repo_dir: repo_dir.into(),
            user_name: user_name.to_string(),
            user_email: user_email.to_string(),
        }
    }

    fn command(&self, args: &[&str]) -> (Command, String) {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.repo_dir)
            .arg("-c")
            .arg(format!("user.name={}", self.user_name))
            .arg("-c")
            .arg(format!("user.email={}", self.user_email))
            .args(args);
        (cmd, format!("git {}", args.join(" ")))
    }

    /// Run a command and return its output regardless of exit status.
    fn output(&self, args: &[&str]) -> Result<(Output, String), VcsError> {
        let (mut cmd, label) = self.command(args);
        debug!("Running {}", label);
        let output = cmd.output().map_err(|source| VcsError::Spawn {
            command: label.clone(),
            source,
        })?;
        Ok((output, label))
    }

    /// Run a command that must succeed and return its stdout.
    fn run(&self, args: &[&str]) -> Result<String, VcsError> {
        let (output, label) = self.output(args)?;
        if !output.status.success() {
            return Err(VcsError::Failed {
                command: label,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Object id `rev` points at, or `None` when it does not resolve.
    fn resolve(&self, rev: &str) -> Result<Option<String>, VcsError> {
        let (output, _) = self.output(&["rev-parse", "--verify", "--quiet", rev])?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl Vcs for GitCli {
    fn stage(&self, path: &Path) -> Result<(), VcsError> {
        self.run(&["add", "--", &path_arg(path)]).map(|_| ())
    }

    fn has_changes(&self, path: &Path) -> Result<bool, VcsError> {
        let status = self.run(&["status", "--porcelain", "--", &path_arg(path)])?;
        Ok(!status.trim().is_empty())
    }

    fn head_exists(&self) -> Result<bool, VcsError> {
        Ok(self.resolve("HEAD")?.is_some())
    }

    /// Compares HEAD with the remote-tracking ref, which git only moves on a
    /// successful push or fetch.
    fn needs_push(&self, remote: &str, branch: &str) -> Result<bool, VcsError> {
        let head = match self.resolve("HEAD")? {
            Some(head) => head,
            None => return Ok(false),
        };
        let pushed = self.resolve(&format!("refs/remotes/{}/{}", remote, branch))?;
        Ok(pushed.as_deref() != Some(head.as_str()))
    }

    fn commit(&self, message: &str) -> Result<(), VcsError> {
        self.run(&["commit", "-m", message]).map(|_| ())
    }

    fn amend(&self, message: &str) -> Result<(), VcsError> {
        self.run(&["commit", "--amend", "--allow-empty", "-m", message])
            .map(|_| ())
    }

    fn push(&self, remote: &str, branch: &str, force: bool) -> Result<(), VcsError> {
        let mut args = vec!["push"];
        if force {
            args.push("--force");
        }
        // Always record the upstream: a forced push can be the first one
        // that reaches the remote when the initial push failed.
        args.extend(["--set-upstream", remote, branch]);
        self.run(&args).map(|_| ())
    }
}
