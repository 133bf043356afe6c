//! Publishing the snapshot to a git remote.
//!
//! The remote branch never accumulates data commits: the first publish
//! creates a normal commit, every later one amends the tip and force-pushes.
//!
//! ```text
//!  stage ──▶ diff-check ──(clean)──▶ tip pushed? ──yes──▶ NoChanges
//!                │                        └──no──▶ force push ──▶ Repushed
//!                │
//!            HEAD exists?
//!             yes │ no
//!      amend+force │ commit+push -u
//!                ▼
//!        Amended / Initial
//! ```

pub mod git;

pub use git::GitCli;

use std::path::Path;

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// The version-control operations the publisher needs.
pub trait Vcs {
    /// Mark `path` as a pending change.
    fn stage(&self, path: &Path) -> Result<(), VcsError>;

    /// Whether `path` differs from the last committed state.
    fn has_changes(&self, path: &Path) -> Result<bool, VcsError>;

    /// Whether the current branch has at least one commit.
    fn head_exists(&self) -> Result<bool, VcsError>;

    /// Whether the local tip differs from what `remote/branch` last received,
    /// including when it was never pushed. `false` without a local commit.
    fn needs_push(&self, remote: &str, branch: &str) -> Result<bool, VcsError>;

    /// Create a new commit from the staged changes.
    fn commit(&self, message: &str) -> Result<(), VcsError>;

    /// Rewrite the tip commit with the staged changes and `message`.
    fn amend(&self, message: &str) -> Result<(), VcsError>;

    /// Push `branch` to `remote`. A forced push replaces the remote history;
    /// a regular one also records the upstream.
    fn push(&self, remote: &str, branch: &str, force: bool) -> Result<(), VcsError>;
}

#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub remote: String,
    pub branch: String,
    pub update_message: String,
    pub initial_message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Working tree matched the last commit; nothing was committed or pushed
    NoChanges,
    /// First commit on an empty branch, pushed normally
    Initial,
    /// Tip commit rewritten and force-pushed
    Amended,
    /// Nothing new to commit, but a commit left behind by a failed push was
    /// force-pushed
    Repushed,
}

pub struct Publisher<V: Vcs> {
    vcs: V,
    settings: PublishSettings,
}

impl<V: Vcs> Publisher<V> {
    pub fn new(vcs: V, settings: PublishSettings) -> Self {
        Publisher { vcs, settings }
    }

    #[cfg(test)]
    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    /// Commit and push `path` if it changed. `path` is relative to the
    /// repository root.
    pub fn publish(&self, path: &Path) -> Result<PublishOutcome, VcsError> {
        self.vcs.stage(path)?;

        let s = &self.settings;
        if !self.vcs.has_changes(path)? {
            // A previous run may have committed and then failed to push.
            if self.vcs.needs_push(&s.remote, &s.branch)? {
                self.vcs.push(&s.remote, &s.branch, true)?;
                info!("Force-pushed pending commit to {}/{}", s.remote, s.branch);
                return Ok(PublishOutcome::Repushed);
            }
            return Ok(PublishOutcome::NoChanges);
        }

        if self.vcs.head_exists()? {
            // The diff-check above already saw a real change; the amend may
            // still be empty at the commit level if the tip held the same tree.
            self.vcs.amend(&s.update_message)?;
            self.vcs.push(&s.remote, &s.branch, true)?;
            info!("Force-pushed amended commit to {}/{}", s.remote, s.branch);
            Ok(PublishOutcome::Amended)
        } else {
            self.vcs.commit(&s.initial_message)?;
            self.vcs.push(&s.remote, &s.branch, false)?;
            info!("Pushed initial commit to {}/{}", s.remote, s.branch);
            Ok(PublishOutcome::Initial)
        }
    }
}
