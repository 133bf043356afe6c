use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

/// Fetches today's matches, writes the snapshot and publishes it to git
#[derive(Parser, Debug, Clone)]
#[command(name = "score-publisher", version, about)]
pub struct Config {
    /// Directory holding the secrets file, the snapshot and the git working tree
    /// (defaults to the directory of the executable)
    #[arg(long, env = "SCORES_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Name of the credential file inside the base directory
    #[arg(long, env = "SCORES_SECRETS_FILE", default_value = "secrets.json")]
    pub secrets_file: String,

    /// Matches endpoint of the football-data API
    #[arg(
        long,
        env = "SCORES_API_URL",
        default_value = "https://api.football-data.org/v4/matches"
    )]
    pub api_url: String,

    /// Snapshot location, relative to the base directory
    #[arg(long, env = "SCORES_SNAPSHOT_PATH", default_value = "data/matches.json")]
    pub snapshot_path: PathBuf,

    /// Git remote the snapshot is pushed to
    #[arg(long, env = "SCORES_GIT_REMOTE", default_value = "origin")]
    pub git_remote: String,

    /// Branch the snapshot is pushed to
    #[arg(long, env = "SCORES_GIT_BRANCH", default_value = "main")]
    pub git_branch: String,

    /// Message of the amended data commit
    #[arg(long, env = "SCORES_UPDATE_MESSAGE", default_value = "Live Score Update")]
    pub update_message: String,

    /// Message of the very first commit when the branch has no history
    #[arg(long, env = "SCORES_INITIAL_MESSAGE", default_value = "Initial Commit")]
    pub initial_message: String,

    /// Committer name used for the bot commits
    #[arg(long, env = "SCORES_BOT_NAME", default_value = "ScoreBot")]
    pub bot_name: String,

    /// Committer email used for the bot commits
    #[arg(long, env = "SCORES_BOT_EMAIL", default_value = "bot@soccerwidget.com")]
    pub bot_email: String,

    /// HTTP timeout in seconds (no timeout when unset)
    #[arg(long, env = "SCORES_HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: Option<u64>,

    /// Write the snapshot but skip every git operation
    #[arg(long, env = "DRY_RUN", default_value = "false")]
    pub dry_run: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = url::Url::parse(&self.api_url)
            .with_context(|| format!("api_url is not a valid URL: {}", self.api_url))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!("api_url must use http or https, got {}", url.scheme());
        }
        if self.snapshot_path.as_os_str().is_empty() || self.snapshot_path.is_absolute() {
            anyhow::bail!("snapshot_path must be a relative path inside the base directory");
        }
        if self.secrets_file.trim().is_empty() {
            anyhow::bail!("secrets_file must not be empty");
        }
        for (name, value) in [
            ("git_remote", &self.git_remote),
            ("git_branch", &self.git_branch),
            ("update_message", &self.update_message),
            ("initial_message", &self.initial_message),
            ("bot_name", &self.bot_name),
            ("bot_email", &self.bot_email),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{} must not be empty", name);
            }
        }
        Ok(())
    }

    /// The configured base directory, or the directory of the running
    /// executable so scheduled runs do not depend on the working directory.
    pub fn resolve_base_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.base_dir {
            return Ok(dir.clone());
        }
        let exe = std::env::current_exe().context("Failed to locate the running executable")?;
        exe.parent()
            .map(Path::to_path_buf)
            .context("Executable has no parent directory")
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["score-publisher"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_validate() {
        let config = parse(&["--base-dir", "/srv/scores"]);
        assert!(config.validate().is_ok());
        assert_eq!(config.snapshot_path, PathBuf::from("data/matches.json"));
        assert_eq!(config.git_branch, "main");
        assert_eq!(config.http_timeout(), None);
        assert_eq!(config.resolve_base_dir().unwrap(), PathBuf::from("/srv/scores"));
    }

    #[test]
    fn test_rejects_absolute_snapshot_path() {
        let config = parse(&["--snapshot-path", "/tmp/matches.json"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = parse(&["--api-url", "ftp://example.com/matches"]);
        assert!(config.validate().is_err());
        let config = parse(&["--api-url", "not a url"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_blank_branch() {
        let config = parse(&["--git-branch", " "]);
        assert!(config.validate().is_err());
    }
}
