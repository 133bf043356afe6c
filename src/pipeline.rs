use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{error, info, warn};

use crate::live_scores::{fetch_today, CompetitionFilter, FetchError, MatchSource, TodayError};
use crate::publish::{PublishOutcome, Publisher, Vcs};
use crate::snapshot::{SnapshotWriter, WriteOutcome};

/// How a run ended. Every variant exits 0; they only differ in what gets
/// logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Upstream answered with a non-success status; nothing was written
    UpstreamFailed { status: u16 },
    /// The request never produced a usable response
    FetchFailed(String),
    /// The response was not shaped as expected; nothing was written
    MalformedPayload(String),
    /// The snapshot could not be written
    WriteFailed(String),
    /// Snapshot written, publishing skipped by configuration
    DryRun { matches: usize },
    /// Snapshot matches the last commit
    NoChanges { matches: usize },
    Published {
        matches: usize,
        outcome: PublishOutcome,
    },
    /// Snapshot written but a git step failed; the next run retries the diff
    PublishFailed(String),
}

impl RunOutcome {
    pub fn log(&self) {
        match self {
            RunOutcome::UpstreamFailed { status } => {
                warn!("Run finished: upstream error {}, snapshot untouched", status)
            }
            RunOutcome::FetchFailed(e) => warn!("Run finished: fetch failed: {}", e),
            RunOutcome::MalformedPayload(e) => error!("Run finished: malformed payload: {}", e),
            RunOutcome::WriteFailed(e) => error!("Run finished: snapshot write failed: {}", e),
            RunOutcome::DryRun { matches } => {
                info!("Run finished: dry run, {} matches written, not published", matches)
            }
            RunOutcome::NoChanges { matches } => {
                info!("Run finished: no changes ({} matches), skipping push", matches)
            }
            RunOutcome::Published { matches, outcome } => match outcome {
                PublishOutcome::Initial => {
                    info!("Run finished: pushed initial commit ({} matches)", matches)
                }
                PublishOutcome::Repushed => info!(
                    "Run finished: pushed commit left over from a failed push ({} matches)",
                    matches
                ),
                _ => info!("Run finished: force-pushed update ({} matches)", matches),
            },
            RunOutcome::PublishFailed(e) => error!("Run finished: publish failed: {}", e),
        }
    }
}

/// Everything a run needs besides the clock.
pub struct Pipeline<'a, V: Vcs> {
    pub source: &'a dyn MatchSource,
    pub filter: &'a CompetitionFilter,
    pub writer: &'a SnapshotWriter,
    /// `None` disables publishing
    pub publisher: Option<&'a Publisher<V>>,
    /// Snapshot location relative to the repository root, as staged
    pub repo_path: &'a Path,
}

impl<V: Vcs> Pipeline<'_, V> {
    /// fetch → filter → write → publish, once. Failures end the run with a
    /// distinct outcome instead of propagating.
    pub async fn run_once(&self, now: NaiveDateTime) -> RunOutcome {
        let matches = match fetch_today(self.source, self.filter, now.date()).await {
            Ok(m) => m,
            Err(TodayError::Fetch(FetchError::Upstream { status, body })) => {
                error!("API Error: {} - {}", status, body);
                return RunOutcome::UpstreamFailed { status };
            }
            Err(TodayError::Fetch(e)) => return RunOutcome::FetchFailed(e.to_string()),
            Err(TodayError::Shape(e)) => return RunOutcome::MalformedPayload(e.to_string()),
        };

        let count = matches.len();
        match self.writer.write(now, &matches) {
            Ok(WriteOutcome::Written) => {
                info!("Saved {} matches to {}", count, self.writer.path().display())
            }
            Ok(WriteOutcome::Unchanged) => {
                info!("Matches unchanged, kept {}", self.writer.path().display())
            }
            Err(e) => return RunOutcome::WriteFailed(format!("{:#}", e)),
        }

        let publisher = match self.publisher {
            Some(p) => p,
            None => return RunOutcome::DryRun { matches: count },
        };

        match publisher.publish(self.repo_path) {
            Ok(PublishOutcome::NoChanges) => RunOutcome::NoChanges { matches: count },
            Ok(outcome) => RunOutcome::Published {
                matches: count,
                outcome,
            },
            Err(e) => RunOutcome::PublishFailed(e.to_string()),
        }
    }
}
