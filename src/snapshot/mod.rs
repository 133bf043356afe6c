use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, warn};

pub mod models;
pub use models::{MatchRecord, MatchStatus, Snapshot};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was (re)written
    Written,
    /// The existing snapshot already held the same matches and was left alone
    Unchanged,
}

/// Owns the single snapshot file
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    path: PathBuf,
}

impl SnapshotWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotWriter { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the snapshot with `matches` stamped at `now`.
    ///
    /// The previous file is never merged with. When it already holds exactly
    /// these matches it is kept as is, so an unchanged upstream produces no
    /// diff for the publisher to pick up.
    pub fn write(&self, now: NaiveDateTime, matches: &[MatchRecord]) -> Result<WriteOutcome> {
        if let Some(previous) = self.read() {
            if previous.matches == matches {
                debug!("Snapshot {} already up to date", self.path.display());
                return Ok(WriteOutcome::Unchanged);
            }
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create snapshot directory {}", parent.display())
                })?;
            }
        }

        let snapshot = Snapshot {
            last_updated: now.format(TIMESTAMP_FORMAT).to_string(),
            matches: matches.to_vec(),
        };
        let body = to_pretty_json(&snapshot)?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("Failed to write snapshot {}", self.path.display()))?;
        Ok(WriteOutcome::Written)
    }

    /// Load the current snapshot. A missing or unparseable file reads as `None`.
    pub fn read(&self) -> Option<Snapshot> {
        let raw = std::fs::read(&self.path).ok()?;
        match serde_json::from_slice(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(
                    "Ignoring unreadable snapshot {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }
}

/// Pretty JSON with four-space indentation.
fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut ser)
        .context("Failed to serialize snapshot")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 19)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn record(home: &str, score: Option<i32>, minute: Option<i32>) -> MatchRecord {
        MatchRecord {
            league: "Premier League".into(),
            home: home.into(),
            away: "Chelsea".into(),
            home_score: score,
            away_score: score,
            status: if minute.is_some() {
                MatchStatus::InPlay
            } else {
                MatchStatus::Other("TIMED".into())
            },
            minute,
        }
    }

    #[test]
    fn test_write_creates_directory_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path().join("data").join("matches.json"));
        let matches = vec![record("Arsenal", Some(2), Some(67)), record("Spurs", None, None)];

        assert_eq!(writer.write(at(15, 4, 9), &matches).unwrap(), WriteOutcome::Written);

        let snapshot = writer.read().unwrap();
        assert_eq!(snapshot.last_updated, "2024-05-19 15:04:09");
        assert_eq!(snapshot.matches, matches);
    }

    #[test]
    fn test_pretty_printed_with_four_spaces() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path().join("matches.json"));
        writer.write(at(9, 0, 0), &[record("Arsenal", None, None)]).unwrap();

        let text = std::fs::read_to_string(writer.path()).unwrap();
        assert!(text.starts_with("{\n    \"last_updated\": \"2024-05-19 09:00:00\""));
        assert!(text.contains("\n            \"home_score\": null"));
    }

    #[test]
    fn test_unchanged_matches_leave_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path().join("matches.json"));
        let matches = vec![record("Arsenal", Some(1), Some(12))];

        writer.write(at(10, 0, 0), &matches).unwrap();
        let before = std::fs::read(writer.path()).unwrap();

        assert_eq!(writer.write(at(10, 5, 0), &matches).unwrap(), WriteOutcome::Unchanged);
        assert_eq!(std::fs::read(writer.path()).unwrap(), before);
    }

    #[test]
    fn test_changed_matches_replace_everything() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path().join("matches.json"));
        writer
            .write(at(10, 0, 0), &[record("Arsenal", Some(0), Some(5)), record("Spurs", None, None)])
            .unwrap();

        let next = vec![record("Everton", Some(1), Some(30))];
        assert_eq!(writer.write(at(10, 5, 0), &next).unwrap(), WriteOutcome::Written);

        let snapshot = writer.read().unwrap();
        assert_eq!(snapshot.matches, next);
        assert_eq!(snapshot.last_updated, "2024-05-19 10:05:00");
    }

    #[test]
    fn test_corrupt_snapshot_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matches.json");
        std::fs::write(&path, "{\"last_updated\": ").unwrap();
        let writer = SnapshotWriter::new(&path);

        assert!(writer.read().is_none());
        assert_eq!(writer.write(at(8, 0, 0), &[]).unwrap(), WriteOutcome::Written);
        assert_eq!(writer.read().unwrap().matches, vec![]);
    }
}
