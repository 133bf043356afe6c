pub mod football_data;
pub mod provider;

pub use football_data::FootballData;
pub use provider::{FetchError, MatchSource};

use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::snapshot::{MatchRecord, MatchStatus};

/// Competitions tracked by default:
/// PL=Premier League, PD=La Liga, CL=Champions League, BL1=Bundesliga, SA=Serie A
pub const DEFAULT_COMPETITIONS: [&str; 5] = ["PL", "PD", "CL", "BL1", "SA"];

/// Immutable set of competition codes a match must belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionFilter {
    codes: Vec<String>,
}

impl CompetitionFilter {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CompetitionFilter {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c == code)
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }
}

impl Default for CompetitionFilter {
    fn default() -> Self {
        CompetitionFilter::new(DEFAULT_COMPETITIONS)
    }
}

/// The upstream payload did not have the structure we rely on.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unexpected payload shape at {path}: expected {expected}")]
pub struct ShapeError {
    pub path: String,
    pub expected: &'static str,
}

impl ShapeError {
    fn new(path: String, expected: &'static str) -> Self {
        ShapeError { path, expected }
    }
}

#[derive(Debug, Error)]
pub enum TodayError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Fetch `date`'s matches from `source` and keep the tracked competitions.
pub async fn fetch_today(
    source: &dyn MatchSource,
    filter: &CompetitionFilter,
    date: NaiveDate,
) -> Result<Vec<MatchRecord>, TodayError> {
    info!(
        "Fetching {} matches from {} (competitions: {})",
        date,
        source.name(),
        filter.codes().join(", ")
    );
    let payload = source.fetch_matches(date).await?;
    Ok(filter_matches(&payload, filter)?)
}

/// Project every match of a tracked competition into a `MatchRecord`,
/// preserving upstream order. Structural surprises fail the whole batch
/// instead of dropping individual matches.
pub fn filter_matches(
    payload: &Value,
    filter: &CompetitionFilter,
) -> Result<Vec<MatchRecord>, ShapeError> {
    let matches = match payload.get("matches") {
        None | Some(Value::Null) => return Ok(vec![]),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ShapeError::new("matches".into(), "an array")),
    };

    let mut out = Vec::new();
    for (i, m) in matches.iter().enumerate() {
        let at = |key: &str| format!("matches[{}].{}", i, key);

        let code = required_str(m, &["competition", "code"], &at)?;
        if !filter.contains(code) {
            continue;
        }

        out.push(MatchRecord {
            league: required_str(m, &["competition", "name"], &at)?.to_string(),
            home: required_str(m, &["homeTeam", "name"], &at)?.to_string(),
            away: required_str(m, &["awayTeam", "name"], &at)?.to_string(),
            home_score: required_nullable_int(m, &["score", "fullTime", "home"], &at)?,
            away_score: required_nullable_int(m, &["score", "fullTime", "away"], &at)?,
            status: MatchStatus::from(required_str(m, &["status"], &at)?.to_string()),
            minute: optional_minute(m, &at)?,
        });
    }
    Ok(out)
}

fn lookup<'a>(
    value: &'a Value,
    keys: &[&str],
    at: &dyn Fn(&str) -> String,
) -> Result<&'a Value, ShapeError> {
    let mut current = value;
    for (depth, key) in keys.iter().enumerate() {
        current = current
            .get(key)
            .ok_or_else(|| ShapeError::new(at(&keys[..=depth].join(".")), "a present key"))?;
    }
    Ok(current)
}

fn required_str<'a>(
    value: &'a Value,
    keys: &[&str],
    at: &dyn Fn(&str) -> String,
) -> Result<&'a str, ShapeError> {
    lookup(value, keys, at)?
        .as_str()
        .ok_or_else(|| ShapeError::new(at(&keys.join(".")), "a string"))
}

/// The key must exist; `null` is a legitimate "no score yet".
fn required_nullable_int(
    value: &Value,
    keys: &[&str],
    at: &dyn Fn(&str) -> String,
) -> Result<Option<i32>, ShapeError> {
    match lookup(value, keys, at)? {
        Value::Null => Ok(None),
        v => v
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| ShapeError::new(at(&keys.join(".")), "an integer or null")),
    }
}

/// Minutes arrive as integers, occasionally as text such as "45" or "90+3".
/// Absent, `null` or text without a leading number ("HT") mean no minute;
/// any other type is a shape error.
fn optional_minute(
    value: &Value,
    at: &dyn Fn(&str) -> String,
) -> Result<Option<i32>, ShapeError> {
    let invalid = || ShapeError::new(at("minute"), "an integer, numeric string or null");
    match value.get("minute") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Some)
            .ok_or_else(invalid),
        Some(Value::String(text)) => {
            let digits: String = text
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            Ok(digits.parse().ok())
        }
        Some(_) => Err(invalid()),
    }
}
