use serde::{Deserialize, Serialize};

/// One match as published in the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Competition display name, e.g. "Premier League"
    pub league: String,
    pub home: String,
    pub away: String,
    /// Full-time home score; `None` until the match has started
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub status: MatchStatus,
    /// Current minute while in play
    pub minute: Option<i32>,
}

/// Match state, serialized with the upstream status codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MatchStatus {
    Scheduled,
    InPlay,
    Paused,
    Finished,
    /// Any other upstream code ("TIMED", "POSTPONED", ...), kept verbatim
    Other(String),
}

impl MatchStatus {
    pub fn as_str(&self) -> &str {
        match self {
            MatchStatus::Scheduled => "SCHEDULED",
            MatchStatus::InPlay => "IN_PLAY",
            MatchStatus::Paused => "PAUSED",
            MatchStatus::Finished => "FINISHED",
            MatchStatus::Other(code) => code,
        }
    }
}

impl From<String> for MatchStatus {
    fn from(code: String) -> Self {
        match code.as_str() {
            "SCHEDULED" => MatchStatus::Scheduled,
            "IN_PLAY" => MatchStatus::InPlay,
            "PAUSED" => MatchStatus::Paused,
            "FINISHED" => MatchStatus::Finished,
            _ => MatchStatus::Other(code),
        }
    }
}

impl From<MatchStatus> for String {
    fn from(status: MatchStatus) -> Self {
        match status {
            MatchStatus::Other(code) => code,
            other => other.as_str().to_string(),
        }
    }
}

/// The published file: a timestamp plus today's filtered matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Local time, `YYYY-MM-DD HH:MM:SS`
    pub last_updated: String,
    pub matches: Vec<MatchRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(MatchStatus::from("IN_PLAY".to_string()), MatchStatus::InPlay);
        assert_eq!(MatchStatus::from("FINISHED".to_string()), MatchStatus::Finished);
        assert_eq!(
            MatchStatus::from("TIMED".to_string()),
            MatchStatus::Other("TIMED".into())
        );
        assert_eq!(String::from(MatchStatus::Paused), "PAUSED");
        assert_eq!(String::from(MatchStatus::Other("POSTPONED".into())), "POSTPONED");
    }

    #[test]
    fn test_record_serializes_nulls() {
        let record = MatchRecord {
            league: "Serie A".into(),
            home: "Inter".into(),
            away: "Milan".into(),
            home_score: None,
            away_score: None,
            status: MatchStatus::Other("TIMED".into()),
            minute: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "TIMED");
        assert!(value["home_score"].is_null());
        assert!(value["minute"].is_null());
        let back: MatchRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
