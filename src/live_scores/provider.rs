use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("response body is not JSON: {0}")]
    Decode(String),
}

/// Trait that every upstream match feed must implement.
#[async_trait]
pub trait MatchSource: Send + Sync {
    /// Return the raw payload for all matches played on `date`.
    async fn fetch_matches(&self, date: NaiveDate) -> Result<serde_json::Value, FetchError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
