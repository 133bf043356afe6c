use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::provider::{FetchError, MatchSource};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Match feed backed by the football-data.org v4 API.
/// Docs: <https://www.football-data.org/documentation/api>
pub struct FootballData {
    http: Client,
    api_key: String,
    /// Matches endpoint, overridable for tests and mirrors
    endpoint: Url,
}

impl FootballData {
    pub fn new(api_key: String, endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid matches endpoint: {}", endpoint))?;
        Ok(FootballData {
            http,
            api_key,
            endpoint,
        })
    }

    /// Single-day window: `dateFrom` and `dateTo` are both `date`.
    fn matches_url(&self, date: NaiveDate) -> Url {
        let day = date.format(DATE_FORMAT).to_string();
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("dateFrom", &day)
            .append_pair("dateTo", &day);
        url
    }
}

#[async_trait]
impl MatchSource for FootballData {
    fn name(&self) -> &str {
        "football-data.org"
    }

    async fn fetch_matches(&self, date: NaiveDate) -> Result<serde_json::Value, FetchError> {
        let url = self.matches_url(date);
        debug!("Fetching matches from {}", url);

        let resp = self
            .http
            .get(url)
            .header("X-Auth-Token", &self.api_key)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(FetchError::Transport)?;
        if !status.is_success() {
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_url_uses_single_day_window() {
        let source = FootballData::new(
            "key".into(),
            "https://api.football-data.org/v4/matches",
            None,
        )
        .unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            source.matches_url(date).as_str(),
            "https://api.football-data.org/v4/matches?dateFrom=2024-03-09&dateTo=2024-03-09"
        );
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        assert!(FootballData::new("key".into(), "::nope::", None).is_err());
    }
}
