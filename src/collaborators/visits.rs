//! Page-view counter.
//!
//! One GET at session start against a counter endpoint answering
//! `{"count": n}`. The count is display-only; nothing in the narrative
//! reads it, and any failure simply leaves the header at "loading".

use std::time::{Duration, Instant};

use reqwest::redirect;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::VisitsConfig;
use crate::error::CollaboratorError;
use crate::observability::metrics;
use crate::phase::choreography::parse_duration;

/// Maximum accepted response body.
const MAX_RESPONSE_SIZE: usize = 64 * 1024;

/// Page views as shown in the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "count")]
pub enum VisitCount {
    /// Request outstanding or failed
    #[default]
    Loading,
    /// Counter answered
    Loaded(u64),
}

impl std::fmt::Display for VisitCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => f.write_str("..."),
            Self::Loaded(n) => write!(f, "{n}"),
        }
    }
}

/// Client for the page-view counter.
#[derive(Debug, Clone)]
pub struct VisitCounter {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl VisitCounter {
    /// Creates a counter client for `url`.
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError::Http` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, CollaboratorError> {
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::limited(3))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    /// Creates a counter client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError::Decode` if the configured timeout does
    /// not parse, or `CollaboratorError::Http` if the client cannot be built.
    pub fn from_config(config: &VisitsConfig) -> Result<Self, CollaboratorError> {
        let timeout = parse_duration(&config.timeout, "visits.timeout")
            .map_err(|e| CollaboratorError::Decode(e.to_string()))?;
        Self::new(config.url.clone(), timeout)
    }

    /// Endpoint this counter calls.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Performs the request and returns the count.
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError::Http` on transport failure, timeout or a
    /// non-success status, `CollaboratorError::Decode` if the body is not
    /// JSON and `CollaboratorError::MissingCount` if it carries no count.
    pub async fn fetch(&self) -> Result<u64, CollaboratorError> {
        debug!(url = %self.url, "fetching page views");
        let started = Instant::now();

        let mut response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        if response
            .content_length()
            .is_some_and(|len| len > MAX_RESPONSE_SIZE as u64)
        {
            return Err(body_too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > MAX_RESPONSE_SIZE {
                return Err(body_too_large());
            }
            body.extend_from_slice(&chunk);
        }

        metrics::record_visits_fetch(started.elapsed());
        parse_count(&body)
    }

    /// Fetches the count, degrading every failure to [`VisitCount::Loading`].
    pub async fn load(&self) -> VisitCount {
        match self.fetch().await {
            Ok(count) => {
                debug!(count, "page views loaded");
                VisitCount::Loaded(count)
            }
            Err(e) => {
                warn!(error = %e, url = %self.url, "page view counter unavailable");
                VisitCount::Loading
            }
        }
    }
}

fn body_too_large() -> CollaboratorError {
    CollaboratorError::Decode(format!(
        "response body exceeds {MAX_RESPONSE_SIZE} byte limit"
    ))
}

/// Extracts `count` from a counter response body.
///
/// Accepts an unsigned integer or a numeric string.
///
/// # Errors
///
/// Returns `CollaboratorError::Decode` for non-JSON bodies and
/// `CollaboratorError::MissingCount` when no usable count is present.
pub fn parse_count(body: &[u8]) -> Result<u64, CollaboratorError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| CollaboratorError::Decode(e.to_string()))?;
    match value.get("count") {
        Some(serde_json::Value::Number(n)) => n.as_u64().ok_or(CollaboratorError::MissingCount),
        Some(serde_json::Value::String(s)) => {
            s.trim().parse().map_err(|_| CollaboratorError::MissingCount)
        }
        _ => Err(CollaboratorError::MissingCount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count_number() {
        assert_eq!(parse_count(br#"{"count": 1234}"#).unwrap(), 1234);
    }

    #[test]
    fn test_parse_count_ignores_other_fields() {
        let body = br#"{"id": 7, "name": "portfolio_visits", "count": 9}"#;
        assert_eq!(parse_count(body).unwrap(), 9);
    }

    #[test]
    fn test_parse_count_string() {
        assert_eq!(parse_count(br#"{"count": "42"}"#).unwrap(), 42);
    }

    #[test]
    fn test_parse_count_missing() {
        assert!(matches!(
            parse_count(br#"{"value": 3}"#),
            Err(CollaboratorError::MissingCount)
        ));
        assert!(matches!(
            parse_count(br#"{"count": -1}"#),
            Err(CollaboratorError::MissingCount)
        ));
    }

    #[test]
    fn test_parse_count_not_json() {
        assert!(matches!(
            parse_count(b"<html>"),
            Err(CollaboratorError::Decode(_))
        ));
    }

    #[test]
    fn test_visit_count_display() {
        assert_eq!(VisitCount::Loading.to_string(), "...");
        assert_eq!(VisitCount::Loaded(12).to_string(), "12");
        assert_eq!(VisitCount::default(), VisitCount::Loading);
    }

    #[tokio::test]
    async fn test_load_unreachable_stays_loading() {
        let counter =
            VisitCounter::new("http://127.0.0.1:9/count", Duration::from_millis(200)).unwrap();
        assert_eq!(counter.load().await, VisitCount::Loading);
    }

    #[test]
    fn test_from_config_rejects_bad_timeout() {
        let config = VisitsConfig {
            timeout: "whenever".to_string(),
            ..VisitsConfig::default()
        };
        assert!(matches!(
            VisitCounter::from_config(&config),
            Err(CollaboratorError::Decode(_))
        ));
    }
}
