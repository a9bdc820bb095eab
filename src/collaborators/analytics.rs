//! Analytics bootstrap.
//!
//! Fire-and-forget: the page pushes a start marker into the tag manager's
//! data layer and loads its script once per session. Nothing waits on it
//! and failures are ignored.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::config::AnalyticsConfig;
use crate::error::CollaboratorError;
use crate::observability::{Event, EventEmitter};

/// Script endpoint of the tag manager.
pub const SCRIPT_BASE_URL: &str = "https://www.googletagmanager.com/gtm.js";

/// Receives the one-time analytics bootstrap.
#[async_trait::async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Bootstraps analytics for a session started at `now`.
    async fn bootstrap(&self, now: DateTime<Utc>) -> Result<(), CollaboratorError>;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

/// Tag-manager bootstrap reported through the event stream.
#[derive(Debug, Clone)]
pub struct TagManager {
    container_id: String,
    events: Arc<EventEmitter>,
}

impl TagManager {
    /// Creates a bootstrap for `container_id`.
    #[must_use]
    pub fn new(container_id: impl Into<String>, events: Arc<EventEmitter>) -> Self {
        Self {
            container_id: container_id.into(),
            events,
        }
    }

    /// Creates a bootstrap from configuration, or `None` when disabled.
    #[must_use]
    pub fn from_config(config: &AnalyticsConfig, events: Arc<EventEmitter>) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.container_id.clone(), events))
    }

    /// Container id.
    #[must_use]
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Script URL for the container.
    #[must_use]
    pub fn script_url(&self) -> String {
        script_url(&self.container_id)
    }
}

#[async_trait::async_trait]
impl AnalyticsSink for TagManager {
    async fn bootstrap(&self, now: DateTime<Utc>) -> Result<(), CollaboratorError> {
        let script_url = self.script_url();
        tracing::debug!(container = %self.container_id, %script_url, "analytics bootstrapped");
        self.events.emit(Event::AnalyticsBootstrapped {
            timestamp: now,
            container_id: self.container_id.clone(),
            script_url,
            data_layer: data_layer_push(now),
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "tag-manager"
    }
}

/// Script URL for `container_id`.
#[must_use]
pub fn script_url(container_id: &str) -> String {
    format!("{SCRIPT_BASE_URL}?id={container_id}")
}

/// The initial data-layer push.
#[must_use]
pub fn data_layer_push(now: DateTime<Utc>) -> serde_json::Value {
    json!({
        "gtm.start": now.timestamp_millis(),
        "event": "gtm.js",
    })
}

/// Runs `sink` in the background, logging and dropping any failure.
///
/// Does nothing outside a tokio runtime.
pub fn spawn_bootstrap(sink: Arc<dyn AnalyticsSink>) {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        tracing::warn!("no runtime available, analytics bootstrap skipped");
        return;
    };
    handle.spawn(async move {
        if let Err(e) = sink.bootstrap(Utc::now()).await {
            tracing::debug!(sink = sink.name(), error = %e, "analytics bootstrap failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use chrono::TimeZone;

    use super::*;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_script_url() {
        assert_eq!(
            script_url("GTM-5LXQPPV6"),
            "https://www.googletagmanager.com/gtm.js?id=GTM-5LXQPPV6"
        );
    }

    #[test]
    fn test_data_layer_push() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let push = data_layer_push(now);
        assert_eq!(push["gtm.start"], 1_700_000_000_123_i64);
        assert_eq!(push["event"], "gtm.js");
    }

    #[test]
    fn test_from_config_disabled() {
        let config = AnalyticsConfig {
            enabled: false,
            ..AnalyticsConfig::default()
        };
        assert!(TagManager::from_config(&config, Arc::new(EventEmitter::noop())).is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_emits_event() {
        let capture = Capture::default();
        let events = Arc::new(EventEmitter::new(Box::new(capture.clone())));
        let tags = TagManager::new("GTM-TEST", Arc::clone(&events));

        tags.bootstrap(Utc::now()).await.unwrap();

        let raw = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        let line: serde_json::Value = serde_json::from_str(raw.trim()).unwrap();
        assert_eq!(line["type"], "AnalyticsBootstrapped");
        assert_eq!(line["container_id"], "GTM-TEST");
        assert_eq!(line["data_layer"]["event"], "gtm.js");
        assert_eq!(events.event_count(), 1);
    }
}
