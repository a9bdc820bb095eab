//! Configuration schema types
//!
//! Every field is optional; an empty document (or no file at all) yields
//! the stock narrative. Durations stay as strings here and are parsed
//! into a [`crate::phase::Choreography`] after validation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default page-view counter endpoint.
pub const DEFAULT_VISITS_URL: &str =
    "https://api.counterapi.dev/v1/qatransformation-cv/portfolio_visits/up";

/// Default tag-manager container.
pub const DEFAULT_CONTAINER_ID: &str = "GTM-5LXQPPV6";

// ============================================================================
// Top-Level Configuration
// ============================================================================

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct PipelineConfig {
    /// Autorun timings
    #[serde(default)]
    pub timing: TimingConfig,

    /// Page-view counter
    #[serde(default)]
    pub visits: VisitsConfig,

    /// Analytics bootstrap
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Résumé dataset override; the built-in dataset is used otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<PathBuf>,
}

// ============================================================================
// Timing
// ============================================================================

/// Autorun timing overrides.
///
/// Lists must have exactly as many entries as the chain has steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct TimingConfig {
    /// Playback multiplier; `2.0` plays twice as fast
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,

    /// Interval between scenario line evaluations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_tick: Option<String>,

    /// Ticket chain: assign, in progress, fixed, advance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<Vec<String>>,

    /// Code-fix chain: four reveals, advance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_fix: Option<Vec<String>>,

    /// Pipeline re-run chain: four passing lines, advance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_run: Option<Vec<String>>,

    /// Release chain: add/commit, push, deployed, advance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<Vec<String>>,
}

// ============================================================================
// Collaborators
// ============================================================================

/// Page-view counter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct VisitsConfig {
    /// Whether to call the counter at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Counter endpoint returning `{"count": n}`
    #[serde(default = "default_visits_url")]
    pub url: String,

    /// Request timeout
    #[serde(default = "default_visits_timeout")]
    pub timeout: String,
}

impl Default for VisitsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_visits_url(),
            timeout: default_visits_timeout(),
        }
    }
}

/// Analytics bootstrap settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Whether to bootstrap analytics
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Tag-manager container id
    #[serde(default = "default_container_id")]
    pub container_id: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            container_id: default_container_id(),
        }
    }
}

const fn default_true() -> bool {
    true
}

fn default_visits_url() -> String {
    DEFAULT_VISITS_URL.to_string()
}

fn default_visits_timeout() -> String {
    "5s".to_string()
}

fn default_container_id() -> String {
    DEFAULT_CONTAINER_ID.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config: PipelineConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert!(config.visits.enabled);
        assert_eq!(config.visits.url, DEFAULT_VISITS_URL);
        assert_eq!(config.analytics.container_id, DEFAULT_CONTAINER_ID);
        assert!(config.resume.is_none());
    }

    #[test]
    fn test_partial_timing() {
        let yaml = r"
timing:
  speed: 4
  ticket: [1s, 1s, 1s, 1s]
";
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.timing.speed, Some(4.0));
        assert_eq!(config.timing.ticket.as_ref().map(Vec::len), Some(4));
        assert!(config.timing.commit.is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = serde_yaml::from_str::<PipelineConfig>("timing:\n  sped: 2\n").unwrap_err();
        assert!(err.to_string().contains("sped"));
    }
}
