//! Configuration validation
//!
//! Runs on the deserialized [`PipelineConfig`] and collects every issue
//! instead of stopping at the first, so `cvpipeline validate` can report
//! them all at once.

use crate::config::schema::{PipelineConfig, TimingConfig};
use crate::error::{Severity, ValidationIssue};
use crate::phase::choreography::{self, Choreography, parse_duration};

/// Playback speeds above this make the narrative unreadable.
pub const MAX_READABLE_SPEED: f64 = 50.0;

// ============================================================================
// Public API
// ============================================================================

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration and returns every issue found.
    pub fn validate(&mut self, config: &PipelineConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_timing(&config.timing);
        self.validate_visits(config);
        self.validate_analytics(config);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Timing
    // ========================================================================

    fn validate_timing(&mut self, timing: &TimingConfig) {
        let errors_before = self.errors.len();
        if let Some(speed) = timing.speed {
            if !speed.is_finite() || speed <= 0.0 {
                self.add_error("timing.speed", "Speed must be a positive number");
            } else if speed > MAX_READABLE_SPEED {
                self.add_warning(
                    "timing.speed",
                    "Speed above 50 plays the narrative too fast to read",
                );
            }
        }

        if let Some(tick) = &timing.scenario_tick {
            match parse_duration(tick, "timing.scenario_tick") {
                Ok(d) if d.is_zero() => {
                    self.add_error("timing.scenario_tick", "Scenario tick must be non-zero");
                }
                Ok(_) => {}
                Err(e) => self.add_error("timing.scenario_tick", &e.to_string()),
            }
        }

        self.validate_list("timing.ticket", timing.ticket.as_deref(), 4);
        self.validate_list("timing.code_fix", timing.code_fix.as_deref(), 5);
        self.validate_list("timing.pipeline_run", timing.pipeline_run.as_deref(), 5);
        self.validate_list("timing.commit", timing.commit.as_deref(), 4);

        if self.errors.len() == errors_before {
            self.validate_choreography(timing);
        }
    }

    /// Checks the resolved, speed-scaled timings as a whole.
    fn validate_choreography(&mut self, timing: &TimingConfig) {
        let resolved = match Choreography::from_config(timing) {
            Ok(resolved) => resolved,
            Err(e) => {
                self.add_error("timing.speed", &e.to_string());
                return;
            }
        };
        if resolved.scenario_total() > choreography::sum(&resolved.pipeline_run) {
            self.add_warning(
                "timing.scenario_tick",
                "Scenario evaluation outlasts the pipeline re-run, so the passing banner is never shown",
            );
        }
    }

    fn validate_list(&mut self, path: &str, raw: Option<&[String]>, expected: usize) {
        let Some(raw) = raw else {
            return;
        };
        if raw.len() != expected {
            self.add_error(
                path,
                &format!("Expected exactly {expected} durations, got {}", raw.len()),
            );
        }
        for (i, s) in raw.iter().enumerate() {
            let location = format!("{path}[{i}]");
            if let Err(e) = parse_duration(s, &location) {
                self.add_error(&location, &e.to_string());
            }
        }
    }

    // ========================================================================
    // Collaborators
    // ========================================================================

    fn validate_visits(&mut self, config: &PipelineConfig) {
        let visits = &config.visits;
        if !(visits.url.starts_with("http://") || visits.url.starts_with("https://")) {
            self.add_error("visits.url", "Counter URL must use http or https");
        }
        match parse_duration(&visits.timeout, "visits.timeout") {
            Ok(d) if d.is_zero() => self.add_error("visits.timeout", "Timeout must be non-zero"),
            Ok(_) => {}
            Err(e) => self.add_error("visits.timeout", &e.to_string()),
        }
    }

    fn validate_analytics(&mut self, config: &PipelineConfig) {
        let analytics = &config.analytics;
        if analytics.enabled && analytics.container_id.trim().is_empty() {
            self.add_error(
                "analytics.container_id",
                "Container id is required when analytics is enabled",
            );
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(yaml: &str) -> ValidationResult {
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        Validator::new().validate(&config)
    }

    #[test]
    fn test_default_config_is_valid() {
        let result = Validator::new().validate(&PipelineConfig::default());
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_speed_overflowing_delays_is_error() {
        let result = validate("timing:\n  speed: 1.0e-20\n");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "timing.speed");
    }

    #[test]
    fn test_slow_ticker_warns() {
        let result = validate("timing:\n  scenario_tick: 2s\n");
        assert!(result.is_valid());
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.path == "timing.scenario_tick")
        );
    }

    #[test]
    fn test_huge_tick_is_accepted_with_warning() {
        let result = validate("timing:\n  scenario_tick: 3000000000000000000s\n");
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_collects_all_errors() {
        let result = validate(
            r"
timing:
  speed: -1
  scenario_tick: 0ms
  ticket: [1s, nope]
visits:
  url: ftp://example.com
",
        );
        let paths: Vec<_> = result.errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"timing.speed"));
        assert!(paths.contains(&"timing.scenario_tick"));
        assert!(paths.contains(&"timing.ticket"));
        assert!(paths.contains(&"timing.ticket[1]"));
        assert!(paths.contains(&"visits.url"));
    }

    #[test]
    fn test_fast_speed_warns() {
        let result = validate("timing:\n  speed: 80\n");
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_empty_container_id() {
        let result = validate("analytics:\n  container_id: ''\n");
        assert!(result.has_errors());

        let disabled = validate("analytics:\n  enabled: false\n  container_id: ''\n");
        assert!(disabled.is_valid());
    }

    #[test]
    fn test_bad_timeout() {
        let result = validate("visits:\n  timeout: forever\n");
        assert_eq!(result.errors[0].path, "visits.timeout");
    }
}
