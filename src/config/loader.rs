//! Configuration loader
//!
//! Loading pipeline:
//! 1. Size check against [`ConfigLimits`]
//! 2. YAML parsing into [`PipelineConfig`]
//! 3. `CVPIPELINE_SPEED` override
//! 4. Validation (all issues collected)
//! 5. Freeze into `Arc` plus a resolved [`Choreography`]

use crate::config::schema::PipelineConfig;
use crate::config::validation::Validator;
use crate::error::{ConfigError, ValidationIssue};
use crate::phase::choreography::Choreography;

use std::path::Path;
use std::sync::Arc;

/// Environment variable overriding `timing.speed`.
pub const SPEED_ENV: &str = "CVPIPELINE_SPEED";

/// Environment variable overriding the configuration size limit.
pub const MAX_CONFIG_SIZE_ENV: &str = "CVPIPELINE_MAX_CONFIG_SIZE";

// ============================================================================
// Public API
// ============================================================================

/// Limits applied before parsing.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum configuration file size in bytes.
    pub max_config_size: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_config_size: env_or(MAX_CONFIG_SIZE_ENV, 1024 * 1024),
        }
    }
}

/// Result of loading a configuration.
#[derive(Debug)]
pub struct LoadResult {
    /// The validated configuration.
    pub config: Arc<PipelineConfig>,

    /// Timings resolved from `config.timing`.
    pub choreography: Choreography,

    /// Warnings encountered during validation.
    pub warnings: Vec<ValidationIssue>,
}

/// Configuration loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    limits: ConfigLimits,
    apply_env: bool,
}

impl ConfigLoader {
    /// Creates a loader with the given limits.
    ///
    /// Environment overrides are applied; see [`Self::without_env`].
    #[must_use]
    pub const fn new(limits: ConfigLimits) -> Self {
        Self {
            limits,
            apply_env: true,
        }
    }

    /// Creates a loader with default limits.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ConfigLimits::default())
    }

    /// Disables the `CVPIPELINE_SPEED` override.
    #[must_use]
    pub const fn without_env(mut self) -> Self {
        self.apply_env = false;
        self
    }

    /// Loads `path`, or the stock configuration when `path` is `None`.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_optional(&self, path: Option<&Path>) -> Result<LoadResult, ConfigError> {
        match path {
            Some(path) => self.load(path),
            None => self.finish(PipelineConfig::default(), "<defaults>"),
        }
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read or exceeds the size limit
    /// - YAML parsing fails
    /// - Validation reports any error
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if file_size > self.limits.max_config_size {
            return Err(ConfigError::TooLarge {
                size: file_size,
                limit: self.limits.max_config_size,
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let config = parse(&raw, path)?;
        self.finish(config, &path.display().to_string())
    }

    /// Loads a configuration from an in-memory document.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`], minus the file checks.
    pub fn load_str(&self, content: &str, label: &str) -> Result<LoadResult, ConfigError> {
        if content.len() > self.limits.max_config_size {
            return Err(ConfigError::TooLarge {
                size: content.len(),
                limit: self.limits.max_config_size,
            });
        }
        let config = parse(content, Path::new(label))?;
        self.finish(config, label)
    }

    fn finish(&self, mut config: PipelineConfig, label: &str) -> Result<LoadResult, ConfigError> {
        if self.apply_env {
            apply_speed_override(&mut config)?;
        }

        let result = Validator::new().validate(&config);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: label.to_string(),
                errors: result.errors,
            });
        }
        for warning in &result.warnings {
            tracing::warn!(config = label, "{warning}");
        }

        let choreography = Choreography::from_config(&config.timing)?;
        tracing::debug!(
            config = label,
            autorun_ms = u64::try_from(choreography.autorun_total().as_millis()).unwrap_or(u64::MAX),
            "configuration loaded"
        );

        Ok(LoadResult {
            config: Arc::new(config),
            choreography,
            warnings: result.warnings,
        })
    }
}

/// Parses a YAML document; an empty document yields the defaults.
fn parse(content: &str, path: &Path) -> Result<PipelineConfig, ConfigError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    if content.trim().is_empty() {
        return Ok(PipelineConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        line: e.location().map(|l| l.line()),
        message: e.to_string(),
    })
}

fn apply_speed_override(config: &mut PipelineConfig) -> Result<(), ConfigError> {
    let Ok(raw) = std::env::var(SPEED_ENV) else {
        return Ok(());
    };
    let speed = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidValue {
            field: SPEED_ENV.to_string(),
            value: raw.clone(),
            expected: "a positive number".to_string(),
        })?;
    config.timing.speed = Some(speed);
    Ok(())
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn loader() -> ConfigLoader {
        ConfigLoader::new(ConfigLimits {
            max_config_size: 1024,
        })
        .without_env()
    }

    #[test]
    fn test_defaults_without_file() {
        let result = loader().load_optional(None).unwrap();
        assert_eq!(*result.config, PipelineConfig::default());
        assert_eq!(result.choreography, Choreography::default());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timing:\n  speed: 2\n  scenario_tick: 100ms").unwrap();
        let result = loader().load(file.path()).unwrap();
        assert_eq!(result.choreography.scenario_tick, Duration::from_millis(50));
    }

    #[test]
    fn test_empty_file_is_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = loader().load(file.path()).unwrap();
        assert_eq!(result.choreography, Choreography::default());
    }

    #[test]
    fn test_missing_file() {
        let err = loader().load(Path::new("/nonexistent/cv.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn test_too_large() {
        let big = format!("# {}\n", "x".repeat(2048));
        let err = loader().load_str(&big, "big.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge { limit: 1024, .. }));
    }

    #[test]
    fn test_parse_error_has_line() {
        let err = loader()
            .load_str("timing:\n  speed: [\n", "broken.yaml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { line: Some(_), .. }));
    }

    #[test]
    fn test_validation_error_collects() {
        let err = loader()
            .load_str("timing:\n  speed: 0\n  commit: [1s]\n", "bad.yaml")
            .unwrap_err();
        let ConfigError::ValidationError { errors, .. } = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_warnings_are_returned() {
        let result = loader().load_str("timing:\n  speed: 60\n", "fast.yaml").unwrap();
        assert_eq!(result.warnings.len(), 1);
    }
}
