//! Autorun timings
//!
//! Every delay used by the autorun chains, parsed from human duration
//! strings (`"700ms"`, `"1.5s"`) and optionally scaled by a playback speed.

use std::time::Duration;

use crate::config::schema::TimingConfig;
use crate::error::ConfigError;

/// Resolved delays for every autorun chain.
///
/// Each array holds the delay before the corresponding step, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choreography {
    /// Interval between scenario line evaluations
    pub scenario_tick: Duration,
    /// Assignee, In Progress, Fixed, advance to code fix
    pub ticket: [Duration; 4],
    /// Four diff reveals, then advance to the pipeline re-run
    pub code_fix: [Duration; 5],
    /// Four passing log lines, then advance to the release commit
    pub pipeline_run: [Duration; 5],
    /// Add/commit, push, deployment line, then advance to the final phase
    pub commit: [Duration; 4],
}

impl Default for Choreography {
    fn default() -> Self {
        Self {
            scenario_tick: Duration::from_millis(700),
            ticket: millis([1500, 1000, 1500, 1500]),
            code_fix: millis([1500, 1000, 1500, 1000, 2500]),
            pipeline_run: millis([1500, 1500, 1500, 1000, 3000]),
            commit: millis([1000, 1500, 1500, 2500]),
        }
    }
}

fn millis<const N: usize>(values: [u64; N]) -> [Duration; N] {
    values.map(Duration::from_millis)
}

impl Choreography {
    /// Builds the choreography from configuration, applying `timing.speed`.
    ///
    /// Missing entries keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDuration` for unparsable strings and
    /// `ConfigError::InvalidValue` for wrong list lengths, for speeds that
    /// are not positive, or for speeds that stretch a delay past what a
    /// `Duration` can hold.
    pub fn from_config(config: &TimingConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let scenario_tick = config
            .scenario_tick
            .as_deref()
            .map(|s| parse_duration(s, "timing.scenario_tick"))
            .transpose()?
            .unwrap_or(defaults.scenario_tick);

        let base = Self {
            scenario_tick,
            ticket: parse_list(config.ticket.as_deref(), "timing.ticket", defaults.ticket)?,
            code_fix: parse_list(
                config.code_fix.as_deref(),
                "timing.code_fix",
                defaults.code_fix,
            )?,
            pipeline_run: parse_list(
                config.pipeline_run.as_deref(),
                "timing.pipeline_run",
                defaults.pipeline_run,
            )?,
            commit: parse_list(config.commit.as_deref(), "timing.commit", defaults.commit)?,
        };

        let speed = config.speed.unwrap_or(1.0);
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "timing.speed".to_string(),
                value: speed.to_string(),
                expected: "a positive number".to_string(),
            });
        }
        base.try_scaled(speed).ok_or_else(|| ConfigError::InvalidValue {
            field: "timing.speed".to_string(),
            value: speed.to_string(),
            expected: "a speed that keeps every delay representable".to_string(),
        })
    }

    /// Returns a copy with every delay divided by `speed`.
    ///
    /// Non-positive or non-finite speeds leave the timings unchanged; a
    /// delay that would overflow saturates at `Duration::MAX`.
    #[must_use]
    pub fn scaled(&self, speed: f64) -> Self {
        if !speed.is_finite() || speed <= 0.0 {
            return *self;
        }
        self.map(|d| Some(scale(d, speed).unwrap_or(Duration::MAX)))
            .unwrap_or(*self)
    }

    /// Like [`Self::scaled`], but `None` if any scaled delay overflows.
    #[must_use]
    pub fn try_scaled(&self, speed: f64) -> Option<Self> {
        if !speed.is_finite() || speed <= 0.0 {
            return Some(*self);
        }
        self.map(|d| scale(d, speed))
    }

    fn map(&self, f: impl Fn(Duration) -> Option<Duration>) -> Option<Self> {
        fn each<const N: usize>(
            ds: [Duration; N],
            f: &impl Fn(Duration) -> Option<Duration>,
        ) -> Option<[Duration; N]> {
            let mut out = ds;
            for d in &mut out {
                *d = f(*d)?;
            }
            Some(out)
        }
        Some(Self {
            scenario_tick: f(self.scenario_tick)?,
            ticket: each(self.ticket, &f)?,
            code_fix: each(self.code_fix, &f)?,
            pipeline_run: each(self.pipeline_run, &f)?,
            commit: each(self.commit, &f)?,
        })
    }

    /// Time the scenario ticker needs to evaluate every line.
    #[must_use]
    pub fn scenario_total(&self) -> Duration {
        self.scenario_tick
            .saturating_mul(u32::from(crate::phase::state::SCENARIO_STEPS))
    }

    /// Total time the unattended part of the narrative takes, from the
    /// defect report to the final phase. Saturates at `Duration::MAX`.
    #[must_use]
    pub fn autorun_total(&self) -> Duration {
        // The re-run advances after its log track regardless of the ticker.
        [
            sum(&self.ticket),
            sum(&self.code_fix),
            sum(&self.pipeline_run),
            sum(&self.commit),
        ]
        .into_iter()
        .fold(Duration::ZERO, Duration::saturating_add)
    }
}

/// Saturating sum of a delay list.
#[must_use]
pub fn sum(ds: &[Duration]) -> Duration {
    ds.iter().copied().fold(Duration::ZERO, Duration::saturating_add)
}

fn scale(d: Duration, speed: f64) -> Option<Duration> {
    if (speed - 1.0).abs() < f64::EPSILON {
        return Some(d);
    }
    Duration::try_from_secs_f64(d.as_secs_f64() / speed).ok()
}

/// Parses a human-readable duration string (`"700ms"`, `"1.5s"`, `"2m"`).
///
/// # Errors
///
/// Returns `ConfigError::InvalidDuration` naming `location` if the string
/// cannot be parsed.
pub fn parse_duration(s: &str, location: &str) -> Result<Duration, ConfigError> {
    let trimmed = s.trim();
    humantime::parse_duration(trimmed).map_err(|e| ConfigError::InvalidDuration {
        value: trimmed.to_string(),
        location: location.to_string(),
        message: e.to_string(),
    })
}

fn parse_list<const N: usize>(
    raw: Option<&[String]>,
    location: &str,
    default: [Duration; N],
) -> Result<[Duration; N], ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    if raw.len() != N {
        return Err(ConfigError::InvalidValue {
            field: location.to_string(),
            value: format!("{} entries", raw.len()),
            expected: format!("exactly {N} durations"),
        });
    }
    let mut out = default;
    for (i, s) in raw.iter().enumerate() {
        out[i] = parse_duration(s, &format!("{location}[{i}]"))?;
    }
    Ok(out)
}
