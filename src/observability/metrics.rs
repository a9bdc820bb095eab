//! Metrics collection for `cvpipeline`.
//!
//! Prometheus-compatible counters and gauges for the narrative. All label
//! values come from closed enums (phase names, command keywords), so no
//! cardinality protection is needed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::CvPipelineError;
use crate::phase::{Command, Phase};

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`.  When `None`, the recorder is installed without
/// an HTTP endpoint.
///
/// # Errors
///
/// Returns `CvPipelineError::Io` if the recorder or HTTP listener
/// cannot be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), CvPipelineError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| CvPipelineError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(
        "cvpipeline_phase_transitions_total",
        "Total number of phase transitions by target phase and reason"
    );
    describe_counter!(
        "cvpipeline_stale_steps_total",
        "Autorun steps dropped because their phase was left"
    );
    describe_counter!(
        "cvpipeline_commands_total",
        "User commands issued, by command and whether the guard accepted it"
    );
    describe_gauge!(
        "cvpipeline_current_phase",
        "Index of the currently active phase"
    );
    describe_histogram!(
        "cvpipeline_visits_fetch_ms",
        "Page-view counter fetch duration in milliseconds"
    );
}

/// Records a phase transition.
pub fn record_phase_transition(to: Phase, reason: &'static str) {
    counter!(
        "cvpipeline_phase_transitions_total",
        "to" => to.name(),
        "reason" => reason,
    )
    .increment(1);
}

/// Sets the currently active phase gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_current_phase(phase: Phase) {
    gauge!("cvpipeline_current_phase").set(phase.index() as f64);
}

/// Records an autorun step dropped as stale.
pub fn record_stale_step() {
    counter!("cvpipeline_stale_steps_total").increment(1);
}

/// Records a user command and whether its guard accepted it.
pub fn record_command(command: Command, accepted: bool) {
    counter!(
        "cvpipeline_commands_total",
        "command" => command.keyword(),
        "accepted" => if accepted { "true" } else { "false" },
    )
    .increment(1);
}

/// Records how long the page-view counter fetch took.
pub fn record_visits_fetch(duration: Duration) {
    histogram!("cvpipeline_visits_fetch_ms").record(duration.as_secs_f64() * 1000.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_do_not_panic_without_recorder() {
        // metrics macros silently no-op when no global recorder is installed
        record_phase_transition(Phase::TestResults, "user");
        set_current_phase(Phase::Gherkin);
        record_stale_step();
        record_command(Command::Skip, false);
        record_visits_fetch(Duration::from_millis(12));
    }
}
