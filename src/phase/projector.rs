//! Presentation projector
//!
//! Pure derivation of the view flags the renderer consumes. Nothing here
//! reads the clock or the controller; the same state always projects to
//! the same flags.

use serde::Serialize;

use super::command::Command;
use super::state::{NarrativeState, Phase, TicketStatus};

/// Modal shown above the résumé.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Overlay {
    /// Pipeline failure alert.
    Alert,
    /// BDD feature file evaluation.
    Scenarios,
    /// Defect ticket card.
    Ticket,
    /// Code-fix diff.
    CodeFix,
}

/// Banner at the bottom of the scenario overlay once evaluation ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioBanner {
    /// Failing rendition finished.
    CriticalFailures,
    /// Passing rendition finished.
    AutomationPassed,
}

/// Progress of one tracker entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerState {
    /// Already passed.
    Done,
    /// Active.
    Current,
    /// Not reached yet.
    Pending,
}

/// One tracker entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackerMarker {
    /// Phase this marker stands for
    pub phase: Phase,
    /// Progress
    pub state: MarkerState,
    /// Rendered as a failure instead of a success
    pub failed: bool,
}

/// Everything the renderer needs besides the raw state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewFlags {
    /// Active phase
    pub phase: Phase,
    /// Show the corrupted résumé
    pub is_degraded_view: bool,
    /// Show the console drawer
    pub is_console_open: bool,
    /// Ordinal of the active phase
    pub progress_index: usize,
    /// Guidance line in the action panel
    pub guidance_text: &'static str,
    /// The narrative is blocked on a user command
    pub is_waiting_on_user: bool,
    /// Active modal, if any
    pub overlay: Option<Overlay>,
    /// Command the UI should offer while waiting
    pub pending_command: Option<Command>,
    /// One marker per phase
    pub tracker: [TrackerMarker; 8],
    /// End-of-evaluation banner
    pub scenario_banner: Option<ScenarioBanner>,
    /// Ticket reached `Fixed`
    pub ticket_resolved: bool,
}

/// Projects `state` into view flags.
#[must_use]
pub fn project(state: &NarrativeState) -> ViewFlags {
    let phase = state.phase;
    let evaluated = state.scenarios_evaluated();
    let (guidance_text, is_waiting_on_user) = guidance(phase, evaluated);

    ViewFlags {
        phase,
        is_degraded_view: is_degraded(phase),
        is_console_open: matches!(
            phase,
            Phase::TestResults | Phase::PipelineRunPass | Phase::CommitFinal
        ),
        progress_index: phase.index(),
        guidance_text,
        is_waiting_on_user,
        overlay: overlay(phase),
        pending_command: pending_command(phase, evaluated),
        tracker: Phase::ALL.map(|marker| TrackerMarker {
            phase: marker,
            state: marker_state(phase, marker),
            failed: marker_failed(phase, marker, evaluated),
        }),
        scenario_banner: match phase {
            Phase::Gherkin if evaluated => Some(ScenarioBanner::CriticalFailures),
            Phase::PipelineRunPass if evaluated => Some(ScenarioBanner::AutomationPassed),
            _ => None,
        },
        ticket_resolved: state.ticket.status == TicketStatus::Fixed,
    }
}

/// Returns `true` while the corrupted résumé is on screen.
#[must_use]
pub const fn is_degraded(phase: Phase) -> bool {
    matches!(
        phase,
        Phase::FailedAlert
            | Phase::TestResults
            | Phase::Gherkin
            | Phase::JiraTicket
            | Phase::IdeFix
    )
}

const fn overlay(phase: Phase) -> Option<Overlay> {
    match phase {
        Phase::FailedAlert => Some(Overlay::Alert),
        Phase::Gherkin | Phase::PipelineRunPass => Some(Overlay::Scenarios),
        Phase::JiraTicket => Some(Overlay::Ticket),
        Phase::IdeFix => Some(Overlay::CodeFix),
        Phase::TestResults | Phase::CommitFinal | Phase::Fixed => None,
    }
}

const fn pending_command(phase: Phase, evaluated: bool) -> Option<Command> {
    match phase {
        Phase::FailedAlert => Some(Command::Start),
        Phase::TestResults => Some(Command::OpenScenarios),
        Phase::Gherkin if evaluated => Some(Command::ReportDefect),
        _ => None,
    }
}

const fn guidance(phase: Phase, evaluated: bool) -> (&'static str, bool) {
    match phase {
        Phase::FailedAlert => (
            "Click the blinking \"REVIEW LOGS\" button to start the self-healing process.",
            true,
        ),
        Phase::TestResults => (
            "Click \"VIEW BDD SCENARIOS\" (blinking yellow button) in the console below to see why tests failed.",
            true,
        ),
        Phase::Gherkin if evaluated => (
            "Evaluation finished with critical failures. Click \"REPORT BUG TO JIRA\" to continue.",
            true,
        ),
        Phase::Gherkin => (
            "Executing BDD scenarios evaluation step by step...",
            false,
        ),
        Phase::JiraTicket => (
            "The system is auto-assigning the ticket and working on the fix automatically...",
            false,
        ),
        Phase::IdeFix => (
            "Developer rewriting and fixing locators and data arrays in App.jsx...",
            false,
        ),
        Phase::PipelineRunPass => (
            "Opening BDD validation window and verifying all scenarios pass (green)...",
            false,
        ),
        Phase::CommitFinal => (
            "Tests successful. Performing final Commit simulating Production deployment (v2.0.0)...",
            false,
        ),
        Phase::Fixed => (
            "Process successfully completed! The CV is fully operational.",
            false,
        ),
    }
}

const fn marker_state(current: Phase, marker: Phase) -> MarkerState {
    if current.is_terminal() || marker.index() < current.index() {
        MarkerState::Done
    } else if marker.index() == current.index() {
        MarkerState::Current
    } else {
        MarkerState::Pending
    }
}

const fn marker_failed(current: Phase, marker: Phase, evaluated: bool) -> bool {
    match marker {
        Phase::FailedAlert => true,
        Phase::Gherkin => {
            marker.index() < current.index()
                || (marker.index() == current.index() && evaluated)
        }
        _ => false,
    }
}
