//! Narrative state representation
//!
//! Plain data for the phase, console log, defect ticket and the two
//! sub-step counters. All mutation goes through the controller in
//! [`super::engine`]; this module only guards the value ranges and the
//! forward-only ticket workflow.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of scripted BDD lines evaluated by the scenario counter.
pub const SCENARIO_STEPS: u8 = 8;

/// Number of diff reveals in the code-fix view.
pub const FIX_STEPS: u8 = 4;

// ============================================================================
// Phase
// ============================================================================

/// One named stage of the narrative.
///
/// Declaration order is the narrative order; [`Phase::index`] is used for
/// past/current/future comparisons in the progress tracker.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Simulated pipeline failure alert; waiting for the viewer.
    #[default]
    FailedAlert,
    /// Console shows the failing test report.
    TestResults,
    /// BDD scenario file evaluated line by line (failing rendition).
    Gherkin,
    /// Defect ticket assigned and resolved automatically.
    JiraTicket,
    /// Code-fix diff revealed step by step.
    IdeFix,
    /// Pipeline re-run; scenario file evaluated again (passing rendition).
    PipelineRunPass,
    /// Release commit and deployment.
    CommitFinal,
    /// Terminal phase: the real résumé is shown.
    Fixed,
}

impl Phase {
    /// All phases in narrative order.
    pub const ALL: [Self; 8] = [
        Self::FailedAlert,
        Self::TestResults,
        Self::Gherkin,
        Self::JiraTicket,
        Self::IdeFix,
        Self::PipelineRunPass,
        Self::CommitFinal,
        Self::Fixed,
    ];

    /// Zero-based position in the narrative order.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the phase at `index`, if any.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Canonical upper-snake-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FailedAlert => "FAILED_ALERT",
            Self::TestResults => "TEST_RESULTS",
            Self::Gherkin => "GHERKIN",
            Self::JiraTicket => "JIRA_TICKET",
            Self::IdeFix => "IDE_FIX",
            Self::PipelineRunPass => "PIPELINE_RUN_PASS",
            Self::CommitFinal => "COMMIT_FINAL",
            Self::Fixed => "FIXED",
        }
    }

    /// Label shown in the progress tracker.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FailedAlert => "Pipeline Alert",
            Self::TestResults => "Log Analysis",
            Self::Gherkin => "Executing automation test",
            Self::JiraTicket => "Defect Management",
            Self::IdeFix => "Code Correction",
            Self::PipelineRunPass => "Playwright test",
            Self::CommitFinal => "Release & Deploy",
            Self::Fixed => "Operational CV",
        }
    }

    /// Returns `true` for the final phase.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Fixed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Console log
// ============================================================================

/// Visual category of a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Neutral output.
    Info,
    /// Failure output.
    Error,
    /// Passing output.
    Success,
    /// A command echoed by the simulated runner.
    Command,
    /// Pipeline/system announcements.
    System,
}

/// One console line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Rendered text
    pub message: String,
    /// Visual category
    pub kind: LogKind,
}

impl LogEntry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

// ============================================================================
// Ticket
// ============================================================================

/// Workflow status of the defect ticket.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum TicketStatus {
    /// Freshly reported.
    #[default]
    #[serde(rename = "To Do")]
    ToDo,
    /// Picked up by the team.
    #[serde(rename = "In Progress")]
    InProgress,
    /// Resolved.
    Fixed,
}

impl TicketStatus {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ToDo => "To Do",
            Self::InProgress => "In Progress",
            Self::Fixed => "Fixed",
        }
    }
}

/// Ticket assignee.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum Assignee {
    /// Nobody yet.
    #[default]
    Unassigned,
    /// The development team.
    #[serde(rename = "Dev Team")]
    DevTeam,
}

impl Assignee {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unassigned => "Unassigned",
            Self::DevTeam => "Dev Team",
        }
    }
}

/// Defect ticket fields shown in the ticket card.
///
/// Both fields only move forward; a backwards update is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TicketState {
    /// Workflow status
    pub status: TicketStatus,
    /// Current assignee
    pub assignee: Assignee,
}

impl TicketState {
    /// The state forced by a skip.
    pub const RESOLVED: Self = Self {
        status: TicketStatus::Fixed,
        assignee: Assignee::DevTeam,
    };

    /// Moves the status forward. Returns `true` if it changed.
    pub fn advance_status(&mut self, to: TicketStatus) -> bool {
        if to > self.status {
            self.status = to;
            true
        } else {
            false
        }
    }

    /// Moves the assignee forward. Returns `true` if it changed.
    pub fn assign(&mut self, to: Assignee) -> bool {
        if to > self.assignee {
            self.assignee = to;
            true
        } else {
            false
        }
    }
}

// ============================================================================
// Narrative state
// ============================================================================

/// Full state tuple handed to the render layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct NarrativeState {
    /// Active phase
    pub phase: Phase,
    /// Console lines of the current session
    pub logs: Vec<LogEntry>,
    /// Defect ticket
    pub ticket: TicketState,
    /// Evaluated scenario lines, `0..=8`
    pub scenario_step: u8,
    /// Revealed diff steps, `0..=4`
    pub fix_step: u8,
}

impl NarrativeState {
    /// Sets the scenario counter, clamped to `0..=SCENARIO_STEPS`.
    /// Returns `true` if the value changed.
    pub fn set_scenario_step(&mut self, step: u8) -> bool {
        let step = step.min(SCENARIO_STEPS);
        let changed = self.scenario_step != step;
        self.scenario_step = step;
        changed
    }

    /// Sets the fix counter, clamped to `0..=FIX_STEPS`.
    /// Returns `true` if the value changed.
    pub fn set_fix_step(&mut self, step: u8) -> bool {
        let step = step.min(FIX_STEPS);
        let changed = self.fix_step != step;
        self.fix_step = step;
        changed
    }

    /// Returns `true` once every scenario line has been evaluated.
    #[must_use]
    pub const fn scenarios_evaluated(&self) -> bool {
        self.scenario_step >= SCENARIO_STEPS
    }
}
