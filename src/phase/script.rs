//! Autorun scripts
//!
//! What happens when a phase is entered: mutations applied immediately,
//! plus zero or more timed tracks the controller runs in the background.
//! Each track is a list of `(delay, mutation)` steps executed strictly in
//! order. A track ending in [`Mutation::Advance`] moves the narrative on.

use std::time::Duration;

use super::choreography::Choreography;
use super::state::{Assignee, LogEntry, LogKind, Phase, SCENARIO_STEPS, TicketStatus};

/// A single state change an autorun step (or phase entry) performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Assign the ticket.
    Assign(Assignee),
    /// Move the ticket status forward.
    Status(TicketStatus),
    /// Set the scenario counter.
    ScenarioStep(u8),
    /// Set the fix counter.
    FixStep(u8),
    /// Append one console line.
    AppendLog(LogEntry),
    /// Replace the console with a fresh session.
    ReseedLogs(Vec<LogEntry>),
    /// Enter the given phase.
    Advance(Phase),
}

/// One delayed step of a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Wait before applying, measured from the previous step
    pub delay: Duration,
    /// The change to apply
    pub mutation: Mutation,
}

impl Step {
    const fn new(delay: Duration, mutation: Mutation) -> Self {
        Self { delay, mutation }
    }
}

/// An ordered sequence of delayed steps.
pub type Track = Vec<Step>;

/// Everything scheduled by entering one phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseScript {
    /// Applied synchronously as part of the transition
    pub on_enter: Vec<Mutation>,
    /// Run concurrently in the background, each strictly in order
    pub tracks: Vec<Track>,
}

/// Returns the script for entering `phase`.
#[must_use]
pub fn script_for(phase: Phase, timing: &Choreography) -> PhaseScript {
    match phase {
        Phase::FailedAlert | Phase::Fixed => PhaseScript::default(),
        Phase::TestResults => PhaseScript {
            on_enter: vec![Mutation::ReseedLogs(failure_report())],
            tracks: vec![],
        },
        Phase::Gherkin => PhaseScript {
            on_enter: vec![Mutation::ScenarioStep(0)],
            tracks: vec![scenario_ticker(timing.scenario_tick)],
        },
        Phase::JiraTicket => {
            let [assign, progress, fixed, advance] = timing.ticket;
            PhaseScript {
                on_enter: vec![],
                tracks: vec![vec![
                    Step::new(assign, Mutation::Assign(Assignee::DevTeam)),
                    Step::new(progress, Mutation::Status(TicketStatus::InProgress)),
                    Step::new(fixed, Mutation::Status(TicketStatus::Fixed)),
                    Step::new(advance, Mutation::Advance(Phase::IdeFix)),
                ]],
            }
        }
        Phase::IdeFix => {
            let [d1, d2, d3, d4, advance] = timing.code_fix;
            PhaseScript {
                on_enter: vec![Mutation::FixStep(0)],
                tracks: vec![vec![
                    Step::new(d1, Mutation::FixStep(1)),
                    Step::new(d2, Mutation::FixStep(2)),
                    Step::new(d3, Mutation::FixStep(3)),
                    Step::new(d4, Mutation::FixStep(4)),
                    Step::new(advance, Mutation::Advance(Phase::PipelineRunPass)),
                ]],
            }
        }
        Phase::PipelineRunPass => {
            let [d1, d2, d3, d4, advance] = timing.pipeline_run;
            PhaseScript {
                on_enter: vec![
                    Mutation::ScenarioStep(0),
                    Mutation::ReseedLogs(rerun_header()),
                ],
                tracks: vec![
                    scenario_ticker(timing.scenario_tick),
                    vec![
                        Step::new(d1, success("  ✓ 1) Verify Candidate Core Profile (0.8s)")),
                        Step::new(
                            d2,
                            success("  ✓ 2) Verify Work Experience Complete List (1.1s)"),
                        ),
                        Step::new(d3, success("  ✓ 3) Verify Tech Stack Rendering (0.6s)")),
                        Step::new(d4, success("> 3 passed (2.5s)")),
                        Step::new(advance, Mutation::Advance(Phase::CommitFinal)),
                    ],
                ],
            }
        }
        Phase::CommitFinal => {
            let [d1, d2, d3, advance] = timing.commit;
            PhaseScript {
                on_enter: vec![log(
                    LogKind::System,
                    "> [Job: Deploy] Committing production release...",
                )],
                tracks: vec![vec![
                    Step::new(d1, log(LogKind::Command, "> [Dev] git add .")),
                    Step::new(
                        Duration::ZERO,
                        log(
                            LogKind::Command,
                            "> [Dev] git commit -m 'Release: CV v2.0.0 (Bugfixes applied)'",
                        ),
                    ),
                    Step::new(d2, log(LogKind::Command, "> [Dev] git push origin main")),
                    Step::new(d3, success(DEPLOYED)),
                    Step::new(advance, Mutation::Advance(Phase::Fixed)),
                ]],
            }
        }
    }
}

fn scenario_ticker(tick: Duration) -> Track {
    (1..=SCENARIO_STEPS)
        .map(|n| Step::new(tick, Mutation::ScenarioStep(n)))
        .collect()
}

fn log(kind: LogKind, message: &str) -> Mutation {
    Mutation::AppendLog(LogEntry::new(kind, message))
}

fn success(message: &str) -> Mutation {
    log(LogKind::Success, message)
}

const DEPLOYED: &str = "> [System] Deployment successful. CV v2.0.0 is live.";

/// Identifiers of the three failing tests in the initial report.
pub const FAILING_TESTS: [&str; 3] = [
    "cv-profile.spec.ts:12:5",
    "cv-experience.spec.ts:24:2",
    "cv-skills.spec.ts:40:1",
];

/// The 8-line console report shown when the viewer starts the narrative.
#[must_use]
pub fn failure_report() -> Vec<LogEntry> {
    let [profile, experience, skills] = FAILING_TESTS;
    vec![
        LogEntry::new(LogKind::Error, "> Gitlab CI/CD: Pipeline #8892 Failed."),
        LogEntry::new(LogKind::Info, "> Running 3 tests using 1 worker"),
        LogEntry::new(
            LogKind::Error,
            format!("  ✘ 1) {profile} › Verify Candidate Core Profile (1.2s)"),
        ),
        LogEntry::new(
            LogKind::Error,
            "      AssertionError: expected locator('.profile-name') to have text 'Cecilia Ponce Molinas'",
        ),
        LogEntry::new(
            LogKind::Error,
            format!("  ✘ 2) {experience} › Verify Work Experience Complete List (0.8s)"),
        ),
        LogEntry::new(
            LogKind::Error,
            "      AssertionError: expected locator('.experience-list').count() to be >= 11",
        ),
        LogEntry::new(
            LogKind::Error,
            format!("  ✘ 3) {skills} › Verify Tech Stack Rendering (0.5s)"),
        ),
        LogEntry::new(
            LogKind::Error,
            "      Error: locator('.tech-stack-container') is not visible",
        ),
    ]
}

/// Console lines that open the pipeline re-run session.
#[must_use]
pub fn rerun_header() -> Vec<LogEntry> {
    vec![
        LogEntry::new(
            LogKind::System,
            "> Gitlab CI/CD: Triggering pipeline run #8893...",
        ),
        LogEntry::new(
            LogKind::Command,
            "> [Job: Test] npx playwright test cv-validations.feature",
        ),
    ]
}

/// Console lines appended by a skip.
#[must_use]
pub fn skip_lines() -> [LogEntry; 2] {
    [
        LogEntry::new(LogKind::System, "> [System] Automation skipped by user."),
        LogEntry::new(LogKind::Success, DEPLOYED),
    ]
}
