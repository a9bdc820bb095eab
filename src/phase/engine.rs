//! Phase controller
//!
//! The `PhaseController` is the single writer of the [`NarrativeState`].
//! User commands pass through guards; autorun tracks are spawned on phase
//! entry and re-check the session epoch before every mutation, so a track
//! scheduled for a phase that has since been left can never write.
//!
//! Observers read through a `watch` snapshot (latest state) and a
//! `broadcast` change feed (every change, in application order).

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::observability::metrics;

use super::choreography::Choreography;
use super::command::Command;
use super::projector::{ViewFlags, project};
use super::script::{Mutation, Track, script_for, skip_lines};
use super::state::{
    Assignee, FIX_STEPS, LogEntry, NarrativeState, Phase, SCENARIO_STEPS, TicketState,
    TicketStatus,
};

/// Capacity of the change feed; slow subscribers see `Lagged`.
const CHANGE_FEED_CAPACITY: usize = 256;

// ============================================================================
// Transitions and changes
// ============================================================================

/// What caused a phase transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionReason {
    /// A user command passed its guard.
    User(Command),
    /// The last step of an autorun track.
    Autorun,
}

impl TransitionReason {
    /// Low-cardinality label for metrics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User(Command::Skip) => "skip",
            Self::User(_) => "user",
            Self::Autorun => "autorun",
        }
    }
}

impl fmt::Display for TransitionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(command) => write!(f, "command:{command}"),
            Self::Autorun => f.write_str("autorun"),
        }
    }
}

/// A completed phase transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    /// Phase left
    pub from: Phase,
    /// Phase entered
    pub to: Phase,
    /// Cause
    pub reason: TransitionReason,
    /// Epoch assigned to the new phase entry
    pub epoch: u64,
}

/// One observable state change, published in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A phase was entered.
    PhaseEntered {
        /// Phase left
        from: Phase,
        /// Phase entered
        to: Phase,
        /// Cause
        reason: TransitionReason,
        /// New epoch
        epoch: u64,
    },
    /// The console was cleared and reseeded with `lines` entries.
    LogsReseeded {
        /// Number of lines in the new session
        lines: usize,
    },
    /// A console line was appended.
    LogAppended(LogEntry),
    /// Ticket status or assignee moved forward.
    Ticket(TicketState),
    /// Scenario counter changed.
    ScenarioStep(u8),
    /// Fix counter changed.
    FixStep(u8),
}

// ============================================================================
// Shared state
// ============================================================================

struct Inner {
    state: NarrativeState,
    /// Bumped on every phase entry and on shutdown
    epoch: u64,
    /// Cancels the tracks of the current phase entry
    chains: CancellationToken,
}

struct Shared {
    inner: Mutex<Inner>,
    timing: Choreography,
    /// Parent of every chain token; cancelled on shutdown
    session: CancellationToken,
    snapshot: watch::Sender<NarrativeState>,
    changes: broadcast::Sender<Change>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, change: Change) {
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }

    fn publish_snapshot(&self, inner: &Inner) {
        self.snapshot.send_replace(inner.state.clone());
    }

    /// Enters `to`: cancels the previous entry's tracks, bumps the epoch,
    /// applies the entry mutations and spawns the new tracks.
    fn transition_locked(
        self: &Arc<Self>,
        inner: &mut Inner,
        to: Phase,
        reason: TransitionReason,
    ) -> PhaseTransition {
        let from = inner.state.phase;
        inner.chains.cancel();
        inner.epoch += 1;
        inner.chains = self.session.child_token();
        inner.state.phase = to;
        let epoch = inner.epoch;

        info!(%from, %to, %reason, epoch, "phase transition");
        metrics::record_phase_transition(to, reason.label());
        metrics::set_current_phase(to);
        self.publish(Change::PhaseEntered {
            from,
            to,
            reason,
            epoch,
        });

        let script = script_for(to, &self.timing);
        for mutation in script.on_enter {
            self.apply_locked(inner, mutation);
        }
        for track in script.tracks {
            self.spawn_track(epoch, inner.chains.clone(), track);
        }

        PhaseTransition {
            from,
            to,
            reason,
            epoch,
        }
    }

    fn apply_locked(self: &Arc<Self>, inner: &mut Inner, mutation: Mutation) {
        match mutation {
            Mutation::Assign(assignee) => {
                if inner.state.ticket.assign(assignee) {
                    self.publish(Change::Ticket(inner.state.ticket));
                }
            }
            Mutation::Status(status) => {
                if inner.state.ticket.advance_status(status) {
                    self.publish(Change::Ticket(inner.state.ticket));
                }
            }
            Mutation::ScenarioStep(step) => {
                if inner.state.set_scenario_step(step) {
                    self.publish(Change::ScenarioStep(inner.state.scenario_step));
                }
            }
            Mutation::FixStep(step) => {
                if inner.state.set_fix_step(step) {
                    self.publish(Change::FixStep(inner.state.fix_step));
                }
            }
            Mutation::AppendLog(entry) => {
                inner.state.logs.push(entry.clone());
                self.publish(Change::LogAppended(entry));
            }
            Mutation::ReseedLogs(lines) => {
                let count = lines.len();
                inner.state.logs = lines;
                self.publish(Change::LogsReseeded { lines: count });
            }
            Mutation::Advance(to) => {
                self.transition_locked(inner, to, TransitionReason::Autorun);
            }
        }
    }

    fn spawn_track(self: &Arc<Self>, epoch: u64, token: CancellationToken, track: Track) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(epoch, "no async runtime; autorun track not scheduled");
            return;
        };
        let shared = Arc::clone(self);
        runtime.spawn(async move {
            for step in track {
                tokio::select! {
                    () = token.cancelled() => {
                        trace!(epoch, "autorun track cancelled");
                        return;
                    }
                    () = tokio::time::sleep(step.delay) => {}
                }
                if !shared.apply_if_current(epoch, step.mutation) {
                    return;
                }
            }
        });
    }

    /// Applies an autorun step if `epoch` is still current.
    ///
    /// Returns `false` when the step was dropped as stale.
    fn apply_if_current(self: &Arc<Self>, epoch: u64, mutation: Mutation) -> bool {
        let mut inner = self.lock();
        if inner.epoch != epoch || self.session.is_cancelled() {
            trace!(epoch, current = inner.epoch, ?mutation, "dropping stale autorun step");
            metrics::record_stale_step();
            return false;
        }
        self.apply_locked(&mut inner, mutation);
        self.publish_snapshot(&inner);
        true
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Owner of the narrative state machine.
///
/// Cheap to clone; all clones drive the same session.
#[derive(Clone)]
pub struct PhaseController {
    shared: Arc<Shared>,
}

impl PhaseController {
    /// Creates a controller in the initial state (`FAILED_ALERT`).
    #[must_use]
    pub fn new(timing: Choreography) -> Self {
        let initial = NarrativeState::default();
        let (snapshot, _) = watch::channel(initial.clone());
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        metrics::set_current_phase(initial.phase);
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: initial,
                    epoch: 0,
                    chains: CancellationToken::new(),
                }),
                timing,
                session: CancellationToken::new(),
                snapshot,
                changes,
            }),
        }
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Leaves the failure alert and shows the failing test report.
    ///
    /// Only valid in `FAILED_ALERT`.
    pub fn start(&self) -> Option<PhaseTransition> {
        self.guarded(
            Command::Start,
            |s| s.phase == Phase::FailedAlert,
            Phase::TestResults,
        )
    }

    /// Opens the BDD scenario evaluation.
    ///
    /// Only valid in `TEST_RESULTS`.
    pub fn open_scenario_view(&self) -> Option<PhaseTransition> {
        self.guarded(
            Command::OpenScenarios,
            |s| s.phase == Phase::TestResults,
            Phase::Gherkin,
        )
    }

    /// Files the defect ticket, which starts the unattended fix.
    ///
    /// Only valid in `GHERKIN` once every scenario line was evaluated.
    pub fn report_defect(&self) -> Option<PhaseTransition> {
        self.guarded(
            Command::ReportDefect,
            |s| s.phase == Phase::Gherkin && s.scenarios_evaluated(),
            Phase::JiraTicket,
        )
    }

    /// Jumps straight to the healthy résumé.
    ///
    /// Cancels every pending autorun step and forces the terminal values.
    /// A no-op once `FIXED` is reached.
    pub fn skip_to_end(&self) -> Option<PhaseTransition> {
        let mut inner = self.shared.lock();
        let accepted = !self.shared.session.is_cancelled() && !inner.state.phase.is_terminal();
        metrics::record_command(Command::Skip, accepted);
        if !accepted {
            debug!(phase = %inner.state.phase, "skip ignored");
            return None;
        }

        let transition = self.shared.transition_locked(
            &mut inner,
            Phase::Fixed,
            TransitionReason::User(Command::Skip),
        );
        let [skipped, deployed] = skip_lines();
        for mutation in [
            Mutation::Assign(Assignee::DevTeam),
            Mutation::Status(TicketStatus::Fixed),
            Mutation::ScenarioStep(SCENARIO_STEPS),
            Mutation::FixStep(FIX_STEPS),
            Mutation::AppendLog(skipped),
            Mutation::AppendLog(deployed),
        ] {
            self.shared.apply_locked(&mut inner, mutation);
        }
        self.shared.publish_snapshot(&inner);
        Some(transition)
    }

    /// Dispatches a parsed command to its operation.
    pub fn issue(&self, command: Command) -> Option<PhaseTransition> {
        match command {
            Command::Start => self.start(),
            Command::OpenScenarios => self.open_scenario_view(),
            Command::ReportDefect => self.report_defect(),
            Command::Skip => self.skip_to_end(),
        }
    }

    fn guarded(
        &self,
        command: Command,
        guard: impl FnOnce(&NarrativeState) -> bool,
        to: Phase,
    ) -> Option<PhaseTransition> {
        let mut inner = self.shared.lock();
        let accepted = !self.shared.session.is_cancelled() && guard(&inner.state);
        metrics::record_command(command, accepted);
        if !accepted {
            debug!(
                %command,
                phase = %inner.state.phase,
                scenario_step = inner.state.scenario_step,
                "command rejected by guard"
            );
            return None;
        }
        let transition = self
            .shared
            .transition_locked(&mut inner, to, TransitionReason::User(command));
        self.shared.publish_snapshot(&inner);
        Some(transition)
    }

    /// Ends the session: cancels every track and rejects further commands.
    ///
    /// Idempotent.
    pub fn shutdown(&self) {
        let mut inner = self.shared.lock();
        if self.shared.session.is_cancelled() {
            return;
        }
        self.shared.session.cancel();
        inner.epoch += 1;
        debug!(phase = %inner.state.phase, epoch = inner.epoch, "narrative session shut down");
    }

    // ------------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------------

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> NarrativeState {
        self.shared.lock().state.clone()
    }

    /// Returns the active phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.shared.lock().state.phase
    }

    /// Returns the current epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.shared.lock().epoch
    }

    /// Projects the current state into view flags.
    #[must_use]
    pub fn view(&self) -> ViewFlags {
        project(&self.shared.lock().state)
    }

    /// Subscribes to state snapshots.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<NarrativeState> {
        self.shared.snapshot.subscribe()
    }

    /// Subscribes to the ordered change feed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.shared.changes.subscribe()
    }

    /// Timings in use.
    #[must_use]
    pub fn choreography(&self) -> &Choreography {
        &self.shared.timing
    }

    /// Returns `true` after [`Self::shutdown`].
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shared.session.is_cancelled()
    }

    /// Token cancelled when the session ends.
    #[must_use]
    pub fn session_token(&self) -> CancellationToken {
        self.shared.session.clone()
    }
}

impl fmt::Debug for PhaseController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.lock();
        f.debug_struct("PhaseController")
            .field("phase", &inner.state.phase)
            .field("epoch", &inner.epoch)
            .field("shut_down", &self.shared.session.is_cancelled())
            .finish_non_exhaustive()
    }
}
