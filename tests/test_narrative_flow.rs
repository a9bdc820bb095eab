//! End-to-end narrative flows against the controller, on paused time.

use std::time::Duration;

use tokio::sync::broadcast;

use cvpipeline::phase::script::FAILING_TESTS;
use cvpipeline::phase::{
    Assignee, Change, Choreography, LogKind, Phase, PhaseController, SCENARIO_STEPS, TicketState,
    TicketStatus, TransitionReason, project,
};

fn controller() -> PhaseController {
    PhaseController::new(Choreography::default())
}

fn drain(rx: &mut broadcast::Receiver<Change>) -> Vec<Change> {
    let mut out = Vec::new();
    while let Ok(change) = rx.try_recv() {
        out.push(change);
    }
    out
}

async fn run_until_waiting_on_report(c: &PhaseController) {
    c.start().unwrap();
    c.open_scenario_view().unwrap();
    tokio::time::sleep(Duration::from_millis(700 * 8 + 50)).await;
}

// ============================================================================
// Scenario 1: start
// ============================================================================

#[tokio::test(start_paused = true)]
async fn start_shows_failure_report() {
    let c = controller();
    c.start().unwrap();

    let state = c.snapshot();
    assert_eq!(state.phase, Phase::TestResults);

    let failing: Vec<&str> = state
        .logs
        .iter()
        .filter(|l| l.kind == LogKind::Error && l.message.contains('✘'))
        .map(|l| l.message.as_str())
        .collect();
    assert_eq!(failing.len(), 3, "three failing tests: {failing:?}");
    for (line, id) in failing.iter().zip(FAILING_TESTS) {
        assert!(line.contains(id), "{line} should name {id}");
    }

    let view = project(&state);
    assert!(view.is_console_open);
    assert!(view.is_waiting_on_user);
    assert!(view.is_degraded_view);
}

// ============================================================================
// Scenario 2: scenario evaluation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn scenario_evaluation_reaches_eight() {
    let c = controller();
    c.start().unwrap();
    c.open_scenario_view().unwrap();
    assert_eq!(c.phase(), Phase::Gherkin);
    assert_eq!(c.snapshot().scenario_step, 0);
    assert!(!c.view().is_waiting_on_user);

    tokio::time::sleep(Duration::from_millis(700 * 4 + 10)).await;
    assert_eq!(c.snapshot().scenario_step, 4);

    tokio::time::sleep(Duration::from_millis(700 * 4)).await;
    assert_eq!(c.snapshot().scenario_step, SCENARIO_STEPS);
    assert!(c.view().is_waiting_on_user);

    // Stays at 8.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(c.snapshot().scenario_step, SCENARIO_STEPS);
}

#[tokio::test(start_paused = true)]
async fn scenario_steps_are_published_in_order() {
    let c = controller();
    let mut rx = c.subscribe();
    run_until_waiting_on_report(&c).await;

    let steps: Vec<u8> = drain(&mut rx)
        .into_iter()
        .filter_map(|change| match change {
            Change::ScenarioStep(step) => Some(step),
            _ => None,
        })
        .collect();
    assert_eq!(steps.last(), Some(&SCENARIO_STEPS));
    assert!(steps.windows(2).all(|w| w[0] < w[1]), "{steps:?}");
}

// ============================================================================
// Scenario 3: skip
// ============================================================================

#[tokio::test(start_paused = true)]
async fn skip_mid_flow_forces_final_state() {
    let c = controller();
    run_until_waiting_on_report(&c).await;
    c.report_defect().unwrap();
    // Ticket chain (5.5s) then two diff reveals.
    tokio::time::sleep(Duration::from_millis(5500 + 2600)).await;
    assert_eq!(c.phase(), Phase::IdeFix);
    let logs_before = c.snapshot().logs.len();

    let t = c.skip_to_end().unwrap();
    assert_eq!(t.from, Phase::IdeFix);
    assert_eq!(t.to, Phase::Fixed);

    let state = c.snapshot();
    assert_eq!(state.phase, Phase::Fixed);
    assert_eq!(
        state.ticket,
        TicketState {
            status: TicketStatus::Fixed,
            assignee: Assignee::DevTeam,
        }
    );
    assert_eq!(state.scenario_step, 8);
    assert_eq!(state.fix_step, 4);
    assert_eq!(state.logs.len(), logs_before + 2);
    let tail = &state.logs[logs_before..];
    assert_eq!(tail[0].kind, LogKind::System);
    assert_eq!(tail[1].kind, LogKind::Success);

    // Nothing scheduled before the skip may write afterwards.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(c.snapshot(), state);
}

#[tokio::test(start_paused = true)]
async fn skip_is_idempotent() {
    let c = controller();
    c.start().unwrap();
    assert!(c.skip_to_end().is_some());
    let epoch = c.epoch();
    let state = c.snapshot();
    for _ in 0..3 {
        assert!(c.skip_to_end().is_none());
    }
    assert_eq!(c.epoch(), epoch);
    assert_eq!(c.snapshot(), state);
}

// ============================================================================
// Scenario 4: ticket chain
// ============================================================================

#[tokio::test(start_paused = true)]
async fn ticket_chain_runs_in_order() {
    let c = controller();
    let mut rx = c.subscribe();
    run_until_waiting_on_report(&c).await;
    drain(&mut rx);

    c.report_defect().unwrap();
    tokio::time::sleep(Duration::from_millis(5500 + 10)).await;

    let changes = drain(&mut rx);
    let mut observed = Vec::new();
    for change in &changes {
        match change {
            Change::Ticket(ticket) => observed.push(format!(
                "{}/{}",
                ticket.status.label(),
                ticket.assignee.label()
            )),
            Change::PhaseEntered { to, .. } => observed.push(to.name().to_string()),
            _ => {}
        }
    }
    assert_eq!(
        observed,
        vec![
            "JIRA_TICKET",
            "To Do/Dev Team",
            "In Progress/Dev Team",
            "Fixed/Dev Team",
            "IDE_FIX",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn ticket_chain_cancelled_by_skip() {
    let c = controller();
    run_until_waiting_on_report(&c).await;
    c.report_defect().unwrap();
    tokio::time::sleep(Duration::from_millis(1600)).await;
    assert_eq!(c.snapshot().ticket.assignee, Assignee::DevTeam);
    assert_eq!(c.snapshot().ticket.status, TicketStatus::ToDo);

    let mut rx = c.subscribe();
    c.skip_to_end().unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    let entered: Vec<Phase> = drain(&mut rx)
        .into_iter()
        .filter_map(|change| match change {
            Change::PhaseEntered { to, .. } => Some(to),
            _ => None,
        })
        .collect();
    assert_eq!(entered, vec![Phase::Fixed], "no autorun advance after skip");
}

// ============================================================================
// Full unattended run
// ============================================================================

#[tokio::test(start_paused = true)]
async fn full_run_reaches_fixed() {
    let c = controller();
    let mut rx = c.subscribe();
    run_until_waiting_on_report(&c).await;
    c.report_defect().unwrap();

    tokio::time::sleep(Choreography::default().autorun_total() + Duration::from_millis(100)).await;

    let entered: Vec<(Phase, TransitionReason)> = drain(&mut rx)
        .into_iter()
        .filter_map(|change| match change {
            Change::PhaseEntered { to, reason, .. } => Some((to, reason)),
            _ => None,
        })
        .collect();
    let phases: Vec<Phase> = entered.iter().map(|(p, _)| *p).collect();
    assert_eq!(phases, Phase::ALL[1..].to_vec());
    assert!(
        entered[3..]
            .iter()
            .all(|(_, reason)| *reason == TransitionReason::Autorun)
    );

    let state = c.snapshot();
    assert_eq!(state.phase, Phase::Fixed);
    assert_eq!(state.ticket, TicketState::RESOLVED);
    assert!(state.logs.last().unwrap().message.contains("is live"));

    let view = project(&state);
    assert!(!view.is_degraded_view);
    assert!(!view.is_console_open);
    assert_eq!(view.progress_index, 7);
}

#[tokio::test(start_paused = true)]
async fn speed_scales_autorun() {
    let c = PhaseController::new(Choreography::default().scaled(10.0));
    c.start().unwrap();
    c.open_scenario_view().unwrap();
    tokio::time::sleep(Duration::from_millis(70 * 8 + 5)).await;
    assert_eq!(c.snapshot().scenario_step, SCENARIO_STEPS);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_everything() {
    let c = controller();
    run_until_waiting_on_report(&c).await;
    c.report_defect().unwrap();
    c.shutdown();
    c.shutdown();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(c.phase(), Phase::JiraTicket);
    assert_eq!(c.snapshot().ticket, TicketState::default());
}
