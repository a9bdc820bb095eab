//! Property tests for the narrative state machine.

use proptest::prelude::*;

use cvpipeline::phase::scenario::{defect_present, lines};
use cvpipeline::phase::{
    Assignee, Choreography, Command, FIX_STEPS, NarrativeState, Phase, PhaseController,
    SCENARIO_STEPS, TicketState, TicketStatus, Verdict, project, verdict,
};

fn command() -> impl Strategy<Value = Command> {
    (0..Command::ALL.len()).prop_map(|i| Command::ALL[i])
}

fn phase() -> impl Strategy<Value = Phase> {
    (0..Phase::ALL.len()).prop_map(|i| Phase::ALL[i])
}

fn status() -> impl Strategy<Value = TicketStatus> {
    prop_oneof![
        Just(TicketStatus::ToDo),
        Just(TicketStatus::InProgress),
        Just(TicketStatus::Fixed),
    ]
}

fn assignee() -> impl Strategy<Value = Assignee> {
    prop_oneof![Just(Assignee::Unassigned), Just(Assignee::DevTeam)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever the viewer types, the phase never moves backwards and an
    /// accepted command always moves it forwards.
    #[test]
    fn phase_progress_is_monotonic(commands in prop::collection::vec(command(), 0..24)) {
        let controller = PhaseController::new(Choreography::default());
        let mut index = controller.phase().index();
        for cmd in commands {
            let accepted = controller.issue(cmd);
            let now = controller.phase().index();
            prop_assert!(now >= index);
            if let Some(t) = accepted {
                prop_assert!(t.to.index() > t.from.index());
                prop_assert_eq!(t.to.index(), now);
            } else {
                prop_assert_eq!(now, index);
            }
            index = now;
        }
    }

    /// Once the final phase is reached no command changes the state.
    #[test]
    fn terminal_state_is_absorbing(commands in prop::collection::vec(command(), 1..16)) {
        let controller = PhaseController::new(Choreography::default());
        controller.skip_to_end();
        let state = controller.snapshot();
        let epoch = controller.epoch();
        for cmd in commands {
            prop_assert!(controller.issue(cmd).is_none());
        }
        prop_assert_eq!(controller.snapshot(), state);
        prop_assert_eq!(controller.epoch(), epoch);
    }

    #[test]
    fn degraded_view_until_rerun(p in phase()) {
        let state = NarrativeState { phase: p, ..NarrativeState::default() };
        prop_assert_eq!(project(&state).is_degraded_view, p.index() < 5);
    }

    #[test]
    fn verdict_rule(p in phase(), step in 0..=SCENARIO_STEPS) {
        for line in lines() {
            let expected = if step < line.number {
                None
            } else if line.defect_sensitive && defect_present(p) {
                Some(Verdict::Fail)
            } else {
                Some(Verdict::Pass)
            };
            prop_assert_eq!(verdict(p, step, line), expected);
        }
    }

    #[test]
    fn counters_are_clamped(scenario in any::<u8>(), fix in any::<u8>()) {
        let mut state = NarrativeState::default();
        state.set_scenario_step(scenario);
        state.set_fix_step(fix);
        prop_assert_eq!(state.scenario_step, scenario.min(SCENARIO_STEPS));
        prop_assert_eq!(state.fix_step, fix.min(FIX_STEPS));
    }

    /// Ticket fields only ever move forward, whatever order updates arrive in.
    #[test]
    fn ticket_never_regresses(
        updates in prop::collection::vec((status(), assignee()), 0..12)
    ) {
        let mut ticket = TicketState::default();
        for (s, a) in updates {
            let (before_status, before_assignee) = (ticket.status, ticket.assignee);
            ticket.advance_status(s);
            ticket.assign(a);
            prop_assert!(ticket.status >= before_status);
            prop_assert!(ticket.assignee >= before_assignee);
        }
    }
}
