//! Property-based tests for job lifecycle invariants.

use proptest::prelude::*;

use jobctl::{JobState, JobStateMachine, MessageImportance};

// ─── Arbitrary Strategies ───────────────────────────────────────────────────

fn arb_state() -> impl Strategy<Value = JobState> {
    prop::sample::select(JobState::ALL.to_vec())
}

fn arb_importance() -> impl Strategy<Value = MessageImportance> {
    prop::sample::select(vec![
        MessageImportance::Debug,
        MessageImportance::Detailed,
        MessageImportance::Basic,
        MessageImportance::Warning,
        MessageImportance::Error,
    ])
}

// ─── State Machine Properties ───────────────────────────────────────────────

proptest! {
    #[test]
    fn transition_legality_depends_only_on_source(from in arb_state(), to in arb_state()) {
        prop_assert_eq!(from.can_transition_to(&to), !from.is_terminal());
    }

    #[test]
    fn once_terminal_always_terminal(path in prop::collection::vec(arb_state(), 1..20)) {
        let job = JobStateMachine::new("job", "name");
        let mut terminal: Option<JobState> = None;
        for next in path {
            let result = job.set_state(next);
            match terminal {
                Some(state) => {
                    prop_assert!(result.is_err());
                    prop_assert_eq!(job.state(), state);
                },
                None => {
                    prop_assert!(result.is_ok());
                    prop_assert_eq!(job.state(), next);
                    if next.is_terminal() {
                        terminal = Some(next);
                    }
                },
            }
        }
    }

    #[test]
    fn cancel_is_idempotent(path in prop::collection::vec(arb_state(), 0..8)) {
        let job = JobStateMachine::new("job", "name");
        for next in path {
            let _ = job.set_state(next);
        }
        let first = job.cancel();
        prop_assert_eq!(job.cancel(), first);
        prop_assert!(first.is_terminal() || first == JobState::Cancelling);
    }

    #[test]
    fn message_ids_are_unique(levels in prop::collection::vec(arb_importance(), 0..50)) {
        let job = JobStateMachine::new("job", "name");
        let ids: std::collections::HashSet<_> = levels
            .into_iter()
            .map(|importance| job.append_message(importance, "m").message_id)
            .collect();
        prop_assert_eq!(ids.len(), job.messages().len());
    }
}

// ─── Serde Properties ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn state_serde_round_trip(state in arb_state()) {
        let json = serde_json::to_value(state).unwrap();
        let back: JobState = serde_json::from_value(json).unwrap();
        prop_assert_eq!(back, state);
    }

    #[test]
    fn arbitrary_strings_never_panic_as_state(s in ".*") {
        let _ = serde_json::from_value::<JobState>(serde_json::Value::String(s));
    }
}
