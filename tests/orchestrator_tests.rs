//! Integration test suite for the orchestrator control loop.
//!
//! Exercises the checkpointed step walk against mocked OS
//! collaborators with shared call-order capture:
//! - Idempotent resume (only steps beyond the checkpoint run)
//! - Checkpoint monotonicity across invocations
//! - Register-before-reboot ordering, with the checkpoint already
//!   persisted when the reboot primitive fires
//! - Resume-trigger cleanup on completion
//! - Non-blocking step failure

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use provision_runner::orchestrator::{Orchestrator, ResumeCommand, RunOutcome, RunPhase};
use provision_runner::runner::StepOutcome;
use provision_runner::state::{Checkpoint, CheckpointStore};
use provision_runner::steps::{Step, StepContext};
use provision_runner::system::{PowerControl, RebootSentinel, ResumeRegistrar};
use provision_runner::SystemError;

type EventLog = Arc<Mutex<Vec<String>>>;

fn record(events: &EventLog, event: impl Into<String>) {
    events.lock().unwrap().push(event.into());
}

struct ScriptedStep {
    name: String,
    outcome: StepOutcome,
    events: EventLog,
}

impl ScriptedStep {
    fn boxed(name: &str, outcome: StepOutcome, events: &EventLog) -> Box<dyn Step> {
        Box::new(ScriptedStep {
            name: name.to_string(),
            outcome,
            events: events.clone(),
        })
    }
}

impl Step for ScriptedStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, _ctx: &mut StepContext<'_>) -> StepOutcome {
        record(&self.events, format!("run {}", self.name));
        self.outcome.clone()
    }
}

/// Sentinel answering a scripted sequence, then false forever.
struct ScriptedSentinel {
    answers: Mutex<VecDeque<bool>>,
    events: EventLog,
}

impl ScriptedSentinel {
    fn boxed(answers: &[bool], events: &EventLog) -> Box<dyn RebootSentinel> {
        Box::new(ScriptedSentinel {
            answers: Mutex::new(answers.iter().copied().collect()),
            events: events.clone(),
        })
    }
}

impl RebootSentinel for ScriptedSentinel {
    fn is_reboot_pending(&self) -> bool {
        let answer = self.answers.lock().unwrap().pop_front().unwrap_or(false);
        record(&self.events, format!("sentinel -> {}", answer));
        answer
    }
}

struct RecordingRegistrar {
    events: EventLog,
}

impl ResumeRegistrar for RecordingRegistrar {
    fn register(&self, executable: &Path, args: &[String]) {
        record(
            &self.events,
            format!("register {} {}", executable.display(), args.join(" ")),
        );
    }

    fn unregister(&self) {
        record(&self.events, "unregister");
    }
}

/// Reboot primitive that records the persisted checkpoint at the
/// moment the restart is issued, proving the write-before-reboot
/// ordering.
struct RecordingPower {
    state_file: PathBuf,
    events: EventLog,
}

impl PowerControl for RecordingPower {
    fn reboot(&self) -> Result<(), SystemError> {
        let persisted: Checkpoint =
            serde_json::from_str(&std::fs::read_to_string(&self.state_file).unwrap()).unwrap();
        record(&self.events, format!("reboot step={}", persisted.step));
        Ok(())
    }
}

struct Harness {
    dir: tempfile::TempDir,
    events: EventLog,
}

impl Harness {
    fn new() -> Self {
        Harness {
            dir: tempfile::TempDir::new().unwrap(),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn state_file(&self) -> PathBuf {
        self.dir.path().join("provision_state.json")
    }

    fn store(&self) -> CheckpointStore {
        CheckpointStore::new(self.state_file())
    }

    fn orchestrator(&self, sentinel_answers: &[bool]) -> Orchestrator {
        Orchestrator::new(
            self.store(),
            ScriptedSentinel::boxed(sentinel_answers, &self.events),
            Box::new(RecordingRegistrar {
                events: self.events.clone(),
            }),
            Box::new(RecordingPower {
                state_file: self.state_file(),
                events: self.events.clone(),
            }),
            ResumeCommand {
                executable: PathBuf::from("/opt/provision/provision_runner"),
                args: vec!["--vendor-only".to_string()],
            },
        )
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn executed_steps(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|e| e.strip_prefix("run ").map(str::to_string))
            .collect()
    }
}

fn three_success_steps(events: &EventLog) -> Vec<Box<dyn Step>> {
    vec![
        ScriptedStep::boxed("a", StepOutcome::Success, events),
        ScriptedStep::boxed("b", StepOutcome::Success, events),
        ScriptedStep::boxed("c", StepOutcome::Success, events),
    ]
}

// ============================================================================
// IDEMPOTENT RESUME
// ============================================================================

#[test]
fn test_idempotent_resume_runs_exactly_remaining_steps() {
    let all = ["a", "b", "c"];
    for k in 0..=3u32 {
        let harness = Harness::new();
        harness
            .store()
            .save(&Checkpoint {
                step: k,
                completed_files: vec![],
            })
            .unwrap();

        let steps = three_success_steps(&harness.events);
        let mut orchestrator = harness.orchestrator(&[]);
        let outcome = orchestrator.run(&steps).unwrap();

        assert_eq!(outcome, RunOutcome::Completed);
        let expected: Vec<String> = all[k as usize..].iter().map(|s| s.to_string()).collect();
        assert_eq!(harness.executed_steps(), expected, "resume from step {}", k);
        assert_eq!(harness.store().load().step, 3);
    }
}

#[test]
fn test_checkpoint_is_monotonic_across_invocations() {
    let harness = Harness::new();
    harness
        .store()
        .save(&Checkpoint {
            step: 2,
            completed_files: vec![],
        })
        .unwrap();

    let steps = three_success_steps(&harness.events);
    let mut orchestrator = harness.orchestrator(&[]);
    orchestrator.run(&steps).unwrap();
    assert_eq!(harness.store().load().step, 3);

    // A second full invocation never regresses the counter.
    let steps = three_success_steps(&harness.events);
    let mut orchestrator = harness.orchestrator(&[]);
    orchestrator.run(&steps).unwrap();
    assert_eq!(harness.store().load().step, 3);
}

// ============================================================================
// REBOOT-THEN-RESUME ORDERING
// ============================================================================

#[test]
fn test_reboot_after_first_step_persists_then_registers_then_reboots() {
    let harness = Harness::new();
    let steps = vec![
        ScriptedStep::boxed("a", StepOutcome::RebootRequired, &harness.events),
        ScriptedStep::boxed("b", StepOutcome::Success, &harness.events),
    ];

    let mut orchestrator = harness.orchestrator(&[true]);
    let outcome = orchestrator.run(&steps).unwrap();

    assert_eq!(outcome, RunOutcome::RebootScheduled);
    assert_eq!(orchestrator.phase(), RunPhase::AwaitingReboot);
    // Step b was never attempted in this run.
    assert_eq!(harness.executed_steps(), vec!["a".to_string()]);

    let events = harness.events();
    let register_pos = events.iter().position(|e| e.starts_with("register")).unwrap();
    let reboot_pos = events.iter().position(|e| e.starts_with("reboot")).unwrap();
    assert!(register_pos < reboot_pos, "register must precede reboot: {:?}", events);
    // Checkpoint {step:1} was already on disk when the reboot fired.
    assert_eq!(events[reboot_pos], "reboot step=1");
    // The registration carries the original invocation verbatim.
    assert_eq!(
        events[register_pos],
        "register /opt/provision/provision_runner --vendor-only"
    );
}

#[test]
fn test_concrete_two_step_trace_with_reboot_after_final_step() {
    // steps = [A, B], fresh checkpoint; A -> Success, B -> RebootRequired,
    // sentinel false after A and true after B.
    let harness = Harness::new();
    let steps = vec![
        ScriptedStep::boxed("A", StepOutcome::Success, &harness.events),
        ScriptedStep::boxed("B", StepOutcome::RebootRequired, &harness.events),
    ];

    let mut orchestrator = harness.orchestrator(&[false, true]);
    let outcome = orchestrator.run(&steps).unwrap();

    assert_eq!(outcome, RunOutcome::RebootScheduled);
    assert_eq!(
        harness.events(),
        vec![
            "run A".to_string(),
            "sentinel -> false".to_string(),
            "run B".to_string(),
            "sentinel -> true".to_string(),
            "register /opt/provision/provision_runner --vendor-only".to_string(),
            "reboot step=2".to_string(),
        ]
    );
    // No unregister in a reboot-bound run.
    assert!(!harness.events().iter().any(|e| e == "unregister"));
    assert_eq!(harness.store().load().step, 2);
}

// ============================================================================
// COMPLETION AND FAILURE POLICY
// ============================================================================

#[test]
fn test_cleanup_on_completion_unregisters_exactly_once() {
    let harness = Harness::new();
    let steps = three_success_steps(&harness.events);

    let mut orchestrator = harness.orchestrator(&[]);
    let outcome = orchestrator.run(&steps).unwrap();

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(orchestrator.phase(), RunPhase::Completed);
    let unregisters = harness
        .events()
        .iter()
        .filter(|e| *e == "unregister")
        .count();
    assert_eq!(unregisters, 1);
    assert!(!harness.events().iter().any(|e| e.starts_with("reboot")));
}

#[test]
fn test_failed_step_is_non_blocking_and_still_advances() {
    let harness = Harness::new();
    let steps = vec![
        ScriptedStep::boxed(
            "a",
            StepOutcome::Failed {
                code: Some(1),
                output: "tool exploded".to_string(),
            },
            &harness.events,
        ),
        ScriptedStep::boxed("b", StepOutcome::Success, &harness.events),
    ];

    let mut orchestrator = harness.orchestrator(&[]);
    let outcome = orchestrator.run(&steps).unwrap();

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(harness.executed_steps(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(harness.store().load().step, 2);
}

#[test]
fn test_no_action_and_reboot_outcomes_advance_like_success() {
    let harness = Harness::new();
    let steps = vec![
        ScriptedStep::boxed("a", StepOutcome::NoActionNeeded, &harness.events),
        ScriptedStep::boxed("b", StepOutcome::Skipped("offline".to_string()), &harness.events),
    ];

    let mut orchestrator = harness.orchestrator(&[]);
    orchestrator.run(&steps).unwrap();
    assert_eq!(harness.store().load().step, 2);
}
