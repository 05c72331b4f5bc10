//! Orchestration control loop: checkpointed, reboot-surviving step
//! execution.
//!
//! The loop walks a fixed step sequence, persists the checkpoint after
//! every step, and consults the reboot sentinel unconditionally after
//! each one - a reboot may be pending for reasons unrelated to the
//! step that just ran. When a reboot is pending the resume trigger is
//! registered strictly before the reboot primitive fires, so the
//! machine can never restart into a state with no way back into the
//! loop.
//!
//! Individual step failure is non-blocking: it is logged, the
//! checkpoint still advances, and later steps still run.

use std::path::PathBuf;

use crate::error::Result;
use crate::state::CheckpointStore;
use crate::steps::{Step, StepContext};
use crate::system::{PowerControl, RebootSentinel, ResumeRegistrar};
use crate::runner::StepOutcome;

/// Lifecycle of one orchestrator invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    NotStarted,
    /// Running step `i` (1-based position in the sequence)
    StepInProgress(usize),
    /// Reboot pending; resume registered, restart being issued
    AwaitingReboot,
    Completed,
    Fatal,
}

/// How the invocation ended (when it did not error).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// All selected steps done; resume trigger removed
    Completed,
    /// Reboot issued; remaining steps run after restart
    RebootScheduled,
}

/// The exact invocation the resume trigger replays at system start.
#[derive(Clone, Debug)]
pub struct ResumeCommand {
    pub executable: PathBuf,
    pub args: Vec<String>,
}

impl ResumeCommand {
    /// Capture the current process invocation.
    pub fn current() -> Result<Self> {
        Ok(ResumeCommand {
            executable: std::env::current_exe()
                .map_err(|e| format!("Failed to resolve current executable: {}", e))?,
            args: std::env::args().skip(1).collect(),
        })
    }
}

/// Drives the step sequence against the checkpoint store and the OS
/// collaborators. Single-threaded and blocking throughout: each step
/// runs to completion before the next is considered.
pub struct Orchestrator {
    store: CheckpointStore,
    sentinel: Box<dyn RebootSentinel>,
    registrar: Box<dyn ResumeRegistrar>,
    power: Box<dyn PowerControl>,
    resume: ResumeCommand,
    phase: RunPhase,
}

impl Orchestrator {
    pub fn new(
        store: CheckpointStore,
        sentinel: Box<dyn RebootSentinel>,
        registrar: Box<dyn ResumeRegistrar>,
        power: Box<dyn PowerControl>,
        resume: ResumeCommand,
    ) -> Self {
        Orchestrator {
            store,
            sentinel,
            registrar,
            power,
            resume,
            phase: RunPhase::NotStarted,
        }
    }

    /// Current lifecycle phase, for status reporting.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Remove the resume trigger (used by fatal-error cleanup so a
    /// broken orchestration does not loop forever across reboots).
    pub fn remove_resume_trigger(&self) {
        self.registrar.unregister();
    }

    /// Execute every step not yet covered by the checkpoint.
    ///
    /// Returns `RebootScheduled` when a pending reboot cut the run
    /// short; the resumed process picks up from the persisted
    /// checkpoint. Errors escaping this function are fatal and leave
    /// the phase at `Fatal`.
    pub fn run(&mut self, steps: &[Box<dyn Step>]) -> Result<RunOutcome> {
        match self.run_inner(steps) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.phase = RunPhase::Fatal;
                Err(e)
            }
        }
    }

    fn run_inner(&mut self, steps: &[Box<dyn Step>]) -> Result<RunOutcome> {
        let mut checkpoint = self.store.load();
        if checkpoint.step > 0 {
            log::info!(
                "Resuming: {} of {} step(s) already complete",
                checkpoint.step,
                steps.len()
            );
        }

        for (pos, step) in steps.iter().enumerate() {
            let idx = (pos + 1) as u32;
            if idx <= checkpoint.step {
                log::debug!("Step {}/{} ({}) already complete", idx, steps.len(), step.name());
                continue;
            }

            self.phase = RunPhase::StepInProgress(idx as usize);
            log::info!("Step {}/{}: {}", idx, steps.len(), step.name());
            let outcome = {
                let mut ctx = StepContext {
                    checkpoint: &mut checkpoint,
                    store: &self.store,
                };
                step.run(&mut ctx)
            };
            match &outcome {
                StepOutcome::Failed { code, output } => {
                    // Non-blocking by policy: log and keep going.
                    log::error!(
                        "Step '{}' failed (exit {:?}), continuing: {}",
                        step.name(),
                        code,
                        output
                    );
                }
                StepOutcome::Skipped(reason) => {
                    log::warn!("Step '{}' skipped: {}", step.name(), reason);
                }
                other => {
                    log::info!("Step '{}' finished: {}", step.name(), other.as_str());
                }
            }

            // Advance and persist before any reboot decision, so an
            // externally forced restart loses at most the in-flight step.
            checkpoint.step = idx;
            self.store.save(&checkpoint)?;

            if self.sentinel.is_reboot_pending() {
                self.phase = RunPhase::AwaitingReboot;
                log::info!("Reboot pending after step {}, scheduling resume", idx);
                // Defensive double-write ahead of the restart.
                self.store.save(&checkpoint)?;
                self.registrar
                    .register(&self.resume.executable, &self.resume.args);
                self.power.reboot()?;
                return Ok(RunOutcome::RebootScheduled);
            }
        }

        self.store.save(&checkpoint)?;
        self.registrar.unregister();
        self.phase = RunPhase::Completed;
        log::info!("All {} step(s) complete", steps.len());
        Ok(RunOutcome::Completed)
    }
}
