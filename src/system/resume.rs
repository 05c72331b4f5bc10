//! Post-reboot resume registration via the OS task scheduler.
//!
//! Before a reboot is issued, the orchestrator registers a scheduled
//! task (fixed well-known name, ONSTART trigger, highest privilege)
//! that replays the exact original invocation, so the resumed process
//! re-enters the step loop with the persisted checkpoint. Registration
//! must happen strictly before the reboot; removal happens on full
//! completion and on fatal error. Both directions are best-effort.

use std::path::Path;
use std::process::Command;

/// Fixed singleton task name owning the resume trigger.
pub const RESUME_TASK_NAME: &str = "ProvisionRunnerResume";

/// Registers and removes the on-start resume trigger.
pub trait ResumeRegistrar {
    /// Install the trigger, replacing any prior registration with the
    /// same name. Failure is logged, not raised: a failed registration
    /// only means manual resume after the reboot.
    fn register(&self, executable: &Path, args: &[String]);

    /// Remove the trigger by name; absence is not an error.
    fn unregister(&self);
}

/// Registrar backed by `schtasks`.
#[derive(Clone, Debug)]
pub struct ScheduledTaskRegistrar {
    task_name: String,
}

impl ScheduledTaskRegistrar {
    pub fn new() -> Self {
        ScheduledTaskRegistrar {
            task_name: RESUME_TASK_NAME.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_task_name(task_name: impl Into<String>) -> Self {
        ScheduledTaskRegistrar {
            task_name: task_name.into(),
        }
    }

    /// Quote the executable and each argument for the /TR field.
    fn task_command(executable: &Path, args: &[String]) -> String {
        let mut parts = vec![format!("\"{}\"", executable.display())];
        parts.extend(args.iter().map(|a| format!("\"{}\"", a)));
        parts.join(" ")
    }
}

impl Default for ScheduledTaskRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl ResumeRegistrar for ScheduledTaskRegistrar {
    fn register(&self, executable: &Path, args: &[String]) {
        let task_run = Self::task_command(executable, args);
        let result = Command::new("schtasks")
            .args(["/Create", "/F", "/TN", &self.task_name])
            .args(["/SC", "ONSTART", "/RL", "HIGHEST", "/RU", "SYSTEM"])
            .args(["/TR", &task_run])
            .status();
        match result {
            Ok(status) if status.success() => {
                log::info!("Resume task '{}' registered: {}", self.task_name, task_run);
            }
            Ok(status) => {
                log::error!(
                    "Failed to register resume task '{}': exit status {:?}",
                    self.task_name,
                    status.code()
                );
            }
            Err(e) => {
                log::error!("Failed to register resume task '{}': {}", self.task_name, e);
            }
        }
    }

    fn unregister(&self) {
        match Command::new("schtasks")
            .args(["/Delete", "/F", "/TN", &self.task_name])
            .status()
        {
            Ok(status) if status.success() => {
                log::info!("Resume task '{}' removed", self.task_name);
            }
            Ok(_) => {
                // Most commonly "task does not exist", which is fine.
                log::debug!("Resume task '{}' was not present", self.task_name);
            }
            Err(e) => {
                log::debug!("schtasks unavailable for task removal: {}", e);
            }
        }
    }
}
