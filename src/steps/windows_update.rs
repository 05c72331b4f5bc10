//! OS patch step: install all available Windows updates.
//!
//! Drives the PSWindowsUpdate PowerShell module end to end. The
//! `-IgnoreReboot` flag keeps the update pass from restarting the
//! machine on its own; the orchestrator owns the reboot decision via
//! the sentinel check that follows every step.

use crate::runner::{run_external, ExitCodeTable, StepOutcome};
use crate::steps::{Step, StepContext};

const UPDATE_PIPELINE: &str = "Install-Module -Name PSWindowsUpdate -Force; \
     Import-Module PSWindowsUpdate; \
     Add-WUServiceManager -MicrosoftUpdate; \
     Get-WindowsUpdate -Install -AcceptAll -MicrosoftUpdate -IgnoreReboot";

/// Patch-apply step backed by PSWindowsUpdate.
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowsUpdateStep;

impl Step for WindowsUpdateStep {
    fn name(&self) -> &str {
        "windows-updates"
    }

    fn run(&self, _ctx: &mut StepContext<'_>) -> StepOutcome {
        log::info!("Installing Windows updates...");
        run_external(
            "powershell",
            &[
                "-NoProfile",
                "-ExecutionPolicy",
                "Bypass",
                "-Command",
                UPDATE_PIPELINE,
            ],
            // PowerShell reports plain success/failure; no special codes.
            &ExitCodeTable::new(),
        )
    }
}
