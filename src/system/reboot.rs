//! Pending-reboot detection and the reboot primitive.
//!
//! Windows exposes two independent pending-reboot indicators in the
//! registry: the Windows Update `RebootRequired` marker key and the
//! Session Manager `PendingFileRenameOperations` value. Either one
//! means the machine must restart before further maintenance sticks.
//! The check runs after every step regardless of which step ran, since
//! a reboot may be pending for unrelated reasons.

use std::process::Command;

use crate::error::SystemError;

/// Windows Update "reboot required" marker key.
const WU_REBOOT_REQUIRED_KEY: &str =
    r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\WindowsUpdate\Auto Update\RebootRequired";

/// Session Manager key holding pending file rename operations.
const SESSION_MANAGER_KEY: &str = r"HKLM\SYSTEM\CurrentControlSet\Control\Session Manager";
const PENDING_RENAMES_VALUE: &str = "PendingFileRenameOperations";

/// Seconds of grace before the reboot primitive restarts the machine.
const REBOOT_DELAY_SECS: u32 = 5;

/// Queries the OS for a "reboot required" signal.
pub trait RebootSentinel {
    fn is_reboot_pending(&self) -> bool;
}

/// Issues the actual machine restart.
pub trait PowerControl {
    fn reboot(&self) -> Result<(), SystemError>;
}

/// Sentinel backed by `reg query` against the two indicator locations.
///
/// Absence of the registry facility (non-Windows host, or `reg` not on
/// PATH) is not an error: the sentinel answers false and logs at debug.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegistrySentinel;

impl RegistrySentinel {
    fn key_exists(key: &str, value: Option<&str>) -> Option<bool> {
        let mut cmd = Command::new("reg");
        cmd.arg("query").arg(key);
        if let Some(value) = value {
            cmd.args(["/v", value]);
        }
        match cmd.output() {
            Ok(output) => Some(output.status.success()),
            Err(e) => {
                log::debug!("Registry query unavailable for reboot check: {}", e);
                None
            }
        }
    }
}

impl RebootSentinel for RegistrySentinel {
    fn is_reboot_pending(&self) -> bool {
        let markers = [
            (WU_REBOOT_REQUIRED_KEY, None),
            (SESSION_MANAGER_KEY, Some(PENDING_RENAMES_VALUE)),
        ];
        for (key, value) in markers {
            match Self::key_exists(key, value) {
                Some(true) => {
                    log::info!("Reboot pending: marker present at {}", key);
                    return true;
                }
                Some(false) => {}
                // Facility inaccessible: give up on both markers.
                None => return false,
            }
        }
        false
    }
}

/// Reboot via `shutdown /r` with a short forced delay.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShutdownControl;

impl PowerControl for ShutdownControl {
    fn reboot(&self) -> Result<(), SystemError> {
        log::info!("Rebooting system in {} seconds...", REBOOT_DELAY_SECS);
        let status = Command::new("shutdown")
            .args(["/r", "/t", &REBOOT_DELAY_SECS.to_string(), "/f"])
            .status()
            .map_err(|e| SystemError::OsCommand {
                cmd: "shutdown".to_string(),
                reason: e.to_string(),
            })?;
        if !status.success() {
            return Err(SystemError::OsCommand {
                cmd: "shutdown".to_string(),
                reason: format!("exit status {:?}", status.code()),
            });
        }
        Ok(())
    }
}
