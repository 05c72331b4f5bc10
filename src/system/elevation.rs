//! Privilege detection and elevated re-launch.
//!
//! Every maintenance step needs administrator rights (patching, vendor
//! tooling, installers). A non-elevated invocation re-launches itself
//! through the UAC prompt and exits, leaving the elevated child to run
//! the orchestration.

use std::path::Path;
use std::process::Command;

use crate::error::SystemError;

/// True if the current process holds administrator privileges.
///
/// Detection shells out to `net session`, which fails unless elevated.
/// Any detection failure (including a non-Windows host) is treated as
/// "not admin".
pub fn is_admin() -> bool {
    if !cfg!(windows) {
        return false;
    }
    match Command::new("net").arg("session").output() {
        Ok(output) => output.status.success(),
        Err(e) => {
            log::error!("Admin check failed: {}", e);
            false
        }
    }
}

/// Re-launch the given invocation with administrator rights.
///
/// Issues a PowerShell `Start-Process -Verb RunAs`, which raises the
/// UAC consent prompt. The caller is expected to exit once this
/// returns; the elevated child carries on.
pub fn relaunch_elevated(executable: &Path, args: &[String]) -> Result<(), SystemError> {
    log::info!("Re-launching with administrator privileges");

    let mut command = format!(
        "Start-Process -FilePath '{}' -Verb RunAs",
        executable.display()
    );
    if !args.is_empty() {
        let arg_list = args
            .iter()
            .map(|a| format!("'{}'", a.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(",");
        command.push_str(&format!(" -ArgumentList {}", arg_list));
    }

    let status = Command::new("powershell")
        .args(["-NoProfile", "-Command", &command])
        .status()
        .map_err(|e| SystemError::OsCommand {
            cmd: "powershell".to_string(),
            reason: e.to_string(),
        })?;
    if !status.success() {
        return Err(SystemError::OsCommand {
            cmd: "powershell".to_string(),
            reason: format!("elevation declined or failed (exit {:?})", status.code()),
        });
    }
    Ok(())
}
