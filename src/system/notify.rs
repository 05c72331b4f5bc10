//! Terminal completion notification.
//!
//! A single message box once the full step sequence finishes, so the
//! technician staging the machine knows it is ready for the next
//! phase. Strictly best-effort: notification failure is logged and
//! never affects the run's exit status.

use std::process::Command;

/// Show a blocking informational message box via PowerShell.
pub fn notify_completion(title: &str, message: &str) {
    let script = format!(
        "Add-Type -AssemblyName PresentationFramework; \
         [System.Windows.MessageBox]::Show('{}', '{}', 'OK', 'Information') | Out-Null",
        message.replace('\'', "''"),
        title.replace('\'', "''"),
    );
    match Command::new("powershell")
        .args(["-NoProfile", "-Command", &script])
        .status()
    {
        Ok(status) if status.success() => {}
        Ok(status) => {
            log::error!(
                "Failed to display completion message: exit status {:?}",
                status.code()
            );
        }
        Err(e) => {
            log::error!("Failed to display completion message: {}", e);
        }
    }
}
