//! Generic step execution: external tool invocation and exit-code
//! classification.
//!
//! Every maintenance step ultimately launches an external process and
//! interprets its exit code. The interpretation differs per tool (one
//! vendor's "2" means "nothing to do", another's would be a hard
//! failure), so the mapping is a declarative `ExitCodeTable` supplied
//! by the caller rather than conditionals baked into the runner.
//!
//! Invocations run to termination with no timeout; the step is expected
//! to terminate on its own.

use std::path::Path;
use std::process::Command;

/// Classified result of running one maintenance step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Tool exited zero and did real work
    Success,

    /// Tool reported there was nothing to do (e.g., "no updates available")
    NoActionNeeded,

    /// Tool completed but the machine must restart before continuing
    RebootRequired,

    /// Step was not attempted, with the reason (e.g., network unreachable)
    Skipped(String),

    /// Tool failed; exit code (None if terminated by signal or never
    /// spawned) and captured output for diagnostics
    Failed { code: Option<i32>, output: String },
}

impl StepOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }

    /// Short label for log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepOutcome::Success => "success",
            StepOutcome::NoActionNeeded => "no action needed",
            StepOutcome::RebootRequired => "reboot required",
            StepOutcome::Skipped(_) => "skipped",
            StepOutcome::Failed { .. } => "failed",
        }
    }
}

/// Declarative exit-code-to-outcome mapping for one external tool.
///
/// `0` is always `Success`; codes listed in neither set are `Failed`.
#[derive(Clone, Debug, Default)]
pub struct ExitCodeTable {
    no_action: Vec<i32>,
    reboot_required: Vec<i32>,
}

impl ExitCodeTable {
    pub fn new() -> Self {
        ExitCodeTable::default()
    }

    /// Codes meaning the tool had nothing to do.
    pub fn no_action(mut self, codes: &[i32]) -> Self {
        self.no_action.extend_from_slice(codes);
        self
    }

    /// Codes meaning the tool needs a reboot to continue.
    pub fn reboot_required(mut self, codes: &[i32]) -> Self {
        self.reboot_required.extend_from_slice(codes);
        self
    }

    /// Map an observed exit code to an outcome.
    pub fn classify(&self, code: i32, output: String) -> StepOutcome {
        if code == 0 {
            StepOutcome::Success
        } else if self.no_action.contains(&code) {
            StepOutcome::NoActionNeeded
        } else if self.reboot_required.contains(&code) {
            StepOutcome::RebootRequired
        } else {
            StepOutcome::Failed {
                code: Some(code),
                output,
            }
        }
    }
}

/// Launch an external tool, wait for termination, and classify its exit
/// code via the supplied table.
///
/// Spawn failure is reported as `Failed`, never raised: an individual
/// step failing must not abort the orchestration.
pub fn run_external(command: &str, args: &[&str], table: &ExitCodeTable) -> StepOutcome {
    log::info!("Running: {} {}", command, args.join(" "));

    let output = match Command::new(command).args(args).output() {
        Ok(output) => output,
        Err(e) => {
            log::error!("Failed to launch '{}': {}", command, e);
            return StepOutcome::Failed {
                code: None,
                output: e.to_string(),
            };
        }
    };

    let code = output.status.code();
    let mut captured = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
        if !captured.is_empty() {
            captured.push('\n');
        }
        captured.push_str(&stderr);
    }

    let outcome = match code {
        Some(code) => table.classify(code, captured),
        None => StepOutcome::Failed {
            code: None,
            output: captured,
        },
    };

    match &outcome {
        StepOutcome::Failed { code, output } => {
            log::error!(
                "'{}' failed with exit code {:?}: {}",
                command,
                code,
                output
            );
        }
        other => {
            log::info!("'{}' exited {:?}: {}", command, code, other.as_str());
        }
    }
    outcome
}

/// Run one installer file to completion, dispatching by file kind.
///
/// Package files (`.msi`) go through the platform installer in silent
/// mode; anything else is invoked directly with no arguments. `msiexec`
/// exit code 3010 means "installed, restart required".
pub fn run_installer_file(path: &Path) -> StepOutcome {
    let kind = InstallerKind::of(path);
    log::info!("Installing {:?} as {:?}", path, kind);

    match kind {
        InstallerKind::MsiPackage => {
            let path_str = path.to_string_lossy();
            run_external(
                "msiexec",
                &["/i", path_str.as_ref(), "/qn", "/norestart"],
                &ExitCodeTable::new().reboot_required(&[3010]),
            )
        }
        InstallerKind::Executable => {
            run_external(&path.to_string_lossy(), &[], &ExitCodeTable::new())
        }
    }
}

/// Installer file kind, resolved once per file by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallerKind {
    /// Windows Installer package, run via `msiexec` unattended
    MsiPackage,
    /// Self-contained installer executable, run directly
    Executable,
}

impl InstallerKind {
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("msi") => InstallerKind::MsiPackage,
            _ => InstallerKind::Executable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_classify_zero_is_success() {
        let table = ExitCodeTable::new().no_action(&[2]).reboot_required(&[102]);
        assert_eq!(table.classify(0, String::new()), StepOutcome::Success);
    }

    #[test]
    fn test_classify_respects_per_tool_tables() {
        let vendor = ExitCodeTable::new().no_action(&[2]).reboot_required(&[102]);
        assert_eq!(vendor.classify(2, String::new()), StepOutcome::NoActionNeeded);
        assert_eq!(vendor.classify(102, String::new()), StepOutcome::RebootRequired);

        // The same "2" is a hard failure under a different tool's table.
        let strict = ExitCodeTable::new();
        assert_eq!(
            strict.classify(2, "boom".to_string()),
            StepOutcome::Failed {
                code: Some(2),
                output: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_installer_kind_by_extension() {
        assert_eq!(
            InstallerKind::of(&PathBuf::from("C:/staging/tool.MSI")),
            InstallerKind::MsiPackage
        );
        assert_eq!(
            InstallerKind::of(&PathBuf::from("C:/staging/setup.exe")),
            InstallerKind::Executable
        );
        assert_eq!(
            InstallerKind::of(&PathBuf::from("C:/staging/noext")),
            InstallerKind::Executable
        );
    }

    #[test]
    fn test_run_external_spawn_failure_is_reported_not_raised() {
        let outcome = run_external(
            "definitely-not-a-real-binary-5a3f",
            &[],
            &ExitCodeTable::new(),
        );
        assert!(outcome.is_failure());
        match outcome {
            StepOutcome::Failed { code, .. } => assert_eq!(code, None),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_run_external_classifies_real_exit_codes() {
        let table = ExitCodeTable::new().no_action(&[3]).reboot_required(&[4]);
        assert_eq!(run_external("sh", &["-c", "exit 0"], &table), StepOutcome::Success);
        assert_eq!(
            run_external("sh", &["-c", "exit 3"], &table),
            StepOutcome::NoActionNeeded
        );
        assert_eq!(
            run_external("sh", &["-c", "exit 4"], &table),
            StepOutcome::RebootRequired
        );
        match run_external("sh", &["-c", "echo oops >&2; exit 7"], &table) {
            StepOutcome::Failed { code, output } => {
                assert_eq!(code, Some(7));
                assert!(output.contains("oops"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }
}
