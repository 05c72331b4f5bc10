//! Vendor firmware/driver step: Dell Command Update.
//!
//! Locates `dcu-cli.exe` in the standard install locations; when it is
//! missing, bootstraps it by scraping the Dell support page for the
//! latest installer, downloading it, and silent-installing. The update
//! pass itself runs `dcu-cli /applyUpdates /silent` with DCU's exit
//! code contract: 0 = updates applied, 2 = no updates available,
//! 102 = reboot required to continue.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::FetchError;
use crate::net::{AssetFetcher, FetchOutcome};
use crate::runner::{run_external, ExitCodeTable, StepOutcome};
use crate::steps::{Step, StepContext};

/// Support page listing the current Dell Command Update release.
const DCU_LISTING_PAGE: &str =
    "https://www.dell.com/support/kbdoc/en-us/000183146/dell-command-update";

/// Fixed-prefix, fixed-suffix matcher for the installer link.
const DCU_DOWNLOAD_PATTERN: &str = r#"https://dl\.dell\.com/[^"\s]*Command-Update[^"\s]*\.exe"#;

/// Standard dcu-cli install locations, newest layout first.
fn default_cli_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from(r"C:\Program Files\Dell\CommandUpdate\dcu-cli.exe"),
        PathBuf::from(r"C:\Program Files (x86)\Dell\CommandUpdate\dcu-cli.exe"),
    ]
}

/// Vendor-update step backed by Dell Command Update.
pub struct DellCommandUpdateStep {
    fetcher: AssetFetcher,
    cli_candidates: Vec<PathBuf>,
    listing_page: String,
    download_pattern: Regex,
}

impl DellCommandUpdateStep {
    pub fn new(fetcher: AssetFetcher) -> Result<Self, FetchError> {
        let download_pattern = Regex::new(DCU_DOWNLOAD_PATTERN)
            .map_err(|e| FetchError::InvalidPattern(e.to_string()))?;
        Ok(DellCommandUpdateStep {
            fetcher,
            cli_candidates: default_cli_candidates(),
            listing_page: DCU_LISTING_PAGE.to_string(),
            download_pattern,
        })
    }

    /// Override the CLI locations and listing page (test hook).
    #[cfg(test)]
    pub fn with_sources(
        mut self,
        cli_candidates: Vec<PathBuf>,
        listing_page: impl Into<String>,
    ) -> Self {
        self.cli_candidates = cli_candidates;
        self.listing_page = listing_page.into();
        self
    }

    fn locate_cli(&self) -> Option<&Path> {
        self.cli_candidates
            .iter()
            .map(|p| p.as_path())
            .find(|p| p.exists())
    }

    /// Download and silent-install Dell Command Update itself.
    ///
    /// Returns the outcome to report when bootstrap cannot produce a
    /// usable CLI; `Ok(())` means the CLI should now be present.
    fn bootstrap_cli(&self) -> Result<(), StepOutcome> {
        log::warn!("Dell Command Update executable not found, bootstrapping");

        let url = match self
            .fetcher
            .resolve_download_url(&self.listing_page, &self.download_pattern)
        {
            Ok(Some(url)) => url,
            Ok(None) => {
                return Err(StepOutcome::Skipped(
                    "Dell Command Update download link not found".to_string(),
                ))
            }
            Err(e) => {
                return Err(StepOutcome::Failed {
                    code: None,
                    output: format!("failed to resolve Dell Command Update link: {}", e),
                })
            }
        };

        let installer = match self.fetcher.download(&url, ".exe") {
            Ok(FetchOutcome::Downloaded(path)) => path,
            Ok(FetchOutcome::SkippedNoNetwork) => {
                return Err(StepOutcome::Skipped("network unreachable".to_string()))
            }
            Err(e) => {
                return Err(StepOutcome::Failed {
                    code: None,
                    output: format!("failed to download Dell Command Update: {}", e),
                })
            }
        };

        let installer_str = installer.to_string_lossy();
        let outcome = run_external(installer_str.as_ref(), &["/s"], &ExitCodeTable::new());
        if outcome.is_failure() {
            return Err(outcome);
        }
        Ok(())
    }
}

impl Step for DellCommandUpdateStep {
    fn name(&self) -> &str {
        "dell-command-update"
    }

    fn run(&self, _ctx: &mut StepContext<'_>) -> StepOutcome {
        log::info!("Installing Dell Command Update updates...");

        if self.locate_cli().is_none() {
            if let Err(outcome) = self.bootstrap_cli() {
                return outcome;
            }
        }
        let cli = match self.locate_cli() {
            Some(cli) => cli.to_path_buf(),
            None => {
                return StepOutcome::Failed {
                    code: None,
                    output: "Dell Command Update installation did not create the CLI".to_string(),
                }
            }
        };

        let outcome = run_external(
            &cli.to_string_lossy(),
            &["/applyUpdates", "/silent"],
            &ExitCodeTable::new().no_action(&[2]).reboot_required(&[102]),
        );
        match &outcome {
            StepOutcome::NoActionNeeded => log::info!("No Dell updates available"),
            StepOutcome::RebootRequired => {
                log::info!("Dell Command Update requires a reboot to continue")
            }
            _ => {}
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Reachability;
    use crate::state::{Checkpoint, CheckpointStore};

    struct Offline;
    impl Reachability for Offline {
        fn is_reachable(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_missing_cli_and_no_link_reports_skipped() {
        // Listing page 404s, so bootstrap ends in a resolve failure,
        // which is reported (Failed) rather than raised.
        let server = mockito::Server::new();
        let fetcher = AssetFetcher::new(Box::new(Offline)).unwrap();
        let step = DellCommandUpdateStep::new(fetcher)
            .unwrap()
            .with_sources(vec![PathBuf::from("/nonexistent/dcu-cli.exe")], server.url());

        let dir = tempfile::TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path().join("state.json"));
        let mut checkpoint = Checkpoint::default();
        let mut ctx = StepContext {
            checkpoint: &mut checkpoint,
            store: &store,
        };

        let outcome = step.run(&mut ctx);
        assert!(matches!(
            outcome,
            StepOutcome::Skipped(_) | StepOutcome::Failed { .. }
        ));
    }
}
