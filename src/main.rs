use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use provision_runner::orchestrator::{Orchestrator, ResumeCommand, RunOutcome};
use provision_runner::net::{AssetFetcher, TcpProbe};
use provision_runner::paths::Paths;
use provision_runner::state::CheckpointStore;
use provision_runner::steps::{DellCommandUpdateStep, InstallFilesStep, Step, WindowsUpdateStep};
use provision_runner::system::{
    self, RegistrySentinel, ResumeRegistrar, ScheduledTaskRegistrar, ShutdownControl,
};

/// Resumable provisioning runner: checkpointed OS patching, vendor
/// updates, and batch installers with automatic post-reboot resume.
#[derive(Debug, Parser)]
#[command(name = "provision_runner", version)]
struct Cli {
    /// Run only the Windows update step
    #[arg(long, conflicts_with_all = ["vendor_only", "installers_only"])]
    patch_only: bool,

    /// Run only the vendor firmware/driver update step
    #[arg(long, conflicts_with_all = ["patch_only", "installers_only"])]
    vendor_only: bool,

    /// Run only the batch installer step
    #[arg(long, conflicts_with_all = ["patch_only", "vendor_only"])]
    installers_only: bool,

    /// Directory of installer files for the batch step
    #[arg(long)]
    installers_dir: Option<std::path::PathBuf>,
}

fn build_steps(cli: &Cli, paths: &Paths) -> anyhow::Result<Vec<Box<dyn Step>>> {
    let fetcher = AssetFetcher::new(Box::new(TcpProbe::default()))
        .context("failed to construct HTTP client")?;
    let installers_dir = cli
        .installers_dir
        .clone()
        .unwrap_or_else(|| paths.installers_dir.clone());

    let mut steps: Vec<Box<dyn Step>> = Vec::new();
    if cli.patch_only || !(cli.vendor_only || cli.installers_only) {
        steps.push(Box::new(WindowsUpdateStep));
    }
    if cli.vendor_only || !(cli.patch_only || cli.installers_only) {
        steps.push(Box::new(
            DellCommandUpdateStep::new(fetcher).context("invalid vendor download pattern")?,
        ));
    }
    if cli.installers_only || !(cli.patch_only || cli.vendor_only) {
        steps.push(Box::new(InstallFilesStep::new(installers_dir)));
    }
    Ok(steps)
}

fn run(cli: &Cli, paths: &Paths) -> anyhow::Result<()> {
    let resume = ResumeCommand::current()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("failed to capture resume command")?;

    if !system::elevation::is_admin() {
        system::elevation::relaunch_elevated(&resume.executable, &resume.args)
            .context("elevated re-launch failed")?;
        // The elevated child owns the run from here.
        return Ok(());
    }

    let steps = build_steps(cli, paths)?;
    let mut orchestrator = Orchestrator::new(
        CheckpointStore::new(paths.state_file.clone()),
        Box::new(RegistrySentinel),
        Box::new(ScheduledTaskRegistrar::new()),
        Box::new(ShutdownControl),
        resume,
    );

    let outcome = orchestrator
        .run(&steps)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    log::info!("Run finished: {:?}", outcome);
    if outcome == RunOutcome::Completed {
        system::notify::notify_completion(
            "Updates Complete",
            "All updates and installers finished. Moving to the next phase...",
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let paths = Paths::resolve();

    if let Err(e) = system::initialize_logging(&paths.log_file) {
        eprintln!("WARNING: logging unavailable: {}", e);
    }

    if std::env::consts::OS != "windows" {
        log::error!("This provisioning runner only runs on Windows");
        return ExitCode::SUCCESS;
    }

    match run(&cli, &paths) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Fatal error: {:#}", e);
            // Defensive: never leave a broken orchestration re-running
            // itself on every boot.
            ScheduledTaskRegistrar::new().unregister();
            ExitCode::FAILURE
        }
    }
}
