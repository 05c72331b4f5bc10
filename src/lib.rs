//! Provision Runner Core
//!
//! Resumable, multi-step provisioning orchestrator for staging fleet
//! machines: OS patching, vendor firmware/driver updates, and batch
//! installer execution, run in a fixed order with progress durably
//! checkpointed after every step. The orchestration survives an
//! uncontrolled process exit or a full machine reboot and picks up
//! exactly where it left off via an OS-scheduled resume trigger.
//!
//! The system is organized into functional modules:
//! - **error**: Unified error type hierarchy
//! - **paths**: Explicit path configuration passed into components
//! - **state**: Durable checkpoint store (load/save, self-healing)
//! - **runner**: External tool invocation and exit-code classification
//! - **net**: Reachability probe and best-effort asset fetcher
//! - **system**: OS facility wrappers (reboot, resume task, elevation,
//!   notification) and logging initialization
//! - **steps**: The concrete maintenance steps
//! - **orchestrator**: The checkpointed control loop

pub mod error;
pub mod paths;
pub mod state;

pub mod runner;

pub mod net;
pub mod system;

pub mod steps;
pub mod orchestrator;

// Re-export the log crate for macro usage
pub use log;

// Re-export error types for easy access
pub use error::{FetchError, Result, StateError, SystemError};

// Re-export core types for easy access
pub use orchestrator::{Orchestrator, ResumeCommand, RunOutcome, RunPhase};
pub use paths::Paths;
pub use runner::{run_external, run_installer_file, ExitCodeTable, InstallerKind, StepOutcome};
pub use state::{Checkpoint, CheckpointStore};
pub use steps::{DellCommandUpdateStep, InstallFilesStep, Step, StepContext, WindowsUpdateStep};

// Re-export network collaborators
pub use net::{AssetFetcher, FetchOutcome, Reachability, TcpProbe};

// Re-export system collaborators and logging initialization
pub use system::{
    initialize_logging, PowerControl, RebootSentinel, RegistrySentinel, ResumeRegistrar,
    ScheduledTaskRegistrar, ShutdownControl, RESUME_TASK_NAME,
};
