//! Maintenance steps: the fixed, ordered units of provisioning work.
//!
//! Steps are polymorphic over one capability - "execute and report an
//! outcome" - and are identified only by their position in the
//! sequence the orchestrator walks. Resume logic is purely positional:
//! a step whose index is already covered by the checkpoint is skipped.

pub mod batch_install;
pub mod vendor_update;
pub mod windows_update;

pub use batch_install::InstallFilesStep;
pub use vendor_update::DellCommandUpdateStep;
pub use windows_update::WindowsUpdateStep;

use crate::runner::StepOutcome;
use crate::state::{Checkpoint, CheckpointStore};

/// Collaborators a step may use while running.
///
/// The checkpoint is exposed so steps that enumerate sub-items (batch
/// install) can mark them complete and re-persist mid-step.
pub struct StepContext<'a> {
    pub checkpoint: &'a mut Checkpoint,
    pub store: &'a CheckpointStore,
}

/// One maintenance step in the provisioning sequence.
pub trait Step {
    /// Human-readable name for log lines.
    fn name(&self) -> &str;

    /// Run the step to completion and classify what happened.
    fn run(&self, ctx: &mut StepContext<'_>) -> StepOutcome;
}
