//! System module: OS facility wrappers and logging initialization.
//!
//! Everything here shells out to platform tooling (`reg`, `schtasks`,
//! `shutdown`, `powershell`) rather than binding OS APIs directly, so a
//! single code path covers detection, registration, and reboot - and so
//! absence of the tooling on a non-Windows host degrades to a logged
//! no-op instead of a link-time dependency.

pub mod elevation;
pub mod logging;
pub mod notify;
pub mod reboot;
pub mod resume;

pub use logging::initialize_logging;
pub use reboot::{PowerControl, RebootSentinel, RegistrySentinel, ShutdownControl};
pub use resume::{ResumeRegistrar, ScheduledTaskRegistrar, RESUME_TASK_NAME};
