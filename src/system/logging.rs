//! Dual-sink logging: stdout plus an append-only log file.
//!
//! The runner's progress is only observable through the log stream, so
//! the sink must never panic and must keep writing to disk even when
//! stdout is gone (the resumed process runs headless at system start).
//! Registered as the global logger for the `log` facade.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Logger writing every record to stdout and to a shared log file.
pub struct DualLogger {
    file: Mutex<File>,
}

impl DualLogger {
    pub fn new(log_file: &Path) -> std::io::Result<Self> {
        if let Some(dir) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(log_file)?;
        Ok(DualLogger {
            file: Mutex::new(file),
        })
    }
}

impl Log for DualLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "{} [{}] {}",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.args()
        );
        // Both sinks are best-effort: a closed stdout (headless resume
        // at system start) or a full disk must not kill the run.
        let _ = writeln!(std::io::stdout(), "{}", line);
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", line);
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Install the dual logger as the global `log` sink.
///
/// Must be called once, before any component logs. Returns an error if
/// the log file cannot be opened or a logger is already registered.
pub fn initialize_logging(log_file: &Path) -> crate::error::Result<()> {
    let logger = DualLogger::new(log_file)
        .map_err(|e| format!("Failed to open log file {:?}: {}", log_file, e))?;
    log::set_boxed_logger(Box::new(logger))
        .map(|()| log::set_max_level(LevelFilter::Debug))
        .map_err(|e| format!("Failed to register logger: {}", e))?;
    Ok(())
}
