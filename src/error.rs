//! Unified error type hierarchy for Provision Runner
//!
//! Provides structured error handling with StateError, FetchError and
//! SystemError, plus the crate-wide `Result` alias used by top-level
//! fallible functions.

use std::io;
use thiserror::Error;

/// Checkpoint persistence errors.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error during checkpoint operation: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid JSON in checkpoint: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Failed to persist checkpoint atomically: {0}")]
    Persist(String),
}

/// Asset acquisition errors (listing-page resolution and download).
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error while writing downloaded asset: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid download pattern: {0}")]
    InvalidPattern(String),
}

/// OS facility errors (reboot primitive, elevation re-launch).
#[derive(Error, Debug)]
pub enum SystemError {
    /// OS command failed (e.g., shutdown, schtasks, powershell)
    #[error("Command '{cmd}' failed: {reason}")]
    OsCommand { cmd: String, reason: String },

    #[error("OS facility unavailable: {0}")]
    Unavailable(String),
}

/// Top-level result type for operations that may fail.
/// Use this as the return type for all fallible functions.
/// Example: `fn risky_operation() -> Result<String>`
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
