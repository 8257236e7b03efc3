//! Data structures shared across the session engine
//!
//! The result and option types that cross the `execute` boundary. These are
//! serializable because results are handed to automated callers over an API
//! boundary in the host system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome classification of a single `execute` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// A new prompt marker appeared; the exit code was parsed
    Completed,
    /// The command is still executing; resumable with a later call
    Running,
    /// Contract violation (e.g. command submitted while one is running)
    Error,
}

/// Result of a single `execute` call
///
/// `exit_code` is present only when `status` is [`ExecutionStatus::Completed`];
/// a `running` result never carries one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Reconstructed transcript since the last prompt marker
    pub output: String,
    /// Completion status
    pub status: ExecutionStatus,
    /// Exit code parsed from the most recent marker, when completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Working directory snapshot of the session
    pub working_dir: PathBuf,
}

impl ExecutionResult {
    /// Build a completed result with a parsed exit code
    pub fn completed(output: impl Into<String>, exit_code: i32, working_dir: &Path) -> Self {
        Self {
            output: output.into(),
            status: ExecutionStatus::Completed,
            exit_code: Some(exit_code),
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// Build a still-running result (timeout elapsed or input delivered)
    pub fn still_running(output: impl Into<String>, working_dir: &Path) -> Self {
        Self {
            output: output.into(),
            status: ExecutionStatus::Running,
            exit_code: None,
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// Build a contract-violation result carrying a human-readable message
    pub fn rejected(message: impl Into<String>, working_dir: &Path) -> Self {
        Self {
            output: message.into(),
            status: ExecutionStatus::Error,
            exit_code: None,
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// True when the call completed and parsed an exit code
    pub fn is_completed(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }
}

/// Options for a single `execute` call
#[derive(Debug, Clone, Copy)]
pub struct ExecuteOptions {
    /// Deliver the text as input to an already-running command
    pub is_input: bool,
    /// Deadline for the completion-detection polling loop
    pub timeout: Duration,
    /// Suppress the trailing newline for ordinary command lines
    pub no_enter: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            is_input: false,
            timeout: Duration::from_secs(60),
            no_enter: false,
        }
    }
}

impl ExecuteOptions {
    /// Options for delivering input to a running command
    pub fn input() -> Self {
        Self {
            is_input: true,
            ..Self::default()
        }
    }

    /// Override the polling deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Suppress the trailing newline
    pub fn without_enter(mut self) -> Self {
        self.no_enter = true;
        self
    }
}
