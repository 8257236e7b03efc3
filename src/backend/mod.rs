//! Terminal backend boundary
//!
//! The session engine talks to its terminal through this narrow trait so any
//! process/PTY facility can satisfy it: the bundled [`pty::PtyBackend`] forks
//! a shell and reads its pseudo-terminal directly, and tests substitute a
//! scripted mock. This is the only system-call boundary in the engine.

pub mod pty;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use uuid::Uuid;

use crate::error::Result;

pub use pty::PtyBackend;

/// Handle to a spawned backend terminal
#[derive(Debug, Clone)]
pub struct BackendHandle {
    /// Unique identifier for this terminal instance
    pub id: String,
    /// Process ID of the shell, when known
    pub pid: Option<u32>,
    /// Spawn time
    pub spawned_at: DateTime<Utc>,
}

impl BackendHandle {
    /// Create a new handle with a fresh identifier
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            pid: None,
            spawned_at: Utc::now(),
        }
    }
}

impl Default for BackendHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Contract required from a terminal backend
///
/// `capture` returns the *entire* visible-plus-scrollback text each call, an
/// append-until-cleared log rather than a delta. `clear_history` drops the
/// scrollback but keeps the live prompt line, so a capture taken right after
/// clearing still ends at a prompt.
#[async_trait]
pub trait TerminalBackend: Send + Sync {
    /// Spawn a shell-backed terminal rooted at `work_dir`
    async fn spawn(&self, work_dir: &Path) -> Result<BackendHandle>;

    /// Deliver keystrokes; named special keys (`C-c`, `Up`, `F1`, ...) are
    /// translated to their byte sequences, other text is sent literally.
    /// A trailing newline is appended only when `send_enter` is set.
    async fn send_keys(&self, handle: &BackendHandle, text: &str, send_enter: bool) -> Result<()>;

    /// Snapshot the full visible+scrollback text buffer
    async fn capture(&self, handle: &BackendHandle) -> Result<String>;

    /// Drop scrollback, retaining the current prompt line
    async fn clear_history(&self, handle: &BackendHandle) -> Result<()>;

    /// Destroy the terminal and release its resources
    async fn kill(&self, handle: &BackendHandle) -> Result<()>;
}
