//! Interactive command sessions
//!
//! A [`CommandSession`] owns one backend terminal and turns its free-running
//! text stream into blocking request/response calls. Completion is detected
//! through the prompt marker protocol ([`marker`]): the shell is told to
//! print `[SBRIDGE_<exitcode>]$ ` after every command, captures are scanned
//! for markers, and output is reconstructed from the text between them.
//!
//! States, as seen through `execute`:
//!
//! - **Idle**: the buffer tail shows a prompt, no command outstanding
//! - **Running**: keystrokes sent, no new prompt observed yet
//! - **Completed**: a new marker appeared and its exit code parsed
//! - **TimedOut**: still running when the caller's deadline elapsed; not an
//!   error, the command keeps running and a later call can resume waiting

pub mod keys;
pub mod marker;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::backend::{BackendHandle, TerminalBackend};
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::models::{ExecuteOptions, ExecutionResult};

/// Settle delay after installing the prompt at initialization
const STARTUP_SETTLE: Duration = Duration::from_millis(200);

const NO_COMMAND_RUNNING: &str = "No command is currently running.";
const ALREADY_RUNNING: &str = "A command is already running. Send input or interrupt with C-c.";

/// One shell session driven over a backend terminal
pub struct CommandSession {
    id: String,
    work_dir: PathBuf,
    backend: Arc<dyn TerminalBackend>,
    config: SessionConfig,
    handle: Option<BackendHandle>,
    initialized: bool,
    closed: bool,
}

impl std::fmt::Debug for CommandSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSession")
            .field("id", &self.id)
            .field("work_dir", &self.work_dir)
            .field("config", &self.config)
            .field("handle", &self.handle)
            .field("initialized", &self.initialized)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl CommandSession {
    /// Spawn and initialize a new session rooted at `work_dir`
    ///
    /// Installs the marker prompt and clears history so the marker stream
    /// starts empty. A backend spawn failure is fatal to creation and is not
    /// retried.
    pub async fn open(
        id: impl Into<String>,
        work_dir: impl Into<PathBuf>,
        backend: Arc<dyn TerminalBackend>,
        config: SessionConfig,
    ) -> Result<Self> {
        let id = id.into();
        let work_dir: PathBuf = work_dir.into();
        let work_dir = work_dir.canonicalize().unwrap_or(work_dir);

        let handle = backend.spawn(&work_dir).await.map_err(|e| {
            Error::SessionCreationFailed {
                session_id: id.clone(),
                reason: e.to_string(),
            }
        })?;

        // Install the marker prompt and start the marker stream empty
        backend.send_keys(&handle, &marker::init_line(), true).await?;
        sleep(STARTUP_SETTLE).await;
        backend.clear_history(&handle).await?;

        info!("Session {} initialized in {}", id, work_dir.display());
        Ok(Self {
            id,
            work_dir,
            backend,
            config,
            handle: Some(handle),
            initialized: true,
            closed: false,
        })
    }

    /// Session identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Working directory fixed at creation
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// True once `close` has run
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn live_handle(&self) -> Result<&BackendHandle> {
        if !self.initialized || self.closed {
            return Err(Error::SessionNotInitialized {
                session_id: self.id.clone(),
            });
        }
        self.handle
            .as_ref()
            .ok_or_else(|| Error::SessionNotInitialized {
                session_id: self.id.clone(),
            })
    }

    async fn capture(&self) -> Result<String> {
        let handle = self.live_handle()?;
        self.backend.capture(handle).await
    }

    /// Reset the buffer for the next command; captures taken afterwards
    /// still end at the live prompt line.
    async fn reset_screen(&self) -> Result<()> {
        let handle = self.live_handle()?;
        self.backend.clear_history(handle).await
    }

    /// Run one step of the request/response contract
    ///
    /// Dispatches on the state machine: empty commands poll or return the
    /// completed transcript, input and special keys are delivered to a
    /// running command, and fresh commands enter the completion-detection
    /// loop. Contract violations come back as `status = "error"` results,
    /// never as `Err`.
    pub async fn execute(&mut self, command: &str, opts: ExecuteOptions) -> Result<ExecutionResult> {
        self.live_handle()?;

        let content = self.capture().await?;
        let markers = marker::scan(&content);
        let running = !marker::ends_at_prompt(&content);

        if command.trim().is_empty() {
            if running {
                return self.wait_for_completion(opts.timeout).await;
            }
            let output = marker::reconstruct(&content, &markers);
            return Ok(ExecutionResult::completed(output, 0, &self.work_dir));
        }

        if opts.is_input || (keys::is_special_key(command) && running) {
            return self.deliver_input(command, running, opts.no_enter).await;
        }

        if running {
            debug!("Session {}: rejecting '{}', command outstanding", self.id, command);
            return Ok(ExecutionResult::rejected(ALREADY_RUNNING, &self.work_dir));
        }

        self.run_command(command, opts).await
    }

    /// Deliver keystrokes to an already-running command and report whether a
    /// prompt reappeared after one settle interval.
    async fn deliver_input(
        &mut self,
        command: &str,
        running: bool,
        no_enter: bool,
    ) -> Result<ExecutionResult> {
        if !running {
            return Ok(ExecutionResult::rejected(NO_COMMAND_RUNNING, &self.work_dir));
        }

        let send_enter = !keys::is_special_key(command) && !no_enter;
        {
            let handle = self.live_handle()?;
            self.backend.send_keys(handle, command, send_enter).await?;
        }
        sleep(self.config.settle_interval()).await;

        let content = self.capture().await?;
        let markers = marker::scan(&content);
        let output = marker::reconstruct(&content, &markers);

        if !marker::ends_at_prompt(&content) {
            return Ok(ExecutionResult::still_running(output, &self.work_dir));
        }

        let exit_code = marker::last_exit_code(&markers).unwrap_or(0);
        self.reset_screen().await?;
        Ok(ExecutionResult::completed(output, exit_code, &self.work_dir))
    }

    /// Send a fresh command and poll until a new marker appears or the
    /// deadline elapses.
    async fn run_command(&mut self, command: &str, opts: ExecuteOptions) -> Result<ExecutionResult> {
        let initial = self.capture().await?;
        let initial_markers = marker::scan(&initial).len();

        let send_enter = !keys::is_special_key(command) && !opts.no_enter;
        {
            let handle = self.live_handle()?;
            self.backend.send_keys(handle, command, send_enter).await?;
        }

        let deadline = Instant::now() + opts.timeout;
        loop {
            let content = self.capture().await?;
            let markers = marker::scan(&content);

            if markers.len() > initial_markers || marker::ends_at_prompt(&content) {
                let exit_code = marker::last_exit_code(&markers).unwrap_or(0);
                let output = marker::reconstruct(&content, &markers);
                let output = marker::strip_command_echo(&output, command).trim().to_string();
                self.reset_screen().await?;
                debug!("Session {}: '{}' completed with exit code {}", self.id, command, exit_code);
                return Ok(ExecutionResult::completed(output, exit_code, &self.work_dir));
            }

            if Instant::now() >= deadline {
                let output = marker::reconstruct(&content, &markers);
                return Ok(ExecutionResult::still_running(
                    annotate_timeout(&output, opts.timeout),
                    &self.work_dir,
                ));
            }

            sleep(self.config.poll_interval()).await;
        }
    }

    /// Resume waiting on a command launched by an earlier call
    async fn wait_for_completion(&mut self, timeout: Duration) -> Result<ExecutionResult> {
        let deadline = Instant::now() + timeout;
        loop {
            let content = self.capture().await?;
            let markers = marker::scan(&content);

            if marker::ends_at_prompt(&content) {
                let exit_code = marker::last_exit_code(&markers).unwrap_or(0);
                let output = marker::reconstruct(&content, &markers);
                self.reset_screen().await?;
                return Ok(ExecutionResult::completed(output, exit_code, &self.work_dir));
            }

            if Instant::now() >= deadline {
                let output = marker::reconstruct(&content, &markers);
                return Ok(ExecutionResult::still_running(
                    annotate_timeout(&output, timeout),
                    &self.work_dir,
                ));
            }

            sleep(self.config.poll_interval()).await;
        }
    }

    /// Tear the session down; idempotent
    ///
    /// The backend kill is best-effort: failures are logged, not raised.
    /// Subsequent `execute` calls fail with a not-initialized error.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }

        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.backend.kill(&handle).await {
                debug!("Error closing session {}: {}", self.id, e);
            }
        }
        self.closed = true;
        self.initialized = false;
        info!("Session {} closed", self.id);
    }
}

fn annotate_timeout(output: &str, timeout: Duration) -> String {
    format!(
        "{}\n[Command still running after {}s]",
        output.trim(),
        timeout.as_secs_f64()
    )
}
