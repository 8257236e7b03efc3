//! Scripted mock backend for session-engine tests
//!
//! Simulates a shell pane: `send_keys` with enter echoes the line and looks
//! the command up in a programmed table; slow programs complete after a
//! given number of captures, interactive ones upon receiving an input line,
//! and `C-c` interrupts whatever is pending with exit code 130.

// Not every test binary exercises every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use shellbridge::backend::{BackendHandle, TerminalBackend};
use shellbridge::error::{Error, Result};
use shellbridge::{SessionConfig, SessionRegistry};
use std::sync::Arc;

/// Marker prompt exactly as the injected PS1 renders it
pub fn prompt(exit_code: i32) -> String {
    format!("[SBRIDGE_{}]$ ", exit_code)
}

/// Fast per-test polling configuration
pub fn test_config() -> SessionConfig {
    SessionConfig {
        default_work_dir: PathBuf::from("/tmp"),
        poll_interval_ms: 10,
        settle_ms: 5,
        ..SessionConfig::default()
    }
}

/// Registry wired to a fresh mock backend
pub fn test_registry() -> (SessionRegistry, Arc<MockShellBackend>) {
    let backend = Arc::new(MockShellBackend::new());
    let registry = SessionRegistry::with_backend(backend.clone(), test_config());
    (registry, backend)
}

/// Behavior of one programmed command
#[derive(Debug, Clone)]
pub struct Program {
    pub output: String,
    pub exit_code: i32,
    /// Captures observed before the command completes on its own
    pub polls: u32,
    /// Completes upon receiving an input line instead of by polling
    pub reads_input: bool,
}

impl Program {
    /// Completes on the first capture after submission
    pub fn instant(output: &str, exit_code: i32) -> Self {
        Self {
            output: output.to_string(),
            exit_code,
            polls: 0,
            reads_input: false,
        }
    }

    /// Runs for `polls` captures, then exits 0 silently
    pub fn slow(polls: u32) -> Self {
        Self {
            output: String::new(),
            exit_code: 0,
            polls,
            reads_input: false,
        }
    }

    /// Blocks until an input line arrives, then prints and exits
    pub fn interactive(output: &str, exit_code: i32) -> Self {
        Self {
            output: output.to_string(),
            exit_code,
            polls: u32::MAX,
            reads_input: true,
        }
    }
}

struct Pending {
    program: Program,
    remaining: u32,
}

struct Pane {
    buffer: String,
    pending: Option<Pending>,
    work_dir: PathBuf,
}

impl Pane {
    fn complete(&mut self, program: &Program) {
        if !program.output.is_empty() {
            self.buffer.push_str(&program.output);
            self.buffer.push('\n');
        }
        self.buffer.push_str(&prompt(program.exit_code));
        self.pending = None;
    }
}

/// In-memory [`TerminalBackend`] driven by a command table
pub struct MockShellBackend {
    panes: Mutex<HashMap<String, Pane>>,
    programs: Mutex<HashMap<String, Program>>,
}

impl MockShellBackend {
    pub fn new() -> Self {
        Self {
            panes: Mutex::new(HashMap::new()),
            programs: Mutex::new(HashMap::new()),
        }
    }

    /// Program the behavior of a command line
    pub fn program(&self, command: &str, program: Program) {
        self.programs.lock().unwrap().insert(command.to_string(), program);
    }

    /// Number of live panes
    pub fn pane_count(&self) -> usize {
        self.panes.lock().unwrap().len()
    }
}

#[async_trait]
impl TerminalBackend for MockShellBackend {
    async fn spawn(&self, work_dir: &Path) -> Result<BackendHandle> {
        let handle = BackendHandle::new();
        let pane = Pane {
            // Fresh shell shows its stock prompt until the marker PS1 lands
            buffer: "$ ".to_string(),
            pending: None,
            work_dir: work_dir.to_path_buf(),
        };
        self.panes.lock().unwrap().insert(handle.id.clone(), pane);
        Ok(handle)
    }

    async fn send_keys(&self, handle: &BackendHandle, text: &str, send_enter: bool) -> Result<()> {
        let mut panes = self.panes.lock().unwrap();
        let pane = panes.get_mut(&handle.id).ok_or_else(|| Error::HandleNotFound {
            handle_id: handle.id.clone(),
        })?;

        if !send_enter {
            if text == "C-c" || text == "^c" {
                if pane.pending.take().is_some() {
                    pane.buffer.push_str("^C\n");
                    pane.buffer.push_str(&prompt(130));
                }
            } else {
                // Typed but not submitted
                pane.buffer.push_str(text);
            }
            return Ok(());
        }

        // Echo the submitted line
        pane.buffer.push_str(text);
        pane.buffer.push('\n');

        if let Some(pending) = pane.pending.take() {
            if pending.program.reads_input {
                let program = pending.program;
                pane.complete(&program);
            } else {
                // Input fed to a non-interactive command is swallowed
                pane.pending = Some(pending);
            }
            return Ok(());
        }

        let program = self
            .programs
            .lock()
            .unwrap()
            .get(text)
            .cloned()
            .unwrap_or_else(|| Program::instant("", 0));
        if program.polls == 0 {
            pane.complete(&program);
        } else {
            pane.pending = Some(Pending {
                remaining: program.polls,
                program,
            });
        }
        Ok(())
    }

    async fn capture(&self, handle: &BackendHandle) -> Result<String> {
        let mut panes = self.panes.lock().unwrap();
        let pane = panes.get_mut(&handle.id).ok_or_else(|| Error::HandleNotFound {
            handle_id: handle.id.clone(),
        })?;

        let finished = match pane.pending.as_mut() {
            Some(pending) if !pending.program.reads_input => {
                pending.remaining = pending.remaining.saturating_sub(1);
                if pending.remaining == 0 {
                    Some(pending.program.clone())
                } else {
                    None
                }
            }
            _ => None,
        };
        if let Some(program) = finished {
            pane.complete(&program);
        }

        Ok(pane.buffer.clone())
    }

    async fn clear_history(&self, handle: &BackendHandle) -> Result<()> {
        let mut panes = self.panes.lock().unwrap();
        let pane = panes.get_mut(&handle.id).ok_or_else(|| Error::HandleNotFound {
            handle_id: handle.id.clone(),
        })?;
        if let Some(pos) = pane.buffer.rfind('\n') {
            pane.buffer.drain(..=pos);
        }
        Ok(())
    }

    async fn kill(&self, handle: &BackendHandle) -> Result<()> {
        let removed = self.panes.lock().unwrap().remove(&handle.id);
        match removed {
            Some(_) => Ok(()),
            None => Err(Error::HandleNotFound {
                handle_id: handle.id.clone(),
            }),
        }
    }
}
