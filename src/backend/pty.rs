//! PTY terminal backend
//!
//! Implements [`TerminalBackend`] by forking the configured shell inside a
//! pseudoterminal via `portable-pty`. Blocking master I/O is bridged to async
//! code with a reader thread feeding a shared capture buffer and a writer
//! thread draining an input channel.
//!
//! The capture buffer models a tmux-style pane: an append-until-cleared text
//! log of everything the shell has emitted. `clear_history` drops completed
//! lines and keeps the current (unterminated) prompt line, so captures taken
//! right after a clear still end at the prompt.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use portable_pty::{native_pty_system, Child, CommandBuilder, PtySize};
use regex::Regex;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::mpsc::{channel, Sender as StdSender};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::thread;
use tokio::sync::RwLock;

use super::{BackendHandle, TerminalBackend};
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::session::keys;

/// CSI/OSC escape sequences and stray ESC-prefixed bytes
static ANSI_SEQUENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-_]")
        .expect("ANSI pattern is valid")
});

/// Control characters other than newline, tab and carriage return
static CONTROL_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f]").expect("control pattern is valid")
});

/// Reduce raw PTY bytes to the plain text a terminal would display
///
/// Strips ANSI sequences, then applies carriage returns per line: text after
/// the last `\r` wins, matching how progress-bar style rewrites render.
pub fn sanitize_output(raw: &str) -> String {
    let stripped = ANSI_SEQUENCE.replace_all(raw, "");
    let stripped = CONTROL_CHARS.replace_all(&stripped, "");
    stripped
        .split('\n')
        .map(|line| line.rsplit('\r').next().unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Append-until-cleared text log of PTY output
struct CaptureBuffer {
    bytes: Vec<u8>,
    limit: usize,
}

impl CaptureBuffer {
    fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
        }
    }

    fn append(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
        self.trim_front();
    }

    /// Enforce the history limit from the front, cutting only at a line
    /// boundary so a prompt marker is never split in half.
    fn trim_front(&mut self) {
        if self.bytes.len() <= self.limit {
            return;
        }
        let overflow = self.bytes.len() - self.limit;
        match self.bytes[overflow..].iter().position(|&b| b == b'\n') {
            Some(pos) => {
                self.bytes.drain(..overflow + pos + 1);
            }
            None => self.bytes.clear(),
        }
    }

    /// Drop everything up to and including the last newline; the current
    /// prompt line survives the clear.
    fn clear_history(&mut self) {
        if let Some(pos) = self.bytes.iter().rposition(|&b| b == b'\n') {
            self.bytes.drain(..=pos);
        }
    }

    fn snapshot(&self) -> String {
        sanitize_output(&String::from_utf8_lossy(&self.bytes))
    }
}

/// A single spawned terminal
struct PtyEntry {
    child: StdMutex<Box<dyn Child + Send + Sync>>,
    input_tx: StdSender<Vec<u8>>,
    buffer: Arc<StdMutex<CaptureBuffer>>,
}

/// Poison-tolerant lock: the buffer holds plain bytes, so a panicked writer
/// cannot leave it in an unusable state.
fn lock_buffer(buffer: &StdMutex<CaptureBuffer>) -> MutexGuard<'_, CaptureBuffer> {
    match buffer.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Production [`TerminalBackend`] backed by `portable-pty`
pub struct PtyBackend {
    terminals: Arc<RwLock<HashMap<String, Arc<PtyEntry>>>>,
    config: SessionConfig,
}

impl PtyBackend {
    /// Create a backend that spawns shells per the given configuration
    pub fn new(config: SessionConfig) -> Self {
        Self {
            terminals: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    async fn entry(&self, handle: &BackendHandle) -> Result<Arc<PtyEntry>> {
        let terminals = self.terminals.read().await;
        terminals
            .get(&handle.id)
            .cloned()
            .ok_or_else(|| Error::HandleNotFound {
                handle_id: handle.id.clone(),
            })
    }

    /// Number of live terminals
    pub async fn active_count(&self) -> usize {
        self.terminals.read().await.len()
    }
}

#[async_trait]
impl TerminalBackend for PtyBackend {
    async fn spawn(&self, work_dir: &Path) -> Result<BackendHandle> {
        if !work_dir.is_dir() {
            return Err(Error::SpawnFailed {
                command: self.config.shell.clone(),
                reason: format!("working directory '{}' does not exist", work_dir.display()),
            });
        }

        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: self.config.rows,
                cols: self.config.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| Error::SpawnFailed {
                command: self.config.shell.clone(),
                reason: e.to_string(),
            })?;

        let mut cmd = CommandBuilder::new(&self.config.shell);
        cmd.args(&self.config.shell_args);
        cmd.cwd(work_dir);
        // A dumb terminal keeps programs from decorating output with escapes
        cmd.env("TERM", "dumb");

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| Error::SpawnFailed {
                command: self.config.shell.clone(),
                reason: e.to_string(),
            })?;

        let mut handle = BackendHandle::new();
        handle.pid = child.process_id();

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| Error::SpawnFailed {
                command: self.config.shell.clone(),
                reason: format!("failed to clone PTY reader: {}", e),
            })?;
        let mut writer = pair.master.take_writer().map_err(|e| Error::SpawnFailed {
            command: self.config.shell.clone(),
            reason: format!("failed to take PTY writer: {}", e),
        })?;

        let buffer = Arc::new(StdMutex::new(CaptureBuffer::new(
            self.config.history_limit_bytes,
        )));

        // Reader thread: PTY master -> capture buffer
        let reader_buffer = Arc::clone(&buffer);
        let reader_id = handle.id.clone();
        thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => {
                        debug!("PTY {} read EOF, shell terminated", reader_id);
                        break;
                    }
                    Ok(n) => {
                        lock_buffer(&reader_buffer).append(&buf[..n]);
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(e) => {
                        debug!("PTY {} read error: {}", reader_id, e);
                        break;
                    }
                }
            }
        });

        // Writer thread: input channel -> PTY master
        let (input_tx, input_rx) = channel::<Vec<u8>>();
        let writer_id = handle.id.clone();
        thread::spawn(move || {
            while let Ok(data) = input_rx.recv() {
                if let Err(e) = writer.write_all(&data).and_then(|_| writer.flush()) {
                    warn!("PTY {} write error: {}", writer_id, e);
                    break;
                }
            }
        });

        let entry = Arc::new(PtyEntry {
            child: StdMutex::new(child),
            input_tx,
            buffer,
        });

        let mut terminals = self.terminals.write().await;
        terminals.insert(handle.id.clone(), entry);

        info!(
            "Spawned {} (pid {:?}) in {} as terminal {}",
            self.config.shell,
            handle.pid,
            work_dir.display(),
            handle.id
        );
        Ok(handle)
    }

    async fn send_keys(&self, handle: &BackendHandle, text: &str, send_enter: bool) -> Result<()> {
        let entry = self.entry(handle).await?;

        let mut data = keys::encode(text).unwrap_or_else(|| text.as_bytes().to_vec());
        if send_enter {
            data.push(b'\n');
        }

        entry
            .input_tx
            .send(data)
            .map_err(|e| Error::SendFailed {
                reason: e.to_string(),
            })
    }

    async fn capture(&self, handle: &BackendHandle) -> Result<String> {
        let entry = self.entry(handle).await?;
        let snapshot = lock_buffer(&entry.buffer).snapshot();
        Ok(snapshot)
    }

    async fn clear_history(&self, handle: &BackendHandle) -> Result<()> {
        let entry = self.entry(handle).await?;
        lock_buffer(&entry.buffer).clear_history();
        Ok(())
    }

    async fn kill(&self, handle: &BackendHandle) -> Result<()> {
        let entry = {
            let mut terminals = self.terminals.write().await;
            terminals.remove(&handle.id)
        };
        let entry = entry.ok_or_else(|| Error::HandleNotFound {
            handle_id: handle.id.clone(),
        })?;

        let mut child = match entry.child.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        child.kill().map_err(|e| Error::Other(format!(
            "failed to kill shell for terminal {}: {}",
            handle.id, e
        )))?;
        debug!("Killed terminal {}", handle.id);
        Ok(())
    }
}
