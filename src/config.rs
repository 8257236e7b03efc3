//! Session engine configuration
//!
//! TOML-backed configuration with graceful fallback to defaults. Loading
//! failures are reported through [`Error::ConfigLoadFailed`] / [`Error::Toml`];
//! `load_or_default` logs a warning and falls back instead of failing.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Configuration for terminal sessions and their polling behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Shell program spawned inside the PTY
    pub shell: String,
    /// Arguments passed to the shell
    pub shell_args: Vec<String>,
    /// Working directory for sessions created without an explicit one
    pub default_work_dir: PathBuf,
    /// Terminal rows
    pub rows: u16,
    /// Terminal columns
    pub cols: u16,
    /// Completion-detection poll cadence in milliseconds
    pub poll_interval_ms: u64,
    /// Settle interval after delivering input to a running command
    pub settle_ms: u64,
    /// Capture buffer cap in bytes; trimmed from the front at line boundaries
    pub history_limit_bytes: usize,
    /// Default `execute` timeout in seconds
    pub default_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            shell: "/bin/bash".to_string(),
            // --noprofile/--norc keep startup files from overriding the
            // injected prompt or decorating output
            shell_args: vec!["--noprofile".to_string(), "--norc".to_string()],
            default_work_dir: default_work_dir(),
            rows: 30,
            cols: 120,
            poll_interval_ms: 500,
            settle_ms: 1000,
            history_limit_bytes: 256 * 1024,
            default_timeout_secs: 60,
        }
    }
}

fn default_work_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"))
}

impl SessionConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: SessionConfig = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Load from a file when given, falling back to defaults on any failure
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(path) => match Self::load(path) {
                Ok(config) => {
                    info!("Configuration loaded from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Failed to load configuration: {}. Using defaults", e);
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    /// Poll cadence as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Input settle interval as a [`Duration`]
    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Default execute timeout as a [`Duration`]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }
}
