//! Error types and Result aliases for shellbridge

use std::fmt;
use std::path::PathBuf;

/// Result type alias for shellbridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for shellbridge
///
/// Contract-level conditions (a second command submitted while one is
/// running, input sent with nothing running) are *not* errors: they are
/// reported as an [`crate::ExecutionResult`] with `status = "error"` so
/// automated callers can branch without exception-style control flow.
#[derive(Debug)]
pub enum Error {
    // === Session errors ===
    /// Backend could not spawn a terminal for a new session
    SessionCreationFailed {
        session_id: String,
        reason: String,
    },

    /// Operation attempted before initialization or after close
    SessionNotInitialized {
        session_id: String,
    },

    /// Unknown session identifier
    SessionNotFound {
        session_id: String,
    },

    // === Backend errors ===
    /// Failed to spawn the shell process in a PTY
    SpawnFailed {
        command: String,
        reason: String,
    },

    /// Backend handle not found
    HandleNotFound {
        handle_id: String,
    },

    /// Failed to deliver keystrokes to the terminal
    SendFailed {
        reason: String,
    },

    /// Failed to capture the terminal buffer
    CaptureFailed {
        reason: String,
    },

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    // === I/O and serialization errors ===
    /// I/O errors
    Io(std::io::Error),

    /// Serialization errors
    Serde(serde_json::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),

    /// Regex compilation errors
    Regex(regex::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors (for cases not yet categorized)
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Session errors
            Error::SessionCreationFailed { session_id, reason } => {
                write!(f, "Failed to create session '{}': {}", session_id, reason)
            }
            Error::SessionNotInitialized { session_id } => {
                write!(f, "Session '{}' is not initialized", session_id)
            }
            Error::SessionNotFound { session_id } => {
                write!(f, "Session '{}' not found", session_id)
            }

            // Backend errors
            Error::SpawnFailed { command, reason } => {
                write!(f, "Failed to spawn '{}' in a PTY: {}", command, reason)
            }
            Error::HandleNotFound { handle_id } => {
                write!(f, "Terminal handle '{}' not found", handle_id)
            }
            Error::SendFailed { reason } => {
                write!(f, "Failed to send keys to terminal: {}", reason)
            }
            Error::CaptureFailed { reason } => {
                write!(f, "Failed to capture terminal buffer: {}", reason)
            }

            // Configuration errors
            Error::ConfigLoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path.display(), reason)
            }

            // I/O and serialization errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Serde(err) => write!(f, "Serialization error: {}", err),
            Error::Toml(err) => write!(f, "TOML parsing error: {}", err),
            Error::Regex(err) => write!(f, "Regex compilation error: {}", err),

            // Generic fallback
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Regex(err)
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
