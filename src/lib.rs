//! shellbridge - interactive shell command sessions over a pseudo-terminal
//!
//! A terminal is a free-running, asynchronously-updating text stream; callers
//! want a blocking remote-execution call. This crate bridges the two: each
//! session drives a shell through a PTY, installs a synthetic prompt that
//! encodes the previous command's exit status, and detects completion by
//! scanning captured text for that marker.
//!
//! ## Module Organization
//!
//! - [`session`] - The command session: state machine, marker protocol,
//!   special-key classification
//! - [`registry`] - Session registry mapping identifiers to live sessions
//! - [`backend`] - Terminal backend trait and the bundled PTY implementation
//! - [`config`] - TOML-backed configuration
//! - [`models`] - Result and option types crossing the `execute` boundary
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use shellbridge::{ExecuteOptions, SessionConfig, SessionRegistry};
//!
//! # async fn run() -> shellbridge::Result<()> {
//! let registry = SessionRegistry::new(SessionConfig::default());
//!
//! let result = registry
//!     .execute("build", "echo hello", ExecuteOptions::default())
//!     .await?;
//! assert_eq!(result.output, "hello");
//! assert_eq!(result.exit_code, Some(0));
//!
//! registry.close("build").await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Semantics
//!
//! - A command that finishes before its timeout returns `completed` with the
//!   shell's real exit status parsed from the marker.
//! - A command still running at the deadline returns `running` with the
//!   partial transcript; the shell keeps going and a later empty `execute`
//!   resumes waiting. Timeouts are never errors.
//! - Submitting a second plain command while one runs, or input while
//!   nothing runs, returns `status = "error"` with a message rather than an
//!   `Err` so automated callers can branch cheaply.

#[macro_use]
extern crate tracing;

pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod registry;
pub mod session;

// Re-exports for core functionality
pub use backend::{BackendHandle, PtyBackend, TerminalBackend};
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use models::{ExecuteOptions, ExecutionResult, ExecutionStatus};
pub use registry::{SessionRef, SessionRegistry};
pub use session::CommandSession;

/// The current version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The crate name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");
