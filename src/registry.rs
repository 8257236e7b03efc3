//! Session registry
//!
//! Maps session identifiers to command sessions. Entries are created lazily
//! on first reference and removed only on explicit close. All map mutation
//! happens under a single async mutex so two callers cannot race to create
//! the same identifier; each session sits behind its own mutex so `execute`
//! is serialized per session without blocking the others.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::backend::{PtyBackend, TerminalBackend};
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::models::{ExecuteOptions, ExecutionResult};
use crate::session::CommandSession;

/// Shared reference to a registered session
pub type SessionRef = Arc<Mutex<CommandSession>>;

/// Owner of all live command sessions
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionRef>>,
    backend: Arc<dyn TerminalBackend>,
    config: SessionConfig,
}

impl SessionRegistry {
    /// Create a registry backed by the bundled PTY backend
    pub fn new(config: SessionConfig) -> Self {
        let backend = Arc::new(PtyBackend::new(config.clone()));
        Self::with_backend(backend, config)
    }

    /// Create a registry over a caller-supplied backend
    pub fn with_backend(backend: Arc<dyn TerminalBackend>, config: SessionConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            backend,
            config,
        }
    }

    /// Get the session for `id`, creating it in the configured default
    /// working directory on first reference.
    pub async fn get_or_create(&self, id: &str) -> Result<SessionRef> {
        let work_dir = self.config.default_work_dir.clone();
        self.create(id, &work_dir).await
    }

    /// Get or create the session for `id` rooted at `work_dir`
    ///
    /// Creating an identifier that already exists returns the existing
    /// session untouched; one session per identifier is guaranteed. The map
    /// lock is held across the spawn so two callers racing on the same id
    /// cannot both create a terminal.
    pub async fn create(&self, id: &str, work_dir: &Path) -> Result<SessionRef> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(id) {
            return Ok(Arc::clone(session));
        }

        let session = CommandSession::open(
            id,
            work_dir,
            Arc::clone(&self.backend),
            self.config.clone(),
        )
        .await?;
        let session = Arc::new(Mutex::new(session));
        sessions.insert(id.to_string(), Arc::clone(&session));
        Ok(session)
    }

    /// Look up an existing session without creating one
    pub async fn get(&self, id: &str) -> Result<SessionRef> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound {
                session_id: id.to_string(),
            })
    }

    /// Execute a command in the session for `id`, creating it on first use
    pub async fn execute(
        &self,
        id: &str,
        command: &str,
        opts: ExecuteOptions,
    ) -> Result<ExecutionResult> {
        let session = self.get_or_create(id).await?;
        let mut session = session.lock().await;
        session.execute(command, opts).await
    }

    /// Close and remove the session for `id`
    ///
    /// Returns `false` when the identifier is unknown.
    pub async fn close(&self, id: &str) -> bool {
        let removed = {
            let mut sessions = self.sessions.lock().await;
            sessions.remove(id)
        };
        match removed {
            Some(session) => {
                session.lock().await.close().await;
                true
            }
            None => false,
        }
    }

    /// Close every session; used at process shutdown
    pub async fn close_all(&self) {
        let drained: Vec<(String, SessionRef)> = {
            let mut sessions = self.sessions.lock().await;
            sessions.drain().collect()
        };
        for (id, session) in drained {
            debug!("Closing session {}", id);
            session.lock().await.close().await;
        }
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// True when no sessions are registered
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
