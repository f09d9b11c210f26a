//! Session management for multiple simulated terminals
//!
//! Each dashboard tile owns one independent `TerminalSession`. Sessions
//! remove themselves from the map once their close callback fires.

use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use vpsterm_core::{
    ConnectionPhase, LogObserver, ServerIdentity, SessionOptions, SessionTiming, TerminalSession,
};

use crate::web_ui::ApiError;

/// Length of generated session ids in bytes (hex doubles it)
const SESSION_ID_BYTES: usize = 8;

/// One row of the session list
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub name: String,
    pub address: String,
    pub provider: String,
    pub phase: ConnectionPhase,
}

type SessionMap = HashMap<String, Arc<TerminalSession>>;

/// Session manager for simulated terminals
pub struct SessionManager {
    sessions: Arc<Mutex<SessionMap>>,
    timing: SessionTiming,
    max_sessions: usize,
}

impl SessionManager {
    /// Create new session manager
    pub fn new(timing: SessionTiming, max_sessions: usize) -> Self {
        Self {
            sessions: Default::default(),
            timing,
            max_sessions,
        }
    }

    /// Create and start a terminal for `identity`
    pub async fn create_session(
        &self,
        identity: ServerIdentity,
    ) -> Result<(String, Arc<TerminalSession>), ApiError> {
        let mut sessions = self.sessions.lock().await;
        if sessions.len() >= self.max_sessions {
            return Err(ApiError::LimitReached(self.max_sessions));
        }

        let id = generate_session_id();
        let options = SessionOptions::default()
            .with_timing(self.timing)
            .with_observer(Arc::new(LogObserver))
            .on_close(release_on_close(Arc::clone(&self.sessions), id.clone()));

        let session = Arc::new(TerminalSession::new(identity, options)?);
        session.start().await?;
        sessions.insert(id.clone(), Arc::clone(&session));

        tracing::info!(
            "Created terminal session {} for {}",
            id,
            session.identity().address()
        );
        Ok((id, session))
    }

    /// Get session by ID
    pub async fn get_session(&self, id: &str) -> Result<Arc<TerminalSession>, ApiError> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::SessionNotFound(id.to_string()))
    }

    /// Close and release a session
    pub async fn close_session(&self, id: &str) -> Result<(), ApiError> {
        let session = self
            .sessions
            .lock()
            .await
            .remove(id)
            .ok_or_else(|| ApiError::SessionNotFound(id.to_string()))?;
        tracing::info!("Closing terminal session {}", id);
        session.close().await;
        Ok(())
    }

    /// Summaries of all sessions, sorted by name
    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        let sessions = self.sessions.lock().await;
        let mut list: Vec<SessionSummary> = sessions
            .iter()
            .map(|(id, session)| {
                let identity = session.identity();
                SessionSummary {
                    id: id.clone(),
                    name: identity.name.clone(),
                    address: identity.address(),
                    provider: identity.provider.tag().to_string(),
                    phase: session.phase(),
                }
            })
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        list
    }

    /// Get session count
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Close every session (shutdown)
    pub async fn close_all(&self) {
        let drained: Vec<(String, Arc<TerminalSession>)> =
            self.sessions.lock().await.drain().collect();
        for (id, session) in drained {
            tracing::debug!("Closing terminal session {} on shutdown", id);
            session.close().await;
        }
    }
}

/// `on_close` hook: drop the session from the map
fn release_on_close(sessions: Arc<Mutex<SessionMap>>, id: String) -> impl FnOnce() + Send + 'static {
    move || {
        tokio::spawn(async move {
            if sessions.lock().await.remove(&id).is_some() {
                tracing::info!("Released terminal session {}", id);
            }
        });
    }
}

fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::thread_rng().fill(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
