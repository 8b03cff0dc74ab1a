//! Session management
//!
//! Each session owns its viewer state, tables, snapshots and memory. The
//! store hands out one `Arc<Mutex<Session>>` per id; a request holds that
//! mutex for its whole duration, so requests on one session serialize and
//! distinct sessions never share state.

use chrono::{DateTime, Utc};
use ng_core::AgentConfig;
use ng_tools::Workspace;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::memory::InteractionMemory;

pub const DEFAULT_SESSION_ID: &str = "default";

#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub workspace: Workspace,
    pub memory: InteractionMemory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>, workspace: Workspace, memory: InteractionMemory) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            workspace,
            memory,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Basic session info for listing
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub layers: usize,
    pub files: usize,
    pub memory_items: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub type SharedSession = Arc<Mutex<Session>>;

/// Keyed session storage
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SharedSession>>>,
    max_upload_bytes: usize,
    memory_max_items: usize,
    memory_max_chars: usize,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_upload_bytes: config.max_upload_bytes,
            memory_max_items: config.memory_max_items,
            memory_max_chars: config.memory_max_chars,
            max_sessions: config.max_sessions.max(1),
        }
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Blank or missing ids map to [`DEFAULT_SESSION_ID`].
    pub fn normalize_id(id: Option<&str>) -> String {
        match id.map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => DEFAULT_SESSION_ID.to_string(),
        }
    }

    /// Get a session by ID
    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Get or create a session
    pub async fn get_or_create(&self, id: &str) -> SharedSession {
        if let Some(session) = self.get(id).await {
            return session;
        }

        let mut sessions = self.sessions.write().await;
        // Another request may have created it between the two locks
        if let Some(session) = sessions.get(id) {
            return session.clone();
        }

        // Evict oldest session if at capacity
        while sessions.len() >= self.max_sessions {
            match Self::oldest(&sessions) {
                Some(oldest_id) => {
                    debug!(session = %oldest_id, "Evicting session");
                    sessions.remove(&oldest_id);
                }
                None => break,
            }
        }

        debug!(session = %id, "Creating session");
        let session = Arc::new(Mutex::new(Session::new(
            id,
            Workspace::new(self.max_upload_bytes),
            InteractionMemory::new(self.memory_max_items, self.memory_max_chars),
        )));
        sessions.insert(id.to_string(), session.clone());
        session
    }

    /// Least recently updated session. One locked by an in-flight request
    /// ranks as newest; the request keeps its handle even if it is evicted.
    fn oldest(sessions: &HashMap<String, SharedSession>) -> Option<String> {
        sessions
            .iter()
            .map(|(id, handle)| {
                let updated_at = match handle.try_lock() {
                    Ok(s) => s.updated_at,
                    Err(_) => DateTime::<Utc>::MAX_UTC,
                };
                (updated_at, id)
            })
            .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)))
            .map(|(_, id)| id.clone())
    }

    /// Delete a session
    pub async fn delete(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Get session count
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// List all sessions with basic info
    pub async fn list_sessions(&self) -> Vec<SessionInfo> {
        let handles: Vec<SharedSession> = self.sessions.read().await.values().cloned().collect();
        let mut infos = Vec::with_capacity(handles.len());
        for handle in handles {
            let s = handle.lock().await;
            infos.push(SessionInfo {
                id: s.id.clone(),
                layers: s.workspace.viewer.layers.len(),
                files: s.workspace.tables.list_files().len(),
                memory_items: s.memory.len(),
                created_at: s.created_at,
                updated_at: s.updated_at,
            });
        }
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(&AgentConfig::default())
    }
}
