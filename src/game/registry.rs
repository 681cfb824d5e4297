//! Registry of live game sessions
//!
//! Each WebSocket connection owns its own `GameState`; the registry only
//! tracks which sessions exist so the server can cap them and report them.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

pub type SessionId = Uuid;

/// Metadata for a connected session
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: SessionId,
    pub peer: Option<SocketAddr>,
    pub connected_at: DateTime<Utc>,
    pub snapshots_sent: Arc<AtomicU64>,
}

impl SessionInfo {
    pub fn snapshots_sent(&self) -> u64 {
        self.snapshots_sent.load(Ordering::Relaxed)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Session limit reached ({0} active)")]
    Full(usize),
}

/// Registry of all live sessions
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionInfo>,
    /// Slots reserved so far; bumped before insert so the cap is exact
    reserved: AtomicUsize,
    max_sessions: usize,
    total_snapshots: AtomicU64,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            reserved: AtomicUsize::new(0),
            max_sessions,
            total_snapshots: AtomicU64::new(0),
        }
    }

    /// Register a new session, failing when the cap is reached
    pub fn register(&self, peer: Option<SocketAddr>) -> Result<SessionId, RegistryError> {
        let max = self.max_sessions;
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .map_err(RegistryError::Full)?;

        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            SessionInfo {
                id,
                peer,
                connected_at: Utc::now(),
                snapshots_sent: Arc::new(AtomicU64::new(0)),
            },
        );
        Ok(id)
    }

    pub fn unregister(&self, id: &SessionId) -> Option<SessionInfo> {
        let removed = self.sessions.remove(id).map(|(_, info)| info);
        if removed.is_some() {
            self.reserved.fetch_sub(1, Ordering::AcqRel);
        }
        removed
    }

    pub fn get(&self, id: &SessionId) -> Option<SessionInfo> {
        self.sessions.get(id).map(|s| s.value().clone())
    }

    pub fn record_snapshot(&self, id: &SessionId) {
        if let Some(session) = self.sessions.get(id) {
            session.snapshots_sent.fetch_add(1, Ordering::Relaxed);
        }
        self.total_snapshots.fetch_add(1, Ordering::Relaxed);
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn total_snapshots(&self) -> u64 {
        self.total_snapshots.load(Ordering::Relaxed)
    }
}
