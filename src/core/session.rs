//! Sessions: the unit credentials, history and rate limits are scoped to.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use time::OffsetDateTime;
use tokio::time::Instant;
use uuid::Uuid;

use crate::core::credentials::{CredentialHolder, CredentialPolicy};
use crate::core::history::{DEFAULT_HISTORY_LIMIT, History};
use crate::core::rate_limit::CallerKey;

pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    key: CallerKey,
    created_at: OffsetDateTime,
    last_seen: Mutex<Instant>,
    pub credentials: CredentialHolder,
    pub history: History,
}

impl Session {
    fn new(policy: CredentialPolicy, history_limit: usize) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            key: CallerKey::from(id.to_string()),
            created_at: OffsetDateTime::now_utc(),
            last_seen: Mutex::new(Instant::now()),
            credentials: CredentialHolder::new(policy),
            history: History::new(history_limit),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Rate-limit identity of this session.
    pub fn caller_key(&self) -> &CallerKey {
        &self.key
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    fn touch(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_seen.lock())
    }

    /// Release everything the session holds.
    fn close(&self) {
        self.credentials.clear();
        self.history.clear();
    }
}

/// Live sessions keyed by id.
pub struct SessionStore {
    sessions: DashMap<Uuid, Arc<Session>>,
    idle_timeout: Duration,
    credential_policy: CredentialPolicy,
    history_limit: usize,
}

impl SessionStore {
    pub fn new(
        idle_timeout: Duration,
        credential_policy: CredentialPolicy,
        history_limit: usize,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout,
            credential_policy,
            history_limit,
        }
    }

    pub fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new(self.credential_policy, self.history_limit));
        self.sessions.insert(session.id, Arc::clone(&session));
        tracing::debug!(session = %session.id, "Session created");
        session
    }

    /// Look up a live session and mark it active.
    pub fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        let session = self.sessions.get(&id).map(|entry| Arc::clone(entry.value()))?;
        session.touch();
        Some(session)
    }

    /// Whether `id` names a live session. Does not count as activity.
    pub fn contains(&self, id: Uuid) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Session for a client-supplied id, or a new one.
    ///
    /// Ids that are malformed or not currently live are never adopted; the
    /// client gets a freshly generated session instead. The flag reports
    /// whether a session was created.
    pub fn resolve(&self, presented: Option<&str>) -> (Arc<Session>, bool) {
        let existing = presented
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .and_then(|id| self.get(id));
        match existing {
            Some(session) => (session, false),
            None => (self.create(), true),
        }
    }

    /// End a session, clearing its credential and history.
    pub fn end(&self, id: Uuid) -> bool {
        match self.sessions.remove(&id) {
            Some((_, session)) => {
                session.close();
                tracing::info!(session = %id, "Session ended");
                true
            }
            None => false,
        }
    }

    /// End sessions idle for at least the idle timeout. Returns how many.
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut evicted = Vec::new();
        self.sessions.retain(|_, session| {
            if session.idle_for(now) >= self.idle_timeout {
                evicted.push(Arc::clone(session));
                false
            } else {
                true
            }
        });
        for session in &evicted {
            session.close();
            tracing::debug!(session = %session.id, "Idle session expired");
        }
        evicted.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(
            DEFAULT_SESSION_IDLE_TIMEOUT,
            CredentialPolicy::default(),
            DEFAULT_HISTORY_LIMIT,
        )
    }
}
