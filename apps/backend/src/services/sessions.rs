//! In-memory registry of open study sessions.
//!
//! Sessions are never persisted. Each one is owned by the learner that
//! opened it and is dropped when the learner abandons it or leaves it idle
//! for longer than the registry's TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use review_core::{ReviewStore, StudySession};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// A session shared between requests.
pub type SharedSession<S> = Arc<Mutex<StudySession<S>>>;

/// Idle time after which an untouched session is dropped.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

struct Entry<S> {
    learner_id: Uuid,
    session: SharedSession<S>,
    last_touched: Instant,
}

impl<S> Entry<S> {
    fn is_stale(&self, now: Instant, idle_ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_touched) >= idle_ttl
    }
}

/// Open study sessions keyed by session ID.
pub struct SessionRegistry<S> {
    sessions: RwLock<HashMap<Uuid, Entry<S>>>,
    idle_ttl: Duration,
}

impl<S> Default for SessionRegistry<S> {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TTL)
    }
}

impl<S> SessionRegistry<S> {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl,
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }
}

impl<S: ReviewStore + 'static> SessionRegistry<S> {
    /// Register a session and return its new ID.
    ///
    /// Stale sessions are pruned first.
    pub async fn insert(&self, session: StudySession<S>) -> (Uuid, SharedSession<S>) {
        let id = Uuid::new_v4();
        let learner_id = session.learner_id();
        let session = Arc::new(Mutex::new(session));

        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        prune_stale(&mut sessions, now, self.idle_ttl);
        sessions.insert(
            id,
            Entry {
                learner_id,
                session: session.clone(),
                last_touched: now,
            },
        );

        (id, session)
    }

    /// Look up a session owned by the given learner and mark it as used.
    ///
    /// A session idle past the TTL is dropped instead of returned.
    pub async fn get(&self, id: Uuid, learner_id: Uuid) -> Option<SharedSession<S>> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        if entry.learner_id != learner_id {
            return None;
        }
        if entry.is_stale(now, self.idle_ttl) {
            sessions.remove(&id);
            tracing::debug!(session_id = %id, "dropped idle study session");
            return None;
        }
        entry.last_touched = now;
        Some(entry.session.clone())
    }

    /// Drop a session owned by the given learner.
    pub async fn remove(&self, id: Uuid, learner_id: Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(&id) {
            Some(entry) if entry.learner_id == learner_id => {
                sessions.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Drop every session idle past the TTL. Returns how many were dropped.
    pub async fn prune(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        prune_stale(&mut sessions, Instant::now(), self.idle_ttl)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

fn prune_stale<S>(sessions: &mut HashMap<Uuid, Entry<S>>, now: Instant, idle_ttl: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|_, entry| !entry.is_stale(now, idle_ttl));
    let pruned = before - sessions.len();
    if pruned > 0 {
        tracing::debug!(pruned, remaining = sessions.len(), "pruned idle study sessions");
    }
    pruned
}

/// Prune idle sessions in the background every half TTL.
pub fn spawn_pruner<S: ReviewStore + 'static>(
    registry: Arc<SessionRegistry<S>>,
) -> tokio::task::JoinHandle<()> {
    let period = (registry.idle_ttl() / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            registry.prune().await;
        }
    })
}
