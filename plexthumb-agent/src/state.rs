//! Shared runtime state
//!
//! Three pieces of state are shared between the tracker loop, the harvest
//! scheduler loop, the harvest workers and the status API:
//! - live sessions: replaced wholesale by the tracker each poll; readers get
//!   an immutable `Arc` snapshot, never a half-updated map
//! - pending finished sessions: filled by the tracker, drained by the scheduler
//! - scheduled session ids: insert-only, the at-most-once harvest guard

use crate::models::{FinishedEvent, TrackSnapshot};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Live sessions keyed by session id
pub type LiveSessions = BTreeMap<String, TrackSnapshot>;

pub struct SharedState {
    live: RwLock<Arc<LiveSessions>>,
    pending: Mutex<HashMap<String, TrackSnapshot>>,
    scheduled: Mutex<HashSet<String>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            live: RwLock::new(Arc::new(LiveSessions::new())),
            pending: Mutex::new(HashMap::new()),
            scheduled: Mutex::new(HashSet::new()),
        }
    }

    /// Snapshot of the live sessions as of the last completed poll
    pub async fn live_sessions(&self) -> Arc<LiveSessions> {
        Arc::clone(&*self.live.read().await)
    }

    /// Swap in the sessions seen by the latest poll
    pub async fn replace_live(&self, sessions: LiveSessions) {
        *self.live.write().await = Arc::new(sessions);
    }

    /// Queue finished sessions for harvest. A later event for the same id
    /// overwrites an earlier one that has not been picked up yet.
    pub async fn enqueue_finished(&self, events: Vec<FinishedEvent>) {
        if events.is_empty() {
            return;
        }
        let mut pending = self.pending.lock().await;
        for event in events {
            pending.insert(event.session_id, event.snapshot);
        }
    }

    /// Take every pending finished session, ordered by session id
    pub async fn take_pending(&self) -> Vec<FinishedEvent> {
        let drained: Vec<_> = self.pending.lock().await.drain().collect();
        let mut events: Vec<FinishedEvent> = drained
            .into_iter()
            .map(|(session_id, snapshot)| FinishedEvent { session_id, snapshot })
            .collect();
        events.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        events
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Atomically mark a session as scheduled.
    ///
    /// Returns `true` only for the first caller for a given id.
    pub async fn mark_scheduled(&self, session_id: &str) -> bool {
        let mut scheduled = self.scheduled.lock().await;
        if scheduled.contains(session_id) {
            return false;
        }
        scheduled.insert(session_id.to_string())
    }

    pub async fn is_scheduled(&self, session_id: &str) -> bool {
        self.scheduled.lock().await.contains(session_id)
    }

    pub async fn scheduled_count(&self) -> usize {
        self.scheduled.lock().await.len()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
