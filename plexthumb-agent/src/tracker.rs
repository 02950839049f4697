//! Session tracker
//!
//! Polls the media server on a fixed interval and turns successive
//! "currently playing" listings into finished-session events: an id present
//! in the previous poll and absent from the current one has finished. The
//! event carries the last snapshot seen for that id.

use crate::media_server::{MediaServer, MediaServerError};
use crate::models::{FinishedEvent, TrackSnapshot};
use crate::state::{LiveSessions, SharedState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

pub struct SessionTracker {
    media: Arc<dyn MediaServer>,
    state: Arc<SharedState>,
    poll_interval: Duration,
    /// Sessions from the previous poll
    previous: HashMap<String, TrackSnapshot>,
}

impl SessionTracker {
    pub fn new(media: Arc<dyn MediaServer>, state: Arc<SharedState>, poll_interval: Duration) -> Self {
        Self {
            media,
            state,
            poll_interval,
            previous: HashMap::new(),
        }
    }

    /// Feed one poll's sessions and return the sessions that ended.
    ///
    /// A repeated session id within one poll keeps the last occurrence.
    pub fn observe(&mut self, sessions: Vec<TrackSnapshot>) -> Vec<FinishedEvent> {
        let current: HashMap<String, TrackSnapshot> = sessions
            .into_iter()
            .map(|snap| (snap.session_id.clone(), snap))
            .collect();

        let previous = std::mem::replace(&mut self.previous, current);

        let mut ended: Vec<FinishedEvent> = previous
            .into_iter()
            .filter(|(id, _)| !self.previous.contains_key(id))
            .map(|(session_id, snapshot)| FinishedEvent { session_id, snapshot })
            .collect();
        ended.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        ended
    }

    /// Ids seen in the most recent poll
    pub fn active_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.previous.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// One poll cycle: fetch, publish live sessions, queue finished ones.
    ///
    /// On error nothing changes, so the next successful poll diffs against
    /// the last good one.
    pub async fn poll_once(&mut self) -> Result<Vec<FinishedEvent>, MediaServerError> {
        let sessions = self.media.active_sessions().await?;

        for snap in &sessions {
            debug!(
                "{} - {} ({:.0}% played, rating={})",
                snap.artist,
                snap.track,
                snap.progress_fraction * 100.0,
                snap.user_rating_raw.as_deref().unwrap_or("None")
            );
        }
        if sessions.is_empty() {
            debug!("No active tracks.");
        }

        let live: LiveSessions = sessions
            .iter()
            .map(|snap| (snap.session_id.clone(), snap.clone()))
            .collect();

        let ended = self.observe(sessions);
        for event in &ended {
            info!(
                session_id = %event.session_id,
                "Session ended: {} - {} (progress={:.2})",
                event.snapshot.artist,
                event.snapshot.track,
                event.snapshot.progress_fraction
            );
        }

        self.state.replace_live(live).await;
        self.state.enqueue_finished(ended.clone()).await;
        Ok(ended)
    }

    /// Spawn the polling loop. It never exits on error.
    pub fn run(mut self) -> JoinHandle<()> {
        info!("Session tracker started (interval: {:?})", self.poll_interval);

        tokio::spawn(async move {
            let mut timer = interval(self.poll_interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                timer.tick().await;
                if let Err(e) = self.poll_once().await {
                    warn!("Media server poll error: {}", e);
                }
            }
        })
    }
}
