//! Finish-harvest scheduler
//!
//! A scan loop drains the finished sessions queued by the tracker and, for
//! each session id never scheduled before, launches one harvest worker. The
//! worker waits out a grace period (the player may still be saving the final
//! thumb), re-reads the track's rating from the media server and hands the
//! bucket to the [`RatingActor`].
//!
//! Scheduling is at-most-once per session id for the life of the process:
//! the id is marked before the worker is spawned and never unmarked, even if
//! the worker fails.

use crate::decision::RatingActor;
use crate::error::AgentResult;
use crate::media_server::MediaServer;
use crate::models::{FinishedEvent, TrackRef};
use crate::state::SharedState;
use futures::FutureExt;
use plexthumb_common::rating::normalize;
use plexthumb_common::RatingBucket;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// What a harvest worker did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestOutcome {
    /// Snapshot had no metadata key to re-fetch
    MissingRatingKey,
    /// Listened fraction under the configured play threshold
    BelowThreshold,
    /// Like or dislike recorded
    Acted(RatingBucket),
    /// Final rating was neither like nor dislike
    Unrated,
}

/// Runs the post-finish steps for a single session
pub struct Harvester {
    media: Arc<dyn MediaServer>,
    actor: RatingActor,
    grace: Duration,
    play_threshold: f64,
}

impl Harvester {
    pub fn new(media: Arc<dyn MediaServer>, actor: RatingActor, grace: Duration, play_threshold: f64) -> Self {
        Self {
            media,
            actor,
            grace,
            play_threshold,
        }
    }

    pub async fn harvest(&self, event: &FinishedEvent) -> AgentResult<HarvestOutcome> {
        let snap = &event.snapshot;
        let session_id = event.session_id.as_str();

        let Some(rating_key) = snap.rating_key.as_deref() else {
            warn!(session_id, "No ratingKey, skipping final harvest");
            return Ok(HarvestOutcome::MissingRatingKey);
        };

        if snap.progress_fraction < self.play_threshold {
            info!(
                session_id,
                "Skipping '{}' by '{}': listened {:.2} < threshold {:.2}",
                snap.track,
                snap.artist,
                snap.progress_fraction,
                self.play_threshold
            );
            return Ok(HarvestOutcome::BelowThreshold);
        }

        debug!(session_id, "Sleeping {:?} before checking final rating", self.grace);
        tokio::time::sleep(self.grace).await;

        let metadata = self.media.track_metadata(rating_key).await?;
        let raw = metadata.user_rating.as_deref();
        let bucket = normalize(raw);

        info!(
            "Final rating for '{}' by '{}': raw={}, bucket={}, listened={:.2}",
            snap.track,
            snap.artist,
            raw.unwrap_or("None"),
            bucket,
            snap.progress_fraction
        );

        let track = TrackRef::from(snap);
        if self.actor.act(&track, bucket).await {
            info!(
                session_id,
                "Action stored for '{}' by '{}' (bucket={})", snap.track, snap.artist, bucket
            );
            Ok(HarvestOutcome::Acted(bucket))
        } else {
            info!(
                session_id,
                "No action taken for '{}' by '{}' (bucket={})", snap.track, snap.artist, bucket
            );
            Ok(HarvestOutcome::Unrated)
        }
    }
}

/// Handle to a launched harvest worker
pub struct HarvestTask {
    pub session_id: String,
    pub handle: JoinHandle<()>,
}

/// Scan loop that launches one harvest worker per finished session
pub struct HarvestScheduler {
    state: Arc<SharedState>,
    harvester: Arc<Harvester>,
    scan_interval: Duration,
}

impl HarvestScheduler {
    pub fn new(state: Arc<SharedState>, harvester: Arc<Harvester>, scan_interval: Duration) -> Self {
        Self {
            state,
            harvester,
            scan_interval,
        }
    }

    /// Launch workers for all pending, never-scheduled sessions
    pub async fn scan_once(&self) -> Vec<HarvestTask> {
        let mut launched = Vec::new();

        for event in self.state.take_pending().await {
            if !self.state.mark_scheduled(&event.session_id).await {
                debug!(session_id = %event.session_id, "Already scheduled, skipping");
                continue;
            }

            info!(
                session_id = %event.session_id,
                "Scheduling post-finish check ({} - {}) (progress={:.2})",
                event.snapshot.artist,
                event.snapshot.track,
                event.snapshot.progress_fraction
            );

            let session_id = event.session_id.clone();
            let handle = spawn_worker(Arc::clone(&self.harvester), event);
            launched.push(HarvestTask { session_id, handle });
        }

        launched
    }

    /// Spawn the scan loop. Workers are fire-and-forget.
    pub fn run(self) -> JoinHandle<()> {
        info!("Finish watcher started (interval: {:?})", self.scan_interval);

        tokio::spawn(async move {
            let mut timer = interval(self.scan_interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                timer.tick().await;
                self.scan_once().await;
            }
        })
    }
}

/// Run one harvest behind an error and panic boundary
fn spawn_worker(harvester: Arc<Harvester>, event: FinishedEvent) -> JoinHandle<()> {
    tokio::spawn(async move {
        let session_id = event.session_id.as_str();
        let result = AssertUnwindSafe(harvester.harvest(&event)).catch_unwind().await;

        match result {
            Ok(Ok(outcome)) => debug!(session_id, ?outcome, "Harvest finished"),
            Ok(Err(e)) => warn!(session_id, "Harvest aborted: {}", e),
            Err(_) => error!(session_id, "Harvest worker panicked"),
        }
    })
}
