//! Decision routine: turn a final rating bucket into stored preferences
//! and, for dislikes, a library purge.
//!
//! A dislike is written to the preference store before the purge is
//! attempted. The purge outcome never touches the stored preference.

use crate::library::{LibraryPurger, PurgeOutcome};
use crate::models::TrackRef;
use plexthumb_common::{PreferenceStore, RatingBucket};
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Clone)]
pub struct RatingActor {
    store: Arc<PreferenceStore>,
    /// `None` when no library service is configured
    purger: Option<LibraryPurger>,
}

impl RatingActor {
    pub fn new(store: Arc<PreferenceStore>, purger: Option<LibraryPurger>) -> Self {
        Self { store, purger }
    }

    /// Act on a bucket. Returns whether anything was recorded.
    pub async fn act(&self, track: &TrackRef, bucket: RatingBucket) -> bool {
        match bucket {
            RatingBucket::Like => {
                self.store_preference(track, bucket).await;
                true
            }
            RatingBucket::Dislike => {
                self.store_preference(track, bucket).await;
                self.purge(track).await;
                true
            }
            RatingBucket::Unrated => false,
        }
    }

    /// Document writes are blocking file I/O, so they run off the async workers
    async fn store_preference(&self, track: &TrackRef, bucket: RatingBucket) {
        let store = Arc::clone(&self.store);
        let artist = track.artist.clone();
        let title = track.title.clone();

        let result = tokio::task::spawn_blocking(move || match bucket {
            RatingBucket::Dislike => store.add_dislike(&artist, &title, false),
            _ => store.add_like(&artist, &title),
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(
                "Failed to store {} for '{}' by '{}': {}",
                bucket, track.title, track.artist, e
            ),
            Err(e) => error!("Preference write task failed: {}", e),
        }
    }

    async fn purge(&self, track: &TrackRef) -> Option<PurgeOutcome> {
        match &self.purger {
            Some(purger) => Some(purger.purge(track).await),
            None => {
                warn!(
                    "Library service not configured; not purging '{}' by '{}'",
                    track.title, track.artist
                );
                None
            }
        }
    }
}
