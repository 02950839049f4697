//! Purge flow: match a disliked track in the library, then delete it
//!
//! Unmatched tracks are left alone; a weak match is never deleted.

use super::matching::{search_terms, MatchQuery, MIN_CONFIDENT_SCORE};
use super::{LibraryService, LibraryTrack};
use crate::models::TrackRef;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a purge attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// No confident candidate; nothing deleted
    NoMatch,
    Deleted { track_id: i64 },
    DeleteFailed { track_id: i64 },
}

/// Lookup/delete/purge on top of a [`LibraryService`]
#[derive(Clone)]
pub struct LibraryPurger {
    service: Arc<dyn LibraryService>,
}

impl LibraryPurger {
    pub fn new(service: Arc<dyn LibraryService>) -> Self {
        Self { service }
    }

    /// Find a confident library candidate for `track`.
    ///
    /// Terms are tried in order; a failing term is skipped. The first term
    /// whose best candidate scores at least [`MIN_CONFIDENT_SCORE`] wins.
    pub async fn lookup(&self, track: &TrackRef) -> Option<LibraryTrack> {
        let query = MatchQuery::from(track);

        for term in search_terms(track) {
            let results = match self.service.search_tracks(&term).await {
                Ok(results) => results,
                Err(e) => {
                    warn!(term = %term, "Library lookup failed: {}", e);
                    continue;
                }
            };

            let Some((best, score)) = query.best(&results) else {
                debug!(term = %term, "No library results");
                continue;
            };

            debug!(
                term = %term,
                track_id = ?best.id,
                title = ?best.title,
                artist = ?best.artist_name,
                score,
                "Best library candidate"
            );

            if score >= MIN_CONFIDENT_SCORE && best.id.is_some() {
                return Some(best.clone());
            }
        }

        None
    }

    /// Delete a library track and its file. Failures are logged, never retried.
    pub async fn delete(&self, track_id: i64) -> bool {
        match self.service.delete_track(track_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(track_id, "Library delete failed: {}", e);
                false
            }
        }
    }

    /// Lookup then delete. Never fails to the caller.
    pub async fn purge(&self, track: &TrackRef) -> PurgeOutcome {
        let Some(candidate) = self.lookup(track).await else {
            info!(
                "Couldn't confidently match '{}' by '{}' for deletion",
                track.title, track.artist
            );
            return PurgeOutcome::NoMatch;
        };

        // lookup() only returns candidates with an id
        let Some(track_id) = candidate.id else {
            return PurgeOutcome::NoMatch;
        };

        info!(
            track_id,
            "Requesting library delete ('{}' by '{}')",
            candidate.title.as_deref().unwrap_or_default(),
            candidate.artist_name.as_deref().unwrap_or_default()
        );

        if self.delete(track_id).await {
            info!(track_id, "Library delete succeeded");
            PurgeOutcome::Deleted { track_id }
        } else {
            warn!(track_id, "Library delete may have failed");
            PurgeOutcome::DeleteFailed { track_id }
        }
    }
}
