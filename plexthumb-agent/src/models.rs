//! Playback observations passed between the tracker and the harvest workers

use serde::{Deserialize, Serialize};

/// One polled observation of a playing track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    /// Metadata key when present, otherwise "artist-title"
    pub session_id: String,
    pub artist: String,
    pub album: String,
    pub track: String,
    /// Opaque source identifier, e.g. `plex://track/5d07cdc5403c640290f5e7b1`
    pub guid: Option<String>,
    /// Stable key used to re-fetch authoritative metadata
    #[serde(rename = "ratingKey")]
    pub rating_key: Option<String>,
    /// Always within [0, 1]
    pub progress_fraction: f64,
    /// Rating as seen mid-play, before the grace period
    pub user_rating_raw: Option<String>,
}

impl TrackSnapshot {
    pub fn new(
        artist: impl Into<String>,
        album: impl Into<String>,
        track: impl Into<String>,
        rating_key: Option<String>,
    ) -> Self {
        let artist = artist.into();
        let track = track.into();
        let rating_key = rating_key.filter(|k| !k.is_empty());
        let session_id = session_id_for(rating_key.as_deref(), &artist, &track);

        Self {
            session_id,
            artist,
            album: album.into(),
            track,
            guid: None,
            rating_key,
            progress_fraction: 0.0,
            user_rating_raw: None,
        }
    }

    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }

    pub fn with_progress(mut self, fraction: f64) -> Self {
        self.progress_fraction = clamp_fraction(fraction);
        self
    }

    pub fn with_rating(mut self, raw: impl Into<String>) -> Self {
        self.user_rating_raw = Some(raw.into());
        self
    }
}

/// A session seen in the previous poll and missing from the current one
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedEvent {
    pub session_id: String,
    /// Last snapshot observed before the session disappeared
    pub snapshot: TrackSnapshot,
}

/// Authoritative track attributes re-read after a session ends
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackMetadata {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub user_rating: Option<String>,
}

/// Artist/title/album/guid as known at harvest time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackRef {
    pub artist: String,
    pub title: String,
    pub album: String,
    pub guid: Option<String>,
}

impl From<&TrackSnapshot> for TrackRef {
    fn from(snapshot: &TrackSnapshot) -> Self {
        Self {
            artist: snapshot.artist.clone(),
            title: snapshot.track.clone(),
            album: snapshot.album.clone(),
            guid: snapshot.guid.clone(),
        }
    }
}

pub fn session_id_for(rating_key: Option<&str>, artist: &str, track: &str) -> String {
    match rating_key {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => format!("{}-{}", artist, track),
    }
}

/// `viewOffset / duration`, 0.0 when either is unusable
pub fn progress_fraction(view_offset: Option<&str>, duration: Option<&str>) -> f64 {
    let offset = match view_offset {
        Some(v) => match v.trim().parse::<f64>() {
            Ok(v) => v,
            Err(_) => return 0.0,
        },
        None => 0.0,
    };
    let duration = match duration {
        Some(d) => match d.trim().parse::<f64>() {
            Ok(d) => d,
            Err(_) => return 0.0,
        },
        None => 1.0,
    };
    if duration <= 0.0 {
        return 0.0;
    }
    clamp_fraction(offset / duration)
}

fn clamp_fraction(fraction: f64) -> f64 {
    if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    }
}
