//! Library-management service (Lidarr) integration
//!
//! - [`lidarr`]: HTTP client for track search and delete
//! - [`matching`]: search-term generation and candidate scoring
//! - [`purge`]: lookup + delete flow used for disliked tracks

pub mod lidarr;
pub mod matching;
pub mod purge;

pub use lidarr::LidarrClient;
pub use purge::{LibraryPurger, PurgeOutcome};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Library client errors
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Track candidate returned by a library search
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryTrack {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub album: Option<LibraryAlbum>,
    /// `null` reads as false
    #[serde(default, deserialize_with = "null_as_false")]
    pub has_file: bool,
}

fn null_as_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LibraryAlbum {
    #[serde(default)]
    pub title: Option<String>,
}

impl LibraryTrack {
    pub fn album_title(&self) -> Option<&str> {
        self.album.as_ref().and_then(|a| a.title.as_deref())
    }
}

/// Search and delete operations of the library service
#[async_trait]
pub trait LibraryService: Send + Sync {
    /// Ordered candidates for a free-text term
    async fn search_tracks(&self, term: &str) -> Result<Vec<LibraryTrack>, LibraryError>;

    /// Delete a track together with its file on disk
    async fn delete_track(&self, track_id: i64) -> Result<(), LibraryError>;
}
