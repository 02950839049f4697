//! Preference store
//!
//! Per-artist collections of liked and disliked track titles, persisted as
//! `liked.json` and `disliked.json` in the storage directory:
//!
//! ```json
//! { "Boards of Canada": { "tracks": ["Roygbiv"], "last_seen": "2025-01-01T12:00:00Z" } }
//! ```
//!
//! Every mutation is a read-modify-write of the whole document. There is no
//! cross-call locking: the harvest workers are the only writers and the
//! last writer wins.
//!
//! Mutations work on the raw JSON so that hand-edited entries and unknown
//! keys survive untouched. A document that exists but cannot be read as a
//! JSON object is never overwritten; the write fails instead. Reads skip
//! (and log) individual entries that do not fit the typed view.

use crate::json_store::{read_json_file, save_json_file};
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const LIKED_FILE: &str = "liked.json";
pub const DISLIKED_FILE: &str = "disliked.json";
pub const NOW_PLAYING_FILE: &str = "now_playing.json";

/// Liked tracks for one artist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LikedEntry {
    #[serde(default)]
    pub tracks: Vec<String>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

/// Disliked tracks for one artist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DislikedEntry {
    #[serde(default)]
    pub tracks: Vec<String>,
    /// Sticky once set
    #[serde(default)]
    pub ban_artist: bool,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

pub type LikedCollection = BTreeMap<String, LikedEntry>;
pub type DislikedCollection = BTreeMap<String, DislikedEntry>;

/// File-backed liked/disliked collections
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    liked_path: PathBuf,
    disliked_path: PathBuf,
}

impl PreferenceStore {
    pub fn new(storage_dir: &Path) -> Self {
        Self {
            liked_path: storage_dir.join(LIKED_FILE),
            disliked_path: storage_dir.join(DISLIKED_FILE),
        }
    }

    pub fn liked_path(&self) -> &Path {
        &self.liked_path
    }

    pub fn disliked_path(&self) -> &Path {
        &self.disliked_path
    }

    /// Current liked collection (empty if missing or unreadable)
    pub fn liked(&self) -> LikedCollection {
        load_collection(&self.liked_path)
    }

    /// Current disliked collection (empty if missing or unreadable)
    pub fn disliked(&self) -> DislikedCollection {
        load_collection(&self.disliked_path)
    }

    /// Record a liked track. Repeats only refresh `last_seen`.
    pub fn add_like(&self, artist: &str, track: &str) -> Result<()> {
        record(&self.liked_path, artist, track, |_| {})?;
        info!("Stored LIKE for '{}' by '{}'", track, artist);
        Ok(())
    }

    /// Record a disliked track, optionally banning the artist
    pub fn add_dislike(&self, artist: &str, track: &str, ban_artist: bool) -> Result<()> {
        record(&self.disliked_path, artist, track, |entry| {
            if ban_artist {
                entry.insert("ban_artist".to_string(), Value::Bool(true));
            } else {
                entry
                    .entry("ban_artist".to_string())
                    .or_insert(Value::Bool(false));
            }
        })?;
        info!("Stored DISLIKE for '{}' by '{}'", track, artist);
        Ok(())
    }
}

/// Whole document as a JSON object; a missing file is an empty one
fn read_document(path: &Path) -> Result<Map<String, Value>> {
    match read_json_file::<Value>(path)? {
        None => Ok(Map::new()),
        Some(Value::Object(doc)) => Ok(doc),
        Some(_) => Err(Error::Document(format!(
            "{} is not a JSON object",
            path.display()
        ))),
    }
}

fn load_collection<T: DeserializeOwned>(path: &Path) -> BTreeMap<String, T> {
    let doc = match read_document(path) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Failed loading {}: {}", path.display(), e);
            return BTreeMap::new();
        }
    };

    doc.into_iter()
        .filter_map(|(artist, value)| match serde_json::from_value(value) {
            Ok(entry) => Some((artist, entry)),
            Err(e) => {
                warn!("Skipping entry '{}' in {}: {}", artist, path.display(), e);
                None
            }
        })
        .collect()
}

/// Add `track` to the artist's entry, refresh `last_seen`, apply `update`
/// and save. Other entries and unknown keys are written back as read.
fn record(
    path: &Path,
    artist: &str,
    track: &str,
    update: impl FnOnce(&mut Map<String, Value>),
) -> Result<()> {
    let mut doc = read_document(path)?;

    let entry = doc
        .entry(artist.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| {
            Error::Document(format!("entry '{}' in {} is not an object", artist, path.display()))
        })?;

    match entry
        .entry("tracks".to_string())
        .or_insert_with(|| Value::Array(Vec::new()))
    {
        Value::Array(tracks) => {
            if !tracks.iter().any(|t| t.as_str() == Some(track)) {
                tracks.push(Value::String(track.to_string()));
            }
        }
        _ => {
            return Err(Error::Document(format!(
                "tracks of '{}' in {} is not a list",
                artist,
                path.display()
            )))
        }
    }

    entry.insert(
        "last_seen".to_string(),
        Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    );
    update(entry);

    save_json_file(path, &doc)
}
