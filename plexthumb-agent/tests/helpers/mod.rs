//! Shared test doubles
//!
//! - [`FakeMediaServer`]: scripted session listings and final ratings
//! - [`FakeLibrary`]: canned search results, records searches and deletes
//! - [`spawn_stub`]: serve an axum router on a loopback port

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use plexthumb_agent::library::{LibraryAlbum, LibraryError, LibraryService, LibraryTrack};
use plexthumb_agent::media_server::{MediaServer, MediaServerError};
use plexthumb_agent::models::{TrackMetadata, TrackSnapshot};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Media server whose responses are set by the test
#[derive(Default)]
pub struct FakeMediaServer {
    polls: Mutex<VecDeque<Result<Vec<TrackSnapshot>, u16>>>,
    ratings: Mutex<HashMap<String, Option<String>>>,
    metadata_status: Mutex<Option<u16>>,
    panic_on_metadata: Mutex<bool>,
    metadata_calls: AtomicUsize,
}

impl FakeMediaServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the listing returned by the next poll
    pub fn push_poll(&self, sessions: Vec<TrackSnapshot>) {
        self.polls.lock().unwrap().push_back(Ok(sessions));
    }

    /// Queue a failing poll
    pub fn push_poll_error(&self, status: u16) {
        self.polls.lock().unwrap().push_back(Err(status));
    }

    pub fn set_rating(&self, rating_key: &str, rating: Option<&str>) {
        self.ratings
            .lock()
            .unwrap()
            .insert(rating_key.to_string(), rating.map(str::to_string));
    }

    /// Make every metadata fetch fail with this status
    pub fn fail_metadata(&self, status: u16) {
        *self.metadata_status.lock().unwrap() = Some(status);
    }

    pub fn panic_on_metadata(&self) {
        *self.panic_on_metadata.lock().unwrap() = true;
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaServer for FakeMediaServer {
    async fn active_sessions(&self) -> Result<Vec<TrackSnapshot>, MediaServerError> {
        match self.polls.lock().unwrap().pop_front() {
            Some(Ok(sessions)) => Ok(sessions),
            Some(Err(status)) => Err(MediaServerError::Status(status)),
            None => Ok(Vec::new()),
        }
    }

    async fn track_metadata(&self, rating_key: &str) -> Result<TrackMetadata, MediaServerError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if *self.panic_on_metadata.lock().unwrap() {
            panic!("metadata exploded");
        }
        if let Some(status) = *self.metadata_status.lock().unwrap() {
            return Err(MediaServerError::Status(status));
        }
        let rating = self.ratings.lock().unwrap().get(rating_key).cloned().flatten();
        Ok(TrackMetadata {
            artist: None,
            title: None,
            user_rating: rating,
        })
    }
}

/// Library service with canned results per search term
#[derive(Default)]
pub struct FakeLibrary {
    results: Mutex<HashMap<String, Vec<LibraryTrack>>>,
    failing_terms: Mutex<HashSet<String>>,
    delete_status: Mutex<Option<u16>>,
    searches: Mutex<Vec<String>>,
    deletes: Mutex<Vec<i64>>,
}

impl FakeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(self, term: &str, results: Vec<LibraryTrack>) -> Self {
        self.results.lock().unwrap().insert(term.to_string(), results);
        self
    }

    pub fn with_failing_term(self, term: &str) -> Self {
        self.failing_terms.lock().unwrap().insert(term.to_string());
        self
    }

    pub fn with_delete_status(self, status: u16) -> Self {
        *self.delete_status.lock().unwrap() = Some(status);
        self
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<i64> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl LibraryService for FakeLibrary {
    async fn search_tracks(&self, term: &str) -> Result<Vec<LibraryTrack>, LibraryError> {
        self.searches.lock().unwrap().push(term.to_string());
        if self.failing_terms.lock().unwrap().contains(term) {
            return Err(LibraryError::Network("timed out".to_string()));
        }
        Ok(self.results.lock().unwrap().get(term).cloned().unwrap_or_default())
    }

    async fn delete_track(&self, track_id: i64) -> Result<(), LibraryError> {
        self.deletes.lock().unwrap().push(track_id);
        match *self.delete_status.lock().unwrap() {
            Some(status) => Err(LibraryError::Api(status, "rejected".to_string())),
            None => Ok(()),
        }
    }
}

pub fn library_track(id: i64, artist: &str, title: &str, album: &str, has_file: bool) -> LibraryTrack {
    LibraryTrack {
        id: Some(id),
        title: Some(title.to_string()),
        artist_name: Some(artist.to_string()),
        album: Some(LibraryAlbum {
            title: Some(album.to_string()),
        }),
        has_file,
    }
}

pub fn roygbiv(session_id: &str) -> TrackSnapshot {
    TrackSnapshot::new(
        "Boards of Canada",
        "Music Has the Right to Children",
        "Roygbiv",
        Some(session_id.to_string()),
    )
    .with_guid("plex://track/5d07cdc5403c640290f5e7b1")
    .with_progress(0.95)
}

/// Serve `router` on 127.0.0.1 and return its base URL
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
