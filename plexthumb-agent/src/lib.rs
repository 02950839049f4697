//! plexthumb-agent library interface
//!
//! Watches a Plex server for finished tracks, re-reads the final thumb
//! rating after a grace period, records likes/dislikes and asks Lidarr to
//! delete disliked tracks. Exposes a small read-only status API.

pub mod api;
pub mod decision;
pub mod error;
pub mod harvest;
pub mod library;
pub mod media_server;
pub mod models;
pub mod state;
pub mod tracker;

pub use crate::error::{AgentError, AgentResult};

use axum::Router;
use chrono::{DateTime, Utc};
use plexthumb_common::PreferenceStore;
use state::SharedState;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Live sessions and harvest bookkeeping
    pub shared: Arc<SharedState>,
    /// Liked / disliked documents
    pub store: Arc<PreferenceStore>,
    /// now_playing.json in the storage directory
    pub now_playing_path: PathBuf,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(shared: Arc<SharedState>, store: Arc<PreferenceStore>, now_playing_path: PathBuf) -> Self {
        Self {
            shared,
            store,
            now_playing_path,
            startup_time: Utc::now(),
        }
    }
}

/// Build the status API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::preference_routes())
        .merge(api::now_playing_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
