//! Now-playing view
//!
//! `live` is the tracker's view as of its last completed poll; `saved` is the
//! now_playing.json document from the storage directory (empty if absent).

use axum::{extract::State, routing::get, Json, Router};
use plexthumb_common::json_store::load_json_file;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::state::LiveSessions;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct NowPlayingResponse {
    pub live: LiveSessions,
    pub saved: Value,
}

/// GET /now
pub async fn get_now_playing(State(state): State<AppState>) -> Json<NowPlayingResponse> {
    let path = state.now_playing_path.clone();
    let saved = tokio::task::spawn_blocking(move || load_json_file::<Option<Value>>(&path))
        .await
        .unwrap_or_else(|e| {
            warn!("now_playing read task failed: {}", e);
            None
        })
        .unwrap_or_else(|| Value::Object(Map::new()));

    Json(NowPlayingResponse {
        live: state.shared.live_sessions().await.as_ref().clone(),
        saved,
    })
}

pub fn now_playing_routes() -> Router<AppState> {
    Router::new().route("/now", get(get_now_playing))
}
