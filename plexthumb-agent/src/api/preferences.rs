//! Liked / disliked collections
//!
//! Documents are read from disk on every request, on the blocking pool.

use axum::{extract::State, routing::get, Json, Router};
use plexthumb_common::preferences::{DislikedCollection, LikedCollection};
use plexthumb_common::PreferenceStore;
use std::sync::Arc;
use tracing::error;

use crate::AppState;

async fn read_store<T, F>(store: &Arc<PreferenceStore>, read: F) -> T
where
    T: Default + Send + 'static,
    F: FnOnce(&PreferenceStore) -> T + Send + 'static,
{
    let store = Arc::clone(store);
    match tokio::task::spawn_blocking(move || read(store.as_ref())).await {
        Ok(collection) => collection,
        Err(e) => {
            error!("Preference read task failed: {}", e);
            T::default()
        }
    }
}

/// GET /liked
pub async fn get_liked(State(state): State<AppState>) -> Json<LikedCollection> {
    Json(read_store(&state.store, PreferenceStore::liked).await)
}

/// GET /disliked
pub async fn get_disliked(State(state): State<AppState>) -> Json<DislikedCollection> {
    Json(read_store(&state.store, PreferenceStore::disliked).await)
}

pub fn preference_routes() -> Router<AppState> {
    Router::new()
        .route("/liked", get(get_liked))
        .route("/disliked", get(get_disliked))
}
