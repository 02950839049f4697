//! Lidarr API client
//!
//! - `GET  /api/v1/track/lookup?term=...` returns a JSON array of tracks
//! - `DELETE /api/v1/track/{id}?deleteFiles=true` removes the track and its file
//!
//! Requests authenticate with the `X-Api-Key` header.

use super::{LibraryError, LibraryService, LibraryTrack};
use async_trait::async_trait;
use plexthumb_common::config::LibraryConfig;
use reqwest::StatusCode;
use std::time::Duration;

const API_KEY_HEADER: &str = "X-Api-Key";

/// Statuses Lidarr uses to acknowledge a delete
const DELETE_OK: [StatusCode; 3] = [StatusCode::OK, StatusCode::ACCEPTED, StatusCode::NO_CONTENT];

pub struct LidarrClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl LidarrClient {
    pub fn new(config: &LibraryConfig, timeout: Duration) -> Result<Self, LibraryError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LibraryError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl LibraryService for LidarrClient {
    async fn search_tracks(&self, term: &str) -> Result<Vec<LibraryTrack>, LibraryError> {
        let url = format!("{}/api/v1/track/lookup", self.base_url);
        tracing::debug!(term = %term, "Querying Lidarr track lookup");

        let response = self
            .http_client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("term", term)])
            .send()
            .await
            .map_err(|e| LibraryError::Network(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LibraryError::Api(status.as_u16(), error_text));
        }

        // Anything other than an array is treated as "no results"
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LibraryError::Parse(e.to_string()))?;

        let serde_json::Value::Array(items) = body else {
            return Ok(Vec::new());
        };

        // One malformed candidate must not hide the others
        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<LibraryTrack>(item) {
                Ok(track) => Some(track),
                Err(e) => {
                    tracing::debug!(term = %term, "Skipping unreadable candidate: {}", e);
                    None
                }
            })
            .collect())
    }

    async fn delete_track(&self, track_id: i64) -> Result<(), LibraryError> {
        let url = format!("{}/api/v1/track/{}", self.base_url, track_id);

        let response = self
            .http_client
            .delete(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("deleteFiles", "true")])
            .send()
            .await
            .map_err(|e| LibraryError::Network(e.to_string()))?;

        let status = response.status();
        if !DELETE_OK.contains(&status) {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LibraryError::Api(status.as_u16(), error_text));
        }

        Ok(())
    }
}
