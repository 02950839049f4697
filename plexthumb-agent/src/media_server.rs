//! Media server (Plex) client
//!
//! Two read-only calls, both answered with an XML `MediaContainer`:
//! - `GET /status/sessions`: one `<Track>` per active audio session, each
//!   with a `<Player>` child naming the playback client
//! - `GET /library/metadata/{ratingKey}`: the authoritative `<Track>` for a key
//!
//! Requests authenticate with the `X-Plex-Token` header.

use crate::models::{progress_fraction, session_id_for, TrackMetadata, TrackSnapshot};
use async_trait::async_trait;
use plexthumb_common::config::MediaServerConfig;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

const TOKEN_HEADER: &str = "X-Plex-Token";

/// Media server client errors
#[derive(Debug, Error)]
pub enum MediaServerError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No <Track> node in metadata response")]
    MissingTrack,
}

/// Read access to the media server
#[async_trait]
pub trait MediaServer: Send + Sync {
    /// Tracks currently being played
    async fn active_sessions(&self) -> Result<Vec<TrackSnapshot>, MediaServerError>;

    /// Re-read a track by its stable metadata key
    async fn track_metadata(&self, rating_key: &str) -> Result<TrackMetadata, MediaServerError>;
}

/// HTTP client for a Plex Media Server
pub struct PlexClient {
    http_client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    client_filter: Option<String>,
}

impl PlexClient {
    pub fn new(config: &MediaServerConfig, timeout: Duration) -> Result<Self, MediaServerError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MediaServerError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            client_filter: config.client_filter.clone(),
        })
    }

    async fn get_xml(&self, path: &str) -> Result<String, MediaServerError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::trace!(url = %url, "Querying media server");

        let mut request = self.http_client.get(&url);
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MediaServerError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaServerError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| MediaServerError::Network(e.to_string()))
    }
}

#[async_trait]
impl MediaServer for PlexClient {
    async fn active_sessions(&self) -> Result<Vec<TrackSnapshot>, MediaServerError> {
        let xml = self.get_xml("/status/sessions").await?;
        sessions_from_xml(&xml, self.client_filter.as_deref())
    }

    async fn track_metadata(&self, rating_key: &str) -> Result<TrackMetadata, MediaServerError> {
        let xml = self.get_xml(&format!("/library/metadata/{}", rating_key)).await?;
        metadata_from_xml(&xml)
    }
}

/// A `<Track>` element with the player it is attached to
#[derive(Debug, Clone, Default)]
struct TrackElement {
    attributes: HashMap<String, String>,
    player_title: Option<String>,
    player_product: Option<String>,
}

impl TrackElement {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn played_on(&self, client: &str) -> bool {
        [&self.player_title, &self.player_product]
            .into_iter()
            .flatten()
            .any(|name| name.eq_ignore_ascii_case(client))
    }

    fn to_snapshot(&self) -> TrackSnapshot {
        let artist = self.attr("grandparentTitle").unwrap_or_default().to_string();
        let track = self.attr("title").unwrap_or_default().to_string();
        let rating_key = self
            .attr("ratingKey")
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        TrackSnapshot {
            session_id: session_id_for(rating_key.as_deref(), &artist, &track),
            album: self.attr("parentTitle").unwrap_or_default().to_string(),
            guid: self.attr("guid").filter(|g| !g.is_empty()).map(str::to_string),
            progress_fraction: progress_fraction(self.attr("viewOffset"), self.attr("duration")),
            user_rating_raw: self.attr("userRating").map(str::to_string),
            rating_key,
            artist,
            track,
        }
    }
}

fn attributes_of(element: &BytesStart<'_>) -> HashMap<String, String> {
    element
        .attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            (key, value)
        })
        .collect()
}

/// Collect every `<Track>` in document order
fn parse_track_elements(xml: &str) -> Result<Vec<TrackElement>, MediaServerError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut tracks = Vec::new();
    let mut current: Option<TrackElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"Track" => {
                current = Some(TrackElement {
                    attributes: attributes_of(&e),
                    ..Default::default()
                });
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"Track" => {
                tracks.push(TrackElement {
                    attributes: attributes_of(&e),
                    ..Default::default()
                });
            }
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"Player" => {
                if let Some(track) = current.as_mut() {
                    let attrs = attributes_of(&e);
                    track.player_title = attrs.get("title").cloned();
                    track.player_product = attrs.get("product").cloned();
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"Track" => {
                if let Some(track) = current.take() {
                    tracks.push(track);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(MediaServerError::Parse(format!(
                    "at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(tracks)
}

/// Active sessions from a `/status/sessions` document
pub fn sessions_from_xml(
    xml: &str,
    client_filter: Option<&str>,
) -> Result<Vec<TrackSnapshot>, MediaServerError> {
    let tracks = parse_track_elements(xml)?;
    Ok(tracks
        .iter()
        .filter(|t| match client_filter {
            Some(client) if !client.is_empty() => t.played_on(client),
            _ => true,
        })
        .map(TrackElement::to_snapshot)
        .collect())
}

/// First `<Track>` of a `/library/metadata/{key}` document
pub fn metadata_from_xml(xml: &str) -> Result<TrackMetadata, MediaServerError> {
    let tracks = parse_track_elements(xml)?;
    let track = tracks.first().ok_or(MediaServerError::MissingTrack)?;

    Ok(TrackMetadata {
        artist: track.attr("grandparentTitle").map(str::to_string),
        title: track.attr("title").map(str::to_string),
        user_rating: track.attr("userRating").map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSIONS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MediaContainer size="2">
  <Track ratingKey="123" key="/library/metadata/123" guid="plex://track/5d07cdc5403c640290f5e7b1"
         title="Roygbiv" grandparentTitle="Boards of Canada" parentTitle="Music Has the Right to Children"
         viewOffset="95000" duration="100000" userRating="10">
    <Media id="1" duration="100000"><Part id="1" file="/music/roygbiv.flac"/></Media>
    <User id="1" title="me"/>
    <Player title="Plexamp" product="Plexamp" state="playing"/>
  </Track>
  <Track title="Windowlicker" grandparentTitle="Aphex Twin" parentTitle="Windowlicker"
         viewOffset="1000" duration="0">
    <Player title="Living Room TV" product="Plex for Android (TV)" state="playing"/>
  </Track>
</MediaContainer>"#;

    #[test]
    fn test_sessions_parse_all_tracks() {
        let sessions = sessions_from_xml(SESSIONS, None).unwrap();
        assert_eq!(sessions.len(), 2);

        let first = &sessions[0];
        assert_eq!(first.session_id, "123");
        assert_eq!(first.artist, "Boards of Canada");
        assert_eq!(first.album, "Music Has the Right to Children");
        assert_eq!(first.track, "Roygbiv");
        assert_eq!(first.guid.as_deref(), Some("plex://track/5d07cdc5403c640290f5e7b1"));
        assert_eq!(first.rating_key.as_deref(), Some("123"));
        assert_eq!(first.progress_fraction, 0.95);
        assert_eq!(first.user_rating_raw.as_deref(), Some("10"));

        // No ratingKey: falls back to artist-title, zero duration clamps to 0
        let second = &sessions[1];
        assert_eq!(second.session_id, "Aphex Twin-Windowlicker");
        assert!(second.rating_key.is_none());
        assert_eq!(second.progress_fraction, 0.0);
        assert!(second.user_rating_raw.is_none());
    }

    #[test]
    fn test_client_filter_matches_player_title_or_product() {
        let plexamp = sessions_from_xml(SESSIONS, Some("plexamp")).unwrap();
        assert_eq!(plexamp.len(), 1);
        assert_eq!(plexamp[0].session_id, "123");

        let tv = sessions_from_xml(SESSIONS, Some("Plex for Android (TV)")).unwrap();
        assert_eq!(tv.len(), 1);
        assert_eq!(tv[0].track, "Windowlicker");

        assert!(sessions_from_xml(SESSIONS, Some("Kitchen")).unwrap().is_empty());
        assert_eq!(sessions_from_xml(SESSIONS, Some("")).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_container_has_no_sessions() {
        let xml = r#"<MediaContainer size="0"></MediaContainer>"#;
        assert!(sessions_from_xml(xml, None).unwrap().is_empty());
    }

    #[test]
    fn test_escaped_attributes_are_unescaped() {
        let xml = r#"<MediaContainer><Track ratingKey="7" title="Rock &amp; Roll" grandparentTitle="Velvet Underground"/></MediaContainer>"#;
        let sessions = sessions_from_xml(xml, None).unwrap();
        assert_eq!(sessions[0].track, "Rock & Roll");
    }

    #[test]
    fn test_malformed_document_is_parse_error() {
        let xml = "<MediaContainer><Track ratingKey=\"1\"></MediaContainer>";
        assert!(matches!(
            sessions_from_xml(xml, None),
            Err(MediaServerError::Parse(_))
        ));
    }

    #[test]
    fn test_metadata_reads_user_rating() {
        let xml = r#"<MediaContainer size="1">
  <Track ratingKey="123" title="Roygbiv" grandparentTitle="Boards of Canada" userRating="2.0">
    <Media id="1"/>
  </Track>
</MediaContainer>"#;
        let meta = metadata_from_xml(xml).unwrap();
        assert_eq!(meta.user_rating.as_deref(), Some("2.0"));
        assert_eq!(meta.title.as_deref(), Some("Roygbiv"));
        assert_eq!(meta.artist.as_deref(), Some("Boards of Canada"));
    }

    #[test]
    fn test_metadata_without_track_node() {
        let xml = r#"<MediaContainer size="1"><Video ratingKey="5"/></MediaContainer>"#;
        assert!(matches!(metadata_from_xml(xml), Err(MediaServerError::MissingTrack)));
    }
}
