//! Candidate matching for library lookups
//!
//! A candidate earns 2 points for each known field (artist, title, album)
//! contained case-insensitively in its own field, plus 1 point when it
//! already has a file on disk. Empty known values never score.

use super::LibraryTrack;
use crate::models::TrackRef;

/// Minimum score for a candidate to be trusted for deletion
pub const MIN_CONFIDENT_SCORE: u32 = 2;

const FIELD_POINTS: u32 = 2;
const HAS_FILE_POINTS: u32 = 1;

/// Lowercased known values a candidate is compared against
#[derive(Debug, Clone)]
pub struct MatchQuery {
    artist: String,
    title: String,
    album: String,
}

impl MatchQuery {
    pub fn new(artist: &str, title: &str, album: &str) -> Self {
        Self {
            artist: artist.to_lowercase(),
            title: title.to_lowercase(),
            album: album.to_lowercase(),
        }
    }

    pub fn score(&self, candidate: &LibraryTrack) -> u32 {
        let mut score = 0;
        if contains(candidate.artist_name.as_deref(), &self.artist) {
            score += FIELD_POINTS;
        }
        if contains(candidate.title.as_deref(), &self.title) {
            score += FIELD_POINTS;
        }
        if contains(candidate.album_title(), &self.album) {
            score += FIELD_POINTS;
        }
        if candidate.has_file {
            score += HAS_FILE_POINTS;
        }
        score
    }

    /// Highest-scoring candidate; the first one wins ties
    pub fn best<'a>(&self, candidates: &'a [LibraryTrack]) -> Option<(&'a LibraryTrack, u32)> {
        let mut best: Option<(&LibraryTrack, u32)> = None;
        for candidate in candidates {
            let score = self.score(candidate);
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((candidate, score)),
            }
        }
        best
    }
}

impl From<&TrackRef> for MatchQuery {
    fn from(track: &TrackRef) -> Self {
        MatchQuery::new(&track.artist, &track.title, &track.album)
    }
}

fn contains(haystack: Option<&str>, needle_lower: &str) -> bool {
    !needle_lower.is_empty()
        && haystack
            .map(|h| h.to_lowercase().contains(needle_lower))
            .unwrap_or(false)
}

/// Ordered, de-duplicated search terms for a track:
/// "artist title", "artist album", "title", "album artist", then the last
/// path segment of the source guid.
pub fn search_terms(track: &TrackRef) -> Vec<String> {
    let artist = track.artist.trim();
    let title = track.title.trim();
    let album = track.album.trim();

    let mut terms = Vec::new();
    if !artist.is_empty() && !title.is_empty() {
        terms.push(format!("{} {}", artist, title));
    }
    if !artist.is_empty() && !album.is_empty() {
        terms.push(format!("{} {}", artist, album));
    }
    if !title.is_empty() {
        terms.push(title.to_string());
    }
    if !album.is_empty() && !artist.is_empty() {
        terms.push(format!("{} {}", album, artist));
    }

    if let Some(tail) = track
        .guid
        .as_deref()
        .and_then(|guid| guid.rsplit('/').next())
        .map(str::trim)
    {
        if !tail.is_empty() && !terms.iter().any(|t| t == tail) {
            terms.push(tail.to_string());
        }
    }

    terms
}
