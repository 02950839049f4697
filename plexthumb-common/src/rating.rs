//! Rating normalization
//!
//! The media server reports `userRating` on a 0-10 scale. Thumbs-up clients
//! write 10, star clients write 5 for a top rating; thumbs-down writes 2 or 1.
//! Everything else (half stars, unrated) is left alone.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance around each recognised rating value
const RATING_TOLERANCE: f64 = 0.1;

const LIKE_VALUES: [f64; 2] = [10.0, 5.0];
const DISLIKE_VALUES: [f64; 2] = [2.0, 1.0];

/// Normalized classification of a user rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingBucket {
    Like,
    Dislike,
    Unrated,
}

impl RatingBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingBucket::Like => "like",
            RatingBucket::Dislike => "dislike",
            RatingBucket::Unrated => "unrated",
        }
    }
}

impl fmt::Display for RatingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw rating attribute.
///
/// Absent or unparsable input is `Unrated`; this never fails.
pub fn normalize(raw: Option<&str>) -> RatingBucket {
    match raw.and_then(|s| s.trim().parse::<f64>().ok()) {
        Some(value) => normalize_value(value),
        None => RatingBucket::Unrated,
    }
}

/// Classify an already-parsed rating value
pub fn normalize_value(value: f64) -> RatingBucket {
    let near = |target: &f64| (value - target).abs() < RATING_TOLERANCE;

    if LIKE_VALUES.iter().any(near) {
        RatingBucket::Like
    } else if DISLIKE_VALUES.iter().any(near) {
        RatingBucket::Dislike
    } else {
        RatingBucket::Unrated
    }
}
