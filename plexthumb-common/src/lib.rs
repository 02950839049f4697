//! # plexthumb common library
//!
//! Shared code for the plexthumb agent:
//! - Error type
//! - Configuration model and source resolution
//! - Rating normalization (like / dislike / unrated)
//! - JSON document persistence and the preference store

pub mod config;
pub mod error;
pub mod json_store;
pub mod preferences;
pub mod rating;

pub use error::{Error, Result};
pub use preferences::PreferenceStore;
pub use rating::RatingBucket;
