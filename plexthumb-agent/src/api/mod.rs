//! Read-only status API
//!
//! - `GET /liked`, `GET /disliked`: stored preference documents
//! - `GET /now`: live sessions plus the saved now-playing document
//! - `GET /health`: liveness and a few counters

pub mod health;
pub mod now_playing;
pub mod preferences;

pub use health::health_routes;
pub use now_playing::now_playing_routes;
pub use preferences::preference_routes;
