//! Remote dubbing API client module

pub mod client;
pub mod models;
pub mod upload;

pub use client::DubbingClient;

/// Production endpoint of the dubbing API
pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";

/// Header carrying the API key on every call
pub const API_KEY_HEADER: &str = "xi-api-key";
