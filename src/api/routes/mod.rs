//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`media`] - Resource info and downloads
//! - [`system`] - Root, health, OpenAPI

use crate::types::MediaKind;
use serde::{Deserialize, Deserializer, Serialize};

mod media;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use media::*;
pub use system::*;

// ============================================================================
// Request Types (shared across handlers)
// ============================================================================

/// Request body for POST /resource/info
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct InfoRequest {
    /// Watch URL of the resource
    pub url: String,
}

/// Request body for POST /download
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadRequest {
    /// Watch URL of the resource
    pub url: String,

    /// Desired vertical resolution, e.g. "720". Non-numeric values mean best
    /// available. Numbers are accepted too. (default: "720")
    #[serde(default = "default_quality", deserialize_with = "quality_as_string")]
    pub quality: String,

    /// "video" or "audio" (default: "video")
    #[serde(default)]
    pub format_type: MediaKind,
}

fn default_quality() -> String {
    "720".to_string()
}

fn quality_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Quality {
        Text(String),
        Number(u64),
    }

    // An explicit null means best available
    Ok(match Option::<Quality>::deserialize(deserializer)? {
        Some(Quality::Text(text)) => text,
        Some(Quality::Number(number)) => number.to_string(),
        None => String::new(),
    })
}
