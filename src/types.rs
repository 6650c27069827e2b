//! Core types for dvorfs-dl

use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

/// Kind of media a rendition carries
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Carries a video stream (possibly muxed with audio)
    #[default]
    Video,
    /// Audio only, no video codec present
    Audio,
}

impl MediaKind {
    /// Derive the kind from the video codec reported by the provider.
    ///
    /// A missing, empty or `"none"` video codec means the rendition is audio-only.
    pub fn from_video_codec(vcodec: Option<&str>) -> Self {
        match vcodec.map(str::trim) {
            Some(codec) if !codec.is_empty() && !codec.eq_ignore_ascii_case("none") => {
                MediaKind::Video
            }
            _ => MediaKind::Audio,
        }
    }

    /// Lowercase name used on the wire and as the MIME top-level type
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    /// `Content-Type` for a rendition of this kind with the given container extension
    pub fn content_type(&self, extension: &str) -> String {
        format!("{}/{}", self.as_str(), extension)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(MediaKind::Video),
            "audio" => Ok(MediaKind::Audio),
            other => Err(format!(
                "unknown format type '{other}', expected 'video' or 'audio'"
            )),
        }
    }
}

/// One available rendition of a resource
///
/// `media_kind` is computed once when the provider output is normalized and is
/// never recomputed afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FormatDescriptor {
    /// Opaque provider identifier used to request exactly this rendition
    pub format_id: String,

    /// Container extension (e.g. "mp4", "webm", "m4a")
    #[serde(rename = "ext")]
    pub extension: String,

    /// Video or audio
    #[serde(rename = "format_type")]
    pub media_kind: MediaKind,

    /// Vertical resolution in pixels, 0 when unknown (always 0 for audio)
    #[serde(rename = "quality")]
    pub quality_rank: u32,

    /// Estimated size in bytes, 0 when unknown
    #[serde(rename = "filesize")]
    pub size_hint: u64,

    /// Display resolution such as "1920x1080"
    #[serde(default)]
    pub resolution: Option<String>,

    /// Provider note such as "720p" or "medium"
    #[serde(default)]
    pub format_note: Option<String>,

    /// Video codec as reported by the provider
    #[serde(default)]
    pub vcodec: Option<String>,

    /// Audio codec as reported by the provider
    #[serde(default)]
    pub acodec: Option<String>,
}

impl FormatDescriptor {
    /// Build a descriptor with only the fields the selector looks at
    pub fn new(
        format_id: impl Into<String>,
        extension: impl Into<String>,
        media_kind: MediaKind,
        quality_rank: u32,
        size_hint: u64,
    ) -> Self {
        Self {
            format_id: format_id.into(),
            extension: extension.into(),
            media_kind,
            quality_rank,
            size_hint,
            resolution: None,
            format_note: None,
            vcodec: None,
            acodec: None,
        }
    }
}

/// Ordered, immutable list of the renditions available for one resource
///
/// Order is the provider's order and is significant: it breaks ties during
/// selection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatCatalog {
    formats: Vec<FormatDescriptor>,
}

impl FormatCatalog {
    /// Wrap descriptors in provider order
    pub fn new(formats: Vec<FormatDescriptor>) -> Self {
        Self { formats }
    }

    /// Iterate in catalog order
    pub fn iter(&self) -> std::slice::Iter<'_, FormatDescriptor> {
        self.formats.iter()
    }

    /// Descriptors in catalog order
    pub fn as_slice(&self) -> &[FormatDescriptor] {
        &self.formats
    }

    /// Number of descriptors
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    /// Whether the catalog has no descriptors at all
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Keep only descriptors whose extension is in `allowed` (case-insensitive)
    pub fn retain_extensions(self, allowed: &[String]) -> Self {
        let formats = self
            .formats
            .into_iter()
            .filter(|f| allowed.iter().any(|a| a.eq_ignore_ascii_case(&f.extension)))
            .collect();
        Self { formats }
    }
}

impl FromIterator<FormatDescriptor> for FormatCatalog {
    fn from_iter<I: IntoIterator<Item = FormatDescriptor>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FormatCatalog {
    type Item = &'a FormatDescriptor;
    type IntoIter = std::slice::Iter<'a, FormatDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.formats.iter()
    }
}

/// Metadata about a resource together with its catalog
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ResourceInfo {
    /// Resource title
    pub title: String,

    /// Duration in seconds (0 when unknown)
    #[serde(default)]
    pub duration: u64,

    /// Thumbnail URL
    #[serde(default)]
    pub thumbnail: Option<String>,

    /// Uploader / channel name
    #[serde(default)]
    pub uploader: Option<String>,

    /// View count
    #[serde(default)]
    pub view_count: Option<u64>,

    /// Available renditions
    #[schema(value_type = Vec<FormatDescriptor>)]
    pub formats: FormatCatalog,
}

/// What the caller asked for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionRequest {
    /// Requested media kind
    pub media_kind: MediaKind,
    /// Requested vertical resolution; `None` means best available
    pub desired_quality: Option<u32>,
}

impl SelectionRequest {
    /// Build a request from the raw `quality` string sent by clients.
    ///
    /// Numeric strings become a desired quality, anything else means "best".
    pub fn from_wire(media_kind: MediaKind, quality: &str) -> Self {
        Self {
            media_kind,
            desired_quality: quality.trim().parse::<u32>().ok(),
        }
    }
}

/// Outcome of a single fetch attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Transfer finished and the artifact passed verification
    Success,
    /// Attempt failed and another attempt follows
    TransientFailure {
        /// Why the attempt failed
        reason: String,
    },
    /// Attempt failed and it was the last one allowed
    Exhausted {
        /// Why the attempt failed
        reason: String,
    },
}

/// Record of one fetch attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchAttempt {
    /// 0-based attempt index
    pub index: u32,
    /// Delay slept before this attempt
    pub delay: Duration,
    /// What happened
    pub outcome: AttemptOutcome,
}

/// Summary of a successful fetch
#[derive(Clone, Debug)]
pub struct FetchReport {
    /// Every attempt made, in order; the last one is the success
    pub attempts: Vec<FetchAttempt>,
    /// Size of the verified artifact in bytes
    pub bytes: u64,
}
