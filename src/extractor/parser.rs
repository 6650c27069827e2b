//! Parser for yt-dlp `--dump-json` output

use crate::error::{Error, Result};
use crate::types::{FormatCatalog, FormatDescriptor, MediaKind, ResourceInfo};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: String,
    #[serde(default)]
    ext: Option<String>,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    filesize: Option<u64>,
    // yt-dlp emits this as a float for some extractors
    #[serde(default)]
    filesize_approx: Option<f64>,
    #[serde(default)]
    resolution: Option<String>,
    #[serde(default)]
    format_note: Option<String>,
}

fn is_absent_codec(codec: Option<&str>) -> bool {
    match codec.map(str::trim) {
        None => true,
        Some(c) => c.is_empty() || c.eq_ignore_ascii_case("none"),
    }
}

impl RawFormat {
    fn into_descriptor(self) -> Option<FormatDescriptor> {
        let vcodec = self.vcodec.as_deref();
        let acodec = self.acodec.as_deref();
        // Storyboards and similar carry neither stream
        if is_absent_codec(vcodec) && is_absent_codec(acodec) {
            return None;
        }

        let media_kind = MediaKind::from_video_codec(vcodec);
        let quality_rank = match media_kind {
            MediaKind::Video => self.height.unwrap_or(0),
            MediaKind::Audio => 0,
        };
        let size_hint = self
            .filesize
            .or_else(|| {
                self.filesize_approx
                    .filter(|s| s.is_finite() && *s > 0.0)
                    .map(|s| s as u64)
            })
            .unwrap_or(0);
        let resolution = self.resolution.or_else(|| match (self.width, self.height) {
            (Some(w), Some(h)) => Some(format!("{w}x{h}")),
            _ => None,
        });

        Some(FormatDescriptor {
            format_id: self.format_id,
            extension: self.ext.unwrap_or_default().to_ascii_lowercase(),
            media_kind,
            quality_rank,
            size_hint,
            resolution,
            format_note: self.format_note,
            vcodec: self.vcodec,
            acodec: self.acodec,
        })
    }
}

/// Parse the JSON document yt-dlp prints for a single resource
///
/// Every rendition that carries audio or video becomes a [`FormatDescriptor`],
/// in provider order. No extension filtering happens here.
///
/// # Errors
///
/// Returns [`Error::Extractor`] when the document is not valid provider JSON.
pub fn parse_resource_info(stdout: &[u8]) -> Result<ResourceInfo> {
    let raw: RawInfo = serde_json::from_slice(stdout)
        .map_err(|e| Error::Extractor(format!("invalid provider JSON: {e}")))?;

    let formats: FormatCatalog = raw
        .formats
        .into_iter()
        .filter_map(RawFormat::into_descriptor)
        .collect();

    Ok(ResourceInfo {
        title: raw.title.unwrap_or_else(|| "untitled".to_string()),
        duration: raw
            .duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| d.round() as u64)
            .unwrap_or(0),
        thumbnail: raw.thumbnail,
        uploader: raw.uploader,
        view_count: raw.view_count,
        formats,
    })
}
