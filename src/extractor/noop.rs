//! No-op provider for graceful degradation

use super::traits::MediaExtractor;
use crate::types::ResourceInfo;
use std::path::Path;

/// Provider used when no extraction backend is available
///
/// The service still starts and answers liveness checks; resource requests
/// fail with `Error::NotSupported` instead of crashing the process.
///
/// # Examples
///
/// ```
/// use dvorfs_dl::extractor::{MediaExtractor, NoOpExtractor};
///
/// let extractor = NoOpExtractor;
/// assert!(extractor.extract_catalog("https://www.youtube.com/watch?v=dQw4w9WgXcQ").is_err());
/// ```
pub struct NoOpExtractor;

impl MediaExtractor for NoOpExtractor {
    fn extract_catalog(&self, _url: &str) -> crate::Result<ResourceInfo> {
        Err(crate::Error::NotSupported(
            "resource extraction requires the yt-dlp binary. \
             Configure extractor.binary_path or ensure yt-dlp is in PATH."
                .into(),
        ))
    }

    fn transfer_format(
        &self,
        _url: &str,
        _format_id: &str,
        _destination: &Path,
    ) -> crate::Result<()> {
        Err(crate::Error::NotSupported(
            "media transfer requires the yt-dlp binary. \
             Configure extractor.binary_path or ensure yt-dlp is in PATH."
                .into(),
        ))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
