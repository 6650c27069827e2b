//! The extraction provider interface

use crate::types::ResourceInfo;
use std::path::Path;

/// Source of resource metadata and rendition bytes
///
/// Both operations block for as long as the provider needs and must be called
/// from a blocking context (see [`WorkerPool`](crate::worker_pool::WorkerPool)).
/// Callers assume nothing about how a provider transfers data (chunking,
/// parallel fragments, temporary side files); only the outcome counts.
pub trait MediaExtractor: Send + Sync {
    /// Fetch metadata and the rendition catalog for `url`
    ///
    /// No media bytes are transferred.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot run or rejects the resource.
    fn extract_catalog(&self, url: &str) -> crate::Result<ResourceInfo>;

    /// Transfer rendition `format_id` of `url` into `destination`
    ///
    /// On success the file at `destination` holds the rendition. On error the
    /// destination may hold partial data; cleaning it up is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns an error for any transfer failure (network, decode, origin
    /// rejection, timeout).
    fn transfer_format(&self, url: &str, format_id: &str, destination: &Path)
    -> crate::Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
