//! The per-request media pipeline
//!
//! [`MediaService`] wires the stages together: validate the URL, obtain the
//! catalog from the provider, select a rendition, fetch it into a transient
//! artifact and hand the artifact to streaming delivery. Each stage runs only
//! after the previous one succeeded. Requests share no mutable state.

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use crate::artifact::{TransientArtifact, prepare_scratch_dir, sweep_stale_artifacts};
use crate::config::Config;
use crate::delivery::{StreamingDelivery, download_name};
use crate::error::{Error, Result};
use crate::extractor::MediaExtractor;
use crate::fetcher::RetryingFetcher;
use crate::selector::select;
use crate::types::{ResourceInfo, SelectionRequest};
use crate::validation::validate_resource_url;
use crate::worker_pool::WorkerPool;
use axum::response::Response;
use std::sync::Arc;
use tracing::info;

/// Entry point for resource info and download requests
#[derive(Clone)]
pub struct MediaService {
    /// Configuration (wrapped in Arc for cheap cloning)
    pub config: Arc<Config>,
    extractor: Arc<dyn MediaExtractor>,
    pool: WorkerPool,
    fetcher: RetryingFetcher,
    delivery: StreamingDelivery,
}

impl MediaService {
    /// Build a service around `extractor`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration does not validate.
    pub fn new(config: Config, extractor: Arc<dyn MediaExtractor>) -> Result<Self> {
        config.validate()?;

        let pool = WorkerPool::new(config.workers.max_blocking_jobs);
        let fetcher =
            RetryingFetcher::new(Arc::clone(&extractor), pool.clone(), config.retry.clone());
        let delivery = StreamingDelivery::new(&config.delivery);

        Ok(Self {
            config: Arc::new(config),
            extractor,
            pool,
            fetcher,
            delivery,
        })
    }

    /// Name of the active provider
    pub fn extractor_name(&self) -> &'static str {
        self.extractor.name()
    }

    /// Create the scratch directory and remove artifacts of earlier runs
    ///
    /// Returns the number of stale artifacts removed.
    pub async fn init(&self) -> Result<usize> {
        prepare_scratch_dir(&self.config.scratch_dir).await?;
        sweep_stale_artifacts(&self.config.scratch_dir).await
    }

    /// Metadata and allow-listed catalog for `url`
    pub async fn resource_info(&self, url: &str) -> Result<ResourceInfo> {
        let url = validate_resource_url(url)?;
        self.catalog(url.as_str()).await
    }

    /// Select, fetch and stream one rendition of `url`
    ///
    /// Fails before any bytes are sent when validation, extraction, selection
    /// or every fetch attempt fails. Once the response is returned the
    /// artifact belongs to its body and is deleted when the body finishes or
    /// is dropped.
    pub async fn download(&self, url: &str, request: SelectionRequest) -> Result<Response> {
        let url = validate_resource_url(url)?;
        info!(
            url = %url,
            format_type = %request.media_kind,
            quality = ?request.desired_quality,
            "download requested"
        );

        let info = self.catalog(url.as_str()).await?;
        let chosen = select(&info.formats, request)?;
        info!(
            format_id = %chosen.format_id,
            quality = chosen.quality_rank,
            ext = %chosen.extension,
            "selected format"
        );

        prepare_scratch_dir(&self.config.scratch_dir).await?;
        let artifact = TransientArtifact::reserve(&self.config.scratch_dir, &chosen.extension);
        let report = self
            .fetcher
            .fetch(url.as_str(), &chosen.format_id, &artifact)
            .await?;
        info!(
            format_id = %chosen.format_id,
            attempts = report.attempts.len(),
            bytes = report.bytes,
            "fetch complete, streaming"
        );

        let name = download_name(&info.title, &chosen.extension);
        let content_type = chosen.media_kind.content_type(&chosen.extension);
        self.delivery.deliver(artifact, &name, &content_type).await
    }

    async fn catalog(&self, url: &str) -> Result<ResourceInfo> {
        let extractor = Arc::clone(&self.extractor);
        let owned_url = url.to_string();

        let mut info = self
            .pool
            .run(move || extractor.extract_catalog(&owned_url))
            .await
            .map_err(|e| Error::ExternalTool(e.to_string()))??;

        info.formats = info
            .formats
            .retain_extensions(&self.config.extractor.allowed_extensions);
        Ok(info)
    }
}
