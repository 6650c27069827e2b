//! Retrying fetcher
//!
//! Materializes one rendition into a [`TransientArtifact`] through the
//! provider, with bounded attempts and exponential backoff. Each attempt runs
//! on the blocking [`WorkerPool`] and is followed by an integrity check; a
//! failed attempt leaves nothing behind before the next one starts.

use crate::artifact::{TransientArtifact, remove_with_side_files};
use crate::config::RetryConfig;
use crate::error::{Error, Result, TransferFailure};
use crate::extractor::MediaExtractor;
use crate::retry::effective_delay;
use crate::types::{AttemptOutcome, FetchAttempt, FetchReport};
use crate::worker_pool::WorkerPool;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const INTEGRITY_REASON: &str = "empty or missing output";

/// Runs provider transfers with retries
#[derive(Clone)]
pub struct RetryingFetcher {
    extractor: Arc<dyn MediaExtractor>,
    pool: WorkerPool,
    retry: RetryConfig,
}

impl RetryingFetcher {
    /// Create a fetcher sharing `pool` with the rest of the service
    pub fn new(extractor: Arc<dyn MediaExtractor>, pool: WorkerPool, retry: RetryConfig) -> Self {
        Self {
            extractor,
            pool,
            retry,
        }
    }

    /// Retry settings in effect
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Transfer `format_id` of `url` into `artifact`
    ///
    /// On success the artifact exists, is non-empty and the report lists every
    /// attempt made. On failure the artifact path is empty again and the error
    /// is [`Error::Fetch`] with the attempt count and the last failure reason.
    ///
    /// Dropping the returned future abandons the fetch. A transfer already
    /// running on the pool finishes in the background and removes its output.
    pub async fn fetch(
        &self,
        url: &str,
        format_id: &str,
        artifact: &TransientArtifact,
    ) -> Result<FetchReport> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempts = Vec::with_capacity(max_attempts as usize);
        let mut delay = Duration::ZERO;
        let mut last_reason = String::new();

        for index in 0..max_attempts {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.attempt(url, format_id, artifact).await {
                Ok(bytes) => {
                    attempts.push(FetchAttempt {
                        index,
                        delay,
                        outcome: AttemptOutcome::Success,
                    });
                    if index > 0 {
                        info!(
                            attempts = index + 1,
                            format_id, bytes, "fetch succeeded after retry"
                        );
                    }
                    return Ok(FetchReport { attempts, bytes });
                }
                Err(failure) => {
                    if let Err(e) = artifact.clear().await {
                        warn!(path = ?artifact.path(), error = %e, "could not clear partial artifact");
                    }

                    last_reason = failure.to_string();
                    let exhausted = index + 1 == max_attempts;
                    let outcome = if exhausted {
                        AttemptOutcome::Exhausted {
                            reason: last_reason.clone(),
                        }
                    } else {
                        AttemptOutcome::TransientFailure {
                            reason: last_reason.clone(),
                        }
                    };
                    attempts.push(FetchAttempt {
                        index,
                        delay,
                        outcome,
                    });

                    if !exhausted {
                        delay = effective_delay(&self.retry, index + 1);
                        warn!(
                            error = %failure,
                            attempt = index + 1,
                            max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            "fetch attempt failed, retrying"
                        );
                    }
                }
            }
        }

        error!(
            error = %last_reason,
            attempts = max_attempts,
            format_id,
            "fetch failed after all attempts exhausted"
        );
        Err(Error::Fetch {
            attempts: max_attempts,
            last_reason,
        })
    }

    async fn attempt(
        &self,
        url: &str,
        format_id: &str,
        artifact: &TransientArtifact,
    ) -> std::result::Result<u64, TransferFailure> {
        let extractor = Arc::clone(&self.extractor);
        let url = url.to_string();
        let format_id = format_id.to_string();
        let destination = artifact.path().to_path_buf();
        let abandoned = artifact.abandoned_flag();

        let outcome = self
            .pool
            .run(move || {
                let result = extractor.transfer_format(&url, &format_id, &destination);
                if abandoned.load(Ordering::SeqCst) {
                    match remove_with_side_files(&destination) {
                        Ok(removed) => debug!(
                            path = ?destination,
                            removed,
                            "removed output of abandoned transfer"
                        ),
                        Err(e) => warn!(
                            path = ?destination,
                            error = %e,
                            "could not remove output of abandoned transfer"
                        ),
                    }
                }
                result
            })
            .await;

        match outcome {
            Err(e) => return Err(TransferFailure::WorkerPanicked(e.to_string())),
            Ok(Err(e)) => return Err(e.into()),
            Ok(Ok(())) => {}
        }

        verify_artifact(artifact.path()).await
    }
}

/// The artifact must exist as a regular file with at least one byte
async fn verify_artifact(path: &Path) -> std::result::Result<u64, TransferFailure> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(meta.len()),
        _ => Err(TransferFailure::Integrity(INTEGRITY_REASON.to_string())),
    }
}
