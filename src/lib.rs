//! # dvorfs-dl
//!
//! HTTP backend that inspects a remote media resource and delivers one of its
//! renditions as a streamed download.
//!
//! ## Pipeline
//!
//! A download request runs four stages, strictly in order:
//! 1. **Catalog** - the extraction provider lists the available renditions
//! 2. **Selection** - [`selector::select`] picks one for the requested kind and quality
//! 3. **Fetch** - [`fetcher::RetryingFetcher`] materializes it into a transient
//!    artifact with bounded retries and exponential backoff
//! 4. **Delivery** - [`delivery::StreamingDelivery`] streams the artifact in
//!    chunks and deletes it once the stream ends or is abandoned
//!
//! The provider is reached only through [`extractor::MediaExtractor`]; its
//! blocking calls run on a bounded [`worker_pool::WorkerPool`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use dvorfs_dl::{Config, MediaService, run_with_shutdown};
//! use dvorfs_dl::extractor::{NoOpExtractor, YtDlpExtractor};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let extractor: Arc<dyn dvorfs_dl::extractor::MediaExtractor> =
//!         match YtDlpExtractor::from_config(&config.extractor) {
//!             Some(ytdlp) => Arc::new(ytdlp),
//!             None => Arc::new(NoOpExtractor),
//!         };
//!
//!     let service = MediaService::new(config, extractor)?;
//!     run_with_shutdown(service).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Transient artifacts in the scratch directory
pub mod artifact;
/// Configuration types
pub mod config;
/// Streaming delivery of verified artifacts
pub mod delivery;
/// Error types
pub mod error;
/// Resource extraction providers
pub mod extractor;
/// Retrying fetcher
pub mod fetcher;
/// Backoff arithmetic
pub mod retry;
/// Format selection
pub mod selector;
/// The per-request media pipeline
pub mod service;
/// Core types
pub mod types;
/// Resource URL validation
pub mod validation;
/// Bounded pool for blocking provider calls
pub mod worker_pool;

// Re-export commonly used types
pub use config::Config;
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus, TransferFailure};
pub use extractor::{MediaExtractor, NoOpExtractor, YtDlpExtractor};
pub use service::MediaService;
pub use types::{
    FormatCatalog, FormatDescriptor, MediaKind, ResourceInfo, SelectionRequest,
};

use std::sync::Arc;

/// Prepare the scratch directory and serve the API until a termination signal.
///
/// Stale artifacts from an earlier process are swept first. On shutdown the
/// server stops accepting connections and in-flight responses finish.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(service: MediaService) -> Result<()> {
    let removed = service.init().await?;
    tracing::info!(
        scratch_dir = ?service.config.scratch_dir,
        stale_removed = removed,
        extractor = service.extractor_name(),
        "media service ready"
    );

    let config = service.config.clone();
    api::start_api_server(Arc::new(service), config, wait_for_signal()).await
}

/// Resolve once the process receives a termination signal
#[cfg(unix)]
pub async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

/// Resolve once the process receives Ctrl+C
#[cfg(not(unix))]
pub async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
