//! Streaming delivery of verified artifacts
//!
//! The response body owns the [`TransientArtifact`]. The artifact is deleted
//! exactly once: when the body reaches end of file, when reading fails, or
//! when the body is dropped early because the client went away. Deletion
//! runs on the blocking pool.

use crate::artifact::TransientArtifact;
use crate::config::DeliveryConfig;
use crate::error::{Error, Result};
use axum::body::{Body, Bytes};
use axum::http::{StatusCode, header};
use axum::response::Response;
use futures::Stream;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

/// Name used when a title sanitizes to nothing
pub const FALLBACK_NAME: &str = "download";

/// Strip characters that are unsafe in a download file name
///
/// Path separators, quotes, characters reserved on common filesystems and
/// control characters are removed. Leading and trailing dots and whitespace
/// are trimmed so the result can never name a parent directory.
pub fn sanitize_filename(title: &str) -> String {
    let stripped: String = title
        .chars()
        .filter(|c| {
            !matches!(
                c,
                '/' | '\\' | '"' | '\'' | ':' | '*' | '?' | '<' | '>' | '|'
            ) && !c.is_control()
        })
        .collect();

    let trimmed = stripped.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// `{sanitized title}.{extension}`
pub fn download_name(title: &str, extension: &str) -> String {
    format!("{}.{}", sanitize_filename(title), extension)
}

/// Build an attachment `Content-Disposition` value
///
/// `filename` carries an ASCII rendition for old clients and `filename*`
/// the exact UTF-8 name (RFC 6266).
pub fn content_disposition(download_name: &str) -> String {
    let ascii: String = download_name
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(download_name)
    )
}

/// Chunked reader over an artifact that deletes it when finished
///
/// At end of file the stream releases the artifact and yields `None` only
/// after the deletion task has finished.
pub struct ArtifactStream {
    reader: Option<ReaderStream<File>>,
    artifact: Option<TransientArtifact>,
    cleanup: Option<JoinHandle<()>>,
    sent: u64,
}

impl ArtifactStream {
    /// Stream `file` (opened from `artifact`) in chunks of at most `chunk_size` bytes
    pub fn new(file: File, artifact: TransientArtifact, chunk_size: usize) -> Self {
        Self {
            reader: Some(ReaderStream::with_capacity(file, chunk_size.max(1))),
            artifact: Some(artifact),
            cleanup: None,
            sent: 0,
        }
    }

    /// Bytes handed to the consumer so far
    pub fn bytes_sent(&self) -> u64 {
        self.sent
    }

    // File handle closes before the artifact is deleted
    fn finish(&mut self) {
        self.reader = None;
        if let Some(artifact) = self.artifact.take() {
            debug!(path = ?artifact.path(), bytes = self.sent, "download stream completed");
            self.cleanup = artifact.release();
        }
    }

    fn poll_cleanup(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        let Some(cleanup) = self.cleanup.as_mut() else {
            return Poll::Ready(());
        };
        match std::future::Future::poll(Pin::new(cleanup), cx) {
            Poll::Ready(result) => {
                if let Err(e) = result {
                    warn!(error = %e, "artifact deletion task failed");
                }
                self.cleanup = None;
                Poll::Ready(())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Stream for ArtifactStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(reader) = this.reader.as_mut() else {
            return this.poll_cleanup(cx).map(|()| None);
        };

        match Pin::new(reader).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.sent += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                warn!(error = %e, bytes = this.sent, "reading artifact failed mid-stream");
                this.finish();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.finish();
                this.poll_cleanup(cx).map(|()| None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ArtifactStream {
    fn drop(&mut self) {
        if self.artifact.is_some() {
            debug!(bytes = self.sent, "download stream abandoned before completion");
        }
    }
}

/// Turns verified artifacts into attachment responses
#[derive(Clone, Debug)]
pub struct StreamingDelivery {
    chunk_size: usize,
}

impl StreamingDelivery {
    /// Create a delivery stage from configuration
    pub fn new(config: &DeliveryConfig) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
        }
    }

    /// Chunk size used for response bodies
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Build a streamed attachment response for a verified artifact
    ///
    /// The artifact moves into the response body. If the response cannot be
    /// built the artifact is dropped, and so deleted, before returning.
    pub async fn deliver(
        &self,
        artifact: TransientArtifact,
        download_name: &str,
        content_type: &str,
    ) -> Result<Response> {
        let file = File::open(artifact.path()).await?;
        let length = file.metadata().await?.len();

        let stream = ArtifactStream::new(file, artifact, self.chunk_size);

        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(
                header::CONTENT_DISPOSITION,
                content_disposition(download_name),
            )
            .header(header::CONTENT_LENGTH, length)
            .body(Body::from_stream(stream))
            .map_err(|e| Error::Other(format!("failed to build download response: {e}")))
    }
}
