//! Shared test helpers: a scripted provider and a service on a temp scratch dir.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extractor::MediaExtractor;
use crate::service::MediaService;
use crate::types::{FormatCatalog, FormatDescriptor, MediaKind, ResourceInfo};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

pub(crate) const TEST_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// Provider double with canned metadata and scripted transfer failures
pub(crate) struct FakeExtractor {
    pub info: ResourceInfo,
    pub transfer_failures: u32,
    pub payload: Vec<u8>,
    pub catalog_calls: AtomicU32,
    pub transfer_calls: AtomicU32,
    pub requested_formats: Mutex<Vec<String>>,
}

impl FakeExtractor {
    pub fn new() -> Self {
        Self {
            info: sample_info(),
            transfer_failures: 0,
            payload: b"fake media payload".to_vec(),
            catalog_calls: AtomicU32::new(0),
            transfer_calls: AtomicU32::new(0),
            requested_formats: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(transfer_failures: u32) -> Self {
        Self {
            transfer_failures,
            ..Self::new()
        }
    }

    pub fn with_formats(formats: Vec<FormatDescriptor>) -> Self {
        let mut extractor = Self::new();
        extractor.info.formats = FormatCatalog::new(formats);
        extractor
    }

    pub fn catalog_calls(&self) -> u32 {
        self.catalog_calls.load(Ordering::SeqCst)
    }

    pub fn transfer_calls(&self) -> u32 {
        self.transfer_calls.load(Ordering::SeqCst)
    }

    pub fn requested_formats(&self) -> Vec<String> {
        self.requested_formats.lock().unwrap().clone()
    }
}

impl MediaExtractor for FakeExtractor {
    fn extract_catalog(&self, _url: &str) -> Result<ResourceInfo> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.info.clone())
    }

    fn transfer_format(&self, _url: &str, format_id: &str, destination: &Path) -> Result<()> {
        let call = self.transfer_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requested_formats
            .lock()
            .unwrap()
            .push(format_id.to_string());

        if call <= self.transfer_failures {
            std::fs::write(destination, b"partial")?;
            return Err(Error::ExternalTool("HTTP Error 403: Forbidden".into()));
        }
        std::fs::write(destination, &self.payload)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Catalog shaped like real provider output, including a rendition outside the allow-list
pub(crate) fn sample_info() -> ResourceInfo {
    ResourceInfo {
        title: "Test: Video/Clip \"HD\"".to_string(),
        duration: 212,
        thumbnail: Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg".to_string()),
        uploader: Some("Uploader".to_string()),
        view_count: Some(42),
        formats: FormatCatalog::new(vec![
            FormatDescriptor::new("17", "3gp", MediaKind::Video, 144, 1_000_000),
            FormatDescriptor::new("140", "m4a", MediaKind::Audio, 0, 3_000_000),
            FormatDescriptor::new("251", "webm", MediaKind::Audio, 0, 3_500_000),
            FormatDescriptor::new("18", "mp4", MediaKind::Video, 360, 10_000_000),
            FormatDescriptor::new("22", "mp4", MediaKind::Video, 720, 30_000_000),
            FormatDescriptor::new("136", "mp4", MediaKind::Video, 720, 25_000_000),
            FormatDescriptor::new("137", "mp4", MediaKind::Video, 1080, 80_000_000),
        ]),
    }
}

/// Configuration with a private scratch dir and millisecond backoff
pub(crate) fn test_config(scratch: &Path) -> Config {
    let mut config = Config::default();
    config.scratch_dir = scratch.to_path_buf();
    config.retry.base_delay = Duration::from_millis(1);
    config.workers.max_blocking_jobs = 2;
    config
}

/// Create a service around `extractor`. The tempdir must be kept alive.
pub(crate) async fn create_test_service(
    extractor: Arc<FakeExtractor>,
) -> (MediaService, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let config = test_config(&temp_dir.path().join("scratch"));
    let service = MediaService::new(config, extractor).unwrap();
    service.init().await.unwrap();
    (service, temp_dir)
}

/// Files currently in the service's scratch dir
pub(crate) fn scratch_entries(service: &MediaService) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(&service.config.scratch_dir)
        .map(|entries| entries.map(|e| e.unwrap().path()).collect())
        .unwrap_or_default()
}

/// Wait until background artifact deletion has emptied the scratch directory
pub(crate) async fn wait_for_empty_scratch(service: &MediaService) {
    for _ in 0..100 {
        if scratch_entries(service).is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("scratch dir still holds {:?}", scratch_entries(service));
}
