//! Transient artifacts in the scratch directory
//!
//! A [`TransientArtifact`] reserves a unique file name for one request. The
//! name is reserved before the first fetch attempt, cleared between failed
//! attempts and deleted when the value is dropped, whichever way the request
//! ends. Providers may leave side files next to the destination (`.part`,
//! `.ytdl`, fragment files); every file whose name starts with the artifact's
//! file name belongs to it and is removed with it.
//!
//! Deletion touches the disk, so inside a tokio runtime it runs on the
//! blocking pool. Without a runtime it runs inline.

use crate::error::Result;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// File name prefix of every artifact this crate creates
pub const ARTIFACT_PREFIX: &str = "dvorfs-";

/// A request-private file under the scratch directory
///
/// Dropping the value deletes the file and its side files. Deletion happens
/// exactly once and never fails loudly when the file is already gone.
#[derive(Debug)]
pub struct TransientArtifact {
    path: PathBuf,
    abandoned: Arc<AtomicBool>,
    released: bool,
}

impl TransientArtifact {
    /// Reserve a unique name `dvorfs-<uuid>.<extension>` under `scratch_dir`
    ///
    /// No file is created; the provider writes to [`path`](Self::path).
    pub fn reserve(scratch_dir: &Path, extension: &str) -> Self {
        let extension = extension.trim_start_matches('.');
        let name = if extension.is_empty() {
            format!("{}{}", ARTIFACT_PREFIX, Uuid::new_v4())
        } else {
            format!("{}{}.{}", ARTIFACT_PREFIX, Uuid::new_v4(), extension)
        };

        Self {
            path: scratch_dir.join(name),
            abandoned: Arc::new(AtomicBool::new(false)),
            released: false,
        }
    }

    /// Destination path of the artifact
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flag that turns true once the owning request is gone
    ///
    /// A blocking transfer that outlives its request checks this when it
    /// returns and removes whatever it wrote.
    pub(crate) fn abandoned_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abandoned)
    }

    /// Delete the artifact and its side files, keeping the reservation
    ///
    /// Used between failed fetch attempts. Returns how many files were removed.
    pub async fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        if remove_artifact_async(&self.path).await? {
            removed += 1;
        }

        let (Some(dir), Some(name)) = (self.path.parent(), self.path.file_name()) else {
            return Ok(removed);
        };

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(removed),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if is_side_file(&entry.file_name(), name)
                && remove_artifact_async(&entry.path()).await?
            {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(path = ?self.path, removed, "cleared partial artifact");
        }
        Ok(removed)
    }

    /// Give up the artifact and schedule its deletion
    ///
    /// Returns the handle of the blocking deletion task, or `None` when no
    /// runtime was available and the files were already removed inline.
    /// Dropping the handle does not cancel the deletion.
    pub fn release(mut self) -> Option<JoinHandle<()>> {
        self.released = true;
        self.abandoned.store(true, Ordering::SeqCst);
        schedule_removal(self.path.clone())
    }
}

impl Drop for TransientArtifact {
    fn drop(&mut self) {
        self.abandoned.store(true, Ordering::SeqCst);
        if !self.released {
            schedule_removal(self.path.clone());
        }
    }
}

fn schedule_removal(path: PathBuf) -> Option<JoinHandle<()>> {
    match Handle::try_current() {
        Ok(handle) => Some(handle.spawn_blocking(move || delete_logged(&path))),
        Err(_) => {
            delete_logged(&path);
            None
        }
    }
}

fn delete_logged(path: &Path) {
    match remove_with_side_files(path) {
        Ok(0) => {}
        Ok(removed) => debug!(?path, removed, "deleted transient artifact"),
        Err(e) => warn!(?path, error = %e, "failed to delete transient artifact"),
    }
}

/// Delete `path` if it exists
///
/// Returns `Ok(true)` when a file was removed and `Ok(false)` when there was
/// nothing to remove. A missing file is never an error.
pub fn remove_artifact(path: &Path) -> io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

async fn remove_artifact_async(path: &Path) -> io::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Synchronous removal of an artifact and its side files
pub(crate) fn remove_with_side_files(path: &Path) -> io::Result<usize> {
    let mut removed = usize::from(remove_artifact(path)?);

    let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
        return Ok(removed);
    };
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(removed),
        Err(e) => return Err(e),
    };
    for entry in entries.flatten() {
        if is_side_file(&entry.file_name(), name) && remove_artifact(&entry.path())? {
            removed += 1;
        }
    }
    Ok(removed)
}

fn is_side_file(candidate: &OsStr, artifact_name: &OsStr) -> bool {
    match (candidate.to_str(), artifact_name.to_str()) {
        (Some(candidate), Some(name)) => candidate != name && candidate.starts_with(name),
        _ => false,
    }
}

/// Create the scratch directory if needed
pub async fn prepare_scratch_dir(scratch_dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(scratch_dir).await?;
    Ok(())
}

/// Remove artifacts left behind by a previous process
///
/// Only files carrying [`ARTIFACT_PREFIX`] are touched. Returns the number of
/// files removed.
pub async fn sweep_stale_artifacts(scratch_dir: &Path) -> Result<usize> {
    let mut entries = match tokio::fs::read_dir(scratch_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let is_artifact = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(ARTIFACT_PREFIX));
        if !is_artifact || !entry.file_type().await?.is_file() {
            continue;
        }
        match remove_artifact_async(&entry.path()).await {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => warn!(path = ?entry.path(), error = %e, "could not remove stale artifact"),
        }
    }

    if removed > 0 {
        tracing::info!(removed, ?scratch_dir, "removed stale artifacts");
    }
    Ok(removed)
}
