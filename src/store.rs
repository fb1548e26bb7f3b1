//! Snapshot store: whole-counter snapshots on durable storage.
//!
//! The store owns one directory. Each successful [`SnapshotStore::write`]
//! creates a new file; nothing is ever rewritten in place. Stale files are
//! removed with [`SnapshotStore::delete`] once a newer snapshot is on disk.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::config::HitCounterConfig;
use crate::error::{Result, StoreError};
use crate::fsutil;
use crate::snapshot::{self, CountSnapshot, SnapshotFile};

/// Reads, writes, lists and deletes snapshot files in one directory.
#[derive(Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
    prefix: String,
    suffix: String,
    pretty: bool,
    last_generation: AtomicU64,
}

impl SnapshotStore {
    /// Opens the store if its directory is usable.
    ///
    /// The directory is created when missing. Returns `None` when it does
    /// not end up readable and writable; the caller is then expected to run
    /// without persistence.
    pub async fn ensure_usable(config: &HitCounterConfig) -> Option<Self> {
        let info = fsutil::ensure_directory(&config.data_dir).await?;
        Some(Self {
            dir: info.path,
            prefix: config.file_prefix.clone(),
            suffix: config.file_suffix.clone(),
            pretty: config.pretty,
            last_generation: AtomicU64::new(0),
        })
    }

    /// Returns the snapshot directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lists the snapshot files, most recent first.
    ///
    /// Only readable regular files carrying the snapshot suffix are
    /// returned. A missing or empty directory yields an empty list.
    pub async fn list(&self) -> Vec<SnapshotFile> {
        let mut files: Vec<SnapshotFile> = fsutil::list_directory(&self.dir, &self.suffix)
            .await
            .into_iter()
            .map(|info| SnapshotFile::from_info(info, &self.prefix, &self.suffix))
            .collect();
        snapshot::sort_most_recent_first(&mut files);

        if let Some(max) = files.iter().filter_map(|f| f.generation).max() {
            self.last_generation.fetch_max(max, Ordering::Relaxed);
        }
        files
    }

    /// Reads and parses a snapshot file.
    pub async fn read(&self, file: &SnapshotFile) -> Result<CountSnapshot> {
        let json = tokio::fs::read_to_string(&file.path).await?;
        Ok(CountSnapshot::from_json(&json)?)
    }

    /// Writes `state` as a new snapshot file.
    ///
    /// On failure the existing snapshots are left untouched.
    pub async fn write(&self, state: &CountSnapshot) -> Result<SnapshotFile> {
        let json = state.to_json(self.pretty)?;
        let generation = self.next_generation()?;
        let path = self
            .dir
            .join(snapshot::file_name(&self.prefix, generation, &self.suffix));

        if !fsutil::write_file(&path, json).await {
            return Err(StoreError::WriteFailed(path));
        }

        let info = fsutil::probe(&path).await;
        debug!(path = %path.display(), keys = state.len(), "snapshot written");
        Ok(SnapshotFile {
            path,
            modified: info.modified,
            generation: Some(generation),
        })
    }

    /// Deletes stale snapshot files, best effort.
    ///
    /// Returns one flag per file. Failures are logged and do not stop the
    /// remaining deletions.
    pub async fn delete(&self, stale: &[SnapshotFile]) -> Vec<bool> {
        let paths: Vec<&Path> = stale.iter().map(|f| f.path.as_path()).collect();
        let results = fsutil::delete_files(&paths).await;
        let failed = results.iter().filter(|ok| !**ok).count();
        if failed > 0 {
            warn!(failed, total = results.len(), "stale snapshots left on storage");
        }
        results
    }

    /// Returns a generation strictly greater than any issued or listed
    /// so far, based on the wall clock in milliseconds.
    ///
    /// Fails once a listed marker already sits at `u64::MAX`.
    fn next_generation(&self) -> Result<u64> {
        let now = snapshot::current_timestamp_ms();
        let mut last = self.last_generation.load(Ordering::Relaxed);
        loop {
            let next = last
                .checked_add(1)
                .ok_or(StoreError::GenerationExhausted)?
                .max(now);
            match self.last_generation.compare_exchange_weak(
                last,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(next),
                Err(current) => last = current,
            }
        }
    }
}
