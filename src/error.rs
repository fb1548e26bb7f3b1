//! Error type for snapshot persistence.
//!
//! Persistence errors never escape the background save cycle: they are
//! logged and the counter keeps running. They are surfaced directly only by
//! the [`SnapshotStore`](crate::store::SnapshotStore) methods and by
//! [`HitCounter::flush`](crate::HitCounter::flush).

use std::path::PathBuf;

use thiserror::Error;

/// Error type for snapshot store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Error reading a snapshot file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Error encoding or decoding a snapshot.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot file could not be written.
    #[error("cannot write snapshot {}", .0.display())]
    WriteFailed(PathBuf),

    /// No generation marker above the ones already on storage is left.
    #[error("snapshot generation markers exhausted")]
    GenerationExhausted,

    /// Persistence is disabled because the data directory is unusable.
    #[error("persistence disabled")]
    Disabled,
}

/// Result type for snapshot store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
