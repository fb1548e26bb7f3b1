//! Startup recovery of the most recent snapshot.
//!
//! Recovery runs once per [`HitCounter`](crate::HitCounter). It decides
//! whether persistence is available at all, collects the snapshot files
//! already on storage and loads the newest one. Every failure degrades:
//! an unusable directory means memory-only operation, an unreadable
//! snapshot means starting from zero. Older snapshots are never tried as a
//! fallback.

use tracing::{debug, info, warn};

use crate::config::HitCounterConfig;
use crate::snapshot::{CountSnapshot, SnapshotFile};
use crate::store::SnapshotStore;

/// What startup recovery found on storage.
#[derive(Debug, Default)]
pub struct Recovered {
    /// The usable store, or `None` when persistence is disabled.
    pub store: Option<SnapshotStore>,
    /// Every snapshot file found, most recent first.
    pub known: Vec<SnapshotFile>,
    /// Counts loaded from the most recent snapshot.
    pub counts: CountSnapshot,
}

/// Opens the snapshot directory and loads the latest snapshot.
pub async fn recover(config: &HitCounterConfig) -> Recovered {
    let Some(store) = SnapshotStore::ensure_usable(config).await else {
        warn!(
            path = %config.data_dir.display(),
            "data directory unusable, counting in memory only"
        );
        return Recovered::default();
    };

    let known = store.list().await;
    let counts = match known.first() {
        Some(latest) => match store.read(latest).await {
            Ok(counts) => {
                info!(
                    path = %latest.path.display(),
                    keys = counts.len(),
                    "page hits restored"
                );
                counts
            }
            Err(err) => {
                warn!(
                    path = %latest.path.display(),
                    error = %err,
                    older = known.len() - 1,
                    "cannot restore snapshot, starting empty; older snapshots are not \
                     restored and will be deleted by the next save"
                );
                CountSnapshot::new()
            }
        },
        None => {
            debug!(path = %store.dir().display(), "no snapshot to restore");
            CountSnapshot::new()
        }
    };

    Recovered {
        store: Some(store),
        known,
        counts,
    }
}
