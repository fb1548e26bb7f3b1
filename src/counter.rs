//! The hit counter and its persistence cycle.
//!
//! [`HitCounter`] owns the authoritative key → count map. Increments are
//! synchronous and never wait on storage; persistence happens in the
//! background on the tokio runtime the counter was created on.
//!
//! # Lifecycle
//!
//! ```text
//!   new() ──spawn──► recovery ──► ready
//!                                   │
//!   increment() ──dirty──► scheduler arms a timer ──interval──► save cycle
//!                                                                   │
//!                             write snapshot ──ok──► delete stale ──┘
//! ```
//!
//! A save cycle copies the counts when it begins, so increments made while
//! the write is in flight stay in memory and are picked up by the next
//! cycle.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::HitCounterConfig;
use crate::error::{Result, StoreError};
use crate::recovery;
use crate::schedule::{SaveScheduler, SaveState};
use crate::snapshot::{CountSnapshot, SnapshotFile};
use crate::store::SnapshotStore;

/// Result of one persistence cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A snapshot was written.
    Saved {
        /// The new snapshot, now the only known one.
        file: SnapshotFile,
        /// Stale snapshots removed.
        deleted: usize,
        /// Stale snapshots that could not be removed.
        failed_deletes: usize,
    },
    /// The snapshot write failed; prior snapshots are untouched.
    Failed(String),
    /// Persistence is disabled, nothing was written.
    Skipped,
}

/// Progress of the persistence cycles, published after each cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Number of completed cycles.
    pub cycle: u64,
    /// Outcome of the last completed cycle.
    pub outcome: Option<SaveOutcome>,
}

/// A keyed hit counter with throttled snapshot persistence.
///
/// Cloning is cheap and yields another handle to the same counter.
///
/// # Examples
///
/// ```rust,no_run
/// use pagehits::{HitCounter, HitCounterConfig};
///
/// # async fn run() {
/// let hits = HitCounter::open(HitCounterConfig::new().data_dir("./data")).await;
///
/// assert_eq!(hits.increment("3f2a9c"), 1);
/// assert_eq!(hits.increment("3f2a9c"), 2);
///
/// // Upstream key derivation failed: nothing is counted.
/// assert_eq!(hits.count(None), None);
/// # }
/// ```
#[derive(Clone)]
pub struct HitCounter {
    inner: Arc<Inner>,
}

struct Inner {
    config: HitCounterConfig,
    counts: Mutex<HashMap<String, u64>>,
    scheduler: SaveScheduler,
    store: OnceLock<Option<SnapshotStore>>,
    known: tokio::sync::Mutex<Vec<SnapshotFile>>,
    ready: watch::Sender<bool>,
    reports: watch::Sender<SaveReport>,
    runtime: Handle,
}

impl HitCounter {
    /// Creates a counter and starts recovery in the background.
    ///
    /// Increments are accepted immediately, but counts restored from
    /// storage are merged over them once recovery finishes; await
    /// [`ready`](Self::ready) before relying on restored values.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn new(config: HitCounterConfig) -> Self {
        let (ready, _) = watch::channel(false);
        let (reports, _) = watch::channel(SaveReport::default());
        let inner = Arc::new(Inner {
            scheduler: SaveScheduler::new(config.save_interval),
            config,
            counts: Mutex::new(HashMap::new()),
            store: OnceLock::new(),
            known: tokio::sync::Mutex::new(Vec::new()),
            ready,
            reports,
            runtime: Handle::current(),
        });

        let task = Arc::clone(&inner);
        inner.runtime.spawn(async move { task.recover().await });

        Self { inner }
    }

    /// Creates a counter and waits for recovery to complete.
    pub async fn open(config: HitCounterConfig) -> Self {
        let counter = Self::new(config);
        counter.ready().await;
        counter
    }

    /// Waits until startup recovery has completed.
    pub async fn ready(&self) {
        self.inner.ready().await;
    }

    /// Increments the count for `key` and returns the new value.
    ///
    /// Unseen keys start at zero. The first increment of an idle period
    /// schedules a save after the configured interval; later ones only
    /// update memory.
    pub fn increment(&self, key: &str) -> u64 {
        let count = {
            let mut counts = self.inner.counts.lock();
            match counts.get_mut(key) {
                Some(count) => {
                    *count += 1;
                    *count
                }
                None => {
                    counts.insert(key.to_owned(), 1);
                    1
                }
            }
        };

        if self.inner.scheduler.mark_dirty() {
            self.arm();
        }
        count
    }

    /// Counts a hit for an optional key.
    ///
    /// `None` or an empty key means the key could not be derived upstream;
    /// nothing is counted and `None` is returned.
    pub fn count(&self, key: Option<&str>) -> Option<u64> {
        match key {
            Some(key) if !key.is_empty() => Some(self.increment(key)),
            _ => None,
        }
    }

    /// Returns the current count for `key`.
    pub fn get(&self, key: &str) -> Option<u64> {
        self.inner.counts.lock().get(key).copied()
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.inner.counts.lock().len()
    }

    /// Returns `true` if nothing has been counted yet.
    pub fn is_empty(&self) -> bool {
        self.inner.counts.lock().is_empty()
    }

    /// Returns a point-in-time copy of every count.
    pub fn snapshot(&self) -> CountSnapshot {
        self.inner.snapshot()
    }

    /// Returns the scheduler state.
    pub fn save_state(&self) -> SaveState {
        self.inner.scheduler.state()
    }

    /// Returns `true` once recovery found a usable data directory.
    pub fn is_persistent(&self) -> bool {
        matches!(self.inner.store.get(), Some(Some(_)))
    }

    /// Returns the snapshot files believed to exist on storage.
    pub async fn known_snapshots(&self) -> Vec<SnapshotFile> {
        self.inner.known.lock().await.clone()
    }

    /// Subscribes to the reports published after every persistence cycle.
    pub fn subscribe(&self) -> watch::Receiver<SaveReport> {
        self.inner.reports.subscribe()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HitCounterConfig {
        &self.inner.config
    }

    /// Runs a persistence cycle now.
    ///
    /// Waits for recovery and for any cycle already in flight. Does not
    /// change the scheduler state, so a pending deferred save still runs.
    pub async fn flush(&self) -> Result<SnapshotFile> {
        self.inner.ready().await;
        let result = self.inner.save().await;
        self.inner.publish(&result);
        result.map(|saved| saved.file)
    }

    fn arm(&self) {
        let inner = Arc::clone(&self.inner);
        debug!(interval = ?inner.scheduler.interval(), "save armed");
        self.inner.runtime.spawn(async move {
            tokio::time::sleep(inner.scheduler.interval()).await;
            inner.ready().await;
            let Some(saving) = inner.scheduler.begin_save() else {
                return;
            };
            let result = inner.save().await;
            drop(saving);
            inner.publish(&result);
        });
    }
}

impl Debug for HitCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HitCounter")
            .field("data_dir", &self.inner.config.data_dir)
            .field("keys", &self.len())
            .field("state", &format_args!("{}", self.save_state()))
            .finish()
    }
}

struct Saved {
    file: SnapshotFile,
    deleted: usize,
    failed_deletes: usize,
}

impl Inner {
    async fn recover(&self) {
        let recovered = recovery::recover(&self.config).await;
        if recovered.store.is_none() {
            self.scheduler.disable();
        }

        {
            let mut counts = self.counts.lock();
            for (key, count) in recovered.counts {
                counts.insert(key, count);
            }
        }

        *self.known.lock().await = recovered.known;
        let _ = self.store.set(recovered.store);
        self.ready.send_replace(true);
    }

    async fn ready(&self) {
        let mut ready = self.ready.subscribe();
        // The sender lives as long as `self`, so this only returns once set.
        let _ = ready.wait_for(|ready| *ready).await;
    }

    fn snapshot(&self) -> CountSnapshot {
        let counts = self.counts.lock();
        counts.iter().map(|(k, v)| (k.as_str(), *v)).collect()
    }

    /// Writes a snapshot, then drops every previously known one.
    ///
    /// The known-set lock is held for the whole cycle, so cycles never
    /// overlap.
    async fn save(&self) -> Result<Saved> {
        let mut known = self.known.lock().await;
        let Some(Some(store)) = self.store.get() else {
            return Err(StoreError::Disabled);
        };

        let state = self.snapshot();
        let file = match store.write(&state).await {
            Ok(file) => file,
            Err(err) => {
                warn!(error = %err, "cannot store page hits");
                return Err(err);
            }
        };
        info!(path = %file.path.display(), keys = state.len(), "page hits stored");

        let stale = std::mem::replace(&mut *known, vec![file.clone()]);
        let results = store.delete(&stale).await;
        let deleted = results.iter().filter(|ok| **ok).count();

        Ok(Saved {
            file,
            deleted,
            failed_deletes: results.len() - deleted,
        })
    }

    fn publish(&self, result: &Result<Saved>) {
        let outcome = match result {
            Ok(saved) => SaveOutcome::Saved {
                file: saved.file.clone(),
                deleted: saved.deleted,
                failed_deletes: saved.failed_deletes,
            },
            Err(StoreError::Disabled) => SaveOutcome::Skipped,
            Err(err) => SaveOutcome::Failed(err.to_string()),
        };
        self.reports.send_modify(|report| {
            report.cycle += 1;
            report.outcome = Some(outcome);
        });
    }
}
