//! # Pagehits - Keyed Hit Counters with Snapshot Persistence
//!
//! A Rust library that counts events by key in memory and periodically
//! writes the whole count map to disk, so counts survive process restarts.
//!
//! ## The Problem
//!
//! Counting page hits (or any keyed event) is trivial in memory, but the
//! counts vanish with the process. Writing to disk on every hit turns a
//! nanosecond operation into a syscall and lets bursts of traffic hammer
//! the storage.
//!
//! ## The Solution: Throttled Snapshots
//!
//! Increments only touch memory. The first increment after an idle period
//! arms a single deferred save; every increment until it fires is coalesced
//! into the same write.
//!
//! ### Design Principles
//!
//! 1. **Synchronous increments**: [`HitCounter::increment`] never waits on
//!    storage and cannot fail.
//!
//! 2. **Throttling, not debouncing**: the deadline is fixed by the first
//!    dirty event, so a steady stream of hits still gets saved once per
//!    interval.
//!
//! 3. **One write at a time**: the [`SaveScheduler`](schedule::SaveScheduler)
//!    state machine never arms a second timer while a save is pending or in
//!    flight.
//!
//! 4. **Whole snapshots**: each save writes a new file named after a
//!    strictly increasing generation marker; older files are deleted only
//!    once the new one is on disk.
//!
//! 5. **Graceful degradation**: an unusable data directory means counting
//!    in memory only; an unreadable snapshot means starting from zero. No
//!    storage failure ever reaches the caller of `increment`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           HitCounter                                │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  increment("a") ──► { "a": 3, "b": 1 } ──dirty──► SaveScheduler     │
//! │                                                      │ interval     │
//! │                                                      ▼              │
//! │            SnapshotStore ◄── write hit<ms>.json ◄── save cycle      │
//! │                 │                                                   │
//! │                 └── delete stale hit<ms>.json                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagehits::{HitCounter, HitCounterConfig};
//! use std::time::Duration;
//!
//! # async fn run() {
//! let config = HitCounterConfig::new()
//!     .data_dir("./data")
//!     .save_interval(Duration::from_secs(10));
//!
//! // Loads the most recent snapshot, if any.
//! let hits = HitCounter::open(config).await;
//!
//! let total = hits.increment("3f2a9c");
//! println!("page 3f2a9c seen {total} times");
//!
//! // Force a save, e.g. before shutting down.
//! hits.flush().await.ok();
//! # }
//! ```
//!
//! ## Storage Layout
//!
//! ```text
//! data/
//! └── hit1718030400123.json     {"3f2a9c":12,"a81b04":1}
//! ```
//!
//! Only files carrying the configured suffix are considered. At most one
//! snapshot is normally present; stale ones linger only if their deletion
//! failed.
//!
//! ## Runtime
//!
//! The counter spawns its recovery and save tasks on the tokio runtime it
//! was created on. It works on both the current-thread and multi-thread
//! runtimes, and `increment` may be called from any thread.

pub mod config;
pub mod counter;
pub mod error;
pub mod fsutil;
pub mod recovery;
pub mod schedule;
pub mod snapshot;
pub mod store;

pub use config::HitCounterConfig;
pub use counter::{HitCounter, SaveOutcome, SaveReport};
pub use error::{Result, StoreError};
pub use schedule::SaveState;
pub use snapshot::{CountSnapshot, SnapshotFile};
pub use store::SnapshotStore;
