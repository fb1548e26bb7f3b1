//! Save scheduler: throttles persistence to one cycle per interval.
//!
//! The scheduler is a small state machine stored in a single atomic cell.
//! It never owns a timer itself; it tells the caller when a timer must be
//! armed and when a cycle may start, so the state is never inferred from
//! the presence of a timer handle.
//!
//! ```text
//!            dirty                 timer fires
//!   Idle ───────────► Armed ───────────────────► Saving
//!    ▲                 │ dirty: no-op              │ dirty: no-op
//!    │                 ▼                           │
//!    └─────────────────────────────────────────────┘
//!                 cycle completes (ok or error)
//!
//!   storage unusable: any ──► Disabled (terminal)
//! ```
//!
//! The first dirty event of an idle period fixes the deadline; later events
//! neither reset nor duplicate the timer (throttling, not debouncing).

use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

/// Current state of the [`SaveScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SaveState {
    /// No timer armed and no write in flight.
    Idle = 0,
    /// A timer is pending; no write in flight.
    Armed = 1,
    /// A write is in flight; no timer armed.
    Saving = 2,
    /// Persistence is off for the lifetime of the process.
    Disabled = 3,
}

impl SaveState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SaveState::Idle,
            1 => SaveState::Armed,
            2 => SaveState::Saving,
            _ => SaveState::Disabled,
        }
    }
}

impl Display for SaveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SaveState::Idle => "idle",
            SaveState::Armed => "armed",
            SaveState::Saving => "saving",
            SaveState::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

/// Lock-free throttle state machine for the save cycle.
///
/// # Examples
///
/// ```rust
/// use pagehits::schedule::{SaveScheduler, SaveState};
/// use std::time::Duration;
///
/// let scheduler = SaveScheduler::new(Duration::from_secs(10));
///
/// assert!(scheduler.mark_dirty());   // caller arms the timer
/// assert!(!scheduler.mark_dirty());  // already armed
/// let saving = scheduler.begin_save().unwrap(); // timer fired
/// assert_eq!(scheduler.state(), SaveState::Saving);
/// drop(saving);
/// assert_eq!(scheduler.state(), SaveState::Idle);
/// ```
#[derive(Debug)]
pub struct SaveScheduler {
    state: AtomicU8,
    interval: Duration,
}

impl SaveScheduler {
    /// Creates an idle scheduler with the given throttle interval.
    pub const fn new(interval: Duration) -> Self {
        Self {
            state: AtomicU8::new(SaveState::Idle as u8),
            interval,
        }
    }

    /// Returns the throttle interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the current state.
    pub fn state(&self) -> SaveState {
        SaveState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Records a dirty event.
    ///
    /// Returns `true` only on the `Idle -> Armed` transition, in which case
    /// the caller must arm exactly one deferred save. In every other state
    /// this is a no-op returning `false`.
    pub fn mark_dirty(&self) -> bool {
        self.transition(SaveState::Idle, SaveState::Armed)
    }

    /// Moves `Armed -> Saving` when the deferred save fires.
    ///
    /// Returns `None` if the scheduler was not armed (for example because
    /// persistence was disabled meanwhile); the caller must then skip the
    /// cycle. Dropping the returned guard moves back to `Idle`, also when
    /// the cycle unwinds.
    pub fn begin_save(&self) -> Option<SaveGuard<'_>> {
        self.transition(SaveState::Armed, SaveState::Saving)
            .then(|| SaveGuard { scheduler: self })
    }

    /// Moves `Saving -> Idle` once the cycle completed, whatever its
    /// outcome.
    pub fn finish_save(&self) {
        self.transition(SaveState::Saving, SaveState::Idle);
    }

    /// Switches to the terminal `Disabled` state.
    pub fn disable(&self) {
        self.state.store(SaveState::Disabled as u8, Ordering::Release);
    }

    fn transition(&self, from: SaveState, to: SaveState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// An in-flight save cycle; dropping it completes the cycle.
#[derive(Debug)]
#[must_use = "dropping the guard ends the save cycle"]
pub struct SaveGuard<'a> {
    scheduler: &'a SaveScheduler,
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.scheduler.finish_save();
    }
}
