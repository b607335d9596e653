//! Resource arbiter — the single mutual-exclusion gate around the sensor
//! channel.
//!
//! Exactly two classes of consumer exist:
//!
//! - the **scheduled job**, which blocks for the lock and holds it across
//!   the climate read and the whole sampling loop (tens of seconds);
//! - **auxiliary preview readers**, which only ever try the lock and get
//!   an immediate "unavailable" while it is held — they must fail fast,
//!   never queue behind a running cycle.
//!
//! ```text
//!   acquisition cycle ──▶ with_exclusive() ──┐
//!                                            ├──▶ Mutex<SensorChannel>
//!   preview readers   ──▶ try_quick_read() ──┘     (one logical holder)
//! ```

use std::sync::Mutex;

use log::debug;

use crate::clock::CalendarTime;
use crate::sensors::{PreviewReading, SensorChannel};

/// Owns the sensor channel behind one mutex with two access modes.
pub struct SensorArbiter {
    channel: Mutex<SensorChannel>,
}

impl SensorArbiter {
    pub fn new(channel: SensorChannel) -> Self {
        Self {
            channel: Mutex::new(channel),
        }
    }

    /// Blocking-exclusive access for the scheduled job.  The closure runs
    /// with the channel locked for its whole duration.
    pub fn with_exclusive<T>(&self, f: impl FnOnce(&mut SensorChannel) -> T) -> T {
        // A poisoned lock means a panic mid-cycle; the channel carries no
        // invariant that a fresh cycle cannot re-establish, so recover it.
        let mut guard = self
            .channel
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }

    /// Non-blocking best-effort read for the preview path.  `None` when the
    /// scheduled job currently holds the channel.  `taken_at` is the
    /// caller's clock reading, stamped onto the snapshot.
    pub fn try_quick_read(&self, taken_at: Option<CalendarTime>) -> Option<PreviewReading> {
        match self.channel.try_lock() {
            Ok(mut guard) => Some(guard.quick_read(taken_at)),
            Err(std::sync::TryLockError::Poisoned(p)) => Some(p.into_inner().quick_read(taken_at)),
            Err(std::sync::TryLockError::WouldBlock) => {
                debug!("preview: sensor busy, acquisition in progress");
                None
            }
        }
    }
}
