// SPDX-License-Identifier: GPL-2.0

//! Sleep routines.
//!
//! Drivers that sleep between register writes take an `Arc<dyn Delay>` so the waits can be
//! replaced, e.g. by a recorder in unit tests. [`SystemDelay`] really sleeps.

use std::{thread, time::Duration};

/// Source of sleeps.
pub trait Delay: Send + Sync {
    /// Sleeps for at least `msecs` milliseconds.
    fn msleep(&self, msecs: u32);

    /// Sleeps for somewhere between `min` and `max` microseconds.
    fn usleep_range(&self, min: u64, max: u64);
}

/// [`Delay`] backed by the calling thread actually sleeping.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemDelay;

impl Delay for SystemDelay {
    fn msleep(&self, msecs: u32) {
        msleep(msecs)
    }

    fn usleep_range(&self, min: u64, max: u64) {
        usleep_range(min, max)
    }
}

/// Sleeps for `msecs` milliseconds.
pub fn msleep(msecs: u32) {
    thread::sleep(Duration::from_millis(msecs.into()));
}

/// Sleeps for at least `min` microseconds.
///
/// The upper bound gives the scheduler room to coalesce wakeups; the host sleep only honours the
/// lower one.
pub fn usleep_range(min: u64, max: u64) {
    debug_assert!(min <= max);
    thread::sleep(Duration::from_micros(min));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn system_delay_sleeps_at_least_min() {
        let start = Instant::now();
        SystemDelay.usleep_range(2000, 3000);
        SystemDelay.msleep(1);
        assert!(start.elapsed() >= Duration::from_millis(3));
    }
}
