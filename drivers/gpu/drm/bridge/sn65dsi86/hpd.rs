// SPDX-License-Identifier: GPL-2.0

//! Hot-plug detection.
//!
//! The HPD level is sampled every [`HPD_POLL_INTERVAL_MS`] from a self re-arming work item. A
//! level change starts or stops the stream right away, while the reported status only follows
//! once the level has been stable for [`HPD_DEBOUNCE_POLLS`] samples.

use crate::brg::Brg;
use kernel::{
    prelude::*,
    sync::Weak,
    workqueue::{Queue, QueueHandle},
};

/// Time between two HPD samples.
pub const HPD_POLL_INTERVAL_MS: u32 = 100;

/// Consecutive identical samples needed before the status follows the level.
pub const HPD_DEBOUNCE_POLLS: u32 = 2000 / HPD_POLL_INTERVAL_MS;

/// Debounced connection status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HpdStatus {
    /// A sink has been plugged for a full debounce period.
    Connected,
    /// No sink has been plugged for a full debounce period.
    Disconnected,
    /// Not enough samples yet.
    Unknown,
}

/// Sampled HPD level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Plugged,
    Unplugged,
}

/// Debounce state of the HPD line.
///
/// The sample count restarts on every edge as well as when the status latches. A counter that
/// only restarts at the threshold would let a bouncing line latch after a run shorter than
/// [`HPD_DEBOUNCE_POLLS`].
#[derive(Debug)]
pub struct HpdDebounce {
    status: HpdStatus,
    last: Level,
    count: u32,
}

impl HpdDebounce {
    /// Starts with no sink seen, so that a first plugged sample counts as a connect.
    pub const fn new() -> Self {
        Self {
            status: HpdStatus::Unknown,
            last: Level::Unplugged,
            count: 0,
        }
    }

    /// Current debounced status.
    pub fn status(&self) -> HpdStatus {
        self.status
    }

    /// Feeds one sample, returning the new level if the sample is an edge.
    pub fn sample(&mut self, level: Level) -> Option<Level> {
        let edge = (level != self.last).then_some(level);
        if edge.is_some() {
            self.count = 0;
        }
        self.last = level;

        self.count += 1;
        if self.count >= HPD_DEBOUNCE_POLLS {
            self.status = match level {
                Level::Plugged => HpdStatus::Connected,
                Level::Unplugged => HpdStatus::Disconnected,
            };
            self.count = 0;
        }

        edge
    }
}

impl Default for HpdDebounce {
    fn default() -> Self {
        Self::new()
    }
}

/// Allocates the poll queue of `brg` and queues the first sample.
///
/// The work only holds a weak reference: it ends once the bridge is gone or the returned queue
/// is dropped.
pub(crate) fn arm(brg: Weak<Brg>) -> Result<Queue> {
    let queue = Queue::alloc("workqueue_hpd")?;
    let handle = queue.handle();
    queue.enqueue(move || poll_work(brg, handle))?;
    Ok(queue)
}

fn poll_work(brg: Weak<Brg>, handle: QueueHandle) {
    let delay = match brg.upgrade() {
        Some(brg) => {
            brg.poll_hpd();
            brg.delay().clone()
        }
        None => return,
    };

    delay.msleep(HPD_POLL_INTERVAL_MS);

    let next = handle.clone();
    // Fails once the queue is stopped, which ends the loop.
    let _ = handle.enqueue(move || poll_work(brg, next));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_latches_after_threshold() {
        let mut hpd = HpdDebounce::new();
        let mut edges = Vec::new();
        for poll in 1..=25 {
            if let Some(edge) = hpd.sample(Level::Plugged) {
                edges.push((poll, edge));
            }
            let expected = if poll < 20 {
                HpdStatus::Unknown
            } else {
                HpdStatus::Connected
            };
            assert_eq!(hpd.status(), expected, "poll {poll}");
        }
        assert_eq!(edges, vec![(1, Level::Plugged)]);
    }

    #[test]
    fn unplugged_from_start_is_not_an_edge() {
        let mut hpd = HpdDebounce::new();
        for _ in 0..19 {
            assert_eq!(hpd.sample(Level::Unplugged), None);
        }
        assert_eq!(hpd.status(), HpdStatus::Unknown);
        assert_eq!(hpd.sample(Level::Unplugged), None);
        assert_eq!(hpd.status(), HpdStatus::Disconnected);
    }

    #[test]
    fn disconnect_edge_fires_once() {
        let mut hpd = HpdDebounce::new();
        for _ in 0..20 {
            hpd.sample(Level::Plugged);
        }
        assert_eq!(hpd.sample(Level::Unplugged), Some(Level::Unplugged));
        for _ in 0..18 {
            assert_eq!(hpd.sample(Level::Unplugged), None);
            assert_eq!(hpd.status(), HpdStatus::Connected);
        }
        hpd.sample(Level::Unplugged);
        assert_eq!(hpd.status(), HpdStatus::Disconnected);
    }

    #[test]
    fn bouncing_line_restarts_the_count() {
        let mut hpd = HpdDebounce::new();
        for _ in 0..15 {
            hpd.sample(Level::Plugged);
        }
        assert_eq!(hpd.sample(Level::Unplugged), Some(Level::Unplugged));
        assert_eq!(hpd.sample(Level::Plugged), Some(Level::Plugged));
        for _ in 0..18 {
            hpd.sample(Level::Plugged);
        }
        assert_eq!(hpd.status(), HpdStatus::Unknown);
        hpd.sample(Level::Plugged);
        assert_eq!(hpd.status(), HpdStatus::Connected);
    }

    #[test]
    fn status_needs_a_stable_run() {
        // Pseudo-random traces with runs of varying length.
        let mut seed = 0x2545_f491_u32;
        for _ in 0..50 {
            let mut hpd = HpdDebounce::new();
            let mut level = Level::Unplugged;
            let mut run = 0u32;
            for _ in 0..2000 {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
                if (seed >> 16) % 23 == 0 {
                    level = match level {
                        Level::Plugged => Level::Unplugged,
                        Level::Unplugged => Level::Plugged,
                    };
                    run = 0;
                }
                run += 1;

                let before = hpd.status();
                hpd.sample(level);
                if hpd.status() != before {
                    assert!(run >= HPD_DEBOUNCE_POLLS, "changed after {run} samples");
                }
            }
        }
    }
}
