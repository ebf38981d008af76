// SPDX-License-Identifier: GPL-2.0

//! IO polling.
//!
//! Status bits of chips behind a slow bus are polled a bounded number of times rather than
//! against a deadline, each read being followed by a sleep.

use crate::{
    delay::Delay,
    error::{code::*, Result},
};

/// Polls up to `retries` times until a condition is met or an error occurs.
///
/// Each round executes `op`, sleeps for `sleep_min..=sleep_max` microseconds on `delay`, then
/// checks the value with `cond`. The sleep comes before the check so that the hardware gets its
/// settle time even when the condition already holds.
///
/// # Errors
///
/// If `op` returns an error, then that error is returned directly.
///
/// If `cond` never held, then `Err(ETIMEDOUT)` is returned.
///
/// # Examples
///
/// ```
/// use kernel::delay::SystemDelay;
/// use kernel::io::poll::read_poll_retries;
///
/// let mut reads = 0;
/// let val = read_poll_retries(
///     || {
///         reads += 1;
///         Ok(if reads == 3 { 0x80 } else { 0x00 })
///     },
///     |val: &u32| val & 0x80 != 0,
///     &SystemDelay,
///     100,
///     120,
///     10,
/// );
/// assert_eq!(val, Ok(0x80));
/// ```
pub fn read_poll_retries<Op, Cond, T>(
    mut op: Op,
    mut cond: Cond,
    delay: &dyn Delay,
    sleep_min: u64,
    sleep_max: u64,
    retries: usize,
) -> Result<T>
where
    Op: FnMut() -> Result<T>,
    Cond: FnMut(&T) -> bool,
{
    for _ in 0..retries {
        let val = op()?;
        delay.usleep_range(sleep_min, sleep_max);
        if cond(&val) {
            return Ok(val);
        }
    }

    Err(ETIMEDOUT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<u64>>);

    impl Delay for Recorder {
        fn msleep(&self, msecs: u32) {
            self.0.lock().push(u64::from(msecs) * 1000);
        }

        fn usleep_range(&self, min: u64, _max: u64) {
            self.0.lock().push(min);
        }
    }

    #[test]
    fn stops_on_condition() {
        let delay = Recorder::default();
        let mut n = 0;
        let ret = read_poll_retries(
            || {
                n += 1;
                Ok(n)
            },
            |v| *v == 4,
            &delay,
            10_000,
            12_000,
            10,
        );
        assert_eq!(ret, Ok(4));
        assert_eq!(*delay.0.lock(), vec![10_000; 4]);
    }

    #[test]
    fn times_out_after_retries() {
        let delay = Recorder::default();
        let mut n = 0;
        let ret = read_poll_retries(
            || {
                n += 1;
                Ok(0u32)
            },
            |v| *v != 0,
            &delay,
            10_000,
            12_000,
            10,
        );
        assert_eq!(ret, Err(ETIMEDOUT));
        assert_eq!(n, 10);
        assert_eq!(delay.0.lock().len(), 10);
    }

    #[test]
    fn op_errors_propagate() {
        let delay = Recorder::default();
        let ret: Result<u32> = read_poll_retries(|| Err(EIO), |_| true, &delay, 1, 2, 10);
        assert_eq!(ret, Err(EIO));
        assert!(delay.0.lock().is_empty());
    }
}
