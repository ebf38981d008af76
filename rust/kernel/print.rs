// SPDX-License-Identifier: GPL-2.0

//! Printing facilities.
//!
//! Messages are forwarded to the [`log`] facade, so whoever hosts the drivers decides where they
//! end up by installing a logger. The kernel log levels are folded onto the five `log` levels:
//! emergency, alert, critical and error become [`log::Level::Error`], notice becomes
//! [`log::Level::Info`].

use core::fmt;

/// Kernel log levels, most severe first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// System is unusable.
    Emerg,
    /// Action must be taken immediately.
    Alert,
    /// Critical conditions.
    Crit,
    /// Error conditions.
    Err,
    /// Warning conditions.
    Warning,
    /// Normal but significant condition.
    Notice,
    /// Informational.
    Info,
    /// Debug-level messages.
    Debug,
}

impl From<Level> for log::Level {
    fn from(level: Level) -> Self {
        match level {
            Level::Emerg | Level::Alert | Level::Crit | Level::Err => log::Level::Error,
            Level::Warning => log::Level::Warn,
            Level::Notice | Level::Info => log::Level::Info,
            Level::Debug => log::Level::Debug,
        }
    }
}

/// Prints a message, optionally prefixed with `prefix`.
///
/// Public but hidden since it should only be used from the public macros and from
/// [`crate::device::Device`].
#[doc(hidden)]
pub fn call_printk(level: Level, prefix: Option<&str>, args: fmt::Arguments<'_>) {
    let level = log::Level::from(level);
    if level > log::max_level() {
        return;
    }

    // Messages follow the kernel convention of a trailing newline, the `log` facade adds its own.
    let msg = args.to_string();
    let msg = msg.trim_end_matches('\n');
    match prefix {
        Some(prefix) => log::log!(level, "{}: {}", prefix, msg),
        None => log::log!(level, "{}", msg),
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! print_macro {
    ($level:ident, $($arg:tt)+) => {
        $crate::print::call_printk(
            $crate::print::Level::$level,
            None,
            core::format_args!($($arg)+),
        )
    };
}

/// Prints an emergency-level message (level 0).
///
/// Equivalent to the kernel's [`pr_emerg`] macro.
///
/// [`pr_emerg`]: https://docs.kernel.org/core-api/printk-basics.html#c.pr_emerg
#[macro_export]
macro_rules! pr_emerg (
    ($($arg:tt)*) => ($crate::print_macro!(Emerg, $($arg)*))
);

/// Prints an alert-level message (level 1).
#[macro_export]
macro_rules! pr_alert (
    ($($arg:tt)*) => ($crate::print_macro!(Alert, $($arg)*))
);

/// Prints a critical-level message (level 2).
#[macro_export]
macro_rules! pr_crit (
    ($($arg:tt)*) => ($crate::print_macro!(Crit, $($arg)*))
);

/// Prints an error-level message (level 3).
///
/// Use this level for error conditions.
#[macro_export]
macro_rules! pr_err (
    ($($arg:tt)*) => ($crate::print_macro!(Err, $($arg)*))
);

/// Prints a warning-level message (level 4).
#[macro_export]
macro_rules! pr_warn (
    ($($arg:tt)*) => ($crate::print_macro!(Warning, $($arg)*))
);

/// Prints a notice-level message (level 5).
#[macro_export]
macro_rules! pr_notice (
    ($($arg:tt)*) => ($crate::print_macro!(Notice, $($arg)*))
);

/// Prints an info-level message (level 6).
#[macro_export]
macro_rules! pr_info (
    ($($arg:tt)*) => ($crate::print_macro!(Info, $($arg)*))
);

/// Prints a debug-level message (level 7).
///
/// Compiled out unless `debug_assertions` are enabled, like a kernel built without `DEBUG`.
#[macro_export]
macro_rules! pr_debug (
    ($($arg:tt)*) => (
        if cfg!(debug_assertions) {
            $crate::print_macro!(Debug, $($arg)*)
        }
    )
);

#[cfg(test)]
mod tests {
    use super::Level;

    #[test]
    fn levels_fold_onto_log() {
        assert_eq!(log::Level::from(Level::Crit), log::Level::Error);
        assert_eq!(log::Level::from(Level::Warning), log::Level::Warn);
        assert_eq!(log::Level::from(Level::Notice), log::Level::Info);
        assert_eq!(log::Level::from(Level::Debug), log::Level::Debug);
        assert!(Level::Emerg < Level::Debug);
    }
}
