// SPDX-License-Identifier: GPL-2.0

//! Generic devices that are part of the driver model.
//!
//! A [`Device`] is shared as `Arc<Device>` between the bus it sits on and the driver bound to
//! it. It carries the device name used to prefix log messages and the firmware node the device
//! was described by.

use crate::{
    dev_err,
    error::{code::*, Result},
    fwnode::{FwNode, Integer},
    print::{call_printk, Level},
    sync::Arc,
};
use core::fmt;

/// A device.
pub struct Device {
    name: String,
    fwnode: Option<Arc<FwNode>>,
}

impl Device {
    /// Creates a new device called `name`, optionally described by `fwnode`.
    pub fn new(name: &str, fwnode: Option<Arc<FwNode>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            fwnode,
        })
    }

    /// Name of the device, e.g. `1-002d` for an I2C client.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Firmware node describing this device, if any.
    pub fn fwnode(&self) -> Option<&Arc<FwNode>> {
        self.fwnode.as_ref()
    }

    /// Prints an emergency-level message (level 0) prefixed with device information.
    ///
    /// More details are available from [`dev_emerg`].
    ///
    /// [`dev_emerg`]: crate::dev_emerg
    pub fn pr_emerg(&self, args: fmt::Arguments<'_>) {
        self.printk(Level::Emerg, args);
    }

    /// Prints an alert-level message (level 1) prefixed with device information.
    ///
    /// More details are available from [`dev_alert`].
    ///
    /// [`dev_alert`]: crate::dev_alert
    pub fn pr_alert(&self, args: fmt::Arguments<'_>) {
        self.printk(Level::Alert, args);
    }

    /// Prints a critical-level message (level 2) prefixed with device information.
    ///
    /// More details are available from [`dev_crit`].
    ///
    /// [`dev_crit`]: crate::dev_crit
    pub fn pr_crit(&self, args: fmt::Arguments<'_>) {
        self.printk(Level::Crit, args);
    }

    /// Prints an error-level message (level 3) prefixed with device information.
    ///
    /// More details are available from [`dev_err`].
    ///
    /// [`dev_err`]: crate::dev_err
    pub fn pr_err(&self, args: fmt::Arguments<'_>) {
        self.printk(Level::Err, args);
    }

    /// Prints a warning-level message (level 4) prefixed with device information.
    ///
    /// More details are available from [`dev_warn`].
    ///
    /// [`dev_warn`]: crate::dev_warn
    pub fn pr_warn(&self, args: fmt::Arguments<'_>) {
        self.printk(Level::Warning, args);
    }

    /// Prints a notice-level message (level 5) prefixed with device information.
    ///
    /// More details are available from [`dev_notice`].
    ///
    /// [`dev_notice`]: crate::dev_notice
    pub fn pr_notice(&self, args: fmt::Arguments<'_>) {
        self.printk(Level::Notice, args);
    }

    /// Prints an info-level message (level 6) prefixed with device information.
    ///
    /// More details are available from [`dev_info`].
    ///
    /// [`dev_info`]: crate::dev_info
    pub fn pr_info(&self, args: fmt::Arguments<'_>) {
        self.printk(Level::Info, args);
    }

    /// Prints a debug-level message (level 7) prefixed with device information.
    ///
    /// More details are available from [`dev_dbg`].
    ///
    /// [`dev_dbg`]: crate::dev_dbg
    pub fn pr_dbg(&self, args: fmt::Arguments<'_>) {
        if cfg!(debug_assertions) {
            self.printk(Level::Debug, args);
        }
    }

    fn printk(&self, level: Level, msg: fmt::Arguments<'_>) {
        call_printk(level, Some(&self.name), msg);
    }

    /// Returns if a firmware property `name` is present
    pub fn property_present(&self, name: &str) -> bool {
        self.fwnode
            .as_ref()
            .is_some_and(|node| node.property_present(name))
    }

    /// Returns if a firmware property `name` is true or false
    pub fn property_read_bool(&self, name: &str) -> bool {
        self.fwnode
            .as_ref()
            .is_some_and(|node| node.property_read_bool(name))
    }

    /// Returns firmware string property `name`
    pub fn property_read_string(&self, name: &str) -> Result<String> {
        let node = self.fwnode.as_ref().ok_or(EINVAL)?;
        Ok(node.property_read_string(name)?.to_owned())
    }

    /// Returns the index of matching string `match_str` for firmware string property `name`
    pub fn property_match_string(&self, name: &str, match_str: &str) -> Result<usize> {
        self.fwnode
            .as_ref()
            .ok_or(EINVAL)?
            .property_match_string(name, match_str)
    }

    /// Returns firmware property `name` integer scalar value
    pub fn property_read<T: Integer>(&self, name: &str, default: Option<T>) -> Result<T> {
        let default = default.map(|default| [default; 1]);

        let val = Self::property_read_array(self, name, default)?;
        Ok(val[0])
    }

    /// Returns firmware property `name` integer array values
    pub fn property_read_array<T: Integer, const N: usize>(
        &self,
        name: &str,
        default: Option<[T; N]>,
    ) -> Result<[T; N]> {
        let ret = match self.fwnode.as_ref() {
            Some(node) => node.property_read_array(name, None),
            None => Err(EINVAL),
        };

        match ret {
            Ok(val) => Ok(val),
            Err(err) => match default {
                Some(default) => Ok(default),
                None => {
                    dev_err!(
                        self,
                        "'{}' property is missing and no default given.\n",
                        name
                    );
                    Err(err)
                }
            },
        }
    }

    /// Returns firmware property `name` integer array values in a Vec
    pub fn property_read_array_vec<T: Integer>(&self, name: &str, len: usize) -> Result<Vec<T>> {
        self.fwnode
            .as_ref()
            .ok_or(EINVAL)?
            .property_read_array_vec(name, len)
    }

    /// Returns integer array length for firmware property `name`
    pub fn property_count_elem(&self, name: &str) -> Result<usize> {
        self.fwnode
            .as_ref()
            .ok_or(EINVAL)?
            .property_count_elem(name)
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device").field("name", &self.name).finish()
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! dev_printk {
    ($method:ident, $dev:expr, $($f:tt)*) => {
        {
            ($dev).$method(core::format_args!($($f)*));
        }
    }
}

/// Prints an emergency-level message (level 0) prefixed with device information.
///
/// This level should be used if the system is unusable.
///
/// Equivalent to the kernel's `dev_emerg` macro.
#[macro_export]
macro_rules! dev_emerg {
    ($($f:tt)*) => { $crate::dev_printk!(pr_emerg, $($f)*); }
}

/// Prints an alert-level message (level 1) prefixed with device information.
///
/// This level should be used if action must be taken immediately.
#[macro_export]
macro_rules! dev_alert {
    ($($f:tt)*) => { $crate::dev_printk!(pr_alert, $($f)*); }
}

/// Prints a critical-level message (level 2) prefixed with device information.
#[macro_export]
macro_rules! dev_crit {
    ($($f:tt)*) => { $crate::dev_printk!(pr_crit, $($f)*); }
}

/// Prints an error-level message (level 3) prefixed with device information.
///
/// This level should be used in error conditions.
///
/// Equivalent to the kernel's `dev_err` macro.
///
/// Mimics the interface of [`std::print!`]. More information about the syntax is available from
/// [`core::fmt`] and `alloc::format!`.
///
/// # Examples
///
/// ```
/// # use kernel::{dev_err, device::Device};
/// let dev = Device::new("1-002d", None);
/// dev_err!(dev, "hello {}\n", "there");
/// ```
#[macro_export]
macro_rules! dev_err {
    ($($f:tt)*) => { $crate::dev_printk!(pr_err, $($f)*); }
}

/// Prints a warning-level message (level 4) prefixed with device information.
///
/// This level should be used in warning conditions.
#[macro_export]
macro_rules! dev_warn {
    ($($f:tt)*) => { $crate::dev_printk!(pr_warn, $($f)*); }
}

/// Prints a notice-level message (level 5) prefixed with device information.
#[macro_export]
macro_rules! dev_notice {
    ($($f:tt)*) => { $crate::dev_printk!(pr_notice, $($f)*); }
}

/// Prints an info-level message (level 6) prefixed with device information.
///
/// This level should be used for informational messages.
///
/// Equivalent to the kernel's `dev_info` macro.
#[macro_export]
macro_rules! dev_info {
    ($($f:tt)*) => { $crate::dev_printk!(pr_info, $($f)*); }
}

/// Prints a debug-level message (level 7) prefixed with device information.
///
/// Equivalent to the kernel's `dev_dbg` macro, except that it doesn't support dynamic debug yet.
#[macro_export]
macro_rules! dev_dbg {
    ($($f:tt)*) => { $crate::dev_printk!(pr_dbg, $($f)*); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_without_fwnode_fall_back() {
        let dev = Device::new("1-002d", None);
        assert_eq!(dev.name(), "1-002d");
        assert!(!dev.property_present("ti,dsi-lanes"));
        assert_eq!(dev.property_read::<u32>("ti,dsi-lanes", Some(2)), Ok(2));
        assert_eq!(dev.property_read::<u32>("ti,dsi-lanes", None), Err(EINVAL));
        assert_eq!(dev.property_read_string("compatible"), Err(EINVAL));
    }

    #[test]
    fn properties_from_fwnode() {
        let node = FwNode::builder("bridge")
            .u32("ti,dsi-lanes", 4)
            .flag("ti,burst-mode")
            .string("compatible", "ti,sn65dsi86")
            .build();
        let dev = Device::new("1-002d", Some(node));

        assert_eq!(dev.property_read::<u32>("ti,dsi-lanes", Some(2)), Ok(4));
        assert!(dev.property_read_bool("ti,burst-mode"));
        assert_eq!(dev.property_read_string("compatible").as_deref(), Ok("ti,sn65dsi86"));
        assert_eq!(dev.property_count_elem("ti,dsi-lanes"), Ok(1));
        dev_info!(dev, "lanes {}\n", 4);
    }
}
