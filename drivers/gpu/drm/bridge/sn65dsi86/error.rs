// SPDX-License-Identifier: GPL-2.0

//! Error tiers of the bridge.
//!
//! [`DeviceError`] is fatal and aborts probe. [`BusError`]s met while configuring or streaming
//! are logged and counted in a [`LinkStatus`], and [`LinkWarning`]s only ever get logged: a
//! mis-programmed step leaves the picture blank rather than breaking the driver, and the next
//! hot-plug edge runs the whole sequence again.

use kernel::error::{code::*, Error};
use thiserror::Error;

/// A single register transfer failed.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("transfer at {reg:#04x} failed: {source}")]
pub struct BusError {
    /// Register address.
    pub reg: u8,
    /// Errno reported by the bus.
    pub source: Error,
}

/// Failures that keep the device from being used.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DeviceError {
    /// The soft reset register did not read back its power-on value.
    #[error("soft reset register reads {0:#04x}, device not in reset state")]
    NotReset(u8),
    /// The reset state could not be read.
    #[error(transparent)]
    Bus(#[from] BusError),
}

impl From<DeviceError> for Error {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::NotReset(_) => ENODEV,
            DeviceError::Bus(bus) => bus.source,
        }
    }
}

/// A bounded wait of the link bring-up ran out of retries.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LinkWarning {
    /// `DP_PLL_LOCK` never set.
    #[error("DP PLL did not lock")]
    PllLockTimeout,
    /// `LT_PASS` never set.
    #[error("link training did not pass")]
    TrainingTimeout,
}

/// Outcome of a best-effort link operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkStatus {
    /// The DP PLL reported lock.
    pub pll_locked: bool,
    /// Link training reported a pass.
    pub trained: bool,
    /// Register transfers that failed and were skipped.
    pub bus_errors: u32,
}

impl LinkStatus {
    /// Warnings to report for a configure run.
    pub fn warnings(&self) -> Vec<LinkWarning> {
        let mut warnings = Vec::new();
        if !self.pll_locked {
            warnings.push(LinkWarning::PllLockTimeout);
        }
        if !self.trained {
            warnings.push(LinkWarning::TrainingTimeout);
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_mapping() {
        assert_eq!(Error::from(DeviceError::NotReset(0x01)), ENODEV);
        let bus = BusError {
            reg: 0x09,
            source: EREMOTEIO,
        };
        assert_eq!(Error::from(DeviceError::from(bus)), EREMOTEIO);
        assert_eq!(
            bus.to_string(),
            format!("transfer at 0x09 failed: {}", EREMOTEIO)
        );
    }

    #[test]
    fn warnings() {
        let status = LinkStatus {
            pll_locked: true,
            ..Default::default()
        };
        assert_eq!(status.warnings(), vec![LinkWarning::TrainingTimeout]);
    }
}
