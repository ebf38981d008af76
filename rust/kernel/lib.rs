// SPDX-License-Identifier: GPL-2.0

//! The `kernel` crate.
//!
//! This crate contains the driver-model abstractions used by the bridge chip drivers in this tree:
//! devices and their firmware properties, the I2C bus, register maps, sleeping and polling
//! helpers, work queues, and the DRM bridge/connector and MIPI DSI interfaces a display bridge
//! plugs into.
//!
//! Hardware access is funnelled through small traits ([`i2c::Algorithm`], [`delay::Delay`],
//! [`mipi_dsi::Host`]) so the platform providing them can be swapped, e.g. for an in-memory
//! register file in unit tests.

pub mod bits;
pub mod delay;
pub mod device;
pub mod drm;
pub mod error;
pub mod fwnode;
pub mod i2c;
pub mod io;
pub mod mipi_dsi;
pub mod of;
pub mod prelude;
pub mod print;
pub mod regmap;
pub mod static_assert;
pub mod sync;
pub mod video;
pub mod workqueue;

#[doc(hidden)]
pub mod macros {
    pub use paste::paste;
}

#[doc(hidden)]
pub use log;

/// Metadata of a loadable driver module.
///
/// Created by the `module_*_driver!` macros.
pub struct ThisModule {
    name: &'static str,
    authors: &'static [&'static str],
    description: &'static str,
    license: &'static str,
}

impl ThisModule {
    /// Create the module metadata.
    pub const fn new(
        name: &'static str,
        authors: &'static [&'static str],
        description: &'static str,
        license: &'static str,
    ) -> Self {
        Self {
            name,
            authors,
            description,
            license,
        }
    }

    /// Name of the module.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Authors of the module.
    pub const fn authors(&self) -> &'static [&'static str] {
        self.authors
    }

    /// One-line description of the module.
    pub const fn description(&self) -> &'static str {
        self.description
    }

    /// License of the module.
    pub const fn license(&self) -> &'static str {
        self.license
    }
}
