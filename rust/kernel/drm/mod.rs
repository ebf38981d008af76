// SPDX-License-Identifier: GPL-2.0

//! DRM subsystem abstractions.
//!
//! Only the pieces a display bridge plugs into are provided: display modes, connectors with
//! their encoder, and the bridge registry.

pub mod bridge;
pub mod connector;
pub mod mode;

pub use self::bridge::Bridge;
pub use self::connector::{Connector, Encoder};
pub use self::mode::Mode;
