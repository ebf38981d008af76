// SPDX-License-Identifier: GPL-2.0

//! Connectors and encoders.
//!
//! C header: [`include/drm/drm_connector.h`](srctree/include/drm/drm_connector.h)

use super::mode::{DisplayInfo, Mode, ModeStatus};
use crate::sync::{Arc, Mutex};
use bitflags::bitflags;

/// Connection state of a connector, `enum drm_connector_status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// A sink is connected.
    Connected,
    /// No sink is connected.
    Disconnected,
    /// The state could not be determined.
    Unknown,
}

/// Type of a connector, `DRM_MODE_CONNECTOR_*`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Type {
    Unknown = 0,
    DisplayPort = 10,
    Edp = 14,
    Dsi = 16,
}

bitflags! {
    /// How a connector gets polled, `DRM_CONNECTOR_POLL_*`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Polled: u8 {
        /// Hot-plug interrupts are available.
        const HPD = 1 << 0;
        /// Poll for connections.
        const CONNECT = 1 << 1;
        /// Poll for disconnections.
        const DISCONNECT = 1 << 2;
    }
}

/// Connector callbacks, the union of `drm_connector_funcs` and `drm_connector_helper_funcs`
/// that a bridge driver provides.
pub trait Funcs: Send + Sync {
    /// Reports whether a sink is connected.
    fn detect(&self, force: bool) -> Status;

    /// Adds the modes of the sink to `modes` and fills in `info`, returning the number of modes
    /// added.
    fn get_modes(&self, info: &mut DisplayInfo, modes: &mut Vec<Mode>) -> usize;

    /// Checks whether `mode` can be driven.
    fn mode_valid(&self, _mode: &Mode) -> ModeStatus {
        ModeStatus::Ok
    }
}

struct State {
    status: Status,
    modes: Vec<Mode>,
    display_info: DisplayInfo,
}

/// A connector, `struct drm_connector`.
pub struct Connector {
    name: String,
    connector_type: Type,
    polled: Polled,
    funcs: Arc<dyn Funcs>,
    state: Mutex<State>,
}

impl Connector {
    /// Initialises a connector, `drm_connector_init` plus `drm_connector_helper_add`.
    pub fn new(name: &str, connector_type: Type, polled: Polled, funcs: Arc<dyn Funcs>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            connector_type,
            polled,
            funcs,
            state: Mutex::new(State {
                status: Status::Unknown,
                modes: Vec::new(),
                display_info: DisplayInfo::default(),
            }),
        })
    }

    /// Name of the connector.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type of the connector.
    pub fn connector_type(&self) -> Type {
        self.connector_type
    }

    /// Polling mode of the connector.
    pub fn polled(&self) -> Polled {
        self.polled
    }

    /// Last detected connection state.
    pub fn status(&self) -> Status {
        self.state.lock().status
    }

    /// Runs detection and records the result.
    pub fn detect(&self, force: bool) -> Status {
        let status = self.funcs.detect(force);
        self.state.lock().status = status;
        status
    }

    /// Probes the connector, the equivalent of `drm_helper_probe_single_connector_modes`.
    ///
    /// Detects the sink and, when connected, collects its modes and drops those
    /// [`Funcs::mode_valid`] rejects. Returns the number of usable modes.
    pub fn fill_modes(&self) -> usize {
        let status = self.detect(true);

        let mut info = DisplayInfo::default();
        let mut modes = Vec::new();
        if status != Status::Disconnected {
            self.funcs.get_modes(&mut info, &mut modes);
        }
        modes.retain(|mode| self.funcs.mode_valid(mode) == ModeStatus::Ok);

        let count = modes.len();
        let mut state = self.state.lock();
        state.modes = modes;
        state.display_info = info;
        count
    }

    /// Modes found by the last [`Connector::fill_modes`].
    pub fn modes(&self) -> Vec<Mode> {
        self.state.lock().modes.clone()
    }

    /// Display information found by the last [`Connector::fill_modes`].
    pub fn display_info(&self) -> DisplayInfo {
        self.state.lock().display_info.clone()
    }
}

/// An encoder, `struct drm_encoder`.
pub struct Encoder {
    name: String,
    connectors: Mutex<Vec<Arc<Connector>>>,
}

impl Encoder {
    /// Creates an encoder.
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            connectors: Mutex::new(Vec::new()),
        })
    }

    /// Name of the encoder.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attaches `connector` to the encoder, `drm_connector_attach_encoder`.
    pub fn attach_connector(&self, connector: Arc<Connector>) {
        self.connectors.lock().push(connector);
    }

    /// Connectors attached to the encoder.
    pub fn connectors(&self) -> Vec<Arc<Connector>> {
        self.connectors.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Panel {
        status: Status,
    }

    impl Funcs for Panel {
        fn detect(&self, _force: bool) -> Status {
            self.status
        }

        fn get_modes(&self, info: &mut DisplayInfo, modes: &mut Vec<Mode>) -> usize {
            info.width_mm = 149;
            for clock in [60_000, 90_000] {
                modes.push(Mode {
                    clock,
                    ..Default::default()
                });
            }
            2
        }

        fn mode_valid(&self, mode: &Mode) -> ModeStatus {
            if mode.clock > 60_000 {
                ModeStatus::ClockHigh
            } else {
                ModeStatus::Ok
            }
        }
    }

    #[test]
    fn fill_modes_filters_invalid_modes() {
        let connector = Connector::new(
            "DSI-1",
            Type::Dsi,
            Polled::CONNECT | Polled::DISCONNECT,
            Arc::new(Panel {
                status: Status::Connected,
            }),
        );
        assert_eq!(connector.status(), Status::Unknown);
        assert_eq!(connector.fill_modes(), 1);
        assert_eq!(connector.status(), Status::Connected);
        assert_eq!(connector.modes()[0].clock, 60_000);
        assert_eq!(connector.display_info().width_mm, 149);

        let encoder = Encoder::new("DSI-0");
        encoder.attach_connector(connector.clone());
        assert_eq!(encoder.connectors().len(), 1);
    }

    #[test]
    fn disconnected_connector_has_no_modes() {
        let connector = Connector::new(
            "DSI-1",
            Type::Dsi,
            Polled::empty(),
            Arc::new(Panel {
                status: Status::Disconnected,
            }),
        );
        assert_eq!(connector.fill_modes(), 0);
        assert!(connector.modes().is_empty());
    }
}
