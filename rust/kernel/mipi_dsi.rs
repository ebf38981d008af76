// SPDX-License-Identifier: GPL-2.0

//! MIPI DSI hosts and peripherals.
//!
//! C header: [`include/drm/drm_mipi_dsi.h`](srctree/include/drm/drm_mipi_dsi.h)
//!
//! A DSI host controller driver implements [`Host`] and registers it with
//! [`HostRegistration::new`]. Peripheral drivers find the host through the graph link of their
//! firmware node, register a [`Device`] on it and attach.

use crate::{
    error::{code::*, Result},
    fwnode::FwNode,
    pr_err,
    sync::{Arc, Mutex, Weak},
};
use bitflags::bitflags;

bitflags! {
    /// Peripheral operating mode, `MIPI_DSI_MODE_*`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ModeFlags: u64 {
        /// Video mode.
        const VIDEO = 1 << 0;
        /// Video burst mode.
        const VIDEO_BURST = 1 << 1;
        /// Video pulse mode.
        const VIDEO_SYNC_PULSE = 1 << 2;
        /// Enable auto vertical count mode.
        const VIDEO_AUTO_VERT = 1 << 3;
        /// Enable hsync-end packets in vsync-pulse and v-porch area.
        const VIDEO_HSE = 1 << 4;
        /// Disable EoT packets in HS mode.
        const NO_EOT_PACKET = 1 << 9;
        /// Transmit data in low power.
        const LPM = 1 << 11;
    }
}

/// Pixel format of the video stream, `enum mipi_dsi_pixel_format`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelFormat {
    #[default]
    Rgb888,
    Rgb666,
    Rgb666Packed,
    Rgb565,
}

impl PixelFormat {
    /// Bits per pixel on the link, `mipi_dsi_pixel_format_to_bpp`.
    pub const fn bpp(self) -> u32 {
        match self {
            Self::Rgb888 | Self::Rgb666 => 24,
            Self::Rgb666Packed => 18,
            Self::Rgb565 => 16,
        }
    }
}

/// Host controller callbacks, `struct mipi_dsi_host_ops`.
pub trait Host: Send + Sync {
    /// Attaches a peripheral to the host.
    fn attach(&self, dsi: &Device) -> Result;

    /// Detaches a peripheral from the host.
    fn detach(&self, dsi: &Device) -> Result;
}

struct HostEntry {
    of_node: Arc<FwNode>,
    host: Weak<dyn Host>,
}

static HOSTS: Mutex<Vec<HostEntry>> = Mutex::new(Vec::new());

/// Keeps a DSI host listed while alive, `mipi_dsi_host_register` and
/// `mipi_dsi_host_unregister`.
pub struct HostRegistration {
    of_node: Arc<FwNode>,
}

impl HostRegistration {
    /// Registers `host` as the DSI host described by `of_node`.
    pub fn new(of_node: &Arc<FwNode>, host: Weak<dyn Host>) -> Result<Self> {
        let mut hosts = HOSTS.lock();
        if hosts
            .iter()
            .any(|entry| FwNode::ptr_eq(&entry.of_node, of_node))
        {
            return Err(EBUSY);
        }
        hosts.push(HostEntry {
            of_node: of_node.clone(),
            host,
        });
        Ok(Self {
            of_node: of_node.clone(),
        })
    }
}

impl Drop for HostRegistration {
    fn drop(&mut self) {
        HOSTS
            .lock()
            .retain(|entry| !FwNode::ptr_eq(&entry.of_node, &self.of_node));
    }
}

/// Finds the DSI host registered for `node`, `of_find_mipi_dsi_host_by_node`.
pub fn of_find_host_by_node(node: &Arc<FwNode>) -> Option<Arc<dyn Host>> {
    HOSTS
        .lock()
        .iter()
        .find(|entry| FwNode::ptr_eq(&entry.of_node, node))
        .and_then(|entry| entry.host.upgrade())
}

/// Template for a DSI peripheral, `struct mipi_dsi_device_info`.
#[derive(Clone, Debug)]
pub struct DeviceInfo {
    /// Peripheral type.
    pub type_: &'static str,
    /// Virtual channel of the peripheral.
    pub channel: u32,
    /// Firmware node of the peripheral, if any.
    pub node: Option<Arc<FwNode>>,
}

/// A DSI peripheral, `struct mipi_dsi_device`.
///
/// Dropping the device unregisters it, detaching it from the host first if needed.
pub struct Device {
    host: Arc<dyn Host>,
    name: String,
    channel: u32,
    attached: bool,
    /// Number of data lanes in use.
    pub lanes: u32,
    /// Pixel format of the video stream.
    pub format: PixelFormat,
    /// Operating mode.
    pub mode_flags: ModeFlags,
}

impl Device {
    /// Registers a peripheral on `host`, `mipi_dsi_device_register_full`.
    pub fn register_full(host: &Arc<dyn Host>, info: &DeviceInfo) -> Result<Self> {
        if info.channel > 3 {
            pr_err!("invalid virtual channel: {}\n", info.channel);
            return Err(EINVAL);
        }

        Ok(Self {
            host: host.clone(),
            name: format!("{}.{}", info.type_, info.channel),
            channel: info.channel,
            attached: false,
            lanes: 0,
            format: PixelFormat::default(),
            mode_flags: ModeFlags::empty(),
        })
    }

    /// Name of the peripheral.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Virtual channel of the peripheral.
    pub fn channel(&self) -> u32 {
        self.channel
    }

    /// Returns whether the peripheral is attached to its host.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Attaches to the host, `mipi_dsi_attach`.
    pub fn attach(&mut self) -> Result {
        if self.attached {
            return Err(EBUSY);
        }
        self.host.attach(self)?;
        self.attached = true;
        Ok(())
    }

    /// Detaches from the host, `mipi_dsi_detach`.
    pub fn detach(&mut self) -> Result {
        if !self.attached {
            return Err(EINVAL);
        }
        self.attached = false;
        self.host.detach(self)
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if self.attached {
            let _ = self.detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct TestHost {
        attached: Mutex<Vec<(String, u32, PixelFormat, ModeFlags)>>,
        refuse: bool,
    }

    impl Host for TestHost {
        fn attach(&self, dsi: &Device) -> Result {
            if self.refuse {
                return Err(EINVAL);
            }
            self.attached
                .lock()
                .push((dsi.name().to_owned(), dsi.lanes, dsi.format, dsi.mode_flags));
            Ok(())
        }

        fn detach(&self, dsi: &Device) -> Result {
            self.attached.lock().retain(|(name, ..)| name != dsi.name());
            Ok(())
        }
    }

    fn info() -> DeviceInfo {
        DeviceInfo {
            type_: "sn65dsi86",
            channel: 0,
            node: None,
        }
    }

    #[test]
    fn host_lookup() {
        let node = FwNode::builder("dsi@30a00000").build();
        let host: Arc<dyn Host> = Arc::new(TestHost::default());
        assert!(of_find_host_by_node(&node).is_none());

        let reg = HostRegistration::new(&node, Arc::downgrade(&host)).unwrap();
        assert!(of_find_host_by_node(&node).is_some());
        drop(reg);
        assert!(of_find_host_by_node(&node).is_none());
    }

    #[test]
    fn attach_and_drop() {
        let test_host = Arc::new(TestHost::default());
        let host: Arc<dyn Host> = test_host.clone();

        let mut dsi = Device::register_full(&host, &info()).unwrap();
        assert_eq!(dsi.name(), "sn65dsi86.0");
        dsi.lanes = 4;
        dsi.mode_flags = ModeFlags::VIDEO | ModeFlags::VIDEO_BURST;
        dsi.attach().unwrap();
        assert!(dsi.is_attached());
        assert_eq!(dsi.attach(), Err(EBUSY));
        assert_eq!(
            test_host.attached.lock()[0],
            (
                "sn65dsi86.0".to_owned(),
                4,
                PixelFormat::Rgb888,
                ModeFlags::VIDEO | ModeFlags::VIDEO_BURST
            )
        );

        drop(dsi);
        assert!(test_host.attached.lock().is_empty());
    }

    #[test]
    fn refused_attach() {
        let host: Arc<dyn Host> = Arc::new(TestHost {
            refuse: true,
            ..Default::default()
        });
        let mut dsi = Device::register_full(&host, &info()).unwrap();
        assert_eq!(dsi.attach(), Err(EINVAL));
        assert!(!dsi.is_attached());

        let bad = DeviceInfo {
            channel: 4,
            ..info()
        };
        assert!(Device::register_full(&host, &bad).is_err());
        assert_eq!(PixelFormat::Rgb666Packed.bpp(), 18);
    }
}
