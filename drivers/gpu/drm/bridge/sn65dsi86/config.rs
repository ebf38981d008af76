// SPDX-License-Identifier: GPL-2.0

//! Static configuration of a bridge, read from its device node at probe.

use crate::timing::PANEL_DEFAULT_TIMING;
use kernel::{
    device::Device,
    fwnode::FwNode,
    prelude::*,
    sync::Arc,
    video::{self, DisplayFlags, VideoMode},
};

/// Panel and link parameters of one bridge.
#[derive(Clone, Debug)]
pub struct BrgConfig {
    /// DSI host at the other end of the graph link.
    pub host_node: Arc<FwNode>,
    /// DSI data lanes, 1 to 4.
    pub dsi_lanes: u8,
    /// DisplayPort main link lanes, 1, 2 or 4.
    pub dp_lanes: u8,
    /// DSI channels feeding the bridge, 1 or 2.
    pub channels: u8,
    /// Bits per pixel on the DisplayPort side.
    pub bpp: u32,
    /// DisplayPort pixel format selector.
    pub format: u32,
    /// Physical panel width in millimeters.
    pub width_mm: u32,
    /// Physical panel height in millimeters.
    pub height_mm: u32,
    /// The DSI host sends video in burst mode.
    pub burst_mode: bool,
    /// Data-enable is active low.
    pub de_neg_polarity: bool,
    /// The one mode the panel is driven with.
    pub vm: VideoMode,
}

impl BrgConfig {
    /// Parses the configuration of `dev`.
    pub fn parse(dev: &Device) -> Result<Self> {
        let np = dev.fwnode().ok_or(EINVAL)?;

        let endpoint = np.graph_get_next_endpoint().ok_or(ENODEV)?;
        let host_node = endpoint
            .property_read_reference("remote-endpoint")
            .map_err(|_| ENODEV)?;

        let dsi_lanes = np.property_read::<u32>("ti,dsi-lanes", Some(2))?;
        let format = np.property_read::<u32>("ti,dp-format", Some(2))?;
        let bpp = np.property_read::<u32>("ti,dp-bpp", Some(24))?;
        let width_mm = np.property_read::<u32>("ti,width-mm", Some(149))?;
        let height_mm = np.property_read::<u32>("ti,height-mm", Some(93))?;
        let dp_lanes = np.property_read::<u32>("ti,dp-lanes", Some(2))?;
        let burst_mode = np.property_read_bool("ti,burst-mode");
        let de_neg_polarity = np.property_read_bool("ti,de-neg-polarity");

        if !(1..=4).contains(&dsi_lanes) {
            dev_err!(dev, "Invalid dsi-lanes: {}\n", dsi_lanes);
            return Err(EINVAL);
        }

        if !matches!(dp_lanes, 1 | 2 | 4) {
            dev_err!(dev, "Invalid dp-lanes: {}\n", dp_lanes);
            return Err(EINVAL);
        }

        let channels = match np.property_read::<u32>("ti,dp-channels", None) {
            Err(_) => {
                dev_info!(dev, "dp-channels property not found, using default\n");
                1
            }
            Ok(n @ 1..=2) => n,
            Ok(n) => {
                dev_err!(dev, "dp-channels must be 1 or 2, not {}\n", n);
                return Err(EINVAL);
            }
        };

        let mut vm = video::of_get_videomode(np, None).unwrap_or_else(|_| {
            dev_dbg!(dev, "no display timings, using default 1024x768\n");
            VideoMode::from(&PANEL_DEFAULT_TIMING)
        });
        if de_neg_polarity {
            vm.flags.remove(DisplayFlags::DE_HIGH);
            vm.flags.insert(DisplayFlags::DE_LOW);
        }

        Ok(Self {
            host_node,
            dsi_lanes: dsi_lanes as u8,
            dp_lanes: dp_lanes as u8,
            channels: channels as u8,
            bpp,
            format,
            width_mm,
            height_mm,
            burst_mode,
            de_neg_polarity,
            vm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(node: Arc<FwNode>) -> Result<BrgConfig> {
        BrgConfig::parse(&Device::new("i2c-1-002d", Some(node)))
    }

    fn timings() -> Arc<FwNode> {
        let t = FwNode::builder("timing0")
            .u32("clock-frequency", 148_500_000)
            .u32("hactive", 1920)
            .u32("vactive", 1080)
            .u32("hfront-porch", 88)
            .u32("hback-porch", 148)
            .u32("hsync-len", 44)
            .u32("vfront-porch", 4)
            .u32("vback-porch", 36)
            .u32("vsync-len", 5)
            .u32("de-active", 1)
            .build();
        FwNode::builder("display-timings").child(t).build()
    }

    #[test]
    fn defaults() {
        let host = FwNode::builder("dsi").build();
        let cfg = parse(FwNode::builder("bridge@2d").graph_link(&host).build()).unwrap();

        assert!(FwNode::ptr_eq(&cfg.host_node, &host));
        assert_eq!(
            (cfg.dsi_lanes, cfg.dp_lanes, cfg.channels, cfg.bpp, cfg.format),
            (2, 2, 1, 24, 2)
        );
        assert_eq!((cfg.width_mm, cfg.height_mm), (149, 93));
        assert!(!cfg.burst_mode && !cfg.de_neg_polarity);

        let vm = cfg.vm;
        assert_eq!((vm.pixelclock, vm.hactive, vm.vactive), (60_000_000, 1024, 768));
        assert_eq!((vm.hfront_porch, vm.hback_porch, vm.hsync_len), (160, 160, 1));
        assert_eq!((vm.vfront_porch, vm.vback_porch, vm.vsync_len), (15, 23, 1));
        assert_eq!(
            vm.flags,
            DisplayFlags::HSYNC_LOW
                | DisplayFlags::VSYNC_LOW
                | DisplayFlags::DE_LOW
                | DisplayFlags::PIXDATA_NEGEDGE
        );
    }

    #[test]
    fn from_properties() {
        let host = FwNode::builder("dsi").build();
        let cfg = parse(
            FwNode::builder("bridge@2d")
                .u32("ti,dsi-lanes", 4)
                .u32("ti,dp-lanes", 4)
                .u32("ti,dp-channels", 2)
                .u32("ti,dp-bpp", 18)
                .u32("ti,width-mm", 344)
                .flag("ti,burst-mode")
                .flag("ti,de-neg-polarity")
                .graph_link(&host)
                .child(timings())
                .build(),
        )
        .unwrap();

        assert_eq!((cfg.dsi_lanes, cfg.dp_lanes, cfg.channels, cfg.bpp), (4, 4, 2, 18));
        assert_eq!(cfg.width_mm, 344);
        assert!(cfg.burst_mode);
        assert_eq!(cfg.vm.hactive, 1920);
        assert!(cfg.vm.flags.contains(DisplayFlags::DE_LOW));
        assert!(!cfg.vm.flags.contains(DisplayFlags::DE_HIGH));
    }

    #[test]
    fn invalid_values() {
        let host = FwNode::builder("dsi").build();
        let bridge = |name: &str, val: u32| {
            FwNode::builder("bridge@2d")
                .u32(name, val)
                .graph_link(&host)
                .build()
        };

        assert_eq!(parse(bridge("ti,dsi-lanes", 0)).err(), Some(EINVAL));
        assert_eq!(parse(bridge("ti,dsi-lanes", 5)).err(), Some(EINVAL));
        assert_eq!(parse(bridge("ti,dp-lanes", 3)).err(), Some(EINVAL));
        assert_eq!(parse(bridge("ti,dp-channels", 3)).err(), Some(EINVAL));
        assert_eq!(parse(bridge("ti,dp-channels", 0)).err(), Some(EINVAL));
    }

    #[test]
    fn missing_link() {
        assert_eq!(parse(FwNode::builder("bridge@2d").build()).err(), Some(ENODEV));
        assert_eq!(
            BrgConfig::parse(&Device::new("i2c-1-002d", None)).err(),
            Some(EINVAL)
        );
    }
}
