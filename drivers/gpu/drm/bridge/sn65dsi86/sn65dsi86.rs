// SPDX-License-Identifier: GPL-2.0

//! Driver for the TI SN65DSI86 MIPI DSI to eDP bridge
//!
//! Datasheet: https://www.ti.com/lit/ds/symlink/sn65dsi86.pdf
//!
//! The panel mode is fixed at probe from the device node. Hot-plug is polled: the link is
//! programmed and trained whenever a sink shows up, and the stream is stopped when it goes away.

use kernel::{
    delay::{Delay, SystemDelay},
    drm::{
        bridge,
        connector::{self, Connector, Encoder, Polled, Status},
        mode::{self, DisplayInfo, Mode, ModeStatus, ModeType},
    },
    i2c,
    mipi_dsi::{self, ModeFlags, PixelFormat},
    of,
    prelude::*,
    regmap,
    sync::{Arc, Mutex, Weak},
};

pub mod brg;
pub mod config;
pub mod error;
pub mod hpd;
mod timing;

#[cfg(test)]
mod test_util;

use brg::{Brg, BrgOps};
use config::BrgConfig;
use hpd::HpdStatus;

kernel::module_i2c_driver! {
    type: Sn65dsi86,
    name: "sn65dsi86",
    authors: ["CompuLab <compulab@compula.co.il>"],
    description: "SN65DSI bridge driver",
    license: "GPL",
}

kernel::i2c_device_table!(
    I2C_ID_TABLE,
    <Sn65dsi86 as i2c::Driver>::IdInfo,
    [(i2c::DeviceId::new("sn65dsi86"), ()),]
);

kernel::of_device_table!(
    OF_ID_TABLE,
    <Sn65dsi86 as i2c::Driver>::IdInfo,
    [(of::DeviceId::new("ti,sn65dsi86"), ()),]
);

regmap::define_regmap_field_descs!(FIELD_DESCS, {
    (device_rev, 0x08, READ, { value => raw([7:0], ro) }),
    (soft_reset, 0x09, RW | VOLATILE, { value => raw([7:0], rw) }),
    (pll_refclk_cfg, 0x0a, RW | VOLATILE, {
        refclk => enum([3:1], rw, {
            Clk12MHz = 0x0,
            Clk19p2MHz = 0x1,
            Clk26MHz = 0x2,
            Clk27MHz = 0x3,
            Clk38p4MHz = 0x4,
        }),
        dp_pll_lock => bit(7, ro),
    }),
    (pll_en, 0x0d, RW, { dp_pll_en => bit(0, rw) }),
    (dsi_cfg1, 0x10, RW, {
        chan_mode => enum([6:5], rw, {
            Dual = 0x0,
            Single = 0x1,
        }),
        cha_dsi_lanes => raw([4:3], rw),
        chb_dsi_lanes => raw([2:1], rw),
    }),
    (dsi_cha_clk_range, 0x12, RW, { value => raw([7:0], rw) }),
    (dsi_chb_clk_range, 0x13, RW, { value => raw([7:0], rw) }),
    (page_select, 0x16, RW, { value => raw([7:0], rw) }),
    (cha_active_line_length_low, 0x20, RW, { value => raw([7:0], rw) }),
    (cha_active_line_length_high, 0x21, RW, { value => raw([7:0], rw) }),
    (chb_active_line_length_low, 0x22, RW, { value => raw([7:0], rw) }),
    (chb_active_line_length_high, 0x23, RW, { value => raw([7:0], rw) }),
    (cha_vertical_display_size_low, 0x24, RW, { value => raw([7:0], rw) }),
    (cha_vertical_display_size_high, 0x25, RW, { value => raw([7:0], rw) }),
    (cha_hsync_pulse_width_low, 0x2c, RW, { value => raw([7:0], rw) }),
    (cha_hsync_pulse_width_high, 0x2d, RW, {
        value => raw([6:0], rw),
        hsync_low => bit(7, rw),
    }),
    (cha_vsync_pulse_width_low, 0x30, RW, { value => raw([7:0], rw) }),
    (cha_vsync_pulse_width_high, 0x31, RW, {
        value => raw([6:0], rw),
        vsync_low => bit(7, rw),
    }),
    (cha_horizontal_back_porch, 0x34, RW, { value => raw([7:0], rw) }),
    (cha_vertical_back_porch, 0x36, RW, { value => raw([7:0], rw) }),
    (cha_horizontal_front_porch, 0x38, RW, { value => raw([7:0], rw) }),
    (cha_vertical_front_porch, 0x3a, RW, { value => raw([7:0], rw) }),
    (color_bar_cfg, 0x3c, RW, { value => raw([7:0], rw) }),
    (framing_cfg, 0x5a, RW, {
        enh_frame_en => bit(2, rw),
        vstream_en => bit(3, rw),
    }),
    (dp_data_format, 0x5b, RW, { bpp_18_rgb => bit(0, rw) }),
    (hpd_cfg, 0x5c, RW | VOLATILE, { hpd => bit(4, ro) }),
    (dp_ssc_cfg, 0x93, RW, { dp_num_lanes => raw([5:4], rw) }),
    (dp_cfg, 0x94, RW, {
        dp_datarate => enum([7:5], rw, {
            Rbr = 0x1,
            Rate2p16 = 0x2,
            Rate2p43 = 0x3,
            Hbr = 0x4,
            Rate3p24 = 0x5,
            Rate4p32 = 0x6,
            Hbr2 = 0x7,
        }),
    }),
    (ml_tx_mode, 0x96, RW | VOLATILE, { value => raw([7:0], rw) }),
    (irq_status0, 0xf0, RW | VOLATILE, { value => raw([7:0], rw) }),
    (irq_status1, 0xf1, RW | VOLATILE, { value => raw([7:0], rw) }),
    (irq_status2, 0xf2, RW | VOLATILE, { value => raw([7:0], rw) }),
    (irq_status3, 0xf3, RW | VOLATILE, { value => raw([7:0], rw) }),
    (irq_status4, 0xf4, RW | VOLATILE, { value => raw([7:0], rw) }),
    (irq_status5, 0xf5, RW | VOLATILE, { value => raw([7:0], rw) }),
    (irq_status6, 0xf6, RW | VOLATILE, { value => raw([7:0], rw) }),
    (irq_status7, 0xf7, RW | VOLATILE, { value => raw([7:0], rw) }),
    (irq_status8, 0xf8, RW | VOLATILE, { lt_pass => bit(0, ro) }),
    (aux_rw_control, 0xff, RW, { value => raw([7:0], rw) })
});

/// Typed accessors to the registers of one chip.
pub type Sn65Fields = regmap::Fields<{ FIELD_DESCS.len() }>;

/// Maps the registers of `client`.
pub(crate) fn init_fields(client: &i2c::Client) -> Result<Sn65Fields> {
    let config = regmap::Config::<register::AccessOps>::new(8, 8)
        .with_max_register(0xff)
        .with_cache_type(regmap::CacheType::RbTree);
    let regmap = Arc::new(regmap::Regmap::init_i2c(client, &config)?);
    regmap::Fields::new(&regmap, &FIELD_DESCS)
}

/// The DRM side of the bridge: its bridge and connector callbacks.
pub struct Sn65dsi86Bridge {
    brg: Arc<Brg>,
    dsi: Mutex<Option<mipi_dsi::Device>>,
    adjusted_mode: Mutex<Option<Mode>>,
    this: Weak<Sn65dsi86Bridge>,
}

impl Sn65dsi86Bridge {
    fn new(brg: Arc<Brg>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            brg,
            dsi: Mutex::new(None),
            adjusted_mode: Mutex::new(None),
            this: this.clone(),
        })
    }

    /// The chip behind the bridge.
    pub fn brg(&self) -> &Arc<Brg> {
        &self.brg
    }

    /// The mode last passed to `mode_set`.
    pub fn adjusted_mode(&self) -> Option<Mode> {
        self.adjusted_mode.lock().clone()
    }

    /// Returns whether the DSI peripheral is attached to its host.
    pub fn dsi_attached(&self) -> bool {
        self.dsi
            .lock()
            .as_ref()
            .map_or(false, mipi_dsi::Device::is_attached)
    }

    fn attach_dsi(&self) -> Result {
        let cfg = self.brg.config();
        let dev = self.brg.device();

        let host = mipi_dsi::of_find_host_by_node(&cfg.host_node).ok_or_else(|| {
            dev_err!(dev, "failed to find dsi host\n");
            EPROBE_DEFER
        })?;

        let info = mipi_dsi::DeviceInfo {
            type_: "sn65dsi86",
            channel: 0,
            node: None,
        };
        let mut dsi = mipi_dsi::Device::register_full(&host, &info).map_err(|_| {
            dev_err!(dev, "failed to create dsi device\n");
            ENODEV
        })?;

        dsi.lanes = u32::from(cfg.dsi_lanes);
        dsi.format = PixelFormat::Rgb888;
        dsi.mode_flags = ModeFlags::VIDEO
            | if cfg.burst_mode {
                ModeFlags::VIDEO_BURST
            } else {
                ModeFlags::VIDEO_SYNC_PULSE
            };

        if let Err(e) = dsi.attach() {
            dev_err!(dev, "failed to attach dsi to host\n");
            return Err(e);
        }

        *self.dsi.lock() = Some(dsi);
        Ok(())
    }

    fn detach_dsi(&self) {
        if let Some(mut dsi) = self.dsi.lock().take() {
            if dsi.is_attached() {
                let _ = dsi.detach();
            }
        }
    }
}

impl bridge::Funcs for Sn65dsi86Bridge {
    fn attach(&self, encoder: Option<&Arc<Encoder>>) -> Result {
        let dev = self.brg.device();
        dev_dbg!(dev, "attach\n");

        let encoder = encoder.ok_or_else(|| {
            dev_err!(dev, "Parent encoder object not found\n");
            ENODEV
        })?;

        let funcs: Arc<dyn connector::Funcs> = self.this.upgrade().ok_or(ENODEV)?;
        let connector = Connector::new(
            "DSI-1",
            connector::Type::Dsi,
            Polled::CONNECT | Polled::DISCONNECT,
            funcs,
        );
        encoder.attach_connector(connector);

        self.attach_dsi()
    }

    fn detach(&self) {
        dev_dbg!(self.brg.device(), "detach\n");
        self.detach_dsi();
    }

    fn enable(&self) {
        dev_dbg!(self.brg.device(), "enable\n");
    }

    fn disable(&self) {
        dev_dbg!(self.brg.device(), "disable\n");
    }

    fn mode_set(&self, _mode: &Mode, adjusted_mode: &Mode) {
        dev_dbg!(self.brg.device(), "mode_set {}\n", adjusted_mode.name);
        *self.adjusted_mode.lock() = Some(adjusted_mode.clone());
    }
}

impl connector::Funcs for Sn65dsi86Bridge {
    fn detect(&self, _force: bool) -> Status {
        match self.brg.hpd_detect() {
            HpdStatus::Connected => Status::Connected,
            HpdStatus::Disconnected | HpdStatus::Unknown => Status::Disconnected,
        }
    }

    fn get_modes(&self, info: &mut DisplayInfo, modes: &mut Vec<Mode>) -> usize {
        let cfg = self.brg.config();

        let mut mode = Mode::from_videomode(&cfg.vm);
        mode.type_ = ModeType::DRIVER | ModeType::PREFERRED;
        mode.width_mm = cfg.width_mm;
        mode.height_mm = cfg.height_mm;
        modes.push(mode);

        info.width_mm = cfg.width_mm;
        info.height_mm = cfg.height_mm;
        info.bus_flags = mode::bus_flags_from_videomode(&cfg.vm);
        info.set_bus_formats(&[mode::MEDIA_BUS_FMT_RGB888_1X24]);

        1
    }

    fn mode_valid(&self, mode: &Mode) -> ModeStatus {
        if u64::from(mode.clock) > self.brg.config().vm.pixelclock / 1000 {
            return ModeStatus::ClockHigh;
        }
        ModeStatus::Ok
    }
}

/// Driver data of a bound SN65DSI86.
pub struct Sn65dsi86 {
    bridge: Arc<Sn65dsi86Bridge>,
    registration: Option<bridge::Registration>,
}

impl Sn65dsi86 {
    /// Probes `client`, sleeping through `delay`.
    pub fn probe_with_delay(client: &i2c::Client, delay: Arc<dyn Delay>) -> Result<Pin<Box<Self>>> {
        let dev = client.device();
        dev_dbg!(dev, "probe\n");

        let np = dev.fwnode().cloned().ok_or_else(|| {
            dev_err!(dev, "no device node\n");
            EINVAL
        })?;

        let cfg = BrgConfig::parse(&dev)?;
        let fields = init_fields(client)?;
        let brg = Brg::new(dev.clone(), fields, cfg, delay);

        brg.power_off();
        if let Err(e) = brg.reset() {
            dev_err!(dev, "failed to reset the device: {}\n", e);
            return Err(ENODEV);
        }

        match brg.revision() {
            Ok(rev) => {
                dev_info!(dev, "SN65DSI86 revision {:#04x}\n", rev);
            }
            Err(e) => {
                dev_warn!(dev, "unknown revision: {}\n", e);
            }
        }

        brg.power_on()?;
        brg.power_off();

        let bridge = Sn65dsi86Bridge::new(brg);
        let funcs = Arc::downgrade(&bridge) as Weak<dyn bridge::Funcs>;
        let registration = bridge::Registration::add(&np, funcs)?;

        Ok(Box::pin(Self {
            bridge,
            registration: Some(registration),
        }))
    }

    /// The bridge this driver registered.
    pub fn bridge(&self) -> &Arc<Sn65dsi86Bridge> {
        &self.bridge
    }
}

impl i2c::Driver for Sn65dsi86 {
    type IdInfo = ();

    const I2C_ID_TABLE: Option<i2c::IdTable<Self::IdInfo>> = Some(&I2C_ID_TABLE);
    const OF_ID_TABLE: Option<of::IdTable<Self::IdInfo>> = Some(&OF_ID_TABLE);

    fn probe(client: &mut i2c::Client, _id_info: Option<&Self::IdInfo>) -> Result<Pin<Box<Self>>> {
        Self::probe_with_delay(client, Arc::new(SystemDelay))
    }
}

impl Drop for Sn65dsi86 {
    fn drop(&mut self) {
        dev_dbg!(self.bridge.brg.device(), "remove\n");

        self.bridge.detach_dsi();
        drop(self.registration.take());
        self.bridge.brg.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::{drm::connector::Type, fwnode::FwNode};
    use std::time::{Duration, Instant};
    use test_util::{bridge_node, bridge_node_with_host, FakeDelay, FakeI2c};

    #[derive(Default)]
    struct FakeHost {
        attached: Mutex<Vec<(String, u32, PixelFormat, ModeFlags)>>,
    }

    impl mipi_dsi::Host for FakeHost {
        fn attach(&self, dsi: &mipi_dsi::Device) -> Result {
            self.attached
                .lock()
                .push((dsi.name().to_owned(), dsi.lanes, dsi.format, dsi.mode_flags));
            Ok(())
        }

        fn detach(&self, dsi: &mipi_dsi::Device) -> Result {
            self.attached.lock().retain(|(name, ..)| name != dsi.name());
            Ok(())
        }
    }

    struct Setup {
        i2c: Arc<FakeI2c>,
        node: Arc<FwNode>,
        host: Arc<FakeHost>,
        _host_reg: mipi_dsi::HostRegistration,
    }

    fn setup(props: &[(&str, u32)]) -> Setup {
        let host_node = FwNode::builder("dsi@30a00000").build();
        let host = Arc::new(FakeHost::default());
        let weak = Arc::downgrade(&host) as Weak<dyn mipi_dsi::Host>;
        let host_reg = mipi_dsi::HostRegistration::new(&host_node, weak).unwrap();
        Setup {
            i2c: FakeI2c::ready(),
            node: bridge_node_with_host(&host_node, props),
            host,
            _host_reg: host_reg,
        }
    }

    fn probe(i2c: &Arc<FakeI2c>, node: &Arc<FwNode>) -> Result<Pin<Box<Sn65dsi86>>> {
        Sn65dsi86::probe_with_delay(&i2c.client(node.clone()), Arc::new(FakeDelay::default()))
    }

    fn wait_connected(drv: &Sn65dsi86) {
        let start = Instant::now();
        while drv.bridge().brg().hpd_detect() != HpdStatus::Connected {
            assert!(start.elapsed() < Duration::from_secs(10), "sink never detected");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn module_metadata() {
        assert_eq!(THIS_MODULE.name(), "sn65dsi86");
        assert_eq!(THIS_MODULE.license(), "GPL");
        assert_eq!(I2C_ID_TABLE[0].0.name(), "sn65dsi86");
        assert_eq!(OF_ID_TABLE[0].0.compatible(), "ti,sn65dsi86");
    }

    #[test]
    fn probe_registers_the_bridge() {
        let s = setup(&[]);
        let drv = probe(&s.i2c, &s.node).unwrap();

        assert!(bridge::of_find_bridge(&s.node).is_some());
        assert!(s.i2c.reads_of(0x09) >= 1);
        assert!(s.i2c.reads_of(0x08) >= 1);

        // The poller configures the link once the sink is seen.
        wait_connected(&drv);
        assert_eq!(s.i2c.writes_to(0x0a), vec![0x06]);
        assert!(drv.bridge().brg().link_status().trained);
    }

    #[test]
    fn probe_fails_out_of_reset() {
        let s = setup(&[]);
        s.i2c.poke(0x09, 0x01);
        assert_eq!(probe(&s.i2c, &s.node).err(), Some(ENODEV));
        assert!(bridge::of_find_bridge(&s.node).is_none());
        assert!(s.i2c.writes().is_empty());
    }

    #[test]
    fn probe_rejects_bad_configuration() {
        let i2c = FakeI2c::ready();
        assert_eq!(probe(&i2c, &bridge_node(&[("ti,dsi-lanes", 5)])).err(), Some(EINVAL));
        assert_eq!(probe(&i2c, &bridge_node(&[("ti,dp-lanes", 3)])).err(), Some(EINVAL));
        assert!(i2c.writes().is_empty());
    }

    #[test]
    fn one_bridge_per_node() {
        let s = setup(&[]);
        let _drv = probe(&s.i2c, &s.node).unwrap();
        assert_eq!(probe(&s.i2c, &s.node).err(), Some(EBUSY));
    }

    #[test]
    fn attach_creates_connector_and_dsi_device() {
        let s = setup(&[("ti,dsi-lanes", 4)]);
        let drv = probe(&s.i2c, &s.node).unwrap();
        let bridge = bridge::of_find_bridge(&s.node).unwrap();

        assert_eq!(bridge.attach(None), Err(ENODEV));

        let encoder = Encoder::new("DSI-0");
        bridge.attach(Some(&encoder)).unwrap();
        assert!(drv.bridge().dsi_attached());
        assert_eq!(
            s.host.attached.lock().clone(),
            vec![(
                "sn65dsi86.0".to_owned(),
                4,
                PixelFormat::Rgb888,
                ModeFlags::VIDEO | ModeFlags::VIDEO_SYNC_PULSE
            )]
        );

        let connectors = encoder.connectors();
        assert_eq!(connectors.len(), 1);
        let connector = &connectors[0];
        assert_eq!(connector.name(), "DSI-1");
        assert_eq!(connector.connector_type(), Type::Dsi);
        assert_eq!(connector.polled(), Polled::CONNECT | Polled::DISCONNECT);

        wait_connected(&drv);
        assert_eq!(connector.fill_modes(), 1);
        assert_eq!(connector.status(), Status::Connected);
        let modes = connector.modes();
        assert_eq!(modes[0].name, "1024x768");
        assert_eq!(modes[0].clock, 60_000);
        assert_eq!(modes[0].type_, ModeType::DRIVER | ModeType::PREFERRED);
        assert_eq!((modes[0].width_mm, modes[0].height_mm), (149, 93));
        let info = connector.display_info();
        assert_eq!(info.bus_formats, vec![mode::MEDIA_BUS_FMT_RGB888_1X24]);
        assert!(info.bus_flags.contains(mode::BusFlags::DE_LOW));

        bridge.mode_set(&modes[0], &modes[0]);
        assert_eq!(drv.bridge().adjusted_mode(), Some(modes[0].clone()));

        bridge.detach();
        assert!(!drv.bridge().dsi_attached());
        assert!(s.host.attached.lock().is_empty());
    }

    #[test]
    fn burst_mode_flag() {
        let host_node = FwNode::builder("dsi@30a00000").build();
        let host = Arc::new(FakeHost::default());
        let weak = Arc::downgrade(&host) as Weak<dyn mipi_dsi::Host>;
        let _reg = mipi_dsi::HostRegistration::new(&host_node, weak).unwrap();
        let node = FwNode::builder("bridge@2d")
            .flag("ti,burst-mode")
            .graph_link(&host_node)
            .build();

        let i2c = FakeI2c::ready();
        let _drv = probe(&i2c, &node).unwrap();
        bridge::of_find_bridge(&node)
            .unwrap()
            .attach(Some(&Encoder::new("DSI-0")))
            .unwrap();
        assert_eq!(
            host.attached.lock()[0].3,
            ModeFlags::VIDEO | ModeFlags::VIDEO_BURST
        );
    }

    #[test]
    fn attach_defers_without_host() {
        let i2c = FakeI2c::ready();
        let node = bridge_node(&[]);
        let drv = probe(&i2c, &node).unwrap();
        let bridge = bridge::of_find_bridge(&node).unwrap();
        assert_eq!(bridge.attach(Some(&Encoder::new("DSI-0"))), Err(EPROBE_DEFER));
        assert!(!drv.bridge().dsi_attached());
    }

    #[test]
    fn connector_follows_hotplug() {
        let s = setup(&[]);
        s.i2c.clear_status(0x5c);
        let drv = probe(&s.i2c, &s.node).unwrap();
        let encoder = Encoder::new("DSI-0");
        bridge::of_find_bridge(&s.node)
            .unwrap()
            .attach(Some(&encoder))
            .unwrap();
        let connector = encoder.connectors()[0].clone();

        // Unknown reads as disconnected.
        assert_eq!(connector.detect(false), Status::Disconnected);
        assert_eq!(connector.fill_modes(), 0);

        s.i2c.set_status(0x5c, 0x10);
        wait_connected(&drv);
        assert_eq!(connector.detect(false), Status::Connected);
    }

    #[test]
    fn mode_validation() {
        let s = setup(&[]);
        let drv = probe(&s.i2c, &s.node).unwrap();
        let funcs: &dyn connector::Funcs = &**drv.bridge();

        let mut info = DisplayInfo::default();
        let mut modes = Vec::new();
        assert_eq!(funcs.get_modes(&mut info, &mut modes), 1);

        let mut fast = modes[0].clone();
        assert_eq!(funcs.mode_valid(&fast), ModeStatus::Ok);
        fast.clock += 1;
        assert_eq!(funcs.mode_valid(&fast), ModeStatus::ClockHigh);
    }

    #[test]
    fn remove_tears_down() {
        let s = setup(&[]);
        let drv = probe(&s.i2c, &s.node).unwrap();
        bridge::of_find_bridge(&s.node)
            .unwrap()
            .attach(Some(&Encoder::new("DSI-0")))
            .unwrap();
        wait_connected(&drv);

        drop(drv);
        assert!(bridge::of_find_bridge(&s.node).is_none());
        assert!(s.host.attached.lock().is_empty());

        let reads = s.i2c.reads_of(0x5c);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(s.i2c.reads_of(0x5c), reads);
    }

    #[test]
    fn binds_through_the_id_tables() {
        let s = setup(&[]);
        s.i2c.clear_status(0x5c);
        let client = s.i2c.client(s.node.clone());

        let bound = ModuleDriver::probe_client(&client).unwrap();
        assert!(bridge::of_find_bridge(&s.node).is_some());
        bound.remove();
        assert!(bridge::of_find_bridge(&s.node).is_none());
    }
}
