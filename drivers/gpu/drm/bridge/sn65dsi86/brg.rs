// SPDX-License-Identifier: GPL-2.0

//! Register programming of the SN65DSI86.
//!
//! [`configure`] brings the DisplayPort link up for the mode in [`BrgConfig`], [`start_stream`]
//! and [`stop_stream`] gate the video stream. All three are best effort: a failed transfer is
//! logged and counted, and the sequence carries on with the next register.
//!
//! [`Brg`] owns the register map and the hot-plug state and serialises everything touching the
//! device behind one lock.

use crate::{
    config::BrgConfig,
    error::{BusError, DeviceError, LinkStatus, LinkWarning},
    hpd::{self, HpdDebounce, HpdStatus, Level},
    register::*,
    timing::{dsi_clk_range, field_prep, high, low},
    Sn65Fields,
};
use kernel::{
    delay::Delay,
    device::Device,
    io::poll::read_poll_retries,
    prelude::*,
    regmap::{BitFieldReadOps, RawFieldReadOps},
    sync::{Arc, Mutex, Weak},
    workqueue::Queue,
};

const SETTLE_MIN_US: u64 = 10_000;
const SETTLE_MAX_US: u64 = 12_000;
const STATUS_POLL_RETRIES: usize = 10;

const STREAM_SETTLE_MS: u32 = 10;
const PLL_START_MS: u32 = 100;

/// Unlocks the AUX register page selected through `PAGE_SELECT`.
const AUX_RW_CONTROL_UNLOCK: u8 = 0x07;
const PAGE_SELECT_ASSR: u8 = 0x01;

const ML_TX_SEMI_AUTO_LINK_TRAINING: u8 = 0x0a;

const PLL_ENABLE: u8 = pll_en::dp_pll_en::mask() as u8;

const IRQ_STATUS_REGS: [u32; 9] = [
    irq_status0::addr(),
    irq_status1::addr(),
    irq_status2::addr(),
    irq_status3::addr(),
    irq_status4::addr(),
    irq_status5::addr(),
    irq_status6::addr(),
    irq_status7::addr(),
    irq_status8::addr(),
];

/// Register access for one operation.
///
/// Failed transfers are logged, counted and handed back to the caller, which may go on.
pub(crate) struct Io<'a> {
    dev: &'a Device,
    fields: &'a mut Sn65Fields,
    delay: &'a dyn Delay,
    bus_errors: u32,
}

impl<'a> Io<'a> {
    pub(crate) fn new(dev: &'a Device, fields: &'a mut Sn65Fields, delay: &'a dyn Delay) -> Self {
        Self {
            dev,
            fields,
            delay,
            bus_errors: 0,
        }
    }

    /// Transfers that failed so far.
    pub(crate) fn bus_errors(&self) -> u32 {
        self.bus_errors
    }

    fn fail(&mut self, reg: u32, source: Error) -> BusError {
        self.bus_errors += 1;
        BusError {
            reg: reg as u8,
            source,
        }
    }

    /// Writes `val` to `reg`.
    pub(crate) fn write(&mut self, reg: u32, val: u8) -> Result<(), BusError> {
        match self.fields.regmap().write(reg, u32::from(val)) {
            Ok(()) => {
                dev_dbg!(self.dev, "write reg {:#04x} data {:#04x}\n", reg, val);
                Ok(())
            }
            Err(e) => {
                dev_err!(self.dev, "failed to write at {:#04x}: {:?}\n", reg, e);
                Err(self.fail(reg, e))
            }
        }
    }

    /// Reads `reg`.
    pub(crate) fn read(&mut self, reg: u32) -> Result<u8, BusError> {
        match self.fields.regmap().read(reg) {
            Ok(val) => Ok(val as u8),
            Err(e) => {
                dev_err!(self.dev, "failed to read at {:#04x}: {:?}\n", reg, e);
                Err(self.fail(reg, e))
            }
        }
    }

    /// Reads a field of `reg` through its typed accessor.
    pub(crate) fn field<T>(
        &mut self,
        reg: u32,
        op: impl FnOnce(&mut Sn65Fields) -> Result<T>,
    ) -> Result<T, BusError> {
        let ret = op(&mut *self.fields);
        ret.map_err(|e| {
            dev_err!(self.dev, "failed to read at {:#04x}: {:?}\n", reg, e);
            self.fail(reg, e)
        })
    }

    /// Writes each pair in order, skipping over failures.
    fn write_all(&mut self, writes: &[(u32, u8)]) {
        for &(reg, val) in writes {
            let _ = self.write(reg, val);
        }
    }

    /// Gives the chip time to take the previous writes.
    fn settle(&self) {
        self.delay.usleep_range(SETTLE_MIN_US, SETTLE_MAX_US);
    }

    /// Polls a status bit of `reg`, returning whether it came up within the retries.
    ///
    /// A failed read counts as the bit being clear.
    fn poll(&mut self, reg: u32, mut test: impl FnMut(&mut Sn65Fields) -> Result<bool>) -> bool {
        let delay = self.delay;
        read_poll_retries(
            || Ok(self.field(reg, &mut test).unwrap_or(false)),
            |set| *set,
            delay,
            SETTLE_MIN_US,
            SETTLE_MAX_US,
            STATUS_POLL_RETRIES,
        )
        .is_ok()
    }
}

/// Clamps a porch to its one-byte register.
fn porch(dev: &Device, name: &str, val: u32) -> u8 {
    if val > 0xff {
        dev_warn!(dev, "{} of {} does not fit, using 255\n", name, val);
        return 0xff;
    }
    val as u8
}

/// High byte of a sync pulse width, with the polarity bit set when the pulse is active low.
fn sync_high(len: u32, width_mask: u32, polarity_mask: u32, active_low: bool) -> u8 {
    let polarity = if active_low { polarity_mask } else { 0 };
    field_prep(width_mask, u32::from(high(len))) | polarity as u8
}

/// Programs the bridge for the mode and link described by `cfg`, and trains the link.
///
/// Never fails: the returned status tells whether the PLL locked, whether training passed and
/// how many transfers were lost on the way.
pub(crate) fn configure(io: &mut Io<'_>, cfg: &BrgConfig) -> LinkStatus {
    use kernel::video::DisplayFlags;

    let vm = &cfg.vm;
    let errors = io.bus_errors;
    dev_dbg!(io.dev, "configure +\n");

    // Clear all error and interrupt status bits.
    for reg in IRQ_STATUS_REGS {
        let _ = io.write(reg, 0xff);
    }
    io.settle();

    io.write_all(&[
        (aux_rw_control::addr(), AUX_RW_CONTROL_UNLOCK),
        (page_select::addr(), PAGE_SELECT_ASSR),
        (aux_rw_control::addr(), 0x00),
    ]);
    io.settle();

    let refclk = field_prep(
        pll_refclk_cfg::refclk::mask(),
        pll_refclk_cfg::refclk_enum::Clk27MHz as u32,
    );
    io.write_all(&[(pll_refclk_cfg::addr(), refclk)]);
    io.settle();

    let (chan_mode, chb_lanes) = match cfg.channels {
        2 => (dsi_cfg1::chan_mode_enum::Dual, 4 - u32::from(cfg.dsi_lanes)),
        _ => (dsi_cfg1::chan_mode_enum::Single, 3),
    };
    let dsi_cfg = field_prep(dsi_cfg1::chan_mode::mask(), chan_mode as u32)
        | field_prep(dsi_cfg1::cha_dsi_lanes::mask(), 4 - u32::from(cfg.dsi_lanes))
        | field_prep(dsi_cfg1::chb_dsi_lanes::mask(), chb_lanes);
    io.write_all(&[(dsi_cfg1::addr(), dsi_cfg)]);
    io.settle();

    let clk_range = dsi_clk_range(vm.pixelclock, cfg.dsi_lanes, cfg.channels);
    io.write_all(&[(dsi_cha_clk_range::addr(), clk_range)]);
    io.settle();
    io.write_all(&[(dsi_chb_clk_range::addr(), clk_range)]);
    io.settle();

    let datarate = field_prep(dp_cfg::dp_datarate::mask(), dp_cfg::dp_datarate_enum::Hbr as u32);
    io.write_all(&[(dp_cfg::addr(), datarate)]);
    io.settle();

    io.write_all(&[(pll_en::addr(), PLL_ENABLE)]);
    io.settle();

    let pll_locked = io.poll(pll_refclk_cfg::addr(), |f| {
        pll_refclk_cfg::dp_pll_lock::is_set(f)
    });
    if !pll_locked {
        dev_warn!(io.dev, "{}\n", LinkWarning::PllLockTimeout);
    }

    io.write_all(&[(framing_cfg::addr(), framing_cfg::enh_frame_en::mask() as u8)]);
    io.settle();

    let num_lanes = match cfg.dp_lanes {
        1 => 1,
        4 => 3,
        _ => 2,
    };
    io.write_all(&[(dp_ssc_cfg::addr(), field_prep(dp_ssc_cfg::dp_num_lanes::mask(), num_lanes))]);
    io.settle();

    io.write_all(&[(ml_tx_mode::addr(), ML_TX_SEMI_AUTO_LINK_TRAINING)]);
    io.settle();

    let trained = io.poll(irq_status8::addr(), |f| irq_status8::lt_pass::is_set(f));
    if !trained {
        dev_warn!(io.dev, "{}\n", LinkWarning::TrainingTimeout);
    }

    io.write_all(&[
        (cha_active_line_length_low::addr(), low(vm.hactive)),
        (cha_active_line_length_high::addr(), high(vm.hactive)),
    ]);
    io.settle();
    io.write_all(&[
        (chb_active_line_length_low::addr(), 0x00),
        (chb_active_line_length_high::addr(), 0x00),
    ]);
    io.settle();
    io.write_all(&[
        (cha_vertical_display_size_low::addr(), low(vm.vactive)),
        (cha_vertical_display_size_high::addr(), high(vm.vactive)),
    ]);
    io.settle();
    io.write_all(&[
        (cha_hsync_pulse_width_low::addr(), low(vm.hsync_len)),
        (
            cha_hsync_pulse_width_high::addr(),
            sync_high(
                vm.hsync_len,
                cha_hsync_pulse_width_high::value::mask(),
                cha_hsync_pulse_width_high::hsync_low::mask(),
                vm.flags.contains(DisplayFlags::HSYNC_LOW),
            ),
        ),
    ]);
    io.settle();
    io.write_all(&[
        (cha_vsync_pulse_width_low::addr(), low(vm.vsync_len)),
        (
            cha_vsync_pulse_width_high::addr(),
            sync_high(
                vm.vsync_len,
                cha_vsync_pulse_width_high::value::mask(),
                cha_vsync_pulse_width_high::vsync_low::mask(),
                vm.flags.contains(DisplayFlags::VSYNC_LOW),
            ),
        ),
    ]);
    io.settle();

    for (reg, name, val) in [
        (cha_horizontal_back_porch::addr(), "hback-porch", vm.hback_porch),
        (cha_vertical_back_porch::addr(), "vback-porch", vm.vback_porch),
        (cha_horizontal_front_porch::addr(), "hfront-porch", vm.hfront_porch),
        (cha_vertical_front_porch::addr(), "vfront-porch", vm.vfront_porch),
    ] {
        let val = porch(io.dev, name, val);
        let _ = io.write(reg, val);
        io.settle();
    }

    let data_format = if cfg.bpp == 18 {
        dp_data_format::bpp_18_rgb::mask() as u8
    } else {
        0x00
    };
    let framing = (framing_cfg::enh_frame_en::mask() | framing_cfg::vstream_en::mask()) as u8;
    for (reg, val) in [
        (dp_data_format::addr(), data_format),
        (color_bar_cfg::addr(), 0x00),
        (framing_cfg::addr(), framing),
    ] {
        let _ = io.write(reg, val);
        io.delay.msleep(STREAM_SETTLE_MS);
    }

    dev_dbg!(io.dev, "configure -\n");
    LinkStatus {
        pll_locked,
        trained,
        bus_errors: io.bus_errors - errors,
    }
}

/// Starts the PLL and the video stream.
pub(crate) fn start_stream(io: &mut Io<'_>) {
    let _ = io.write(pll_en::addr(), PLL_ENABLE);
    io.delay.msleep(PLL_START_MS);
    let _ = io.write(soft_reset::addr(), 0x01);
    io.settle();
}

/// Stops the PLL, and with it the video stream.
pub(crate) fn stop_stream(io: &mut Io<'_>) {
    let _ = io.write(pll_en::addr(), 0x00);
}

/// Checks that the chip is out of reset.
pub(crate) fn check_reset(io: &mut Io<'_>) -> Result<(), DeviceError> {
    let val = io.read(soft_reset::addr())?;
    if val != 0 {
        return Err(DeviceError::NotReset(val));
    }
    Ok(())
}

/// Operations on a bridge chip.
pub trait BrgOps: Send + Sync {
    /// Powers the chip up and starts hot-plug polling.
    fn power_on(&self) -> Result;

    /// Powers the chip down.
    fn power_off(&self);

    /// Checks that the chip came out of reset.
    fn reset(&self) -> Result<(), DeviceError>;

    /// Programs and trains the link.
    fn setup(&self) -> LinkStatus;

    /// Starts the video stream.
    fn start_stream(&self);

    /// Stops the video stream.
    fn stop_stream(&self);

    /// Debounced hot-plug status.
    fn hpd_detect(&self) -> HpdStatus;
}

struct Shared {
    hpd: HpdDebounce,
    link: LinkStatus,
    bus_errors: u64,
}

struct State {
    fields: Sn65Fields,
    shared: Shared,
}

/// One SN65DSI86 chip.
pub struct Brg {
    dev: Arc<Device>,
    cfg: BrgConfig,
    delay: Arc<dyn Delay>,
    this: Weak<Brg>,
    state: Mutex<State>,
    poller: Mutex<Option<Queue>>,
}

impl Brg {
    /// Creates the chip state. Nothing is written to the device.
    pub fn new(
        dev: Arc<Device>,
        fields: Sn65Fields,
        cfg: BrgConfig,
        delay: Arc<dyn Delay>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            dev,
            cfg,
            delay,
            this: this.clone(),
            state: Mutex::new(State {
                fields,
                shared: Shared {
                    hpd: HpdDebounce::new(),
                    link: LinkStatus::default(),
                    bus_errors: 0,
                },
            }),
            poller: Mutex::new(None),
        })
    }

    /// The configuration the chip is driven with.
    pub fn config(&self) -> &BrgConfig {
        &self.cfg
    }

    /// The I2C device of the chip.
    pub fn device(&self) -> &Arc<Device> {
        &self.dev
    }

    pub(crate) fn delay(&self) -> &Arc<dyn Delay> {
        &self.delay
    }

    /// Status of the last link configuration.
    pub fn link_status(&self) -> LinkStatus {
        self.state.lock().shared.link
    }

    /// Transfers lost since the chip was created.
    pub fn bus_errors(&self) -> u64 {
        self.state.lock().shared.bus_errors
    }

    /// Reads the silicon revision.
    pub fn revision(&self) -> Result<u8, BusError> {
        self.with_io(|io, _| io.field(device_rev::addr(), |f| device_rev::value::read(f)))
            .map(|rev| rev as u8)
    }

    fn with_io<R>(&self, op: impl FnOnce(&mut Io<'_>, &mut Shared) -> R) -> R {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut io = Io::new(&self.dev, &mut state.fields, &*self.delay);
        let ret = op(&mut io, &mut state.shared);
        state.shared.bus_errors += u64::from(io.bus_errors());
        ret
    }

    /// Takes one HPD sample and acts on an edge.
    pub(crate) fn poll_hpd(&self) {
        self.with_io(|io, shared| {
            let level = match io.field(hpd_cfg::addr(), |f| hpd_cfg::hpd::is_set(f)) {
                Ok(true) => Level::Plugged,
                Ok(false) => Level::Unplugged,
                Err(_) => return,
            };

            match shared.hpd.sample(level) {
                Some(Level::Plugged) => {
                    dev_info!(io.dev, "HPD connected\n");
                    shared.link = configure(io, &self.cfg);
                    start_stream(io);
                }
                Some(Level::Unplugged) => {
                    dev_info!(io.dev, "HPD disconnected\n");
                    stop_stream(io);
                }
                None => {}
            }
        })
    }

    /// Stops hot-plug polling, waiting for a running sample to finish.
    pub fn shutdown(&self) {
        let poller = self.poller.lock().take();
        if poller.is_some() {
            dev_dbg!(self.dev, "stopping HPD polling\n");
        }
        drop(poller);
    }
}

impl BrgOps for Brg {
    fn power_on(&self) -> Result {
        dev_dbg!(self.dev, "power on\n");

        let mut poller = self.poller.lock();
        if poller.is_none() {
            self.state.lock().shared.hpd = HpdDebounce::new();
            *poller = Some(hpd::arm(self.this.clone())?);
        }
        Ok(())
    }

    fn power_off(&self) {
        dev_dbg!(self.dev, "power off\n");
    }

    fn reset(&self) -> Result<(), DeviceError> {
        self.with_io(|io, _| check_reset(io))
    }

    fn setup(&self) -> LinkStatus {
        self.with_io(|io, shared| {
            let status = configure(io, &self.cfg);
            shared.link = status;
            status
        })
    }

    fn start_stream(&self) {
        self.with_io(|io, _| start_stream(io))
    }

    fn stop_stream(&self) {
        self.with_io(|io, _| stop_stream(io))
    }

    fn hpd_detect(&self) -> HpdStatus {
        self.state.lock().shared.hpd.status()
    }
}

impl Drop for Brg {
    fn drop(&mut self) {
        self.shutdown();
    }
}
