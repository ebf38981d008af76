// SPDX-License-Identifier: GPL-2.0

//! In-memory stand-ins for the chip, its bus and the sleeps.

use kernel::{
    delay::Delay,
    fwnode::FwNode,
    i2c::{self, Algorithm, Msg, MsgFlags},
    prelude::*,
    sync::{Arc, Mutex},
};

const SOFT_RESET: u8 = 0x09;
/// Write-one-to-clear interrupt status.
const IRQ_STATUS_FIRST: u8 = 0xf0;
const IRQ_STATUS_LAST: u8 = 0xf8;

/// One transfer seen by [`FakeI2c`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Xfer {
    Read(u8),
    Write(u8, u8),
}

struct Chip {
    regs: [u8; 256],
    /// Bits the hardware sets on its own, or'ed into every read.
    status: [u8; 256],
    failing: Vec<u8>,
    log: Vec<Xfer>,
}

/// A SN65DSI86 register file behind an I2C bus.
pub(crate) struct FakeI2c {
    chip: Mutex<Chip>,
}

impl FakeI2c {
    /// A chip out of reset whose PLL never locks and whose link never trains.
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            chip: Mutex::new(Chip {
                regs: [0; 256],
                status: [0; 256],
                failing: Vec::new(),
                log: Vec::new(),
            }),
        })
    }

    /// A chip with a sink plugged in, locking its PLL and passing training at once.
    pub(crate) fn ready() -> Arc<Self> {
        let i2c = Self::new();
        i2c.set_status(0x0a, 0x80);
        i2c.set_status(0xf8, 0x01);
        i2c.set_status(0x5c, 0x10);
        i2c
    }

    pub(crate) fn set_status(&self, reg: u8, bits: u8) {
        self.chip.lock().status[usize::from(reg)] |= bits;
    }

    pub(crate) fn clear_status(&self, reg: u8) {
        self.chip.lock().status[usize::from(reg)] = 0;
    }

    pub(crate) fn poke(&self, reg: u8, val: u8) {
        self.chip.lock().regs[usize::from(reg)] = val;
    }

    /// Makes every transfer to `reg` fail.
    pub(crate) fn fail(&self, reg: u8) {
        self.chip.lock().failing.push(reg);
    }

    /// A client at 0x2d on a bus driven by this chip.
    pub(crate) fn client(self: &Arc<Self>, node: Arc<FwNode>) -> i2c::Client {
        let bus = i2c::Bus::new("i2c-1", self.clone());
        i2c::Client::new(&bus, 0x2d, "sn65dsi86", Some(node)).unwrap()
    }

    /// Successful writes, in order.
    pub(crate) fn writes(&self) -> Vec<(u8, u8)> {
        self.chip
            .lock()
            .log
            .iter()
            .filter_map(|xfer| match *xfer {
                Xfer::Write(reg, val) => Some((reg, val)),
                Xfer::Read(_) => None,
            })
            .collect()
    }

    /// Successful writes, clearing the log.
    pub(crate) fn take_writes(&self) -> Vec<(u8, u8)> {
        let writes = self.writes();
        self.chip.lock().log.clear();
        writes
    }

    pub(crate) fn writes_to(&self, reg: u8) -> Vec<u8> {
        self.writes()
            .into_iter()
            .filter_map(|(r, val)| (r == reg).then_some(val))
            .collect()
    }

    pub(crate) fn reads_of(&self, reg: u8) -> usize {
        self.chip
            .lock()
            .log
            .iter()
            .filter(|xfer| **xfer == Xfer::Read(reg))
            .count()
    }
}

impl Algorithm for FakeI2c {
    fn master_xfer(&self, msgs: &mut [Msg<'_>]) -> Result<usize> {
        let mut chip = self.chip.lock();
        match msgs {
            [w, r] if r.flags.contains(MsgFlags::RD) => {
                let reg = w.buf[0];
                if chip.failing.contains(&reg) {
                    return Err(EREMOTEIO);
                }
                let i = usize::from(reg);
                r.buf[0] = chip.regs[i] | chip.status[i];
                chip.log.push(Xfer::Read(reg));
            }
            [w] if w.buf.len() == 2 => {
                let (reg, val) = (w.buf[0], w.buf[1]);
                if chip.failing.contains(&reg) {
                    return Err(EREMOTEIO);
                }
                let i = usize::from(reg);
                match reg {
                    // SOFT_RESET clears itself.
                    SOFT_RESET => {}
                    IRQ_STATUS_FIRST..=IRQ_STATUS_LAST => chip.regs[i] &= !val,
                    _ => chip.regs[i] = val,
                }
                chip.log.push(Xfer::Write(reg, val));
            }
            _ => return Err(EIO),
        }
        Ok(msgs.len())
    }
}

/// Records sleeps instead of sleeping.
#[derive(Default)]
pub(crate) struct FakeDelay {
    msleeps: Mutex<Vec<u32>>,
    usleeps: Mutex<usize>,
}

impl FakeDelay {
    pub(crate) fn msleeps(&self) -> Vec<u32> {
        self.msleeps.lock().clone()
    }

    pub(crate) fn usleeps(&self) -> usize {
        *self.usleeps.lock()
    }
}

impl Delay for FakeDelay {
    fn msleep(&self, msecs: u32) {
        self.msleeps.lock().push(msecs);
        // Keeps a polling worker from spinning on the state lock.
        std::thread::sleep(std::time::Duration::from_micros(100));
    }

    fn usleep_range(&self, _min: u64, _max: u64) {
        *self.usleeps.lock() += 1;
    }
}

/// A bridge node with `props`, linked to `host`.
pub(crate) fn bridge_node_with_host(host: &Arc<FwNode>, props: &[(&str, u32)]) -> Arc<FwNode> {
    props
        .iter()
        .fold(
            FwNode::builder("bridge@2d").string("compatible", "ti,sn65dsi86"),
            |node, &(name, val)| node.u32(name, val),
        )
        .graph_link(host)
        .build()
}

/// A bridge node with `props`, linked to a DSI host of its own.
pub(crate) fn bridge_node(props: &[(&str, u32)]) -> Arc<FwNode> {
    bridge_node_with_host(&FwNode::builder("dsi@30a00000").build(), props)
}
