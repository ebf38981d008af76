// SPDX-License-Identifier: GPL-2.0

//! Abstractions for the I2C bus.
//!
//! A [`Bus`] moves messages through an [`Algorithm`], the piece that actually drives the wires
//! (or, in tests, an in-memory register file). Devices on the bus are [`Client`]s, and drivers
//! bind to clients through the [`Driver`] trait and its [`Adapter`].

use crate::{
    device::Device,
    error::{code::*, Result},
    fwnode::FwNode,
    of,
    prelude::*,
    sync::Arc,
};
use bitflags::bitflags;
use core::fmt;

bitflags! {
    /// Flags of an I2C message.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct MsgFlags: u16 {
        /// Read data, from slave to master.
        const RD = 0x0001;
        /// Address is a 10-bit chip address.
        const TEN = 0x0010;
        /// Message length is the first received byte.
        const RECV_LEN = 0x0400;
    }
}

/// One I2C message, the equivalent of `struct i2c_msg`.
pub struct Msg<'a> {
    /// Slave address.
    pub addr: u16,
    /// Message flags.
    pub flags: MsgFlags,
    /// Data to write, or buffer to read into when [`MsgFlags::RD`] is set.
    pub buf: &'a mut [u8],
}

impl<'a> Msg<'a> {
    /// A message writing `buf` to `addr`.
    pub fn write(addr: u16, buf: &'a mut [u8]) -> Self {
        Self {
            addr,
            flags: MsgFlags::empty(),
            buf,
        }
    }

    /// A message reading `buf.len()` bytes from `addr`.
    pub fn read(addr: u16, buf: &'a mut [u8]) -> Self {
        Self {
            addr,
            flags: MsgFlags::RD,
            buf,
        }
    }
}

/// The transfer method of an I2C bus.
pub trait Algorithm: Send + Sync {
    /// Transfers `msgs` as one combined transaction, repeated start between messages.
    ///
    /// Returns the number of messages transferred.
    fn master_xfer(&self, msgs: &mut [Msg<'_>]) -> Result<usize>;
}

/// An I2C bus segment, the `struct i2c_adapter` of the C side.
pub struct Bus {
    name: String,
    algo: Arc<dyn Algorithm>,
}

impl Bus {
    /// Creates a bus transferring through `algo`.
    pub fn new(name: &str, algo: Arc<dyn Algorithm>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            algo,
        })
    }

    /// Name of the bus.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transfers `msgs`, failing with `EIO` if the algorithm gave up before the last one.
    pub fn transfer(&self, msgs: &mut [Msg<'_>]) -> Result {
        let count = msgs.len();
        let done = self.algo.master_xfer(msgs)?;
        if done != count {
            return Err(EIO);
        }
        Ok(())
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus").field("name", &self.name).finish()
    }
}

/// An I2C device id: the client name as used in board files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceId {
    name: &'static str,
}

impl DeviceId {
    /// Create a new device id from an I2C name.
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// The I2C name of this id.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

/// I2C [`DeviceId`] table.
pub type IdTable<T> = &'static [(DeviceId, T)];

/// An I2C Client.
///
/// # Invariants
///
/// `addr` is a 7-bit address.
#[derive(Clone)]
pub struct Client {
    dev: Arc<Device>,
    bus: Arc<Bus>,
    addr: u16,
    name: String,
}

impl Client {
    /// Instantiates the device `name` at `addr` on `bus`, described by `fwnode`.
    ///
    /// The device is named after the bus and address, e.g. `i2c-1-002d`.
    pub fn new(bus: &Arc<Bus>, addr: u16, name: &str, fwnode: Option<Arc<FwNode>>) -> Result<Self> {
        if addr > 0x7f {
            return Err(EINVAL);
        }

        let dev = Device::new(&format!("{}-{:04x}", bus.name(), addr), fwnode);
        Ok(Self {
            dev,
            bus: bus.clone(),
            addr,
            name: name.to_owned(),
        })
    }

    /// Address of the client on its bus.
    pub fn addr(&self) -> u16 {
        self.addr
    }

    /// The name the client was instantiated with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bus the client sits on.
    pub fn bus(&self) -> &Arc<Bus> {
        &self.bus
    }

    /// Returns a new reference to the client's device.
    pub fn device(&self) -> Arc<Device> {
        self.dev.clone()
    }

    /// Writes `buf` to the client in a single message.
    pub fn master_send(&self, buf: &[u8]) -> Result {
        let mut data = buf.to_vec();
        self.bus.transfer(&mut [Msg::write(self.addr, &mut data)])
    }

    /// Writes `wbuf`, then reads into `rbuf` after a repeated start.
    pub fn write_then_read(&self, wbuf: &[u8], rbuf: &mut [u8]) -> Result {
        let mut data = wbuf.to_vec();
        self.bus.transfer(&mut [
            Msg::write(self.addr, &mut data),
            Msg::read(self.addr, rbuf),
        ])
    }

    /// SMBus "read byte" protocol.
    pub fn smbus_read_byte_data(&self, command: u8) -> Result<u8> {
        let mut val = [0u8; 1];
        self.write_then_read(&[command], &mut val)?;
        Ok(val[0])
    }

    /// SMBus "write byte" protocol.
    pub fn smbus_write_byte_data(&self, command: u8, value: u8) -> Result {
        self.master_send(&[command, value])
    }
}

impl AsRef<Device> for Client {
    fn as_ref(&self) -> &Device {
        &self.dev
    }
}

/// The I2C driver trait.
///
/// Drivers must implement this trait in order to get a i2c driver registered.
///
/// # Example
///
///```
/// # use kernel::{i2c, of, prelude::*};
/// kernel::of_device_table!(
///     OF_ID_TABLE,
///     <MyDriver as i2c::Driver>::IdInfo,
///     [(of::DeviceId::new("ti,sn65dsi86"), ()),]
/// );
///
/// kernel::i2c_device_table!(
///     I2C_ID_TABLE,
///     <MyDriver as i2c::Driver>::IdInfo,
///     [(i2c::DeviceId::new("sn65dsi86"), ()),]
/// );
///
/// struct MyDriver;
///
/// impl i2c::Driver for MyDriver {
///     type IdInfo = ();
///     const OF_ID_TABLE: Option<of::IdTable<Self::IdInfo>> = Some(&OF_ID_TABLE);
///     const I2C_ID_TABLE: Option<i2c::IdTable<Self::IdInfo>> = Some(&I2C_ID_TABLE);
///
///     fn probe(_client: &mut i2c::Client,
///              _id_info: Option<&Self::IdInfo>) -> Result<Pin<Box<Self>>> {
///         Ok(Box::pin(Self))
///     }
/// }
///```
pub trait Driver: Send + Sync {
    /// The type holding information about each device id supported by the driver.
    type IdInfo: 'static;

    /// An optional table of I2C device ids supported by the driver.
    const I2C_ID_TABLE: Option<IdTable<Self::IdInfo>>;

    /// An optional table of OF device ids supported by the driver.
    const OF_ID_TABLE: Option<of::IdTable<Self::IdInfo>>;

    /// I2C driver probe.
    ///
    /// Called when a new I2C client is added or discovered.
    fn probe(client: &mut Client, id_info: Option<&Self::IdInfo>) -> Result<Pin<Box<Self>>>;
}

/// Binds clients to the I2C driver `T`.
pub struct Adapter<T: Driver>(core::marker::PhantomData<T>);

impl<T: Driver> Adapter<T> {
    /// Get the id info of the entry `client` matches, OF table first.
    ///
    /// The outer `Option` is `None` when nothing matched.
    fn id_info(client: &Client) -> Option<Option<&'static T::IdInfo>> {
        if let (Some(table), Some(node)) = (T::OF_ID_TABLE, client.dev.fwnode()) {
            if let Some(info) = of::match_node(table, node) {
                return Some(Some(info));
            }
        }

        if let Some(table) = T::I2C_ID_TABLE {
            if let Some((_, info)) = table.iter().find(|(id, _)| id.name == client.name) {
                return Some(Some(info));
            }
        }

        if T::OF_ID_TABLE.is_none() && T::I2C_ID_TABLE.is_none() {
            return Some(None);
        }

        None
    }

    /// Probes `T` for `client`, returning the bound driver data.
    ///
    /// Fails with `ENODEV` if neither id table matches the client.
    pub fn probe_client(client: &Client) -> Result<Binding<T>> {
        let info = Self::id_info(client).ok_or(ENODEV)?;
        let mut client = client.clone();
        let data = T::probe(&mut client, info)?;
        Ok(Binding { client, data })
    }
}

/// A driver bound to a client.
///
/// Dropping the binding removes the driver from the device, dropping the driver's data.
pub struct Binding<T: Driver> {
    client: Client,
    data: Pin<Box<T>>,
}

impl<T: Driver> Binding<T> {
    /// The client the driver is bound to.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The driver's private data.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Unbinds the driver.
    pub fn remove(self) {
        drop(self);
    }
}

/// Declares a module that exposes a single I2C driver.
///
/// Defines `THIS_MODULE` with the module metadata and `ModuleDriver`, the [`Adapter`] binding
/// clients to the driver type.
///
/// # Examples
///
/// ```ignore
/// kernel::module_i2c_driver! {
///     type: MyDriver,
///     name: "Module name",
///     authors: ["Author name"],
///     description: "Description",
///     license: "GPL v2",
/// }
/// ```
#[macro_export]
macro_rules! module_i2c_driver {
    (
        type: $type:ty,
        name: $name:literal,
        authors: [$($author:literal),* $(,)?],
        description: $description:literal,
        license: $license:literal $(,)?
    ) => {
        /// Metadata of this module.
        pub static THIS_MODULE: $crate::ThisModule = $crate::ThisModule::new(
            $name,
            &[$($author),*],
            $description,
            $license,
        );

        /// Binds I2C clients to the driver of this module.
        pub type ModuleDriver = $crate::i2c::Adapter<$type>;
    };
}

/// Create an I2C `IdTable`.
///
/// # Examples
///
/// ```
/// use kernel::i2c;
///
/// kernel::i2c_device_table!(
///     I2C_ID_TABLE,
///     u32,
///     [(i2c::DeviceId::new("sn65dsi86"), 0x86),]
/// );
/// ```
#[macro_export]
macro_rules! i2c_device_table {
    ($table_name:ident, $id_info_type: ty, $table_data: expr) => {
        const $table_name: [($crate::i2c::DeviceId, $id_info_type); $table_data.len()] =
            $table_data;
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::Mutex;

    /// Records every message and answers reads with a counter.
    struct Loopback {
        log: Mutex<Vec<(u16, MsgFlags, Vec<u8>)>>,
        fail: bool,
    }

    impl Algorithm for Loopback {
        fn master_xfer(&self, msgs: &mut [Msg<'_>]) -> Result<usize> {
            if self.fail {
                return Err(ENXIO);
            }
            let mut log = self.log.lock();
            for msg in msgs.iter_mut() {
                if msg.flags.contains(MsgFlags::RD) {
                    for (i, b) in msg.buf.iter_mut().enumerate() {
                        *b = i as u8 + 0x10;
                    }
                }
                log.push((msg.addr, msg.flags, msg.buf.to_vec()));
            }
            Ok(msgs.len())
        }
    }

    fn bus(fail: bool) -> (Arc<Loopback>, Arc<Bus>) {
        let algo = Arc::new(Loopback {
            log: Mutex::new(Vec::new()),
            fail,
        });
        let bus = Bus::new("i2c-1", algo.clone());
        (algo, bus)
    }

    #[test]
    fn smbus_byte_data() {
        let (algo, bus) = bus(false);
        let client = Client::new(&bus, 0x2d, "sn65dsi86", None).unwrap();
        assert_eq!(client.as_ref().name(), "i2c-1-002d");

        client.smbus_write_byte_data(0x0d, 0x01).unwrap();
        assert_eq!(client.smbus_read_byte_data(0x0a), Ok(0x10));

        let log = algo.log.lock();
        assert_eq!(log[0], (0x2d, MsgFlags::empty(), vec![0x0d, 0x01]));
        assert_eq!(log[1], (0x2d, MsgFlags::empty(), vec![0x0a]));
        assert_eq!(log[2], (0x2d, MsgFlags::RD, vec![0x10]));
    }

    #[test]
    fn bus_errors_propagate() {
        let (_, bus) = bus(true);
        let client = Client::new(&bus, 0x2d, "sn65dsi86", None).unwrap();
        assert_eq!(client.smbus_read_byte_data(0x08), Err(ENXIO));
        assert!(Client::new(&bus, 0x80, "bad", None).is_err());
    }

    struct Probed(u32);

    i2c_device_table!(I2C_IDS, u32, [(DeviceId::new("sn65dsi86"), 86),]);
    crate::of_device_table!(OF_IDS, u32, [(of::DeviceId::new("ti,sn65dsi86"), 860),]);

    impl Driver for Probed {
        type IdInfo = u32;
        const I2C_ID_TABLE: Option<IdTable<u32>> = Some(&I2C_IDS);
        const OF_ID_TABLE: Option<of::IdTable<u32>> = Some(&OF_IDS);

        fn probe(_client: &mut Client, id_info: Option<&u32>) -> Result<Pin<Box<Self>>> {
            Ok(Box::pin(Probed(*id_info.ok_or(EINVAL)?)))
        }
    }

    #[test]
    fn probe_matches_of_then_i2c_ids() {
        let (_, bus) = bus(false);
        let node = FwNode::builder("bridge@2d")
            .string("compatible", "ti,sn65dsi86")
            .build();

        let of_client = Client::new(&bus, 0x2d, "whatever", Some(node)).unwrap();
        let bound = Adapter::<Probed>::probe_client(&of_client).unwrap();
        assert_eq!(bound.data().0, 860);

        let i2c_client = Client::new(&bus, 0x2c, "sn65dsi86", None).unwrap();
        let bound = Adapter::<Probed>::probe_client(&i2c_client).unwrap();
        assert_eq!(bound.data().0, 86);
        assert_eq!(bound.client().addr(), 0x2c);
        bound.remove();

        let other = Client::new(&bus, 0x2b, "tc358767", None).unwrap();
        assert!(matches!(Adapter::<Probed>::probe_client(&other), Err(e) if e == ENODEV));
    }
}
