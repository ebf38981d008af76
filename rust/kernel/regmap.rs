// SPDX-License-Identifier: GPL-2.0

//! Register map access API.
//!
//! A [`Regmap`] gives byte-wide access to the register file of an I2C device, enforcing the
//! access policy declared for each register and optionally caching non-volatile registers.
//! Registers and their bit fields are declared once with [`define_regmap_field_descs`], which
//! generates a typed accessor per field.
//!
//! # Examples
//!
//! ```ignore
//! regmap::define_regmap_field_descs!(FIELD_DESCS, {
//!     (device_rev, 0x08, READ, { value => raw([7:0], ro) }),
//!     (pll_refclk_cfg, 0x0a, READ | WRITE | VOLATILE, {
//!         refclk => enum([3:1], rw, {
//!             Clk12MHz = 0x0,
//!             Clk19p2MHz = 0x1,
//!             Clk26MHz = 0x2,
//!             Clk27MHz = 0x3,
//!             Clk38p4MHz = 0x4,
//!         }),
//!         dp_pll_lock => bit(7, ro),
//!     })
//! });
//!
//! fn probe(client: &mut i2c::Client) -> Result {
//!     let config = regmap::Config::<AccessOps>::new(8, 8)
//!         .with_max_register(0xff)
//!         .with_cache_type(regmap::CacheType::RbTree);
//!     let regmap = Arc::new(regmap::Regmap::init_i2c(client, &config)?);
//!     let mut fields = regmap::Fields::new(&regmap, &FIELD_DESCS)?;
//!
//!     dev_info!(client.as_ref(), "rev: {:#x}", device_rev::value::read(&mut fields)?);
//! }
//! ```

use crate::{
    bits::genmask,
    device::Device,
    error::{code::*, Result},
    i2c,
    macros::paste,
    sync::{Arc, Mutex},
};
use core::marker::PhantomData;
use std::collections::BTreeMap;

/// Type of caching
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheType {
    /// Don't cache anything
    None,
    /// Use RbTree caching
    RbTree,
    /// Use Flat caching
    Flat,
}

/// Register map
///
/// All accessors take `&self`: transfers are serialised by the map's own lock, so a map can be
/// shared as `Arc<Regmap>` between the fields of a driver.
pub struct Regmap {
    client: i2c::Client,
    max_register: Option<u32>,
    access: AccessFns,
    cache: Option<Mutex<BTreeMap<u32, u32>>>,
    io_lock: Mutex<()>,
}

#[derive(Clone, Copy)]
struct AccessFns {
    readable: fn(u32) -> bool,
    writeable: fn(u32) -> bool,
    volatile: fn(u32) -> bool,
    precious: fn(u32) -> bool,
}

impl Regmap {
    /// Initialize a [`Regmap`] instance for an `i2c` client.
    ///
    /// Only 8-bit register addresses with 8-bit values are supported.
    pub fn init_i2c<T: ConfigOps>(i2c: &i2c::Client, config: &Config<T>) -> Result<Self> {
        if config.reg_bits != 8 || config.val_bits != 8 {
            return Err(ENOTSUPP);
        }

        let cache = match config.cache_type {
            CacheType::None => None,
            CacheType::RbTree | CacheType::Flat => Some(Mutex::new(BTreeMap::new())),
        };

        Ok(Regmap {
            client: i2c.clone(),
            max_register: config.max_register,
            access: AccessFns {
                readable: T::is_readable_reg,
                writeable: T::is_writeable_reg,
                volatile: T::is_volatile_reg,
                precious: T::is_precious_reg,
            },
            cache,
            io_lock: Mutex::new(()),
        })
    }

    /// The device the map belongs to.
    pub fn device(&self) -> Arc<Device> {
        self.client.device()
    }

    fn in_range(&self, reg: u32) -> bool {
        reg <= 0xff && self.max_register.map_or(true, |max| reg <= max)
    }

    /// Returns whether `reg` may be read.
    pub fn readable(&self, reg: u32) -> bool {
        self.in_range(reg) && (self.access.readable)(reg)
    }

    /// Returns whether `reg` may be written.
    pub fn writeable(&self, reg: u32) -> bool {
        self.in_range(reg) && (self.access.writeable)(reg)
    }

    /// Returns whether reads of `reg` always go to the device.
    pub fn volatile(&self, reg: u32) -> bool {
        self.cache.is_none() || (self.access.volatile)(reg) || (self.access.precious)(reg)
    }

    /// Read the value of register `reg`.
    pub fn read(&self, reg: u32) -> Result<u32> {
        if !self.readable(reg) {
            return Err(EIO);
        }

        let _io = self.io_lock.lock();
        self.read_locked(reg)
    }

    fn read_locked(&self, reg: u32) -> Result<u32> {
        let volatile = self.volatile(reg);
        if let (false, Some(cache)) = (volatile, &self.cache) {
            if let Some(val) = cache.lock().get(&reg) {
                return Ok(*val);
            }
        }

        let val = u32::from(self.client.smbus_read_byte_data(reg as u8)?);

        if let (false, Some(cache)) = (volatile, &self.cache) {
            cache.lock().insert(reg, val);
        }
        Ok(val)
    }

    /// Write `val` to register `reg`.
    pub fn write(&self, reg: u32, val: u32) -> Result {
        if !self.writeable(reg) {
            return Err(EIO);
        }
        if val > 0xff {
            return Err(EINVAL);
        }

        let _io = self.io_lock.lock();
        self.write_locked(reg, val)
    }

    fn write_locked(&self, reg: u32, val: u32) -> Result {
        self.client.smbus_write_byte_data(reg as u8, val as u8)?;

        if let (false, Some(cache)) = (self.volatile(reg), &self.cache) {
            cache.lock().insert(reg, val);
        }
        Ok(())
    }

    fn update_bits_inner(&self, reg: u32, mask: u32, val: u32, force: bool) -> Result {
        if !self.readable(reg) || !self.writeable(reg) {
            return Err(EIO);
        }

        let _io = self.io_lock.lock();
        let orig = self.read_locked(reg)?;
        let tmp = (orig & !mask) | (val & mask);
        if force || tmp != orig {
            self.write_locked(reg, tmp & 0xff)?;
        }
        Ok(())
    }

    /// Perform a read/modify/write cycle on register `reg`.
    ///
    /// The write is skipped if the value would not change.
    pub fn update_bits(&self, reg: u32, mask: u32, val: u32) -> Result {
        self.update_bits_inner(reg, mask, val, false)
    }

    /// Perform a read/modify/write cycle on register `reg`, always writing the result.
    pub fn force_update_bits(&self, reg: u32, mask: u32, val: u32) -> Result {
        self.update_bits_inner(reg, mask, val, true)
    }

    /// Set `bits` in register `reg`.
    pub fn set_bits(&self, reg: u32, bits: u32) -> Result {
        self.update_bits(reg, bits, bits)
    }

    /// Clear `bits` in register `reg`.
    pub fn clear_bits(&self, reg: u32, bits: u32) -> Result {
        self.update_bits(reg, bits, 0)
    }

    /// Returns whether all of `bits` are set in register `reg`.
    pub fn test_bits(&self, reg: u32, bits: u32) -> Result<bool> {
        Ok(self.read(reg)? & bits == bits)
    }

    /// Forget all cached values, so the next reads go to the device.
    pub fn cache_drop(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().clear();
        }
    }
}

/// Descriptor of one register field: bits `lsb..=msb` of register `reg`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDesc {
    /// Register address.
    pub reg: u32,
    /// Lowest bit of the field.
    pub lsb: u32,
    /// Highest bit of the field.
    pub msb: u32,
}

impl FieldDesc {
    /// Describe bits `lsb..=msb` of `reg`.
    pub const fn new(reg: u32, lsb: u32, msb: u32) -> Self {
        Self { reg, lsb, msb }
    }

    /// Mask of the field within its register.
    pub const fn mask(&self) -> u32 {
        genmask(self.msb, self.lsb)
    }
}

/// Field Descriptors
///
/// FieldDescriptors can be created by calling the [`define_regmap_field_descs`] macro.
///
/// # Examples
///
/// ```ignore
/// use kernel::regmap::{define_regmap_field_descs, Fields};
///
/// define_regmap_field_descs!(DESCS, {
///     (device_rev, 0x08, READ, { value => raw([7:0], ro) })
/// });
///
/// struct State {
///    fields: Fields<{ DESCS.len() }>,
/// }
/// ```
pub struct FieldDescs<const N: usize>([FieldDesc; N]);

impl<const N: usize> FieldDescs<N> {
    // macro use only
    #[doc(hidden)]
    pub const fn new(fields: [FieldDesc; N]) -> Self {
        Self(fields)
    }

    /// Number of fields being held by `FieldDescs<N>`
    ///
    /// This function can be used to retrieve the number of fields that were
    /// created when calling [`define_regmap_field_descs`].
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize {
        N
    }
}

/// Regmap fields
///
/// Accessors generated by [`define_regmap_field_descs`] operate on a `Fields` instance, which
/// pairs the descriptors with the map they are read from and written to.
pub struct Fields<const N: usize> {
    descs: &'static [FieldDesc; N],
    regmap: Arc<Regmap>,
}

impl<const N: usize> Fields<N> {
    /// Allocate regmap [`Fields`]
    ///
    /// Fails with `EINVAL` if a descriptor is outside the registers the map accepts.
    pub fn new(regmap: &Arc<Regmap>, descs: &'static FieldDescs<N>) -> Result<Self> {
        if descs
            .0
            .iter()
            .any(|desc| !regmap.in_range(desc.reg) || desc.msb < desc.lsb || desc.msb > 7)
        {
            return Err(EINVAL);
        }

        Ok(Fields {
            descs: &descs.0,
            regmap: regmap.clone(),
        })
    }

    /// The map the fields live in.
    pub fn regmap(&self) -> &Arc<Regmap> {
        &self.regmap
    }

    /// Get the descriptor of field `index`
    pub fn desc(&self, index: usize) -> Result<&FieldDesc> {
        // Make sure we don't panic if the index is out of bound.
        self.descs.get(index).ok_or(EINVAL)
    }

    // macro use only
    #[doc(hidden)]
    pub fn read(&mut self, index: usize) -> Result<u32> {
        let desc = *self.desc(index)?;
        let val = self.regmap.read(desc.reg)?;
        Ok((val & desc.mask()) >> desc.lsb)
    }

    // macro use only
    #[doc(hidden)]
    pub fn write(&mut self, index: usize, val: u32, force: bool) -> Result {
        let desc = *self.desc(index)?;
        self.update(desc, desc.mask(), val << desc.lsb, force)
    }

    // macro use only
    #[doc(hidden)]
    pub fn update_bits(&mut self, index: usize, mask: u32, val: u32, force: bool) -> Result {
        let desc = *self.desc(index)?;
        let mask = (mask << desc.lsb) & desc.mask();
        self.update(desc, mask, val << desc.lsb, force)
    }

    // macro use only
    #[doc(hidden)]
    pub fn test_bits(&mut self, index: usize, bits: u32) -> Result<bool> {
        Ok(self.read(index)? & bits == bits)
    }

    fn update(&self, desc: FieldDesc, mask: u32, val: u32, force: bool) -> Result {
        // A field spanning the whole register needs no read back.
        if desc.mask() == 0xff && mask == 0xff {
            return self.regmap.write(desc.reg, val & 0xff);
        }

        if force {
            self.regmap.force_update_bits(desc.reg, mask, val)
        } else {
            self.regmap.update_bits(desc.reg, mask, val)
        }
    }
}

macro_rules! config_with {
    ($(#[$meta:meta])* $name:ident: $type:ty) => {
        config_with!($(#[$meta])* $name: $type, $name);
    };

    ($(#[$meta:meta])* $name:ident: $type:ty, $e:expr) => {
        paste! {
            $(#[$meta])*
            pub const fn [<with_$name>](mut self, $name: $type) -> Self {
                self.$name = $e;
                self
            }
        }
    };
}

// macro use only
#[doc(hidden)]
pub trait ConfigOps {
    fn is_readable_reg(reg: u32) -> bool;
    fn is_writeable_reg(reg: u32) -> bool;
    fn is_volatile_reg(reg: u32) -> bool;
    fn is_precious_reg(reg: u32) -> bool;
}

/// Regmap Configuration
pub struct Config<T: ConfigOps> {
    reg_bits: u32,
    val_bits: u32,
    max_register: Option<u32>,
    cache_type: CacheType,
    _phantom: PhantomData<T>,
}

impl<T: ConfigOps> Config<T> {
    /// Create a new regmap Config
    pub const fn new(reg_bits: u32, val_bits: u32) -> Self {
        Self {
            reg_bits,
            val_bits,
            max_register: None,
            cache_type: CacheType::None,
            _phantom: PhantomData,
        }
    }

    config_with!(
        /// Specifies the maximum valid register address.
        max_register: u32, Some(max_register)
    );

    config_with!(
        /// Type of caching being performed.
        cache_type: CacheType
    );
}

/// Definitions describing how registers can be accessed.
pub mod access {
    /// Register can be read from.
    pub const READ: u32 = 0b000001;
    /// Register can be written to.
    pub const WRITE: u32 = 0b000010;
    /// Register should not be read outside of a call from the driver.
    pub const PRECIOUS: u32 = 0b000100;
    /// Register value can't be cached.
    pub const VOLATILE: u32 = 0b001000;

    /// Register can be read from and written to.
    pub const RW: u32 = READ | WRITE;
}

// macro use only
#[doc(hidden)]
#[macro_export]
macro_rules! regmap_check_access {
    ($type:ident, $access:expr, $reg:ident, $addr:literal) => {
        if $crate::regmap::access::$type & $access > 0 && $reg == $addr {
            return true;
        }
    };
}
// macro use only
#[doc(hidden)]
pub use crate::regmap_check_access;

/// Read operations for fields with `bit` type
pub trait BitFieldReadOps {
    /// Returns whether the bit is set
    fn is_set<const N: usize>(fields: &mut Fields<N>) -> Result<bool>;
}

/// Write operations for fields with `bit` type
pub trait BitFieldWriteOps {
    /// Set the bit
    fn set<const N: usize>(fields: &mut Fields<N>) -> Result;

    /// Force set the bit
    fn force_set<const N: usize>(fields: &mut Fields<N>) -> Result;

    /// Clear the bit
    fn clear<const N: usize>(fields: &mut Fields<N>) -> Result;

    /// Force clear the bit
    fn force_clear<const N: usize>(fields: &mut Fields<N>) -> Result;
}

/// Read operations for fields with `enum` type
pub trait EnumFieldReadOps {
    #[doc(hidden)]
    /// Underlying enum type reprensenting the field values
    type EnumType;

    /// Read the field
    fn read<const N: usize>(fields: &mut Fields<N>) -> Result<Self::EnumType>;
}

/// Write operations for fields with `enum` type
pub trait EnumFieldWriteOps {
    #[doc(hidden)]
    /// Underlying enum type reprensenting the field values
    type EnumType;

    /// Write the field
    fn write<const N: usize>(fields: &mut Fields<N>, val: Self::EnumType) -> Result;

    /// Force write the field
    fn force_write<const N: usize>(fields: &mut Fields<N>, val: Self::EnumType) -> Result;
}

/// Read operations for fields with `raw` type
pub trait RawFieldReadOps {
    /// Read the field
    fn read<const N: usize>(fields: &mut Fields<N>) -> Result<u32>;

    /// Returns whether all of `bits` are set in the field
    fn test_bits<const N: usize>(fields: &mut Fields<N>, bits: u32) -> Result<bool>;
}

/// Write operations for fields with `raw` type
pub trait RawFieldWriteOps {
    /// Write the field
    fn write<const N: usize>(fields: &mut Fields<N>, val: u32) -> Result;

    /// Force write the field
    fn force_write<const N: usize>(fields: &mut Fields<N>, val: u32) -> Result;

    /// Update the field using a mask
    fn update_bits<const N: usize>(fields: &mut Fields<N>, mask: u32, val: u32) -> Result;

    /// Force update the field using a mask
    fn force_update_bits<const N: usize>(fields: &mut Fields<N>, mask: u32, val: u32) -> Result;

    /// Set field bits
    fn set_bits<const N: usize>(fields: &mut Fields<N>, bits: u32) -> Result;

    /// Clear the field bits
    fn clear_bits<const N: usize>(fields: &mut Fields<N>, bits: u32) -> Result;
}

/// Bit field
///
/// `bit` should be use when a feature is implemented through reading or writing a single bit of
/// a register.
///
/// See [`BitFieldReadOps`] and [`BitFieldWriteOps`] for operations available..
///
/// # Syntax
///
/// `bit(index, access)`
///
/// where
/// * `index`: bit index starting from 0
/// * `access`: access of the bit with the following possible values:
///     - `ro`: read-only ([`BitFieldReadOps`] gets implemented)
///     - `wo`: write-only ([`BitFieldWriteOps`] gets implemented)
///     - `rw`: read and write (both [`BitFieldReadOps`] and [`BitFieldWriteOps`] gets
///         implemented)
///
/// # Examples
///
/// ```ignore
/// regmap::define_regmap_field_descs!(FIELD_DESCS, {
///     (pll_en, 0x0d, RW, {
///         enable => bit(0, rw),
///     })
/// });
///
/// pll_en::enable::set(&mut fields);
/// pll_en::enable::is_set(&mut fields);
/// pll_en::enable::clear(&mut fields);
/// ```
#[macro_export]
macro_rules! regmap_field_bit {
    ($field_name:ident, $access: expr, $reg:literal, $pos:literal, rw) => {
        $crate::static_assert!($access & $crate::regmap::access::RW == $crate::regmap::access::RW);

        $crate::regmap_field_bit!($field_name, $reg, $pos, reserved);
        $crate::regmap_field_bit!($field_name, _ro);
        $crate::regmap_field_bit!($field_name, _wo);
    };

    ($field_name:ident, $access: expr, $reg:literal, $pos:literal, ro) => {
        $crate::static_assert!(
            $access & $crate::regmap::access::READ == $crate::regmap::access::READ
        );

        $crate::regmap_field_bit!($field_name, $reg, $pos, reserved);
        $crate::regmap_field_bit!($field_name, _ro);
    };

    ($field_name:ident, $access: expr, $reg:literal, $pos:literal, wo) => {
        $crate::static_assert!(
            $access & $crate::regmap::access::WRITE == $crate::regmap::access::WRITE
        );

        $crate::regmap_field_bit!($field_name, $reg, $pos, reserved);
        $crate::regmap_field_bit!($field_name, _wo);
    };

    ($field_name:ident, $reg:literal, $pos:literal, reserved) => {
        impl $field_name {
            pub(crate) const fn reg_field() -> $crate::regmap::FieldDesc {
                $crate::regmap::FieldDesc::new($reg, $pos, $pos)
            }

            #[allow(dead_code)]
            pub(crate) const fn mask() -> u32 {
                $crate::genmask!($pos, $pos)
            }
        }
    };

    ($field_name:ident, _ro) => {
        impl super::BitFieldReadOps for $field_name {
            fn is_set<const N: usize>(
                fields: &mut $crate::regmap::Fields<N>,
            ) -> $crate::error::Result<bool> {
                Ok(fields.read(Self::id() as usize)? == 1)
            }
        }
    };

    ($field_name:ident, _wo) => {
        impl super::BitFieldWriteOps for $field_name {
            fn set<const N: usize>(fields: &mut $crate::regmap::Fields<N>) -> $crate::error::Result {
                fields.write(Self::id() as usize, 1, false)
            }

            fn force_set<const N: usize>(
                fields: &mut $crate::regmap::Fields<N>,
            ) -> $crate::error::Result {
                fields.write(Self::id() as usize, 1, true)
            }

            fn clear<const N: usize>(
                fields: &mut $crate::regmap::Fields<N>,
            ) -> $crate::error::Result {
                fields.write(Self::id() as usize, 0, false)
            }

            fn force_clear<const N: usize>(
                fields: &mut $crate::regmap::Fields<N>,
            ) -> $crate::error::Result {
                fields.write(Self::id() as usize, 0, true)
            }
        }
    };
}

/// Enum field
///
/// `enum` should be used when a series of contineous bits represent possible values that can be
/// enumerated.
/// `enum` fields provide type-safety and preventing to write into the fields incorrect values.
///
/// See [`EnumFieldReadOps`] and [`EnumFieldWriteOps`] for operations available..
///
/// # Syntax
///
/// `enum(bits_range, access, { variant_definitions })`
///
/// where
/// * `bits_range`: bit used to store the data.
/// * `access`: access of the bits with the following possible values:
///     - `ro`: read-only ([`EnumFieldReadOps`] gets implemented)
///     - `wo`: write-only ([`EnumFieldWriteOps`] gets implemented)
///     - `rw`: read and write (both [`EnumFieldReadOps`] and [`EnumFieldWriteOps`] gets
///         implemented)
/// * `variant_definitions`: list of all the enum variants using the syntax: `VariantName = Value,`.
///
/// # Examples
///
/// ```ignore
/// regmap::define_regmap_field_descs!(FIELD_DESCS, {
///     (dsi_cfg1, 0x10, RW, {
///         chan_mode => enum([6:5], rw, {
///             Dual = 0x0,
///             Single = 0x1,
///         }),
///     })
/// });
///
/// dsi_cfg1::chan_mode::write(&mut fields, dsi_cfg1::chan_mode_enum::Single);
/// dsi_cfg1::chan_mode::read(&mut fields);
/// ```
#[macro_export]
macro_rules! regmap_field_enum {
    ($field_name:ident, $access: expr, $reg:literal, [$msb:literal:$lsb:literal], ro, {
        $($k:ident = $v:literal,)+ }) => {
        $crate::static_assert!(
            $access & $crate::regmap::access::READ == $crate::regmap::access::READ
        );

        $crate::regmap_field_enum!($field_name, $reg, [$msb:$lsb], reserved, { $($k = $v,)+ });
        $crate::regmap_field_enum!($field_name, _ro);
    };

    ($field_name:ident, $access: expr, $reg:literal, [$msb:literal:$lsb:literal], rw, {
        $($k:ident = $v:literal,)+ }) => {
        $crate::static_assert!($access & $crate::regmap::access::RW == $crate::regmap::access::RW);

        $crate::regmap_field_enum!($field_name, $reg, [$msb:$lsb], reserved, { $($k = $v,)+ });
        $crate::regmap_field_enum!($field_name, _ro);
        $crate::regmap_field_enum!($field_name, _wo);
    };

    ($field_name:ident, $access: expr, $reg:literal, [$msb:literal:$lsb:literal], wo, {
        $($k:ident = $v:literal,)+ }) => {
        $crate::static_assert!(
            $access & $crate::regmap::access::WRITE == $crate::regmap::access::WRITE
        );

        $crate::regmap_field_enum!($field_name, $reg, [$msb:$lsb], reserved, { $($k = $v,)+ });
        $crate::regmap_field_enum!($field_name, _wo);
    };

    ($field_name:ident, $reg:literal, [$msb:literal:$lsb:literal], reserved, {
        $($k:ident = $v:literal,)+ }) => {
        $crate::macros::paste! {
            #[repr(u32)]
            #[allow(non_camel_case_types, dead_code)]
            #[derive(Clone, Copy, Debug, PartialEq, Eq)]
            pub(crate) enum [<$field_name _enum>] {
                $($k = $v,)+
            }

            impl TryFrom<u32> for [<$field_name _enum>] {
                type Error = $crate::error::Error;

                fn try_from(raw_value: u32) -> $crate::error::Result<Self> {
                    match raw_value {
                        $($v => Ok(Self::$k),)+
                        _ => Err($crate::error::code::EINVAL),
                    }
                }
            }

            impl $field_name {
                pub(crate) const fn reg_field() -> $crate::regmap::FieldDesc {
                    $crate::regmap::FieldDesc::new($reg, $lsb, $msb)
                }

                #[allow(dead_code)]
                pub(crate) const fn mask() -> u32 {
                    $crate::genmask!($msb, $lsb)
                }
            }
        }
    };

    ($field_name:ident, _ro) => {
        impl super::EnumFieldReadOps for $field_name {
            type EnumType = $crate::macros::paste! {[<$field_name _enum>]};

            fn read<const N: usize>(
                fields: &mut $crate::regmap::Fields<N>,
            ) -> $crate::error::Result<Self::EnumType> {
                Self::EnumType::try_from(fields.read(Self::id() as usize)?)
            }
        }
    };

    ($field_name:ident, _wo) => {
        impl super::EnumFieldWriteOps for $field_name {
            type EnumType = $crate::macros::paste! {[<$field_name _enum>]};

            fn write<const N: usize>(
                fields: &mut $crate::regmap::Fields<N>,
                val: Self::EnumType
            ) -> $crate::error::Result {
                fields.write(Self::id() as usize, val as u32, false)
            }

            fn force_write<const N: usize>(
                fields: &mut $crate::regmap::Fields<N>,
                val: Self::EnumType
            ) -> $crate::error::Result {
                fields.write(Self::id() as usize, val as u32, true)
            }
        }
    };
}

/// Raw field
///
/// `raw` should be used when bits cannot be represented by any other field types. It provides
/// raw access to the register bits.
///
/// # Syntax
///
/// `raw(bits_range, access)`
///
/// where
/// * `bits_range`: bits used to store the data.
/// * `access`: access of the bit with the following possible values:
///     - `ro`: read-only ([`RawFieldReadOps`] gets implemented)
///     - `wo`: write-only ([`RawFieldWriteOps`] gets implemented)
///     - `rw`: read and write (both [`RawFieldReadOps`] and [`RawFieldWriteOps`] gets
///         implemented)
///
/// # Examples
///
/// ```ignore
/// regmap::define_regmap_field_descs!(FIELD_DESCS, {
///     (device_rev, 0x08, READ, { value => raw([7:0], ro) }),
///     (cha_active_line_length_low, 0x20, RW, {
///         value => raw([7:0], rw),
///     })
/// });
///
/// device_rev::value::read(&mut fields);
/// cha_active_line_length_low::value::write(&mut fields, 0x80);
/// ```
#[macro_export]
macro_rules! regmap_field_raw {
    ($field_name:ident, $access: expr, $reg:literal, [$msb:literal:$lsb:literal], rw) => {
        $crate::static_assert!($access & $crate::regmap::access::RW == $crate::regmap::access::RW);

        $crate::regmap_field_raw!($field_name, $reg, [$msb:$lsb], reserved);
        $crate::regmap_field_raw!($field_name, $reg, [$msb:$lsb], _ro);
        $crate::regmap_field_raw!($field_name, $reg, [$msb:$lsb], _wo);
    };

    ($field_name:ident, $access: expr, $reg:literal, [$msb:literal:$lsb:literal], ro) => {
        $crate::static_assert!(
            $access & $crate::regmap::access::READ == $crate::regmap::access::READ
        );

        $crate::regmap_field_raw!($field_name, $reg, [$msb:$lsb], reserved);
        $crate::regmap_field_raw!($field_name, $reg, [$msb:$lsb], _ro);
    };

    ($field_name:ident, $access: expr, $reg:literal, [$msb:literal:$lsb:literal], wo) => {
        $crate::static_assert!(
            $access & $crate::regmap::access::WRITE == $crate::regmap::access::WRITE
        );

        $crate::regmap_field_raw!($field_name, $reg, [$msb:$lsb], reserved);
        $crate::regmap_field_raw!($field_name, $reg, [$msb:$lsb], _wo);
    };

    ($field_name:ident, $reg:literal, [$msb:literal:$lsb:literal], reserved) => {
        impl $field_name {
            pub(crate) const fn reg_field() -> $crate::regmap::FieldDesc {
                $crate::regmap::FieldDesc::new($reg, $lsb, $msb)
            }

            #[allow(dead_code)]
            pub(crate) const fn mask() -> u32 {
                $crate::genmask!($msb, $lsb)
            }
        }
    };

    ($field_name:ident, $reg:literal, [$msb:literal:$lsb:literal], _ro) => {
        impl super::RawFieldReadOps for $field_name {
            fn read<const N: usize>(
                fields: &mut $crate::regmap::Fields<N>,
            ) -> $crate::error::Result<u32> {
                fields.read(Self::id() as usize)
            }

            fn test_bits<const N: usize>(
                fields: &mut $crate::regmap::Fields<N>,
                bits: u32,
            ) -> $crate::error::Result<bool> {
                fields.test_bits(Self::id() as usize, bits)
            }
        }
    };

    ($field_name:ident, $reg:literal, [$msb:literal:$lsb:literal], _wo) => {
        impl super::RawFieldWriteOps for $field_name {
            fn write<const N: usize>(
                fields: &mut $crate::regmap::Fields<N>,
                val: u32,
            ) -> $crate::error::Result {
                fields.write(Self::id() as usize, val, false)
            }

            fn force_write<const N: usize>(
                fields: &mut $crate::regmap::Fields<N>,
                val: u32,
            ) -> $crate::error::Result {
                fields.write(Self::id() as usize, val, true)
            }

            fn update_bits<const N: usize>(
                fields: &mut $crate::regmap::Fields<N>,
                mask: u32,
                val: u32,
            ) -> $crate::error::Result {
                fields.update_bits(Self::id() as usize, mask, val, false)
            }

            fn force_update_bits<const N: usize>(
                fields: &mut $crate::regmap::Fields<N>,
                mask: u32,
                val: u32,
            ) -> $crate::error::Result {
                fields.update_bits(Self::id() as usize, mask, val, true)
            }

            fn set_bits<const N: usize>(
                fields: &mut $crate::regmap::Fields<N>,
                bits: u32,
            ) -> $crate::error::Result {
                fields.update_bits(Self::id() as usize, bits, bits, false)
            }

            fn clear_bits<const N: usize>(
                fields: &mut $crate::regmap::Fields<N>,
                bits: u32,
            ) -> $crate::error::Result {
                fields.update_bits(Self::id() as usize, bits, 0, false)
            }
        }
    };
}

// macro use only
#[doc(hidden)]
#[macro_export]
macro_rules! regmap_fields {
    ($type:ident, $reg:ident, $access:expr, $name:ident, $($t:tt)*) => {
        $crate::macros::paste! {
            #[allow(non_camel_case_types)]
            pub(crate) struct $name;

            impl $name {
                #[allow(dead_code)]
                pub(crate) const fn id() -> super::Fields {
                    super::Fields::[<$reg _ $name>]
                }
            }

            $crate::[<regmap_field_ $type>]!($name, $access, $($t)*);
        }
    };
}

// macro use only
#[doc(hidden)]
#[macro_export]
macro_rules! regmap_reg_field {
    ($reg_name:ident, $field_name:ident) => {
        register::$reg_name::$field_name::reg_field()
    };
}

// macro use only
#[doc(hidden)]
#[macro_export]
macro_rules! regmap_count_fields {
    () => { 0usize };
    ($type:ident $($rhs:ident)*) => { 1 + $crate::regmap_count_fields!($($rhs)*) };
}

/// Define regmap field descriptors
///
/// # Syntax
///
/// ```ignore
/// define_regmap_field_desc!(VAR_NAME, { <register_definition>, [<register_definition>, ...] });
/// ```
///
/// where `VAR_NAME`: symbol under which the regmap [`Fields`] are available.
///
/// register_definition:
/// ```ignore
/// (name, address, access_permission, { <field_definition>, [<field_definition>, ...] })
/// ```
/// where
///
/// * name: symbol under which this field will be available
/// * address: register address
/// * access_permission: [`access`] permission of the register
///
/// field_definition:
/// ```ignore
/// field_name => <field_type>(...),
/// ```
///
/// where `field_name` is the symbol under which the field will be accessible.
///
/// The following `<field_type>`s are available:
/// * [bit](`regmap_field_bit`)
/// * [enum](`regmap_field_enum`)
/// * [raw](`regmap_field_raw`)
///
/// The macro also defines `register::AccessOps`, the [`ConfigOps`] implementing the declared
/// access permissions, to be passed to [`Config::new`].
#[macro_export]
macro_rules! define_regmap_field_descs {
    ($name:ident, {
        $((
            $reg_name:ident, $reg_addr:literal, $access:expr, {
                $($field_name:ident => $type:ident($($x:tt),*)),* $(,)?
            }
        )),+ $(,)?
    }) => {
        mod register {
            #[allow(unused_imports)]
            use $crate::regmap::{
                access::*,
                BitFieldReadOps, BitFieldWriteOps,
                ConfigOps,
                EnumFieldReadOps, EnumFieldWriteOps,
                RawFieldReadOps, RawFieldWriteOps
            };

            $crate::macros::paste! {
                $(
                    #[allow(dead_code)]
                    pub(crate) mod $reg_name {
                        #[allow(unused_imports)]
                        use $crate::regmap::access::*;
                        $(
                            $crate::regmap_fields!($type, $reg_name, $access, $field_name,
                                                   $reg_addr, $($x),*);
                        )*

                        #[allow(dead_code)]
                        pub(crate) const fn addr() -> u32 {
                            $reg_addr
                        }
                    }
                )+

                #[repr(u32)]
                #[allow(non_camel_case_types, dead_code)]
                pub(crate) enum Fields {
                    $($(
                        [<$reg_name _ $field_name>],
                    )*)+
                }

                pub(crate) struct AccessOps;
                impl ConfigOps for AccessOps {
                    fn is_readable_reg(reg: u32) -> bool {
                        $(
                            $crate::regmap::regmap_check_access!(READ, $access, reg, $reg_addr);
                        )+

                        false
                    }

                    fn is_writeable_reg(reg: u32) -> bool {
                        $(
                            $crate::regmap::regmap_check_access!(WRITE, $access, reg, $reg_addr);
                        )+

                        false
                    }

                    fn is_volatile_reg(reg: u32) -> bool {
                        $(
                            $crate::regmap::regmap_check_access!(VOLATILE, $access, reg, $reg_addr);
                        )+

                        false
                    }

                    fn is_precious_reg(reg: u32) -> bool {
                        $(
                            $crate::regmap::regmap_check_access!(PRECIOUS, $access, reg, $reg_addr);
                        )+

                        false
                    }
                }
            }
        }

        const $name: $crate::regmap::FieldDescs<
            {$crate::regmap_count_fields!($($($type)*)+)}
        > = $crate::regmap::FieldDescs::new([
            $(
                $(
                    $crate::regmap_reg_field!($reg_name, $field_name)
                ),*
            ),+
        ]);
    };
}
pub use define_regmap_field_descs;
