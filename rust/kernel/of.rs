// SPDX-License-Identifier: GPL-2.0

//! Device tree matching.
//!
//! A driver lists the `compatible` strings it handles in an [`IdTable`]; a device matches when
//! its firmware node names one of them in its own `compatible` property.

use crate::fwnode::FwNode;

/// An OF device id: one `compatible` string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceId {
    compatible: &'static str,
}

impl DeviceId {
    /// Create a new device id from an OF 'compatible' string.
    pub const fn new(compatible: &'static str) -> Self {
        Self { compatible }
    }

    /// The `compatible` string of this id.
    pub const fn compatible(&self) -> &'static str {
        self.compatible
    }
}

/// OF [`DeviceId`] table, each id paired with the driver's information about it.
pub type IdTable<T> = &'static [(DeviceId, T)];

/// Returns the info of the first entry of `table` that `node` is compatible with.
pub fn match_node<T>(table: IdTable<T>, node: &FwNode) -> Option<&'static T> {
    table
        .iter()
        .find(|(id, _)| node.property_match_string("compatible", id.compatible).is_ok())
        .map(|(_, info)| info)
}

/// Create an OF `IdTable`.
///
/// # Examples
///
/// ```
/// use kernel::of;
///
/// kernel::of_device_table!(
///     OF_ID_TABLE,
///     u32,
///     [(of::DeviceId::new("ti,sn65dsi86"), 86),]
/// );
/// assert_eq!(OF_ID_TABLE.len(), 1);
/// ```
#[macro_export]
macro_rules! of_device_table {
    ($table_name:ident, $id_info_type: ty, $table_data: expr) => {
        const $table_name: [($crate::of::DeviceId, $id_info_type); $table_data.len()] =
            $table_data;
    };
}
