// SPDX-License-Identifier: GPL-2.0

//! Firmware device nodes.
//!
//! A [`FwNode`] is one node of the hardware description handed to a driver: named properties
//! holding flags, 32-bit cells, strings or references to other nodes, plus child nodes. Nodes are
//! shared through [`Arc`] and compared by identity, the same way the C side compares
//! `struct fwnode_handle` pointers.

use crate::{
    error::{code::*, Result},
    sync::Arc,
};
use std::collections::BTreeMap;
use std::fmt;

/// Integer types a property cell can be read as.
pub trait Integer: Copy {
    /// Converts one 32-bit property cell, failing with `ERANGE` if it does not fit.
    fn from_cell(cell: u32) -> Result<Self>;
}

macro_rules! impl_integer {
    ($($t:ty),*) => {
        $(
            impl Integer for $t {
                fn from_cell(cell: u32) -> Result<Self> {
                    <$t>::try_from(cell).map_err(|_| ERANGE)
                }
            }
        )*
    };
}

impl_integer!(u8, u16, u32, u64, i32, i64, usize);

/// Value of a single firmware property.
#[derive(Clone)]
pub enum Property {
    /// A property without value; its presence is the information.
    Flag,
    /// An array of 32-bit cells.
    Cells(Vec<u32>),
    /// A list of strings.
    Strings(Vec<String>),
    /// A reference to another node (a phandle).
    Reference(Arc<FwNode>),
}

/// A firmware node.
pub struct FwNode {
    name: String,
    properties: BTreeMap<String, Property>,
    children: Vec<Arc<FwNode>>,
}

impl FwNode {
    /// Starts building a node called `name`.
    pub fn builder(name: &str) -> FwNodeBuilder {
        FwNodeBuilder {
            node: FwNode {
                name: name.to_owned(),
                properties: BTreeMap::new(),
                children: Vec::new(),
            },
        }
    }

    /// Name of the node, including any unit address.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether `a` and `b` are the same node.
    pub fn ptr_eq(a: &Arc<FwNode>, b: &Arc<FwNode>) -> bool {
        Arc::ptr_eq(a, b)
    }

    /// Returns if a firmware property `name` is present
    pub fn property_present(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Returns if a firmware property `name` is true or false
    pub fn property_read_bool(&self, name: &str) -> bool {
        self.property_present(name)
    }

    /// Returns the first string of firmware string property `name`
    pub fn property_read_string(&self, name: &str) -> Result<&str> {
        match self.properties.get(name) {
            Some(Property::Strings(strings)) => strings.first().map(String::as_str).ok_or(ENODATA),
            Some(_) => Err(EINVAL),
            None => Err(EINVAL),
        }
    }

    /// Returns the index of matching string `match_str` for firmware string property `name`
    pub fn property_match_string(&self, name: &str, match_str: &str) -> Result<usize> {
        match self.properties.get(name) {
            Some(Property::Strings(strings)) => {
                strings.iter().position(|s| s == match_str).ok_or(ENODATA)
            }
            Some(_) => Err(EINVAL),
            None => Err(EINVAL),
        }
    }

    /// Returns firmware property `name` integer scalar value
    pub fn property_read<T: Integer>(&self, name: &str, default: Option<T>) -> Result<T> {
        let default = default.map(|default| [default; 1]);

        let val = Self::property_read_array(self, name, default)?;
        Ok(val[0])
    }

    /// Returns firmware property `name` integer array values
    pub fn property_read_array<T: Integer, const N: usize>(
        &self,
        name: &str,
        default: Option<[T; N]>,
    ) -> Result<[T; N]> {
        let cells = match self.properties.get(name) {
            Some(Property::Cells(cells)) if cells.len() >= N => cells,
            Some(Property::Cells(_)) => return default.ok_or(EOVERFLOW),
            _ => return default.ok_or(EINVAL),
        };

        let mut val = [T::from_cell(0)?; N];
        for (slot, cell) in val.iter_mut().zip(cells) {
            *slot = T::from_cell(*cell)?;
        }
        Ok(val)
    }

    /// Returns firmware property `name` integer array values in a Vec
    pub fn property_read_array_vec<T: Integer>(&self, name: &str, len: usize) -> Result<Vec<T>> {
        match self.properties.get(name) {
            Some(Property::Cells(cells)) if cells.len() >= len => {
                cells[..len].iter().map(|cell| T::from_cell(*cell)).collect()
            }
            Some(Property::Cells(_)) => Err(EOVERFLOW),
            _ => Err(EINVAL),
        }
    }

    /// Returns integer array length for firmware property `name`
    pub fn property_count_elem(&self, name: &str) -> Result<usize> {
        match self.properties.get(name) {
            Some(Property::Cells(cells)) => Ok(cells.len()),
            Some(_) => Err(EINVAL),
            None => Err(EINVAL),
        }
    }

    /// Returns the node referenced by property `name`
    pub fn property_read_reference(&self, name: &str) -> Result<Arc<FwNode>> {
        match self.properties.get(name) {
            Some(Property::Reference(node)) => Ok(node.clone()),
            Some(_) => Err(EINVAL),
            None => Err(ENOENT),
        }
    }

    /// Returns the child node called `name`
    pub fn get_child_by_name(&self, name: &str) -> Option<Arc<FwNode>> {
        self.children.iter().find(|child| child.name == name).cloned()
    }

    /// Iterates over the child nodes in declaration order.
    pub fn children(&self) -> impl Iterator<Item = &Arc<FwNode>> {
        self.children.iter()
    }

    /// Returns the first graph endpoint below this node.
    ///
    /// Endpoints are nodes called `endpoint` or `endpoint@N`, usually nested in `port` nodes.
    pub fn graph_get_next_endpoint(&self) -> Option<Arc<FwNode>> {
        for child in &self.children {
            if child.name == "endpoint" || child.name.starts_with("endpoint@") {
                return Some(child.clone());
            }
            if let Some(endpoint) = child.graph_get_next_endpoint() {
                return Some(endpoint);
            }
        }
        None
    }

    /// Returns the device node at the other end of the first graph link of this node.
    pub fn graph_get_remote_node(&self) -> Option<Arc<FwNode>> {
        self.graph_get_next_endpoint()?
            .property_read_reference("remote-endpoint")
            .ok()
    }
}

impl fmt::Debug for FwNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FwNode").field("name", &self.name).finish()
    }
}

/// Builder for [`FwNode`]s.
///
/// # Examples
///
/// ```
/// use kernel::fwnode::FwNode;
///
/// let host = FwNode::builder("dsi@30a00000").build();
/// let node = FwNode::builder("bridge@2d")
///     .string("compatible", "ti,sn65dsi86")
///     .u32("ti,dsi-lanes", 4)
///     .flag("ti,burst-mode")
///     .graph_link(&host)
///     .build();
///
/// assert_eq!(node.property_read::<u32>("ti,dsi-lanes", None), Ok(4));
/// assert!(FwNode::ptr_eq(&node.graph_get_remote_node().unwrap(), &host));
/// ```
pub struct FwNodeBuilder {
    node: FwNode,
}

impl FwNodeBuilder {
    fn property(mut self, name: &str, property: Property) -> Self {
        self.node.properties.insert(name.to_owned(), property);
        self
    }

    /// Adds a boolean property.
    pub fn flag(self, name: &str) -> Self {
        self.property(name, Property::Flag)
    }

    /// Adds a single-cell property.
    pub fn u32(self, name: &str, val: u32) -> Self {
        self.property(name, Property::Cells(vec![val]))
    }

    /// Adds a multi-cell property.
    pub fn u32_array(self, name: &str, vals: &[u32]) -> Self {
        self.property(name, Property::Cells(vals.to_vec()))
    }

    /// Adds a string property.
    pub fn string(self, name: &str, val: &str) -> Self {
        self.property(name, Property::Strings(vec![val.to_owned()]))
    }

    /// Adds a reference to `node`.
    pub fn reference(self, name: &str, node: &Arc<FwNode>) -> Self {
        self.property(name, Property::Reference(node.clone()))
    }

    /// Adds a child node.
    pub fn child(mut self, child: Arc<FwNode>) -> Self {
        self.node.children.push(child);
        self
    }

    /// Adds a `port` with one `endpoint` linked to the device node `remote`.
    pub fn graph_link(self, remote: &Arc<FwNode>) -> Self {
        let endpoint = FwNode::builder("endpoint")
            .reference("remote-endpoint", remote)
            .build();
        let port = FwNode::builder("port").child(endpoint).build();
        self.child(port)
    }

    /// Finishes the node.
    pub fn build(self) -> Arc<FwNode> {
        Arc::new(self.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> Arc<FwNode> {
        FwNode::builder("bridge@2d")
            .string("compatible", "ti,sn65dsi86")
            .u32("ti,dsi-lanes", 4)
            .u32_array("reg", &[0x2d, 0x300])
            .flag("ti,burst-mode")
            .child(FwNode::builder("display-timings").build())
            .build()
    }

    #[test]
    fn scalar_reads_and_defaults() {
        let node = node();
        assert_eq!(node.property_read::<u32>("ti,dsi-lanes", None), Ok(4));
        assert_eq!(node.property_read::<u8>("ti,dsi-lanes", Some(2)), Ok(4));
        assert_eq!(node.property_read::<u32>("ti,dp-bpp", Some(24)), Ok(24));
        assert_eq!(node.property_read::<u32>("ti,dp-bpp", None), Err(EINVAL));
        assert_eq!(node.property_read::<u8>("reg", None), Ok(0x2d));
    }

    #[test]
    fn arrays() {
        let node = node();
        assert_eq!(node.property_read_array::<u32, 2>("reg", None), Ok([0x2d, 0x300]));
        assert_eq!(node.property_read_array::<u32, 3>("reg", None), Err(EOVERFLOW));
        assert_eq!(node.property_count_elem("reg"), Ok(2));
        assert_eq!(node.property_read_array_vec::<u8>("reg", 2), Err(ERANGE));
    }

    #[test]
    fn strings_and_flags() {
        let node = node();
        assert!(node.property_read_bool("ti,burst-mode"));
        assert!(!node.property_read_bool("ti,de-neg-polarity"));
        assert_eq!(node.property_read_string("compatible"), Ok("ti,sn65dsi86"));
        assert_eq!(node.property_match_string("compatible", "ti,sn65dsi86"), Ok(0));
        assert_eq!(node.property_match_string("compatible", "ti,sn65dsi83"), Err(ENODATA));
        assert_eq!(node.property_read_string("ti,dsi-lanes"), Err(EINVAL));
    }

    #[test]
    fn children_and_graph() {
        let host = FwNode::builder("dsi").build();
        let node = FwNode::builder("bridge").graph_link(&host).build();

        assert!(node.get_child_by_name("port").is_some());
        assert_eq!(node.graph_get_next_endpoint().map(|e| e.name().to_owned()), Some("endpoint".into()));
        let remote = node.graph_get_remote_node().expect("remote");
        assert!(FwNode::ptr_eq(&remote, &host));
        assert!(host.graph_get_remote_node().is_none());
    }
}
