// SPDX-License-Identifier: GPL-2.0

//! DRM bridges.
//!
//! C header: [`include/drm/drm_bridge.h`](srctree/include/drm/drm_bridge.h)
//!
//! A bridge driver implements [`Funcs`] and publishes itself with [`Registration::add`], keyed
//! by its firmware node. The display controller looks it up with [`of_find_bridge`] and calls
//! [`Bridge::attach`] with its encoder.

use super::{
    connector::Encoder,
    mode::Mode,
};
use crate::{
    error::{code::*, Result},
    fwnode::FwNode,
    sync::{Arc, Mutex, Weak},
};

/// Bridge callbacks, `struct drm_bridge_funcs`.
pub trait Funcs: Send + Sync {
    /// Called when the bridge gets attached to an encoder.
    ///
    /// `encoder` is `None` when the bridge is attached before its encoder exists.
    fn attach(&self, encoder: Option<&Arc<Encoder>>) -> Result;

    /// Called when the bridge gets detached.
    fn detach(&self) {}

    /// Called once the upstream pipeline is running.
    fn enable(&self) {}

    /// Called before the upstream pipeline stops.
    fn disable(&self) {}

    /// Called with the requested and the adjusted mode before enabling.
    fn mode_set(&self, _mode: &Mode, _adjusted_mode: &Mode) {}
}

/// A registered bridge.
pub struct Bridge {
    of_node: Arc<FwNode>,
    funcs: Weak<dyn Funcs>,
}

impl Bridge {
    /// Firmware node of the bridge.
    pub fn of_node(&self) -> &Arc<FwNode> {
        &self.of_node
    }

    fn funcs(&self) -> Result<Arc<dyn Funcs>> {
        self.funcs.upgrade().ok_or(ENODEV)
    }

    /// Attaches the bridge to `encoder`, `drm_bridge_attach`.
    pub fn attach(&self, encoder: Option<&Arc<Encoder>>) -> Result {
        self.funcs()?.attach(encoder)
    }

    /// Detaches the bridge, `drm_bridge_detach`.
    pub fn detach(&self) {
        if let Ok(funcs) = self.funcs() {
            funcs.detach();
        }
    }

    /// Enables the bridge.
    pub fn enable(&self) {
        if let Ok(funcs) = self.funcs() {
            funcs.enable();
        }
    }

    /// Disables the bridge.
    pub fn disable(&self) {
        if let Ok(funcs) = self.funcs() {
            funcs.disable();
        }
    }

    /// Passes the mode to be set to the bridge.
    pub fn mode_set(&self, mode: &Mode, adjusted_mode: &Mode) {
        if let Ok(funcs) = self.funcs() {
            funcs.mode_set(mode, adjusted_mode);
        }
    }
}

static BRIDGES: Mutex<Vec<Arc<Bridge>>> = Mutex::new(Vec::new());

/// Keeps a bridge listed while alive, `drm_bridge_add` and `drm_bridge_remove`.
pub struct Registration {
    bridge: Arc<Bridge>,
}

impl Registration {
    /// Adds the bridge implemented by `funcs` for the device described by `of_node`.
    ///
    /// Fails with `EBUSY` if a bridge is already registered for the node.
    pub fn add(of_node: &Arc<FwNode>, funcs: Weak<dyn Funcs>) -> Result<Self> {
        let mut bridges = BRIDGES.lock();
        if bridges
            .iter()
            .any(|bridge| FwNode::ptr_eq(&bridge.of_node, of_node))
        {
            return Err(EBUSY);
        }

        let bridge = Arc::new(Bridge {
            of_node: of_node.clone(),
            funcs,
        });
        bridges.push(bridge.clone());
        Ok(Self { bridge })
    }

    /// The registered bridge.
    pub fn bridge(&self) -> &Arc<Bridge> {
        &self.bridge
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        BRIDGES
            .lock()
            .retain(|bridge| !Arc::ptr_eq(bridge, &self.bridge));
    }
}

/// Finds the bridge registered for `np`, `of_drm_find_bridge`.
pub fn of_find_bridge(np: &Arc<FwNode>) -> Option<Arc<Bridge>> {
    BRIDGES
        .lock()
        .iter()
        .find(|bridge| FwNode::ptr_eq(&bridge.of_node, np))
        .cloned()
}
