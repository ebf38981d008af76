// SPDX-License-Identifier: GPL-2.0

//! Display timings and video modes.
//!
//! A [`DisplayTiming`] is what a panel description provides, a [`VideoMode`] is the single
//! timing a display pipeline is programmed with. Timings are parsed from a `display-timings`
//! firmware node with the standard property names.

use crate::{
    error::{code::*, Result},
    fwnode::FwNode,
    pr_err,
};
use bitflags::bitflags;

bitflags! {
    /// Signal polarities and scan flags of a display timing.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DisplayFlags: u32 {
        /// Horizontal sync is active low.
        const HSYNC_LOW = 1 << 0;
        /// Horizontal sync is active high.
        const HSYNC_HIGH = 1 << 1;
        /// Vertical sync is active low.
        const VSYNC_LOW = 1 << 2;
        /// Vertical sync is active high.
        const VSYNC_HIGH = 1 << 3;
        /// Data-enable is active low.
        const DE_LOW = 1 << 4;
        /// Data-enable is active high.
        const DE_HIGH = 1 << 5;
        /// Pixel data is driven on the rising edge of the pixel clock.
        const PIXDATA_POSEDGE = 1 << 6;
        /// Pixel data is driven on the falling edge of the pixel clock.
        const PIXDATA_NEGEDGE = 1 << 7;
        /// Interlaced scan.
        const INTERLACED = 1 << 8;
        /// Each line is scanned twice.
        const DOUBLESCAN = 1 << 9;
        /// Pixel clock is doubled.
        const DOUBLECLK = 1 << 10;
    }
}

/// A display timing, all lengths in pixels or lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisplayTiming {
    /// Pixel clock in Hz.
    pub pixelclock: u32,
    /// Active pixels per line.
    pub hactive: u32,
    /// Horizontal front porch.
    pub hfront_porch: u32,
    /// Horizontal back porch.
    pub hback_porch: u32,
    /// Horizontal sync pulse width.
    pub hsync_len: u32,
    /// Active lines.
    pub vactive: u32,
    /// Vertical front porch.
    pub vfront_porch: u32,
    /// Vertical back porch.
    pub vback_porch: u32,
    /// Vertical sync pulse width.
    pub vsync_len: u32,
    /// Polarity and scan flags.
    pub flags: DisplayFlags,
}

/// A video mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VideoMode {
    /// Pixel clock in Hz.
    pub pixelclock: u64,
    /// Active pixels per line.
    pub hactive: u32,
    /// Horizontal front porch.
    pub hfront_porch: u32,
    /// Horizontal back porch.
    pub hback_porch: u32,
    /// Horizontal sync pulse width.
    pub hsync_len: u32,
    /// Active lines.
    pub vactive: u32,
    /// Vertical front porch.
    pub vfront_porch: u32,
    /// Vertical back porch.
    pub vback_porch: u32,
    /// Vertical sync pulse width.
    pub vsync_len: u32,
    /// Polarity and scan flags.
    pub flags: DisplayFlags,
}

impl VideoMode {
    /// Equivalent of `videomode_from_timing`.
    pub fn from_timing(dt: &DisplayTiming) -> Self {
        Self {
            pixelclock: u64::from(dt.pixelclock),
            hactive: dt.hactive,
            hfront_porch: dt.hfront_porch,
            hback_porch: dt.hback_porch,
            hsync_len: dt.hsync_len,
            vactive: dt.vactive,
            vfront_porch: dt.vfront_porch,
            vback_porch: dt.vback_porch,
            vsync_len: dt.vsync_len,
            flags: dt.flags,
        }
    }

    /// Total pixels per line, blanking included.
    pub fn htotal(&self) -> u32 {
        self.hactive + self.hfront_porch + self.hback_porch + self.hsync_len
    }

    /// Total lines per frame, blanking included.
    pub fn vtotal(&self) -> u32 {
        self.vactive + self.vfront_porch + self.vback_porch + self.vsync_len
    }
}

impl From<&DisplayTiming> for VideoMode {
    fn from(dt: &DisplayTiming) -> Self {
        Self::from_timing(dt)
    }
}

/// Reads a timing entry, either a single value or a `<min typ max>` triplet of which the
/// typical value is used.
fn parse_timing_property(np: &FwNode, name: &str) -> Result<u32> {
    match np.property_count_elem(name) {
        Ok(1) => np.property_read::<u32>(name, None),
        Ok(3) => Ok(np.property_read_array::<u32, 3>(name, None)?[1]),
        _ => {
            pr_err!("{}: could not parse property {}\n", np.name(), name);
            Err(EINVAL)
        }
    }
}

/// Parses one timing node, the equivalent of `of_parse_display_timing`.
pub fn of_parse_display_timing(np: &FwNode) -> Result<DisplayTiming> {
    let mut dt = DisplayTiming {
        hback_porch: parse_timing_property(np, "hback-porch")?,
        hfront_porch: parse_timing_property(np, "hfront-porch")?,
        hactive: parse_timing_property(np, "hactive")?,
        hsync_len: parse_timing_property(np, "hsync-len")?,
        vback_porch: parse_timing_property(np, "vback-porch")?,
        vfront_porch: parse_timing_property(np, "vfront-porch")?,
        vactive: parse_timing_property(np, "vactive")?,
        vsync_len: parse_timing_property(np, "vsync-len")?,
        pixelclock: parse_timing_property(np, "clock-frequency")?,
        flags: DisplayFlags::empty(),
    };

    let polarity = |name: &str, low: DisplayFlags, high: DisplayFlags| {
        match np.property_read::<u32>(name, None) {
            Ok(0) => low,
            Ok(_) => high,
            Err(_) => DisplayFlags::empty(),
        }
    };
    dt.flags |= polarity("vsync-active", DisplayFlags::VSYNC_LOW, DisplayFlags::VSYNC_HIGH);
    dt.flags |= polarity("hsync-active", DisplayFlags::HSYNC_LOW, DisplayFlags::HSYNC_HIGH);
    dt.flags |= polarity("de-active", DisplayFlags::DE_LOW, DisplayFlags::DE_HIGH);
    dt.flags |= polarity(
        "pixelclk-active",
        DisplayFlags::PIXDATA_NEGEDGE,
        DisplayFlags::PIXDATA_POSEDGE,
    );

    if np.property_read_bool("interlaced") {
        dt.flags |= DisplayFlags::INTERLACED;
    }
    if np.property_read_bool("doublescan") {
        dt.flags |= DisplayFlags::DOUBLESCAN;
    }
    if np.property_read_bool("doubleclk") {
        dt.flags |= DisplayFlags::DOUBLECLK;
    }

    Ok(dt)
}

/// All timings of a `display-timings` node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayTimings {
    /// Index of the native mode in `timings`.
    pub native_mode: usize,
    /// The timings, in node order.
    pub timings: Vec<DisplayTiming>,
}

/// Parses the `display-timings` child of `np`, the equivalent of `of_get_display_timings`.
///
/// The native mode is the timing the `native-mode` property points at, else the first one.
pub fn of_get_display_timings(np: &FwNode) -> Result<DisplayTimings> {
    let timings_np = np.get_child_by_name("display-timings").ok_or(ENOENT)?;
    let native = timings_np.property_read_reference("native-mode").ok();

    let mut native_mode = 0;
    let mut timings = Vec::new();
    for (index, entry) in timings_np.children().enumerate() {
        if native
            .as_ref()
            .is_some_and(|native| FwNode::ptr_eq(native, entry))
        {
            native_mode = index;
        }
        timings.push(of_parse_display_timing(entry)?);
    }

    if timings.is_empty() {
        pr_err!("{}: no timings specified\n", np.name());
        return Err(EINVAL);
    }

    Ok(DisplayTimings {
        native_mode,
        timings,
    })
}

/// Gets a video mode from the `display-timings` child of `np`.
///
/// `index` selects a timing, `None` selecting the native mode.
pub fn of_get_videomode(np: &FwNode, index: Option<usize>) -> Result<VideoMode> {
    let disp = of_get_display_timings(np)?;
    let index = index.unwrap_or(disp.native_mode);
    let dt = disp.timings.get(index).ok_or(EINVAL)?;
    Ok(VideoMode::from_timing(dt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::Arc;

    fn timing(name: &str, hactive: u32) -> Arc<FwNode> {
        FwNode::builder(name)
            .u32("clock-frequency", 148_500_000)
            .u32("hactive", hactive)
            .u32("vactive", 1080)
            .u32_array("hfront-porch", &[80, 88, 96])
            .u32("hback-porch", 148)
            .u32("hsync-len", 44)
            .u32("vfront-porch", 4)
            .u32("vback-porch", 36)
            .u32("vsync-len", 5)
            .u32("hsync-active", 1)
            .u32("vsync-active", 0)
            .u32("de-active", 1)
            .u32("pixelclk-active", 0)
            .build()
    }

    #[test]
    fn parses_timing_entry() {
        let dt = of_parse_display_timing(&timing("t0", 1920)).unwrap();
        assert_eq!(dt.pixelclock, 148_500_000);
        assert_eq!(dt.hfront_porch, 88);
        assert_eq!(
            dt.flags,
            DisplayFlags::HSYNC_HIGH
                | DisplayFlags::VSYNC_LOW
                | DisplayFlags::DE_HIGH
                | DisplayFlags::PIXDATA_NEGEDGE
        );

        let vm = VideoMode::from(&dt);
        assert_eq!(vm.htotal(), 1920 + 88 + 148 + 44);
        assert_eq!(vm.vtotal(), 1080 + 4 + 36 + 5);
    }

    #[test]
    fn missing_required_property() {
        let np = FwNode::builder("t").u32("hactive", 800).build();
        assert_eq!(of_parse_display_timing(&np), Err(EINVAL));
    }

    #[test]
    fn native_mode_selects_timing() {
        let t0 = timing("t0", 1920);
        let t1 = timing("t1", 1280);
        let timings = FwNode::builder("display-timings")
            .reference("native-mode", &t1)
            .child(t0)
            .child(t1)
            .build();
        let np = FwNode::builder("bridge").child(timings).build();

        assert_eq!(of_get_videomode(&np, None).unwrap().hactive, 1280);
        assert_eq!(of_get_videomode(&np, Some(0)).unwrap().hactive, 1920);
        assert_eq!(of_get_videomode(&np, Some(2)), Err(EINVAL));
    }

    #[test]
    fn no_timings_node() {
        let np = FwNode::builder("bridge").build();
        assert_eq!(of_get_videomode(&np, None), Err(ENOENT));

        let empty = FwNode::builder("bridge")
            .child(FwNode::builder("display-timings").build())
            .build();
        assert_eq!(of_get_videomode(&empty, None), Err(EINVAL));
    }
}
