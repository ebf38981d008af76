// SPDX-License-Identifier: GPL-2.0

//! Display modes.
//!
//! C header: [`include/drm/drm_modes.h`](srctree/include/drm/drm_modes.h)

use crate::video::{DisplayFlags, VideoMode};
use bitflags::bitflags;

bitflags! {
    /// Mode flags, `DRM_MODE_FLAG_*`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ModeFlags: u32 {
        /// Positive horizontal sync.
        const PHSYNC = 1 << 0;
        /// Negative horizontal sync.
        const NHSYNC = 1 << 1;
        /// Positive vertical sync.
        const PVSYNC = 1 << 2;
        /// Negative vertical sync.
        const NVSYNC = 1 << 3;
        /// Interlaced.
        const INTERLACE = 1 << 4;
        /// Double scan.
        const DBLSCAN = 1 << 5;
        /// Double clocked.
        const DBLCLK = 1 << 12;
    }
}

bitflags! {
    /// Mode type, `DRM_MODE_TYPE_*`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ModeType: u32 {
        /// Preferred mode of the connector.
        const PREFERRED = 1 << 3;
        /// User defined mode.
        const USERDEF = 1 << 5;
        /// Mode provided by the driver.
        const DRIVER = 1 << 6;
    }
}

bitflags! {
    /// Bus flags, `DRM_BUS_FLAG_*`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct BusFlags: u32 {
        /// Data-enable is active low.
        const DE_LOW = 1 << 0;
        /// Data-enable is active high.
        const DE_HIGH = 1 << 1;
        /// Data is driven on the rising edge of the pixel clock.
        const PIXDATA_DRIVE_POSEDGE = 1 << 2;
        /// Data is driven on the falling edge of the pixel clock.
        const PIXDATA_DRIVE_NEGEDGE = 1 << 3;
    }
}

/// `MEDIA_BUS_FMT_RGB888_1X24`.
pub const MEDIA_BUS_FMT_RGB888_1X24: u32 = 0x100a;

/// Result of a mode validation, `enum drm_mode_status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeStatus {
    /// Mode is usable.
    Ok,
    /// Horizontal timings out of range.
    HSyncRange,
    /// Vertical timings out of range.
    VSyncRange,
    /// Pixel clock too high.
    ClockHigh,
    /// Pixel clock too low.
    ClockLow,
    /// Unspecified reason.
    Bad,
}

/// A display mode, `struct drm_display_mode`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mode {
    /// Name, e.g. `1024x768`.
    pub name: String,
    /// Pixel clock in kHz.
    pub clock: u32,
    pub hdisplay: u32,
    pub hsync_start: u32,
    pub hsync_end: u32,
    pub htotal: u32,
    pub vdisplay: u32,
    pub vsync_start: u32,
    pub vsync_end: u32,
    pub vtotal: u32,
    /// Sync polarities and scan flags.
    pub flags: ModeFlags,
    /// Where the mode comes from.
    pub type_: ModeType,
    /// Physical width of the panel in millimeters.
    pub width_mm: u32,
    /// Physical height of the panel in millimeters.
    pub height_mm: u32,
}

impl Mode {
    /// Builds a mode from a video mode, the equivalent of `drm_display_mode_from_videomode`.
    pub fn from_videomode(vm: &VideoMode) -> Self {
        let hsync_start = vm.hactive.saturating_add(vm.hfront_porch);
        let hsync_end = hsync_start.saturating_add(vm.hsync_len);
        let vsync_start = vm.vactive.saturating_add(vm.vfront_porch);
        let vsync_end = vsync_start.saturating_add(vm.vsync_len);

        let mut flags = ModeFlags::empty();
        for (from, to) in [
            (DisplayFlags::HSYNC_LOW, ModeFlags::NHSYNC),
            (DisplayFlags::HSYNC_HIGH, ModeFlags::PHSYNC),
            (DisplayFlags::VSYNC_LOW, ModeFlags::NVSYNC),
            (DisplayFlags::VSYNC_HIGH, ModeFlags::PVSYNC),
            (DisplayFlags::INTERLACED, ModeFlags::INTERLACE),
            (DisplayFlags::DOUBLESCAN, ModeFlags::DBLSCAN),
            (DisplayFlags::DOUBLECLK, ModeFlags::DBLCLK),
        ] {
            if vm.flags.contains(from) {
                flags |= to;
            }
        }

        let mut mode = Self {
            name: String::new(),
            clock: (vm.pixelclock / 1000) as u32,
            hdisplay: vm.hactive,
            hsync_start,
            hsync_end,
            htotal: hsync_end.saturating_add(vm.hback_porch),
            vdisplay: vm.vactive,
            vsync_start,
            vsync_end,
            vtotal: vsync_end.saturating_add(vm.vback_porch),
            flags,
            ..Default::default()
        };
        mode.set_name();
        mode
    }

    /// Sets the name of the mode from its resolution, `drm_mode_set_name`.
    pub fn set_name(&mut self) {
        let interlaced = if self.flags.contains(ModeFlags::INTERLACE) {
            "i"
        } else {
            ""
        };
        self.name = format!("{}x{}{}", self.hdisplay, self.vdisplay, interlaced);
    }

    /// Refresh rate in Hz, rounded, `drm_mode_vrefresh`.
    pub fn vrefresh(&self) -> u32 {
        if self.htotal == 0 || self.vtotal == 0 {
            return 0;
        }
        let num = u64::from(self.clock) * 1000;
        let den = u64::from(self.htotal) * u64::from(self.vtotal);
        ((num + den / 2) / den) as u32
    }
}

/// Bus flags matching the polarities of a video mode, `drm_bus_flags_from_videomode`.
pub fn bus_flags_from_videomode(vm: &VideoMode) -> BusFlags {
    let mut bus_flags = BusFlags::empty();

    if vm.flags.contains(DisplayFlags::PIXDATA_POSEDGE) {
        bus_flags |= BusFlags::PIXDATA_DRIVE_POSEDGE;
    }
    if vm.flags.contains(DisplayFlags::PIXDATA_NEGEDGE) {
        bus_flags |= BusFlags::PIXDATA_DRIVE_NEGEDGE;
    }
    if vm.flags.contains(DisplayFlags::DE_LOW) {
        bus_flags |= BusFlags::DE_LOW;
    }
    if vm.flags.contains(DisplayFlags::DE_HIGH) {
        bus_flags |= BusFlags::DE_HIGH;
    }

    bus_flags
}

/// Display information of a connector, `struct drm_display_info`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayInfo {
    /// Physical width in millimeters.
    pub width_mm: u32,
    /// Physical height in millimeters.
    pub height_mm: u32,
    /// Bus signal polarities.
    pub bus_flags: BusFlags,
    /// Supported `MEDIA_BUS_FMT_*` formats.
    pub bus_formats: Vec<u32>,
}

impl DisplayInfo {
    /// Replaces the supported bus formats, `drm_display_info_set_bus_formats`.
    pub fn set_bus_formats(&mut self, formats: &[u32]) {
        self.bus_formats = formats.to_vec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xga() -> VideoMode {
        VideoMode {
            pixelclock: 65_000_000,
            hactive: 1024,
            hfront_porch: 24,
            hback_porch: 160,
            hsync_len: 136,
            vactive: 768,
            vfront_porch: 3,
            vback_porch: 29,
            vsync_len: 6,
            flags: DisplayFlags::HSYNC_LOW
                | DisplayFlags::VSYNC_LOW
                | DisplayFlags::DE_HIGH
                | DisplayFlags::PIXDATA_POSEDGE,
        }
    }

    #[test]
    fn mode_from_videomode() {
        let mode = Mode::from_videomode(&xga());
        assert_eq!(mode.name, "1024x768");
        assert_eq!(mode.clock, 65_000);
        assert_eq!(
            (mode.hsync_start, mode.hsync_end, mode.htotal),
            (1048, 1184, 1344)
        );
        assert_eq!((mode.vsync_start, mode.vsync_end, mode.vtotal), (771, 777, 806));
        assert_eq!(mode.flags, ModeFlags::NHSYNC | ModeFlags::NVSYNC);
        assert_eq!(mode.vrefresh(), 60);
        assert_eq!(mode.type_, ModeType::empty());
    }

    #[test]
    fn oversized_timing_saturates() {
        let vm = VideoMode {
            hfront_porch: u32::MAX - 100,
            vback_porch: u32::MAX,
            ..xga()
        };
        let mode = Mode::from_videomode(&vm);
        assert_eq!((mode.hsync_start, mode.hsync_end, mode.htotal), (u32::MAX, u32::MAX, u32::MAX));
        assert_eq!((mode.vsync_end, mode.vtotal), (777, u32::MAX));
    }

    #[test]
    fn bus_flags() {
        assert_eq!(
            bus_flags_from_videomode(&xga()),
            BusFlags::DE_HIGH | BusFlags::PIXDATA_DRIVE_POSEDGE
        );
    }
}
