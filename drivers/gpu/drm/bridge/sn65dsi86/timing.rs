// SPDX-License-Identifier: GPL-2.0

//! Default panel timing and register value helpers.

use kernel::{
    mipi_dsi::PixelFormat,
    video::{DisplayFlags, DisplayTiming},
};

/// Timing used when the device node carries no `display-timings`.
pub(crate) const PANEL_DEFAULT_TIMING: DisplayTiming = DisplayTiming {
    pixelclock: 60_000_000,
    hactive: 1024,
    hfront_porch: 160,
    hback_porch: 160,
    hsync_len: 1,
    vactive: 768,
    vfront_porch: 15,
    vback_porch: 23,
    vsync_len: 1,
    flags: DisplayFlags::HSYNC_LOW
        .union(DisplayFlags::VSYNC_LOW)
        .union(DisplayFlags::DE_LOW)
        .union(DisplayFlags::PIXDATA_NEGEDGE),
};

/// Low byte of a 16-bit timing value.
pub(crate) const fn low(val: u32) -> u8 {
    (val & 0xff) as u8
}

/// High byte of a 16-bit timing value.
pub(crate) const fn high(val: u32) -> u8 {
    ((val >> 8) & 0xff) as u8
}

/// Places `val` into the bits selected by `mask`.
pub(crate) const fn field_prep(mask: u32, val: u32) -> u8 {
    ((val << mask.trailing_zeros()) & mask & 0xff) as u8
}

const DSI_CLK_RANGE_MIN: u64 = 0x08;
const DSI_CLK_RANGE_MAX: u64 = 0x64;
const DSI_CLK_RANGE_STEP_HZ: u64 = 5_000_000;

/// Value of the `DSI_CH{A,B}_CLK_RANGE` registers.
///
/// The DSI clock is DDR: each lane of each channel carries two bits per clock cycle. The register
/// holds the clock in 5 MHz steps, 40 MHz to 500 MHz.
pub(crate) fn dsi_clk_range(pixelclock: u64, lanes: u8, channels: u8) -> u8 {
    let bits_per_cycle = 2 * u64::from(lanes.max(1)) * u64::from(channels.max(1));
    let clk = pixelclock * u64::from(PixelFormat::Rgb888.bpp()) / bits_per_cycle;
    (clk / DSI_CLK_RANGE_STEP_HZ).clamp(DSI_CLK_RANGE_MIN, DSI_CLK_RANGE_MAX) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_pairs_round_trip() {
        for v in 0..=u16::MAX {
            let v = u32::from(v);
            assert_eq!((u32::from(high(v)) << 8) | u32::from(low(v)), v & 0xffff);
        }
        assert_eq!(high(0x1_0780), 0x07);
    }

    #[test]
    fn field_prep_masks() {
        assert_eq!(field_prep(0b0110_0000, 1), 0x20);
        assert_eq!(field_prep(0b0001_1000, 0), 0x00);
        assert_eq!(field_prep(0b0001_1000, 7), 0x18);
    }

    #[test]
    fn clock_range() {
        // 1920x1080@60 over four lanes: 445.5 MHz.
        assert_eq!(dsi_clk_range(148_500_000, 4, 1), 0x59);
        assert_eq!(dsi_clk_range(60_000_000, 2, 1), 0x48);
        assert_eq!(dsi_clk_range(10_000_000, 4, 2), 0x08);
        assert_eq!(dsi_clk_range(600_000_000, 1, 1), 0x64);
    }
}
