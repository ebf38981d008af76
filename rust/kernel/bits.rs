// SPDX-License-Identifier: GPL-2.0

//! Bit manipulation macros.
//!
//! The register maps of the chips driven from this tree are 8 bits wide, so the helpers here
//! work on `u32` and leave narrowing to the caller.

/// Produces a literal where bit `n` is set.
///
/// Equivalent to the kernel's `BIT` macro.
#[macro_export]
macro_rules! bit {
    ($n:expr) => {
        (1u32 << $n)
    };
}

/// Create a contiguous bitmask starting at bit position `l` and ending at
/// position `h`, where `h >= l`.
///
/// # Examples
/// ```
///     use kernel::genmask;
///     let mask = genmask!(3, 1);
///     assert_eq!(mask, 0b1110);
/// ```
#[macro_export]
macro_rules! genmask {
    ($h:expr, $l:expr) => {{
        const _: () = {
            assert!($h >= $l);
            assert!($h < 32);
        };
        ((!0u32 - (1u32 << $l) + 1) & (!0u32 >> (32 - 1 - $h)))
    }};
}

/// Runtime counterpart of [`genmask!`] for field descriptors whose bounds are only known as
/// values.
///
/// Returns an empty mask if `h < l` or `h` is out of range.
pub const fn genmask(h: u32, l: u32) -> u32 {
    if h < l || h >= 32 {
        return 0;
    }
    (!0u32 - (1u32 << l) + 1) & (!0u32 >> (32 - 1 - h))
}
