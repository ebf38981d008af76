// SPDX-License-Identifier: GPL-2.0

//! Memory-mapped and bus IO helpers.

pub mod poll;
