//! Pixel format registry.
//!
//! [`FormatTag`] is the runtime identifier carried by external buffers and
//! dispatcher keys. [`Format`] is its compile-time counterpart: each marker
//! type fixes the scalar and lane vector a matrix of that format is built
//! from. A type that does not implement [`Format`] cannot parameterize a
//! matrix.

use crate::convert::dispatcher::{LoadFn, Routine, StoreFn};
use crate::simd::{Lane, Vec16x8u, Vec4x32u, PROFILE};
use crate::types::LaneElement;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::mem::size_of;

/// Enumerated pixel layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum FormatTag {
    /// One 8-bit grey value per pixel.
    Grey8 = 0,
    /// Three 8-bit channels per pixel, blue first.
    Bgr24 = 1,
    /// Four 8-bit channels per pixel, blue first, alpha last.
    Bgra32 = 2,
}

impl FormatTag {
    /// Every registered format.
    pub const ALL: [FormatTag; 3] = [FormatTag::Grey8, FormatTag::Bgr24, FormatTag::Bgra32];

    /// Bytes one pixel occupies in an external buffer.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            FormatTag::Grey8 => 1,
            FormatTag::Bgr24 => 3,
            FormatTag::Bgra32 => 4,
        }
    }

    /// Number of colour channels.
    pub const fn channels(self) -> usize {
        match self {
            FormatTag::Grey8 => 1,
            FormatTag::Bgr24 => 3,
            FormatTag::Bgra32 => 4,
        }
    }

    /// Canonical upper-case name.
    pub const fn name(self) -> &'static str {
        match self {
            FormatTag::Grey8 => "GREY_8",
            FormatTag::Bgr24 => "BGR_24",
            FormatTag::Bgra32 => "BGRA_32",
        }
    }

    /// Expand one pixel to `[b, g, r, a]`.
    ///
    /// Grey is replicated into every colour channel; formats without alpha
    /// report it as opaque.
    #[inline]
    pub fn decode_bgra(self, px: &[u8]) -> [u8; 4] {
        match self {
            FormatTag::Grey8 => [px[0], px[0], px[0], u8::MAX],
            FormatTag::Bgr24 => [px[0], px[1], px[2], u8::MAX],
            FormatTag::Bgra32 => [px[0], px[1], px[2], px[3]],
        }
    }

    /// Write one `[b, g, r, a]` pixel in this format to the front of `out`.
    #[inline]
    pub fn encode_bgra(self, bgra: [u8; 4], out: &mut [u8]) {
        match self {
            FormatTag::Grey8 => out[0] = luma(bgra),
            FormatTag::Bgr24 => out[..3].copy_from_slice(&bgra[..3]),
            FormatTag::Bgra32 => out[..4].copy_from_slice(&bgra),
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Integer BT.601 luma of a `[b, g, r, _]` pixel.
#[inline]
pub fn luma(bgra: [u8; 4]) -> u8 {
    let [b, g, r, _] = bgra.map(u32::from);
    ((29 * b + 150 * g + 77 * r + 128) >> 8) as u8
}

/// Compile-time description of a matrix element format.
pub trait Format: Copy + Default + fmt::Debug + Send + Sync + 'static {
    /// Runtime tag of the format.
    const TAG: FormatTag;

    /// Matrix scalars per pixel.
    const CHANNELS: usize;

    /// Scalar type of one matrix element.
    type Scalar: LaneElement;

    /// Lane vector packing one register's worth of scalars.
    type Lane: Lane<Element = Self::Scalar>;

    /// Row alignment in scalars.
    const ALIGNMENT: usize = PROFILE.alignment_in_elements(size_of::<Self::Scalar>());

    #[doc(hidden)]
    fn load_routine(routine: LoadFn<Self>) -> Routine;

    #[doc(hidden)]
    fn as_load_routine(routine: &Routine) -> Option<LoadFn<Self>>;

    #[doc(hidden)]
    fn store_routine(routine: StoreFn<Self>) -> Routine;

    #[doc(hidden)]
    fn as_store_routine(routine: &Routine) -> Option<StoreFn<Self>>;
}

macro_rules! define_format {
    (
        $(#[$meta:meta])*
        $name:ident: $tag:ident, $scalar:ty, $lane:ty, channels = $channels:literal,
        $load:ident, $store:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name;

        impl Format for $name {
            const TAG: FormatTag = FormatTag::$tag;
            const CHANNELS: usize = $channels;
            type Scalar = $scalar;
            type Lane = $lane;

            fn load_routine(routine: LoadFn<Self>) -> Routine {
                Routine::$load(routine)
            }

            fn as_load_routine(routine: &Routine) -> Option<LoadFn<Self>> {
                match *routine {
                    Routine::$load(f) => Some(f),
                    _ => None,
                }
            }

            fn store_routine(routine: StoreFn<Self>) -> Routine {
                Routine::$store(routine)
            }

            fn as_store_routine(routine: &Routine) -> Option<StoreFn<Self>> {
                match *routine {
                    Routine::$store(f) => Some(f),
                    _ => None,
                }
            }
        }
    };
}

define_format! {
    /// 8-bit greyscale: one `u8` per pixel.
    Grey8: Grey8, u8, Vec16x8u, channels = 1, LoadGrey8, StoreGrey8
}

define_format! {
    /// 24-bit BGR: three interleaved `u8` scalars per pixel.
    Bgr24: Bgr24, u8, Vec16x8u, channels = 3, LoadBgr24, StoreBgr24
}

define_format! {
    /// 32-bit BGRA: one `u32` per pixel holding the bytes `b, g, r, a` in
    /// memory order (`u32::from_ne_bytes([b, g, r, a])`).
    Bgra32: Bgra32, u32, Vec4x32u, channels = 1, LoadBgra32, StoreBgra32
}

/// Bytes one matrix element of `F` spans per pixel.
#[inline]
pub const fn pixel_bytes<F: Format>() -> usize {
    F::CHANNELS * size_of::<F::Scalar>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_values() {
        assert_eq!(FormatTag::Grey8 as u8, 0);
        assert_eq!(FormatTag::Bgr24 as u8, 1);
        assert_eq!(FormatTag::Bgra32 as u8, 2);
        assert_eq!(FormatTag::Bgr24.to_string(), "BGR_24");
    }

    #[test]
    fn test_pixel_bytes_match_tags() {
        assert_eq!(pixel_bytes::<Grey8>(), Grey8::TAG.bytes_per_pixel());
        assert_eq!(pixel_bytes::<Bgr24>(), Bgr24::TAG.bytes_per_pixel());
        assert_eq!(pixel_bytes::<Bgra32>(), Bgra32::TAG.bytes_per_pixel());
    }

    #[test]
    fn test_alignment_in_scalars() {
        assert_eq!(Grey8::ALIGNMENT, PROFILE.alignment);
        assert_eq!(Bgra32::ALIGNMENT, PROFILE.alignment / 4);
        assert_eq!(Grey8::ALIGNMENT % <<Grey8 as Format>::Lane as Lane>::LANES, 0);
        assert_eq!(Bgra32::ALIGNMENT % <<Bgra32 as Format>::Lane as Lane>::LANES, 0);
    }

    #[test]
    fn test_luma() {
        assert_eq!(luma([0, 0, 0, 255]), 0);
        assert_eq!(luma([255, 255, 255, 255]), 255);
        // pure red, green, blue
        assert_eq!(luma([0, 0, 255, 255]), 77);
        assert_eq!(luma([0, 255, 0, 255]), 149);
        assert_eq!(luma([255, 0, 0, 255]), 29);
    }

    #[test]
    fn test_decode_encode() {
        assert_eq!(FormatTag::Grey8.decode_bgra(&[90]), [90, 90, 90, 255]);
        assert_eq!(FormatTag::Bgr24.decode_bgra(&[1, 2, 3]), [1, 2, 3, 255]);

        let mut out = [0u8; 4];
        FormatTag::Bgra32.encode_bgra([1, 2, 3, 4], &mut out);
        assert_eq!(out, [1, 2, 3, 4]);

        let mut grey = [0u8; 1];
        FormatTag::Grey8.encode_bgra([90, 90, 90, 255], &mut grey);
        assert_eq!(grey[0], 90);
    }
}
