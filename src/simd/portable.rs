//! Lane vectors over the `wide` register types.
//!
//! The register mapping is the same on every target; only the memory
//! primitives (`load_unaligned` and friends) are swapped for intrinsics when
//! the build has SSE2. The versions in this file are plain byte copies and
//! back the `portable` feature and targets without an intrinsic backend.

#![cfg_attr(
    all(target_arch = "x86_64", target_feature = "sse2", not(feature = "portable")),
    allow(dead_code)
)]

use crate::simd::aligned::{Aligned, AlignedMut, Spill};
use crate::simd::backend;
use crate::simd::traits::{Lane, NativeLanes};
use bytemuck::{Pod, Zeroable};
use std::fmt;
use std::mem::size_of;
use wide::{f32x4, i16x8, i32x4, i8x16, u16x8, u32x4, u8x16};

// ============================================================================
// Register mapping
// ============================================================================

macro_rules! native_lanes {
    ($($elem:ty, $lanes:literal => $reg:ty;)*) => {
        $(
            impl NativeLanes<$lanes> for $elem {
                type Register = $reg;
            }

            const _: () = assert!(
                size_of::<$reg>() == crate::simd::profile::LANE_WIDTH_BYTES
                    && size_of::<$elem>() * $lanes == crate::simd::profile::LANE_WIDTH_BYTES
            );
        )*
    };
}

native_lanes! {
    u8, 16 => u8x16;
    i8, 16 => i8x16;
    u16, 8 => u16x8;
    i16, 8 => i16x8;
    u32, 4 => u32x4;
    i32, 4 => i32x4;
    f32, 4 => f32x4;
}

// ============================================================================
// LaneVector
// ============================================================================

/// `N` lanes of `T` held in one 128-bit register.
///
/// The content of a default-constructed vector is unspecified by contract; in
/// practice it is all zeros.
#[repr(transparent)]
pub struct LaneVector<T: NativeLanes<N>, const N: usize> {
    reg: <T as NativeLanes<N>>::Register,
}

/// 16 lanes of `u8`.
pub type Vec16x8u = LaneVector<u8, 16>;
/// 16 lanes of `i8`.
pub type Vec16x8s = LaneVector<i8, 16>;
/// 8 lanes of `u16`.
pub type Vec8x16u = LaneVector<u16, 8>;
/// 8 lanes of `i16`.
pub type Vec8x16s = LaneVector<i16, 8>;
/// 4 lanes of `u32`.
pub type Vec4x32u = LaneVector<u32, 4>;
/// 4 lanes of `i32`.
pub type Vec4x32s = LaneVector<i32, 4>;
/// 4 lanes of `f32`.
pub type Vec4x32f = LaneVector<f32, 4>;

impl<T: NativeLanes<N>, const N: usize> LaneVector<T, N> {
    /// Wrap a raw register.
    #[inline]
    pub fn from_register(reg: <T as NativeLanes<N>>::Register) -> Self {
        Self { reg }
    }

    /// Unwrap the raw register.
    #[inline]
    pub fn into_register(self) -> <T as NativeLanes<N>>::Register {
        self.reg
    }

    /// Build a vector from its lanes, lane 0 first.
    #[inline]
    pub fn from_array(lanes: [T; N]) -> Self {
        let spill = Spill(lanes);
        Self::loada(spill.aligned())
    }

    /// Lanes of the vector, lane 0 first.
    #[inline]
    pub fn to_array(self) -> [T; N] {
        let mut spill = Spill([T::zero(); N]);
        self.store(spill.aligned_mut());
        spill.0
    }
}

impl<T: NativeLanes<N>, const N: usize> Clone for LaneVector<T, N> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: NativeLanes<N>, const N: usize> Copy for LaneVector<T, N> {}

impl<T: NativeLanes<N>, const N: usize> Default for LaneVector<T, N> {
    #[inline]
    fn default() -> Self {
        Self::zeroed()
    }
}

impl<T: NativeLanes<N>, const N: usize> PartialEq for LaneVector<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.to_array() == other.to_array()
    }
}

impl<T: NativeLanes<N>, const N: usize> fmt::Debug for LaneVector<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = format!("LaneVector<{}, {}>", T::NAME, N);
        f.debug_tuple(&name).field(&self.to_array()).finish()
    }
}

// SAFETY: `repr(transparent)` over a `Pod` register.
unsafe impl<T: NativeLanes<N>, const N: usize> Zeroable for LaneVector<T, N> {}
// SAFETY: `repr(transparent)` over a `Pod` register.
unsafe impl<T: NativeLanes<N>, const N: usize> Pod for LaneVector<T, N> {}

impl<T: NativeLanes<N>, const N: usize> Lane for LaneVector<T, N> {
    type Element = T;
    const LANES: usize = N;

    #[inline]
    fn broadcast(value: T) -> Self {
        Self::from_array([value; N])
    }

    #[inline]
    fn load_bytes(src: &[u8]) -> Self {
        Self::from_register(backend::load_unaligned(src))
    }

    #[inline]
    fn loada_bytes(src: Aligned<'_, u8>) -> Self {
        Self::from_register(backend::load_aligned(src))
    }

    #[inline]
    fn store_bytes(self, dst: AlignedMut<'_, u8>) {
        backend::store_aligned(self.reg, dst)
    }

    #[inline]
    fn storeu_bytes(self, dst: &mut [u8]) {
        backend::store_unaligned(self.reg, dst)
    }

    fn load_partial(src: &[u8]) -> Self {
        let mut spill = Spill([0u8; 16]);
        let n = src.len().min(Self::BYTES);
        spill.0[..n].copy_from_slice(&src[..n]);
        Self::loada_bytes(spill.aligned())
    }

    fn storeu_partial(self, dst: &mut [u8]) {
        let mut spill = Spill([0u8; 16]);
        self.store_bytes(spill.aligned_mut());
        let n = dst.len().min(Self::BYTES);
        dst[..n].copy_from_slice(&spill.0[..n]);
    }

    #[inline]
    fn extract(self, idx: usize) -> T {
        self.to_array()[idx]
    }

    #[inline]
    fn set(&mut self, idx: usize, value: T) {
        let mut lanes = self.to_array();
        lanes[idx] = value;
        *self = Self::from_array(lanes);
    }
}

// ============================================================================
// Byte-copy memory primitives
// ============================================================================

/// Unaligned read of one register.
#[inline]
pub(crate) fn load_unaligned<R: Pod>(src: &[u8]) -> R {
    bytemuck::pod_read_unaligned(&src[..size_of::<R>()])
}

/// Aligned read of one register.
#[inline]
pub(crate) fn load_aligned<R: Pod>(src: Aligned<'_, u8>) -> R {
    *bytemuck::from_bytes(&src.as_slice()[..size_of::<R>()])
}

/// Aligned write of one register.
#[inline]
pub(crate) fn store_aligned<R: Pod>(reg: R, dst: AlignedMut<'_, u8>) {
    *bytemuck::from_bytes_mut(&mut dst.into_slice()[..size_of::<R>()]) = reg;
}

/// Unaligned write of one register.
#[inline]
pub(crate) fn store_unaligned<R: Pod>(reg: R, dst: &mut [u8]) {
    dst[..size_of::<R>()].copy_from_slice(bytemuck::bytes_of(&reg));
}
