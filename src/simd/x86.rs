//! x86_64 memory primitives using SSE2 intrinsics.
//!
//! Compiled only when SSE2 is a build-time target feature, which is the
//! baseline for x86_64. Every function moves exactly one 128-bit register.

#![cfg(all(target_arch = "x86_64", target_feature = "sse2"))]

use crate::simd::aligned::{Aligned, AlignedMut};
use crate::simd::profile::LANE_WIDTH_BYTES;
use bytemuck::Pod;
use std::arch::x86_64::*;

/// Unaligned read of one register (`movdqu`).
#[inline]
pub(crate) fn load_unaligned<R: Pod>(src: &[u8]) -> R {
    let src = &src[..LANE_WIDTH_BYTES];
    // SAFETY: `src` has 16 readable bytes and SSE2 is enabled for this build.
    let reg = unsafe { _mm_loadu_si128(src.as_ptr() as *const __m128i) };
    bytemuck::cast(reg)
}

/// Aligned read of one register (`movdqa`).
#[inline]
pub(crate) fn load_aligned<R: Pod>(src: Aligned<'_, u8>) -> R {
    let src = &src.as_slice()[..LANE_WIDTH_BYTES];
    // SAFETY: `Aligned` starts on a 16-byte boundary and holds 16 bytes.
    let reg = unsafe { _mm_load_si128(src.as_ptr() as *const __m128i) };
    bytemuck::cast(reg)
}

/// Aligned write of one register (`movdqa`).
#[inline]
pub(crate) fn store_aligned<R: Pod>(reg: R, dst: AlignedMut<'_, u8>) {
    let dst = &mut dst.into_slice()[..LANE_WIDTH_BYTES];
    let reg: __m128i = bytemuck::cast(reg);
    // SAFETY: `AlignedMut` starts on a 16-byte boundary and holds 16 bytes.
    unsafe { _mm_store_si128(dst.as_mut_ptr() as *mut __m128i, reg) }
}

/// Unaligned write of one register (`movdqu`).
#[inline]
pub(crate) fn store_unaligned<R: Pod>(reg: R, dst: &mut [u8]) {
    let dst = &mut dst[..LANE_WIDTH_BYTES];
    let reg: __m128i = bytemuck::cast(reg);
    // SAFETY: `dst` has 16 writable bytes.
    unsafe { _mm_storeu_si128(dst.as_mut_ptr() as *mut __m128i, reg) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::aligned::Spill;

    #[test]
    fn test_unaligned_roundtrip_at_odd_offset() {
        let bytes: Vec<u8> = (0..40).collect();
        let reg: [u8; 16] = load_unaligned(&bytes[3..]);
        assert_eq!(reg[0], 3);
        assert_eq!(reg[15], 18);

        let mut out = vec![0u8; 40];
        store_unaligned(reg, &mut out[5..]);
        assert_eq!(&out[5..21], &bytes[3..19]);
        assert_eq!(out[4], 0);
        assert_eq!(out[21], 0);
    }

    #[test]
    fn test_aligned_roundtrip() {
        let mut src = Spill([0u8; 16]);
        for (i, b) in src.0.iter_mut().enumerate() {
            *b = (i * 3) as u8;
        }
        let reg: [u32; 4] = load_aligned(src.aligned());

        let mut dst = Spill([0u8; 16]);
        store_aligned(reg, dst.aligned_mut());
        assert_eq!(src.0, dst.0);
    }
}
