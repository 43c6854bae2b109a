//! Core lane traits.
//!
//! [`NativeLanes`] maps an element type and a lane count to the 128-bit
//! register that stores them. [`Lane`] is the interface the matrix and
//! conversion layers are written against: broadcast, the four load/store
//! variants and per-lane access.

use crate::simd::aligned::{Aligned, AlignedMut};
use crate::simd::profile::LANE_WIDTH_BYTES;
use crate::types::LaneElement;
use bytemuck::Pod;
use std::fmt;

/// Element types with a native register of `N` lanes.
///
/// Only the pairings that fill exactly one 128-bit register are implemented,
/// so `LaneVector<u8, 8>` or `LaneVector<f32, 16>` fail to name a type.
pub trait NativeLanes<const N: usize>: LaneElement {
    /// Register type holding `N` elements.
    type Register: Copy + Pod + Default + Send + Sync + fmt::Debug;
}

/// A fixed-width vector of lanes that can be moved to and from memory.
///
/// Implementors provide the byte-level operations; the typed variants are
/// derived from them. Reads and writes touch exactly [`Lane::BYTES`] bytes
/// except for the `_partial` variants.
///
/// # Panics
/// Every load and store panics if the slice is shorter than one lane, and
/// [`extract`](Lane::extract)/[`set`](Lane::set) panic on an index outside
/// `0..LANES`.
pub trait Lane: Copy + Pod + Default + fmt::Debug + Send + Sync + 'static {
    /// Scalar type of one lane.
    type Element: LaneElement;

    /// Number of lanes.
    const LANES: usize;

    /// Width of the vector in bytes.
    const BYTES: usize = LANE_WIDTH_BYTES;

    /// Every lane equal to `value`.
    fn broadcast(value: Self::Element) -> Self;

    /// Read one lane-width of bytes from any address.
    fn load_bytes(src: &[u8]) -> Self;

    /// Read one lane-width of bytes from an aligned address.
    fn loada_bytes(src: Aligned<'_, u8>) -> Self;

    /// Write one lane-width of bytes to an aligned address.
    fn store_bytes(self, dst: AlignedMut<'_, u8>);

    /// Write one lane-width of bytes to any address.
    fn storeu_bytes(self, dst: &mut [u8]);

    /// Read up to one lane-width of bytes; lanes past the end of `src` are zero.
    fn load_partial(src: &[u8]) -> Self;

    /// Write the first `min(dst.len(), BYTES)` bytes of the vector.
    fn storeu_partial(self, dst: &mut [u8]);

    /// Value of lane `idx`.
    fn extract(self, idx: usize) -> Self::Element;

    /// Replace lane `idx`, leaving the other lanes untouched.
    fn set(&mut self, idx: usize, value: Self::Element);

    /// Unaligned load of `LANES` elements.
    #[inline]
    fn load(src: &[Self::Element]) -> Self {
        Self::load_bytes(bytemuck::cast_slice(&src[..Self::LANES]))
    }

    /// Aligned load of `LANES` elements.
    #[inline]
    fn loada(src: Aligned<'_, Self::Element>) -> Self {
        Self::loada_bytes(src.as_bytes())
    }

    /// Aligned store of `LANES` elements.
    #[inline]
    fn store(self, dst: AlignedMut<'_, Self::Element>) {
        self.store_bytes(dst.into_bytes())
    }

    /// Unaligned store of `LANES` elements.
    #[inline]
    fn storeu(self, dst: &mut [Self::Element]) {
        self.storeu_bytes(bytemuck::cast_slice_mut(&mut dst[..Self::LANES]))
    }
}
