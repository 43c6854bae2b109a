//! Aligned slice wrappers.
//!
//! Aligned lane loads and stores only accept these wrappers. The alignment is
//! checked once when a wrapper is built from an arbitrary slice; splitting an
//! aligned wrapper into lane-sized pieces keeps the invariant without checking
//! again.

use crate::error::{Result, SnapError};
use crate::simd::profile::LANE_ALIGN;
use crate::types::is_aligned_to;
use bytemuck::Pod;
use std::mem::size_of;

/// A shared slice whose first element sits on a [`LANE_ALIGN`] boundary.
#[derive(Debug, Clone, Copy)]
pub struct Aligned<'a, T> {
    slice: &'a [T],
}

impl<'a, T: Pod> Aligned<'a, T> {
    /// Wrap `slice`, failing with [`ErrorCode::Misaligned`](crate::ErrorCode::Misaligned)
    /// if it does not start on a lane boundary. Empty slices are always accepted.
    pub fn new(slice: &'a [T]) -> Result<Self> {
        if !slice.is_empty() && !is_aligned_to(slice.as_ptr(), LANE_ALIGN) {
            return Err(SnapError::misaligned(format!(
                "slice at {:p} is not {}-byte aligned",
                slice.as_ptr(),
                LANE_ALIGN
            )));
        }
        Ok(Self { slice })
    }

    /// Wrap `slice` without checking its alignment.
    ///
    /// # Safety
    /// `slice` must be empty or start on a [`LANE_ALIGN`] byte boundary.
    #[inline]
    pub unsafe fn new_unchecked(slice: &'a [T]) -> Self {
        debug_assert!(slice.is_empty() || is_aligned_to(slice.as_ptr(), LANE_ALIGN));
        Self { slice }
    }

    /// The wrapped slice.
    #[inline]
    pub fn as_slice(&self) -> &'a [T] {
        self.slice
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.slice.len()
    }

    /// Whether the slice is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slice.is_empty()
    }

    /// Reinterpret as aligned bytes.
    #[inline]
    pub fn as_bytes(self) -> Aligned<'a, u8> {
        Aligned {
            slice: bytemuck::cast_slice(self.slice),
        }
    }

    /// Skip the first `count` elements. `count` elements must span a whole
    /// number of lanes.
    #[inline]
    pub fn offset(self, count: usize) -> Aligned<'a, T> {
        assert!(
            (count * size_of::<T>()) % LANE_ALIGN == 0,
            "offset of {} elements breaks lane alignment",
            count
        );
        Aligned {
            slice: &self.slice[count..],
        }
    }

    /// Split into consecutive pieces of `lane_len` elements; the last piece may
    /// be shorter. `lane_len` elements must span a whole number of lanes.
    pub fn lanes(self, lane_len: usize) -> impl Iterator<Item = Aligned<'a, T>> + 'a {
        assert!(
            lane_len > 0 && (lane_len * size_of::<T>()) % LANE_ALIGN == 0,
            "piece of {} elements breaks lane alignment",
            lane_len
        );
        self.slice.chunks(lane_len).map(|chunk| Aligned { slice: chunk })
    }
}

/// A mutable slice whose first element sits on a [`LANE_ALIGN`] boundary.
#[derive(Debug)]
pub struct AlignedMut<'a, T> {
    slice: &'a mut [T],
}

impl<'a, T: Pod> AlignedMut<'a, T> {
    /// Wrap `slice`, failing with [`ErrorCode::Misaligned`](crate::ErrorCode::Misaligned)
    /// if it does not start on a lane boundary. Empty slices are always accepted.
    pub fn new(slice: &'a mut [T]) -> Result<Self> {
        if !slice.is_empty() && !is_aligned_to(slice.as_ptr(), LANE_ALIGN) {
            return Err(SnapError::misaligned(format!(
                "slice at {:p} is not {}-byte aligned",
                slice.as_ptr(),
                LANE_ALIGN
            )));
        }
        Ok(Self { slice })
    }

    /// Wrap `slice` without checking its alignment.
    ///
    /// # Safety
    /// `slice` must be empty or start on a [`LANE_ALIGN`] byte boundary.
    #[inline]
    pub unsafe fn new_unchecked(slice: &'a mut [T]) -> Self {
        debug_assert!(slice.is_empty() || is_aligned_to(slice.as_ptr(), LANE_ALIGN));
        Self { slice }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.slice.len()
    }

    /// Whether the slice is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slice.is_empty()
    }

    /// Shared view of the wrapped slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &*self.slice
    }

    /// Consume the wrapper, returning the slice.
    #[inline]
    pub fn into_slice(self) -> &'a mut [T] {
        self.slice
    }

    /// Reborrow for a shorter lifetime.
    #[inline]
    pub fn reborrow(&mut self) -> AlignedMut<'_, T> {
        AlignedMut {
            slice: &mut *self.slice,
        }
    }

    /// Reinterpret as aligned bytes.
    #[inline]
    pub fn into_bytes(self) -> AlignedMut<'a, u8> {
        AlignedMut {
            slice: bytemuck::cast_slice_mut(self.slice),
        }
    }

    /// Skip the first `count` elements. `count` elements must span a whole
    /// number of lanes.
    #[inline]
    pub fn offset(self, count: usize) -> AlignedMut<'a, T> {
        assert!(
            (count * size_of::<T>()) % LANE_ALIGN == 0,
            "offset of {} elements breaks lane alignment",
            count
        );
        let slice = self.slice;
        AlignedMut {
            slice: &mut slice[count..],
        }
    }

    /// Split into consecutive mutable pieces of `lane_len` elements; the last
    /// piece may be shorter. `lane_len` elements must span a whole number of lanes.
    pub fn lanes(self, lane_len: usize) -> impl Iterator<Item = AlignedMut<'a, T>> + 'a {
        assert!(
            lane_len > 0 && (lane_len * size_of::<T>()) % LANE_ALIGN == 0,
            "piece of {} elements breaks lane alignment",
            lane_len
        );
        self.slice
            .chunks_mut(lane_len)
            .map(|chunk| AlignedMut { slice: chunk })
    }
}

/// Lane-aligned scratch array used to spill a register.
#[derive(Clone, Copy)]
#[repr(C, align(16))]
pub(crate) struct Spill<T, const N: usize>(pub(crate) [T; N]);

const _: () = assert!(std::mem::align_of::<Spill<u8, 16>>() == LANE_ALIGN);

impl<T: Pod, const N: usize> Spill<T, N> {
    #[inline]
    pub(crate) fn aligned(&self) -> Aligned<'_, T> {
        // SAFETY: `Spill` is `repr(align(16))` and the array is its first field.
        unsafe { Aligned::new_unchecked(&self.0) }
    }

    #[inline]
    pub(crate) fn aligned_mut(&mut self) -> AlignedMut<'_, T> {
        // SAFETY: `Spill` is `repr(align(16))` and the array is its first field.
        unsafe { AlignedMut::new_unchecked(&mut self.0) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_accepts_aligned() {
        let spill = Spill::<u8, 32>([7; 32]);
        let aligned = Aligned::new(&spill.0).unwrap();
        assert_eq!(aligned.len(), 32);
    }

    #[test]
    fn test_rejects_misaligned() {
        let spill = Spill::<u8, 32>([7; 32]);
        let err = Aligned::new(&spill.0[1..]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Misaligned);

        let mut spill = Spill::<u8, 32>([7; 32]);
        let err = AlignedMut::new(&mut spill.0[3..]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Misaligned);
    }

    #[test]
    fn test_empty_is_accepted() {
        let empty: [u32; 0] = [];
        assert!(Aligned::new(&empty[..]).unwrap().is_empty());
    }

    #[test]
    fn test_lanes_stay_aligned() {
        let spill = Spill::<u8, 40>([0; 40]);
        let pieces: Vec<_> = spill.aligned().lanes(16).collect();
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[2].len(), 8);
        for piece in pieces {
            assert!(is_aligned_to(piece.as_slice().as_ptr(), LANE_ALIGN));
        }
    }

    #[test]
    #[should_panic]
    fn test_lanes_reject_misaligning_piece() {
        let spill = Spill::<u8, 32>([0; 32]);
        let _ = spill.aligned().lanes(12).count();
    }

    #[test]
    fn test_offset_by_whole_lanes() {
        let mut spill = Spill::<u32, 12>([0; 12]);
        for (i, x) in spill.0.iter_mut().enumerate() {
            *x = i as u32;
        }
        let tail = spill.aligned().offset(8);
        assert_eq!(tail.as_slice(), &[8, 9, 10, 11]);

        let mut tail = spill.aligned_mut().offset(4);
        tail.reborrow().into_slice()[0] = 40;
        assert_eq!(spill.0[4], 40);
    }

    #[test]
    fn test_typed_to_bytes() {
        let spill = Spill::<u32, 4>([1, 2, 3, 4]);
        let bytes = spill.aligned().as_bytes();
        assert_eq!(bytes.len(), 16);
    }
}
