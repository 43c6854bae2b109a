//! Matrix with runtime dimensions on an aligned heap block.

use super::{step_size, Format, LaneOf, MatrixKind, MatrixStorage};
use crate::alloc::{AlignedAllocator, Allocator, HeapBlock};
use crate::convert::ImageView;
use crate::error::{Result, SnapError};
use crate::simd::{Lane, PROFILE};
use std::fmt;
use std::mem;

/// A heap-backed matrix of `F` elements.
///
/// The shape is fixed at construction; build a new matrix for a different
/// shape. Moving out with [`take`](DynamicMatrix::take) leaves the empty
/// matrix behind, and the storage is returned to the allocator exactly once.
pub struct DynamicMatrix<F: Format, A: Allocator = AlignedAllocator> {
    rows: usize,
    cols: usize,
    step: usize,
    block: HeapBlock<LaneOf<F>, A>,
}

impl<F: Format, A: Allocator> DynamicMatrix<F, A> {
    /// The empty matrix: no rows, no columns, no allocation.
    pub fn new() -> Self {
        Self {
            rows: 0,
            cols: 0,
            step: 0,
            block: HeapBlock::default(),
        }
    }

    /// Allocate a zeroed `rows` x `cols` matrix.
    pub fn with_size(rows: usize, cols: usize) -> Result<Self> {
        Self::with_size_in(rows, cols, A::default())
    }

    /// Allocate a zeroed `rows` x `cols` matrix from `alloc`.
    pub fn with_size_in(rows: usize, cols: usize, alloc: A) -> Result<Self> {
        let step = step_size(cols, F::ALIGNMENT);
        let slots = rows.checked_mul(step).ok_or_else(|| {
            SnapError::allocation_failed(format!("{} x {} matrix overflows usize", rows, step))
        })?;
        let lanes = slots / <LaneOf<F> as Lane>::LANES;

        let block = HeapBlock::zeroed_in(lanes, PROFILE.alignment, alloc)?;
        tracing::debug!(
            format = %F::TAG,
            rows,
            cols,
            step,
            lanes,
            "allocated dynamic matrix"
        );

        Ok(Self {
            rows,
            cols,
            step,
            block,
        })
    }

    /// Allocate a matrix holding `rows` x `width` pixels.
    pub fn with_pixels(rows: usize, width: usize) -> Result<Self> {
        let cols = width.checked_mul(F::CHANNELS).ok_or_else(|| {
            SnapError::allocation_failed(format!("{} pixels per row overflows usize", width))
        })?;
        Self::with_size(rows, cols)
    }

    /// Build a matrix sized to `image` and fill it through the default dispatcher.
    pub fn from_image(image: &ImageView<'_>) -> Result<Self> {
        let mut matrix = Self::with_pixels(image.rows(), image.cols())?;
        crate::convert::convert(image, &mut matrix)?;
        Ok(matrix)
    }

    /// Move the contents out, leaving `self` empty.
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Deep copy into a fresh aligned allocation.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            step: self.step,
            block: self.block.try_clone()?,
        })
    }

    /// The allocator owning the storage.
    pub fn allocator(&self) -> &A {
        self.block.allocator()
    }
}

impl<F: Format, A: Allocator> MatrixStorage for DynamicMatrix<F, A> {
    type Format = F;
    const KIND: MatrixKind = MatrixKind::Dynamic;

    #[inline]
    fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn step(&self) -> usize {
        self.step
    }

    #[inline]
    fn data(&self) -> &[LaneOf<F>] {
        self.block.as_slice()
    }

    #[inline]
    fn data_mut(&mut self) -> &mut [LaneOf<F>] {
        self.block.as_mut_slice()
    }
}

impl<F: Format, A: Allocator> Default for DynamicMatrix<F, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Format, A: Allocator> fmt::Debug for DynamicMatrix<F, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicMatrix")
            .field("format", &F::TAG)
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("step", &self.step)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::matrix::{Bgr24, Bgra32, Grey8};
    use crate::types::is_aligned_to;
    use std::ptr::NonNull;

    #[derive(Clone, Default)]
    struct RefusingAllocator;

    impl Allocator for RefusingAllocator {
        fn allocate<T>(&self, count: usize, _alignment: usize) -> Result<NonNull<T>> {
            Err(SnapError::allocation_failed(format!("refused {} elements", count)))
        }

        unsafe fn free<T>(&self, _ptr: NonNull<T>, _count: usize, _alignment: usize) {
            unreachable!("nothing was ever allocated");
        }
    }

    #[test]
    fn test_empty_matrix() {
        let m = DynamicMatrix::<Grey8>::new();
        assert_eq!((m.rows(), m.cols(), m.step(), m.size()), (0, 0, 0, 0));
        assert!(m.data().is_empty());
        assert!(m.is_empty());
    }

    #[test]
    fn test_padded_rows() {
        let cols = Grey8::ALIGNMENT + 1;
        let m = DynamicMatrix::<Grey8>::with_size(5, cols).unwrap();
        assert!(m.step() > cols);
        assert_eq!(m.step() % Grey8::ALIGNMENT, 0);
        assert!(m.size() > m.len());
        assert_eq!(m.data().len(), m.size() / 16);
        assert!(is_aligned_to(m.data().as_ptr(), PROFILE.alignment));
    }

    #[test]
    fn test_rows_start_aligned() {
        let m = DynamicMatrix::<Bgra32>::with_size(4, 3).unwrap();
        for r in 0..m.rows() {
            assert!(is_aligned_to(m.row(r).as_ptr(), PROFILE.alignment));
        }
    }

    #[test]
    fn test_with_pixels_counts_channels() {
        let m = DynamicMatrix::<Bgr24>::with_pixels(2, 7).unwrap();
        assert_eq!(m.cols(), 21);
        assert_eq!(m.step() % Bgr24::ALIGNMENT, 0);
    }

    #[test]
    fn test_zero_dimension() {
        let m = DynamicMatrix::<Grey8>::with_size(0, 40).unwrap();
        assert_eq!(m.size(), 0);
        let m = DynamicMatrix::<Grey8>::with_size(40, 0).unwrap();
        assert_eq!(m.size(), 0);
        assert!(m.data().is_empty());
    }

    #[test]
    fn test_take_leaves_empty() {
        let mut a = DynamicMatrix::<Grey8>::with_size(3, 3).unwrap();
        a.set(2, 2, 42);
        let b = a.take();
        assert_eq!((a.rows(), a.cols(), a.step(), a.size()), (0, 0, 0, 0));
        assert_eq!(b.get(2, 2), 42);
    }

    #[test]
    fn test_try_clone_is_deep() {
        let mut a = DynamicMatrix::<Bgra32>::with_size(2, 2).unwrap();
        a.fill(5);
        let b = a.try_clone().unwrap();
        a.set(0, 0, 6);
        assert_eq!(b.get(0, 0), 5);
        assert_ne!(a.data().as_ptr(), b.data().as_ptr());
    }

    #[test]
    fn test_allocation_failure() {
        let err = DynamicMatrix::<Grey8, RefusingAllocator>::with_size(4, 4).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AllocationFailed);

        // Zero-sized matrices never reach the allocator.
        let m = DynamicMatrix::<Grey8, RefusingAllocator>::with_size(0, 4).unwrap();
        assert_eq!(m.size(), 0);
    }
}
