//! Row-major matrices of lane vectors with a padded row stride.
//!
//! Both matrix variants share one layout: `rows` rows of `step` scalars, of
//! which the first `cols` are logical elements and the rest are padding.
//! `step` is the smallest multiple of the format's alignment (in scalars)
//! that holds `cols`, so every row starts on an aligned boundary and storage
//! is a whole number of lane vectors.
//!
//! - [`FixedMatrix`]: dimensions in the type, storage inline.
//! - [`DynamicMatrix`]: dimensions chosen at construction, storage on an
//!   aligned heap block.
//!
//! Code that does not care about the variant is written against
//! [`MatrixStorage`].

pub mod dynamic;
pub mod fixed;
pub mod format;

pub use dynamic::DynamicMatrix;
pub use fixed::FixedMatrix;
pub use format::{luma, pixel_bytes, Bgr24, Bgra32, Format, FormatTag, Grey8};

use crate::simd::Lane;
use serde::{Deserialize, Serialize};

/// Lane vector type of a format.
pub type LaneOf<F> = <F as Format>::Lane;

/// Scalar type of a format.
pub type ScalarOf<F> = <F as Format>::Scalar;

/// Padded row length for `cols` elements at `alignment` elements.
///
/// The result is the smallest multiple of `alignment` not below `cols`.
#[inline]
pub const fn step_size(cols: usize, alignment: usize) -> usize {
    if cols % alignment == 0 {
        cols
    } else {
        cols + (alignment - cols % alignment)
    }
}

/// Number of lane vectors a `rows` x `cols` matrix of `F` stores.
#[inline]
pub const fn fixed_lanes<F: Format>(rows: usize, cols: usize) -> usize {
    rows * step_size(cols, F::ALIGNMENT) / <F::Lane as Lane>::LANES
}

/// Storage variant of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatrixKind {
    /// Inline storage sized at compile time.
    Fixed,
    /// Heap storage sized at construction.
    Dynamic,
}

/// Storage strategy shared by the matrix variants.
pub trait MatrixStorage {
    /// Element format.
    type Format: Format;

    /// Storage variant.
    const KIND: MatrixKind;

    /// Number of rows.
    fn rows(&self) -> usize;

    /// Logical elements per row.
    fn cols(&self) -> usize;

    /// Padded elements per row.
    fn step(&self) -> usize;

    /// Backing lane vectors, `rows * step / LANES` of them.
    fn data(&self) -> &[LaneOf<Self::Format>];

    /// Mutable backing lane vectors.
    fn data_mut(&mut self) -> &mut [LaneOf<Self::Format>];

    /// Element slots including padding (`rows * step`).
    #[inline]
    fn size(&self) -> usize {
        self.rows() * self.step()
    }

    /// Logical element count (`rows * cols`).
    #[inline]
    fn len(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Whether the matrix has no logical elements.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lane vectors per row.
    #[inline]
    fn lanes_per_row(&self) -> usize {
        self.step() / <LaneOf<Self::Format> as Lane>::LANES
    }

    /// Storage as scalars, padding included.
    #[inline]
    fn as_scalars(&self) -> &[ScalarOf<Self::Format>] {
        bytemuck::cast_slice(self.data())
    }

    /// Mutable storage as scalars, padding included.
    #[inline]
    fn as_scalars_mut(&mut self) -> &mut [ScalarOf<Self::Format>] {
        bytemuck::cast_slice_mut(self.data_mut())
    }

    /// Logical elements of row `r`.
    #[inline]
    fn row(&self, r: usize) -> &[ScalarOf<Self::Format>] {
        assert!(r < self.rows(), "row {} out of range for {} rows", r, self.rows());
        let start = r * self.step();
        let cols = self.cols();
        &self.as_scalars()[start..start + cols]
    }

    /// Mutable logical elements of row `r`.
    #[inline]
    fn row_mut(&mut self, r: usize) -> &mut [ScalarOf<Self::Format>] {
        assert!(r < self.rows(), "row {} out of range for {} rows", r, self.rows());
        let start = r * self.step();
        let cols = self.cols();
        &mut self.as_scalars_mut()[start..start + cols]
    }

    /// Element at row `r`, column `c`.
    #[inline]
    fn get(&self, r: usize, c: usize) -> ScalarOf<Self::Format> {
        self.row(r)[c]
    }

    /// Replace the element at row `r`, column `c`.
    #[inline]
    fn set(&mut self, r: usize, c: usize, value: ScalarOf<Self::Format>) {
        self.row_mut(r)[c] = value;
    }

    /// Broadcast `value` into every slot, padding included.
    fn fill(&mut self, value: ScalarOf<Self::Format>) {
        let lane = <LaneOf<Self::Format> as Lane>::broadcast(value);
        self.data_mut().fill(lane);
    }

    /// Borrowed, variant-erased view.
    #[inline]
    fn view(&self) -> MatrixView<'_, Self::Format> {
        MatrixView {
            rows: self.rows(),
            cols: self.cols(),
            step: self.step(),
            lanes: self.data(),
        }
    }

    /// Mutable borrowed, variant-erased view.
    #[inline]
    fn view_mut(&mut self) -> MatrixViewMut<'_, Self::Format> {
        let (rows, cols, step) = (self.rows(), self.cols(), self.step());
        MatrixViewMut {
            rows,
            cols,
            step,
            lanes: self.data_mut(),
        }
    }
}

/// Read-only matrix view handed to store routines.
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a, F: Format> {
    rows: usize,
    cols: usize,
    step: usize,
    lanes: &'a [LaneOf<F>],
}

impl<'a, F: Format> MatrixView<'a, F> {
    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Logical elements per row.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Padded elements per row.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Whole pixels per row.
    pub fn pixels_per_row(&self) -> usize {
        self.cols / F::CHANNELS
    }

    /// Lane vectors per row.
    pub fn lanes_per_row(&self) -> usize {
        self.step / <LaneOf<F> as Lane>::LANES
    }

    /// Every lane vector.
    pub fn lanes(&self) -> &'a [LaneOf<F>] {
        self.lanes
    }

    /// Lane vectors of row `r`, padding included.
    pub fn row_lanes(&self, r: usize) -> &'a [LaneOf<F>] {
        let per_row = self.lanes_per_row();
        &self.lanes[r * per_row..(r + 1) * per_row]
    }
}

/// Mutable matrix view handed to load routines.
#[derive(Debug)]
pub struct MatrixViewMut<'a, F: Format> {
    rows: usize,
    cols: usize,
    step: usize,
    lanes: &'a mut [LaneOf<F>],
}

impl<'a, F: Format> MatrixViewMut<'a, F> {
    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Logical elements per row.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Padded elements per row.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Lane vectors per row.
    pub fn lanes_per_row(&self) -> usize {
        self.step / <LaneOf<F> as Lane>::LANES
    }

    /// Mutable lane vectors of row `r`, padding included.
    pub fn row_lanes_mut(&mut self, r: usize) -> &mut [LaneOf<F>] {
        let per_row = self.lanes_per_row();
        &mut self.lanes[r * per_row..(r + 1) * per_row]
    }

    /// Mutable scalars of row `r`, padding included.
    pub fn row_scalars_mut(&mut self, r: usize) -> &mut [ScalarOf<F>] {
        bytemuck::cast_slice_mut(self.row_lanes_mut(r))
    }

    /// Read-only view of the same matrix.
    pub fn as_view(&self) -> MatrixView<'_, F> {
        MatrixView {
            rows: self.rows,
            cols: self.cols,
            step: self.step,
            lanes: &*self.lanes,
        }
    }
}
