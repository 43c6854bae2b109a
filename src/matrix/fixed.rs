//! Matrix with compile-time dimensions and inline storage.

use super::{fixed_lanes, step_size, Format, LaneOf, MatrixKind, MatrixStorage};
use crate::convert::ImageView;
use crate::error::Result;
use crate::simd::{Lane, PROFILE};
use std::fmt;
use std::mem::align_of;

/// Inline storage aligned to the widest row alignment any profile uses.
#[derive(Clone, Copy)]
#[repr(C, align(32))]
struct RowAligned<T>(T);

const _: () = assert!(align_of::<RowAligned<u8>>() >= PROFILE.alignment);

/// A `ROWS` x `COLS` matrix of `F` elements stored inline.
///
/// `LANES` is the storage length in lane vectors and must equal
/// `fixed_lanes::<F>(ROWS, COLS)`; a mismatch fails to compile when the
/// matrix is constructed. The [`fixed_matrix!`](crate::fixed_matrix) macro
/// fills it in. Storage is aligned to at least the profile's row alignment.
///
/// ```rust
/// use snap::fixed_matrix;
/// use snap::matrix::{Grey8, MatrixStorage};
///
/// let m = <fixed_matrix!(Grey8, 4, 20)>::new();
/// assert_eq!(m.cols(), 20);
/// assert!(m.step() >= 20);
/// ```
pub struct FixedMatrix<F: Format, const ROWS: usize, const COLS: usize, const LANES: usize> {
    data: RowAligned<[LaneOf<F>; LANES]>,
}

impl<F: Format, const ROWS: usize, const COLS: usize, const LANES: usize>
    FixedMatrix<F, ROWS, COLS, LANES>
{
    /// Padded row length in scalars.
    pub const STEP: usize = step_size(COLS, F::ALIGNMENT);

    const LAYOUT_CHECK: () = assert!(
        LANES == fixed_lanes::<F>(ROWS, COLS),
        "LANES does not match ROWS * STEP / lane width"
    );

    /// A matrix with every lane zeroed.
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::LAYOUT_CHECK;
        Self {
            data: RowAligned([<LaneOf<F>>::default(); LANES]),
        }
    }

    /// A matrix with every slot set to `value`.
    pub fn splat(value: F::Scalar) -> Self {
        let mut matrix = Self::new();
        matrix.data = RowAligned([<LaneOf<F> as Lane>::broadcast(value); LANES]);
        matrix
    }

    /// Build a matrix from an external buffer through the default dispatcher.
    pub fn from_image(image: &ImageView<'_>) -> Result<Self> {
        let mut matrix = Self::new();
        crate::convert::convert(image, &mut matrix)?;
        Ok(matrix)
    }
}

impl<F: Format, const ROWS: usize, const COLS: usize, const LANES: usize> MatrixStorage
    for FixedMatrix<F, ROWS, COLS, LANES>
{
    type Format = F;
    const KIND: MatrixKind = MatrixKind::Fixed;

    #[inline]
    fn rows(&self) -> usize {
        ROWS
    }

    #[inline]
    fn cols(&self) -> usize {
        COLS
    }

    #[inline]
    fn step(&self) -> usize {
        Self::STEP
    }

    #[inline]
    fn data(&self) -> &[LaneOf<F>] {
        &self.data.0
    }

    #[inline]
    fn data_mut(&mut self) -> &mut [LaneOf<F>] {
        &mut self.data.0
    }
}

impl<F: Format, const ROWS: usize, const COLS: usize, const LANES: usize> Default
    for FixedMatrix<F, ROWS, COLS, LANES>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Format, const ROWS: usize, const COLS: usize, const LANES: usize> Clone
    for FixedMatrix<F, ROWS, COLS, LANES>
{
    fn clone(&self) -> Self {
        Self { data: self.data }
    }
}

impl<F: Format, const ROWS: usize, const COLS: usize, const LANES: usize> fmt::Debug
    for FixedMatrix<F, ROWS, COLS, LANES>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedMatrix")
            .field("format", &F::TAG)
            .field("rows", &ROWS)
            .field("cols", &COLS)
            .field("step", &Self::STEP)
            .finish()
    }
}

/// Name the [`FixedMatrix`] type for a format and dimensions.
///
/// `fixed_matrix!(Grey8, 4, 20)` expands to
/// `FixedMatrix<Grey8, 4, 20, { fixed_lanes::<Grey8>(4, 20) }>`.
#[macro_export]
macro_rules! fixed_matrix {
    ($format:ty, $rows:expr, $cols:expr) => {
        $crate::matrix::FixedMatrix<
            $format,
            { $rows },
            { $cols },
            { $crate::matrix::fixed_lanes::<$format>($rows, $cols) },
        >
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{Bgra32, Grey8};

    type Small = fixed_matrix!(Grey8, 3, 5);

    #[test]
    fn test_fixed_layout() {
        let m = Small::new();
        assert_eq!(m.rows(), 3);
        assert_eq!(m.cols(), 5);
        assert_eq!(m.step(), Grey8::ALIGNMENT);
        assert_eq!(m.size(), 3 * Grey8::ALIGNMENT);
        assert_eq!(m.len(), 15);
        assert_eq!(m.data().len() * 16, m.size());
        assert_eq!(Small::KIND, MatrixKind::Fixed);
    }

    #[test]
    fn test_aligned_width_has_no_padding() {
        type M = fixed_matrix!(Grey8, 2, Grey8::ALIGNMENT * 2);
        let m = M::new();
        assert_eq!(m.step(), m.cols());
        assert_eq!(m.size(), m.len());
    }

    #[test]
    fn test_get_set_fill() {
        let mut m = <fixed_matrix!(Bgra32, 2, 3)>::splat(7);
        assert!(m.as_scalars().iter().all(|&x| x == 7));
        m.set(1, 2, 0xdead_beef);
        assert_eq!(m.get(1, 2), 0xdead_beef);
        assert_eq!(m.row(1), &[7, 7, 0xdead_beef]);
        m.fill(0);
        assert!(m.as_scalars().iter().all(|&x| x == 0));
    }

    #[test]
    fn test_storage_meets_profile_alignment() {
        let m = <fixed_matrix!(Bgra32, 3, 5)>::new();
        assert_eq!(m.data().as_ptr() as usize % PROFILE.alignment, 0);

        let boxed = Box::new(Small::new());
        assert_eq!(boxed.data().as_ptr() as usize % PROFILE.alignment, 0);
        assert_eq!(align_of::<Small>() % PROFILE.alignment, 0);
    }

    #[test]
    fn test_clone_is_deep() {
        let mut a = Small::new();
        a.set(0, 0, 9);
        let b = a.clone();
        a.set(0, 0, 1);
        assert_eq!(b.get(0, 0), 9);
    }
}
