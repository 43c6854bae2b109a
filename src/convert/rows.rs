//! Row routines moving pixels between external images and matrix views.
//!
//! Same-format routines copy raw bytes lane by lane. Cross-format routines
//! expand each pixel to `[b, g, r, a]`, re-encode it in the target format
//! on an aligned scratch row and move the scratch row with aligned lane
//! operations.
//!
//! Every routine assumes the dispatcher has already checked that the
//! destination is large enough.

use crate::config::{ConvertConfig, LoadSelection};
use crate::convert::image::{ImageView, ImageViewMut};
use crate::error::Result;
use crate::matrix::{pixel_bytes, Format, MatrixView, MatrixViewMut};
use crate::simd::{Aligned, AlignedMut, Lane, LANE_ALIGN, LANE_WIDTH_BYTES};
use crate::types::is_aligned_to;
use aligned_vec::{AVec, ConstAlign};
use std::iter;

/// Lane schedule for one row of `row_bytes` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPlan {
    /// Bytes of pixel data per row.
    pub row_bytes: usize,
    /// Lanes lying entirely inside the row.
    pub full_lanes: usize,
    /// Bytes of the row past the last full lane.
    pub step_diff: usize,
    /// Lane loads per row, `ceil(row_bytes / lane width)`.
    pub loads_per_row: usize,
}

impl RowPlan {
    /// Schedule a row of `row_bytes` bytes.
    pub const fn new(row_bytes: usize) -> Self {
        let full_lanes = row_bytes / LANE_WIDTH_BYTES;
        let step_diff = row_bytes % LANE_WIDTH_BYTES;
        Self {
            row_bytes,
            full_lanes,
            step_diff,
            loads_per_row: full_lanes + (step_diff != 0) as usize,
        }
    }

    /// Whether the full lanes of every row go through the aligned path.
    ///
    /// `rows_aligned` says whether every row of the external buffer starts on
    /// a lane boundary. With [`LoadSelection::WholeMatrix`] a row that ends
    /// mid-lane sends the whole conversion down the unaligned path.
    pub fn use_aligned(&self, rows_aligned: bool, selection: LoadSelection) -> bool {
        rows_aligned
            && match selection {
                LoadSelection::WholeMatrix => self.step_diff == 0,
                LoadSelection::PerLane => true,
            }
    }
}

fn rows_aligned(base: *const u8, stride: usize) -> bool {
    is_aligned_to(base, LANE_ALIGN) && stride % LANE_ALIGN == 0
}

fn load_row<L: Lane>(
    lanes: &mut [L],
    data: &[u8],
    start: usize,
    plan: &RowPlan,
    aligned: bool,
) -> Result<()> {
    let full_bytes = plan.full_lanes * L::BYTES;
    let full = &data[start..start + full_bytes];

    if aligned {
        for (lane, chunk) in lanes.iter_mut().zip(Aligned::new(full)?.lanes(L::BYTES)) {
            *lane = L::loada_bytes(chunk);
        }
    } else {
        for (lane, chunk) in lanes.iter_mut().zip(full.chunks_exact(L::BYTES)) {
            *lane = L::load_bytes(chunk);
        }
    }

    if plan.step_diff != 0 {
        // The trailing lane reads on into the next row when the buffer allows it.
        let tail = start + full_bytes;
        lanes[plan.full_lanes] = if tail + L::BYTES <= data.len() {
            L::load_bytes(&data[tail..])
        } else {
            L::load_partial(&data[tail..])
        };
    }
    Ok(())
}

fn store_row<L: Lane>(lanes: &[L], row: &mut [u8], plan: &RowPlan, aligned: bool) -> Result<()> {
    let (full, tail) = row.split_at_mut(plan.full_lanes * L::BYTES);

    if aligned {
        for (lane, chunk) in lanes.iter().zip(AlignedMut::new(full)?.lanes(L::BYTES)) {
            lane.store_bytes(chunk);
        }
    } else {
        for (lane, chunk) in lanes.iter().zip(full.chunks_exact_mut(L::BYTES)) {
            lane.storeu_bytes(chunk);
        }
    }

    if plan.step_diff != 0 {
        lanes[plan.full_lanes].storeu_partial(tail);
    }
    Ok(())
}

/// Zero every byte of a matrix row from `row_bytes` to the end of its step.
fn clear_past<L: Lane>(lanes: &mut [L], row_bytes: usize) {
    let bytes: &mut [u8] = bytemuck::cast_slice_mut(lanes);
    bytes[row_bytes..].fill(0);
}

fn scratch_row(len: usize) -> AVec<u8, ConstAlign<64>> {
    AVec::from_iter(64, iter::repeat(0u8).take(len))
}

/// Copy an image into a matrix of the same format.
pub fn load_same<F: Format>(
    src: &ImageView<'_>,
    dst: &mut MatrixViewMut<'_, F>,
    config: &ConvertConfig,
) -> Result<()> {
    let data = src.data();
    let plan = RowPlan::new(src.row_bytes());
    let aligned = plan.use_aligned(rows_aligned(data.as_ptr(), src.stride()), config.load_selection);

    tracing::trace!(
        rows = src.rows(),
        loads_per_row = plan.loads_per_row,
        step_diff = plan.step_diff,
        aligned,
        "loading rows"
    );

    for r in 0..src.rows() {
        let lanes = dst.row_lanes_mut(r);
        load_row(lanes, data, r * src.stride(), &plan, aligned)?;

        if config.zero_padding {
            clear_past(lanes, plan.row_bytes);
        }
    }
    Ok(())
}

/// Copy a matrix into an image of the same format.
///
/// Only the bytes of whole pixels are written; row padding of the image is
/// left untouched.
pub fn store_same<F: Format>(
    src: &MatrixView<'_, F>,
    dst: &mut ImageViewMut<'_>,
    config: &ConvertConfig,
) -> Result<()> {
    let plan = RowPlan::new(src.pixels_per_row() * pixel_bytes::<F>());
    let stride = dst.stride();
    let aligned = plan.use_aligned(rows_aligned(dst.data().as_ptr(), stride), config.load_selection);

    tracing::trace!(
        rows = src.rows(),
        stores_per_row = plan.loads_per_row,
        aligned,
        "storing rows"
    );

    let data = dst.data_mut();
    for r in 0..src.rows() {
        let start = r * stride;
        store_row(
            src.row_lanes(r),
            &mut data[start..start + plan.row_bytes],
            &plan,
            aligned,
        )?;
    }
    Ok(())
}

/// Convert an image of any other format into a matrix of `F`.
pub fn load_converted<F: Format>(
    src: &ImageView<'_>,
    dst: &mut MatrixViewMut<'_, F>,
    config: &ConvertConfig,
) -> Result<()> {
    let source = src.format();
    let (src_bpp, dst_bpp) = (source.bytes_per_pixel(), pixel_bytes::<F>());
    let plan = RowPlan::new(src.cols() * dst_bpp);
    let mut scratch = scratch_row(plan.loads_per_row * LANE_WIDTH_BYTES);

    tracing::trace!(
        from = %source,
        to = %F::TAG,
        rows = src.rows(),
        loads_per_row = plan.loads_per_row,
        "converting rows into matrix"
    );

    for r in 0..src.rows() {
        for (px, out) in src
            .row(r)
            .chunks_exact(src_bpp)
            .zip(scratch.chunks_exact_mut(dst_bpp))
        {
            F::TAG.encode_bgra(source.decode_bgra(px), out);
        }

        // Bytes past the row are never written, so the scratch tail stays zero.
        let lanes = dst.row_lanes_mut(r);
        for (lane, chunk) in lanes
            .iter_mut()
            .zip(Aligned::new(&scratch[..])?.lanes(LANE_WIDTH_BYTES))
        {
            *lane = Lane::loada_bytes(chunk);
        }

        if config.zero_padding {
            clear_past(lanes, plan.row_bytes);
        }
    }
    Ok(())
}

/// Convert a matrix of `F` into an image of any other format.
pub fn store_converted<F: Format>(
    src: &MatrixView<'_, F>,
    dst: &mut ImageViewMut<'_>,
    _config: &ConvertConfig,
) -> Result<()> {
    let target = dst.format();
    let (src_bpp, dst_bpp) = (pixel_bytes::<F>(), target.bytes_per_pixel());
    let pixels = src.pixels_per_row();
    let mut scratch = scratch_row(src.lanes_per_row() * LANE_WIDTH_BYTES);

    tracing::trace!(
        from = %F::TAG,
        to = %target,
        rows = src.rows(),
        pixels,
        "converting rows out of matrix"
    );

    for r in 0..src.rows() {
        for (lane, chunk) in src
            .row_lanes(r)
            .iter()
            .zip(AlignedMut::new(&mut scratch[..])?.lanes(LANE_WIDTH_BYTES))
        {
            lane.store_bytes(chunk);
        }

        let row = dst.row_mut(r);
        for (px, out) in scratch
            .chunks_exact(src_bpp)
            .take(pixels)
            .zip(row.chunks_exact_mut(dst_bpp))
        {
            target.encode_bgra(F::TAG.decode_bgra(px), out);
        }
    }
    Ok(())
}
