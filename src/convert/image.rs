//! External row-major pixel buffers.
//!
//! An image is described by its pixel dimensions, the byte distance between
//! row starts and its format. Nothing else about the layout is assumed; the
//! description is validated once when the view is built.

use crate::error::{Result, SnapError};
use crate::matrix::FormatTag;
use aligned_vec::{AVec, ConstAlign};
use std::iter;

/// Validate a strided buffer description against the buffer length.
fn check_strided(len: usize, rows: usize, cols: usize, stride: usize, bpp: usize) -> Result<()> {
    let row_bytes = cols
        .checked_mul(bpp)
        .ok_or_else(|| SnapError::invalid_argument(format!("{} pixels per row overflows", cols)))?;
    if row_bytes > stride {
        return Err(SnapError::invalid_argument(format!(
            "stride {} is shorter than a row of {} bytes",
            stride, row_bytes
        )));
    }
    if rows > 0 {
        let total = (rows - 1)
            .checked_mul(stride)
            .and_then(|n| n.checked_add(row_bytes))
            .ok_or_else(|| SnapError::invalid_argument("image extent overflows"))?;
        if len < total {
            return Err(SnapError::invalid_argument(format!(
                "buffer of {} bytes is too short for {} rows at stride {} ({} bytes needed)",
                len, rows, stride, total
            )));
        }
    }
    Ok(())
}

/// Borrowed, read-only external image.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    data: &'a [u8],
    rows: usize,
    cols: usize,
    stride: usize,
    format: FormatTag,
}

impl<'a> ImageView<'a> {
    /// Describe `rows` x `cols` pixels of `format` whose rows start `stride`
    /// bytes apart.
    pub fn new(
        data: &'a [u8],
        rows: usize,
        cols: usize,
        stride: usize,
        format: FormatTag,
    ) -> Result<Self> {
        check_strided(data.len(), rows, cols, stride, format.bytes_per_pixel())?;
        Ok(Self {
            data,
            rows,
            cols,
            stride,
            format,
        })
    }

    /// Describe a buffer whose rows are packed back to back.
    pub fn packed(data: &'a [u8], rows: usize, cols: usize, format: FormatTag) -> Result<Self> {
        Self::new(data, rows, cols, cols * format.bytes_per_pixel(), format)
    }

    /// The whole buffer, including any bytes past the last row.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Pixels per row.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Bytes between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Pixel format.
    pub fn format(&self) -> FormatTag {
        self.format
    }

    /// Bytes of pixel data in one row.
    pub fn row_bytes(&self) -> usize {
        self.cols * self.format.bytes_per_pixel()
    }

    /// Pixel bytes of row `r`.
    pub fn row(&self, r: usize) -> &'a [u8] {
        let start = r * self.stride;
        &self.data[start..start + self.row_bytes()]
    }

    /// Bytes of the pixel at row `r`, column `c`.
    pub fn pixel(&self, r: usize, c: usize) -> &'a [u8] {
        let bpp = self.format.bytes_per_pixel();
        &self.row(r)[c * bpp..(c + 1) * bpp]
    }
}

/// Borrowed, writable external image.
#[derive(Debug)]
pub struct ImageViewMut<'a> {
    data: &'a mut [u8],
    rows: usize,
    cols: usize,
    stride: usize,
    format: FormatTag,
}

impl<'a> ImageViewMut<'a> {
    /// Describe `rows` x `cols` writable pixels of `format` whose rows start
    /// `stride` bytes apart.
    pub fn new(
        data: &'a mut [u8],
        rows: usize,
        cols: usize,
        stride: usize,
        format: FormatTag,
    ) -> Result<Self> {
        check_strided(data.len(), rows, cols, stride, format.bytes_per_pixel())?;
        Ok(Self {
            data,
            rows,
            cols,
            stride,
            format,
        })
    }

    /// Describe a writable buffer whose rows are packed back to back.
    pub fn packed(data: &'a mut [u8], rows: usize, cols: usize, format: FormatTag) -> Result<Self> {
        let stride = cols * format.bytes_per_pixel();
        Self::new(data, rows, cols, stride, format)
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Pixels per row.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Bytes between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Pixel format.
    pub fn format(&self) -> FormatTag {
        self.format
    }

    /// Bytes of pixel data in one row.
    pub fn row_bytes(&self) -> usize {
        self.cols * self.format.bytes_per_pixel()
    }

    /// The whole buffer.
    pub fn data(&self) -> &[u8] {
        &*self.data
    }

    /// The whole buffer, writable.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }

    /// Writable pixel bytes of row `r`.
    pub fn row_mut(&mut self, r: usize) -> &mut [u8] {
        let start = r * self.stride;
        let len = self.row_bytes();
        &mut self.data[start..start + len]
    }

    /// Read-only view of the same image.
    pub fn as_view(&self) -> ImageView<'_> {
        ImageView {
            data: &*self.data,
            rows: self.rows,
            cols: self.cols,
            stride: self.stride,
            format: self.format,
        }
    }
}

/// Owned external image on a 64-byte aligned buffer.
///
/// Rows are padded to `stride` bytes; the padding is zero on construction.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    data: AVec<u8, ConstAlign<64>>,
    rows: usize,
    cols: usize,
    stride: usize,
    format: FormatTag,
}

impl ImageBuffer {
    /// A zeroed image with rows packed back to back.
    pub fn new(rows: usize, cols: usize, format: FormatTag) -> Result<Self> {
        let stride = cols
            .checked_mul(format.bytes_per_pixel())
            .ok_or_else(|| SnapError::invalid_argument(format!("{} pixels per row overflows", cols)))?;
        Self::with_stride(rows, cols, stride, format)
    }

    /// A zeroed image whose rows start `stride` bytes apart.
    pub fn with_stride(rows: usize, cols: usize, stride: usize, format: FormatTag) -> Result<Self> {
        let len = rows
            .checked_mul(stride)
            .ok_or_else(|| SnapError::invalid_argument("image extent overflows"))?;
        check_strided(len, rows, cols, stride, format.bytes_per_pixel())?;

        let data = AVec::from_iter(64, iter::repeat(0u8).take(len));
        Ok(Self {
            data,
            rows,
            cols,
            stride,
            format,
        })
    }

    /// Copy `pixels` (rows packed back to back) into a new image.
    pub fn from_packed(pixels: &[u8], rows: usize, cols: usize, format: FormatTag) -> Result<Self> {
        let mut image = Self::new(rows, cols, format)?;
        let expected = image.data.len();
        if pixels.len() != expected {
            return Err(SnapError::invalid_argument(format!(
                "expected {} bytes of {} pixels, got {}",
                expected, format, pixels.len()
            )));
        }
        image.data.copy_from_slice(pixels);
        Ok(image)
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Pixels per row.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Bytes between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Pixel format.
    pub fn format(&self) -> FormatTag {
        self.format
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The raw bytes, writable.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Borrow as a read-only view.
    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            data: &self.data[..],
            rows: self.rows,
            cols: self.cols,
            stride: self.stride,
            format: self.format,
        }
    }

    /// Borrow as a writable view.
    pub fn view_mut(&mut self) -> ImageViewMut<'_> {
        ImageViewMut {
            data: &mut self.data[..],
            rows: self.rows,
            cols: self.cols,
            stride: self.stride,
            format: self.format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_view_accessors() {
        let data: Vec<u8> = (0..24).collect();
        let view = ImageView::new(&data, 2, 3, 12, FormatTag::Bgr24).unwrap();
        assert_eq!(view.row_bytes(), 9);
        assert_eq!(view.row(1), &data[12..21]);
        assert_eq!(view.pixel(1, 2), &[18, 19, 20]);
    }

    #[test]
    fn test_short_stride_rejected() {
        let data = [0u8; 64];
        let err = ImageView::new(&data, 2, 5, 4, FormatTag::Grey8).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let data = [0u8; 20];
        let err = ImageView::new(&data, 3, 8, 8, FormatTag::Grey8).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        // The last row does not need its padding.
        assert!(ImageView::new(&data[..20], 3, 4, 8, FormatTag::Grey8).is_ok());
    }

    #[test]
    fn test_empty_image() {
        let view = ImageView::packed(&[], 0, 0, FormatTag::Bgra32).unwrap();
        assert_eq!(view.rows(), 0);
    }

    #[test]
    fn test_buffer_is_aligned_and_zeroed() {
        let image = ImageBuffer::with_stride(3, 5, 32, FormatTag::Bgr24).unwrap();
        assert_eq!(image.as_bytes().len(), 96);
        assert_eq!(image.as_bytes().as_ptr() as usize % 64, 0);
        assert!(image.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_from_packed_checks_length() {
        let err = ImageBuffer::from_packed(&[1, 2, 3], 2, 2, FormatTag::Grey8).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        let image = ImageBuffer::from_packed(&[1, 2, 3, 4], 2, 2, FormatTag::Grey8).unwrap();
        assert_eq!(image.view().row(1), &[3, 4]);
    }
}
