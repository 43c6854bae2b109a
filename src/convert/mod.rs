//! Conversion between external pixel buffers and matrices.
//!
//! - `image`: borrowed and owned external buffers
//! - `rows`: the per-row lane copy and pixel conversion routines
//! - `dispatcher`: route resolution (static, then runtime table)
//!
//! [`convert`] and [`convert_into`] go through a process-wide dispatcher with
//! the built-in routines and default configuration. Build a
//! [`ConversionDispatcher`] directly for a custom table or settings.

pub mod dispatcher;
pub mod image;
pub mod rows;

pub use dispatcher::{
    static_load_route, static_store_route, ConversionDispatcher, ConversionKey, Direction, LoadFn,
    Route, Routine, StoreFn,
};
pub use image::{ImageBuffer, ImageView, ImageViewMut};
pub use rows::RowPlan;

use crate::error::Result;
use crate::matrix::MatrixStorage;
use std::sync::OnceLock;

/// The shared dispatcher, built on first use.
pub fn default_dispatcher() -> &'static ConversionDispatcher {
    static DISPATCHER: OnceLock<ConversionDispatcher> = OnceLock::new();
    DISPATCHER.get_or_init(ConversionDispatcher::new)
}

/// Fill `dst` from the external image `src`.
pub fn convert<M: MatrixStorage>(src: &ImageView<'_>, dst: &mut M) -> Result<Route> {
    default_dispatcher().load(src, dst)
}

/// Drain `src` into the external image `dst`.
pub fn convert_into<M: MatrixStorage>(src: &M, dst: &mut ImageViewMut<'_>) -> Result<Route> {
    default_dispatcher().store(src, dst)
}
