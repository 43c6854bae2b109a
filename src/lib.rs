//! # snap - SIMD lanes and aligned pixel matrices
//!
//! Fixed-width lane vectors mapped onto 128-bit SIMD registers, row-major
//! matrices whose rows are padded to the instruction set's alignment, and a
//! dispatcher that moves pixels between external buffers and those matrices.
//!
//! ## Overview
//!
//! - **Lane vectors**: `LaneVector<T, N>` over every 128-bit element layout,
//!   with broadcast, aligned/unaligned load and store, and per-lane access
//! - **Aligned wrappers**: `Aligned`/`AlignedMut` slices, checked once and
//!   required by every aligned load and store
//! - **Matrices**: `FixedMatrix` (inline, sized at compile time) and
//!   `DynamicMatrix` (aligned heap block) sharing one stride policy
//! - **Formats**: `Grey8`, `Bgr24` and `Bgra32`, each bound to its lane type
//! - **Conversion**: same-format lane copies resolved statically, cross-format
//!   routines from a runtime table
//!
//! ## Quick Start
//!
//! ```rust
//! use snap::prelude::*;
//!
//! snap::init().unwrap();
//!
//! // A 2 x 20 greyscale image, rows packed back to back
//! let pixels: Vec<u8> = (0..40).collect();
//! let image = ImageView::packed(&pixels, 2, 20, FormatTag::Grey8).unwrap();
//!
//! let matrix = DynamicMatrix::<Grey8>::from_image(&image).unwrap();
//! assert_eq!(matrix.row(1)[0], 20);
//! assert_eq!(matrix.step() % Grey8::ALIGNMENT, 0);
//! ```
//!
//! ## Converting Between Formats
//!
//! ```rust
//! use snap::prelude::*;
//!
//! let bgr = [0u8, 0, 255, 255, 255, 255];
//! let image = ImageView::packed(&bgr, 1, 2, FormatTag::Bgr24).unwrap();
//!
//! let mut grey = DynamicMatrix::<Grey8>::with_pixels(1, 2).unwrap();
//! let route = convert(&image, &mut grey).unwrap();
//! assert_eq!(route, Route::Runtime);
//! assert_eq!(grey.row(0), &[77, 255]);
//! ```
//!
//! ## Module Overview
//!
//! - [`simd`]: Lane vectors, aligned wrappers, instruction profile
//! - [`alloc`]: Aligned allocator and owning heap block
//! - [`matrix`]: Fixed and dynamic matrices, format registry
//! - [`convert`]: External buffers and the conversion dispatcher
//! - [`utils`]: Tracing subscriber setup

#![allow(clippy::module_inception)]
#![allow(clippy::new_without_default)]

pub mod alloc;
pub mod config;
pub mod convert;
pub mod error;
pub mod matrix;
pub mod simd;
pub mod types;
pub mod utils;

pub use config::{ConvertConfig, LoadSelection};
pub use error::{ErrorCode, Result, SnapError};
pub use simd::profile::{init, PROFILE};
pub use types::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ConvertConfig, LoadSelection};
    pub use crate::error::{ErrorCode, Result, SnapError};
    pub use crate::fixed_matrix;
    pub use crate::types::*;

    // Lanes
    pub use crate::simd::{
        Aligned, AlignedMut, InstructionProfile, Lane, LaneVector, SimdType, Vec16x8s, Vec16x8u,
        Vec4x32f, Vec4x32s, Vec4x32u, Vec8x16s, Vec8x16u, LANE_ALIGN, PROFILE,
    };

    // Storage
    pub use crate::alloc::{AlignedAllocator, Allocator, HeapBlock};
    pub use crate::matrix::{
        step_size, Bgr24, Bgra32, DynamicMatrix, FixedMatrix, Format, FormatTag, Grey8,
        MatrixKind, MatrixStorage,
    };

    // Conversion
    pub use crate::convert::{
        convert, convert_into, ConversionDispatcher, ImageBuffer, ImageView, ImageViewMut, Route,
    };
}
