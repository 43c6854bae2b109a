//! SIMD lane layer for snap.
//!
//! This module provides fixed-width 128-bit lane vectors over every supported
//! element type, together with the aligned slice wrappers that aligned loads
//! and stores require.
//!
//! # Architecture
//!
//! The module is organized into layers:
//! - `profile`: compile-time instruction profile and the startup check
//! - `traits`: the [`Lane`] interface and the element-to-register mapping
//! - `aligned`: [`Aligned`]/[`AlignedMut`] slice wrappers
//! - `portable`: [`LaneVector`] over the `wide` registers, plus byte-copy
//!   memory primitives
//! - `x86`: SSE2 memory primitives on x86_64
//!
//! The memory backend is picked at compile time; there is no runtime dispatch.
//!
//! # Usage
//!
//! ```rust
//! use snap::simd::{Lane, Vec16x8u};
//!
//! let v = Vec16x8u::broadcast(244);
//! assert_eq!(v.extract(15), 244);
//! ```

pub mod aligned;
pub mod portable;
pub mod profile;
pub mod traits;
#[cfg(all(target_arch = "x86_64", target_feature = "sse2"))]
pub mod x86;

#[cfg(test)]
mod tests;

#[cfg(all(target_arch = "x86_64", target_feature = "sse2", not(feature = "portable")))]
use self::x86 as backend;

#[cfg(not(all(target_arch = "x86_64", target_feature = "sse2", not(feature = "portable"))))]
use self::portable as backend;

pub use aligned::{Aligned, AlignedMut};
pub use portable::{
    LaneVector, Vec16x8s, Vec16x8u, Vec4x32f, Vec4x32s, Vec4x32u, Vec8x16s, Vec8x16u,
};
pub use profile::{
    init, Alignment, InstructionProfile, SimdType, LANE_ALIGN, LANE_WIDTH_BYTES, PROFILE,
};
pub use traits::{Lane, NativeLanes};
