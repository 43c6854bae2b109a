//! Core type definitions for snap.
//!
//! The element trait every lane scalar implements and the alignment check
//! shared by the lane and conversion layers.

use bytemuck::Pod;
use num_traits::Zero;
use std::fmt;

/// Trait for scalar types that can occupy a lane of a [`LaneVector`](crate::simd::LaneVector).
pub trait LaneElement:
    Pod
    + Zero
    + Copy
    + Default
    + PartialEq
    + fmt::Debug
    + Send
    + Sync
    + 'static
{
    /// Short name used in diagnostics.
    const NAME: &'static str;
}

macro_rules! impl_lane_element {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl LaneElement for $ty {
                const NAME: &'static str = $name;
            }
        )*
    };
}

impl_lane_element! {
    u8 => "u8",
    i8 => "i8",
    u16 => "u16",
    i16 => "i16",
    u32 => "u32",
    i32 => "i32",
    f32 => "f32",
}

/// Check if a pointer is aligned to `alignment` bytes.
#[inline]
pub fn is_aligned_to<T>(ptr: *const T, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    (ptr as usize) & (alignment - 1) == 0
}
