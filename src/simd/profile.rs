//! Instruction profile: the lane width and alignment selected for this build.
//!
//! The profile is resolved once, at compile time, from the target features the
//! crate is built with. There is no runtime fallback between instruction sets;
//! [`init`] only confirms that the running CPU actually provides the set the
//! binary was compiled for.

use crate::error::{Result, SnapError};
use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(not(any(
    target_feature = "sse",
    target_feature = "sse2",
    target_feature = "neon",
    feature = "portable"
)))]
compile_error!(
    "snap: no supported SIMD instruction set is enabled for this target \
     (enable the `portable` feature to build with emulated lanes)"
);

/// Width in bytes of every lane vector register.
pub const LANE_WIDTH_BYTES: usize = 16;

/// Alignment in bytes required by aligned lane loads and stores.
pub const LANE_ALIGN: usize = LANE_WIDTH_BYTES;

/// The profile selected for this build.
pub const PROFILE: InstructionProfile = InstructionProfile::detect();

/// Instruction sets snap can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimdType {
    /// Scalar emulation of the lanes (`portable` feature only).
    Portable,
    /// SSE.
    Sse,
    /// SSE2.
    Sse2,
    /// SSE3.
    Sse3,
    /// SSSE3.
    Ssse3,
    /// SSE4.1.
    Sse41,
    /// SSE4.2.
    Sse42,
    /// AVX.
    Avx,
    /// AVX2.
    Avx2,
    /// 32-bit ARM NEON.
    Neon,
    /// AArch64 Advanced SIMD.
    Neon64,
}

impl fmt::Display for SimdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimdType::Portable => "portable",
            SimdType::Sse => "SSE",
            SimdType::Sse2 => "SSE2",
            SimdType::Sse3 => "SSE3",
            SimdType::Ssse3 => "SSSE3",
            SimdType::Sse41 => "SSE4.1",
            SimdType::Sse42 => "SSE4.2",
            SimdType::Avx => "AVX",
            SimdType::Avx2 => "AVX2",
            SimdType::Neon => "NEON",
            SimdType::Neon64 => "NEON64",
        };
        write!(f, "{}", name)
    }
}

/// Byte boundaries a profile may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Alignment {
    /// 8 byte boundary.
    Al8 = 8,
    /// 16 byte boundary.
    Al16 = 16,
    /// 32 byte boundary.
    Al32 = 32,
}

impl Alignment {
    /// Number of bytes of the boundary.
    pub const fn bytes(self) -> usize {
        self as usize
    }
}

/// Process-wide constants describing the selected instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionProfile {
    /// Width in bytes of one lane vector.
    pub lane_width_bytes: usize,
    /// Row alignment in bytes used by the matrix stride engine.
    pub alignment: usize,
    /// Instruction set the lanes are compiled for.
    pub instruction_set: SimdType,
}

impl InstructionProfile {
    /// Resolve the profile from the compile-time target features.
    pub const fn detect() -> Self {
        let (instruction_set, alignment) = if cfg!(feature = "portable") {
            (SimdType::Portable, Alignment::Al16)
        } else if cfg!(all(target_arch = "aarch64", target_feature = "neon")) {
            (SimdType::Neon64, Alignment::Al16)
        } else if cfg!(all(target_arch = "arm", target_feature = "neon")) {
            (SimdType::Neon, Alignment::Al16)
        } else if cfg!(target_feature = "avx2") {
            (SimdType::Avx2, Alignment::Al32)
        } else if cfg!(target_feature = "avx") {
            (SimdType::Avx, Alignment::Al32)
        } else if cfg!(target_feature = "sse4.2") {
            (SimdType::Sse42, Alignment::Al16)
        } else if cfg!(target_feature = "sse4.1") {
            (SimdType::Sse41, Alignment::Al16)
        } else if cfg!(target_feature = "ssse3") {
            (SimdType::Ssse3, Alignment::Al16)
        } else if cfg!(target_feature = "sse3") {
            (SimdType::Sse3, Alignment::Al16)
        } else if cfg!(target_feature = "sse2") {
            (SimdType::Sse2, Alignment::Al16)
        } else if cfg!(target_feature = "sse") {
            (SimdType::Sse, Alignment::Al16)
        } else {
            (SimdType::Portable, Alignment::Al16)
        };

        Self {
            lane_width_bytes: LANE_WIDTH_BYTES,
            alignment: alignment.bytes(),
            instruction_set,
        }
    }

    /// Alignment expressed in elements of `elem_size` bytes.
    pub const fn alignment_in_elements(&self, elem_size: usize) -> usize {
        self.alignment / elem_size
    }
}

/// Confirm that the running CPU supports the compiled instruction set.
///
/// This is the startup check for the fatal configuration error: callers
/// should abort initialization when it fails.
pub fn init() -> Result<&'static InstructionProfile> {
    if !runtime_supports(PROFILE.instruction_set) {
        return Err(SnapError::configuration(format!(
            "binary was built for {} but the running CPU does not support it",
            PROFILE.instruction_set
        )));
    }

    tracing::info!(
        instruction_set = %PROFILE.instruction_set,
        alignment = PROFILE.alignment,
        lane_width = PROFILE.lane_width_bytes,
        "instruction profile verified"
    );
    Ok(&PROFILE)
}

#[cfg(any(target_arch = "x86_64", target_arch = "x86"))]
fn runtime_supports(set: SimdType) -> bool {
    match set {
        SimdType::Portable => true,
        SimdType::Sse => is_x86_feature_detected!("sse"),
        SimdType::Sse2 => is_x86_feature_detected!("sse2"),
        SimdType::Sse3 => is_x86_feature_detected!("sse3"),
        SimdType::Ssse3 => is_x86_feature_detected!("ssse3"),
        SimdType::Sse41 => is_x86_feature_detected!("sse4.1"),
        SimdType::Sse42 => is_x86_feature_detected!("sse4.2"),
        SimdType::Avx => is_x86_feature_detected!("avx"),
        SimdType::Avx2 => is_x86_feature_detected!("avx2"),
        SimdType::Neon | SimdType::Neon64 => false,
    }
}

#[cfg(target_arch = "aarch64")]
fn runtime_supports(set: SimdType) -> bool {
    match set {
        SimdType::Portable => true,
        SimdType::Neon64 => std::arch::is_aarch64_feature_detected!("neon"),
        _ => false,
    }
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "x86", target_arch = "aarch64")))]
fn runtime_supports(set: SimdType) -> bool {
    match set {
        SimdType::Portable => true,
        // No stable runtime detection; trust the compile-time feature.
        SimdType::Neon => cfg!(target_feature = "neon"),
        _ => false,
    }
}
