//! Tests for the lane vectors.

use crate::simd::aligned::{Aligned, AlignedMut, Spill};
use crate::simd::portable::*;
use crate::simd::traits::*;

const EPSILON: f32 = 1e-6;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

// ========================================================================
// Broadcast
// ========================================================================

#[test]
fn test_broadcast_unsigned() {
    let v = Vec16x8u::broadcast(244);
    assert!(v.to_array().iter().all(|&x| x == 244));
}

#[test]
fn test_broadcast_signed() {
    let v = Vec16x8s::broadcast(-100);
    assert!(v.to_array().iter().all(|&x| x == -100));
}

#[test]
fn test_broadcast_wide_elements() {
    assert!(Vec8x16u::broadcast(60_000).to_array().iter().all(|&x| x == 60_000));
    assert!(Vec8x16s::broadcast(-1234).to_array().iter().all(|&x| x == -1234));
    assert!(Vec4x32u::broadcast(u32::MAX).to_array().iter().all(|&x| x == u32::MAX));
    assert!(Vec4x32s::broadcast(i32::MIN).to_array().iter().all(|&x| x == i32::MIN));
    assert!(Vec4x32f::broadcast(3.5).to_array().iter().all(|&x| approx_eq(x, 3.5)));
}

#[test]
fn test_default_is_usable() {
    let mut v = Vec4x32u::default();
    v.set(2, 9);
    assert_eq!(v.extract(2), 9);
}

// ========================================================================
// Loads
// ========================================================================

#[test]
fn test_load_from_unaligned_array() {
    let backing: Vec<u8> = (0..64).collect();
    for offset in 0..16 {
        let v = Vec16x8u::load(&backing[offset..]);
        for i in 0..16 {
            assert_eq!(v.extract(i), (offset + i) as u8);
        }
    }
}

#[test]
fn test_loada_from_aligned_array() {
    let mut spill = Spill([0i8; 16]);
    for (i, x) in spill.0.iter_mut().enumerate() {
        *x = i as i8 - 8;
    }
    let v = Vec16x8s::loada(Aligned::new(&spill.0).unwrap());
    assert_eq!(v.to_array(), spill.0);
}

#[test]
fn test_load_reads_only_first_lane_width() {
    let data: Vec<u16> = (0..20).collect();
    let v = Vec8x16u::load(&data);
    assert_eq!(v.to_array(), [0, 1, 2, 3, 4, 5, 6, 7]);
}

#[test]
#[should_panic]
fn test_load_short_slice_panics() {
    let data = [1u32, 2, 3];
    let _ = Vec4x32u::load(&data);
}

#[test]
fn test_load_partial_zero_fills() {
    let data = [9u8, 8, 7, 6, 5];
    let v = Vec16x8u::load_partial(&data);
    assert_eq!(&v.to_array()[..5], &data);
    assert!(v.to_array()[5..].iter().all(|&x| x == 0));
}

// ========================================================================
// Stores
// ========================================================================

#[test]
fn test_store_to_aligned_array() {
    let v = Vec4x32f::from_array([1.0, -2.0, 0.5, 8.0]);
    let mut spill = Spill([0.0f32; 4]);
    v.store(AlignedMut::new(&mut spill.0).unwrap());
    assert_eq!(spill.0, [1.0, -2.0, 0.5, 8.0]);
}

#[test]
fn test_storeu_to_unaligned_array() {
    let v = Vec16x8u::broadcast(0xAB);
    let mut out = vec![0u8; 40];
    v.storeu(&mut out[7..]);
    assert!(out[..7].iter().all(|&x| x == 0));
    assert!(out[7..23].iter().all(|&x| x == 0xAB));
    assert!(out[23..].iter().all(|&x| x == 0));
}

#[test]
fn test_storeu_partial_writes_prefix() {
    let v = Vec16x8u::broadcast(5);
    let mut out = [1u8; 6];
    v.storeu_partial(&mut out[..3]);
    assert_eq!(out, [5, 5, 5, 1, 1, 1]);
}

#[test]
fn test_aligned_store_then_unaligned_load() {
    let mut lanes = [0i32; 4];
    for (i, x) in lanes.iter_mut().enumerate() {
        *x = (i as i32) * -7;
    }
    let v = Vec4x32s::from_array(lanes);

    let mut spill = Spill([0u8; 32]);
    v.store_bytes(spill.aligned_mut());
    let back = Vec4x32s::load_bytes(&spill.0);
    assert_eq!(back, v);
}

// ========================================================================
// Lane access
// ========================================================================

#[test]
fn test_set_each_lane_to_index() {
    let mut v = Vec16x8u::broadcast(0);
    for i in 0..Vec16x8u::LANES {
        v.set(i, i as u8);
    }
    for i in 0..Vec16x8u::LANES {
        assert_eq!(v.extract(i), i as u8);
    }
}

#[test]
fn test_set_leaves_other_lanes() {
    let mut v = Vec8x16s::broadcast(-3);
    v.set(4, 100);
    let lanes = v.to_array();
    assert_eq!(lanes[4], 100);
    assert_eq!(lanes.iter().filter(|&&x| x == -3).count(), 7);
}

#[test]
#[should_panic]
fn test_extract_out_of_range_panics() {
    let v = Vec4x32f::broadcast(1.0);
    let _ = v.extract(4);
}

#[test]
fn test_lane_constants() {
    assert_eq!(Vec16x8u::LANES, 16);
    assert_eq!(Vec8x16u::LANES, 8);
    assert_eq!(Vec4x32f::LANES, 4);
    assert_eq!(<Vec4x32u as Lane>::BYTES, 16);
    assert_eq!(std::mem::size_of::<Vec16x8s>(), 16);
}

#[test]
fn test_debug_names_element_type() {
    let v = Vec4x32s::broadcast(-1);
    assert_eq!(format!("{:?}", v), "LaneVector<i32, 4>([-1, -1, -1, -1])");
}

// ========================================================================
// Round trips
// ========================================================================

#[test]
fn test_load_matches_loada_and_store_restores() {
    let mut src = Spill([0u8; 16]);
    for (i, x) in src.0.iter_mut().enumerate() {
        *x = (i as u8).wrapping_mul(37).wrapping_add(5);
    }

    let unaligned = Vec16x8u::load(&src.0);
    let aligned = Vec16x8u::loada(Aligned::new(&src.0).unwrap());
    assert_eq!(unaligned, aligned);

    let mut scratch = Spill([0u8; 16]);
    aligned.store(AlignedMut::new(&mut scratch.0).unwrap());
    assert_eq!(scratch.0, src.0);
}
