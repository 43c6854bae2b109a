//! Aligned heap allocation.
//!
//! [`Allocator`] is the pluggable seam used by dynamic matrices; the default
//! [`AlignedAllocator`] goes through the global allocator with an explicit
//! alignment. [`HeapBlock`] owns one zero-initialized allocation and returns
//! it exactly once on drop.

use crate::error::{Result, SnapError};
use bytemuck::Pod;
use std::alloc::{self, Layout};
use std::fmt;
use std::mem::align_of;
use std::ptr::{self, NonNull};

/// Source of aligned storage.
pub trait Allocator: Default + Clone {
    /// Obtain uninitialized storage for `count` values of `T` whose address
    /// is a multiple of `alignment` bytes.
    ///
    /// A zero-sized request returns a dangling pointer that must not be read.
    fn allocate<T>(&self, count: usize, alignment: usize) -> Result<NonNull<T>>;

    /// Return storage previously obtained from [`allocate`](Allocator::allocate).
    ///
    /// # Safety
    /// `ptr`, `count` and `alignment` must be exactly those of one earlier
    /// successful `allocate` call on an equal allocator, and the storage must
    /// not be freed twice.
    unsafe fn free<T>(&self, ptr: NonNull<T>, count: usize, alignment: usize);
}

/// Allocator backed by the global heap with an explicit alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignedAllocator;

fn layout_for<T>(count: usize, alignment: usize) -> Result<Layout> {
    let align = alignment.max(align_of::<T>());
    Layout::array::<T>(count)
        .and_then(|layout| layout.align_to(align))
        .map_err(|e| {
            SnapError::allocation_failed(format!(
                "invalid layout for {} elements aligned to {}: {}",
                count, alignment, e
            ))
        })
}

impl Allocator for AlignedAllocator {
    fn allocate<T>(&self, count: usize, alignment: usize) -> Result<NonNull<T>> {
        let layout = layout_for::<T>(count, alignment)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }

        // SAFETY: the layout has a non-zero size.
        let raw = unsafe { alloc::alloc(layout) };
        match NonNull::new(raw as *mut T) {
            Some(ptr) => {
                tracing::trace!(bytes = layout.size(), align = layout.align(), "allocated block");
                Ok(ptr)
            }
            None => {
                tracing::debug!(bytes = layout.size(), align = layout.align(), "allocation failed");
                Err(SnapError::allocation_failed(format!(
                    "out of memory allocating {} bytes aligned to {}",
                    layout.size(),
                    layout.align()
                )))
            }
        }
    }

    unsafe fn free<T>(&self, ptr: NonNull<T>, count: usize, alignment: usize) {
        let Ok(layout) = layout_for::<T>(count, alignment) else {
            return;
        };
        if layout.size() == 0 {
            return;
        }
        tracing::trace!(bytes = layout.size(), "freed block");
        alloc::dealloc(ptr.as_ptr() as *mut u8, layout);
    }
}

/// An owned, zero-initialized, aligned array of `T`.
pub struct HeapBlock<T: Pod, A: Allocator = AlignedAllocator> {
    ptr: NonNull<T>,
    len: usize,
    alignment: usize,
    alloc: A,
}

impl<T: Pod, A: Allocator> HeapBlock<T, A> {
    /// An empty block that owns no storage.
    pub fn empty_in(alloc: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            alignment: align_of::<T>(),
            alloc,
        }
    }

    /// Allocate `len` zeroed values aligned to `alignment` bytes from `alloc`.
    pub fn zeroed_in(len: usize, alignment: usize, alloc: A) -> Result<Self> {
        if len == 0 {
            return Ok(Self::empty_in(alloc));
        }

        let ptr = alloc.allocate::<T>(len, alignment)?;
        // SAFETY: `ptr` holds `len` values of `T`, and all-zero is a valid `Pod`.
        unsafe { ptr::write_bytes(ptr.as_ptr(), 0, len) };
        Ok(Self {
            ptr,
            len,
            alignment,
            alloc,
        })
    }

    /// Allocate `len` zeroed values aligned to `alignment` bytes.
    pub fn zeroed(len: usize, alignment: usize) -> Result<Self> {
        Self::zeroed_in(len, alignment, A::default())
    }

    /// Number of values in the block.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the block owns no storage.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Alignment in bytes the block was requested with.
    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// The allocator owning the storage.
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Contents as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `ptr` is valid for `len` initialized values (or dangling with len 0).
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Contents as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as above, and `&mut self` guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Deep copy into a fresh allocation from a clone of the same allocator.
    pub fn try_clone(&self) -> Result<Self> {
        let mut copy = Self::zeroed_in(self.len, self.alignment, self.alloc.clone())?;
        copy.as_mut_slice().copy_from_slice(self.as_slice());
        Ok(copy)
    }
}

impl<T: Pod, A: Allocator> Default for HeapBlock<T, A> {
    fn default() -> Self {
        Self::empty_in(A::default())
    }
}

impl<T: Pod, A: Allocator> Drop for HeapBlock<T, A> {
    fn drop(&mut self) {
        if self.len == 0 {
            return;
        }
        // SAFETY: `ptr`/`len`/`alignment` come from the allocation in `zeroed_in`,
        // and drop runs once.
        unsafe { self.alloc.free(self.ptr, self.len, self.alignment) };
    }
}

impl<T: Pod, A: Allocator> fmt::Debug for HeapBlock<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapBlock")
            .field("len", &self.len)
            .field("alignment", &self.alignment)
            .finish()
    }
}

// SAFETY: the block uniquely owns its storage, like `Box<[T]>`.
unsafe impl<T: Pod + Send, A: Allocator + Send> Send for HeapBlock<T, A> {}
// SAFETY: shared access only hands out `&[T]`.
unsafe impl<T: Pod + Sync, A: Allocator + Sync> Sync for HeapBlock<T, A> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::types::is_aligned_to;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct CountingAllocator {
        live: Rc<Cell<isize>>,
    }

    impl Allocator for CountingAllocator {
        fn allocate<T>(&self, count: usize, alignment: usize) -> Result<NonNull<T>> {
            self.live.set(self.live.get() + 1);
            AlignedAllocator.allocate(count, alignment)
        }

        unsafe fn free<T>(&self, ptr: NonNull<T>, count: usize, alignment: usize) {
            self.live.set(self.live.get() - 1);
            AlignedAllocator.free(ptr, count, alignment)
        }
    }

    #[test]
    fn test_allocation_is_aligned() {
        for alignment in [8, 16, 32, 64] {
            let ptr = AlignedAllocator.allocate::<u8>(100, alignment).unwrap();
            assert!(is_aligned_to(ptr.as_ptr(), alignment));
            unsafe { AlignedAllocator.free(ptr, 100, alignment) };
        }
    }

    #[test]
    fn test_zero_size_request() {
        let ptr = AlignedAllocator.allocate::<u32>(0, 16).unwrap();
        unsafe { AlignedAllocator.free(ptr, 0, 16) };
    }

    #[test]
    fn test_invalid_alignment() {
        let err = AlignedAllocator.allocate::<u8>(16, 3).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AllocationFailed);
    }

    #[test]
    fn test_overflowing_request() {
        let err = AlignedAllocator.allocate::<u64>(usize::MAX / 4, 16).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AllocationFailed);
    }

    #[test]
    fn test_block_is_zeroed() {
        let block: HeapBlock<u32> = HeapBlock::zeroed(37, 32).unwrap();
        assert_eq!(block.len(), 37);
        assert!(block.as_slice().iter().all(|&x| x == 0));
        assert!(is_aligned_to(block.as_slice().as_ptr(), 32));
    }

    #[test]
    fn test_block_frees_exactly_once() {
        let alloc = CountingAllocator::default();
        let live = Rc::clone(&alloc.live);
        {
            let mut block = HeapBlock::<u8, _>::zeroed_in(64, 16, alloc).unwrap();
            block.as_mut_slice()[3] = 7;
            let copy = block.try_clone().unwrap();
            assert_eq!(copy.as_slice()[3], 7);
            assert_eq!(live.get(), 2);
        }
        assert_eq!(live.get(), 0);
    }

    #[test]
    fn test_empty_block_never_allocates() {
        let alloc = CountingAllocator::default();
        let live = Rc::clone(&alloc.live);
        let block = HeapBlock::<u8, _>::zeroed_in(0, 16, alloc).unwrap();
        assert!(block.is_empty());
        drop(block);
        assert_eq!(live.get(), 0);
    }
}
