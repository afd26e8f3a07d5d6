//! Byte buffers that cross the runtime boundary.
//!
//! # Responsibility
//! - Allocate natively-owned buffers without aborting on allocation failure.
//! - Give every allocation exactly one release path.
//!
//! # Invariants
//! - An `OwnedBuffer` pointer is never null, even for zero-length buffers.
//! - A buffer handed out through `into_raw` is released only through
//!   `OwnedBuffer::from_raw` (the C ABI's `native_binder_free`).
//! - A `ReplyBuffer` is always released through the allocator that produced it.

use crate::error::{BridgeError, BridgeResult};
use std::alloc::{alloc, alloc_zeroed, dealloc, Layout};
use std::fmt::{Debug, Formatter};
use std::mem::{align_of, size_of, ManuallyDrop};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

// Length prefix stored in front of the payload so the release path only needs
// the payload pointer.
const HEADER_SIZE: usize = size_of::<usize>();
const HEADER_ALIGN: usize = align_of::<usize>();

static LIVE_BUFFERS: AtomicUsize = AtomicUsize::new(0);

/// Largest payload either boundary accepts: a managed array length is a
/// signed 32-bit `jsize`.
pub const MAX_MESSAGE_LEN: usize = i32::MAX as usize;

/// Release function for buffers allocated on the foreign side of the boundary.
pub type ReleaseFn = unsafe extern "C" fn(*mut u8);

/// Returns the number of `OwnedBuffer` allocations not yet released.
///
/// Buffers passed out through `into_raw` stay counted until they come back
/// through `from_raw` and are dropped.
pub fn live_buffer_count() -> usize {
    LIVE_BUFFERS.load(Ordering::Acquire)
}

/// Rejects payloads longer than [`MAX_MESSAGE_LEN`].
///
/// # Errors
/// - `MessageTooLarge` when `len` exceeds the limit.
pub fn ensure_message_len(len: usize) -> BridgeResult<()> {
    if len > MAX_MESSAGE_LEN {
        return Err(BridgeError::MessageTooLarge(len));
    }
    Ok(())
}

/// Natively-owned byte buffer with a single release path.
pub struct OwnedBuffer {
    data: NonNull<u8>,
    len: usize,
}

// The buffer uniquely owns its allocation.
unsafe impl Send for OwnedBuffer {}
unsafe impl Sync for OwnedBuffer {}

impl OwnedBuffer {
    /// Allocates a buffer and copies `bytes` into it.
    ///
    /// # Errors
    /// - `AllocationFailed` when the allocator returns null.
    pub fn copy_from_slice(bytes: &[u8]) -> BridgeResult<Self> {
        let mut buffer = Self::allocate(bytes.len(), false)?;
        buffer.as_mut_slice().copy_from_slice(bytes);
        Ok(buffer)
    }

    /// Allocates a zero-filled buffer of `len` bytes.
    ///
    /// # Errors
    /// - `AllocationFailed` when the size overflows or the allocator returns null.
    pub fn zeroed(len: usize) -> BridgeResult<Self> {
        Self::allocate(len, true)
    }

    fn allocate(len: usize, zeroed: bool) -> BridgeResult<Self> {
        let layout = layout_for(len)?;
        // SAFETY: layout has non-zero size because of the header.
        let base = unsafe {
            if zeroed {
                alloc_zeroed(layout)
            } else {
                alloc(layout)
            }
        };
        let base = NonNull::new(base).ok_or(BridgeError::AllocationFailed { requested: len })?;
        // SAFETY: base is valid for `HEADER_SIZE + len` bytes and aligned for usize.
        let data = unsafe {
            base.as_ptr().cast::<usize>().write(len);
            NonNull::new_unchecked(base.as_ptr().add(HEADER_SIZE))
        };
        LIVE_BUFFERS.fetch_add(1, Ordering::AcqRel);
        Ok(Self { data, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: data is valid for `len` initialized bytes for the buffer lifetime.
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: unique ownership, data valid for `len` bytes.
        unsafe { std::slice::from_raw_parts_mut(self.data.as_ptr(), self.len) }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    /// Transfers ownership to a foreign caller.
    ///
    /// The returned pointer is non-null. It must come back exactly once through
    /// [`OwnedBuffer::from_raw`].
    pub fn into_raw(self) -> (*mut u8, usize) {
        let buffer = ManuallyDrop::new(self);
        (buffer.data.as_ptr(), buffer.len)
    }

    /// Reclaims a buffer previously released with [`OwnedBuffer::into_raw`].
    ///
    /// Returns `None` for a null pointer.
    ///
    /// # Safety
    /// `ptr` must be null or a pointer returned by `into_raw` that has not been
    /// reclaimed yet.
    pub unsafe fn from_raw(ptr: *mut u8) -> Option<Self> {
        let data = NonNull::new(ptr)?;
        let len = data.as_ptr().sub(HEADER_SIZE).cast::<usize>().read();
        Some(Self { data, len })
    }
}

impl Drop for OwnedBuffer {
    fn drop(&mut self) {
        // SAFETY: the layout was validated when the buffer was allocated.
        unsafe {
            let base = self.data.as_ptr().sub(HEADER_SIZE);
            let layout = Layout::from_size_align_unchecked(HEADER_SIZE + self.len, HEADER_ALIGN);
            dealloc(base, layout);
        }
        LIVE_BUFFERS.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Debug for OwnedBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnedBuffer").field("len", &self.len).finish()
    }
}

fn layout_for(len: usize) -> BridgeResult<Layout> {
    let total = HEADER_SIZE
        .checked_add(len)
        .ok_or(BridgeError::AllocationFailed { requested: len })?;
    Layout::from_size_align(total, HEADER_ALIGN)
        .map_err(|_| BridgeError::AllocationFailed { requested: len })
}

/// Response produced by a native callback.
///
/// Dropping the reply releases it through the allocator that produced it.
pub struct ReplyBuffer {
    storage: ReplyStorage,
}

enum ReplyStorage {
    Owned(OwnedBuffer),
    Foreign {
        ptr: NonNull<u8>,
        len: usize,
        release: ReleaseFn,
    },
}

// Foreign replies are uniquely owned until released.
unsafe impl Send for ReplyBuffer {}

impl ReplyBuffer {
    /// Wraps a buffer allocated on the foreign side.
    ///
    /// Returns `None` when `ptr` is null.
    ///
    /// # Safety
    /// `ptr` must be valid for reads of `len` bytes until `release(ptr)` runs,
    /// and `release` must be the matching deallocator.
    pub unsafe fn from_foreign(ptr: *mut u8, len: usize, release: ReleaseFn) -> Option<Self> {
        let ptr = NonNull::new(ptr)?;
        Some(Self {
            storage: ReplyStorage::Foreign { ptr, len, release },
        })
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            ReplyStorage::Owned(buffer) => buffer.len(),
            ReplyStorage::Foreign { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        match &self.storage {
            ReplyStorage::Owned(buffer) => buffer.as_slice(),
            // SAFETY: guaranteed by the `from_foreign` contract.
            ReplyStorage::Foreign { ptr, len, .. } => unsafe {
                std::slice::from_raw_parts(ptr.as_ptr(), *len)
            },
        }
    }
}

impl From<OwnedBuffer> for ReplyBuffer {
    fn from(buffer: OwnedBuffer) -> Self {
        Self {
            storage: ReplyStorage::Owned(buffer),
        }
    }
}

impl Drop for ReplyBuffer {
    fn drop(&mut self) {
        if let ReplyStorage::Foreign { ptr, release, .. } = &self.storage {
            // SAFETY: guaranteed by the `from_foreign` contract; runs once.
            unsafe { release(ptr.as_ptr()) };
        }
    }
}

impl Debug for ReplyBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyBuffer")
            .field("len", &self.len())
            .finish()
    }
}
