//! Native callback capability and its process-wide registration slot.
//!
//! # Responsibility
//! - Wrap a native handler (Rust closure or C function pointer) in a
//!   capability object with identity equality.
//! - Hold at most one active callback with last-write-wins replacement.
//!
//! # Invariants
//! - Each `NativeCallback::new` produces a distinct identity; clones share it.
//! - The slot lock is never held while a callback runs.

use crate::buffer::{ReleaseFn, ReplyBuffer};
use log::info;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

static NEXT_CALLBACK_ID: AtomicU64 = AtomicU64::new(1);

/// C signature of a native callback: `(message, message_len, out_len) -> reply`.
pub type ExternCallFn = unsafe extern "C" fn(*const u8, u32, *mut u32) -> *mut u8;

unsafe extern "C" fn release_with_c_free(ptr: *mut u8) {
    libc::free(ptr.cast::<libc::c_void>());
}

/// Handler invoked on the inbound path.
///
/// Returning `None` reports failure.
pub trait CallbackHandler: Send + Sync {
    fn invoke(&self, message: &[u8]) -> Option<ReplyBuffer>;
}

impl<F> CallbackHandler for F
where
    F: Fn(&[u8]) -> Option<ReplyBuffer> + Send + Sync,
{
    fn invoke(&self, message: &[u8]) -> Option<ReplyBuffer> {
        self(message)
    }
}

/// Callback exposed by foreign code as a C function pointer.
#[derive(Clone, Copy)]
pub struct ExternCallback {
    call: ExternCallFn,
    release: ReleaseFn,
}

impl ExternCallback {
    /// Callback whose replies are released with `release`.
    pub fn new(call: ExternCallFn, release: ReleaseFn) -> Self {
        Self { call, release }
    }

    /// Callback whose replies come from the C allocator (`malloc`).
    pub fn with_c_free(call: ExternCallFn) -> Self {
        Self::new(call, release_with_c_free)
    }
}

impl CallbackHandler for ExternCallback {
    fn invoke(&self, message: &[u8]) -> Option<ReplyBuffer> {
        let len = u32::try_from(message.len()).ok()?;
        let mut out_len: u32 = 0;
        // SAFETY: `message` outlives the call; the callee treats it as read-only
        // and reports the reply length through `out_len`.
        let reply = unsafe { (self.call)(message.as_ptr(), len, &mut out_len) };
        // SAFETY: a non-null reply is valid for `out_len` bytes until released.
        unsafe { ReplyBuffer::from_foreign(reply, out_len as usize, self.release) }
    }
}

/// Registered native callback capability.
#[derive(Clone)]
pub struct NativeCallback {
    id: u64,
    handler: Arc<dyn CallbackHandler>,
}

impl NativeCallback {
    pub fn new(handler: impl CallbackHandler + 'static) -> Self {
        Self {
            id: NEXT_CALLBACK_ID.fetch_add(1, Ordering::Relaxed),
            handler: Arc::new(handler),
        }
    }

    /// Wraps a C function pointer whose replies are released with `free`.
    pub fn from_extern(call: ExternCallFn) -> Self {
        Self::new(ExternCallback::with_c_free(call))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn invoke(&self, message: &[u8]) -> Option<ReplyBuffer> {
        self.handler.invoke(message)
    }
}

impl PartialEq for NativeCallback {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for NativeCallback {}

impl Debug for NativeCallback {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeCallback")
            .field("id", &self.id)
            .finish()
    }
}

/// Slot holding the single active native callback.
#[derive(Debug, Default)]
pub struct CallbackSlot {
    current: RwLock<Option<NativeCallback>>,
}

impl CallbackSlot {
    pub const fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    /// Stores `callback`, returning the one it replaced.
    pub fn register(&self, callback: NativeCallback) -> Option<NativeCallback> {
        let id = callback.id();
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(callback);
        info!(
            "event=callback_register module=callback status=ok callback_id={} replaced={}",
            id,
            previous.is_some()
        );
        previous
    }

    /// Returns a handle to the active callback.
    pub fn current(&self) -> Option<NativeCallback> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_registered(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
