//! Managed runtime contracts.
//!
//! # Responsibility
//! - Describe the minimum a managed runtime must offer the bridge: thread
//!   attachment, entry point lookup, byte arrays and a static call.
//! - Keep bridge logic independent of any particular runtime binding.
//!
//! # Invariants
//! - Every array returned by `ManagedEnv` is a local reference the caller must
//!   hand back through `release_array`.
//! - `call_entry_point` leaves no pending managed exception behind.

use crate::buffer::OwnedBuffer;
use crate::config::EntryPointSpec;
use crate::error::BridgeResult;

mod attach;
pub mod in_process;
#[cfg(feature = "jvm")]
pub mod jvm;

pub use attach::ThreadAttachment;

/// Process-wide handle to a managed runtime.
pub trait ManagedRuntime: Send + Sync {
    /// Resolved, process-lifetime reference to the message handler.
    type EntryPoint: Send + Sync;
    /// Per-thread execution context.
    type Env<'rt>: ManagedEnv<EntryPoint = Self::EntryPoint>
    where
        Self: 'rt;

    /// Returns a context when the current thread is already attached.
    fn current_thread_env(&self) -> Option<Self::Env<'_>>;

    /// Attaches the current thread.
    ///
    /// # Errors
    /// - `AttachmentFailed` when the runtime refuses the thread.
    fn attach_current_thread(&self) -> BridgeResult<Self::Env<'_>>;

    /// Detaches the current thread. Only called for threads this layer attached.
    fn detach_current_thread(&self);
}

/// Execution context valid for the duration of one call on one thread.
pub trait ManagedEnv {
    type EntryPoint;
    /// Local reference to a managed byte array.
    type Array;

    fn resolve_entry_point(&mut self, spec: &EntryPointSpec) -> BridgeResult<Self::EntryPoint>;

    fn new_byte_array(&mut self, bytes: &[u8]) -> BridgeResult<Self::Array>;

    /// Invokes the entry point with one byte array argument.
    ///
    /// Returns `Ok(None)` when the managed side returned null. A raised
    /// exception is cleared and reported as `ManagedSideException`.
    fn call_entry_point(
        &mut self,
        entry: &Self::EntryPoint,
        argument: &Self::Array,
    ) -> BridgeResult<Option<Self::Array>>;

    /// Copies a managed array into a natively-owned buffer.
    fn read_byte_array(&mut self, array: &Self::Array) -> BridgeResult<OwnedBuffer>;

    fn release_array(&mut self, array: Self::Array);
}
