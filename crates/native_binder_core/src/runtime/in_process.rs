//! Managed runtime hosted inside the current process.
//!
//! # Responsibility
//! - Run managed handlers written as Rust closures behind the same contracts
//!   the JVM binding implements.
//! - Record attachment, resolution and local reference bookkeeping so hosts
//!   can verify the bridge releases what it acquires.
//!
//! # Invariants
//! - A thread counts as attached only between attach and detach (or between
//!   `adopt_current_thread` and `release_current_thread`).
//! - `live_local_refs` returns to its previous value once every array handed
//!   out has been released.

use super::{ManagedEnv, ManagedRuntime, ThreadAttachment};
use crate::buffer::OwnedBuffer;
use crate::callback::CallbackSlot;
use crate::config::EntryPointSpec;
use crate::error::{BridgeError, BridgeResult};
use crate::inbound::inbound_call;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, ThreadId};

/// Result of one managed handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    Reply(Vec<u8>),
    /// Handler returned null.
    Null,
    /// Handler raised an exception with the given message.
    Throw(String),
}

type ManagedHandler = Arc<dyn Fn(&[u8]) -> HandlerOutcome + Send + Sync>;

/// In-process managed runtime.
#[derive(Default)]
pub struct InProcessRuntime {
    handlers: RwLock<HashMap<String, ManagedHandler>>,
    attached: Mutex<HashSet<ThreadId>>,
    refuse_attach: AtomicBool,
    attach_count: AtomicUsize,
    detach_count: AtomicUsize,
    resolution_count: AtomicUsize,
    live_refs: AtomicUsize,
}

impl InProcessRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the managed handler for `spec`.
    pub fn register_handler(
        &self,
        spec: &EntryPointSpec,
        handler: impl Fn(&[u8]) -> HandlerOutcome + Send + Sync + 'static,
    ) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(spec.to_string(), Arc::new(handler));
    }

    /// Makes subsequent attach attempts fail.
    pub fn refuse_attach(&self, refuse: bool) {
        self.refuse_attach.store(refuse, Ordering::SeqCst);
    }

    /// Marks the current thread as owned by the managed runtime.
    ///
    /// Adopted threads are not counted by `attach_count`.
    pub fn adopt_current_thread(&self) {
        self.attached_threads().insert(thread::current().id());
    }

    pub fn release_current_thread(&self) {
        self.attached_threads().remove(&thread::current().id());
    }

    pub fn is_current_thread_attached(&self) -> bool {
        self.attached_threads().contains(&thread::current().id())
    }

    pub fn attach_count(&self) -> usize {
        self.attach_count.load(Ordering::SeqCst)
    }

    pub fn detach_count(&self) -> usize {
        self.detach_count.load(Ordering::SeqCst)
    }

    /// Number of successful entry point resolutions.
    pub fn resolution_count(&self) -> usize {
        self.resolution_count.load(Ordering::SeqCst)
    }

    /// Number of managed arrays handed out and not yet released.
    pub fn live_local_refs(&self) -> usize {
        self.live_refs.load(Ordering::SeqCst)
    }

    /// Calls into native code the way managed code would through its foreign
    /// call mechanism, returning the bytes of the managed result array.
    ///
    /// # Errors
    /// - Every failure `inbound_call` reports.
    pub fn invoke_native(&self, callbacks: &CallbackSlot, message: &[u8]) -> BridgeResult<Vec<u8>> {
        let mut attachment = ThreadAttachment::acquire(self)?;
        let env = attachment.env_mut();
        let argument = env.new_byte_array(message)?;
        let outcome = inbound_call(callbacks, env, &argument);
        env.release_array(argument);

        let result = outcome?;
        let bytes = env.read_byte_array(&result);
        env.release_array(result);
        Ok(bytes?.to_vec())
    }

    fn attached_threads(&self) -> std::sync::MutexGuard<'_, HashSet<ThreadId>> {
        self.attached.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn new_array(&self, bytes: Vec<u8>) -> InProcessArray {
        self.live_refs.fetch_add(1, Ordering::SeqCst);
        InProcessArray { bytes }
    }
}

impl ManagedRuntime for InProcessRuntime {
    type EntryPoint = InProcessEntryPoint;
    type Env<'rt> = InProcessEnv<'rt>;

    fn current_thread_env(&self) -> Option<InProcessEnv<'_>> {
        if self.is_current_thread_attached() {
            Some(InProcessEnv { runtime: self })
        } else {
            None
        }
    }

    fn attach_current_thread(&self) -> BridgeResult<InProcessEnv<'_>> {
        if self.refuse_attach.load(Ordering::SeqCst) {
            return Err(BridgeError::AttachmentFailed(
                "runtime refused thread attach".to_string(),
            ));
        }
        self.attached_threads().insert(thread::current().id());
        self.attach_count.fetch_add(1, Ordering::SeqCst);
        Ok(InProcessEnv { runtime: self })
    }

    fn detach_current_thread(&self) {
        self.attached_threads().remove(&thread::current().id());
        self.detach_count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Resolved in-process handler.
#[derive(Clone)]
pub struct InProcessEntryPoint {
    name: String,
    handler: ManagedHandler,
}

impl InProcessEntryPoint {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Local reference to an in-process byte array.
#[derive(Debug)]
pub struct InProcessArray {
    bytes: Vec<u8>,
}

impl InProcessArray {
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

/// Thread context for [`InProcessRuntime`].
pub struct InProcessEnv<'rt> {
    runtime: &'rt InProcessRuntime,
}

impl ManagedEnv for InProcessEnv<'_> {
    type EntryPoint = InProcessEntryPoint;
    type Array = InProcessArray;

    fn resolve_entry_point(&mut self, spec: &EntryPointSpec) -> BridgeResult<InProcessEntryPoint> {
        let name = spec.to_string();
        let handler = self
            .runtime
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name)
            .cloned()
            .ok_or_else(|| BridgeError::ResolutionFailed(format!("{name} is not registered")))?;
        self.runtime.resolution_count.fetch_add(1, Ordering::SeqCst);
        Ok(InProcessEntryPoint { name, handler })
    }

    fn new_byte_array(&mut self, bytes: &[u8]) -> BridgeResult<InProcessArray> {
        Ok(self.runtime.new_array(bytes.to_vec()))
    }

    fn call_entry_point(
        &mut self,
        entry: &InProcessEntryPoint,
        argument: &InProcessArray,
    ) -> BridgeResult<Option<InProcessArray>> {
        match (entry.handler)(&argument.bytes) {
            HandlerOutcome::Reply(bytes) => Ok(Some(self.runtime.new_array(bytes))),
            HandlerOutcome::Null => Ok(None),
            HandlerOutcome::Throw(message) => Err(BridgeError::ManagedSideException(message)),
        }
    }

    fn read_byte_array(&mut self, array: &InProcessArray) -> BridgeResult<OwnedBuffer> {
        OwnedBuffer::copy_from_slice(&array.bytes)
    }

    fn release_array(&mut self, array: InProcessArray) {
        drop(array);
        self.runtime.live_refs.fetch_sub(1, Ordering::SeqCst);
    }
}
