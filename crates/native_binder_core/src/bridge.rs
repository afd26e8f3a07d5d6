//! Outbound call path: native code invoking the managed message handler.
//!
//! # Responsibility
//! - Attach the calling thread for the duration of one call.
//! - Marshal the request into the managed runtime and the response back into a
//!   natively-owned buffer.
//!
//! # Invariants
//! - Every managed local reference created by a call is released before the
//!   call returns, on every path.
//! - A successful empty response is an empty `OwnedBuffer`, never an error.

use crate::buffer::{ensure_message_len, OwnedBuffer};
use crate::config::EntryPointSpec;
use crate::error::{BridgeError, BridgeResult};
use crate::registry::CallRegistry;
use crate::runtime::{ManagedEnv, ManagedRuntime, ThreadAttachment};
use log::{debug, warn};
use std::time::Instant;

/// Bridge from native callers into one managed runtime.
pub struct Bridge<R: ManagedRuntime> {
    runtime: R,
    registry: CallRegistry<R::EntryPoint>,
}

impl<R: ManagedRuntime> Bridge<R> {
    pub fn new(runtime: R, spec: EntryPointSpec) -> Self {
        Self {
            runtime,
            registry: CallRegistry::new(spec),
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn is_resolved(&self) -> bool {
        self.registry.is_resolved()
    }

    /// Resolves the entry point ahead of the first call.
    ///
    /// Must run on a thread that sees application classes for class lookup to
    /// succeed. A failure here is retried by `call`.
    ///
    /// # Errors
    /// - `AttachmentFailed`, `ResolutionFailed`.
    pub fn prepare(&self) -> BridgeResult<()> {
        let mut attachment = ThreadAttachment::acquire(&self.runtime)?;
        self.registry.resolve(attachment.env_mut())?;
        Ok(())
    }

    /// Sends `message` to the managed handler and returns its response.
    ///
    /// # Errors
    /// - `AttachmentFailed`, `ResolutionFailed`, `ManagedSideException`,
    ///   `NullResponse`, `AllocationFailed`, `MessageTooLarge`.
    pub fn call(&self, message: &[u8]) -> BridgeResult<OwnedBuffer> {
        let started_at = Instant::now();
        let result = self.call_inner(message);
        match &result {
            Ok(response) => debug!(
                "event=outbound_call module=bridge status=ok bytes_in={} bytes_out={} duration_ms={}",
                message.len(),
                response.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=outbound_call module=bridge status=error bytes_in={} duration_ms={} error_code={} error={}",
                message.len(),
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }
        result
    }

    fn call_inner(&self, message: &[u8]) -> BridgeResult<OwnedBuffer> {
        ensure_message_len(message.len())?;

        let mut attachment = ThreadAttachment::acquire(&self.runtime)?;
        let env = attachment.env_mut();
        let entry = self.registry.resolve(env)?;

        let argument = env.new_byte_array(message)?;
        let outcome = env.call_entry_point(entry, &argument);
        env.release_array(argument);

        let Some(response) = outcome? else {
            return Err(BridgeError::NullResponse);
        };
        let copied = env.read_byte_array(&response);
        env.release_array(response);

        let buffer = copied?;
        ensure_message_len(buffer.len())?;
        Ok(buffer)
    }
}
