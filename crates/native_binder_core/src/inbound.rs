//! Inbound call path: managed code invoking the registered native callback.
//!
//! # Responsibility
//! - Copy the managed request into a natively-owned buffer.
//! - Run the active callback and copy its reply into a managed array.
//!
//! # Invariants
//! - The native copy of the request is released as soon as the callback
//!   returns.
//! - The callback reply is released right after it has been copied, on success
//!   and failure alike.

use crate::buffer::ensure_message_len;
use crate::callback::CallbackSlot;
use crate::error::{BridgeError, BridgeResult};
use crate::runtime::ManagedEnv;
use log::{debug, warn};
use std::time::Instant;

/// Forwards a managed request to the callback registered in `callbacks`.
///
/// # Errors
/// - `NoCallbackRegistered` when the slot is empty.
/// - `EmptyInput` for a zero-length request.
/// - `AllocationFailed` when the native copy or the managed result cannot be
///   allocated.
/// - `CallbackFailed` when the callback returns null.
/// - `EmptyCallbackResponse` when the callback returns a zero-length buffer.
pub fn inbound_call<E: ManagedEnv>(
    callbacks: &CallbackSlot,
    env: &mut E,
    message: &E::Array,
) -> BridgeResult<E::Array> {
    let started_at = Instant::now();
    let result = dispatch(callbacks, env, message);
    match &result {
        Ok(_) => debug!(
            "event=inbound_call module=inbound status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=inbound_call module=inbound status=error duration_ms={} error_code={} error={}",
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
    }
    result
}

fn dispatch<E: ManagedEnv>(
    callbacks: &CallbackSlot,
    env: &mut E,
    message: &E::Array,
) -> BridgeResult<E::Array> {
    let callback = callbacks
        .current()
        .ok_or(BridgeError::NoCallbackRegistered)?;

    let request = env.read_byte_array(message)?;
    if request.is_empty() {
        return Err(BridgeError::EmptyInput);
    }

    let reply = callback.invoke(request.as_slice());
    drop(request);

    let reply = reply.ok_or(BridgeError::CallbackFailed)?;
    if reply.is_empty() {
        return Err(BridgeError::EmptyCallbackResponse);
    }
    ensure_message_len(reply.len())?;

    let result = env.new_byte_array(reply.as_slice());
    drop(reply);
    result
}
