//! C ABI for the embedded runtime.
//!
//! # Responsibility
//! - Expose the outbound call, its matching release, and callback registration
//!   as plain C symbols.
//! - Collapse every failure into a null pointer with zero length.
//!
//! # Invariants
//! - No exported function unwinds across the boundary.
//! - A non-null pointer returned by `native_binder_call` must be passed to
//!   `native_binder_free` exactly once.

use log::{error, warn};
use native_binder_core::{
    global, ExternCallFn, ExternCallback, NativeCallback, OwnedBuffer, ReleaseFn,
};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

/// Sends `len` bytes at `msg` to the managed handler.
///
/// Returns the response buffer and writes its length to `out_len`, or returns
/// null with `*out_len == 0` on any failure. A successful empty response is a
/// non-null pointer with `*out_len == 0`.
///
/// # Safety
/// `msg` must be valid for reads of `len` bytes and `out_len` valid for one
/// `u32` write.
#[no_mangle]
pub unsafe extern "C" fn native_binder_call(
    msg: *const u8,
    len: u32,
    out_len: *mut u32,
) -> *mut u8 {
    if out_len.is_null() {
        return ptr::null_mut();
    }
    *out_len = 0;
    if msg.is_null() {
        warn!("event=native_binder_call module=abi status=error error_code=null_message");
        return ptr::null_mut();
    }

    let message = std::slice::from_raw_parts(msg, len as usize);
    match panic::catch_unwind(|| global::outbound_call(message)) {
        Ok(Ok(response)) => {
            let (data, written) = response.into_raw();
            *out_len = written as u32;
            data
        }
        Ok(Err(_)) => ptr::null_mut(),
        Err(_) => {
            error!("event=native_binder_call module=abi status=error error_code=panic");
            ptr::null_mut()
        }
    }
}

/// Releases a buffer returned by `native_binder_call`. Null is ignored.
///
/// # Safety
/// `ptr` must be null or an unreleased pointer from `native_binder_call`.
#[no_mangle]
pub unsafe extern "C" fn native_binder_free(ptr: *mut u8) {
    drop(OwnedBuffer::from_raw(ptr));
}

/// Registers the embedded runtime's callback; replies are released with `free`.
///
/// A null callback is ignored.
#[no_mangle]
pub extern "C" fn dart_binder_register(callback: Option<ExternCallFn>) {
    match callback {
        Some(call) => register(NativeCallback::from_extern(call)),
        None => warn!("event=dart_binder_register module=abi status=ignored reason=null_callback"),
    }
}

/// Registers the embedded runtime's callback with an explicit reply release
/// function. A null callback or release function is ignored.
#[no_mangle]
pub extern "C" fn dart_binder_register_with_release(
    callback: Option<ExternCallFn>,
    release: Option<ReleaseFn>,
) {
    match (callback, release) {
        (Some(call), Some(release)) => {
            register(NativeCallback::new(ExternCallback::new(call, release)))
        }
        _ => warn!(
            "event=dart_binder_register module=abi status=ignored reason=null_function_pointer"
        ),
    }
}

fn register(callback: NativeCallback) {
    let registered =
        panic::catch_unwind(AssertUnwindSafe(|| global::register_native_callback(callback)));
    if registered.is_err() {
        error!("event=dart_binder_register module=abi status=error error_code=panic");
    }
}
