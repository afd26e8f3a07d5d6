//! Runs alone in its own test binary: it observes the process-wide live
//! buffer counter on the inbound path.

mod support;

use native_binder_core::{
    live_buffer_count, BridgeError, CallbackSlot, InProcessRuntime, NativeCallback, OwnedBuffer,
    ReplyBuffer,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use support::echo_callback;

#[test]
fn inbound_call_releases_every_buffer_on_success_and_failure() {
    let runtime = InProcessRuntime::new();
    let callbacks = CallbackSlot::new();
    let baseline = live_buffer_count();

    callbacks.register(echo_callback());
    for len in 1..=256usize {
        let message = vec![(len % 251) as u8; len];
        let reply = runtime
            .invoke_native(&callbacks, &message)
            .expect("echo callback should reply");
        assert_eq!(reply, message);
        assert_eq!(live_buffer_count(), baseline, "len {len} leaked a buffer");
    }

    let err = runtime
        .invoke_native(&callbacks, b"")
        .expect_err("empty input is rejected");
    assert_eq!(err, BridgeError::EmptyInput);
    assert_eq!(live_buffer_count(), baseline);

    callbacks.register(NativeCallback::new(|_message: &[u8]| {
        OwnedBuffer::zeroed(0).ok().map(ReplyBuffer::from)
    }));
    let err = runtime
        .invoke_native(&callbacks, b"ping")
        .expect_err("zero-length reply is rejected");
    assert_eq!(err, BridgeError::EmptyCallbackResponse);
    assert_eq!(live_buffer_count(), baseline);

    callbacks.register(NativeCallback::new(
        |_message: &[u8]| -> Option<ReplyBuffer> { None },
    ));
    let err = runtime
        .invoke_native(&callbacks, b"ping")
        .expect_err("null reply is rejected");
    assert_eq!(err, BridgeError::CallbackFailed);
    assert_eq!(live_buffer_count(), baseline);

    // The native request copy is the only live buffer while the callback runs.
    let seen_during_call = Arc::new(AtomicUsize::new(usize::MAX));

    let seen = Arc::clone(&seen_during_call);
    callbacks.register(NativeCallback::new(move |message: &[u8]| {
        seen.store(live_buffer_count(), Ordering::SeqCst);
        OwnedBuffer::copy_from_slice(message)
            .ok()
            .map(ReplyBuffer::from)
    }));

    let reply = runtime
        .invoke_native(&callbacks, b"request")
        .expect("callback should reply");
    assert_eq!(reply, b"request");
    assert_eq!(seen_during_call.load(Ordering::SeqCst), baseline + 1);
    assert_eq!(live_buffer_count(), baseline);
    assert_eq!(runtime.live_local_refs(), 0);
}
