mod support;

use native_binder_core::{
    Bridge, BridgeError, CallbackSlot, EntryPointSpec, HandlerOutcome, InProcessRuntime,
    NativeCallback, OwnedBuffer, ReplyBuffer,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use support::{bridge_with_handler, echo_bridge, sample_messages};

#[test]
fn identity_handler_round_trips_every_message() {
    let bridge = echo_bridge();
    for message in sample_messages() {
        let response = bridge.call(&message).expect("identity call should succeed");
        assert_eq!(response.as_slice(), message.as_slice());
    }
}

#[test]
fn empty_response_is_a_valid_empty_buffer() {
    let bridge = echo_bridge();
    let response = bridge.call(&[]).expect("empty message is valid");
    assert!(response.is_empty());

    let (ptr, len) = response.into_raw();
    assert!(!ptr.is_null());
    assert_eq!(len, 0);
    drop(unsafe { OwnedBuffer::from_raw(ptr) });
}

#[test]
fn handler_sees_exact_request_bytes() {
    let bridge = bridge_with_handler(|message| {
        let mut reversed = message.to_vec();
        reversed.reverse();
        HandlerOutcome::Reply(reversed)
    });
    let response = bridge.call(b"abc").expect("call should succeed");
    assert_eq!(response.as_slice(), b"cba");
}

#[test]
fn managed_exception_yields_no_result_and_releases_references() {
    let bridge = bridge_with_handler(|_| HandlerOutcome::Throw("boom".to_string()));
    let err = bridge.call(b"x").expect_err("exception must fail the call");
    assert_eq!(err, BridgeError::ManagedSideException("boom".to_string()));
    assert_eq!(bridge.runtime().live_local_refs(), 0);
}

#[test]
fn null_managed_response_is_a_failure() {
    let bridge = bridge_with_handler(|_| HandlerOutcome::Null);
    let err = bridge.call(b"x").expect_err("null response must fail the call");
    assert_eq!(err, BridgeError::NullResponse);
    assert_eq!(bridge.runtime().live_local_refs(), 0);
}

#[test]
fn resolution_failure_is_retried_on_next_call() {
    let spec = EntryPointSpec::default();
    let bridge = Bridge::new(InProcessRuntime::new(), spec.clone());

    let err = bridge.call(b"early").expect_err("unregistered handler must fail");
    assert!(matches!(err, BridgeError::ResolutionFailed(_)));
    assert!(!bridge.is_resolved());
    assert_eq!(bridge.runtime().detach_count(), 1);

    bridge
        .runtime()
        .register_handler(&spec, |message| HandlerOutcome::Reply(message.to_vec()));
    let response = bridge.call(b"late").expect("retry should resolve");
    assert_eq!(response.as_slice(), b"late");
    assert!(bridge.is_resolved());
    assert_eq!(bridge.runtime().resolution_count(), 1);
}

#[test]
fn resolved_entry_point_is_cached() {
    let bridge = echo_bridge();
    for _ in 0..5 {
        bridge.call(b"steady").expect("call should succeed");
    }
    assert_eq!(bridge.runtime().resolution_count(), 1);
}

#[test]
fn attachment_failure_is_reported_without_leaking_state() {
    let bridge = echo_bridge();
    bridge.runtime().refuse_attach(true);

    let err = bridge.call(b"x").expect_err("attach refusal must fail");
    assert!(matches!(err, BridgeError::AttachmentFailed(_)));
    assert!(!bridge.runtime().is_current_thread_attached());
    assert_eq!(bridge.runtime().live_local_refs(), 0);
    assert!(!bridge.is_resolved());
}

#[test]
fn detached_thread_is_detached_again_after_each_call() {
    let bridge = echo_bridge();
    bridge.call(b"one").expect("first call");
    bridge.call(b"two").expect("second call");

    assert!(!bridge.runtime().is_current_thread_attached());
    assert_eq!(bridge.runtime().attach_count(), 2);
    assert_eq!(bridge.runtime().detach_count(), 2);
}

#[test]
fn failed_call_on_detached_thread_still_detaches() {
    let bridge = bridge_with_handler(|_| HandlerOutcome::Throw("nope".to_string()));
    bridge.call(b"x").expect_err("call should fail");
    assert!(!bridge.runtime().is_current_thread_attached());
    assert_eq!(bridge.runtime().attach_count(), 1);
    assert_eq!(bridge.runtime().detach_count(), 1);
}

#[test]
fn already_attached_thread_stays_attached() {
    let bridge = echo_bridge();
    bridge.runtime().adopt_current_thread();

    bridge.call(b"managed thread").expect("call should succeed");
    assert!(bridge.runtime().is_current_thread_attached());
    assert_eq!(bridge.runtime().attach_count(), 0);
    assert_eq!(bridge.runtime().detach_count(), 0);
}

#[test]
fn every_managed_reference_is_released() {
    let bridge = echo_bridge();
    for message in sample_messages() {
        bridge.call(&message).expect("call should succeed");
    }
    assert_eq!(bridge.runtime().live_local_refs(), 0);
}

#[test]
fn nested_outbound_call_from_inbound_callback_keeps_managed_thread_attached() {
    let bridge = Arc::new(echo_bridge());
    let callbacks = CallbackSlot::new();
    let nested_calls = Arc::new(AtomicUsize::new(0));

    let nested_bridge = Arc::clone(&bridge);
    let counter = Arc::clone(&nested_calls);
    callbacks.register(NativeCallback::new(move |message: &[u8]| {
        counter.fetch_add(1, Ordering::SeqCst);
        nested_bridge
            .call(message)
            .ok()
            .map(ReplyBuffer::from)
    }));

    bridge.runtime().adopt_current_thread();
    let reply = bridge
        .runtime()
        .invoke_native(&callbacks, b"re-entrant")
        .expect("inbound call should succeed");

    assert_eq!(reply, b"re-entrant");
    assert_eq!(nested_calls.load(Ordering::SeqCst), 1);
    assert!(bridge.runtime().is_current_thread_attached());
    assert_eq!(bridge.runtime().detach_count(), 0);
    assert_eq!(bridge.runtime().live_local_refs(), 0);
}

#[test]
fn prepare_resolves_before_first_call() {
    let bridge = echo_bridge();
    bridge.prepare().expect("prepare should resolve");
    assert!(bridge.is_resolved());
    assert!(!bridge.runtime().is_current_thread_attached());

    bridge.call(b"after prepare").expect("call should succeed");
    assert_eq!(bridge.runtime().resolution_count(), 1);
}

#[test]
fn prepare_failure_is_not_cached() {
    let spec = EntryPointSpec::default();
    let bridge = Bridge::new(InProcessRuntime::new(), spec.clone());
    let err = bridge.prepare().expect_err("nothing to resolve yet");
    assert!(matches!(err, BridgeError::ResolutionFailed(_)));

    bridge
        .runtime()
        .register_handler(&spec, |_| HandlerOutcome::Reply(b"ok".to_vec()));
    bridge.prepare().expect("second prepare should resolve");
    assert!(bridge.is_resolved());
}
