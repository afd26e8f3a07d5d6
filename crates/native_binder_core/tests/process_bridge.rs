//! Runs alone in its own test binary: it installs the process-wide bridge.

mod support;

use native_binder_core::global;
use native_binder_core::BridgeError;
use support::{echo_bridge, echo_callback};

#[test]
fn process_bridge_lifecycle() {
    assert!(!global::is_installed());
    assert!(!global::is_ready());
    let err = global::outbound_call(b"early").expect_err("nothing installed yet");
    assert_eq!(err, BridgeError::NotInitialized);

    global::install_bridge(echo_bridge()).expect("first install succeeds");
    assert!(global::is_installed());
    assert!(!global::is_ready());
    let err = global::install_bridge(echo_bridge()).expect_err("second install is rejected");
    assert_eq!(err, BridgeError::AlreadyInitialized);

    let response = global::outbound_call(b"hello").expect("installed bridge answers");
    assert_eq!(response.as_slice(), b"hello");
    assert!(global::is_ready());

    let empty = global::outbound_call(&[]).expect("empty message is valid");
    assert!(empty.is_empty());

    assert!(!global::has_native_callback());
    global::register_native_callback(echo_callback());
    assert!(global::has_native_callback());
    let active = global::native_callbacks()
        .current()
        .expect("callback is registered");
    let reply = active.invoke(b"direct").expect("echo replies");
    assert_eq!(reply.as_slice(), b"direct");
}
