#![allow(dead_code)]

use native_binder_core::{
    Bridge, EntryPointSpec, HandlerOutcome, InProcessRuntime, NativeCallback, OwnedBuffer,
    ReplyBuffer,
};

/// Bridge over an in-process runtime whose default handler echoes its input.
pub fn echo_bridge() -> Bridge<InProcessRuntime> {
    bridge_with_handler(|message| HandlerOutcome::Reply(message.to_vec()))
}

pub fn bridge_with_handler(
    handler: impl Fn(&[u8]) -> HandlerOutcome + Send + Sync + 'static,
) -> Bridge<InProcessRuntime> {
    let spec = EntryPointSpec::default();
    let runtime = InProcessRuntime::new();
    runtime.register_handler(&spec, handler);
    Bridge::new(runtime, spec)
}

pub fn echo_callback() -> NativeCallback {
    NativeCallback::new(|message: &[u8]| {
        OwnedBuffer::copy_from_slice(message)
            .ok()
            .map(ReplyBuffer::from)
    })
}

pub fn sample_messages() -> Vec<Vec<u8>> {
    vec![
        Vec::new(),
        vec![0],
        b"hello".to_vec(),
        (0..=255).collect(),
        vec![0xAB; 64 * 1024],
    ]
}
