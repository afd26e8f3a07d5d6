//! CLI smoke entry point.
//!
//! # Responsibility
//! - Drive one outbound and one inbound call through an in-process runtime.
//! - Keep output deterministic for quick local sanity checks.

use native_binder_core::{
    core_version, Bridge, CallbackSlot, EntryPointSpec, HandlerOutcome, InProcessRuntime,
    NativeCallback, OwnedBuffer, ReplyBuffer,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("native_binder_core version={}", core_version());

    let spec = EntryPointSpec::from_env();
    let runtime = InProcessRuntime::new();
    runtime.register_handler(&spec, |message| HandlerOutcome::Reply(message.to_vec()));
    let bridge = Bridge::new(runtime, spec);

    let callbacks = CallbackSlot::new();
    callbacks.register(NativeCallback::new(|message: &[u8]| {
        OwnedBuffer::copy_from_slice(message)
            .ok()
            .map(ReplyBuffer::from)
    }));

    let outbound = match bridge.call(b"ping") {
        Ok(response) => String::from_utf8_lossy(response.as_slice()).into_owned(),
        Err(err) => {
            eprintln!("outbound failed error_code={} error={err}", err.code());
            return ExitCode::FAILURE;
        }
    };
    let inbound = match bridge.runtime().invoke_native(&callbacks, b"pong") {
        Ok(reply) => String::from_utf8_lossy(&reply).into_owned(),
        Err(err) => {
            eprintln!("inbound failed error_code={} error={err}", err.code());
            return ExitCode::FAILURE;
        }
    };

    println!("outbound echo={outbound}");
    println!("inbound echo={inbound}");
    println!(
        "attach_count={} detach_count={} live_local_refs={}",
        bridge.runtime().attach_count(),
        bridge.runtime().detach_count(),
        bridge.runtime().live_local_refs()
    );
    ExitCode::SUCCESS
}
