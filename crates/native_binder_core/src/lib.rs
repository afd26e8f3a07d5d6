//! Synchronous byte-message bridge between a managed runtime and native code.
//!
//! Outbound calls carry an opaque message from native code to the managed
//! handler; inbound calls carry one from managed code to the registered native
//! callback. Payloads are never interpreted here.

pub mod bridge;
pub mod buffer;
pub mod callback;
pub mod config;
pub mod error;
pub mod global;
pub mod inbound;
pub mod logging;
pub mod registry;
pub mod runtime;

pub use bridge::Bridge;
pub use buffer::{
    ensure_message_len, live_buffer_count, OwnedBuffer, ReleaseFn, ReplyBuffer, MAX_MESSAGE_LEN,
};
pub use callback::{CallbackHandler, CallbackSlot, ExternCallFn, ExternCallback, NativeCallback};
pub use config::EntryPointSpec;
pub use error::{BridgeError, BridgeResult};
pub use inbound::inbound_call;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use registry::CallRegistry;
pub use runtime::in_process::{HandlerOutcome, InProcessRuntime};
pub use runtime::{ManagedEnv, ManagedRuntime, ThreadAttachment};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
