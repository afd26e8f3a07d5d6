//! Dart-facing sync helpers exported through flutter_rust_bridge.
//!
//! # Responsibility
//! - Let the Dart side bootstrap logging and probe bridge state.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - Message traffic does not go through here; it uses the C ABI in `abi`.

use native_binder_core::{
    core_version as core_version_inner, default_log_level as default_log_level_inner, global,
    init_logging as init_logging_inner,
};

/// Initializes Rust logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may create the log directory.
/// - Idempotent for the same `level + log_dir`.
/// - Returns empty string on success and the error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Log level suggested for the current build mode.
#[flutter_rust_bridge::frb(sync)]
pub fn default_log_level() -> String {
    default_log_level_inner().to_owned()
}

#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Whether the managed runtime is loaded and its handler resolved.
#[flutter_rust_bridge::frb(sync)]
pub fn bridge_ready() -> bool {
    global::is_ready()
}

/// Whether a native callback is registered for managed-to-native calls.
#[flutter_rust_bridge::frb(sync)]
pub fn native_callback_registered() -> bool {
    global::has_native_callback()
}
