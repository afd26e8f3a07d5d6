//! Foreign-facing surface of the native binder.
//!
//! - `abi`: C symbols called by the Dart side through `dart:ffi`.
//! - `api`: sync helpers exposed to Dart through flutter_rust_bridge.
//! - `jni_glue`: `JNI_OnLoad` and the inbound native method (feature `jvm`).

pub mod abi;
pub mod api;
#[cfg(feature = "jvm")]
pub mod jni_glue;
