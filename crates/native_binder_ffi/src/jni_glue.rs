//! JNI entry points: library load and the managed-to-native call.
//!
//! # Invariants
//! - The `JavaVM` handle is captured once in `JNI_OnLoad` and never released.
//! - `callDartNative` returns `null` on every failure and never unwinds into
//!   the JVM.

use jni::objects::{JByteArray, JClass};
use jni::sys::{jbyteArray, jint, JNI_ERR, JNI_VERSION_1_6};
use jni::{JNIEnv, JavaVM};
use log::{error, info, warn};
use native_binder_core::runtime::jvm::{JvmEnv, JvmRuntime};
use native_binder_core::{global, Bridge, EntryPointSpec};
use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};

/// Captures the VM and installs the process bridge.
///
/// Resolves the entry point on the loading thread. A failure is retried on
/// the first call.
///
/// # Safety
/// Called by the JVM with a valid `JavaVM` pointer.
#[no_mangle]
pub unsafe extern "system" fn JNI_OnLoad(
    vm: *mut jni::sys::JavaVM,
    _reserved: *mut c_void,
) -> jint {
    let vm = match JavaVM::from_raw(vm) {
        Ok(vm) => vm,
        Err(err) => {
            error!("event=jni_on_load module=jni status=error error={}", err);
            return JNI_ERR;
        }
    };

    let bridge = Bridge::new(JvmRuntime::new(vm), EntryPointSpec::from_env());
    if let Err(err) = bridge.prepare() {
        warn!(
            "event=jni_on_load module=jni status=deferred error_code={} error={}",
            err.code(),
            err
        );
    }

    match global::install_bridge(bridge) {
        Ok(()) => info!("event=jni_on_load module=jni status=ok"),
        Err(err) => warn!(
            "event=jni_on_load module=jni status=ignored error_code={}",
            err.code()
        ),
    }
    JNI_VERSION_1_6
}

/// `NativeBinder.callDartNative(byte[]): byte[]`.
#[no_mangle]
pub extern "system" fn Java_com_native_1binder_NativeBinder_callDartNative<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
    message: JByteArray<'local>,
) -> jbyteArray {
    let outcome = panic::catch_unwind(AssertUnwindSafe(move || {
        let mut env = JvmEnv::new(env);
        global::inbound_call(&mut env, &message)
    }));

    match outcome {
        Ok(Ok(result)) => result.into_raw(),
        Ok(Err(_)) => std::ptr::null_mut(),
        Err(_) => {
            error!("event=call_dart_native module=jni status=error error_code=panic");
            std::ptr::null_mut()
        }
    }
}
