//! JVM binding of the managed runtime contracts (Android).
//!
//! # Invariants
//! - Threads attached here are attached permanently and detached explicitly by
//!   `ThreadAttachment`, so ownership of the detach stays with the bridge.
//! - No JNI call returns with a pending Java exception.

use super::{ManagedEnv, ManagedRuntime};
use crate::buffer::{ensure_message_len, OwnedBuffer};
use crate::config::EntryPointSpec;
use crate::error::{BridgeError, BridgeResult};
use jni::errors::Error as JniError;
use jni::objects::{GlobalRef, JByteArray, JClass, JObject, JStaticMethodID};
use jni::signature::ReturnType;
use jni::sys::jvalue;
use jni::{JNIEnv, JavaVM};

/// Process handle to the JVM obtained in `JNI_OnLoad`.
pub struct JvmRuntime {
    vm: JavaVM,
}

impl JvmRuntime {
    pub fn new(vm: JavaVM) -> Self {
        Self { vm }
    }

    pub fn vm(&self) -> &JavaVM {
        &self.vm
    }
}

impl ManagedRuntime for JvmRuntime {
    type EntryPoint = JvmEntryPoint;
    type Env<'rt> = JvmEnv<'rt>;

    fn current_thread_env(&self) -> Option<JvmEnv<'_>> {
        self.vm.get_env().ok().map(JvmEnv::new)
    }

    fn attach_current_thread(&self) -> BridgeResult<JvmEnv<'_>> {
        self.vm
            .attach_current_thread_permanently()
            .map(JvmEnv::new)
            .map_err(|err| BridgeError::AttachmentFailed(err.to_string()))
    }

    fn detach_current_thread(&self) {
        // SAFETY: called from the thread's outermost bridge frame once every
        // local reference created on it has been released.
        unsafe { self.vm.detach_current_thread() };
    }
}

/// Global class reference plus static method id of the managed handler.
pub struct JvmEntryPoint {
    class: GlobalRef,
    method: JStaticMethodID,
}

/// JNI environment for one thread.
pub struct JvmEnv<'local> {
    env: JNIEnv<'local>,
}

impl<'local> JvmEnv<'local> {
    pub fn new(env: JNIEnv<'local>) -> Self {
        Self { env }
    }

    fn clear_pending_exception(&mut self) -> bool {
        if self.env.exception_check().unwrap_or(false) {
            let _ = self.env.exception_clear();
            return true;
        }
        false
    }
}

impl<'local> ManagedEnv for JvmEnv<'local> {
    type EntryPoint = JvmEntryPoint;
    type Array = JByteArray<'local>;

    fn resolve_entry_point(&mut self, spec: &EntryPointSpec) -> BridgeResult<JvmEntryPoint> {
        let class = match self.env.find_class(spec.class_name.as_str()) {
            Ok(class) => class,
            Err(err) => {
                self.clear_pending_exception();
                return Err(BridgeError::ResolutionFailed(format!(
                    "class {} not found: {err}",
                    spec.class_name
                )));
            }
        };

        let method = match self.env.get_static_method_id(
            &class,
            spec.method_name.as_str(),
            spec.signature.as_str(),
        ) {
            Ok(method) => method,
            Err(err) => {
                self.clear_pending_exception();
                let _ = self.env.delete_local_ref(class);
                return Err(BridgeError::ResolutionFailed(format!(
                    "method {spec} not found: {err}"
                )));
            }
        };

        let global = self.env.new_global_ref(&class);
        let _ = self.env.delete_local_ref(class);
        let class = global.map_err(|err| {
            self.clear_pending_exception();
            BridgeError::ResolutionFailed(format!("global ref for {spec} failed: {err}"))
        })?;
        Ok(JvmEntryPoint { class, method })
    }

    fn new_byte_array(&mut self, bytes: &[u8]) -> BridgeResult<JByteArray<'local>> {
        ensure_message_len(bytes.len())?;
        self.env.byte_array_from_slice(bytes).map_err(|_| {
            self.clear_pending_exception();
            BridgeError::AllocationFailed {
                requested: bytes.len(),
            }
        })
    }

    fn call_entry_point(
        &mut self,
        entry: &JvmEntryPoint,
        argument: &JByteArray<'local>,
    ) -> BridgeResult<Option<JByteArray<'local>>> {
        let class: &JClass = entry.class.as_obj().into();
        let args = [jvalue {
            l: argument.as_raw(),
        }];
        // SAFETY: the method id was resolved against `class` with signature
        // `([B)[B` and the single argument is a byte array.
        let result = unsafe {
            self.env
                .call_static_method_unchecked(class, entry.method, ReturnType::Object, &args)
        };

        let value = match result {
            Ok(value) => value,
            Err(JniError::JavaException) => {
                self.clear_pending_exception();
                return Err(BridgeError::ManagedSideException(
                    "java exception thrown by handler".to_string(),
                ));
            }
            Err(err) => {
                self.clear_pending_exception();
                return Err(BridgeError::ManagedSideException(err.to_string()));
            }
        };

        let object = match value.l() {
            Ok(object) => object,
            Err(err) => return Err(BridgeError::ManagedSideException(err.to_string())),
        };
        if self.clear_pending_exception() {
            let _ = self.env.delete_local_ref(object);
            return Err(BridgeError::ManagedSideException(
                "java exception pending after handler returned".to_string(),
            ));
        }
        if object.is_null() {
            return Ok(None);
        }
        Ok(Some(JByteArray::from(object)))
    }

    fn read_byte_array(&mut self, array: &JByteArray<'local>) -> BridgeResult<OwnedBuffer> {
        let len = self
            .env
            .get_array_length(array)
            .map_err(|err| BridgeError::ManagedSideException(err.to_string()))?;
        let len = usize::try_from(len).map_err(|_| {
            BridgeError::ManagedSideException(format!("negative array length {len}"))
        })?;
        let mut buffer = OwnedBuffer::zeroed(len)?;
        if len > 0 {
            let target = buffer.as_mut_slice();
            // SAFETY: i8 and u8 share size and alignment.
            let target = unsafe {
                std::slice::from_raw_parts_mut(target.as_mut_ptr().cast::<i8>(), target.len())
            };
            self.env
                .get_byte_array_region(array, 0, target)
                .map_err(|err| {
                    self.clear_pending_exception();
                    BridgeError::ManagedSideException(err.to_string())
                })?;
        }
        Ok(buffer)
    }

    fn release_array(&mut self, array: JByteArray<'local>) {
        let _ = self.env.delete_local_ref(JObject::from(array));
    }
}
