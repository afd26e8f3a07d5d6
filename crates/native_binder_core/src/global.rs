//! Process-wide bridge state shared by the C and JNI boundaries.
//!
//! # Responsibility
//! - Hold the one installed outbound transport for the process.
//! - Hold the one active native callback for the inbound path.
//!
//! # Invariants
//! - A transport is installed at most once and never torn down.
//! - Callback registration is last-write-wins and cannot be undone.

use crate::buffer::OwnedBuffer;
use crate::bridge::Bridge;
use crate::callback::{CallbackSlot, NativeCallback};
use crate::error::{BridgeError, BridgeResult};
use crate::inbound;
use crate::runtime::{ManagedEnv, ManagedRuntime};
use log::{info, warn};
use once_cell::sync::OnceCell;

static TRANSPORT: OnceCell<Box<dyn Transport>> = OnceCell::new();
static CALLBACKS: CallbackSlot = CallbackSlot::new();

/// Runtime-independent view of an outbound bridge.
pub trait Transport: Send + Sync {
    fn call(&self, message: &[u8]) -> BridgeResult<OwnedBuffer>;

    /// Whether the managed entry point has been resolved.
    fn is_ready(&self) -> bool;
}

impl<R> Transport for Bridge<R>
where
    R: ManagedRuntime,
{
    fn call(&self, message: &[u8]) -> BridgeResult<OwnedBuffer> {
        Bridge::call(self, message)
    }

    fn is_ready(&self) -> bool {
        self.is_resolved()
    }
}

/// Installs the process bridge.
///
/// # Errors
/// - `AlreadyInitialized` when a transport is already installed.
pub fn install_bridge<R>(bridge: Bridge<R>) -> BridgeResult<()>
where
    R: ManagedRuntime + 'static,
{
    install_transport(Box::new(bridge))
}

/// Installs a type-erased transport.
///
/// # Errors
/// - `AlreadyInitialized` when a transport is already installed.
pub fn install_transport(transport: Box<dyn Transport>) -> BridgeResult<()> {
    match TRANSPORT.set(transport) {
        Ok(()) => {
            info!("event=bridge_install module=global status=ok");
            Ok(())
        }
        Err(_) => {
            warn!(
                "event=bridge_install module=global status=error error_code={}",
                BridgeError::AlreadyInitialized.code()
            );
            Err(BridgeError::AlreadyInitialized)
        }
    }
}

/// Sends `message` through the installed transport.
///
/// # Errors
/// - `NotInitialized` before a transport is installed.
/// - Any error of the installed transport.
pub fn outbound_call(message: &[u8]) -> BridgeResult<OwnedBuffer> {
    let Some(transport) = TRANSPORT.get() else {
        warn!(
            "event=outbound_call module=global status=error error_code={}",
            BridgeError::NotInitialized.code()
        );
        return Err(BridgeError::NotInitialized);
    };
    transport.call(message)
}

/// Replaces the active native callback.
pub fn register_native_callback(callback: NativeCallback) {
    CALLBACKS.register(callback);
}

/// Runs the inbound path against the process callback slot.
///
/// # Errors
/// - See [`inbound::inbound_call`].
pub fn inbound_call<E: ManagedEnv>(env: &mut E, message: &E::Array) -> BridgeResult<E::Array> {
    inbound::inbound_call(&CALLBACKS, env, message)
}

pub fn native_callbacks() -> &'static CallbackSlot {
    &CALLBACKS
}

pub fn is_installed() -> bool {
    TRANSPORT.get().is_some()
}

/// Whether a transport is installed and its entry point resolved.
pub fn is_ready() -> bool {
    TRANSPORT
        .get()
        .map(|transport| transport.is_ready())
        .unwrap_or(false)
}

pub fn has_native_callback() -> bool {
    CALLBACKS.is_registered()
}
