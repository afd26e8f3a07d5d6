//! Bridge error taxonomy.
//!
//! # Responsibility
//! - Name every way a cross-runtime call can fail.
//! - Provide stable `error_code` strings for log lines.
//!
//! # Invariants
//! - None of these errors is fatal; boundary functions collapse all of them
//!   into the same null/empty signal.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Failure reasons for outbound and inbound bridge calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// No managed runtime handle has been installed yet.
    NotInitialized,
    /// A process bridge is already installed.
    AlreadyInitialized,
    /// The calling thread could not join the managed runtime.
    AttachmentFailed(String),
    /// The managed entry point could not be found.
    ResolutionFailed(String),
    /// The invoked managed logic raised an exception.
    ManagedSideException(String),
    /// The managed entry point returned null instead of a byte array.
    NullResponse,
    /// A native or managed buffer of `requested` bytes could not be allocated.
    AllocationFailed {
        requested: usize,
    },
    /// Payload is longer than a managed array can hold (`i32::MAX` bytes).
    MessageTooLarge(usize),
    /// The inbound path ran before any native callback was registered.
    NoCallbackRegistered,
    /// The inbound message had zero length.
    EmptyInput,
    /// The native callback returned a null buffer.
    CallbackFailed,
    /// The native callback returned a zero-length buffer.
    EmptyCallbackResponse,
}

impl BridgeError {
    /// Stable snake_case code used as `error_code=` in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::AlreadyInitialized => "already_initialized",
            Self::AttachmentFailed(_) => "attachment_failed",
            Self::ResolutionFailed(_) => "resolution_failed",
            Self::ManagedSideException(_) => "managed_side_exception",
            Self::NullResponse => "null_response",
            Self::AllocationFailed { .. } => "allocation_failed",
            Self::MessageTooLarge(_) => "message_too_large",
            Self::NoCallbackRegistered => "no_callback_registered",
            Self::EmptyInput => "empty_input",
            Self::CallbackFailed => "callback_failed",
            Self::EmptyCallbackResponse => "empty_callback_response",
        }
    }
}

impl Display for BridgeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "managed runtime handle is not initialized"),
            Self::AlreadyInitialized => write!(f, "process bridge is already installed"),
            Self::AttachmentFailed(reason) => {
                write!(f, "failed to attach thread to managed runtime: {reason}")
            }
            Self::ResolutionFailed(reason) => {
                write!(f, "failed to resolve managed entry point: {reason}")
            }
            Self::ManagedSideException(reason) => {
                write!(f, "managed entry point raised an exception: {reason}")
            }
            Self::NullResponse => write!(f, "managed entry point returned null"),
            Self::AllocationFailed { requested } => {
                write!(f, "failed to allocate {requested} byte buffer")
            }
            Self::MessageTooLarge(len) => {
                write!(f, "message of {len} bytes exceeds boundary length limit")
            }
            Self::NoCallbackRegistered => write!(f, "no native callback registered"),
            Self::EmptyInput => write!(f, "inbound message is empty"),
            Self::CallbackFailed => write!(f, "native callback returned null"),
            Self::EmptyCallbackResponse => write!(f, "native callback returned an empty buffer"),
        }
    }
}

impl Error for BridgeError {}

#[cfg(test)]
mod tests {
    use super::BridgeError;

    #[test]
    fn codes_are_stable() {
        assert_eq!(BridgeError::NotInitialized.code(), "not_initialized");
        assert_eq!(
            BridgeError::AttachmentFailed("x".to_string()).code(),
            "attachment_failed"
        );
        assert_eq!(
            BridgeError::AllocationFailed { requested: 4 }.code(),
            "allocation_failed"
        );
        assert_eq!(
            BridgeError::EmptyCallbackResponse.code(),
            "empty_callback_response"
        );
    }

    #[test]
    fn display_includes_reason() {
        let err = BridgeError::ResolutionFailed("class not found".to_string());
        assert!(err.to_string().contains("class not found"));
    }
}
