//! Managed entry point configuration.

use std::fmt::{Display, Formatter};

/// Default managed class hosting the message handler (JNI slash form).
pub const DEFAULT_BRIDGE_CLASS: &str = "com/native_binder/NativeBinder";
/// Default static handler method name.
pub const DEFAULT_HANDLER_METHOD: &str = "handleCall";
/// Handler signature: takes `byte[]`, returns `byte[]`.
pub const HANDLER_SIGNATURE: &str = "([B)[B";

const CLASS_ENV_KEY: &str = "NATIVE_BINDER_CLASS";
const METHOD_ENV_KEY: &str = "NATIVE_BINDER_METHOD";

/// Location of the managed function that accepts and returns an opaque message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPointSpec {
    pub class_name: String,
    pub method_name: String,
    pub signature: String,
}

impl EntryPointSpec {
    pub fn new(class_name: &str, method_name: &str) -> Self {
        Self {
            class_name: normalize_class_name(class_name),
            method_name: method_name.trim().to_string(),
            signature: HANDLER_SIGNATURE.to_string(),
        }
    }

    /// Builds a spec from `NATIVE_BINDER_CLASS` / `NATIVE_BINDER_METHOD`.
    ///
    /// Unset or blank variables fall back to the defaults.
    pub fn from_env() -> Self {
        let class_name = env_or(CLASS_ENV_KEY, DEFAULT_BRIDGE_CLASS);
        let method_name = env_or(METHOD_ENV_KEY, DEFAULT_HANDLER_METHOD);
        Self::new(&class_name, &method_name)
    }
}

impl Default for EntryPointSpec {
    fn default() -> Self {
        Self::new(DEFAULT_BRIDGE_CLASS, DEFAULT_HANDLER_METHOD)
    }
}

impl Display for EntryPointSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}{}", self.class_name, self.method_name, self.signature)
    }
}

fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
        _ => default.to_string(),
    }
}

fn normalize_class_name(value: &str) -> String {
    value.trim().replace('.', "/")
}

#[cfg(test)]
mod tests {
    use super::{EntryPointSpec, DEFAULT_BRIDGE_CLASS, DEFAULT_HANDLER_METHOD, HANDLER_SIGNATURE};

    #[test]
    fn default_points_at_native_binder_handle_call() {
        let spec = EntryPointSpec::default();
        assert_eq!(spec.class_name, DEFAULT_BRIDGE_CLASS);
        assert_eq!(spec.method_name, DEFAULT_HANDLER_METHOD);
        assert_eq!(spec.signature, HANDLER_SIGNATURE);
    }

    #[test]
    fn normalizes_dotted_class_names() {
        let spec = EntryPointSpec::new(" com.example.Bridge ", " onMessage ");
        assert_eq!(spec.class_name, "com/example/Bridge");
        assert_eq!(spec.method_name, "onMessage");
    }

    #[test]
    fn display_renders_jni_style_descriptor() {
        let spec = EntryPointSpec::default();
        assert_eq!(
            spec.to_string(),
            "com/native_binder/NativeBinder.handleCall([B)[B"
        );
    }
}
