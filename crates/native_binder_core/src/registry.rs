//! Process-lifetime cache of the resolved managed entry point.
//!
//! # Invariants
//! - At most one successful resolution is stored; it is never replaced.
//! - A failed resolution stores nothing and the next call retries.
//! - Concurrent first callers block on the one resolution in flight instead of
//!   resolving again.

use crate::config::EntryPointSpec;
use crate::error::BridgeResult;
use crate::runtime::ManagedEnv;
use log::{info, warn};
use once_cell::sync::OnceCell;

/// Resolved entry point cache for one managed runtime.
pub struct CallRegistry<P> {
    spec: EntryPointSpec,
    entry: OnceCell<P>,
}

impl<P> CallRegistry<P> {
    pub fn new(spec: EntryPointSpec) -> Self {
        Self {
            spec,
            entry: OnceCell::new(),
        }
    }

    pub fn spec(&self) -> &EntryPointSpec {
        &self.spec
    }

    pub fn is_resolved(&self) -> bool {
        self.entry.get().is_some()
    }

    /// Returns the cached entry point, resolving it through `env` on first use.
    ///
    /// # Errors
    /// - `ResolutionFailed` when the managed side has no matching method.
    pub fn resolve<E>(&self, env: &mut E) -> BridgeResult<&P>
    where
        E: ManagedEnv<EntryPoint = P>,
    {
        if let Some(entry) = self.entry.get() {
            return Ok(entry);
        }

        self.entry.get_or_try_init(|| match env.resolve_entry_point(&self.spec) {
            Ok(entry) => {
                info!(
                    "event=entry_point_resolve module=registry status=ok entry_point={}",
                    self.spec
                );
                Ok(entry)
            }
            Err(err) => {
                warn!(
                    "event=entry_point_resolve module=registry status=error entry_point={} error_code={} error={}",
                    self.spec,
                    err.code(),
                    err
                );
                Err(err)
            }
        })
    }
}
