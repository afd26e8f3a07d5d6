//! Call-scoped thread attachment.

use super::ManagedRuntime;
use crate::error::BridgeResult;
use log::{debug, warn};

/// Execution context for the current thread, detached on drop only when this
/// guard performed the attach.
pub struct ThreadAttachment<'rt, R: ManagedRuntime + 'rt> {
    runtime: &'rt R,
    env: R::Env<'rt>,
    attached_here: bool,
}

impl<'rt, R: ManagedRuntime + 'rt> ThreadAttachment<'rt, R> {
    /// Reuses the current thread's context or attaches the thread.
    ///
    /// # Errors
    /// - `AttachmentFailed` when the thread is detached and cannot attach.
    pub fn acquire(runtime: &'rt R) -> BridgeResult<Self> {
        if let Some(env) = runtime.current_thread_env() {
            return Ok(Self {
                runtime,
                env,
                attached_here: false,
            });
        }

        match runtime.attach_current_thread() {
            Ok(env) => {
                debug!("event=thread_attach module=runtime status=ok");
                Ok(Self {
                    runtime,
                    env,
                    attached_here: true,
                })
            }
            Err(err) => {
                warn!(
                    "event=thread_attach module=runtime status=error error_code={} error={}",
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    pub fn attached_here(&self) -> bool {
        self.attached_here
    }

    pub fn env_mut(&mut self) -> &mut R::Env<'rt> {
        &mut self.env
    }
}

impl<'rt, R: ManagedRuntime + 'rt> Drop for ThreadAttachment<'rt, R> {
    fn drop(&mut self) {
        if self.attached_here {
            self.runtime.detach_current_thread();
            debug!("event=thread_detach module=runtime status=ok");
        }
    }
}
