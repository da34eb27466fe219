use std::fmt;

use tracing::warn;

use crate::error::LockResult;

type ReleaseFn = Box<dyn FnOnce() -> LockResult<()> + Send>;

/// One-shot release token for an acquired scope.
///
/// Ownership transfers to whichever operation acquired the scope. The holder
/// calls [`LockHandle::release`] on its exit path and folds any error into its
/// own result. Dropping an unreleased handle still frees the scope, but the
/// release outcome can then only be logged, not returned.
pub struct LockHandle {
    scope: &'static str,
    release: Option<ReleaseFn>,
}

impl LockHandle {
    pub fn new(scope: &'static str, release: impl FnOnce() -> LockResult<()> + Send + 'static) -> Self {
        Self {
            scope,
            release: Some(Box::new(release)),
        }
    }

    /// A handle whose release always succeeds. Useful for test doubles.
    pub fn noop(scope: &'static str) -> Self {
        Self::new(scope, || Ok(()))
    }

    /// Name of the scope this handle guards.
    pub fn scope(&self) -> &'static str {
        self.scope
    }

    /// Release the scope, consuming the handle.
    pub fn release(mut self) -> LockResult<()> {
        match self.release.take() {
            Some(release) => release(),
            None => Ok(()),
        }
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            if let Err(err) = release() {
                warn!(scope = self.scope, %err, "lock handle dropped and release failed");
            } else {
                warn!(scope = self.scope, "lock handle dropped without explicit release");
            }
        }
    }
}

impl fmt::Debug for LockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockHandle")
            .field("scope", &self.scope)
            .field("released", &self.release.is_none())
            .finish()
    }
}
