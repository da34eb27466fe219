use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{LockError, LockResult};
use crate::handle::LockHandle;

pub const SCHEMA_SCOPE: &str = "schema";
pub const CONNECTOR_SCOPE: &str = "connector";

/// Grants the two mutual-exclusion scopes serializing schema and data
/// mutation. Acquisition blocks until the scope is free or the token fires;
/// cancellation never leaves a scope held.
#[async_trait]
pub trait LockCoordinator: Send + Sync {
    /// Serialize a data mutation against schema changes and other data
    /// mutations.
    async fn lock_connector(&self, cancel: &CancellationToken) -> LockResult<LockHandle>;

    /// Serialize a schema mutation against everything, data writes included.
    async fn lock_schema(&self, cancel: &CancellationToken) -> LockResult<LockHandle>;
}

/// In-process coordinator over two async mutexes.
///
/// The schema path acquires the connector scope first and the schema scope
/// second, so schema holders exclude data writes and the fixed order rules
/// out deadlock between the two paths. Re-entrant acquisition by the same
/// logical flow is not supported; a held handle must be released before the
/// flow acquires the scope again.
#[derive(Debug, Default)]
pub struct ScopedLocks {
    schema: Arc<Mutex<()>>,
    connector: Arc<Mutex<()>>,
}

impl ScopedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn acquire(
        scope: &Arc<Mutex<()>>,
        cancel: &CancellationToken,
    ) -> LockResult<tokio::sync::OwnedMutexGuard<()>> {
        if cancel.is_cancelled() {
            return Err(LockError::Cancelled);
        }
        tokio::select! {
            guard = scope.clone().lock_owned() => Ok(guard),
            _ = cancel.cancelled() => Err(LockError::Cancelled),
        }
    }
}

#[async_trait]
impl LockCoordinator for ScopedLocks {
    async fn lock_connector(&self, cancel: &CancellationToken) -> LockResult<LockHandle> {
        let guard = Self::acquire(&self.connector, cancel).await?;
        Ok(LockHandle::new(CONNECTOR_SCOPE, move || {
            drop(guard);
            Ok(())
        }))
    }

    async fn lock_schema(&self, cancel: &CancellationToken) -> LockResult<LockHandle> {
        let connector = Self::acquire(&self.connector, cancel).await?;
        let schema = match Self::acquire(&self.schema, cancel).await {
            Ok(guard) => guard,
            Err(err) => {
                // Nothing stays held on a cancelled acquisition.
                drop(connector);
                return Err(err);
            }
        };
        Ok(LockHandle::new(SCHEMA_SCOPE, move || {
            drop(schema);
            drop(connector);
            Ok(())
        }))
    }
}
