use async_trait::async_trait;

use crate::error::ObjectResult;
use crate::models::ClassDefinition;

/// Read access to the source of truth for class definitions.
///
/// The core only queries definitions at operation time; schema mutation lives
/// with the schema manager and serializes against data writes through the
/// lock coordinator's schema scope.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SchemaManager: Send + Sync {
    async fn get_class(&self, name: &str) -> ObjectResult<Option<ClassDefinition>>;
}
