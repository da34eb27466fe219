use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ObjectResult;
use crate::models::Entity;

/// CRUD the lifecycle manager needs from the connector (graph/relational)
/// store. The connector store is the source of truth for existence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectorRepo: Send + Sync {
    /// Insert a new entity. A duplicate id surfaces as a conflict error.
    async fn put(&self, entity: &Entity) -> ObjectResult<()>;

    /// Batch insert with per-item independence: one slot per input entity, in
    /// input order.
    async fn put_batch(&self, entities: &[Entity]) -> Vec<ObjectResult<()>>;

    /// Replace an existing entity's record; never reports a conflict. Used by
    /// update and by restore compensation.
    async fn replace(&self, entity: &Entity) -> ObjectResult<()>;

    async fn get(&self, class: &str, id: Uuid) -> ObjectResult<Option<Entity>>;

    /// Returns whether a record existed.
    async fn delete(&self, class: &str, id: Uuid) -> ObjectResult<bool>;
}

/// CRUD the lifecycle manager needs from the vector index, keyed by
/// class + identifier.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorRepo: Send + Sync {
    async fn put(&self, class: &str, id: Uuid, vector: &[f32]) -> ObjectResult<()>;

    /// Returns whether an index entry existed.
    async fn delete(&self, class: &str, id: Uuid) -> ObjectResult<bool>;
}
