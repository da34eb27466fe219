use async_trait::async_trait;

use crate::error::ObjectResult;
use crate::models::{ClassDefinition, Entity};

/// Maps an entity's semantic content to a fixed-length float vector.
///
/// The concrete embedding algorithm is a collaborator; the lifecycle manager
/// only checks that the produced length matches the class configuration.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Vectorizer: Send + Sync {
    /// Vector length entities of this class must carry.
    fn dimension(&self, class: &ClassDefinition) -> usize {
        class.vector_dimension as usize
    }

    async fn vectorize(&self, entity: &Entity) -> ObjectResult<Vec<f32>>;
}
