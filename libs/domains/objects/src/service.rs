use std::sync::Arc;

use metrics::counter;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};
use uuid::Uuid;
use validator::Validate;

use core_locks::{LockCoordinator, LockHandle};

use crate::auth::{Authorizer, class_resource, object_resource};
use crate::config::LifecycleConfig;
use crate::error::{FieldViolation, ObjectError, ObjectResult};
use crate::identity::{IdGenerator, RandomIds};
use crate::models::{
    ClassDefinition, CreateObject, Entity, Principal, Properties, Verb, request_validation_error,
};
use crate::repository::{ConnectorRepo, VectorRepo};
use crate::schema::SchemaManager;
use crate::validation::validate_properties;
use crate::vectorizer::Vectorizer;

/// Orchestrates authorization, locking, validation, vectorization and the
/// dual write across the connector and vector stores.
///
/// An entity is committed only when both stores hold it; a write that leaves
/// the stores disagreeing is compensated before the error returns, and a
/// failed compensation surfaces both errors instead of swallowing either.
pub struct ObjectService {
    authorizer: Arc<dyn Authorizer>,
    locks: Arc<dyn LockCoordinator>,
    schema: Arc<dyn SchemaManager>,
    vectorizer: Arc<dyn Vectorizer>,
    connector: Arc<dyn ConnectorRepo>,
    vectors: Arc<dyn VectorRepo>,
    ids: Arc<dyn IdGenerator>,
    config: LifecycleConfig,
}

impl ObjectService {
    pub fn new(
        authorizer: Arc<dyn Authorizer>,
        locks: Arc<dyn LockCoordinator>,
        schema: Arc<dyn SchemaManager>,
        vectorizer: Arc<dyn Vectorizer>,
        connector: Arc<dyn ConnectorRepo>,
        vectors: Arc<dyn VectorRepo>,
    ) -> Self {
        Self {
            authorizer,
            locks,
            schema,
            vectorizer,
            connector,
            vectors,
            ids: Arc::new(RandomIds),
            config: LifecycleConfig::default(),
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    pub(crate) fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub(crate) fn authorizer(&self) -> &dyn Authorizer {
        self.authorizer.as_ref()
    }

    pub(crate) fn locks(&self) -> &dyn LockCoordinator {
        self.locks.as_ref()
    }

    pub(crate) fn connector(&self) -> &dyn ConnectorRepo {
        self.connector.as_ref()
    }

    /// Create one entity.
    #[instrument(skip(self, cancel, principal, input), fields(class = %input.class))]
    pub async fn create(
        &self,
        cancel: &CancellationToken,
        principal: &Principal,
        input: CreateObject,
    ) -> ObjectResult<Entity> {
        self.authorizer
            .authorize(principal, Verb::Create, &class_resource(&input.class))?;
        input.validate().map_err(request_validation_error)?;

        let handle = self.locks.lock_connector(cancel).await?;
        let result = self.create_locked(cancel, input).await;
        merge_release(result, handle)
    }

    async fn create_locked(
        &self,
        cancel: &CancellationToken,
        input: CreateObject,
    ) -> ObjectResult<Entity> {
        let entity = self.prepare(cancel, input).await?;
        if cancel.is_cancelled() {
            return Err(ObjectError::Cancelled);
        }
        self.connector.put(&entity).await?;
        self.finish_vector_write(cancel, &entity, None).await?;
        counter!("objects_created_total").increment(1);
        Ok(entity)
    }

    /// Validate, resolve the identifier and vectorize; no store is touched.
    pub(crate) async fn prepare(
        &self,
        cancel: &CancellationToken,
        input: CreateObject,
    ) -> ObjectResult<Entity> {
        let class = self.resolve_class(&input.class).await?;
        let violations = validate_properties(&class, &input.properties);
        if !violations.is_empty() {
            return Err(ObjectError::Validation(violations));
        }

        let id = input.id.unwrap_or_else(|| self.ids.generate());
        let mut entity = Entity {
            class: input.class,
            id,
            properties: input.properties,
            vector: Vec::new(),
        };
        if cancel.is_cancelled() {
            return Err(ObjectError::Cancelled);
        }
        entity.vector = self.vectorize_checked(&entity, &class).await?;
        Ok(entity)
    }

    /// Read one entity. The connector store is the source of truth for
    /// existence; the vector is not required for a plain get.
    #[instrument(skip(self, principal))]
    pub async fn get(&self, principal: &Principal, class: &str, id: Uuid) -> ObjectResult<Entity> {
        self.authorizer
            .authorize(principal, Verb::Get, &object_resource(class, id))?;
        self.connector
            .get(class, id)
            .await?
            .ok_or_else(|| ObjectError::NotFound {
                class: class.to_string(),
                id,
            })
    }

    /// Replace an entity's properties, re-vectorizing since vectorized
    /// properties may have changed.
    #[instrument(skip(self, cancel, principal, properties))]
    pub async fn update(
        &self,
        cancel: &CancellationToken,
        principal: &Principal,
        class: &str,
        id: Uuid,
        properties: Properties,
    ) -> ObjectResult<Entity> {
        self.authorizer
            .authorize(principal, Verb::Update, &object_resource(class, id))?;

        let handle = self.locks.lock_connector(cancel).await?;
        let result = self.update_locked(cancel, class, id, properties).await;
        merge_release(result, handle)
    }

    async fn update_locked(
        &self,
        cancel: &CancellationToken,
        class: &str,
        id: Uuid,
        properties: Properties,
    ) -> ObjectResult<Entity> {
        let definition = self.resolve_class(class).await?;
        let previous =
            self.connector
                .get(class, id)
                .await?
                .ok_or_else(|| ObjectError::NotFound {
                    class: class.to_string(),
                    id,
                })?;

        let violations = validate_properties(&definition, &properties);
        if !violations.is_empty() {
            return Err(ObjectError::Validation(violations));
        }

        let mut entity = Entity {
            class: class.to_string(),
            id,
            properties,
            vector: Vec::new(),
        };
        entity.vector = self.vectorize_checked(&entity, &definition).await?;

        if cancel.is_cancelled() {
            return Err(ObjectError::Cancelled);
        }
        self.connector.replace(&entity).await?;
        self.finish_vector_write(cancel, &entity, Some(&previous))
            .await?;
        counter!("objects_updated_total").increment(1);
        Ok(entity)
    }

    /// Delete an entity from both stores.
    ///
    /// The vector entry goes first: a dangling vector entry with no connector
    /// record is harmless, whereas a connector record without a vector entry
    /// would resurface in listings unreachable by similarity search. Both
    /// deletes are attempted even if the first fails.
    #[instrument(skip(self, cancel, principal))]
    pub async fn delete(
        &self,
        cancel: &CancellationToken,
        principal: &Principal,
        class: &str,
        id: Uuid,
    ) -> ObjectResult<()> {
        self.authorizer
            .authorize(principal, Verb::Delete, &object_resource(class, id))?;

        let handle = self.locks.lock_connector(cancel).await?;
        let result = self.delete_locked(class, id).await;
        merge_release(result, handle)
    }

    async fn delete_locked(&self, class: &str, id: Uuid) -> ObjectResult<()> {
        if self.connector.get(class, id).await?.is_none() {
            return Err(ObjectError::NotFound {
                class: class.to_string(),
                id,
            });
        }

        let vector_result = self.vectors.delete(class, id).await;
        let connector_result = self.connector.delete(class, id).await;
        match (vector_result, connector_result) {
            (Ok(_), Ok(_)) => {
                counter!("objects_deleted_total").increment(1);
                Ok(())
            }
            (Err(vector_err), Ok(_)) => Err(vector_err),
            (Ok(_), Err(connector_err)) => Err(connector_err),
            (Err(vector_err), Err(connector_err)) => Err(ObjectError::Inconsistent {
                original: Box::new(vector_err),
                compensation: Box::new(connector_err),
            }),
        }
    }

    pub(crate) async fn resolve_class(&self, name: &str) -> ObjectResult<ClassDefinition> {
        self.schema
            .get_class(name)
            .await?
            .ok_or_else(|| {
                ObjectError::Validation(vec![FieldViolation::new(
                    "class",
                    format!("unknown class '{name}'"),
                )])
            })
    }

    pub(crate) async fn vectorize_checked(
        &self,
        entity: &Entity,
        class: &ClassDefinition,
    ) -> ObjectResult<Vec<f32>> {
        let vector = self
            .vectorizer
            .vectorize(entity)
            .await
            .map_err(|err| match err {
                err @ ObjectError::Vectorization(_) => err,
                other => ObjectError::Vectorization(other.to_string()),
            })?;

        let expected = self.vectorizer.dimension(class);
        if vector.len() != expected {
            return Err(ObjectError::Vectorization(format!(
                "vectorizer produced {} dimensions, class '{}' expects {}",
                vector.len(),
                class.name,
                expected
            )));
        }
        Ok(vector)
    }

    /// Complete the second half of a dual write.
    ///
    /// The connector record already exists at this point. A cancellation
    /// observed now no longer aborts the issued connector write, but it does
    /// prevent the vector write and takes the same compensation path as a
    /// failure: without `restore` the connector record is deleted, with
    /// `restore` the pre-update record is put back. A failed compensation
    /// returns both errors.
    pub(crate) async fn finish_vector_write(
        &self,
        cancel: &CancellationToken,
        entity: &Entity,
        restore: Option<&Entity>,
    ) -> ObjectResult<()> {
        let vector_result = if cancel.is_cancelled() {
            Err(ObjectError::Cancelled)
        } else {
            self.vectors
                .put(&entity.class, entity.id, &entity.vector)
                .await
        };

        let Err(original) = vector_result else {
            return Ok(());
        };

        counter!("object_compensations_total").increment(1);
        warn!(
            class = %entity.class,
            id = %entity.id,
            error = %original,
            "vector write failed after connector write, compensating"
        );

        let compensation = match restore {
            None => self
                .connector
                .delete(&entity.class, entity.id)
                .await
                .map(|_| ()),
            Some(previous) => self.connector.replace(previous).await,
        };

        Err(match compensation {
            Ok(()) => original,
            Err(compensation_err) => ObjectError::Inconsistent {
                original: Box::new(original),
                compensation: Box::new(compensation_err),
            },
        })
    }
}

/// Fold the lock release outcome into the operation result. A release
/// failure is a resource-leak risk to report, never a process-fatal
/// condition; when both the operation and the release fail, the operation
/// error wins and the release failure is logged.
pub(crate) fn merge_release<T>(result: ObjectResult<T>, handle: LockHandle) -> ObjectResult<T> {
    let scope = handle.scope();
    match (result, handle.release()) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(release_err)) => Err(ObjectError::Internal(format!(
            "{scope} lock release failed: {release_err}"
        ))),
        (Err(op_err), Ok(())) => Err(op_err),
        (Err(op_err), Err(release_err)) => {
            warn!(scope, %release_err, "lock release failed while propagating operation error");
            Err(op_err)
        }
    }
}

impl std::fmt::Debug for ObjectService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
