use futures::StreamExt;
use metrics::counter;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use validator::Validate;

use crate::auth::OBJECTS_RESOURCE;
use crate::error::{ObjectError, ObjectResult};
use crate::models::{BatchItemResult, CreateObject, Entity, Principal, Verb, request_validation_error};
use crate::service::{ObjectService, merge_release};

impl ObjectService {
    /// Create many entities under one authorization check and one
    /// connector-lock acquisition.
    ///
    /// The batch has no atomicity: each item succeeds or fails independently
    /// and callers must inspect every result slot. Holding the lock for the
    /// batch's duration bounds lock churn, at the price of serializing the
    /// whole batch against concurrent single-item writes.
    #[instrument(skip_all, fields(items = items.len()))]
    pub async fn create_batch(
        &self,
        cancel: &CancellationToken,
        principal: &Principal,
        items: Vec<CreateObject>,
    ) -> ObjectResult<Vec<BatchItemResult>> {
        self.authorizer()
            .authorize(principal, Verb::Create, OBJECTS_RESOURCE)?;

        let handle = self.locks().lock_connector(cancel).await?;
        let result = self.create_batch_locked(cancel, items).await;
        merge_release(result, handle)
    }

    async fn create_batch_locked(
        &self,
        cancel: &CancellationToken,
        items: Vec<CreateObject>,
    ) -> ObjectResult<Vec<BatchItemResult>> {
        // Validation and vectorization first; items that fail here keep their
        // error slot and never reach a store. Vectorization has no shared
        // mutable state, so independent items run concurrently under a
        // bounded pool while input order is preserved.
        let concurrency = self.config().batch_vectorize_concurrency;
        let prepared: Vec<ObjectResult<Entity>> = futures::stream::iter(items)
            .map(|item| self.prepare_item(cancel, item))
            .buffered(concurrency)
            .collect()
            .await;

        // Connector writes go through the repo's batch variant, one result
        // slot per entity.
        let ready: Vec<(usize, Entity)> = prepared
            .iter()
            .enumerate()
            .filter_map(|(index, item)| item.as_ref().ok().map(|e| (index, e.clone())))
            .collect();
        let entities: Vec<Entity> = ready.iter().map(|(_, e)| e.clone()).collect();
        let connector_results = if cancel.is_cancelled() {
            ready.iter().map(|_| Err(ObjectError::Cancelled)).collect()
        } else {
            self.connector().put_batch(&entities).await
        };

        let mut slots: Vec<Option<ObjectResult<Entity>>> = prepared
            .into_iter()
            .map(|item| match item {
                Ok(_) => None,
                Err(err) => Some(Err(err)),
            })
            .collect();

        for ((index, entity), connector_result) in ready.into_iter().zip(connector_results) {
            let outcome = match connector_result {
                Err(err) => Err(err),
                // The vector write still runs per item so the compensation
                // rule applies to exactly the record that failed.
                Ok(()) => self
                    .finish_vector_write(cancel, &entity, None)
                    .await
                    .map(|()| entity),
            };
            slots[index] = Some(outcome);
        }

        let results: Vec<BatchItemResult> = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| BatchItemResult {
                index,
                result: slot.unwrap_or(Err(ObjectError::Cancelled)),
            })
            .collect();

        let committed = results.iter().filter(|r| r.is_ok()).count() as u64;
        counter!("objects_created_total").increment(committed);
        counter!("batch_items_total").increment(results.len() as u64);
        Ok(results)
    }

    async fn prepare_item(
        &self,
        cancel: &CancellationToken,
        item: CreateObject,
    ) -> ObjectResult<Entity> {
        item.validate().map_err(request_validation_error)?;
        self.prepare(cancel, item).await
    }
}
