//! Stateful in-memory stand-ins for the physical stores, substituted through
//! the same capability traits the real engines implement.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use core_locks::ScopedLocks;
use domain_objects::{
    AllowAll, ClassDefinition, ConnectorRepo, Entity, ObjectError, ObjectResult, ObjectService,
    PropertyDefinition, PropertyKind, SchemaManager, StoreKind, VectorRepo, Vectorizer,
};

pub const DIM: usize = 4;

pub fn article_class() -> ClassDefinition {
    ClassDefinition::new("Article", DIM as u32)
        .with_property(PropertyDefinition::new("title", PropertyKind::Text).required())
        .with_property(PropertyDefinition::new("words", PropertyKind::Int))
}

type Key = (String, Uuid);

/// Connector store fake. Insert-only `put` reports conflicts like the real
/// engine; `replace` overwrites. Panics if two writes ever overlap, which
/// the connector lock must prevent.
#[derive(Default)]
pub struct MemoryConnector {
    entities: Mutex<HashMap<Key, Entity>>,
    active_writers: AtomicUsize,
    pub write_delay: Mutex<Option<Duration>>,
}

impl MemoryConnector {
    pub fn len(&self) -> usize {
        self.entities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn set_write_delay(&self, delay: Duration) {
        *self
            .write_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(delay);
    }

    async fn enter_write(&self) {
        let writers = self.active_writers.fetch_add(1, Ordering::SeqCst) + 1;
        assert_eq!(
            writers, 1,
            "connector writes overlapped; the connector lock must serialize them"
        );
        let delay = *self
            .write_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn exit_write(&self) {
        self.active_writers.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectorRepo for MemoryConnector {
    async fn put(&self, entity: &Entity) -> ObjectResult<()> {
        self.enter_write().await;
        let result = {
            let mut entities = self
                .entities
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let key = (entity.class.clone(), entity.id);
            if entities.contains_key(&key) {
                Err(ObjectError::Conflict {
                    class: entity.class.clone(),
                    id: entity.id,
                })
            } else {
                entities.insert(key, entity.clone());
                Ok(())
            }
        };
        self.exit_write();
        result
    }

    async fn put_batch(&self, entities: &[Entity]) -> Vec<ObjectResult<()>> {
        let mut results = Vec::with_capacity(entities.len());
        for entity in entities {
            results.push(self.put(entity).await);
        }
        results
    }

    async fn replace(&self, entity: &Entity) -> ObjectResult<()> {
        self.enter_write().await;
        self.entities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((entity.class.clone(), entity.id), entity.clone());
        self.exit_write();
        Ok(())
    }

    async fn get(&self, class: &str, id: Uuid) -> ObjectResult<Option<Entity>> {
        Ok(self
            .entities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(class.to_string(), id))
            .cloned())
    }

    async fn delete(&self, class: &str, id: Uuid) -> ObjectResult<bool> {
        Ok(self
            .entities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(class.to_string(), id))
            .is_some())
    }
}

/// Vector index fake with one-shot write-failure injection.
#[derive(Default)]
pub struct MemoryVectors {
    vectors: Mutex<HashMap<Key, Vec<f32>>>,
    fail_next_put: AtomicBool,
}

impl MemoryVectors {
    pub fn fail_next_put(&self) {
        self.fail_next_put.store(true, Ordering::SeqCst);
    }

    pub fn contains(&self, class: &str, id: Uuid) -> bool {
        self.vectors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(class.to_string(), id))
    }
}

#[async_trait]
impl VectorRepo for MemoryVectors {
    async fn put(&self, class: &str, id: Uuid, vector: &[f32]) -> ObjectResult<()> {
        if self.fail_next_put.swap(false, Ordering::SeqCst) {
            return Err(ObjectError::repo(StoreKind::Vector, "injected index failure"));
        }
        self.vectors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((class.to_string(), id), vector.to_vec());
        Ok(())
    }

    async fn delete(&self, class: &str, id: Uuid) -> ObjectResult<bool> {
        Ok(self
            .vectors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(class.to_string(), id))
            .is_some())
    }
}

/// Schema manager fake serving a fixed class set.
pub struct StaticSchema {
    classes: HashMap<String, ClassDefinition>,
}

impl StaticSchema {
    pub fn with(classes: Vec<ClassDefinition>) -> Self {
        Self {
            classes: classes.into_iter().map(|c| (c.name.clone(), c)).collect(),
        }
    }
}

#[async_trait]
impl SchemaManager for StaticSchema {
    async fn get_class(&self, name: &str) -> ObjectResult<Option<ClassDefinition>> {
        Ok(self.classes.get(name).cloned())
    }
}

/// Deterministic embedding: the vector varies with the property payload so
/// re-vectorization after an update is observable.
pub struct CountingVectorizer;

#[async_trait]
impl Vectorizer for CountingVectorizer {
    async fn vectorize(&self, entity: &Entity) -> ObjectResult<Vec<f32>> {
        let seed = entity.properties.len() as f32 + 1.0;
        Ok(vec![seed * 0.25; DIM])
    }
}

pub struct TestWorld {
    pub connector: Arc<MemoryConnector>,
    pub vectors: Arc<MemoryVectors>,
    pub service: Arc<ObjectService>,
}

pub fn world() -> TestWorld {
    let connector = Arc::new(MemoryConnector::default());
    let vectors = Arc::new(MemoryVectors::default());
    let service = ObjectService::new(
        Arc::new(AllowAll),
        Arc::new(ScopedLocks::new()),
        Arc::new(StaticSchema::with(vec![article_class()])),
        Arc::new(CountingVectorizer),
        Arc::clone(&connector) as Arc<dyn ConnectorRepo>,
        Arc::clone(&vectors) as Arc<dyn VectorRepo>,
    );
    TestWorld {
        connector,
        vectors,
        service: Arc::new(service),
    }
}
