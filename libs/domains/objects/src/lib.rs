//! Object lifecycle domain.
//!
//! Governs how a typed object moves from a create/update/delete request into
//! a consistent state across two independent backing stores: a connector
//! (graph/relational) store holding identity and properties, and a vector
//! index holding the embedding.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐
//! │   ObjectService   │  ← authorize, lock, validate, vectorize, dual write
//! └─────────┬─────────┘
//!           │
//!   ┌───────┴────────┬──────────────┬─────────────┐
//! ┌─▼────────────┐ ┌─▼──────────┐ ┌─▼─────────┐ ┌─▼────────────┐
//! │ ConnectorRepo│ │ VectorRepo │ │ Vectorizer│ │ SchemaManager│
//! │   (trait)    │ │  (trait)   │ │  (trait)  │ │   (trait)    │
//! └──────────────┘ └────────────┘ └───────────┘ └──────────────┘
//! ```
//!
//! The connector store is the source of truth for existence. A write that
//! leaves only one store updated is compensated before the error returns;
//! when compensation itself fails, both errors surface together so operators
//! can reconcile instead of discovering the divergence later.
//!
//! Batch creation holds the connector lock once for the whole batch and
//! treats every item independently: callers inspect each result slot rather
//! than assuming all-or-nothing.

pub mod auth;
pub mod batch;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod repository;
pub mod schema;
pub mod service;
pub mod validation;
pub mod vectorizer;

pub use auth::{AllowAll, Authorizer, OBJECTS_RESOURCE, class_resource, object_resource};
pub use config::LifecycleConfig;
pub use error::{ErrorKind, FieldViolation, ObjectError, ObjectResult, StoreKind};
pub use identity::{IdGenerator, RandomIds};
pub use models::{
    BatchItemResult, ClassDefinition, CreateObject, Entity, Principal, Properties,
    PropertyDefinition, PropertyKind, Verb,
};
pub use repository::{ConnectorRepo, VectorRepo};
pub use schema::SchemaManager;
pub use service::ObjectService;
pub use validation::validate_properties;
pub use vectorizer::Vectorizer;
