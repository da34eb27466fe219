use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ObjectError, ObjectResult};

/// Property payload of an entity, keyed by property name.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// The caller on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub subject: String,
    pub groups: Vec<String>,
}

impl Principal {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }
}

/// Verbs the authorizer decides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Create,
    Get,
    Update,
    Delete,
}

/// One stored object.
///
/// An entity is committed only once it exists under the same class and id in
/// both the connector store and the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub class: String,
    pub id: Uuid,
    pub properties: Properties,
    pub vector: Vec<f32>,
}

/// Value kinds a class property can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Text,
    Int,
    Number,
    Bool,
    /// RFC 3339 timestamp carried as a string.
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    pub kind: PropertyKind,
    pub required: bool,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A class definition as served by the schema manager.
///
/// The core holds no mutable copy; it reads a definition at operation time
/// under the connector lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDefinition {
    pub name: String,
    pub properties: Vec<PropertyDefinition>,
    /// Vector length every entity of this class carries, fixed by the
    /// vectorizer configuration.
    pub vector_dimension: u32,
}

impl ClassDefinition {
    pub fn new(name: impl Into<String>, vector_dimension: u32) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            vector_dimension,
        }
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Request to create one entity.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct CreateObject {
    #[validate(length(min = 1, message = "class name must not be empty"))]
    pub class: String,
    #[serde(default)]
    pub properties: Properties,
    /// Caller-supplied identifier; generated when absent. A duplicate makes
    /// the connector store report a conflict, which propagates unchanged.
    pub id: Option<Uuid>,
}

impl CreateObject {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            properties: Properties::new(),
            id: None,
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }
}

/// Outcome slot for one batch element; items succeed or fail independently.
#[derive(Debug)]
pub struct BatchItemResult {
    pub index: usize,
    pub result: ObjectResult<Entity>,
}

impl BatchItemResult {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub(crate) fn request_validation_error(errors: validator::ValidationErrors) -> ObjectError {
    ObjectError::Validation(vec![crate::error::FieldViolation::new(
        "request",
        errors.to_string(),
    )])
}
