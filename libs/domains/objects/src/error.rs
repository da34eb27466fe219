use std::fmt;

use serde::Serialize;
use strum::Display;
use thiserror::Error;
use uuid::Uuid;

use core_locks::LockError;

use crate::models::Verb;

/// Which backing store an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Connector,
    Vector,
}

/// One schema violation on a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(FieldViolation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("principal may not {verb} {resource}")]
    Unauthorized { verb: Verb, resource: String },

    /// Carries every violated field, not just the first.
    #[error("validation failed: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    #[error("vectorization failed: {0}")]
    Vectorization(String),

    #[error("object {class}/{id} not found")]
    NotFound { class: String, id: Uuid },

    #[error("object {class}/{id} already exists")]
    Conflict { class: String, id: Uuid },

    #[error("{store} store failure: {message}")]
    Repo { store: StoreKind, message: String },

    /// A partial write could not be compensated; both failures stay visible.
    #[error("stores left inconsistent: {original}; compensation: {compensation}")]
    Inconsistent {
        original: Box<ObjectError>,
        compensation: Box<ObjectError>,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ObjectResult<T> = Result<T, ObjectError>;

/// Structural error classification for transport adapters.
///
/// The core never maps to response codes itself; an adapter matches on the
/// kind (and the error's fields) to pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    Validation,
    Vectorization,
    NotFound,
    Conflict,
    Repo,
    Inconsistent,
    Cancelled,
    Internal,
}

impl ObjectError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ObjectError::Unauthorized { .. } => ErrorKind::Unauthorized,
            ObjectError::Validation(_) => ErrorKind::Validation,
            ObjectError::Vectorization(_) => ErrorKind::Vectorization,
            ObjectError::NotFound { .. } => ErrorKind::NotFound,
            ObjectError::Conflict { .. } => ErrorKind::Conflict,
            ObjectError::Repo { .. } => ErrorKind::Repo,
            ObjectError::Inconsistent { .. } => ErrorKind::Inconsistent,
            ObjectError::Cancelled => ErrorKind::Cancelled,
            ObjectError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn repo(store: StoreKind, message: impl Into<String>) -> Self {
        ObjectError::Repo {
            store,
            message: message.into(),
        }
    }
}

impl From<LockError> for ObjectError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Cancelled => ObjectError::Cancelled,
            LockError::Release(msg) => ObjectError::Internal(format!("lock release failed: {msg}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_lists_every_field() {
        let err = ObjectError::Validation(vec![
            FieldViolation::new("name", "required property is missing"),
            FieldViolation::new("count", "expected int value"),
        ]);
        let rendered = err.to_string();
        assert!(rendered.contains("name: required property is missing"));
        assert!(rendered.contains("count: expected int value"));
    }

    #[test]
    fn inconsistent_display_carries_both_failures() {
        let err = ObjectError::Inconsistent {
            original: Box::new(ObjectError::repo(StoreKind::Vector, "index write refused")),
            compensation: Box::new(ObjectError::repo(StoreKind::Connector, "delete timed out")),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("vector store failure: index write refused"));
        assert!(rendered.contains("connector store failure: delete timed out"));
    }

    #[test]
    fn lock_cancellation_maps_to_cancelled() {
        let err: ObjectError = LockError::Cancelled.into();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }
}
