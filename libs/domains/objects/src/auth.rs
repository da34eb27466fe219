use uuid::Uuid;

use crate::error::ObjectResult;
use crate::models::{Principal, Verb};

/// Resource covering all object classes, used by batch operations.
pub const OBJECTS_RESOURCE: &str = "objects";

pub fn class_resource(class: &str) -> String {
    format!("objects/{class}")
}

pub fn object_resource(class: &str, id: Uuid) -> String {
    format!("objects/{class}/{id}")
}

/// Decides whether a principal may perform a verb on a resource.
///
/// A non-`Ok` return blocks the operation before any side effect.
#[cfg_attr(test, mockall::automock)]
pub trait Authorizer: Send + Sync {
    fn authorize(&self, principal: &Principal, verb: Verb, resource: &str) -> ObjectResult<()>;
}

/// Authorizer that admits everything. Deployment wiring for clusters without
/// access control, and a convenient default for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _principal: &Principal, _verb: Verb, _resource: &str) -> ObjectResult<()> {
        Ok(())
    }
}
