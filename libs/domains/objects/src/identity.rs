use uuid::Uuid;

/// Identifier generation as a capability so tests can substitute a
/// deterministic sequence.
#[cfg_attr(test, mockall::automock)]
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Uuid;
}

/// Random v4 identifiers. Collision probability is negligible, so generated
/// ids are treated as unique without a lookup.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn generate(&self) -> Uuid {
        Uuid::new_v4()
    }
}
