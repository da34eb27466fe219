use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock acquisition cancelled before the scope became free")]
    Cancelled,

    #[error("lock release failed: {0}")]
    Release(String),
}

pub type LockResult<T> = Result<T, LockError>;
