//! Mutual-exclusion scopes shared by schema and data mutation paths.
//!
//! Two named scopes exist: `schema` and `connector`. A data mutation holds the
//! connector scope for its duration; a schema mutation holds both scopes so no
//! data write can observe a half-changed class definition. Acquisition blocks
//! until the scope is free or the caller's cancellation token fires.
//!
//! Every successful acquisition returns a [`LockHandle`] that must be released
//! exactly once. Release errors are returned to the caller so they can be
//! folded into the operation's own result; a handle dropped without an
//! explicit release still frees the scope and logs a warning.

pub mod coordinator;
pub mod error;
pub mod handle;

pub use coordinator::{LockCoordinator, ScopedLocks};
pub use error::{LockError, LockResult};
pub use handle::LockHandle;
