//! Error types for the belief-state engine.

use thiserror::Error;

/// Errors raised while persisting or loading the belief store.
///
/// These are hard failures: silently losing durability would corrupt the
/// audit trail, so callers must handle them.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem error (disk full, permissions, missing directory).
    #[error("belief state I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted document could not be serialized or deserialized.
    #[error("belief state serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
