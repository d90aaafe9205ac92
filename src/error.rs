//! Error types for the riverfish index.
//!
//! All public APIs return `RiverResult<T>` — no panics in library code.

use thiserror::Error;

/// Unified error type for all riverfish operations.
#[derive(Debug, Error)]
pub enum RiverError {
    /// `create_river` called against a name that already has a descriptor.
    #[error("river '{0}' already exists")]
    RiverAlreadyExists(String),

    /// `open_river` (or an operation requiring an open river) found no descriptor.
    #[error("river '{0}' does not exist")]
    RiverDoesNotExist(String),

    /// The descriptor names a key transform this build cannot resolve.
    #[error("river '{river}' uses unknown key transform '{transform}'")]
    KeyTransformIncompatible { river: String, transform: String },

    /// A record field name begins with the reserved `_` prefix.
    #[error("field '{0}' begins with the reserved '_' prefix")]
    DisallowedMetadataKey(String),

    /// `UNQ` is set and the incoming user key already has a record.
    #[error("key already exists in unique river '{0}'")]
    RiverKeyAlreadyExists(String),

    /// The same iteration option was applied twice to one handle.
    #[error("iteration option '{0}' was already set on this handle")]
    IterationOptionsException(&'static str),

    /// A unique river's leaf somehow holds more than one surviving record for a key.
    #[error("expected at most one result for key {0} in unique river '{1}', found more")]
    ResultsNotUnique(i64, String),

    /// The river node vanished between `gets` and a later step of an operation.
    #[error("river '{0}' was deleted during the operation")]
    RiverDeleted(String),

    /// A `cas` lost the race; some interior widening may remain, the leaf was not written.
    #[error("contention on river '{river}' at level granularity {granularity:?}, bucket {bucket}")]
    ContentionFailure {
        river: String,
        granularity: Option<i64>,
        bucket: i64,
    },

    /// `IND`, the river name, or a key-transform argument failed validation.
    #[error("invalid river configuration: {0}")]
    InvalidConfiguration(String),

    /// The underlying key/value store raised an error not classified above.
    #[error("adapter error: {0}")]
    Adapter(String),

    /// The codec could not pack or unpack a stored value.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Result type alias for all riverfish operations.
pub type RiverResult<T> = Result<T, RiverError>;
