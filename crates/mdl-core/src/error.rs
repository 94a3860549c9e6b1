//! Error types for the MDL indexer.

use thiserror::Error;

/// Top-level result type for MDL operations.
pub type Result<T> = std::result::Result<T, MdlError>;

/// Top-level error type for MDL operations.
#[derive(Debug, Error)]
pub enum MdlError {
    /// The raw input could not be parsed as a JSON document.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The input parsed but does not have the shape of an MDL document.
    #[error("schema error: {0}")]
    Schema(String),

    #[error("cannot resolve relationship '{relationship}' for model '{model}': {reason}")]
    RelationshipResolution {
        model: String,
        relationship: String,
        reason: ResolutionFailure,
    },

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("generation error: {0}")]
    Generation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Why a relationship could not be turned into a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionFailure {
    #[error("model '{0}' is not defined")]
    UnknownModel(String),

    #[error("model '{0}' has no primary key")]
    MissingPrimaryKey(String),

    #[error("condition '{0}' is not of the form 'a.col = b.col'")]
    MalformedCondition(String),

    #[error("condition references ({left}, {right}) but the relationship joins ({first}, {second})")]
    TableMismatch {
        left: String,
        right: String,
        first: String,
        second: String,
    },
}
