//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent contract violations by the caller.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid traversal order: {0:?} (expected \"pre\" or \"post\")")]
    InvalidTraversalOrder(String),

    #[error("'{value}' has unsupported type '{type_name}'")]
    UnsupportedType { value: String, type_name: String },

    #[error("node not found in search space tree: {0}")]
    NodeNotFound(String),

    #[error("invalid device: {0}")]
    InvalidDevice(String),

    #[error("invalid meter format: {0:?}")]
    InvalidMeterFormat(String),

    #[error("unknown mutable kind: {0}")]
    UnknownMutableKind(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
