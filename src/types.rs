//! Error types for gene-curator

use thiserror::Error;

/// A record is a mapping of field key to JSON value, conforming to the
/// entity's field schema
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Errors surfaced by the curation core and its store adapters
#[derive(Error, Debug)]
pub enum CuratorError {
    /// A record failed schema validation; carries all violation messages joined
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A natural-key uniqueness rule was violated
    #[error("{0}")]
    Duplicate(String),

    /// A lookup or update targeted a document that does not exist
    #[error("{0}")]
    NotFound(String),

    /// Database connectivity or query failure
    #[error("Database error: {0}")]
    Database(String),

    /// Authentication or authorization failure
    #[error("Auth error: {0}")]
    Auth(String),

    /// Invalid static configuration (schemas, workflow rules)
    #[error("Config error: {0}")]
    Config(String),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, CuratorError>;
