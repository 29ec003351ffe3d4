//! Error types for the admin interface.

use thiserror::Error;

/// Admin-specific errors.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// ORM error.
    #[error("ORM error: {0}")]
    Orm(#[from] multiselect_orm::OrmError),

    /// The request's lookup parameters cannot be turned into a query.
    ///
    /// Views render this as a generic bad-request page instead of an
    /// internal error.
    #[error("incorrect lookup parameters: {0}")]
    IncorrectLookupParameters(String),

    /// A list filter names a field it cannot be used with.
    #[error("invalid filter field: {0}")]
    InvalidField(String),
}

/// Result type alias for admin operations.
pub type Result<T> = std::result::Result<T, AdminError>;
