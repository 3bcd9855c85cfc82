use thiserror::Error;
use uuid::Uuid;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents a submission that could not be parsed at all.
    #[error("Malformed submission: {0}")]
    MalformedSubmission(#[source] serde_json::Error),

    /// Represents a submission that parsed but failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Represents a failure in the underlying store.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl BackendError {
    /// Whether the error was caused by the caller rather than the
    /// service.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, BackendError::Persistence(_))
    }
}

/// Enumerates the ways a submission can be rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Field `{0}` must contain at least one non-blank label")]
    EmptyField(&'static str),

    #[error("Feeling state {0} is outside the range 0 to 6")]
    FeelingStateOutOfRange(i64),

    #[error("Coordinates ({latitude}, {longitude}) are out of range")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

/// Enumerates errors returned by the persistence layer.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Represents an SQL error.
    #[error("database error: {source}")]
    Sqlx { source: sqlx::Error },

    /// Represents an attempt to store an entry whose ID is taken.
    #[error("an entry with ID {0} already exists")]
    DuplicateId(Uuid),

    /// Represents a lock poisoned by a panicking writer.
    #[error("in-memory store is unavailable")]
    Poisoned,
}
