use thiserror::Error;

/// Represents errors that can occur while drawing a sequence number.
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Sequence {0} is exhausted")]
    Exhausted(String),
}
