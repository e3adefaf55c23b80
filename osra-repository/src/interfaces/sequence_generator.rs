use async_trait::async_trait;

use crate::errors::SequenceError;

/// Hands out sequence numbers for human-readable identifiers.
///
/// Numbers are strictly increasing within a scope and never handed out twice, also
/// when many callers draw concurrently. Implementations serialise at this boundary
/// (an atomic database upsert, a mutex) so callers need no coordination.
#[async_trait]
pub trait SequenceGenerator: Send + Sync {
    /// Draw the next number of `scope`. The first number of a scope is 1.
    async fn next(&self, scope: &str) -> Result<i64, SequenceError>;
}
