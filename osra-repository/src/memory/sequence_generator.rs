use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::errors::SequenceError;
use crate::interfaces::SequenceGenerator;

/// In-memory sequences. Every draw holds the counter lock, so concurrent callers
/// are serialised.
#[derive(Default)]
pub struct MemorySequenceGenerator {
    counters: Mutex<HashMap<String, i64>>,
}

impl MemorySequenceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `scope` so that its next number is `next`.
    pub fn starting_at(scope: impl Into<String>, next: i64) -> Self {
        let mut counters = HashMap::new();
        counters.insert(scope.into(), next - 1);
        Self {
            counters: Mutex::new(counters),
        }
    }
}

#[async_trait]
impl SequenceGenerator for MemorySequenceGenerator {
    async fn next(&self, scope: &str) -> Result<i64, SequenceError> {
        let mut counters = self.counters.lock().await;
        let counter = counters.entry(scope.to_string()).or_insert(0);
        *counter = counter
            .checked_add(1)
            .ok_or_else(|| SequenceError::Exhausted(scope.to_string()))?;
        Ok(*counter)
    }
}
