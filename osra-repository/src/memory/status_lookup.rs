use async_trait::async_trait;
use osra_shared::{StatusCategory, StatusRef};

use crate::errors::RepositoryError;
use crate::interfaces::StatusLookup;

/// In-memory status lookup tables.
pub struct MemoryStatusLookup {
    rows: Vec<StatusRef>,
}

impl MemoryStatusLookup {
    /// Tables seeded with every known status.
    pub fn new() -> Self {
        let rows = [StatusCategory::Orphan, StatusCategory::Sponsorship]
            .into_iter()
            .flat_map(|category| {
                category
                    .names()
                    .into_iter()
                    .zip(1..)
                    .map(move |(name, id)| StatusRef {
                        id,
                        category,
                        name: name.to_string(),
                    })
            })
            .collect();
        Self { rows }
    }

    pub fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    /// Drop one row, e.g. to exercise a lookup table missing a status.
    pub fn without(mut self, category: StatusCategory, name: &str) -> Self {
        self.rows
            .retain(|row| !(row.category == category && row.name == name));
        self
    }
}

impl Default for MemoryStatusLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusLookup for MemoryStatusLookup {
    async fn find_by_name(
        &self,
        category: StatusCategory,
        name: &str,
    ) -> Result<Option<StatusRef>, RepositoryError> {
        Ok(self
            .rows
            .iter()
            .find(|row| row.category == category && row.name == name)
            .cloned())
    }
}
