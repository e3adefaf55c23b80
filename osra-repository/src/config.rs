//! Configuration types for the OrphanService.

use osra_shared::DEFAULT_OSRA_NUM_WIDTH;

/// Sequence scope used for orphan OSRA numbers unless configured otherwise.
pub const DEFAULT_SEQUENCE_SCOPE: &str = "orphans";

/// Configuration for the OrphanService.
///
/// Controls how OSRA numbers are generated for new records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanServiceConfig {
    /// Name of the sequence the service draws numbers from.
    ///
    /// Defaults to "orphans".
    pub sequence_scope: String,

    /// Minimum digits of the sequence part of an OSRA number.
    ///
    /// Defaults to 5. Sequences longer than this are never truncated.
    pub osra_num_width: usize,
}

impl Default for OrphanServiceConfig {
    fn default() -> Self {
        Self {
            sequence_scope: DEFAULT_SEQUENCE_SCOPE.to_string(),
            osra_num_width: DEFAULT_OSRA_NUM_WIDTH,
        }
    }
}

impl OrphanServiceConfig {
    /// Create a config drawing from a custom sequence scope.
    ///
    /// # Arguments
    ///
    /// * `scope` - Name of the sequence, e.g. one per deployment
    pub fn with_sequence_scope(mut self, scope: impl Into<String>) -> Self {
        self.sequence_scope = scope.into();
        self
    }

    /// Create a config with a custom OSRA number width.
    pub fn with_osra_num_width(mut self, width: usize) -> Self {
        self.osra_num_width = width;
        self
    }
}
