//! Orphan lists and the partner organisations that submit them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A partner organisation. Its province code prefixes the OSRA numbers of the
/// orphans it registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    pub province_code: Option<String>,
}

/// A batch of orphan records submitted by a partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanList {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osra_num: Option<String>,
    pub partner: Option<Partner>,
}

impl OrphanList {
    /// The province code reached through list → partner → province code.
    ///
    /// Returns `None` when the list has no partner or the partner has no province
    /// code. An empty code is returned as is.
    pub fn partner_province_code(&self) -> Option<&str> {
        self.partner.as_ref()?.province_code.as_deref()
    }
}
