use serde::{Deserialize, Serialize};

use crate::enums::{Chamber, CommitteeType, EntityStatus};
use crate::CommitteeId;

/// A committee or subcommittee in the reconciled snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Committee {
    pub id: CommitteeId,
    /// Congress.gov system code (e.g. "ssju00"); natural key when present.
    pub system_code: Option<String>,
    pub name: String,
    pub chamber: Chamber,
    pub committee_type: CommitteeType,
    /// `None` iff top-level (or the parent never resolved).
    pub parent_id: Option<CommitteeId>,
    pub is_current: bool,
    pub jurisdiction: Option<String>,
    pub url: Option<String>,
    pub status: EntityStatus,
}

impl Committee {
    pub fn is_subcommittee(&self) -> bool {
        self.committee_type == CommitteeType::Subcommittee
    }

    /// Standing committees are the ones tier-2 leadership rules apply to.
    pub fn is_standing(&self) -> bool {
        self.committee_type == CommitteeType::Standing
    }
}

/// Attributes a source record can use to point at a committee before
/// identity resolution has assigned an internal id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeKey {
    pub system_code: Option<String>,
    pub name: String,
    pub chamber: Chamber,
}
