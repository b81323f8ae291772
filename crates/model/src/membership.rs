use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::{Position, Source};
use crate::{CommitteeId, PersonId};

/// Ternary relation binding a person to a committee with a role.
///
/// Memberships are fully replaced per run, never patched. `disputed`
/// marks rows only one roster source attests to; `sources` records the
/// provenance union.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub person_id: PersonId,
    pub committee_id: CommitteeId,
    pub position: Position,
    pub is_current: bool,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub disputed: bool,
    pub sources: Vec<Source>,
}

impl Membership {
    pub fn new(person_id: PersonId, committee_id: CommitteeId, position: Position) -> Self {
        Self {
            person_id,
            committee_id,
            position,
            is_current: true,
            start: None,
            end: None,
            disputed: false,
            sources: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
        self
    }
}
