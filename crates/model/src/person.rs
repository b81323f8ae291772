use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::{Chamber, EntityStatus, Party, SenateRole, TermClass};
use crate::PersonId;

/// A member of Congress in the reconciled snapshot.
///
/// Invariants enforced downstream: `chamber + state + district` is
/// unique among current voting House members; a person holds at most
/// one current row; senators carry `district = None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    /// External natural key; unique when present.
    pub bioguide_id: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    pub nickname: Option<String>,
    pub party: Party,
    pub chamber: Chamber,
    /// 2-letter code, territories included.
    pub state: String,
    /// District number for voting House seats; `None` (or 0) for
    /// non-voting delegates and all senators.
    pub district: Option<u16>,
    pub term_start: Option<NaiveDate>,
    pub term_end: Option<NaiveDate>,
    pub is_current: bool,
    pub senate_role: Option<SenateRole>,
    pub term_class: Option<TermClass>,
    pub photo_url: Option<String>,
    pub status: EntityStatus,
}

impl Person {
    pub fn full_name(&self) -> String {
        let mut parts = vec![self.first_name.as_str()];
        if let Some(m) = &self.middle_name {
            parts.push(m);
        }
        parts.push(&self.last_name);
        if let Some(s) = &self.suffix {
            parts.push(s);
        }
        parts.join(" ")
    }

    /// A current House member occupying a numbered district seat.
    pub fn is_voting_house(&self) -> bool {
        self.is_current
            && self.chamber == Chamber::House
            && matches!(self.district, Some(d) if d >= 1)
    }

    /// A current House delegate from a territory (district 0 or absent).
    pub fn is_nonvoting_delegate(&self) -> bool {
        self.is_current
            && self.chamber == Chamber::House
            && !matches!(self.district, Some(d) if d >= 1)
    }

    /// A current senator counted toward the 100; excludes the VP.
    pub fn is_regular_senator(&self) -> bool {
        self.is_current
            && self.chamber == Chamber::Senate
            && self.senate_role != Some(SenateRole::VicePresident)
    }
}

/// Attributes a source record can use to point at a person when no
/// internal id exists yet (membership rows, leadership rows).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonKey {
    pub bioguide_id: Option<String>,
    pub full_name: String,
    pub party: Option<Party>,
    pub state: Option<String>,
    pub chamber: Option<Chamber>,
}
