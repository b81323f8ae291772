use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::committee::Committee;
use crate::conflict::ConflictRecord;
use crate::enums::{Chamber, Party};
use crate::membership::Membership;
use crate::person::Person;
use crate::{CommitteeId, PersonId};

/// Majority/minority per chamber, derived from the reconciled person
/// set rather than hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyControl {
    pub house_majority: Party,
    pub senate_majority: Party,
}

impl PartyControl {
    pub fn majority(&self, chamber: Chamber) -> Party {
        match chamber {
            Chamber::House => self.house_majority,
            Chamber::Senate => self.senate_majority,
            // Joint committee leadership follows the Senate majority.
            Chamber::Joint => self.senate_majority,
        }
    }

    /// The two-party complement; an Independent majority never occurs
    /// in practice, so minority is defined as the other major party.
    pub fn minority(&self, chamber: Chamber) -> Party {
        match self.majority(chamber) {
            Party::Republican => Party::Democratic,
            Party::Democratic | Party::Independent => Party::Republican,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub run_id: String,
    pub congress: u16,
    pub generated_at: DateTime<Utc>,
    pub engine_version: String,
}

/// The fully reconciled in-memory view of one Congress: the unit that
/// flows from the reconciliation engine through the validator to the
/// publisher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub meta: SnapshotMeta,
    pub persons: Vec<Person>,
    pub committees: Vec<Committee>,
    pub memberships: Vec<Membership>,
    pub conflicts: Vec<ConflictRecord>,
    pub party_control: PartyControl,
}

impl Snapshot {
    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.persons.iter().find(|p| p.id == id)
    }

    pub fn committee(&self, id: CommitteeId) -> Option<&Committee> {
        self.committees.iter().find(|c| c.id == id)
    }

    pub fn memberships_of(&self, committee_id: CommitteeId) -> impl Iterator<Item = &Membership> {
        self.memberships.iter().filter(move |m| m.committee_id == committee_id)
    }

    pub fn current_house_voting(&self) -> usize {
        self.persons.iter().filter(|p| p.is_voting_house()).count()
    }

    pub fn current_house_total(&self) -> usize {
        self.persons
            .iter()
            .filter(|p| p.is_current && p.chamber == Chamber::House)
            .count()
    }

    pub fn current_senators(&self) -> usize {
        self.persons.iter().filter(|p| p.is_regular_senator()).count()
    }
}
