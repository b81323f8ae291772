use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::committee::CommitteeKey;
use crate::enums::{Chamber, CommitteeType, Party, Position, Source};
use crate::person::PersonKey;

// ---------------------------------------------------------------------------
// Normalized records (adapter output)
// ---------------------------------------------------------------------------

/// A person as one source reports them. Fields use the universal
/// vocabulary; state codes are 2-letter, party is the closed enum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRecord {
    pub source: Source,
    pub fetched_at: DateTime<Utc>,
    pub bioguide_id: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    pub nickname: Option<String>,
    pub party: Party,
    pub chamber: Chamber,
    pub state: String,
    pub district: Option<u16>,
    pub term_start: Option<NaiveDate>,
    pub term_end: Option<NaiveDate>,
    pub photo_url: Option<String>,
    /// Raw payload kept for replay and audit.
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl PersonRecord {
    pub fn full_name(&self) -> String {
        let mut parts = vec![self.first_name.as_str()];
        if let Some(m) = &self.middle_name {
            parts.push(m);
        }
        parts.push(&self.last_name);
        parts.join(" ")
    }
}

/// A committee as one source reports it. Names are trimmed but not
/// canonicalized; `parent_code`/`parent_name` tie subcommittees to
/// their parents before ids exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitteeRecord {
    pub source: Source,
    pub fetched_at: DateTime<Utc>,
    pub system_code: Option<String>,
    pub name: String,
    pub chamber: Chamber,
    pub committee_type: CommitteeType,
    pub parent_code: Option<String>,
    pub parent_name: Option<String>,
    pub jurisdiction: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// A roster or leadership row: person key + committee key + position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub source: Source,
    pub fetched_at: DateTime<Utc>,
    pub person: PersonKey,
    pub committee: CommitteeKey,
    pub position: Position,
    #[serde(default)]
    pub raw: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Envelope + stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Person,
    Committee,
    Membership,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Person => write!(f, "person"),
            Self::Committee => write!(f, "committee"),
            Self::Membership => write!(f, "membership"),
        }
    }
}

/// JSON-Lines envelope written to the artifact directory; one line per
/// record, one file per (source, kind).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceRecord {
    Person(PersonRecord),
    Committee(CommitteeRecord),
    Membership(MembershipRecord),
}

impl SourceRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Person(_) => RecordKind::Person,
            Self::Committee(_) => RecordKind::Committee,
            Self::Membership(_) => RecordKind::Membership,
        }
    }

    pub fn source(&self) -> Source {
        match self {
            Self::Person(r) => r.source,
            Self::Committee(r) => r.source,
            Self::Membership(r) => r.source,
        }
    }
}

/// Per-(source, kind) fetch accounting. Unparseable rows are skipped
/// and counted, never fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchStats {
    pub records: usize,
    pub skipped_unparseable: usize,
    pub pages: usize,
}

impl FetchStats {
    pub fn merge(&mut self, other: FetchStats) {
        self.records += other.records;
        self.skipped_unparseable += other.skipped_unparseable;
        self.pages += other.pages;
    }
}

/// Everything every adapter produced for one run, in source-provided
/// order per source. The reconciliation input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSet {
    pub persons: Vec<PersonRecord>,
    pub committees: Vec<CommitteeRecord>,
    pub memberships: Vec<MembershipRecord>,
    pub stats: Vec<(Source, RecordKind, FetchStats)>,
}

impl SourceSet {
    pub fn push(&mut self, record: SourceRecord) {
        match record {
            SourceRecord::Person(r) => self.persons.push(r),
            SourceRecord::Committee(r) => self.committees.push(r),
            SourceRecord::Membership(r) => self.memberships.push(r),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.committees.is_empty() && self.memberships.is_empty()
    }

    pub fn persons_from(&self, source: Source) -> impl Iterator<Item = &PersonRecord> {
        self.persons.iter().filter(move |r| r.source == source)
    }

    pub fn committees_from(&self, source: Source) -> impl Iterator<Item = &CommitteeRecord> {
        self.committees.iter().filter(move |r| r.source == source)
    }

    pub fn memberships_from(&self, source: Source) -> impl Iterator<Item = &MembershipRecord> {
        self.memberships.iter().filter(move |r| r.source == source)
    }
}
