//! `capitol-model` — Domain types for the congressional data pipeline.
//!
//! Pure types crate: enums, entities, source records, conflict records,
//! and the reconciled snapshot. No IO dependencies.

pub mod committee;
pub mod conflict;
pub mod enums;
pub mod membership;
pub mod person;
pub mod snapshot;
pub mod source;
pub mod states;

pub use committee::{Committee, CommitteeKey};
pub use conflict::{ConflictKind, ConflictRecord, EntityRef, SourceValue};
pub use enums::{
    Chamber, CommitteeType, EntityStatus, ParseEnumError, Party, Position, SenateRole, Source,
    TermClass,
};
pub use membership::Membership;
pub use person::{Person, PersonKey};
pub use snapshot::{PartyControl, Snapshot, SnapshotMeta};
pub use source::{
    CommitteeRecord, FetchStats, MembershipRecord, PersonRecord, RecordKind, SourceRecord,
    SourceSet,
};

/// Internal surrogate id for a person. Monotonic within a run, stable
/// across runs when the bioguide id is present.
pub type PersonId = i64;

/// Internal surrogate id for a committee.
pub type CommitteeId = i64;
