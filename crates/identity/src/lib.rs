//! `capitol-identity` — stable internal ids for persons and committees.
//!
//! Pure in-memory resolution: records go in, deterministic id
//! assignments come out. Identity ambiguity is never fatal; grey-band
//! and tied matches surface as conflict records on the resolver.

pub mod committee;
pub mod names;
pub mod person;

pub use committee::{
    normalize_name, token_overlap, CommitteeEntry, CommitteeMatchTier, CommitteeResolution,
    CommitteeResolver,
};
pub use person::{PersonEntry, PersonMatchTier, PersonResolution, PersonResolver};

/// Fuzzy score at or above which a person match is accepted outright.
pub const MATCH_THRESHOLD: f64 = 0.90;

/// Scores in `[GREY_BAND_FLOOR, MATCH_THRESHOLD)` produce a tentative
/// id plus a conflict record for human review.
pub const GREY_BAND_FLOOR: f64 = 0.70;

/// Minimum token overlap for the last-resort committee match tier.
pub const COMMITTEE_OVERLAP_THRESHOLD: f64 = 0.5;
