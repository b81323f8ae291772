use serde::{Deserialize, Serialize};

use crate::enums::Source;
use crate::{CommitteeId, PersonId};

/// Why a conflict record exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Two sources disagreed irreducibly on an attribute value.
    AttributeDisagreement,
    /// Fuzzy identity score landed in the 0.70–0.90 grey band.
    GreyBandMatch,
    /// Multiple candidates tied at the top of the match order.
    AmbiguousIdentity,
    /// A person moved from one chamber to the other mid-Congress.
    ChamberTransition,
    /// A subcommittee whose parent resolved in no source.
    OrphanSubcommittee,
    /// Leadership source overruled the roster-stated leader.
    LeadershipOverride,
    /// A roster row only one source attests to.
    DisputedRoster,
    /// No source supplied a roster for the committee.
    MissingRoster,
    /// A tier-2 invariant recorded a warning.
    InvariantWarning,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AttributeDisagreement => "attribute_disagreement",
            Self::GreyBandMatch => "grey_band_match",
            Self::AmbiguousIdentity => "ambiguous_identity",
            Self::ChamberTransition => "chamber_transition",
            Self::OrphanSubcommittee => "orphan_subcommittee",
            Self::LeadershipOverride => "leadership_override",
            Self::DisputedRoster => "disputed_roster",
            Self::MissingRoster => "missing_roster",
            Self::InvariantWarning => "invariant_warning",
        };
        f.write_str(s)
    }
}

/// Which entity a conflict is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityRef {
    Person { id: PersonId },
    Committee { id: CommitteeId },
    Membership { person_id: PersonId, committee_id: CommitteeId },
}

/// One attested value from one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceValue {
    pub source: Source,
    pub value: String,
}

/// Emitted whenever sources disagree irreducibly, an identity is
/// uncertain, or a non-blocking invariant records a warning. Never
/// fatal; ships with the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub kind: ConflictKind,
    pub entity: EntityRef,
    pub attribute: String,
    pub values: Vec<SourceValue>,
    /// The value the pipeline adopted, if any.
    pub chosen: Option<String>,
    pub rationale: String,
}

impl ConflictRecord {
    pub fn new(kind: ConflictKind, entity: EntityRef, attribute: impl Into<String>) -> Self {
        Self {
            kind,
            entity,
            attribute: attribute.into(),
            values: Vec::new(),
            chosen: None,
            rationale: String::new(),
        }
    }

    pub fn value(mut self, source: Source, value: impl Into<String>) -> Self {
        self.values.push(SourceValue { source, value: value.into() });
        self
    }

    pub fn chose(mut self, value: impl Into<String>) -> Self {
        self.chosen = Some(value.into());
        self
    }

    pub fn because(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }
}
