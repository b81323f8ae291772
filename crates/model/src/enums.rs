use serde::{Deserialize, Serialize};

/// A free-form source value failed to map onto one of the closed enums.
#[derive(Debug, thiserror::Error)]
#[error("cannot parse {what} from {value:?}")]
pub struct ParseEnumError {
    pub what: &'static str,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Party
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Democratic,
    Republican,
    Independent,
}

impl Party {
    /// Accepts both the long form ("Democratic") and the single-letter
    /// form used by Wikipedia infoboxes ("D", "R", "I", "ID").
    pub fn parse(value: &str) -> Result<Self, ParseEnumError> {
        match value.trim() {
            "Democratic" | "Democrat" | "D" => Ok(Self::Democratic),
            "Republican" | "R" => Ok(Self::Republican),
            "Independent" | "I" | "ID" | "Independent Democrat" => Ok(Self::Independent),
            other => Err(ParseEnumError { what: "party", value: other.to_string() }),
        }
    }
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Democratic => write!(f, "Democratic"),
            Self::Republican => write!(f, "Republican"),
            Self::Independent => write!(f, "Independent"),
        }
    }
}

// ---------------------------------------------------------------------------
// Chamber
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chamber {
    House,
    Senate,
    Joint,
}

impl Chamber {
    pub fn parse(value: &str) -> Result<Self, ParseEnumError> {
        match value.trim() {
            "House" | "house" | "House of Representatives" => Ok(Self::House),
            "Senate" | "senate" => Ok(Self::Senate),
            "Joint" | "joint" => Ok(Self::Joint),
            other => Err(ParseEnumError { what: "chamber", value: other.to_string() }),
        }
    }
}

impl std::fmt::Display for Chamber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::House => write!(f, "House"),
            Self::Senate => write!(f, "Senate"),
            Self::Joint => write!(f, "Joint"),
        }
    }
}

// ---------------------------------------------------------------------------
// Committee type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitteeType {
    Standing,
    Select,
    Special,
    Joint,
    Subcommittee,
}

impl std::fmt::Display for CommitteeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standing => write!(f, "Standing"),
            Self::Select => write!(f, "Select"),
            Self::Special => write!(f, "Special"),
            Self::Joint => write!(f, "Joint"),
            Self::Subcommittee => write!(f, "Subcommittee"),
        }
    }
}

// ---------------------------------------------------------------------------
// Membership position
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Member,
    Chair,
    RankingMember,
    ViceChair,
}

impl Position {
    pub fn parse(value: &str) -> Result<Self, ParseEnumError> {
        match value.trim() {
            "Member" | "member" => Ok(Self::Member),
            "Chair" | "Chairman" | "Chairwoman" | "chair" => Ok(Self::Chair),
            "Ranking Member" | "ranking_member" | "Ranking member" => Ok(Self::RankingMember),
            "Vice Chair" | "Vice Chairman" | "vice_chair" => Ok(Self::ViceChair),
            other => Err(ParseEnumError { what: "position", value: other.to_string() }),
        }
    }

    /// Leadership positions are singletons per committee; plain members
    /// are not.
    pub fn is_leadership(&self) -> bool {
        matches!(self, Self::Chair | Self::RankingMember)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Member => write!(f, "Member"),
            Self::Chair => write!(f, "Chair"),
            Self::RankingMember => write!(f, "Ranking Member"),
            Self::ViceChair => write!(f, "Vice Chair"),
        }
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    CongressGov,
    ChamberSite,
    Wikipedia,
}

impl Source {
    pub const ALL: [Source; 3] = [Self::CongressGov, Self::ChamberSite, Self::Wikipedia];

    /// Stable name used for artifact file names and report keys.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::CongressGov => "congress_gov",
            Self::ChamberSite => "chamber_site",
            Self::Wikipedia => "wikipedia",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

// ---------------------------------------------------------------------------
// Senate extras
// ---------------------------------------------------------------------------

/// Distinguished Senate-chamber roles. The Vice President presides over
/// the Senate but is not one of the 100 regular members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenateRole {
    Senator,
    VicePresident,
}

/// Staggered six-year term classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermClass {
    I,
    II,
    III,
}

// ---------------------------------------------------------------------------
// Entity lifecycle
// ---------------------------------------------------------------------------

/// Per-entity state machine:
/// `Unseen → Proposed → (Validated | Disputed) → Committed`.
/// Only Validated or Disputed entities reach the publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Unseen,
    Proposed,
    Validated,
    Disputed,
    Committed,
}

impl EntityStatus {
    pub fn publishable(&self) -> bool {
        matches!(self, Self::Validated | Self::Disputed | Self::Committed)
    }
}
