//! The structured invariant report that ships with every run.

use capitol_model::EntityRef;
use serde::{Deserialize, Serialize};

use crate::rules::{RuleId, Tier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Pass,
    Warn,
    Fail,
}

/// One rule's verdict, with the offending entities when it did not
/// pass cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: RuleId,
    pub tier: Tier,
    pub status: RuleStatus,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub offenders: Vec<EntityRef>,
}

/// Snapshot-level coverage metrics (tier 3).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Coverage {
    /// Fraction of current members with at least one assignment.
    pub members_with_committee: f64,
    pub avg_committees_per_house_member: f64,
    pub avg_committees_per_senator: f64,
    /// Fraction of current subcommittees with a resolved parent.
    pub subcommittees_with_parent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvariantReport {
    pub outcomes: Vec<RuleOutcome>,
    pub coverage: Coverage,
}

impl InvariantReport {
    /// True when no blocking rule failed; the publisher gate.
    pub fn publishable(&self) -> bool {
        self.blocking_failures().next().is_none()
    }

    pub fn blocking_failures(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.tier == Tier::Blocking && o.status == RuleStatus::Fail)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(|o| o.status == RuleStatus::Warn)
    }

    /// The error kind for the FAILED marker, from the first blocking
    /// failure.
    pub fn failure_kind(&self) -> Option<String> {
        self.blocking_failures().next().map(|o| o.rule.to_string())
    }

    pub fn outcome(&self, rule: RuleId) -> Option<&RuleOutcome> {
        self.outcomes.iter().find(|o| o.rule == rule)
    }
}
