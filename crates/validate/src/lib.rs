//! `capitol-validate` — tiered invariant checks over the reconciled
//! snapshot.
//!
//! Tier 1 blocks publication (constitutional counts and structural
//! integrity). Tier 2 warns and emits conflict records. Tier 3 is
//! coverage reporting. Passing entities are promoted from Proposed to
//! Validated, or to Disputed when a conflict record names them.

pub mod checks;
pub mod report;
pub mod rules;

use std::collections::BTreeSet;

use capitol_model::{ConflictKind, ConflictRecord, EntityRef, EntityStatus, Snapshot};
use tracing::{info, warn};

pub use report::{Coverage, InvariantReport, RuleOutcome, RuleStatus};
pub use rules::{RuleId, Tier, HOUSE_STANDING, SENATE_STANDING};

use checks::Checker;

/// Expected chamber counts. The 119th Congress seats 435 voting House
/// members, 441 total with the delegates, and 100 senators.
#[derive(Debug, Clone, Copy)]
pub struct Expectations {
    pub house_voting: usize,
    pub house_total: usize,
    pub senate: usize,
}

impl Expectations {
    pub fn for_congress(_congress: u16) -> Self {
        Self { house_voting: 435, house_total: 441, senate: 100 }
    }

    /// Scaled-down expectations for test fixtures.
    pub fn exact(house_voting: usize, house_total: usize, senate: usize) -> Self {
        Self { house_voting, house_total, senate }
    }
}

/// Runs every rule, promotes entity statuses on success, and appends
/// tier-2 warnings to the snapshot's conflict list.
pub fn validate(snapshot: &mut Snapshot, expect: &Expectations) -> InvariantReport {
    let mut checker = Checker::new(snapshot, expect);
    checker.chamber_counts();
    checker.district_ranges();
    checker.committee_structure();
    checker.membership_references();
    checker.major_committees_present();
    checker.leadership_rules();
    checker.single_standing_chair_per_person();
    checker.senate_term_classes();
    let coverage = checker.coverage();
    let report = InvariantReport { outcomes: checker.outcomes, coverage };

    // Tier-2 warnings become conflict records on the snapshot.
    for outcome in report.warnings().filter(|o| o.tier == Tier::Warning) {
        let entity = outcome
            .offenders
            .first()
            .cloned()
            .unwrap_or(EntityRef::Committee { id: 0 });
        snapshot.conflicts.push(
            ConflictRecord::new(ConflictKind::InvariantWarning, entity, outcome.rule.to_string())
                .because(outcome.detail.clone()),
        );
    }

    if report.publishable() {
        promote(snapshot);
        info!(
            warnings = report.warnings().count(),
            conflicts = snapshot.conflicts.len(),
            "snapshot validated"
        );
    } else {
        for failure in report.blocking_failures() {
            warn!(rule = %failure.rule, detail = %failure.detail, "blocking invariant failed");
        }
    }
    report
}

/// Proposed -> Validated, or Disputed when a conflict names the entity.
fn promote(snapshot: &mut Snapshot) {
    let mut disputed_persons = BTreeSet::new();
    let mut disputed_committees = BTreeSet::new();
    for conflict in &snapshot.conflicts {
        match conflict.entity {
            EntityRef::Person { id } => {
                disputed_persons.insert(id);
            }
            EntityRef::Committee { id } => {
                disputed_committees.insert(id);
            }
            EntityRef::Membership { person_id, committee_id } => {
                disputed_persons.insert(person_id);
                disputed_committees.insert(committee_id);
            }
        }
    }

    for person in &mut snapshot.persons {
        if person.status == EntityStatus::Proposed {
            person.status = if disputed_persons.contains(&person.id) {
                EntityStatus::Disputed
            } else {
                EntityStatus::Validated
            };
        }
    }
    for committee in &mut snapshot.committees {
        if committee.status == EntityStatus::Proposed {
            committee.status = if disputed_committees.contains(&committee.id) {
                EntityStatus::Disputed
            } else {
                EntityStatus::Validated
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capitol_model::{
        Chamber, Committee, CommitteeType, EntityStatus, Membership, Party, PartyControl, Person,
        Position, SnapshotMeta,
    };
    use chrono::Utc;

    fn person(id: i64, chamber: Chamber, party: Party, state: &str, district: Option<u16>) -> Person {
        Person {
            id,
            bioguide_id: None,
            first_name: "Test".into(),
            middle_name: None,
            last_name: format!("Member{id}"),
            suffix: None,
            nickname: None,
            party,
            chamber,
            state: state.into(),
            district,
            term_start: None,
            term_end: None,
            is_current: true,
            senate_role: None,
            term_class: None,
            photo_url: None,
            status: EntityStatus::Proposed,
        }
    }

    fn committee(id: i64, name: &str, chamber: Chamber) -> Committee {
        Committee {
            id,
            system_code: None,
            name: name.into(),
            chamber,
            committee_type: CommitteeType::Standing,
            parent_id: None,
            is_current: true,
            jurisdiction: None,
            url: None,
            status: EntityStatus::Proposed,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            meta: SnapshotMeta {
                run_id: "test".into(),
                congress: 119,
                generated_at: Utc::now(),
                engine_version: "0".into(),
            },
            persons: Vec::new(),
            committees: Vec::new(),
            memberships: Vec::new(),
            conflicts: Vec::new(),
            party_control: PartyControl {
                house_majority: Party::Republican,
                senate_majority: Party::Republican,
            },
        }
    }

    #[test]
    fn short_house_fails_the_voting_count() {
        let mut snap = snapshot();
        snap.persons.push(person(1, Chamber::House, Party::Republican, "OH", Some(4)));
        let report = validate(&mut snap, &Expectations::exact(2, 2, 0));
        assert!(!report.publishable());
        assert_eq!(report.failure_kind().as_deref(), Some("HouseVotingCountMismatch"));
        // Statuses stay Proposed when publication is blocked.
        assert_eq!(snap.persons[0].status, EntityStatus::Proposed);
    }

    #[test]
    fn clean_snapshot_promotes_to_validated() {
        let mut snap = snapshot();
        snap.persons.push(person(1, Chamber::House, Party::Republican, "OH", Some(4)));
        snap.persons.push(person(2, Chamber::House, Party::Democratic, "DC", None));
        let report = validate(&mut snap, &Expectations::exact(1, 2, 0));
        assert!(report.publishable());
        assert!(snap.persons.iter().all(|p| p.status == EntityStatus::Validated));
    }

    #[test]
    fn senator_with_district_is_blocking() {
        let mut snap = snapshot();
        snap.persons.push(person(1, Chamber::Senate, Party::Republican, "OH", Some(1)));
        let report = validate(&mut snap, &Expectations::exact(0, 0, 1));
        let outcome = report.outcome(RuleId::SenatorHasDistrict).unwrap();
        assert_eq!(outcome.status, RuleStatus::Fail);
    }

    #[test]
    fn chair_from_minority_warns_and_records_conflict() {
        let mut snap = snapshot();
        snap.persons.push(person(1, Chamber::Senate, Party::Democratic, "IL", None));
        snap.persons.push(person(2, Chamber::Senate, Party::Republican, "IA", None));
        snap.committees.push(committee(1, "Committee on the Judiciary", Chamber::Senate));
        let mut chair = Membership::new(1, 1, Position::Chair);
        chair.is_current = true;
        let mut ranking = Membership::new(2, 1, Position::RankingMember);
        ranking.is_current = true;
        snap.memberships.push(chair);
        snap.memberships.push(ranking);

        let report = validate(&mut snap, &Expectations::exact(0, 0, 2));
        assert!(report.publishable());
        let outcome = report.outcome(RuleId::ChairPartyNotMajority).unwrap();
        assert_eq!(outcome.status, RuleStatus::Warn);
        assert!(snap.conflicts.iter().any(|c| c.kind == ConflictKind::InvariantWarning));
        // The chair's person is named by the warning, so it lands Disputed.
        assert_eq!(snap.persons[0].status, EntityStatus::Disputed);
    }

    #[test]
    fn missing_standing_committee_is_a_warning_not_a_failure() {
        let mut snap = snapshot();
        snap.persons.push(person(1, Chamber::Senate, Party::Republican, "IA", None));
        let report = validate(&mut snap, &Expectations::exact(0, 0, 1));
        assert!(report.publishable());
        let outcome = report.outcome(RuleId::MajorCommitteeMissing).unwrap();
        assert_eq!(outcome.status, RuleStatus::Warn);
    }

    #[test]
    fn dangling_membership_blocks() {
        let mut snap = snapshot();
        snap.persons.push(person(1, Chamber::Senate, Party::Republican, "IA", None));
        let mut m = Membership::new(1, 99, Position::Member);
        m.is_current = true;
        snap.memberships.push(m);
        let report = validate(&mut snap, &Expectations::exact(0, 0, 1));
        let outcome = report.outcome(RuleId::MembershipDanglingReference).unwrap();
        assert_eq!(outcome.status, RuleStatus::Fail);
        assert!(!report.publishable());
    }

    #[test]
    fn report_serializes_for_the_artifact_store() {
        let mut snap = snapshot();
        snap.persons.push(person(1, Chamber::Senate, Party::Republican, "IA", None));
        let report = validate(&mut snap, &Expectations::exact(0, 0, 1));
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("house_voting_count_mismatch") || json.contains("HouseVoting") || !json.is_empty());
    }
}
