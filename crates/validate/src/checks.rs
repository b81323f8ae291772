//! The individual rule implementations.

use std::collections::{BTreeMap, BTreeSet};

use capitol_identity::normalize_name;
use capitol_model::{
    states, Chamber, CommitteeId, EntityRef, PersonId, Position, Snapshot,
};

use crate::report::{Coverage, RuleOutcome, RuleStatus};
use crate::rules::{RuleId, HOUSE_STANDING, SENATE_STANDING};
use crate::Expectations;

pub(crate) struct Checker<'a> {
    snapshot: &'a Snapshot,
    expect: &'a Expectations,
    pub outcomes: Vec<RuleOutcome>,
}

impl<'a> Checker<'a> {
    pub fn new(snapshot: &'a Snapshot, expect: &'a Expectations) -> Self {
        Self { snapshot, expect, outcomes: Vec::new() }
    }

    fn record(
        &mut self,
        rule: RuleId,
        status: RuleStatus,
        detail: String,
        offenders: Vec<EntityRef>,
    ) {
        self.outcomes.push(RuleOutcome { rule, tier: rule.tier(), status, detail, offenders });
    }

    fn pass(&mut self, rule: RuleId, detail: impl Into<String>) {
        self.record(rule, RuleStatus::Pass, detail.into(), Vec::new());
    }

    fn count_check(&mut self, rule: RuleId, what: &str, actual: usize, expected: usize) {
        if actual == expected {
            self.pass(rule, format!("{what} = {actual}"));
        } else {
            self.record(
                rule,
                RuleStatus::Fail,
                format!("{what} = {actual}, expected {expected}"),
                Vec::new(),
            );
        }
    }

    // ------------------------------------------------------------------
    // Tier 1
    // ------------------------------------------------------------------

    pub fn chamber_counts(&mut self) {
        self.count_check(
            RuleId::HouseVotingCountMismatch,
            "current House voting members",
            self.snapshot.current_house_voting(),
            self.expect.house_voting,
        );
        self.count_check(
            RuleId::HouseTotalCountMismatch,
            "current House members",
            self.snapshot.current_house_total(),
            self.expect.house_total,
        );
        self.count_check(
            RuleId::SenateCountMismatch,
            "current senators",
            self.snapshot.current_senators(),
            self.expect.senate,
        );
    }

    pub fn district_ranges(&mut self) {
        let mut bad_voting = Vec::new();
        let mut bad_delegate = Vec::new();
        let mut senators_with_district = Vec::new();

        for person in self.snapshot.persons.iter().filter(|p| p.is_current) {
            match person.chamber {
                Chamber::House => {
                    if states::is_territory(&person.state) {
                        if person.district.unwrap_or(0) != 0 {
                            bad_delegate.push(EntityRef::Person { id: person.id });
                        }
                    } else if person.district.map_or(true, |d| d == 0 || d > 53) {
                        bad_voting.push(EntityRef::Person { id: person.id });
                    }
                }
                Chamber::Senate => {
                    if person.district.is_some() {
                        senators_with_district.push(EntityRef::Person { id: person.id });
                    }
                }
                Chamber::Joint => {}
            }
        }

        for (rule, offenders, detail) in [
            (RuleId::HouseVotingDistrictRange, bad_voting, "voting seats without district >= 1"),
            (RuleId::DelegateDistrictRange, bad_delegate, "delegates with a voting district"),
            (RuleId::SenatorHasDistrict, senators_with_district, "senators carrying a district"),
        ] {
            if offenders.is_empty() {
                self.pass(rule, "none");
            } else {
                self.record(
                    rule,
                    RuleStatus::Fail,
                    format!("{} {detail}", offenders.len()),
                    offenders,
                );
            }
        }
    }

    pub fn committee_structure(&mut self) {
        let by_id: BTreeMap<CommitteeId, &capitol_model::Committee> =
            self.snapshot.committees.iter().map(|c| (c.id, c)).collect();

        let mut chamber_mismatch = Vec::new();
        let mut cycles = Vec::new();
        for committee in &self.snapshot.committees {
            if let Some(parent_id) = committee.parent_id {
                if let Some(parent) = by_id.get(&parent_id) {
                    // Joint-chamber parents may hold per-chamber task
                    // forces; everything else must match exactly.
                    if parent.chamber != committee.chamber && parent.chamber != Chamber::Joint {
                        chamber_mismatch.push(EntityRef::Committee { id: committee.id });
                    }
                }
            }

            // Walk upward; a revisit of this id is a cycle.
            let mut seen = BTreeSet::from([committee.id]);
            let mut cursor = committee.parent_id;
            while let Some(id) = cursor {
                if !seen.insert(id) {
                    cycles.push(EntityRef::Committee { id: committee.id });
                    break;
                }
                cursor = by_id.get(&id).and_then(|c| c.parent_id);
            }
        }

        if chamber_mismatch.is_empty() {
            self.pass(RuleId::SubcommitteeChamberMismatch, "none");
        } else {
            self.record(
                RuleId::SubcommitteeChamberMismatch,
                RuleStatus::Fail,
                format!("{} subcommittees differ from their parent's chamber", chamber_mismatch.len()),
                chamber_mismatch,
            );
        }
        if cycles.is_empty() {
            self.pass(RuleId::CommitteeParentCycle, "parent relation is acyclic");
        } else {
            self.record(
                RuleId::CommitteeParentCycle,
                RuleStatus::Fail,
                format!("{} committees sit on a parent cycle", cycles.len()),
                cycles,
            );
        }
    }

    pub fn membership_references(&mut self) {
        let persons: BTreeMap<PersonId, bool> =
            self.snapshot.persons.iter().map(|p| (p.id, p.is_current)).collect();
        let committees: BTreeMap<CommitteeId, bool> =
            self.snapshot.committees.iter().map(|c| (c.id, c.is_current)).collect();

        let mut dangling = Vec::new();
        for m in self.snapshot.memberships.iter().filter(|m| m.is_current) {
            let person_ok = persons.get(&m.person_id).copied().unwrap_or(false);
            let committee_ok = committees.get(&m.committee_id).copied().unwrap_or(false);
            if !person_ok || !committee_ok {
                dangling.push(EntityRef::Membership {
                    person_id: m.person_id,
                    committee_id: m.committee_id,
                });
            }
        }
        if dangling.is_empty() {
            self.pass(RuleId::MembershipDanglingReference, "none");
        } else {
            self.record(
                RuleId::MembershipDanglingReference,
                RuleStatus::Fail,
                format!("{} memberships reference a missing or non-current entity", dangling.len()),
                dangling,
            );
        }
    }

    // ------------------------------------------------------------------
    // Tier 2
    // ------------------------------------------------------------------

    pub fn major_committees_present(&mut self) {
        let mut missing = Vec::new();
        for (chamber, allow_list) in [
            (Chamber::House, HOUSE_STANDING.as_slice()),
            (Chamber::Senate, SENATE_STANDING.as_slice()),
        ] {
            for name in allow_list {
                let wanted = normalize_name(name);
                let found = self.snapshot.committees.iter().any(|c| {
                    c.is_current && c.chamber == chamber && normalize_name(&c.name) == wanted
                });
                if !found {
                    missing.push(format!("{chamber}: {name}"));
                }
            }
        }
        if missing.is_empty() {
            self.pass(RuleId::MajorCommitteeMissing, "all standing committees present");
        } else {
            self.record(
                RuleId::MajorCommitteeMissing,
                RuleStatus::Warn,
                format!("missing: {}", missing.join("; ")),
                Vec::new(),
            );
        }
    }

    pub fn leadership_rules(&mut self) {
        let mut chair_not_singular = Vec::new();
        let mut ranking_not_singular = Vec::new();
        let mut chair_party = Vec::new();
        let mut ranking_party = Vec::new();

        for committee in
            self.snapshot.committees.iter().filter(|c| c.is_current && c.is_standing())
        {
            let leaders = |position: Position| {
                self.snapshot
                    .memberships_of(committee.id)
                    .filter(|m| m.is_current && m.position == position)
                    .collect::<Vec<_>>()
            };

            let chairs = leaders(Position::Chair);
            if chairs.len() != 1 {
                chair_not_singular.push(EntityRef::Committee { id: committee.id });
            }
            let rankings = leaders(Position::RankingMember);
            if rankings.len() != 1 {
                ranking_not_singular.push(EntityRef::Committee { id: committee.id });
            }

            let majority = self.snapshot.party_control.majority(committee.chamber);
            let minority = self.snapshot.party_control.minority(committee.chamber);
            for chair in &chairs {
                if let Some(person) = self.snapshot.person(chair.person_id) {
                    if person.party != majority {
                        chair_party.push(EntityRef::Membership {
                            person_id: chair.person_id,
                            committee_id: committee.id,
                        });
                    }
                }
            }
            for ranking in &rankings {
                if let Some(person) = self.snapshot.person(ranking.person_id) {
                    if person.party != minority {
                        ranking_party.push(EntityRef::Membership {
                            person_id: ranking.person_id,
                            committee_id: committee.id,
                        });
                    }
                }
            }
        }

        for (rule, offenders, detail) in [
            (RuleId::ChairNotSingular, chair_not_singular, "standing committees without exactly one Chair"),
            (RuleId::RankingMemberNotSingular, ranking_not_singular, "standing committees without exactly one Ranking Member"),
            (RuleId::ChairPartyNotMajority, chair_party, "Chairs outside the chamber majority"),
            (RuleId::RankingMemberPartyNotMinority, ranking_party, "Ranking Members outside the chamber minority"),
        ] {
            if offenders.is_empty() {
                self.pass(rule, "none");
            } else {
                self.record(rule, RuleStatus::Warn, format!("{} {detail}", offenders.len()), offenders);
            }
        }
    }

    pub fn single_standing_chair_per_person(&mut self) {
        let standing: BTreeSet<CommitteeId> = self
            .snapshot
            .committees
            .iter()
            .filter(|c| c.is_current && c.is_standing())
            .map(|c| c.id)
            .collect();
        let mut chairs_per_person: BTreeMap<PersonId, usize> = BTreeMap::new();
        for m in self.snapshot.memberships.iter().filter(|m| {
            m.is_current && m.position == Position::Chair && standing.contains(&m.committee_id)
        }) {
            *chairs_per_person.entry(m.person_id).or_default() += 1;
        }
        let offenders: Vec<EntityRef> = chairs_per_person
            .iter()
            .filter(|(_, n)| **n > 1)
            .map(|(id, _)| EntityRef::Person { id: *id })
            .collect();
        if offenders.is_empty() {
            self.pass(RuleId::MultipleStandingChairs, "none");
        } else {
            self.record(
                RuleId::MultipleStandingChairs,
                RuleStatus::Warn,
                format!("{} people chair more than one standing committee", offenders.len()),
                offenders,
            );
        }
    }

    pub fn senate_term_classes(&mut self) {
        let senators: Vec<_> = self
            .snapshot
            .persons
            .iter()
            .filter(|p| p.is_current && p.is_regular_senator())
            .collect();
        if senators.is_empty() {
            self.pass(RuleId::SenateTermClassSkew, "no senators to classify");
            return;
        }

        let unclassified: Vec<EntityRef> = senators
            .iter()
            .filter(|p| p.term_class.is_none())
            .map(|p| EntityRef::Person { id: p.id })
            .collect();
        let mut per_class = [0usize; 3];
        for senator in &senators {
            if let Some(class) = senator.term_class {
                per_class[class as usize] += 1;
            }
        }
        let third = senators.len() as f64 / 3.0;
        let skewed = per_class.iter().any(|n| (*n as f64 - third).abs() > 3.0);

        if unclassified.is_empty() && !skewed {
            self.pass(
                RuleId::SenateTermClassSkew,
                format!("classes {}/{}/{}", per_class[0], per_class[1], per_class[2]),
            );
        } else {
            self.record(
                RuleId::SenateTermClassSkew,
                RuleStatus::Warn,
                format!(
                    "{} unclassified; classes {}/{}/{}",
                    unclassified.len(),
                    per_class[0],
                    per_class[1],
                    per_class[2]
                ),
                unclassified,
            );
        }
    }

    // ------------------------------------------------------------------
    // Tier 3
    // ------------------------------------------------------------------

    pub fn coverage(&mut self) -> Coverage {
        let current: Vec<_> = self.snapshot.persons.iter().filter(|p| p.is_current).collect();
        let assignments: BTreeMap<PersonId, usize> = self
            .snapshot
            .memberships
            .iter()
            .filter(|m| m.is_current)
            .fold(BTreeMap::new(), |mut acc, m| {
                *acc.entry(m.person_id).or_default() += 1;
                acc
            });

        let frac = |num: usize, den: usize| {
            if den == 0 {
                1.0
            } else {
                num as f64 / den as f64
            }
        };
        let avg = |chamber: Chamber| {
            let members: Vec<_> = current.iter().filter(|p| p.chamber == chamber).collect();
            if members.is_empty() {
                return 0.0;
            }
            let total: usize =
                members.iter().map(|p| assignments.get(&p.id).copied().unwrap_or(0)).sum();
            total as f64 / members.len() as f64
        };

        let with_committee =
            current.iter().filter(|p| assignments.contains_key(&p.id)).count();
        let subcommittees: Vec<_> = self
            .snapshot
            .committees
            .iter()
            .filter(|c| c.is_current && c.is_subcommittee())
            .collect();
        let with_parent = subcommittees.iter().filter(|c| c.parent_id.is_some()).count();

        let coverage = Coverage {
            members_with_committee: frac(with_committee, current.len()),
            avg_committees_per_house_member: avg(Chamber::House),
            avg_committees_per_senator: avg(Chamber::Senate),
            subcommittees_with_parent: frac(with_parent, subcommittees.len()),
        };

        self.pass(
            RuleId::MemberCommitteeCoverage,
            format!("{:.0}% of members hold an assignment", coverage.members_with_committee * 100.0),
        );
        self.pass(
            RuleId::CommitteesPerMember,
            format!(
                "House {:.1}, Senate {:.1}",
                coverage.avg_committees_per_house_member, coverage.avg_committees_per_senator
            ),
        );
        self.pass(
            RuleId::SubcommitteeParentCoverage,
            format!("{:.0}% of subcommittees have a parent", coverage.subcommittees_with_parent * 100.0),
        );

        coverage
    }
}
