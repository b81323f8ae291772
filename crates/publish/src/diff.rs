//! Pure change report: the previously served snapshot against the new
//! one, keyed by natural identity rather than surrogate ids.

use std::collections::BTreeMap;

use capitol_model::{Position, Snapshot};
use serde::{Deserialize, Serialize};

/// What the database served before this run, reduced to the fields the
/// diff keys on.
#[derive(Debug, Clone, Default)]
pub struct PrevState {
    pub persons: Vec<PrevPerson>,
    pub committees: Vec<PrevCommittee>,
    pub leadership: Vec<PrevLeader>,
}

#[derive(Debug, Clone)]
pub struct PrevPerson {
    pub bioguide_id: Option<String>,
    pub full_name: String,
    pub chamber: String,
}

#[derive(Debug, Clone)]
pub struct PrevCommittee {
    pub name: String,
    pub chamber: String,
}

#[derive(Debug, Clone)]
pub struct PrevLeader {
    pub committee_name: String,
    pub position: String,
    pub person_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChamberTransition {
    pub person: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadershipChange {
    pub committee: String,
    pub position: String,
    pub from: Option<String>,
    pub to: String,
}

/// Persisted as a JSON artifact alongside the publish-log row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeReport {
    pub new_persons: Vec<String>,
    pub removed_persons: Vec<String>,
    pub chamber_transitions: Vec<ChamberTransition>,
    pub committee_additions: Vec<String>,
    pub committee_removals: Vec<String>,
    pub leadership_changes: Vec<LeadershipChange>,
}

impl ChangeReport {
    pub fn is_empty(&self) -> bool {
        self.new_persons.is_empty()
            && self.removed_persons.is_empty()
            && self.chamber_transitions.is_empty()
            && self.committee_additions.is_empty()
            && self.committee_removals.is_empty()
            && self.leadership_changes.is_empty()
    }
}

fn person_key(bioguide: Option<&str>, name: &str) -> String {
    match bioguide {
        Some(b) => format!("bioguide:{b}"),
        None => format!("name:{}", name.to_lowercase()),
    }
}

pub fn diff(prev: &PrevState, snapshot: &Snapshot) -> ChangeReport {
    let mut report = ChangeReport::default();

    // Persons, keyed by bioguide id when present.
    let prev_persons: BTreeMap<String, &PrevPerson> = prev
        .persons
        .iter()
        .map(|p| (person_key(p.bioguide_id.as_deref(), &p.full_name), p))
        .collect();
    let mut seen = BTreeMap::new();
    for person in snapshot.persons.iter().filter(|p| p.is_current) {
        let key = person_key(person.bioguide_id.as_deref(), &person.full_name());
        match prev_persons.get(&key) {
            None => report.new_persons.push(person.full_name()),
            Some(old) => {
                let chamber = person.chamber.to_string();
                if old.chamber != chamber {
                    report.chamber_transitions.push(ChamberTransition {
                        person: person.full_name(),
                        from: old.chamber.clone(),
                        to: chamber,
                    });
                }
            }
        }
        seen.insert(key, ());
    }
    for (key, old) in &prev_persons {
        if !seen.contains_key(key) {
            report.removed_persons.push(old.full_name.clone());
        }
    }

    // Committees, keyed by (name, chamber).
    let committee_key = |name: &str, chamber: &str| format!("{chamber}:{}", name.to_lowercase());
    let prev_committees: BTreeMap<String, &PrevCommittee> =
        prev.committees.iter().map(|c| (committee_key(&c.name, &c.chamber), c)).collect();
    let mut seen = BTreeMap::new();
    for committee in snapshot.committees.iter().filter(|c| c.is_current) {
        let key = committee_key(&committee.name, &committee.chamber.to_string());
        if !prev_committees.contains_key(&key) {
            report.committee_additions.push(committee.name.clone());
        }
        seen.insert(key, ());
    }
    for (key, old) in &prev_committees {
        if !seen.contains_key(key) {
            report.committee_removals.push(old.name.clone());
        }
    }

    // Leadership, keyed by (committee, position).
    let prev_leaders: BTreeMap<(String, String), &str> = prev
        .leadership
        .iter()
        .map(|l| {
            ((l.committee_name.to_lowercase(), l.position.clone()), l.person_name.as_str())
        })
        .collect();
    for membership in snapshot
        .memberships
        .iter()
        .filter(|m| m.is_current && matches!(m.position, Position::Chair | Position::RankingMember))
    {
        let Some(committee) = snapshot.committee(membership.committee_id) else { continue };
        let Some(person) = snapshot.person(membership.person_id) else { continue };
        let key = (committee.name.to_lowercase(), membership.position.to_string());
        let new_name = person.full_name();
        match prev_leaders.get(&key) {
            Some(old) if **old == *new_name => {}
            old => report.leadership_changes.push(LeadershipChange {
                committee: committee.name.clone(),
                position: membership.position.to_string(),
                from: old.map(|s| s.to_string()),
                to: new_name,
            }),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use capitol_model::{
        Chamber, Committee, CommitteeType, EntityStatus, Membership, Party, PartyControl, Person,
        SnapshotMeta,
    };
    use chrono::Utc;

    fn person(id: i64, first: &str, last: &str, chamber: Chamber) -> Person {
        Person {
            id,
            bioguide_id: Some(format!("X{id:06}")),
            first_name: first.into(),
            middle_name: None,
            last_name: last.into(),
            suffix: None,
            nickname: None,
            party: Party::Republican,
            chamber,
            state: "TX".into(),
            district: None,
            term_start: None,
            term_end: None,
            is_current: true,
            senate_role: None,
            term_class: None,
            photo_url: None,
            status: EntityStatus::Validated,
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
    fn new_and_removed_persons() {
        let prev = PrevState {
            persons: vec![PrevPerson {
                bioguide_id: Some("X000001".into()),
                full_name: "Gone Member".into(),
                chamber: "House".into(),
            }],
            ..Default::default()
        };
        let mut snap = snapshot();
        snap.persons.push(person(2, "Fresh", "Face", Chamber::House));
        let report = diff(&prev, &snap);
        assert_eq!(report.new_persons, vec!["Fresh Face"]);
        assert_eq!(report.removed_persons, vec!["Gone Member"]);
    }

    #[test]
    fn chamber_transition_detected_by_bioguide() {
        let prev = PrevState {
            persons: vec![PrevPerson {
                bioguide_id: Some("X000005".into()),
                full_name: "Pat Mover".into(),
                chamber: "House".into(),
            }],
            ..Default::default()
        };
        let mut snap = snapshot();
        snap.persons.push(person(5, "Pat", "Mover", Chamber::Senate));
        let report = diff(&prev, &snap);
        assert!(report.new_persons.is_empty());
        assert_eq!(report.chamber_transitions.len(), 1);
        assert_eq!(report.chamber_transitions[0].from, "House");
        assert_eq!(report.chamber_transitions[0].to, "Senate");
    }

    #[test]
    fn leadership_swap_is_exactly_one_change() {
        let prev = PrevState {
            persons: vec![
                PrevPerson {
                    bioguide_id: Some("X000001".into()),
                    full_name: "Alice Former".into(),
                    chamber: "Senate".into(),
                },
                PrevPerson {
                    bioguide_id: Some("X000002".into()),
                    full_name: "Bob Incoming".into(),
                    chamber: "Senate".into(),
                },
            ],
            committees: vec![PrevCommittee {
                name: "Committee on the Judiciary".into(),
                chamber: "Senate".into(),
            }],
            leadership: vec![PrevLeader {
                committee_name: "Committee on the Judiciary".into(),
                position: "Chair".into(),
                person_name: "Alice Former".into(),
            }],
        };

        let mut snap = snapshot();
        snap.persons.push(person(1, "Alice", "Former", Chamber::Senate));
        snap.persons.push(person(2, "Bob", "Incoming", Chamber::Senate));
        snap.committees.push(Committee {
            id: 10,
            system_code: None,
            name: "Committee on the Judiciary".into(),
            chamber: Chamber::Senate,
            committee_type: CommitteeType::Standing,
            parent_id: None,
            is_current: true,
            jurisdiction: None,
            url: None,
            status: EntityStatus::Validated,
        });
        snap.memberships.push(Membership::new(2, 10, Position::Chair));
        snap.memberships.push(Membership::new(1, 10, Position::Member));

        let report = diff(&prev, &snap);
        assert_eq!(report.leadership_changes.len(), 1);
        let change = &report.leadership_changes[0];
        assert_eq!(change.committee, "Committee on the Judiciary");
        assert_eq!(change.position, "Chair");
        assert_eq!(change.from.as_deref(), Some("Alice Former"));
        assert_eq!(change.to, "Bob Incoming");
    }

    #[test]
    fn identical_snapshots_diff_empty() {
        let prev = PrevState {
            persons: vec![PrevPerson {
                bioguide_id: Some("X000001".into()),
                full_name: "Same Member".into(),
                chamber: "Senate".into(),
            }],
            ..Default::default()
        };
        let mut snap = snapshot();
        snap.persons.push(person(1, "Same", "Member", Chamber::Senate));
        assert!(diff(&prev, &snap).is_empty());
    }
}
