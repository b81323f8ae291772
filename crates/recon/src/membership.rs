//! Membership-set construction: one roster source per committee,
//! unioned with the others, with leadership settled by its own
//! priority order.

use std::collections::BTreeMap;

use capitol_identity::{CommitteeResolver, PersonResolver};
use capitol_model::{
    Committee, CommitteeId, ConflictKind, ConflictRecord, EntityRef, Membership,
    MembershipRecord, PersonId, Position, Source,
};
use tracing::{debug, warn};

use crate::priority::SourcePriorities;

#[derive(Debug, Clone, Copy)]
struct Row {
    person: PersonId,
    position: Position,
    source: Source,
}

/// Builds the full Membership set from the resolved roster and
/// leadership records. Rows whose person or committee resolves in no
/// source are dropped with a conflict; they cannot reference entities
/// the snapshot does not have.
pub fn build(
    records: &[MembershipRecord],
    persons: &PersonResolver,
    committees: &CommitteeResolver,
    committee_rows: &[Committee],
    priorities: &SourcePriorities,
    conflicts: &mut Vec<ConflictRecord>,
) -> Vec<Membership> {
    let mut by_committee: BTreeMap<CommitteeId, Vec<Row>> = BTreeMap::new();

    for rec in records {
        let Some(committee_id) = committees.lookup(&rec.committee) else {
            warn!(committee = %rec.committee.name, source = %rec.source, "roster row names unknown committee, dropping");
            continue;
        };
        let Some(person_id) = persons.lookup(&rec.person) else {
            conflicts.push(
                ConflictRecord::new(
                    ConflictKind::DisputedRoster,
                    EntityRef::Committee { id: committee_id },
                    "roster",
                )
                .value(rec.source, rec.person.full_name.clone())
                .because("roster names a person no source record resolves"),
            );
            continue;
        };
        by_committee.entry(committee_id).or_default().push(Row {
            person: person_id,
            position: rec.position,
            source: rec.source,
        });
    }

    let mut memberships = Vec::new();
    for (&committee_id, rows) in &by_committee {
        memberships.extend(build_committee(committee_id, rows, priorities, conflicts));
    }

    // Current standing committees no source supplied a roster for.
    for committee in committee_rows {
        if committee.is_current
            && committee.is_standing()
            && !by_committee.contains_key(&committee.id)
        {
            conflicts.push(
                ConflictRecord::new(
                    ConflictKind::MissingRoster,
                    EntityRef::Committee { id: committee.id },
                    "roster",
                )
                .because("no source supplied any roster row"),
            );
        }
    }

    memberships
}

fn build_committee(
    committee_id: CommitteeId,
    rows: &[Row],
    priorities: &SourcePriorities,
    conflicts: &mut Vec<ConflictRecord>,
) -> Vec<Membership> {
    let roster_order = priorities.order("membership.roster");
    let roster_source =
        roster_order.iter().copied().find(|s| rows.iter().any(|r| r.source == *s));

    let mut members: BTreeMap<PersonId, Membership> = BTreeMap::new();

    // Base roster from the chosen source, positions as stated.
    if let Some(roster_source) = roster_source {
        for row in rows.iter().filter(|r| r.source == roster_source) {
            let member = members.entry(row.person).or_insert_with(|| {
                Membership::new(row.person, committee_id, Position::Member)
                    .with_source(roster_source)
            });
            if row.position != Position::Member {
                member.position = row.position;
            }
        }
    }

    // Union the other sources. A plain-member row the chosen roster
    // does not corroborate enters disputed, with provenance.
    for row in rows.iter().filter(|r| Some(r.source) != roster_source) {
        match members.get_mut(&row.person) {
            Some(member) => {
                if !member.sources.contains(&row.source) {
                    member.sources.push(row.source);
                }
            }
            None => {
                let mut member = Membership::new(row.person, committee_id, Position::Member)
                    .with_source(row.source);
                if row.position == Position::Member && roster_source.is_some() {
                    member.disputed = true;
                    conflicts.push(
                        ConflictRecord::new(
                            ConflictKind::DisputedRoster,
                            EntityRef::Membership { person_id: row.person, committee_id },
                            "roster",
                        )
                        .value(row.source, "member")
                        .because("only one source attests this roster row"),
                    );
                }
                members.insert(row.person, member);
            }
        }
    }

    // Leadership: exactly one winner per position, by the leadership
    // order. Roster-stated leaders the winner displaces drop to
    // Member.
    let lead_order = priorities.order("membership.position");
    for position in [Position::Chair, Position::RankingMember, Position::ViceChair] {
        let mut claimants: Vec<&Row> = rows.iter().filter(|r| r.position == position).collect();
        if claimants.is_empty() {
            continue;
        }
        claimants.sort_by_key(|r| {
            (
                lead_order.iter().position(|s| *s == r.source).unwrap_or(usize::MAX),
                r.person,
            )
        });
        let winner = claimants[0];

        let entry = members.entry(winner.person).or_insert_with(|| {
            Membership::new(winner.person, committee_id, position).with_source(winner.source)
        });
        entry.position = position;
        if !entry.sources.contains(&winner.source) {
            entry.sources.push(winner.source);
        }

        for loser in claimants.iter().filter(|r| r.person != winner.person) {
            let Some(member) = members.get_mut(&loser.person) else { continue };
            if member.position != position {
                continue;
            }
            member.position = Position::Member;
            conflicts.push(
                ConflictRecord::new(
                    ConflictKind::LeadershipOverride,
                    EntityRef::Membership { person_id: loser.person, committee_id },
                    "position",
                )
                .value(loser.source, position.to_string())
                .value(winner.source, position.to_string())
                .chose(format!("person {} per {}", winner.person, winner.source))
                .because("leadership source outranks the roster-stated leader"),
            );
            debug!(committee = committee_id, demoted = loser.person, winner = winner.person, %position, "leadership override");
        }
    }

    members.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use capitol_model::{Chamber, CommitteeKey, CommitteeRecord, CommitteeType, Party, PersonKey, PersonRecord};
    use chrono::Utc;

    fn person_record(source: Source, first: &str, last: &str, state: &str) -> PersonRecord {
        PersonRecord {
            source,
            fetched_at: Utc::now(),
            bioguide_id: None,
            first_name: first.into(),
            middle_name: None,
            last_name: last.into(),
            suffix: None,
            nickname: None,
            party: Party::Republican,
            chamber: Chamber::Senate,
            state: state.into(),
            district: None,
            term_start: None,
            term_end: None,
            photo_url: None,
            raw: serde_json::Value::Null,
        }
    }

    fn committee_record(name: &str) -> CommitteeRecord {
        CommitteeRecord {
            source: Source::CongressGov,
            fetched_at: Utc::now(),
            system_code: Some("ssju00".into()),
            name: name.into(),
            chamber: Chamber::Senate,
            committee_type: CommitteeType::Standing,
            parent_code: None,
            parent_name: None,
            jurisdiction: None,
            url: None,
            raw: serde_json::Value::Null,
        }
    }

    fn membership_record(source: Source, name: &str, position: Position) -> MembershipRecord {
        MembershipRecord {
            source,
            fetched_at: Utc::now(),
            person: PersonKey {
                bioguide_id: None,
                full_name: name.into(),
                party: Some(Party::Republican),
                state: None,
                chamber: Some(Chamber::Senate),
            },
            committee: CommitteeKey {
                system_code: None,
                name: "Committee on the Judiciary".into(),
                chamber: Chamber::Senate,
            },
            position,
            raw: serde_json::Value::Null,
        }
    }

    fn resolvers() -> (PersonResolver, CommitteeResolver) {
        let mut persons = PersonResolver::new();
        persons.resolve(&person_record(Source::CongressGov, "Chuck", "Grassley", "IA"));
        persons.resolve(&person_record(Source::CongressGov, "Lindsey", "Graham", "SC"));
        let mut committees = CommitteeResolver::new();
        committees.resolve(&committee_record("Committee on the Judiciary"));
        (persons, committees)
    }

    #[test]
    fn leadership_source_overrides_roster_chair() {
        let (persons, committees) = resolvers();
        let records = vec![
            // Chamber roster says Graham chairs; Wikipedia says Grassley.
            membership_record(Source::ChamberSite, "Lindsey Graham", Position::Chair),
            membership_record(Source::ChamberSite, "Chuck Grassley", Position::Member),
            membership_record(Source::Wikipedia, "Chuck Grassley", Position::Chair),
        ];
        let mut conflicts = Vec::new();
        let memberships = build(
            &records,
            &persons,
            &committees,
            &[],
            &SourcePriorities::default(),
            &mut conflicts,
        );

        let grassley = persons.lookup(&records[1].person).unwrap();
        let graham = persons.lookup(&records[0].person).unwrap();
        let chair: Vec<_> =
            memberships.iter().filter(|m| m.position == Position::Chair).collect();
        assert_eq!(chair.len(), 1);
        assert_eq!(chair[0].person_id, grassley);
        assert!(memberships
            .iter()
            .any(|m| m.person_id == graham && m.position == Position::Member));
        assert!(conflicts.iter().any(|c| c.kind == ConflictKind::LeadershipOverride));
    }

    #[test]
    fn uncorroborated_member_row_is_disputed() {
        let (persons, committees) = resolvers();
        let records = vec![
            membership_record(Source::ChamberSite, "Chuck Grassley", Position::Member),
            membership_record(Source::CongressGov, "Lindsey Graham", Position::Member),
        ];
        let mut conflicts = Vec::new();
        let memberships = build(
            &records,
            &persons,
            &committees,
            &[],
            &SourcePriorities::default(),
            &mut conflicts,
        );
        let graham = persons.lookup(&records[1].person).unwrap();
        let disputed: Vec<_> = memberships.iter().filter(|m| m.disputed).collect();
        assert_eq!(disputed.len(), 1);
        assert_eq!(disputed[0].person_id, graham);
        assert!(conflicts.iter().any(|c| c.kind == ConflictKind::DisputedRoster));
    }

    #[test]
    fn unresolvable_person_row_is_dropped_with_conflict() {
        let (persons, committees) = resolvers();
        let records =
            vec![membership_record(Source::ChamberSite, "Nobody Atall", Position::Member)];
        let mut conflicts = Vec::new();
        let memberships = build(
            &records,
            &persons,
            &committees,
            &[],
            &SourcePriorities::default(),
            &mut conflicts,
        );
        assert!(memberships.is_empty());
        assert!(conflicts.iter().any(|c| c.kind == ConflictKind::DisputedRoster));
    }

    #[test]
    fn standing_committee_without_roster_gets_missing_roster() {
        let (persons, committees) = resolvers();
        let committee_rows = vec![Committee {
            id: 1,
            system_code: Some("ssju00".into()),
            name: "Committee on the Judiciary".into(),
            chamber: Chamber::Senate,
            committee_type: CommitteeType::Standing,
            parent_id: None,
            is_current: true,
            jurisdiction: None,
            url: None,
            status: capitol_model::EntityStatus::Proposed,
        }];
        let mut conflicts = Vec::new();
        let memberships = build(
            &[],
            &persons,
            &committees,
            &committee_rows,
            &SourcePriorities::default(),
            &mut conflicts,
        );
        assert!(memberships.is_empty());
        assert!(conflicts.iter().any(|c| c.kind == ConflictKind::MissingRoster));
    }
}
