//! End-to-end engine runs over fabricated multi-source record sets.

use capitol_model::{
    Chamber, CommitteeKey, CommitteeRecord, CommitteeType, ConflictKind, Party, PersonKey,
    PersonRecord, Position, MembershipRecord, Source, SourceSet,
};
use capitol_recon::{run, ReconcileConfig};
use chrono::{NaiveDate, Utc};

fn config() -> ReconcileConfig {
    ReconcileConfig::from_toml(
        r#"
        congress_number = 119
        majority_party_house = "republican"
        majority_party_senate = "republican"
        "#,
    )
    .unwrap()
}

fn person(
    source: Source,
    bioguide: Option<&str>,
    first: &str,
    last: &str,
    party: Party,
    chamber: Chamber,
    state: &str,
    district: Option<u16>,
) -> PersonRecord {
    PersonRecord {
        source,
        fetched_at: Utc::now(),
        bioguide_id: bioguide.map(str::to_string),
        first_name: first.into(),
        middle_name: None,
        last_name: last.into(),
        suffix: None,
        nickname: None,
        party,
        chamber,
        state: state.into(),
        district,
        term_start: NaiveDate::from_ymd_opt(2025, 1, 3),
        term_end: NaiveDate::from_ymd_opt(2027, 1, 3),
        photo_url: None,
        raw: serde_json::Value::Null,
    }
}

fn committee(
    source: Source,
    code: Option<&str>,
    name: &str,
    chamber: Chamber,
    committee_type: CommitteeType,
    parent_code: Option<&str>,
) -> CommitteeRecord {
    CommitteeRecord {
        source,
        fetched_at: Utc::now(),
        system_code: code.map(str::to_string),
        name: name.into(),
        chamber,
        committee_type,
        parent_code: parent_code.map(str::to_string),
        parent_name: None,
        jurisdiction: None,
        url: None,
        raw: serde_json::Value::Null,
    }
}

fn roster_row(
    source: Source,
    name: &str,
    party: Party,
    state: &str,
    committee: &str,
    chamber: Chamber,
    position: Position,
) -> MembershipRecord {
    MembershipRecord {
        source,
        fetched_at: Utc::now(),
        person: PersonKey {
            bioguide_id: None,
            full_name: name.into(),
            party: Some(party),
            state: Some(state.into()),
            chamber: Some(chamber),
        },
        committee: CommitteeKey { system_code: None, name: committee.into(), chamber },
        position,
        raw: serde_json::Value::Null,
    }
}

fn base_set() -> SourceSet {
    let mut set = SourceSet::default();
    set.committees.push(committee(
        Source::CongressGov,
        Some("ssju00"),
        "Committee on the Judiciary",
        Chamber::Senate,
        CommitteeType::Standing,
        None,
    ));
    set
}

#[test]
fn empty_person_set_is_irreconcilable() {
    let set = base_set();
    let err = run(&config(), &set, "run-0").unwrap_err();
    assert!(err.to_string().contains("no person records"));
}

#[test]
fn leadership_swap_prefers_the_leadership_source() {
    let mut set = base_set();
    set.persons.push(person(
        Source::CongressGov,
        Some("A000001"),
        "Alice",
        "Former",
        Party::Democratic,
        Chamber::Senate,
        "CA",
        None,
    ));
    set.persons.push(person(
        Source::CongressGov,
        Some("B000002"),
        "Bob",
        "Incoming",
        Party::Republican,
        Chamber::Senate,
        "TX",
        None,
    ));
    // Roster still lists the old chair; Wikipedia has the new one and
    // the roster corroborates Bob as plain member.
    set.memberships.push(roster_row(
        Source::ChamberSite,
        "Alice Former",
        Party::Democratic,
        "CA",
        "Committee on the Judiciary",
        Chamber::Senate,
        Position::Chair,
    ));
    set.memberships.push(roster_row(
        Source::ChamberSite,
        "Bob Incoming",
        Party::Republican,
        "TX",
        "Committee on the Judiciary",
        Chamber::Senate,
        Position::Member,
    ));
    set.memberships.push(roster_row(
        Source::Wikipedia,
        "Bob Incoming",
        Party::Republican,
        "TX",
        "Committee on the Judiciary",
        Chamber::Senate,
        Position::Chair,
    ));

    let snapshot = run(&config(), &set, "run-1").unwrap();
    let chairs: Vec<_> = snapshot
        .memberships
        .iter()
        .filter(|m| m.position == Position::Chair)
        .collect();
    assert_eq!(chairs.len(), 1);
    let chair_person = snapshot.person(chairs[0].person_id).unwrap();
    assert_eq!(chair_person.last_name, "Incoming");
    assert_eq!(chair_person.party, snapshot.party_control.majority(Chamber::Senate));
    assert!(snapshot.conflicts.iter().any(|c| c.kind == ConflictKind::LeadershipOverride));
    // The displaced chair stays on the committee as a member.
    let alice = snapshot.persons.iter().find(|p| p.last_name == "Former").unwrap();
    assert!(snapshot
        .memberships
        .iter()
        .any(|m| m.person_id == alice.id && m.position == Position::Member));
}

#[test]
fn chamber_transition_resolves_to_newest_term() {
    let mut set = base_set();
    let mut senate = person(
        Source::CongressGov,
        Some("P000100"),
        "Pat",
        "Mover",
        Party::Republican,
        Chamber::Senate,
        "OH",
        None,
    );
    senate.term_start = NaiveDate::from_ymd_opt(2025, 1, 3);
    let mut house = person(
        Source::Wikipedia,
        Some("P000100"),
        "Pat",
        "Mover",
        Party::Republican,
        Chamber::House,
        "OH",
        Some(4),
    );
    house.term_start = NaiveDate::from_ymd_opt(2019, 1, 3);
    set.persons.push(senate);
    set.persons.push(house);

    let snapshot = run(&config(), &set, "run-2").unwrap();
    assert_eq!(snapshot.persons.len(), 1);
    let mover = &snapshot.persons[0];
    assert_eq!(mover.chamber, Chamber::Senate);
    assert_eq!(mover.district, None);
    assert!(snapshot.conflicts.iter().any(|c| c.kind == ConflictKind::ChamberTransition));
    assert_eq!(snapshot.current_senators(), 1);
    assert_eq!(snapshot.current_house_total(), 0);
}

#[test]
fn nonvoting_delegates_count_in_total_not_voting() {
    let mut set = base_set();
    for (i, territory) in ["AS", "DC", "GU", "MP", "PR", "VI"].iter().enumerate() {
        set.persons.push(person(
            Source::CongressGov,
            None,
            "Delegate",
            &format!("From{territory}"),
            Party::Democratic,
            Chamber::House,
            territory,
            None,
        ));
        let _ = i;
    }
    set.persons.push(person(
        Source::CongressGov,
        None,
        "Voting",
        "Representative",
        Party::Republican,
        Chamber::House,
        "OH",
        Some(4),
    ));

    let snapshot = run(&config(), &set, "run-3").unwrap();
    assert_eq!(snapshot.current_house_total(), 7);
    assert_eq!(snapshot.current_house_voting(), 1);
}

#[test]
fn nickname_duplicate_collapses_to_one_senator() {
    let mut set = base_set();
    set.persons.push(person(
        Source::CongressGov,
        Some("D000563"),
        "Richard",
        "Durbin",
        Party::Democratic,
        Chamber::Senate,
        "IL",
        None,
    ));
    set.persons.push(person(
        Source::ChamberSite,
        None,
        "Dick",
        "Durbin",
        Party::Democratic,
        Chamber::Senate,
        "IL",
        None,
    ));

    let snapshot = run(&config(), &set, "run-4").unwrap();
    assert_eq!(snapshot.persons.len(), 1);
    let durbin = &snapshot.persons[0];
    assert_eq!(durbin.first_name, "Richard");
    assert_eq!(durbin.nickname.as_deref(), Some("Dick"));
    assert_eq!(snapshot.current_senators(), 1);
}

#[test]
fn orphan_subcommittee_publishes_without_parent() {
    let mut set = base_set();
    set.persons.push(person(
        Source::CongressGov,
        None,
        "Some",
        "Member",
        Party::Republican,
        Chamber::Senate,
        "UT",
        None,
    ));
    set.committees.push(committee(
        Source::CongressGov,
        Some("ssju99"),
        "Subcommittee on Lost Causes",
        Chamber::Senate,
        CommitteeType::Subcommittee,
        Some("ssxx00"),
    ));

    let snapshot = run(&config(), &set, "run-5").unwrap();
    let orphan = snapshot
        .committees
        .iter()
        .find(|c| c.committee_type == CommitteeType::Subcommittee)
        .unwrap();
    assert_eq!(orphan.parent_id, None);
    assert!(snapshot.conflicts.iter().any(|c| c.kind == ConflictKind::OrphanSubcommittee));
}

#[test]
fn adapter_interleaving_does_not_change_the_snapshot() {
    let build = |swap: bool| {
        let mut set = base_set();
        let mut people = vec![
            person(
                Source::CongressGov,
                Some("D000563"),
                "Richard",
                "Durbin",
                Party::Democratic,
                Chamber::Senate,
                "IL",
                None,
            ),
            person(
                Source::CongressGov,
                Some("G000386"),
                "Chuck",
                "Grassley",
                Party::Republican,
                Chamber::Senate,
                "IA",
                None,
            ),
        ];
        if swap {
            people.reverse();
        }
        set.persons.extend(people);
        run(&config(), &set, "run-6").unwrap()
    };

    let a = build(false);
    let b = build(true);
    let names = |s: &capitol_model::Snapshot| {
        let mut v: Vec<String> =
            s.persons.iter().map(|p| format!("{} {}", p.first_name, p.last_name)).collect();
        v.sort();
        v
    };
    assert_eq!(names(&a), names(&b));
    assert_eq!(a.party_control, b.party_control);
}
