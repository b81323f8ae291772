//! Per-attribute merging: collapse the multi-source record pile for
//! one entity into a single snapshot row.
//!
//! The rule set, in order: consult sources by the attribute's priority
//! order; inside one source prefer the newer fetch; a surviving tie
//! adopts the Congress.gov value and flags a ConflictRecord. The
//! chamber attribute alone bypasses the order when sources disagree,
//! because a mid-Congress House-to-Senate move makes the source with
//! the newest term start the only trustworthy one.

use capitol_identity::{CommitteeEntry, PersonEntry};
use capitol_model::{
    states, Chamber, Committee, CommitteeId, CommitteeRecord, ConflictKind, ConflictRecord,
    EntityRef, EntityStatus, Person, PersonRecord, Source, TermClass,
};
use chrono::Datelike;
use tracing::debug;

use crate::priority::SourcePriorities;

/// Picks one value for one attribute from the record pile. Returns the
/// value, the source it came from, and whether the pick stayed
/// contested after every tie-break.
///
/// Tie-break order: highest-priority source holding a value, then
/// values that pass the attribute's `plausible` check (a lower-priority
/// source beats a higher one whose only values cannot hold, such as a
/// district above 53 or an unknown state code), then the newest fetch
/// within the winning source.
fn choose<R, T, FV, FP, FT>(
    recs: &[&R],
    order: &[Source],
    source_of: impl Fn(&R) -> Source,
    fetched_at: FT,
    extract: FV,
    plausible: FP,
) -> Option<(T, Source, bool)>
where
    T: Clone + PartialEq,
    FV: Fn(&R) -> Option<T>,
    FP: Fn(&T) -> bool,
    FT: Fn(&R) -> chrono::DateTime<chrono::Utc>,
{
    for source in order {
        let mut candidates: Vec<(&&R, T)> = recs
            .iter()
            .filter(|r| source_of(r) == *source)
            .filter_map(|r| extract(r).filter(|v| plausible(v)).map(|v| (r, v)))
            .collect();
        if candidates.is_empty() {
            continue;
        }
        if candidates.iter().all(|(_, v)| *v == candidates[0].1) {
            return Some((candidates[0].1.clone(), *source, false));
        }
        // Same source disagrees with itself: newest fetch wins.
        candidates.sort_by_key(|(r, _)| std::cmp::Reverse(fetched_at(r)));
        let newest = fetched_at(candidates[0].0);
        let at_newest: Vec<&T> =
            candidates.iter().filter(|(r, _)| fetched_at(r) == newest).map(|(_, v)| v).collect();
        let contested = at_newest.iter().any(|v| **v != *at_newest[0]);
        return Some((at_newest[0].clone(), *source, contested));
    }
    None
}

fn push_disagreement<T: std::fmt::Display>(
    conflicts: &mut Vec<ConflictRecord>,
    entity: EntityRef,
    attribute: &str,
    recs: &[(Source, Option<T>)],
    chosen: &T,
    won: Source,
) {
    let mut conflict = ConflictRecord::new(ConflictKind::AttributeDisagreement, entity, attribute)
        .chose(chosen.to_string())
        .because(format!("tie on priority and fetch time, adopted {won} value"));
    for (source, value) in recs {
        if let Some(value) = value {
            conflict = conflict.value(*source, value.to_string());
        }
    }
    conflicts.push(conflict);
}

/// Senate classes stagger on a six-year cycle; the term-end year pins
/// the class (2031 -> I, 2027 -> II, 2029 -> III).
fn term_class_from_end(term_end: Option<chrono::NaiveDate>) -> Option<TermClass> {
    match term_end?.year().rem_euclid(6) {
        3 => Some(TermClass::I),
        5 => Some(TermClass::II),
        1 => Some(TermClass::III),
        _ => None,
    }
}

/// Merges every source record resolved to one person id into a single
/// Person. Name identity comes from the resolver entry; the remaining
/// attributes follow the priority orders.
pub fn merge_person(
    entry: &PersonEntry,
    recs: &[&PersonRecord],
    priorities: &SourcePriorities,
    conflicts: &mut Vec<ConflictRecord>,
) -> Person {
    let id = entry.id;
    let entity = EntityRef::Person { id };
    let fetched = |r: &PersonRecord| r.fetched_at;

    // Chamber-transition rule: distinct chambers across sources defer
    // to the record with the newest term start.
    let chambers: Vec<Chamber> = {
        let mut seen: Vec<Chamber> = recs.iter().map(|r| r.chamber).collect();
        seen.sort();
        seen.dedup();
        seen
    };
    let chamber = if chambers.len() > 1 {
        let winner = recs
            .iter()
            .max_by_key(|r| (r.term_start, r.source == Source::CongressGov))
            .map(|r| r.chamber)
            .unwrap_or(entry.chamber);
        let prior = chambers.iter().find(|c| **c != winner).copied().unwrap_or(winner);
        let mut conflict =
            ConflictRecord::new(ConflictKind::ChamberTransition, entity.clone(), "chamber")
                .chose(winner.to_string())
                .because(format!("newest term start wins; prior chamber {prior}"));
        for r in recs {
            conflict = conflict.value(r.source, r.chamber.to_string());
        }
        conflicts.push(conflict);
        debug!(person = id, %winner, %prior, "chamber transition resolved");
        winner
    } else {
        choose(
            recs,
            priorities.order("person.chamber"),
            |r| r.source,
            fetched,
            |r| Some(r.chamber),
            |_| true,
        )
        .map(|(v, _, _)| v)
        .unwrap_or(entry.chamber)
    };

    // The chamber winner also scopes which records may speak for the
    // chamber-dependent attributes (district, term dates).
    let in_chamber: Vec<&PersonRecord> =
        recs.iter().copied().filter(|r| r.chamber == chamber).collect();
    let scoped: &[&PersonRecord] = if in_chamber.is_empty() { recs } else { &in_chamber };

    let party = match choose(
        recs,
        priorities.order("person.party"),
        |r| r.source,
        fetched,
        |r| Some(r.party),
        |_| true,
    ) {
        Some((party, won, contested)) => {
            if contested {
                let values: Vec<_> = recs.iter().map(|r| (r.source, Some(r.party))).collect();
                push_disagreement(conflicts, entity.clone(), "party", &values, &party, won);
            }
            party
        }
        None => entry.party,
    };

    let state = match choose(
        recs,
        priorities.order("person.state"),
        |r| r.source,
        fetched,
        |r| Some(r.state.clone()),
        |s| states::is_valid_code(s),
    ) {
        Some((state, won, contested)) => {
            if contested {
                let values: Vec<_> =
                    recs.iter().map(|r| (r.source, Some(r.state.clone()))).collect();
                push_disagreement(conflicts, entity.clone(), "state", &values, &state, won);
            }
            state
        }
        None => entry.state.clone(),
    };

    let district = match chamber {
        Chamber::House => choose(
            scoped,
            priorities.order("person.district"),
            |r| r.source,
            fetched,
            |r| r.district,
            |d| *d <= 53,
        )
        .map(|(v, won, contested)| {
            if contested {
                let values: Vec<_> = scoped.iter().map(|r| (r.source, r.district)).collect();
                push_disagreement(conflicts, entity.clone(), "district", &values, &v, won);
            }
            v
        }),
        // Senators carry no district, whatever a source claims.
        _ => None,
    };

    let term_start = choose(
        scoped,
        priorities.order("person.term"),
        |r| r.source,
        fetched,
        |r| r.term_start,
        |_| true,
    )
    .map(|(v, _, _)| v);
    let term_end = choose(
        scoped,
        priorities.order("person.term"),
        |r| r.source,
        fetched,
        |r| r.term_end,
        |_| true,
    )
    .map(|(v, _, _)| v);

    let photo_url = choose(
        recs,
        priorities.order("person.photo_url"),
        |r| r.source,
        fetched,
        |r| r.photo_url.clone(),
        |_| true,
    )
    .map(|(v, _, _)| v);

    let term_class =
        if chamber == Chamber::Senate { term_class_from_end(term_end) } else { None };

    Person {
        id,
        bioguide_id: entry.bioguide_id.clone(),
        first_name: entry.first_name.clone(),
        middle_name: entry.middle_name.clone(),
        last_name: entry.last_name.clone(),
        suffix: entry.suffix.clone(),
        nickname: entry.nickname.clone(),
        party,
        chamber,
        state,
        district,
        term_start,
        term_end,
        is_current: true,
        senate_role: None,
        term_class,
        photo_url,
        status: EntityStatus::Proposed,
    }
}

/// Merges every source record resolved to one committee id.
pub fn merge_committee(
    entry: &CommitteeEntry,
    recs: &[&CommitteeRecord],
    parent_id: Option<CommitteeId>,
    priorities: &SourcePriorities,
    conflicts: &mut Vec<ConflictRecord>,
) -> Committee {
    let id = entry.id;
    let entity = EntityRef::Committee { id };
    let fetched = |r: &CommitteeRecord| r.fetched_at;

    let name = match choose(
        recs,
        priorities.order("committee.canonical_name"),
        |r| r.source,
        fetched,
        |r| Some(r.name.trim().to_string()),
        |n| !n.is_empty(),
    ) {
        Some((name, won, contested)) => {
            if contested {
                let values: Vec<_> =
                    recs.iter().map(|r| (r.source, Some(r.name.clone()))).collect();
                push_disagreement(conflicts, entity, "canonical_name", &values, &name, won);
            }
            name
        }
        None => entry.name.clone(),
    };

    let system_code = choose(
        recs,
        priorities.order("committee.system_code"),
        |r| r.source,
        fetched,
        |r| r.system_code.clone(),
        |c| !c.is_empty(),
    )
    .map(|(v, _, _)| v)
    .or_else(|| entry.system_code.clone());

    let url = choose(
        recs,
        priorities.order("committee.url"),
        |r| r.source,
        fetched,
        |r| r.url.clone(),
        |_| true,
    )
    .map(|(v, _, _)| v);

    let jurisdiction = choose(
        recs,
        priorities.order("committee.jurisdiction"),
        |r| r.source,
        fetched,
        |r| r.jurisdiction.clone(),
        |_| true,
    )
    .map(|(v, _, _)| v);

    Committee {
        id,
        system_code,
        name,
        chamber: entry.chamber,
        committee_type: entry.committee_type,
        parent_id,
        is_current: true,
        jurisdiction,
        url,
        status: EntityStatus::Proposed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capitol_model::{Party, PersonId};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn rec(source: Source, chamber: Chamber, start_year: i32) -> PersonRecord {
        PersonRecord {
            source,
            fetched_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            bioguide_id: Some("M000000".into()),
            first_name: "Pat".into(),
            middle_name: None,
            last_name: "Mover".into(),
            suffix: None,
            nickname: None,
            party: Party::Republican,
            chamber,
            state: "OH".into(),
            district: if chamber == Chamber::House { Some(4) } else { None },
            term_start: NaiveDate::from_ymd_opt(start_year, 1, 3),
            term_end: NaiveDate::from_ymd_opt(start_year + 6, 1, 3),
            photo_url: None,
            raw: serde_json::Value::Null,
        }
    }

    fn entry(id: PersonId) -> PersonEntry {
        PersonEntry {
            id,
            bioguide_id: Some("M000000".into()),
            first_name: "Pat".into(),
            middle_name: None,
            last_name: "Mover".into(),
            suffix: None,
            nickname: None,
            party: Party::Republican,
            chamber: Chamber::House,
            state: "OH".into(),
        }
    }

    #[test]
    fn chamber_transition_trusts_newest_term_start() {
        let old_house = rec(Source::Wikipedia, Chamber::House, 2019);
        let new_senate = rec(Source::CongressGov, Chamber::Senate, 2025);
        let mut conflicts = Vec::new();
        let person = merge_person(
            &entry(7),
            &[&new_senate, &old_house],
            &SourcePriorities::default(),
            &mut conflicts,
        );
        assert_eq!(person.chamber, Chamber::Senate);
        assert_eq!(person.district, None);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::ChamberTransition);
    }

    #[test]
    fn priority_order_settles_cross_source_disagreement_silently() {
        let mut cg = rec(Source::CongressGov, Chamber::House, 2025);
        cg.party = Party::Republican;
        let mut wp = rec(Source::Wikipedia, Chamber::House, 2025);
        wp.party = Party::Independent;
        let mut conflicts = Vec::new();
        let person =
            merge_person(&entry(1), &[&cg, &wp], &SourcePriorities::default(), &mut conflicts);
        assert_eq!(person.party, Party::Republican);
        assert!(conflicts.is_empty());
    }

    #[test]
    fn same_source_tie_breaks_on_fetch_time() {
        let mut older = rec(Source::CongressGov, Chamber::House, 2025);
        older.district = Some(4);
        older.fetched_at = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let mut newer = rec(Source::CongressGov, Chamber::House, 2025);
        newer.district = Some(9);
        newer.fetched_at = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        let mut conflicts = Vec::new();
        let person =
            merge_person(&entry(1), &[&older, &newer], &SourcePriorities::default(), &mut conflicts);
        assert_eq!(person.district, Some(9));
        assert!(conflicts.is_empty());
    }

    #[test]
    fn implausible_district_never_wins() {
        let mut bad = rec(Source::CongressGov, Chamber::House, 2025);
        bad.district = Some(404);
        let good = rec(Source::Wikipedia, Chamber::House, 2025);
        let mut conflicts = Vec::new();
        let person =
            merge_person(&entry(1), &[&bad, &good], &SourcePriorities::default(), &mut conflicts);
        assert_eq!(person.district, Some(4));
    }

    #[test]
    fn contested_pick_names_the_winning_source() {
        // Only the chamber site speaks for the district, twice, at the
        // same fetch time: the conflict must credit chamber_site, not
        // the head of the priority order.
        let mut a = rec(Source::ChamberSite, Chamber::House, 2025);
        a.district = Some(4);
        let mut b = rec(Source::ChamberSite, Chamber::House, 2025);
        b.district = Some(9);
        let mut conflicts = Vec::new();
        merge_person(&entry(1), &[&a, &b], &SourcePriorities::default(), &mut conflicts);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::AttributeDisagreement);
        assert!(conflicts[0].rationale.contains("chamber_site"));
    }

    #[test]
    fn senate_term_class_derives_from_term_end() {
        assert_eq!(term_class_from_end(NaiveDate::from_ymd_opt(2031, 1, 3)), Some(TermClass::I));
        assert_eq!(term_class_from_end(NaiveDate::from_ymd_opt(2027, 1, 3)), Some(TermClass::II));
        assert_eq!(term_class_from_end(NaiveDate::from_ymd_opt(2029, 1, 3)), Some(TermClass::III));
        assert_eq!(term_class_from_end(None), None);
    }
}
