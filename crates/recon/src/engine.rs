//! The reconciliation run: resolve identities, merge attributes,
//! derive party control, construct the membership set.
//!
//! Pure over the in-memory record set. The output is invariant under
//! adapter interleaving because records are grouped per resolved id
//! before any merge decision is taken.

use std::collections::BTreeMap;

use capitol_identity::{CommitteeResolver, PersonResolver};
use capitol_model::{
    Committee, CommitteeId, Person, PersonId, Snapshot, SnapshotMeta, SourceSet,
};
use chrono::Utc;
use tracing::{info, info_span};

use crate::config::ReconcileConfig;
use crate::error::ReconcileError;
use crate::priority::SourcePriorities;
use crate::{membership, merge, party_control};

/// Runs the full engine over one fetched record set.
pub fn run(
    config: &ReconcileConfig,
    set: &SourceSet,
    run_id: &str,
) -> Result<Snapshot, ReconcileError> {
    let span = info_span!("reconcile", run_id, congress = config.congress_number);
    let _guard = span.enter();

    if set.persons.is_empty() {
        return Err(ReconcileError::irreconcilable("no person records from any source"));
    }
    if set.committees.is_empty() {
        return Err(ReconcileError::irreconcilable("no committee records from any source"));
    }

    let priorities = SourcePriorities::from_config(config);
    let mut conflicts = Vec::new();

    // Identity pass, in source-provided order.
    let mut person_resolver = PersonResolver::new();
    let mut person_groups: BTreeMap<PersonId, Vec<usize>> = BTreeMap::new();
    for (index, rec) in set.persons.iter().enumerate() {
        let resolution = person_resolver.resolve(rec);
        person_groups.entry(resolution.id).or_default().push(index);
    }

    let mut committee_resolver = CommitteeResolver::new();
    let mut committee_groups: BTreeMap<CommitteeId, Vec<usize>> = BTreeMap::new();
    for (index, rec) in set.committees.iter().enumerate() {
        let resolution = committee_resolver.resolve(rec);
        committee_groups.entry(resolution.id).or_default().push(index);
    }
    let parent_links: BTreeMap<CommitteeId, Option<CommitteeId>> =
        committee_resolver.resolve_parents().into_iter().collect();

    conflicts.extend(person_resolver.take_conflicts());
    conflicts.extend(committee_resolver.take_conflicts());

    // Attribute merge.
    let mut persons: Vec<Person> = Vec::with_capacity(person_groups.len());
    for (&id, indices) in &person_groups {
        let entry = person_resolver
            .entry(id)
            .ok_or_else(|| ReconcileError::irreconcilable(format!("person {id} lost its entry")))?;
        let recs: Vec<_> = indices.iter().map(|&i| &set.persons[i]).collect();
        persons.push(merge::merge_person(entry, &recs, &priorities, &mut conflicts));
    }

    let mut committees: Vec<Committee> = Vec::with_capacity(committee_groups.len());
    for (&id, indices) in &committee_groups {
        let entry = committee_resolver.entry(id).ok_or_else(|| {
            ReconcileError::irreconcilable(format!("committee {id} lost its entry"))
        })?;
        let recs: Vec<_> = indices.iter().map(|&i| &set.committees[i]).collect();
        let parent_id = parent_links.get(&id).copied().flatten();
        committees.push(merge::merge_committee(entry, &recs, parent_id, &priorities, &mut conflicts));
    }

    let party_control = party_control::derive(&persons, config);

    let memberships = membership::build(
        &set.memberships,
        &person_resolver,
        &committee_resolver,
        &committees,
        &priorities,
        &mut conflicts,
    );

    info!(
        persons = persons.len(),
        committees = committees.len(),
        memberships = memberships.len(),
        conflicts = conflicts.len(),
        "snapshot assembled"
    );

    Ok(Snapshot {
        meta: SnapshotMeta {
            run_id: run_id.to_string(),
            congress: config.congress_number,
            generated_at: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        persons,
        committees,
        memberships,
        conflicts,
        party_control,
    })
}
