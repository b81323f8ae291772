use capitol_model::{
    Chamber, ConflictKind, ConflictRecord, EntityRef, Party, PersonId, PersonKey, PersonRecord,
};
use tracing::debug;

use crate::names::{prefer_longer, token_sort_ratio};
use crate::{GREY_BAND_FLOOR, MATCH_THRESHOLD};

/// Which tier of the match order produced an id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PersonMatchTier {
    Bioguide,
    ExactTuple,
    UniqueLastName,
    Fuzzy(f64),
    /// Score in the grey band: tentative id, conflict emitted.
    GreyBand(f64),
    New,
}

#[derive(Debug, Clone, Copy)]
pub struct PersonResolution {
    pub id: PersonId,
    pub tier: PersonMatchTier,
    pub created: bool,
}

/// Accumulated identity of one person across all sources seen so far.
#[derive(Debug, Clone)]
pub struct PersonEntry {
    pub id: PersonId,
    pub bioguide_id: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    pub nickname: Option<String>,
    pub party: Party,
    pub chamber: Chamber,
    pub state: String,
}

impl PersonEntry {
    fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Assigns stable ids to person records in source-provided order.
/// Deterministic: identical inputs produce identical assignments.
pub struct PersonResolver {
    next_id: PersonId,
    entries: Vec<PersonEntry>,
    conflicts: Vec<ConflictRecord>,
}

impl PersonResolver {
    pub fn new() -> Self {
        Self { next_id: 1, entries: Vec::new(), conflicts: Vec::new() }
    }

    pub fn entries(&self) -> &[PersonEntry] {
        &self.entries
    }

    pub fn entry(&self, id: PersonId) -> Option<&PersonEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Conflicts accumulated so far (grey-band and ambiguous matches).
    pub fn take_conflicts(&mut self) -> Vec<ConflictRecord> {
        std::mem::take(&mut self.conflicts)
    }

    /// Match `rec` against the known entries in tier order, minting a
    /// new id when nothing reaches the threshold.
    pub fn resolve(&mut self, rec: &PersonRecord) -> PersonResolution {
        // (a) bioguide id equality
        if let Some(bid) = &rec.bioguide_id {
            if let Some(idx) = self.entries.iter().position(|e| e.bioguide_id.as_ref() == Some(bid))
            {
                let id = self.entries[idx].id;
                self.absorb(idx, rec);
                return PersonResolution { id, tier: PersonMatchTier::Bioguide, created: false };
            }
        }

        // (b) exact (first, last, state, chamber)
        let exact: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                e.first_name.eq_ignore_ascii_case(&rec.first_name)
                    && e.last_name.eq_ignore_ascii_case(&rec.last_name)
                    && e.state == rec.state
                    && e.chamber == rec.chamber
            })
            .map(|(i, _)| i)
            .collect();
        if let Some(idx) = self.pick_unique(&exact, rec, "exact tuple") {
            let id = self.entries[idx].id;
            self.absorb(idx, rec);
            return PersonResolution { id, tier: PersonMatchTier::ExactTuple, created: false };
        }

        // (c) (last, state, chamber) when exactly one candidate exists
        let by_last: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                e.last_name.eq_ignore_ascii_case(&rec.last_name)
                    && e.state == rec.state
                    && e.chamber == rec.chamber
            })
            .map(|(i, _)| i)
            .collect();
        if by_last.len() == 1 {
            let idx = by_last[0];
            let id = self.entries[idx].id;
            self.absorb(idx, rec);
            return PersonResolution { id, tier: PersonMatchTier::UniqueLastName, created: false };
        }

        // (d) fuzzy on full name within chamber and state
        let full = rec.full_name();
        let mut scored: Vec<(usize, f64)> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.chamber == rec.chamber && e.state == rec.state)
            .map(|(i, e)| {
                let base = token_sort_ratio(&e.full_name(), &full);
                let adjusted = if e.party == rec.party { base + 0.05 } else { base - 0.05 };
                (i, adjusted.clamp(0.0, 1.0))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        if let Some(&(best_idx, best_score)) = scored.first() {
            if best_score >= MATCH_THRESHOLD {
                let tied: Vec<usize> = scored
                    .iter()
                    .filter(|(_, s)| *s == best_score)
                    .map(|(i, _)| *i)
                    .collect();
                let idx = self.pick_unique(&tied, rec, "fuzzy").unwrap_or(best_idx);
                let id = self.entries[idx].id;
                self.absorb(idx, rec);
                return PersonResolution {
                    id,
                    tier: PersonMatchTier::Fuzzy(best_score),
                    created: false,
                };
            }
            if best_score >= GREY_BAND_FLOOR {
                // Tentative id keeps the pipeline moving; flag for review.
                let id = self.entries[best_idx].id;
                debug!(score = best_score, person = %full, "grey-band person match");
                self.conflicts.push(
                    ConflictRecord::new(
                        ConflictKind::GreyBandMatch,
                        EntityRef::Person { id },
                        "identity",
                    )
                    .value(rec.source, &full)
                    .chose(self.entries[best_idx].full_name())
                    .because(format!("token-sort score {best_score:.2} in grey band")),
                );
                self.absorb(best_idx, rec);
                return PersonResolution {
                    id,
                    tier: PersonMatchTier::GreyBand(best_score),
                    created: false,
                };
            }
        }

        // No match: mint a new id.
        let id = self.mint(rec);
        PersonResolution { id, tier: PersonMatchTier::New, created: true }
    }

    /// Read-only lookup for roster and leadership rows, which carry a
    /// name key rather than a full record.
    pub fn lookup(&self, key: &PersonKey) -> Option<PersonId> {
        if let Some(bid) = &key.bioguide_id {
            if let Some(e) = self.entries.iter().find(|e| e.bioguide_id.as_ref() == Some(bid)) {
                return Some(e.id);
            }
        }

        let in_scope = |e: &&PersonEntry| {
            key.state.as_deref().is_none_or(|s| e.state == s)
                && key.chamber.is_none_or(|c| e.chamber == c)
        };

        // Exact token-sorted name equality first.
        let mut best: Option<(PersonId, f64)> = None;
        for e in self.entries.iter().filter(in_scope) {
            let base = token_sort_ratio(&e.full_name(), &key.full_name);
            let score = match key.party {
                Some(p) if p == e.party => (base + 0.05).min(1.0),
                Some(_) => (base - 0.05).max(0.0),
                None => base,
            };
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((e.id, score));
            }
        }
        if let Some((id, score)) = best {
            if score >= MATCH_THRESHOLD {
                return Some(id);
            }
        }

        // Fall back to a unique last name within scope ("Grassley").
        let last = key.full_name.split_whitespace().last()?;
        let by_last: Vec<&PersonEntry> = self
            .entries
            .iter()
            .filter(in_scope)
            .filter(|e| e.last_name.eq_ignore_ascii_case(last))
            .collect();
        if by_last.len() == 1 {
            return Some(by_last[0].id);
        }
        None
    }

    fn mint(&mut self, rec: &PersonRecord) -> PersonId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(PersonEntry {
            id,
            bioguide_id: rec.bioguide_id.clone(),
            first_name: rec.first_name.clone(),
            middle_name: rec.middle_name.clone(),
            last_name: rec.last_name.clone(),
            suffix: rec.suffix.clone(),
            nickname: rec.nickname.clone(),
            party: rec.party,
            chamber: rec.chamber,
            state: rec.state.clone(),
        });
        id
    }

    /// Fold a newly matched record into an entry: longer first-name
    /// form wins with the shorter retained as nickname; missing
    /// attributes are filled, never overwritten.
    fn absorb(&mut self, idx: usize, rec: &PersonRecord) {
        let e = &mut self.entries[idx];
        if e.bioguide_id.is_none() {
            e.bioguide_id = rec.bioguide_id.clone();
        }
        if !e.first_name.eq_ignore_ascii_case(&rec.first_name) {
            let winner = prefer_longer(&e.first_name, &rec.first_name).to_string();
            let loser = if winner == e.first_name { &rec.first_name } else { &e.first_name };
            if e.nickname.is_none() {
                e.nickname = Some(loser.clone());
            }
            e.first_name = winner;
        }
        if e.middle_name.is_none() {
            e.middle_name = rec.middle_name.clone();
        }
        if e.suffix.is_none() {
            e.suffix = rec.suffix.clone();
        }
        if e.nickname.is_none() {
            e.nickname = rec.nickname.clone();
        }
    }

    /// Tiebreak a candidate set: presence of bioguide id, then longer
    /// first-name form, then lowest id. Emits an AmbiguousIdentity
    /// conflict when candidates remain indistinguishable.
    fn pick_unique(&mut self, candidates: &[usize], rec: &PersonRecord, tier: &str) -> Option<usize> {
        match candidates.len() {
            0 => None,
            1 => Some(candidates[0]),
            _ => {
                let mut ranked: Vec<usize> = candidates.to_vec();
                ranked.sort_by_key(|&i| {
                    let e = &self.entries[i];
                    (
                        std::cmp::Reverse(e.bioguide_id.is_some()),
                        std::cmp::Reverse(e.first_name.len()),
                        e.id,
                    )
                });
                let top = &self.entries[ranked[0]];
                let second = &self.entries[ranked[1]];
                let resolved = top.bioguide_id.is_some() != second.bioguide_id.is_some()
                    || top.first_name.len() != second.first_name.len();
                if !resolved {
                    let id = top.id;
                    self.conflicts.push(
                        ConflictRecord::new(
                            ConflictKind::AmbiguousIdentity,
                            EntityRef::Person { id },
                            "identity",
                        )
                        .value(rec.source, rec.full_name())
                        .because(format!("{} candidates tied at {tier} tier", candidates.len())),
                    );
                }
                Some(ranked[0])
            }
        }
    }
}

impl Default for PersonResolver {
    fn default() -> Self {
        Self::new()
    }
}
