use capitol_model::{
    Chamber, CommitteeId, CommitteeKey, CommitteeRecord, CommitteeType, ConflictKind,
    ConflictRecord, EntityRef,
};

use crate::names::tokens;
use crate::COMMITTEE_OVERLAP_THRESHOLD;

/// Words carrying no signal for committee-name overlap.
const STOP_WORDS: [&str; 9] =
    ["committee", "subcommittee", "on", "the", "and", "of", "for", "to", "in"];

/// Canonical-name aliases the sources genuinely disagree on; applied
/// after prefix/suffix stripping.
const ALIASES: [(&str, &str); 4] = [
    ("oversight and government reform", "oversight and accountability"),
    ("house administration", "administration"),
    ("homeland security and governmental affairs", "homeland security and government affairs"),
    ("veterans' affairs", "veterans affairs"),
];

/// Lower-case, strip the "Committee on (the)" family of prefixes and
/// trailing "committee"/"subcommittee", drop punctuation and interior
/// articles, collapse whitespace, then apply the alias table. Serial
/// commas vary by source, so commas carry no signal here.
pub fn normalize_name(name: &str) -> String {
    let mut n = name.trim().to_lowercase();

    const PREFIXES: [&str; 7] = [
        "permanent select committee on ",
        "select committee on ",
        "special committee on ",
        "joint committee on ",
        "standing committee on ",
        "committee on the ",
        "committee on ",
    ];
    for p in PREFIXES {
        if let Some(rest) = n.strip_prefix(p) {
            n = rest.to_string();
            break;
        }
    }

    const SUFFIXES: [&str; 2] = [" committee", " subcommittee"];
    for s in SUFFIXES {
        if let Some(rest) = n.strip_suffix(s) {
            n = rest.to_string();
            break;
        }
    }

    n = n.replace(" the ", " ");
    n = n.replace([',', '.'], " ");
    n = n.split_whitespace().collect::<Vec<_>>().join(" ");

    for (from, to) in ALIASES {
        if n == from {
            return to.to_string();
        }
    }
    n
}

/// Jaccard-style token overlap after stop-word removal.
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let strip = |name: &str| -> Vec<String> {
        tokens(name).into_iter().filter(|t| !STOP_WORDS.contains(&t.as_str())).collect()
    };
    let ta = strip(a);
    let tb = strip(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let shared = ta.iter().filter(|t| tb.contains(t)).count();
    let union = ta.len() + tb.len() - shared;
    shared as f64 / union as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitteeMatchTier {
    SystemCode,
    CanonicalName,
    NormalizedName,
    TokenOverlap,
    New,
}

#[derive(Debug, Clone, Copy)]
pub struct CommitteeResolution {
    pub id: CommitteeId,
    pub tier: CommitteeMatchTier,
    pub created: bool,
}

#[derive(Debug, Clone)]
pub struct CommitteeEntry {
    pub id: CommitteeId,
    pub system_code: Option<String>,
    pub name: String,
    pub normalized: String,
    pub chamber: Chamber,
    pub committee_type: CommitteeType,
    pub parent_code: Option<String>,
    pub parent_name: Option<String>,
}

/// Assigns stable ids to committee records; same contract as the
/// person resolver but with the name-normalization tiers.
pub struct CommitteeResolver {
    next_id: CommitteeId,
    entries: Vec<CommitteeEntry>,
    conflicts: Vec<ConflictRecord>,
}

impl CommitteeResolver {
    pub fn new() -> Self {
        Self { next_id: 1, entries: Vec::new(), conflicts: Vec::new() }
    }

    pub fn entries(&self) -> &[CommitteeEntry] {
        &self.entries
    }

    pub fn entry(&self, id: CommitteeId) -> Option<&CommitteeEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn take_conflicts(&mut self) -> Vec<ConflictRecord> {
        std::mem::take(&mut self.conflicts)
    }

    pub fn resolve(&mut self, rec: &CommitteeRecord) -> CommitteeResolution {
        // (a) system code equality
        if let Some(code) = &rec.system_code {
            if let Some(idx) =
                self.entries.iter().position(|e| e.system_code.as_ref() == Some(code))
            {
                let id = self.entries[idx].id;
                self.absorb(idx, rec);
                return CommitteeResolution { id, tier: CommitteeMatchTier::SystemCode, created: false };
            }
        }

        // (b) canonical-name equality within chamber
        if let Some(idx) = self.entries.iter().position(|e| {
            e.chamber == rec.chamber && e.name.eq_ignore_ascii_case(rec.name.trim())
        }) {
            let id = self.entries[idx].id;
            self.absorb(idx, rec);
            return CommitteeResolution { id, tier: CommitteeMatchTier::CanonicalName, created: false };
        }

        // (c) normalized-name equality within chamber
        let normalized = normalize_name(&rec.name);
        if let Some(idx) = self
            .entries
            .iter()
            .position(|e| e.chamber == rec.chamber && e.normalized == normalized)
        {
            let id = self.entries[idx].id;
            self.absorb(idx, rec);
            return CommitteeResolution { id, tier: CommitteeMatchTier::NormalizedName, created: false };
        }

        // (d) token overlap within chamber; subcommittees only match
        // subcommittees (and vice versa) to keep parents distinct from
        // their children.
        let is_sub = rec.committee_type == CommitteeType::Subcommittee;
        let mut best: Option<(usize, f64)> = None;
        for (i, e) in self.entries.iter().enumerate() {
            if e.chamber != rec.chamber {
                continue;
            }
            if (e.committee_type == CommitteeType::Subcommittee) != is_sub {
                continue;
            }
            let overlap = token_overlap(&e.name, &rec.name);
            if overlap >= COMMITTEE_OVERLAP_THRESHOLD
                && best.is_none_or(|(_, b)| overlap > b)
            {
                best = Some((i, overlap));
            }
        }
        if let Some((idx, _)) = best {
            let id = self.entries[idx].id;
            self.absorb(idx, rec);
            return CommitteeResolution { id, tier: CommitteeMatchTier::TokenOverlap, created: false };
        }

        let id = self.mint(rec, normalized);
        CommitteeResolution { id, tier: CommitteeMatchTier::New, created: true }
    }

    /// Read-only lookup for membership rows.
    pub fn lookup(&self, key: &CommitteeKey) -> Option<CommitteeId> {
        if let Some(code) = &key.system_code {
            if let Some(e) = self.entries.iter().find(|e| e.system_code.as_ref() == Some(code)) {
                return Some(e.id);
            }
        }
        let normalized = normalize_name(&key.name);
        self.entries
            .iter()
            .find(|e| {
                e.chamber == key.chamber
                    && (e.name.eq_ignore_ascii_case(key.name.trim()) || e.normalized == normalized)
            })
            .or_else(|| {
                self.entries
                    .iter()
                    .filter(|e| e.chamber == key.chamber)
                    .map(|e| (e, token_overlap(&e.name, &key.name)))
                    .filter(|(_, o)| *o >= COMMITTEE_OVERLAP_THRESHOLD)
                    .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                    .map(|(e, _)| e)
            })
            .map(|e| e.id)
    }

    /// Resolve every subcommittee's parent code/name to a parent id.
    /// Unresolvable parents emit an OrphanSubcommittee conflict and the
    /// subcommittee publishes with no parent.
    pub fn resolve_parents(&mut self) -> Vec<(CommitteeId, Option<CommitteeId>)> {
        let mut links = Vec::new();
        let mut orphans = Vec::new();
        for e in &self.entries {
            if e.committee_type != CommitteeType::Subcommittee {
                continue;
            }
            let parent = e
                .parent_code
                .as_ref()
                .and_then(|code| {
                    self.entries
                        .iter()
                        .find(|p| p.id != e.id && p.system_code.as_ref() == Some(code))
                })
                .or_else(|| {
                    e.parent_name.as_ref().and_then(|name| {
                        let normalized = normalize_name(name);
                        self.entries.iter().find(|p| {
                            p.id != e.id
                                && p.chamber == e.chamber
                                && p.committee_type != CommitteeType::Subcommittee
                                && (p.name.eq_ignore_ascii_case(name) || p.normalized == normalized)
                        })
                    })
                })
                .map(|p| p.id);
            if parent.is_none() {
                orphans.push((e.id, e.name.clone(), e.parent_code.clone()));
            }
            links.push((e.id, parent));
        }
        for (id, name, code) in orphans {
            self.conflicts.push(
                ConflictRecord::new(
                    ConflictKind::OrphanSubcommittee,
                    EntityRef::Committee { id },
                    "parent",
                )
                .because(format!(
                    "subcommittee {name:?} parent {} resolved in no source",
                    code.as_deref().unwrap_or("<none>"),
                )),
            );
        }
        links
    }

    fn mint(&mut self, rec: &CommitteeRecord, normalized: String) -> CommitteeId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(CommitteeEntry {
            id,
            system_code: rec.system_code.clone(),
            name: rec.name.trim().to_string(),
            normalized,
            chamber: rec.chamber,
            committee_type: rec.committee_type,
            parent_code: rec.parent_code.clone(),
            parent_name: rec.parent_name.clone(),
        });
        id
    }

    fn absorb(&mut self, idx: usize, rec: &CommitteeRecord) {
        let e = &mut self.entries[idx];
        if e.system_code.is_none() {
            e.system_code = rec.system_code.clone();
        }
        if e.parent_code.is_none() {
            e.parent_code = rec.parent_code.clone();
        }
        if e.parent_name.is_none() {
            e.parent_name = rec.parent_name.clone();
        }
    }
}

impl Default for CommitteeResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capitol_model::Source;
    use chrono::Utc;

    fn rec(source: Source, name: &str, chamber: Chamber) -> CommitteeRecord {
        CommitteeRecord {
            source,
            fetched_at: Utc::now(),
            system_code: None,
            name: name.into(),
            chamber,
            committee_type: CommitteeType::Standing,
            parent_code: None,
            parent_name: None,
            jurisdiction: None,
            url: None,
            raw: serde_json::Value::Null,
        }
    }

    fn with_code(mut r: CommitteeRecord, code: &str) -> CommitteeRecord {
        r.system_code = Some(code.into());
        r
    }

    #[test]
    fn normalize_strips_prefix_and_articles() {
        assert_eq!(normalize_name("Committee on the Judiciary"), "judiciary");
        assert_eq!(normalize_name("Committee on Ways and Means"), "ways and means");
        assert_eq!(normalize_name("Select Committee on Intelligence"), "intelligence");
    }

    #[test]
    fn normalize_applies_alias_table() {
        assert_eq!(
            normalize_name("Committee on Oversight and Government Reform"),
            "oversight and accountability",
        );
        assert_eq!(normalize_name("Committee on House Administration"), "administration");
    }

    #[test]
    fn normalize_ignores_serial_commas() {
        assert_eq!(
            normalize_name("Committee on Health, Education, Labor, and Pensions"),
            normalize_name("Committee on Health, Education, Labor and Pensions"),
        );
        assert_eq!(
            normalize_name("Committee on Science, Space, and Technology"),
            "science space and technology",
        );
    }

    #[test]
    fn system_code_match_wins() {
        let mut r = CommitteeResolver::new();
        let a = r.resolve(&with_code(rec(Source::CongressGov, "Committee on the Judiciary", Chamber::Senate), "ssju00"));
        let b = r.resolve(&with_code(rec(Source::ChamberSite, "Judiciary", Chamber::Senate), "ssju00"));
        assert_eq!(a.id, b.id);
        assert_eq!(b.tier, CommitteeMatchTier::SystemCode);
    }

    #[test]
    fn normalized_name_match() {
        let mut r = CommitteeResolver::new();
        let a = r.resolve(&rec(Source::CongressGov, "Committee on the Judiciary", Chamber::Senate));
        let b = r.resolve(&rec(Source::Wikipedia, "Judiciary Committee", Chamber::Senate));
        assert_eq!(a.id, b.id);
        assert_eq!(b.tier, CommitteeMatchTier::NormalizedName);
    }

    #[test]
    fn chambers_never_merge() {
        let mut r = CommitteeResolver::new();
        let house = r.resolve(&rec(Source::CongressGov, "Committee on the Judiciary", Chamber::House));
        let senate = r.resolve(&rec(Source::CongressGov, "Committee on the Judiciary", Chamber::Senate));
        assert_ne!(house.id, senate.id);
    }

    #[test]
    fn token_overlap_tier() {
        let mut r = CommitteeResolver::new();
        let a = r.resolve(&rec(Source::CongressGov, "Committee on Energy and Commerce", Chamber::House));
        // Shares "energy", "commerce" after stop-word removal.
        let b = r.resolve(&rec(Source::Wikipedia, "Energy & Commerce Panel", Chamber::House));
        assert_eq!(a.id, b.id);
        assert_eq!(b.tier, CommitteeMatchTier::TokenOverlap);
    }

    #[test]
    fn overlap_below_half_mints_new() {
        assert!(token_overlap("Committee on Agriculture", "Committee on Armed Services") < 0.5);
        let mut r = CommitteeResolver::new();
        let a = r.resolve(&rec(Source::CongressGov, "Committee on Agriculture", Chamber::House));
        let b = r.resolve(&rec(Source::CongressGov, "Committee on Armed Services", Chamber::House));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn orphan_subcommittee_flagged() {
        let mut r = CommitteeResolver::new();
        let mut sub = rec(Source::CongressGov, "Subcommittee on Antitrust", Chamber::Senate);
        sub.committee_type = CommitteeType::Subcommittee;
        sub.parent_code = Some("zzzz00".into());
        let res = r.resolve(&sub);

        let links = r.resolve_parents();
        assert_eq!(links, vec![(res.id, None)]);
        let conflicts = r.take_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::OrphanSubcommittee);
    }

    #[test]
    fn parent_resolution_by_code() {
        let mut r = CommitteeResolver::new();
        let parent =
            r.resolve(&with_code(rec(Source::CongressGov, "Committee on the Judiciary", Chamber::Senate), "ssju00"));
        let mut sub = rec(Source::CongressGov, "Subcommittee on Antitrust", Chamber::Senate);
        sub.committee_type = CommitteeType::Subcommittee;
        sub.parent_code = Some("ssju00".into());
        let child = r.resolve(&sub);

        let links = r.resolve_parents();
        assert_eq!(links, vec![(child.id, Some(parent.id))]);
        assert!(r.take_conflicts().is_empty());
    }
}
