//! Majority derivation: count the merged Person set, not a constant.
//! The configured parties only break seat-count ties and absorb the
//! independents who caucus with a major party.

use capitol_model::{Chamber, Party, PartyControl, Person};
use tracing::info;

use crate::config::ReconcileConfig;

fn majority_for(persons: &[Person], chamber: Chamber, configured: Party) -> Party {
    let mut democratic = 0usize;
    let mut republican = 0usize;
    for person in persons.iter().filter(|p| p.is_current && p.chamber == chamber) {
        match person.party {
            Party::Democratic => democratic += 1,
            Party::Republican => republican += 1,
            // Independents organize with the configured caucus.
            Party::Independent => match configured {
                Party::Democratic => democratic += 1,
                _ => republican += 1,
            },
        }
    }
    match democratic.cmp(&republican) {
        std::cmp::Ordering::Greater => Party::Democratic,
        std::cmp::Ordering::Less => Party::Republican,
        std::cmp::Ordering::Equal => configured,
    }
}

pub fn derive(persons: &[Person], config: &ReconcileConfig) -> PartyControl {
    let control = PartyControl {
        house_majority: majority_for(persons, Chamber::House, config.majority_party_house),
        senate_majority: majority_for(persons, Chamber::Senate, config.majority_party_senate),
    };
    info!(house = %control.house_majority, senate = %control.senate_majority, "party control derived");
    control
}
