//! Per-attribute source orders: which source gets the first word on
//! each attribute, and the configured overrides.

use std::collections::BTreeMap;

use capitol_model::Source;

use crate::config::ReconcileConfig;

use Source::{ChamberSite, CongressGov, Wikipedia};

/// The built-in orders. Congress.gov leads on identity-grade facts,
/// the chamber sites on rosters and official URLs, Wikipedia on
/// leadership (it is updated within hours of a gavel change).
const DEFAULTS: &[(&str, [Source; 3])] = &[
    ("person.party", [CongressGov, ChamberSite, Wikipedia]),
    ("person.state", [CongressGov, ChamberSite, Wikipedia]),
    ("person.district", [CongressGov, ChamberSite, Wikipedia]),
    ("person.chamber", [CongressGov, ChamberSite, Wikipedia]),
    ("person.term", [CongressGov, ChamberSite, Wikipedia]),
    ("person.photo_url", [CongressGov, ChamberSite, Wikipedia]),
    ("committee.canonical_name", [CongressGov, ChamberSite, Wikipedia]),
    ("committee.system_code", [CongressGov, ChamberSite, Wikipedia]),
    ("committee.parent", [CongressGov, ChamberSite, Wikipedia]),
    ("committee.jurisdiction", [CongressGov, ChamberSite, Wikipedia]),
    ("committee.url", [ChamberSite, CongressGov, Wikipedia]),
    ("membership.position", [Wikipedia, ChamberSite, CongressGov]),
    ("membership.roster", [ChamberSite, CongressGov, Wikipedia]),
];

pub fn is_known_attribute(attribute: &str) -> bool {
    DEFAULTS.iter().any(|(key, _)| *key == attribute)
}

/// Resolved source orders for one run: defaults plus config overrides.
#[derive(Debug, Clone)]
pub struct SourcePriorities {
    orders: BTreeMap<&'static str, Vec<Source>>,
}

impl SourcePriorities {
    pub fn from_config(config: &ReconcileConfig) -> Self {
        let mut orders: BTreeMap<&'static str, Vec<Source>> =
            DEFAULTS.iter().map(|(key, order)| (*key, order.to_vec())).collect();
        for (attribute, override_order) in &config.source_priorities {
            if let Some((key, _)) = DEFAULTS.iter().find(|(key, _)| key == attribute) {
                orders.insert(key, override_order.clone());
            }
        }
        Self { orders }
    }

    /// The consult order for one attribute. Unknown attributes fall
    /// back to the Congress.gov-first default.
    pub fn order(&self, attribute: &str) -> &[Source] {
        self.orders
            .get(attribute)
            .map(Vec::as_slice)
            .unwrap_or(&[CongressGov, ChamberSite, Wikipedia])
    }
}

impl Default for SourcePriorities {
    fn default() -> Self {
        Self { orders: DEFAULTS.iter().map(|(key, order)| (*key, order.to_vec())).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leadership_defaults_to_wikipedia_first() {
        let priorities = SourcePriorities::default();
        assert_eq!(priorities.order("membership.position")[0], Wikipedia);
        assert_eq!(priorities.order("membership.roster")[0], ChamberSite);
        assert_eq!(priorities.order("person.party")[0], CongressGov);
    }

    #[test]
    fn config_override_wins() {
        let config = ReconcileConfig::from_toml(
            r#"
            majority_party_house = "republican"
            majority_party_senate = "republican"

            [source_priorities]
            "membership.roster" = ["congress_gov", "chamber_site", "wikipedia"]
            "#,
        )
        .unwrap();
        let priorities = SourcePriorities::from_config(&config);
        assert_eq!(priorities.order("membership.roster")[0], CongressGov);
        // Untouched attributes keep their defaults.
        assert_eq!(priorities.order("membership.position")[0], Wikipedia);
    }
}
