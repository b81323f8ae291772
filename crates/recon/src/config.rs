//! Engine configuration. Loaded from TOML, validated before any record
//! is touched.

use std::collections::BTreeMap;

use capitol_model::{Party, Source};
use serde::Deserialize;

use crate::priority::is_known_attribute;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

fn default_congress() -> u16 {
    119
}

/// Per-run knobs for the reconciliation engine proper. Transport and
/// database settings live with their own stages.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcileConfig {
    #[serde(default = "default_congress")]
    pub congress_number: u16,

    /// Caucus-organizing party per chamber; breaks seat-count ties and
    /// anchors the Chair/Ranking-Member party rules.
    pub majority_party_house: Party,
    pub majority_party_senate: Party,

    /// Attribute-keyed overrides of the default source orders, e.g.
    /// `"membership.roster" = ["congress_gov", "chamber_site"]`.
    #[serde(default)]
    pub source_priorities: BTreeMap<String, Vec<Source>>,
}

impl ReconcileConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.congress_number == 0 {
            return Err(ConfigError::Invalid("congress_number must be positive".into()));
        }
        for (attribute, order) in &self.source_priorities {
            if !is_known_attribute(attribute) {
                return Err(ConfigError::Invalid(format!(
                    "unknown source_priorities attribute {attribute:?}"
                )));
            }
            if order.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "source_priorities for {attribute:?} is empty"
                )));
            }
            for source in Source::ALL {
                if order.iter().filter(|s| **s == source).count() > 1 {
                    return Err(ConfigError::Invalid(format!(
                        "source_priorities for {attribute:?} lists {source} twice"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_defaults_congress() {
        let config = ReconcileConfig::from_toml(
            r#"
            majority_party_house = "republican"
            majority_party_senate = "republican"
            "#,
        )
        .unwrap();
        assert_eq!(config.congress_number, 119);
        assert_eq!(config.majority_party_house, Party::Republican);
        assert!(config.source_priorities.is_empty());
    }

    #[test]
    fn priority_override_round_trips() {
        let config = ReconcileConfig::from_toml(
            r#"
            majority_party_house = "republican"
            majority_party_senate = "republican"

            [source_priorities]
            "membership.roster" = ["congress_gov", "chamber_site"]
            "#,
        )
        .unwrap();
        assert_eq!(
            config.source_priorities["membership.roster"],
            vec![Source::CongressGov, Source::ChamberSite]
        );
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let err = ReconcileConfig::from_toml(
            r#"
            majority_party_house = "republican"
            majority_party_senate = "republican"

            [source_priorities]
            "person.shoe_size" = ["congress_gov"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn duplicate_source_is_rejected() {
        let err = ReconcileConfig::from_toml(
            r#"
            majority_party_house = "democratic"
            majority_party_senate = "democratic"

            [source_priorities]
            "person.party" = ["wikipedia", "wikipedia"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_majority_party_fails_parse() {
        assert!(ReconcileConfig::from_toml("congress_number = 119").is_err());
    }
}
