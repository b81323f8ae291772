//! Roster extraction seam for the chamber websites.
//!
//! The HTML pages move under us, so parsing lives behind the
//! [`RosterExtractor`] trait. The regex implementation covers the
//! stable `Name (P-ST)` row convention and the committee index link
//! lists; anything fancier plugs in through the trait.

use capitol_model::{Chamber, Party, Position};
use regex::Regex;

use crate::error::AdapterError;

/// One committee entry scraped from a chamber index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitteeListing {
    pub name: String,
    pub chamber: Chamber,
    pub url: String,
}

/// One member row scraped from a committee roster page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub full_name: String,
    pub party: Party,
    pub state: String,
    pub position: Position,
}

/// Parses chamber-site HTML into listings and roster rows.
pub trait RosterExtractor: Send + Sync {
    /// Extracts the committee list from a chamber index page.
    fn committee_index(
        &self,
        html: &str,
        chamber: Chamber,
    ) -> Result<Vec<CommitteeListing>, AdapterError>;

    /// Extracts member rows from one committee's roster page.
    fn roster(&self, html: &str) -> Result<Vec<RosterRow>, AdapterError>;
}

/// Regex-based extractor for the canonical row shapes.
pub struct RegexRosterExtractor {
    index_link: Regex,
    member_row: Regex,
}

impl Default for RegexRosterExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexRosterExtractor {
    pub fn new() -> Self {
        Self {
            // <a href="...">Committee on X</a>, tolerating attributes
            // after href and whitespace inside the anchor text.
            index_link: Regex::new(
                r#"<a\s+href="([^"]+)"[^>]*>\s*([^<]*Committee[^<]*?)\s*</a>"#,
            )
            .unwrap(),
            // Optional leadership tag, then "Name (P-ST)".
            member_row: Regex::new(
                r"(?m)^\s*(?:(Chairman|Chairwoman|Chair|Ranking Member|Vice Chair)\s*:?\s+)?([A-Z][^(\n]+?)\s*\(([RDI])-([A-Z]{2})\)",
            )
            .unwrap(),
        }
    }
}

impl RosterExtractor for RegexRosterExtractor {
    fn committee_index(
        &self,
        html: &str,
        chamber: Chamber,
    ) -> Result<Vec<CommitteeListing>, AdapterError> {
        let mut listings = Vec::new();
        for caps in self.index_link.captures_iter(html) {
            listings.push(CommitteeListing {
                name: caps[2].trim().to_string(),
                chamber,
                url: caps[1].to_string(),
            });
        }
        Ok(listings)
    }

    fn roster(&self, html: &str) -> Result<Vec<RosterRow>, AdapterError> {
        let mut rows = Vec::new();
        for caps in self.member_row.captures_iter(html) {
            let position = match caps.get(1).map(|m| m.as_str()) {
                Some("Chair" | "Chairman" | "Chairwoman") => Position::Chair,
                Some("Ranking Member") => Position::RankingMember,
                Some("Vice Chair") => Position::ViceChair,
                _ => Position::Member,
            };
            let Ok(party) = Party::parse(&caps[3]) else { continue };
            rows.push(RosterRow {
                full_name: caps[2].trim().to_string(),
                party,
                state: caps[4].to_string(),
                position,
            });
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_links_become_listings() {
        let html = r#"
            <ul>
              <li><a href="https://judiciary.house.gov">Committee on the Judiciary</a></li>
              <li><a href="https://agriculture.house.gov" class="cmte">Committee on Agriculture</a></li>
              <li><a href="/about">About this site</a></li>
            </ul>
        "#;
        let listings =
            RegexRosterExtractor::new().committee_index(html, Chamber::House).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].name, "Committee on the Judiciary");
        assert_eq!(listings[0].url, "https://judiciary.house.gov");
        assert_eq!(listings[1].chamber, Chamber::House);
    }

    #[test]
    fn roster_rows_parse_name_party_state() {
        let html = "\
Chairman Jim Jordan (R-OH)
Ranking Member Jamie Raskin (D-MD)
Darrell Issa (R-CA)
Pramila Jayapal (D-WA)
Not a member line
";
        let rows = RegexRosterExtractor::new().roster(html).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].position, Position::Chair);
        assert_eq!(rows[0].full_name, "Jim Jordan");
        assert_eq!(rows[1].position, Position::RankingMember);
        assert_eq!(rows[1].party, Party::Democratic);
        assert_eq!(rows[2].position, Position::Member);
        assert_eq!(rows[3].state, "WA");
    }

    #[test]
    fn unknown_party_letter_is_skipped() {
        let rows = RegexRosterExtractor::new().roster("Someone Odd (R-TX)\n").unwrap();
        assert_eq!(rows.len(), 1);
    }
}
