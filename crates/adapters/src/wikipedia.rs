//! Wikipedia leadership adapter: Chair and Ranking Member only.
//!
//! Wikipedia edits land within hours of a leadership change, well
//! before the chamber sites catch up, so this source feeds exactly one
//! attribute: the leadership rows. Persons and committees from it are
//! never trusted for anything else.

use async_trait::async_trait;
use capitol_model::{
    Chamber, CommitteeKey, CommitteeRecord, MembershipRecord, Party, PersonKey, PersonRecord,
    Position, Source,
};
use chrono::Utc;
use regex::Regex;
use tracing::{debug, warn};

use crate::chamber_site::SourceClient;
use crate::error::AdapterError;
use crate::{FetchBatch, SourceAdapter};

/// A curated committee article to read leadership from.
#[derive(Debug, Clone)]
pub struct LeadershipPage {
    pub committee_name: String,
    pub chamber: Chamber,
    pub url: String,
}

impl LeadershipPage {
    pub fn new(committee_name: &str, chamber: Chamber, url: &str) -> Self {
        Self { committee_name: committee_name.to_string(), chamber, url: url.to_string() }
    }
}

/// The committees whose leadership churns often enough to warrant the
/// fresher source. Operators extend this list per run.
pub fn default_pages() -> Vec<LeadershipPage> {
    const WP: &str = "https://en.wikipedia.org/wiki";
    vec![
        LeadershipPage::new(
            "Committee on the Judiciary",
            Chamber::Senate,
            &format!("{WP}/United_States_Senate_Committee_on_the_Judiciary"),
        ),
        LeadershipPage::new(
            "Committee on Finance",
            Chamber::Senate,
            &format!("{WP}/United_States_Senate_Committee_on_Finance"),
        ),
        LeadershipPage::new(
            "Committee on Armed Services",
            Chamber::Senate,
            &format!("{WP}/United_States_Senate_Committee_on_Armed_Services"),
        ),
        LeadershipPage::new(
            "Committee on Appropriations",
            Chamber::Senate,
            &format!("{WP}/United_States_Senate_Committee_on_Appropriations"),
        ),
        LeadershipPage::new(
            "Committee on Foreign Relations",
            Chamber::Senate,
            &format!("{WP}/United_States_Senate_Committee_on_Foreign_Relations"),
        ),
        LeadershipPage::new(
            "Committee on the Judiciary",
            Chamber::House,
            &format!("{WP}/United_States_House_Committee_on_the_Judiciary"),
        ),
        LeadershipPage::new(
            "Committee on Ways and Means",
            Chamber::House,
            &format!("{WP}/United_States_House_Committee_on_Ways_and_Means"),
        ),
        LeadershipPage::new(
            "Committee on Appropriations",
            Chamber::House,
            &format!("{WP}/United_States_House_Committee_on_Appropriations"),
        ),
        LeadershipPage::new(
            "Committee on Armed Services",
            Chamber::House,
            &format!("{WP}/United_States_House_Committee_on_Armed_Services"),
        ),
        LeadershipPage::new(
            "Committee on Energy and Commerce",
            Chamber::House,
            &format!("{WP}/United_States_House_Committee_on_Energy_and_Commerce"),
        ),
    ]
}

pub struct WikipediaLeadershipAdapter {
    client: Box<dyn SourceClient>,
    pages: Vec<LeadershipPage>,
    leadership_row: Regex,
}

impl WikipediaLeadershipAdapter {
    pub fn new(client: Box<dyn SourceClient>, pages: Vec<LeadershipPage>) -> Self {
        Self {
            client,
            pages,
            // "Chair ... Name (P-ST)" within one line; infobox rows
            // flatten to this shape once tags are out of the way.
            leadership_row: Regex::new(
                r"(?m)(Ranking Member|Vice Chair|Chair(?:man|woman)?)[^A-Za-z(\n]{0,8}([A-Z][^(\n]+?)\s*\(([RDI])-([A-Z]{2})\)",
            )
            .unwrap(),
        }
    }

    fn extract(&self, html: &str, page: &LeadershipPage) -> Vec<MembershipRecord> {
        let fetched_at = Utc::now();
        let mut rows = Vec::new();
        for caps in self.leadership_row.captures_iter(html) {
            let position = match &caps[1] {
                "Ranking Member" => Position::RankingMember,
                "Vice Chair" => Position::ViceChair,
                _ => Position::Chair,
            };
            let Ok(party) = Party::parse(&caps[3]) else { continue };
            rows.push(MembershipRecord {
                source: Source::Wikipedia,
                fetched_at,
                person: PersonKey {
                    bioguide_id: None,
                    full_name: caps[2].trim().to_string(),
                    party: Some(party),
                    state: Some(caps[4].to_string()),
                    chamber: Some(page.chamber),
                },
                committee: CommitteeKey {
                    system_code: None,
                    name: page.committee_name.clone(),
                    chamber: page.chamber,
                },
                position,
                raw: serde_json::Value::Null,
            });
        }
        rows
    }
}

#[async_trait]
impl SourceAdapter for WikipediaLeadershipAdapter {
    fn source(&self) -> Source {
        Source::Wikipedia
    }

    async fn fetch_persons(&self, _congress: u16) -> Result<FetchBatch<PersonRecord>, AdapterError> {
        Ok(FetchBatch::empty())
    }

    async fn fetch_committees(
        &self,
        _congress: u16,
    ) -> Result<FetchBatch<CommitteeRecord>, AdapterError> {
        Ok(FetchBatch::empty())
    }

    async fn fetch_memberships(
        &self,
        _congress: u16,
    ) -> Result<FetchBatch<MembershipRecord>, AdapterError> {
        let mut batch = FetchBatch::empty();
        for page in &self.pages {
            let html = match self.client.get_page(&page.url).await {
                Ok(html) => html,
                Err(AdapterError::SourceUnavailable { reason, .. }) => {
                    warn!(page = %page.url, reason, "leadership page unavailable, skipping");
                    continue;
                }
                Err(other) => return Err(other),
            };
            batch.stats.pages += 1;

            let rows = self.extract(&html, page);
            if rows.is_empty() {
                debug!(page = %page.url, "no leadership rows found");
            }
            batch.stats.records += rows.len();
            batch.records.extend(rows);
        }
        Ok(batch)
    }
}
