//! Chamber-website adapter: committee names, official URLs, and roster
//! rows scraped from house.gov and senate.gov.
//!
//! The sites carry no bioguide-grade person identity, so
//! `fetch_persons` is an empty batch and roster rows point at people
//! by (name, party, state). Page retrieval sits behind [`SourceClient`]
//! and HTML parsing behind [`RosterExtractor`], which keeps this
//! adapter testable without a network or a live page layout.

use async_trait::async_trait;
use capitol_model::{
    Chamber, CommitteeKey, CommitteeRecord, CommitteeType, MembershipRecord, PersonKey,
    PersonRecord, Source,
};
use chrono::Utc;
use tracing::{debug, warn};

use crate::client::FetchClient;
use crate::error::AdapterError;
use crate::roster::{CommitteeListing, RosterExtractor};
use crate::{FetchBatch, SourceAdapter};

pub const HOUSE_INDEX_URL: &str = "https://www.house.gov/committees";
pub const SENATE_INDEX_URL: &str = "https://www.senate.gov/committees/";

/// Fetches one page of a chamber site as text.
#[async_trait]
pub trait SourceClient: Send + Sync {
    async fn get_page(&self, url: &str) -> Result<String, AdapterError>;
}

/// The production client, backed by the shared retry loop.
pub struct HttpSourceClient {
    client: FetchClient,
}

impl HttpSourceClient {
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceClient for HttpSourceClient {
    async fn get_page(&self, url: &str) -> Result<String, AdapterError> {
        self.client.get_text(url, &[], &[]).await
    }
}

pub struct ChamberSiteAdapter {
    client: Box<dyn SourceClient>,
    extractor: Box<dyn RosterExtractor>,
    house_index_url: String,
    senate_index_url: String,
}

impl ChamberSiteAdapter {
    pub fn new(client: Box<dyn SourceClient>, extractor: Box<dyn RosterExtractor>) -> Self {
        Self {
            client,
            extractor,
            house_index_url: HOUSE_INDEX_URL.to_string(),
            senate_index_url: SENATE_INDEX_URL.to_string(),
        }
    }

    /// Test hook: point the adapter at mock index pages.
    pub fn with_index_urls(
        mut self,
        house: impl Into<String>,
        senate: impl Into<String>,
    ) -> Self {
        self.house_index_url = house.into();
        self.senate_index_url = senate.into();
        self
    }

    async fn listings(&self) -> Result<Vec<CommitteeListing>, AdapterError> {
        let mut listings = Vec::new();
        for (url, chamber) in [
            (&self.house_index_url, Chamber::House),
            (&self.senate_index_url, Chamber::Senate),
        ] {
            let html = self.client.get_page(url).await?;
            let found = self.extractor.committee_index(&html, chamber)?;
            debug!(chamber = %chamber, count = found.len(), "scraped committee index");
            listings.extend(found);
        }
        Ok(listings)
    }
}

#[async_trait]
impl SourceAdapter for ChamberSiteAdapter {
    fn source(&self) -> Source {
        Source::ChamberSite
    }

    /// The chamber sites identify people only inside rosters; there is
    /// no standalone member feed worth trusting.
    async fn fetch_persons(&self, _congress: u16) -> Result<FetchBatch<PersonRecord>, AdapterError> {
        Ok(FetchBatch::empty())
    }

    async fn fetch_committees(
        &self,
        _congress: u16,
    ) -> Result<FetchBatch<CommitteeRecord>, AdapterError> {
        let listings = self.listings().await?;
        let mut batch = FetchBatch::empty();
        batch.stats.pages = 2;
        let fetched_at = Utc::now();
        for listing in listings {
            batch.stats.records += 1;
            batch.records.push(CommitteeRecord {
                source: Source::ChamberSite,
                fetched_at,
                system_code: None,
                name: listing.name,
                chamber: listing.chamber,
                committee_type: CommitteeType::Standing,
                parent_code: None,
                parent_name: None,
                jurisdiction: None,
                url: Some(listing.url),
                raw: serde_json::Value::Null,
            });
        }
        Ok(batch)
    }

    async fn fetch_memberships(
        &self,
        _congress: u16,
    ) -> Result<FetchBatch<MembershipRecord>, AdapterError> {
        let listings = self.listings().await?;
        let mut batch = FetchBatch::empty();
        batch.stats.pages = 2;

        for listing in listings {
            let html = match self.client.get_page(&listing.url).await {
                Ok(html) => html,
                Err(AdapterError::SourceUnavailable { reason, .. }) => {
                    // One dead microsite should not sink the whole
                    // roster pass; the gap shows up as coverage later.
                    warn!(committee = %listing.name, reason, "roster page unavailable, skipping");
                    continue;
                }
                Err(other) => return Err(other),
            };
            batch.stats.pages += 1;

            let fetched_at = Utc::now();
            for row in self.extractor.roster(&html)? {
                batch.stats.records += 1;
                batch.records.push(MembershipRecord {
                    source: Source::ChamberSite,
                    fetched_at,
                    person: PersonKey {
                        bioguide_id: None,
                        full_name: row.full_name,
                        party: Some(row.party),
                        state: Some(row.state),
                        chamber: Some(listing.chamber),
                    },
                    committee: CommitteeKey {
                        system_code: None,
                        name: listing.name.clone(),
                        chamber: listing.chamber,
                    },
                    position: row.position,
                    raw: serde_json::Value::Null,
                });
            }
        }
        Ok(batch)
    }
}
