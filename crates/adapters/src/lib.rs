//! `capitol-adapters` — normalize each external source into the
//! uniform record shapes of `capitol-model`.
//!
//! Every adapter exposes the same contract: finite record batches per
//! entity kind, tagged with provenance, persisted as JSON-Lines so a
//! run is replayable without re-fetching. Transport concerns (retry,
//! backoff, rate limits) live in [`client::FetchClient`]; parsing
//! failures are skipped and counted, never fatal.

pub mod artifact;
pub mod chamber_site;
pub mod client;
pub mod congress_gov;
pub mod error;
pub mod roster;
pub mod runner;
pub mod wikipedia;

use async_trait::async_trait;
use capitol_model::{CommitteeRecord, FetchStats, MembershipRecord, PersonRecord, Source};

pub use artifact::ArtifactStore;
pub use chamber_site::{ChamberSiteAdapter, HttpSourceClient, SourceClient};
pub use client::{FetchClient, RetryPolicy};
pub use congress_gov::CongressGovAdapter;
pub use error::AdapterError;
pub use roster::{CommitteeListing, RegexRosterExtractor, RosterExtractor, RosterRow};
pub use runner::{fetch_all, FetchOptions};
pub use wikipedia::{default_pages, LeadershipPage, WikipediaLeadershipAdapter};

/// One adapter's output for one entity kind.
#[derive(Debug, Clone, Default)]
pub struct FetchBatch<T> {
    pub records: Vec<T>,
    pub stats: FetchStats,
}

impl<T> FetchBatch<T> {
    pub fn empty() -> Self {
        Self { records: Vec::new(), stats: FetchStats::default() }
    }
}

/// The uniform adapter contract. A source that lacks an entity kind
/// returns an empty batch rather than an error (the chamber sites
/// offer committees but no bioguide-grade person identity).
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> Source;

    async fn fetch_persons(&self, congress: u16) -> Result<FetchBatch<PersonRecord>, AdapterError>;

    async fn fetch_committees(
        &self,
        congress: u16,
    ) -> Result<FetchBatch<CommitteeRecord>, AdapterError>;

    async fn fetch_memberships(
        &self,
        congress: u16,
    ) -> Result<FetchBatch<MembershipRecord>, AdapterError>;
}
