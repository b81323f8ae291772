//! Congress.gov REST adapter: the primary source, keyed by bioguide
//! ids and committee system codes. Paged JSON, `X-API-Key` header.

use capitol_model::{
    states, Chamber, CommitteeKey, CommitteeRecord, CommitteeType, MembershipRecord,
    Party, PersonKey, PersonRecord, Position, RecordKind, Source,
};
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::FetchClient;
use crate::error::AdapterError;
use crate::{FetchBatch, SourceAdapter};

pub const DEFAULT_BASE_URL: &str = "https://api.congress.gov/v3";

/// Page size ceiling the API accepts.
const PAGE_LIMIT: usize = 250;

pub struct CongressGovAdapter {
    client: FetchClient,
    base_url: String,
    api_key: String,
}

impl CongressGovAdapter {
    pub fn new(client: FetchClient, api_key: impl Into<String>) -> Self {
        Self { client, base_url: DEFAULT_BASE_URL.to_string(), api_key: api_key.into() }
    }

    /// Test hook: point the adapter at a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches every page of `path`, collecting the array under
    /// `list_key`. Stops when a page comes back short.
    async fn paged(
        &self,
        path: &str,
        list_key: &str,
        extra: &[(&str, String)],
    ) -> Result<(Vec<Value>, usize), AdapterError> {
        let url = format!("{}{path}", self.base_url);
        let headers = [("X-API-Key", self.api_key.as_str())];
        let mut items = Vec::new();
        let mut offset = 0usize;
        let mut pages = 0usize;

        loop {
            let mut query: Vec<(&str, String)> = vec![
                ("format", "json".to_string()),
                ("offset", offset.to_string()),
                ("limit", PAGE_LIMIT.to_string()),
            ];
            query.extend(extra.iter().cloned());

            let body = self.client.get_json(&url, &query, &headers).await?;
            pages += 1;

            let page = body
                .get(list_key)
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let got = page.len();
            items.extend(page);

            if got < PAGE_LIMIT {
                break;
            }
            offset += PAGE_LIMIT;
        }

        debug!(path, pages, count = items.len(), "paged fetch complete");
        Ok((items, pages))
    }
}

#[async_trait::async_trait]
impl SourceAdapter for CongressGovAdapter {
    fn source(&self) -> Source {
        Source::CongressGov
    }

    async fn fetch_persons(&self, congress: u16) -> Result<FetchBatch<PersonRecord>, AdapterError> {
        let (items, pages) =
            self.paged(&format!("/member/congress/{congress}"), "members", &[]).await?;

        let mut batch = FetchBatch::empty();
        batch.stats.pages = pages;
        let fetched_at = Utc::now();
        for item in items {
            match parse_member(&item, fetched_at) {
                Ok(record) => {
                    batch.stats.records += 1;
                    batch.records.push(record);
                }
                Err(err) => {
                    warn!(error = %err, "skipping member row");
                    batch.stats.skipped_unparseable += 1;
                }
            }
        }
        Ok(batch)
    }

    async fn fetch_committees(
        &self,
        congress: u16,
    ) -> Result<FetchBatch<CommitteeRecord>, AdapterError> {
        let (items, pages) =
            self.paged("/committee", "committees", &[("congress", congress.to_string())]).await?;

        let mut batch = FetchBatch::empty();
        batch.stats.pages = pages;
        let fetched_at = Utc::now();
        for item in items {
            match parse_committee(&item, fetched_at) {
                Ok(record) => {
                    batch.stats.records += 1;
                    batch.records.push(record);
                }
                Err(err) => {
                    warn!(error = %err, "skipping committee row");
                    batch.stats.skipped_unparseable += 1;
                }
            }
        }
        Ok(batch)
    }

    async fn fetch_memberships(
        &self,
        congress: u16,
    ) -> Result<FetchBatch<MembershipRecord>, AdapterError> {
        // Membership hangs off per-committee endpoints, so the
        // committee list is fetched first to learn the system codes.
        let committees = self.fetch_committees(congress).await?;

        let mut batch = FetchBatch::empty();
        batch.stats.pages = committees.stats.pages;
        batch.stats.skipped_unparseable = committees.stats.skipped_unparseable;
        let headers = [("X-API-Key", self.api_key.as_str())];

        for committee in &committees.records {
            let Some(code) = &committee.system_code else { continue };
            let chamber_path = match committee.chamber {
                Chamber::House => "house",
                Chamber::Senate => "senate",
                Chamber::Joint => "joint",
            };
            let url = format!("{}/committee/{chamber_path}/{code}/membership", self.base_url);
            let query = [("format", "json".to_string())];
            let body = self.client.get_json(&url, &query, &headers).await?;
            batch.stats.pages += 1;

            let fetched_at = Utc::now();
            let rows = body
                .get("members")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            for row in rows {
                match parse_membership_row(&row, committee, fetched_at) {
                    Ok(record) => {
                        batch.stats.records += 1;
                        batch.records.push(record);
                    }
                    Err(err) => {
                        warn!(committee = %committee.name, error = %err, "skipping roster row");
                        batch.stats.skipped_unparseable += 1;
                    }
                }
            }
        }
        Ok(batch)
    }
}

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

fn str_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
}

/// Splits the API's "Last, First Middle" form, peeling a trailing
/// generational suffix off the given-name side.
fn split_listed_name(name: &str) -> Option<(String, Option<String>, String, Option<String>)> {
    let (last, rest) = name.split_once(',')?;
    let last = last.trim();
    let mut given: Vec<&str> = rest.split_whitespace().collect();
    if last.is_empty() || given.is_empty() {
        return None;
    }

    let suffix = match given.last().copied() {
        Some(s @ ("Jr." | "Sr." | "II" | "III" | "IV")) if given.len() > 1 => {
            given.pop();
            Some(s.to_string())
        }
        _ => None,
    };

    let first = given[0].to_string();
    let middle = if given.len() > 1 { Some(given[1..].join(" ")) } else { None };
    Some((first, middle, last.to_string(), suffix))
}

fn parse_member(
    item: &Value,
    fetched_at: chrono::DateTime<Utc>,
) -> Result<PersonRecord, AdapterError> {
    let unparseable =
        |reason: &str| AdapterError::unparseable(Source::CongressGov, RecordKind::Person, reason);

    let name = str_field(item, "name").ok_or_else(|| unparseable("missing name"))?;
    let (first_name, middle_name, last_name, suffix) =
        split_listed_name(name).ok_or_else(|| unparseable("name not in Last, First form"))?;

    let party_raw = str_field(item, "partyName").ok_or_else(|| unparseable("missing partyName"))?;
    let party = Party::parse(party_raw)
        .map_err(|e| unparseable(&e.to_string()))?;

    let state_raw = str_field(item, "state").ok_or_else(|| unparseable("missing state"))?;
    let state = states::normalize(state_raw)
        .ok_or_else(|| unparseable(&format!("unknown state {state_raw:?}")))?;

    // The newest term entry carries the current chamber.
    let term = item
        .pointer("/terms/item")
        .and_then(Value::as_array)
        .and_then(|terms| terms.last())
        .cloned()
        .unwrap_or(Value::Null);
    let chamber_raw =
        str_field(&term, "chamber").ok_or_else(|| unparseable("missing term chamber"))?;
    let chamber = Chamber::parse(chamber_raw).map_err(|e| unparseable(&e.to_string()))?;

    let district = item.get("district").and_then(Value::as_u64).map(|d| d as u16);
    let term_start = term
        .get("startYear")
        .and_then(Value::as_u64)
        .and_then(|y| NaiveDate::from_ymd_opt(y as i32, 1, 3));
    let term_end = term
        .get("endYear")
        .and_then(Value::as_u64)
        .and_then(|y| NaiveDate::from_ymd_opt(y as i32, 1, 3));

    Ok(PersonRecord {
        source: Source::CongressGov,
        fetched_at,
        bioguide_id: str_field(item, "bioguideId").map(str::to_string),
        first_name,
        middle_name,
        last_name,
        suffix,
        nickname: None,
        party,
        chamber,
        state: state.to_string(),
        district,
        term_start,
        term_end,
        photo_url: item
            .pointer("/depiction/imageUrl")
            .and_then(Value::as_str)
            .map(str::to_string),
        raw: item.clone(),
    })
}

fn committee_type_from_code(code: &str) -> Option<CommitteeType> {
    match code.trim().to_ascii_lowercase().as_str() {
        "standing" => Some(CommitteeType::Standing),
        "select" => Some(CommitteeType::Select),
        "special" => Some(CommitteeType::Special),
        "joint" => Some(CommitteeType::Joint),
        "subcommittee" => Some(CommitteeType::Subcommittee),
        _ => None,
    }
}

fn parse_committee(
    item: &Value,
    fetched_at: chrono::DateTime<Utc>,
) -> Result<CommitteeRecord, AdapterError> {
    let unparseable = |reason: &str| {
        AdapterError::unparseable(Source::CongressGov, RecordKind::Committee, reason)
    };

    let name = str_field(item, "name").ok_or_else(|| unparseable("missing name"))?;
    let chamber_raw = str_field(item, "chamber").ok_or_else(|| unparseable("missing chamber"))?;
    let chamber = Chamber::parse(chamber_raw).map_err(|e| unparseable(&e.to_string()))?;

    let parent = item.get("parent").filter(|p| !p.is_null());
    let committee_type = if parent.is_some() {
        CommitteeType::Subcommittee
    } else {
        str_field(item, "committeeTypeCode")
            .and_then(committee_type_from_code)
            .ok_or_else(|| unparseable("unknown committeeTypeCode"))?
    };

    Ok(CommitteeRecord {
        source: Source::CongressGov,
        fetched_at,
        system_code: str_field(item, "systemCode").map(str::to_string),
        name: name.to_string(),
        chamber,
        committee_type,
        parent_code: parent.and_then(|p| str_field(p, "systemCode")).map(str::to_string),
        parent_name: parent.and_then(|p| str_field(p, "name")).map(str::to_string),
        jurisdiction: None,
        url: str_field(item, "url").map(str::to_string),
        raw: item.clone(),
    })
}

fn parse_membership_row(
    row: &Value,
    committee: &CommitteeRecord,
    fetched_at: chrono::DateTime<Utc>,
) -> Result<MembershipRecord, AdapterError> {
    let unparseable = |reason: &str| {
        AdapterError::unparseable(Source::CongressGov, RecordKind::Membership, reason)
    };

    let name = str_field(row, "name").ok_or_else(|| unparseable("missing name"))?;
    let full_name = match split_listed_name(name) {
        Some((first, middle, last, _)) => match middle {
            Some(m) => format!("{first} {m} {last}"),
            None => format!("{first} {last}"),
        },
        None => name.to_string(),
    };

    let party = str_field(row, "partyName").and_then(|p| Party::parse(p).ok());
    let state = str_field(row, "state").and_then(states::normalize).map(str::to_string);
    let position = str_field(row, "title")
        .and_then(|t| Position::parse(t).ok())
        .unwrap_or(Position::Member);

    Ok(MembershipRecord {
        source: Source::CongressGov,
        fetched_at,
        person: PersonKey {
            bioguide_id: str_field(row, "bioguideId").map(str::to_string),
            full_name,
            party,
            state,
            chamber: Some(committee.chamber),
        },
        committee: CommitteeKey {
            system_code: committee.system_code.clone(),
            name: committee.name.clone(),
            chamber: committee.chamber,
        },
        position,
        raw: row.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RetryPolicy;
    use httpmock::prelude::*;
    use serde_json::json;

    fn adapter(server: &MockServer) -> CongressGovAdapter {
        let client = FetchClient::new(Source::CongressGov, RetryPolicy::default()).unwrap();
        CongressGovAdapter::new(client, "test-key").with_base_url(server.base_url())
    }

    #[test]
    fn listed_name_splits_suffix() {
        let (first, middle, last, suffix) = split_listed_name("Scott, Robert C. Jr.").unwrap();
        assert_eq!(first, "Robert");
        assert_eq!(middle.as_deref(), Some("C."));
        assert_eq!(last, "Scott");
        assert_eq!(suffix.as_deref(), Some("Jr."));
    }

    #[test]
    fn listed_name_without_comma_is_rejected() {
        assert!(split_listed_name("Madam Clerk").is_none());
    }

    #[tokio::test]
    async fn members_parse_and_bad_rows_are_counted() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/member/congress/119")
                    .header("X-API-Key", "test-key");
                then.status(200).json_body(json!({
                    "members": [
                        {
                            "bioguideId": "D000563",
                            "name": "Durbin, Richard J.",
                            "partyName": "Democratic",
                            "state": "Illinois",
                            "terms": { "item": [
                                { "chamber": "House of Representatives", "startYear": 1983 },
                                { "chamber": "Senate", "startYear": 1997 }
                            ]},
                            "depiction": { "imageUrl": "https://example.org/d000563.jpg" }
                        },
                        {
                            "bioguideId": "X000000",
                            "name": "Nobody, Test",
                            "partyName": "Whig",
                            "state": "Illinois",
                            "terms": { "item": [{ "chamber": "Senate" }] }
                        }
                    ],
                    "pagination": { "count": 2 }
                }));
            })
            .await;

        let batch = adapter(&server).fetch_persons(119).await.unwrap();
        assert_eq!(batch.stats.records, 1);
        assert_eq!(batch.stats.skipped_unparseable, 1);
        let p = &batch.records[0];
        assert_eq!(p.first_name, "Richard");
        assert_eq!(p.middle_name.as_deref(), Some("J."));
        assert_eq!(p.last_name, "Durbin");
        assert_eq!(p.state, "IL");
        assert_eq!(p.chamber, Chamber::Senate);
        assert_eq!(p.term_start, NaiveDate::from_ymd_opt(1997, 1, 3));
    }

    #[tokio::test]
    async fn committees_detect_subcommittees_via_parent() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/committee");
                then.status(200).json_body(json!({
                    "committees": [
                        {
                            "systemCode": "ssju00",
                            "name": "Committee on the Judiciary",
                            "chamber": "Senate",
                            "committeeTypeCode": "Standing"
                        },
                        {
                            "systemCode": "ssju01",
                            "name": "Subcommittee on the Constitution",
                            "chamber": "Senate",
                            "committeeTypeCode": "Other",
                            "parent": { "systemCode": "ssju00", "name": "Committee on the Judiciary" }
                        }
                    ]
                }));
            })
            .await;

        let batch = adapter(&server).fetch_committees(119).await.unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].committee_type, CommitteeType::Standing);
        assert_eq!(batch.records[1].committee_type, CommitteeType::Subcommittee);
        assert_eq!(batch.records[1].parent_code.as_deref(), Some("ssju00"));
    }

    #[tokio::test]
    async fn memberships_follow_committee_codes() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/committee");
                then.status(200).json_body(json!({
                    "committees": [{
                        "systemCode": "ssju00",
                        "name": "Committee on the Judiciary",
                        "chamber": "Senate",
                        "committeeTypeCode": "Standing"
                    }]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/committee/senate/ssju00/membership");
                then.status(200).json_body(json!({
                    "members": [
                        {
                            "bioguideId": "G000386",
                            "name": "Grassley, Chuck",
                            "partyName": "Republican",
                            "state": "Iowa",
                            "title": "Chairman"
                        },
                        {
                            "bioguideId": "D000563",
                            "name": "Durbin, Richard J.",
                            "partyName": "Democratic",
                            "state": "Illinois",
                            "title": "Ranking Member"
                        }
                    ]
                }));
            })
            .await;

        let batch = adapter(&server).fetch_memberships(119).await.unwrap();
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].position, Position::Chair);
        assert_eq!(batch.records[0].person.full_name, "Chuck Grassley");
        assert_eq!(batch.records[1].position, Position::RankingMember);
        assert_eq!(batch.records[1].person.state.as_deref(), Some("IL"));
    }
}
