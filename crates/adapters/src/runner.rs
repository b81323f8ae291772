//! Fetch stage driver: runs every adapter under a bounded task pool,
//! persists the dumps, and hands the combined record set downstream.

use std::sync::Arc;

use capitol_model::{RecordKind, SourceRecord, SourceSet};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::info;

use crate::artifact::ArtifactStore;
use crate::error::AdapterError;
use crate::SourceAdapter;

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub congress: u16,
    /// Concurrent adapters; they hit different hosts, so a small pool
    /// is safe (default 3).
    pub concurrency: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self { congress: 119, concurrency: 3 }
    }
}

struct AdapterOutput {
    persons: Vec<SourceRecord>,
    committees: Vec<SourceRecord>,
    memberships: Vec<SourceRecord>,
    stats: Vec<(capitol_model::Source, RecordKind, capitol_model::FetchStats)>,
}

async fn run_adapter(
    adapter: Arc<dyn SourceAdapter>,
    congress: u16,
) -> Result<AdapterOutput, AdapterError> {
    let source = adapter.source();

    let persons = adapter.fetch_persons(congress).await?;
    let committees = adapter.fetch_committees(congress).await?;
    let memberships = adapter.fetch_memberships(congress).await?;

    info!(
        source = %source,
        persons = persons.stats.records,
        committees = committees.stats.records,
        memberships = memberships.stats.records,
        skipped = persons.stats.skipped_unparseable
            + committees.stats.skipped_unparseable
            + memberships.stats.skipped_unparseable,
        "source fetched"
    );

    Ok(AdapterOutput {
        stats: vec![
            (source, RecordKind::Person, persons.stats),
            (source, RecordKind::Committee, committees.stats),
            (source, RecordKind::Membership, memberships.stats),
        ],
        persons: persons.records.into_iter().map(SourceRecord::Person).collect(),
        committees: committees.records.into_iter().map(SourceRecord::Committee).collect(),
        memberships: memberships.records.into_iter().map(SourceRecord::Membership).collect(),
    })
}

/// Fetches from every adapter, persists one JSON-Lines dump per
/// (source, kind), and returns the combined set in adapter order.
///
/// A transport failure in any adapter fails the whole stage; the dumps
/// already written stay on disk for the failure report.
pub async fn fetch_all(
    adapters: Vec<Arc<dyn SourceAdapter>>,
    store: &ArtifactStore,
    options: FetchOptions,
) -> Result<SourceSet, AdapterError> {
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (index, adapter) in adapters.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let congress = options.congress;
        tasks.spawn(async move {
            // Closing the semaphore is not part of this protocol, so
            // acquire cannot fail.
            let _permit = semaphore.acquire_owned().await.map_err(|_| {
                AdapterError::SourceUnavailable {
                    origin: adapter.source(),
                    attempts: 0,
                    reason: "fetch pool closed".to_string(),
                }
            })?;
            run_adapter(adapter, congress).await.map(|out| (index, out))
        });
    }

    let mut outputs: Vec<(usize, AdapterOutput)> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let result = joined.map_err(|e| std::io::Error::other(e.to_string()))?;
        outputs.push(result?);
    }
    // Stable downstream order regardless of which task finished first.
    outputs.sort_by_key(|(index, _)| *index);

    let mut set = SourceSet::default();
    for (_, output) in outputs {
        let source = match output.stats.first() {
            Some((source, _, _)) => *source,
            None => continue,
        };
        store.write_records(source, RecordKind::Person, &output.persons)?;
        store.write_records(source, RecordKind::Committee, &output.committees)?;
        store.write_records(source, RecordKind::Membership, &output.memberships)?;

        for record in
            output.persons.into_iter().chain(output.committees).chain(output.memberships)
        {
            set.push(record);
        }
        set.stats.extend(output.stats);
    }

    info!(
        run_id = %store.run_id(),
        persons = set.persons.len(),
        committees = set.committees.len(),
        memberships = set.memberships.len(),
        "fetch stage complete"
    );
    Ok(set)
}
