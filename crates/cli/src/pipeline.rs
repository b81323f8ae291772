//! Stage orchestration: fetch, reconcile, validate, publish.
//!
//! Each stage reads and writes the run's artifact directory, so any
//! prefix of the pipeline can be re-run from disk. Fatal errors drop
//! the `FAILED` marker with the error kind before surfacing.

use std::sync::Arc;

use capitol_adapters::{
    default_pages, fetch_all, ArtifactStore, ChamberSiteAdapter, CongressGovAdapter,
    FetchClient, HttpSourceClient, RegexRosterExtractor, SourceAdapter,
    WikipediaLeadershipAdapter,
};
use capitol_model::{Snapshot, Source, SourceSet};
use capitol_publish::{PublishOutcome, Publisher};
use capitol_validate::{validate, Expectations, InvariantReport};
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::CliError;

pub const SNAPSHOT_ARTIFACT: &str = "snapshot";
pub const INVARIANT_REPORT_ARTIFACT: &str = "invariant_report";
pub const CHANGE_REPORT_ARTIFACT: &str = "change_report";

/// Timestamp prefix keeps artifact directories sortable; the uuid tail
/// keeps two runs in the same second apart.
pub fn new_run_id() -> String {
    let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let tag = uuid::Uuid::new_v4().simple().to_string();
    format!("{stamp}_{}", &tag[..8])
}

pub fn open_store(config: &RunConfig, run_id: &str) -> Result<ArtifactStore, CliError> {
    ArtifactStore::open(&config.artifact_dir, run_id)
        .map_err(|e| CliError::artifact_io(format!("cannot open artifact store: {e}")))
}

/// The three production adapters, wired with the configured retry
/// policy and the reference regex extractor.
pub fn build_adapters(
    config: &RunConfig,
    api_key: &str,
) -> Result<Vec<Arc<dyn SourceAdapter>>, CliError> {
    let policy = config.retry_policy();

    let congress_gov =
        CongressGovAdapter::new(FetchClient::new(Source::CongressGov, policy)?, api_key);

    let chamber_site = ChamberSiteAdapter::new(
        Box::new(HttpSourceClient::new(FetchClient::new(Source::ChamberSite, policy)?)),
        Box::new(RegexRosterExtractor::new()),
    );

    let wikipedia = WikipediaLeadershipAdapter::new(
        Box::new(HttpSourceClient::new(FetchClient::new(Source::Wikipedia, policy)?)),
        default_pages(),
    );

    Ok(vec![Arc::new(congress_gov), Arc::new(chamber_site), Arc::new(wikipedia)])
}

pub async fn fetch_stage(
    config: &RunConfig,
    api_key: &str,
    store: &ArtifactStore,
) -> Result<SourceSet, CliError> {
    let adapters = build_adapters(config, api_key)?;
    match fetch_all(adapters, store, config.fetch_options()).await {
        Ok(set) => Ok(set),
        Err(e) => fail(store, CliError::from(e)),
    }
}

pub fn reconcile_stage(
    config: &RunConfig,
    set: &SourceSet,
    store: &ArtifactStore,
) -> Result<Snapshot, CliError> {
    let snapshot = match capitol_recon::run(&config.engine(), set, store.run_id()) {
        Ok(snapshot) => snapshot,
        Err(e) => return fail(store, CliError::from(e)),
    };
    store
        .write_json(SNAPSHOT_ARTIFACT, &snapshot)
        .map_err(|e| CliError::artifact_io(format!("cannot write snapshot artifact: {e}")))?;
    Ok(snapshot)
}

/// Runs every invariant check and persists the report. A tier-1
/// failure marks the run FAILED with the rule name and aborts; the
/// publisher is never reached.
pub fn validate_stage(
    config: &RunConfig,
    snapshot: &mut Snapshot,
    store: &ArtifactStore,
) -> Result<InvariantReport, CliError> {
    let expect = Expectations::for_congress(config.congress_number);
    let report = validate(snapshot, &expect);
    store
        .write_json(INVARIANT_REPORT_ARTIFACT, &report)
        .map_err(|e| CliError::artifact_io(format!("cannot write invariant report: {e}")))?;

    for outcome in report.warnings() {
        warn!(rule = %outcome.rule, detail = %outcome.detail, "invariant warning");
    }

    if let Some(kind) = report.failure_kind() {
        return fail(store, CliError::blocking_invariant(&report, kind));
    }
    // The snapshot changed state in validate(); persist the final form.
    store
        .write_json(SNAPSHOT_ARTIFACT, snapshot)
        .map_err(|e| CliError::artifact_io(format!("cannot rewrite snapshot artifact: {e}")))?;
    Ok(report)
}

pub async fn publish_stage(
    config: &RunConfig,
    snapshot: &Snapshot,
    report: &InvariantReport,
    store: &ArtifactStore,
    dry_run: bool,
) -> Result<PublishOutcome, CliError> {
    let publisher = match Publisher::connect(&config.dsn()?).await {
        Ok(publisher) => publisher,
        Err(e) => return fail(store, CliError::from(e)),
    };
    let outcome = match publisher.publish(snapshot, report, dry_run).await {
        Ok(outcome) => outcome,
        Err(e) => return fail(store, CliError::from(e)),
    };
    match &outcome {
        PublishOutcome::Published { backup_table, change_report } => {
            store
                .write_json(CHANGE_REPORT_ARTIFACT, change_report)
                .map_err(|e| CliError::artifact_io(format!("cannot write change report: {e}")))?;
            info!(run_id = %store.run_id(), backup_table, "published");
        }
        PublishOutcome::DryRun { change_report } => {
            store
                .write_json(CHANGE_REPORT_ARTIFACT, change_report)
                .map_err(|e| CliError::artifact_io(format!("cannot write change report: {e}")))?;
            info!(run_id = %store.run_id(), "dry run rolled back");
        }
        PublishOutcome::NoOp => {
            info!(run_id = %store.run_id(), "run id already published, no-op");
        }
    }
    Ok(outcome)
}

/// The full pipeline for one run id.
pub async fn run_all(
    config: &RunConfig,
    api_key: &str,
    store: &ArtifactStore,
    dry_run: bool,
) -> Result<PublishOutcome, CliError> {
    let set = fetch_stage(config, api_key, store).await?;
    let mut snapshot = reconcile_stage(config, &set, store)?;
    let report = validate_stage(config, &mut snapshot, store)?;
    publish_stage(config, &snapshot, &report, store, dry_run).await
}

fn fail<T>(store: &ArtifactStore, err: CliError) -> Result<T, CliError> {
    if let Err(mark_err) = store.mark_failed(&err.kind) {
        warn!(run_id = %store.run_id(), error = %mark_err, "could not write FAILED marker");
    }
    Err(err)
}
