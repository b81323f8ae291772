// capitol - congressional reference data pipeline
// fetch -> reconcile -> validate -> publish, each stage replayable
// from the run's artifact directory.

mod config;
mod exit_codes;
mod pipeline;

use std::path::PathBuf;
use std::process::ExitCode;

use capitol_adapters::AdapterError;
use capitol_model::Snapshot;
use capitol_publish::{PublishError, PublishOutcome, Publisher};
use capitol_recon::ReconcileError;
use capitol_validate::InvariantReport;
use clap::{Parser, Subcommand};

use config::RunConfig;
use exit_codes::{
    EXIT_ERROR, EXIT_FETCH_ARTIFACT_IO, EXIT_FETCH_RATE_LIMITED, EXIT_FETCH_UNAVAILABLE,
    EXIT_PUBLISH_CONFLICT, EXIT_PUBLISH_CONSTRAINT, EXIT_PUBLISH_DB, EXIT_PUBLISH_IN_PROGRESS,
    EXIT_PUBLISH_NOT_PUBLISHABLE, EXIT_RECON_CONFIG, EXIT_RECON_IRRECONCILABLE, EXIT_SUCCESS,
    EXIT_USAGE, EXIT_VALIDATE_BLOCKING, EXIT_VALIDATE_REPLAY_MISMATCH,
};

#[derive(Parser)]
#[command(name = "capitol")]
#[command(about = "Congressional reference data: fetch, reconcile, validate, publish")]
#[command(version)]
struct Cli {
    /// Path to the run config (TOML)
    #[arg(long, short = 'c', global = true, default_value = "capitol.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: fetch, reconcile, validate, publish
    #[command(after_help = "\
Examples:
  capitol run -c capitol.toml
  capitol run --dry-run
  CONGRESS_API_KEY=... DATABASE_URL=postgres://... capitol run")]
    Run {
        /// Congress.gov API key
        #[arg(long, env = "CONGRESS_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Execute the publish protocol and roll back instead of committing
        #[arg(long)]
        dry_run: bool,
    },

    /// Fetch all sources into a new artifact directory and stop
    #[command(after_help = "\
Examples:
  capitol fetch
  capitol fetch --run-id 20270104_refetch")]
    Fetch {
        #[arg(long, env = "CONGRESS_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Reuse an artifact directory instead of creating a fresh one
        #[arg(long)]
        run_id: Option<String>,
    },

    /// Rebuild the snapshot from a run's JSON-Lines artifacts
    Reconcile {
        #[arg(long)]
        run_id: String,
    },

    /// Reconcile from artifacts and run every invariant check
    Validate {
        #[arg(long)]
        run_id: String,
    },

    /// Publish a validated snapshot from a run's artifacts
    #[command(after_help = "\
Examples:
  capitol publish --run-id 20270104_120000_ab12cd34
  capitol publish --run-id 20270104_120000_ab12cd34 --dry-run
  capitol publish --restore-backup")]
    Publish {
        #[arg(long, required_unless_present = "restore_backup")]
        run_id: Option<String>,

        #[arg(long)]
        dry_run: bool,

        /// Restore committee_memberships from the newest backup table
        /// instead of publishing
        #[arg(long)]
        restore_backup: bool,
    },

    /// Re-run the pure stages from artifacts and verify the snapshot
    /// on disk is reproduced
    Replay {
        #[arg(long)]
        run_id: String,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = dispatch(cli).await;

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint, .. }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let config = RunConfig::load(&cli.config)?;

    match cli.command {
        Commands::Run { api_key, dry_run } => {
            let api_key = resolve_api_key(api_key)?;
            let run_id = pipeline::new_run_id();
            let store = pipeline::open_store(&config, &run_id)?;
            println!("run {run_id}");
            let outcome =
                pipeline::run_all(&config, &api_key, &store, dry_run || config.dry_run).await?;
            print_outcome(&outcome);
            Ok(())
        }

        Commands::Fetch { api_key, run_id } => {
            let api_key = resolve_api_key(api_key)?;
            let run_id = run_id.unwrap_or_else(pipeline::new_run_id);
            let store = pipeline::open_store(&config, &run_id)?;
            let set = pipeline::fetch_stage(&config, &api_key, &store).await?;
            println!("run {run_id}");
            println!(
                "fetched {} persons, {} committees, {} memberships",
                set.persons.len(),
                set.committees.len(),
                set.memberships.len()
            );
            Ok(())
        }

        Commands::Reconcile { run_id } => {
            let store = pipeline::open_store(&config, &run_id)?;
            let set = read_artifacts(&store)?;
            let snapshot = pipeline::reconcile_stage(&config, &set, &store)?;
            print_snapshot(&snapshot);
            Ok(())
        }

        Commands::Validate { run_id } => {
            let store = pipeline::open_store(&config, &run_id)?;
            let set = read_artifacts(&store)?;
            let mut snapshot = pipeline::reconcile_stage(&config, &set, &store)?;
            let report = pipeline::validate_stage(&config, &mut snapshot, &store)?;
            print_snapshot(&snapshot);
            println!(
                "invariants: {} blocking failures, {} warnings",
                report.blocking_failures().count(),
                report.warnings().count()
            );
            Ok(())
        }

        Commands::Publish { run_id, dry_run, restore_backup } => {
            if restore_backup {
                let publisher = Publisher::connect(&config.dsn()?).await?;
                let table = publisher.restore_latest_backup().await?;
                println!("restored committee_memberships from {table}");
                return Ok(());
            }
            // required_unless_present guarantees the id is here.
            let run_id = run_id.ok_or_else(|| CliError::usage("--run-id is required"))?;
            let store = pipeline::open_store(&config, &run_id)?;
            let set = read_artifacts(&store)?;
            let mut snapshot = pipeline::reconcile_stage(&config, &set, &store)?;
            let report = pipeline::validate_stage(&config, &mut snapshot, &store)?;
            let outcome = pipeline::publish_stage(
                &config,
                &snapshot,
                &report,
                &store,
                dry_run || config.dry_run,
            )
            .await?;
            print_outcome(&outcome);
            Ok(())
        }

        Commands::Replay { run_id } => {
            let store = pipeline::open_store(&config, &run_id)?;
            let stored = read_stored_snapshot(&store)?;
            let set = read_artifacts(&store)?;
            let mut replayed = capitol_recon::run(&config.engine(), &set, &run_id)
                .map_err(CliError::from)?;
            let expect = capitol_validate::Expectations::for_congress(config.congress_number);
            capitol_validate::validate(&mut replayed, &expect);
            compare_snapshots(&stored, &replayed)?;
            println!("replay of {run_id} reproduced the stored snapshot");
            Ok(())
        }
    }
}

fn resolve_api_key(flag: Option<String>) -> Result<String, CliError> {
    match flag {
        Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(CliError::usage("no Congress.gov API key")
            .with_hint("pass --api-key or set CONGRESS_API_KEY")),
    }
}

fn read_artifacts(store: &capitol_adapters::ArtifactStore) -> Result<capitol_model::SourceSet, CliError> {
    let set = store
        .read_all()
        .map_err(|e| CliError::artifact_io(format!("cannot read artifacts: {e}")))?;
    if set.persons.is_empty() && set.committees.is_empty() && set.memberships.is_empty() {
        return Err(CliError::usage(format!("run {} has no artifacts", store.run_id()))
            .with_hint("run `capitol fetch` first"));
    }
    Ok(set)
}

fn read_stored_snapshot(store: &capitol_adapters::ArtifactStore) -> Result<Snapshot, CliError> {
    let path = store.dir().join(format!("{}.json", pipeline::SNAPSHOT_ARTIFACT));
    let text = std::fs::read_to_string(&path).map_err(|e| {
        CliError::usage(format!("cannot read {}: {e}", path.display()))
            .with_hint("run `capitol reconcile` for this run id first")
    })?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::artifact_io(format!("stored snapshot is not parseable: {e}")))
}

/// Byte-equality modulo the generation timestamp, which is the only
/// field the pure stages cannot reproduce.
fn compare_snapshots(stored: &Snapshot, replayed: &Snapshot) -> Result<(), CliError> {
    let normalize = |snapshot: &Snapshot| -> Result<serde_json::Value, CliError> {
        let mut value = serde_json::to_value(snapshot)
            .map_err(|e| CliError::artifact_io(format!("cannot encode snapshot: {e}")))?;
        if let Some(meta) = value.get_mut("meta") {
            if let Some(generated_at) = meta.get_mut("generated_at") {
                *generated_at = serde_json::Value::Null;
            }
        }
        Ok(value)
    };
    if normalize(stored)? != normalize(replayed)? {
        return Err(CliError {
            code: EXIT_VALIDATE_REPLAY_MISMATCH,
            kind: "ReplayMismatch".to_string(),
            message: "replayed snapshot differs from the stored one".to_string(),
            hint: Some("the artifacts or the stored snapshot were modified after the run".to_string()),
        });
    }
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot) {
    println!(
        "snapshot: {} persons ({} House voting / {} House total / {} Senate), {} committees, {} memberships, {} conflicts",
        snapshot.persons.len(),
        snapshot.current_house_voting(),
        snapshot.current_house_total(),
        snapshot.current_senators(),
        snapshot.committees.len(),
        snapshot.memberships.len(),
        snapshot.conflicts.len()
    );
}

fn print_outcome(outcome: &PublishOutcome) {
    match outcome {
        PublishOutcome::Published { backup_table, change_report } => {
            println!("published (backup: {backup_table})");
            print_changes(change_report);
        }
        PublishOutcome::DryRun { change_report } => {
            println!("dry run: rolled back");
            print_changes(change_report);
        }
        PublishOutcome::NoOp => println!("already published, no-op"),
    }
}

fn print_changes(report: &capitol_publish::ChangeReport) {
    if report.is_empty() {
        println!("no changes against the previous snapshot");
        return;
    }
    println!(
        "changes: +{} / -{} members, {} chamber transitions, +{} / -{} committees, {} leadership changes",
        report.new_persons.len(),
        report.removed_persons.len(),
        report.chamber_transitions.len(),
        report.committee_additions.len(),
        report.committee_removals.len(),
        report.leadership_changes.len()
    );
}

// =============================================================================
// Errors
// =============================================================================

/// Exit code, the error kind written to the FAILED marker, and the
/// operator-facing message.
#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub kind: String,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    fn new(code: u8, kind: &str, message: impl Into<String>) -> Self {
        Self { code, kind: kind.to_string(), message: message.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, "Usage", msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(EXIT_RECON_CONFIG, "Config", msg)
    }

    pub fn artifact_io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_FETCH_ARTIFACT_IO, "ArtifactIo", msg)
    }

    pub fn blocking_invariant(report: &InvariantReport, kind: String) -> Self {
        let detail: Vec<String> =
            report.blocking_failures().map(|o| format!("{}: {}", o.rule, o.detail)).collect();
        Self {
            code: EXIT_VALIDATE_BLOCKING,
            message: format!("blocking invariant failure: {}", detail.join("; ")),
            kind,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<AdapterError> for CliError {
    fn from(err: AdapterError) -> Self {
        let (code, kind) = match &err {
            AdapterError::RateLimited { .. } => (EXIT_FETCH_RATE_LIMITED, "RateLimited"),
            AdapterError::SourceUnavailable { .. } => (EXIT_FETCH_UNAVAILABLE, "SourceUnavailable"),
            AdapterError::UnparseableRecord { .. } => (EXIT_ERROR, "UnparseableRecord"),
            AdapterError::Io(_) => (EXIT_FETCH_ARTIFACT_IO, "Io"),
            AdapterError::Encode(_) => (EXIT_FETCH_ARTIFACT_IO, "Encode"),
        };
        Self::new(code, kind, err.to_string())
    }
}

impl From<ReconcileError> for CliError {
    fn from(err: ReconcileError) -> Self {
        match &err {
            ReconcileError::IrreconcilableSnapshot { .. } => {
                Self::new(EXIT_RECON_IRRECONCILABLE, "IrreconcilableSnapshot", err.to_string())
            }
        }
    }
}

impl From<PublishError> for CliError {
    fn from(err: PublishError) -> Self {
        let (code, kind) = match &err {
            PublishError::AnotherRunInProgress => {
                (EXIT_PUBLISH_IN_PROGRESS, "AnotherRunInProgress")
            }
            PublishError::PublishConflict { .. } => (EXIT_PUBLISH_CONFLICT, "PublishConflict"),
            PublishError::ConstraintViolation(_) => {
                (EXIT_PUBLISH_CONSTRAINT, "ConstraintViolation")
            }
            PublishError::NotPublishable(_) => (EXIT_PUBLISH_NOT_PUBLISHABLE, "NotPublishable"),
            PublishError::Db(_) => (EXIT_PUBLISH_DB, "Db"),
        };
        let mut cli = Self::new(code, kind, err.to_string());
        if matches!(err, PublishError::AnotherRunInProgress) {
            cli = cli.with_hint("wait for the other run to finish or check for a stuck transaction");
        }
        cli
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_errors_map_into_the_fetch_range() {
        let err = CliError::from(AdapterError::RateLimited {
            origin: capitol_model::Source::CongressGov,
            attempts: 5,
        });
        assert_eq!(err.code, EXIT_FETCH_RATE_LIMITED);
        assert_eq!(err.kind, "RateLimited");
    }

    #[test]
    fn lock_contention_maps_into_the_publish_range() {
        let err = CliError::from(PublishError::AnotherRunInProgress);
        assert_eq!(err.code, EXIT_PUBLISH_IN_PROGRESS);
        assert!(err.hint.is_some());
    }

    #[test]
    fn empty_api_key_is_a_usage_error() {
        let err = resolve_api_key(Some("   ".to_string())).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert!(resolve_api_key(None).is_err());
        assert_eq!(resolve_api_key(Some(" k ".to_string())).unwrap(), "k");
    }

    #[test]
    fn run_ids_are_unique_and_sortable() {
        let a = pipeline::new_run_id();
        let b = pipeline::new_run_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), "20270104_120000_ab12cd34".len());
    }
}
