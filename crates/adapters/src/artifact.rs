//! On-disk run artifacts: one JSON-Lines file per (source, kind) under
//! a run-id directory, plus JSON reports and the `FAILED` marker.
//!
//! Artifacts make a run replayable: the downstream stages can be
//! re-executed from the dumps without touching the network.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use capitol_model::{RecordKind, Source, SourceRecord, SourceSet};
use tracing::{debug, info};

use crate::error::AdapterError;

pub const FAILED_MARKER: &str = "FAILED";

/// Handle to one run's artifact directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    run_id: String,
}

impl ArtifactStore {
    /// Creates (or reopens) `<root>/<run_id>/`.
    pub fn open(root: &Path, run_id: &str) -> Result<Self, AdapterError> {
        let dir = root.join(run_id);
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, run_id: run_id.to_string() })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn jsonl_path(&self, source: Source, kind: RecordKind) -> PathBuf {
        self.dir.join(format!("{}_{kind}.jsonl", source.slug()))
    }

    /// Replaces the (source, kind) dump with the given records.
    pub fn write_records(
        &self,
        source: Source,
        kind: RecordKind,
        records: &[SourceRecord],
    ) -> Result<(), AdapterError> {
        let path = self.jsonl_path(source, kind);
        let mut file = File::create(&path)?;
        for record in records {
            serde_json::to_writer(&mut file, record)?;
            file.write_all(b"\n")?;
        }
        debug!(source = %source, kind = %kind, count = records.len(), path = %path.display(), "wrote artifact");
        Ok(())
    }

    /// Reads one (source, kind) dump back, in file order. A missing
    /// file reads as empty: a source may legitimately lack a kind.
    pub fn read_records(
        &self,
        source: Source,
        kind: RecordKind,
    ) -> Result<Vec<SourceRecord>, AdapterError> {
        let path = self.jsonl_path(source, kind);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(&path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }

    /// Rebuilds the full reconciliation input from the dumps of this
    /// run, across every source and kind.
    pub fn read_all(&self) -> Result<SourceSet, AdapterError> {
        let mut set = SourceSet::default();
        for source in Source::ALL {
            for kind in [RecordKind::Person, RecordKind::Committee, RecordKind::Membership] {
                for record in self.read_records(source, kind)? {
                    set.push(record);
                }
            }
        }
        info!(run_id = %self.run_id, persons = set.persons.len(), committees = set.committees.len(), memberships = set.memberships.len(), "replayed artifacts");
        Ok(set)
    }

    /// Persists a JSON report (invariant report, change report) next to
    /// the dumps.
    pub fn write_json<T: serde::Serialize>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<PathBuf, AdapterError> {
        let path = self.dir.join(format!("{name}.json"));
        let mut file = File::create(&path)?;
        serde_json::to_writer_pretty(&mut file, value)?;
        file.write_all(b"\n")?;
        Ok(path)
    }

    /// Drops the `FAILED` marker with the fatal error kind. Appends,
    /// so a failure during failure handling still leaves a trace.
    pub fn mark_failed(&self, error_kind: &str) -> Result<(), AdapterError> {
        let mut file =
            OpenOptions::new().create(true).append(true).open(self.dir.join(FAILED_MARKER))?;
        writeln!(file, "{error_kind}")?;
        Ok(())
    }

    pub fn is_failed(&self) -> bool {
        self.dir.join(FAILED_MARKER).exists()
    }
}
