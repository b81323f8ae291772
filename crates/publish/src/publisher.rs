//! The publish protocol: one transaction, advisory-locked, backed up
//! before the membership table is touched.

use std::collections::BTreeMap;
use std::time::Duration;

use capitol_model::{CommitteeId, PersonId, Snapshot};
use capitol_validate::InvariantReport;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};

use crate::diff::{self, ChangeReport, PrevCommittee, PrevLeader, PrevPerson, PrevState};
use crate::error::PublishError;
use crate::schema;

/// Advisory lock key for the publish critical section; any concurrent
/// run observing it held exits without touching a table.
pub const ADVISORY_LOCK_KEY: i64 = 0x636170_69746f6c;

#[derive(Debug)]
pub enum PublishOutcome {
    Published { backup_table: String, change_report: ChangeReport },
    /// The run id is already in publish_log; the transaction was
    /// abandoned untouched.
    NoOp,
    /// Everything executed and then rolled back on request.
    DryRun { change_report: ChangeReport },
}

pub struct Publisher {
    pool: PgPool,
    statement_timeout: Duration,
}

impl Publisher {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, statement_timeout: Duration::from_secs(300) }
    }

    pub async fn connect(dsn: &str) -> Result<Self, PublishError> {
        let pool = PgPoolOptions::new().max_connections(4).connect(dsn).await?;
        Ok(Self::new(pool))
    }

    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Runs the full protocol. `dry_run` executes every statement and
    /// rolls back instead of committing.
    pub async fn publish(
        &self,
        snapshot: &Snapshot,
        invariant_report: &InvariantReport,
        dry_run: bool,
    ) -> Result<PublishOutcome, PublishError> {
        if !invariant_report.publishable() {
            return Err(PublishError::NotPublishable(
                invariant_report.failure_kind().unwrap_or_else(|| "unknown".into()),
            ));
        }

        schema::ensure_schema(&self.pool).await?;

        let mut tx = self.pool.begin().await?;

        // SET does not take bind parameters; the value is our own.
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = {}",
            self.statement_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;

        let (locked,): (bool,) = sqlx::query_as("SELECT pg_try_advisory_xact_lock($1)")
            .bind(ADVISORY_LOCK_KEY)
            .fetch_one(&mut *tx)
            .await?;
        if !locked {
            return Err(PublishError::AnotherRunInProgress);
        }

        // Idempotence: a re-run of a committed snapshot is a no-op.
        let already: Option<(String,)> =
            sqlx::query_as("SELECT run_id FROM publish_log WHERE run_id = $1")
                .bind(&snapshot.meta.run_id)
                .fetch_optional(&mut *tx)
                .await?;
        if already.is_some() {
            info!(run_id = %snapshot.meta.run_id, "already published, no-op");
            return Ok(PublishOutcome::NoOp);
        }

        let prev = load_prev_state(&mut tx).await?;
        let change_report = diff::diff(&prev, snapshot);

        let backup_table = self.backup_memberships(&mut tx).await?;
        sqlx::query("TRUNCATE committee_memberships").execute(&mut *tx).await?;

        let person_ids = self.upsert_members(&mut tx, snapshot).await?;
        let committee_ids = self.upsert_committees(&mut tx, snapshot).await?;
        let membership_count =
            self.insert_memberships(&mut tx, snapshot, &person_ids, &committee_ids).await?;

        let counts = serde_json::json!({
            "persons": person_ids.len(),
            "committees": committee_ids.len(),
            "memberships": membership_count,
        });
        sqlx::query(
            "INSERT INTO publish_log (run_id, published_at, counts, invariant_report, change_report)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&snapshot.meta.run_id)
        .bind(Utc::now())
        .bind(&counts)
        .bind(serde_json::to_value(invariant_report).map_err(|e| {
            PublishError::ConstraintViolation(format!("report not serializable: {e}"))
        })?)
        .bind(serde_json::to_value(&change_report).map_err(|e| {
            PublishError::ConstraintViolation(format!("change report not serializable: {e}"))
        })?)
        .execute(&mut *tx)
        .await?;

        if dry_run {
            tx.rollback().await?;
            info!(run_id = %snapshot.meta.run_id, "dry run rolled back");
            return Ok(PublishOutcome::DryRun { change_report });
        }

        tx.commit().await?;
        info!(
            run_id = %snapshot.meta.run_id,
            persons = person_ids.len(),
            committees = committee_ids.len(),
            memberships = membership_count,
            backup = %backup_table,
            "snapshot published"
        );
        Ok(PublishOutcome::Published { backup_table, change_report })
    }

    /// Copies the live membership table into a timestamped backup.
    async fn backup_memberships(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<String, PublishError> {
        let table = backup_table_name(Utc::now());
        let exists: Option<(String,)> = sqlx::query_as(
            "SELECT table_name FROM information_schema.tables
             WHERE table_schema = current_schema() AND table_name = $1",
        )
        .bind(&table)
        .fetch_optional(&mut **tx)
        .await?;
        if exists.is_some() {
            return Err(PublishError::PublishConflict { table });
        }
        // Identifier built from a timestamp, never from input.
        sqlx::query(&format!("CREATE TABLE {table} AS TABLE committee_memberships"))
            .execute(&mut **tx)
            .await?;
        Ok(table)
    }

    /// Upserts persons by bioguide id when present, by surrogate id
    /// otherwise, and retires everyone the snapshot no longer carries.
    async fn upsert_members(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        snapshot: &Snapshot,
    ) -> Result<BTreeMap<PersonId, i64>, PublishError> {
        sqlx::query("UPDATE members SET is_current = FALSE, updated_at = now()")
            .execute(&mut **tx)
            .await?;

        let mut ids = BTreeMap::new();
        for person in snapshot.persons.iter().filter(|p| p.status.publishable()) {
            let conflict_target =
                if person.bioguide_id.is_some() { "bioguide_id" } else { "id" };
            let query = format!(
                "INSERT INTO members
                     (id, bioguide_id, first_name, last_name, middle_name, suffix, nickname,
                      party, chamber, state, district, term_start, term_end, is_current,
                      official_photo_url, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, now())
                 ON CONFLICT ({conflict_target}) DO UPDATE SET
                     first_name = EXCLUDED.first_name,
                     last_name = EXCLUDED.last_name,
                     middle_name = EXCLUDED.middle_name,
                     suffix = EXCLUDED.suffix,
                     nickname = EXCLUDED.nickname,
                     party = EXCLUDED.party,
                     chamber = EXCLUDED.chamber,
                     state = EXCLUDED.state,
                     district = EXCLUDED.district,
                     term_start = EXCLUDED.term_start,
                     term_end = EXCLUDED.term_end,
                     is_current = EXCLUDED.is_current,
                     official_photo_url = EXCLUDED.official_photo_url,
                     updated_at = now()
                 RETURNING id"
            );
            let (db_id,): (i64,) = sqlx::query_as(&query)
                .bind(person.id)
                .bind(&person.bioguide_id)
                .bind(&person.first_name)
                .bind(&person.last_name)
                .bind(&person.middle_name)
                .bind(&person.suffix)
                .bind(&person.nickname)
                .bind(person.party.to_string())
                .bind(person.chamber.to_string())
                .bind(&person.state)
                .bind(person.district.map(|d| d as i32))
                .bind(person.term_start)
                .bind(person.term_end)
                .bind(person.is_current)
                .bind(&person.photo_url)
                .fetch_one(&mut **tx)
                .await?;
            ids.insert(person.id, db_id);
        }
        Ok(ids)
    }

    /// Upserts committees by system code when present; parents are
    /// linked in a second pass once every id is known.
    async fn upsert_committees(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        snapshot: &Snapshot,
    ) -> Result<BTreeMap<CommitteeId, i64>, PublishError> {
        sqlx::query("UPDATE committees SET is_active = FALSE, updated_at = now()")
            .execute(&mut **tx)
            .await?;

        let mut ids = BTreeMap::new();
        for committee in snapshot.committees.iter().filter(|c| c.status.publishable()) {
            let conflict_target =
                if committee.system_code.is_some() { "committee_code" } else { "id" };
            let query = format!(
                "INSERT INTO committees
                     (id, name, chamber, committee_type, committee_code, parent_committee_id,
                      is_subcommittee, is_active, website, jurisdiction, updated_at)
                 VALUES ($1, $2, $3, $4, $5, NULL, $6, $7, $8, $9, now())
                 ON CONFLICT ({conflict_target}) DO UPDATE SET
                     name = EXCLUDED.name,
                     chamber = EXCLUDED.chamber,
                     committee_type = EXCLUDED.committee_type,
                     parent_committee_id = NULL,
                     is_subcommittee = EXCLUDED.is_subcommittee,
                     is_active = EXCLUDED.is_active,
                     website = EXCLUDED.website,
                     jurisdiction = EXCLUDED.jurisdiction,
                     updated_at = now()
                 RETURNING id"
            );
            let (db_id,): (i64,) = sqlx::query_as(&query)
                .bind(committee.id)
                .bind(&committee.name)
                .bind(committee.chamber.to_string())
                .bind(committee.committee_type.to_string())
                .bind(&committee.system_code)
                .bind(committee.is_subcommittee())
                .bind(committee.is_current)
                .bind(&committee.url)
                .bind(&committee.jurisdiction)
                .fetch_one(&mut **tx)
                .await?;
            ids.insert(committee.id, db_id);
        }

        for committee in snapshot.committees.iter().filter(|c| c.status.publishable()) {
            let Some(parent_id) = committee.parent_id else { continue };
            let (Some(db_id), Some(db_parent)) = (ids.get(&committee.id), ids.get(&parent_id))
            else {
                warn!(committee = committee.id, parent = parent_id, "parent not published, leaving null");
                continue;
            };
            sqlx::query(
                "UPDATE committees SET parent_committee_id = $1, updated_at = now() WHERE id = $2",
            )
            .bind(db_parent)
            .bind(db_id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(ids)
    }

    async fn insert_memberships(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        snapshot: &Snapshot,
        person_ids: &BTreeMap<PersonId, i64>,
        committee_ids: &BTreeMap<CommitteeId, i64>,
    ) -> Result<usize, PublishError> {
        let mut inserted = 0usize;
        for membership in &snapshot.memberships {
            let (Some(member_id), Some(committee_id)) = (
                person_ids.get(&membership.person_id),
                committee_ids.get(&membership.committee_id),
            ) else {
                // The validator blocks dangling references; a miss here
                // means the entity was withheld as unpublishable.
                warn!(
                    person = membership.person_id,
                    committee = membership.committee_id,
                    "membership references an unpublished entity, dropping"
                );
                continue;
            };
            sqlx::query(
                "INSERT INTO committee_memberships
                     (member_id, committee_id, position, is_current, updated_at)
                 VALUES ($1, $2, $3, $4, now())",
            )
            .bind(member_id)
            .bind(committee_id)
            .bind(membership.position.to_string())
            .bind(membership.is_current)
            .execute(&mut **tx)
            .await?;
            inserted += 1;
        }
        Ok(inserted)
    }
}

impl Publisher {
    /// Reverts the served membership table to the most recent backup.
    /// Persons and committees are left as published; a follow-up run
    /// against the restored state reconciles them.
    pub async fn restore_latest_backup(&self) -> Result<String, PublishError> {
        let mut tx = self.pool.begin().await?;
        let (locked,): (bool,) = sqlx::query_as("SELECT pg_try_advisory_xact_lock($1)")
            .bind(ADVISORY_LOCK_KEY)
            .fetch_one(&mut *tx)
            .await?;
        if !locked {
            return Err(PublishError::AnotherRunInProgress);
        }

        let latest: Option<(String,)> = sqlx::query_as(
            "SELECT table_name FROM information_schema.tables
             WHERE table_schema = current_schema()
               AND table_name LIKE 'committee_memberships_backup_%'
             ORDER BY table_name DESC LIMIT 1",
        )
        .fetch_optional(&mut *tx)
        .await?;
        let Some((table,)) = latest else {
            return Err(PublishError::PublishConflict {
                table: "no backup table to restore".into(),
            });
        };

        sqlx::query("TRUNCATE committee_memberships").execute(&mut *tx).await?;
        sqlx::query(&format!(
            "INSERT INTO committee_memberships SELECT * FROM {table}"
        ))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        info!(backup = %table, "membership table restored");
        Ok(table)
    }
}

/// `committee_memberships_backup_<YYYYMMDD_HHMMSS>`.
pub fn backup_table_name(at: chrono::DateTime<Utc>) -> String {
    format!("committee_memberships_backup_{}", at.format("%Y%m%d_%H%M%S"))
}

/// Reads the natural-key view of the served snapshot for the diff.
async fn load_prev_state(tx: &mut Transaction<'_, Postgres>) -> Result<PrevState, PublishError> {
    let persons: Vec<(Option<String>, String, String, String)> = sqlx::query_as(
        "SELECT bioguide_id, first_name, last_name, chamber FROM members WHERE is_current",
    )
    .fetch_all(&mut **tx)
    .await?;
    let committees: Vec<(String, String)> =
        sqlx::query_as("SELECT name, chamber FROM committees WHERE is_active")
            .fetch_all(&mut **tx)
            .await?;
    let leadership: Vec<(String, String, String, String)> = sqlx::query_as(
        "SELECT c.name, cm.position, m.first_name, m.last_name
         FROM committee_memberships cm
         JOIN committees c ON c.id = cm.committee_id
         JOIN members m ON m.id = cm.member_id
         WHERE cm.is_current AND cm.position IN ('Chair', 'Ranking Member')",
    )
    .fetch_all(&mut **tx)
    .await?;

    Ok(PrevState {
        persons: persons
            .into_iter()
            .map(|(bioguide_id, first, last, chamber)| PrevPerson {
                bioguide_id,
                full_name: format!("{first} {last}"),
                chamber,
            })
            .collect(),
        committees: committees
            .into_iter()
            .map(|(name, chamber)| PrevCommittee { name, chamber })
            .collect(),
        leadership: leadership
            .into_iter()
            .map(|(committee_name, position, first, last)| PrevLeader {
                committee_name,
                position,
                person_name: format!("{first} {last}"),
            })
            .collect(),
    })
}
