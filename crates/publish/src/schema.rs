//! The served schema. `ensure_schema` is idempotent and safe to run at
//! the start of every publish.

use sqlx::PgPool;

use crate::error::PublishError;

pub const MEMBERS_TABLE: &str = "members";
pub const COMMITTEES_TABLE: &str = "committees";
pub const MEMBERSHIPS_TABLE: &str = "committee_memberships";
pub const PUBLISH_LOG_TABLE: &str = "publish_log";

const DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS members (
        id                 BIGINT PRIMARY KEY,
        bioguide_id        TEXT UNIQUE,
        first_name         TEXT NOT NULL,
        last_name          TEXT NOT NULL,
        middle_name        TEXT,
        suffix             TEXT,
        nickname           TEXT,
        party              TEXT NOT NULL,
        chamber            TEXT NOT NULL,
        state              TEXT NOT NULL,
        district           INTEGER,
        term_start         DATE,
        term_end           DATE,
        is_current         BOOLEAN NOT NULL DEFAULT TRUE,
        official_photo_url TEXT,
        created_at         TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at         TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS committees (
        id                  BIGINT PRIMARY KEY,
        name                TEXT NOT NULL,
        chamber             TEXT NOT NULL,
        committee_type      TEXT NOT NULL,
        committee_code      TEXT UNIQUE,
        parent_committee_id BIGINT REFERENCES committees(id),
        is_subcommittee     BOOLEAN NOT NULL DEFAULT FALSE,
        is_active           BOOLEAN NOT NULL DEFAULT TRUE,
        website             TEXT,
        jurisdiction        TEXT,
        created_at          TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at          TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS committee_memberships (
        id           BIGSERIAL PRIMARY KEY,
        member_id    BIGINT NOT NULL REFERENCES members(id),
        committee_id BIGINT NOT NULL REFERENCES committees(id),
        position     TEXT NOT NULL,
        is_current   BOOLEAN NOT NULL DEFAULT TRUE,
        created_at   TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at   TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS publish_log (
        run_id           TEXT PRIMARY KEY,
        published_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
        counts           JSONB NOT NULL,
        invariant_report JSONB NOT NULL,
        change_report    JSONB NOT NULL
    )
    "#,
];

pub async fn ensure_schema(pool: &PgPool) -> Result<(), PublishError> {
    for statement in DDL {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
