//! `capitol-publish` — atomic replacement of the served Postgres
//! snapshot.
//!
//! One transaction per publish: back up the membership table, truncate
//! it, upsert persons and committees by natural key, insert the new
//! memberships, log the run. An advisory lock serializes concurrent
//! runs; any error rolls back and leaves the previous snapshot live.

pub mod diff;
pub mod error;
pub mod publisher;
pub mod schema;

pub use diff::{ChangeReport, PrevState};
pub use error::PublishError;
pub use publisher::{backup_table_name, PublishOutcome, Publisher, ADVISORY_LOCK_KEY};
pub use schema::ensure_schema;
