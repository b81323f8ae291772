//! `capitol-recon` — the reconciliation engine.
//!
//! Collapses the multi-source record set into one consistent snapshot:
//! identity resolution feeds per-attribute priority merging, party
//! control is derived from the merged seat counts, and the membership
//! set is built roster-first with leadership settled separately.
//! Everything irreducible becomes a ConflictRecord; the single fatal
//! mode is a record set with no persons or no committees at all.

pub mod config;
pub mod engine;
pub mod error;
pub mod membership;
pub mod merge;
pub mod party_control;
pub mod priority;

pub use config::{ConfigError, ReconcileConfig};
pub use engine::run;
pub use error::ReconcileError;
pub use priority::SourcePriorities;
