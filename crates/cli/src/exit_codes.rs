//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — cron wrappers and
//! deploy scripts branch on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain     | Description                                |
//! |---------|------------|--------------------------------------------|
//! | 0       | Universal  | Success                                    |
//! | 1       | Universal  | General error (unspecified)                |
//! | 2       | Universal  | CLI usage error (bad args, missing file)   |
//! | 50-59   | fetch      | Source adapter transport codes             |
//! | 60-69   | reconcile  | Identity and reconciliation codes          |
//! | 70-79   | validate   | Invariant validation codes                 |
//! | 80-89   | publish    | Database publish codes                     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing config file, missing API key.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Fetch (50-59)
// =============================================================================

/// A source kept returning 429 until the retry budget ran out.
pub const EXIT_FETCH_RATE_LIMITED: u8 = 50;

/// A source was unreachable or kept failing (5xx, transport) until the
/// retry budget ran out.
pub const EXIT_FETCH_UNAVAILABLE: u8 = 51;

/// Artifact directory could not be written or read back.
pub const EXIT_FETCH_ARTIFACT_IO: u8 = 52;

// =============================================================================
// Reconcile (60-69)
// =============================================================================

/// No snapshot could be produced (a whole entity kind came back empty
/// from every source).
pub const EXIT_RECON_IRRECONCILABLE: u8 = 60;

/// Run config failed to parse or validate.
pub const EXIT_RECON_CONFIG: u8 = 61;

// =============================================================================
// Validate (70-79)
// =============================================================================

/// A blocking (tier-1) invariant failed; the snapshot was not
/// published and the artifact directory carries the FAILED marker.
pub const EXIT_VALIDATE_BLOCKING: u8 = 70;

/// Replay produced a snapshot that does not match the one on disk.
pub const EXIT_VALIDATE_REPLAY_MISMATCH: u8 = 71;

// =============================================================================
// Publish (80-89)
// =============================================================================

/// Another pipeline run holds the publish lock.
pub const EXIT_PUBLISH_IN_PROGRESS: u8 = 80;

/// The backup table for this second already exists.
pub const EXIT_PUBLISH_CONFLICT: u8 = 81;

/// A database constraint rejected a row.
pub const EXIT_PUBLISH_CONSTRAINT: u8 = 82;

/// The snapshot was never validated, or validation left it blocked.
pub const EXIT_PUBLISH_NOT_PUBLISHABLE: u8 = 83;

/// Any other database error.
pub const EXIT_PUBLISH_DB: u8 = 84;
