use capitol_model::{RecordKind, Source};

/// Transport and normalization failures local to the adapter stage.
///
/// `UnparseableRecord` is absorbed by the adapters themselves (skip and
/// count); the other variants bubble once the retry budget is spent.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Upstream kept returning 429 through the whole retry budget.
    #[error("{origin} rate limited after {attempts} attempts")]
    RateLimited { origin: Source, attempts: u32 },

    /// Network failure or 5xx past the retry budget, or a 4xx that
    /// retrying cannot fix.
    #[error("{origin} unavailable after {attempts} attempt(s): {reason}")]
    SourceUnavailable { origin: Source, attempts: u32, reason: String },

    /// A raw payload that cannot be normalized. Adapters absorb these;
    /// the variant exists for the per-row parse helpers.
    #[error("{origin} {kind} record cannot be normalized: {reason}")]
    UnparseableRecord { origin: Source, kind: RecordKind, reason: String },

    #[error("artifact io: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact encoding: {0}")]
    Encode(#[from] serde_json::Error),
}

impl AdapterError {
    pub fn unparseable(origin: Source, kind: RecordKind, reason: impl Into<String>) -> Self {
        Self::UnparseableRecord { origin, kind, reason: reason.into() }
    }
}
