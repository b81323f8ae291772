/// The engine's single fatal mode. Everything else the sources can
/// throw at us degrades into a ConflictRecord instead.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// A required entity kind is missing from every source at once.
    #[error("irreconcilable snapshot: {what}")]
    IrreconcilableSnapshot { what: String },
}

impl ReconcileError {
    pub fn irreconcilable(what: impl Into<String>) -> Self {
        Self::IrreconcilableSnapshot { what: what.into() }
    }
}
