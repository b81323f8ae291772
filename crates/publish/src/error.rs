/// Publisher failures are always fatal and always roll back.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The timestamped backup table already exists.
    #[error("publish conflict: backup table {table} already exists")]
    PublishConflict { table: String },

    /// A database-level invariant the validator missed.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Another run holds the advisory lock.
    #[error("another run is publishing; advisory lock held")]
    AnotherRunInProgress,

    /// The snapshot was never validated; refusing to publish.
    #[error("snapshot failed validation: {0}")]
    NotPublishable(String),

    #[error("database error: {0}")]
    Db(sqlx::Error),
}

impl From<sqlx::Error> for PublishError {
    fn from(err: sqlx::Error) -> Self {
        // Constraint breakage surfaces by class so the caller can tell
        // a missed invariant from a transport failure.
        if let sqlx::Error::Database(db) = &err {
            if let Some(code) = db.code() {
                // 23xxx: integrity constraint violation.
                if code.starts_with("23") {
                    return Self::ConstraintViolation(db.message().to_string());
                }
            }
        }
        Self::Db(err)
    }
}
